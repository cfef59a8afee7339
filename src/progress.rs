//! Progress indicators for flagsync.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui;

/// Start a spinner, or a hidden one when output is quiet
pub fn spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Clear the spinner and print a success line
pub fn finish_success(pb: &ProgressBar, msg: &str) {
    pb.finish_and_clear();
    ui::success(msg);
}

/// Clear the spinner
pub fn finish_clear(pb: &ProgressBar) {
    pb.finish_and_clear();
}

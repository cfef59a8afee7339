//! Console rendering of sync output

use rolloutkit::batch::{SettleStatus, SettledRecord};
use rolloutkit::{Operation, Reporter};

use crate::ui;

/// Prints sync output to the terminal
#[derive(Default)]
pub struct ConsoleReporter {
    failed: usize,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rejected items across every batch so far
    pub fn failed(&self) -> usize {
        self.failed
    }
}

impl Reporter for ConsoleReporter {
    fn line(&mut self, text: &str) {
        println!("{text}");
    }

    fn settled(&mut self, operation: Operation, records: &[SettledRecord]) {
        let mut fulfilled = 0;
        for record in records {
            match record.status {
                SettleStatus::Fulfilled => {
                    fulfilled += 1;
                    ui::success(&format!("{}: {}", record.key, record.detail));
                }
                SettleStatus::Rejected => {
                    self.failed += 1;
                    ui::error(&format!("{}: {}", record.key, record.detail));
                }
            }
        }
        log::info!(
            "{} {}, {} failed",
            fulfilled,
            operation.label(),
            records.len() - fulfilled
        );
    }
}

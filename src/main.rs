mod cli;
mod progress;
mod reporter;
mod ui;

use anyhow::{Context as AnyhowContext, Result};
use clap::Parser;
use cli::{Cli, ConfigSource, Exit, SyncOptions};
use reporter::ConsoleReporter;
use rolloutkit::backend::Backend;
use rolloutkit::backend::optimizely::OptimizelyBackend;
use rolloutkit::{
    SyncConfig, create_features, delete_features, detect_changes, find_unknown_environments,
    persist_features, read_config_dir, read_config_file, validate_config,
};
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
    };

    match run(&ctx, &cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            ui::error(&format!("{err:#}"));
            if let Some(category) = cli::error_category(&err) {
                ui::dim(category.advice());
            }
            ExitCode::from(Exit::for_error(&err).code())
        }
    }
}

fn run(ctx: &Context, cli: &Cli) -> Result<()> {
    let options = cli.resolve()?;

    let raw = load_config(&options.source)?;
    if !ctx.quiet {
        ui::section("Config:");
        println!("{}", serde_json::to_string_pretty(&raw)?);
    }

    let config = validate_config(&raw).context("Config validation failed")?;
    if ctx.verbose > 0 {
        print_desired_rollout(&config);
    }

    let backend = OptimizelyBackend::with_api_base(
        options.api_url.as_str(),
        options.access_token.as_str(),
        options.project_id,
    );
    sync(ctx, &options, &backend, &config)
}

/// Read the raw, unvalidated config value
fn load_config(source: &ConfigSource) -> Result<serde_json::Value> {
    match source {
        ConfigSource::File(path) => read_config_file(path)
            .with_context(|| format!("Could not read config file {}", path.display())),
        ConfigSource::Dir(path) => read_config_dir(path)
            .with_context(|| format!("Could not read config directory {}", path.display())),
    }
}

fn sync(
    ctx: &Context,
    options: &SyncOptions,
    backend: &dyn Backend,
    config: &SyncConfig,
) -> Result<()> {
    let pb = progress::spinner("Fetching features...", ctx.quiet);
    let features = match backend.list_features() {
        Ok(features) => features,
        Err(e) => {
            progress::finish_clear(&pb);
            return Err(e).context("Could not list features");
        }
    };
    if ctx.quiet {
        progress::finish_clear(&pb);
    } else {
        progress::finish_success(
            &pb,
            &format!(
                "Found {} features in project {}",
                features.len(),
                options.project_id
            ),
        );
    }

    if ctx.verbose > 0 {
        check_environments(backend, config);
    }

    if options.dry_run && !ctx.quiet {
        ui::info("Dry run: no changes will be made");
    }

    let mut reporter = ConsoleReporter::new();
    create_features(options.dry_run, backend, config, &features, &mut reporter)?;
    delete_features(options.dry_run, backend, config, &features, &mut reporter)?;
    detect_changes(config, &features, &mut reporter);
    persist_features(options.dry_run, backend, config, &features, &mut reporter)?;

    if reporter.failed() > 0 {
        ui::warn(&format!(
            "{} remote operation(s) failed, see above",
            reporter.failed()
        ));
    }

    Ok(())
}

/// Warn about configured environments the project does not define
fn check_environments(backend: &dyn Backend, config: &SyncConfig) {
    match backend.list_environments() {
        Ok(environments) => {
            for name in find_unknown_environments(config, &environments) {
                ui::warn(&format!("Environment {name} is not defined in the project"));
            }
        }
        Err(e) => log::warn!("Could not list environments: {e}"),
    }
}

fn print_desired_rollout(config: &SyncConfig) {
    ui::section("Desired rollout:");
    for (env_name, features) in config.environments() {
        println!("  {env_name}");
        for (feature, &value) in features {
            ui::kv(feature, &ui::percentage(value));
        }
    }
}

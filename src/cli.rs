use clap::Parser;
use rolloutkit::ErrorCategory;
use rolloutkit::backend::optimizely::DEFAULT_API_BASE;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "flagsync")]
#[command(author = "Alberto Cavalcante")]
#[command(version)]
#[command(about = "Sync per-environment rollout percentages to Optimizely feature flags", long_about = None)]
pub struct Cli {
    /// Log what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,

    /// The path to the file that contains your desired configuration
    #[arg(short = 'c', long, value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    /// The path to a directory of JSON files, one per environment
    #[arg(short = 'd', long, value_name = "PATH")]
    pub config_dir: Option<PathBuf>,

    /// The id of the Optimizely project
    #[arg(short = 'p', long, env = "OPTIMIZELY_PROJECT_ID", value_name = "ID")]
    pub project_id: Option<String>,

    /// An Optimizely personal access token
    #[arg(
        short = 't',
        long,
        env = "OPTIMIZELY_ACCESS_TOKEN",
        hide_env_values = true,
        value_name = "TOKEN"
    )]
    pub access_token: Option<String>,

    /// Base URL of the Optimizely REST API
    #[arg(long, env = "OPTIMIZELY_API_URL", default_value = DEFAULT_API_BASE, value_name = "URL")]
    pub api_url: String,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

// ============================================================================
// Exit codes
// ============================================================================

/// Process exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    NoAccessToken,
    NoProjectId,
    NoConfig,
    TooManyConfigFlags,
    InvalidConfig,
    RemoteFailure,
}

impl Exit {
    pub fn code(self) -> u8 {
        match self {
            Self::NoAccessToken => 1,
            Self::NoProjectId => 2,
            Self::NoConfig => 3,
            Self::TooManyConfigFlags => 4,
            Self::InvalidConfig => 5,
            Self::RemoteFailure => 6,
        }
    }

    /// Pick the exit code for an error that aborted the run
    pub fn for_error(err: &anyhow::Error) -> Self {
        if let Some(usage) = err.downcast_ref::<UsageError>() {
            return usage.exit;
        }
        match error_category(err) {
            Some(ErrorCategory::Validation | ErrorCategory::Config) => Self::InvalidConfig,
            _ => Self::RemoteFailure,
        }
    }
}

/// Category of the first sync error in an error chain
pub fn error_category(err: &anyhow::Error) -> Option<ErrorCategory> {
    err.chain()
        .find_map(|e| e.downcast_ref::<rolloutkit::Error>())
        .map(rolloutkit::Error::category)
}

/// Invalid combination of options
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct UsageError {
    pub exit: Exit,
    message: String,
}

impl UsageError {
    fn new(exit: Exit, message: impl Into<String>) -> Self {
        Self {
            exit,
            message: message.into(),
        }
    }
}

// ============================================================================
// Resolved options
// ============================================================================

/// Where the desired config comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    File(PathBuf),
    Dir(PathBuf),
}

/// Options for one sync run, after validation
#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub access_token: String,
    pub project_id: u64,
    pub source: ConfigSource,
    pub api_url: String,
    pub dry_run: bool,
}

impl Cli {
    /// Check required options, in the order their exit codes are numbered
    pub fn resolve(&self) -> Result<SyncOptions, UsageError> {
        let access_token = non_empty(self.access_token.as_deref()).ok_or_else(|| {
            UsageError::new(
                Exit::NoAccessToken,
                "No access token provided. Please use the '--access-token' flag or the OPTIMIZELY_ACCESS_TOKEN environment variable.",
            )
        })?;

        let project_id = non_empty(self.project_id.as_deref()).ok_or_else(|| {
            UsageError::new(
                Exit::NoProjectId,
                "No project id provided. Please use the '--project-id' flag or the OPTIMIZELY_PROJECT_ID environment variable.",
            )
        })?;
        let project_id: u64 = project_id.trim().parse().map_err(|_| {
            UsageError::new(
                Exit::NoProjectId,
                format!("Project id must be a number, got '{project_id}'."),
            )
        })?;

        let source = match (&self.config_file, &self.config_dir) {
            (None, None) => {
                return Err(UsageError::new(
                    Exit::NoConfig,
                    "No config provided. Please use either the '--config-file' or '--config-dir' flag.",
                ));
            }
            (Some(_), Some(_)) => {
                return Err(UsageError::new(
                    Exit::TooManyConfigFlags,
                    "Too many config flags provided. Please use only one of '--config-file' or '--config-dir'.",
                ));
            }
            (Some(file), None) => ConfigSource::File(file.clone()),
            (None, Some(dir)) => ConfigSource::Dir(dir.clone()),
        };

        Ok(SyncOptions {
            access_token: access_token.to_string(),
            project_id,
            source,
            api_url: self.api_url.clone(),
            dry_run: self.dry_run,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn parse(args: &[&str]) -> Cli {
        let mut argv = vec!["flagsync"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    fn resolve_exit(args: &[&str]) -> Exit {
        parse(args).resolve().unwrap_err().exit
    }

    #[test]
    fn test_resolve_file_source() {
        let options = parse(&["-t", "tok", "-p", "42", "-c", "rollout.json", "--dry-run"])
            .resolve()
            .unwrap();
        assert_eq!(options.access_token, "tok");
        assert_eq!(options.project_id, 42);
        assert_eq!(options.source, ConfigSource::File(PathBuf::from("rollout.json")));
        assert!(options.dry_run);
    }

    #[test]
    fn test_resolve_dir_source() {
        let options = parse(&["--access-token", "tok", "--project-id", "7", "-d", "envs"])
            .resolve()
            .unwrap();
        assert_eq!(options.source, ConfigSource::Dir(PathBuf::from("envs")));
        assert!(!options.dry_run);
    }

    #[test]
    fn test_missing_token() {
        assert_eq!(
            resolve_exit(&["-t", "", "-p", "42", "-c", "rollout.json"]),
            Exit::NoAccessToken
        );
    }

    #[test]
    fn test_missing_project_id() {
        assert_eq!(
            resolve_exit(&["-t", "tok", "-p", " ", "-c", "rollout.json"]),
            Exit::NoProjectId
        );
        assert_eq!(
            resolve_exit(&["-t", "tok", "-p", "abc", "-c", "rollout.json"]),
            Exit::NoProjectId
        );
    }

    #[test]
    fn test_missing_config() {
        assert_eq!(resolve_exit(&["-t", "tok", "-p", "42"]), Exit::NoConfig);
    }

    #[test]
    fn test_too_many_config_flags() {
        assert_eq!(
            resolve_exit(&["-t", "tok", "-p", "42", "-c", "a.json", "-d", "envs"]),
            Exit::TooManyConfigFlags
        );
    }

    #[test]
    fn test_exit_codes_are_distinct() {
        let codes: Vec<u8> = [
            Exit::NoAccessToken,
            Exit::NoProjectId,
            Exit::NoConfig,
            Exit::TooManyConfigFlags,
            Exit::InvalidConfig,
            Exit::RemoteFailure,
        ]
        .iter()
        .map(|e| e.code())
        .collect();
        let unique: HashSet<u8> = codes.iter().copied().collect();
        assert_eq!(unique.len(), codes.len());
        assert_eq!(codes, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_exit_for_error() {
        let err = anyhow::Error::new(rolloutkit::Error::InconsistentFeatures);
        assert_eq!(Exit::for_error(&err), Exit::InvalidConfig);

        let err = anyhow::Error::new(rolloutkit::Error::remote(401, "unauthorized"))
            .context("Could not list features");
        assert_eq!(Exit::for_error(&err), Exit::RemoteFailure);
        assert_eq!(error_category(&err), Some(ErrorCategory::Remote));

        let err = anyhow::Error::new(UsageError::new(Exit::NoConfig, "no config"));
        assert_eq!(Exit::for_error(&err), Exit::NoConfig);
    }
}

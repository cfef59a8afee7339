//! Error types for rollout sync operations.
//!
//! Errors are grouped into categories so the caller can decide how to react:
//! validation errors abort a run before anything is written, remote errors
//! surface per item inside a settled batch.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Result type alias for rollout operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Categories of rollout errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The desired-state config is malformed.
    Validation,
    /// The feature flag service rejected or failed a request.
    Remote,
    /// The config source could not be read.
    Config,
    /// Other/unknown errors.
    Other,
}

impl ErrorCategory {
    /// Get a user-friendly description of this error category.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Validation => "Invalid rollout config",
            Self::Remote => "Feature flag service error",
            Self::Config => "Unreadable config source",
            Self::Other => "Unexpected error",
        }
    }

    /// Get actionable advice for resolving this error category.
    #[must_use]
    pub fn advice(&self) -> &'static str {
        match self {
            Self::Validation => {
                "Every environment must map the same feature keys to integers from 0 to 10000"
            }
            Self::Remote => "Check the access token, the project id and the service status",
            Self::Config => "Check the config path and that every file is valid JSON",
            Self::Other => "Check the error details for more information",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}

/// Errors that can occur while validating config or talking to the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Config is not a mapping of mappings.
    #[error("Config must be of type mapping-of-mapping-to-number.")]
    InvalidShape,

    /// A feature value is not an integer within the basis-point range.
    #[error(
        "Feature values must be an integer between 0 and 10,000 (inclusive). \
         Environment \"{environment}\" has \"{feature}\" set to {value}."
    )]
    InvalidFeatureValue {
        /// Environment holding the bad value.
        environment: String,
        /// Feature key holding the bad value.
        feature: String,
        /// The offending value, rendered as JSON.
        value: String,
    },

    /// Environments declare different feature key sets.
    #[error("All environments don't have the same features.")]
    InconsistentFeatures,

    /// The service answered with a non-2xx status.
    #[error("Bad status code: {status}. Error: {body}")]
    RemoteRequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body text.
        body: String,
    },

    /// A delete request did not answer with 204.
    #[error("Unable to delete feature \"{id}\". Error: {body}")]
    DeleteFailed {
        /// Remote feature id.
        id: u64,
        /// Response body text.
        body: String,
    },

    /// A feature key could not be resolved to a remote id.
    #[error("Could not find id for \"{key}\" to {action}.")]
    MissingRemoteId {
        /// Feature key that has no id.
        key: String,
        /// Operation that needed the id ("delete", "update").
        action: &'static str,
    },

    /// Transport-level HTTP failure.
    #[error("HTTP request failed: {message}")]
    Http {
        /// Error message.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("invalid API response: {0}")]
    InvalidResponse(String),

    /// IO error while reading the config source.
    #[error("IO error at {path}: {source}")]
    Io {
        /// Path involved in the error.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },

    /// Config directory holds something other than JSON files.
    #[error("Config directory {path} must only contain JSON files (found {entry}).")]
    InvalidConfigDir {
        /// Directory being read.
        path: PathBuf,
        /// Offending entry name.
        entry: String,
    },

    /// Config file is not valid JSON.
    #[error("invalid JSON in {path}: {message}")]
    InvalidConfigFile {
        /// File being read.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Generic error.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an IO error with path context.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a remote status error.
    pub fn remote(status: u16, body: impl Into<String>) -> Self {
        Self::RemoteRequestFailed {
            status,
            body: body.into(),
        }
    }

    /// Get the error category.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidShape
            | Error::InvalidFeatureValue { .. }
            | Error::InconsistentFeatures => ErrorCategory::Validation,
            Error::RemoteRequestFailed { .. }
            | Error::DeleteFailed { .. }
            | Error::MissingRemoteId { .. }
            | Error::Http { .. }
            | Error::InvalidResponse(_) => ErrorCategory::Remote,
            Error::Io { .. } | Error::InvalidConfigDir { .. } | Error::InvalidConfigFile { .. } => {
                ErrorCategory::Config
            }
            Error::Other(_) => ErrorCategory::Other,
        }
    }
}

impl From<ureq::Error> for Error {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(code) => Self::RemoteRequestFailed {
                status: code,
                body: String::new(),
            },
            other => Self::Http {
                message: other.to_string(),
            },
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Self::Io {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidResponse(err.to_string())
    }
}

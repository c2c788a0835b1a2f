//! Error types for devlam

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for devlam operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for devlam
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config { message: String, help: String },

    /// Project error
    #[error("Project error: {message}")]
    Project { message: String, help: String },

    /// Install error
    #[error("Install error: {message}")]
    Install { message: String, help: String },

    /// Virtual environment error
    #[error("Virtual environment error: {message}")]
    Venv { message: String, help: String },

    /// Deploy error
    #[error("Deploy error: {message}")]
    Deploy { message: String, help: String },

    /// An external step could not be started
    #[error("Failed to start {operation}: {source}")]
    #[diagnostic(help("Ensure the program is installed and available in PATH"))]
    StepSpawn {
        /// Description of the step that failed to start
        operation: String,
        /// Underlying spawn error
        #[source]
        source: std::io::Error,
    },

    /// An external step exited with a non-zero status
    #[error("{operation} failed with exit status {status}")]
    #[diagnostic(help("Check the step's output above for details"))]
    StepFailed {
        /// Description of the failed step (e.g. "pip install -r lambda/fn/requirements.txt")
        operation: String,
        /// Exit status of the failed step
        status: i32,
    },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a project error
    pub fn project(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Project {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create an install error
    pub fn install(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Install {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a virtual environment error
    pub fn venv(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Venv {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a deploy error
    pub fn deploy(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Deploy {
            message: message.into(),
            help: help.into(),
        }
    }

    /// Create a failed-step error from an exit status
    pub fn step_failed(operation: impl Into<String>, status: i32) -> Self {
        Self::StepFailed {
            operation: operation.into(),
            status,
        }
    }

    /// Process exit code for this error.
    ///
    /// A failed external step propagates its own exit status; every other
    /// error maps to 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::StepFailed { status, .. } => *status,
            _ => 1,
        }
    }
}

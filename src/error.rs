use std::path::PathBuf;

/// Errors surfaced to callers of the library and, through `main`, to the shell.
///
/// Every variant maps to a process exit code so the binary can stay a thin
/// wrapper around [`crate::app::run`].
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Invalid domain bounds, inconsistent flags, unknown preset or model.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed call arguments (e.g. observation sequences of unequal length).
    #[error("Invalid input: {0}")]
    Input(String),

    /// Malformed, truncated or unreadable input file.
    #[error("Failed to load '{}': {message}", path.display())]
    Load { path: PathBuf, message: String },

    /// Failure while writing outputs.
    #[error("I/O error: {0}")]
    Io(String),

    /// Rejection sampling could not produce a draw inside the configured domains.
    #[error("Sampling error: {0}")]
    Sampling(String),

    /// The remnant model could not evaluate any row.
    #[error("Evaluation error: {0}")]
    Evaluation(String),

    #[error("Generation cancelled after {completed} of {total} rows")]
    Cancelled { completed: usize, total: usize },
}

impl AppError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn input(message: impl Into<String>) -> Self {
        Self::Input(message.into())
    }

    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Input(_) | AppError::Load { .. } | AppError::Io(_) => 2,
            AppError::Evaluation(_) => 3,
            AppError::Sampling(_) => 4,
            AppError::Cancelled { .. } => 130,
        }
    }
}

use std::fmt;

/// Why an admin action was refused. Every variant means nothing was changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScoreboardError {
    /// Bad input: empty name, self-match, non-numeric score, roster floor.
    Validation(String),
    /// The remote store or the auth provider is not configured yet.
    NotReady(String),
    NotFound(String),
    /// Writes need a signed-in admin.
    Unauthorized,
}

impl ScoreboardError {
    pub fn validation(message: impl Into<String>) -> Self {
        ScoreboardError::Validation(message.into())
    }

    pub fn not_ready(message: impl Into<String>) -> Self {
        ScoreboardError::NotReady(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ScoreboardError::NotFound(message.into())
    }
}

impl fmt::Display for ScoreboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScoreboardError::Validation(msg) => write!(f, "{msg}"),
            ScoreboardError::NotReady(msg) => write!(f, "{msg}"),
            ScoreboardError::NotFound(msg) => write!(f, "{msg}"),
            ScoreboardError::Unauthorized => write!(f, "Sign in as an admin first."),
        }
    }
}

impl std::error::Error for ScoreboardError {}

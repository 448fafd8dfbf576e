use anyhow::Error as AnyhowError;
use thiserror::Error;

/// Result alias for errors emitted by the cast migration library.
pub type CastResult<T> = Result<T, CastMigrateError>;

/// Structured error type for the layers around the rewriter.
///
/// The rewriter itself never fails; these cover reading sources, parsing
/// and external match files.
#[derive(Debug, Error)]
pub enum CastMigrateError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse failure: {0}")]
    Parse(String),

    #[error("invalid external matches: {0}")]
    Matches(String),

    #[error("unknown type family `{0}`")]
    UnknownFamily(String),

    #[error("{0}")]
    Other(String),
}

impl CastMigrateError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn matches(msg: impl Into<String>) -> Self {
        Self::Matches(msg.into())
    }

    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Convert to anyhow::Error for interop with anyhow-based code.
    pub fn into_anyhow(self) -> AnyhowError {
        AnyhowError::new(self)
    }
}

impl From<AnyhowError> for CastMigrateError {
    fn from(err: AnyhowError) -> Self {
        CastMigrateError::other(format!("{err:#}"))
    }
}

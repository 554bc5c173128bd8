/// Convenience result type used across the crate.
pub type RigResult<T> = Result<T, RigError>;

/// Coarse classification of a [`RigError`].
///
/// Callers use this to tell "the work errored" apart from "the work was aborted".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Catalog/rank configuration does not support the requested composition.
    Config,
    /// Weighted selection could not produce a part.
    Selection,
    /// IO, decode or backing-store failure.
    Resource,
    /// Work was cancelled or ran past its deadline.
    Cancelled,
    /// Malformed configuration, manifest or caller input.
    Validation,
}

/// Top-level error taxonomy used by composition, rendering and the worker pool.
#[derive(thiserror::Error, Debug)]
pub enum RigError {
    /// Configuration error: missing ranks, random-pool overflow, ambiguous originals.
    #[error("configuration error: {0}")]
    Config(String),

    /// Weighted selection failed to land on a candidate.
    #[error("selection error: {0}")]
    Selection(String),

    /// IO or decode failure for a single unit of work.
    #[error("resource error: {0}")]
    Resource(String),

    /// The shared cancellation signal fired before the work completed.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Invalid user-provided configuration or manifest data.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RigError {
    /// Build a [`RigError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`RigError::Selection`] value.
    pub fn selection(msg: impl Into<String>) -> Self {
        Self::Selection(msg.into())
    }

    /// Build a [`RigError::Resource`] value.
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`RigError::Cancelled`] value.
    pub fn cancelled(msg: impl Into<String>) -> Self {
        Self::Cancelled(msg.into())
    }

    /// Build a [`RigError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RigError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// The error raised when a rank lookup misses.
    pub fn missing_rank(category: &str, item: &str) -> Self {
        Self::Config(format!(
            "no rank found for category {category}, item {item}"
        ))
    }

    /// Classify this error.
    ///
    /// Wrapped `anyhow` errors always come from IO or third-party decoders and count as
    /// [`ErrorKind::Resource`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Selection(_) => ErrorKind::Selection,
            Self::Resource(_) | Self::Other(_) => ErrorKind::Resource,
            Self::Cancelled(_) => ErrorKind::Cancelled,
            Self::Validation(_) | Self::Serde(_) => ErrorKind::Validation,
        }
    }

    /// Shorthand for `self.kind() == ErrorKind::Cancelled`.
    pub fn is_cancelled(&self) -> bool {
        self.kind() == ErrorKind::Cancelled
    }
}

impl From<serde_json::Error> for RigError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serde(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

/// Convenience result type used across reskin.
pub type ReskinResult<T> = Result<T, ReskinError>;

/// Error taxonomy for the reskin pipeline.
///
/// Every variant is fatal for the current invocation; nothing in the crate retries.
#[derive(thiserror::Error, Debug)]
pub enum ReskinError {
    /// A required file, folder or credential is absent.
    #[error("missing precondition: {0}")]
    Precondition(String),

    /// An external tool (ffmpeg) could not be spawned or exited non-zero.
    #[error("external tool failed: {0}")]
    Tool(String),

    /// Image or selection data failed validation.
    #[error("validation error: {0}")]
    Validation(String),

    /// The remote generation service returned something unusable.
    #[error("remote service error: {0}")]
    Remote(String),

    /// Configuration could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReskinError {
    /// Build a [`ReskinError::Precondition`] value.
    pub fn precondition(msg: impl Into<String>) -> Self {
        Self::Precondition(msg.into())
    }

    /// Build a [`ReskinError::Tool`] value.
    pub fn tool(msg: impl Into<String>) -> Self {
        Self::Tool(msg.into())
    }

    /// Build a [`ReskinError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReskinError::Remote`] value.
    pub fn remote(msg: impl Into<String>) -> Self {
        Self::Remote(msg.into())
    }

    /// Build a [`ReskinError::Config`] value.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

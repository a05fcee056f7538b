/// Convenience result type used across the stage.
pub type StageResult<T> = Result<T, StageError>;

/// Top-level error taxonomy used by stage APIs.
///
/// Nothing here is fatal to a running stage: layers convert failures into degraded visuals and
/// only construction/configuration paths surface these to callers.
#[derive(thiserror::Error, Debug)]
pub enum StageError {
    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Asset fetch or decode failures that escaped a layer boundary.
    #[error("asset error: {0}")]
    Asset(#[from] AssetError),

    /// Rasterization failures.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing configuration.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl StageError {
    /// Build a [`StageError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`StageError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`StageError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

/// Failures while fetching an asset from an [`crate::AssetSource`].
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    /// The location does not exist in the source.
    #[error("not found: {0}")]
    NotFound(String),

    /// The remote answered with a non-2xx status.
    #[error("Fetch failed: {code} {reason}")]
    Status {
        /// HTTP status code.
        code: u16,
        /// Canonical reason phrase, empty when unknown.
        reason: String,
    },

    /// The fetch did not finish within its time budget.
    #[error("timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// Invalid location (absolute paths, `..`, empty).
    #[error("invalid location: {0}")]
    InvalidLocation(String),

    /// Local IO failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The payload could not be decoded.
    #[error("parse error: {0}")]
    Parse(String),

    /// Transport-level HTTP failure.
    #[error("http error: {0}")]
    Http(String),
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

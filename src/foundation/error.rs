/// Convenience result type used across pdfshape.
pub type PdfShapeResult<T> = Result<T, PdfShapeError>;

/// Errors that can leave the public API.
///
/// Rasterization problems never appear here; the pipeline turns them into an empty layer and
/// reports them through `tracing`.
#[derive(thiserror::Error, Debug)]
pub enum PdfShapeError {
    /// Invalid user-provided configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Invalid animation curve definition.
    #[error("animation error: {0}")]
    Animation(String),

    /// The graphics backend refused to allocate a resource.
    #[error("resource exhausted: {0}")]
    ResourceExhausted(String),

    /// Errors when serializing or deserializing layer parameters.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PdfShapeError {
    /// Build a [`PdfShapeError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`PdfShapeError::Animation`] value.
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`PdfShapeError::ResourceExhausted`] value.
    pub fn resource_exhausted(msg: impl Into<String>) -> Self {
        Self::ResourceExhausted(msg.into())
    }

    /// Build a [`PdfShapeError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

/// Convenience result type used across the crate.
pub type CinemagraphResult<T> = Result<T, CinemagraphError>;

/// Top-level error taxonomy used by pipeline APIs.
///
/// Per-pixel variants ([`CinemagraphError::InvalidDepth`]) are absorbed by the stage that
/// produced them; everything else terminates processing of the current input.
#[derive(thiserror::Error, Debug)]
pub enum CinemagraphError {
    /// A camera path tag that is not registered.
    #[error("unsupported camera path type '{0}'")]
    UnsupportedPathType(String),

    /// Non-positive or non-finite depth at an otherwise valid pixel.
    #[error("invalid depth {depth} at layer {layer}, pixel ({x}, {y})")]
    InvalidDepth {
        /// Source layer index.
        layer: usize,
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
        /// Offending depth value.
        depth: f32,
    },

    /// Neither the forward nor the backward warp produced any point.
    #[error("empty scene flow: {0}")]
    EmptySceneFlow(String),

    /// An upstream collaborator produced NaN or infinite values.
    #[error("non-finite {what} at ({x}, {y})")]
    NonFiniteField {
        /// Name of the offending field.
        what: &'static str,
        /// Pixel column.
        x: u32,
        /// Pixel row.
        y: u32,
    },

    /// Frame conversion or video encoding failed.
    #[error("encoding error: {0}")]
    Encoding(String),

    /// Invalid caller-provided data or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// Filesystem or subprocess failure.
    #[error("io error: {0}")]
    Io(String),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CinemagraphError {
    /// Build a [`CinemagraphError::EmptySceneFlow`] value.
    pub fn empty_scene_flow(msg: impl Into<String>) -> Self {
        Self::EmptySceneFlow(msg.into())
    }

    /// Build a [`CinemagraphError::Encoding`] value.
    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    /// Build a [`CinemagraphError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CinemagraphError::Io`] value.
    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io(msg.into())
    }

    /// Name of the pipeline stage this error belongs to.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::UnsupportedPathType(_) => "camera path",
            Self::InvalidDepth { .. } => "scene build",
            Self::NonFiniteField { .. } => "flow integration",
            Self::EmptySceneFlow(_) => "scene flow warp",
            Self::Encoding(_) => "frame assembly",
            Self::Validation(_) => "config",
            Self::Io(_) => "io",
            Self::Other(_) => "internal",
        }
    }

    /// Whether the error invalidates the whole run rather than a single element.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::InvalidDepth { .. })
    }
}

impl From<std::io::Error> for CinemagraphError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;

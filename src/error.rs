use thiserror::Error;

/// Errors raised while building series, reducing them or pushing them to a surface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecimateError {
    /// Length mismatch, non-positive pixel width, malformed range or plot arguments.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// A call into the rendering surface failed.
    #[error("rendering surface failure: {0}")]
    UpstreamRenderingFailure(String),
    /// The series or surface is set up in a way min/max decimation cannot handle.
    #[error("unsupported configuration: {0}")]
    UnsupportedConfiguration(String),
}

impl DecimateError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::UpstreamRenderingFailure(msg.into())
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedConfiguration(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, DecimateError>;

//! Errors raised by the compositing pipeline.
//!
//! Every variant here aborts the request. Logo failures use their own
//! [`LogoError`](crate::LogoError) type and never reach this enum.

/// Result alias for pipeline stages.
pub type ComposeResult<T> = Result<T, ComposeError>;

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("failed to decode image: {0}")]
    Decode(#[source] image::ImageError),

    #[error("failed to encode image: {0}")]
    Encode(#[source] image::ImageError),

    #[error("failed to render caption: {0}")]
    Svg(String),

    #[error("failed to allocate a {width}x{height} surface")]
    Surface { width: u32, height: u32 },

    #[error("render task failed: {0}")]
    Task(String),
}

impl ComposeError {
    pub fn svg(msg: impl Into<String>) -> Self {
        Self::Svg(msg.into())
    }

    /// Message safe to return to HTTP clients.
    ///
    /// Internal details (decoder messages, task panics) stay in the logs.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Decode(_) => "Failed to decode image",
            Self::Encode(_) => "Failed to encode image",
            Self::Svg(_) | Self::Surface { .. } => "Failed to render caption",
            Self::Task(_) => "Image processing failed",
        }
    }
}

//! Message rendering error types.

/// Message rendering error.
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    /// Handlebars rendering error.
    #[error("Message rendering error: {0}")]
    RenderError(#[from] handlebars::RenderError),
}

//! Error types for HTML slide conversion.

use thiserror::Error;

use crate::issues::Diagnostics;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while rendering, extracting or repairing a slide.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to read or write a file.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// A snapshot, model or report could not be (de)serialized.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// The external rendering collaborator failed to produce a snapshot.
    #[error("Rendering failed: {0}")]
    RenderError(String),

    /// The HTML markup could not be parsed or rewritten.
    #[error("Markup error: {0}")]
    MarkupError(String),

    /// A page layout description could not be understood.
    #[error("Invalid page layout: {0}")]
    InvalidLayout(String),

    /// The slide was extracted but is not representable in the target format.
    #[error("{0}")]
    Validation(Diagnostics),
}

// src/error.rs
use thiserror::Error;

/// Errors from the export/share pipeline.
///
/// Cancellation is deliberately absent: a dismissed share dialog resolves to
/// `ExportOutcome::Cancelled`, not an error. The UI collapses all of these
/// into one generic failure notice; the variants exist for logs and tests.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The requested printable region is not registered.
    #[error("printable region '{0}' was not found")]
    RegionNotFound(String),

    /// Layout or document writing produced no usable PDF payload.
    #[error("PDF rasterization failed: {0}")]
    RasterizationFailed(String),

    /// Anything else that went wrong while delivering the file.
    #[error("export failed: {0}")]
    Failure(String),
}

/// Errors from the table autofill client.
#[derive(Debug, Error)]
pub enum AiError {
    /// No credential configured; checked before any request is made.
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The model reply was not a JSON array of arrays.
    #[error("could not parse model response: {0}")]
    Parse(String),
}

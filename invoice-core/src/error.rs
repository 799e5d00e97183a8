use std::io;

use invoice_pdf::PdfError;
use thiserror::Error;

/// Rejected input, reported before any computation runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    /// Path of the offending field, e.g. `items[2].quantity`.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Document composition failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The business logo could not be decoded or embedded. Callers may
    /// render again without it.
    #[error("logo could not be embedded")]
    Logo(#[source] LogoError),

    #[error("font could not be loaded")]
    Font(#[source] PdfError),

    #[error("pdf output failed")]
    Pdf(#[from] PdfError),

    /// Content that cannot be placed even on an empty page.
    #[error("layout failed: {0}")]
    Layout(String),
}

/// Why a logo was rejected.
#[derive(Debug, Error)]
pub enum LogoError {
    #[error("logo is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error(transparent)]
    Image(PdfError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store i/o failed")]
    Io(#[from] io::Error),

    #[error("stored record is malformed")]
    Serde(#[from] serde_json::Error),

    #[error("no record for key {0}")]
    NotFound(String),

    #[error("key {0:?} is not usable as a record name")]
    InvalidKey(String),

    #[error("invoice {0} already exists")]
    Duplicate(String),
}

/// Failure anywhere in issuing an invoice.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

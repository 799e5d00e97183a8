use std::io;

use thiserror::Error;

/// Errors produced while building a PDF document.
#[derive(Debug, Error)]
pub enum PdfError {
    #[error("pdf write failed: {0}")]
    Io(#[from] io::Error),

    #[error("font error: {0}")]
    Font(String),

    #[error("image error: {0}")]
    Image(String),

    #[error("{0} called with no open page")]
    NoOpenPage(&'static str),
}

pub type Result<T> = std::result::Result<T, PdfError>;

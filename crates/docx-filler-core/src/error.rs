//! Error types for the fill engine and its collaborators.

/// Errors raised while loading, filling or writing a document package.
#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("Content part '{0}' not found in package")]
    MissingContentPart(String),

    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid XML attribute: {0}")]
    Attribute(#[from] quick_xml::events::attributes::AttrError),

    #[error("Content is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed markup: {0}")]
    MalformedMarkup(String),

    #[error("Invalid split point {index} for text of length {len}")]
    InvalidSplit { index: usize, len: usize },

    #[error("Range {start}..{end} is not aligned to run boundaries")]
    MisalignedRange { start: usize, end: usize },

    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

impl From<std::string::FromUtf8Error> for FillError {
    fn from(e: std::string::FromUtf8Error) -> Self {
        FillError::Utf8(e.utf8_error())
    }
}

pub type Result<T> = std::result::Result<T, FillError>;

/// Errors raised by record stores, template libraries and export sinks.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    Invalid(String),
}

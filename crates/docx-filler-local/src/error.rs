//! Error types for the local fill service.

use docx_filler_core::{FillError, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Fill error: {0}")]
    Fill(#[from] FillError),

    #[error("A fill of template '{template}' for item '{record}' is already running")]
    FillInProgress { template: String, record: String },
}

pub type Result<T> = std::result::Result<T, ServiceError>;

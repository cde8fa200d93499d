//! Local filesystem collaborators and the fill service of docx-filler.
//!
//! Lists are folders of JSON files, template libraries are folders of
//! `.docx` files, and filled documents are written back to disk.

pub mod backends;
pub mod config;
pub mod error;
pub mod export;
pub mod library;
mod paths;
pub mod service;
pub mod store;

pub use backends::create_backends;
pub use config::{Command, Config};
pub use error::{Result, ServiceError};
pub use export::LocalExportSink;
pub use library::LocalTemplateLibrary;
pub use service::{FillService, GeneratedDocument, ServiceSettings};
pub use store::JsonRecordStore;

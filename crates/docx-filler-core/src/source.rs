use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{FieldDescriptor, Record};

/// A template document available in a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateEntry {
    /// Identifier passed back to [`TemplateSource::template_bytes`].
    pub id: String,
    /// File name, including extension.
    pub name: String,
    pub size_bytes: u64,
    /// Last modified timestamp (Unix seconds)
    pub modified_at: i64,
}

/// Where a filled document goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportType {
    /// Handed straight back to the user.
    #[default]
    Download,
    /// Attached to the record the document was filled from.
    Attachment,
    /// Stored as a file inside a document library.
    #[serde(alias = "sp_file")]
    LibraryFile,
}

impl fmt::Display for ExportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportType::Download => "download",
            ExportType::Attachment => "attachment",
            ExportType::LibraryFile => "library_file",
        })
    }
}

impl FromStr for ExportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "download" => Ok(ExportType::Download),
            "attachment" => Ok(ExportType::Attachment),
            "library_file" | "sp_file" => Ok(ExportType::LibraryFile),
            other => Err(format!(
                "unknown export type '{}', expected download, attachment or library_file",
                other
            )),
        }
    }
}

/// Concrete destination of one stored document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Download,
    Attachment { list: String, record_id: String },
    LibraryFile { library: String },
}

/// Record schemas and values.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Field descriptors of a list.
    async fn fields(&self, list: &str) -> Result<Vec<FieldDescriptor>, StoreError>;

    /// Raw values of one record.
    async fn record(&self, list: &str, record_id: &str) -> Result<Record, StoreError>;

    /// Titles of the items referenced by `lookup_fields` of one record,
    /// keyed by field internal name. Fields without a value are omitted.
    async fn lookup_titles(
        &self,
        list: &str,
        record_id: &str,
        lookup_fields: &[FieldDescriptor],
    ) -> Result<HashMap<String, String>, StoreError>;
}

/// Template documents.
#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// `.docx` templates of a library.
    async fn list_templates(&self, library: &str) -> Result<Vec<TemplateEntry>, StoreError>;

    /// Raw bytes of one template.
    async fn template_bytes(&self, library: &str, template_id: &str) -> Result<Vec<u8>, StoreError>;
}

/// Persistence of filled documents.
#[async_trait]
pub trait DocumentSink: Send + Sync {
    /// Store `bytes` under `file_name` and return where it landed.
    ///
    /// `file_name` may contain `/`-separated folders for library files.
    async fn store(
        &self,
        destination: &Destination,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError>;
}

/// Whether a file name looks like a DOCX document.
pub fn is_docx_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".docx")
}

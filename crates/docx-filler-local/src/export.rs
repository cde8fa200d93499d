use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docx_filler_core::{Destination, DocumentSink, StoreError};
use tokio::fs;
use tracing::{debug, instrument};

use crate::paths::{relative_to, segment};

/// Writes filled documents to the local filesystem.
///
/// - downloads go to `download_dir`
/// - attachments go to `{data_dir}/lists/{list}/attachments/{item}/`
/// - library files go to `{data_dir}/libraries/{library}/`
pub struct LocalExportSink {
    data_dir: PathBuf,
    download_dir: PathBuf,
}

impl LocalExportSink {
    pub fn new(data_dir: &Path, download_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
            download_dir: download_dir.to_path_buf(),
        }
    }

    fn target_path(
        &self,
        destination: &Destination,
        file_name: &str,
    ) -> Result<PathBuf, StoreError> {
        let base = match destination {
            Destination::Download => self.download_dir.clone(),
            Destination::Attachment { list, record_id } => self
                .data_dir
                .join("lists")
                .join(segment(list)?)
                .join("attachments")
                .join(segment(record_id)?),
            Destination::LibraryFile { library } => {
                self.data_dir.join("libraries").join(segment(library)?)
            }
        };

        match destination {
            Destination::LibraryFile { .. } => relative_to(&base, file_name),
            _ => Ok(base.join(segment(file_name)?)),
        }
    }
}

#[async_trait]
impl DocumentSink for LocalExportSink {
    #[instrument(skip(self, bytes), level = "debug", fields(bytes_len = bytes.len()))]
    async fn store(
        &self,
        destination: &Destination,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, StoreError> {
        let path = self.target_path(destination, file_name)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                StoreError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        // Write to a temp file first, then rename over the target
        let temp_path = path.with_extension("docx.tmp");
        fs::write(&temp_path, bytes).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to write temp file {}: {}",
                temp_path.display(),
                e
            ))
        })?;
        fs::rename(&temp_path, &path).await.map_err(|e| {
            StoreError::Io(format!(
                "Failed to rename temp file to {}: {}",
                path.display(),
                e
            ))
        })?;

        debug!("Stored {} bytes at {}", bytes.len(), path.display());
        Ok(path.display().to_string())
    }
}

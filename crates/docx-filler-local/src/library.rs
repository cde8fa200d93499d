use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docx_filler_core::{is_docx_name, StoreError, TemplateEntry, TemplateSource};
use tokio::fs;
use tracing::{debug, instrument};

use crate::paths::{io_error, segment};

/// Template libraries stored as folders under `{data_dir}/libraries/`.
///
/// Only `.docx` files directly inside a library folder are templates;
/// hidden files and sub-folders are ignored.
pub struct LocalTemplateLibrary {
    root: PathBuf,
}

impl LocalTemplateLibrary {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("libraries"),
        }
    }

    fn library_dir(&self, library: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(segment(library)?))
    }
}

#[async_trait]
impl TemplateSource for LocalTemplateLibrary {
    #[instrument(skip(self), level = "debug")]
    async fn list_templates(&self, library: &str) -> Result<Vec<TemplateEntry>, StoreError> {
        let dir = self.library_dir(library)?;
        let mut read_dir = fs::read_dir(&dir).await.map_err(|e| io_error(&dir, e))?;
        let mut entries = Vec::new();

        while let Some(entry) = read_dir
            .next_entry()
            .await
            .map_err(|e| io_error(&dir, e))?
        {
            let name = entry.file_name().to_string_lossy().to_string();

            // Skip hidden files
            if name.starts_with('.') || !is_docx_name(&name) {
                continue;
            }

            let metadata = match entry.metadata().await {
                Ok(m) if m.is_file() => m,
                _ => continue,
            };

            let modified_at = metadata
                .modified()
                .ok()
                .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0);

            entries.push(TemplateEntry {
                id: name.clone(),
                name,
                size_bytes: metadata.len(),
                modified_at,
            });
        }

        entries.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));

        debug!("Listed {} templates in {}", entries.len(), dir.display());
        Ok(entries)
    }

    #[instrument(skip(self), level = "debug")]
    async fn template_bytes(
        &self,
        library: &str,
        template_id: &str,
    ) -> Result<Vec<u8>, StoreError> {
        let name = segment(template_id)?;
        if !is_docx_name(name) {
            return Err(StoreError::Invalid(format!(
                "template '{}' is not a .docx file",
                template_id
            )));
        }

        let path = self.library_dir(library)?.join(name);
        fs::read(&path).await.map_err(|e| io_error(&path, e))
    }
}

use std::path::Path;
use std::sync::Arc;

use docx_filler_core::{DocumentSink, RecordSource, TemplateSource};

use crate::export::LocalExportSink;
use crate::library::LocalTemplateLibrary;
use crate::store::JsonRecordStore;

/// Create the local collaborators rooted at `data_dir`.
pub fn create_backends(
    data_dir: &Path,
    download_dir: &Path,
) -> (
    Arc<dyn RecordSource>,
    Arc<dyn TemplateSource>,
    Arc<dyn DocumentSink>,
) {
    let records: Arc<dyn RecordSource> = Arc::new(JsonRecordStore::new(data_dir));
    let templates: Arc<dyn TemplateSource> = Arc::new(LocalTemplateLibrary::new(data_dir));
    let sink: Arc<dyn DocumentSink> = Arc::new(LocalExportSink::new(data_dir, download_dir));
    (records, templates, sink)
}

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use docx_filler_core::{
    ensure_extension, render_output_name, Destination, DocumentSink, ExportType, FillReport,
    RecordSource, TemplateEntry, TemplateSource, TokenFiller,
};
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::error::{Result, ServiceError};

/// Where templates and items come from and where results go.
#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub template_library: String,
    pub target_list: String,
    pub export_type: ExportType,
    /// Extension of produced files, e.g. `.docx`
    pub export_format: String,
    /// Name template for downloads and attachments
    pub export_filename: String,
    /// Path template inside the template library for library files
    pub export_path: String,
}

/// Result of one generated document.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub location: String,
    pub substitutions: usize,
    pub generated_at: DateTime<Utc>,
    #[serde(skip)]
    pub report: FillReport,
}

/// Fills templates with items and hands the results to a sink.
///
/// At most one fill per (template, item) pair runs at a time; a second
/// request for the same pair fails with [`ServiceError::FillInProgress`].
pub struct FillService {
    records: Arc<dyn RecordSource>,
    templates: Arc<dyn TemplateSource>,
    sink: Arc<dyn DocumentSink>,
    filler: TokenFiller,
    settings: ServiceSettings,
    in_flight: DashMap<(String, String), ()>,
}

/// Releases the in-flight slot of a fill when dropped.
struct InFlightGuard<'a> {
    in_flight: &'a DashMap<(String, String), ()>,
    key: (String, String),
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.key);
    }
}

impl FillService {
    pub fn new(
        records: Arc<dyn RecordSource>,
        templates: Arc<dyn TemplateSource>,
        sink: Arc<dyn DocumentSink>,
        filler: TokenFiller,
        settings: ServiceSettings,
    ) -> Self {
        Self {
            records,
            templates,
            sink,
            filler,
            settings,
            in_flight: DashMap::new(),
        }
    }

    fn begin(&self, template_id: &str, record_id: &str) -> Result<InFlightGuard<'_>> {
        let key = (template_id.to_string(), record_id.to_string());
        match self.in_flight.entry(key.clone()) {
            Entry::Occupied(_) => Err(ServiceError::FillInProgress {
                template: key.0,
                record: key.1,
            }),
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(InFlightGuard {
                    in_flight: &self.in_flight,
                    key,
                })
            }
        }
    }

    /// Templates available in the configured library.
    pub async fn templates(&self) -> Result<Vec<TemplateEntry>> {
        Ok(self
            .templates
            .list_templates(&self.settings.template_library)
            .await?)
    }

    /// Fill `template_id` with item `record_id` and store the result.
    #[instrument(skip(self), level = "debug")]
    pub async fn generate(&self, template_id: &str, record_id: &str) -> Result<GeneratedDocument> {
        let _guard = self.begin(template_id, record_id)?;
        let settings = &self.settings;
        let list = settings.target_list.as_str();

        let fields = self.records.fields(list).await?;
        let mut record = self.records.record(list, record_id).await?;

        let lookups: Vec<_> = fields
            .iter()
            .filter(|f| f.is_resolvable_lookup())
            .cloned()
            .collect();
        if !lookups.is_empty() {
            let titles = self.records.lookup_titles(list, record_id, &lookups).await?;
            debug!("Resolved {} of {} lookup fields", titles.len(), lookups.len());
            for (name, title) in titles {
                record.insert(name, title);
            }
        }

        let bytes = self
            .templates
            .template_bytes(&settings.template_library, template_id)
            .await?;
        let package = self.filler.load(bytes)?;
        let filled = self.filler.fill(&package, &record, &fields)?;

        let (destination, name_template) = match settings.export_type {
            ExportType::Download => (Destination::Download, &settings.export_filename),
            ExportType::Attachment => (
                Destination::Attachment {
                    list: list.to_string(),
                    record_id: record_id.to_string(),
                },
                &settings.export_filename,
            ),
            ExportType::LibraryFile => (
                Destination::LibraryFile {
                    library: settings.template_library.clone(),
                },
                &settings.export_path,
            ),
        };
        let date_format = &self.filler.options().date_format;
        let mut name = render_output_name(name_template, &record, &fields, date_format);
        if name.rsplit('/').next().unwrap_or_default().trim().is_empty() {
            name = fallback_name(&name, template_id, record_id);
        }
        let file_name = ensure_extension(&name, &settings.export_format);

        let location = self.sink.store(&destination, &file_name, &filled.bytes).await?;

        info!(
            "Generated {} from {} for item {} ({} substitutions) at {}",
            file_name, template_id, record_id, filled.report.substitutions, location
        );

        Ok(GeneratedDocument {
            file_name,
            location,
            substitutions: filled.report.substitutions,
            generated_at: Utc::now(),
            report: filled.report,
        })
    }
}

/// Name used when the rendered template leaves the file name empty:
/// `{template stem}-{item}` inside whatever folder was rendered.
fn fallback_name(rendered: &str, template_id: &str, record_id: &str) -> String {
    let stem = template_id
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(template_id);
    let folder = rendered.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    if folder.is_empty() {
        format!("{}-{}", stem, record_id)
    } else {
        format!("{}/{}-{}", folder, stem, record_id)
    }
}

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use docx_filler_core::{FieldDescriptor, Record, RecordSource, StoreError};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::fs;
use tracing::{debug, instrument, warn};

use crate::paths::{io_error, segment};

/// Lists stored as JSON files on the local filesystem.
///
/// Layout:
/// ```text
/// {data_dir}/lists/{list}/fields.json      array of field descriptors
/// {data_dir}/lists/{list}/items/{id}.json  one object per item
/// ```
pub struct JsonRecordStore {
    root: PathBuf,
}

impl JsonRecordStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            root: data_dir.join("lists"),
        }
    }

    fn list_dir(&self, list: &str) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(segment(list)?))
    }

    fn item_path(&self, list: &str, record_id: &str) -> Result<PathBuf, StoreError> {
        Ok(self
            .list_dir(list)?
            .join("items")
            .join(format!("{}.json", segment(record_id)?)))
    }

    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
        let bytes = fs::read(path).await.map_err(|e| io_error(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Title of one item of `list`, or the id itself when the item has none.
    async fn item_title(&self, list: &str, id: &str) -> Result<String, StoreError> {
        let item: Record = Self::read_json(&self.item_path(list, id)?).await?;
        Ok(match item.get("Title") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => id.to_string(),
            Some(other) => other.to_string(),
        })
    }
}

/// Item ids referenced by a lookup value: a scalar id or an array of ids.
fn lookup_ids(value: &Value) -> Vec<String> {
    match value {
        Value::Number(n) => vec![n.to_string()],
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        Value::Array(items) => items.iter().flat_map(lookup_ids).collect(),
        _ => Vec::new(),
    }
}

#[async_trait]
impl RecordSource for JsonRecordStore {
    #[instrument(skip(self), level = "debug")]
    async fn fields(&self, list: &str) -> Result<Vec<FieldDescriptor>, StoreError> {
        let path = self.list_dir(list)?.join("fields.json");
        let fields: Vec<FieldDescriptor> = Self::read_json(&path).await?;
        debug!("Loaded {} fields for list {}", fields.len(), list);
        Ok(fields)
    }

    #[instrument(skip(self), level = "debug")]
    async fn record(&self, list: &str, record_id: &str) -> Result<Record, StoreError> {
        Self::read_json(&self.item_path(list, record_id)?).await
    }

    #[instrument(skip(self, lookup_fields), level = "debug")]
    async fn lookup_titles(
        &self,
        list: &str,
        record_id: &str,
        lookup_fields: &[FieldDescriptor],
    ) -> Result<HashMap<String, String>, StoreError> {
        let record = self.record(list, record_id).await?;
        let mut titles = HashMap::new();

        for field in lookup_fields {
            let Some(target) = field.lookup_list.as_deref() else {
                warn!("Lookup field {} has no target list", field.internal_name);
                continue;
            };
            let ids = match record.get(&field.internal_name) {
                Some(value) => lookup_ids(value),
                None => continue,
            };
            if ids.is_empty() {
                continue;
            }

            let mut resolved = Vec::with_capacity(ids.len());
            for id in &ids {
                resolved.push(self.item_title(target, id).await?);
            }
            titles.insert(field.internal_name.clone(), resolved.join(", "));
        }

        debug!("Resolved {} lookup values", titles.len());
        Ok(titles)
    }
}

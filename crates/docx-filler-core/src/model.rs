use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Declared type of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Text,
    /// Multi-line text that may carry HTML markup.
    Note,
    DateTime,
    /// Reference to an item of another list; resolved to that item's title.
    Lookup,
    Number,
    Boolean,
    Other(String),
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "text" => FieldType::Text,
            "note" | "richtext" | "rich text" | "html" => FieldType::Note,
            "datetime" | "date" | "date/time" => FieldType::DateTime,
            "lookup" => FieldType::Lookup,
            "number" | "currency" | "integer" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            _ => FieldType::Other(tag.to_string()),
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        FieldType::from(tag.as_str())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text => "Text".to_string(),
            FieldType::Note => "Note".to_string(),
            FieldType::DateTime => "DateTime".to_string(),
            FieldType::Lookup => "Lookup".to_string(),
            FieldType::Number => "Number".to_string(),
            FieldType::Boolean => "Boolean".to_string(),
            FieldType::Other(tag) => tag,
        }
    }
}

/// Which descriptor property a token key is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    #[default]
    InternalName,
    DisplayTitle,
}

/// Schema metadata of one record field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub internal_name: String,
    pub title: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub from_base_type: bool,
    /// List holding the referenced items of a lookup field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lookup_list: Option<String>,
}

impl FieldDescriptor {
    pub fn new(internal_name: &str, title: &str, field_type: FieldType) -> Self {
        Self {
            internal_name: internal_name.to_string(),
            title: title.to_string(),
            field_type,
            hidden: false,
            from_base_type: false,
            lookup_list: None,
        }
    }

    pub fn token_key(&self, kind: KeyKind) -> &str {
        match kind {
            KeyKind::InternalName => &self.internal_name,
            KeyKind::DisplayTitle => &self.title,
        }
    }

    /// Visible, user-defined lookup fields get their titles resolved before a fill.
    pub fn is_resolvable_lookup(&self) -> bool {
        self.field_type == FieldType::Lookup && !self.hidden && !self.from_base_type
    }
}

/// Raw field values of one record, keyed by internal name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    values: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, internal_name: &str) -> Option<&Value> {
        self.values.get(internal_name)
    }

    pub fn insert(&mut self, internal_name: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(internal_name.into(), value.into());
    }

    pub fn with(mut self, internal_name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(internal_name, value);
        self
    }
}

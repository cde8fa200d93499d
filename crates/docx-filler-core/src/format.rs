//! Conversion of raw record values into the text placed in a document.

use std::sync::LazyLock;

use chrono::{DateTime, FixedOffset, Locale, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::Value;

use crate::model::FieldType;

static MARKUP_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[^>]+(>|$)").expect("valid markup pattern"));

/// Locale and strftime pattern used for date/time values.
#[derive(Debug, Clone, PartialEq)]
pub struct DateFormat {
    pub locale: Locale,
    pub pattern: String,
}

impl Default for DateFormat {
    fn default() -> Self {
        Self {
            locale: Locale::en_US,
            pattern: "%x %X".to_string(),
        }
    }
}

impl DateFormat {
    /// `locale` is a POSIX-style name such as `en_US` or `fr_FR`.
    pub fn new(locale: &str, pattern: &str) -> Result<Self, String> {
        let locale = Locale::try_from(locale).map_err(|_| format!("unknown locale '{}'", locale))?;
        Ok(Self {
            locale,
            pattern: pattern.to_string(),
        })
    }
}

/// A record value resolved against its declared field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Empty,
    Text(String),
    RichText(String),
    DateTime(DateTime<FixedOffset>),
    Lookup(String),
    Scalar(String),
}

impl FieldValue {
    pub fn resolve(raw: Option<&Value>, field_type: &FieldType) -> Self {
        let raw = match raw {
            None | Some(Value::Null) => return FieldValue::Empty,
            Some(raw) => raw,
        };
        match field_type {
            FieldType::Text => FieldValue::Text(plain_string(raw)),
            FieldType::Note => FieldValue::RichText(plain_string(raw)),
            FieldType::DateTime => {
                let text = plain_string(raw);
                match parse_date_time(&text) {
                    Some(value) => FieldValue::DateTime(value),
                    None => FieldValue::Scalar(text),
                }
            }
            FieldType::Lookup => FieldValue::Lookup(plain_string(raw)),
            _ => FieldValue::Scalar(plain_string(raw)),
        }
    }

    pub fn render(&self, date_format: &DateFormat) -> String {
        match self {
            FieldValue::Empty => String::new(),
            FieldValue::RichText(html) => strip_markup(html),
            FieldValue::DateTime(value) => value
                .format_localized(&date_format.pattern, date_format.locale)
                .to_string(),
            FieldValue::Text(text) | FieldValue::Lookup(text) | FieldValue::Scalar(text) => {
                text.clone()
            }
        }
    }
}

/// Display string of `raw` for a field of `field_type`.
pub fn format_field_value(
    raw: Option<&Value>,
    field_type: &FieldType,
    date_format: &DateFormat,
) -> String {
    FieldValue::resolve(raw, field_type).render(date_format)
}

/// Remove every markup tag, keeping the text between tags.
pub fn strip_markup(html: &str) -> String {
    MARKUP_TAG.replace_all(html, "").into_owned()
}

fn plain_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Array(items) => items
            .iter()
            .map(plain_string)
            .collect::<Vec<_>>()
            .join(", "),
        // Expanded lookups arrive as objects carrying the referenced title.
        Value::Object(map) => match map.get("Title") {
            Some(title) => plain_string(title),
            None => value.to_string(),
        },
    }
}

fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    DateTime::parse_from_rfc3339(text)
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S")
                .ok()
                .map(|naive| naive.and_utc().fixed_offset())
        })
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc().fixed_offset())
        })
}

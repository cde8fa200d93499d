//! Output file names built from `{item:<FieldKey>}` templates.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::format::{format_field_value, DateFormat};
use crate::model::{FieldDescriptor, FieldType, Record};

static ITEM_PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{item:([^{}]+)\}").expect("valid placeholder pattern"));

/// Replace every `{item:<FieldKey>}` in `template` with the formatted value
/// of that field. Keys are matched against internal names first, then
/// titles. Keys without a descriptor use the raw record value as text, and
/// keys missing from the record render empty.
pub fn render_output_name(
    template: &str,
    record: &Record,
    fields: &[FieldDescriptor],
    date_format: &DateFormat,
) -> String {
    ITEM_PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let key = caps[1].trim();
            let field = fields
                .iter()
                .find(|f| f.internal_name == key)
                .or_else(|| fields.iter().find(|f| f.title == key));
            let value = match field {
                Some(field) => format_field_value(
                    record.get(&field.internal_name),
                    &field.field_type,
                    date_format,
                ),
                None => format_field_value(record.get(key), &FieldType::Text, date_format),
            };
            sanitize_segment(&value)
        })
        .into_owned()
}

/// Make a substituted value safe inside a single path segment.
pub fn sanitize_segment(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect::<String>()
        .trim()
        .to_string()
}

/// Append `extension` (for example `.docx`) unless the name already ends
/// with it, ignoring case.
pub fn ensure_extension(name: &str, extension: &str) -> String {
    if name.to_lowercase().ends_with(&extension.to_lowercase()) {
        name.to_string()
    } else {
        format!("{}{}", name, extension)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new("Title", "Title", FieldType::Text),
            FieldDescriptor::new("Due", "Due date", FieldType::DateTime),
        ]
    }

    #[test]
    fn test_render_substitutes_fields() {
        let record = Record::new()
            .with("Title", "Offer")
            .with("Due", "2024-01-15T00:00:00Z")
            .with("ID", 12);
        let format = DateFormat {
            locale: chrono::Locale::POSIX,
            pattern: "%Y-%m-%d".to_string(),
        };
        let name = render_output_name(
            "{item:Title} {item:Due date} #{item:ID}",
            &record,
            &fields(),
            &format,
        );
        assert_eq!(name, "Offer 2024-01-15 #12");
    }

    #[test]
    fn test_render_sanitizes_values_not_template() {
        let record = Record::new().with("Title", json!("a/b: c?"));
        let name = render_output_name(
            "Generated/{item:Title}.docx",
            &record,
            &fields(),
            &DateFormat::default(),
        );
        assert_eq!(name, "Generated/a_b_ c_.docx");
    }

    #[test]
    fn test_unknown_key_is_empty() {
        let name = render_output_name(
            "x{item:Nope}y",
            &Record::new(),
            &fields(),
            &DateFormat::default(),
        );
        assert_eq!(name, "xy");
    }

    #[test]
    fn test_ensure_extension() {
        assert_eq!(ensure_extension("offer", ".docx"), "offer.docx");
        assert_eq!(ensure_extension("offer.DOCX", ".docx"), "offer.DOCX");
    }
}

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::collection::RunCollection;
use crate::error::Result;
use crate::format::{format_field_value, DateFormat};
use crate::model::{FieldDescriptor, KeyKind, Record};
use crate::package::{DocxPackage, MAIN_CONTENT_PART};
use crate::run::RUN;
use crate::token::{TokenMatcher, TokenStyle};
use crate::xml::{NodeId, XmlTree};

/// How many tokens of one field are replaced per run collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Occurrences {
    /// Only the first remaining token of each field in a paragraph.
    #[default]
    First,
    /// Every token of each field.
    All,
}

#[derive(Debug, Clone)]
pub struct FillOptions {
    pub match_by: KeyKind,
    pub token_style: TokenStyle,
    pub occurrences: Occurrences,
    pub date_format: DateFormat,
    pub content_part: String,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            match_by: KeyKind::default(),
            token_style: TokenStyle::default(),
            occurrences: Occurrences::default(),
            date_format: DateFormat::default(),
            content_part: MAIN_CONTENT_PART.to_string(),
        }
    }
}

/// What a fill did, per field internal name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FillReport {
    pub collections: usize,
    pub substitutions: usize,
    pub fields: BTreeMap<String, usize>,
}

#[derive(Debug, Clone)]
pub struct FilledDocument {
    pub bytes: Vec<u8>,
    pub report: FillReport,
}

/// Replaces field tokens in a document with record values.
#[derive(Debug, Clone, Default)]
pub struct TokenFiller {
    options: FillOptions,
}

impl TokenFiller {
    pub fn new(options: FillOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &FillOptions {
        &self.options
    }

    /// Load `bytes` as a package using the configured content part.
    pub fn load(&self, bytes: Vec<u8>) -> Result<DocxPackage> {
        DocxPackage::with_content_part(bytes, &self.options.content_part)
    }

    /// Fill `package` and return the bytes of the resulting package.
    ///
    /// The package itself is left untouched; on error nothing is produced.
    #[instrument(skip_all, level = "debug", fields(part = package.content_part()))]
    pub fn fill(
        &self,
        package: &DocxPackage,
        record: &Record,
        fields: &[FieldDescriptor],
    ) -> Result<FilledDocument> {
        let mut tree = XmlTree::parse(package.content())?;
        let report = self.fill_tree(&mut tree, record, fields)?;
        let xml = tree.to_xml()?;
        let bytes = package.repack(&xml)?;

        info!(
            "Filled {} token(s) across {} run collection(s)",
            report.substitutions, report.collections
        );
        Ok(FilledDocument { bytes, report })
    }

    /// Substitute tokens directly in a parsed content tree.
    pub fn fill_tree(
        &self,
        tree: &mut XmlTree,
        record: &Record,
        fields: &[FieldDescriptor],
    ) -> Result<FillReport> {
        let matchers = fields
            .iter()
            .filter_map(|field| {
                let key = field.token_key(self.options.match_by);
                if key.is_empty() {
                    return None;
                }
                Some(TokenMatcher::new(self.options.token_style, key).map(|m| (field, m)))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut report = FillReport::default();
        for (parent, runs) in run_groups(tree) {
            let mut collection = RunCollection::new(tree, parent, Some(&runs));
            report.collections += 1;

            for (field, matcher) in &matchers {
                let mut from = 0;
                loop {
                    let text = collection.text();
                    let Some(range) = matcher.find_at(&text, from) else {
                        break;
                    };

                    let value = format_field_value(
                        record.get(&field.internal_name),
                        &field.field_type,
                        &self.options.date_format,
                    );
                    collection.split(tree, &[range.start, range.end])?;
                    collection.merge_replace(tree, range.start, range.end, &value)?;

                    debug!(
                        "Replaced {} at {}..{} with {} byte(s)",
                        field.internal_name,
                        range.start,
                        range.end,
                        value.len()
                    );
                    report.substitutions += 1;
                    *report.fields.entry(field.internal_name.clone()).or_default() += 1;

                    if self.options.occurrences == Occurrences::First {
                        break;
                    }
                    from = range.start + value.len();
                }
            }
        }
        Ok(report)
    }
}

/// Every run element of the tree grouped by parent, groups and runs in
/// document order.
pub fn run_groups(tree: &XmlTree) -> Vec<(NodeId, Vec<NodeId>)> {
    let mut groups: Vec<(NodeId, Vec<NodeId>)> = Vec::new();
    let mut by_parent: HashMap<NodeId, usize> = HashMap::new();

    for node in tree.descendants(XmlTree::ROOT) {
        if !tree.is_element_named(node, RUN) {
            continue;
        }
        let Some(parent) = tree.parent(node) else {
            continue;
        };
        let slot = *by_parent.entry(parent).or_insert_with(|| {
            groups.push((parent, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(node);
    }
    groups
}

//! Token substitution engine for DOCX templates.
//!
//! This crate fills `{Field}` placeholders in a document's main content part
//! with record values while keeping run formatting intact:
//! - `XmlTree`: arena-backed mutable tree of the content part
//! - `Run` / `RunCollection`: formatting runs and their split/merge operations
//! - `TokenFiller`: finds tokens across runs and substitutes values
//! - `format_field_value`: typed value rendering (dates, rich text, scalars)
//! - `RecordSource`, `TemplateSource`, `DocumentSink`: collaborator traits

mod collection;
mod error;
mod filler;
mod format;
mod model;
mod naming;
mod package;
mod run;
mod source;
mod token;
mod xml;

pub use collection::RunCollection;
pub use error::{FillError, Result, StoreError};
pub use filler::{run_groups, FillOptions, FillReport, FilledDocument, Occurrences, TokenFiller};
pub use format::{format_field_value, strip_markup, DateFormat, FieldValue};
pub use model::{FieldDescriptor, FieldType, KeyKind, Record};
pub use naming::{ensure_extension, render_output_name, sanitize_segment};
pub use package::{read_part, DocxPackage, MAIN_CONTENT_PART};
pub use run::{needs_space_preserve, Run, RunProperty, RUN, RUN_PROPERTIES, SPACE_ATTRIBUTE, TEXT};
pub use source::{
    is_docx_name, Destination, DocumentSink, ExportType, RecordSource, TemplateEntry,
    TemplateSource,
};
pub use token::{TokenMatcher, TokenStyle};
pub use xml::{Element, NodeId, NodeKind, XmlTree};

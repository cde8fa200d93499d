use std::io::{Cursor, Write};

use docx_filler_core::{
    read_part, DocxPackage, FieldDescriptor, FieldType, FillError, FillOptions, Record,
    TokenFiller, TokenStyle, MAIN_CONTENT_PART,
};
use pretty_assertions::assert_eq;
use rstest::*;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";
const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults/></w:styles>"#;

fn document(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
         <w:document xmlns:w=\"{}\"><w:body>{}<w:sectPr/></w:body></w:document>",
        W_NS, body
    )
}

fn run(text: &str) -> String {
    format!(r#"<w:r><w:t xml:space="preserve">{}</w:t></w:r>"#, text)
}

fn bold_run(text: &str) -> String {
    format!(r#"<w:r><w:rPr><w:b/><w:color w:val="FF0000"/></w:rPr><w:t>{}</w:t></w:r>"#, text)
}

fn paragraph(runs: &[String]) -> String {
    format!("<w:p><w:pPr><w:jc w:val=\"left\"/></w:pPr>{}</w:p>", runs.concat())
}

fn build_docx(document_xml: &str) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts = [
        (
            "[Content_Types].xml",
            "<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\"/>",
        ),
        (
            "_rels/.rels",
            "<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\"/>",
        ),
        ("word/styles.xml", STYLES),
        (MAIN_CONTENT_PART, document_xml),
    ];
    for (name, body) in parts {
        writer.start_file(name, deflated).unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Run texts of every paragraph of the filled content part.
fn paragraph_runs(xml: &str) -> Vec<Vec<String>> {
    let doc = roxmltree::Document::parse(xml).unwrap();
    doc.descendants()
        .filter(|n| n.has_tag_name((W_NS, "p")))
        .map(|p| {
            p.children()
                .filter(|r| r.has_tag_name((W_NS, "r")))
                .map(|r| {
                    r.children()
                        .filter(|t| t.has_tag_name((W_NS, "t")))
                        .filter_map(|t| t.text())
                        .collect::<String>()
                })
                .collect()
        })
        .collect()
}

fn paragraph_texts(xml: &str) -> Vec<String> {
    paragraph_runs(xml).into_iter().map(|runs| runs.concat()).collect()
}

fn fill(body: &str, record: &Record, fields: &[FieldDescriptor], options: FillOptions) -> String {
    let package = DocxPackage::from_bytes(build_docx(&document(body))).unwrap();
    let filled = TokenFiller::new(options).fill(&package, record, fields).unwrap();
    read_part(&filled.bytes, MAIN_CONTENT_PART).unwrap()
}

#[fixture]
fn fields() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("Name", "Customer name", FieldType::Text),
        FieldDescriptor::new("Name2", "Second name", FieldType::Text),
        FieldDescriptor::new("Notes", "Notes", FieldType::Note),
        FieldDescriptor::new("Due", "Due date", FieldType::DateTime),
    ]
}

#[fixture]
fn record() -> Record {
    Record::new()
        .with("Name", "Alice")
        .with("Name2", "Bob")
        .with("Notes", "<p>Hello <b>World</b></p>")
        .with("Due", "2024-01-15T00:00:00Z")
}

#[rstest]
fn test_single_substitution_across_runs(fields: Vec<FieldDescriptor>, record: Record) {
    let body = paragraph(&[run("Hello {Na"), bold_run("me}!")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());

    assert_eq!(paragraph_texts(&xml), vec!["Hello Alice!"]);
    assert_eq!(paragraph_runs(&xml)[0], vec!["Hello ", "Alice", "!"]);
}

#[rstest]
fn test_substituted_run_keeps_first_fragment_formatting(
    fields: Vec<FieldDescriptor>,
    record: Record,
) {
    let body = paragraph(&[run("x "), bold_run("{Name"), run("} y")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());

    let doc = roxmltree::Document::parse(&xml).unwrap();
    let alice_run = doc
        .descendants()
        .filter(|n| n.has_tag_name((W_NS, "r")))
        .find(|r| r.descendants().any(|t| t.text() == Some("Alice")))
        .unwrap();
    assert!(alice_run.descendants().any(|n| n.has_tag_name((W_NS, "b"))));
    assert_eq!(paragraph_texts(&xml), vec!["x Alice y"]);
}

#[rstest]
fn test_document_without_tokens_round_trips(fields: Vec<FieldDescriptor>, record: Record) {
    let body = [
        paragraph(&[run("Plain "), bold_run("text &amp; more")]),
        paragraph(&[run("Second paragraph")]),
    ]
    .concat();
    let source = build_docx(&document(&body));
    let package = DocxPackage::from_bytes(source.clone()).unwrap();
    let filled = TokenFiller::default().fill(&package, &record, &fields).unwrap();
    let xml = read_part(&filled.bytes, MAIN_CONTENT_PART).unwrap();

    assert_eq!(paragraph_runs(&xml), paragraph_runs(package.content()));
    assert_eq!(filled.report.substitutions, 0);
    assert_eq!(
        read_part(&filled.bytes, "word/styles.xml").unwrap(),
        read_part(&source, "word/styles.xml").unwrap()
    );
}

#[rstest]
fn test_same_token_in_separate_paragraphs(fields: Vec<FieldDescriptor>, record: Record) {
    let body = [
        paragraph(&[run("To: {Name}")]),
        paragraph(&[run("Dear {Na"), run("me},")]),
    ]
    .concat();
    let xml = fill(&body, &record, &fields, FillOptions::default());
    assert_eq!(paragraph_texts(&xml), vec!["To: Alice", "Dear Alice,"]);
}

#[rstest]
fn test_unknown_tokens_pass_through(fields: Vec<FieldDescriptor>, record: Record) {
    let body = paragraph(&[run("{Unknown} and {Name}")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());
    assert_eq!(paragraph_texts(&xml), vec!["{Unknown} and Alice"]);
}

#[rstest]
fn test_prefix_keys_do_not_cross_match(fields: Vec<FieldDescriptor>, record: Record) {
    let body = paragraph(&[run("{Name2} / {Name}")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());
    assert_eq!(paragraph_texts(&xml), vec!["Bob / Alice"]);
}

#[test]
fn test_special_characters_in_keys_match_literally() {
    let fields = vec![FieldDescriptor::new("a.b*c+d?", "odd", FieldType::Text)];
    let record = Record::new().with("a.b*c+d?", "literal");
    let body = paragraph(&[run("{aXbbbcdd} {a.b*c+d?}")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());
    assert_eq!(paragraph_texts(&xml), vec!["{aXbbbcdd} literal"]);
}

#[rstest]
fn test_rich_text_and_dates(fields: Vec<FieldDescriptor>, record: Record) {
    let body = [paragraph(&[run("{Notes}")]), paragraph(&[run("{Due}")])].concat();
    let xml = fill(&body, &record, &fields, FillOptions::default());
    let texts = paragraph_texts(&xml);

    assert_eq!(texts[0], "Hello World");
    assert_ne!(texts[1], "2024-01-15T00:00:00Z");
    assert!(texts[1].contains("2024"), "{}", texts[1]);
}

#[rstest]
#[case(TokenStyle::Brackets, "Hi [Name]!")]
#[case(TokenStyle::Angles, "Hi &lt;Name&gt;!")]
#[case(TokenStyle::Underscores, "Hi _Name_!")]
#[case(TokenStyle::Any, "Hi _Name_!")]
fn test_token_styles(
    fields: Vec<FieldDescriptor>,
    record: Record,
    #[case] style: TokenStyle,
    #[case] text: &str,
) {
    let body = paragraph(&[run(text)]);
    let options = FillOptions {
        token_style: style,
        ..FillOptions::default()
    };
    let xml = fill(&body, &record, &fields, options);
    assert_eq!(paragraph_texts(&xml), vec!["Hi Alice!"]);
}

#[rstest]
fn test_whitespace_edges_are_preserved(fields: Vec<FieldDescriptor>, record: Record) {
    let body = paragraph(&[bold_run("Dear {Name} and friends")]);
    let xml = fill(&body, &record, &fields, FillOptions::default());

    assert_eq!(paragraph_runs(&xml)[0], vec!["Dear ", "Alice", " and friends"]);
    let doc = roxmltree::Document::parse(&xml).unwrap();
    let spaced: Vec<&str> = doc
        .descendants()
        .filter(|n| n.has_tag_name((W_NS, "t")))
        .filter(|t| t.attribute((XML_NS, "space")) == Some("preserve"))
        .filter_map(|t| t.text())
        .collect();
    assert_eq!(spaced, vec!["Dear ", " and friends"]);
}

#[rstest]
fn test_report_counts_fields(fields: Vec<FieldDescriptor>, record: Record) {
    let body = [
        paragraph(&[run("{Name} {Name2}")]),
        paragraph(&[run("{Name}")]),
    ]
    .concat();
    let package = DocxPackage::from_bytes(build_docx(&document(&body))).unwrap();
    let filled = TokenFiller::default().fill(&package, &record, &fields).unwrap();

    assert_eq!(filled.report.collections, 2);
    assert_eq!(filled.report.substitutions, 3);
    assert_eq!(filled.report.fields.get("Name"), Some(&2));
    assert_eq!(filled.report.fields.get("Name2"), Some(&1));
}

#[test]
fn test_missing_content_part_is_fatal() {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/other.xml", SimpleFileOptions::default())
        .unwrap();
    writer.write_all(b"<x/>").unwrap();
    let bytes = writer.finish().unwrap().into_inner();

    let err = DocxPackage::from_bytes(bytes).unwrap_err();
    assert!(matches!(err, FillError::MissingContentPart(_)));
}

#[rstest]
fn test_malformed_markup_is_fatal(fields: Vec<FieldDescriptor>, record: Record) {
    let package = DocxPackage::from_bytes(build_docx("<w:document><w:body></w:document>")).unwrap();
    assert!(TokenFiller::default().fill(&package, &record, &fields).is_err());
}

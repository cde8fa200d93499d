use std::io::{Cursor, Read, Write};

use tracing::debug;
use zip::result::ZipError;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::error::{FillError, Result};

/// Main document part of a WordprocessingML package.
pub const MAIN_CONTENT_PART: &str = "word/document.xml";

/// A DOCX package held in memory together with its decoded content part.
#[derive(Debug, Clone)]
pub struct DocxPackage {
    bytes: Vec<u8>,
    content_part: String,
    content: String,
}

impl DocxPackage {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self> {
        Self::with_content_part(bytes, MAIN_CONTENT_PART)
    }

    /// Load a package whose textual content lives in `content_part`.
    pub fn with_content_part(bytes: Vec<u8>, content_part: &str) -> Result<Self> {
        let content = {
            let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
            let mut entry = archive.by_name(content_part).map_err(|e| match e {
                ZipError::FileNotFound => FillError::MissingContentPart(content_part.to_string()),
                other => FillError::Archive(other),
            })?;
            let mut raw = Vec::new();
            entry.read_to_end(&mut raw)?;
            String::from_utf8(raw)?
        };
        debug!(
            "Loaded package ({} bytes), content part {} ({} bytes)",
            bytes.len(),
            content_part,
            content.len()
        );
        Ok(Self {
            bytes,
            content_part: content_part.to_string(),
            content,
        })
    }

    pub fn content_part(&self) -> &str {
        &self.content_part
    }

    /// Markup of the content part as loaded.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Build a new archive with the content part replaced by `xml`.
    ///
    /// Every other entry is copied raw, compressed bytes untouched, in its
    /// original order.
    pub fn repack(&self, xml: &str) -> Result<Vec<u8>> {
        let mut archive = ZipArchive::new(Cursor::new(self.bytes.as_slice()))?;
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.name() != self.content_part {
                writer.raw_copy_file(entry)?;
                continue;
            }
            let method = match entry.compression() {
                CompressionMethod::Stored => CompressionMethod::Stored,
                _ => CompressionMethod::Deflated,
            };
            let name = entry.name().to_string();
            drop(entry);

            let options = SimpleFileOptions::default().compression_method(method);
            writer.start_file(name, options)?;
            writer.write_all(xml.as_bytes())?;
        }

        let out = writer.finish()?.into_inner();
        debug!("Repacked {} entries into {} bytes", archive.len(), out.len());
        Ok(out)
    }
}

/// Read one entry of an archive as text.
pub fn read_part(bytes: &[u8], part_name: &str) -> Result<String> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive.by_name(part_name).map_err(|e| match e {
        ZipError::FileNotFound => FillError::MissingContentPart(part_name.to_string()),
        other => FillError::Archive(other),
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal package: content types, one extra part and `word/document.xml`.
    pub fn package_with_document(document_xml: &str) -> Vec<u8> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        let parts = [
            ("[Content_Types].xml", "<Types/>"),
            ("word/styles.xml", "<w:styles xmlns:w=\"urn:w\"/>"),
            (MAIN_CONTENT_PART, document_xml),
        ];
        for (name, body) in parts {
            writer.start_file(name, deflated).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}

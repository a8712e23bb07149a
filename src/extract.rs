//! Text extraction for word-processor documents (`.docx`).
//!
//! A `.docx` file is a ZIP archive; the body lives in `word/document.xml`.
//! Paragraph text (`<w:p>` / `<w:t>`) is concatenated with newline
//! separators. Tabs and explicit line breaks inside a paragraph are kept;
//! all other structure (styles, headings, tables) is dropped.

use std::io::Read;

use quick_xml::events::Event;
use thiserror::Error;

/// Maximum decompressed bytes to read from the document part (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("not a valid .docx archive: {0}")]
    Archive(String),
    #[error("word/document.xml not found")]
    MissingDocument,
    #[error("word/document.xml exceeds size limit ({0} bytes)")]
    TooLarge(u64),
    #[error("malformed document XML: {0}")]
    Xml(String),
}

/// Extract paragraph text from `.docx` bytes.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Archive(e.to_string()))?;

    let entry = archive.by_name(DOCUMENT_PART).map_err(|e| match e {
        zip::result::ZipError::FileNotFound => ExtractError::MissingDocument,
        other => ExtractError::Archive(other.to_string()),
    })?;

    let mut doc_xml = Vec::new();
    entry
        .take(MAX_XML_ENTRY_BYTES)
        .read_to_end(&mut doc_xml)
        .map_err(|e| ExtractError::Archive(e.to_string()))?;
    if doc_xml.len() as u64 >= MAX_XML_ENTRY_BYTES {
        return Err(ExtractError::TooLarge(MAX_XML_ENTRY_BYTES));
    }

    let paragraphs = extract_paragraphs(&doc_xml)?;
    Ok(paragraphs.join("\n"))
}

/// Collect paragraph text in document order.
///
/// A text box is a `<w:p>` nested inside another paragraph. The outer text
/// read so far is emitted before the nested paragraph, and whatever follows
/// the box becomes its own paragraph.
fn extract_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut split = false;
    let mut in_text = false;

    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if depth == 0 {
                        current.clear();
                        split = false;
                    } else {
                        if !current.is_empty() {
                            paragraphs.push(std::mem::take(&mut current));
                        }
                        split = true;
                    }
                    depth += 1;
                }
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => {
                    if depth > 0 && !current.is_empty() {
                        paragraphs.push(std::mem::take(&mut current));
                        split = true;
                    }
                    paragraphs.push(String::new());
                }
                b"tab" if depth > 0 => current.push('\t'),
                b"br" | b"cr" if depth > 0 => current.push('\n'),
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                let text = te.unescape().map_err(|e| ExtractError::Xml(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    depth = depth.saturating_sub(1);
                    let text = std::mem::take(&mut current);
                    if !(depth == 0 && split && text.is_empty()) {
                        paragraphs.push(text);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Xml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

#[cfg(test)]
fn docx_from_xml(xml: &str) -> Vec<u8> {
    use std::io::Write;

    let mut out = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut out));
        zip.start_file(DOCUMENT_PART, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap();
    }
    out
}

#[cfg(test)]
pub(crate) fn docx_fixture(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|p| {
            if p.is_empty() {
                "<w:p/>".to_string()
            } else {
                format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", p)
            }
        })
        .collect();
    let xml = format!(
        "<?xml version=\"1.0\"?><w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>{}</w:body></w:document>",
        body
    );
    docx_from_xml(&xml)
}

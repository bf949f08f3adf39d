use std::io::{Cursor, Read};

use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::extraction::ExtractError;

/// Separator placed between cells when a table row is flattened.
const CELL_SEPARATOR: &str = " | ";
/// Upper bound on the decompressed size of `word/document.xml`.
const MAX_DOCUMENT_XML_BYTES: u64 = 16 * 1024 * 1024;

/// Extracts paragraph text from a DOCX archive in document order.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    extract_docx_with_limit(bytes, MAX_DOCUMENT_XML_BYTES)
}

fn extract_docx_with_limit(bytes: &[u8], max_xml_bytes: u64) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ExtractError::CorruptDocument(format!("Failed to open DOCX: {e}")))?;

    let mut document_xml = archive.by_name("word/document.xml").map_err(|e| {
        ExtractError::CorruptDocument(format!("Failed to find document.xml: {e}"))
    })?;

    let too_large = || {
        ExtractError::CorruptDocument(format!(
            "document.xml expands beyond {max_xml_bytes} bytes"
        ))
    };
    if document_xml.size() > max_xml_bytes {
        return Err(too_large());
    }

    // The declared size is not trusted; the read itself is bounded too.
    let mut raw = Vec::new();
    document_xml
        .by_ref()
        .take(max_xml_bytes + 1)
        .read_to_end(&mut raw)
        .map_err(|e| ExtractError::CorruptDocument(format!("Failed to read document.xml: {e}")))?;
    if raw.len() as u64 > max_xml_bytes {
        return Err(too_large());
    }

    let xml = String::from_utf8(raw)
        .map_err(|e| ExtractError::CorruptDocument(format!("document.xml is not UTF-8: {e}")))?;
    parse_document_xml(&xml)
}

/// Rows collected for one (possibly nested) table.
#[derive(Default)]
struct TableState {
    lines: Vec<String>,
    row: Vec<String>,
    cell: Vec<String>,
}

/// Open block-level elements, innermost last. Text boxes put paragraphs
/// inside paragraphs, and tables nest inside cells and text boxes.
enum Block {
    Paragraph(String),
    Table(TableState),
}

/// Hands a finished paragraph or flattened table to whatever encloses it.
fn emit(blocks: &mut [Block], text: &mut String, content: &str) {
    match blocks.last_mut() {
        Some(Block::Table(table)) => {
            let content = content.trim();
            if !content.is_empty() {
                table.cell.push(content.to_string());
            }
        }
        Some(Block::Paragraph(parent)) => {
            if !parent.is_empty() && !parent.ends_with('\n') {
                parent.push('\n');
            }
            parent.push_str(content);
            parent.push('\n');
        }
        None => {
            text.push_str(content);
            text.push('\n');
        }
    }
}

fn current_paragraph(blocks: &mut [Block]) -> Option<&mut String> {
    match blocks.last_mut() {
        Some(Block::Paragraph(paragraph)) => Some(paragraph),
        _ => None,
    }
}

fn current_table(blocks: &mut [Block]) -> Option<&mut TableState> {
    match blocks.last_mut() {
        Some(Block::Table(table)) => Some(table),
        _ => None,
    }
}

/// Walks `word/document.xml`. Paragraphs become lines; each table row becomes
/// one line with its cells joined by `CELL_SEPARATOR`. Only the preferred
/// branch of `mc:AlternateContent` is read.
fn parse_document_xml(xml: &str) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);

    let mut text = String::new();
    let mut blocks: Vec<Block> = Vec::new();
    let mut in_text_element = false;
    let mut run_depth = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = true,
                b"r" => run_depth += 1,
                b"p" => blocks.push(Block::Paragraph(String::new())),
                b"tbl" => blocks.push(Block::Table(TableState::default())),
                b"Fallback" => {
                    let end = e.name().as_ref().to_vec();
                    reader.read_to_end(QName(&end)).map_err(|err| {
                        ExtractError::CorruptDocument(format!("XML parsing error: {err}"))
                    })?;
                }
                _ => {}
            },
            Ok(Event::Empty(ref e)) => match e.local_name().as_ref() {
                b"p" => emit(&mut blocks, &mut text, ""),
                // Tab stops in paragraph properties share the `tab` name; only
                // tabs inside a run are content.
                b"tab" if run_depth > 0 => {
                    if let Some(paragraph) = current_paragraph(&mut blocks) {
                        paragraph.push('\t');
                    }
                }
                b"br" | b"cr" if run_depth > 0 => {
                    if let Some(paragraph) = current_paragraph(&mut blocks) {
                        paragraph.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"t" => in_text_element = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => {
                    if let Some(Block::Paragraph(paragraph)) = blocks.pop() {
                        emit(&mut blocks, &mut text, &paragraph);
                    }
                }
                b"tc" => {
                    if let Some(table) = current_table(&mut blocks) {
                        let cell = table.cell.join(" ");
                        table.row.push(cell);
                        table.cell.clear();
                    }
                }
                b"tr" => {
                    if let Some(table) = current_table(&mut blocks) {
                        let line = table
                            .row
                            .iter()
                            .filter(|c| !c.is_empty())
                            .map(String::as_str)
                            .collect::<Vec<_>>()
                            .join(CELL_SEPARATOR);
                        if !line.is_empty() {
                            table.lines.push(line);
                        }
                        table.row.clear();
                    }
                }
                b"tbl" => {
                    if let Some(Block::Table(finished)) = blocks.pop() {
                        emit(&mut blocks, &mut text, &finished.lines.join("\n"));
                    }
                }
                _ => {}
            },
            Ok(Event::Text(e)) => {
                if in_text_element {
                    let decoded = e.unescape().map_err(|err| {
                        ExtractError::CorruptDocument(format!("Invalid text in document.xml: {err}"))
                    })?;
                    if let Some(paragraph) = current_paragraph(&mut blocks) {
                        paragraph.push_str(&decoded);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(ExtractError::CorruptDocument(format!(
                    "XML parsing error: {e}"
                )));
            }
            _ => {}
        }
    }

    Ok(text)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Builds a minimal DOCX archive around the given `<w:body>` content.
    pub(crate) fn build_docx(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(xml.as_bytes()).unwrap();
        writer.finish().unwrap().into_inner()
    }

    fn para(text: &str) -> String {
        format!(r#"<w:p><w:r><w:t xml:space="preserve">{text}</w:t></w:r></w:p>"#)
    }

    #[test]
    fn test_paragraphs_in_document_order() {
        let body = format!("{}{}{}", para("Jane Roe"), para("Data Analyst"), para("Berlin"));
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "Jane Roe\nData Analyst\nBerlin\n");
    }

    #[test]
    fn test_runs_keep_preserved_spaces() {
        let body = r#"<w:p><w:r><w:t>Senior</w:t></w:r><w:r><w:t xml:space="preserve"> Engineer</w:t></w:r></w:p>"#;
        let text = extract_docx(&build_docx(body)).unwrap();
        assert_eq!(text, "Senior Engineer\n");
    }

    #[test]
    fn test_escaped_entities_decoded() {
        let text = extract_docx(&build_docx(&para("R&amp;D &lt;team&gt;"))).unwrap();
        assert_eq!(text, "R&D <team>\n");
    }

    #[test]
    fn test_table_flattened_row_wise() {
        let body = format!(
            "{}<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>{}",
            para("SKILLS"),
            para("Rust"),
            para("Expert"),
            para("Python"),
            para("Advanced"),
            para("END"),
        );
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "SKILLS\nRust | Expert\nPython | Advanced\nEND\n");
    }

    #[test]
    fn test_tabs_and_breaks() {
        let body = r#"<w:p><w:r><w:t>2019</w:t><w:tab/><w:t>Acme</w:t><w:br/><w:t>Lead</w:t></w:r></w:p>"#;
        let text = extract_docx(&build_docx(body)).unwrap();
        assert_eq!(text, "2019\tAcme\nLead\n");
    }

    #[test]
    fn test_tab_stop_definitions_ignored() {
        let body = r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr><w:r><w:t>Profile</w:t></w:r></w:p>"#;
        let text = extract_docx(&build_docx(body)).unwrap();
        assert_eq!(text, "Profile\n");
    }

    #[test]
    fn test_not_a_zip_is_corrupt() {
        assert!(matches!(
            extract_docx(b"PK\x03\x04garbage"),
            Err(ExtractError::CorruptDocument(_))
        ));
    }

    #[test]
    fn test_zip_without_document_xml_is_corrupt() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("hello.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(b"hi").unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        assert!(matches!(
            extract_docx(&bytes),
            Err(ExtractError::CorruptDocument(_))
        ));
    }

    fn text_box(inner: &str) -> String {
        format!(
            r#"<w:r><mc:AlternateContent xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006"><mc:Choice Requires="wps"><w:drawing><wps:txbx xmlns:wps="http://schemas.microsoft.com/office/word/2010/wordprocessingShape"><w:txbxContent>{inner}</w:txbxContent></wps:txbx></w:drawing></mc:Choice><mc:Fallback><w:pict><v:textbox xmlns:v="urn:schemas-microsoft-com:vml"><w:txbxContent>{inner}</w:txbxContent></v:textbox></w:pict></mc:Fallback></mc:AlternateContent></w:r>"#
        )
    }

    #[test]
    fn test_text_box_keeps_surrounding_text_once() {
        let body = format!(
            r#"<w:p><w:r><w:t xml:space="preserve">Contact: </w:t></w:r>{}<w:r><w:t>jane@example.com</w:t></w:r></w:p>{}"#,
            text_box(&para("Jane Roe")),
            para("EXPERIENCE"),
        );
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "Contact: \nJane Roe\njane@example.com\nEXPERIENCE\n");
        assert_eq!(text.matches("Jane Roe").count(), 1);
    }

    #[test]
    fn test_text_box_with_several_paragraphs() {
        let inner = format!("{}{}", para("SKILLS"), para("Rust, Go"));
        let body = format!("<w:p>{}</w:p>", text_box(&inner));
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "SKILLS\nRust, Go\n\n");
    }

    #[test]
    fn test_empty_paragraphs_kept_as_blank_lines() {
        let body = format!("{}<w:p/><w:p/>{}", para("EXPERIENCE"), para("EDUCATION"));
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "EXPERIENCE\n\n\nEDUCATION\n");
    }

    #[test]
    fn test_empty_paragraph_in_table_ignored() {
        let body = format!(
            "<w:tbl><w:tr><w:tc><w:p/>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            para("Rust"),
            para("Expert"),
        );
        let text = extract_docx(&build_docx(&body)).unwrap();
        assert_eq!(text, "Rust | Expert\n");
    }

    #[test]
    fn test_oversized_document_xml_is_corrupt() {
        let body = para(&"A".repeat(4096));
        let bytes = build_docx(&body);
        assert!(matches!(
            extract_docx_with_limit(&bytes, 1024),
            Err(ExtractError::CorruptDocument(_))
        ));
        assert!(extract_docx_with_limit(&bytes, 64 * 1024).is_ok());
    }
}

//! Document extraction: turns an uploaded resume (PDF, DOCX or plain text)
//! into a single trimmed UTF-8 text blob.
//!
//! Format resolution combines the declared filename extension, the declared
//! MIME type and a header sniff of the content. A declared format outside the
//! supported set fails before any parsing happens.

pub mod docx;
pub mod pdf;
pub mod text;

use bytes::Bytes;
use thiserror::Error;
use tracing::{debug, warn};

const DOCX_MIME: &str = "application/vnd.openxmlformats-officedocument.wordprocessingml.document";
/// Bytes inspected when deciding whether content looks like text.
const SNIFF_WINDOW: usize = 1024;

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("The document could not be read: {0}")]
    CorruptDocument(String),

    #[error("No extractable text was found in the document")]
    EmptyContent,
}

/// An uploaded document as received from the client. Lives for one request.
#[derive(Debug, Clone)]
pub struct RawUpload {
    pub bytes: Bytes,
    pub filename: String,
    pub content_type: Option<String>,
}

impl RawUpload {
    /// Wraps pasted resume text so it flows through the same extraction path.
    pub fn from_pasted_text(text: String) -> Self {
        Self {
            bytes: Bytes::from(text),
            filename: "pasted.txt".to_string(),
            content_type: Some("text/plain".to_string()),
        }
    }
}

/// Non-empty, trimmed resume text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedText(String);

impl ExtractedText {
    pub fn new(text: &str) -> Result<Self, ExtractError> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ExtractError::EmptyContent);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Text,
}

/// What the client said the upload is.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Claim {
    Supported(DocumentFormat),
    /// `.doc` / `application/msword`: may be OOXML under an old name, or a
    /// genuine OLE2 binary document.
    LegacyWord,
    Unsupported(String),
    Unknown,
}

impl Claim {
    fn from_extension(filename: &str) -> Self {
        let extension = match filename.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
            _ => return Claim::Unknown,
        };
        match extension.as_str() {
            "pdf" => Claim::Supported(DocumentFormat::Pdf),
            "docx" => Claim::Supported(DocumentFormat::Docx),
            "doc" => Claim::LegacyWord,
            "txt" | "text" | "md" => Claim::Supported(DocumentFormat::Text),
            _ => Claim::Unsupported(extension),
        }
    }

    fn from_mime(content_type: Option<&str>) -> Self {
        let mime = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|m| m.trim().to_ascii_lowercase())
            .unwrap_or_default();
        match mime.as_str() {
            "" | "application/octet-stream" => Claim::Unknown,
            "application/pdf" => Claim::Supported(DocumentFormat::Pdf),
            DOCX_MIME => Claim::Supported(DocumentFormat::Docx),
            "application/msword" => Claim::LegacyWord,
            "text/plain" | "text/markdown" => Claim::Supported(DocumentFormat::Text),
            _ => Claim::Unsupported(mime),
        }
    }

    fn format(&self) -> Option<DocumentFormat> {
        match self {
            Claim::Supported(format) => Some(*format),
            Claim::LegacyWord => Some(DocumentFormat::Docx),
            _ => None,
        }
    }
}

/// What the first bytes of the upload look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sniffed {
    Pdf,
    Zip,
    Ole,
    Image(&'static str),
    Text,
    Binary,
}

fn sniff(bytes: &[u8]) -> Sniffed {
    if bytes.starts_with(b"%PDF-") {
        return Sniffed::Pdf;
    }
    if bytes.starts_with(b"PK\x03\x04") {
        return Sniffed::Zip;
    }
    if bytes.starts_with(&[0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1]) {
        return Sniffed::Ole;
    }
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        return Sniffed::Image("png");
    }
    if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return Sniffed::Image("jpeg");
    }
    if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        return Sniffed::Image("gif");
    }
    if bytes.starts_with(&[0xFF, 0xFE]) || bytes.starts_with(&[0xFE, 0xFF]) {
        return Sniffed::Text;
    }

    let window = &bytes[..bytes.len().min(SNIFF_WINDOW)];
    if window.contains(&0) {
        return Sniffed::Binary;
    }
    let controls = window
        .iter()
        .filter(|&&b| b < 0x20 && !matches!(b, b'\t' | b'\n' | b'\r' | 0x0C))
        .count();
    if controls * 10 > window.len() {
        Sniffed::Binary
    } else {
        Sniffed::Text
    }
}

/// Decides which extractor handles the upload.
fn resolve_format(upload: &RawUpload) -> Result<DocumentFormat, ExtractError> {
    let by_extension = Claim::from_extension(&upload.filename);
    let by_mime = Claim::from_mime(upload.content_type.as_deref());

    // An explicit unsupported declaration on either side fails without
    // looking at the content, whatever the other side claims.
    for claim in [&by_extension, &by_mime] {
        if let Claim::Unsupported(label) = claim {
            return Err(ExtractError::UnsupportedFormat(label.clone()));
        }
    }

    let claimed = by_extension.format().or_else(|| by_mime.format());

    let Some(claimed) = claimed else {
        return match sniff(&upload.bytes) {
            Sniffed::Pdf => Ok(DocumentFormat::Pdf),
            Sniffed::Zip => Ok(DocumentFormat::Docx),
            Sniffed::Text => Ok(DocumentFormat::Text),
            Sniffed::Ole => Err(legacy_word_error()),
            Sniffed::Image(kind) => Err(ExtractError::UnsupportedFormat(kind.to_string())),
            Sniffed::Binary => Err(ExtractError::UnsupportedFormat(
                "unrecognized binary content".to_string(),
            )),
        };
    };

    if by_extension != Claim::Unknown
        && by_mime != Claim::Unknown
        && by_extension.format() != by_mime.format()
    {
        warn!(
            filename = %upload.filename,
            content_type = ?upload.content_type,
            "Declared extension and MIME type disagree; sniffing content"
        );
    }

    let resolved = match sniff(&upload.bytes) {
        Sniffed::Pdf => DocumentFormat::Pdf,
        Sniffed::Zip => DocumentFormat::Docx,
        Sniffed::Ole => return Err(legacy_word_error()),
        Sniffed::Image(kind) => return Err(ExtractError::UnsupportedFormat(kind.to_string())),
        Sniffed::Text => DocumentFormat::Text,
        // Let the claimed extractor report the corruption.
        Sniffed::Binary => claimed,
    };

    if resolved != claimed {
        warn!(
            filename = %upload.filename,
            ?claimed,
            ?resolved,
            "Upload content does not match its declared format"
        );
    }
    Ok(resolved)
}

fn legacy_word_error() -> ExtractError {
    ExtractError::UnsupportedFormat(
        "legacy binary Word document (.doc); please save it as .docx or PDF".to_string(),
    )
}

/// Extracts the text of an upload. Consumes the upload so its bytes are
/// released as soon as extraction finishes.
pub fn extract(upload: RawUpload) -> Result<ExtractedText, ExtractError> {
    let format = resolve_format(&upload)?;
    debug!(
        filename = %upload.filename,
        size = upload.bytes.len(),
        ?format,
        "Extracting document text"
    );

    let text = match format {
        DocumentFormat::Pdf => pdf::extract_pdf(&upload.bytes)?,
        DocumentFormat::Docx => docx::extract_docx(&upload.bytes)?,
        DocumentFormat::Text => text::decode_text(&upload.bytes)?,
    };

    ExtractedText::new(&text)
}

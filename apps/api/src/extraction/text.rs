use tracing::debug;

use crate::extraction::ExtractError;

/// Windows-1252 code points for bytes 0x80..=0x9F. `None` marks bytes the
/// encoding leaves undefined.
const CP1252_HIGH: [Option<char>; 32] = [
    Some('€'), None, Some('‚'), Some('ƒ'), Some('„'), Some('…'), Some('†'), Some('‡'),
    Some('ˆ'), Some('‰'), Some('Š'), Some('‹'), Some('Œ'), None, Some('Ž'), None,
    None, Some('‘'), Some('’'), Some('“'), Some('”'), Some('•'), Some('–'), Some('—'),
    Some('˜'), Some('™'), Some('š'), Some('›'), Some('œ'), None, Some('ž'), Some('Ÿ'),
];

/// Decodes a plain-text upload.
///
/// Honors UTF-8 and UTF-16 byte order marks, then tries UTF-8, then falls
/// back to Windows-1252 (the usual encoding of text exported by older
/// Windows editors).
pub fn decode_text(bytes: &[u8]) -> Result<String, ExtractError> {
    if let Some(rest) = bytes.strip_prefix(&[0xFF, 0xFE]) {
        return decode_utf16(rest, u16::from_le_bytes);
    }
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        return decode_utf16(rest, u16::from_be_bytes);
    }

    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    if bytes.contains(&0) {
        return Err(ExtractError::CorruptDocument(
            "file contains binary data".to_string(),
        ));
    }

    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(e) => {
            debug!("Text is not valid UTF-8 ({e}); falling back to Windows-1252");
            decode_windows_1252(bytes)
        }
    }
}

fn decode_utf16(bytes: &[u8], to_unit: fn([u8; 2]) -> u16) -> Result<String, ExtractError> {
    if bytes.len() % 2 != 0 {
        return Err(ExtractError::CorruptDocument(
            "truncated UTF-16 text".to_string(),
        ));
    }
    let units = bytes.chunks_exact(2).map(|pair| to_unit([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<Result<String, _>>()
        .map_err(|e| ExtractError::CorruptDocument(format!("invalid UTF-16 text: {e}")))
}

fn decode_windows_1252(bytes: &[u8]) -> Result<String, ExtractError> {
    bytes
        .iter()
        .map(|&b| match b {
            0x80..=0x9F => CP1252_HIGH[(b - 0x80) as usize].ok_or_else(|| {
                ExtractError::CorruptDocument(format!(
                    "text is neither UTF-8 nor Windows-1252 (byte 0x{b:02X})"
                ))
            }),
            _ => Ok(char::from(b)),
        })
        .collect()
}

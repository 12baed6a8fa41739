//! Loader for tab-separated `id<TAB>title` files
//!
//! Files come from spreadsheets and old desktop exports, so the encoding is
//! sniffed (BOM first, then UTF-16LE when NUL bytes show up, then UTF-8 and
//! Windows-1251) and the column separator is recovered from whatever the exporter produced.

use dupfind_core::{Error, Item, Result};
use encoding_rs::{Encoding, UTF_16LE, UTF_8, WINDOWS_1251};
use std::borrow::Cow;
use std::path::Path;
use tracing::{debug, warn};

/// BOM-less UTF-16 carries NUL bytes, which 8-bit exports never do
fn looks_like_utf16(bytes: &[u8]) -> bool {
    bytes.len() % 2 == 0 && bytes.contains(&0)
}

/// Byte range of the first run of two or more whitespace characters
fn find_wide_gap(line: &str) -> Option<(usize, usize)> {
    let mut run: Option<(usize, usize)> = None;
    for (pos, ch) in line.char_indices() {
        if ch.is_whitespace() {
            let (start, len) = run.unwrap_or((pos, 0));
            run = Some((start, len + 1));
        } else if let Some((start, len)) = run.take() {
            if len >= 2 {
                return Some((start, pos));
            }
        }
    }
    match run {
        Some((start, len)) if len >= 2 => Some((start, line.len())),
        _ => None,
    }
}

/// Decode raw file bytes, returning the text and the name of the encoding used.
///
/// # Errors
/// [`Error::InputFormat`] when no candidate encoding decodes the bytes cleanly.
pub fn decode_text(bytes: &[u8]) -> Result<(String, &'static str)> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return encoding
            .decode_without_bom_handling_and_without_replacement(&bytes[bom_len..])
            .map(|text| (text.into_owned(), encoding.name()))
            .ok_or_else(|| {
                Error::InputFormat(format!("malformed {} content after BOM", encoding.name()))
            });
    }

    // NULs are valid UTF-8, so wide text tries UTF-16LE first.
    // Windows-1251 maps every byte and goes last.
    let candidates: &[&'static Encoding] = if looks_like_utf16(bytes) {
        &[UTF_16LE, UTF_8, WINDOWS_1251]
    } else {
        &[UTF_8, WINDOWS_1251]
    };

    for &encoding in candidates {
        if let Some(text) = encoding.decode_without_bom_handling_and_without_replacement(bytes) {
            return Ok((text.into_owned(), encoding.name()));
        }
    }

    Err(Error::InputFormat(
        "content is not valid UTF-8, Windows-1251 or UTF-16LE".to_string(),
    ))
}

/// Split one line into `(id, title)`.
///
/// A real tab wins; otherwise the first run of two or more whitespace
/// characters; otherwise the first single space. `None` if none applies.
fn split_record(line: &str) -> Option<(&str, &str)> {
    if let Some((id, title)) = line.split_once('\t') {
        return Some((id.trim(), title.trim()));
    }

    let line = line.trim();
    if let Some((start, end)) = find_wide_gap(line) {
        return Some((&line[..start], &line[end..]));
    }
    line.split_once(' ')
        .map(|(id, title)| (id.trim(), title.trim()))
}

/// Parse decoded text into items, skipping blank and malformed lines.
///
/// `source` only labels the warnings.
pub fn parse_records(text: &str, source: &str) -> Vec<Item> {
    let mut items = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        // Exports sometimes carry the escape sequence instead of the character
        let line: Cow<'_, str> = if line.contains("\\t") {
            Cow::Owned(line.replace("\\t", "\t"))
        } else {
            Cow::Borrowed(line)
        };

        match split_record(&line) {
            Some((id, title)) => items.push(Item::new(id, title)),
            None => warn!(
                source,
                line = line_no + 1,
                content = %line,
                "Skipping line without id/title separator"
            ),
        }
    }
    items
}

/// Read and parse a tab-separated file.
///
/// # Errors
/// [`Error::InputFormat`] when the file does not exist or cannot be decoded,
/// [`Error::Io`] for any other read failure.
pub fn load_tab_file(path: impl AsRef<Path>) -> Result<Vec<Item>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => {
            Error::InputFormat(format!("{}: file not found", path.display()))
        }
        _ => Error::Io(e),
    })?;
    let (text, encoding) = decode_text(&bytes).map_err(|e| match e {
        Error::InputFormat(msg) => Error::InputFormat(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;
    let items = parse_records(&text, &path.display().to_string());
    debug!(
        path = %path.display(),
        encoding,
        items = items.len(),
        "Loaded tab-separated file"
    );
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn pairs(items: &[Item]) -> Vec<(&str, &str)> {
        items
            .iter()
            .map(|i| (i.id.as_str(), i.raw_title.as_str()))
            .collect()
    }

    #[test]
    fn test_separators() {
        let text = "1\tTab title\n2  Wide gap title\n3 Single space title\n4\\tEscaped tab\n";
        let items = parse_records(text, "test");
        assert_eq!(
            pairs(&items),
            [
                ("1", "Tab title"),
                ("2", "Wide gap title"),
                ("3", "Single space title"),
                ("4", "Escaped tab"),
            ]
        );
    }

    #[test]
    fn test_skips_blank_and_malformed() {
        let text = "\n1001\tPhone\r\n   \nlonelyid\n1002\tLaptop\n";
        let items = parse_records(text, "test");
        assert_eq!(pairs(&items), [("1001", "Phone"), ("1002", "Laptop")]);
    }

    #[test]
    fn test_tab_with_empty_title() {
        let items = parse_records("7\t\n", "test");
        assert_eq!(pairs(&items), [("7", "")]);
    }

    #[test]
    fn test_decode_utf8() {
        let (text, encoding) = decode_text("1\tСмартфон".as_bytes()).unwrap();
        assert_eq!(text, "1\tСмартфон");
        assert_eq!(encoding, "UTF-8");
    }

    #[test]
    fn test_decode_windows_1251() {
        let (bytes, _, _) = WINDOWS_1251.encode("1\tСмартфон синий");
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "1\tСмартфон синий");
        assert_eq!(encoding, "windows-1251");
    }

    #[test]
    fn test_decode_utf16_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "1\tНоутбук".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "1\tНоутбук");
        assert_eq!(encoding, "UTF-16LE");
    }

    #[test]
    fn test_decode_utf16_without_bom() {
        let bytes: Vec<u8> = "1\tPhone"
            .encode_utf16()
            .flat_map(|unit| unit.to_le_bytes())
            .collect();
        let (text, encoding) = decode_text(&bytes).unwrap();
        assert_eq!(text, "1\tPhone");
        assert_eq!(encoding, "UTF-16LE");
    }

    #[test]
    fn test_decode_utf8_bom_is_stripped() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice(b"1\tPhone");
        let (text, _) = decode_text(&bytes).unwrap();
        assert_eq!(text, "1\tPhone");
    }

    #[test]
    fn test_load_tab_file() {
        let mut file = NamedTempFile::new().unwrap();
        let (bytes, _, _) = WINDOWS_1251.encode("1001\tНоутбук Apple\n1002  Пылесос Dyson\n");
        file.write_all(&bytes).unwrap();

        let items = load_tab_file(file.path()).unwrap();
        assert_eq!(
            pairs(&items),
            [("1001", "Ноутбук Apple"), ("1002", "Пылесос Dyson")]
        );
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_tab_file("/nonexistent/dupfind/catalog.tsv").unwrap_err();
        assert!(matches!(err, Error::InputFormat(_)), "{}", err);
    }
}

//! Response body decoding.

use encoding_rs::{Encoding, UTF_8};
use regex::bytes::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

/// How far into the document a `<meta>` charset declaration is looked for.
const SNIFF_WINDOW_BYTES: usize = 1024;

static CONTENT_TYPE_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)charset\s*=\s*["']?([A-Za-z0-9_.:\-]+)"#).unwrap());
static META_CHARSET: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([A-Za-z0-9_.:\-]+)"#).unwrap());

/// Decodes a response body into text.
///
/// The charset announced by the `Content-Type` header wins. When the server
/// omits one, a `<meta charset>` or `http-equiv` declaration near the top of
/// the document is honoured, and UTF-8 is assumed otherwise. A byte order mark
/// overrides all of these. Malformed sequences become U+FFFD.
pub fn decode(body: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(|value| label(&CONTENT_TYPE_CHARSET, value.as_bytes()))
        .or_else(|| label(&META_CHARSET, &body[..body.len().min(SNIFF_WINDOW_BYTES)]))
        .unwrap_or(UTF_8);
    let (text, used, malformed) = encoding.decode(body);
    if malformed {
        tracing::debug!(encoding = used.name(), "Body contained malformed sequences; replaced with U+FFFD");
    }
    match text {
        Cow::Borrowed(text) => text.to_string(),
        Cow::Owned(text) => text,
    }
}

fn label(pattern: &Regex, haystack: &[u8]) -> Option<&'static Encoding> {
    let captures = pattern.captures(haystack)?;
    Encoding::for_label(captures.get(1)?.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn header_charset_wins() {
        // "Zürich" in ISO-8859-1.
        let body = b"<html><meta charset=\"utf-8\"><p>Z\xfcrich</p></html>";
        let text = decode(body, Some("text/html; charset=ISO-8859-1"));
        assert!(text.contains("Zürich"));
    }

    #[rstest]
    #[case::html5(b"<html><head><meta charset=\"windows-1252\"></head><p>caf\xe9</p>".as_slice())]
    #[case::http_equiv(
        b"<meta http-equiv=\"Content-Type\" content=\"text/html; charset=iso-8859-1\"><p>caf\xe9</p>".as_slice()
    )]
    fn meta_declaration_used_without_header(#[case] body: &[u8]) {
        assert!(decode(body, Some("text/html")).contains("café"));
    }

    #[test]
    fn defaults_to_utf8() {
        assert_eq!(decode("Genève".as_bytes(), None), "Genève");
    }

    #[test]
    fn bom_overrides_declared_charset() {
        let mut body = vec![0xEF, 0xBB, 0xBF];
        body.extend_from_slice("Lausanne Ü".as_bytes());
        assert_eq!(decode(&body, Some("text/html; charset=iso-8859-1")), "Lausanne Ü");
    }

    #[test]
    fn meta_declaration_past_window_is_ignored() {
        let mut body = vec![b' '; SNIFF_WINDOW_BYTES];
        body.extend_from_slice(b"<meta charset=\"iso-8859-1\"><p>\xc3\xa9</p>");
        assert!(decode(&body, None).contains('é'));
    }

    #[test]
    fn unknown_label_falls_back_to_utf8() {
        assert_eq!(decode("Bâle".as_bytes(), Some("text/html; charset=klingon")), "Bâle");
    }
}

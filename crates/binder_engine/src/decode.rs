use chardetng::EncodingDetector;
use encoding_rs::Encoding;

/// How far into a document a `<meta charset>` declaration is looked for.
const META_PRESCAN_LEN: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPage {
    pub html: String,
    pub encoding_label: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Decode a page to UTF-8.
///
/// Order: BOM, `Content-Type` charset, `<meta charset>` in the first KiB,
/// then a chardetng guess.
pub fn decode_page(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedPage, DecodeError> {
    if let Some((encoding, bom_len)) = Encoding::for_bom(bytes) {
        return decode_with(&bytes[bom_len..], encoding);
    }

    let declared = content_type
        .and_then(charset_param)
        .or_else(|| meta_charset(&bytes[..bytes.len().min(META_PRESCAN_LEN)]));
    if let Some(enc) = declared.and_then(|label| Encoding::for_label(label.as_bytes())) {
        return decode_with(bytes, enc);
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset_param(content_type: &str) -> Option<String> {
    content_type.split(';').skip(1).find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\'']).to_string())
    })
}

fn meta_charset(head: &[u8]) -> Option<String> {
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();
    let start = head.find("charset=")? + "charset=".len();
    let value: String = head[start..]
        .trim_start_matches(['"', '\''])
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.'))
        .collect();
    (!value.is_empty()).then_some(value)
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> Result<DecodedPage, DecodeError> {
    let (text, had_errors) = enc.decode_without_bom_handling(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: enc.name().to_string(),
            message: "malformed byte sequence".into(),
        });
    }
    Ok(DecodedPage {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bom_wins_over_header() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("நிலா".as_bytes());
        let page = decode_page(&bytes, Some("text/html; charset=windows-1252")).unwrap();
        assert_eq!(page.html, "நிலா");
        assert_eq!(page.encoding_label, "UTF-8");
    }

    #[test]
    fn header_charset_is_honoured() {
        let page = decode_page(b"caf\xe9", Some("text/html; Charset=\"ISO-8859-1\"")).unwrap();
        assert_eq!(page.html, "café");
    }

    #[test]
    fn meta_charset_is_found_in_prescan() {
        let bytes = b"<html><head><meta charset=\"windows-1252\"></head><body>na\xefve</body>";
        let page = decode_page(bytes, Some("text/html")).unwrap();
        assert!(page.html.contains("naïve"));
    }

    #[test]
    fn invalid_declared_utf8_is_an_error() {
        let err = decode_page(b"abc \xff\xfd", Some("text/html; charset=utf-8"));
        assert!(matches!(err, Err(DecodeError::DecodeFailure { .. })));
    }
}

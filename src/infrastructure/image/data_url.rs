//! Local resolution of `data:` URLs (RFC 2397).

use base64::Engine;

use crate::domain::entities::FetchedImage;
use crate::domain::errors::LoadError;

const DATA_URL_PREFIX: &str = "data:";
const DEFAULT_MEDIA_TYPE: &str = "text/plain;charset=US-ASCII";

/// Returns true if `url` carries its payload inline.
#[must_use]
pub fn is_data_url(url: &str) -> bool {
    url.get(..DATA_URL_PREFIX.len())
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case(DATA_URL_PREFIX))
}

/// Decodes a `data:` URL into bytes and its media type.
///
/// # Errors
/// Returns `LoadError::Fetch` for a malformed URL or payload.
pub fn decode_data_url(url: &str) -> Result<FetchedImage, LoadError> {
    if !is_data_url(url) {
        return Err(LoadError::fetch("URL does not start with 'data:'"));
    }

    let rest = &url[DATA_URL_PREFIX.len()..];
    let (metadata, data) = rest
        .split_once(',')
        .ok_or_else(|| LoadError::fetch("missing comma in data URL"))?;

    let mut params = metadata.split(';').map(str::trim);
    let media_type = params.next().unwrap_or_default();
    let is_base64 = params.any(|p| p.eq_ignore_ascii_case("base64"));

    let bytes = if is_base64 {
        decode_base64(data)?
    } else {
        percent_decode(data)?
    };

    let content_type = if media_type.is_empty() {
        DEFAULT_MEDIA_TYPE.to_string()
    } else {
        media_type.to_ascii_lowercase()
    };

    Ok(FetchedImage::new(bytes, Some(content_type)))
}

fn decode_base64(data: &str) -> Result<Vec<u8>, LoadError> {
    let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    base64::engine::general_purpose::STANDARD
        .decode(cleaned)
        .map_err(|e| LoadError::fetch(format!("invalid base64 payload: {e}")))
}

/// Percent-decodes without treating '+' as a space.
fn percent_decode(input: &str) -> Result<Vec<u8>, LoadError> {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes
                .get(i + 1..i + 3)
                .ok_or_else(|| LoadError::fetch("incomplete percent-escape"))?;
            let hi = hex_value(escape[0]);
            let lo = hex_value(escape[1]);
            match (hi, lo) {
                (Some(hi), Some(lo)) => out.push((hi << 4) | lo),
                _ => return Err(LoadError::fetch("invalid percent-escape")),
            }
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }

    Ok(out)
}

const fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

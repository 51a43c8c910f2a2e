//! `data:<mime>;base64,<payload>` URLs as produced by canvas and webcam APIs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::AvatarError;

/// Header of a base64 PNG data URL.
pub const PNG_DATA_URL_HEADER: &str = "data:image/png;base64,";

const BASE64_MARKER: &str = ";base64,";

/// Return the payload of a base64 data URL, without its header.
///
/// The header length is taken from the URL itself, so JPEG or WebP data URLs
/// are handled as well as PNG ones.
pub fn strip_header(data_url: &str) -> Result<&str, AvatarError> {
    header_len(data_url).map(|len| &data_url[len..])
}

/// Length of the `data:<mime>;base64,` header of `data_url`.
pub fn header_len(data_url: &str) -> Result<usize, AvatarError> {
    if !data_url.starts_with("data:") {
        return Err(AvatarError::InvalidDataUrl("missing `data:` scheme".into()));
    }
    data_url
        .find(BASE64_MARKER)
        .map(|i| i + BASE64_MARKER.len())
        .ok_or_else(|| AvatarError::InvalidDataUrl("not base64-encoded".into()))
}

/// MIME type declared in the header of `data_url`.
pub fn mime_type(data_url: &str) -> Result<&str, AvatarError> {
    let len = header_len(data_url)?;
    Ok(&data_url["data:".len()..len - BASE64_MARKER.len()])
}

/// Decode the payload of a base64 data URL into bytes.
pub fn decode(data_url: &str) -> Result<Vec<u8>, AvatarError> {
    decode_base64(strip_header(data_url)?)
}

/// Decode a bare base64 string.
pub fn decode_base64(payload: &str) -> Result<Vec<u8>, AvatarError> {
    STANDARD
        .decode(payload.trim())
        .map_err(|e| AvatarError::Base64(e.to_string()))
}

/// Build a base64 data URL for `bytes` of the given MIME type.
pub fn encode(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Build a PNG data URL.
pub fn encode_png(bytes: &[u8]) -> String {
    format!("{PNG_DATA_URL_HEADER}{}", STANDARD.encode(bytes))
}

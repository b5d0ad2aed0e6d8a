//! Data URI handling for image payloads.
//!
//! Clients send images either as bare base64 or as `data:<mime>;base64,<payload>`
//! strings. Results always go back as PNG data URIs.

use base64::{engine::general_purpose::STANDARD, Engine as _};

/// Marker separating the data URI header from its payload.
const BASE64_MARKER: &str = "base64,";

/// MIME prefix used for every generated result.
pub const PNG_PREFIX: &str = "data:image/png;base64,";

/// Return the base64 payload of `input`, dropping any data URI header.
///
/// Everything after the first `base64,` is the payload. Inputs without the
/// marker are returned unchanged.
pub fn strip_prefix(input: &str) -> &str {
    match input.split_once(BASE64_MARKER) {
        Some((_, payload)) => payload,
        None => input,
    }
}

/// Decode a bare base64 string or a base64 data URI into raw bytes.
pub fn decode(input: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let payload = strip_prefix(input);

    // Browsers and copy-paste both like to wrap long payloads.
    if payload.bytes().any(|b| b.is_ascii_whitespace()) {
        let compact: String = payload
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        return STANDARD.decode(compact);
    }

    STANDARD.decode(payload)
}

/// Encode raw bytes as a `data:image/png;base64,...` URI.
pub fn encode_png(bytes: &[u8]) -> String {
    format!("{}{}", PNG_PREFIX, STANDARD.encode(bytes))
}

/// Encode raw bytes as a data URI with an explicit MIME type.
pub fn encode_with_mime(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

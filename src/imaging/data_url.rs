use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::{TutorError, TutorResult};

pub fn encode_data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Split a base64 data URL into its MIME type and decoded payload.
pub fn decode_data_url(url: &str) -> TutorResult<(String, Vec<u8>)> {
    let rest = url
        .strip_prefix("data:")
        .ok_or_else(|| TutorError::Decode("not a data URL".into()))?;
    let (header, payload) = rest
        .split_once(',')
        .ok_or_else(|| TutorError::Decode("data URL has no payload".into()))?;
    let mime_type = header
        .strip_suffix(";base64")
        .ok_or_else(|| TutorError::Decode("data URL is not base64 encoded".into()))?;
    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|err| TutorError::Decode(format!("invalid base64 payload: {err}")))?;
    Ok((mime_type.to_string(), bytes))
}

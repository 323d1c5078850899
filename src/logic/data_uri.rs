//! Data URI decoding
//!
//! The dashboard submits images as `data:<mime>;base64,<payload>`. Both the
//! classification gateway (raw bytes for the multipart upload) and the mail
//! dispatcher (inline attachment) need the decoded form.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::error::PipelineError;

/// Decoded image payload
#[derive(Debug, Clone)]
pub struct DecodedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Decode a `data:<mime>;base64,<payload>` URI.
pub fn decode(data_uri: &str) -> Result<DecodedImage, PipelineError> {
    let invalid = || PipelineError::Validation("Invalid data URI".to_string());

    let rest = data_uri.strip_prefix("data:").ok_or_else(invalid)?;
    let (content_type, payload) = rest.split_once(";base64,").ok_or_else(invalid)?;

    if content_type.is_empty() || payload.is_empty() {
        return Err(invalid());
    }

    let bytes = STANDARD.decode(payload).map_err(|_| invalid())?;

    Ok(DecodedImage {
        bytes,
        content_type: content_type.to_string(),
    })
}

/// Whether the reference looks like a data URI at all (as opposed to a
/// plain URL the browser could already reach).
pub fn is_data_uri(reference: &str) -> bool {
    reference.starts_with("data:")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_valid_data_uri() {
        // "hello" in base64
        let decoded = decode("data:image/jpeg;base64,aGVsbG8=").unwrap();
        assert_eq!(decoded.content_type, "image/jpeg");
        assert_eq!(decoded.bytes, b"hello");
    }

    #[test]
    fn rejects_missing_scheme() {
        assert!(decode("image/jpeg;base64,aGVsbG8=").is_err());
    }

    #[test]
    fn rejects_missing_base64_marker() {
        assert!(decode("data:image/jpeg,aGVsbG8=").is_err());
    }

    #[test]
    fn rejects_invalid_base64_payload() {
        assert!(decode("data:image/jpeg;base64,!!!not-base64!!!").is_err());
    }

    #[test]
    fn rejects_empty_payload() {
        assert!(decode("data:image/jpeg;base64,").is_err());
    }
}

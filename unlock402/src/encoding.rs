//! Base64-wrapped JSON, the encoding used for the payment proof header.
//!
//! The proof travels as a single header value: the JSON document is
//! serialized, then base64-encoded with the standard alphabet and padding.
//! Nothing is signed or encrypted; the header is a bearer claim.

use base64::Engine;
use base64::engine::general_purpose::STANDARD as b64;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Errors produced when decoding a base64 JSON blob.
#[derive(Debug, thiserror::Error)]
pub enum Base64JsonError {
    /// The value is not valid base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    /// The decoded bytes are not the expected JSON document.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Serializes `value` to JSON and base64-encodes the result.
///
/// # Errors
///
/// Returns an error if `value` cannot be serialized to JSON.
pub fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(b64.encode(json))
}

/// Decodes a base64 string and parses the payload as JSON.
///
/// Surrounding whitespace is ignored.
///
/// # Errors
///
/// Returns [`Base64JsonError`] if the input is not base64 or the payload does
/// not deserialize into `T`.
pub fn decode_json<T: DeserializeOwned>(input: &str) -> Result<T, Base64JsonError> {
    let bytes = b64.decode(input.trim())?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn decodes_what_it_encodes() {
        let value = json!({"a": 1, "b": "two"});
        let encoded = encode_json(&value).unwrap();
        let decoded: Value = decode_json(&format!("  {encoded}\n")).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn reports_base64_and_json_failures_separately() {
        assert!(matches!(
            decode_json::<Value>("not base64!"),
            Err(Base64JsonError::Base64(_))
        ));
        let not_json = b64.encode("{oops");
        assert!(matches!(
            decode_json::<Value>(&not_json),
            Err(Base64JsonError::Json(_))
        ));
    }
}

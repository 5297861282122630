//! JSON codec for broker payloads
//!
//! Every delivery body must be a single UTF-8 JSON object. Anything else is
//! rejected with a [`CodecError`] so the consumer can log and discard it.

use serde_json::Value;
use thiserror::Error;

use crate::TaskMessage;

/// Maximum payload size (1 MB) to prevent memory exhaustion
pub const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// Errors that can occur while decoding a payload
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Message too large: {0} bytes (max: {MAX_MESSAGE_SIZE})")]
    MessageTooLarge(usize),

    #[error("Empty payload")]
    Empty,

    #[error("Payload is not a JSON object")]
    NotAnObject,

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decode a broker payload into a task message
pub fn decode(payload: &[u8]) -> Result<TaskMessage, CodecError> {
    if payload.len() > MAX_MESSAGE_SIZE {
        return Err(CodecError::MessageTooLarge(payload.len()));
    }
    if payload.iter().all(u8::is_ascii_whitespace) {
        return Err(CodecError::Empty);
    }

    // Parse to a Value first so non-object documents get a precise error
    let value: Value = serde_json::from_slice(payload)?;
    if !value.is_object() {
        return Err(CodecError::NotAnObject);
    }

    Ok(serde_json::from_value(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskType;

    #[test]
    fn test_decode_valid_message() {
        let msg = decode(br#"{"task_id":"t1","task_type":"heartbeat"}"#).unwrap();
        assert_eq!(msg.id(), Some("t1"));
        assert_eq!(msg.kind(), TaskType::Heartbeat);
    }

    #[test]
    fn test_decode_ignores_unknown_fields() {
        let msg = decode(br#"{"task_id":"t1","task_type":"heartbeat","extra":42}"#).unwrap();
        assert_eq!(msg.id(), Some("t1"));
    }

    #[test]
    fn test_decode_without_task_id_is_not_a_codec_error() {
        // Missing identity is a routing decision, not a parse failure
        let msg = decode(br#"{"task_type":"installService"}"#).unwrap();
        assert_eq!(msg.id(), None);
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(decode(b"not json"), Err(CodecError::Json(_))));
        assert!(matches!(decode(b"   "), Err(CodecError::Empty)));
        assert!(matches!(decode(b"[1,2,3]"), Err(CodecError::NotAnObject)));
        assert!(matches!(decode(b"\"t1\""), Err(CodecError::NotAnObject)));
    }

    #[test]
    fn test_decode_rejects_mistyped_identity() {
        assert!(matches!(
            decode(br#"{"task_id":17,"task_type":"heartbeat"}"#),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn test_decode_rejects_oversized() {
        let payload = vec![b' '; MAX_MESSAGE_SIZE + 1];
        assert!(matches!(
            decode(&payload),
            Err(CodecError::MessageTooLarge(n)) if n == MAX_MESSAGE_SIZE + 1
        ));
    }

    #[test]
    fn test_decode_keeps_mistyped_payload_fields() {
        let msg = decode(
            br#"{"task_id":"t1","task_type":"installService","service_code":"svc1","target_version":1.0}"#,
        )
        .unwrap();
        assert_eq!(msg.id(), Some("t1"));
        assert_eq!(msg.kind(), TaskType::InstallService);
        assert!(msg.target_version().is_err());
    }
}

//! Decoding of push-subscription envelopes carrying grant audit events.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use grantwatch_core::{AppError, AppResult};
use grantwatch_domain::GrantReference;
use serde_json::Value;

const GRANT_REFERENCE_POINTER: &str = "/protoPayload/resourceName";

/// Decodes a push envelope `{"message": {"data": <base64 JSON>}}` into the
/// grant reference found at `protoPayload.resourceName` of the payload.
///
/// Every failure is reported as [`AppError::MalformedEvent`].
pub fn decode_push_envelope(body: &[u8]) -> AppResult<GrantReference> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Err(malformed("no push message received"));
    }

    let envelope: Value = serde_json::from_slice(body)
        .map_err(|error| malformed(format!("envelope is not valid JSON: {error}")))?;

    let envelope = match envelope {
        Value::Null => return Err(malformed("no push message received")),
        Value::Object(fields) if fields.is_empty() => {
            return Err(malformed("no push message received"));
        }
        Value::Object(fields) => fields,
        _ => return Err(malformed("invalid push message format")),
    };

    let message = envelope
        .get("message")
        .ok_or_else(|| malformed("invalid push message format"))?;

    let data = message
        .as_object()
        .and_then(|message| message.get("data"))
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("push message has no data"))?;

    let decoded = STANDARD
        .decode(data.trim())
        .map_err(|error| malformed(format!("message data is not valid base64: {error}")))?;
    let decoded = String::from_utf8(decoded)
        .map_err(|error| malformed(format!("message data is not valid UTF-8: {error}")))?;

    let payload: Value = serde_json::from_str(decoded.trim())
        .map_err(|error| malformed(format!("message data is not valid JSON: {error}")))?;

    let resource_name = payload
        .pointer(GRANT_REFERENCE_POINTER)
        .and_then(Value::as_str)
        .ok_or_else(|| malformed("message data has no protoPayload.resourceName"))?;

    GrantReference::new(resource_name)
}

fn malformed(reason: impl Into<String>) -> AppError {
    AppError::MalformedEvent(reason.into())
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use grantwatch_core::AppError;
    use serde_json::json;

    use super::decode_push_envelope;

    fn envelope_with_data(data: &str) -> Vec<u8> {
        json!({"message": {"data": data, "messageId": "1"}})
            .to_string()
            .into_bytes()
    }

    fn encoded(payload: &serde_json::Value) -> String {
        STANDARD.encode(payload.to_string())
    }

    #[test]
    fn recovers_nested_resource_name() {
        let reference = "projects/p1/locations/global/entitlements/e1/grants/g1";
        let body = envelope_with_data(&encoded(&json!({
            "protoPayload": {"resourceName": reference, "methodName": "PAMActivateGrant"}
        })));

        let decoded = decode_push_envelope(&body);
        assert_eq!(
            decoded.map(|value| value.as_str().to_owned()).unwrap_or_default(),
            reference
        );
    }

    #[test]
    fn rejects_empty_and_blank_bodies() {
        assert!(matches!(
            decode_push_envelope(b""),
            Err(AppError::MalformedEvent(_))
        ));
        assert!(matches!(
            decode_push_envelope(b"  \n"),
            Err(AppError::MalformedEvent(_))
        ));
        assert!(matches!(
            decode_push_envelope(b"{}"),
            Err(AppError::MalformedEvent(_))
        ));
    }

    #[test]
    fn rejects_envelope_without_message() {
        let body = json!({"subscription": "s"}).to_string();
        let result = decode_push_envelope(body.as_bytes());
        assert!(
            matches!(result, Err(AppError::MalformedEvent(reason)) if reason == "invalid push message format")
        );
    }

    #[test]
    fn rejects_message_without_data() {
        let body = json!({"message": {"attributes": {}}}).to_string();
        assert!(matches!(
            decode_push_envelope(body.as_bytes()),
            Err(AppError::MalformedEvent(_))
        ));
    }

    #[test]
    fn rejects_invalid_base64() {
        let body = envelope_with_data("%%% not base64 %%%");
        assert!(matches!(
            decode_push_envelope(&body),
            Err(AppError::MalformedEvent(reason)) if reason.contains("base64")
        ));
    }

    #[test]
    fn rejects_invalid_json_payload() {
        let body = envelope_with_data(&STANDARD.encode("{not json"));
        assert!(matches!(
            decode_push_envelope(&body),
            Err(AppError::MalformedEvent(reason)) if reason.contains("JSON")
        ));
    }

    #[test]
    fn rejects_payload_without_nested_path() {
        let body = envelope_with_data(&encoded(&json!({"protoPayload": {"methodName": "x"}})));
        assert!(matches!(
            decode_push_envelope(&body),
            Err(AppError::MalformedEvent(reason)) if reason.contains("resourceName")
        ));
    }

    #[test]
    fn rejects_non_object_envelope() {
        assert!(matches!(
            decode_push_envelope(b"[1, 2]"),
            Err(AppError::MalformedEvent(_))
        ));
    }
}

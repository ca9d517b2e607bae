//! Request body decoding
//!
//! JSON objects and URL-encoded forms both decode into the same field map.
//! Any other (or missing) content type yields an empty map.

use serde_json::Value;
use thiserror::Error;

use crate::api::BodyFields;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BodyError {
    #[error("Invalid JSON body: {0}")]
    InvalidJson(String),

    #[error("JSON body must be an object or array")]
    NotAnObject,

    #[error("Failed to read request body: {0}")]
    Read(String),
}

/// Media type accepted for JSON bodies
fn is_json(content_type: &str) -> bool {
    let essence = media_type(content_type);
    essence == "application/json" || essence.ends_with("+json")
}

fn is_form(content_type: &str) -> bool {
    media_type(content_type) == "application/x-www-form-urlencoded"
}

/// `type/subtype` without parameters, lowercased
fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Decode a collected body according to its `Content-Type`
pub fn decode(content_type: Option<&str>, bytes: &[u8]) -> Result<BodyFields, BodyError> {
    let Some(content_type) = content_type else {
        return Ok(BodyFields::new());
    };

    if is_json(content_type) {
        decode_json(bytes)
    } else if is_form(content_type) {
        Ok(decode_form(bytes))
    } else {
        Ok(BodyFields::new())
    }
}

fn decode_json(bytes: &[u8]) -> Result<BodyFields, BodyError> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(BodyFields::new());
    }
    match serde_json::from_slice::<Value>(bytes) {
        Ok(Value::Object(map)) => Ok(map),
        // Arrays are accepted but carry no named fields
        Ok(Value::Array(_)) => Ok(BodyFields::new()),
        Ok(_) => Err(BodyError::NotAnObject),
        Err(e) => Err(BodyError::InvalidJson(e.to_string())),
    }
}

/// Repeated keys collect into an array, like a query-string parser would
fn decode_form(bytes: &[u8]) -> BodyFields {
    let mut fields = BodyFields::new();
    for (key, value) in url::form_urlencoded::parse(bytes) {
        let value = Value::String(value.into_owned());
        match fields.get_mut(key.as_ref()) {
            Some(Value::Array(values)) => values.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                fields.insert(key.into_owned(), value);
            }
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_json() {
        let fields = decode(
            Some("application/json; charset=utf-8"),
            br#"{"name":"Ana","message":"Hi"}"#,
        )
        .unwrap();
        assert_eq!(fields["name"], "Ana");
        assert_eq!(fields["message"], "Hi");
    }

    #[test]
    fn test_decode_empty_json() {
        assert!(decode(Some("application/json"), b"").unwrap().is_empty());
        assert!(decode(Some("application/json"), b"  \n").unwrap().is_empty());
    }

    #[test]
    fn test_decode_invalid_json() {
        assert!(matches!(
            decode(Some("application/json"), b"{name:"),
            Err(BodyError::InvalidJson(_))
        ));
        assert_eq!(
            decode(Some("application/json"), b"\"text\""),
            Err(BodyError::NotAnObject)
        );
        assert_eq!(decode(Some("application/json"), b"42"), Err(BodyError::NotAnObject));
    }

    #[test]
    fn test_decode_json_array_has_no_fields() {
        assert!(decode(Some("application/json"), b"[1,2]").unwrap().is_empty());
    }

    #[test]
    fn test_decode_form() {
        let fields = decode(
            Some("application/x-www-form-urlencoded"),
            b"name=Ana+Maria&message=Hi%21",
        )
        .unwrap();
        assert_eq!(fields["name"], "Ana Maria");
        assert_eq!(fields["message"], "Hi!");
    }

    #[test]
    fn test_decode_form_repeated_keys() {
        let fields = decode(
            Some("application/x-www-form-urlencoded"),
            b"name=a&name=b&name=c",
        )
        .unwrap();
        assert_eq!(fields["name"], json!(["a", "b", "c"]));
    }

    #[test]
    fn test_other_content_types_are_ignored() {
        assert!(decode(Some("text/plain"), b"name=Ana").unwrap().is_empty());
        assert!(decode(None, br#"{"name":"Ana"}"#).unwrap().is_empty());
    }
}

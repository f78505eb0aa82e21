//! Primary keys and their declared parse rules.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::SchemaError;

/// How a type's primary key is represented (and parsed from a request string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyKind {
    #[default]
    Integer,
    Text,
    Uuid,
}

impl KeyKind {
    /// Parse a caller-supplied key string using this kind's rule.
    ///
    /// Integer keys tolerate surrounding whitespace; text keys are taken
    /// verbatim but must be non-empty.
    pub fn parse(self, raw: &str) -> Result<KeyValue, SchemaError> {
        let invalid = || SchemaError::InvalidKey {
            raw: raw.to_string(),
            kind: self,
        };
        match self {
            KeyKind::Integer => raw
                .trim()
                .parse::<i64>()
                .map(KeyValue::Integer)
                .map_err(|_| invalid()),
            KeyKind::Text if raw.is_empty() => Err(invalid()),
            KeyKind::Text => Ok(KeyValue::Text(raw.to_string())),
            KeyKind::Uuid => Uuid::parse_str(raw.trim())
                .map(KeyValue::Uuid)
                .map_err(|_| invalid()),
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Integer => f.write_str("integer"),
            KeyKind::Text => f.write_str("text"),
            KeyKind::Uuid => f.write_str("uuid"),
        }
    }
}

/// A parsed primary-key value.
///
/// Serializes as the bare JSON value. There is no `Deserialize`: the bare
/// form does not say which kind it was, so keys are only ever built through
/// their type's [`KeyKind::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Integer(i64),
    Uuid(Uuid),
    Text(String),
}

impl KeyValue {
    pub fn kind(&self) -> KeyKind {
        match self {
            KeyValue::Integer(_) => KeyKind::Integer,
            KeyValue::Text(_) => KeyKind::Text,
            KeyValue::Uuid(_) => KeyKind::Uuid,
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Integer(v) => write!(f, "{v}"),
            KeyValue::Text(v) => f.write_str(v),
            KeyValue::Uuid(v) => write!(f, "{v}"),
        }
    }
}

impl From<i64> for KeyValue {
    fn from(value: i64) -> Self {
        KeyValue::Integer(value)
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_keys_parse_and_reject_garbage() {
        assert_eq!(KeyKind::Integer.parse(" 42 ").unwrap(), KeyValue::Integer(42));
        assert!(matches!(
            KeyKind::Integer.parse("forty-two"),
            Err(SchemaError::InvalidKey { kind: KeyKind::Integer, .. })
        ));
    }

    #[test]
    fn uuid_keys_round_trip_through_display() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let key = KeyKind::Uuid.parse(raw).unwrap();
        assert_eq!(key.to_string(), raw);
        assert_eq!(key.kind(), KeyKind::Uuid);
    }

    #[test]
    fn empty_text_key_is_invalid() {
        assert!(KeyKind::Text.parse("").is_err());
        assert_eq!(KeyKind::Text.parse("a b").unwrap(), KeyValue::Text("a b".into()));
    }

    #[test]
    fn uuid_shaped_text_keys_stay_text() {
        let raw = "67e55044-10b1-426f-9247-bb680e5fe0c8";
        let key = KeyKind::Text.parse(raw).unwrap();
        assert_eq!(key, KeyValue::Text(raw.to_string()));
        assert_eq!(key.kind(), KeyKind::Text);
        assert_eq!(serde_json::to_value(&key).unwrap(), serde_json::json!(raw));
    }
}

//! Schema-tolerant decoding of inbound records.
//!
//! The host sends loosely shaped JSON. Only the fields the module understands are
//! lifted into typed records; anything missing or of the wrong type is treated as
//! absent rather than rejected.

use aop_contracts::{
    ACTION_DEFAULT, ACTION_TAG_NAME, MESSAGE_TAGS_FIELD, TAG_NAME_FIELD, TAG_VALUE_FIELD,
};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub name: String,
    pub value: String,
}

impl Tag {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Tag {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Lift one element of `Tags`; `None` unless both fields are strings.
    fn from_value(v: Value) -> Option<Self> {
        let Value::Object(mut fields) = v else {
            return None;
        };
        let name = take_string(&mut fields, TAG_NAME_FIELD)?;
        let value = take_string(&mut fields, TAG_VALUE_FIELD)?;
        Some(Tag { name, value })
    }
}

/// Wire form of a message. Unknown fields are skipped by the parser without being
/// materialized, so their depth and string contents never fail the decode.
#[derive(Deserialize)]
struct RawMessage {
    #[serde(rename = "Tags", default)]
    tags: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// `None` when `Tags` is missing or not a sequence.
    pub tags: Option<Vec<Tag>>,
}

impl Message {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        if first_token(bytes) == Some(b'{') {
            let raw: RawMessage = serde_json::from_slice(bytes)?;
            return Ok(Message {
                tags: raw.tags.and_then(tags_from_value),
            });
        }
        Self::from_value(serde_json::from_slice(bytes)?)
    }

    /// A top-level `null` decodes to an empty message; any other non-object fails.
    pub fn from_value(doc: Value) -> Result<Self, DecodeError> {
        match doc {
            Value::Null => Ok(Message::default()),
            Value::Object(mut fields) => Ok(Message {
                tags: fields.remove(MESSAGE_TAGS_FIELD).and_then(tags_from_value),
            }),
            other => Err(DecodeError::NotAnObject(kind_name(&other))),
        }
    }

    /// Dispatch key: the value of the first `Action` tag, else `"Default"`.
    pub fn action(&self) -> &str {
        self.tags
            .iter()
            .flatten()
            .find(|t| t.name == ACTION_TAG_NAME)
            .map(|t| t.value.as_str())
            .unwrap_or(ACTION_DEFAULT)
    }
}

/// The environment record. Decoded for shape only; nothing reads it yet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Environment {
    pub fields: Map<String, Value>,
}

impl Environment {
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DecodeError> {
        let doc: Value = serde_json::from_slice(bytes)?;
        match doc {
            Value::Null => Ok(Environment::default()),
            Value::Object(fields) => Ok(Environment { fields }),
            other => Err(DecodeError::NotAnObject(kind_name(&other))),
        }
    }
}

fn first_token(bytes: &[u8]) -> Option<u8> {
    bytes
        .iter()
        .copied()
        .find(|b| !matches!(b, b' ' | b'\t' | b'\n' | b'\r'))
}

fn tags_from_value(v: Value) -> Option<Vec<Tag>> {
    match v {
        Value::Array(items) => Some(items.into_iter().filter_map(Tag::from_value).collect()),
        _ => None,
    }
}

fn take_string(fields: &mut Map<String, Value>, key: &str) -> Option<String> {
    match fields.remove(key)? {
        Value::String(s) => Some(s),
        _ => None,
    }
}

fn kind_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

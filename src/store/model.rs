// Document schemas
// Persisted shape of messages and users, plus the validated insert payload

use chrono::{DateTime, SubsecRound, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use super::StoreError;

/// Storage-assigned message identifier (24 hex characters on the wire)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(ObjectId);

impl MessageId {
    /// Generate a fresh identifier
    pub fn generate() -> Self {
        Self(ObjectId::new())
    }

    /// Parse a path parameter into an identifier
    ///
    /// Anything that is not a 24-character hex string is rejected, the same
    /// cast failure the document database reports for a bad `_id` filter.
    pub fn parse(raw: &str) -> Result<Self, StoreError> {
        ObjectId::parse_str(raw)
            .map(Self)
            .map_err(|_| StoreError::InvalidId(raw.to_string()))
    }

    pub const fn object_id(&self) -> ObjectId {
        self.0
    }
}

impl From<ObjectId> for MessageId {
    fn from(oid: ObjectId) -> Self {
        Self(oid)
    }
}

impl FromStr for MessageId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_hex())
    }
}

impl Serialize for MessageId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_hex())
    }
}

impl<'de> Deserialize<'de> for MessageId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// A persisted message as returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "_id")]
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Materialize a new record; identifier and timestamp are assigned here
    ///
    /// The timestamp is kept at millisecond precision, the resolution the
    /// document store persists.
    pub fn create(draft: NewMessage) -> Self {
        Self {
            id: MessageId::generate(),
            name: draft.name,
            message: draft.message,
            created_at: Utc::now().trunc_subsecs(3),
        }
    }
}

/// Validated insert payload
///
/// Built from a decoded request body before any persistence call. Fields the
/// client left out stay `None`; the schema does not require them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewMessage {
    pub name: Option<String>,
    pub message: Option<String>,
}

impl NewMessage {
    pub fn new(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            message: Some(message.into()),
        }
    }
}

/// User schema
///
/// Registered alongside messages; no route reads or writes it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: MessageId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

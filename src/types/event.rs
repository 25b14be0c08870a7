//! Event registry types

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Longest accepted identifier
pub const MAX_EVENT_ID_LEN: usize = 64;

/// Directory-safe event identifier (`[A-Za-z0-9_]+`)
///
/// Every on-disk path is built from an `EventId`, never from a raw string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventId(String);

impl EventId {
    pub fn parse(raw: &str) -> StoreResult<Self> {
        if Self::is_well_formed(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(invalid_id(raw))
        }
    }

    /// Charset and length check only; registry membership is checked by the store
    pub fn is_well_formed(raw: &str) -> bool {
        !raw.is_empty()
            && raw.len() <= MAX_EVENT_ID_LEN
            && raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
    }

    /// Fresh opaque identifier
    pub fn generate() -> Self {
        let token = uuid::Uuid::new_v4().simple().to_string();
        Self(format!("event_{}", &token[..12]))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventId {
    type Error = StoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if Self::is_well_formed(&value) {
            Ok(Self(value))
        } else {
            Err(invalid_id(&value))
        }
    }
}

impl From<EventId> for String {
    fn from(id: EventId) -> Self {
        id.0
    }
}

fn invalid_id(raw: &str) -> StoreError {
    StoreError::validation(format!(
        "invalid event id '{}': use 1-{} characters from A-Z, a-z, 0-9 and _",
        raw, MAX_EVENT_ID_LEN
    ))
}

/// Registry entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
}

impl Event {
    pub fn new(id: EventId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

use crate::ProtocolError;
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt;

pub type ConnectionId = u64;

/// Opaque label of a room. Anything non-empty is accepted.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomKey(String);

impl RoomKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ProtocolError> {
        let key = key.into();
        if key.is_empty() {
            Err(ProtocolError::EmptyRoomKey)
        } else {
            Ok(Self(key))
        }
    }

    /// Short random key like `a1b2c3`, the same shape the home screen hands out.
    pub fn generate() -> Self {
        let mut key = uuid::Uuid::new_v4().to_simple().to_string();
        key.truncate(6);
        Self(key)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomKey {
    type Error = ProtocolError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RoomKey> for String {
    fn from(key: RoomKey) -> Self {
        key.0
    }
}

impl fmt::Display for RoomKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub room_key: RoomKey,
    pub members: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_rejects_empty_room_key() {
        assert!(matches!(RoomKey::new(""), Err(ProtocolError::EmptyRoomKey)));
        assert_eq!(RoomKey::new(" ").expect("").as_str(), " ");
    }

    #[test]
    fn it_generates_short_room_keys() {
        let key = RoomKey::generate();
        assert_eq!(key.as_str().len(), 6);
        assert!(key.as_str().chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn it_refuses_empty_room_key_while_deserializing() {
        assert!(serde_json::from_str::<RoomKey>("\"\"").is_err());
        let key: RoomKey = serde_json::from_str("\"abc123\"").expect("");
        assert_eq!(key.to_string(), "abc123");
    }
}

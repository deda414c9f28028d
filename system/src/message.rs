use crate::RoomKey;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

const JOIN_ROOM: &str = "join-room";
const LEAVE_ROOM: &str = "leave-room";

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame has an empty kind")]
    EmptyKind,
    #[error("unknown kind `{0}`")]
    UnknownKind(String),
    #[error("room key must not be empty")]
    EmptyRoomKey,
    #[error("room key must be a string, got {0}")]
    InvalidRoomKey(Value),
}

/// Kinds of events relayed between members of a room.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    NoteAdded,
    NoteUpdated,
    NoteDeleted,
    NoteMoved,
    DrawLine,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoteAdded => "note-added",
            Self::NoteUpdated => "note-updated",
            Self::NoteDeleted => "note-deleted",
            Self::NoteMoved => "note-moved",
            Self::DrawLine => "draw-line",
        }
    }
}

impl FromStr for EventKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "note-added" => Ok(Self::NoteAdded),
            "note-updated" => Ok(Self::NoteUpdated),
            "note-deleted" => Ok(Self::NoteDeleted),
            "note-moved" => Ok(Self::NoteMoved),
            "draw-line" => Ok(Self::DrawLine),
            "" => Err(ProtocolError::EmptyKind),
            other => Err(ProtocolError::UnknownKind(other.to_owned())),
        }
    }
}

/// An event as it travels through the relay. The payload is never inspected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomEvent {
    pub kind: EventKind,
    #[serde(default)]
    pub payload: Value,
}

impl RoomEvent {
    pub fn new(kind: EventKind, payload: Value) -> Self {
        Self { kind, payload }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ClientMessage {
    JoinRoom(RoomKey),
    LeaveRoom,
    Event(RoomEvent),
}

#[derive(Deserialize)]
struct Envelope {
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl ClientMessage {
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Self::from_envelope(serde_json::from_str(text)?)
    }

    pub fn decode_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Self::from_envelope(serde_json::from_slice(bytes)?)
    }

    fn from_envelope(Envelope { kind, payload }: Envelope) -> Result<Self, ProtocolError> {
        match kind.as_str() {
            JOIN_ROOM => match payload {
                Value::String(key) => RoomKey::new(key).map(ClientMessage::JoinRoom),
                other => Err(ProtocolError::InvalidRoomKey(other)),
            },
            LEAVE_ROOM => Ok(ClientMessage::LeaveRoom),
            kind => Ok(ClientMessage::Event(RoomEvent::new(kind.parse()?, payload))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_decodes_join_room() {
        let message = ClientMessage::decode(r#"{"kind":"join-room","payload":"abc123"}"#).expect("");
        assert_eq!(
            message,
            ClientMessage::JoinRoom(RoomKey::new("abc123").expect(""))
        );
    }

    #[test]
    fn it_rejects_bad_room_keys() {
        assert!(matches!(
            ClientMessage::decode(r#"{"kind":"join-room","payload":""}"#),
            Err(ProtocolError::EmptyRoomKey)
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"kind":"join-room","payload":{"id":1}}"#),
            Err(ProtocolError::InvalidRoomKey(_))
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"kind":"join-room"}"#),
            Err(ProtocolError::InvalidRoomKey(Value::Null))
        ));
    }

    #[test]
    fn it_keeps_payload_untouched() {
        let text = r#"{"kind":"note-moved","payload":{"id":"n1","delta":{"x":"not a number"}}}"#;
        match ClientMessage::decode(text).expect("") {
            ClientMessage::Event(event) => {
                assert_eq!(event.kind, EventKind::NoteMoved);
                assert_eq!(
                    event.payload,
                    json!({"id": "n1", "delta": {"x": "not a number"}})
                );
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn it_accepts_bare_string_payload() {
        // note-deleted carries just the id
        let message =
            ClientMessage::decode_slice(br#"{"kind":"note-deleted","payload":"n1"}"#).expect("");
        assert_eq!(
            message,
            ClientMessage::Event(RoomEvent::new(EventKind::NoteDeleted, json!("n1")))
        );
    }

    #[test]
    fn it_rejects_unknown_and_empty_kinds() {
        assert!(matches!(
            ClientMessage::decode(r#"{"kind":"chat","payload":{}}"#),
            Err(ProtocolError::UnknownKind(kind)) if kind == "chat"
        ));
        assert!(matches!(
            ClientMessage::decode(r#"{"kind":"","payload":{}}"#),
            Err(ProtocolError::EmptyKind)
        ));
        assert!(matches!(
            ClientMessage::decode("not json"),
            Err(ProtocolError::Json(_))
        ));
    }

    #[test]
    fn it_encodes_with_the_same_envelope() {
        let event = RoomEvent::new(
            EventKind::DrawLine,
            json!({"from": {"x": 0, "y": 0}, "to": {"x": 5, "y": 5}, "color": "#000", "size": 2}),
        );
        let encoded: Value = serde_json::from_str(&event.encode().expect("")).expect("");
        assert_eq!(encoded["kind"], json!("draw-line"));
        assert_eq!(encoded["payload"], event.payload);
    }

    #[test]
    fn it_agrees_with_serde_on_kind_names() {
        for kind in &[
            EventKind::NoteAdded,
            EventKind::NoteUpdated,
            EventKind::NoteDeleted,
            EventKind::NoteMoved,
            EventKind::DrawLine,
        ] {
            assert_eq!(serde_json::to_value(kind).expect(""), json!(kind.as_str()));
            assert_eq!(kind.as_str().parse::<EventKind>().expect(""), *kind);
        }
    }
}

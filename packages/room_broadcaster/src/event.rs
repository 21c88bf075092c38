//! Wire protocol
//!
//! Every text frame is a JSON object `{"event": <name>, "data": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::connection::ConnectionId;
use crate::error::ProtocolError;

/// Events sent FROM the client TO the server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom { room: String },
    LeaveRoom { room: String },
    /// Chat message scoped to one room
    RoomMessage { room: String, message: String },
    /// Chat message for every connected client
    SendMessage { message: String },
}

impl ClientEvent {
    /// Decode a text frame, rejecting blank room names.
    pub fn parse(text: &str) -> Result<Self, ProtocolError> {
        let event: ClientEvent = serde_json::from_str(text)?;
        if event.room().is_some_and(|room| room.trim().is_empty()) {
            return Err(ProtocolError::EmptyRoom);
        }
        Ok(event)
    }

    /// The room this event targets, if it is room-scoped.
    pub fn room(&self) -> Option<&str> {
        match self {
            ClientEvent::JoinRoom { room }
            | ClientEvent::LeaveRoom { room }
            | ClientEvent::RoomMessage { room, .. } => Some(room),
            ClientEvent::SendMessage { .. } => None,
        }
    }
}

/// Events sent FROM the server TO the client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// First frame on every connection
    Connected { connection_id: ConnectionId },
    /// Membership-change announcement to a room
    RoomNotification { data: String },
    RoomMessage { data: String },
    /// Global chat message
    Message { data: String },
}

impl ServerEvent {
    pub fn joined(room: &str) -> Self {
        ServerEvent::RoomNotification {
            data: format!("User joined room {}", room),
        }
    }

    pub fn left(room: &str) -> Self {
        ServerEvent::RoomNotification {
            data: format!("User left room {}", room),
        }
    }

    pub fn room_message(sender: &str, message: &str) -> Self {
        ServerEvent::RoomMessage {
            data: format!("{}: {}", sender, message),
        }
    }

    pub fn message(sender: &str, message: &str) -> Self {
        ServerEvent::Message {
            data: format!("{}: {}", sender, message),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_join_room() {
        let event = ClientEvent::parse(r#"{"event":"join_room","data":{"room":"lobby"}}"#).unwrap();
        assert_eq!(
            event,
            ClientEvent::JoinRoom {
                room: "lobby".into()
            }
        );
        assert_eq!(event.room(), Some("lobby"));
    }

    #[test]
    fn test_parse_room_message() {
        let event = ClientEvent::parse(
            r#"{"event":"room_message","data":{"room":"lobby","message":"hi"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::RoomMessage {
                room: "lobby".into(),
                message: "hi".into()
            }
        );
    }

    #[test]
    fn test_parse_send_message_has_no_room() {
        let event = ClientEvent::parse(r#"{"event":"send_message","data":{"message":"hey"}}"#).unwrap();
        assert!(event.room().is_none());
    }

    #[test]
    fn test_parse_rejects_blank_room() {
        let err = ClientEvent::parse(r#"{"event":"leave_room","data":{"room":"  "}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::EmptyRoom));
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        let err = ClientEvent::parse(r#"{"event":"shout","data":{"message":"x"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let err = ClientEvent::parse(r#"{"event":"room_message","data":{"room":"a"}}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Malformed(_)));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(ClientEvent::parse("not json").is_err());
    }

    #[test]
    fn test_server_event_wire_shape() {
        let value = serde_json::to_value(ServerEvent::room_message("alice", "hi")).unwrap();
        assert_eq!(
            value,
            json!({"event": "room_message", "data": {"data": "alice: hi"}})
        );

        let value = serde_json::to_value(ServerEvent::message("User", "yo")).unwrap();
        assert_eq!(value, json!({"event": "message", "data": {"data": "User: yo"}}));

        let value = serde_json::to_value(ServerEvent::joined("lobby")).unwrap();
        assert_eq!(value["event"], "room_notification");
        assert_eq!(value["data"]["data"], "User joined room lobby");
    }

    #[test]
    fn test_connected_carries_id() {
        let id = ConnectionId::new();
        let json = ServerEvent::Connected { connection_id: id }.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["event"], "connected");
        assert_eq!(value["data"]["connection_id"], id.to_string());
    }
}

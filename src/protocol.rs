//! Wire protocol between board clients and the collaboration hub.
//!
//! Every message is one JSON object `{"event": ..., "data": {...}}`. The hub
//! relays; it never interprets object payloads. Clients send the `*_move` /
//! `*_update` forms, the hub fans the `*_moved` / `*_updated` forms out to
//! the other members of the room.

#[cfg(test)]
#[path = "protocol_test.rs"]
mod protocol_test;

use serde::{Deserialize, Serialize};

use crate::doc::{BoardObject, Point};

/// Live participant metadata for one room member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presence {
    pub user_id: String,
    pub name: String,
    /// Absent until the first cursor move arrives.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<Point>,
}

/// Messages a client sends to the hub.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Enter a board room. Must precede cursor and update traffic.
    JoinBoard {
        board_id: String,
        user_id: String,
        name: String,
    },
    /// Ephemeral cursor position. Best-effort; never buffered or retried.
    CursorMove { board_id: String, cursor: Point },
    /// Full-document snapshot commit. The hub relays it verbatim.
    BoardUpdate {
        board_id: String,
        objects: Vec<BoardObject>,
        version: u64,
    },
}

/// Messages the hub sends to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Sent to a joining client: the other members already in the room.
    UsersList { users: Vec<Presence> },
    /// Sent to the rest of the room when someone joins.
    UserJoined { user_id: String, name: String },
    /// Sent to the rest of the room when someone leaves or disconnects.
    UserLeft { user_id: String, name: String },
    /// Relayed cursor position from one member to the rest.
    CursorMoved { user_id: String, cursor: Point },
    /// Relayed full-document snapshot. Receivers overwrite wholesale.
    BoardUpdated {
        objects: Vec<BoardObject>,
        version: u64,
    },
}

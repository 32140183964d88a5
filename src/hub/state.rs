//! Shared hub state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor. It
//! holds one map of live rooms, each an independent broadcast group keyed by
//! board id. A room owns only transient presence — who is connected, their
//! display names and cursors, and a sender for each member's outbox. The hub
//! never holds authoritative document state; it is a relay.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use crate::doc::Point;
use crate::protocol::{Presence, ServerMessage};

/// Outbox capacity per connected client. A member whose outbox is full
/// simply misses frames — delivery is best-effort.
pub const CLIENT_OUTBOX_CAPACITY: usize = 256;

/// One connected member of a room.
pub struct Member {
    pub user_id: String,
    pub name: String,
    pub cursor: Option<Point>,
    /// Sender for outgoing relay frames to this member's socket task.
    pub tx: mpsc::Sender<ServerMessage>,
}

impl Member {
    #[must_use]
    pub fn presence(&self) -> Presence {
        Presence {
            user_id: self.user_id.clone(),
            name: self.name.clone(),
            cursor: self.cursor,
        }
    }
}

/// The set of hub connections associated with one board.
#[derive(Default)]
pub struct Room {
    /// Members keyed by connection id (one user may hold several).
    pub members: HashMap<Uuid, Member>,
}

impl Room {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Shared hub state. Clone is required by Axum — the room map is Arc-wrapped.
#[derive(Clone, Default)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<String, Room>>>,
}

impl AppState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

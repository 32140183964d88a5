//! WebSocket handler — room-scoped message relay.
//!
//! DESIGN
//! ======
//! On upgrade, each connection gets an id and an outbox channel, then enters
//! a `select!` loop: inbound client messages are dispatched by event, frames
//! fanned out by room peers are forwarded to the socket. Handlers validate
//! and mutate presence state, then hand the dispatch layer a list of frames
//! for the sender; fan-out to peers happens through the members' outboxes.
//!
//! The relay never serializes or merges concurrent `board_update` messages
//! from different senders — whichever frame a peer receives last wins on
//! that peer. Fan-out uses `try_send`: a member with a full outbox misses
//! the frame, and cursor frames in particular are never buffered or
//! retried.
//!
//! LIFECYCLE
//! =========
//! 1. Upgrade → socket task with outbox
//! 2. `join_board` → room insert, `users_list` reply, `user_joined` to peers
//! 3. Relay traffic until the socket closes
//! 4. Close → room remove, `user_left` to peers, empty room evicted

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use super::state::{AppState, CLIENT_OUTBOX_CAPACITY, Member};
use crate::protocol::{ClientMessage, ServerMessage};

// =============================================================================
// UPGRADE
// =============================================================================

pub async fn handle_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, state))
}

// =============================================================================
// CONNECTION
// =============================================================================

async fn run_ws(mut socket: WebSocket, state: AppState) {
    let client_id = Uuid::new_v4();
    let (client_tx, mut client_rx) = mpsc::channel::<ServerMessage>(CLIENT_OUTBOX_CAPACITY);

    info!(%client_id, "ws: client connected");

    // The board this connection has joined, if any.
    let mut current_board: Option<String> = None;

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Text(text) => {
                        let replies = process_inbound_text(
                            &state,
                            &mut current_board,
                            client_id,
                            &client_tx,
                            text.as_str(),
                        )
                        .await;
                        for reply in replies {
                            if send_message(&mut socket, &reply).await.is_err() {
                                break;
                            }
                        }
                    }
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            Some(frame) = client_rx.recv() => {
                if send_message(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    if let Some(board_id) = current_board {
        leave_room(&state, &board_id, client_id).await;
    }
    info!(%client_id, "ws: client disconnected");
}

// =============================================================================
// DISPATCH
// =============================================================================

/// Parse one inbound text frame, dispatch it, and return frames destined for
/// the sender. Split from the socket loop so tests can drive dispatch
/// end-to-end without a websocket.
pub(crate) async fn process_inbound_text(
    state: &AppState,
    current_board: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    text: &str,
) -> Vec<ServerMessage> {
    let message: ClientMessage = match serde_json::from_str(text) {
        Ok(m) => m,
        Err(e) => {
            // A malformed frame is terminal to itself, never to the session.
            warn!(%client_id, error = %e, "ws: invalid inbound message");
            return Vec::new();
        }
    };
    process_message(state, current_board, client_id, client_tx, message).await
}

pub(crate) async fn process_message(
    state: &AppState,
    current_board: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    match message {
        ClientMessage::JoinBoard { board_id, user_id, name } => {
            handle_join(state, current_board, client_id, client_tx, board_id, user_id, name).await
        }
        ClientMessage::CursorMove { board_id, cursor } => {
            handle_cursor(state, current_board.as_deref(), client_id, &board_id, cursor).await;
            Vec::new()
        }
        ClientMessage::BoardUpdate { board_id, objects, version } => {
            handle_board_update(state, current_board.as_deref(), client_id, &board_id, objects, version).await;
            Vec::new()
        }
    }
}

// =============================================================================
// HANDLERS
// =============================================================================

async fn handle_join(
    state: &AppState,
    current_board: &mut Option<String>,
    client_id: Uuid,
    client_tx: &mpsc::Sender<ServerMessage>,
    board_id: String,
    user_id: String,
    name: String,
) -> Vec<ServerMessage> {
    // Re-joining moves the connection: part the old room first.
    if let Some(old_board) = current_board.take() {
        if old_board != board_id {
            leave_room(state, &old_board, client_id).await;
        }
    }

    let users;
    {
        let mut rooms = state.rooms.write().await;
        let room = rooms.entry(board_id.clone()).or_default();
        room.members.insert(
            client_id,
            Member {
                user_id: user_id.clone(),
                name: name.clone(),
                cursor: None,
                tx: client_tx.clone(),
            },
        );
        // Roster for the joiner: everyone already here except themselves.
        // No document replay — the board's true state arrives with the next
        // full-document broadcast or came from the initial REST fetch.
        users = room
            .members
            .values()
            .filter(|m| m.user_id != user_id)
            .map(Member::presence)
            .collect::<Vec<_>>();
    }

    *current_board = Some(board_id.clone());
    info!(%client_id, board_id, user_id, "ws: client joined board");

    broadcast(
        state,
        &board_id,
        &ServerMessage::UserJoined { user_id, name },
        Some(client_id),
    )
    .await;

    vec![ServerMessage::UsersList { users }]
}

async fn handle_cursor(
    state: &AppState,
    current_board: Option<&str>,
    client_id: Uuid,
    board_id: &str,
    cursor: crate::doc::Point,
) {
    // Cursor moves before joining (or for another board) are dropped.
    if current_board != Some(board_id) {
        return;
    }

    let user_id;
    {
        let mut rooms = state.rooms.write().await;
        let Some(room) = rooms.get_mut(board_id) else {
            return;
        };
        let Some(member) = room.members.get_mut(&client_id) else {
            return;
        };
        member.cursor = Some(cursor);
        user_id = member.user_id.clone();
    }

    broadcast(
        state,
        board_id,
        &ServerMessage::CursorMoved { user_id, cursor },
        Some(client_id),
    )
    .await;
}

async fn handle_board_update(
    state: &AppState,
    current_board: Option<&str>,
    client_id: Uuid,
    board_id: &str,
    objects: Vec<crate::doc::BoardObject>,
    version: u64,
) {
    if current_board != Some(board_id) {
        warn!(%client_id, board_id, "ws: board_update from non-member dropped");
        return;
    }

    info!(%client_id, board_id, count = objects.len(), version, "ws: relaying board update");
    broadcast(
        state,
        board_id,
        &ServerMessage::BoardUpdated { objects, version },
        Some(client_id),
    )
    .await;
}

// =============================================================================
// ROOM MEMBERSHIP / FAN-OUT
// =============================================================================

/// Broadcast a frame to every member of a room, optionally excluding one
/// connection. Best-effort: a full outbox drops the frame for that member.
pub(crate) async fn broadcast(
    state: &AppState,
    board_id: &str,
    message: &ServerMessage,
    exclude: Option<Uuid>,
) {
    let rooms = state.rooms.read().await;
    let Some(room) = rooms.get(board_id) else {
        return;
    };
    for (member_id, member) in &room.members {
        if exclude == Some(*member_id) {
            continue;
        }
        let _ = member.tx.try_send(message.clone());
    }
}

/// Remove a connection from a room, notify the remaining members, and evict
/// the room once it is empty.
pub(crate) async fn leave_room(state: &AppState, board_id: &str, client_id: Uuid) {
    let departed;
    {
        let mut rooms = state.rooms.write().await;
        let Some(room) = rooms.get_mut(board_id) else {
            return;
        };
        departed = room.members.remove(&client_id);
        if room.members.is_empty() {
            rooms.remove(board_id);
            info!(board_id, "ws: evicted empty room");
        }
    }

    if let Some(member) = departed {
        info!(%client_id, board_id, user_id = member.user_id, "ws: client left board");
        broadcast(
            state,
            board_id,
            &ServerMessage::UserLeft { user_id: member.user_id, name: member.name },
            Some(client_id),
        )
        .await;
    }
}

// =============================================================================
// HELPERS
// =============================================================================

async fn send_message(socket: &mut WebSocket, message: &ServerMessage) -> Result<(), ()> {
    let json = match serde_json::to_string(message) {
        Ok(j) => j,
        Err(e) => {
            warn!(error = %e, "ws: failed to serialize frame");
            return Err(());
        }
    };
    socket
        .send(Message::Text(json.into()))
        .await
        .map_err(|_| ())
}

#[cfg(test)]
#[path = "ws_test.rs"]
mod tests;

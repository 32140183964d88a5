use super::*;
use crate::doc::{BoardObject, Point, Shape};
use crate::hub::state::test_helpers::seed_member;
use tokio::sync::mpsc::Receiver;
use tokio::time::{Duration, timeout};

fn circle(id: &str) -> BoardObject {
    BoardObject::new(
        id.to_string(),
        Shape::Circle {
            x: 0.0,
            y: 0.0,
            radius: 1.0,
            stroke: None,
            fill: None,
            stroke_width: 1.0,
        },
    )
}

fn join(board_id: &str, user_id: &str, name: &str) -> ClientMessage {
    ClientMessage::JoinBoard {
        board_id: board_id.into(),
        user_id: user_id.into(),
        name: name.into(),
    }
}

async fn recv_frame(rx: &mut Receiver<ServerMessage>) -> ServerMessage {
    timeout(Duration::from_millis(200), rx.recv())
        .await
        .expect("broadcast receive timed out")
        .expect("broadcast channel closed unexpectedly")
}

async fn assert_no_frame(rx: &mut Receiver<ServerMessage>) {
    assert!(
        timeout(Duration::from_millis(80), rx.recv()).await.is_err(),
        "expected no broadcast frame"
    );
}

/// Drive one client message through dispatch as a fresh connection.
async fn dispatch(
    state: &AppState,
    current_board: &mut Option<String>,
    client_id: Uuid,
    tx: &mpsc::Sender<ServerMessage>,
    message: ClientMessage,
) -> Vec<ServerMessage> {
    let text = serde_json::to_string(&message).unwrap();
    process_inbound_text(state, current_board, client_id, tx, &text).await
}

// =============================================================
// Join
// =============================================================

#[tokio::test]
async fn join_replies_with_the_roster_excluding_self() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u-existing", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    let replies = dispatch(&state, &mut board, client_id, &tx, join("b1", "u-new", "Ada")).await;

    assert_eq!(replies.len(), 1);
    let ServerMessage::UsersList { users } = &replies[0] else {
        panic!("expected users_list");
    };
    assert_eq!(users.len(), 1);
    assert_eq!(users[0].user_id, "u-existing");
    assert_eq!(board.as_deref(), Some("b1"));

    // The existing member hears about the newcomer.
    let ServerMessage::UserJoined { user_id, name } = recv_frame(&mut peer_rx).await else {
        panic!("expected user_joined");
    };
    assert_eq!(user_id, "u-new");
    assert_eq!(name, "Ada");
}

#[tokio::test]
async fn join_creates_the_room_on_demand() {
    let state = AppState::new();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    let replies = dispatch(&state, &mut board, client_id, &tx, join("new-board", "u1", "Ada")).await;

    let ServerMessage::UsersList { users } = &replies[0] else {
        panic!("expected users_list");
    };
    assert!(users.is_empty());
    assert!(state.rooms.read().await.contains_key("new-board"));
}

// =============================================================
// Cursor relay
// =============================================================

#[tokio::test]
async fn cursor_moves_relay_to_peers_but_not_the_sender() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u2", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, mut own_rx) = mpsc::channel(8);
    let mut board = None;
    dispatch(&state, &mut board, client_id, &tx, join("b1", "u1", "Ada")).await;
    let _ = recv_frame(&mut peer_rx).await; // user_joined

    let replies = dispatch(
        &state,
        &mut board,
        client_id,
        &tx,
        ClientMessage::CursorMove { board_id: "b1".into(), cursor: Point::new(3.0, 4.0) },
    )
    .await;
    assert!(replies.is_empty());

    let ServerMessage::CursorMoved { user_id, cursor } = recv_frame(&mut peer_rx).await else {
        panic!("expected cursor_moved");
    };
    assert_eq!(user_id, "u1");
    assert!((cursor.x - 3.0).abs() < f64::EPSILON);
    assert_no_frame(&mut own_rx).await;

    // The roster now carries the cursor for late joiners.
    let rooms = state.rooms.read().await;
    let member = rooms["b1"]
        .members
        .values()
        .find(|m| m.user_id == "u1")
        .unwrap();
    assert!(member.cursor.is_some());
}

#[tokio::test]
async fn cursor_before_join_is_dropped() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u2", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    let replies = dispatch(
        &state,
        &mut board,
        client_id,
        &tx,
        ClientMessage::CursorMove { board_id: "b1".into(), cursor: Point::new(1.0, 1.0) },
    )
    .await;
    assert!(replies.is_empty());
    assert_no_frame(&mut peer_rx).await;
}

// =============================================================
// Board update relay
// =============================================================

#[tokio::test]
async fn board_update_relays_verbatim_to_peers_only() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u2", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, mut own_rx) = mpsc::channel(8);
    let mut board = None;
    dispatch(&state, &mut board, client_id, &tx, join("b1", "u1", "Ada")).await;
    let _ = recv_frame(&mut peer_rx).await; // user_joined

    let objects = vec![circle("a"), circle("b"), circle("c")];
    dispatch(
        &state,
        &mut board,
        client_id,
        &tx,
        ClientMessage::BoardUpdate { board_id: "b1".into(), objects: objects.clone(), version: 5 },
    )
    .await;

    let ServerMessage::BoardUpdated { objects: relayed, version } = recv_frame(&mut peer_rx).await
    else {
        panic!("expected board_updated");
    };
    assert_eq!(version, 5);
    assert_eq!(relayed, objects);
    assert_no_frame(&mut own_rx).await;
}

#[tokio::test]
async fn board_update_from_a_non_member_is_dropped() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u2", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None; // never joined
    dispatch(
        &state,
        &mut board,
        client_id,
        &tx,
        ClientMessage::BoardUpdate { board_id: "b1".into(), objects: vec![], version: 1 },
    )
    .await;
    assert_no_frame(&mut peer_rx).await;
}

#[tokio::test]
async fn rooms_are_isolated() {
    let state = AppState::new();
    let (_a, mut rx_a) = seed_member(&state, "board-a", "u-a", "Ada").await;
    let (_b, mut rx_b) = seed_member(&state, "board-b", "u-b", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    dispatch(&state, &mut board, client_id, &tx, join("board-a", "u1", "Eve")).await;
    let _ = recv_frame(&mut rx_a).await; // user_joined in room A

    dispatch(
        &state,
        &mut board,
        client_id,
        &tx,
        ClientMessage::BoardUpdate { board_id: "board-a".into(), objects: vec![circle("x")], version: 2 },
    )
    .await;

    let ServerMessage::BoardUpdated { .. } = recv_frame(&mut rx_a).await else {
        panic!("expected board_updated in room A");
    };
    // Room B hears nothing at all.
    assert_no_frame(&mut rx_b).await;
}

// =============================================================
// Leave
// =============================================================

#[tokio::test]
async fn leaving_broadcasts_user_left_and_evicts_empty_rooms() {
    let state = AppState::new();
    let (_peer, mut peer_rx) = seed_member(&state, "b1", "u2", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    dispatch(&state, &mut board, client_id, &tx, join("b1", "u1", "Ada")).await;
    let _ = recv_frame(&mut peer_rx).await; // user_joined

    leave_room(&state, "b1", client_id).await;
    let ServerMessage::UserLeft { user_id, .. } = recv_frame(&mut peer_rx).await else {
        panic!("expected user_left");
    };
    assert_eq!(user_id, "u1");
    assert_eq!(state.rooms.read().await["b1"].members.len(), 1);
}

#[tokio::test]
async fn last_member_leaving_removes_the_room() {
    let state = AppState::new();
    let (client_id, _rx) = seed_member(&state, "b1", "u1", "Ada").await;
    leave_room(&state, "b1", client_id).await;
    assert!(!state.rooms.read().await.contains_key("b1"));
}

// =============================================================
// Malformed input
// =============================================================

#[tokio::test]
async fn invalid_json_is_ignored() {
    let state = AppState::new();
    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    let replies =
        process_inbound_text(&state, &mut board, client_id, &tx, "this is not json").await;
    assert!(replies.is_empty());
    assert!(board.is_none());
}

#[tokio::test]
async fn rejoining_another_board_moves_the_connection() {
    let state = AppState::new();
    let (_a, mut rx_a) = seed_member(&state, "board-a", "u-a", "Ada").await;
    let (_b, mut rx_b) = seed_member(&state, "board-b", "u-b", "Grace").await;

    let client_id = Uuid::new_v4();
    let (tx, _rx) = mpsc::channel(8);
    let mut board = None;
    dispatch(&state, &mut board, client_id, &tx, join("board-a", "u1", "Eve")).await;
    let _ = recv_frame(&mut rx_a).await; // user_joined in A

    dispatch(&state, &mut board, client_id, &tx, join("board-b", "u1", "Eve")).await;
    assert_eq!(board.as_deref(), Some("board-b"));

    // A hears the departure, B hears the arrival.
    let ServerMessage::UserLeft { user_id, .. } = recv_frame(&mut rx_a).await else {
        panic!("expected user_left in room A");
    };
    assert_eq!(user_id, "u1");
    let ServerMessage::UserJoined { user_id, .. } = recv_frame(&mut rx_b).await else {
        panic!("expected user_joined in room B");
    };
    assert_eq!(user_id, "u1");
}

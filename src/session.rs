//! Board session: the client-side commit path.
//!
//! DESIGN
//! ======
//! The session owns the document, its history, the selection, and the peer
//! presence roster, and orchestrates the commit path explicitly:
//!
//! ```text
//! local mutation → Document op → History push → ClientMessage for broadcast
//! ```
//!
//! History push and broadcast are composable side steps, not internals of
//! the model, so tests exercise the document without network or history.
//! The session never sends anything itself — every mutating method returns
//! the `ClientMessage` the connection owner should relay (or `None` when
//! nothing changed). Inbound hub traffic is applied via `apply_remote`:
//! document snapshots overwrite wholesale (last write wins, no history
//! entry), presence events update the roster.
//!
//! Text entry is two-phase: `begin_text_entry` parks a pending location,
//! `complete_text_entry` commits the label. Nothing ever blocks the event
//! loop waiting for input.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::collections::HashMap;

use tracing::debug;

use crate::api::{self, AiReply, BoardSnapshot, SuggestionSource};
use crate::consts::{VIEWPORT_CENTER_X, VIEWPORT_CENTER_Y};
use crate::doc::{BoardObject, Document, GeometryPatch, IdGen, ObjectId, Point, Shape};
use crate::history::History;
use crate::interpret::{self, ShapeCommand};
use crate::protocol::{ClientMessage, Presence, ServerMessage};
use crate::suggest::{self, SuggestError, Suggestion};

/// Identity of the local participant.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub user_id: String,
    pub name: String,
}

/// Outcome of running a prompt through the rule-based interpreter.
#[derive(Debug)]
pub enum CommandOutcome {
    /// Shapes were created and committed; relay the message.
    Applied(ClientMessage),
    /// No shape keyword recognized — ask the AI collaborator instead.
    NeedsAi,
}

/// Outcome of a full prompt round: local interpreter, then AI fallback.
#[derive(Debug)]
pub enum PromptOutcome {
    /// Shapes were created and committed; relay the message.
    Applied(ClientMessage),
    /// The collaborator answered with suggestions for the user to review.
    Suggestions(Vec<Suggestion>),
    /// Neither path produced anything. The document is untouched.
    NoSuggestions,
}

/// A text entry waiting for its content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PendingText {
    pub at: Point,
}

/// One open board on one client.
pub struct Session {
    board_id: String,
    user: SessionUser,
    doc: Document,
    history: History,
    ids: IdGen,
    selection: Option<ObjectId>,
    peers: HashMap<String, Presence>,
    pending_text: Option<PendingText>,
    viewport_center: Point,
}

impl Session {
    /// Open a session over a freshly fetched board snapshot. History starts
    /// with the loaded document as its single entry.
    #[must_use]
    pub fn new(board_id: impl Into<String>, user: SessionUser, snapshot: BoardSnapshot) -> Self {
        let doc = Document::from_snapshot(snapshot.objects, snapshot.version);
        let history = History::new(doc.objects().to_vec());
        Self {
            board_id: board_id.into(),
            user,
            doc,
            history,
            ids: IdGen::new(),
            selection: None,
            peers: HashMap::new(),
            pending_text: None,
            viewport_center: Point::new(VIEWPORT_CENTER_X, VIEWPORT_CENTER_Y),
        }
    }

    // --- Queries ---

    #[must_use]
    pub fn board_id(&self) -> &str {
        &self.board_id
    }

    #[must_use]
    pub fn document(&self) -> &Document {
        &self.doc
    }

    #[must_use]
    pub fn selection(&self) -> Option<&ObjectId> {
        self.selection.as_ref()
    }

    /// The presence roster of the other room members, keyed by user id.
    #[must_use]
    pub fn peers(&self) -> &HashMap<String, Presence> {
        &self.peers
    }

    #[must_use]
    pub fn pending_text(&self) -> Option<PendingText> {
        self.pending_text
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Hello for the hub, sent once after connecting.
    #[must_use]
    pub fn join_message(&self) -> ClientMessage {
        ClientMessage::JoinBoard {
            board_id: self.board_id.clone(),
            user_id: self.user.user_id.clone(),
            name: self.user.name.clone(),
        }
    }

    /// Move the anchor used when a spatial reference cannot be resolved.
    pub fn set_viewport_center(&mut self, center: Point) {
        self.viewport_center = center;
    }

    // --- Commit path ---

    /// Snapshot the committed document into history and produce the
    /// broadcast message. Every local mutation funnels through here.
    fn committed(&mut self) -> ClientMessage {
        self.history.commit(self.doc.objects().to_vec());
        self.board_update()
    }

    fn board_update(&self) -> ClientMessage {
        ClientMessage::BoardUpdate {
            board_id: self.board_id.clone(),
            objects: self.doc.objects().to_vec(),
            version: self.doc.version(),
        }
    }

    /// Create one shape (e.g. a finished freehand stroke or a toolbar drop).
    pub fn create_shape(&mut self, shape: Shape) -> ClientMessage {
        let object = BoardObject::new(self.ids.mint(), shape);
        self.selection = Some(object.id.clone());
        self.doc.create(object);
        self.committed()
    }

    /// Delete an object. `None` when the id is unknown (nothing committed).
    pub fn delete_object(&mut self, id: &str) -> Option<ClientMessage> {
        if !self.doc.delete_by_id(id) {
            return None;
        }
        if self.selection.as_deref() == Some(id) {
            self.selection = None;
        }
        Some(self.committed())
    }

    /// Drag/resize an object. `None` when the id is unknown.
    pub fn update_geometry(&mut self, id: &str, patch: &GeometryPatch) -> Option<ClientMessage> {
        if !self.doc.update_geometry(id, patch) {
            return None;
        }
        Some(self.committed())
    }

    // --- Undo / redo ---

    /// Step the document back one snapshot and produce the re-broadcast.
    /// Does not push a history entry — undoing is not itself undoable.
    pub fn undo(&mut self) -> Option<ClientMessage> {
        let snapshot = self.history.undo()?.to_vec();
        self.doc.replace_all(snapshot);
        self.drop_stale_selection();
        Some(self.board_update())
    }

    /// Step the document forward one snapshot. See [`Session::undo`].
    pub fn redo(&mut self) -> Option<ClientMessage> {
        let snapshot = self.history.redo()?.to_vec();
        self.doc.replace_all(snapshot);
        self.drop_stale_selection();
        Some(self.board_update())
    }

    // --- Command interpreter ---

    /// Run a natural-language prompt through the rule-based interpreter.
    /// One prompt is one commit, however many instances it creates.
    pub fn run_command(&mut self, prompt: &str) -> CommandOutcome {
        let Some(command) = interpret::interpret(prompt, self.doc.objects()) else {
            debug!(prompt, "no shape keyword recognized; deferring to AI");
            return CommandOutcome::NeedsAi;
        };
        CommandOutcome::Applied(self.apply_command(&command))
    }

    /// Materialize and commit an already parsed command (local fast path or
    /// a structured command returned by the AI collaborator).
    pub fn apply_command(&mut self, command: &ShapeCommand) -> ClientMessage {
        let created = interpret::build_shapes(
            command,
            self.doc.objects(),
            self.viewport_center,
            &mut self.ids,
        );
        if let Some(last) = created.last() {
            self.selection = Some(last.id.clone());
        }
        self.doc.create_many(created);
        self.committed()
    }

    /// Full prompt round: the rule-based interpreter is always attempted
    /// first; the AI collaborator is only consulted when it recognizes
    /// nothing. Collaborator trouble surfaces as `NoSuggestions`, never as
    /// a fault.
    pub async fn run_prompt(
        &mut self,
        source: &dyn SuggestionSource,
        prompt: &str,
    ) -> PromptOutcome {
        match self.run_command(prompt) {
            CommandOutcome::Applied(message) => PromptOutcome::Applied(message),
            CommandOutcome::NeedsAi => {
                let reply = api::suggestions_or_empty(
                    source,
                    &self.board_id,
                    self.doc.objects(),
                    Some(prompt),
                )
                .await;
                match reply {
                    AiReply::Commands(commands) => {
                        // One commit per command keeps undo steps aligned
                        // with what the user asked for.
                        let mut last = None;
                        for command in &commands {
                            last = Some(self.apply_command(command));
                        }
                        last.map_or(PromptOutcome::NoSuggestions, PromptOutcome::Applied)
                    }
                    AiReply::Suggestions(suggestions) if suggestions.is_empty() => {
                        PromptOutcome::NoSuggestions
                    }
                    AiReply::Suggestions(suggestions) => PromptOutcome::Suggestions(suggestions),
                }
            }
        }
    }

    // --- Suggestions ---

    /// Apply an AI suggestion to the most recent object.
    ///
    /// # Errors
    ///
    /// Propagates [`SuggestError`] untouched; the document and version are
    /// unchanged on failure.
    pub fn apply_suggestion(
        &mut self,
        suggestion: &Suggestion,
    ) -> Result<ClientMessage, SuggestError> {
        let applied = suggest::apply(suggestion, self.doc.objects(), &mut self.ids)?;
        self.selection = Some(applied.selected);
        self.doc.replace_all(applied.objects);
        Ok(self.committed())
    }

    // --- Text entry (two-phase) ---

    /// Park a pending text entry at a board location. Completion arrives
    /// later via [`Session::complete_text_entry`].
    pub fn begin_text_entry(&mut self, at: Point) {
        self.pending_text = Some(PendingText { at });
    }

    /// Commit the pending text entry. `None` when there is no pending entry
    /// or the content is blank (entry is dropped either way).
    pub fn complete_text_entry(&mut self, content: &str) -> Option<ClientMessage> {
        let pending = self.pending_text.take()?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return None;
        }
        let shape = Shape::Text {
            x: pending.at.x,
            y: pending.at.y,
            text: trimmed.to_string(),
            font_size: crate::consts::TEXT_DEFAULT_FONT_SIZE,
            width: None,
            height: None,
            color: crate::consts::DEFAULT_STROKE.to_string(),
        };
        Some(self.create_shape(shape))
    }

    pub fn cancel_text_entry(&mut self) {
        self.pending_text = None;
    }

    // --- Cursor ---

    /// Wrap a local cursor move for relay. Never touches document or history.
    #[must_use]
    pub fn cursor_move(&self, cursor: Point) -> ClientMessage {
        ClientMessage::CursorMove { board_id: self.board_id.clone(), cursor }
    }

    // --- Inbound relay traffic ---

    /// Apply a message fanned out by the hub.
    pub fn apply_remote(&mut self, message: ServerMessage) {
        match message {
            ServerMessage::BoardUpdated { objects, version } => {
                // Full-snapshot overwrite: the last update received wins,
                // whatever this client thought it knew.
                self.doc.sync_remote(objects, version);
                self.drop_stale_selection();
            }
            ServerMessage::UsersList { users } => {
                self.peers = users
                    .into_iter()
                    .map(|p| (p.user_id.clone(), p))
                    .collect();
            }
            ServerMessage::UserJoined { user_id, name } => {
                self.peers
                    .insert(user_id.clone(), Presence { user_id, name, cursor: None });
            }
            ServerMessage::UserLeft { user_id, .. } => {
                self.peers.remove(&user_id);
            }
            ServerMessage::CursorMoved { user_id, cursor } => {
                if let Some(peer) = self.peers.get_mut(&user_id) {
                    peer.cursor = Some(cursor);
                }
            }
        }
    }

    fn drop_stale_selection(&mut self) {
        if let Some(id) = &self.selection {
            if self.doc.get(id).is_none() {
                self.selection = None;
            }
        }
    }
}

//! `VectorBoard` — collaborative vector canvas engine and relay hub.
//!
//! The library half is the client-side engine: a document model over a
//! tagged-union shape type, a pure bounding-box geometry engine, linear
//! snapshot undo/redo, a rule-based natural-language shape interpreter with
//! an AI-collaborator fallback, and a suggestion applier. The binary half is
//! the collaboration hub: a stateless, room-scoped websocket relay for
//! presence, cursors, and full-document updates.
//!
//! Synchronization is deliberately coarse: every committed local mutation
//! broadcasts the whole object list, and receivers overwrite wholesale.
//! There is no operation merge and no cross-client ordering guarantee —
//! concurrent commits race and the last frame received wins on each peer.

pub mod api;
pub mod consts;
pub mod doc;
pub mod geometry;
pub mod history;
pub mod hub;
pub mod interpret;
pub mod net;
pub mod protocol;
pub mod session;
pub mod suggest;

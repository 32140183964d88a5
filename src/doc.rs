//! Document model: board objects, the shape sum type, and the shared document.
//!
//! This module defines the core data types that describe what is on the board
//! (`BoardObject`, `Shape`), a sparse-update type for drag/resize edits
//! (`GeometryPatch`), a collision-resistant id mint (`IdGen`), and the
//! `Document` that owns the live object list and its version counter.
//!
//! ORDERING INVARIANT
//! ==================
//! `Document.objects` is append-only: creation order is z-order, and the last
//! element is "the most recently created object" — the canonical reference
//! target for interpreter and suggestion operations. Deletions filter the
//! sequence; nothing ever re-sorts it.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::consts::{DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, TEXT_DEFAULT_FONT_SIZE};

/// Unique identifier for a board object. Opaque; minted client-side.
pub type ObjectId = String;

/// A point in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The kind of a board object. Mirrors the `kind` tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    Pen,
    Rectangle,
    Circle,
    Arrow,
    Text,
}

/// Kind-specific geometry and style payload.
///
/// One variant per shape kind so that no code path can read a field that
/// does not exist for the kind at hand. Serialized as `{"kind": ...,
/// "data": {...}}`, the document format the board stores and relays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "lowercase")]
pub enum Shape {
    /// Freehand stroke through a list of points.
    Pen {
        points: Vec<Point>,
        #[serde(default = "default_stroke")]
        color: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f64,
    },
    /// Axis-aligned rectangle. `width`/`height` may be negative while a
    /// drag-to-create is in flight; the geometry engine normalizes.
    Rectangle {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default = "default_stroke_width")]
        stroke_width: f64,
    },
    /// Circle stored as center point plus radius.
    Circle {
        x: f64,
        y: f64,
        radius: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        stroke: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        fill: Option<String>,
        #[serde(default = "default_stroke_width")]
        stroke_width: f64,
    },
    /// Directed arrow through a list of points (tail first, head last).
    Arrow {
        points: Vec<Point>,
        #[serde(default = "default_stroke")]
        color: String,
        #[serde(default = "default_stroke_width")]
        stroke_width: f64,
    },
    /// Text label anchored at its top-left corner. `width`/`height` are
    /// optional because the client has no real text measurement.
    Text {
        x: f64,
        y: f64,
        text: String,
        #[serde(default = "default_font_size")]
        font_size: f64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        width: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        height: Option<f64>,
        #[serde(default = "default_stroke")]
        color: String,
    },
}

fn default_stroke() -> String {
    DEFAULT_STROKE.to_string()
}

fn default_stroke_width() -> f64 {
    DEFAULT_STROKE_WIDTH
}

fn default_font_size() -> f64 {
    TEXT_DEFAULT_FONT_SIZE
}

impl Shape {
    /// The kind tag for this shape.
    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        match self {
            Self::Pen { .. } => ShapeKind::Pen,
            Self::Rectangle { .. } => ShapeKind::Rectangle,
            Self::Circle { .. } => ShapeKind::Circle,
            Self::Arrow { .. } => ShapeKind::Arrow,
            Self::Text { .. } => ShapeKind::Text,
        }
    }
}

/// A board object as stored in the document and on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardObject {
    /// Unique identifier for this object.
    pub id: ObjectId,
    /// Kind tag plus kind-specific payload, flattened to `{kind, data}`.
    #[serde(flatten)]
    pub shape: Shape,
}

impl BoardObject {
    #[must_use]
    pub fn new(id: ObjectId, shape: Shape) -> Self {
        Self { id, shape }
    }

    #[must_use]
    pub fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }
}

/// Sparse geometry update applied on drag/resize. Only present fields are
/// applied; fields that do not exist for the target's kind are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeometryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<Point>>,
}

impl GeometryPatch {
    fn apply(&self, shape: &mut Shape) {
        match shape {
            Shape::Pen { points, .. } | Shape::Arrow { points, .. } => {
                if let Some(new_points) = &self.points {
                    *points = new_points.clone();
                }
            }
            Shape::Rectangle { x, y, width, height, .. } => {
                if let Some(v) = self.x {
                    *x = v;
                }
                if let Some(v) = self.y {
                    *y = v;
                }
                if let Some(v) = self.width {
                    *width = v;
                }
                if let Some(v) = self.height {
                    *height = v;
                }
            }
            Shape::Circle { x, y, radius, .. } => {
                if let Some(v) = self.x {
                    *x = v;
                }
                if let Some(v) = self.y {
                    *y = v;
                }
                if let Some(v) = self.radius {
                    *radius = v;
                }
            }
            Shape::Text { x, y, width, height, .. } => {
                if let Some(v) = self.x {
                    *x = v;
                }
                if let Some(v) = self.y {
                    *y = v;
                }
                if let Some(v) = self.width {
                    *width = Some(v);
                }
                if let Some(v) = self.height {
                    *height = Some(v);
                }
            }
        }
    }
}

/// Mint for object ids: milliseconds-since-epoch, a local sequence number,
/// and a random suffix so concurrent creators on different clients cannot
/// collide.
#[derive(Debug)]
pub struct IdGen {
    seq: u32,
}

impl IdGen {
    #[must_use]
    pub fn new() -> Self {
        Self { seq: 0 }
    }

    /// Mint a fresh object id.
    pub fn mint(&mut self) -> ObjectId {
        let ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0, |d| d.as_millis());
        self.seq = self.seq.wrapping_add(1);
        let salt: u16 = rand::random();
        format!("{ms:x}-{:x}-{salt:04x}", self.seq)
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// The shared document: ordered object list plus a monotonic version counter.
///
/// `version` strictly increases on every committed local mutation. It is not
/// a vector clock: two clients can increment independently from the same
/// base, so versions are neither unique nor causally ordered across peers.
/// Remote snapshots overwrite both list and counter wholesale.
#[derive(Debug, Clone, Default)]
pub struct Document {
    objects: Vec<BoardObject>,
    version: u64,
}

impl Document {
    /// Create an empty document at version 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a document from a loaded snapshot, keeping its version.
    #[must_use]
    pub fn from_snapshot(objects: Vec<BoardObject>, version: u64) -> Self {
        Self { objects, version }
    }

    /// All objects in creation order (z-order).
    #[must_use]
    pub fn objects(&self) -> &[BoardObject] {
        &self.objects
    }

    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The most recently created object, if any.
    #[must_use]
    pub fn last(&self) -> Option<&BoardObject> {
        self.objects.last()
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&BoardObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Append a newly created object. Commits one version.
    pub fn create(&mut self, object: BoardObject) {
        let mut next = self.objects.clone();
        next.push(object);
        self.objects = next;
        self.version += 1;
    }

    /// Append several objects as a single committed mutation — used by the
    /// multi-instance interpreter layout so one command is one version.
    pub fn create_many(&mut self, objects: Vec<BoardObject>) {
        let mut next = self.objects.clone();
        next.extend(objects);
        self.objects = next;
        self.version += 1;
    }

    /// Replace the whole object list. Commits one version.
    pub fn replace_all(&mut self, objects: Vec<BoardObject>) {
        self.objects = objects;
        self.version += 1;
    }

    /// Remove an object by id. Returns false (and commits nothing) if the id
    /// is unknown. Filtering preserves the order of the survivors.
    pub fn delete_by_id(&mut self, id: &str) -> bool {
        if !self.objects.iter().any(|o| o.id == id) {
            return false;
        }
        self.objects = self
            .objects
            .iter()
            .filter(|o| o.id != id)
            .cloned()
            .collect();
        self.version += 1;
        true
    }

    /// Apply a geometry patch to an object. Returns false (and commits
    /// nothing) if the id is unknown. Patch fields that do not exist for
    /// the object's kind are ignored.
    pub fn update_geometry(&mut self, id: &str, patch: &GeometryPatch) -> bool {
        if !self.objects.iter().any(|o| o.id == id) {
            return false;
        }
        self.objects = self
            .objects
            .iter()
            .map(|o| {
                if o.id == id {
                    let mut updated = o.clone();
                    patch.apply(&mut updated.shape);
                    updated
                } else {
                    o.clone()
                }
            })
            .collect();
        self.version += 1;
        true
    }

    /// Overwrite the document with a remote peer's snapshot. The peer's
    /// version is taken verbatim — last write wins, no merge.
    pub fn sync_remote(&mut self, objects: Vec<BoardObject>, version: u64) {
        self.objects = objects;
        self.version = version;
    }
}

//! Suggestion applier: AI suggestion records → document mutations.
//!
//! DESIGN
//! ======
//! Suggestions always target the most recently created object (the last
//! element of the document order). Each successful apply produces exactly one
//! new object list for the caller to commit — one commit, one history entry,
//! one broadcast — and names the object that should become the selection.
//! A missing target or a target with no bounding box is a clean failure that
//! leaves the document untouched.

#[cfg(test)]
#[path = "suggest_test.rs"]
mod suggest_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::consts::{DEFAULT_FILL, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, SPACING, TEXT_DEFAULT_FONT_SIZE, TEXT_DEFAULT_WIDTH};
use crate::doc::{BoardObject, IdGen, ObjectId, Point, Shape};
use crate::geometry::bounding_box;

// =============================================================================
// TYPES
// =============================================================================

/// What a suggestion proposes to do. Unknown wire values land on `Other`
/// and go through the title-keyword fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum SuggestionKind {
    ShapeClean,
    Annotation,
    DiagramImprovement,
    Other,
}

impl From<String> for SuggestionKind {
    fn from(value: String) -> Self {
        match value.as_str() {
            "shape_clean" => Self::ShapeClean,
            "annotation" => Self::Annotation,
            "diagram_improvement" => Self::DiagramImprovement,
            _ => Self::Other,
        }
    }
}

/// Opaque suggestion record from the AI collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suggestion {
    #[serde(default = "fresh_suggestion_id")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

fn fresh_suggestion_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SuggestError {
    /// No object on the board to apply the suggestion to, or the target has
    /// no usable bounding box.
    #[error("no target object to apply the suggestion to")]
    NoTarget,
    /// The suggestion kind is unknown and its title matches no fallback.
    #[error("unrecognized suggestion: {0}")]
    Unrecognized(String),
}

/// Result of a successful apply: the full replacement object list and the
/// object the session should select.
#[derive(Debug, Clone)]
pub struct Applied {
    pub objects: Vec<BoardObject>,
    pub selected: ObjectId,
}

// =============================================================================
// APPLY
// =============================================================================

/// Apply a suggestion to the current object list.
///
/// # Errors
///
/// `NoTarget` when the board is empty or the last object has no bounding
/// box; `Unrecognized` when an unknown suggestion kind has no title-keyword
/// fallback. Neither failure mutates anything.
pub fn apply(
    suggestion: &Suggestion,
    objects: &[BoardObject],
    ids: &mut IdGen,
) -> Result<Applied, SuggestError> {
    let kind = effective_kind(suggestion)?;
    let target = objects.last().ok_or(SuggestError::NoTarget)?;
    let bounds = bounding_box(target).ok_or(SuggestError::NoTarget)?;

    match kind {
        SuggestionKind::ShapeClean => {
            // Tidy the sketch into a clean borderless container over its
            // own footprint. The target itself is replaced.
            let replacement = BoardObject::new(
                ids.mint(),
                Shape::Rectangle {
                    x: bounds.x,
                    y: bounds.y,
                    width: bounds.width,
                    height: bounds.height,
                    stroke: None,
                    fill: Some(DEFAULT_FILL.to_string()),
                    stroke_width: 0.0,
                },
            );
            let selected = replacement.id.clone();
            let mut next: Vec<BoardObject> = objects
                .iter()
                .filter(|o| o.id != target.id)
                .cloned()
                .collect();
            next.push(replacement);
            Ok(Applied { objects: next, selected })
        }
        SuggestionKind::Annotation => {
            let center = bounds.center();
            let label = if suggestion.title.trim().is_empty() {
                "Label".to_string()
            } else {
                suggestion.title.trim().to_string()
            };
            let annotation = BoardObject::new(
                ids.mint(),
                Shape::Text {
                    x: center.x - TEXT_DEFAULT_WIDTH / 2.0,
                    y: center.y - TEXT_DEFAULT_FONT_SIZE / 2.0,
                    text: label,
                    font_size: TEXT_DEFAULT_FONT_SIZE,
                    width: None,
                    height: None,
                    color: DEFAULT_STROKE.to_string(),
                },
            );
            let selected = annotation.id.clone();
            let mut next = objects.to_vec();
            next.push(annotation);
            Ok(Applied { objects: next, selected })
        }
        SuggestionKind::DiagramImprovement => {
            // Extend the target into a flow: a sibling of the same footprint
            // to its right, connected by an arrow between centers.
            let center = bounds.center();
            let sibling_center = Point::new(
                bounds.right() + SPACING + bounds.width / 2.0,
                center.y,
            );
            let sibling = BoardObject::new(
                ids.mint(),
                Shape::Rectangle {
                    x: sibling_center.x - bounds.width / 2.0,
                    y: sibling_center.y - bounds.height / 2.0,
                    width: bounds.width,
                    height: bounds.height,
                    stroke: Some(DEFAULT_STROKE.to_string()),
                    fill: None,
                    stroke_width: DEFAULT_STROKE_WIDTH,
                },
            );
            let connector = BoardObject::new(
                ids.mint(),
                Shape::Arrow {
                    points: vec![center, sibling_center],
                    color: DEFAULT_STROKE.to_string(),
                    stroke_width: DEFAULT_STROKE_WIDTH,
                },
            );
            let selected = sibling.id.clone();
            let mut next = objects.to_vec();
            next.push(sibling);
            next.push(connector);
            Ok(Applied { objects: next, selected })
        }
        SuggestionKind::Other => Err(SuggestError::Unrecognized(suggestion.title.clone())),
    }
}

/// Resolve `Other` kinds by sniffing the title for a known intent.
fn effective_kind(suggestion: &Suggestion) -> Result<SuggestionKind, SuggestError> {
    if suggestion.kind != SuggestionKind::Other {
        return Ok(suggestion.kind);
    }
    let title = suggestion.title.to_lowercase();
    if title.contains("rectangle") {
        Ok(SuggestionKind::ShapeClean)
    } else if title.contains("label") {
        Ok(SuggestionKind::Annotation)
    } else if title.contains("flow") {
        Ok(SuggestionKind::DiagramImprovement)
    } else {
        Err(SuggestError::Unrecognized(suggestion.title.clone()))
    }
}

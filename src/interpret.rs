//! Command interpreter: natural-language prompts → shape-creation commands.
//!
//! DESIGN
//! ======
//! Rule-based fast path, always attempted before the AI collaborator:
//! tokenize the prompt, pick out a quantity, a shape keyword, a spatial
//! keyword, and an optional reference kind, and normalize them into a
//! `ShapeCommand`. `interpret` returns `None` only when no shape keyword is
//! recognized at all — the signal to fall back to the AI endpoint.
//!
//! Placement is the second phase: `build_shapes` resolves the command's
//! spatial reference against the live document (most-recent-first), offsets
//! from the reference's bounding-box edge, and lays multiple instances out
//! in one centered row. An unresolvable reference is never an error — the
//! new shape simply lands at the viewport center.

#[cfg(test)]
#[path = "interpret_test.rs"]
mod interpret_test;

use serde::{Deserialize, Serialize};

use crate::consts::{
    BASE_SIZE, DEFAULT_STROKE, DEFAULT_STROKE_WIDTH, SPACING, TEXT_DEFAULT_FONT_SIZE,
    TEXT_DEFAULT_WIDTH,
};
use crate::doc::{BoardObject, IdGen, Point, Shape};
use crate::geometry::{Bounds, bounding_box};

// =============================================================================
// COMMAND TYPES
// =============================================================================

/// Shape kinds a command can request. Triangle has no native document kind;
/// it is synthesized as a closed pen path at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    Triangle,
    Circle,
    Rectangle,
    Arrow,
    Text,
}

/// Where the new shape goes relative to its reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    #[default]
    Center,
    Above,
    Below,
    Left,
    Right,
}

/// Which existing object anchors a spatial placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reference {
    /// The most recently created object.
    Last,
    /// The most recent object of a named kind.
    Kind(ShapeType),
}

/// Normalized output of the interpreter, consumed by the document mutator.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeCommand {
    pub shape_type: ShapeType,
    /// Always at least 1.
    pub quantity: u32,
    pub position: Position,
    pub reference: Reference,
    /// Only meaningful for text shapes.
    pub text_content: Option<String>,
}

// =============================================================================
// PARSE
// =============================================================================

const ACTION_VERBS: [&str; 5] = ["make", "create", "draw", "add", "insert"];

const NUMBER_WORDS: [(&str, u32); 10] = [
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
];

/// Interpret a prompt against the current document.
///
/// Returns `None` when the prompt names no recognizable shape — the caller
/// should fall back to the AI collaborator.
#[must_use]
pub fn interpret(prompt: &str, objects: &[BoardObject]) -> Option<ShapeCommand> {
    let tokens = tokenize(prompt);

    let (shape_type, shape_idx) = parse_shape_type(&tokens)?;
    let quantity = parse_quantity(&tokens);
    let position = parse_position(&tokens);
    let reference = parse_reference(&tokens, shape_idx, objects);

    let text_content = if shape_type == ShapeType::Text {
        extract_text_content(prompt)
    } else {
        None
    };

    Some(ShapeCommand { shape_type, quantity, position, reference, text_content })
}

/// Lowercase word tokens; punctuation splits, apostrophes vanish.
fn tokenize(prompt: &str) -> Vec<String> {
    prompt
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_quantity(tokens: &[String]) -> u32 {
    for token in tokens {
        if let Ok(n) = token.parse::<u32>() {
            if n >= 1 {
                return n;
            }
        }
        for (word, n) in NUMBER_WORDS {
            if token == word {
                return n;
            }
        }
    }
    1
}

fn keyword_shape_type(token: &str) -> Option<ShapeType> {
    let singular = token.strip_suffix('s').unwrap_or(token);
    match singular {
        "triangle" => Some(ShapeType::Triangle),
        "circle" => Some(ShapeType::Circle),
        "rectangle" | "square" => Some(ShapeType::Rectangle),
        "arrow" => Some(ShapeType::Arrow),
        "text" | "label" => Some(ShapeType::Text),
        _ => None,
    }
}

/// Find the requested shape kind: prefer the first keyword after an action
/// verb, else the first bare keyword anywhere in the prompt.
fn parse_shape_type(tokens: &[String]) -> Option<(ShapeType, usize)> {
    let verb_idx = tokens
        .iter()
        .position(|t| ACTION_VERBS.contains(&t.as_str()));
    if let Some(vi) = verb_idx {
        for (i, token) in tokens.iter().enumerate().skip(vi + 1) {
            if let Some(st) = keyword_shape_type(token) {
                return Some((st, i));
            }
        }
    }
    tokens
        .iter()
        .enumerate()
        .find_map(|(i, t)| keyword_shape_type(t).map(|st| (st, i)))
}

fn parse_position(tokens: &[String]) -> Position {
    for token in tokens {
        match token.as_str() {
            "below" | "under" | "beneath" => return Position::Below,
            "above" | "over" => return Position::Above,
            "right" | "beside" => return Position::Right,
            "left" => return Position::Left,
            _ => {}
        }
    }
    Position::Center
}

/// A second shape keyword in the prompt names the reference kind ("add a
/// circle below the triangle"). The reference degrades to `Last` when no
/// other kind is mentioned or when the mentioned kind has no live instance.
fn parse_reference(tokens: &[String], shape_idx: usize, objects: &[BoardObject]) -> Reference {
    let mentioned = tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != shape_idx)
        .find_map(|(_, t)| keyword_shape_type(t));
    match mentioned {
        Some(kind) if find_reference(objects, Reference::Kind(kind)).is_some() => {
            Reference::Kind(kind)
        }
        _ => Reference::Last,
    }
}

/// Pull quoted text or a `text:`/`label:` suffix out of the raw prompt.
fn extract_text_content(prompt: &str) -> Option<String> {
    for quote in ['"', '\''] {
        let mut parts = prompt.splitn(3, quote);
        let _before = parts.next()?;
        if let Some(inner) = parts.next() {
            if parts.next().is_some() && !inner.trim().is_empty() {
                return Some(inner.trim().to_string());
            }
        }
    }
    let lower = prompt.to_lowercase();
    for prefix in ["text:", "label:"] {
        if let Some(idx) = lower.find(prefix) {
            let content = prompt[idx + prefix.len()..].trim();
            if !content.is_empty() {
                return Some(content.to_string());
            }
        }
    }
    None
}

// =============================================================================
// REFERENCE RESOLUTION
// =============================================================================

/// Closed pen paths stand in for triangles: at least four points with the
/// last returning to the first.
#[must_use]
pub fn is_closed_pen_path(object: &BoardObject) -> bool {
    let Shape::Pen { points, .. } = &object.shape else {
        return false;
    };
    if points.len() < 4 {
        return false;
    }
    let (first, last) = (points[0], points[points.len() - 1]);
    (first.x - last.x).abs() < 1e-6 && (first.y - last.y).abs() < 1e-6
}

fn matches_shape_type(object: &BoardObject, shape_type: ShapeType) -> bool {
    match (shape_type, &object.shape) {
        (ShapeType::Triangle, _) => is_closed_pen_path(object),
        (ShapeType::Circle, Shape::Circle { .. })
        | (ShapeType::Rectangle, Shape::Rectangle { .. })
        | (ShapeType::Arrow, Shape::Arrow { .. })
        | (ShapeType::Text, Shape::Text { .. }) => true,
        _ => false,
    }
}

/// Resolve a reference most-recent-first against the document order.
#[must_use]
pub fn find_reference(objects: &[BoardObject], reference: Reference) -> Option<&BoardObject> {
    match reference {
        Reference::Last => objects.last(),
        Reference::Kind(kind) => objects.iter().rev().find(|o| matches_shape_type(o, kind)),
    }
}

// =============================================================================
// PLACEMENT
// =============================================================================

/// Nominal extent of a shape the command will create, used for spacing.
fn nominal_size(shape_type: ShapeType) -> (f64, f64) {
    match shape_type {
        ShapeType::Text => (TEXT_DEFAULT_WIDTH, TEXT_DEFAULT_FONT_SIZE),
        _ => (BASE_SIZE, BASE_SIZE),
    }
}

/// Center point for the new shape (or the row anchor for quantity > 1).
///
/// Falls back to the viewport center when the position is `Center`, when no
/// reference object resolves, or when the reference has no bounding box.
fn resolve_anchor(
    command: &ShapeCommand,
    objects: &[BoardObject],
    viewport_center: Point,
) -> Point {
    if command.position == Position::Center {
        return viewport_center;
    }
    let Some(reference) = find_reference(objects, command.reference) else {
        return viewport_center;
    };
    let Some(bounds) = bounding_box(reference) else {
        return viewport_center;
    };
    let (w, h) = nominal_size(command.shape_type);
    offset_from(&bounds, command.position, w, h)
}

fn offset_from(bounds: &Bounds, position: Position, new_w: f64, new_h: f64) -> Point {
    let center = bounds.center();
    match position {
        Position::Below => Point::new(center.x, bounds.bottom() + SPACING + new_h / 2.0),
        Position::Above => Point::new(center.x, bounds.y - SPACING - new_h / 2.0),
        Position::Right => Point::new(bounds.right() + SPACING + new_w / 2.0, center.y),
        Position::Left => Point::new(bounds.x - SPACING - new_w / 2.0, center.y),
        Position::Center => center,
    }
}

/// Materialize a command into board objects, resolved against the current
/// document. Instances share one style and one row; ids are all distinct.
#[must_use]
pub fn build_shapes(
    command: &ShapeCommand,
    objects: &[BoardObject],
    viewport_center: Point,
    ids: &mut IdGen,
) -> Vec<BoardObject> {
    let n = command.quantity.max(1);
    let (w, _h) = nominal_size(command.shape_type);
    let anchor = resolve_anchor(command, objects, viewport_center);
    let row_width = f64::from(n) * w + f64::from(n - 1) * SPACING;

    (0..n)
        .map(|i| {
            let cx = anchor.x + f64::from(i) * (w + SPACING) - row_width / 2.0 + w / 2.0;
            let shape = make_shape(command, Point::new(cx, anchor.y));
            BoardObject::new(ids.mint(), shape)
        })
        .collect()
}

/// Build one shape centered on `at`.
fn make_shape(command: &ShapeCommand, at: Point) -> Shape {
    let half = BASE_SIZE / 2.0;
    match command.shape_type {
        ShapeType::Triangle => {
            // Apex, both base corners, back to the apex: a closed pen path
            // inscribed in a BASE_SIZE square.
            let apex = Point::new(at.x, at.y - half);
            let base_left = Point::new(at.x - half, at.y + half);
            let base_right = Point::new(at.x + half, at.y + half);
            Shape::Pen {
                points: vec![apex, base_left, base_right, apex],
                color: DEFAULT_STROKE.to_string(),
                stroke_width: DEFAULT_STROKE_WIDTH,
            }
        }
        ShapeType::Circle => Shape::Circle {
            x: at.x,
            y: at.y,
            radius: half,
            stroke: Some(DEFAULT_STROKE.to_string()),
            fill: None,
            stroke_width: DEFAULT_STROKE_WIDTH,
        },
        ShapeType::Rectangle => Shape::Rectangle {
            x: at.x - half,
            y: at.y - half,
            width: BASE_SIZE,
            height: BASE_SIZE,
            stroke: Some(DEFAULT_STROKE.to_string()),
            fill: None,
            stroke_width: DEFAULT_STROKE_WIDTH,
        },
        ShapeType::Arrow => Shape::Arrow {
            points: vec![Point::new(at.x - half, at.y), Point::new(at.x + half, at.y)],
            color: DEFAULT_STROKE.to_string(),
            stroke_width: DEFAULT_STROKE_WIDTH,
        },
        ShapeType::Text => Shape::Text {
            x: at.x - TEXT_DEFAULT_WIDTH / 2.0,
            y: at.y - TEXT_DEFAULT_FONT_SIZE / 2.0,
            text: command
                .text_content
                .clone()
                .unwrap_or_else(|| "Text".to_string()),
            font_size: TEXT_DEFAULT_FONT_SIZE,
            width: None,
            height: None,
            color: DEFAULT_STROKE.to_string(),
        },
    }
}

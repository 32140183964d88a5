//! Shared numeric constants for the board engine.

// ── Shape creation ──────────────────────────────────────────────

/// Edge length of the square that newly commanded shapes are inscribed in.
pub const BASE_SIZE: f64 = 100.0;

/// Gap between a reference object and a newly placed shape, and between
/// row-mates in a multi-instance layout.
pub const SPACING: f64 = 20.0;

// ── Text defaults ───────────────────────────────────────────────

/// Approximate width assumed for text objects with no measured width.
pub const TEXT_DEFAULT_WIDTH: f64 = 120.0;

/// Font size for text objects created by commands and suggestions.
pub const TEXT_DEFAULT_FONT_SIZE: f64 = 16.0;

// ── Viewport ────────────────────────────────────────────────────

/// Fallback viewport center used when no reference object resolves.
pub const VIEWPORT_CENTER_X: f64 = 640.0;

/// Fallback viewport center used when no reference object resolves.
pub const VIEWPORT_CENTER_Y: f64 = 360.0;

// ── Style defaults ──────────────────────────────────────────────

/// Default stroke color for new shapes.
pub const DEFAULT_STROKE: &str = "#1F1A17";

/// Default fill color for cleaned-up container rectangles.
pub const DEFAULT_FILL: &str = "#D94B4B";

/// Default stroke width in world units.
pub const DEFAULT_STROKE_WIDTH: f64 = 2.0;

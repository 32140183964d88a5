//! REST client for the collaborator surface: board seeding and the AI
//! suggestion endpoint.
//!
//! DESIGN
//! ======
//! Both endpoints live outside this codebase; this module only consumes
//! them. `GET /boards/{id}` seeds a session. `POST /ai/suggestions` is the
//! fallback behind the rule-based interpreter and answers with either a list
//! of suggestion records or a list of structured shape-creation commands,
//! distinguished per item by an `action` field. Parsing is deliberately
//! lenient: malformed items are skipped, a malformed body degrades to "no
//! suggestions", and nothing here can fault the document.
//!
//! The `SuggestionSource` trait is the seam tests mock so no network is
//! needed to exercise the fallback flow.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::doc::BoardObject;
use crate::interpret::{Position, Reference, ShapeCommand, ShapeType};
use crate::suggest::Suggestion;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Board payload returned by `GET /boards/{id}`.
#[derive(Debug, Clone, Deserialize)]
pub struct BoardSnapshot {
    #[serde(default)]
    pub objects: Vec<BoardObject>,
    #[serde(default)]
    pub version: u64,
    #[serde(default)]
    pub share_token: String,
    #[serde(default)]
    pub title: String,
}

/// Parsed AI collaborator answer.
#[derive(Debug, Clone)]
pub enum AiReply {
    /// Structured shape-creation commands; feed them to the session.
    Commands(Vec<ShapeCommand>),
    /// Improvement suggestions; surface them for the user to apply.
    Suggestions(Vec<Suggestion>),
}

impl AiReply {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Commands(c) => c.is_empty(),
            Self::Suggestions(s) => s.is_empty(),
        }
    }
}

/// Source of AI suggestions. Mocked in tests.
#[async_trait]
pub trait SuggestionSource: Send + Sync {
    /// Ask the collaborator for suggestions or commands.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] on transport failure; callers treat any error
    /// as "no suggestions".
    async fn request(
        &self,
        board_id: &str,
        objects: &[BoardObject],
        context: Option<&str>,
    ) -> Result<AiReply, ApiError>;
}

/// Reqwest-backed client for the collaborator REST surface.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// Fetch a board snapshot to seed a session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] on transport or status failure.
    pub async fn fetch_board(&self, board_id: &str) -> Result<BoardSnapshot, ApiError> {
        let url = format!("{}/boards/{board_id}", self.base_url);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json::<BoardSnapshot>().await?)
    }
}

#[async_trait]
impl SuggestionSource for ApiClient {
    async fn request(
        &self,
        board_id: &str,
        objects: &[BoardObject],
        context: Option<&str>,
    ) -> Result<AiReply, ApiError> {
        let url = format!("{}/ai/suggestions", self.base_url);
        let body = serde_json::json!({
            "board_id": board_id,
            "objects": objects,
            "context": context,
        });
        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        let value = response.json::<Value>().await?;
        Ok(parse_ai_reply(&value))
    }
}

// =============================================================================
// RESPONSE PARSING
// =============================================================================

/// Parse the collaborator's answer. Items carrying `action: "create_shape"`
/// become commands; anything else parses as a suggestion record. Items that
/// fit neither are skipped, and a non-array body yields no suggestions.
#[must_use]
pub fn parse_ai_reply(value: &Value) -> AiReply {
    let Some(items) = value.as_array() else {
        warn!("AI response is not an array; treating as no suggestions");
        return AiReply::Suggestions(Vec::new());
    };

    let has_actions = items
        .iter()
        .any(|item| item.get("action").and_then(Value::as_str).is_some());

    if has_actions {
        let commands = items.iter().filter_map(parse_command).collect();
        AiReply::Commands(commands)
    } else {
        let suggestions = items
            .iter()
            .filter_map(|item| serde_json::from_value::<Suggestion>(item.clone()).ok())
            .collect();
        AiReply::Suggestions(suggestions)
    }
}

fn parse_command(item: &Value) -> Option<ShapeCommand> {
    if item.get("action").and_then(Value::as_str) != Some("create_shape") {
        return None;
    }
    let shape_type = match item.get("shape_type").and_then(Value::as_str)? {
        "triangle" => ShapeType::Triangle,
        "circle" => ShapeType::Circle,
        "rectangle" | "square" => ShapeType::Rectangle,
        "arrow" => ShapeType::Arrow,
        "text" | "label" => ShapeType::Text,
        other => {
            warn!(shape_type = other, "skipping command with unknown shape type");
            return None;
        }
    };

    #[allow(clippy::cast_possible_truncation)]
    let quantity = item
        .get("quantity")
        .and_then(Value::as_u64)
        .map_or(1, |q| q.max(1) as u32);

    let position = match item.get("position").and_then(Value::as_str) {
        Some("below") => Position::Below,
        Some("above") => Position::Above,
        Some("left") => Position::Left,
        Some("right") => Position::Right,
        _ => Position::Center,
    };

    let reference = match item.get("reference").and_then(Value::as_str) {
        Some("triangle") => Reference::Kind(ShapeType::Triangle),
        Some("circle") => Reference::Kind(ShapeType::Circle),
        Some("rectangle") | Some("square") => Reference::Kind(ShapeType::Rectangle),
        Some("arrow") => Reference::Kind(ShapeType::Arrow),
        Some("text") | Some("label") => Reference::Kind(ShapeType::Text),
        _ => Reference::Last,
    };

    let text_content = item
        .get("text_content")
        .and_then(Value::as_str)
        .map(str::to_string);

    Some(ShapeCommand { shape_type, quantity, position, reference, text_content })
}

/// Ask the collaborator and flatten any failure into an empty answer, the
/// contract the session expects: AI trouble is never a session fault.
pub async fn suggestions_or_empty(
    source: &dyn SuggestionSource,
    board_id: &str,
    objects: &[BoardObject],
    context: Option<&str>,
) -> AiReply {
    match source.request(board_id, objects, context).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "AI collaborator unavailable; treating as no suggestions");
            AiReply::Suggestions(Vec::new())
        }
    }
}

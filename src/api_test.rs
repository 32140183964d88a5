use serde_json::json;

use super::*;
use crate::suggest::SuggestionKind;

// =============================================================
// Response parsing
// =============================================================

#[test]
fn action_items_parse_as_commands() {
    let value = json!([
        {
            "action": "create_shape",
            "shape_type": "circle",
            "quantity": 3,
            "position": "below",
            "reference": "triangle"
        },
        {
            "action": "create_shape",
            "shape_type": "text",
            "text_content": "Start here"
        }
    ]);

    let AiReply::Commands(commands) = parse_ai_reply(&value) else {
        panic!("expected commands");
    };
    assert_eq!(commands.len(), 2);

    assert_eq!(commands[0].shape_type, ShapeType::Circle);
    assert_eq!(commands[0].quantity, 3);
    assert_eq!(commands[0].position, Position::Below);
    assert_eq!(commands[0].reference, Reference::Kind(ShapeType::Triangle));

    assert_eq!(commands[1].shape_type, ShapeType::Text);
    assert_eq!(commands[1].quantity, 1);
    assert_eq!(commands[1].position, Position::Center);
    assert_eq!(commands[1].reference, Reference::Last);
    assert_eq!(commands[1].text_content.as_deref(), Some("Start here"));
}

#[test]
fn suggestion_items_parse_as_suggestions() {
    let value = json!([
        {
            "type": "shape_clean",
            "title": "Clean up shapes",
            "description": "Use the shape tools to create perfect geometric forms"
        },
        {
            "type": "annotation",
            "title": "Add labels",
            "description": "Label important elements"
        }
    ]);

    let AiReply::Suggestions(suggestions) = parse_ai_reply(&value) else {
        panic!("expected suggestions");
    };
    assert_eq!(suggestions.len(), 2);
    assert_eq!(suggestions[0].kind, SuggestionKind::ShapeClean);
    assert_eq!(suggestions[1].kind, SuggestionKind::Annotation);
}

#[test]
fn malformed_items_are_skipped_not_fatal() {
    let value = json!([
        { "action": "create_shape", "shape_type": "dodecahedron" },
        { "action": "create_shape", "shape_type": "rectangle" },
        { "action": "delete_everything" }
    ]);
    let AiReply::Commands(commands) = parse_ai_reply(&value) else {
        panic!("expected commands");
    };
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0].shape_type, ShapeType::Rectangle);
}

#[test]
fn non_array_body_degrades_to_no_suggestions() {
    let reply = parse_ai_reply(&json!({"error": "model overloaded"}));
    assert!(reply.is_empty());

    let reply = parse_ai_reply(&json!("unexpected"));
    assert!(reply.is_empty());
}

#[test]
fn zero_quantity_clamps_to_one() {
    let value = json!([
        { "action": "create_shape", "shape_type": "circle", "quantity": 0 }
    ]);
    let AiReply::Commands(commands) = parse_ai_reply(&value) else {
        panic!("expected commands");
    };
    assert_eq!(commands[0].quantity, 1);
}

// =============================================================
// Trait seam
// =============================================================

struct FailingSource;

#[async_trait]
impl SuggestionSource for FailingSource {
    async fn request(
        &self,
        _board_id: &str,
        _objects: &[BoardObject],
        _context: Option<&str>,
    ) -> Result<AiReply, ApiError> {
        Err(ApiError::Decode("boom".into()))
    }
}

struct CannedSource(Vec<Suggestion>);

#[async_trait]
impl SuggestionSource for CannedSource {
    async fn request(
        &self,
        _board_id: &str,
        _objects: &[BoardObject],
        _context: Option<&str>,
    ) -> Result<AiReply, ApiError> {
        Ok(AiReply::Suggestions(self.0.clone()))
    }
}

#[tokio::test]
async fn collaborator_failure_is_no_suggestions() {
    let reply = suggestions_or_empty(&FailingSource, "b1", &[], Some("help")).await;
    assert!(reply.is_empty());
}

#[tokio::test]
async fn collaborator_success_passes_through() {
    let canned = CannedSource(vec![Suggestion {
        id: "s1".into(),
        kind: SuggestionKind::Annotation,
        title: "Add labels".into(),
        description: String::new(),
    }]);
    let reply = suggestions_or_empty(&canned, "b1", &[], None).await;
    let AiReply::Suggestions(suggestions) = reply else {
        panic!("expected suggestions");
    };
    assert_eq!(suggestions.len(), 1);
}

// =============================================================
// Board snapshot decoding
// =============================================================

#[test]
fn board_snapshot_tolerates_missing_fields() {
    let snapshot: BoardSnapshot = serde_json::from_value(json!({
        "objects": [
            {"id": "a", "kind": "circle", "data": {"x": 1.0, "y": 2.0, "radius": 3.0}}
        ],
        "version": 12
    }))
    .unwrap();
    assert_eq!(snapshot.objects.len(), 1);
    assert_eq!(snapshot.version, 12);
    assert!(snapshot.share_token.is_empty());
    assert!(snapshot.title.is_empty());
}

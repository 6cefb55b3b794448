//! Webhook request body

use serde_json::Value;
use uuid::Uuid;

use khan_core::DomainEvent;

/// Build the JSON body for one delivery attempt.
///
/// `id` is fresh per call; `timestamp` is when the event was enqueued.
pub fn envelope(event: &DomainEvent, enqueued_at: i64) -> Value {
    let mut body = event.payload.clone();
    body.insert("id".to_string(), Value::String(Uuid::new_v4().to_string()));
    body.insert("type".to_string(), Value::from(event.event_type.code()));
    body.insert("timestamp".to_string(), Value::from(enqueued_at));
    body.insert("gameID".to_string(), Value::String(event.game_id.clone()));
    Value::Object(body)
}

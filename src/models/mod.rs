pub mod emergency_contact;
pub mod itinerary;
pub mod post;
pub mod tourist;

use mongodb::bson::oid::ObjectId;
use serde_json::Value;

/// Strings pass through; numbers are rendered, since form clients send
/// phone numbers and ids either way.
pub fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn parse_object_id(raw: &str) -> Option<ObjectId> {
    ObjectId::parse_str(raw.trim()).ok()
}

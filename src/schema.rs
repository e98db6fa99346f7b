//! Payload shape validation for fetched sections
//!
//! A section's schema is checked after the payload has parsed as JSON but
//! before it is accepted; a rejection classifies the fetch as a shape
//! failure carrying the offending payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// Validator closure applied to a parsed payload before it is accepted
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Payload schema selector for a configured section
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    /// An array where every item is a valid post
    PostList,
    /// An array where every item is a valid todo
    TodoList,
    /// Accept any well-formed JSON
    #[default]
    Any,
}

impl SchemaKind {
    /// Resolve to a validator closure, or `None` when any payload is
    /// acceptable
    pub fn validator(self) -> Option<Validator> {
        match self {
            SchemaKind::PostList => Some(Arc::new(|value| is_item_list(value, is_valid_post))),
            SchemaKind::TodoList => Some(Arc::new(|value| is_item_list(value, is_valid_todo))),
            SchemaKind::Any => None,
        }
    }
}

fn is_item_list(value: &Value, item_ok: fn(&Value) -> bool) -> bool {
    value.as_array().is_some_and(|items| items.iter().all(item_ok))
}

/// A post must carry a numeric id and string title and body
pub fn is_valid_post(value: &Value) -> bool {
    value.get("id").is_some_and(Value::is_number)
        && value.get("title").is_some_and(Value::is_string)
        && value.get("body").is_some_and(Value::is_string)
}

/// A todo must carry a numeric id, a string title and a boolean completed
/// flag
pub fn is_valid_todo(value: &Value) -> bool {
    value.get("id").is_some_and(Value::is_number)
        && value.get("title").is_some_and(Value::is_string)
        && value.get("completed").is_some_and(Value::is_boolean)
}

//! Type definitions for a single ChatGPT conversation export.
//!
//! One conversation is a JSON object whose messages live in a flat `mapping`
//! keyed by node id. Every node points at its parent by id, so the whole
//! conversation is a tree; `current_node` names the leaf of the branch that
//! was on screen when the export was taken.
//!
//! ```json
//! {
//!   "title": "Ray tracing in one weekend",
//!   "create_time": 1717171717.12,
//!   "update_time": 1717172000.5,
//!   "current_node": "b",
//!   "mapping": {
//!     "r": { "id": "r", "parent": null, "children": ["a"], "message": null },
//!     "a": { "id": "a", "parent": "r", "children": ["b"], "message": { ... } },
//!     "b": { "id": "b", "parent": "a", "children": [], "message": { ... } }
//!   }
//! }
//! ```
//!
//! Exports are heterogeneous across ChatGPT releases, so nearly every field is
//! read leniently: a value of the wrong shape is read as absent instead of
//! failing the file. An unusable node is kept in the mapping as `None`, which
//! ends the walk there the same way a missing id does.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

// ---------------------------------------------------------------------------
// Open tags
// ---------------------------------------------------------------------------

/// Author role tag: `"user"`, `"assistant"`, `"system"`, `"tool"`, ...
///
/// Deliberately a string and not an enum; unknown roles must pass through.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(String);

impl Role {
    pub const SYSTEM: &'static str = "system";

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_system(&self) -> bool {
        self.0 == Self::SYSTEM
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<T: Into<String>> From<T> for Role {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

/// Content type tag: `"text"`, `"code"`, `"multimodal_text"`, `"tether_quote"`, ...
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentType(String);

impl<T: Into<String>> From<T> for ContentType {
    fn from(value: T) -> Self {
        Self(value.into())
    }
}

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub role: Option<Role>,
    /// Tool name for `"tool"` authors (e.g. `"browser"`, `"python"`).
    #[serde(default, deserialize_with = "lenient")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default, deserialize_with = "lenient")]
    pub content_type: Option<ContentType>,
    /// Text fragments, or arbitrary JSON for non-text content (image pointers,
    /// tool payloads). Entries may be `null`.
    #[serde(default)]
    pub parts: Option<Vec<Value>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MessageMetadata {
    #[serde(default, deserialize_with = "lenient")]
    pub model_slug: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default)]
    pub author: Option<Author>,
    #[serde(default)]
    pub content: Option<Content>,
    /// Seconds since the Unix epoch, with a fractional part.
    #[serde(default, deserialize_with = "lenient")]
    pub create_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub metadata: Option<MessageMetadata>,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub message: Option<Message>,
    /// A parent id of the wrong type ends the walk like a missing one.
    #[serde(default, deserialize_with = "lenient")]
    pub parent: Option<String>,
    /// Present in exports, never followed: only the parent chain matters.
    #[serde(default, deserialize_with = "lenient")]
    pub children: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    #[serde(default, deserialize_with = "lenient")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub create_time: Option<f64>,
    #[serde(default, deserialize_with = "lenient")]
    pub update_time: Option<f64>,
    /// `None` values are entries that exist but are not usable nodes.
    #[serde(default, deserialize_with = "lenient_nodes")]
    pub mapping: Option<HashMap<String, Option<Node>>>,
    #[serde(default, deserialize_with = "lenient")]
    pub current_node: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub conversation_id: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub id: Option<String>,
}

impl ConversationRecord {
    /// Newer exports carry `conversation_id`, older ones only `id`.
    pub fn conversation_id(&self) -> Option<&str> {
        self.conversation_id.as_deref().or(self.id.as_deref())
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.create_time.and_then(epoch_to_utc)
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.update_time.and_then(epoch_to_utc)
    }
}

/// Read any JSON value, then keep it only if it has the shape of `T`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

/// Read an id -> node object, keeping unusable node values as `None` so that
/// one broken entry does not take the rest of the conversation with it.
fn lenient_nodes<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, Option<Node>>>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries: Option<HashMap<String, Value>> = lenient(deserializer)?;
    let Some(entries) = entries else {
        return Ok(None);
    };
    Ok(Some(
        entries
            .into_iter()
            .map(|(id, value)| (id, serde_json::from_value(value).ok()))
            .collect(),
    ))
}

/// Convert fractional epoch seconds to a UTC timestamp.
/// Returns `None` for NaN, infinities and values chrono cannot represent.
pub fn epoch_to_utc(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    let nanos = ((secs - whole) * 1e9).round() as u32;
    DateTime::from_timestamp(whole as i64, nanos.min(999_999_999))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn malformed_message_reads_as_absent() {
        let node: Node = serde_json::from_value(json!({
            "parent": "a",
            "message": { "author": "not-an-object", "content": 42 }
        }))
        .unwrap();
        assert_eq!(node.message, None);
        assert_eq!(node.parent.as_deref(), Some("a"));
    }

    #[test]
    fn null_fields_are_absent() {
        let node: Node = serde_json::from_value(json!({
            "parent": null,
            "message": null,
            "children": null
        }))
        .unwrap();
        assert_eq!(node, Node::default());
    }

    #[test]
    fn unknown_role_is_preserved() {
        let message: Message = serde_json::from_value(json!({
            "author": { "role": "critic", "name": null },
            "content": { "content_type": "text", "parts": ["ok"] },
            "metadata": {}
        }))
        .unwrap();
        let role = message.author.unwrap().role.unwrap();
        assert_eq!(role.as_str(), "critic");
        assert!(!role.is_system());
        assert_eq!(message.metadata.unwrap().model_slug, None);
    }

    #[test]
    fn odd_optional_fields_keep_the_message() {
        let message: Message = serde_json::from_value(json!({
            "id": 9,
            "author": { "role": "user", "name": 5 },
            "content": { "content_type": ["text"], "parts": ["Hi"] },
            "create_time": "2024-01-01",
            "metadata": { "model_slug": { "name": "gpt-4o" } }
        }))
        .unwrap();
        assert_eq!(message.id, None);
        assert_eq!(message.author.as_ref().unwrap().name, None);
        assert_eq!(message.author.unwrap().role, Some(Role::from("user")));
        let content = message.content.unwrap();
        assert_eq!(content.content_type, None);
        assert_eq!(content.parts, Some(vec![json!("Hi")]));
        assert_eq!(message.create_time, None);
        assert_eq!(message.metadata, Some(MessageMetadata { model_slug: None }));
    }

    #[test]
    fn unusable_nodes_stay_in_mapping_as_none() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "current_node": "b",
            "mapping": {
                "a": null,
                "n": 5,
                "b": {
                    "parent": "a",
                    "message": {
                        "author": { "role": "user" },
                        "content": { "content_type": "text", "parts": ["Hi"] }
                    }
                }
            }
        }))
        .unwrap();
        let mapping = record.mapping.unwrap();
        assert_eq!(mapping.len(), 3);
        assert_eq!(mapping["a"], None);
        assert_eq!(mapping["n"], None);
        let b = mapping["b"].as_ref().unwrap();
        assert_eq!(b.parent.as_deref(), Some("a"));
        let content = b.message.as_ref().unwrap().content.as_ref().unwrap();
        assert_eq!(content.content_type, Some(ContentType::from("text")));
    }

    #[test]
    fn mapping_of_wrong_shape_is_absent() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "current_node": 3,
            "mapping": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(record.mapping, None);
        assert_eq!(record.current_node, None);
    }

    #[test]
    fn record_falls_back_to_legacy_id() {
        let record: ConversationRecord = serde_json::from_value(json!({
            "id": "legacy",
            "title": 17,
            "mapping": {}
        }))
        .unwrap();
        assert_eq!(record.conversation_id(), Some("legacy"));
        assert_eq!(record.title, None);
    }

    #[test]
    fn epoch_conversion() {
        let ts = epoch_to_utc(1_700_000_000.5).unwrap();
        assert_eq!(ts.timestamp(), 1_700_000_000);
        assert_eq!(ts.timestamp_subsec_millis(), 500);
        assert_eq!(epoch_to_utc(f64::NAN), None);
        assert_eq!(epoch_to_utc(f64::INFINITY), None);
        assert_eq!(epoch_to_utc(1e300), None);
    }
}

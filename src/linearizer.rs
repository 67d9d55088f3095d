//! Flattening of a conversation tree into the transcript of its active branch.
//!
//! The walk starts at `current_node` and follows `parent` ids up to the root,
//! collecting every message a reader would actually have seen, then reverses
//! the result so it reads root to leaf. Ordering comes from the parent links
//! alone; timestamps are carried along but never used to sort.

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::importer::{ConversationRecord, Message, Role, epoch_to_utc};

/// The record cannot be walked at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("invalid conversation structure: missing or empty `mapping`")]
    MissingMapping,

    #[error("invalid conversation structure: missing or empty `current_node`")]
    MissingCurrentNode,

    #[error("parent chain loops back on itself at node {node_id}")]
    CycleDetected { node_id: String },
}

/// One message of the flattened transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleMessage {
    pub role: Role,
    pub text: String,
    pub timestamp: Option<f64>,
    pub model: Option<String>,
}

impl VisibleMessage {
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.timestamp.and_then(epoch_to_utc)
    }
}

/// Extract the active branch of `record`, oldest message first.
///
/// Only a missing mapping or leaf id is an error. A parent id that is not in
/// the mapping, or names an unusable node, ends the walk quietly, and nodes
/// without a usable message are stepped over. The walk never takes more
/// steps than there are nodes; a chain that would is a cycle.
pub fn linearize(record: &ConversationRecord) -> Result<Vec<VisibleMessage>, StructuralError> {
    let mapping = record
        .mapping
        .as_ref()
        .filter(|m| !m.is_empty())
        .ok_or(StructuralError::MissingMapping)?;
    let leaf = record
        .current_node
        .as_deref()
        .filter(|id| !id.is_empty())
        .ok_or(StructuralError::MissingCurrentNode)?;

    let mut transcript = Vec::new();
    let mut cursor = Some(leaf);
    let mut steps = 0usize;

    while let Some(id) = cursor.filter(|id| !id.is_empty()) {
        let Some(node) = mapping.get(id).and_then(Option::as_ref) else {
            debug!(node_id = id, "node missing or unusable, truncating walk");
            break;
        };

        if steps == mapping.len() {
            warn!(node_id = id, nodes = mapping.len(), "cycle in parent chain");
            return Err(StructuralError::CycleDetected {
                node_id: id.to_string(),
            });
        }
        steps += 1;

        if let Some(message) = node.message.as_ref().and_then(|m| visible_message(id, m)) {
            transcript.push(message);
        }

        cursor = node.parent.as_deref();
    }

    transcript.reverse();
    Ok(transcript)
}

fn visible_message(node_id: &str, message: &Message) -> Option<VisibleMessage> {
    let role = message.author.as_ref()?.role.as_ref()?;
    let content = message.content.as_ref()?;
    let text = join_parts(content.parts.as_deref().unwrap_or_default());

    if text.is_empty() || role.is_system() {
        debug!(
            node_id,
            %role,
            content_type = ?content.content_type,
            empty = text.is_empty(),
            "hidden message skipped"
        );
        return None;
    }

    Some(VisibleMessage {
        role: role.clone(),
        text,
        timestamp: message.create_time,
        model: message.metadata.as_ref().and_then(|m| m.model_slug.clone()),
    })
}

/// Concatenate parts without a separator. `null` entries are dropped and
/// strings are taken verbatim. Any other value is written the way Python's
/// `str()` prints it, object keys in document order:
/// `{'asset_pointer': 'file-1', 'size': None}`, `True`, `[1, 'x']`.
pub fn join_parts(parts: &[Value]) -> String {
    parts.iter().fold(String::new(), |mut text, part| {
        match part {
            Value::Null => {}
            Value::String(s) => text.push_str(s),
            other => push_repr(&mut text, other),
        }
        text
    })
}

fn push_repr(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => push_number(out, n),
        Value::String(s) => push_quoted(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_repr(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                push_quoted(out, key);
                out.push_str(": ");
                push_repr(out, item);
            }
            out.push('}');
        }
    }
}

/// Floats print with a signed, at least two-digit exponent (`1e+16`, `1.5e-07`).
fn push_number(out: &mut String, n: &Number) {
    let text = n.to_string();
    match text.split_once('e') {
        Some((mantissa, exp)) if n.is_f64() => {
            let (sign, digits) = match exp.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exp.trim_start_matches('+')),
            };
            out.push_str(mantissa);
            out.push('e');
            out.push(sign);
            if digits.len() < 2 {
                out.push('0');
            }
            out.push_str(digits);
        }
        _ => out.push_str(&text),
    }
}

/// Single quotes unless the text holds a `'` and no `"`.
fn push_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if c < ' ' || ('\u{7f}'..='\u{9f}').contains(&c) => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

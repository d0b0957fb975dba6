use std::collections::BTreeMap;

use serde_json::Value;

use crate::model::Attachment;
use crate::parser::blocks::Block;

const KNOWN_KEYS: &[&str] = &["filename", "url", "type", "size", "description", "mime_type"];

/// Collect every attachment from the classified block list.
pub fn collect(blocks: &[Block]) -> Vec<Attachment> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::Attachments(list) => Some(list.iter().cloned()),
            _ => None,
        })
        .flatten()
        .collect()
}

/// Parse one raw `attachments` array. Missing sub-fields get documented
/// defaults; unrecognized keys pass through as strings.
pub fn parse_list(raw: &[Value]) -> Vec<Attachment> {
    raw.iter()
        .filter_map(Value::as_object)
        .map(|obj| Attachment {
            filename: str_field(obj, "filename", ""),
            url: str_field(obj, "url", ""),
            kind: str_field(obj, "type", "file"),
            size: obj.get("size").map(int_value).unwrap_or(0),
            description: str_field(obj, "description", ""),
            mime_type: str_field(obj, "mime_type", ""),
            extra: obj
                .iter()
                .filter(|(k, _)| !KNOWN_KEYS.contains(&k.as_str()))
                .map(|(k, v)| (k.clone(), str_value(v)))
                .collect::<BTreeMap<_, _>>(),
        })
        .collect()
}

fn str_field(obj: &serde_json::Map<String, Value>, key: &str, default: &str) -> String {
    obj.get(key)
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

fn int_value(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn str_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// ── Tests ──

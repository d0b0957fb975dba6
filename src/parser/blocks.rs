use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::model::Attachment;
use crate::parser::attachments;

static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<p><b>(.*?)</b></p>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());

/// One classified content block. The role is decided once here; the
/// pairing passes never re-inspect the raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    /// A paragraph wrapping a single bold run; text is tag-stripped and trimmed.
    Heading { text: String },
    /// Any other content fragment, trimmed.
    Body { html: String },
    TopicTitle(String),
    TopicRef(String),
    Attachments(Vec<Attachment>),
}

/// Classify the ordered raw block array of one document. Blocks carrying
/// none of the known keys are dropped.
pub fn classify(raw: &[Value]) -> Vec<Block> {
    let mut blocks = Vec::with_capacity(raw.len());

    for value in raw {
        let Some(obj) = value.as_object() else {
            debug!("Dropping non-object content block");
            continue;
        };

        // The export carries both camelCase and all-lowercase spellings of
        // the supplementary-topic keys. One element may hold both halves
        // of a pair; title goes first so the pairing pass flushes it.
        let title = get_str(obj, &["supplementaryTopicsTitle", "supplementarytopicstitle"]);
        let link = get_str(obj, &["supplementaryTopicsLink", "supplementarytopicslink"]);
        if title.is_some() || link.is_some() {
            if let Some(title) = title {
                blocks.push(Block::TopicTitle(title.trim().to_string()));
            }
            if let Some(link) = link {
                blocks.push(Block::TopicRef(link.trim().to_string()));
            }
            continue;
        }
        if let Some(list) = obj.get("attachments").and_then(Value::as_array) {
            blocks.push(Block::Attachments(attachments::parse_list(list)));
            continue;
        }
        if let Some(content) = obj.get("content").and_then(Value::as_str) {
            let content = content.trim();
            if let Some(caps) = HEADING_RE.captures(content) {
                let text = TAG_RE.replace_all(&caps[1], "").trim().to_string();
                blocks.push(Block::Heading { text });
            } else {
                blocks.push(Block::Body {
                    html: content.to_string(),
                });
            }
            continue;
        }

        debug!("Dropping content block with no recognized keys");
    }

    blocks
}

fn get_str<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k).and_then(Value::as_str))
}

// ── Tests ──

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::{Map, Value};

/// One document from the source export. Field names follow the export
/// format exactly, including `parentIentifier` (the typo is part of the
/// format, not ours).
#[derive(Debug, Clone, Deserialize)]
pub struct RawDocument {
    #[serde(rename = "_id")]
    pub source_id: String,
    #[serde(rename = "templateName", default)]
    pub template_name: String,
    #[serde(default)]
    pub fs_project_name: Option<String>,
    #[serde(default)]
    pub fs_project_id: Option<String>,
    #[serde(rename = "parentIentifier", default)]
    pub parent_identifier: Option<String>,
    #[serde(default)]
    pub level_index: Option<Value>,
    #[serde(rename = "LastReleaseDatetime", default)]
    pub last_release_datetime: Option<Value>,
    #[serde(default)]
    pub last_release_article: Option<String>,
    #[serde(default)]
    pub fs_language: Option<String>,
    #[serde(default)]
    pub headline: Option<String>,
    /// Ordered heterogeneous content blocks; classified in `parser::blocks`.
    #[serde(default)]
    pub articles: Vec<Value>,
    /// Everything else in the document, `parentIdentifier1..10` included.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl RawDocument {
    /// Ancestor identifiers `parentIdentifier1..10` in export order,
    /// unfiltered. The term registry drops empty and "root" entries.
    pub fn parent_chain(&self) -> Vec<String> {
        (1..=10)
            .filter_map(|i| {
                self.extra
                    .get(&format!("parentIdentifier{}", i))
                    .and_then(Value::as_str)
                    .map(str::to_string)
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Article,
    Chapter,
    Home,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Article => "article",
            RecordKind::Chapter => "chapter",
            RecordKind::Home => "home",
        }
    }
}

/// A heading paired with the body accumulated until the next heading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

/// A supplementary-topic link: display title plus the symbolic id of the
/// target document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicLink {
    pub title: String,
    pub reference_id: String,
}

/// A TopicLink whose reference id matched a document in the corpus index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedReference {
    pub title: String,
    pub target_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub filename: String,
    pub url: String,
    pub kind: String,
    pub size: i64,
    pub description: String,
    pub mime_type: String,
    /// Unrecognized attachment keys, passed through as strings.
    pub extra: BTreeMap<String, String>,
}

pub type TermId = i64;

/// A deduplicated classification term, unique per (vocabulary, name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryTerm {
    pub id: TermId,
    pub vocabulary: String,
    pub name: String,
    pub code: Option<String>,
    pub parent_chain: Vec<String>,
}

/// The assembled per-document result, immutable once built and handed to
/// a `RecordSink` as-is.
#[derive(Debug, Clone)]
pub struct OutputRecord {
    pub source_id: String,
    pub kind: RecordKind,
    pub headline: Option<String>,
    pub language: String,
    pub release_date: Option<String>,
    pub is_last_update: bool,
    pub level_index: Option<String>,
    pub project_term: Option<TermId>,
    pub hierarchy_term: Option<TermId>,
    pub sections: Vec<Section>,
    pub topic_links: Vec<TopicLink>,
    pub resolved_refs: Vec<ResolvedReference>,
    pub attachments: Vec<Attachment>,
    /// Normalized passthrough fields keyed by their export names.
    pub extras: BTreeMap<String, Value>,
    /// Normalization warnings collected while building this record.
    pub warnings: Vec<String>,
}

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use tracing::debug;

use crate::model::{CategoryTerm, RawDocument, ResolvedReference, TermId, TopicLink};

pub const MAX_PARENT_DEPTH: usize = 10;

/// Read-only set of source ids present in one loaded corpus. Built once
/// before resolution begins and shared across workers; resolution only
/// needs existence, not the documents themselves.
#[derive(Debug, Default)]
pub struct CorpusIndex {
    ids: HashSet<String>,
}

impl CorpusIndex {
    pub fn build(docs: &[RawDocument]) -> Self {
        let ids = docs.iter().map(|d| d.source_id.clone()).collect();
        Self { ids }
    }

    pub fn contains(&self, source_id: &str) -> bool {
        self.ids.contains(source_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Resolve symbolic reference ids against the corpus index. Misses are
/// dropped, not errors: the corpus may be partial during an incremental
/// migration.
pub fn resolve(index: &CorpusIndex, links: &[TopicLink]) -> Vec<ResolvedReference> {
    links
        .iter()
        .filter_map(|link| {
            if index.contains(&link.reference_id) {
                Some(ResolvedReference {
                    title: link.title.clone(),
                    target_id: link.reference_id.clone(),
                })
            } else {
                debug!("Dropping unresolved topic reference {:?}", link.reference_id);
                None
            }
        })
        .collect()
}

/// Create-if-absent registry of category terms, keyed by
/// (vocabulary, name). First writer wins; later calls return the existing
/// id, so repeated or concurrent runs stay idempotent.
#[derive(Debug, Default)]
pub struct TermRegistry {
    inner: Mutex<RegistryInner>,
}

#[derive(Debug, Default)]
struct RegistryInner {
    next_id: TermId,
    by_key: HashMap<(String, String), TermId>,
    terms: Vec<CategoryTerm>,
}

impl TermRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a term by (vocabulary, name), creating it on first use.
    /// The parent chain keeps at most `MAX_PARENT_DEPTH` non-empty,
    /// non-"root" entries, most-distant ancestor first.
    pub fn get_or_create(
        &self,
        vocabulary: &str,
        name: &str,
        code: Option<&str>,
        parent_chain: &[String],
    ) -> TermId {
        let key = (vocabulary.to_string(), name.to_string());
        let mut inner = self.inner.lock().expect("term registry poisoned");
        if let Some(id) = inner.by_key.get(&key) {
            return *id;
        }

        inner.next_id += 1;
        let id = inner.next_id;
        let term = CategoryTerm {
            id,
            vocabulary: vocabulary.to_string(),
            name: name.to_string(),
            code: code.map(str::to_string),
            parent_chain: filter_parent_chain(parent_chain),
        };
        debug!("Created term {} {:?} in vocabulary {:?}", id, name, vocabulary);
        inner.by_key.insert(key, id);
        inner.terms.push(term);
        id
    }

    /// Snapshot of all terms created so far, in creation order.
    pub fn terms(&self) -> Vec<CategoryTerm> {
        self.inner.lock().expect("term registry poisoned").terms.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("term registry poisoned").terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn filter_parent_chain(raw: &[String]) -> Vec<String> {
    raw.iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty() && *s != "root")
        .map(str::to_string)
        .take(MAX_PARENT_DEPTH)
        .collect()
}

// ── Tests ──

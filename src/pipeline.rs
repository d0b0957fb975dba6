use std::path::Path;

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::{info, warn};

use crate::assemble;
use crate::loader;
use crate::model::{CategoryTerm, OutputRecord, RawDocument, TermId};
use crate::normalize;
use crate::parser;
use crate::resolve::{self, CorpusIndex, TermRegistry};

const CHUNK_SIZE: usize = 500;

const PROJECT_VOCABULARY: &str = "projects";
const HIERARCHY_VOCABULARY: &str = "hierarchy";

/// Storage collaborator: accepts one assembled record, returns its
/// assigned identity. Persistence and retry semantics live behind this
/// seam.
pub trait RecordSink {
    fn store(&mut self, record: &OutputRecord) -> Result<String>;
    fn store_terms(&mut self, terms: &[CategoryTerm]) -> Result<usize>;
}

/// In-memory sink; identity is the record's source id.
#[derive(Debug, Default)]
pub struct MemSink {
    pub records: Vec<OutputRecord>,
    pub terms: Vec<CategoryTerm>,
}

impl RecordSink for MemSink {
    fn store(&mut self, record: &OutputRecord) -> Result<String> {
        let id = record.source_id.clone();
        self.records.push(record.clone());
        Ok(id)
    }

    fn store_terms(&mut self, terms: &[CategoryTerm]) -> Result<usize> {
        self.terms = terms.to_vec();
        Ok(terms.len())
    }
}

#[derive(Debug, Default)]
pub struct RunCounts {
    pub documents: usize,
    pub sections: usize,
    pub topic_links: usize,
    pub resolved_refs: usize,
    pub attachments: usize,
    pub terms: usize,
}

impl RunCounts {
    pub fn summary(&self) -> String {
        format!(
            "{} documents, {} sections, {} topic links ({} resolved), {} attachments, {} terms",
            self.documents,
            self.sections,
            self.topic_links,
            self.resolved_refs,
            self.attachments,
            self.terms,
        )
    }
}

/// Corpus-level run: load, index, parse document-parallel, store.
pub struct Pipeline<'a, S: RecordSink> {
    sink: &'a mut S,
    registry: TermRegistry,
    progress: bool,
}

impl<'a, S: RecordSink> Pipeline<'a, S> {
    pub fn new(sink: &'a mut S) -> Self {
        Self {
            sink,
            registry: TermRegistry::new(),
            progress: false,
        }
    }

    pub fn with_progress(mut self) -> Self {
        self.progress = true;
        self
    }

    /// Load one project corpus and run it end to end. Per-document work
    /// shares nothing mutable except the term registry; storage writes
    /// happen sequentially per chunk.
    pub fn run(
        &mut self,
        root: &Path,
        project: &str,
        kind: &str,
        limit: Option<usize>,
    ) -> Result<RunCounts> {
        let mut docs = loader::load_corpus(root, project, kind)?;
        if let Some(n) = limit {
            docs.truncate(n);
        }
        info!("Loaded {} documents from project {:?}", docs.len(), project);

        let index = CorpusIndex::build(&docs);

        // Sequential prepass so term ids are assigned in corpus order,
        // not in worker scheduling order; the parallel phase below only
        // reads back existing ids.
        for doc in &docs {
            register_terms(doc, &self.registry);
        }

        let pb = self.progress_bar(docs.len());

        let mut counts = RunCounts::default();
        for chunk in docs.chunks(CHUNK_SIZE) {
            let records: Vec<OutputRecord> = chunk
                .par_iter()
                .map(|doc| process_document(doc, &index, &self.registry))
                .collect();

            for record in &records {
                for warning in &record.warnings {
                    warn!("{}: {}", record.source_id, warning);
                }
                counts.documents += 1;
                counts.sections += record.sections.len();
                counts.topic_links += record.topic_links.len();
                counts.resolved_refs += record.resolved_refs.len();
                counts.attachments += record.attachments.len();
                self.sink.store(record)?;
            }
            if let Some(pb) = &pb {
                pb.inc(chunk.len() as u64);
            }
        }

        counts.terms = self.sink.store_terms(&self.registry.terms())?;
        if let Some(pb) = pb {
            pb.finish_and_clear();
        }
        info!("Run complete: {}", counts.summary());

        Ok(counts)
    }

    fn progress_bar(&self, total: usize) -> Option<ProgressBar> {
        if !self.progress {
            return None;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec})")
                .ok()?
                .progress_chars("=> "),
        );
        Some(pb)
    }
}

/// Normalize, parse, resolve, and assemble one document.
fn process_document(
    doc: &RawDocument,
    index: &CorpusIndex,
    registry: &TermRegistry,
) -> OutputRecord {
    let normalized = normalize::normalize(doc);
    let parsed = parser::parse_blocks(&doc.articles);
    let resolved = resolve::resolve(index, &parsed.topic_links);
    let (project_term, hierarchy_term) = register_terms(doc, registry);

    assemble::assemble(doc, normalized, parsed, resolved, project_term, hierarchy_term)
}

/// Upsert the project and hierarchy terms a document references.
/// Idempotent, so the prepass and the worker phase can both call it.
fn register_terms(doc: &RawDocument, registry: &TermRegistry) -> (Option<TermId>, Option<TermId>) {
    let project_term = doc
        .fs_project_name
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            registry.get_or_create(PROJECT_VOCABULARY, name, doc.fs_project_id.as_deref(), &[])
        });

    let hierarchy_term = doc
        .parent_identifier
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| registry.get_or_create(HIERARCHY_VOCABULARY, name, None, &doc.parent_chain()));

    (project_term, hierarchy_term)
}

// ── Tests ──

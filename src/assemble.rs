use crate::model::{OutputRecord, RawDocument, ResolvedReference, TermId};
use crate::normalize::Normalized;
use crate::parser::ParsedArticle;

/// Merge the normalizer, parser, and resolver outputs for one document
/// into one immutable record. Pure; empty collections are valid output.
pub fn assemble(
    doc: &RawDocument,
    normalized: Normalized,
    parsed: ParsedArticle,
    resolved_refs: Vec<ResolvedReference>,
    project_term: Option<TermId>,
    hierarchy_term: Option<TermId>,
) -> OutputRecord {
    OutputRecord {
        source_id: doc.source_id.clone(),
        kind: normalized.kind,
        headline: doc.headline.clone(),
        language: normalized.language,
        release_date: normalized.release_date,
        is_last_update: normalized.is_last_update,
        level_index: normalized.level_index,
        project_term,
        hierarchy_term,
        sections: parsed.sections,
        topic_links: parsed.topic_links,
        resolved_refs,
        attachments: parsed.attachments,
        extras: normalized.extras,
        warnings: normalized.warnings,
    }
}

// ── Tests ──

use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde_json::Value;
use tracing::{debug, warn};

use crate::model::RawDocument;

const EMBEDDED_KEY: &str = "_embedded";
const DOC_LIST_KEY: &str = "rh:doc";

/// Templates included when loading the "article" kind.
const ARTICLE_TEMPLATES: &[&str] = &[
    "pt_red_article",
    "pt_green_article",
    "pt_chapter",
    "pt_start",
];

/// List project directories under the source root.
pub fn list_projects(root: &Path) -> Result<Vec<String>> {
    if !root.is_dir() {
        bail!("source root is not a directory: {}", root.display());
    }
    let mut projects = Vec::new();
    for entry in fs::read_dir(root).with_context(|| format!("reading {}", root.display()))? {
        let entry = entry?;
        if entry.path().is_dir() {
            projects.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    projects.sort();
    Ok(projects)
}

/// Load every document of one project corpus, filtered by template
/// allow-list for the target kind.
///
/// Loading is best-effort: unreadable or unparsable files are logged and
/// skipped. Only a missing project directory is fatal.
pub fn load_corpus(root: &Path, project: &str, kind: &str) -> Result<Vec<RawDocument>> {
    let project_dir = root.join(project);
    if !project_dir.is_dir() {
        bail!("project directory not found: {}", project_dir.display());
    }

    let mut files: Vec<_> = fs::read_dir(&project_dir)
        .with_context(|| format!("reading {}", project_dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    let mut docs = Vec::new();
    for file in &files {
        let content = match fs::read_to_string(file) {
            Ok(c) => c,
            Err(e) => {
                warn!("Skipping unreadable file {}: {}", file.display(), e);
                continue;
            }
        };
        let parsed: Value = match serde_json::from_str(&content) {
            Ok(v) => v,
            Err(e) => {
                warn!("Skipping invalid JSON file {}: {}", file.display(), e);
                continue;
            }
        };

        let embedded = parsed
            .get(EMBEDDED_KEY)
            .and_then(|e| e.get(DOC_LIST_KEY))
            .and_then(Value::as_array);
        let Some(embedded) = embedded else {
            debug!("No {}.\"{}\" array in {}", EMBEDDED_KEY, DOC_LIST_KEY, file.display());
            continue;
        };

        let mut kept = 0usize;
        for value in embedded {
            let doc: RawDocument = match serde_json::from_value(value.clone()) {
                Ok(d) => d,
                Err(e) => {
                    warn!("Skipping malformed document in {}: {}", file.display(), e);
                    continue;
                }
            };
            if !template_allowed(&doc.template_name, kind) {
                continue;
            }
            kept += 1;
            docs.push(doc);
        }
        debug!("Loaded {} documents from {}", kept, file.display());
    }

    Ok(docs)
}

fn template_allowed(template: &str, kind: &str) -> bool {
    match kind {
        "article" => ARTICLE_TEMPLATES.contains(&template),
        _ => true,
    }
}

// ── Tests ──

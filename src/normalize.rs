use std::collections::BTreeMap;

use chrono::DateTime;
use serde_json::{Map, Value};

use crate::model::{RawDocument, RecordKind};

/// Values above this are millisecond epochs; below, plain numbers.
pub const MS_EPOCH_THRESHOLD: i64 = 1_000_000_000_000;

const FALLBACK_LANGUAGE: &str = "en";

/// Exact-match language table, source region codes to 2-letter codes.
const LANGUAGE_MAP: &[(&str, &str)] = &[
    ("EN_US", "en"),
    ("EN_GB", "en"),
    ("EN", "en"),
    ("DE_DE", "de"),
    ("DE", "de"),
    ("FR_FR", "fr"),
    ("FR", "fr"),
    ("ES_ES", "es"),
    ("ES", "es"),
    ("NL_NL", "nl"),
    ("NL", "nl"),
    ("BG_BG", "bg"),
    ("BG", "bg"),
    ("DA_DK", "da"),
    ("DA", "da"),
    ("FI_FI", "fi"),
    ("FI", "fi"),
    ("EL_GR", "el"),
    ("EL", "el"),
    ("IT_IT", "it"),
    ("IT", "it"),
    ("PL_PL", "pl"),
    ("PL", "pl"),
    ("PT_PT", "pt"),
    ("PT", "pt"),
    ("RO_RO", "ro"),
    ("RO", "ro"),
    ("SK_SK", "sk"),
    ("SK", "sk"),
    ("SL_SI", "sl"),
    ("SL", "sl"),
    ("CS_CZ", "cs"),
    ("CS", "cs"),
    ("HU_HU", "hu"),
    ("HU", "hu"),
    ("TR_TR", "tr"),
    ("TR", "tr"),
];

/// Canonical scalar fields of one document. Normalization is total: every
/// input maps to a value or a documented default, never an error.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub kind: RecordKind,
    pub language: String,
    pub release_date: Option<String>,
    pub is_last_update: bool,
    pub level_index: Option<String>,
    /// Remaining scalar fields (`release_status`, `brands`, ...) after
    /// `normalize_scalar`, keyed by their export names.
    pub extras: BTreeMap<String, Value>,
    pub warnings: Vec<String>,
}

pub fn normalize(doc: &RawDocument) -> Normalized {
    let mut warnings = Vec::new();

    let (kind, kind_warning) = kind_for_template(&doc.template_name);
    warnings.extend(kind_warning);

    let language = match doc.fs_language.as_deref().map(str::trim) {
        None | Some("") => FALLBACK_LANGUAGE.to_string(),
        Some(code) => {
            let (mapped, warning) = map_language(code);
            warnings.extend(warning);
            mapped
        }
    };

    let release_date = doc.last_release_datetime.as_ref().and_then(epoch_ms_to_iso);

    let is_last_update = is_last_update(&doc.source_id, doc.last_release_article.as_deref());

    let level_index = doc.level_index.as_ref().and_then(|v| match v {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    });

    Normalized {
        kind,
        language,
        release_date,
        is_last_update,
        level_index,
        extras: normalize_extras(&doc.extra),
        warnings,
    }
}

/// Run `normalize_scalar` over the passthrough fields of one document.
/// Ancestor identifiers are consumed by the term registry instead, and
/// underscore-prefixed export machinery (`_links` etc.), nested objects,
/// and nulls are dropped.
fn normalize_extras(extra: &Map<String, Value>) -> BTreeMap<String, Value> {
    extra
        .iter()
        .filter(|(key, value)| {
            !key.starts_with('_')
                && !is_parent_identifier(key)
                && !value.is_object()
                && !value.is_null()
        })
        .map(|(key, value)| (key.clone(), normalize_scalar(value)))
        .filter(|(_, value)| !value.is_null())
        .collect()
}

fn is_parent_identifier(key: &str) -> bool {
    key.strip_prefix("parentIdentifier")
        .is_some_and(|n| n.parse::<u8>().is_ok_and(|n| (1..=10).contains(&n)))
}

/// Canonicalize one raw scalar: ms epochs become ISO date-time strings,
/// booleans become 0/1, string arrays are comma-joined, other arrays are
/// serialized to JSON.
pub fn normalize_scalar(value: &Value) -> Value {
    match value {
        Value::Bool(b) => Value::from(if *b { 1 } else { 0 }),
        Value::Number(n) => match n.as_i64() {
            Some(ms) if ms > MS_EPOCH_THRESHOLD => Value::from(format_epoch_ms(ms)),
            _ => value.clone(),
        },
        Value::Array(items) => {
            if items.is_empty() {
                return Value::Null;
            }
            if items.iter().all(Value::is_string) {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(", ");
                Value::from(joined)
            } else {
                Value::from(serde_json::to_string(items).unwrap_or_default())
            }
        }
        other => other.clone(),
    }
}

/// Map a source language/region code to a 2-letter code: exact table
/// match first, then 2-character prefix, then the fallback with a warning.
pub fn map_language(code: &str) -> (String, Option<String>) {
    let code = code.trim();
    for (from, to) in LANGUAGE_MAP {
        if *from == code {
            return (to.to_string(), None);
        }
    }
    if let Some(prefix) = code.get(..2) {
        for (from, to) in LANGUAGE_MAP {
            if *from == prefix {
                return (to.to_string(), None);
            }
        }
    }
    (
        FALLBACK_LANGUAGE.to_string(),
        Some(format!("no language mapping for {:?}, using {}", code, FALLBACK_LANGUAGE)),
    )
}

/// True exactly when this document is the most recent release of its
/// chain. Empty or missing marker means false.
pub fn is_last_update(doc_id: &str, marker: Option<&str>) -> bool {
    match marker.map(str::trim) {
        Some(m) if !m.is_empty() => m == doc_id,
        _ => false,
    }
}

/// Map the export template name to the record kind.
pub fn kind_for_template(template: &str) -> (RecordKind, Option<String>) {
    match template.trim() {
        "pt_red_article" | "pt_green_article" => (RecordKind::Article, None),
        "pt_chapter" => (RecordKind::Chapter, None),
        "pt_start" => (RecordKind::Home, None),
        other => (
            RecordKind::Article,
            Some(format!("no kind mapping for template {:?}, using article", other)),
        ),
    }
}

fn epoch_ms_to_iso(value: &Value) -> Option<String> {
    let ms = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    match ms {
        Some(ms) if ms > MS_EPOCH_THRESHOLD => Some(format_epoch_ms(ms)),
        _ => match value {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            _ => None,
        },
    }
}

fn format_epoch_ms(ms: i64) -> String {
    // Integer-truncate to whole seconds; UTC keeps output machine-independent.
    let secs = ms / 1000;
    DateTime::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%dT%H:%M:%S").to_string())
        .unwrap_or_default()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ms_epoch_truncates_to_whole_seconds() {
        let out = normalize_scalar(&json!(1_700_000_000_000i64));
        assert_eq!(out, json!("2023-11-14T22:13:20"));
        assert!(!out.as_str().unwrap().contains('.'));
    }

    #[test]
    fn ms_epoch_fraction_is_dropped() {
        // 999 ms past the second must not shift the output.
        let out = normalize_scalar(&json!(1_700_000_000_999i64));
        assert_eq!(out, json!("2023-11-14T22:13:20"));
    }

    #[test]
    fn small_numbers_pass_through() {
        assert_eq!(normalize_scalar(&json!(42)), json!(42));
        assert_eq!(normalize_scalar(&json!(1_000_000_000)), json!(1_000_000_000));
    }

    #[test]
    fn booleans_become_0_1() {
        assert_eq!(normalize_scalar(&json!(true)), json!(1));
        assert_eq!(normalize_scalar(&json!(false)), json!(0));
    }

    #[test]
    fn string_arrays_are_comma_joined() {
        assert_eq!(normalize_scalar(&json!(["a", "b", "c"])), json!("a, b, c"));
    }

    #[test]
    fn mixed_arrays_are_serialized() {
        let out = normalize_scalar(&json!([{"k": 1}, 2]));
        assert_eq!(out, json!(r#"[{"k":1},2]"#));
    }

    #[test]
    fn language_exact_match() {
        assert_eq!(map_language("EN_US"), ("en".to_string(), None));
        assert_eq!(map_language("DE_DE"), ("de".to_string(), None));
    }

    #[test]
    fn language_prefix_fallback() {
        // "FR_CA" is not in the table; the "FR" prefix is.
        let (code, warning) = map_language("FR_CA");
        assert_eq!(code, "fr");
        assert!(warning.is_none());
    }

    #[test]
    fn unknown_language_warns_and_defaults() {
        let (code, warning) = map_language("xx_YY");
        assert_eq!(code, "en");
        assert!(warning.is_some());
    }

    #[test]
    fn last_update_marker() {
        assert!(is_last_update("doc-1", Some("doc-1")));
        assert!(!is_last_update("doc-1", Some("doc-2")));
        assert!(!is_last_update("doc-1", Some("")));
        assert!(!is_last_update("doc-1", None));
    }

    #[test]
    fn template_kinds() {
        assert_eq!(kind_for_template("pt_red_article").0, RecordKind::Article);
        assert_eq!(kind_for_template("pt_green_article").0, RecordKind::Article);
        assert_eq!(kind_for_template("pt_chapter").0, RecordKind::Chapter);
        assert_eq!(kind_for_template("pt_start").0, RecordKind::Home);
        let (kind, warning) = kind_for_template("pt_mystery");
        assert_eq!(kind, RecordKind::Article);
        assert!(warning.is_some());
    }

    #[test]
    fn normalize_document_end_to_end() {
        let doc: RawDocument = serde_json::from_value(json!({
            "_id": "doc-9",
            "templateName": "pt_red_article",
            "fs_language": "EN_GB",
            "LastReleaseDatetime": 1_700_000_000_000i64,
            "last_release_article": "doc-9",
            "level_index": 3,
        }))
        .unwrap();

        let n = normalize(&doc);
        assert_eq!(n.kind, RecordKind::Article);
        assert_eq!(n.language, "en");
        assert_eq!(n.release_date.as_deref(), Some("2023-11-14T22:13:20"));
        assert!(n.is_last_update);
        assert_eq!(n.level_index.as_deref(), Some("3"));
        assert!(n.warnings.is_empty());
    }

    #[test]
    fn passthrough_fields_are_normalized() {
        let doc: RawDocument = serde_json::from_value(json!({
            "_id": "doc-10",
            "templateName": "pt_red_article",
            "release_status": true,
            "brands": ["acme", "globex"],
            "fs_id": 42,
            "parentIdentifier1": "root",
            "_links": {"self": "..."},
            "empty_list": [],
        }))
        .unwrap();

        let n = normalize(&doc);
        assert_eq!(n.extras.get("release_status"), Some(&json!(1)));
        assert_eq!(n.extras.get("brands"), Some(&json!("acme, globex")));
        assert_eq!(n.extras.get("fs_id"), Some(&json!(42)));
        // Ancestor ids feed the term registry, export machinery and empty
        // arrays are dropped.
        assert!(!n.extras.contains_key("parentIdentifier1"));
        assert!(!n.extras.contains_key("_links"));
        assert!(!n.extras.contains_key("empty_list"));
    }

    #[test]
    fn normalize_never_fails_on_missing_fields() {
        let doc: RawDocument =
            serde_json::from_value(json!({"_id": "bare", "templateName": "pt_start"})).unwrap();
        let n = normalize(&doc);
        assert_eq!(n.language, "en");
        assert!(n.release_date.is_none());
        assert!(!n.is_last_update);
    }
}

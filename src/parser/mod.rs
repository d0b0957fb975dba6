pub mod attachments;
pub mod blocks;
pub mod sections;
pub mod topics;

use serde_json::Value;

use crate::model::{Attachment, Section, TopicLink};

/// The three parallel extractions from one document's block sequence.
#[derive(Debug, Clone, Default)]
pub struct ParsedArticle {
    pub sections: Vec<Section>,
    pub topic_links: Vec<TopicLink>,
    pub attachments: Vec<Attachment>,
}

/// Classify once, then run the three independent pairing passes.
pub fn parse_blocks(raw: &[Value]) -> ParsedArticle {
    let blocks = blocks::classify(raw);
    ParsedArticle {
        sections: sections::pair_sections(&blocks),
        topic_links: topics::pair_topics(&blocks),
        attachments: attachments::collect(&blocks),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn intro_details_sections() {
        let raw = vec![
            json!({"content": "<p><b>Intro</b></p>"}),
            json!({"content": "Hello"}),
            json!({"content": "<p><b>Details</b></p>"}),
            json!({"content": "World"}),
        ];
        let parsed = parse_blocks(&raw);
        assert_eq!(parsed.sections.len(), 2);
        assert_eq!(parsed.sections[0].heading, "Intro");
        assert_eq!(parsed.sections[0].body, "Hello");
        assert_eq!(parsed.sections[1].heading, "Details");
        assert_eq!(parsed.sections[1].body, "World");
    }

    #[test]
    fn all_three_passes_over_one_sequence() {
        let raw = vec![
            json!({"content": "<p><b>H</b></p>"}),
            json!({"content": "<p>body</p>"}),
            json!({"supplementaryTopicsTitle": "T1"}),
            json!({"supplementaryTopicsLink": "id-42"}),
            json!({"attachments": [{"filename": "f.pdf"}]}),
        ];
        let parsed = parse_blocks(&raw);
        assert_eq!(parsed.sections.len(), 1);
        assert_eq!(parsed.topic_links.len(), 1);
        assert_eq!(parsed.topic_links[0].reference_id, "id-42");
        assert_eq!(parsed.attachments.len(), 1);
    }

    #[test]
    fn empty_input_is_valid() {
        let parsed = parse_blocks(&[]);
        assert!(parsed.sections.is_empty());
        assert!(parsed.topic_links.is_empty());
        assert!(parsed.attachments.is_empty());
    }
}

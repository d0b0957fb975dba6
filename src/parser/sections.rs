use tracing::debug;

use crate::model::Section;
use crate::parser::blocks::Block;

/// Pair headings with the content that follows them, single pass.
///
/// A heading opens a section; every following body block appends to it
/// until the next heading. Body content before the first heading is
/// dropped, and a heading whose accumulated body stays empty is never
/// emitted — including a trailing heading at end-of-sequence.
pub fn pair_sections(blocks: &[Block]) -> Vec<Section> {
    let mut sections = Vec::new();
    let mut current_heading: Option<String> = None;
    let mut current_body = String::new();

    for block in blocks {
        match block {
            Block::Heading { text } => {
                flush(&mut sections, &mut current_heading, &mut current_body);
                current_heading = Some(text.clone());
                current_body.clear();
            }
            Block::Body { html } => {
                if current_heading.is_some() {
                    // Fragments concatenate without separator; the source
                    // blocks carry their own markup.
                    current_body.push_str(html);
                } else {
                    debug!("Dropping body content before first heading");
                }
            }
            _ => {}
        }
    }
    flush(&mut sections, &mut current_heading, &mut current_body);

    sections
}

fn flush(sections: &mut Vec<Section>, heading: &mut Option<String>, body: &mut String) {
    if let Some(h) = heading.take() {
        let body = body.trim();
        if !h.is_empty() && !body.is_empty() {
            sections.push(Section {
                heading: h,
                body: body.to_string(),
            });
        } else {
            debug!("Dropping section {:?} with empty heading or body", h);
        }
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn heading(text: &str) -> Block {
        Block::Heading { text: text.into() }
    }

    fn body(html: &str) -> Block {
        Block::Body { html: html.into() }
    }

    #[test]
    fn two_sections() {
        let sections = pair_sections(&[
            heading("Intro"),
            body("Hello"),
            heading("Details"),
            body("World"),
        ]);
        assert_eq!(
            sections,
            vec![
                Section { heading: "Intro".into(), body: "Hello".into() },
                Section { heading: "Details".into(), body: "World".into() },
            ]
        );
    }

    #[test]
    fn multiple_body_blocks_concatenate() {
        let sections = pair_sections(&[heading("H"), body("<p>a</p>"), body("<p>b</p>")]);
        assert_eq!(sections[0].body, "<p>a</p><p>b</p>");
    }

    #[test]
    fn content_before_first_heading_is_dropped() {
        let sections = pair_sections(&[body("orphan"), heading("H"), body("kept")]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].body, "kept");
    }

    #[test]
    fn trailing_heading_without_body_is_dropped() {
        let sections = pair_sections(&[heading("H1"), body("x"), heading("H2")]);
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].heading, "H1");
    }

    #[test]
    fn heading_followed_by_heading_drops_the_first() {
        let sections = pair_sections(&[heading("H1"), heading("H2"), body("x")]);
        assert_eq!(sections, vec![Section { heading: "H2".into(), body: "x".into() }]);
    }

    #[test]
    fn lone_heading_yields_nothing() {
        assert!(pair_sections(&[heading("H")]).is_empty());
    }

    #[test]
    fn empty_heading_is_never_emitted() {
        let sections = pair_sections(&[heading(""), body("x")]);
        assert!(sections.is_empty());
    }

    #[test]
    fn every_section_has_nonempty_heading_and_body() {
        let blocks = vec![
            body("pre"),
            heading("A"),
            heading("B"),
            body("b1"),
            heading(""),
            body("dropped"),
            heading("C"),
        ];
        let sections = pair_sections(&blocks);
        assert!(sections.iter().all(|s| !s.heading.is_empty() && !s.body.is_empty()));
        assert_eq!(sections.len(), 1);
    }

    #[test]
    fn non_content_blocks_are_ignored_by_this_pass() {
        let sections = pair_sections(&[
            heading("H"),
            Block::TopicTitle("T".into()),
            body("x"),
            Block::TopicRef("id".into()),
        ]);
        assert_eq!(sections, vec![Section { heading: "H".into(), body: "x".into() }]);
    }
}

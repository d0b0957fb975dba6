use tracing::debug;

use crate::model::TopicLink;
use crate::parser::blocks::Block;

/// Pair topic titles with the reference id that follows them, single pass.
///
/// The export emits title-then-link; a link flushes the pair immediately.
/// Unpaired leftovers are dropped. A link arriving before any title is
/// also dropped — the export never produces that ordering, and if a
/// future corpus does, the data is lost silently. Pinned by test, not
/// fixed.
pub fn pair_topics(blocks: &[Block]) -> Vec<TopicLink> {
    let mut pairs = Vec::new();
    let mut current_title: Option<String> = None;
    let mut current_ref: Option<String> = None;

    for block in blocks {
        match block {
            Block::TopicTitle(title) => {
                // A complete-but-unflushed pair only exists if a link ever
                // failed to flush; kept for parity with the source format's
                // pairing rules.
                if let (Some(t), Some(r)) = (current_title.take(), current_ref.take()) {
                    pairs.push(TopicLink { title: t, reference_id: r });
                }
                current_title = non_empty(title);
                current_ref = None;
            }
            Block::TopicRef(reference) => {
                current_ref = non_empty(reference);
                if current_title.is_some() && current_ref.is_some() {
                    pairs.push(TopicLink {
                        title: current_title.take().unwrap_or_default(),
                        reference_id: current_ref.take().unwrap_or_default(),
                    });
                } else if current_title.is_none() {
                    debug!("Dropping topic reference {:?} with no pending title", reference);
                }
            }
            _ => {}
        }
    }

    if let (Some(t), Some(r)) = (current_title, current_ref) {
        pairs.push(TopicLink { title: t, reference_id: r });
    }

    pairs
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn title(t: &str) -> Block {
        Block::TopicTitle(t.into())
    }

    fn reference(r: &str) -> Block {
        Block::TopicRef(r.into())
    }

    fn pair(t: &str, r: &str) -> TopicLink {
        TopicLink { title: t.into(), reference_id: r.into() }
    }

    #[test]
    fn title_then_link() {
        let pairs = pair_topics(&[title("T1"), reference("id-42")]);
        assert_eq!(pairs, vec![pair("T1", "id-42")]);
    }

    #[test]
    fn two_pairs_interleaved_with_content() {
        let pairs = pair_topics(&[
            title("T1"),
            Block::Body { html: "x".into() },
            reference("id-1"),
            title("T2"),
            reference("id-2"),
        ]);
        assert_eq!(pairs, vec![pair("T1", "id-1"), pair("T2", "id-2")]);
    }

    #[test]
    fn trailing_title_is_dropped() {
        let pairs = pair_topics(&[title("T1"), reference("id-1"), title("T2")]);
        assert_eq!(pairs, vec![pair("T1", "id-1")]);
    }

    #[test]
    fn trailing_ref_is_dropped() {
        let pairs = pair_topics(&[title("T1"), reference("id-1"), reference("id-2")]);
        assert_eq!(pairs, vec![pair("T1", "id-1")]);
    }

    #[test]
    fn ref_before_title_drops_ref() {
        // Known ordering fragility: a link ahead of its title is lost.
        let pairs = pair_topics(&[reference("id-early"), title("T1"), reference("id-1")]);
        assert_eq!(pairs, vec![pair("T1", "id-1")]);
    }

    #[test]
    fn second_title_replaces_unpaired_first() {
        let pairs = pair_topics(&[title("T1"), title("T2"), reference("id-2")]);
        assert_eq!(pairs, vec![pair("T2", "id-2")]);
    }

    #[test]
    fn empty_halves_count_as_absent() {
        assert!(pair_topics(&[title(""), reference("id-1")]).is_empty());
        assert!(pair_topics(&[title("T1"), reference("  ")]).is_empty());
    }

    #[test]
    fn emitted_pairs_are_always_complete() {
        let pairs = pair_topics(&[title("A"), reference("1"), title("B"), title(""), reference("2")]);
        assert!(pairs.iter().all(|p| !p.title.is_empty() && !p.reference_id.is_empty()));
    }
}

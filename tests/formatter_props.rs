//! Formatter properties
//!
//! Determinism, idempotence through plain rendering, and the
//! plain-prose-to-single-paragraph guarantee, checked over generated inputs.

use pagepilot::formatter::{Block, format, render_plain};
use proptest::prelude::*;

proptest! {
    /// Plain prose (no structure markers, no blank lines) must reduce to a
    /// single paragraph block with no structural loss.
    #[test]
    fn plain_prose_is_one_paragraph(text in "[a-zA-Z][a-zA-Z ,.']{0,200}") {
        let blocks = format(&text);
        prop_assert_eq!(blocks.len(), 1);
        let is_paragraph = matches!(blocks[0], Block::Paragraph { .. });
        prop_assert!(is_paragraph);
    }

    /// Formatting is deterministic for arbitrary input.
    #[test]
    fn format_is_deterministic(text in ".{0,400}") {
        prop_assert_eq!(format(&text), format(&text));
    }

    /// Rendering formatted output back to plain text and re-formatting it
    /// reaches a fixed point.
    #[test]
    fn plain_rendering_reaches_fixed_point(text in "[a-zA-Z0-9 ,.:*\\-\n]{0,300}") {
        let first = format(&text);
        let second = format(&render_plain(&first));
        prop_assert_eq!(format(&render_plain(&second)), second);
    }
}

#[test]
fn representative_structures_round_trip_exactly() {
    let cases = [
        "Plain prose answer with **bold** emphasis.",
        "1. **Blue Bottle**\n   Address: 123 Main St\n   - strong espresso\n2. Ritual",
        "- Option A\n   Cost: low\n- Option B\n   Cost: high",
        "Founded: 1998",
        "Intro paragraph.\n\n1. one\n2. two\n\nStatus: done",
    ];
    for case in cases {
        let blocks = format(case);
        assert_eq!(
            format(&render_plain(&blocks)),
            blocks,
            "round trip diverged for {case:?}"
        );
    }
}

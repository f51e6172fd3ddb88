//! Page context supplied alongside queries
//!
//! The context-capture collaborator hands the core a snapshot of the page the
//! user is looking at. The core treats it as a read-only value object, but it
//! must sanitize every field before embedding any of it in an outbound prompt:
//! an oversized or control-character-laden field can break the provider
//! request body.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Maximum characters of extracted page text carried into a prompt
pub const MAX_VISIBLE_TEXT_CHARS: usize = 5000;
/// Maximum characters of user-selected text carried into a prompt
pub const MAX_SELECTED_TEXT_CHARS: usize = 1000;
/// Maximum characters for the URL and title fields
pub const MAX_HEADER_FIELD_CHARS: usize = 512;
/// Maximum number of metadata entries retained after sanitization
pub const MAX_METADATA_ENTRIES: usize = 32;
/// Maximum characters per metadata value
pub const MAX_METADATA_VALUE_CHARS: usize = 256;

/// Snapshot of the page a query was asked about
///
/// Owned by the context-capture collaborator; borrowed read-only by the core.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageContext {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub visible_text: String,
    #[serde(default)]
    pub selected_text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl PageContext {
    /// Return a sanitized copy safe to embed in an outbound prompt
    ///
    /// Truncates each field to its documented cap (on a character boundary),
    /// strips control characters except newlines and tabs, and drops metadata
    /// entries beyond the entry cap.
    pub fn sanitized(&self) -> PageContext {
        let metadata = self
            .metadata
            .iter()
            .take(MAX_METADATA_ENTRIES)
            .map(|(k, v)| {
                (
                    sanitize_fragment(k, MAX_HEADER_FIELD_CHARS),
                    sanitize_fragment(v, MAX_METADATA_VALUE_CHARS),
                )
            })
            .collect();

        PageContext {
            url: sanitize_fragment(&self.url, MAX_HEADER_FIELD_CHARS),
            title: sanitize_fragment(&self.title, MAX_HEADER_FIELD_CHARS),
            visible_text: sanitize_fragment(&self.visible_text, MAX_VISIBLE_TEXT_CHARS),
            selected_text: sanitize_fragment(&self.selected_text, MAX_SELECTED_TEXT_CHARS),
            metadata,
        }
    }

    /// First `max_chars` characters of the visible text, lowercased
    ///
    /// Used by the routing engine's context-relevance scoring.
    pub fn visible_prefix(&self, max_chars: usize) -> String {
        self.visible_text
            .chars()
            .take(max_chars)
            .collect::<String>()
            .to_lowercase()
    }

    /// True when the context carries no usable page text
    pub fn is_empty(&self) -> bool {
        self.visible_text.trim().is_empty() && self.selected_text.trim().is_empty()
    }
}

/// Truncate to `max_chars` characters and strip control characters
///
/// Newlines and tabs survive; everything else below U+0020 (and DEL) is
/// removed so the fragment cannot corrupt a JSON request body or a log line.
fn sanitize_fragment(input: &str, max_chars: usize) -> String {
    input
        .chars()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .take(max_chars)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitized_caps_visible_text() {
        let ctx = PageContext {
            visible_text: "x".repeat(MAX_VISIBLE_TEXT_CHARS + 500),
            ..Default::default()
        };
        let clean = ctx.sanitized();
        assert_eq!(clean.visible_text.chars().count(), MAX_VISIBLE_TEXT_CHARS);
    }

    #[test]
    fn test_sanitized_caps_selected_text() {
        let ctx = PageContext {
            selected_text: "y".repeat(MAX_SELECTED_TEXT_CHARS * 2),
            ..Default::default()
        };
        let clean = ctx.sanitized();
        assert_eq!(clean.selected_text.chars().count(), MAX_SELECTED_TEXT_CHARS);
    }

    #[test]
    fn test_sanitized_strips_control_characters() {
        let ctx = PageContext {
            title: "Some\u{0000}Title\u{0007} here".to_string(),
            visible_text: "line one\nline\ttwo\u{001b}[31m".to_string(),
            ..Default::default()
        };
        let clean = ctx.sanitized();
        assert_eq!(clean.title, "SomeTitle here");
        assert_eq!(clean.visible_text, "line one\nline\ttwo[31m");
    }

    #[test]
    fn test_sanitized_truncates_on_char_boundary() {
        // Multi-byte characters must not be split
        let ctx = PageContext {
            selected_text: "é".repeat(MAX_SELECTED_TEXT_CHARS + 10),
            ..Default::default()
        };
        let clean = ctx.sanitized();
        assert_eq!(clean.selected_text.chars().count(), MAX_SELECTED_TEXT_CHARS);
    }

    #[test]
    fn test_sanitized_caps_metadata_entries() {
        let mut metadata = BTreeMap::new();
        for i in 0..(MAX_METADATA_ENTRIES + 8) {
            metadata.insert(format!("key-{i:03}"), "value".to_string());
        }
        let ctx = PageContext {
            metadata,
            ..Default::default()
        };
        let clean = ctx.sanitized();
        assert_eq!(clean.metadata.len(), MAX_METADATA_ENTRIES);
    }

    #[test]
    fn test_visible_prefix_lowercases_and_bounds() {
        let ctx = PageContext {
            visible_text: "The Quick Brown Fox".to_string(),
            ..Default::default()
        };
        assert_eq!(ctx.visible_prefix(9), "the quick");
    }

    #[test]
    fn test_is_empty_ignores_whitespace() {
        let ctx = PageContext {
            visible_text: "   \n ".to_string(),
            selected_text: String::new(),
            url: "https://example.com".to_string(),
            ..Default::default()
        };
        assert!(ctx.is_empty());
    }
}

//! Response formatter
//!
//! Converts a raw provider text blob (markdown-ish: numbered/bulleted lists,
//! bold markers, key:value lines) into structured display blocks. Pure and
//! deterministic; the same contract applies regardless of originating model.
//!
//! Raw HTML tags are stripped before parsing so provider text containing
//! markup cannot smuggle structure (or script) into the UI. Formatting plain
//! prose yields a single paragraph block with no structural loss.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

/// A run of text, plain or emphasized
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "lowercase")]
pub enum Span {
    Text(String),
    Emphasis(String),
}

/// A `Label: value` row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailRow {
    pub label: String,
    pub value: Vec<Span>,
}

/// One item of an ordered or unordered list
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListItem {
    /// First line of the item
    pub label: Vec<Span>,
    /// Subsequent `Label: value` lines
    pub details: Vec<DetailRow>,
    /// Nested bullet sub-lines
    pub bullets: Vec<Vec<Span>>,
}

/// A structured display block
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { spans: Vec<Span> },
    OrderedList { items: Vec<ListItem> },
    UnorderedList { items: Vec<ListItem> },
    InfoRow { row: DetailRow },
}

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[A-Za-z][^>]*>").expect("html tag pattern compiles"));
static ORDERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)\.\s*").expect("ordered marker pattern compiles"));
static DETAIL_ROW: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([^:]{1,40}):\s*(.+)$").expect("detail row pattern compiles"));

/// Format a raw provider text blob into display blocks
pub fn format(raw: &str) -> Vec<Block> {
    let stripped = strip_html(raw);
    let mut blocks = Vec::new();

    for section in split_sections(&stripped) {
        let trimmed = section.trim();
        if trimmed.is_empty() {
            continue;
        }
        blocks.push(classify_section(trimmed));
    }

    blocks
}

/// Render blocks back to canonical plain text
///
/// `format(render_plain(format(x)))` equals `format(x)`: the canonical text
/// re-parses to the same structure.
pub fn render_plain(blocks: &[Block]) -> String {
    let sections: Vec<String> = blocks.iter().map(render_block).collect();
    sections.join("\n\n")
}

fn render_block(block: &Block) -> String {
    match block {
        Block::Paragraph { spans } => render_spans(spans),
        Block::InfoRow { row } => format!("{}: {}", row.label, render_spans(&row.value)),
        Block::OrderedList { items } => items
            .iter()
            .enumerate()
            .map(|(i, item)| render_item(&format!("{}. ", i + 1), item))
            .collect::<Vec<_>>()
            .join("\n"),
        Block::UnorderedList { items } => items
            .iter()
            .map(|item| render_item("- ", item))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn render_item(marker: &str, item: &ListItem) -> String {
    let mut lines = vec![format!("{marker}{}", render_spans(&item.label))];
    for row in &item.details {
        lines.push(format!("   {}: {}", row.label, render_spans(&row.value)));
    }
    for bullet in &item.bullets {
        lines.push(format!("   - {}", render_spans(bullet)));
    }
    lines.join("\n")
}

fn render_spans(spans: &[Span]) -> String {
    spans
        .iter()
        .map(|span| match span {
            Span::Text(t) => t.clone(),
            Span::Emphasis(t) => format!("**{t}**"),
        })
        .collect()
}

/// Remove raw HTML tags
fn strip_html(text: &str) -> String {
    HTML_TAG.replace_all(text, "").into_owned()
}

/// Split on blank-line boundaries
fn split_sections(text: &str) -> Vec<String> {
    let mut sections = Vec::new();
    let mut current = Vec::new();
    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                sections.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        sections.push(current.join("\n"));
    }
    sections
}

fn classify_section(section: &str) -> Block {
    let first_line = section.lines().next().unwrap_or_default().trim_start();

    if ORDERED_MARKER.is_match(first_line) {
        return Block::OrderedList {
            items: parse_ordered_items(section),
        };
    }

    if is_bullet(first_line) {
        return Block::UnorderedList {
            items: parse_unordered_items(section),
        };
    }

    // A standalone single-line Key: value section
    if section.lines().count() == 1
        && let Some(caps) = DETAIL_ROW.captures(section.trim())
    {
        return Block::InfoRow {
            row: DetailRow {
                label: caps[1].trim().to_string(),
                value: parse_spans(caps[2].trim()),
            },
        };
    }

    Block::Paragraph {
        spans: parse_spans(&section.lines().collect::<Vec<_>>().join(" ")),
    }
}

fn is_bullet(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("- ") || trimmed.starts_with("• ")
}

fn bullet_text(line: &str) -> &str {
    let trimmed = line.trim_start();
    trimmed
        .strip_prefix("- ")
        .or_else(|| trimmed.strip_prefix("• "))
        .unwrap_or(trimmed)
        .trim()
}

/// Split a numbered section into items; a line matching `^\d+\.` starts a
/// new item, everything until the next such line belongs to it
fn parse_ordered_items(section: &str) -> Vec<ListItem> {
    let mut items: Vec<ListItem> = Vec::new();

    for line in section.lines() {
        let trimmed = line.trim_start();
        if let Some(m) = ORDERED_MARKER.find(trimmed)
            && !line.starts_with(char::is_whitespace)
        {
            items.push(ListItem {
                label: parse_spans(trimmed[m.end()..].trim()),
                details: Vec::new(),
                bullets: Vec::new(),
            });
            continue;
        }
        if let Some(item) = items.last_mut() {
            attach_continuation(item, trimmed);
        }
    }

    items
}

/// Split a bulleted section into items; an unindented bullet starts a new
/// item, indented bullets nest under the current one
fn parse_unordered_items(section: &str) -> Vec<ListItem> {
    let mut items: Vec<ListItem> = Vec::new();

    for line in section.lines() {
        let indented = line.starts_with(char::is_whitespace);
        if is_bullet(line) && !indented {
            items.push(ListItem {
                label: parse_spans(bullet_text(line)),
                details: Vec::new(),
                bullets: Vec::new(),
            });
            continue;
        }
        if let Some(item) = items.last_mut() {
            attach_continuation(item, line.trim());
        }
    }

    items
}

/// Classify a continuation line inside a list item
fn attach_continuation(item: &mut ListItem, line: &str) {
    if is_bullet(line) {
        item.bullets.push(parse_spans(bullet_text(line)));
        return;
    }
    if let Some(caps) = DETAIL_ROW.captures(line.trim()) {
        item.details.push(DetailRow {
            label: caps[1].trim().to_string(),
            value: parse_spans(caps[2].trim()),
        });
        return;
    }
    // Free continuation text extends the label
    if !line.trim().is_empty() {
        if let Some(Span::Text(last)) = item.label.last_mut() {
            last.push(' ');
            last.push_str(line.trim());
        } else {
            item.label.push(Span::Text(format!(" {}", line.trim())));
        }
    }
}

/// Convert `**bold**` markers into emphasis spans
fn parse_spans(text: &str) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find("**") {
        if let Some(len) = rest[start + 2..].find("**") {
            if start > 0 {
                spans.push(Span::Text(rest[..start].to_string()));
            }
            spans.push(Span::Emphasis(rest[start + 2..start + 2 + len].to_string()));
            rest = &rest[start + 2 + len + 2..];
        } else {
            break;
        }
    }
    if !rest.is_empty() {
        spans.push(Span::Text(rest.to_string()));
    }
    if spans.is_empty() {
        spans.push(Span::Text(String::new()));
    }
    spans
}

//! Shared keyword tables and text predicates for the routing strategies
//!
//! Both routing entry points classify against the same tables so their
//! decisions cannot drift apart. All matching runs on a lowercased copy of
//! the query.

use regex::Regex;
use std::collections::HashSet;
use std::sync::LazyLock;

use crate::context::PageContext;

/// Words suggesting the answer depends on current, real-world state
pub(crate) const REALTIME_KEYWORDS: &[&str] = &[
    "today",
    "tonight",
    "tomorrow",
    "now",
    "current",
    "currently",
    "latest",
    "recent",
    "news",
    "weather",
    "forecast",
    "price",
    "prices",
    "cost",
    "stock",
    "score",
    "open",
    "hours",
    "closing",
    "recommend",
    "recommendation",
    "available",
    "availability",
    "happening",
    "upcoming",
    "schedule",
    "near",
    "nearby",
];

/// Words suggesting the answer is conceptual or explanatory
pub(crate) const ANALYTICAL_KEYWORDS: &[&str] = &[
    "explain",
    "analyze",
    "analysis",
    "why",
    "understand",
    "theory",
    "concept",
    "meaning",
    "definition",
    "describe",
    "compare",
    "difference",
    "summarize",
    "summary",
    "underlying",
    "principle",
];

/// Event-ish nouns used by the location+event rule
pub(crate) const EVENT_KEYWORDS: &[&str] = &[
    "marathon",
    "concert",
    "concerts",
    "festival",
    "festivals",
    "game",
    "games",
    "match",
    "matches",
    "event",
    "events",
    "show",
    "shows",
    "race",
    "races",
    "parade",
    "conference",
    "exhibition",
    "meetup",
];

/// Organization-info phrasing handled by the company rule
const COMPANY_INFO_PHRASES: &[&str] = &[
    "founder",
    "founders",
    "founded",
    "ceo",
    "who owns",
    "who runs",
    "owner",
    "headquarters",
    "parent company",
    "founding date",
];

/// Query stems indicating an explanation is wanted, not a lookup
const EXPLANATORY_STEMS: &[&str] = &[
    "what is",
    "what are",
    "what was",
    "how does",
    "how do",
    "how did",
    "why is",
    "why do",
    "why does",
    "explain",
];

/// Exact greeting/help strings answered without any context
const GREETINGS: &[&str] = &[
    "hi",
    "hello",
    "hey",
    "help",
    "thanks",
    "thank you",
    "what can you do",
    "what can you do?",
    "who are you",
    "who are you?",
];

/// Phrases that explicitly reference the page being viewed
const PAGE_REFERENCES: &[&str] = &[
    "this page",
    "this site",
    "this website",
    "this company",
    "this article",
    "this document",
];

/// Explanation verbs that, combined with "this", reference the page
const EXPLANATION_VERBS: &[&str] = &["explain", "describe", "tell me about"];

/// Words that can follow "in/at/near/around" without naming a place
const LOCATION_STOPWORDS: &[&str] = &[
    "the", "a", "an", "my", "our", "your", "this", "that", "it", "general", "order", "fact",
    "case", "terms", "particular", "which", "what", "theory", "practice", "detail", "short",
    "summary", "other", "addition", "common", "essence",
];

static LOCATION_PHRASE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:in|at|near|around)\s+([\w][\w'\-]*)").expect("location pattern compiles")
});

static EVENT_DATE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"\bwhen\s+(?:is|are)\b.*\b(?:this|next)\s+(?:year|month|week|weekend)\b",
        r"\bschedule\s+(?:for|of)\b",
        r"\bwhat\s+(?:date|day|time)\b",
        r"\bwhen\s+does\b.*\b(?:start|begin|open|close|end)\b",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("event date pattern compiles"))
    .collect()
});

/// Lowercase and trim a query for matching
pub(crate) fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

fn word_set(text: &str) -> HashSet<&str> {
    text.split(|c: char| !c.is_alphanumeric() && c != '\'')
        .filter(|w| !w.is_empty())
        .collect()
}

/// True when any table entry occurs in the text
///
/// Single-word entries match on word boundaries; multi-word entries match as
/// substrings.
pub(crate) fn has_keyword(text: &str, table: &[&str]) -> bool {
    keyword_hits(text, table) > 0
}

/// Number of table entries occurring in the text
pub(crate) fn keyword_hits(text: &str, table: &[&str]) -> usize {
    let words = word_set(text);
    table
        .iter()
        .filter(|entry| {
            if entry.contains(' ') {
                text.contains(*entry)
            } else {
                words.contains(*entry)
            }
        })
        .count()
}

/// True for explicit event/schedule/date-lookup phrasing
pub(crate) fn is_event_date_query(text: &str) -> bool {
    EVENT_DATE_PATTERNS.iter().any(|p| p.is_match(text))
}

/// True when the query contains an `in|at|near|around <place>` phrase
///
/// A small stopword list rejects idioms like "in general" or "at the" so
/// they do not count as place names.
pub(crate) fn has_location_phrase(text: &str) -> bool {
    LOCATION_PHRASE.captures_iter(text).any(|cap| {
        let following = &cap[1];
        !LOCATION_STOPWORDS.contains(&following)
    })
}

/// True when the query opens with an explanatory stem ("what is", "how does")
pub(crate) fn starts_with_explanatory_stem(text: &str) -> bool {
    EXPLANATORY_STEMS.iter().any(|stem| text.starts_with(stem))
}

/// True for exact greeting/help strings
pub(crate) fn is_greeting(text: &str) -> bool {
    let trimmed = text.trim_end_matches(['!', '.']);
    GREETINGS.contains(&trimmed) || GREETINGS.contains(&text)
}

/// True for company/organization-info phrasing
pub(crate) fn mentions_company_info(text: &str) -> bool {
    keyword_hits(text, COMPANY_INFO_PHRASES) > 0
}

/// True when the query explicitly references the page being viewed
pub(crate) fn references_current_page(text: &str) -> bool {
    if PAGE_REFERENCES.iter().any(|p| text.contains(p)) {
        return true;
    }
    let words = word_set(text);
    words.contains("this") && EXPLANATION_VERBS.iter().any(|v| text.contains(v))
}

/// How many characters of context participate in relevance scoring
const RELEVANCE_PREFIX_CHARS: usize = 1000;
/// Words at or below this length carry no relevance signal
const SIGNIFICANT_WORD_MIN_LEN: usize = 4;

/// Shared-significant-word overlap between query and page context
///
/// Counts query words of at least [`SIGNIFICANT_WORD_MIN_LEN`] characters
/// that also appear in the first 1000 characters of the context text,
/// normalized by the query's significant word count. Returns 0.0 when either
/// side has nothing significant to compare.
pub(crate) fn context_relevance(text: &str, context: &PageContext) -> f64 {
    let significant: Vec<&str> = word_set(text)
        .into_iter()
        .filter(|w| w.len() >= SIGNIFICANT_WORD_MIN_LEN)
        .collect();
    if significant.is_empty() {
        return 0.0;
    }

    let prefix = context.visible_prefix(RELEVANCE_PREFIX_CHARS);
    let prefix_words = word_set(&prefix);
    if prefix_words.is_empty() {
        return 0.0;
    }

    let shared = significant
        .iter()
        .filter(|w| prefix_words.contains(**w))
        .count();
    shared as f64 / significant.len() as f64
}

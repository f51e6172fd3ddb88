//! Rule-based routing cascade
//!
//! Fast, deterministic routing using an ordered rule cascade over the query
//! text and optional page context. Zero network overhead - all decisions are
//! pure CPU logic. First matching rule wins; ties are broken by rule order,
//! never by score magnitude.
//!
//! This cascade is the canonical decision path for the end-to-end query
//! pipeline. It never produces a hybrid decision; callers that want a
//! score-weighted decision (including hybrid) use [`super::ScoredRouter`].

use super::keywords::{
    EVENT_KEYWORDS, REALTIME_KEYWORDS, context_relevance, has_keyword, has_location_phrase,
    is_event_date_query, is_greeting, mentions_company_info, normalize, references_current_page,
    starts_with_explanatory_stem,
};
use super::{ModelKind, RoutingDecision};
use crate::context::PageContext;

/// Context-relevance threshold below which a company-info query is routed
/// to the real-time backend instead of being answered from the page
pub const COMPANY_CONTEXT_RELEVANCE: f64 = 0.3;

/// Rule-based router implementing the ordered decision cascade
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedRouter;

impl RuleBasedRouter {
    /// Create a new rule-based router
    pub fn new() -> Self {
        Self
    }

    /// Decide which backend should answer the query
    ///
    /// # Rule cascade (first match wins)
    /// 1. Explicit event/schedule/date-lookup phrasing -> realtime
    /// 2. Location phrase combined with an event keyword -> realtime
    /// 3. Location phrase combined with a real-time keyword -> realtime
    /// 4. Any real-time keyword, unless the query opens with an explanatory
    ///    stem -> realtime
    /// 5. Company/organization-info phrasing with page context that scores
    ///    below [`COMPANY_CONTEXT_RELEVANCE`] -> realtime; relevant context
    ///    falls through
    /// 6. Explicit reference to the current page -> analytical with context
    /// 7. Greeting/help strings -> analytical, no context
    /// 8. Default -> analytical, no context
    pub fn decide(&self, query: &str, context: Option<&PageContext>) -> RoutingDecision {
        let text = normalize(query);

        // Rule 1: explicit event/schedule/date lookup
        if is_event_date_query(&text) {
            return RoutingDecision::new(
                ModelKind::Realtime,
                false,
                "event, schedule, or date lookup",
            );
        }

        // Rule 2: location phrase + event keyword
        if has_location_phrase(&text) && has_keyword(&text, EVENT_KEYWORDS) {
            return RoutingDecision::new(ModelKind::Realtime, false, "event near a location");
        }

        // Rule 3: location phrase + broader real-time keyword set
        if has_location_phrase(&text) && has_keyword(&text, REALTIME_KEYWORDS) {
            return RoutingDecision::new(
                ModelKind::Realtime,
                false,
                "location-specific current information",
            );
        }

        // Rule 4: real-time keyword present and not an explanation request
        if has_keyword(&text, REALTIME_KEYWORDS) && !starts_with_explanatory_stem(&text) {
            return RoutingDecision::new(
                ModelKind::Realtime,
                false,
                "current-information keywords",
            );
        }

        // Rule 5: company info with insufficiently relevant page context
        if mentions_company_info(&text) {
            let relevance = context.map(|c| context_relevance(&text, c)).unwrap_or(0.0);
            if relevance < COMPANY_CONTEXT_RELEVANCE {
                return RoutingDecision::new(
                    ModelKind::Realtime,
                    false,
                    "organization lookup, page context not relevant",
                );
            }
            // Relevant context: fall through to the page-reference rules
        }

        // Rule 6: explicit reference to the current page
        if references_current_page(&text) {
            return RoutingDecision::new(
                ModelKind::Analytical,
                context.is_some(),
                "question about the current page",
            );
        }

        // Rule 7: greeting or capability question
        if is_greeting(&text) {
            return RoutingDecision::new(
                ModelKind::Analytical,
                false,
                "greeting or capability question",
            );
        }

        // Rule 8: default
        RoutingDecision::new(ModelKind::Analytical, false, "general knowledge query")
    }
}

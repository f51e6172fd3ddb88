//! Score-weighted routing combiner
//!
//! A softer alternative to the hard rule cascade: both keyword sets are
//! scored, and a hybrid decision is requested when both score above a shared
//! threshold. Used by callers that want a score-weighted decision instead of
//! first-match-wins semantics; it is the only entry point that can produce
//! [`ModelKind::Hybrid`].
//!
//! Shares its keyword tables with the rule cascade so the two strategies
//! cannot drift apart.

use super::keywords::{
    ANALYTICAL_KEYWORDS, REALTIME_KEYWORDS, has_keyword, has_location_phrase, keyword_hits,
    normalize, references_current_page,
};
use super::{KeywordScores, ModelKind, RoutingDecision};
use crate::context::PageContext;

/// Both scores must exceed this for a hybrid decision
pub const HYBRID_THRESHOLD: f64 = 0.3;
/// The winning score must exceed this for a single-model decision
pub const SINGLE_MODEL_THRESHOLD: f64 = 0.5;
/// Score contributed by each keyword hit, capped at 1.0 total
const SCORE_PER_HIT: f64 = 0.2;

/// Score-weighted router
#[derive(Debug, Clone, Copy, Default)]
pub struct ScoredRouter;

impl ScoredRouter {
    /// Create a new scored router
    pub fn new() -> Self {
        Self
    }

    /// Decide which backend should answer, weighting both keyword sets
    ///
    /// # Decision order
    /// 1. Both scores above [`HYBRID_THRESHOLD`] -> hybrid
    /// 2. Winning score above [`SINGLE_MODEL_THRESHOLD`] -> that model
    /// 3. Contextual pattern checks (page reference, location + keyword)
    /// 4. Default -> analytical
    pub fn decide(&self, query: &str, context: Option<&PageContext>) -> RoutingDecision {
        let text = normalize(query);
        let scores = KeywordScores {
            realtime: keyword_score(&text, REALTIME_KEYWORDS),
            analytical: keyword_score(&text, ANALYTICAL_KEYWORDS),
        };

        if scores.realtime > HYBRID_THRESHOLD && scores.analytical > HYBRID_THRESHOLD {
            return RoutingDecision::new(
                ModelKind::Hybrid,
                false,
                "both keyword sets scored above the hybrid threshold",
            )
            .with_scores(scores);
        }

        if scores.realtime > SINGLE_MODEL_THRESHOLD && scores.realtime >= scores.analytical {
            return RoutingDecision::new(
                ModelKind::Realtime,
                false,
                "real-time keywords dominate",
            )
            .with_scores(scores);
        }

        if scores.analytical > SINGLE_MODEL_THRESHOLD && scores.analytical > scores.realtime {
            return RoutingDecision::new(
                ModelKind::Analytical,
                false,
                "analytical keywords dominate",
            )
            .with_scores(scores);
        }

        // Neither score is decisive: contextual pattern checks
        if references_current_page(&text) {
            return RoutingDecision::new(
                ModelKind::Analytical,
                context.is_some(),
                "question about the current page",
            )
            .with_scores(scores);
        }

        if has_location_phrase(&text) && has_keyword(&text, REALTIME_KEYWORDS) {
            return RoutingDecision::new(
                ModelKind::Realtime,
                false,
                "location-specific current information",
            )
            .with_scores(scores);
        }

        RoutingDecision::new(ModelKind::Analytical, false, "general knowledge query")
            .with_scores(scores)
    }
}

/// Keyword-hit score: `hits * 0.2`, capped at 1.0
fn keyword_score(text: &str, table: &[&str]) -> f64 {
    (keyword_hits(text, table) as f64 * SCORE_PER_HIT).min(1.0)
}

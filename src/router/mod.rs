//! Routing logic for PagePilot
//!
//! Decides which backend model should answer a query. Two entry points exist:
//!
//! - [`RuleBasedRouter`]: a hard, ordered rule cascade. Deterministic, first
//!   match wins, never produces [`ModelKind::Hybrid`]. This is the canonical
//!   path used by the end-to-end query pipeline.
//! - [`ScoredRouter`]: a softer, score-weighted combiner that can request a
//!   hybrid answer when both keyword sets score above a shared threshold.
//!
//! Both are pure CPU logic: no I/O, no network calls, deterministic for
//! identical inputs.

mod keywords;
pub mod rule_based;
pub mod scored;

pub use rule_based::RuleBasedRouter;
pub use scored::ScoredRouter;

use serde::{Deserialize, Serialize};

/// Target backend model for a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// General-knowledge / reasoning backend
    Analytical,
    /// Search-grounded / current-events backend
    Realtime,
    /// Both backends plus a merge pass
    Hybrid,
}

impl ModelKind {
    /// Convert to string representation for logging and metrics labels
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Analytical => "analytical",
            Self::Realtime => "realtime",
            Self::Hybrid => "hybrid",
        }
    }
}

/// Keyword scores produced by the scored combiner
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeywordScores {
    pub realtime: f64,
    pub analytical: f64,
}

/// Result of a routing decision
///
/// Produced fresh per query and never mutated. Carries the reasoning string
/// so decisions are explainable in logs and the diagnostics decision log.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoutingDecision {
    target: ModelKind,
    use_webpage_context: bool,
    reasoning: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    scores: Option<KeywordScores>,
}

impl RoutingDecision {
    /// Create a new routing decision
    pub fn new(target: ModelKind, use_webpage_context: bool, reasoning: impl Into<String>) -> Self {
        Self {
            target,
            use_webpage_context,
            reasoning: reasoning.into(),
            scores: None,
        }
    }

    /// Attach the keyword scores that informed the decision
    pub fn with_scores(mut self, scores: KeywordScores) -> Self {
        self.scores = Some(scores);
        self
    }

    /// Which backend model to use
    pub fn target(&self) -> ModelKind {
        self.target
    }

    /// Whether the provider prompt should embed the page context
    pub fn use_webpage_context(&self) -> bool {
        self.use_webpage_context
    }

    /// Human-readable explanation of why the decision was made
    pub fn reasoning(&self) -> &str {
        &self.reasoning
    }

    /// Keyword scores, present only for scored decisions
    pub fn scores(&self) -> Option<KeywordScores> {
        self.scores
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_kind_as_str() {
        assert_eq!(ModelKind::Analytical.as_str(), "analytical");
        assert_eq!(ModelKind::Realtime.as_str(), "realtime");
        assert_eq!(ModelKind::Hybrid.as_str(), "hybrid");
    }

    #[test]
    fn test_model_kind_serde() {
        assert_eq!(
            serde_json::from_str::<ModelKind>(r#""analytical""#).unwrap(),
            ModelKind::Analytical
        );
        assert_eq!(
            serde_json::from_str::<ModelKind>(r#""realtime""#).unwrap(),
            ModelKind::Realtime
        );
        assert_eq!(
            serde_json::to_string(&ModelKind::Hybrid).unwrap(),
            r#""hybrid""#
        );
    }

    #[test]
    fn test_routing_decision_accessors() {
        let decision = RoutingDecision::new(ModelKind::Realtime, false, "current events");
        assert_eq!(decision.target(), ModelKind::Realtime);
        assert!(!decision.use_webpage_context());
        assert_eq!(decision.reasoning(), "current events");
        assert!(decision.scores().is_none());
    }

    #[test]
    fn test_routing_decision_with_scores() {
        let decision = RoutingDecision::new(ModelKind::Hybrid, false, "both sets scored")
            .with_scores(KeywordScores {
                realtime: 0.6,
                analytical: 0.4,
            });
        let scores = decision.scores().expect("scores attached");
        assert!((scores.realtime - 0.6).abs() < f64::EPSILON);
        assert!((scores.analytical - 0.4).abs() < f64::EPSILON);
    }

    #[test]
    fn test_routing_decision_serializes_without_scores_field() {
        let decision = RoutingDecision::new(ModelKind::Analytical, true, "page question");
        let json = serde_json::to_string(&decision).unwrap();
        assert!(!json.contains("scores"));
        assert!(json.contains(r#""target":"analytical""#));
    }
}

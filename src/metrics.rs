//! Prometheus metrics collection for PagePilot
//!
//! Tracks query counts by model and outcome, routing decisions, provider
//! failures by kind, usage quota consumption, and end-to-end query latency.
//! Exposed via the `/metrics` endpoint in Prometheus text format.
//!
//! Metric recording returns `Result` so callers can log-and-continue:
//! observability must never break a request.

use prometheus::{
    CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

use crate::router::ModelKind;

/// Query outcome for type-safe metrics labels
///
/// Restricting the label to two values at compile time prevents cardinality
/// mistakes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    /// A genuine provider answer reached the user
    Answer,
    /// The executor's apology fallback reached the user
    Fallback,
}

impl QueryOutcome {
    /// Convert to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answer => "answer",
            Self::Fallback => "fallback",
        }
    }
}

/// Metrics collector for PagePilot
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    queries_total: CounterVec,
    query_duration: HistogramVec,
    routing_decisions: CounterVec,
    provider_failures: IntCounterVec,
    usage_increments: IntCounter,
    recording_failures: IntCounterVec,
}

impl Metrics {
    /// Create a new Metrics instance, registering everything with a fresh
    /// Prometheus registry
    ///
    /// # Errors
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: 3 models x 2 outcomes = 6 time series
        let queries_total = CounterVec::new(
            Opts::new(
                "pagepilot_queries_total",
                "Total completed queries by model and outcome",
            ),
            &["model", "outcome"],
        )?;

        let query_duration = HistogramVec::new(
            HistogramOpts::new(
                "pagepilot_query_duration_ms",
                "End-to-end query latency in milliseconds",
            )
            .buckets(vec![
                50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 15000.0, 30000.0, 60000.0,
            ]),
            &["model"],
        )?;

        // Cardinality: 3 targets = 3 time series
        let routing_decisions = CounterVec::new(
            Opts::new(
                "pagepilot_routing_decisions_total",
                "Routing decisions by target model",
            ),
            &["target"],
        )?;

        // Cardinality: 2 providers x 6 kinds = 12 time series
        let provider_failures = IntCounterVec::new(
            Opts::new(
                "pagepilot_provider_failures_total",
                "Provider call failures by provider and error kind",
            ),
            &["provider", "kind"],
        )?;

        let usage_increments = IntCounter::new(
            "pagepilot_usage_increments_total",
            "Total usage quota increments",
        )?;

        let recording_failures = IntCounterVec::new(
            Opts::new(
                "pagepilot_metrics_recording_failures_total",
                "Metrics recording failures by operation. Indicates Prometheus \
                internal errors - frequent failures require investigation.",
            ),
            &["operation"],
        )?;

        registry.register(Box::new(queries_total.clone()))?;
        registry.register(Box::new(query_duration.clone()))?;
        registry.register(Box::new(routing_decisions.clone()))?;
        registry.register(Box::new(provider_failures.clone()))?;
        registry.register(Box::new(usage_increments.clone()))?;
        registry.register(Box::new(recording_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            queries_total,
            query_duration,
            routing_decisions,
            provider_failures,
            usage_increments,
            recording_failures,
        })
    }

    /// Record a completed query
    pub fn record_query(
        &self,
        model: ModelKind,
        outcome: QueryOutcome,
        duration_ms: f64,
    ) -> Result<(), prometheus::Error> {
        self.queries_total
            .get_metric_with_label_values(&[model.as_str(), outcome.as_str()])?
            .inc();
        self.query_duration
            .get_metric_with_label_values(&[model.as_str()])?
            .observe(duration_ms);
        Ok(())
    }

    /// Record a routing decision
    pub fn record_decision(&self, target: ModelKind) -> Result<(), prometheus::Error> {
        self.routing_decisions
            .get_metric_with_label_values(&[target.as_str()])?
            .inc();
        Ok(())
    }

    /// Record a provider failure
    pub fn record_provider_failure(
        &self,
        provider: &str,
        kind: &str,
    ) -> Result<(), prometheus::Error> {
        self.provider_failures
            .get_metric_with_label_values(&[provider, kind])?
            .inc();
        Ok(())
    }

    /// Record a usage increment
    pub fn record_usage_increment(&self) {
        self.usage_increments.inc();
    }

    /// Count a failed metrics recording operation
    pub fn recording_failure(&self, operation: &str) {
        if let Ok(counter) = self
            .recording_failures
            .get_metric_with_label_values(&[operation])
        {
            counter.inc();
        }
    }

    /// Render all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_create_and_gather() {
        let metrics = Metrics::new().expect("metrics register");
        metrics
            .record_query(ModelKind::Analytical, QueryOutcome::Answer, 123.0)
            .expect("record");
        metrics
            .record_decision(ModelKind::Realtime)
            .expect("record");
        metrics
            .record_provider_failure("realtime", "timeout")
            .expect("record");
        metrics.record_usage_increment();

        let output = metrics.gather().expect("gather");
        assert!(output.contains("pagepilot_queries_total"));
        assert!(output.contains(r#"model="analytical""#));
        assert!(output.contains(r#"outcome="answer""#));
        assert!(output.contains("pagepilot_provider_failures_total"));
        assert!(output.contains("pagepilot_usage_increments_total 1"));
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(QueryOutcome::Answer.as_str(), "answer");
        assert_eq!(QueryOutcome::Fallback.as_str(), "fallback");
    }

    #[test]
    fn test_each_instance_has_isolated_registry() {
        let a = Metrics::new().expect("metrics a");
        let b = Metrics::new().expect("metrics b");
        a.record_usage_increment();
        assert!(a.gather().unwrap().contains("pagepilot_usage_increments_total 1"));
        assert!(b.gather().unwrap().contains("pagepilot_usage_increments_total 0"));
    }
}

//! End-to-end query service
//!
//! Wires the routing engine, retry executor, provider adapters, hybrid
//! merger, formatter, usage meter, and conversation memory into the single
//! `query` entry point the UI consumes. All components are explicitly
//! constructed and owned here - no globals; lifetime equals the owning
//! server state.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::context::PageContext;
use crate::executor::{Executor, RetryPolicy};
use crate::formatter::{self, Block};
use crate::hybrid;
use crate::memory::{ConversationEntry, ConversationMemory};
use crate::metrics::{Metrics, QueryOutcome};
use crate::providers::{AnalyticalProvider, RealtimeProvider};
use crate::router::{ModelKind, RoutingDecision, RuleBasedRouter, ScoredRouter};
use crate::store::{DecisionLogEntry, Store, now_ms};
use crate::usage::UsageMeter;
use std::time::Duration;

/// Characters of the query preserved in the decision log
const QUERY_PREVIEW_CHARS: usize = 120;

/// Completed query response handed to the UI
#[derive(Debug, Clone, Serialize)]
pub struct QueryResponse {
    /// Answer text (or the executor's apology; the UI renders both the same)
    pub text: String,
    /// Model that produced the user-visible answer
    pub model: ModelKind,
    /// Structured display blocks derived from `text`
    pub blocks: Vec<Block>,
    /// Why the router picked this model
    pub reasoning: String,
    /// True when the text is an apology fallback
    pub fallback: bool,
    /// End-to-end latency
    pub elapsed_ms: u64,
}

/// The assistant core consumed by the UI collaborator
pub struct Assistant {
    rule_router: RuleBasedRouter,
    scored_router: ScoredRouter,
    analytical: AnalyticalProvider,
    realtime: RealtimeProvider,
    executor: Executor,
    usage: UsageMeter,
    memory: ConversationMemory,
    store: Arc<Store>,
    metrics: Metrics,
}

impl Assistant {
    /// Construct the assistant from configuration
    pub fn new(config: &Config, store: Arc<Store>, metrics: Metrics) -> Self {
        let policy = RetryPolicy::new(
            config.execution.max_retries(),
            Duration::from_millis(config.execution.timeout_ms()),
        );

        Self {
            rule_router: RuleBasedRouter::new(),
            scored_router: ScoredRouter::new(),
            analytical: AnalyticalProvider::new(&config.providers.analytical),
            realtime: RealtimeProvider::new(&config.providers.realtime),
            executor: Executor::new(policy, store.clone()),
            usage: UsageMeter::new(store.clone(), config.usage.quota),
            memory: ConversationMemory::new(store.clone()),
            store,
            metrics,
        }
    }

    /// The canonical rule-cascade decision
    pub fn decide(&self, query: &str, context: Option<&PageContext>) -> RoutingDecision {
        self.rule_router.decide(query, context)
    }

    /// The score-weighted decision (the entry point that can produce hybrid)
    pub fn decide_scored(&self, query: &str, context: Option<&PageContext>) -> RoutingDecision {
        self.scored_router.decide(query, context)
    }

    /// The usage meter
    pub fn usage(&self) -> &UsageMeter {
        &self.usage
    }

    /// The conversation memory
    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// The backing store
    pub fn store(&self) -> &Arc<Store> {
        &self.store
    }

    /// Run a query end to end
    ///
    /// Routing (or the caller's override) picks the backend; the executor
    /// runs the provider call(s); hybrid answers are merged; the final text
    /// is formatted into blocks. Usage is incremented exactly once per
    /// completed query and the exchange is appended to conversation memory
    /// once - regardless of whether the answer is genuine or an apology,
    /// because either way the user received exactly one assistant entry.
    ///
    /// Quota enforcement is deliberately NOT here: callers check
    /// `usage().check().exceeded` before invoking the pipeline.
    pub async fn query(
        &self,
        text: &str,
        context: Option<&PageContext>,
        session_id: &str,
        model_override: Option<ModelKind>,
    ) -> QueryResponse {
        let started = Instant::now();
        let sanitized = context.map(|c| c.sanitized());
        let context = sanitized.as_ref();

        let decision = match model_override {
            Some(kind) => RoutingDecision::new(
                kind,
                context.is_some_and(|c| !c.is_empty()),
                "caller-specified model override",
            ),
            None => self.rule_router.decide(text, context),
        };

        tracing::info!(
            target = decision.target().as_str(),
            use_context = decision.use_webpage_context(),
            reasoning = decision.reasoning(),
            "Routing decision made"
        );

        self.store
            .log_decision(DecisionLogEntry {
                timestamp_ms: now_ms(),
                query_preview: text.chars().take(QUERY_PREVIEW_CHARS).collect(),
                target: decision.target(),
                use_webpage_context: decision.use_webpage_context(),
                reasoning: decision.reasoning().to_string(),
            })
            .await;
        if let Err(e) = self.metrics.record_decision(decision.target()) {
            self.metrics.recording_failure("record_decision");
            tracing::error!(error = %e, "Metrics recording failed, request continues");
        }

        let prompt_context = decision.use_webpage_context().then_some(context).flatten();

        let (answer_text, answer_model, fallback) = match decision.target() {
            ModelKind::Analytical => {
                let outcome = self
                    .executor
                    .execute(&self.analytical, text, prompt_context)
                    .await;
                let fallback = outcome.is_fallback();
                (outcome.into_text(), ModelKind::Analytical, fallback)
            }
            ModelKind::Realtime => {
                let outcome = self.executor.execute(&self.realtime, text, None).await;
                let fallback = outcome.is_fallback();
                (outcome.into_text(), ModelKind::Realtime, fallback)
            }
            ModelKind::Hybrid => {
                let response = hybrid::merge_hybrid(
                    &self.executor,
                    &self.analytical,
                    &self.realtime,
                    text,
                    prompt_context,
                )
                .await;
                let fallback = response.fallback;
                (response.text, response.model, fallback)
            }
        };

        let blocks = formatter::format(&answer_text);
        let elapsed_ms = started.elapsed().as_millis() as u64;

        // Exactly one increment and one memory append per completed query
        self.usage.increment().await;
        self.metrics.record_usage_increment();
        self.memory
            .append(ConversationEntry {
                timestamp_ms: now_ms(),
                session_id: session_id.to_string(),
                prompt: text.to_string(),
                response: answer_text.clone(),
                model: answer_model,
            })
            .await;

        let outcome = if fallback {
            QueryOutcome::Fallback
        } else {
            QueryOutcome::Answer
        };
        if let Err(e) = self
            .metrics
            .record_query(answer_model, outcome, elapsed_ms as f64)
        {
            self.metrics.recording_failure("record_query");
            tracing::error!(error = %e, "Metrics recording failed, request continues");
        }

        tracing::info!(
            model = answer_model.as_str(),
            fallback,
            elapsed_ms,
            response_length = answer_text.len(),
            "Query completed"
        );

        QueryResponse {
            text: answer_text,
            model: answer_model,
            blocks,
            reasoning: decision.reasoning().to_string(),
            fallback,
            elapsed_ms,
        }
    }
}

//! Hybrid response merging
//!
//! A hybrid decision fans out to both backends concurrently, then issues one
//! extra analytical call that merges the two raw answers into a single
//! coherent response. Latency is bounded by the slower of the two initial
//! legs plus one analytical round-trip, never by their sum.

use crate::context::PageContext;
use crate::executor::Executor;
use crate::providers::Provider;
use crate::router::ModelKind;

/// Raw per-leg answers retained alongside the merged text
#[derive(Debug, Clone, PartialEq)]
pub struct HybridRaw {
    pub realtime: String,
    pub analytical: String,
}

/// Result of a hybrid query
#[derive(Debug, Clone, PartialEq)]
pub struct HybridResponse {
    /// Final text shown to the user
    pub text: String,
    /// `Hybrid` when merged; `Analytical` when the operation degraded to the
    /// analytical leg alone
    pub model: ModelKind,
    /// True when the two legs were actually merged
    pub merged: bool,
    /// True when `text` is an apology rather than an answer
    pub fallback: bool,
    pub raw: HybridRaw,
}

/// Run both legs concurrently and merge
///
/// Degradation policy:
/// - Real-time leg came back as the executor's fallback apology: skip the
///   merge and return the analytical answer alone.
/// - Analytical leg came back as the fallback: the merge channel is gone, so
///   the whole operation degrades to that apology.
/// - Merge call itself falls back: the raw analytical answer is still a good
///   answer, so return it rather than the merge apology.
pub async fn merge_hybrid(
    executor: &Executor,
    analytical: &dyn Provider,
    realtime: &dyn Provider,
    query: &str,
    context: Option<&PageContext>,
) -> HybridResponse {
    // Both legs in flight simultaneously; the join waits for both.
    let (realtime_outcome, analytical_outcome) = futures::join!(
        executor.execute(realtime, query, None),
        executor.execute(analytical, query, context),
    );

    let raw = HybridRaw {
        realtime: realtime_outcome.text().to_string(),
        analytical: analytical_outcome.text().to_string(),
    };

    if analytical_outcome.is_fallback() {
        tracing::warn!("Analytical leg failed during hybrid fan-out, degrading to its apology");
        return HybridResponse {
            text: raw.analytical.clone(),
            model: ModelKind::Analytical,
            merged: false,
            fallback: true,
            raw,
        };
    }

    if realtime_outcome.is_fallback() {
        tracing::info!("Real-time leg failed, returning analytical answer without merging");
        return HybridResponse {
            text: raw.analytical.clone(),
            model: ModelKind::Analytical,
            merged: false,
            fallback: false,
            raw,
        };
    }

    let prompt = merge_prompt(query, &raw.realtime, &raw.analytical);
    let merged_outcome = executor.execute(analytical, &prompt, None).await;

    if merged_outcome.is_fallback() {
        tracing::warn!("Merge call failed, returning analytical leg answer");
        return HybridResponse {
            text: raw.analytical.clone(),
            model: ModelKind::Analytical,
            merged: false,
            fallback: false,
            raw,
        };
    }

    HybridResponse {
        text: merged_outcome.into_text(),
        model: ModelKind::Hybrid,
        merged: true,
        fallback: false,
        raw,
    }
}

/// Merge instructions embedding both raw answers
fn merge_prompt(query: &str, realtime_text: &str, analytical_text: &str) -> String {
    format!(
        "Two assistants answered the same question. Combine their answers into one \
        coherent response.\n\
        Rules: remove redundancy, unify the formatting, keep only information present \
        in the two answers, and add no new facts.\n\n\
        Question: {query}\n\n\
        Answer with current information:\n{realtime_text}\n\n\
        Answer with background knowledge:\n{analytical_text}"
    )
}

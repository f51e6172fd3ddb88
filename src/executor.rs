//! Retry/backoff execution wrapper around provider calls
//!
//! Wraps a single provider call with bounded retries, exponential backoff,
//! and a hard per-attempt timeout. The executor never returns an error:
//! exhausted retries become an [`Outcome`] carrying a user-safe apology,
//! flagged as a fallback so the hybrid merger can detect it. The chat UI has
//! exactly one rendering path either way; that is a documented contract, not
//! an accident.

use std::sync::Arc;
use std::time::Duration;

use crate::context::PageContext;
use crate::providers::{Provider, ProviderError};
use crate::store::{ErrorLogEntry, Store, now_ms};

/// Base backoff before the first retry, in milliseconds
pub const BACKOFF_BASE_MS: u64 = 1000;
/// Backoff ceiling in milliseconds
pub const MAX_BACKOFF_MS: u64 = 8000;

/// Backoff before retry `i` (0-indexed): `min(1000 * 2^i, 8000)` ms
pub fn backoff_ms(retry_index: usize) -> u64 {
    BACKOFF_BASE_MS
        .saturating_mul(2_u64.saturating_pow(retry_index as u32))
        .min(MAX_BACKOFF_MS)
}

/// Retry and timeout policy for provider calls
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    max_retries: usize,
    timeout: Duration,
}

impl RetryPolicy {
    /// Create a policy with the given retry count and per-attempt timeout
    pub fn new(max_retries: usize, timeout: Duration) -> Self {
        Self {
            max_retries,
            timeout,
        }
    }

    /// Retries applied after the initial attempt
    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Hard per-attempt timeout
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: crate::config::DEFAULT_MAX_RETRIES,
            timeout: Duration::from_millis(crate::config::DEFAULT_TIMEOUT_MS),
        }
    }
}

/// Result of an execution: always renderable, never an error
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    text: String,
    fallback: bool,
    attempts: usize,
}

impl Outcome {
    /// The answer text, or the apology when `is_fallback()` is true
    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when retries were exhausted and the text is an apology
    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Number of transport attempts made
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Consume the outcome, yielding the text
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Executes provider calls under the retry policy
pub struct Executor {
    policy: RetryPolicy,
    store: Arc<Store>,
}

impl Executor {
    /// Create a new executor
    pub fn new(policy: RetryPolicy, store: Arc<Store>) -> Self {
        Self { policy, store }
    }

    /// The active retry policy
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Execute a provider call with retries, backoff, and timeout
    ///
    /// Retry policy per failure kind:
    /// - `Auth`: terminal immediately (a bad credential cannot heal), apology
    ///   steers toward reconfiguration
    /// - `Unknown`: retried once, then surfaced
    /// - everything else (`RateLimit`, `Timeout`, `Network`,
    ///   `BadResponseShape`): retried up to the cap with exponential backoff
    ///
    /// Every failed attempt lands in the bounded error log; log writes are
    /// best-effort and never block the response path.
    pub async fn execute(
        &self,
        provider: &dyn Provider,
        prompt: &str,
        context: Option<&PageContext>,
    ) -> Outcome {
        let total_attempts = 1 + self.policy.max_retries;
        let mut last_error: Option<ProviderError> = None;
        let mut attempts_made = 0;

        for attempt in 1..=total_attempts {
            if attempt > 1 {
                let delay = backoff_ms(attempt - 2);
                tracing::debug!(
                    provider = provider.name(),
                    attempt,
                    total_attempts,
                    backoff_ms = delay,
                    "Backing off before retry"
                );
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            attempts_made = attempt;

            // The outer timeout is the cancellation source: dropping the call
            // future aborts the in-flight HTTP request. The adapter also sets
            // the same bound on its client, so either path reports Timeout.
            let call = provider.call(prompt, context, self.policy.timeout);
            let result = match tokio::time::timeout(self.policy.timeout, call).await {
                Ok(result) => result,
                Err(_elapsed) => Err(ProviderError::Timeout(
                    self.policy.timeout.as_millis() as u64
                )),
            };

            match result {
                Ok(reply) => {
                    tracing::info!(
                        provider = provider.name(),
                        attempt,
                        response_length = reply.text.len(),
                        "Provider call succeeded"
                    );
                    return Outcome {
                        text: reply.text,
                        fallback: false,
                        attempts: attempt,
                    };
                }
                Err(err) => {
                    tracing::warn!(
                        provider = provider.name(),
                        attempt,
                        total_attempts,
                        kind = err.kind(),
                        error = %err,
                        "Provider call failed"
                    );
                    self.store
                        .log_error(ErrorLogEntry {
                            timestamp_ms: now_ms(),
                            provider: provider.name().to_string(),
                            kind: err.kind().to_string(),
                            message: err.to_string(),
                            url: context.map(|c| c.url.clone()).filter(|u| !u.is_empty()),
                            attempt,
                        })
                        .await;

                    let terminal = !err.is_retryable()
                        || (matches!(err, ProviderError::Unknown(_)) && attempt >= 2);
                    last_error = Some(err);
                    if terminal {
                        break;
                    }
                }
            }
        }

        let err = last_error.unwrap_or_else(|| {
            tracing::error!(
                provider = provider.name(),
                "BUG: retry loop exhausted without a recorded error"
            );
            ProviderError::Unknown("retry loop exhausted without a recorded error".to_string())
        });

        tracing::error!(
            provider = provider.name(),
            attempts = attempts_made,
            kind = err.kind(),
            "All attempts exhausted, returning fallback apology"
        );

        Outcome {
            text: apology_for(&err, provider.name()),
            fallback: true,
            attempts: attempts_made,
        }
    }
}

/// Plain-language apology embedding the failure reason
///
/// Authentication failures get a distinct text steering the user toward
/// credential reconfiguration; everything else gets a generic try-again
/// apology. Raw provider bodies never appear here.
pub fn apology_for(err: &ProviderError, provider: &str) -> String {
    match err {
        ProviderError::Auth(_) => format!(
            "I couldn't reach the {provider} service because its credentials were rejected. \
            Please re-enter the API key in the assistant settings and try again."
        ),
        other => format!(
            "I'm sorry - I couldn't get an answer from the {provider} service ({}). \
            Please try again in a moment.",
            short_reason(other)
        ),
    }
}

fn short_reason(err: &ProviderError) -> &'static str {
    match err {
        ProviderError::Auth(_) => "credentials rejected",
        ProviderError::RateLimit(_) => "it is receiving too many requests right now",
        ProviderError::Timeout(_) => "it took too long to respond",
        ProviderError::Network(_) => "it could not be reached",
        ProviderError::BadResponseShape(_) => "it returned an unreadable answer",
        ProviderError::Unknown(_) => "it reported an unexpected error",
    }
}

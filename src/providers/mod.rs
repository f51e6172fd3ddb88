//! Provider gateway adapters
//!
//! One adapter per backend model. Each adapter builds a provider-specific
//! request from a normalized prompt + page context, performs the HTTP call
//! under the caller-supplied timeout, and parses the response into a
//! normalized reply or a typed failure. Adapters own the mapping from raw
//! HTTP status/body to the [`ProviderError`] taxonomy; nothing here retries
//! (that belongs to the executor) and nothing here panics across the
//! boundary.

pub mod analytical;
pub mod realtime;

pub use analytical::AnalyticalProvider;
pub use realtime::RealtimeProvider;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::context::PageContext;

/// Maximum characters of a raw error body preserved for diagnostics
const MAX_RAW_BODY_CHARS: usize = 500;

/// Typed provider failure taxonomy
///
/// The executor keys its retry policy off these kinds; the raw detail strings
/// go to the error log only and are never shown to the end user.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProviderError {
    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("rate limited: {0}")]
    RateLimit(String),

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("network error: {0}")]
    Network(String),

    #[error("unexpected response shape: {0}")]
    BadResponseShape(String),

    #[error("provider request failed: {0}")]
    Unknown(String),
}

impl ProviderError {
    /// Stable kind label for logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Auth(_) => "auth",
            Self::RateLimit(_) => "rate_limit",
            Self::Timeout(_) => "timeout",
            Self::Network(_) => "network",
            Self::BadResponseShape(_) => "bad_response_shape",
            Self::Unknown(_) => "unknown",
        }
    }

    /// Whether the executor may retry after this failure
    ///
    /// Authentication failures are terminal: retrying with the same bad
    /// credential cannot succeed. Everything else may be transient.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::Auth(_))
    }
}

/// Normalized successful provider reply
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderReply {
    pub text: String,
}

/// Convenience type alias for provider call results
pub type ProviderResult = Result<ProviderReply, ProviderError>;

/// A backend model adapter
#[async_trait]
pub trait Provider: Send + Sync {
    /// Stable adapter name for logs, metrics, and apology texts
    fn name(&self) -> &'static str;

    /// Perform one request against the backend
    ///
    /// `timeout` bounds the transport call; the adapter configures the HTTP
    /// client accordingly and maps an elapsed timeout to
    /// [`ProviderError::Timeout`].
    async fn call(
        &self,
        prompt: &str,
        context: Option<&PageContext>,
        timeout: Duration,
    ) -> ProviderResult;
}

/// Map a non-2xx HTTP status to the failure taxonomy
///
/// The raw body is preserved (truncated) on the unknown arm for the error
/// log; it must never reach the end user.
pub(crate) fn classify_status(status: StatusCode, body: &str) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::Auth(format!("HTTP {}", status.as_u16())),
        429 => ProviderError::RateLimit(format!("HTTP {}", status.as_u16())),
        code => {
            let detail: String = body.chars().take(MAX_RAW_BODY_CHARS).collect();
            ProviderError::Unknown(format!("HTTP {code}: {detail}"))
        }
    }
}

/// Map a reqwest transport error to the failure taxonomy
pub(crate) fn classify_transport(err: reqwest::Error, timeout: Duration) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(timeout.as_millis() as u64)
    } else if err.is_connect() || (err.status().is_none() && err.is_request()) {
        ProviderError::Network(err.to_string())
    } else {
        ProviderError::Unknown(err.to_string())
    }
}

/// System prompt shared by both adapters
pub(crate) const SYSTEM_PROMPT: &str = "You are a concise assistant embedded in a web page. \
    Answer the user's question directly. Prefer short paragraphs, numbered \
    lists for steps, and 'Label: value' lines for attributes.";

/// Extra system instruction applied when page context is embedded
pub(crate) const CONTEXT_INSTRUCTION: &str = "Answer using ONLY the webpage content below. \
    If the webpage content does not contain the answer, say so instead of guessing.";

/// Build the user-turn message, prepending a labeled webpage-content block
/// when context is supplied
///
/// The context is sanitized here as a second line of defense even though the
/// service layer sanitizes on entry; an unsanitized field must never reach a
/// request body.
pub(crate) fn user_message(prompt: &str, context: Option<&PageContext>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => {
            let ctx = ctx.sanitized();
            let mut message = String::new();
            message.push_str("--- Webpage content ---\n");
            if !ctx.title.is_empty() {
                message.push_str(&format!("Title: {}\n", ctx.title));
            }
            if !ctx.url.is_empty() {
                message.push_str(&format!("URL: {}\n", ctx.url));
            }
            if !ctx.selected_text.is_empty() {
                message.push_str(&format!("Selected text: {}\n", ctx.selected_text));
            }
            message.push_str(&ctx.visible_text);
            message.push_str("\n--- End webpage content ---\n\n");
            message.push_str(&format!("Question: {prompt}"));
            message
        }
        _ => prompt.to_string(),
    }
}

/// Fail-closed extraction of the answer text at a documented JSON path
///
/// Returns `BadResponseShape` when the path is absent or the text is empty.
pub(crate) fn extract_text(value: Option<&str>, path: &str) -> ProviderResult {
    match value {
        Some(text) if !text.trim().is_empty() => Ok(ProviderReply {
            text: text.to_string(),
        }),
        Some(_) => Err(ProviderError::BadResponseShape(format!(
            "empty answer text at {path}"
        ))),
        None => Err(ProviderError::BadResponseShape(format!(
            "missing answer text at {path}"
        ))),
    }
}

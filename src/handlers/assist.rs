//! Assist endpoint handlers
//!
//! `POST /assist` runs a query end to end; `POST /decide` exposes the
//! routing decision alone (both the rule-cascade and scored entry points).

use axum::{Extension, Json, extract::State};
use serde::{Deserialize, Deserializer, Serialize};

use crate::context::PageContext;
use crate::error::{AppError, AppResult};
use crate::formatter::Block;
use crate::handlers::AppState;
use crate::middleware::RequestId;
use crate::router::{ModelKind, RoutingDecision};
use crate::usage::UsageRecord;

/// Maximum allowed message length in characters
const MAX_MESSAGE_LENGTH: usize = 8_192;

/// Session id used when the client does not supply one
const DEFAULT_SESSION: &str = "default";

/// Assist request from the UI
///
/// Validation is enforced during deserialization - invalid instances cannot
/// exist.
#[derive(Debug, Clone, Serialize)]
pub struct AssistRequest {
    message: String,
    session_id: Option<String>,
    context: Option<PageContext>,
    model: Option<ModelKind>,
}

impl AssistRequest {
    /// Get the message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Get the session id, defaulting when absent
    pub fn session_id(&self) -> &str {
        self.session_id.as_deref().unwrap_or(DEFAULT_SESSION)
    }

    /// Get the page context, if supplied
    pub fn context(&self) -> Option<&PageContext> {
        self.context.as_ref()
    }

    /// Get the caller's model override, if any
    pub fn model(&self) -> Option<ModelKind> {
        self.model
    }
}

/// Custom Deserialize implementation that validates during deserialization
impl<'de> Deserialize<'de> for AssistRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawAssistRequest {
            message: String,
            #[serde(default)]
            session_id: Option<String>,
            #[serde(default)]
            context: Option<PageContext>,
            #[serde(default)]
            model: Option<ModelKind>,
        }

        let raw = RawAssistRequest::deserialize(deserializer)?;

        if raw.message.trim().is_empty() {
            return Err(serde::de::Error::custom(
                "message cannot be empty or contain only whitespace",
            ));
        }

        let char_count = raw.message.chars().count();
        if char_count > MAX_MESSAGE_LENGTH {
            return Err(serde::de::Error::custom(format!(
                "message exceeds maximum length of {} characters (got {})",
                MAX_MESSAGE_LENGTH, char_count
            )));
        }

        Ok(AssistRequest {
            message: raw.message,
            session_id: raw.session_id,
            context: raw.context,
            model: raw.model,
        })
    }
}

/// Assist response to the UI
#[derive(Debug, Clone, Serialize)]
pub struct AssistResponse {
    /// Answer text (genuine answer or apology; one rendering path)
    pub text: String,
    /// Model that produced the answer
    pub model: ModelKind,
    /// Structured display blocks
    pub blocks: Vec<Block>,
    /// Router reasoning
    pub reasoning: String,
    /// End-to-end latency
    pub elapsed_ms: u64,
    /// Usage after this query's increment
    pub usage: UsageRecord,
}

/// POST /assist handler
///
/// Enforces the quota policy before invoking the pipeline: an exceeded quota
/// blocks submission until the user resets it. The usage meter itself never
/// blocks - that policy lives here, at the caller.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<AssistRequest>,
) -> AppResult<Json<AssistResponse>> {
    tracing::debug!(
        request_id = %request_id,
        message_length = request.message().len(),
        has_context = request.context().is_some(),
        model_override = ?request.model(),
        "Received assist request"
    );

    let usage = state.assistant().usage().check().await;
    if usage.exceeded {
        tracing::info!(
            request_id = %request_id,
            current_usage = usage.current_usage,
            "Query blocked: usage quota exceeded"
        );
        return Err(AppError::QuotaExceeded {
            used: usage.current_usage,
            quota: state.assistant().usage().quota(),
        });
    }

    let response = state
        .assistant()
        .query(
            request.message(),
            request.context(),
            request.session_id(),
            request.model(),
        )
        .await;

    let usage = state.assistant().usage().check().await;

    tracing::info!(
        request_id = %request_id,
        model = response.model.as_str(),
        fallback = response.fallback,
        elapsed_ms = response.elapsed_ms,
        "Assist request completed"
    );

    Ok(Json(AssistResponse {
        text: response.text,
        model: response.model,
        blocks: response.blocks,
        reasoning: response.reasoning,
        elapsed_ms: response.elapsed_ms,
        usage,
    }))
}

/// Decide request: routing decision without executing anything
#[derive(Debug, Deserialize)]
pub struct DecideRequest {
    pub message: String,
    #[serde(default)]
    pub context: Option<PageContext>,
    /// Use the score-weighted combiner instead of the rule cascade
    #[serde(default)]
    pub scored: bool,
}

/// POST /decide handler
pub async fn decide_handler(
    State(state): State<AppState>,
    Json(request): Json<DecideRequest>,
) -> AppResult<Json<RoutingDecision>> {
    if request.message.trim().is_empty() {
        return Err(AppError::Validation(
            "message cannot be empty or contain only whitespace".to_string(),
        ));
    }

    let decision = if request.scored {
        state
            .assistant()
            .decide_scored(&request.message, request.context.as_ref())
    } else {
        state
            .assistant()
            .decide(&request.message, request.context.as_ref())
    };

    Ok(Json(decision))
}

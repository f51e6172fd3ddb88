//! Analytical (general-knowledge) provider adapter
//!
//! Speaks a messages-style JSON API: system + user turns in, answer text at
//! `content[0].text` out.
//!
//! Two authentication header styles are supported for compatibility with
//! legacy keys: `x-api-key` for keys carrying the legacy prefix, bearer
//! tokens otherwise. If the selected style is rejected as unauthenticated,
//! exactly one attempt with the alternate style is made before giving up.
//! This is an auth-format shim, not a retry; transport retries belong to the
//! executor.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{
    CONTEXT_INSTRUCTION, Provider, ProviderError, ProviderResult, SYSTEM_PROMPT, classify_status,
    classify_transport, extract_text, user_message,
};
use crate::config::ProviderEndpoint;
use crate::context::PageContext;

/// Key prefix selecting the legacy `x-api-key` header style
const LEGACY_KEY_PREFIX: &str = "sk-";
/// Wire API version header
const API_VERSION: &str = "2023-06-01";

/// Authentication header style
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AuthStyle {
    /// `x-api-key: <key>`
    LegacyKeyHeader,
    /// `Authorization: Bearer <key>`
    Bearer,
}

impl AuthStyle {
    fn alternate(self) -> Self {
        match self {
            Self::LegacyKeyHeader => Self::Bearer,
            Self::Bearer => Self::LegacyKeyHeader,
        }
    }
}

/// Adapter for the analytical backend
pub struct AnalyticalProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f64,
}

impl AnalyticalProvider {
    /// Create a new adapter from endpoint configuration
    pub fn new(endpoint: &ProviderEndpoint) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: endpoint.base_url().trim_end_matches('/').to_string(),
            model: endpoint.model().to_string(),
            api_key: endpoint.api_key().to_string(),
            max_tokens: endpoint.max_tokens(),
            temperature: endpoint.temperature(),
        }
    }

    /// Preferred auth style for the configured key
    fn preferred_style(&self) -> AuthStyle {
        if self.api_key.starts_with(LEGACY_KEY_PREFIX) {
            AuthStyle::LegacyKeyHeader
        } else {
            AuthStyle::Bearer
        }
    }

    fn request_body(&self, prompt: &str, context: Option<&PageContext>) -> Value {
        let system = if context.is_some_and(|c| !c.is_empty()) {
            format!("{SYSTEM_PROMPT}\n\n{CONTEXT_INSTRUCTION}")
        } else {
            SYSTEM_PROMPT.to_string()
        };

        serde_json::json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "system": system,
            "messages": [
                { "role": "user", "content": user_message(prompt, context) }
            ],
        })
    }

    async fn post(&self, style: AuthStyle, body: &Value, timeout: Duration) -> ProviderResult {
        let url = format!("{}/v1/messages", self.base_url);
        let mut request = self
            .client
            .post(&url)
            .header("anthropic-version", API_VERSION)
            .timeout(timeout)
            .json(body);

        request = match style {
            AuthStyle::LegacyKeyHeader => request.header("x-api-key", &self.api_key),
            AuthStyle::Bearer => request.bearer_auth(&self.api_key),
        };

        let response = request
            .send()
            .await
            .map_err(|e| classify_transport(e, timeout))?;

        let status = response.status();
        let raw = response
            .text()
            .await
            .map_err(|e| classify_transport(e, timeout))?;

        if !status.is_success() {
            return Err(classify_status(status, &raw));
        }

        let parsed: Value = serde_json::from_str(&raw)
            .map_err(|e| ProviderError::BadResponseShape(format!("invalid JSON body: {e}")))?;
        let text = parsed
            .get("content")
            .and_then(|c| c.get(0))
            .and_then(|block| block.get("text"))
            .and_then(Value::as_str);
        extract_text(text, "content[0].text")
    }
}

#[async_trait]
impl Provider for AnalyticalProvider {
    fn name(&self) -> &'static str {
        "analytical"
    }

    async fn call(
        &self,
        prompt: &str,
        context: Option<&PageContext>,
        timeout: Duration,
    ) -> ProviderResult {
        let body = self.request_body(prompt, context);
        let style = self.preferred_style();

        match self.post(style, &body, timeout).await {
            Err(ProviderError::Auth(first_reason)) => {
                // Auth-format compatibility shim: one alternate-style attempt
                let alternate = style.alternate();
                tracing::debug!(
                    style = ?style,
                    alternate = ?alternate,
                    "Auth style rejected, attempting alternate header style once"
                );
                self.post(alternate, &body, timeout).await.map_err(|e| {
                    // Keep the original rejection visible when both styles fail
                    match e {
                        ProviderError::Auth(second_reason) => ProviderError::Auth(format!(
                            "both header styles rejected ({first_reason}; {second_reason})"
                        )),
                        other => other,
                    }
                })
            }
            other => other,
        }
    }
}

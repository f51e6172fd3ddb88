//! Real-time search provider adapter
//!
//! Speaks an OpenAI-compatible chat-completions API: system + user messages
//! in, answer text at `choices[0].message.content` out. Always bearer auth.

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::{
    CONTEXT_INSTRUCTION, Provider, ProviderError, ProviderResult, SYSTEM_PROMPT, classify_status,
    classify_transport, extract_text, user_message,
};
use crate::config::ProviderEndpoint;
use crate::context::PageContext;

/// Adapter for the real-time search backend
pub struct RealtimeProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
    max_tokens: u32,
    temperature: f64,
}

impl RealtimeProvider {
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

    fn request_body(&self, prompt: &str, context: Option<&PageContext>) -> Value {
        let system = if context.is_some_and(|c| !c.is_empty()) {
            format!("{SYSTEM_PROMPT}\n\n{CONTEXT_INSTRUCTION}")
        } else {
            SYSTEM_PROMPT.to_string()
        };

        serde_json::json!({
            "model": self.model,
            "temperature": self.temperature,
            "max_tokens": self.max_tokens,
            "messages": [
                { "role": "system", "content": system },
                { "role": "user", "content": user_message(prompt, context) }
            ],
        })
    }
}

#[async_trait]
impl Provider for RealtimeProvider {
    fn name(&self) -> &'static str {
        "realtime"
    }

    async fn call(
        &self,
        prompt: &str,
        context: Option<&PageContext>,
        timeout: Duration,
    ) -> ProviderResult {
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.request_body(prompt, context);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(timeout)
            .json(&body)
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
            .get("choices")
            .and_then(|c| c.get(0))
            .and_then(|choice| choice.get("message"))
            .and_then(|m| m.get("content"))
            .and_then(Value::as_str);
        extract_text(text, "choices[0].message.content")
    }
}

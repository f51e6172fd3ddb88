//! HTTP request handlers for the PagePilot API
//!
//! This is the typed RPC boundary the UI collaborator talks to. Handlers
//! validate input, enforce the quota policy, and delegate to the assistant
//! service; no routing or formatting logic lives here.

use std::sync::Arc;

use crate::metrics::Metrics;
use crate::service::Assistant;

pub mod assist;
pub mod health;
pub mod metrics;
pub mod usage;

/// Application state shared across all handlers
///
/// All fields are Arc'd for cheap cloning across Axum handlers. Components
/// are constructed once at startup and dependency-injected; their lifetime
/// is the server's lifetime.
#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
    metrics: Metrics,
}

impl AppState {
    /// Create a new AppState from constructed components
    pub fn new(assistant: Arc<Assistant>, metrics: Metrics) -> Self {
        Self { assistant, metrics }
    }

    /// Get reference to the assistant service
    pub fn assistant(&self) -> &Assistant {
        &self.assistant
    }

    /// Get reference to the metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

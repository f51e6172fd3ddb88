//! Command-line interface for PagePilot
//!
//! Provides argument parsing and subcommand handling for the PagePilot binary.

use clap::{Parser, Subcommand};

/// Query routing core for an in-page AI assistant
#[derive(Parser)]
#[command(name = "pagepilot")]
#[command(version)]
#[command(about = "Query routing and response orchestration core for an in-page AI assistant")]
#[command(
    long_about = "PagePilot routes assistant queries to an analytical or real-time search \
    model (or both, merged), with bounded retries, response formatting, and a local usage quota."
)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    pub config: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Generate a template configuration file
    Config {
        /// Output file path (prints to stdout if not specified)
        #[arg(short, long)]
        output: Option<String>,
    },
}

/// Generate template configuration content
pub fn generate_config_template() -> &'static str {
    r#"# PagePilot Configuration
# =======================
#
# This file configures the HTTP server, the two provider backends, retry and
# timeout behavior, the usage quota, local storage, and observability.

# ─────────────────────────────────────────────────────────────────────────────
# SERVER CONFIGURATION
# ─────────────────────────────────────────────────────────────────────────────

[server]
# IP address to bind to (127.0.0.1 for localhost only)
host = "127.0.0.1"

# Port to listen on
port = 3100

# ─────────────────────────────────────────────────────────────────────────────
# PROVIDER BACKENDS
# ─────────────────────────────────────────────────────────────────────────────
#
# Two backends are required:
#
#   - ANALYTICAL: general-knowledge / reasoning model (messages-style API)
#   - REALTIME:   search-grounded / current-events model (chat-completions API)
#
# Endpoint fields:
#   - base_url:    API base URL
#   - model:       provider model identifier
#   - api_key:     credential (analytical keys with the legacy "sk-" prefix
#                  use the x-api-key header; all others use bearer auth)
#   - max_tokens:  maximum output tokens per response
#   - temperature: sampling temperature (0.0-2.0)

[providers.analytical]
base_url = "https://api.your-analytical-provider.com"
model = "your-reasoning-model"
api_key = "sk-your-key"
max_tokens = 1024
temperature = 0.7

[providers.realtime]
base_url = "https://api.your-search-provider.ai"
model = "your-online-model"
api_key = "your-key"
max_tokens = 1024
temperature = 0.7

# ─────────────────────────────────────────────────────────────────────────────
# EXECUTION (Optional)
# ─────────────────────────────────────────────────────────────────────────────
#
# Retries after the initial attempt (1-3) and per-attempt timeout.
# Worst-case latency per query is roughly timeout_ms * (1 + max_retries),
# and up to double that for hybrid queries.

[execution]
max_retries = 2
timeout_ms = 15000

# ─────────────────────────────────────────────────────────────────────────────
# USAGE QUOTA (Optional)
# ─────────────────────────────────────────────────────────────────────────────

[usage]
# Free queries per installation before submission is blocked until reset
quota = 25

# ─────────────────────────────────────────────────────────────────────────────
# STORAGE (Optional)
# ─────────────────────────────────────────────────────────────────────────────

[storage]
# Local store file: installation id, usage counters, conversation log,
# bounded error and decision logs
path = "pagepilot-store.json"

# ─────────────────────────────────────────────────────────────────────────────
# OBSERVABILITY (Optional)
# ─────────────────────────────────────────────────────────────────────────────

[observability]
# Log level: "trace", "debug", "info", "warn", "error"
log_level = "info"

# Prometheus metrics are always available at /metrics on the server port
"#
}

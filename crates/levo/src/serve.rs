// SPDX-FileCopyrightText: 2026 Levo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `levo serve` command implementation.
//!
//! Opens the SQLite history store, connects the Groq completion provider and
//! (when configured) the web search provider, and serves the HTTP gateway
//! until SIGINT/SIGTERM. The store is closed after the server drains.

use std::sync::Arc;

use levo_agent::{ConversationService, TurnSettings, shutdown};
use levo_config::model::LevoConfig;
use levo_context::{ContextEngine, TriggerTable};
use levo_core::{HistoryStore, LevoError};
use levo_gateway::{GatewayState, ServerConfig};
use levo_groq::GroqProvider;
use levo_search::WebSearchProvider;
use levo_storage::SqliteHistoryStore;
use tracing::{info, warn};

/// Runs the `levo serve` command.
pub async fn run_serve(config: LevoConfig) -> Result<(), LevoError> {
    info!(agent = %config.agent.name, "starting levo serve");

    let service = Arc::new(build_service(&config).await?);
    let cancel = shutdown::install_signal_handler();

    let state = GatewayState {
        service: service.clone(),
        agent_name: config.agent.name.clone(),
    };
    let server_config = ServerConfig {
        host: config.server.host.clone(),
        port: config.server.port,
    };

    let served = levo_gateway::start_server(&server_config, state, cancel).await;

    if let Err(e) = service.shutdown().await {
        warn!(error = %e, "history store did not close cleanly");
    }
    info!("levo serve stopped");
    served
}

/// Opens the history store and wires every collaborator into a service.
pub async fn build_service(config: &LevoConfig) -> Result<ConversationService, LevoError> {
    let store = Arc::new(open_store(config).await?);
    let completion = Arc::new(GroqProvider::new(&config.completion)?);
    let engine = ContextEngine::new(&config.agent, &config.context).await;

    let service = ConversationService::new(
        store,
        completion,
        engine,
        TurnSettings::from_config(config),
    );

    let triggers = TriggerTable::from_config(&config.triggers);
    if !config.search.enabled || triggers.is_empty() {
        info!("retrieval disabled");
        return Ok(service);
    }
    match WebSearchProvider::new(&config.search) {
        Ok(search) => {
            info!(triggers = config.triggers.len(), "retrieval enabled");
            Ok(service.with_retrieval(Arc::new(search), triggers))
        }
        Err(e) => {
            warn!(error = %e, "web search not configured, retrieval disabled");
            Ok(service)
        }
    }
}

/// Opens and initializes the SQLite history store.
pub async fn open_store(config: &LevoConfig) -> Result<SqliteHistoryStore, LevoError> {
    let store = SqliteHistoryStore::new(config.storage.clone());
    store.initialize().await?;
    Ok(store)
}

/// Initializes the tracing subscriber with the given log level.
///
/// Logs go to stderr so command output on stdout stays clean.
pub fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(log_level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .init();
}

const LEVO_TARGETS: &[&str] = &[
    "levo",
    "levo_agent",
    "levo_context",
    "levo_gateway",
    "levo_groq",
    "levo_search",
    "levo_storage",
];

/// `log_level` for every Levo crate, `warn` for dependencies.
fn default_directives(log_level: &str) -> String {
    let mut directives: Vec<String> = LEVO_TARGETS
        .iter()
        .map(|target| format!("{target}={log_level}"))
        .collect();
    directives.push("warn".to_string());
    directives.join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directives_cover_every_crate() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("levo=debug,levo_agent=debug"));
        assert!(directives.contains("levo_storage=debug"));
        assert!(directives.ends_with(",warn"));
    }
}

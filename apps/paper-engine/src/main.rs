//! Paper Engine Binary
//!
//! Starts the paper-trading execution core and waits for shutdown.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin paper-engine
//! ```
//!
//! # Environment Variables
//!
//! - `PAPER_ENGINE_CONFIG`: Path to the YAML config (default: `config.yaml`;
//!   built-in defaults are used when the file does not exist)
//! - `PAPER_ENGINE_SESSION`: Session to activate at startup (optional)
//! - `RUST_LOG`: Log filter (default: `observability.logging.level`)

use std::io::ErrorKind as IoErrorKind;

use anyhow::Context;
use paper_engine::config::{CONFIG_PATH_ENV, Config, ConfigError, load_config};
use paper_engine::domain::shared::SessionId;
use paper_engine::infrastructure::config::Engine;
use paper_engine::infrastructure::persistence::InMemoryTradeStore;
use paper_engine::telemetry::init_telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;

/// Default config file path.
const DEFAULT_CONFIG_PATH: &str = "config.yaml";

/// Environment variable naming the session to activate at startup.
const SESSION_ENV: &str = "PAPER_ENGINE_SESSION";

/// Where the configuration came from.
enum ConfigSource {
    File(String),
    Defaults(String),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, source) = resolve_config()?;

    let _telemetry = init_telemetry(&config.observability.logging)
        .context("failed to install tracing subscriber")?;

    tracing::info!("Starting Paper Engine");
    log_config(&config, &source);

    let engine = Engine::in_memory(&config);
    let shutdown_token = CancellationToken::new();

    activate_session(&engine, &shutdown_token).await?;

    tracing::info!("Paper engine ready");

    shutdown_signal().await;
    shutdown_token.cancel();

    tracing::info!(
        orders = engine.exchange().list_orders().len(),
        open_positions = engine.positions().get_open_positions().await.len(),
        "Paper engine stopped"
    );
    Ok(())
}

/// Load config from `PAPER_ENGINE_CONFIG`, falling back to defaults when the
/// file is absent. Any other failure is fatal.
fn resolve_config() -> anyhow::Result<(Config, ConfigSource)> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

    match load_config(Some(&path)) {
        Ok(config) => Ok((config, ConfigSource::File(path))),
        Err(ConfigError::ReadError { source, .. }) if source.kind() == IoErrorKind::NotFound => {
            Ok((Config::default(), ConfigSource::Defaults(path)))
        }
        Err(e) => Err(e).with_context(|| format!("failed to load config from {path}")),
    }
}

fn log_config(config: &Config, source: &ConfigSource) {
    match source {
        ConfigSource::File(path) => tracing::info!(path = %path, "Loaded config"),
        ConfigSource::Defaults(path) => {
            tracing::info!(path = %path, "Config file not found, using defaults");
        }
    }
    tracing::info!(
        maker_fee = %config.simulator.maker_fee,
        taker_fee = %config.simulator.taker_fee,
        base_slippage = %config.simulator.base_slippage,
        max_slippage = %config.simulator.max_slippage,
        max_retries = config.retry.max_retries,
        "Configuration"
    );
}

/// Activate the startup session, retrying transient store failures.
async fn activate_session(
    engine: &Engine<InMemoryTradeStore>,
    token: &CancellationToken,
) -> anyhow::Result<()> {
    let Ok(session) = std::env::var(SESSION_ENV) else {
        tracing::info!("No startup session, waiting for one to be set");
        return Ok(());
    };
    let session = SessionId::new(session);

    engine
        .retry()
        .run(token, || engine.set_session(Some(session.clone())))
        .await
        .with_context(|| format!("failed to activate session {session}"))?;

    tracing::info!(session_id = %session, "Session activated");
    Ok(())
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

//! Chat Agent Entry Point
//!
//! Reads line-delimited JSON messages from stdin, runs one conversation turn
//! per message and writes each turn report as a JSON line to stdout. Logs go
//! to stderr.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use chat_agent_config::{load_settings, LogFormat, Settings};
use chat_agent_server::{serve_lines, AppState, ProcessedTurn};

fn main() -> anyhow::Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    let result = runtime.block_on(run());
    // a pending stdin read parks a blocking thread until the next line
    runtime.shutdown_timeout(Duration::from_secs(1));
    result
}

async fn run() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = std::env::var("CHAT_AGENT_ENV").ok();
    let config = load_settings(env.as_deref()).context("failed to load configuration")?;

    init_tracing(&config);

    tracing::info!("Starting Chat Agent v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        environment = ?config.environment,
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let state = AppState::build(config).context("failed to initialise the agent")?;
    tracing::info!(
        states = state.graph.len(),
        max_sessions = state.config.session.max_sessions,
        "Initialized application state"
    );

    let cleanup = state.sessions.start_cleanup_task();

    let (tx, rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(write_reports(rx));

    let stdin = BufReader::new(tokio::io::stdin());
    let worker_idle = Duration::from_secs(state.config.session.worker_idle_seconds);
    let stats = serve_lines(
        stdin,
        Arc::clone(&state.sessions),
        tx,
        worker_idle,
        shutdown_signal(),
    )
    .await?;

    let _ = cleanup.send(true);
    printer.await?;

    tracing::info!(
        completed = stats.completed,
        failed = stats.failed,
        "Shutdown complete"
    );
    Ok(())
}

async fn write_reports(mut rx: mpsc::UnboundedReceiver<ProcessedTurn>) {
    let mut stdout = tokio::io::stdout();
    while let Some(turn) = rx.recv().await {
        let mut line = match serde_json::to_string(&turn) {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to serialize turn report");
                continue;
            }
        };
        line.push('\n');
        if let Err(e) = stdout.write_all(line.as_bytes()).await {
            tracing::error!(error = %e, "Failed to write turn report");
            break;
        }
    }
    let _ = stdout.flush().await;
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("chat_agent={}", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = match config.observability.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .boxed(),
    };
    subscriber.with(fmt_layer).init();
}

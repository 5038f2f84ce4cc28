mod config;
mod core;
mod engine;
mod error;
mod harness;
mod jobs;
mod routes;
mod runner;

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::RunnerConfig;
use crate::core::languages::LanguageRegistry;
use crate::routes::{build_router, AppState};
use crate::runner::LocalRunner;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("code_runner=info".parse()?),
        )
        .init();

    let config = RunnerConfig::from_env()?;

    let languages = match &config.languages_config {
        Some(path) => {
            let registry = LanguageRegistry::load(path)?;
            info!("Loaded language configurations from {}", path.display());
            registry
        }
        None => LanguageRegistry::builtin()?,
    };
    info!("Supported languages: {}", languages.supported().join(", "));

    if !config.workspace_root.is_dir() {
        warn!(
            "Workspace root {} does not exist; every run will fail",
            config.workspace_root.display()
        );
    }

    info!(
        "Limits: compile {}ms, run {}ms, output {} bytes, source {} bytes",
        config.compile_timeout_ms,
        config.run_timeout_ms,
        config.max_output_bytes,
        config.max_source_bytes
    );

    let addr = config.bind_addr();
    let state = AppState::new(config, languages, Arc::new(LocalRunner::new()));
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Code runner listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Code runner stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}

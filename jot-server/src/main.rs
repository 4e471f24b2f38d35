//! jot-server - personal note-taking backend
//!
//! Serves the note API over HTTP, backed by SQLite. Natural-language note
//! extraction and translation are enabled when an LLM token is available.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jot_common::config::{CliOverrides, ServiceConfig};
use jot_common::db::init_database;
use jot_server::llm::{LlmProvider, OpenAiCompatibleLlm};
use jot_server::{build_router, AppState};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for jot-server
#[derive(Parser, Debug)]
#[command(name = "jot-server")]
#[command(about = "Personal note-taking backend")]
#[command(version)]
struct Args {
    /// Port to listen on [default: 5780]
    #[arg(short, long, env = "JOT_PORT")]
    port: Option<u16>,

    /// Address to bind [default: 127.0.0.1]
    #[arg(short, long, env = "JOT_BIND")]
    bind: Option<String>,

    /// Folder holding the database, token file and jot.toml
    #[arg(short, long, env = "JOT_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Explicit TOML config file
    #[arg(short, long, env = "JOT_CONFIG")]
    config: Option<PathBuf>,
}

impl From<Args> for CliOverrides {
    fn from(args: Args) -> Self {
        CliOverrides {
            port: args.port,
            bind: args.bind,
            root_folder: args.root_folder,
            config_path: args.config,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config loading logs through a temporary subscriber; the real one
    // needs the configured log level.
    let bootstrap = tracing_subscriber::fmt()
        .with_env_filter(env_filter("info"))
        .finish();
    let config = tracing::subscriber::with_default(bootstrap, || {
        ServiceConfig::resolve(CliOverrides::from(args))
    })
    .context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(env_filter(&config.log_level))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting jot-server v{}",
        env!("CARGO_PKG_VERSION")
    );
    info!("Root folder: {}", config.root_folder.display());
    info!("Database path: {}", config.database_path.display());

    let pool = init_database(&config.database_path)
        .await
        .context("Failed to initialize database")?;

    let llm: Option<Arc<dyn LlmProvider>> = match config.llm_token.clone() {
        Some(token) => {
            let client = OpenAiCompatibleLlm::new(&config.llm, token)
                .context("Failed to create LLM client")?;
            info!(
                "LLM enabled: {} ({})",
                config.llm.endpoint,
                client.model()
            );
            let provider: Arc<dyn LlmProvider> = Arc::new(client);
            Some(provider)
        }
        None => {
            warn!("No LLM token configured; extract, generate and translate will return 503");
            None
        }
    };

    let app = build_router(AppState::new(pool, llm));

    let addr = format!("{}:{}", config.bind, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("jot-server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` if set, otherwise the given level
fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}

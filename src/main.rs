use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::task::TaskTracker;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use sftpgo_manager::auth::generate_api_key;
use sftpgo_manager::config::AppConfig;
use sftpgo_manager::ingest::IngestWorker;
use sftpgo_manager::server::{AppState, create_router};
use sftpgo_manager::sftpgo::SftpgoClient;
use sftpgo_manager::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "sftpgo-manager")]
#[command(about = "Multi-tenant management backend for SFTPGo", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Address to listen on, e.g. ":9090" or "127.0.0.1:9090". Overrides LISTEN_ADDR.
        #[arg(long)]
        listen: Option<String>,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Create an API key directly in the registry
    CreateKey {
        /// Optional label stored with the key
        #[arg(long)]
        label: Option<String>,

        /// Registry database path. Overrides DB_PATH.
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn run_create_key(config: &AppConfig, label: Option<String>, db: Option<PathBuf>) -> anyhow::Result<()> {
    let db_path = db.unwrap_or_else(|| config.db_path.clone());
    let store = SqliteStore::new(&db_path)
        .with_context(|| format!("failed to open registry at {}", db_path.display()))?;
    store.initialize()?;

    let key = store.create_api_key(&generate_api_key(), label.as_deref())?;

    println!();
    println!("========================================");
    println!("API key (save this, it won't be shown again):");
    println!();
    println!("  {}", key.key);
    println!();
    println!("========================================");
    println!();

    Ok(())
}

async fn run_server(mut config: AppConfig, listen: Option<String>) -> anyhow::Result<()> {
    if let Some(listen) = listen {
        config.listen_addr = listen;
    }

    let store = SqliteStore::new(&config.db_path)
        .with_context(|| format!("failed to open registry at {}", config.db_path.display()))?;
    store.initialize()?;
    let store: Arc<dyn Store> = Arc::new(store);

    let ingest = match &config.object_store {
        Some(settings) => match IngestWorker::from_settings(Arc::clone(&store), settings) {
            Ok(worker) => {
                info!(bucket = %settings.bucket, "csv ingestion enabled");
                Some(Arc::new(worker))
            }
            Err(e) => {
                warn!("csv ingestion disabled, object store setup failed: {e}");
                None
            }
        },
        None => {
            info!("no object store configured, csv ingestion disabled");
            None
        }
    };

    let tasks = TaskTracker::new();
    let state = Arc::new(AppState {
        store: Arc::clone(&store),
        sftpgo: Arc::new(SftpgoClient::new(&config.sftpgo)),
        data_dir: config.data_dir.clone(),
        object_store: config.object_store.clone(),
        ingest,
        tasks: tasks.clone(),
    });

    let app = create_router(state);
    let addr = config
        .socket_addr()
        .with_context(|| format!("invalid listen address {:?}", config.listen_addr))?;

    info!("Starting server on {addr}, sftpgo at {}", config.sftpgo.url);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tasks.close();
    if !tasks.is_empty() {
        info!(pending = tasks.len(), "waiting for ingestion tasks");
    }
    tasks.wait().await;

    store.close()?;
    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for Ctrl+C: {e}");
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
                warn!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received SIGINT, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("sftpgo_manager=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::CreateKey { label, db } => run_create_key(&config, label, db)?,
        },
        Commands::Serve { listen } => run_server(config, listen).await?,
    }

    Ok(())
}

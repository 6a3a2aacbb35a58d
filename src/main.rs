use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use txncat_engine::Categorizer;
use txncat_server::Config;
use txncat_store::Database;

/// Transaction categorization service.
#[derive(Parser, Debug)]
#[command(name = "txncat", about = "Transaction categorization service")]
struct Cli {
    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the SQLite database.
    #[arg(long)]
    database: Option<PathBuf>,

    /// Admin token gating taxonomy uploads and alias approvals.
    #[arg(long)]
    admin_token: Option<String>,

    /// Votes required before an alias is promoted.
    #[arg(long)]
    promote_threshold: Option<i64>,
}

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    tracing::info!("Starting txncat server");

    // Env config, then CLI flags on top
    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(admin_token) = cli.admin_token {
        config.admin_token = admin_token;
    }
    if let Some(promote_threshold) = cli.promote_threshold {
        config.promote_threshold = promote_threshold;
    }

    let db = Database::open(&config.database).expect("Failed to open database");

    let engine = Arc::new(Categorizer::new(db, config.promote_threshold));

    // Start server
    let handle = txncat_server::start(config, engine)
        .await
        .expect("Failed to start server");

    tracing::info!(port = handle.port, "txncat server ready");

    // Wait for shutdown signal
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to listen for ctrl+c");

    tracing::info!("Shutting down");
}

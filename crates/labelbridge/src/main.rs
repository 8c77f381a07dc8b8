use clap::Parser;
use labelbridge::config::BridgeConfig;
use labelbridge::credentials::FileCredentialStore;
use labelbridge::poller::PollSupervisor;
use labelbridge::review_queue::LogReviewQueue;
use labelbridge::service::LabelerBridge;
use labelbridge::store::postgres::{
    PgAuditStore, PgMappingStore, PgSyncStateStore, ensure_schema,
};
use miette::IntoDiagnostic;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "labelbridge - moderation-event bridge daemon")]
struct Args {
    /// Enable the polling supervisor regardless of POLL_ENABLED
    #[arg(long)]
    poll: bool,

    /// Override the poll interval in milliseconds
    #[arg(long)]
    poll_interval_ms: Option<u64>,
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = BridgeConfig::from_env().into_diagnostic()?;
    if args.poll {
        config.poll.enabled = true;
    }
    if let Some(ms) = args.poll_interval_ms {
        config.poll.interval = Duration::from_millis(ms);
    }

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await
        .into_diagnostic()?;
    ensure_schema(&pool).await.into_diagnostic()?;

    let bridge = Arc::new(LabelerBridge::new(
        reqwest::Client::new(),
        Arc::new(FileCredentialStore::new(&config.credentials_file)),
        Arc::new(PgSyncStateStore::new(pool.clone())),
        Arc::new(PgMappingStore::new(pool.clone())),
        Arc::new(PgAuditStore::new(pool)),
    ));

    let supervisor = PollSupervisor::new(bridge, Arc::new(LogReviewQueue), config.poll);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("shutdown requested");
            let _ = shutdown_tx.send(true);
        }
    });

    supervisor.run(shutdown_rx).await;

    Ok(())
}

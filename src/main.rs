use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use sorriso::api::server::start_server;
use sorriso::notifications;
use sorriso::state::AppState;
use sorriso::{config, db};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    let data_dir = config::app_data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let db_path = config::database_path();
    // Open once at startup so migration failures abort before serving.
    db::open_database(&db_path)?;
    tracing::info!(path = %db_path.display(), "database ready");

    let state = Arc::new(AppState::new(db_path));

    let poller = notifications::spawn_poller(Arc::clone(&state.notifications));
    let server = start_server(Arc::clone(&state), config::bind_addr()).await?;
    tracing::info!(version = config::APP_VERSION, "{} started", config::APP_NAME);

    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    poller.abort();
    server.shutdown().await;
    Ok(())
}

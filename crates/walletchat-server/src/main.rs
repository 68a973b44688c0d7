mod config;

use std::sync::Arc;

use tracing::info;

use walletchat_api::{AppState, AppStateInner, build_router};
use walletchat_db::Database;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "walletchat=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;

    // Init database
    let db = Database::open(&config.db_path)?;

    let state: AppState = Arc::new(AppStateInner {
        db,
        default_community: config.default_community.clone(),
    });
    let app = build_router(state);

    let addr = config.addr()?;
    info!(
        "WalletChat server listening on {} (default community '{}')",
        addr, config.default_community.address
    );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use polls_backend::config::Config;
use polls_backend::db::{self, InMemoryPollRepository, PgPollRepository, PollRepository};
use polls_backend::startup::{AppState, build_router, spawn_pool_health_check};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::load()?;

    let repo: Arc<dyn PollRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = db::init_db(database_url, config.db_max_connections).await?;
            info!("{}", db::pool_stats(&pool));
            spawn_pool_health_check(pool.clone());
            Arc::new(PgPollRepository::new(pool))
        }
        None => {
            warn!("DATABASE_URL not set, questions are kept in memory only");
            Arc::new(InMemoryPollRepository::new())
        }
    };

    let app = build_router(AppState::new(repo));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

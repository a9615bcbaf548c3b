use crate::db::{DbPool, PollRepository, pool_stats};
use crate::polls;
use crate::sse::{self, EventSender, create_event_broadcaster};
use axum::{
    Router,
    extract::Extension,
    http::{
        StatusCode,
        header::{ACCEPT, CONTENT_TYPE},
    },
    response::IntoResponse,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::time::{Duration, interval};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{debug, error};

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<dyn PollRepository>,
    pub events: EventSender,
}

impl AppState {
    pub fn new(repo: Arc<dyn PollRepository>) -> Self {
        AppState {
            repo,
            events: create_event_broadcaster(),
        }
    }
}

/// Periodically checks out a connection so a dead database shows up in the
/// logs before the next request hits it.
pub fn spawn_pool_health_check(pool: DbPool) {
    tokio::spawn(async move {
        let mut interval = interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            match pool.acquire().await {
                Ok(conn) => {
                    drop(conn);
                    debug!("{}", pool_stats(&pool));
                }
                Err(e) => {
                    error!("Database connection health check failed: {}", e);
                }
            }
        }
    });
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/polls", get(polls::index).post(polls::create_question))
        .route(
            "/polls/:question_id",
            get(polls::detail).delete(polls::delete_question),
        )
        .route("/polls/:question_id/choices", post(polls::add_choice))
        .route("/polls/:question_id/results", get(polls::results))
        .route("/polls/:question_id/results/stream", get(sse::results_sse))
        .route("/polls/:question_id/vote", post(polls::vote))
        .fallback(handler_404)
        .layer(Extension(app_state))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::mirror_request())
                .allow_credentials(true)
                .allow_methods([
                    axum::http::Method::POST,
                    axum::http::Method::GET,
                    axum::http::Method::DELETE,
                    axum::http::Method::OPTIONS,
                ])
                .allow_headers([CONTENT_TYPE, ACCEPT]),
        )
}

async fn handler_404() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "nothing to see here")
}

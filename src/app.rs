use axum::Router;
use tower_http::cors::CorsLayer;

use crate::routes::{benchmark, buckets, funds, health, portfolio};
use crate::state::AppState;

pub fn create_app(state: AppState) -> Router {
    Router::<AppState>::new()
        .nest("/health", health::router())
        .nest("/api/buckets", buckets::router())
        .nest("/api/benchmark", benchmark::router())
        .nest("/api/funds", funds::router())
        .nest("/api/portfolio", portfolio::router())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

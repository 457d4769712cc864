//! API Route Configuration

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware};
use crate::utils::clock::Clock;

/// Create the API router with all routes and middleware
pub fn create_router<C>(state: Arc<AppState<C>>) -> Router
where
    C: Clock + Send + Sync + 'static,
{
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let api_v1 = Router::new()
        // Health & Status
        .route("/health", get(handlers::health_check::<C>))
        .route("/stats", get(handlers::get_stats::<C>))
        // Ledger
        .route("/token", get(handlers::token_info::<C>))
        .route("/balance/:address", get(handlers::get_balance::<C>))
        .route("/allowance/:owner/:spender", get(handlers::get_allowance::<C>))
        .route("/transfer", post(handlers::transfer::<C>))
        .route("/approve", post(handlers::approve::<C>))
        .route("/transfer-from", post(handlers::transfer_from::<C>))
        .route("/events", get(handlers::get_events::<C>))
        // Vesting
        .route("/unlock/:pool", post(handlers::unlock::<C>))
        .route("/vesting/:pool", get(handlers::get_vesting::<C>));

    Router::new()
        .nest("/v1", api_v1)
        .route("/health", get(handlers::health_check::<C>))
        .with_state(state)
        // Middleware (order matters - bottom runs first)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
}

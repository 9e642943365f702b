pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod geo;
pub mod handlers;
pub mod locator;
pub mod models;
pub mod seed;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub use config::Config;
pub use db::Database;

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub verified_threshold: i64,
}

impl AppState {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            verified_threshold: config::DEFAULT_VERIFIED_THRESHOLD,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Accounts
        .route("/users/create", post(handlers::create_user))
        .route("/users/auth", get(handlers::auth_user))
        // Public campus data
        .route("/api/buildings", get(handlers::list_buildings))
        .route("/api/resources", get(handlers::list_resources))
        .route("/api/find-closest", get(handlers::find_closest))
        // Community submissions
        .route(
            "/api/submissions",
            get(handlers::list_submissions).post(handlers::create_submission),
        )
        .route("/api/submissions/{id}/vote", post(handlers::vote_submission))
        .route("/api/submissions/{id}/comment", post(handlers::comment_submission))
        // Health check
        .route("/healthcheck", get(handlers::healthcheck))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::guide::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/process-guide", post(handlers::handle_process_guide))
        .with_state(state)
}

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/providers", post(handlers::provider::create_provider))
        .route("/api/providers/:id", get(handlers::provider::get_provider))
        .route(
            "/api/providers/:id/verify",
            post(handlers::provider::verify_password),
        )
}

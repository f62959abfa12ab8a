use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/api/slots/generate", post(handlers::availability::generate_slots))
        .route(
            "/api/providers/:id/availability/:date",
            get(handlers::availability::get_availability)
                .put(handlers::availability::save_availability),
        )
        .route(
            "/api/providers/:id/availability/:date/open",
            get(handlers::availability::open_slots),
        )
        .route(
            "/api/providers/:id/availability/:date/events",
            get(handlers::availability::availability_events),
        )
        .route(
            "/api/providers/:id/availability/:date/slots/:slot_id/status",
            post(handlers::availability::set_slot_status),
        )
        .route(
            "/api/providers/:id/availability/:date/slots/:slot_id",
            delete(handlers::availability::delete_slot),
        )
}

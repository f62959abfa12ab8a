use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{handlers, ApiState};

pub fn routes() -> Router<Arc<ApiState>> {
    Router::new()
        .route(
            "/api/providers/:id/availability/:date/bookings",
            post(handlers::booking::book_slot),
        )
        .route("/api/providers/:id/bookings", get(handlers::booking::list_bookings))
        .route(
            "/api/providers/:id/notifications",
            get(handlers::booking::list_notifications),
        )
        .route(
            "/api/providers/:id/notifications/:notification_id/read",
            post(handlers::booking::mark_notification_read),
        )
}

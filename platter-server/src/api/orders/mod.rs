//! Order API Module
//!
//! | Path | Method | Description |
//! |------|--------|-------------|
//! | /api/orders | GET | list a portal's orders (`portalId`, `status`, `limit`, `offset`) |
//! | /api/orders | POST | create an order |
//! | /api/orders/bulk/status | PATCH | set one status on many orders |
//! | /api/orders/stats/{portal_id} | GET | statistics (`startDate`, `endDate`) |
//! | /api/orders/{id} | GET | fetch one order |
//! | /api/orders/{id}/status | PATCH | update status |
//! | /api/orders/{id}/payment | PATCH | update payment status |
//! | /api/orders/{id}/cancel | POST | cancel |

mod handler;


use axum::{
    Router,
    routing::{get, patch, post},
};

use crate::core::ServerState;

/// Order router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/orders", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list).post(handler::create))
        .route("/bulk/status", patch(handler::bulk_update_status))
        .route("/stats/{portal_id}", get(handler::stats))
        .route("/{id}", get(handler::get_by_id))
        .route("/{id}/status", patch(handler::update_status))
        .route("/{id}/payment", patch(handler::update_payment))
        .route("/{id}/cancel", post(handler::cancel))
}

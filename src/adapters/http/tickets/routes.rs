//! HTTP routes for the ticket endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{create_ticket, get_ticket, sla_report, update_ticket, TicketHandlers};

/// Creates the ticket router.
///
/// # Routes
///
/// - `POST /api/tickets`
/// - `GET /api/tickets/:id`
/// - `PUT /api/tickets/:id` (agent)
/// - `GET /api/sla/tickets` (agent)
pub fn ticket_routes(handlers: TicketHandlers) -> Router {
    Router::new()
        .route("/api/tickets", post(create_ticket))
        .route("/api/tickets/:id", get(get_ticket).put(update_ticket))
        .route("/api/sla/tickets", get(sla_report))
        .with_state(handlers)
}

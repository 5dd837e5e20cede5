//! HTTP adapter for ticket endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CreateTicketRequest, CreateTicketResponse, SlaEventResponse, SlaReportResponse,
    StatusTransitionResponse, TicketDetailsResponse, TicketMessageResponse, TicketResponse,
    UpdateTicketRequest,
};
pub use handlers::TicketHandlers;
pub use routes::ticket_routes;

//! HTTP adapters - REST API implementations.
//!
//! Each endpoint group has its own module with dto, handlers and routes;
//! `router` stitches them together.

pub mod chat;
pub mod error;
pub mod middleware;
pub mod router;
pub mod tickets;

pub use chat::{chat_routes, ChatHandlers};
pub use error::{ApiError, ErrorResponse};
pub use router::{build_router, HttpSettings};
pub use tickets::{ticket_routes, TicketHandlers};

//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresConversationStore` - Authoritative transcript storage
//! - `PostgresTicketRepository` - Tickets, transitions and threads

mod conversation_store;
mod ticket_repository;

pub use conversation_store::PostgresConversationStore;
pub use ticket_repository::PostgresTicketRepository;

use crate::ports::StoreError;

/// Maps driver failures onto the store taxonomy.
///
/// Uniqueness violations are conflicts; pool exhaustion, I/O and anything
/// else the driver reports make the store unavailable for this request.
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::conflict(format!("Failed to {}: {}", operation, db.message()))
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::corrupt(format!("Failed to {}: {}", operation, err))
        }
        _ => StoreError::unavailable(format!("Failed to {}: {}", operation, err)),
    }
}

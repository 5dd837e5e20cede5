//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Text generation backends (Gemini, mock)
//! - `auth` - Session validation (JWT, mock)
//! - `http` - axum REST surface
//! - `memory` - In-memory stores and cache for tests and local runs
//! - `notification` - Ticket notifiers
//! - `postgres` - Authoritative conversation and ticket stores
//! - `redis` - Conversation transcript cache

pub mod ai;
pub mod auth;
pub mod http;
pub mod memory;
pub mod notification;
pub mod postgres;
pub mod redis;

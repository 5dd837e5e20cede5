//! HTTP middleware for axum.
//!
//! - `auth` - Authentication middleware and extractors

pub mod auth;

pub use auth::{
    auth_middleware, resolve_caller, AuthRejection, AuthState, OptionalAuth, RequireAgent,
    RequireAuth,
};

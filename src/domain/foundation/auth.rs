//! Authentication types for the domain layer.
//!
//! The auth provider is an external collaborator. Whatever validates the
//! bearer credential hands the core an `AuthenticatedUser`, which is passed
//! explicitly into every operation that needs to know who is calling.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::UserId;

/// What the caller is allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallerRole {
    /// End user asking questions and filing tickets.
    #[default]
    User,
    /// Support agent; may update any ticket.
    Agent,
}

impl fmt::Display for CallerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallerRole::User => write!(f, "user"),
            CallerRole::Agent => write!(f, "agent"),
        }
    }
}

/// Identity of the caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// The unique user identifier from the auth provider.
    pub id: UserId,

    /// Role granted by the auth provider.
    pub role: CallerRole,
}

impl AuthenticatedUser {
    /// Creates an end-user identity.
    pub fn user(id: UserId) -> Self {
        Self {
            id,
            role: CallerRole::User,
        }
    }

    /// Creates a support-agent identity.
    pub fn agent(id: UserId) -> Self {
        Self {
            id,
            role: CallerRole::Agent,
        }
    }

    pub fn is_agent(&self) -> bool {
        self.role == CallerRole::Agent
    }
}

/// Authentication errors that can occur during token validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The token is missing, malformed, or has an invalid signature.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// The token has expired.
    #[error("Token expired")]
    TokenExpired,

    /// The authentication service is unavailable (network, config, etc.).
    #[error("Auth service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Creates a service unavailable error with a message.
    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::ServiceUnavailable(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn agent_constructor_sets_role() {
        let agent = AuthenticatedUser::agent(UserId::new("agent-7").unwrap());
        assert!(agent.is_agent());

        let user = AuthenticatedUser::user(UserId::new("alice").unwrap());
        assert!(!user.is_agent());
    }

    #[test]
    fn role_deserializes_lowercase() {
        let role: CallerRole = serde_json::from_str("\"agent\"").unwrap();
        assert_eq!(role, CallerRole::Agent);
        assert_eq!(CallerRole::default(), CallerRole::User);
    }
}

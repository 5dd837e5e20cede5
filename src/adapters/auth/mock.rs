//! Fixed-token session validator for tests and local development.
//!
//! ```ignore
//! let validator = MockSessionValidator::new()
//!     .with_user("user-token", "alice")
//!     .with_agent("agent-token", "agent-7");
//! ```

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Token table built up front. Unknown tokens are `InvalidToken`; an outage
/// set with [`unavailable`](Self::unavailable) overrides every lookup.
#[derive(Debug, Default, Clone)]
pub struct MockSessionValidator {
    callers: HashMap<String, AuthenticatedUser>,
    outage: Option<String>,
}

impl MockSessionValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_caller(mut self, token: impl Into<String>, caller: AuthenticatedUser) -> Self {
        self.callers.insert(token.into(), caller);
        self
    }

    /// Blank ids are skipped.
    pub fn with_user(self, token: impl Into<String>, user_id: &str) -> Self {
        match UserId::new(user_id) {
            Ok(id) => self.with_caller(token, AuthenticatedUser::user(id)),
            Err(_) => self,
        }
    }

    /// Blank ids are skipped.
    pub fn with_agent(self, token: impl Into<String>, user_id: &str) -> Self {
        match UserId::new(user_id) {
            Ok(id) => self.with_caller(token, AuthenticatedUser::agent(id)),
            Err(_) => self,
        }
    }

    pub fn unavailable(mut self, reason: impl Into<String>) -> Self {
        self.outage = Some(reason.into());
        self
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        if let Some(reason) = &self.outage {
            return Err(AuthError::service_unavailable(reason.clone()));
        }
        self.callers
            .get(token)
            .cloned()
            .ok_or(AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tokens_resolve_to_their_roles() {
        let validator = MockSessionValidator::new()
            .with_user("u", "alice")
            .with_agent("a", "agent-7")
            .with_user("blank", "  ");

        assert!(!validator.validate("u").await.unwrap().is_agent());
        assert!(validator.validate("a").await.unwrap().is_agent());
        assert_eq!(
            validator.validate("blank").await.unwrap_err(),
            AuthError::InvalidToken
        );
    }

    #[tokio::test]
    async fn outage_overrides_known_tokens() {
        let validator = MockSessionValidator::new()
            .with_user("u", "alice")
            .unavailable("issuer down");

        assert_eq!(
            validator.validate("u").await.unwrap_err(),
            AuthError::ServiceUnavailable("issuer down".to_string())
        );
    }
}

//! Bearer token verification.
//!
//! Tokens are issued elsewhere; this crate only checks them and turns the
//! claims into an [`AuthenticatedUser`]. Implementations verify the signature,
//! the expiry, and the issuer when one is configured.

use async_trait::async_trait;

use crate::domain::foundation::{AuthError, AuthenticatedUser};

/// Resolves a raw bearer token (no `Bearer ` prefix) to the caller.
///
/// A bad signature or malformed token is `InvalidToken`, an elapsed `exp` is
/// `TokenExpired`, and anything transient is `ServiceUnavailable`. The role
/// claim decides whether the caller acts as an agent.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::UserId;

    /// Accepts exactly one token and reports an outage for `"down"`.
    struct SingleToken;

    #[async_trait]
    impl SessionValidator for SingleToken {
        async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
            match token {
                "desk-agent" => Ok(AuthenticatedUser::agent(UserId::new("agent-1").unwrap())),
                "down" => Err(AuthError::service_unavailable("issuer unreachable")),
                _ => Err(AuthError::InvalidToken),
            }
        }
    }

    #[tokio::test]
    async fn validator_is_usable_behind_a_trait_object() {
        let validator: Box<dyn SessionValidator> = Box::new(SingleToken);

        let caller = validator.validate("desk-agent").await.unwrap();
        assert_eq!(caller.id.as_str(), "agent-1");
        assert!(caller.is_agent());

        assert_eq!(
            validator.validate("forged").await.unwrap_err(),
            AuthError::InvalidToken
        );
        assert!(matches!(
            validator.validate("down").await,
            Err(AuthError::ServiceUnavailable(_))
        ));
    }
}

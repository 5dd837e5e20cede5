//! HS256 JWT adapter for session validation.
//!
//! Validates bearer tokens signed with a shared secret:
//!
//! 1. Signature (HS256) against the configured secret
//! 2. Expiry, and issuer when one is configured
//! 3. Maps `sub` to the user id and the `role` claim to `CallerRole`
//!
//! # Example
//!
//! ```ignore
//! let validator = JwtSessionValidator::new(
//!     JwtConfig::new(secret).with_issuer("https://auth.example.com"),
//! );
//! let caller = validator.validate("eyJ...").await?;
//! ```

use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, AuthenticatedUser, UserId};
use crate::ports::SessionValidator;

/// Role claim value that grants agent access unless overridden.
pub const DEFAULT_AGENT_ROLE: &str = "agent";

#[derive(Debug, Clone)]
pub struct JwtConfig {
    secret: Secret<String>,
    /// Expected `iss`; not checked when `None`.
    pub issuer: Option<String>,
    /// `role` value that marks a support agent.
    pub agent_role: String,
}

impl JwtConfig {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: Secret::new(secret.into()),
            issuer: None,
            agent_role: DEFAULT_AGENT_ROLE.to_string(),
        }
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_agent_role(mut self, role: impl Into<String>) -> Self {
        self.agent_role = role.into();
        self
    }
}

/// Claims carried by support-desk tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

pub struct JwtSessionValidator {
    config: JwtConfig,
    decoding_key: DecodingKey,
}

impl JwtSessionValidator {
    pub fn new(config: JwtConfig) -> Self {
        let decoding_key = DecodingKey::from_secret(config.secret.expose_secret().as_bytes());
        Self {
            config,
            decoding_key,
        }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);
        if let Some(issuer) = &self.config.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }

    fn is_agent(&self, claims: &SessionClaims) -> bool {
        let expected = self.config.agent_role.as_str();
        claims.role.as_deref() == Some(expected) || claims.roles.iter().any(|r| r == expected)
    }
}

#[async_trait]
impl SessionValidator for JwtSessionValidator {
    async fn validate(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let data = decode::<SessionClaims>(token, &self.decoding_key, &self.validation()).map_err(
            |e| {
                use jsonwebtoken::errors::ErrorKind;
                match e.kind() {
                    ErrorKind::ExpiredSignature => {
                        tracing::debug!("Token expired");
                        AuthError::TokenExpired
                    }
                    ErrorKind::InvalidIssuer => {
                        tracing::warn!("Invalid issuer in token");
                        AuthError::InvalidToken
                    }
                    _ => {
                        tracing::warn!("Token validation failed: {}", e);
                        AuthError::InvalidToken
                    }
                }
            },
        )?;
        let claims = data.claims;

        let user_id = UserId::new(&claims.sub).map_err(|_| {
            tracing::warn!("Token carries a blank subject");
            AuthError::InvalidToken
        })?;

        if self.is_agent(&claims) {
            Ok(AuthenticatedUser::agent(user_id))
        } else {
            Ok(AuthenticatedUser::user(user_id))
        }
    }
}

impl std::fmt::Debug for JwtSessionValidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtSessionValidator")
            .field("issuer", &self.config.issuer)
            .field("agent_role", &self.config.agent_role)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret-with-enough-entropy";

    fn token(claims: &SessionClaims, secret: &str) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(sub: &str, role: Option<&str>, exp_offset: i64) -> SessionClaims {
        SessionClaims {
            sub: sub.to_string(),
            exp: chrono::Utc::now().timestamp() + exp_offset,
            iss: Some("support-desk-tests".to_string()),
            role: role.map(str::to_string),
            roles: Vec::new(),
        }
    }

    fn validator() -> JwtSessionValidator {
        JwtSessionValidator::new(JwtConfig::new(SECRET).with_issuer("support-desk-tests"))
    }

    #[tokio::test]
    async fn valid_user_token() {
        let caller = validator()
            .validate(&token(&claims("alice", None, 3600), SECRET))
            .await
            .unwrap();
        assert_eq!(caller.id.as_str(), "alice");
        assert!(!caller.is_agent());
    }

    #[tokio::test]
    async fn agent_role_claim_marks_agent() {
        let caller = validator()
            .validate(&token(&claims("agent-7", Some("agent"), 3600), SECRET))
            .await
            .unwrap();
        assert!(caller.is_agent());
    }

    #[tokio::test]
    async fn roles_array_is_also_honoured() {
        let mut c = claims("agent-8", None, 3600);
        c.roles = vec!["reader".into(), "agent".into()];
        assert!(validator().validate(&token(&c, SECRET)).await.unwrap().is_agent());
    }

    #[tokio::test]
    async fn expired_token_is_reported() {
        let result = validator()
            .validate(&token(&claims("alice", None, -3600), SECRET))
            .await;
        assert!(matches!(result, Err(AuthError::TokenExpired)));
    }

    #[tokio::test]
    async fn wrong_secret_is_invalid() {
        let result = validator()
            .validate(&token(&claims("alice", None, 3600), "other-secret"))
            .await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }

    #[tokio::test]
    async fn wrong_issuer_is_invalid() {
        let mut c = claims("alice", None, 3600);
        c.iss = Some("someone-else".into());
        let result = validator().validate(&token(&c, SECRET)).await;
        assert!(matches!(result, Err(AuthError::InvalidToken)));
    }
}

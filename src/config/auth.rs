//! Authentication configuration (HS256 session tokens)

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;
use super::server::Environment;

const MIN_PRODUCTION_SECRET_BYTES: usize = 32;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Shared HS256 signing secret
    pub jwt_secret: Secret<String>,

    /// Expected `iss` claim; unchecked when absent
    pub issuer: Option<String>,

    /// Role claim value that grants agent access
    #[serde(default = "default_agent_role")]
    pub agent_role: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    ///
    /// Production requires a secret of at least 32 bytes.
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        let secret = self.jwt_secret.expose_secret();
        if secret.is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__JWT_SECRET"));
        }
        if *environment == Environment::Production && secret.len() < MIN_PRODUCTION_SECRET_BYTES {
            return Err(ValidationError::WeakJwtSecret);
        }
        if self.agent_role.trim().is_empty() {
            return Err(ValidationError::MissingRequired("AUTH__AGENT_ROLE"));
        }
        Ok(())
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: Secret::new(String::new()),
            issuer: None,
            agent_role: default_agent_role(),
        }
    }
}

fn default_agent_role() -> String {
    "agent".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_secret(secret: &str) -> AuthConfig {
        AuthConfig {
            jwt_secret: Secret::new(secret.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_secret() {
        assert!(AuthConfig::default()
            .validate(&Environment::Development)
            .is_err());
    }

    #[test]
    fn test_short_secret_only_allowed_outside_production() {
        let config = with_secret("dev-secret");
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::WeakJwtSecret)
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = with_secret("super-secret-value-that-is-long-enough");
        assert!(!format!("{:?}", config).contains("super-secret"));
    }
}

//! Runtime settings for the support desk.
//!
//! Everything comes from `SUPPORT_DESK__<SECTION>__<FIELD>` environment
//! variables (a `.env` file is read first when present). Only
//! `DATABASE__URL`, `REDIS__URL` and `AUTH__JWT_SECRET` are mandatory; every
//! other section falls back to its `Default`.
//!
//! ```no_run
//! use support_desk::config::AppConfig;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::load()?;
//! config.validate()?;
//! # Ok(())
//! # }
//! ```

mod auth;
mod conversation;
mod database;
mod error;
mod escalation;
mod faq;
mod generation;
mod redis;
mod server;

pub use auth::AuthConfig;
pub use conversation::ConversationConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use escalation::EscalationConfig;
pub use faq::FaqSettings;
pub use generation::{GenerationConfig, GenerationProvider};
pub use redis::RedisConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// All sections, as deserialized from the environment.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// Authoritative conversation and ticket store
    pub database: DatabaseConfig,

    /// Redis configuration (transcript cache)
    pub redis: RedisConfig,

    /// Session token verification
    pub auth: AuthConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub conversation: ConversationConfig,

    #[serde(default)]
    pub escalation: EscalationConfig,

    #[serde(default)]
    pub faq: FaqSettings,
}

impl AppConfig {
    /// Reads the environment, e.g. `SUPPORT_DESK__SERVER__PORT=8080` sets
    /// `server.port`. Fails when a mandatory variable is missing or a value
    /// does not parse; range checks happen in [`validate`](Self::validate).
    pub fn load() -> Result<Self, ConfigError> {
        // a missing .env is normal outside development
        let _ = dotenvy::dotenv();

        let settings = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SUPPORT_DESK")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    /// Checks every section; the first problem found is returned.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.redis.validate()?;
        self.auth.validate(&self.server.environment)?;
        self.generation.validate()?;
        self.conversation.validate()?;
        self.escalation.validate()?;
        self.faq.validate()?;

        // `ask`, apology included, has to finish inside the router timeout
        if self.generation.timeout_secs >= self.server.request_timeout_secs {
            return Err(ValidationError::GenerationOutlastsRequest {
                generation_secs: self.generation.timeout_secs,
                request_secs: self.server.request_timeout_secs,
            });
        }
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

//! Configuration error types

use thiserror::Error;

/// Loading or validating `AppConfig` failed
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("configuration rejected: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded value that is present but unusable
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required setting SUPPORT_DESK__{0}")]
    MissingRequired(&'static str),

    #[error("port must be non-zero")]
    InvalidPort,

    #[error("'{0}' is not a valid listen address")]
    InvalidSocketAddress(String),

    #[error("request timeout must be between 1 and 300 seconds")]
    InvalidTimeout,

    #[error("database URL must start with postgres:// or postgresql://")]
    InvalidDatabaseUrl,

    #[error("redis URL must start with redis:// or rediss://")]
    InvalidRedisUrl,

    #[error("cache key prefix '{0}' must be non-empty and contain no whitespace")]
    InvalidKeyPrefix(String),

    #[error("database min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("database pool is limited to 100 connections")]
    PoolSizeTooLarge,

    #[error("JWT secret must be at least 32 bytes in production")]
    WeakJwtSecret,

    #[error("generation temperature must be within 0.0..=2.0")]
    InvalidTemperature,

    #[error(
        "generation timeout ({generation_secs}s) must be shorter than the request timeout ({request_secs}s)"
    )]
    GenerationOutlastsRequest {
        generation_secs: u64,
        request_secs: u64,
    },

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

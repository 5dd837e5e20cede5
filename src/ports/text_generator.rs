//! Text generation port - interface to the external answer generator.
//!
//! The backend's loosely-typed response is wrapped at the adapter boundary
//! in a [`GenerationEnvelope`]; the core only ever sees
//! `Result<String, GenerationError>`.
//!
//! # Example
//!
//! ```ignore
//! struct Echo;
//!
//! #[async_trait]
//! impl TextGenerator for Echo {
//!     async fn generate(&self, prompt: &str) -> Result<String, GenerationError> {
//!         Ok(prompt.to_string())
//!     }
//!
//!     fn provider_name(&self) -> &str {
//!         "echo"
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Port for answer generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate an answer for a fully assembled prompt.
    async fn generate(&self, prompt: &str) -> Result<String, GenerationError>;

    /// Short provider name for logs.
    fn provider_name(&self) -> &str;
}

/// Failure modes of the generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// No answer within the configured bound.
    #[error("generation timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Backend unreachable or returned a server error.
    #[error("generation backend unavailable: {0}")]
    Unavailable(String),

    /// Backend refused the request (auth, quota, blocked content).
    #[error("generation rejected: {0}")]
    Rejected(String),

    /// Backend answered without any text.
    #[error("generation returned an empty response")]
    EmptyResponse,

    /// Backend answered with something we could not read.
    #[error("could not parse generation response: {0}")]
    Parse(String),
}

impl GenerationError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GenerationError::Timeout { .. })
    }
}

/// Typed view of a generation backend reply: either text or an error message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationEnvelope {
    pub text: Option<String>,
    pub error: Option<String>,
}

impl GenerationEnvelope {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            text: None,
            error: Some(message.into()),
        }
    }

    /// An error wins over text; blank text counts as empty.
    pub fn into_result(self) -> Result<String, GenerationError> {
        if let Some(error) = self.error {
            return Err(GenerationError::Rejected(error));
        }
        match self.text {
            Some(text) if !text.trim().is_empty() => Ok(text.trim().to_string()),
            _ => Err(GenerationError::EmptyResponse),
        }
    }
}

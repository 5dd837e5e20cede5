//! Conversation coordinator configuration

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::CoordinatorConfig;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Transcript cache TTL in seconds
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,

    /// Prior messages sent to the generator
    #[serde(default = "default_context_window")]
    pub context_window: usize,

    #[serde(default = "default_title_max_chars")]
    pub title_max_chars: usize,

    /// YAML file replacing the built-in domain catalog
    pub domain_catalog_path: Option<PathBuf>,
}

impl ConversationConfig {
    /// Coordinator settings; the generation timeout comes from the
    /// generation section.
    pub fn coordinator(&self, generation_timeout: Duration) -> CoordinatorConfig {
        CoordinatorConfig::default()
            .with_cache_ttl(Duration::from_secs(self.cache_ttl_secs))
            .with_context_window(self.context_window)
            .with_title_max_chars(self.title_max_chars)
            .with_generation_timeout(generation_timeout)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.cache_ttl_secs == 0 {
            return Err(ValidationError::MustBePositive("conversation.cache_ttl_secs"));
        }
        if self.title_max_chars == 0 {
            return Err(ValidationError::MustBePositive("conversation.title_max_chars"));
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: default_cache_ttl(),
            context_window: default_context_window(),
            title_max_chars: default_title_max_chars(),
            domain_catalog_path: None,
        }
    }
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

fn default_context_window() -> usize {
    6
}

fn default_title_max_chars() -> usize {
    60
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinator_mapping() {
        let config = ConversationConfig {
            context_window: 4,
            ..Default::default()
        };
        let coordinator = config.coordinator(Duration::from_secs(15));

        assert_eq!(coordinator.context_window, 4);
        assert_eq!(coordinator.cache_ttl, Duration::from_secs(86_400));
        assert_eq!(coordinator.title_max_chars, 60);
        assert_eq!(coordinator.generation_timeout, Duration::from_secs(15));
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let config = ConversationConfig {
            cache_ttl_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

//! FAQ suggestion configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::FaqConfig;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct FaqSettings {
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Recent user questions sampled per derivation
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl FaqSettings {
    pub fn cache(&self) -> FaqConfig {
        FaqConfig {
            ttl: Duration::from_secs(self.ttl_secs),
            max_suggestions: self.max_suggestions,
            sample_size: self.sample_size,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_suggestions == 0 {
            return Err(ValidationError::MustBePositive("faq.max_suggestions"));
        }
        if self.sample_size == 0 {
            return Err(ValidationError::MustBePositive("faq.sample_size"));
        }
        Ok(())
    }
}

impl Default for FaqSettings {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
            max_suggestions: default_max_suggestions(),
            sample_size: default_sample_size(),
        }
    }
}

fn default_ttl() -> u64 {
    300
}

fn default_max_suggestions() -> usize {
    6
}

fn default_sample_size() -> usize {
    200
}

//! SLA escalation sweep configuration

use serde::Deserialize;
use std::time::Duration;

use crate::application::EscalationWatcherConfig;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct EscalationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl EscalationConfig {
    pub fn watcher(&self) -> EscalationWatcherConfig {
        EscalationWatcherConfig::default()
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
            .with_batch_size(self.batch_size)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::MustBePositive("escalation.sweep_interval_secs"));
        }
        if self.batch_size == 0 {
            return Err(ValidationError::MustBePositive("escalation.batch_size"));
        }
        Ok(())
    }
}

impl Default for EscalationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            sweep_interval_secs: default_sweep_interval(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_batch_size() -> usize {
    500
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_watcher() {
        let watcher = EscalationConfig::default().watcher();
        assert_eq!(watcher.sweep_interval, Duration::from_secs(300));
        assert_eq!(watcher.batch_size, 500);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = EscalationConfig {
            sweep_interval_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}

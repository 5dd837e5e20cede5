//! Ticket priority and its SLA window.

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Urgency of a ticket. Fixes the SLA window at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
    Urgent,
}

impl Priority {
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    /// Time allowed between creation and the SLA deadline.
    pub fn sla_window(&self) -> Duration {
        match self {
            Priority::Urgent => Duration::hours(2),
            Priority::High => Duration::hours(4),
            Priority::Medium => Duration::hours(8),
            Priority::Low => Duration::hours(24),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    /// Case-insensitive; anything outside the four levels is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "urgent" => Ok(Priority::Urgent),
            "" => Err(ValidationError::empty_field("priority")),
            other => Err(ValidationError::invalid_format(
                "priority",
                format!("'{}' is not one of low, medium, high, urgent", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sla_windows_match_fixed_mapping() {
        assert_eq!(Priority::Urgent.sla_window(), Duration::hours(2));
        assert_eq!(Priority::High.sla_window(), Duration::hours(4));
        assert_eq!(Priority::Medium.sla_window(), Duration::hours(8));
        assert_eq!(Priority::Low.sla_window(), Duration::hours(24));
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("URGENT".parse::<Priority>().unwrap(), Priority::Urgent);
        assert_eq!(" Medium ".parse::<Priority>().unwrap(), Priority::Medium);
    }

    #[test]
    fn parse_rejects_unknown_and_empty() {
        assert!("critical".parse::<Priority>().is_err());
        assert_eq!(
            "".parse::<Priority>().unwrap_err(),
            ValidationError::empty_field("priority")
        );
    }

    #[test]
    fn every_level_roundtrips_through_str() {
        for p in Priority::ALL {
            assert_eq!(p.as_str().parse::<Priority>().unwrap(), p);
        }
    }
}

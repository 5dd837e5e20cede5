//! State machine trait for status enums.
//!
//! A status enum declares its edges once; validated transitions and path
//! checks come for free.

use super::{DomainError, ErrorCode};

/// Trait for status enums that represent state machines.
///
/// # Example
///
/// ```ignore
/// impl StateMachine for TicketStatus {
///     fn valid_transitions(&self) -> Vec<Self> {
///         match self {
///             Open => vec![InProgress, Escalated],
///             // ... etc
///         }
///     }
/// }
///
/// let next = TicketStatus::Open.transition_to(TicketStatus::InProgress)?;
/// ```
pub trait StateMachine: Sized + Copy + PartialEq + std::fmt::Debug + std::fmt::Display {
    /// Returns all valid target states from current state.
    fn valid_transitions(&self) -> Vec<Self>;

    /// Returns true if transition from self to target is a declared edge.
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    /// Performs transition with validation.
    ///
    /// Returns `INVALID_TRANSITION` with `from`/`to` details if the edge
    /// is not declared. Self-loops are not edges.
    fn transition_to(&self, target: Self) -> Result<Self, DomainError> {
        if self.can_transition_to(&target) {
            Ok(target)
        } else {
            Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Cannot transition from {} to {}", self, target),
            )
            .with_detail("from", self.to_string())
            .with_detail("to", target.to_string()))
        }
    }

    /// Checks if current state is terminal (no valid outgoing transitions).
    fn is_terminal(&self) -> bool {
        self.valid_transitions().is_empty()
    }

    /// True if every consecutive pair in `path` is a declared edge.
    fn is_walk(path: &[Self]) -> bool {
        path.windows(2).all(|pair| pair[0].can_transition_to(&pair[1]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Light {
        Green,
        Amber,
        Red,
        Off,
    }

    impl fmt::Display for Light {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    impl StateMachine for Light {
        fn valid_transitions(&self) -> Vec<Self> {
            use Light::*;
            match self {
                Green => vec![Amber, Off],
                Amber => vec![Red, Off],
                Red => vec![Green, Off],
                Off => vec![],
            }
        }
    }

    #[test]
    fn declared_edge_is_allowed() {
        assert_eq!(Light::Green.transition_to(Light::Amber).unwrap(), Light::Amber);
    }

    #[test]
    fn undeclared_edge_reports_from_and_to() {
        let err = Light::Green.transition_to(Light::Red).unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
        assert_eq!(err.details.get("from"), Some(&"Green".to_string()));
        assert_eq!(err.details.get("to"), Some(&"Red".to_string()));
    }

    #[test]
    fn self_loop_is_rejected() {
        assert!(Light::Amber.transition_to(Light::Amber).is_err());
    }

    #[test]
    fn off_is_terminal() {
        assert!(Light::Off.is_terminal());
        assert!(!Light::Red.is_terminal());
    }

    #[test]
    fn is_walk_checks_every_step() {
        use Light::*;
        assert!(Light::is_walk(&[Green, Amber, Red, Green, Off]));
        assert!(!Light::is_walk(&[Green, Red]));
        assert!(Light::is_walk(&[Green]));
        assert!(Light::is_walk(&[]));
    }
}

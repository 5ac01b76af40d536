//! Order state machine
//!
//! ```text
//! searching → assigned → en_route → arrived → in_progress → completed
//!     │           │          │          │           │
//!     └───────────┴──────────┴──────────┴───────────┴──→ canceled_by_{client,provider}[_with_reason]
//! ```
//!
//! Forward jumps along the happy path are accepted (provider apps may skip
//! `en_route`); backward moves never are. Administrative overrides do not go
//! through this module.

use thiserror::Error;

use super::types::{CancelParty, OrderStatus};
use crate::util::has_text;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("order is already in terminal state {0}")]
    FromTerminal(OrderStatus),

    #[error("cannot move backward from {from} to {to}")]
    Backward { from: OrderStatus, to: OrderStatus },

    #[error("status {0} is not part of the lifecycle")]
    UnknownStatus(OrderStatus),

    #[error("order is already {0}")]
    NoChange(OrderStatus),
}

/// Validate a modeled transition
pub fn validate_transition(from: &OrderStatus, to: &OrderStatus) -> Result<(), TransitionError> {
    if from.is_terminal() {
        return Err(TransitionError::FromTerminal(from.clone()));
    }
    if let OrderStatus::Unknown(_) = from {
        return Err(TransitionError::UnknownStatus(from.clone()));
    }
    if to.is_cancellation() {
        return Ok(());
    }

    let (Some(from_rank), Some(to_rank)) = (from.happy_path_rank(), to.happy_path_rank()) else {
        return Err(TransitionError::UnknownStatus(to.clone()));
    };

    match to_rank.cmp(&from_rank) {
        std::cmp::Ordering::Greater => Ok(()),
        std::cmp::Ordering::Equal => Err(TransitionError::NoChange(to.clone())),
        std::cmp::Ordering::Less => Err(TransitionError::Backward {
            from: from.clone(),
            to: to.clone(),
        }),
    }
}

/// Target status for a cancellation by `party`
///
/// The `_with_reason` variant is chosen iff a non-blank reason was supplied.
pub fn cancellation_target(party: CancelParty, reason: Option<&str>) -> OrderStatus {
    OrderStatus::cancellation(party, has_text(reason))
}

/// Statuses reachable from `from` by a modeled transition
pub fn next_statuses(from: &OrderStatus) -> Vec<OrderStatus> {
    const ALL: [OrderStatus; 10] = [
        OrderStatus::Searching,
        OrderStatus::Assigned,
        OrderStatus::EnRoute,
        OrderStatus::Arrived,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::CanceledByClient,
        OrderStatus::CanceledByClientWithReason,
        OrderStatus::CanceledByProvider,
        OrderStatus::CanceledByProviderWithReason,
    ];
    ALL.into_iter()
        .filter(|to| validate_transition(from, to).is_ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_forward() {
        let path = [
            OrderStatus::Searching,
            OrderStatus::Assigned,
            OrderStatus::EnRoute,
            OrderStatus::Arrived,
            OrderStatus::InProgress,
            OrderStatus::Completed,
        ];
        for pair in path.windows(2) {
            assert!(validate_transition(&pair[0], &pair[1]).is_ok());
        }
    }

    #[test]
    fn test_forward_jump_allowed() {
        assert!(validate_transition(&OrderStatus::Assigned, &OrderStatus::Arrived).is_ok());
    }

    #[test]
    fn test_backward_rejected() {
        let err = validate_transition(&OrderStatus::Arrived, &OrderStatus::Assigned).unwrap_err();
        assert!(matches!(err, TransitionError::Backward { .. }));
        assert_eq!(
            validate_transition(&OrderStatus::Assigned, &OrderStatus::Assigned),
            Err(TransitionError::NoChange(OrderStatus::Assigned))
        );
    }

    #[test]
    fn test_terminal_states_are_final() {
        for terminal in [OrderStatus::Completed, OrderStatus::CanceledByClient] {
            assert!(next_statuses(&terminal).is_empty());
            assert!(matches!(
                validate_transition(&terminal, &OrderStatus::CanceledByProvider),
                Err(TransitionError::FromTerminal(_))
            ));
        }
    }

    #[test]
    fn test_cancellation_from_any_non_terminal() {
        for from in [
            OrderStatus::Searching,
            OrderStatus::Assigned,
            OrderStatus::EnRoute,
            OrderStatus::Arrived,
            OrderStatus::InProgress,
        ] {
            assert!(validate_transition(&from, &OrderStatus::CanceledByProviderWithReason).is_ok());
            assert!(validate_transition(&from, &OrderStatus::CanceledByClient).is_ok());
        }
    }

    #[test]
    fn test_unknown_statuses() {
        let odd = OrderStatus::Unknown("paused".into());
        assert!(matches!(
            validate_transition(&odd, &OrderStatus::Assigned),
            Err(TransitionError::UnknownStatus(_))
        ));
        assert!(matches!(
            validate_transition(&OrderStatus::Searching, &odd),
            Err(TransitionError::UnknownStatus(_))
        ));
    }

    #[test]
    fn test_cancellation_target_reason_selection() {
        assert_eq!(
            cancellation_target(CancelParty::Client, None),
            OrderStatus::CanceledByClient
        );
        assert_eq!(
            cancellation_target(CancelParty::Client, Some("  ")),
            OrderStatus::CanceledByClient
        );
        assert_eq!(
            cancellation_target(CancelParty::Provider, Some("الطريق مغلق")),
            OrderStatus::CanceledByProviderWithReason
        );
    }

    #[test]
    fn test_next_statuses_from_searching() {
        let next = next_statuses(&OrderStatus::Searching);
        assert!(!next.contains(&OrderStatus::Searching));
        assert!(next.contains(&OrderStatus::Assigned));
        assert!(next.contains(&OrderStatus::Completed));
        assert_eq!(next.len(), 9);
    }
}

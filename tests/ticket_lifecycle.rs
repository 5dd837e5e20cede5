//! Integration tests for the ticket lifecycle.
//!
//! Property tests cover the SLA deadline rule and the status graph; the
//! async tests drive `TicketLifecycle` and `EscalationWatcher` through the
//! in-memory repository.

use std::sync::Arc;

use chrono::Duration;
use proptest::prelude::*;

use support_desk::adapters::memory::InMemoryTicketRepository;
use support_desk::adapters::notification::LoggingTicketNotifier;
use support_desk::application::{
    CreateTicketCommand, EscalationWatcher, EscalationWatcherConfig, TicketLifecycle,
    UpdateTicketCommand,
};
use support_desk::domain::conversation::DomainCatalog;
use support_desk::domain::foundation::{DomainSlug, StateMachine, Timestamp, UserId};
use support_desk::domain::ticket::{
    Priority, Sender, Ticket, TicketChanges, TicketError, TicketStatus, TransitionSource,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

fn base_time() -> Timestamp {
    Timestamp::parse_rfc3339("2024-06-01T09:00:00Z").unwrap()
}

fn user(id: &str) -> UserId {
    UserId::new(id).unwrap()
}

fn open_ticket(priority: Priority, now: Timestamp) -> Ticket {
    Ticket::open(
        user("owner"),
        DomainSlug::new("technical-support").unwrap(),
        "VPN drops every hour",
        priority,
        now,
    )
    .unwrap()
}

fn priority_strategy() -> impl Strategy<Value = Priority> {
    prop::sample::select(Priority::ALL.to_vec())
}

fn status_strategy() -> impl Strategy<Value = TicketStatus> {
    prop::sample::select(TicketStatus::ALL.to_vec())
}

struct Desk {
    lifecycle: Arc<TicketLifecycle>,
    notifier: LoggingTicketNotifier,
}

fn desk() -> Desk {
    let notifier = LoggingTicketNotifier::new();
    let lifecycle = Arc::new(TicketLifecycle::new(
        Arc::new(InMemoryTicketRepository::new()),
        Arc::new(notifier.clone()),
        Arc::new(DomainCatalog::builtin()),
    ));
    Desk {
        lifecycle,
        notifier,
    }
}

fn create(priority: &str) -> CreateTicketCommand {
    CreateTicketCommand {
        user_id: user("owner"),
        domain: "Technical Support".to_string(),
        subject: "Laptop will not boot".to_string(),
        priority: priority.to_string(),
    }
}

fn change_status(ticket: &Ticket, status: TicketStatus) -> UpdateTicketCommand {
    UpdateTicketCommand {
        ticket_id: ticket.id(),
        changes: TicketChanges {
            status: Some(status),
            ..Default::default()
        },
        expected_updated_at: None,
    }
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    #[test]
    fn prop_deadline_is_open_time_plus_priority_window(
        priority in priority_strategy(),
        offset_mins in 0i64..(60 * 24 * 365),
    ) {
        let opened = base_time().plus(Duration::minutes(offset_mins));
        let ticket = open_ticket(priority, opened);

        prop_assert_eq!(ticket.sla_deadline(), opened.plus(priority.sla_window()));
        prop_assert_eq!(ticket.status(), TicketStatus::Open);
    }

    #[test]
    fn prop_recorded_path_is_always_a_walk(
        targets in proptest::collection::vec(status_strategy(), 0..24),
    ) {
        let mut ticket = open_ticket(Priority::Medium, base_time());
        let agent = user("agent");
        let mut now = base_time();

        for target in targets {
            now = now.plus(Duration::minutes(1));
            let before = ticket.clone();
            let allowed = ticket.status().can_transition_to(&target);
            let changes = TicketChanges { status: Some(target), ..Default::default() };

            match ticket.apply(&changes, &agent, now) {
                Ok(_) => {
                    prop_assert!(allowed);
                    prop_assert_eq!(ticket.status(), target);
                    prop_assert!(ticket.updated_at().is_after(&before.updated_at()));
                }
                Err(_) => {
                    prop_assert!(!allowed);
                    prop_assert_eq!(&ticket, &before);
                }
            }
        }

        let path = ticket.status_path();
        prop_assert!(TicketStatus::is_walk(&path));
        prop_assert_eq!(path.last().copied(), Some(ticket.status()));
    }

    #[test]
    fn prop_breach_escalates_only_after_deadline(
        priority in priority_strategy(),
        offset_secs in -86_400i64..86_400,
    ) {
        let mut ticket = open_ticket(priority, base_time());
        let now = ticket.sla_deadline().plus(Duration::seconds(offset_secs));

        let escalated = ticket.escalate_for_breach(now).is_some();

        prop_assert_eq!(escalated, offset_secs > 0);
        if escalated {
            prop_assert_eq!(ticket.status(), TicketStatus::Escalated);
            prop_assert_eq!(ticket.transitions()[0].source, TransitionSource::Automatic);
        } else {
            prop_assert_eq!(ticket.status(), TicketStatus::Open);
        }
    }
}

#[test]
fn resolved_is_terminal() {
    assert!(TicketStatus::Resolved.is_terminal());
    for status in TicketStatus::ALL {
        assert!(!status.can_transition_to(&status), "{status} must not loop");
    }
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn full_happy_path_notifies_owner_once() {
    let d = desk();
    let agent = user("agent");
    let ticket = d.lifecycle.create_at(create("high"), base_time()).await.unwrap();
    assert_eq!(ticket.sla_deadline(), base_time().plus(Duration::hours(4)));

    d.lifecycle
        .update(change_status(&ticket, TicketStatus::InProgress), &agent)
        .await
        .unwrap();
    let resolved = d
        .lifecycle
        .update(change_status(&ticket, TicketStatus::Resolved), &agent)
        .await
        .unwrap();

    assert_eq!(resolved.status(), TicketStatus::Resolved);
    assert_eq!(d.notifier.sent_with_notes(), vec![(ticket.id(), None)]);
    assert_eq!(
        resolved.status_path(),
        vec![TicketStatus::Open, TicketStatus::InProgress, TicketStatus::Resolved]
    );
}

#[tokio::test]
async fn resolved_ticket_rejects_further_transitions() {
    let d = desk();
    let agent = user("agent");
    let ticket = d.lifecycle.create(create("low")).await.unwrap();
    d.lifecycle
        .update(change_status(&ticket, TicketStatus::InProgress), &agent)
        .await
        .unwrap();
    d.lifecycle
        .update(change_status(&ticket, TicketStatus::Resolved), &agent)
        .await
        .unwrap();

    let err = d
        .lifecycle
        .update(change_status(&ticket, TicketStatus::InProgress), &agent)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        TicketError::InvalidTransition {
            from: TicketStatus::Resolved,
            to: TicketStatus::InProgress,
        }
    );
}

#[tokio::test]
async fn stale_expected_timestamp_is_conflict() {
    let d = desk();
    let agent = user("agent");
    let ticket = d.lifecycle.create(create("medium")).await.unwrap();
    let seen_at = ticket.updated_at();

    d.lifecycle
        .update(change_status(&ticket, TicketStatus::InProgress), &agent)
        .await
        .unwrap();

    let mut stale = change_status(&ticket, TicketStatus::Escalated);
    stale.expected_updated_at = Some(seen_at);
    let err = d.lifecycle.update(stale, &agent).await.unwrap_err();

    assert_eq!(err, TicketError::ConcurrencyConflict(ticket.id()));
}

#[tokio::test]
async fn agent_note_lands_in_thread() {
    let d = desk();
    let ticket = d.lifecycle.create(create("urgent")).await.unwrap();

    d.lifecycle
        .update(
            UpdateTicketCommand {
                ticket_id: ticket.id(),
                changes: TicketChanges {
                    note: Some("Asked the user to reseat the RAM".to_string()),
                    ..Default::default()
                },
                expected_updated_at: None,
            },
            &user("agent"),
        )
        .await
        .unwrap();

    let details = d.lifecycle.get(ticket.id(), None).await.unwrap();
    let senders: Vec<Sender> = details.thread.iter().map(|m| m.sender).collect();
    assert_eq!(senders, vec![Sender::User, Sender::Agent]);
    assert_eq!(details.ticket.status(), TicketStatus::Open);
}

#[tokio::test]
async fn other_users_cannot_see_ticket() {
    let d = desk();
    let ticket = d.lifecycle.create(create("low")).await.unwrap();

    let err = d
        .lifecycle
        .get(ticket.id(), Some(&user("stranger")))
        .await
        .unwrap_err();
    assert!(matches!(err, TicketError::NotFound(_)));

    assert!(d.lifecycle.get(ticket.id(), Some(&user("owner"))).await.is_ok());
}

// =============================================================================
// Escalation sweep
// =============================================================================

#[tokio::test]
async fn sweep_escalates_overdue_and_reports_them() {
    let d = desk();
    let overdue = d.lifecycle.create_at(create("urgent"), base_time()).await.unwrap();
    let fresh = d
        .lifecycle
        .create_at(create("low"), base_time().plus(Duration::hours(2)))
        .await
        .unwrap();

    let watcher = EscalationWatcher::new(d.lifecycle.clone(), EscalationWatcherConfig::default());
    let outcome = watcher.sweep_at(base_time().plus(Duration::hours(3))).await.unwrap();
    assert_eq!(outcome.escalated, 1);

    let report = d.lifecycle.list_escalations().await.unwrap();
    let ids: Vec<_> = report.breached_tickets.iter().map(|t| t.id()).collect();
    assert_eq!(ids, vec![overdue.id()]);
    assert_eq!(report.sla_events.len(), 1);
    assert_eq!(report.sla_events[0].ticket_id, overdue.id());

    let details = d.lifecycle.get(overdue.id(), None).await.unwrap();
    assert_eq!(details.thread.last().map(|m| m.sender), Some(Sender::System));

    let untouched = d.lifecycle.get(fresh.id(), None).await.unwrap();
    assert_eq!(untouched.ticket.status(), TicketStatus::Open);
}

#[tokio::test]
async fn repeated_sweeps_are_idempotent() {
    let d = desk();
    d.lifecycle.create_at(create("high"), base_time()).await.unwrap();
    let later = base_time().plus(Duration::hours(5));

    let first = d.lifecycle.escalate_overdue(later, 500).await.unwrap();
    let second = d.lifecycle.escalate_overdue(later, 500).await.unwrap();

    assert_eq!(first.escalated, 1);
    assert_eq!(second.escalated, 0);
    assert_eq!(d.lifecycle.list_escalations().await.unwrap().sla_events.len(), 1);
}

#[tokio::test]
async fn escalated_ticket_can_be_picked_up_and_resolved() {
    let d = desk();
    let agent = user("agent");
    let ticket = d.lifecycle.create_at(create("urgent"), base_time()).await.unwrap();
    d.lifecycle
        .escalate_overdue(base_time().plus(Duration::hours(3)), 500)
        .await
        .unwrap();

    d.lifecycle
        .update(change_status(&ticket, TicketStatus::InProgress), &agent)
        .await
        .unwrap();
    let resolved = d
        .lifecycle
        .update(change_status(&ticket, TicketStatus::Resolved), &agent)
        .await
        .unwrap();

    assert_eq!(
        resolved.status_path(),
        vec![
            TicketStatus::Open,
            TicketStatus::Escalated,
            TicketStatus::InProgress,
            TicketStatus::Resolved,
        ]
    );
}

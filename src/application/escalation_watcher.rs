//! EscalationWatcher - periodic SLA breach sweep.
//!
//! Polls rather than scheduling per-ticket timers: every `sweep_interval`
//! it asks the lifecycle to escalate whatever is overdue. A sweep that hits a
//! store outage is logged and retried on the next tick.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `sweep_interval` | 300s | Time between sweeps |
//! | `batch_size` | 500 | Max tickets escalated per sweep |
//!
//! ## Graceful Shutdown
//!
//! On the shutdown signal the watcher runs one final sweep and returns.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::foundation::Timestamp;
use crate::domain::ticket::TicketError;

use super::ticket_lifecycle::{SweepOutcome, TicketLifecycle};

#[derive(Debug, Clone)]
pub struct EscalationWatcherConfig {
    pub sweep_interval: Duration,
    pub batch_size: usize,
}

impl Default for EscalationWatcherConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(300),
            batch_size: 500,
        }
    }
}

impl EscalationWatcherConfig {
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    pub fn with_batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }
}

pub struct EscalationWatcher {
    lifecycle: Arc<TicketLifecycle>,
    config: EscalationWatcherConfig,
}

impl EscalationWatcher {
    pub fn new(lifecycle: Arc<TicketLifecycle>, config: EscalationWatcherConfig) -> Self {
        Self { lifecycle, config }
    }

    /// Sweeps on every tick until `shutdown` flips to `true` or its sender
    /// is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.sweep_interval);
        interval.set_missed_tick_behavior(time::MissedTickBehavior::Delay);

        tracing::info!(
            interval_secs = self.config.sweep_interval.as_secs(),
            batch_size = self.config.batch_size,
            "escalation watcher started"
        );

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        self.sweep_logged().await;
                        tracing::info!("escalation watcher stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    self.sweep_logged().await;
                }
            }
        }
    }

    /// Run exactly one sweep against the current time.
    pub async fn sweep_once(&self) -> Result<SweepOutcome, TicketError> {
        self.sweep_at(Timestamp::now()).await
    }

    pub async fn sweep_at(&self, now: Timestamp) -> Result<SweepOutcome, TicketError> {
        self.lifecycle
            .escalate_overdue(now, self.config.batch_size)
            .await
    }

    async fn sweep_logged(&self) {
        match self.sweep_once().await {
            Ok(outcome) if outcome.scanned > 0 => {
                tracing::info!(
                    scanned = outcome.scanned,
                    escalated = outcome.escalated,
                    skipped = outcome.skipped,
                    "escalation sweep finished"
                );
            }
            Ok(_) => tracing::debug!("escalation sweep found nothing overdue"),
            Err(err) => tracing::warn!(error = %err, "escalation sweep failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryTicketRepository;
    use crate::adapters::notification::LoggingTicketNotifier;
    use crate::application::CreateTicketCommand;
    use crate::domain::conversation::DomainCatalog;
    use crate::domain::foundation::UserId;
    use crate::domain::ticket::{Ticket, TicketStatus};
    use crate::ports::TicketRepository;

    fn lifecycle(repository: &InMemoryTicketRepository) -> Arc<TicketLifecycle> {
        Arc::new(TicketLifecycle::new(
            Arc::new(repository.clone()),
            Arc::new(LoggingTicketNotifier::new()),
            Arc::new(DomainCatalog::builtin()),
        ))
    }

    async fn overdue_ticket(lifecycle: &TicketLifecycle) -> Ticket {
        let created = Timestamp::now().plus(chrono::Duration::hours(-3));
        lifecycle
            .create_at(
                CreateTicketCommand {
                    user_id: UserId::new("alice").unwrap(),
                    domain: "finance".into(),
                    subject: "Refund never arrived".into(),
                    priority: "urgent".into(),
                },
                created,
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn sweep_once_escalates_overdue_ticket() {
        let repository = InMemoryTicketRepository::new();
        let lifecycle = lifecycle(&repository);
        let ticket = overdue_ticket(&lifecycle).await;
        let watcher = EscalationWatcher::new(lifecycle, EscalationWatcherConfig::default());

        let outcome = watcher.sweep_once().await.unwrap();
        assert_eq!(outcome.escalated, 1);

        let again = watcher.sweep_once().await.unwrap();
        assert_eq!(again.escalated, 0);

        let stored = repository.find(ticket.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TicketStatus::Escalated);
    }

    #[tokio::test]
    async fn batch_size_bounds_one_sweep() {
        let repository = InMemoryTicketRepository::new();
        let lifecycle = lifecycle(&repository);
        for _ in 0..3 {
            overdue_ticket(&lifecycle).await;
        }
        let watcher = EscalationWatcher::new(
            lifecycle,
            EscalationWatcherConfig::default().with_batch_size(2),
        );

        assert_eq!(watcher.sweep_once().await.unwrap().escalated, 2);
        assert_eq!(watcher.sweep_once().await.unwrap().escalated, 1);
    }

    #[tokio::test]
    async fn run_sweeps_on_shutdown_and_returns() {
        let repository = InMemoryTicketRepository::new();
        let lifecycle = lifecycle(&repository);
        let watcher = Arc::new(EscalationWatcher::new(
            lifecycle.clone(),
            EscalationWatcherConfig::default().with_sweep_interval(Duration::from_secs(3600)),
        ));
        let (tx, rx) = watch::channel(false);

        let handle = {
            let watcher = watcher.clone();
            tokio::spawn(async move { watcher.run(rx).await })
        };
        // Let the immediate first tick run against an empty repository.
        tokio::time::sleep(Duration::from_millis(20)).await;

        let ticket = overdue_ticket(&lifecycle).await;
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();

        let stored = repository.find(ticket.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), TicketStatus::Escalated);
    }
}

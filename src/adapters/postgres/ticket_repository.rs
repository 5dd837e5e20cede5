//! PostgreSQL implementation of TicketRepository.
//!
//! Updates are guarded by `WHERE updated_at = $expected`; zero affected rows
//! means another writer got there first.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::foundation::{
    DomainSlug, TicketId, TicketMessageId, Timestamp, UserId,
};
use crate::domain::ticket::{
    Priority, Sender, StatusTransition, Ticket, TicketMessage, TicketStatus, TransitionSource,
};
use crate::ports::{StoreError, TicketRepository};

use super::map_sqlx_error;

const TICKET_COLUMNS: &str = "ticket_id, user_id, domain, subject, priority, status, \
                              sla_deadline, created_at, updated_at";

/// PostgreSQL implementation of TicketRepository.
#[derive(Clone)]
pub struct PostgresTicketRepository {
    pool: PgPool,
}

impl PostgresTicketRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn load_transitions(
        &self,
        ids: &[Uuid],
    ) -> Result<HashMap<Uuid, Vec<StatusTransition>>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT ticket_id, from_status, to_status, source, actor, occurred_at
            FROM ticket_transitions
            WHERE ticket_id = ANY($1)
            ORDER BY ticket_id, seq ASC
            "#,
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch ticket transitions", e))?;

        let mut by_ticket: HashMap<Uuid, Vec<StatusTransition>> = HashMap::new();
        for row in &rows {
            let ticket_id: Uuid = row.get("ticket_id");
            by_ticket
                .entry(ticket_id)
                .or_default()
                .push(row_to_transition(row)?);
        }
        Ok(by_ticket)
    }

    async fn hydrate(&self, rows: Vec<PgRow>) -> Result<Vec<Ticket>, StoreError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<Uuid> = rows.iter().map(|row| row.get("ticket_id")).collect();
        let mut transitions = self.load_transitions(&ids).await?;

        rows.iter()
            .map(|row| {
                let id: Uuid = row.get("ticket_id");
                row_to_ticket(row, transitions.remove(&id).unwrap_or_default())
            })
            .collect()
    }
}

async fn insert_transitions(
    tx: &mut Transaction<'_, Postgres>,
    ticket: &Ticket,
) -> Result<(), StoreError> {
    for (seq, transition) in ticket.transitions().iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO ticket_transitions
                (ticket_id, seq, from_status, to_status, source, actor, occurred_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (ticket_id, seq) DO NOTHING
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(seq as i32)
        .bind(transition.from.as_str())
        .bind(transition.to.as_str())
        .bind(transition.source.as_str())
        .bind(transition.actor.as_ref().map(|a| a.as_str().to_string()))
        .bind(transition.at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| map_sqlx_error("insert ticket transition", e))?;
    }
    Ok(())
}

async fn insert_message(
    tx: &mut Transaction<'_, Postgres>,
    message: &TicketMessage,
) -> Result<(), StoreError> {
    sqlx::query(
        r#"
        INSERT INTO ticket_messages (id, ticket_id, sender, content, created_at)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(message.id.as_uuid())
    .bind(message.ticket_id.as_uuid())
    .bind(message.sender.as_str())
    .bind(&message.content)
    .bind(message.created_at.as_datetime())
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert ticket message", e))?;
    Ok(())
}

#[async_trait]
impl TicketRepository for PostgresTicketRepository {
    async fn insert(&self, ticket: &Ticket, opening: &TicketMessage) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO tickets (
                ticket_id, user_id, domain, subject, priority, status,
                sla_deadline, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(ticket.user_id().as_str())
        .bind(ticket.domain().as_str())
        .bind(ticket.subject())
        .bind(ticket.priority().as_str())
        .bind(ticket.status().as_str())
        .bind(ticket.sla_deadline().as_datetime())
        .bind(ticket.created_at().as_datetime())
        .bind(ticket.updated_at().as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert ticket", e))?;

        insert_transitions(&mut tx, ticket).await?;
        insert_message(&mut tx, opening).await?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit transaction", e))?;

        Ok(())
    }

    async fn find(&self, id: TicketId) -> Result<Option<Ticket>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE ticket_id = $1",
            TICKET_COLUMNS
        ))
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch ticket", e))?;

        match row {
            Some(row) => Ok(self.hydrate(vec![row]).await?.into_iter().next()),
            None => Ok(None),
        }
    }

    async fn update(
        &self,
        ticket: &Ticket,
        expected_updated_at: Timestamp,
        message: Option<&TicketMessage>,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("start transaction", e))?;

        let result = sqlx::query(
            r#"
            UPDATE tickets SET
                priority = $2,
                status = $3,
                updated_at = $4
            WHERE ticket_id = $1 AND updated_at = $5
            "#,
        )
        .bind(ticket.id().as_uuid())
        .bind(ticket.priority().as_str())
        .bind(ticket.status().as_str())
        .bind(ticket.updated_at().as_datetime())
        .bind(expected_updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update ticket", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::conflict(format!(
                "ticket {} changed since {}",
                ticket.id(),
                expected_updated_at
            )));
        }

        insert_transitions(&mut tx, ticket).await?;
        if let Some(message) = message {
            insert_message(&mut tx, message).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit transaction", e))?;

        Ok(())
    }

    async fn thread(&self, id: TicketId) -> Result<Vec<TicketMessage>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, sender, content, created_at
            FROM ticket_messages
            WHERE ticket_id = $1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch ticket thread", e))?;

        rows.iter()
            .map(|row| {
                let message_id: Uuid = row.get("id");
                let sender: &str = row.get("sender");
                let content: String = row.get("content");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
                Ok(TicketMessage {
                    id: TicketMessageId::from_uuid(message_id),
                    ticket_id: id,
                    sender: sender
                        .parse::<Sender>()
                        .map_err(|e| StoreError::corrupt(e.to_string()))?,
                    content,
                    created_at: Timestamp::from_datetime(created_at),
                })
            })
            .collect()
    }

    async fn list_breach_candidates(
        &self,
        now: Timestamp,
        limit: usize,
    ) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets \
             WHERE status IN ('Open', 'In-Progress') AND sla_deadline < $1 \
             ORDER BY sla_deadline ASC LIMIT $2",
            TICKET_COLUMNS
        ))
        .bind(now.as_datetime())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list breach candidates", e))?;

        self.hydrate(rows).await
    }

    async fn list_by_status(&self, status: TicketStatus) -> Result<Vec<Ticket>, StoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM tickets WHERE status = $1 ORDER BY updated_at DESC",
            TICKET_COLUMNS
        ))
        .bind(status.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list tickets by status", e))?;

        self.hydrate(rows).await
    }
}

fn corrupt(e: impl ToString) -> StoreError {
    StoreError::corrupt(e.to_string())
}

fn row_to_ticket(row: &PgRow, transitions: Vec<StatusTransition>) -> Result<Ticket, StoreError> {
    let id: Uuid = row.get("ticket_id");
    let user_id: String = row.get("user_id");
    let domain: String = row.get("domain");
    let subject: String = row.get("subject");
    let priority: &str = row.get("priority");
    let status: &str = row.get("status");
    let sla_deadline: chrono::DateTime<chrono::Utc> = row.get("sla_deadline");
    let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
    let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");

    Ok(Ticket::reconstitute(
        TicketId::from_uuid(id),
        UserId::new(user_id).map_err(corrupt)?,
        DomainSlug::new(domain).map_err(corrupt)?,
        subject,
        priority.parse::<Priority>().map_err(corrupt)?,
        status.parse::<TicketStatus>().map_err(corrupt)?,
        Timestamp::from_datetime(sla_deadline),
        Timestamp::from_datetime(created_at),
        Timestamp::from_datetime(updated_at),
        transitions,
    ))
}

fn row_to_transition(row: &PgRow) -> Result<StatusTransition, StoreError> {
    let from: &str = row.get("from_status");
    let to: &str = row.get("to_status");
    let source: &str = row.get("source");
    let actor: Option<String> = row.get("actor");
    let occurred_at: chrono::DateTime<chrono::Utc> = row.get("occurred_at");

    Ok(StatusTransition {
        from: from.parse::<TicketStatus>().map_err(corrupt)?,
        to: to.parse::<TicketStatus>().map_err(corrupt)?,
        source: source.parse::<TransitionSource>().map_err(corrupt)?,
        actor: actor.map(UserId::new).transpose().map_err(corrupt)?,
        at: Timestamp::from_datetime(occurred_at),
    })
}

//! PostgreSQL implementation of ConversationStore.
//!
//! Transcripts live in `conversations` plus `conversation_messages`, one row
//! per message keyed by `(conversation_id, seq)`.

use async_trait::async_trait;
use sqlx::{PgPool, Row};

use crate::domain::conversation::{derive_title, Conversation, ConversationSummary, Message, Role};
use crate::domain::faq::RecentQuestion;
use crate::domain::foundation::{ConversationId, DomainSlug, Timestamp, UserId};
use crate::ports::{ConversationStore, StoreError};

use super::map_sqlx_error;

/// PostgreSQL implementation of ConversationStore.
#[derive(Clone)]
pub struct PostgresConversationStore {
    pool: PgPool,
}

impl PostgresConversationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ConversationStore for PostgresConversationStore {
    async fn create(&self, conversation: &Conversation) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO conversations (conversation_id, user_id, domain, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(conversation.id().as_str())
        .bind(conversation.user_id().as_str())
        .bind(conversation.domain().as_str())
        .bind(conversation.created_at().as_datetime())
        .bind(conversation.updated_at().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert conversation", e))?;

        Ok(())
    }

    async fn find(&self, id: &ConversationId) -> Result<Option<Conversation>, StoreError> {
        let conv_row = sqlx::query(
            r#"
            SELECT conversation_id, user_id, domain, created_at, updated_at
            FROM conversations
            WHERE conversation_id = $1
            "#,
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch conversation", e))?;

        let conv_row = match conv_row {
            Some(row) => row,
            None => return Ok(None),
        };

        let message_rows = sqlx::query(
            r#"
            SELECT role, content, created_at
            FROM conversation_messages
            WHERE conversation_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("fetch conversation messages", e))?;

        let messages = message_rows
            .iter()
            .map(|row| {
                let role: &str = row.get("role");
                let content: String = row.get("content");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
                let role = role
                    .parse::<Role>()
                    .map_err(|e| StoreError::corrupt(e.to_string()))?;
                Ok(Message::new(role, content, Timestamp::from_datetime(created_at)))
            })
            .collect::<Result<Vec<_>, StoreError>>()?;

        let user_id: String = conv_row.get("user_id");
        let domain: String = conv_row.get("domain");
        let created_at: chrono::DateTime<chrono::Utc> = conv_row.get("created_at");
        let updated_at: chrono::DateTime<chrono::Utc> = conv_row.get("updated_at");

        Ok(Some(Conversation::reconstitute(
            id.clone(),
            UserId::new(user_id).map_err(|e| StoreError::corrupt(e.to_string()))?,
            DomainSlug::new(domain).map_err(|e| StoreError::corrupt(e.to_string()))?,
            messages,
            Timestamp::from_datetime(created_at),
            Timestamp::from_datetime(updated_at),
        )))
    }

    async fn append_message(
        &self,
        id: &ConversationId,
        seq: usize,
        message: &Message,
    ) -> Result<(), StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("start transaction", e))?;

        sqlx::query(
            r#"
            INSERT INTO conversation_messages (conversation_id, seq, role, content, created_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id.as_str())
        .bind(seq as i64)
        .bind(message.role.as_str())
        .bind(&message.content)
        .bind(message.timestamp.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert message", e))?;

        let result = sqlx::query(
            r#"
            UPDATE conversations SET updated_at = $2
            WHERE conversation_id = $1
            "#,
        )
        .bind(id.as_str())
        .bind(message.timestamp.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update conversation timestamp", e))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::corrupt(format!("conversation {} has no header row", id)));
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit transaction", e))?;

        Ok(())
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        domain: &DomainSlug,
        title_max_chars: usize,
    ) -> Result<Vec<ConversationSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT c.conversation_id, c.domain, c.updated_at,
                   (SELECT COUNT(*) FROM conversation_messages m
                     WHERE m.conversation_id = c.conversation_id) AS message_count,
                   (SELECT m.content FROM conversation_messages m
                     WHERE m.conversation_id = c.conversation_id AND m.role = 'user'
                     ORDER BY m.seq ASC LIMIT 1) AS first_question
            FROM conversations c
            WHERE c.user_id = $1 AND c.domain = $2
            ORDER BY c.updated_at DESC
            "#,
        )
        .bind(user_id.as_str())
        .bind(domain.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list conversations", e))?;

        rows.iter()
            .map(|row| {
                let conversation_id: String = row.get("conversation_id");
                let domain: String = row.get("domain");
                let updated_at: chrono::DateTime<chrono::Utc> = row.get("updated_at");
                let message_count: i64 = row.get("message_count");
                let first_question: Option<String> = row.get("first_question");

                Ok(ConversationSummary {
                    conversation_id: ConversationId::parse(&conversation_id)
                        .map_err(|e| StoreError::corrupt(e.to_string()))?,
                    title: derive_title(first_question.as_deref(), title_max_chars),
                    domain: DomainSlug::new(domain)
                        .map_err(|e| StoreError::corrupt(e.to_string()))?,
                    updated_at: Timestamp::from_datetime(updated_at),
                    message_count: message_count.max(0) as usize,
                })
            })
            .collect()
    }

    async fn recent_user_questions(
        &self,
        domain: &DomainSlug,
        limit: usize,
    ) -> Result<Vec<RecentQuestion>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT m.content, m.created_at
            FROM conversation_messages m
            JOIN conversations c ON c.conversation_id = m.conversation_id
            WHERE c.domain = $1 AND m.role = 'user'
            ORDER BY m.created_at DESC
            LIMIT $2
            "#,
        )
        .bind(domain.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("sample recent questions", e))?;

        Ok(rows
            .iter()
            .map(|row| {
                let content: String = row.get("content");
                let created_at: chrono::DateTime<chrono::Utc> = row.get("created_at");
                RecentQuestion::new(content, Timestamp::from_datetime(created_at))
            })
            .collect())
    }
}

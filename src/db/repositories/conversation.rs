//! Conversation repository
//!
//! Conversations hold a normalized participant pair and per-side unread
//! counters. Sending a message appends the row, bumps the recipient's
//! counter, and stamps `last_message_at` in one transaction.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{Conversation, ConversationSummary, Message};

/// Conversation repository trait
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Get the conversation between two users, creating it if missing
    async fn get_or_create(&self, user_id: i64, peer_id: i64) -> Result<Conversation>;

    /// Get a conversation by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Conversation>>;

    /// List a user's conversations, most recent activity first
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ConversationSummary>>;

    /// Append a message and bump the recipient's unread counter
    async fn add_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<Message>;

    /// Page through a conversation's messages, newest first
    async fn messages(
        &self,
        conversation_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Message>, i64)>;

    /// Zero the given participant's unread counter
    async fn mark_read(&self, conversation_id: i64, user_id: i64) -> Result<()>;

    /// Sum of unread counts across all of the user's conversations
    async fn total_unread(&self, user_id: i64) -> Result<i64>;
}

/// SQLx-based conversation repository implementation
pub struct SqlxConversationRepository {
    pool: SqlitePool,
}

impl SqlxConversationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ConversationRepository> {
        Arc::new(Self::new(pool))
    }
}

fn map_conversation_row(row: &sqlx::sqlite::SqliteRow) -> Conversation {
    Conversation {
        id: row.get("id"),
        user_a_id: row.get("user_a_id"),
        user_b_id: row.get("user_b_id"),
        unread_a: row.get("unread_a"),
        unread_b: row.get("unread_b"),
        last_message_at: row.get("last_message_at"),
        created_at: row.get("created_at"),
    }
}

fn map_message_row(row: &sqlx::sqlite::SqliteRow) -> Message {
    Message {
        id: row.get("id"),
        conversation_id: row.get("conversation_id"),
        sender_id: row.get("sender_id"),
        content: row.get("content"),
        created_at: row.get("created_at"),
    }
}

#[async_trait]
impl ConversationRepository for SqlxConversationRepository {
    async fn get_or_create(&self, user_id: i64, peer_id: i64) -> Result<Conversation> {
        let (a, b) = Conversation::normalize_pair(user_id, peer_id);

        sqlx::query(
            "INSERT OR IGNORE INTO conversations (user_a_id, user_b_id) VALUES (?, ?)",
        )
        .bind(a)
        .bind(b)
        .execute(&self.pool)
        .await?;

        let row = sqlx::query(
            "SELECT * FROM conversations WHERE user_a_id = ? AND user_b_id = ?",
        )
        .bind(a)
        .bind(b)
        .fetch_one(&self.pool)
        .await?;
        Ok(map_conversation_row(&row))
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Conversation>> {
        let row = sqlx::query("SELECT * FROM conversations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_conversation_row(&r)))
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r#"SELECT c.id,
                      CASE WHEN c.user_a_id = ? THEN c.user_b_id ELSE c.user_a_id END AS peer_id,
                      CASE WHEN c.user_a_id = ? THEN c.unread_a ELSE c.unread_b END AS unread,
                      u.username AS peer_username, u.display_name AS peer_display_name,
                      u.avatar AS peer_avatar,
                      c.last_message_at,
                      (SELECT m.content FROM messages m
                       WHERE m.conversation_id = c.id
                       ORDER BY m.id DESC LIMIT 1) AS last_message
               FROM conversations c
               JOIN users u
                 ON u.id = CASE WHEN c.user_a_id = ? THEN c.user_b_id ELSE c.user_a_id END
               WHERE c.user_a_id = ? OR c.user_b_id = ?
               ORDER BY c.last_message_at IS NULL, c.last_message_at DESC, c.id DESC"#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| ConversationSummary {
                id: row.get("id"),
                peer_id: row.get("peer_id"),
                peer_username: row.get("peer_username"),
                peer_display_name: row.get("peer_display_name"),
                peer_avatar: row.get("peer_avatar"),
                unread: row.get("unread"),
                last_message: row.get("last_message"),
                last_message_at: row.get("last_message_at"),
            })
            .collect())
    }

    async fn add_message(
        &self,
        conversation_id: i64,
        sender_id: i64,
        content: &str,
    ) -> Result<Message> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let result = sqlx::query(
            "INSERT INTO messages (conversation_id, sender_id, content, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .bind(content)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        // Bump the unread counter on whichever side is not the sender.
        sqlx::query(
            r#"UPDATE conversations
               SET unread_a = unread_a + (CASE WHEN user_a_id <> ? THEN 1 ELSE 0 END),
                   unread_b = unread_b + (CASE WHEN user_b_id <> ? THEN 1 ELSE 0 END),
                   last_message_at = ?
               WHERE id = ?"#,
        )
        .bind(sender_id)
        .bind(sender_id)
        .bind(now)
        .bind(conversation_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Message {
            id: result.last_insert_rowid(),
            conversation_id,
            sender_id,
            content: content.to_string(),
            created_at: now,
        })
    }

    async fn messages(
        &self,
        conversation_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Message>, i64)> {
        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM messages WHERE conversation_id = ?")
                .bind(conversation_id)
                .fetch_one(&self.pool)
                .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            "SELECT * FROM messages WHERE conversation_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(conversation_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_message_row).collect(), total))
    }

    async fn mark_read(&self, conversation_id: i64, user_id: i64) -> Result<()> {
        sqlx::query(
            r#"UPDATE conversations
               SET unread_a = (CASE WHEN user_a_id = ? THEN 0 ELSE unread_a END),
                   unread_b = (CASE WHEN user_b_id = ? THEN 0 ELSE unread_b END)
               WHERE id = ?"#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(conversation_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn total_unread(&self, user_id: i64) -> Result<i64> {
        let total: i64 = sqlx::query_scalar(
            r#"SELECT COALESCE(SUM(CASE WHEN user_a_id = ? THEN unread_a ELSE unread_b END), 0)
               FROM conversations
               WHERE user_a_id = ? OR user_b_id = ?"#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }
}

//! Message service
//!
//! Direct messages between two users. A conversation is created lazily on
//! the first message; reading a conversation's messages marks it read for
//! the reader.

use crate::db::repositories::{ConversationRepository, UserRepository};
use crate::models::{Conversation, ConversationSummary, Message, PagedResult};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

const CONTENT_MAX: usize = 5000;

pub struct MessageService {
    conversation_repo: Arc<dyn ConversationRepository>,
    user_repo: Arc<dyn UserRepository>,
}

impl MessageService {
    pub fn new(
        conversation_repo: Arc<dyn ConversationRepository>,
        user_repo: Arc<dyn UserRepository>,
    ) -> Self {
        Self {
            conversation_repo,
            user_repo,
        }
    }

    /// Send a message to another user, creating the conversation if needed
    pub async fn send(
        &self,
        sender_id: i64,
        recipient_id: i64,
        content: &str,
    ) -> Result<Message, ServiceError> {
        if sender_id == recipient_id {
            return Err(ServiceError::Validation(
                "You cannot message yourself".to_string(),
            ));
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(ServiceError::Validation(
                "Message cannot be empty".to_string(),
            ));
        }
        if content.len() > CONTENT_MAX {
            return Err(ServiceError::Validation(format!(
                "Message too long (max {} characters)",
                CONTENT_MAX
            )));
        }

        self.user_repo
            .get_by_id(recipient_id)
            .await
            .context("Failed to get recipient")?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", recipient_id)))?;

        let conversation = self
            .conversation_repo
            .get_or_create(sender_id, recipient_id)
            .await
            .context("Failed to open conversation")?;

        Ok(self
            .conversation_repo
            .add_message(conversation.id, sender_id, content)
            .await
            .context("Failed to send message")?)
    }

    /// Open (or return the existing) conversation with another user
    pub async fn open(
        &self,
        user_id: i64,
        peer_id: i64,
    ) -> Result<Conversation, ServiceError> {
        if user_id == peer_id {
            return Err(ServiceError::Validation(
                "You cannot message yourself".to_string(),
            ));
        }
        self.user_repo
            .get_by_id(peer_id)
            .await
            .context("Failed to get user")?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", peer_id)))?;

        Ok(self
            .conversation_repo
            .get_or_create(user_id, peer_id)
            .await
            .context("Failed to open conversation")?)
    }

    /// The user's inbox listing, most recent activity first
    pub async fn conversations(
        &self,
        user_id: i64,
    ) -> Result<Vec<ConversationSummary>, ServiceError> {
        Ok(self
            .conversation_repo
            .list_for_user(user_id)
            .await
            .context("Failed to list conversations")?)
    }

    /// Page through a conversation's messages and mark it read for the
    /// reader. Participants only.
    pub async fn messages(
        &self,
        user_id: i64,
        conversation_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<PagedResult<Message>, ServiceError> {
        self.require_participant(user_id, conversation_id).await?;

        let (items, total) = self
            .conversation_repo
            .messages(conversation_id, page, per_page)
            .await
            .context("Failed to load messages")?;

        self.conversation_repo
            .mark_read(conversation_id, user_id)
            .await
            .context("Failed to mark conversation read")?;

        Ok(PagedResult::new(items, total, page, per_page))
    }

    /// Explicitly mark a conversation read
    pub async fn mark_read(&self, user_id: i64, conversation_id: i64) -> Result<(), ServiceError> {
        self.require_participant(user_id, conversation_id).await?;
        Ok(self
            .conversation_repo
            .mark_read(conversation_id, user_id)
            .await
            .context("Failed to mark conversation read")?)
    }

    /// Total unread messages across the user's conversations
    pub async fn unread_count(&self, user_id: i64) -> Result<i64, ServiceError> {
        Ok(self
            .conversation_repo
            .total_unread(user_id)
            .await
            .context("Failed to count unread")?)
    }

    async fn require_participant(
        &self,
        user_id: i64,
        conversation_id: i64,
    ) -> Result<Conversation, ServiceError> {
        let conversation = self
            .conversation_repo
            .get_by_id(conversation_id)
            .await
            .context("Failed to get conversation")?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Conversation {} not found", conversation_id))
            })?;
        if !conversation.is_participant(user_id) {
            return Err(ServiceError::Forbidden(
                "Not your conversation".to_string(),
            ));
        }
        Ok(conversation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxConversationRepository, SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};

    async fn setup() -> (MessageService, i64, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let mut ids = Vec::new();
        for name in ["alice", "bob", "carol"] {
            let user = users
                .create(&User::new(
                    name.to_string(),
                    format!("{name}@example.com"),
                    "hash".to_string(),
                    UserRole::Community,
                ))
                .await
                .expect("create failed");
            ids.push(user.id);
        }

        let service = MessageService::new(
            SqlxConversationRepository::boxed(pool.clone()),
            SqlxUserRepository::boxed(pool),
        );
        (service, ids[0], ids[1], ids[2])
    }

    #[tokio::test]
    async fn test_send_and_read() {
        let (service, alice, bob, _) = setup().await;

        service.send(alice, bob, "hello bob").await.expect("send failed");
        assert_eq!(service.unread_count(bob).await.expect("count failed"), 1);

        let inbox = service.conversations(bob).await.expect("inbox failed");
        assert_eq!(inbox.len(), 1);
        let conversation_id = inbox[0].id;

        let page = service
            .messages(bob, conversation_id, 1, 50)
            .await
            .expect("messages failed");
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].content, "hello bob");

        // Reading marked it read
        assert_eq!(service.unread_count(bob).await.expect("count failed"), 0);
    }

    #[tokio::test]
    async fn test_validation() {
        let (service, alice, _, _) = setup().await;

        assert!(matches!(
            service.send(alice, alice, "hi me").await,
            Err(ServiceError::Validation(_))
        ));
        assert!(matches!(
            service.send(alice, 999, "anyone?").await,
            Err(ServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let (service, alice, bob, _) = setup().await;

        let first = service.open(alice, bob).await.expect("open failed");
        let second = service.open(bob, alice).await.expect("open failed");
        assert_eq!(first.id, second.id);

        assert!(matches!(
            service.open(alice, alice).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_outsider_cannot_read() {
        let (service, alice, bob, carol) = setup().await;

        service.send(alice, bob, "private").await.expect("send failed");
        let inbox = service.conversations(alice).await.expect("inbox failed");
        let conversation_id = inbox[0].id;

        assert!(matches!(
            service.messages(carol, conversation_id, 1, 50).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}

//! Conversation and message models
//!
//! A conversation is a message thread between exactly two users. The
//! participant pair is normalized (`user_a_id < user_b_id`) so a pair maps
//! to at most one conversation. Each side has its own unread counter,
//! bumped when the peer sends and zeroed when the owner marks the
//! conversation read.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Conversation entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique identifier
    pub id: i64,
    /// Lower participant id
    pub user_a_id: i64,
    /// Higher participant id
    pub user_b_id: i64,
    /// Unread messages for user A
    pub unread_a: i64,
    /// Unread messages for user B
    pub unread_b: i64,
    /// Timestamp of the latest message
    pub last_message_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Conversation {
    /// Whether the given user takes part in this conversation
    pub fn is_participant(&self, user_id: i64) -> bool {
        self.user_a_id == user_id || self.user_b_id == user_id
    }

    /// The other participant, if `user_id` is one of the two
    pub fn peer_of(&self, user_id: i64) -> Option<i64> {
        if self.user_a_id == user_id {
            Some(self.user_b_id)
        } else if self.user_b_id == user_id {
            Some(self.user_a_id)
        } else {
            None
        }
    }

    /// Unread count from the given participant's point of view
    pub fn unread_for(&self, user_id: i64) -> i64 {
        if self.user_a_id == user_id {
            self.unread_a
        } else {
            self.unread_b
        }
    }

    /// Normalize a participant pair to (lower, higher)
    pub fn normalize_pair(a: i64, b: i64) -> (i64, i64) {
        if a < b { (a, b) } else { (b, a) }
    }
}

/// Conversation as shown in a user's inbox listing
#[derive(Debug, Clone, Serialize)]
pub struct ConversationSummary {
    pub id: i64,
    pub peer_id: i64,
    pub peer_username: String,
    pub peer_display_name: Option<String>,
    pub peer_avatar: Option<String>,
    /// Unread count for the requesting user
    pub unread: i64,
    /// Latest message content for preview
    pub last_message: Option<String>,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Message entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub conversation_id: i64,
    pub sender_id: i64,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(a: i64, b: i64) -> Conversation {
        Conversation {
            id: 1,
            user_a_id: a,
            user_b_id: b,
            unread_a: 3,
            unread_b: 7,
            last_message_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_pair() {
        assert_eq!(Conversation::normalize_pair(5, 2), (2, 5));
        assert_eq!(Conversation::normalize_pair(2, 5), (2, 5));
    }

    #[test]
    fn test_peer_of() {
        let conv = conversation(2, 5);
        assert_eq!(conv.peer_of(2), Some(5));
        assert_eq!(conv.peer_of(5), Some(2));
        assert_eq!(conv.peer_of(9), None);
    }

    #[test]
    fn test_unread_for() {
        let conv = conversation(2, 5);
        assert_eq!(conv.unread_for(2), 3);
        assert_eq!(conv.unread_for(5), 7);
    }

    #[test]
    fn test_is_participant() {
        let conv = conversation(2, 5);
        assert!(conv.is_participant(2));
        assert!(conv.is_participant(5));
        assert!(!conv.is_participant(1));
    }
}

//! Comment model
//!
//! Comments attach to artworks and support one level of threading: a comment
//! is either top-level or a reply to a top-level comment. Deletion is soft —
//! the row stays so the thread shape survives, but the content is blanked.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Comment entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// The artwork being discussed
    pub artwork_id: i64,
    /// Comment author
    pub user_id: i64,
    /// Parent comment for replies (always a top-level comment)
    pub parent_id: Option<i64>,
    /// Comment text (empty once soft-deleted)
    pub content: String,
    /// Soft-delete flag
    pub deleted: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub artwork_id: i64,
    pub parent_id: Option<i64>,
    pub content: String,
}

/// Comment enriched with author info, like state, and nested replies
#[derive(Debug, Clone, Serialize)]
pub struct CommentWithMeta {
    pub id: i64,
    pub artwork_id: i64,
    pub user_id: i64,
    pub parent_id: Option<i64>,
    pub author_name: String,
    pub author_avatar: Option<String>,
    pub content: String,
    pub deleted: bool,
    pub like_count: i64,
    /// Whether the requesting user has liked this comment
    pub is_liked: bool,
    pub created_at: DateTime<Utc>,
    pub replies: Vec<CommentWithMeta>,
}

/// A like on an artwork or comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub target_type: LikeTargetType,
    pub target_id: i64,
    pub user_id: i64,
}

/// What a like points at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTargetType {
    Artwork,
    Comment,
}

impl fmt::Display for LikeTargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LikeTargetType::Artwork => write!(f, "artwork"),
            LikeTargetType::Comment => write!(f, "comment"),
        }
    }
}

impl FromStr for LikeTargetType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "artwork" => Ok(LikeTargetType::Artwork),
            "comment" => Ok(LikeTargetType::Comment),
            _ => Err(anyhow::anyhow!("Invalid like target type: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_target_type_roundtrip() {
        assert_eq!(
            LikeTargetType::from_str("artwork").unwrap(),
            LikeTargetType::Artwork
        );
        assert_eq!(
            LikeTargetType::from_str("Comment").unwrap(),
            LikeTargetType::Comment
        );
        assert!(LikeTargetType::from_str("user").is_err());
    }
}

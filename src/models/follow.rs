//! Follow model
//!
//! A follow is a unique (follower, following) pair. Self-follows are
//! rejected by the service and by a CHECK constraint on the table.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserRole;

/// Follow relationship entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    /// The user who follows
    pub follower_id: i64,
    /// The user being followed
    pub following_id: i64,
    pub created_at: DateTime<Utc>,
}

/// A row in a follower/following listing
#[derive(Debug, Clone, Serialize)]
pub struct FollowUser {
    pub id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub role: UserRole,
    /// When the follow relationship was created
    pub followed_at: DateTime<Utc>,
}

//! User model
//!
//! Defines the User entity and related types for the Galleria marketplace.
//! Users come in three roles: artists (who list artworks), community members
//! (who buy and interact), and administrators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// User entity representing a registered account.
///
/// Aggregate counters (`follower_count`, `following_count`, `total_sales`)
/// are maintained by the repositories alongside the operations that change
/// them, never recomputed on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: i64,
    /// Username (unique)
    pub username: String,
    /// Email address (unique)
    pub email: String,
    /// Password hash (argon2)
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// User role
    pub role: UserRole,
    /// Account status (active/banned)
    pub status: UserStatus,
    /// Optional display name shown instead of the username
    pub display_name: Option<String>,
    /// Short profile text
    pub bio: Option<String>,
    /// Avatar URL
    pub avatar: Option<String>,
    /// Number of users following this user
    pub follower_count: i64,
    /// Number of users this user follows
    pub following_count: i64,
    /// Number of artworks this user has sold
    pub total_sales: i64,
    /// Aggregate rating (0.0 when unrated)
    pub rating: f64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a new User with the given parameters.
    ///
    /// The password must already be hashed; use
    /// `services::password::hash_password()`.
    pub fn new(username: String, email: String, password_hash: String, role: UserRole) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // assigned by the database
            username,
            email,
            password_hash,
            role,
            status: UserStatus::Active,
            display_name: None,
            bio: None,
            avatar: None,
            follower_count: 0,
            following_count: 0,
            total_sales: 0,
            rating: 0.0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Check if the user is an administrator
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Check if the user is an artist
    pub fn is_artist(&self) -> bool {
        self.role == UserRole::Artist
    }

    /// Check if the user may manage a resource owned by `owner_id`.
    ///
    /// Admins can manage anything; everyone else only their own resources.
    pub fn can_manage(&self, owner_id: i64) -> bool {
        self.is_admin() || self.id == owner_id
    }

    /// Check if the user is banned
    pub fn is_banned(&self) -> bool {
        self.status == UserStatus::Banned
    }

    /// Check if the user is active
    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }
}

/// User role for authorization.
///
/// - Admin: moderation and platform management
/// - Artist: can list artworks and organize exhibitions
/// - Community: can browse, buy, comment, follow, message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// Administrator - full access
    Admin,
    /// Artist - sells artworks
    Artist,
    /// Community member - default
    Community,
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Community
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Artist => write!(f, "artist"),
            UserRole::Community => write!(f, "community"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "artist" => Ok(UserRole::Artist),
            "community" => Ok(UserRole::Community),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// User status for account state.
///
/// Banned users cannot log in; their existing sessions are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// Active - normal access
    Active,
    /// Banned - cannot login
    Banned,
}

impl Default for UserStatus {
    fn default() -> Self {
        Self::Active
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Banned => write!(f, "banned"),
        }
    }
}

impl FromStr for UserStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "active" => Ok(UserStatus::Active),
            "banned" => Ok(UserStatus::Banned),
            _ => Err(anyhow::anyhow!("Invalid user status: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_new() {
        let user = User::new(
            "painter".to_string(),
            "painter@example.com".to_string(),
            "hashed_password".to_string(),
            UserRole::Artist,
        );

        assert_eq!(user.id, 0);
        assert_eq!(user.username, "painter");
        assert_eq!(user.role, UserRole::Artist);
        assert_eq!(user.status, UserStatus::Active);
        assert_eq!(user.follower_count, 0);
        assert_eq!(user.total_sales, 0);
    }

    #[test]
    fn test_user_is_admin() {
        let admin = User::new("a".into(), "a@t.com".into(), "h".into(), UserRole::Admin);
        let artist = User::new("b".into(), "b@t.com".into(), "h".into(), UserRole::Artist);
        let member = User::new("c".into(), "c@t.com".into(), "h".into(), UserRole::Community);

        assert!(admin.is_admin());
        assert!(!artist.is_admin());
        assert!(!member.is_admin());
    }

    #[test]
    fn test_user_can_manage() {
        let mut admin = User::new("a".into(), "a@t.com".into(), "h".into(), UserRole::Admin);
        admin.id = 1;
        let mut artist = User::new("b".into(), "b@t.com".into(), "h".into(), UserRole::Artist);
        artist.id = 2;

        // Admin can manage anything
        assert!(admin.can_manage(1));
        assert!(admin.can_manage(2));
        assert!(admin.can_manage(999));

        // Artist can only manage their own resources
        assert!(artist.can_manage(2));
        assert!(!artist.can_manage(1));
        assert!(!artist.can_manage(999));
    }

    #[test]
    fn test_user_role_display() {
        assert_eq!(UserRole::Admin.to_string(), "admin");
        assert_eq!(UserRole::Artist.to_string(), "artist");
        assert_eq!(UserRole::Community.to_string(), "community");
    }

    #[test]
    fn test_user_role_from_str() {
        assert_eq!(UserRole::from_str("admin").unwrap(), UserRole::Admin);
        assert_eq!(UserRole::from_str("ARTIST").unwrap(), UserRole::Artist);
        assert_eq!(UserRole::from_str("Community").unwrap(), UserRole::Community);
        assert!(UserRole::from_str("editor").is_err());
    }

    #[test]
    fn test_user_role_default() {
        assert_eq!(UserRole::default(), UserRole::Community);
    }

    #[test]
    fn test_user_status_roundtrip() {
        assert_eq!(UserStatus::from_str("active").unwrap(), UserStatus::Active);
        assert_eq!(UserStatus::from_str("banned").unwrap(), UserStatus::Banned);
        assert!(UserStatus::from_str("suspended").is_err());
    }
}

//! User service
//!
//! Business logic for accounts and authentication:
//! - Registration (artist or community role; the first account becomes admin)
//! - Login/logout with opaque session tokens
//! - Session validation and expiry cleanup
//! - Profile updates and the admin moderation operations

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{Session, User, UserRole, UserStatus};
use crate::services::password::{hash_password, verify_password};
use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Username length bounds
const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Authentication failed (invalid credentials)
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// Account is banned
    #[error("Account banned")]
    Banned,

    /// Validation error (invalid input)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// User already exists
    #[error("User already exists: {0}")]
    UserExists(String),

    /// User not found
    #[error("User not found")]
    NotFound,

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Requested role; only `artist` and `community` are accepted
    pub role: UserRole,
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

/// User service for accounts and authentication
pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>, session_repo: Arc<dyn SessionRepository>) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days: DEFAULT_SESSION_EXPIRATION_DAYS,
        }
    }

    /// Create a user service with custom session expiration
    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
        }
    }

    /// Register a new user.
    ///
    /// The very first account in the system becomes an admin regardless of
    /// the requested role; everyone after that gets the artist or community
    /// role they asked for.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Username '{}' is already taken",
                input.username
            )));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(format!(
                "Email '{}' is already registered",
                input.email
            )));
        }

        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            input.role
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, role);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;

        Ok(created)
    }

    /// Login with credentials, returning a new session on success
    pub async fn login(&self, input: LoginInput) -> Result<Session, UserServiceError> {
        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(|| {
                UserServiceError::AuthenticationError("Invalid username or password".to_string())
            })?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            return Err(UserServiceError::AuthenticationError(
                "Invalid username or password".to_string(),
            ));
        }

        if user.is_banned() {
            return Err(UserServiceError::Banned);
        }

        self.create_session(user.id).await
    }

    /// Logout (invalidate session)
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Validate a session token and return the associated user.
    ///
    /// Expired sessions are deleted on sight and count as invalid.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let session = match self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
        {
            Some(s) => s,
            None => return Ok(None),
        };

        if session.is_expired() {
            let _ = self.session_repo.delete(token).await;
            return Ok(None);
        }

        let user = self
            .user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?;

        Ok(user)
    }

    /// Get user by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    /// Get user by username
    pub async fn get_by_username(&self, username: &str) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_username(username)
            .await
            .context("Failed to get user by username")?)
    }

    /// Update the caller's own profile fields
    pub async fn update_profile(
        &self,
        user_id: i64,
        display_name: Option<String>,
        bio: Option<String>,
        avatar: Option<String>,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        if let Some(display_name) = display_name {
            if display_name.len() > 100 {
                return Err(UserServiceError::ValidationError(
                    "Display name too long (max 100 characters)".to_string(),
                ));
            }
            user.display_name = Some(display_name);
        }
        if let Some(bio) = bio {
            user.bio = Some(bio);
        }
        if let Some(avatar) = avatar {
            user.avatar = Some(avatar);
        }

        Ok(self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?)
    }

    /// Change the caller's password, verifying the current one first
    pub async fn change_password(
        &self,
        user_id: i64,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), UserServiceError> {
        if new_password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        let valid = verify_password(current_password, &user.password_hash)
            .context("Failed to verify password")?;
        if !valid {
            return Err(UserServiceError::AuthenticationError(
                "Current password is incorrect".to_string(),
            ));
        }

        user.password_hash = hash_password(new_password).context("Failed to hash password")?;
        self.user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        // Changing the password invalidates every other session
        self.session_repo
            .delete_by_user(user_id)
            .await
            .context("Failed to clear sessions")?;

        Ok(())
    }

    /// Admin: page through all users, optionally filtered by role or status
    pub async fn list_users(
        &self,
        page: u32,
        per_page: u32,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<(Vec<User>, i64), UserServiceError> {
        Ok(self
            .user_repo
            .list(page, per_page, role, status)
            .await
            .context("Failed to list users")?)
    }

    /// Admin: ban or unban an account. Banning also revokes every session.
    pub async fn set_status(
        &self,
        user_id: i64,
        status: UserStatus,
    ) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        if user.is_admin() && status == UserStatus::Banned {
            return Err(UserServiceError::ValidationError(
                "Admin accounts cannot be banned".to_string(),
            ));
        }

        user.status = status;
        let updated = self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?;

        if status == UserStatus::Banned {
            self.session_repo
                .delete_by_user(user_id)
                .await
                .context("Failed to revoke sessions")?;
        }

        Ok(updated)
    }

    /// Admin: change an account's role
    pub async fn set_role(&self, user_id: i64, role: UserRole) -> Result<User, UserServiceError> {
        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        user.role = role;
        Ok(self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?)
    }

    /// Admin: set an artist's curated rating (0.0 to 5.0)
    pub async fn set_rating(&self, user_id: i64, rating: f64) -> Result<User, UserServiceError> {
        if !(0.0..=5.0).contains(&rating) {
            return Err(UserServiceError::ValidationError(
                "Rating must be between 0.0 and 5.0".to_string(),
            ));
        }

        let mut user = self
            .user_repo
            .get_by_id(user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::NotFound)?;

        user.rating = rating;
        Ok(self
            .user_repo
            .update(&user)
            .await
            .context("Failed to update user")?)
    }

    /// Whether no users exist yet (the next registration becomes admin)
    pub async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        Ok(count == 0)
    }

    /// Delete all expired sessions, returning how many were removed.
    /// Called periodically from a background task.
    pub async fn cleanup_expired_sessions(&self) -> Result<i64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        let username = input.username.trim();
        if username.len() < USERNAME_MIN || username.len() > USERNAME_MAX {
            return Err(UserServiceError::ValidationError(format!(
                "Username must be {} to {} characters",
                USERNAME_MIN, USERNAME_MAX
            )));
        }
        if !username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(UserServiceError::ValidationError(
                "Username may only contain letters, digits, '_' and '-'".to_string(),
            ));
        }

        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }

        if input.password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        if input.role == UserRole::Admin {
            return Err(UserServiceError::ValidationError(
                "Cannot register as admin".to_string(),
            ));
        }

        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        Ok(self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let now = Utc::now();
        let session = Session {
            id: Uuid::new_v4().to_string(),
            user_id,
            expires_at: now + Duration::days(self.session_expiration_days),
            created_at: now,
        };

        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    fn register_input(username: &str, role: UserRole) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: "hunter2hunter2".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let service = setup().await;

        let first = service
            .register(register_input("founder", UserRole::Community))
            .await
            .expect("register failed");
        assert_eq!(first.role, UserRole::Admin);

        let second = service
            .register(register_input("painter", UserRole::Artist))
            .await
            .expect("register failed");
        assert_eq!(second.role, UserRole::Artist);
    }

    #[tokio::test]
    async fn test_register_validation() {
        let service = setup().await;

        let mut input = register_input("ok_name", UserRole::Community);
        input.password = "short".to_string();
        assert!(matches!(
            service.register(input).await,
            Err(UserServiceError::ValidationError(_))
        ));

        let mut input = register_input("x", UserRole::Community);
        input.username = "x".to_string();
        assert!(matches!(
            service.register(input).await,
            Err(UserServiceError::ValidationError(_))
        ));

        assert!(matches!(
            service.register(register_input("sneaky", UserRole::Admin)).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = setup().await;

        service
            .register(register_input("alice", UserRole::Community))
            .await
            .expect("register failed");
        assert!(matches!(
            service.register(register_input("alice", UserRole::Artist)).await,
            Err(UserServiceError::UserExists(_))
        ));
    }

    #[tokio::test]
    async fn test_login_and_validate_session() {
        let service = setup().await;

        let user = service
            .register(register_input("alice", UserRole::Community))
            .await
            .expect("register failed");

        let session = service
            .login(LoginInput {
                username_or_email: "alice".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("login failed");

        let validated = service
            .validate_session(&session.id)
            .await
            .expect("validate failed")
            .expect("session should be valid");
        assert_eq!(validated.id, user.id);

        service.logout(&session.id).await.expect("logout failed");
        assert!(service
            .validate_session(&session.id)
            .await
            .expect("validate failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;

        service
            .register(register_input("alice", UserRole::Community))
            .await
            .expect("register failed");
        assert!(matches!(
            service
                .login(LoginInput {
                    username_or_email: "alice".to_string(),
                    password: "wrong-password".to_string(),
                })
                .await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_banned_user_cannot_login() {
        let service = setup().await;

        service
            .register(register_input("admin", UserRole::Community))
            .await
            .expect("register failed");
        let user = service
            .register(register_input("troll", UserRole::Community))
            .await
            .expect("register failed");

        service
            .set_status(user.id, UserStatus::Banned)
            .await
            .expect("ban failed");
        assert!(matches!(
            service
                .login(LoginInput {
                    username_or_email: "troll".to_string(),
                    password: "hunter2hunter2".to_string(),
                })
                .await,
            Err(UserServiceError::Banned)
        ));
    }

    #[tokio::test]
    async fn test_ban_revokes_sessions() {
        let service = setup().await;

        service
            .register(register_input("admin", UserRole::Community))
            .await
            .expect("register failed");
        let user = service
            .register(register_input("troll", UserRole::Community))
            .await
            .expect("register failed");
        let session = service
            .login(LoginInput {
                username_or_email: "troll".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("login failed");

        service
            .set_status(user.id, UserStatus::Banned)
            .await
            .expect("ban failed");
        assert!(service
            .validate_session(&session.id)
            .await
            .expect("validate failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_admin_cannot_be_banned() {
        let service = setup().await;

        let admin = service
            .register(register_input("admin", UserRole::Community))
            .await
            .expect("register failed");
        assert!(matches!(
            service.set_status(admin.id, UserStatus::Banned).await,
            Err(UserServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_revokes_sessions() {
        let service = setup().await;

        let user = service
            .register(register_input("alice", UserRole::Community))
            .await
            .expect("register failed");
        let session = service
            .login(LoginInput {
                username_or_email: "alice".to_string(),
                password: "hunter2hunter2".to_string(),
            })
            .await
            .expect("login failed");

        service
            .change_password(user.id, "hunter2hunter2", "aNewPassword99")
            .await
            .expect("change failed");
        assert!(service
            .validate_session(&session.id)
            .await
            .expect("validate failed")
            .is_none());

        service
            .login(LoginInput {
                username_or_email: "alice".to_string(),
                password: "aNewPassword99".to_string(),
            })
            .await
            .expect("login with new password failed");
    }

    #[tokio::test]
    async fn test_set_rating_bounds() {
        let service = setup().await;

        let user = service
            .register(register_input("artist", UserRole::Community))
            .await
            .expect("register failed");
        assert!(service.set_rating(user.id, 5.1).await.is_err());
        let updated = service.set_rating(user.id, 4.5).await.expect("rating failed");
        assert!((updated.rating - 4.5).abs() < f64::EPSILON);
    }
}

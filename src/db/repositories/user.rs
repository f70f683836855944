//! User repository
//!
//! Database operations for users: account CRUD, lookups by the unique
//! username/email columns, and the paginated admin listing.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{User, UserRole, UserStatus};

/// User repository trait
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user, returning it with its assigned id
    async fn create(&self, user: &User) -> Result<User>;

    /// Get user by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Get user by username
    async fn get_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Get user by email
    async fn get_by_email(&self, email: &str) -> Result<Option<User>>;

    /// Update a user (all mutable columns)
    async fn update(&self, user: &User) -> Result<User>;

    /// Count total users
    async fn count(&self) -> Result<i64>;

    /// List users with pagination and optional role/status filters
    async fn list(
        &self,
        page: u32,
        per_page: u32,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<(Vec<User>, i64)>;
}

/// SQLx-based user repository implementation
pub struct SqlxUserRepository {
    pool: SqlitePool,
}

impl SqlxUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn UserRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Map a database row to a User
fn map_user_row(row: &sqlx::sqlite::SqliteRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role: UserRole::from_str(row.get::<String, _>("role").as_str()).unwrap_or_default(),
        status: UserStatus::from_str(row.get::<String, _>("status").as_str()).unwrap_or_default(),
        display_name: row.get("display_name"),
        bio: row.get("bio"),
        avatar: row.get("avatar"),
        follower_count: row.get("follower_count"),
        following_count: row.get("following_count"),
        total_sales: row.get("total_sales"),
        rating: row.get("rating"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl UserRepository for SqlxUserRepository {
    async fn create(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO users
               (username, email, password_hash, role, status, display_name, bio, avatar, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.status.to_string())
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let mut created = user.clone();
        created.id = result.last_insert_rowid();
        created.created_at = now;
        created.updated_at = now;
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_user_row(&r)))
    }

    async fn get_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_user_row(&r)))
    }

    async fn get_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_user_row(&r)))
    }

    async fn update(&self, user: &User) -> Result<User> {
        let now = Utc::now();
        sqlx::query(
            r#"UPDATE users SET
               username = ?, email = ?, password_hash = ?, role = ?, status = ?,
               display_name = ?, bio = ?, avatar = ?, rating = ?, updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.status.to_string())
        .bind(&user.display_name)
        .bind(&user.bio)
        .bind(&user.avatar)
        .bind(user.rating)
        .bind(now)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        let mut updated = user.clone();
        updated.updated_at = now;
        Ok(updated)
    }

    async fn count(&self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn list(
        &self,
        page: u32,
        per_page: u32,
        role: Option<UserRole>,
        status: Option<UserStatus>,
    ) -> Result<(Vec<User>, i64)> {
        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let role = role.map(|r| r.to_string());
        let status = status.map(|s| s.to_string());

        let total: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM users
               WHERE (? IS NULL OR role = ?) AND (? IS NULL OR status = ?)"#,
        )
        .bind(&role)
        .bind(&role)
        .bind(&status)
        .bind(&status)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(
            r#"SELECT * FROM users
               WHERE (? IS NULL OR role = ?) AND (? IS NULL OR status = ?)
               ORDER BY created_at DESC
               LIMIT ? OFFSET ?"#,
        )
        .bind(&role)
        .bind(&role)
        .bind(&status)
        .bind(&status)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_user_row).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup() -> SqlxUserRepository {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations failed");
        SqlxUserRepository::new(pool)
    }

    fn sample_user(name: &str, role: UserRole) -> User {
        User::new(
            name.to_string(),
            format!("{}@example.com", name),
            "hash".to_string(),
            role,
        )
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let repo = setup().await;
        let created = repo
            .create(&sample_user("painter", UserRole::Artist))
            .await
            .expect("create failed");
        assert!(created.id > 0);

        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("user missing");
        assert_eq!(fetched.username, "painter");
        assert_eq!(fetched.role, UserRole::Artist);
        assert_eq!(fetched.follower_count, 0);
    }

    #[tokio::test]
    async fn test_get_by_username_and_email() {
        let repo = setup().await;
        repo.create(&sample_user("collector", UserRole::Community))
            .await
            .expect("create failed");

        assert!(repo
            .get_by_username("collector")
            .await
            .expect("query failed")
            .is_some());
        assert!(repo
            .get_by_email("collector@example.com")
            .await
            .expect("query failed")
            .is_some());
        assert!(repo
            .get_by_username("nobody")
            .await
            .expect("query failed")
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = setup().await;
        repo.create(&sample_user("dup", UserRole::Community))
            .await
            .expect("create failed");
        let mut second = sample_user("dup", UserRole::Community);
        second.email = "other@example.com".to_string();
        assert!(repo.create(&second).await.is_err());
    }

    #[tokio::test]
    async fn test_update() {
        let repo = setup().await;
        let mut user = repo
            .create(&sample_user("editme", UserRole::Community))
            .await
            .expect("create failed");

        user.display_name = Some("Edit Me".to_string());
        user.status = UserStatus::Banned;
        repo.update(&user).await.expect("update failed");

        let fetched = repo
            .get_by_id(user.id)
            .await
            .expect("get failed")
            .expect("user missing");
        assert_eq!(fetched.display_name.as_deref(), Some("Edit Me"));
        assert_eq!(fetched.status, UserStatus::Banned);
    }

    #[tokio::test]
    async fn test_list_with_role_filter() {
        let repo = setup().await;
        repo.create(&sample_user("artist1", UserRole::Artist))
            .await
            .expect("create failed");
        repo.create(&sample_user("artist2", UserRole::Artist))
            .await
            .expect("create failed");
        repo.create(&sample_user("member1", UserRole::Community))
            .await
            .expect("create failed");

        let (all, total) = repo.list(1, 10, None, None).await.expect("list failed");
        assert_eq!(total, 3);
        assert_eq!(all.len(), 3);

        let (artists, total) = repo
            .list(1, 10, Some(UserRole::Artist), None)
            .await
            .expect("list failed");
        assert_eq!(total, 2);
        assert!(artists.iter().all(|u| u.role == UserRole::Artist));
    }

    #[tokio::test]
    async fn test_count() {
        let repo = setup().await;
        assert_eq!(repo.count().await.expect("count failed"), 0);
        repo.create(&sample_user("one", UserRole::Community))
            .await
            .expect("create failed");
        assert_eq!(repo.count().await.expect("count failed"), 1);
    }
}

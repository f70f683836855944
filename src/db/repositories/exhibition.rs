//! Exhibition repository
//!
//! Registration holds the capacity check and the cached registrant counter
//! together in a transaction, so an event can never oversell its seats.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{
    CreateExhibitionInput, Exhibition, ExhibitionKind, Registrant, UpdateExhibitionInput,
};

/// Outcome of a registration attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegisterOutcome {
    Registered,
    AlreadyRegistered,
    Full,
}

/// Exhibition repository trait
#[async_trait]
pub trait ExhibitionRepository: Send + Sync {
    /// Create an exhibition
    async fn create(&self, organizer_id: i64, input: CreateExhibitionInput) -> Result<Exhibition>;

    /// Get an exhibition by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Exhibition>>;

    /// Apply a partial update. Returns the updated row, or None if missing.
    async fn update(&self, id: i64, input: UpdateExhibitionInput) -> Result<Option<Exhibition>>;

    /// Delete an exhibition and its registrations. Returns false if missing.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List exhibitions of a kind, soonest first, optionally only upcoming
    async fn list(
        &self,
        kind: ExhibitionKind,
        upcoming_only: bool,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Exhibition>, i64)>;

    /// List exhibitions organized by a user, soonest first
    async fn list_for_organizer(&self, organizer_id: i64) -> Result<Vec<Exhibition>>;

    /// Register a user, respecting capacity
    async fn register(&self, exhibition_id: i64, user_id: i64) -> Result<RegisterOutcome>;

    /// Withdraw a registration. Returns false if there was none.
    async fn unregister(&self, exhibition_id: i64, user_id: i64) -> Result<bool>;

    /// Whether the user is registered
    async fn is_registered(&self, exhibition_id: i64, user_id: i64) -> Result<bool>;

    /// The attendee list, in registration order
    async fn registrants(&self, exhibition_id: i64) -> Result<Vec<Registrant>>;

    /// Bump the listing-page view counter
    async fn increment_view(&self, id: i64) -> Result<()>;

    /// Bump the virtual-event visit counter
    async fn increment_visit(&self, id: i64) -> Result<()>;
}

/// SQLx-based exhibition repository implementation
pub struct SqlxExhibitionRepository {
    pool: SqlitePool,
}

impl SqlxExhibitionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ExhibitionRepository> {
        Arc::new(Self::new(pool))
    }
}

fn map_exhibition_row(row: &sqlx::sqlite::SqliteRow) -> Exhibition {
    Exhibition {
        id: row.get("id"),
        organizer_id: row.get("organizer_id"),
        kind: row
            .get::<String, _>("kind")
            .parse()
            .unwrap_or_default(),
        title: row.get("title"),
        description: row.get("description"),
        location: row.get("location"),
        starts_at: row.get("starts_at"),
        ends_at: row.get("ends_at"),
        capacity: row.get("capacity"),
        registrant_count: row.get("registrant_count"),
        view_count: row.get("view_count"),
        visit_count: row.get("visit_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ExhibitionRepository for SqlxExhibitionRepository {
    async fn create(&self, organizer_id: i64, input: CreateExhibitionInput) -> Result<Exhibition> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"INSERT INTO exhibitions
               (organizer_id, kind, title, description, location, starts_at, ends_at, capacity, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(organizer_id)
        .bind(input.kind.to_string())
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.location)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(input.capacity)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Exhibition {
            id: result.last_insert_rowid(),
            organizer_id,
            kind: input.kind,
            title: input.title,
            description: input.description,
            location: input.location,
            starts_at: input.starts_at,
            ends_at: input.ends_at,
            capacity: input.capacity,
            registrant_count: 0,
            view_count: 0,
            visit_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Exhibition>> {
        let row = sqlx::query("SELECT * FROM exhibitions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_exhibition_row(&r)))
    }

    async fn update(&self, id: i64, input: UpdateExhibitionInput) -> Result<Option<Exhibition>> {
        // Capacity distinguishes "leave alone" (outer None) from
        // "set unlimited" (Some(None)), so it gets its own flag bind.
        let set_capacity = input.capacity.is_some();
        let capacity = input.capacity.flatten();

        sqlx::query(
            r#"UPDATE exhibitions SET
                   title = COALESCE(?, title),
                   description = COALESCE(?, description),
                   location = COALESCE(?, location),
                   starts_at = COALESCE(?, starts_at),
                   ends_at = COALESCE(?, ends_at),
                   capacity = CASE WHEN ? THEN ? ELSE capacity END,
                   updated_at = ?
               WHERE id = ?"#,
        )
        .bind(input.title)
        .bind(input.description)
        .bind(input.location)
        .bind(input.starts_at)
        .bind(input.ends_at)
        .bind(set_capacity)
        .bind(capacity)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM exhibitions WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        kind: ExhibitionKind,
        upcoming_only: bool,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<Exhibition>, i64)> {
        let now = Utc::now();
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM exhibitions WHERE kind = ? AND (? = 0 OR ends_at > ?)",
        )
        .bind(kind.to_string())
        .bind(upcoming_only)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            r#"SELECT * FROM exhibitions
               WHERE kind = ? AND (? = 0 OR ends_at > ?)
               ORDER BY starts_at ASC, id ASC
               LIMIT ? OFFSET ?"#,
        )
        .bind(kind.to_string())
        .bind(upcoming_only)
        .bind(now)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_exhibition_row).collect(), total))
    }

    async fn list_for_organizer(&self, organizer_id: i64) -> Result<Vec<Exhibition>> {
        let rows = sqlx::query(
            "SELECT * FROM exhibitions WHERE organizer_id = ? ORDER BY starts_at ASC, id ASC",
        )
        .bind(organizer_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.iter().map(map_exhibition_row).collect())
    }

    async fn register(&self, exhibition_id: i64, user_id: i64) -> Result<RegisterOutcome> {
        let mut tx = self.pool.begin().await?;

        // Seat check and counter bump are guarded by the same statement so a
        // concurrent registration cannot slip past capacity.
        let claimed = sqlx::query(
            r#"UPDATE exhibitions
               SET registrant_count = registrant_count + 1, updated_at = ?
               WHERE id = ? AND (capacity IS NULL OR registrant_count < capacity)"#,
        )
        .bind(Utc::now())
        .bind(exhibition_id)
        .execute(&mut *tx)
        .await?;
        if claimed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RegisterOutcome::Full);
        }

        let inserted = sqlx::query(
            "INSERT OR IGNORE INTO exhibition_registrations (exhibition_id, user_id) VALUES (?, ?)",
        )
        .bind(exhibition_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if inserted.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(RegisterOutcome::AlreadyRegistered);
        }

        tx.commit().await?;
        Ok(RegisterOutcome::Registered)
    }

    async fn unregister(&self, exhibition_id: i64, user_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let removed = sqlx::query(
            "DELETE FROM exhibition_registrations WHERE exhibition_id = ? AND user_id = ?",
        )
        .bind(exhibition_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;
        if removed.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"UPDATE exhibitions
               SET registrant_count = MAX(0, registrant_count - 1), updated_at = ?
               WHERE id = ?"#,
        )
        .bind(Utc::now())
        .bind(exhibition_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn is_registered(&self, exhibition_id: i64, user_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM exhibition_registrations WHERE exhibition_id = ? AND user_id = ?",
        )
        .bind(exhibition_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn registrants(&self, exhibition_id: i64) -> Result<Vec<Registrant>> {
        let rows = sqlx::query(
            r#"SELECT r.user_id, r.registered_at, u.username, u.display_name
               FROM exhibition_registrations r
               JOIN users u ON u.id = r.user_id
               WHERE r.exhibition_id = ?
               ORDER BY r.registered_at ASC, r.user_id ASC"#,
        )
        .bind(exhibition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| Registrant {
                user_id: row.get("user_id"),
                username: row.get("username"),
                display_name: row.get("display_name"),
                registered_at: row.get("registered_at"),
            })
            .collect())
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE exhibitions SET view_count = view_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment_visit(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE exhibitions SET visit_count = visit_count + 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxUserRepository, UserRepository};
    use crate::db::{create_test_pool, migrations};
    use crate::models::{User, UserRole};
    use chrono::Duration;

    fn sample_input(kind: ExhibitionKind, capacity: Option<i64>) -> CreateExhibitionInput {
        let now = Utc::now();
        CreateExhibitionInput {
            kind,
            title: "Spring Salon".to_string(),
            description: "Group show".to_string(),
            location: "Gallery 12".to_string(),
            starts_at: now + Duration::days(7),
            ends_at: now + Duration::days(9),
            capacity,
        }
    }

    async fn setup() -> (SqlxExhibitionRepository, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations failed");

        let users = SqlxUserRepository::new(pool.clone());
        let organizer = users
            .create(&User::new(
                "organizer".to_string(),
                "org@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create failed");
        let guest = users
            .create(&User::new(
                "guest".to_string(),
                "guest@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create failed");

        (SqlxExhibitionRepository::new(pool), organizer.id, guest.id)
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, organizer_id, _) = setup().await;

        let created = repo
            .create(organizer_id, sample_input(ExhibitionKind::Physical, Some(50)))
            .await
            .expect("create failed");
        let fetched = repo
            .get_by_id(created.id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(fetched.title, "Spring Salon");
        assert_eq!(fetched.kind, ExhibitionKind::Physical);
        assert_eq!(fetched.capacity, Some(50));
        assert_eq!(fetched.registrant_count, 0);
    }

    #[tokio::test]
    async fn test_update_capacity_semantics() {
        let (repo, organizer_id, _) = setup().await;

        let created = repo
            .create(organizer_id, sample_input(ExhibitionKind::Physical, Some(50)))
            .await
            .expect("create failed");

        // Omitted capacity stays put
        let updated = repo
            .update(
                created.id,
                UpdateExhibitionInput {
                    title: Some("Autumn Salon".to_string()),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed")
            .expect("missing");
        assert_eq!(updated.title, "Autumn Salon");
        assert_eq!(updated.capacity, Some(50));

        // Explicit null clears it
        let updated = repo
            .update(
                created.id,
                UpdateExhibitionInput {
                    capacity: Some(None),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed")
            .expect("missing");
        assert_eq!(updated.capacity, None);
    }

    #[tokio::test]
    async fn test_register_capacity_and_duplicates() {
        let (repo, organizer_id, guest_id) = setup().await;

        let expo = repo
            .create(organizer_id, sample_input(ExhibitionKind::Physical, Some(1)))
            .await
            .expect("create failed");

        assert_eq!(
            repo.register(expo.id, guest_id).await.expect("register failed"),
            RegisterOutcome::Registered
        );
        assert_eq!(
            repo.register(expo.id, guest_id).await.expect("register failed"),
            RegisterOutcome::AlreadyRegistered
        );
        assert_eq!(
            repo.register(expo.id, organizer_id)
                .await
                .expect("register failed"),
            RegisterOutcome::Full
        );

        let expo = repo
            .get_by_id(expo.id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(expo.registrant_count, 1);
        assert!(expo.is_full());
    }

    #[tokio::test]
    async fn test_unregister_frees_a_seat() {
        let (repo, organizer_id, guest_id) = setup().await;

        let expo = repo
            .create(organizer_id, sample_input(ExhibitionKind::Physical, Some(1)))
            .await
            .expect("create failed");
        repo.register(expo.id, guest_id).await.expect("register failed");
        assert!(repo
            .unregister(expo.id, guest_id)
            .await
            .expect("unregister failed"));
        assert!(!repo
            .unregister(expo.id, guest_id)
            .await
            .expect("unregister failed"));

        assert_eq!(
            repo.register(expo.id, organizer_id)
                .await
                .expect("register failed"),
            RegisterOutcome::Registered
        );
    }

    #[tokio::test]
    async fn test_list_filters_by_kind() {
        let (repo, organizer_id, _) = setup().await;

        repo.create(organizer_id, sample_input(ExhibitionKind::Physical, None))
            .await
            .expect("create failed");
        repo.create(organizer_id, sample_input(ExhibitionKind::Virtual, None))
            .await
            .expect("create failed");

        let (physical, total) = repo
            .list(ExhibitionKind::Physical, false, 1, 10)
            .await
            .expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(physical[0].kind, ExhibitionKind::Physical);

        let (virtuals, total) = repo
            .list(ExhibitionKind::Virtual, true, 1, 10)
            .await
            .expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(virtuals[0].kind, ExhibitionKind::Virtual);
    }

    #[tokio::test]
    async fn test_registrants_listing() {
        let (repo, organizer_id, guest_id) = setup().await;

        let expo = repo
            .create(organizer_id, sample_input(ExhibitionKind::Physical, None))
            .await
            .expect("create failed");
        repo.register(expo.id, guest_id).await.expect("register failed");

        let registrants = repo.registrants(expo.id).await.expect("registrants failed");
        assert_eq!(registrants.len(), 1);
        assert_eq!(registrants[0].username, "guest");
        assert!(repo
            .is_registered(expo.id, guest_id)
            .await
            .expect("is_registered failed"));
    }

    #[tokio::test]
    async fn test_view_and_visit_counters() {
        let (repo, organizer_id, _) = setup().await;

        let expo = repo
            .create(organizer_id, sample_input(ExhibitionKind::Virtual, None))
            .await
            .expect("create failed");
        repo.increment_view(expo.id).await.expect("view failed");
        repo.increment_visit(expo.id).await.expect("visit failed");
        repo.increment_visit(expo.id).await.expect("visit failed");

        let expo = repo
            .get_by_id(expo.id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(expo.view_count, 1);
        assert_eq!(expo.visit_count, 2);
    }
}

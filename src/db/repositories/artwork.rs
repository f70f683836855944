//! Artwork repository
//!
//! Database operations for artworks: CRUD, filtered listings, status
//! transitions, and the view counter. The `images` column stores a JSON
//! array of URLs; encoding and decoding happen here so callers only ever
//! see `Vec<String>`.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use std::sync::Arc;

use crate::models::{
    Artwork, ArtworkListParams, ArtworkSort, ArtworkStatus, CreateArtworkInput, UpdateArtworkInput,
};

/// Artwork repository trait
#[async_trait]
pub trait ArtworkRepository: Send + Sync {
    /// Create a new artwork for the given artist
    async fn create(&self, artist_id: i64, input: CreateArtworkInput) -> Result<Artwork>;

    /// Get artwork by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Artwork>>;

    /// Apply a partial update, returning the updated artwork
    async fn update(&self, id: i64, input: UpdateArtworkInput) -> Result<Option<Artwork>>;

    /// Delete an artwork
    async fn delete(&self, id: i64) -> Result<bool>;

    /// List artworks with filters, sorting and pagination
    async fn list(&self, params: &ArtworkListParams) -> Result<(Vec<Artwork>, i64)>;

    /// Move an artwork to a new status
    async fn set_status(&self, id: i64, status: ArtworkStatus) -> Result<bool>;

    /// Increment the view counter
    async fn increment_view(&self, id: i64) -> Result<()>;
}

/// SQLx-based artwork repository implementation
pub struct SqlxArtworkRepository {
    pool: SqlitePool,
}

impl SqlxArtworkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn ArtworkRepository> {
        Arc::new(Self::new(pool))
    }
}

/// Map a database row to an Artwork
pub(crate) fn map_artwork_row(row: &sqlx::sqlite::SqliteRow) -> Artwork {
    let images: Vec<String> =
        serde_json::from_str(row.get::<String, _>("images").as_str()).unwrap_or_default();
    Artwork {
        id: row.get("id"),
        artist_id: row.get("artist_id"),
        title: row.get("title"),
        description: row.get("description"),
        category: row.get("category"),
        price_minor: row.get("price_minor"),
        currency: row.get("currency"),
        images,
        status: ArtworkStatus::from_str(row.get::<String, _>("status").as_str())
            .unwrap_or_default(),
        like_count: row.get("like_count"),
        view_count: row.get("view_count"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

#[async_trait]
impl ArtworkRepository for SqlxArtworkRepository {
    async fn create(&self, artist_id: i64, input: CreateArtworkInput) -> Result<Artwork> {
        let now = Utc::now();
        let images_json = serde_json::to_string(&input.images)?;
        let result = sqlx::query(
            r#"INSERT INTO artworks
               (artist_id, title, description, category, price_minor, currency, images, status, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, 'available', ?, ?)"#,
        )
        .bind(artist_id)
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.price_minor)
        .bind(&input.currency)
        .bind(&images_json)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Artwork {
            id: result.last_insert_rowid(),
            artist_id,
            title: input.title,
            description: input.description,
            category: input.category,
            price_minor: input.price_minor,
            currency: input.currency,
            images: input.images,
            status: ArtworkStatus::Available,
            like_count: 0,
            view_count: 0,
            created_at: now,
            updated_at: now,
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Artwork>> {
        let row = sqlx::query("SELECT * FROM artworks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| map_artwork_row(&r)))
    }

    async fn update(&self, id: i64, input: UpdateArtworkInput) -> Result<Option<Artwork>> {
        let images_json = match &input.images {
            Some(images) => Some(serde_json::to_string(images)?),
            None => None,
        };

        let result = sqlx::query(
            r#"UPDATE artworks SET
               title = COALESCE(?, title),
               description = COALESCE(?, description),
               category = COALESCE(?, category),
               price_minor = COALESCE(?, price_minor),
               images = COALESCE(?, images),
               updated_at = ?
               WHERE id = ?"#,
        )
        .bind(&input.title)
        .bind(&input.description)
        .bind(&input.category)
        .bind(input.price_minor)
        .bind(&images_json)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_by_id(id).await
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM artworks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list(&self, params: &ArtworkListParams) -> Result<(Vec<Artwork>, i64)> {
        let offset = (params.page.saturating_sub(1) as i64).saturating_mul(params.page_size as i64);
        // Substring match, case-insensitive via LIKE
        let search = params.search.as_ref().map(|s| format!("%{}%", s));

        let filter = r#"
            (? = 1 OR status = 'available')
            AND (? IS NULL OR category = ?)
            AND (? IS NULL OR artist_id = ?)
            AND (? IS NULL OR price_minor >= ?)
            AND (? IS NULL OR price_minor <= ?)
            AND (? IS NULL OR title LIKE ?)
        "#;

        let order_by = match params.sort {
            ArtworkSort::Newest => "created_at DESC",
            ArtworkSort::PriceAsc => "price_minor ASC",
            ArtworkSort::PriceDesc => "price_minor DESC",
            ArtworkSort::Popular => "like_count DESC, view_count DESC",
        };

        let include = params.include_unavailable as i64;

        let total: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM artworks WHERE {}",
            filter
        ))
        .bind(include)
        .bind(&params.category)
        .bind(&params.category)
        .bind(params.artist_id)
        .bind(params.artist_id)
        .bind(params.min_price)
        .bind(params.min_price)
        .bind(params.max_price)
        .bind(params.max_price)
        .bind(&search)
        .bind(&search)
        .fetch_one(&self.pool)
        .await?;

        let rows = sqlx::query(&format!(
            "SELECT * FROM artworks WHERE {} ORDER BY {} LIMIT ? OFFSET ?",
            filter, order_by
        ))
        .bind(include)
        .bind(&params.category)
        .bind(&params.category)
        .bind(params.artist_id)
        .bind(params.artist_id)
        .bind(params.min_price)
        .bind(params.min_price)
        .bind(params.max_price)
        .bind(params.max_price)
        .bind(&search)
        .bind(&search)
        .bind(params.page_size as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok((rows.iter().map(map_artwork_row).collect(), total))
    }

    async fn set_status(&self, id: i64, status: ArtworkStatus) -> Result<bool> {
        let result = sqlx::query("UPDATE artworks SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status.to_string())
            .bind(Utc::now())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn increment_view(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE artworks SET view_count = view_count + 1 WHERE id = ?")
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

    async fn setup() -> (SqlxArtworkRepository, i64) {
        let pool = create_test_pool().await.expect("Failed to create pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Migrations failed");

        let users = SqlxUserRepository::new(pool.clone());
        let artist = users
            .create(&User::new(
                "artist".to_string(),
                "artist@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create artist failed");

        (SqlxArtworkRepository::new(pool), artist.id)
    }

    fn input(title: &str, category: &str, price: i64) -> CreateArtworkInput {
        CreateArtworkInput {
            title: title.to_string(),
            description: "desc".to_string(),
            category: category.to_string(),
            price_minor: price,
            currency: "USD".to_string(),
            images: vec!["https://img.example.com/1.jpg".to_string()],
        }
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let (repo, artist_id) = setup().await;
        let artwork = repo
            .create(artist_id, input("Sunset", "painting", 12000))
            .await
            .expect("create failed");

        assert!(artwork.id > 0);
        assert_eq!(artwork.status, ArtworkStatus::Available);

        let fetched = repo
            .get_by_id(artwork.id)
            .await
            .expect("get failed")
            .expect("artwork missing");
        assert_eq!(fetched.title, "Sunset");
        assert_eq!(fetched.images.len(), 1);
        assert_eq!(fetched.price_minor, 12000);
    }

    #[tokio::test]
    async fn test_partial_update() {
        let (repo, artist_id) = setup().await;
        let artwork = repo
            .create(artist_id, input("Sunset", "painting", 12000))
            .await
            .expect("create failed");

        let updated = repo
            .update(
                artwork.id,
                UpdateArtworkInput {
                    price_minor: Some(15000),
                    ..Default::default()
                },
            )
            .await
            .expect("update failed")
            .expect("artwork missing");

        assert_eq!(updated.price_minor, 15000);
        assert_eq!(updated.title, "Sunset");
    }

    #[tokio::test]
    async fn test_list_filters_by_status() {
        let (repo, artist_id) = setup().await;
        let a = repo
            .create(artist_id, input("A", "painting", 100))
            .await
            .expect("create failed");
        repo.create(artist_id, input("B", "painting", 200))
            .await
            .expect("create failed");

        repo.set_status(a.id, ArtworkStatus::Sold)
            .await
            .expect("set_status failed");

        let params = ArtworkListParams {
            page: 1,
            page_size: 10,
            ..Default::default()
        };
        let (items, total) = repo.list(&params).await.expect("list failed");
        assert_eq!(total, 1);
        assert_eq!(items[0].title, "B");

        let params = ArtworkListParams {
            page: 1,
            page_size: 10,
            include_unavailable: true,
            ..Default::default()
        };
        let (_, total) = repo.list(&params).await.expect("list failed");
        assert_eq!(total, 2);
    }

    #[tokio::test]
    async fn test_list_price_range_and_search() {
        let (repo, artist_id) = setup().await;
        repo.create(artist_id, input("Blue Nocturne", "painting", 5000))
            .await
            .expect("create failed");
        repo.create(artist_id, input("Red Dawn", "painting", 20000))
            .await
            .expect("create failed");

        let params = ArtworkListParams {
            page: 1,
            page_size: 10,
            min_price: Some(10000),
            ..Default::default()
        };
        let (items, _) = repo.list(&params).await.expect("list failed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Red Dawn");

        let params = ArtworkListParams {
            page: 1,
            page_size: 10,
            search: Some("nocturne".to_string()),
            ..Default::default()
        };
        let (items, _) = repo.list(&params).await.expect("list failed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, "Blue Nocturne");
    }

    #[tokio::test]
    async fn test_list_sort_by_price() {
        let (repo, artist_id) = setup().await;
        repo.create(artist_id, input("Cheap", "print", 100))
            .await
            .expect("create failed");
        repo.create(artist_id, input("Expensive", "print", 99999))
            .await
            .expect("create failed");

        let params = ArtworkListParams {
            page: 1,
            page_size: 10,
            sort: ArtworkSort::PriceDesc,
            ..Default::default()
        };
        let (items, _) = repo.list(&params).await.expect("list failed");
        assert_eq!(items[0].title, "Expensive");
    }

    #[tokio::test]
    async fn test_increment_view() {
        let (repo, artist_id) = setup().await;
        let artwork = repo
            .create(artist_id, input("Viewed", "painting", 100))
            .await
            .expect("create failed");

        repo.increment_view(artwork.id).await.expect("view failed");
        repo.increment_view(artwork.id).await.expect("view failed");

        let fetched = repo
            .get_by_id(artwork.id)
            .await
            .expect("get failed")
            .expect("artwork missing");
        assert_eq!(fetched.view_count, 2);
    }

    #[tokio::test]
    async fn test_delete() {
        let (repo, artist_id) = setup().await;
        let artwork = repo
            .create(artist_id, input("Gone", "painting", 100))
            .await
            .expect("create failed");

        assert!(repo.delete(artwork.id).await.expect("delete failed"));
        assert!(!repo.delete(artwork.id).await.expect("delete failed"));
    }
}

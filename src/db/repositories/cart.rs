//! Cart repository
//!
//! The cart is a set of (user, artwork) rows. Quantity is always one since
//! each artwork is a unique piece.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::sync::Arc;

use crate::models::{ArtworkStatus, CartItemDetail};

/// Cart repository trait
#[async_trait]
pub trait CartRepository: Send + Sync {
    /// Add an artwork to the user's cart. Returns false if already present.
    async fn add(&self, user_id: i64, artwork_id: i64) -> Result<bool>;

    /// Remove an artwork from the user's cart. Returns false if not present.
    async fn remove(&self, user_id: i64, artwork_id: i64) -> Result<bool>;

    /// Remove all items from the user's cart
    async fn clear(&self, user_id: i64) -> Result<()>;

    /// Check whether the artwork is in the user's cart
    async fn contains(&self, user_id: i64, artwork_id: i64) -> Result<bool>;

    /// List the user's cart with artwork and artist details, newest first
    async fn items(&self, user_id: i64) -> Result<Vec<CartItemDetail>>;
}

/// SQLx-based cart repository implementation
pub struct SqlxCartRepository {
    pool: SqlitePool,
}

impl SqlxCartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn CartRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl CartRepository for SqlxCartRepository {
    async fn add(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO cart_items (user_id, artwork_id) VALUES (?, ?)",
        )
        .bind(user_id)
        .bind(artwork_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn remove(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM cart_items WHERE user_id = ? AND artwork_id = ?")
            .bind(user_id)
            .bind(artwork_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn clear(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM cart_items WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn contains(&self, user_id: i64, artwork_id: i64) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM cart_items WHERE user_id = ? AND artwork_id = ?",
        )
        .bind(user_id)
        .bind(artwork_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    async fn items(&self, user_id: i64) -> Result<Vec<CartItemDetail>> {
        let rows = sqlx::query(
            r#"SELECT c.artwork_id, c.added_at, a.title, a.price_minor, a.currency,
                      a.status, a.images, a.artist_id, u.username AS artist_name
               FROM cart_items c
               JOIN artworks a ON a.id = c.artwork_id
               JOIN users u ON u.id = a.artist_id
               WHERE c.user_id = ?
               ORDER BY c.added_at DESC, c.artwork_id DESC"#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let images: Vec<String> =
                serde_json::from_str(&row.get::<String, _>("images")).unwrap_or_default();
            let status: String = row.get("status");
            items.push(CartItemDetail {
                artwork_id: row.get("artwork_id"),
                title: row.get("title"),
                price_minor: row.get("price_minor"),
                currency: row.get("currency"),
                status: status.parse::<ArtworkStatus>().unwrap_or_default(),
                artist_id: row.get("artist_id"),
                artist_name: row.get("artist_name"),
                image: images.into_iter().next(),
                added_at: row.get("added_at"),
            });
        }
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ArtworkRepository, SqlxArtworkRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArtworkInput, User, UserRole};

    async fn setup() -> (SqlxCartRepository, SqlxArtworkRepository, i64, i64) {
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
        let buyer = users
            .create(&User::new(
                "buyer".to_string(),
                "buyer@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create buyer failed");

        let artworks = SqlxArtworkRepository::new(pool.clone());
        let artwork = artworks
            .create(
                artist.id,
                CreateArtworkInput {
                    title: "Cartable".to_string(),
                    description: String::new(),
                    category: "painting".to_string(),
                    price_minor: 2500,
                    currency: "USD".to_string(),
                    images: vec!["a.jpg".to_string(), "b.jpg".to_string()],
                },
            )
            .await
            .expect("create artwork failed");

        (SqlxCartRepository::new(pool), artworks, artwork.id, buyer.id)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (cart, _, artwork_id, buyer_id) = setup().await;

        assert!(cart.add(buyer_id, artwork_id).await.expect("add failed"));
        let items = cart.items(buyer_id).await.expect("items failed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].artwork_id, artwork_id);
        assert_eq!(items[0].title, "Cartable");
        assert_eq!(items[0].artist_name, "artist");
        assert_eq!(items[0].image.as_deref(), Some("a.jpg"));
        assert!(items[0].is_purchasable());
    }

    #[tokio::test]
    async fn test_add_duplicate() {
        let (cart, _, artwork_id, buyer_id) = setup().await;
        assert!(cart.add(buyer_id, artwork_id).await.expect("add failed"));
        assert!(!cart.add(buyer_id, artwork_id).await.expect("add failed"));
        assert_eq!(cart.items(buyer_id).await.expect("items failed").len(), 1);
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let (cart, _, artwork_id, buyer_id) = setup().await;
        cart.add(buyer_id, artwork_id).await.expect("add failed");
        assert!(cart
            .remove(buyer_id, artwork_id)
            .await
            .expect("remove failed"));
        assert!(!cart
            .remove(buyer_id, artwork_id)
            .await
            .expect("remove failed"));

        cart.add(buyer_id, artwork_id).await.expect("add failed");
        cart.clear(buyer_id).await.expect("clear failed");
        assert!(cart.items(buyer_id).await.expect("items failed").is_empty());
    }

    #[tokio::test]
    async fn test_sold_artwork_not_purchasable() {
        let (cart, artworks, artwork_id, buyer_id) = setup().await;
        cart.add(buyer_id, artwork_id).await.expect("add failed");
        artworks
            .set_status(artwork_id, crate::models::ArtworkStatus::Sold)
            .await
            .expect("set_status failed");
        let items = cart.items(buyer_id).await.expect("items failed");
        assert!(!items[0].is_purchasable());
    }
}

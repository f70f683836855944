//! Cart service
//!
//! A cart entry is a claim of interest, not a reservation; the artwork stays
//! available to everyone until checkout reserves it.

use crate::db::repositories::{ArtworkRepository, CartRepository};
use crate::models::{ArtworkStatus, CartItemDetail};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

pub struct CartService {
    cart_repo: Arc<dyn CartRepository>,
    artwork_repo: Arc<dyn ArtworkRepository>,
}

impl CartService {
    pub fn new(cart_repo: Arc<dyn CartRepository>, artwork_repo: Arc<dyn ArtworkRepository>) -> Self {
        Self {
            cart_repo,
            artwork_repo,
        }
    }

    /// Add an artwork to the user's cart
    pub async fn add(&self, user_id: i64, artwork_id: i64) -> Result<(), ServiceError> {
        let artwork = self
            .artwork_repo
            .get_by_id(artwork_id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", artwork_id)))?;

        if artwork.artist_id == user_id {
            return Err(ServiceError::Validation(
                "You cannot buy your own artwork".to_string(),
            ));
        }
        if artwork.status != ArtworkStatus::Available {
            return Err(ServiceError::Conflict(
                "Artwork is no longer available".to_string(),
            ));
        }

        let added = self
            .cart_repo
            .add(user_id, artwork_id)
            .await
            .context("Failed to add to cart")?;
        if !added {
            return Err(ServiceError::Conflict(
                "Artwork is already in your cart".to_string(),
            ));
        }
        Ok(())
    }

    /// Remove an artwork from the user's cart
    pub async fn remove(&self, user_id: i64, artwork_id: i64) -> Result<(), ServiceError> {
        let removed = self
            .cart_repo
            .remove(user_id, artwork_id)
            .await
            .context("Failed to remove from cart")?;
        if !removed {
            return Err(ServiceError::NotFound(
                "Artwork is not in your cart".to_string(),
            ));
        }
        Ok(())
    }

    /// Empty the user's cart
    pub async fn clear(&self, user_id: i64) -> Result<(), ServiceError> {
        Ok(self
            .cart_repo
            .clear(user_id)
            .await
            .context("Failed to clear cart")?)
    }

    /// The user's cart with current artwork state; sold or reserved pieces
    /// stay listed so the buyer can see what happened to them
    pub async fn items(&self, user_id: i64) -> Result<Vec<CartItemDetail>, ServiceError> {
        Ok(self
            .cart_repo
            .items(user_id)
            .await
            .context("Failed to load cart")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        SqlxArtworkRepository, SqlxCartRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArtworkInput, User, UserRole};

    async fn setup() -> (CartService, Arc<dyn ArtworkRepository>, i64, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let artist = users
            .create(&User::new(
                "artist".to_string(),
                "artist@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create failed");
        let buyer = users
            .create(&User::new(
                "buyer".to_string(),
                "buyer@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create failed");

        let artwork_repo = SqlxArtworkRepository::boxed(pool.clone());
        let artwork = artwork_repo
            .create(
                artist.id,
                CreateArtworkInput {
                    title: "Sketch".to_string(),
                    description: String::new(),
                    category: "drawing".to_string(),
                    price_minor: 5000,
                    currency: "USD".to_string(),
                    images: vec![],
                },
            )
            .await
            .expect("create artwork failed");

        let service = CartService::new(SqlxCartRepository::boxed(pool), artwork_repo.clone());
        (service, artwork_repo, artist.id, buyer.id, artwork.id)
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (service, _, _, buyer_id, artwork_id) = setup().await;

        service.add(buyer_id, artwork_id).await.expect("add failed");
        let items = service.items(buyer_id).await.expect("items failed");
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].artwork_id, artwork_id);
    }

    #[tokio::test]
    async fn test_cannot_add_twice() {
        let (service, _, _, buyer_id, artwork_id) = setup().await;

        service.add(buyer_id, artwork_id).await.expect("add failed");
        assert!(matches!(
            service.add(buyer_id, artwork_id).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_add_own_artwork() {
        let (service, _, artist_id, _, artwork_id) = setup().await;
        assert!(matches!(
            service.add(artist_id, artwork_id).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_cannot_add_sold_artwork() {
        let (service, artworks, _, buyer_id, artwork_id) = setup().await;

        artworks
            .set_status(artwork_id, ArtworkStatus::Sold)
            .await
            .expect("set_status failed");
        assert!(matches!(
            service.add(buyer_id, artwork_id).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_missing_item() {
        let (service, _, _, buyer_id, artwork_id) = setup().await;
        assert!(matches!(
            service.remove(buyer_id, artwork_id).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}

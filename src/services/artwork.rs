//! Artwork service
//!
//! Business logic for the catalog: artist-owned CRUD, public browsing with
//! filters, view counting, and likes.

use crate::db::repositories::{ArtworkRepository, LikeRepository};
use crate::models::{
    Artwork, ArtworkListParams, ArtworkStatus, CreateArtworkInput, LikeTargetType, PagedResult,
    UpdateArtworkInput, User,
};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;

const TITLE_MAX: usize = 200;
const MAX_IMAGES: usize = 10;

pub struct ArtworkService {
    artwork_repo: Arc<dyn ArtworkRepository>,
    like_repo: Arc<dyn LikeRepository>,
}

impl ArtworkService {
    pub fn new(
        artwork_repo: Arc<dyn ArtworkRepository>,
        like_repo: Arc<dyn LikeRepository>,
    ) -> Self {
        Self {
            artwork_repo,
            like_repo,
        }
    }

    /// Create an artwork. Only artists and admins can list works.
    pub async fn create(
        &self,
        user: &User,
        input: CreateArtworkInput,
    ) -> Result<Artwork, ServiceError> {
        if !user.is_artist() && !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only artists can list artworks".to_string(),
            ));
        }
        self.validate_input(&input)?;

        Ok(self
            .artwork_repo
            .create(user.id, input)
            .await
            .context("Failed to create artwork")?)
    }

    /// Get an artwork, bumping its view counter when requested
    pub async fn get(&self, id: i64, count_view: bool) -> Result<Artwork, ServiceError> {
        let artwork = self
            .artwork_repo
            .get_by_id(id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", id)))?;

        if count_view {
            self.artwork_repo
                .increment_view(id)
                .await
                .context("Failed to count view")?;
        }

        Ok(artwork)
    }

    /// Browse the catalog
    pub async fn list(
        &self,
        params: &ArtworkListParams,
    ) -> Result<PagedResult<Artwork>, ServiceError> {
        let (items, total) = self
            .artwork_repo
            .list(params)
            .await
            .context("Failed to list artworks")?;
        Ok(PagedResult::new(items, total, params.page, params.page_size))
    }

    /// Update an artwork. Owner or admin only; price and images are frozen
    /// once the piece has left the available state.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdateArtworkInput,
    ) -> Result<Artwork, ServiceError> {
        let artwork = self
            .artwork_repo
            .get_by_id(id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", id)))?;

        if !user.can_manage(artwork.artist_id) {
            return Err(ServiceError::Forbidden(
                "You do not own this artwork".to_string(),
            ));
        }
        if artwork.status == ArtworkStatus::Sold {
            return Err(ServiceError::Conflict(
                "Sold artworks cannot be modified".to_string(),
            ));
        }
        if artwork.status == ArtworkStatus::Reserved
            && (input.price_minor.is_some() || input.images.is_some())
        {
            return Err(ServiceError::Conflict(
                "Price and images cannot change while the artwork is reserved".to_string(),
            ));
        }

        if let Some(title) = &input.title {
            if title.trim().is_empty() || title.len() > TITLE_MAX {
                return Err(ServiceError::Validation(format!(
                    "Title must be 1 to {} characters",
                    TITLE_MAX
                )));
            }
        }
        if let Some(price) = input.price_minor {
            if price <= 0 {
                return Err(ServiceError::Validation(
                    "Price must be positive".to_string(),
                ));
            }
        }
        if let Some(images) = &input.images {
            if images.len() > MAX_IMAGES {
                return Err(ServiceError::Validation(format!(
                    "At most {} images per artwork",
                    MAX_IMAGES
                )));
            }
        }

        self.artwork_repo
            .update(id, input)
            .await
            .context("Failed to update artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", id)))
    }

    /// Delete an artwork. Owner or admin only; a reserved piece is mid
    /// checkout and cannot be removed.
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let artwork = self
            .artwork_repo
            .get_by_id(id)
            .await
            .context("Failed to get artwork")?
            .ok_or_else(|| ServiceError::NotFound(format!("Artwork {} not found", id)))?;

        if !user.can_manage(artwork.artist_id) {
            return Err(ServiceError::Forbidden(
                "You do not own this artwork".to_string(),
            ));
        }
        if artwork.status == ArtworkStatus::Reserved {
            return Err(ServiceError::Conflict(
                "Artwork is part of a pending order".to_string(),
            ));
        }
        if artwork.status == ArtworkStatus::Sold {
            return Err(ServiceError::Conflict(
                "Sold artworks cannot be deleted".to_string(),
            ));
        }

        self.artwork_repo
            .delete(id)
            .await
            .context("Failed to delete artwork")?;
        Ok(())
    }

    /// Like an artwork. Returns the new like count.
    pub async fn like(&self, user_id: i64, artwork_id: i64) -> Result<i64, ServiceError> {
        let artwork = self.get(artwork_id, false).await?;
        if artwork.artist_id == user_id {
            return Err(ServiceError::Validation(
                "You cannot like your own artwork".to_string(),
            ));
        }
        self.like_repo
            .add(LikeTargetType::Artwork, artwork_id, user_id)
            .await
            .context("Failed to add like")?;
        Ok(self
            .like_repo
            .count(LikeTargetType::Artwork, artwork_id)
            .await
            .context("Failed to count likes")?)
    }

    /// Remove a like. Returns the new like count.
    pub async fn unlike(&self, user_id: i64, artwork_id: i64) -> Result<i64, ServiceError> {
        self.like_repo
            .remove(LikeTargetType::Artwork, artwork_id, user_id)
            .await
            .context("Failed to remove like")?;
        Ok(self
            .like_repo
            .count(LikeTargetType::Artwork, artwork_id)
            .await
            .context("Failed to count likes")?)
    }

    /// Whether the user has liked the artwork
    pub async fn is_liked(&self, user_id: i64, artwork_id: i64) -> Result<bool, ServiceError> {
        Ok(self
            .like_repo
            .is_liked(LikeTargetType::Artwork, artwork_id, user_id)
            .await
            .context("Failed to check like")?)
    }

    fn validate_input(&self, input: &CreateArtworkInput) -> Result<(), ServiceError> {
        if input.title.trim().is_empty() || input.title.len() > TITLE_MAX {
            return Err(ServiceError::Validation(format!(
                "Title must be 1 to {} characters",
                TITLE_MAX
            )));
        }
        if input.category.trim().is_empty() {
            return Err(ServiceError::Validation("Category is required".to_string()));
        }
        if input.price_minor <= 0 {
            return Err(ServiceError::Validation(
                "Price must be positive".to_string(),
            ));
        }
        if input.currency.len() != 3 {
            return Err(ServiceError::Validation(
                "Currency must be a 3-letter ISO code".to_string(),
            ));
        }
        if input.images.len() > MAX_IMAGES {
            return Err(ServiceError::Validation(format!(
                "At most {} images per artwork",
                MAX_IMAGES
            )));
        }
        Ok(())
    }
}

//! Exhibition service
//!
//! Physical and virtual exhibitions with registration. Virtual exhibitions
//! additionally track visits to the streamed event.

use crate::db::repositories::{ExhibitionRepository, RegisterOutcome};
use crate::models::{
    CreateExhibitionInput, Exhibition, ExhibitionKind, PagedResult, Registrant,
    UpdateExhibitionInput, User,
};
use crate::services::ServiceError;
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

const TITLE_MAX: usize = 200;

pub struct ExhibitionService {
    exhibition_repo: Arc<dyn ExhibitionRepository>,
}

impl ExhibitionService {
    pub fn new(exhibition_repo: Arc<dyn ExhibitionRepository>) -> Self {
        Self { exhibition_repo }
    }

    /// Create an exhibition. Artists and admins only.
    pub async fn create(
        &self,
        user: &User,
        input: CreateExhibitionInput,
    ) -> Result<Exhibition, ServiceError> {
        if !user.is_artist() && !user.is_admin() {
            return Err(ServiceError::Forbidden(
                "Only artists can organize exhibitions".to_string(),
            ));
        }

        if input.title.trim().is_empty() || input.title.len() > TITLE_MAX {
            return Err(ServiceError::Validation(format!(
                "Title must be 1 to {} characters",
                TITLE_MAX
            )));
        }
        if input.location.trim().is_empty() {
            return Err(ServiceError::Validation(match input.kind {
                ExhibitionKind::Physical => "A venue address is required".to_string(),
                ExhibitionKind::Virtual => "A streaming URL is required".to_string(),
            }));
        }
        if input.ends_at <= input.starts_at {
            return Err(ServiceError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        if let Some(capacity) = input.capacity {
            if capacity <= 0 {
                return Err(ServiceError::Validation(
                    "Capacity must be positive".to_string(),
                ));
            }
        }

        Ok(self
            .exhibition_repo
            .create(user.id, input)
            .await
            .context("Failed to create exhibition")?)
    }

    /// Get an exhibition, bumping its listing-page views when requested
    pub async fn get(&self, id: i64, count_view: bool) -> Result<Exhibition, ServiceError> {
        let exhibition = self.require(id).await?;
        if count_view {
            self.exhibition_repo
                .increment_view(id)
                .await
                .context("Failed to count view")?;
        }
        Ok(exhibition)
    }

    /// Browse exhibitions of one kind
    pub async fn list(
        &self,
        kind: ExhibitionKind,
        upcoming_only: bool,
        page: u32,
        per_page: u32,
    ) -> Result<PagedResult<Exhibition>, ServiceError> {
        let (items, total) = self
            .exhibition_repo
            .list(kind, upcoming_only, page, per_page)
            .await
            .context("Failed to list exhibitions")?;
        Ok(PagedResult::new(items, total, page, per_page))
    }

    /// Update an exhibition. Organizer or admin only.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdateExhibitionInput,
    ) -> Result<Exhibition, ServiceError> {
        let exhibition = self.require(id).await?;
        if !user.can_manage(exhibition.organizer_id) {
            return Err(ServiceError::Forbidden(
                "You do not organize this exhibition".to_string(),
            ));
        }

        let starts_at = input.starts_at.unwrap_or(exhibition.starts_at);
        let ends_at = input.ends_at.unwrap_or(exhibition.ends_at);
        if ends_at <= starts_at {
            return Err(ServiceError::Validation(
                "End time must be after start time".to_string(),
            ));
        }
        if let Some(Some(capacity)) = input.capacity {
            if capacity < exhibition.registrant_count {
                return Err(ServiceError::Conflict(format!(
                    "{} people are already registered",
                    exhibition.registrant_count
                )));
            }
        }

        self.exhibition_repo
            .update(id, input)
            .await
            .context("Failed to update exhibition")?
            .ok_or_else(|| ServiceError::NotFound(format!("Exhibition {} not found", id)))
    }

    /// Delete an exhibition and its registrations. Organizer or admin only.
    pub async fn delete(&self, user: &User, id: i64) -> Result<(), ServiceError> {
        let exhibition = self.require(id).await?;
        if !user.can_manage(exhibition.organizer_id) {
            return Err(ServiceError::Forbidden(
                "You do not organize this exhibition".to_string(),
            ));
        }
        self.exhibition_repo
            .delete(id)
            .await
            .context("Failed to delete exhibition")?;
        Ok(())
    }

    /// Register for an exhibition
    pub async fn register(&self, user_id: i64, id: i64) -> Result<(), ServiceError> {
        let exhibition = self.require(id).await?;
        if exhibition.organizer_id == user_id {
            return Err(ServiceError::Validation(
                "Organizers cannot register for their own event".to_string(),
            ));
        }
        if exhibition.has_ended(Utc::now()) {
            return Err(ServiceError::Conflict(
                "The exhibition has already ended".to_string(),
            ));
        }

        match self
            .exhibition_repo
            .register(id, user_id)
            .await
            .context("Failed to register")?
        {
            RegisterOutcome::Registered => Ok(()),
            RegisterOutcome::AlreadyRegistered => Err(ServiceError::Conflict(
                "You are already registered".to_string(),
            )),
            RegisterOutcome::Full => Err(ServiceError::Conflict(
                "The exhibition is fully booked".to_string(),
            )),
        }
    }

    /// Withdraw a registration
    pub async fn unregister(&self, user_id: i64, id: i64) -> Result<(), ServiceError> {
        self.require(id).await?;
        let removed = self
            .exhibition_repo
            .unregister(id, user_id)
            .await
            .context("Failed to unregister")?;
        if !removed {
            return Err(ServiceError::NotFound(
                "You are not registered".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether the user is registered
    pub async fn is_registered(&self, user_id: i64, id: i64) -> Result<bool, ServiceError> {
        Ok(self
            .exhibition_repo
            .is_registered(id, user_id)
            .await
            .context("Failed to check registration")?)
    }

    /// The attendee list. Organizer or admin only.
    pub async fn registrants(&self, user: &User, id: i64) -> Result<Vec<Registrant>, ServiceError> {
        let exhibition = self.require(id).await?;
        if !user.can_manage(exhibition.organizer_id) {
            return Err(ServiceError::Forbidden(
                "Only the organizer can see the attendee list".to_string(),
            ));
        }
        Ok(self
            .exhibition_repo
            .registrants(id)
            .await
            .context("Failed to list registrants")?)
    }

    /// Record a visit to a virtual exhibition's stream
    pub async fn visit(&self, id: i64) -> Result<Exhibition, ServiceError> {
        let exhibition = self.require(id).await?;
        if exhibition.kind != ExhibitionKind::Virtual {
            return Err(ServiceError::Validation(
                "Only virtual exhibitions track visits".to_string(),
            ));
        }
        self.exhibition_repo
            .increment_visit(id)
            .await
            .context("Failed to count visit")?;
        self.require(id).await
    }

    async fn require(&self, id: i64) -> Result<Exhibition, ServiceError> {
        self.exhibition_repo
            .get_by_id(id)
            .await
            .context("Failed to get exhibition")?
            .ok_or_else(|| ServiceError::NotFound(format!("Exhibition {} not found", id)))
    }
}

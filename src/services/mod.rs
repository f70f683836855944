//! Services layer - Business logic
//!
//! This module contains all business logic for the marketplace. Services are
//! responsible for:
//! - Implementing business rules
//! - Coordinating between repositories and the payment provider
//! - Handling validation and error cases

pub mod analytics;
pub mod artwork;
pub mod cart;
pub mod checkout;
pub mod comment;
pub mod exhibition;
pub mod follow;
pub mod message;
pub mod password;
pub mod payment;
pub mod rate_limiter;
pub mod user;

pub use analytics::{AnalyticsService, ArtistDashboard, PlatformStats};
pub use artwork::ArtworkService;
pub use cart::CartService;
pub use checkout::{CheckoutResult, CheckoutService};
pub use comment::CommentService;
pub use exhibition::ExhibitionService;
pub use follow::FollowService;
pub use message::MessageService;
pub use password::{hash_password, verify_password};
pub use payment::{
    verify_webhook_signature, CheckoutSession, HttpPaymentProvider, PaymentProvider, WebhookEvent,
};
pub use rate_limiter::LoginRateLimiter;
pub use user::{LoginInput, RegisterInput, UserService, UserServiceError};

/// Error type shared by the non-auth services.
///
/// Variants map one-to-one onto API error codes; the conversion lives in the
/// API middleware.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Invalid input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Entity not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller may not perform this action
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// State conflict (already sold, already registered, seat taken)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

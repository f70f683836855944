//! Cart model
//!
//! The cart is the set of a user's `cart_items` rows; there is no separate
//! cart entity. Each row references an artwork, at most once per user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ArtworkStatus;

/// A single cart row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub user_id: i64,
    pub artwork_id: i64,
    pub added_at: DateTime<Utc>,
}

/// Cart row joined with artwork and artist details for display
#[derive(Debug, Clone, Serialize)]
pub struct CartItemDetail {
    pub artwork_id: i64,
    pub title: String,
    pub price_minor: i64,
    pub currency: String,
    pub status: ArtworkStatus,
    pub artist_id: i64,
    pub artist_name: String,
    /// First image URL, if any
    pub image: Option<String>,
    pub added_at: DateTime<Utc>,
}

impl CartItemDetail {
    /// Whether this row can still be checked out
    pub fn is_purchasable(&self) -> bool {
        self.status == ArtworkStatus::Available
    }
}

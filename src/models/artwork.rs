//! Artwork model
//!
//! An artwork is a listed item for sale: title, price, category, images,
//! an owning artist, and a lifecycle status. Prices are integer minor units
//! (cents) to keep money arithmetic exact.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Artwork entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Artwork {
    /// Unique identifier
    pub id: i64,
    /// Owning artist
    pub artist_id: i64,
    /// Title
    pub title: String,
    /// Long-form description
    pub description: String,
    /// Category (free-form taxonomy, e.g. "painting", "sculpture")
    pub category: String,
    /// Price in minor units (cents)
    pub price_minor: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Image URLs (stored as a JSON array)
    pub images: Vec<String>,
    /// Lifecycle status
    pub status: ArtworkStatus,
    /// Cached like count
    pub like_count: i64,
    /// View counter
    pub view_count: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Artwork {
    /// Whether the artwork can currently be added to a cart or checked out
    pub fn is_available(&self) -> bool {
        self.status == ArtworkStatus::Available
    }

    /// Sold artworks are immutable and cannot be deleted
    pub fn is_sold(&self) -> bool {
        self.status == ArtworkStatus::Sold
    }
}

/// Artwork lifecycle status.
///
/// Transitions: `available -> reserved` (checkout), `reserved -> sold`
/// (payment confirmed), `reserved -> available` (checkout cancelled or
/// expired), `sold -> available` (refund).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtworkStatus {
    /// Listed and purchasable
    Available,
    /// Held by a pending checkout
    Reserved,
    /// Purchased
    Sold,
}

impl Default for ArtworkStatus {
    fn default() -> Self {
        Self::Available
    }
}

impl fmt::Display for ArtworkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArtworkStatus::Available => write!(f, "available"),
            ArtworkStatus::Reserved => write!(f, "reserved"),
            ArtworkStatus::Sold => write!(f, "sold"),
        }
    }
}

impl FromStr for ArtworkStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "available" => Ok(ArtworkStatus::Available),
            "reserved" => Ok(ArtworkStatus::Reserved),
            "sold" => Ok(ArtworkStatus::Sold),
            _ => Err(anyhow::anyhow!("Invalid artwork status: {}", s)),
        }
    }
}

/// Input for creating a new artwork
#[derive(Debug, Clone, Deserialize)]
pub struct CreateArtworkInput {
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_minor: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub images: Vec<String>,
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Input for updating an artwork (all fields optional)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateArtworkInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price_minor: Option<i64>,
    pub images: Option<Vec<String>>,
}

/// Sort order for artwork listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArtworkSort {
    /// Newest first (default)
    #[default]
    Newest,
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Most liked first
    Popular,
}

impl FromStr for ArtworkSort {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "newest" => Ok(ArtworkSort::Newest),
            "price_asc" => Ok(ArtworkSort::PriceAsc),
            "price_desc" => Ok(ArtworkSort::PriceDesc),
            "popular" => Ok(ArtworkSort::Popular),
            _ => Err(anyhow::anyhow!("Invalid sort order: {}", s)),
        }
    }
}

/// Filter and pagination parameters for artwork listings
#[derive(Debug, Clone, Default)]
pub struct ArtworkListParams {
    pub page: u32,
    pub page_size: u32,
    pub category: Option<String>,
    pub artist_id: Option<i64>,
    pub min_price: Option<i64>,
    pub max_price: Option<i64>,
    /// Case-insensitive substring match against the title
    pub search: Option<String>,
    pub sort: ArtworkSort,
    /// Include reserved/sold artworks (owner and admin views)
    pub include_unavailable: bool,
}

/// A page of results with pagination metadata
#[derive(Debug, Clone, Serialize)]
pub struct PagedResult<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> PagedResult<T> {
    /// Assemble a page, deriving `total_pages` from the total row count.
    pub fn new(items: Vec<T>, total: i64, page: u32, page_size: u32) -> Self {
        let total_pages = if page_size == 0 {
            0
        } else {
            ((total as u64).div_ceil(page_size as u64)) as u32
        };
        Self {
            items,
            total,
            page,
            page_size,
            total_pages,
        }
    }

    /// Map the items, keeping the pagination metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PagedResult<U> {
        PagedResult {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

//! Exhibition model
//!
//! Physical and virtual exhibitions share one entity with a `kind`
//! discriminator. Both are organizer-owned event records with a date range
//! and a registrant list; virtual exhibitions additionally count visits to
//! the streamed event itself, separate from listing-page views.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exhibition entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exhibition {
    /// Unique identifier
    pub id: i64,
    /// Organizing user (always an artist or admin)
    pub organizer_id: i64,
    /// Physical venue event or virtual/streamed event
    pub kind: ExhibitionKind,
    pub title: String,
    pub description: String,
    /// Venue address for physical events, streaming URL for virtual ones
    pub location: String,
    pub starts_at: DateTime<Utc>,
    /// Always after `starts_at`
    pub ends_at: DateTime<Utc>,
    /// Maximum registrants; None means unlimited
    pub capacity: Option<i64>,
    /// Cached registrant count
    pub registrant_count: i64,
    /// Listing-page views
    pub view_count: i64,
    /// Virtual-event visits (always 0 for physical exhibitions)
    pub visit_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Exhibition {
    /// Whether the event is over at the given instant
    pub fn has_ended(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }

    /// Whether the registrant list is at capacity
    pub fn is_full(&self) -> bool {
        match self.capacity {
            Some(cap) => self.registrant_count >= cap,
            None => false,
        }
    }
}

/// Exhibition kind discriminator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExhibitionKind {
    /// In-person event at a venue
    Physical,
    /// Online/streamed event
    Virtual,
}

impl Default for ExhibitionKind {
    fn default() -> Self {
        Self::Physical
    }
}

impl fmt::Display for ExhibitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhibitionKind::Physical => write!(f, "physical"),
            ExhibitionKind::Virtual => write!(f, "virtual"),
        }
    }
}

impl FromStr for ExhibitionKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "physical" => Ok(ExhibitionKind::Physical),
            "virtual" => Ok(ExhibitionKind::Virtual),
            _ => Err(anyhow::anyhow!("Invalid exhibition kind: {}", s)),
        }
    }
}

/// Input for creating an exhibition
#[derive(Debug, Clone, Deserialize)]
pub struct CreateExhibitionInput {
    pub kind: ExhibitionKind,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub capacity: Option<i64>,
}

/// Input for updating an exhibition
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateExhibitionInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub starts_at: Option<DateTime<Utc>>,
    pub ends_at: Option<DateTime<Utc>>,
    pub capacity: Option<Option<i64>>,
}

/// A registrant in the organizer's attendee listing
#[derive(Debug, Clone, Serialize)]
pub struct Registrant {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub registered_at: DateTime<Utc>,
}

//! Shared API response types
//!
//! Common response structures used across multiple endpoints, mostly thin
//! projections of the domain models with timestamps rendered as RFC 3339.

use serde::{Deserialize, Serialize};

use crate::models::{Artwork, Exhibition, Order, OrderItem, OrderWithItems, User};

/// Full user response, for the account owner and admin views
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
    pub status: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub total_sales: i64,
    pub rating: f64,
    pub created_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            role: user.role.to_string(),
            status: user.status.to_string(),
            display_name: user.display_name,
            bio: user.bio,
            avatar: user.avatar,
            follower_count: user.follower_count,
            following_count: user.following_count,
            total_sales: user.total_sales,
            rating: user.rating,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Public profile response; never exposes the email address
#[derive(Debug, Serialize)]
pub struct PublicUserResponse {
    pub id: i64,
    pub username: String,
    pub role: String,
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar: Option<String>,
    pub follower_count: i64,
    pub following_count: i64,
    pub total_sales: i64,
    pub rating: f64,
    pub created_at: String,
}

impl From<User> for PublicUserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role.to_string(),
            display_name: user.display_name,
            bio: user.bio,
            avatar: user.avatar,
            follower_count: user.follower_count,
            following_count: user.following_count,
            total_sales: user.total_sales,
            rating: user.rating,
            created_at: user.created_at.to_rfc3339(),
        }
    }
}

/// Artwork response
#[derive(Debug, Serialize)]
pub struct ArtworkResponse {
    pub id: i64,
    pub artist_id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub price_minor: i64,
    pub currency: String,
    pub images: Vec<String>,
    pub status: String,
    pub like_count: i64,
    pub view_count: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Artwork> for ArtworkResponse {
    fn from(artwork: Artwork) -> Self {
        Self {
            id: artwork.id,
            artist_id: artwork.artist_id,
            title: artwork.title,
            description: artwork.description,
            category: artwork.category,
            price_minor: artwork.price_minor,
            currency: artwork.currency,
            images: artwork.images,
            status: artwork.status.to_string(),
            like_count: artwork.like_count,
            view_count: artwork.view_count,
            created_at: artwork.created_at.to_rfc3339(),
            updated_at: artwork.updated_at.to_rfc3339(),
        }
    }
}

/// A single order line
#[derive(Debug, Serialize)]
pub struct OrderItemResponse {
    pub artwork_id: i64,
    pub artist_id: i64,
    pub title: String,
    pub price_minor: i64,
}

impl From<OrderItem> for OrderItemResponse {
    fn from(item: OrderItem) -> Self {
        Self {
            artwork_id: item.artwork_id,
            artist_id: item.artist_id,
            title: item.title,
            price_minor: item.price_minor,
        }
    }
}

/// Order response with its items
#[derive(Debug, Serialize)]
pub struct OrderResponse {
    pub id: i64,
    pub buyer_id: i64,
    pub status: String,
    pub amount_minor: i64,
    pub currency: String,
    pub items: Vec<OrderItemResponse>,
    pub created_at: String,
    pub paid_at: Option<String>,
}

impl From<OrderWithItems> for OrderResponse {
    fn from(order: OrderWithItems) -> Self {
        let OrderWithItems { order, items } = order;
        Self::from_parts(order, items)
    }
}

impl OrderResponse {
    fn from_parts(order: Order, items: Vec<OrderItem>) -> Self {
        Self {
            id: order.id,
            buyer_id: order.buyer_id,
            status: order.status.to_string(),
            amount_minor: order.amount_minor,
            currency: order.currency,
            items: items.into_iter().map(Into::into).collect(),
            created_at: order.created_at.to_rfc3339(),
            paid_at: order.paid_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

/// Exhibition response
#[derive(Debug, Serialize)]
pub struct ExhibitionResponse {
    pub id: i64,
    pub organizer_id: i64,
    pub kind: String,
    pub title: String,
    pub description: String,
    pub location: String,
    pub starts_at: String,
    pub ends_at: String,
    pub capacity: Option<i64>,
    pub registrant_count: i64,
    pub view_count: i64,
    pub visit_count: i64,
    pub created_at: String,
}

impl From<Exhibition> for ExhibitionResponse {
    fn from(ex: Exhibition) -> Self {
        Self {
            id: ex.id,
            organizer_id: ex.organizer_id,
            kind: ex.kind.to_string(),
            title: ex.title,
            description: ex.description,
            location: ex.location,
            starts_at: ex.starts_at.to_rfc3339(),
            ends_at: ex.ends_at.to_rfc3339(),
            capacity: ex.capacity,
            registrant_count: ex.registrant_count,
            view_count: ex.view_count,
            visit_count: ex.visit_count,
            created_at: ex.created_at.to_rfc3339(),
        }
    }
}

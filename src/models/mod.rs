//! Data models
//!
//! This module contains all data structures used throughout the Galleria
//! marketplace backend. Models represent:
//! - Database entities (User, Artwork, Order, Comment, Follow, Conversation, Exhibition)
//! - Input types consumed by the service layer
//! - Internal data transfer objects

mod artwork;
mod cart;
mod comment;
mod exhibition;
mod follow;
mod message;
mod order;
mod session;
mod user;

pub use artwork::{
    Artwork, ArtworkListParams, ArtworkSort, ArtworkStatus, CreateArtworkInput, PagedResult,
    UpdateArtworkInput,
};
pub use cart::{CartItem, CartItemDetail};
pub use comment::{Comment, CommentWithMeta, CreateCommentInput, Like, LikeTargetType};
pub use exhibition::{
    CreateExhibitionInput, Exhibition, ExhibitionKind, Registrant, UpdateExhibitionInput,
};
pub use follow::{Follow, FollowUser};
pub use message::{Conversation, ConversationSummary, Message};
pub use order::{Order, OrderItem, OrderStatus, OrderWithItems};
pub use session::Session;
pub use user::{User, UserRole, UserStatus};

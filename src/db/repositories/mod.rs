//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles persistence for one aggregate; counter columns
//! (like counts, follower counts, unread counts) are maintained here, in
//! the same transaction as the change that moves them.

pub mod artwork;
pub mod cart;
pub mod comment;
pub mod conversation;
pub mod exhibition;
pub mod follow;
pub mod like;
pub mod order;
pub mod session;
pub mod user;

pub use artwork::{ArtworkRepository, SqlxArtworkRepository};
pub use cart::{CartRepository, SqlxCartRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use conversation::{ConversationRepository, SqlxConversationRepository};
pub use exhibition::{ExhibitionRepository, RegisterOutcome, SqlxExhibitionRepository};
pub use follow::{FollowRepository, SqlxFollowRepository};
pub use like::{LikeRepository, SqlxLikeRepository};
pub use order::{OrderRepository, SqlxOrderRepository};
pub use session::{SessionRepository, SqlxSessionRepository};
pub use user::{SqlxUserRepository, UserRepository};

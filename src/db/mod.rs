//! Database layer
//!
//! SQLite persistence for the Galleria marketplace, built on sqlx:
//! - `pool` creates the connection pool (and an in-memory pool for tests)
//! - `migrations` applies embedded, code-based migrations
//! - `repositories` holds one trait + sqlx implementation per aggregate
//!
//! # Usage
//!
//! ```ignore
//! use galleria::config::DatabaseConfig;
//! use galleria::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config.database).await?;
//! migrations::run_migrations(&pool).await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};

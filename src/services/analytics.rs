//! Analytics service
//!
//! Request-time aggregation straight off the tables; no rollups, no cache.
//! Revenue is summed from order items of paid orders, so refunded sales
//! drop out of the numbers automatically.
//!
//! Unlike the other services this one holds the pool directly: every query
//! is a read-only aggregate spanning several tables, and none of it is
//! shared with another caller that a repository trait would serve.

use crate::services::ServiceError;
use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::{Row, SqlitePool};

/// What an artist sees on their dashboard
#[derive(Debug, Clone, Serialize)]
pub struct ArtistDashboard {
    pub artworks_total: i64,
    pub artworks_available: i64,
    pub artworks_reserved: i64,
    pub artworks_sold: i64,
    pub total_views: i64,
    pub total_likes: i64,
    pub follower_count: i64,
    /// Items sold across paid orders
    pub sales_count: i64,
    /// Gross revenue in minor units from paid orders
    pub revenue_minor: i64,
}

/// One row of the top-artists table
#[derive(Debug, Clone, Serialize)]
pub struct TopArtist {
    pub artist_id: i64,
    pub username: String,
    pub sales_count: i64,
    pub revenue_minor: i64,
}

/// Platform-wide numbers for the admin dashboard
#[derive(Debug, Clone, Serialize)]
pub struct PlatformStats {
    pub users_total: i64,
    pub users_artists: i64,
    pub users_community: i64,
    pub users_banned: i64,
    pub artworks_total: i64,
    pub artworks_available: i64,
    pub artworks_sold: i64,
    pub orders_pending: i64,
    pub orders_paid: i64,
    pub orders_cancelled: i64,
    pub orders_refunded: i64,
    pub revenue_minor: i64,
    pub top_artists: Vec<TopArtist>,
}

pub struct AnalyticsService {
    pool: SqlitePool,
}

impl AnalyticsService {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Aggregate an artist's numbers
    pub async fn artist_dashboard(&self, artist_id: i64) -> Result<ArtistDashboard, ServiceError> {
        Ok(self
            .artist_dashboard_inner(artist_id)
            .await
            .context("Failed to build artist dashboard")?)
    }

    async fn artist_dashboard_inner(&self, artist_id: i64) -> Result<ArtistDashboard> {
        let artworks = sqlx::query(
            r#"SELECT COUNT(*) AS total,
                      SUM(CASE WHEN status = 'available' THEN 1 ELSE 0 END) AS available,
                      SUM(CASE WHEN status = 'reserved' THEN 1 ELSE 0 END) AS reserved,
                      SUM(CASE WHEN status = 'sold' THEN 1 ELSE 0 END) AS sold,
                      COALESCE(SUM(view_count), 0) AS views,
                      COALESCE(SUM(like_count), 0) AS likes
               FROM artworks WHERE artist_id = ?"#,
        )
        .bind(artist_id)
        .fetch_one(&self.pool)
        .await?;

        let sales = sqlx::query(
            r#"SELECT COUNT(*) AS sales, COALESCE(SUM(oi.price_minor), 0) AS revenue
               FROM order_items oi
               JOIN orders o ON o.id = oi.order_id
               WHERE oi.artist_id = ? AND o.status = 'paid'"#,
        )
        .bind(artist_id)
        .fetch_one(&self.pool)
        .await?;

        let follower_count: i64 =
            sqlx::query_scalar("SELECT COALESCE(follower_count, 0) FROM users WHERE id = ?")
                .bind(artist_id)
                .fetch_optional(&self.pool)
                .await?
                .unwrap_or(0);

        Ok(ArtistDashboard {
            artworks_total: artworks.get("total"),
            artworks_available: artworks.get::<Option<i64>, _>("available").unwrap_or(0),
            artworks_reserved: artworks.get::<Option<i64>, _>("reserved").unwrap_or(0),
            artworks_sold: artworks.get::<Option<i64>, _>("sold").unwrap_or(0),
            total_views: artworks.get("views"),
            total_likes: artworks.get("likes"),
            follower_count,
            sales_count: sales.get("sales"),
            revenue_minor: sales.get("revenue"),
        })
    }

    /// Aggregate platform-wide numbers. Caller must be an admin; the route
    /// guard enforces it.
    pub async fn platform_stats(&self) -> Result<PlatformStats, ServiceError> {
        Ok(self
            .platform_stats_inner()
            .await
            .context("Failed to build platform stats")?)
    }

    async fn platform_stats_inner(&self) -> Result<PlatformStats> {
        let users = sqlx::query(
            r#"SELECT COUNT(*) AS total,
                      SUM(CASE WHEN role = 'artist' THEN 1 ELSE 0 END) AS artists,
                      SUM(CASE WHEN role = 'community' THEN 1 ELSE 0 END) AS community,
                      SUM(CASE WHEN status = 'banned' THEN 1 ELSE 0 END) AS banned
               FROM users"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let artworks = sqlx::query(
            r#"SELECT COUNT(*) AS total,
                      SUM(CASE WHEN status = 'available' THEN 1 ELSE 0 END) AS available,
                      SUM(CASE WHEN status = 'sold' THEN 1 ELSE 0 END) AS sold
               FROM artworks"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let orders = sqlx::query(
            r#"SELECT SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END) AS pending,
                      SUM(CASE WHEN status = 'paid' THEN 1 ELSE 0 END) AS paid,
                      SUM(CASE WHEN status = 'cancelled' THEN 1 ELSE 0 END) AS cancelled,
                      SUM(CASE WHEN status = 'refunded' THEN 1 ELSE 0 END) AS refunded,
                      COALESCE(SUM(CASE WHEN status = 'paid' THEN amount_minor ELSE 0 END), 0) AS revenue
               FROM orders"#,
        )
        .fetch_one(&self.pool)
        .await?;

        let top_rows = sqlx::query(
            r#"SELECT oi.artist_id, u.username, COUNT(*) AS sales,
                      SUM(oi.price_minor) AS revenue
               FROM order_items oi
               JOIN orders o ON o.id = oi.order_id
               JOIN users u ON u.id = oi.artist_id
               WHERE o.status = 'paid'
               GROUP BY oi.artist_id, u.username
               ORDER BY revenue DESC
               LIMIT 10"#,
        )
        .fetch_all(&self.pool)
        .await?;

        let top_artists = top_rows
            .iter()
            .map(|row| TopArtist {
                artist_id: row.get("artist_id"),
                username: row.get("username"),
                sales_count: row.get("sales"),
                revenue_minor: row.get("revenue"),
            })
            .collect();

        Ok(PlatformStats {
            users_total: users.get("total"),
            users_artists: users.get::<Option<i64>, _>("artists").unwrap_or(0),
            users_community: users.get::<Option<i64>, _>("community").unwrap_or(0),
            users_banned: users.get::<Option<i64>, _>("banned").unwrap_or(0),
            artworks_total: artworks.get("total"),
            artworks_available: artworks.get::<Option<i64>, _>("available").unwrap_or(0),
            artworks_sold: artworks.get::<Option<i64>, _>("sold").unwrap_or(0),
            orders_pending: orders.get::<Option<i64>, _>("pending").unwrap_or(0),
            orders_paid: orders.get::<Option<i64>, _>("paid").unwrap_or(0),
            orders_cancelled: orders.get::<Option<i64>, _>("cancelled").unwrap_or(0),
            orders_refunded: orders.get::<Option<i64>, _>("refunded").unwrap_or(0),
            revenue_minor: orders.get("revenue"),
            top_artists,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ArtworkRepository, CartRepository, OrderRepository, SqlxArtworkRepository,
        SqlxCartRepository, SqlxOrderRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{CreateArtworkInput, User, UserRole};

    async fn setup() -> (AnalyticsService, SqlitePool, i64, i64) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let users = SqlxUserRepository::new(pool.clone());
        let artist = users
            .create(&User::new(
                "artist".to_string(),
                "artist@example.com".to_string(),
                "hash".to_string(),
                UserRole::Artist,
            ))
            .await
            .expect("create failed");
        let buyer = users
            .create(&User::new(
                "buyer".to_string(),
                "buyer@example.com".to_string(),
                "hash".to_string(),
                UserRole::Community,
            ))
            .await
            .expect("create failed");

        (
            AnalyticsService::new(pool.clone()),
            pool,
            artist.id,
            buyer.id,
        )
    }

    async fn sell_artwork(pool: &SqlitePool, artist_id: i64, buyer_id: i64, price: i64) {
        let artworks = SqlxArtworkRepository::new(pool.clone());
        let artwork = artworks
            .create(
                artist_id,
                CreateArtworkInput {
                    title: "Sold piece".to_string(),
                    description: String::new(),
                    category: "painting".to_string(),
                    price_minor: price,
                    currency: "USD".to_string(),
                    images: vec![],
                },
            )
            .await
            .expect("create artwork failed");

        let cart = SqlxCartRepository::new(pool.clone());
        cart.add(buyer_id, artwork.id).await.expect("cart failed");

        let orders = SqlxOrderRepository::new(pool.clone());
        let order = orders
            .create_pending(buyer_id, "USD", &[artwork.id])
            .await
            .expect("order failed")
            .expect("should create");
        orders
            .mark_paid(order.order.id, None)
            .await
            .expect("mark_paid failed");
    }

    #[tokio::test]
    async fn test_empty_dashboard() {
        let (analytics, _, artist_id, _) = setup().await;

        let dashboard = analytics
            .artist_dashboard(artist_id)
            .await
            .expect("dashboard failed");
        assert_eq!(dashboard.artworks_total, 0);
        assert_eq!(dashboard.sales_count, 0);
        assert_eq!(dashboard.revenue_minor, 0);
    }

    #[tokio::test]
    async fn test_dashboard_after_sale() {
        let (analytics, pool, artist_id, buyer_id) = setup().await;

        sell_artwork(&pool, artist_id, buyer_id, 120_000).await;
        sell_artwork(&pool, artist_id, buyer_id, 80_000).await;

        let dashboard = analytics
            .artist_dashboard(artist_id)
            .await
            .expect("dashboard failed");
        assert_eq!(dashboard.artworks_total, 2);
        assert_eq!(dashboard.artworks_sold, 2);
        assert_eq!(dashboard.sales_count, 2);
        assert_eq!(dashboard.revenue_minor, 200_000);
    }

    #[tokio::test]
    async fn test_platform_stats() {
        let (analytics, pool, artist_id, buyer_id) = setup().await;

        sell_artwork(&pool, artist_id, buyer_id, 50_000).await;

        let stats = analytics.platform_stats().await.expect("stats failed");
        assert_eq!(stats.users_total, 2);
        assert_eq!(stats.users_artists, 1);
        assert_eq!(stats.orders_paid, 1);
        assert_eq!(stats.revenue_minor, 50_000);
        assert_eq!(stats.top_artists.len(), 1);
        assert_eq!(stats.top_artists[0].artist_id, artist_id);
        assert_eq!(stats.top_artists[0].revenue_minor, 50_000);
    }

    #[tokio::test]
    async fn test_refund_drops_out_of_revenue() {
        let (analytics, pool, artist_id, buyer_id) = setup().await;

        sell_artwork(&pool, artist_id, buyer_id, 50_000).await;
        let orders = SqlxOrderRepository::new(pool.clone());
        let (all, _) = orders.list_all(1, 10, None).await.expect("list failed");
        orders.refund(all[0].order.id).await.expect("refund failed");

        let dashboard = analytics
            .artist_dashboard(artist_id)
            .await
            .expect("dashboard failed");
        assert_eq!(dashboard.sales_count, 0);
        assert_eq!(dashboard.revenue_minor, 0);
    }
}

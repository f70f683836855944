//! Order repository
//!
//! Checkout and every payment transition touch the order row, its items, and
//! the artwork rows together, so each one runs in a single transaction.
//! Status updates are guarded in SQL (`WHERE status = ...`), which makes
//! replayed webhook events no-ops.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{Order, OrderItem, OrderWithItems};

/// Order repository trait
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Create a pending order over the given artworks, reserving each one.
    /// Returns None if any artwork is no longer available.
    async fn create_pending(
        &self,
        buyer_id: i64,
        currency: &str,
        artwork_ids: &[i64],
    ) -> Result<Option<OrderWithItems>>;

    /// Record the provider's checkout session id on the order
    async fn set_provider_session(&self, order_id: i64, session_id: &str) -> Result<()>;

    /// Get an order with its items
    async fn get_by_id(&self, id: i64) -> Result<Option<OrderWithItems>>;

    /// Look up an order by the provider's checkout session id
    async fn get_by_session(&self, session_id: &str) -> Result<Option<OrderWithItems>>;

    /// List a buyer's orders, newest first
    async fn list_for_buyer(
        &self,
        buyer_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<OrderWithItems>, i64)>;

    /// List all orders, newest first, optionally filtered by status
    async fn list_all(
        &self,
        page: u32,
        per_page: u32,
        status: Option<&str>,
    ) -> Result<(Vec<OrderWithItems>, i64)>;

    /// Move a pending order to paid: artworks become sold, the artworks are
    /// dropped from every cart, and each artist's sales counter ticks up.
    /// Returns false if the order was not pending (already processed).
    async fn mark_paid(&self, order_id: i64, payment_id: Option<&str>) -> Result<bool>;

    /// Cancel a pending order, releasing its artworks back to available.
    /// Returns false if the order was not pending.
    async fn cancel(&self, order_id: i64) -> Result<bool>;

    /// Refund a paid order, returning its artworks to available and rolling
    /// back the artists' sales counters. Returns false if the order was not paid.
    async fn refund(&self, order_id: i64) -> Result<bool>;
}

/// SQLx-based order repository implementation
pub struct SqlxOrderRepository {
    pool: SqlitePool,
}

impl SqlxOrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: SqlitePool) -> Arc<dyn OrderRepository> {
        Arc::new(Self::new(pool))
    }

    async fn load_items(&self, order_id: i64) -> Result<Vec<OrderItem>> {
        let rows = sqlx::query("SELECT * FROM order_items WHERE order_id = ? ORDER BY id")
            .bind(order_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.iter().map(map_order_item_row).collect())
    }

    async fn attach_items(&self, orders: Vec<Order>) -> Result<Vec<OrderWithItems>> {
        let mut result = Vec::with_capacity(orders.len());
        for order in orders {
            let items = self.load_items(order.id).await?;
            result.push(OrderWithItems { order, items });
        }
        Ok(result)
    }
}

fn map_order_row(row: &sqlx::sqlite::SqliteRow) -> Order {
    Order {
        id: row.get("id"),
        buyer_id: row.get("buyer_id"),
        status: row
            .get::<String, _>("status")
            .parse()
            .unwrap_or_default(),
        amount_minor: row.get("amount_minor"),
        currency: row.get("currency"),
        provider_session_id: row.get("provider_session_id"),
        provider_payment_id: row.get("provider_payment_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
        paid_at: row.get("paid_at"),
    }
}

fn map_order_item_row(row: &sqlx::sqlite::SqliteRow) -> OrderItem {
    OrderItem {
        id: row.get("id"),
        order_id: row.get("order_id"),
        artwork_id: row.get("artwork_id"),
        artist_id: row.get("artist_id"),
        title: row.get("title"),
        price_minor: row.get("price_minor"),
    }
}

#[async_trait]
impl OrderRepository for SqlxOrderRepository {
    async fn create_pending(
        &self,
        buyer_id: i64,
        currency: &str,
        artwork_ids: &[i64],
    ) -> Result<Option<OrderWithItems>> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        // Reserve and snapshot each artwork. A reservation that touches zero
        // rows means the piece sold (or reserved) under us, so the whole
        // checkout is abandoned.
        let mut snapshots = Vec::with_capacity(artwork_ids.len());
        for &artwork_id in artwork_ids {
            let reserved = sqlx::query(
                "UPDATE artworks SET status = 'reserved', updated_at = ? WHERE id = ? AND status = 'available'",
            )
            .bind(now)
            .bind(artwork_id)
            .execute(&mut *tx)
            .await?;
            if reserved.rows_affected() == 0 {
                tx.rollback().await?;
                return Ok(None);
            }

            let row = sqlx::query(
                "SELECT artist_id, title, price_minor FROM artworks WHERE id = ?",
            )
            .bind(artwork_id)
            .fetch_one(&mut *tx)
            .await?;
            snapshots.push((
                artwork_id,
                row.get::<i64, _>("artist_id"),
                row.get::<String, _>("title"),
                row.get::<i64, _>("price_minor"),
            ));
        }

        let amount_minor: i64 = snapshots.iter().map(|s| s.3).sum();
        let result = sqlx::query(
            r#"INSERT INTO orders (buyer_id, status, amount_minor, currency, created_at, updated_at)
               VALUES (?, 'pending', ?, ?, ?, ?)"#,
        )
        .bind(buyer_id)
        .bind(amount_minor)
        .bind(currency)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;
        let order_id = result.last_insert_rowid();

        let mut items = Vec::with_capacity(snapshots.len());
        for (artwork_id, artist_id, title, price_minor) in snapshots {
            let inserted = sqlx::query(
                r#"INSERT INTO order_items (order_id, artwork_id, artist_id, title, price_minor)
                   VALUES (?, ?, ?, ?, ?)"#,
            )
            .bind(order_id)
            .bind(artwork_id)
            .bind(artist_id)
            .bind(&title)
            .bind(price_minor)
            .execute(&mut *tx)
            .await?;
            items.push(OrderItem {
                id: inserted.last_insert_rowid(),
                order_id,
                artwork_id,
                artist_id,
                title,
                price_minor,
            });
        }

        tx.commit().await?;

        Ok(Some(OrderWithItems {
            order: Order {
                id: order_id,
                buyer_id,
                status: crate::models::OrderStatus::Pending,
                amount_minor,
                currency: currency.to_string(),
                provider_session_id: None,
                provider_payment_id: None,
                created_at: now,
                updated_at: now,
                paid_at: None,
            },
            items,
        }))
    }

    async fn set_provider_session(&self, order_id: i64, session_id: &str) -> Result<()> {
        sqlx::query("UPDATE orders SET provider_session_id = ?, updated_at = ? WHERE id = ?")
            .bind(session_id)
            .bind(Utc::now())
            .bind(order_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let order = map_order_row(&row);
                let items = self.load_items(order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            }
            None => Ok(None),
        }
    }

    async fn get_by_session(&self, session_id: &str) -> Result<Option<OrderWithItems>> {
        let row = sqlx::query("SELECT * FROM orders WHERE provider_session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await?;
        match row {
            Some(row) => {
                let order = map_order_row(&row);
                let items = self.load_items(order.id).await?;
                Ok(Some(OrderWithItems { order, items }))
            }
            None => Ok(None),
        }
    }

    async fn list_for_buyer(
        &self,
        buyer_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<OrderWithItems>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE buyer_id = ?")
            .bind(buyer_id)
            .fetch_one(&self.pool)
            .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            "SELECT * FROM orders WHERE buyer_id = ? ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(buyer_id)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows.iter().map(map_order_row).collect();
        Ok((self.attach_items(orders).await?, total))
    }

    async fn list_all(
        &self,
        page: u32,
        per_page: u32,
        status: Option<&str>,
    ) -> Result<(Vec<OrderWithItems>, i64)> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM orders WHERE (? IS NULL OR status = ?)",
        )
        .bind(status)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        let offset = (page.saturating_sub(1) as i64).saturating_mul(per_page as i64);
        let rows = sqlx::query(
            r#"SELECT * FROM orders WHERE (? IS NULL OR status = ?)
               ORDER BY id DESC LIMIT ? OFFSET ?"#,
        )
        .bind(status)
        .bind(status)
        .bind(per_page as i64)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let orders = rows.iter().map(map_order_row).collect();
        Ok((self.attach_items(orders).await?, total))
    }

    async fn mark_paid(&self, order_id: i64, payment_id: Option<&str>) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let updated = sqlx::query(
            r#"UPDATE orders SET status = 'paid', provider_payment_id = ?, paid_at = ?, updated_at = ?
               WHERE id = ? AND status = 'pending'"#,
        )
        .bind(payment_id)
        .bind(now)
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let items = sqlx::query("SELECT artwork_id, artist_id FROM order_items WHERE order_id = ?")
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut sales_by_artist: HashMap<i64, i64> = HashMap::new();
        for item in &items {
            let artwork_id: i64 = item.get("artwork_id");
            sqlx::query("UPDATE artworks SET status = 'sold', updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(artwork_id)
                .execute(&mut *tx)
                .await?;
            sqlx::query("DELETE FROM cart_items WHERE artwork_id = ?")
                .bind(artwork_id)
                .execute(&mut *tx)
                .await?;
            *sales_by_artist.entry(item.get("artist_id")).or_insert(0) += 1;
        }

        for (artist_id, count) in sales_by_artist {
            sqlx::query("UPDATE users SET total_sales = total_sales + ? WHERE id = ?")
                .bind(count)
                .bind(artist_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }

    async fn cancel(&self, order_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let updated = sqlx::query(
            "UPDATE orders SET status = 'cancelled', updated_at = ? WHERE id = ? AND status = 'pending'",
        )
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query(
            r#"UPDATE artworks SET status = 'available', updated_at = ?
               WHERE status = 'reserved'
                 AND id IN (SELECT artwork_id FROM order_items WHERE order_id = ?)"#,
        )
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn refund(&self, order_id: i64) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let updated = sqlx::query(
            "UPDATE orders SET status = 'refunded', updated_at = ? WHERE id = ? AND status = 'paid'",
        )
        .bind(now)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;
        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        let items = sqlx::query("SELECT artwork_id, artist_id FROM order_items WHERE order_id = ?")
            .bind(order_id)
            .fetch_all(&mut *tx)
            .await?;

        let mut sales_by_artist: HashMap<i64, i64> = HashMap::new();
        for item in &items {
            let artwork_id: i64 = item.get("artwork_id");
            sqlx::query(
                "UPDATE artworks SET status = 'available', updated_at = ? WHERE id = ? AND status = 'sold'",
            )
            .bind(now)
            .bind(artwork_id)
            .execute(&mut *tx)
            .await?;
            *sales_by_artist.entry(item.get("artist_id")).or_insert(0) += 1;
        }

        for (artist_id, count) in sales_by_artist {
            sqlx::query("UPDATE users SET total_sales = MAX(0, total_sales - ?) WHERE id = ?")
                .bind(count)
                .bind(artist_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

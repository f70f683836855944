//! Order model
//!
//! Orders snapshot the cart at checkout time: each order item carries the
//! artwork title and price as they were when the order was created, so later
//! edits to the artwork never change what the buyer paid for.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Order entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier
    pub id: i64,
    /// Buying user
    pub buyer_id: i64,
    /// Payment lifecycle status
    pub status: OrderStatus,
    /// Total in minor units (sum of item prices)
    pub amount_minor: i64,
    /// ISO 4217 currency code
    pub currency: String,
    /// Checkout session id at the payment provider
    pub provider_session_id: Option<String>,
    /// Payment id at the provider, set once paid
    pub provider_payment_id: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
    /// When payment was confirmed
    pub paid_at: Option<DateTime<Utc>>,
}

impl Order {
    /// Whether the order has reached a final state
    pub fn is_final(&self) -> bool {
        matches!(
            self.status,
            OrderStatus::Paid | OrderStatus::Cancelled | OrderStatus::Refunded
        )
    }
}

/// Order payment status.
///
/// Transitions: `pending -> paid` (webhook `checkout.session.completed`),
/// `pending -> cancelled` (buyer cancel or session expiry),
/// `paid -> refunded` (refund).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Awaiting payment
    Pending,
    /// Payment confirmed
    Paid,
    /// Abandoned or cancelled before payment
    Cancelled,
    /// Paid then refunded
    Refunded,
}

impl Default for OrderStatus {
    fn default() -> Self {
        Self::Pending
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderStatus::Pending => write!(f, "pending"),
            OrderStatus::Paid => write!(f, "paid"),
            OrderStatus::Cancelled => write!(f, "cancelled"),
            OrderStatus::Refunded => write!(f, "refunded"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(OrderStatus::Pending),
            "paid" => Ok(OrderStatus::Paid),
            "cancelled" => Ok(OrderStatus::Cancelled),
            "refunded" => Ok(OrderStatus::Refunded),
            _ => Err(anyhow::anyhow!("Invalid order status: {}", s)),
        }
    }
}

/// A single line of an order, snapshotting the artwork at purchase time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub artwork_id: i64,
    pub artist_id: i64,
    /// Title at purchase time
    pub title: String,
    /// Price at purchase time, minor units
    pub price_minor: i64,
}

/// Order together with its items
#[derive(Debug, Clone, Serialize)]
pub struct OrderWithItems {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_roundtrip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Paid,
            OrderStatus::Cancelled,
            OrderStatus::Refunded,
        ] {
            assert_eq!(OrderStatus::from_str(&status.to_string()).unwrap(), status);
        }
        assert!(OrderStatus::from_str("shipped").is_err());
    }

    #[test]
    fn test_is_final() {
        let mut order = Order {
            id: 1,
            buyer_id: 2,
            status: OrderStatus::Pending,
            amount_minor: 5000,
            currency: "USD".to_string(),
            provider_session_id: None,
            provider_payment_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            paid_at: None,
        };
        assert!(!order.is_final());
        order.status = OrderStatus::Paid;
        assert!(order.is_final());
        order.status = OrderStatus::Cancelled;
        assert!(order.is_final());
        order.status = OrderStatus::Refunded;
        assert!(order.is_final());
    }
}

//! Checkout service
//!
//! Drives the purchase flow: cart to pending order with reserved artworks,
//! hosted checkout session at the payment provider, and the webhook-driven
//! transitions to paid, cancelled, and refunded. Webhook handling is
//! idempotent; a replayed event finds the status guard closed and does
//! nothing.

use crate::db::repositories::{CartRepository, OrderRepository};
use crate::models::{OrderStatus, OrderWithItems, User};
use crate::services::payment::{PaymentProvider, WebhookEvent};
use crate::services::ServiceError;
use anyhow::Context;
use std::sync::Arc;
use tracing::{info, warn};

/// What the API returns from a successful checkout call
#[derive(Debug, Clone)]
pub struct CheckoutResult {
    pub order: OrderWithItems,
    /// Hosted payment page for the buyer
    pub payment_url: String,
}

pub struct CheckoutService {
    order_repo: Arc<dyn OrderRepository>,
    cart_repo: Arc<dyn CartRepository>,
    provider: Arc<dyn PaymentProvider>,
}

impl CheckoutService {
    pub fn new(
        order_repo: Arc<dyn OrderRepository>,
        cart_repo: Arc<dyn CartRepository>,
        provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            order_repo,
            cart_repo,
            provider,
        }
    }

    /// Turn the buyer's cart into a pending order and open a checkout session.
    ///
    /// Every cart item must still be purchasable and share one currency.
    /// If the provider call fails after the order was created, the order is
    /// cancelled again so the artworks do not stay reserved.
    pub async fn checkout(&self, buyer: &User) -> Result<CheckoutResult, ServiceError> {
        let items = self
            .cart_repo
            .items(buyer.id)
            .await
            .context("Failed to load cart")?;
        if items.is_empty() {
            return Err(ServiceError::Validation("Your cart is empty".to_string()));
        }

        let currency = items[0].currency.clone();
        if items.iter().any(|i| i.currency != currency) {
            return Err(ServiceError::Validation(
                "All cart items must use the same currency".to_string(),
            ));
        }

        let artwork_ids: Vec<i64> = items.iter().map(|i| i.artwork_id).collect();
        let order = self
            .order_repo
            .create_pending(buyer.id, &currency, &artwork_ids)
            .await
            .context("Failed to create order")?
            .ok_or_else(|| {
                ServiceError::Conflict("An item in your cart is no longer available".to_string())
            })?;

        let description = if order.items.len() == 1 {
            order.items[0].title.clone()
        } else {
            format!("{} artworks", order.items.len())
        };

        let session = match self
            .provider
            .create_checkout_session(
                order.order.id,
                order.order.amount_minor,
                &currency,
                &description,
            )
            .await
        {
            Ok(session) => session,
            Err(e) => {
                warn!(order_id = order.order.id, error = %e, "Provider session failed, releasing order");
                let _ = self.order_repo.cancel(order.order.id).await;
                return Err(ServiceError::Internal(e));
            }
        };

        self.order_repo
            .set_provider_session(order.order.id, &session.id)
            .await
            .context("Failed to record provider session")?;

        self.cart_repo
            .clear(buyer.id)
            .await
            .context("Failed to clear cart")?;

        info!(
            order_id = order.order.id,
            amount_minor = order.order.amount_minor,
            "Checkout session created"
        );

        let order = self
            .order_repo
            .get_by_id(order.order.id)
            .await
            .context("Failed to reload order")?
            .ok_or_else(|| ServiceError::NotFound("Order vanished".to_string()))?;

        Ok(CheckoutResult {
            order,
            payment_url: session.url,
        })
    }

    /// Apply a verified webhook event.
    ///
    /// Unknown event types are acknowledged and ignored, as are events for
    /// orders we cannot find; the provider retries on error responses only.
    pub async fn handle_webhook_event(&self, event: &WebhookEvent) -> Result<(), ServiceError> {
        match event.event_type.as_str() {
            "checkout.session.completed" => {
                let order = self.resolve_order(event).await?;
                let Some(order) = order else {
                    warn!(session_id = %event.data.object.id, "Completed session for unknown order");
                    return Ok(());
                };
                let payment_id = event.data.object.payment_intent.as_deref();
                let applied = self
                    .order_repo
                    .mark_paid(order.order.id, payment_id)
                    .await
                    .context("Failed to mark order paid")?;
                if applied {
                    info!(order_id = order.order.id, "Order paid");
                } else {
                    info!(order_id = order.order.id, "Duplicate payment event ignored");
                }
            }
            "checkout.session.expired" => {
                let order = self.resolve_order(event).await?;
                let Some(order) = order else {
                    return Ok(());
                };
                let applied = self
                    .order_repo
                    .cancel(order.order.id)
                    .await
                    .context("Failed to cancel order")?;
                if applied {
                    info!(order_id = order.order.id, "Order expired, artworks released");
                }
            }
            "charge.refunded" => {
                let order = self.resolve_order(event).await?;
                let Some(order) = order else {
                    warn!(object_id = %event.data.object.id, "Refund event for unknown order");
                    return Ok(());
                };
                let applied = self
                    .order_repo
                    .refund(order.order.id)
                    .await
                    .context("Failed to refund order")?;
                if applied {
                    info!(order_id = order.order.id, "Order refunded");
                }
            }
            other => {
                info!(event_type = %other, "Ignoring webhook event type");
            }
        }
        Ok(())
    }

    /// Buyer-initiated cancel of a pending order
    pub async fn cancel(&self, user: &User, order_id: i64) -> Result<(), ServiceError> {
        let order = self
            .order_repo
            .get_by_id(order_id)
            .await
            .context("Failed to get order")?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !user.can_manage(order.order.buyer_id) {
            return Err(ServiceError::Forbidden("Not your order".to_string()));
        }
        if order.order.status != OrderStatus::Pending {
            return Err(ServiceError::Conflict(format!(
                "Order is {} and cannot be cancelled",
                order.order.status
            )));
        }

        let applied = self
            .order_repo
            .cancel(order_id)
            .await
            .context("Failed to cancel order")?;
        if !applied {
            return Err(ServiceError::Conflict(
                "Order was already finalized".to_string(),
            ));
        }

        if let Some(session_id) = &order.order.provider_session_id {
            // Best effort; the session expiring at the provider later is fine.
            if let Err(e) = self.provider.expire_checkout_session(session_id).await {
                warn!(order_id, error = %e, "Failed to expire provider session");
            }
        }

        Ok(())
    }

    /// Admin-initiated refund of a paid order
    pub async fn refund(&self, order_id: i64) -> Result<(), ServiceError> {
        let order = self
            .order_repo
            .get_by_id(order_id)
            .await
            .context("Failed to get order")?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if order.order.status != OrderStatus::Paid {
            return Err(ServiceError::Conflict(format!(
                "Order is {} and cannot be refunded",
                order.order.status
            )));
        }

        self.order_repo
            .refund(order_id)
            .await
            .context("Failed to refund order")?;
        info!(order_id, "Order refunded by admin");
        Ok(())
    }

    /// Get an order, visible to its buyer and to admins
    pub async fn get_order(&self, user: &User, order_id: i64) -> Result<OrderWithItems, ServiceError> {
        let order = self
            .order_repo
            .get_by_id(order_id)
            .await
            .context("Failed to get order")?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        if !user.can_manage(order.order.buyer_id) {
            return Err(ServiceError::Forbidden("Not your order".to_string()));
        }
        Ok(order)
    }

    /// The buyer's order history, newest first
    pub async fn list_orders(
        &self,
        buyer_id: i64,
        page: u32,
        per_page: u32,
    ) -> Result<(Vec<OrderWithItems>, i64), ServiceError> {
        Ok(self
            .order_repo
            .list_for_buyer(buyer_id, page, per_page)
            .await
            .context("Failed to list orders")?)
    }

    /// Admin: all orders, optionally filtered by status
    pub async fn list_all_orders(
        &self,
        page: u32,
        per_page: u32,
        status: Option<OrderStatus>,
    ) -> Result<(Vec<OrderWithItems>, i64), ServiceError> {
        let status = status.map(|s| s.to_string());
        Ok(self
            .order_repo
            .list_all(page, per_page, status.as_deref())
            .await
            .context("Failed to list orders")?)
    }

    /// Find the order an event refers to, by metadata first, then by the
    /// provider session id.
    async fn resolve_order(
        &self,
        event: &WebhookEvent,
    ) -> Result<Option<OrderWithItems>, ServiceError> {
        if let Some(order_id) = event.order_id() {
            return Ok(self
                .order_repo
                .get_by_id(order_id)
                .await
                .context("Failed to get order")?);
        }
        Ok(self
            .order_repo
            .get_by_session(&event.data.object.id)
            .await
            .context("Failed to get order by session")?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{
        ArtworkRepository, SqlxArtworkRepository, SqlxCartRepository, SqlxOrderRepository,
        SqlxUserRepository, UserRepository,
    };
    use crate::db::{create_test_pool, migrations};
    use crate::models::{ArtworkStatus, CreateArtworkInput, UserRole};
    use crate::services::payment::CheckoutSession;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct MockProvider {
        fail_create: AtomicBool,
    }

    impl MockProvider {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                fail_create: AtomicBool::new(false),
            })
        }
    }

    #[async_trait]
    impl PaymentProvider for MockProvider {
        async fn create_checkout_session(
            &self,
            order_id: i64,
            _amount_minor: i64,
            _currency: &str,
            _description: &str,
        ) -> Result<CheckoutSession> {
            if self.fail_create.load(Ordering::SeqCst) {
                anyhow::bail!("provider down");
            }
            Ok(CheckoutSession {
                id: format!("cs_test_{order_id}"),
                url: format!("https://pay.example.com/cs_test_{order_id}"),
            })
        }

        async fn expire_checkout_session(&self, _session_id: &str) -> Result<()> {
            Ok(())
        }
    }

    struct Fixture {
        service: CheckoutService,
        artworks: SqlxArtworkRepository,
        cart: SqlxCartRepository,
        provider: Arc<MockProvider>,
        buyer: User,
        artwork_id: i64,
    }

    async fn setup() -> Fixture {
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

        let artworks = SqlxArtworkRepository::new(pool.clone());
        let artwork = artworks
            .create(
                artist.id,
                CreateArtworkInput {
                    title: "Vista".to_string(),
                    description: String::new(),
                    category: "painting".to_string(),
                    price_minor: 80_000,
                    currency: "USD".to_string(),
                    images: vec![],
                },
            )
            .await
            .expect("create artwork failed");

        let cart = SqlxCartRepository::new(pool.clone());
        cart.add(buyer.id, artwork.id).await.expect("cart add failed");

        let provider = MockProvider::new();
        let service = CheckoutService::new(
            SqlxOrderRepository::boxed(pool.clone()),
            SqlxCartRepository::boxed(pool),
            provider.clone(),
        );

        Fixture {
            service,
            artworks,
            cart,
            provider,
            buyer,
            artwork_id: artwork.id,
        }
    }

    fn completed_event(order_id: i64, session_id: &str) -> WebhookEvent {
        WebhookEvent::parse(&format!(
            r#"{{"type":"checkout.session.completed","data":{{"object":{{"id":"{session_id}","payment_intent":"pi_test","metadata":{{"order_id":"{order_id}"}}}}}}}}"#
        ))
        .expect("parse failed")
    }

    #[tokio::test]
    async fn test_checkout_happy_path() {
        let fx = setup().await;

        let result = fx
            .service
            .checkout(&fx.buyer)
            .await
            .expect("checkout failed");
        assert_eq!(result.order.order.status, OrderStatus::Pending);
        assert!(result.payment_url.starts_with("https://pay.example.com/"));
        assert!(result.order.order.provider_session_id.is_some());

        // Cart is emptied once the session exists
        assert!(fx
            .cart
            .items(fx.buyer.id)
            .await
            .expect("items failed")
            .is_empty());

        let artwork = fx
            .artworks
            .get_by_id(fx.artwork_id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(artwork.status, ArtworkStatus::Reserved);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart() {
        let fx = setup().await;
        fx.cart.clear(fx.buyer.id).await.expect("clear failed");
        assert!(matches!(
            fx.service.checkout(&fx.buyer).await,
            Err(ServiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_provider_failure_releases_artworks() {
        let fx = setup().await;

        fx.provider.fail_create.store(true, Ordering::SeqCst);
        assert!(matches!(
            fx.service.checkout(&fx.buyer).await,
            Err(ServiceError::Internal(_))
        ));

        let artwork = fx
            .artworks
            .get_by_id(fx.artwork_id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(artwork.status, ArtworkStatus::Available);
    }

    #[tokio::test]
    async fn test_webhook_completion_and_replay() {
        let fx = setup().await;

        let result = fx
            .service
            .checkout(&fx.buyer)
            .await
            .expect("checkout failed");
        let order_id = result.order.order.id;
        let session_id = result.order.order.provider_session_id.clone().unwrap();

        let event = completed_event(order_id, &session_id);
        fx.service
            .handle_webhook_event(&event)
            .await
            .expect("webhook failed");
        // Replay is a no-op, not an error
        fx.service
            .handle_webhook_event(&event)
            .await
            .expect("webhook replay failed");

        let order = fx
            .service
            .get_order(&fx.buyer, order_id)
            .await
            .expect("get failed");
        assert_eq!(order.order.status, OrderStatus::Paid);
        assert_eq!(order.order.provider_payment_id.as_deref(), Some("pi_test"));
    }

    #[tokio::test]
    async fn test_webhook_unknown_event_acknowledged() {
        let fx = setup().await;
        let event = WebhookEvent::parse(
            r#"{"type":"invoice.created","data":{"object":{"id":"in_1"}}}"#,
        )
        .expect("parse failed");
        fx.service
            .handle_webhook_event(&event)
            .await
            .expect("should acknowledge unknown events");
    }

    #[tokio::test]
    async fn test_cancel_pending_order() {
        let fx = setup().await;

        let result = fx
            .service
            .checkout(&fx.buyer)
            .await
            .expect("checkout failed");
        fx.service
            .cancel(&fx.buyer, result.order.order.id)
            .await
            .expect("cancel failed");

        let artwork = fx
            .artworks
            .get_by_id(fx.artwork_id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(artwork.status, ArtworkStatus::Available);

        // Cancelling again conflicts
        assert!(matches!(
            fx.service.cancel(&fx.buyer, result.order.order.id).await,
            Err(ServiceError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_refund_requires_paid() {
        let fx = setup().await;

        let result = fx
            .service
            .checkout(&fx.buyer)
            .await
            .expect("checkout failed");
        let order_id = result.order.order.id;

        assert!(matches!(
            fx.service.refund(order_id).await,
            Err(ServiceError::Conflict(_))
        ));

        let session_id = result.order.order.provider_session_id.clone().unwrap();
        fx.service
            .handle_webhook_event(&completed_event(order_id, &session_id))
            .await
            .expect("webhook failed");
        fx.service.refund(order_id).await.expect("refund failed");

        let artwork = fx
            .artworks
            .get_by_id(fx.artwork_id)
            .await
            .expect("get failed")
            .expect("missing");
        assert_eq!(artwork.status, ArtworkStatus::Available);
    }

    #[tokio::test]
    async fn test_order_visibility() {
        let fx = setup().await;

        let result = fx
            .service
            .checkout(&fx.buyer)
            .await
            .expect("checkout failed");

        let mut stranger = User::new(
            "stranger".to_string(),
            "s@example.com".to_string(),
            "hash".to_string(),
            UserRole::Community,
        );
        stranger.id = 999;
        assert!(matches!(
            fx.service.get_order(&stranger, result.order.order.id).await,
            Err(ServiceError::Forbidden(_))
        ));
    }
}

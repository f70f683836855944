//! Galleria - backend for an online art marketplace and community

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use galleria::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxArtworkRepository, SqlxCartRepository, SqlxCommentRepository,
            SqlxConversationRepository, SqlxExhibitionRepository, SqlxFollowRepository,
            SqlxLikeRepository, SqlxOrderRepository, SqlxSessionRepository, SqlxUserRepository,
        },
    },
    services::{
        analytics::AnalyticsService,
        artwork::ArtworkService,
        cart::CartService,
        checkout::CheckoutService,
        comment::CommentService,
        exhibition::ExhibitionService,
        follow::FollowService,
        message::MessageService,
        payment::HttpPaymentProvider,
        rate_limiter::LoginRateLimiter,
        user::UserService,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "galleria=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Galleria marketplace...");

    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {}", config.database.url);

    let applied = db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed ({} applied)", applied);

    // Repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let artwork_repo = SqlxArtworkRepository::boxed(pool.clone());
    let like_repo = SqlxLikeRepository::boxed(pool.clone());
    let cart_repo = SqlxCartRepository::boxed(pool.clone());
    let order_repo = SqlxOrderRepository::boxed(pool.clone());
    let comment_repo = SqlxCommentRepository::boxed(pool.clone());
    let follow_repo = SqlxFollowRepository::boxed(pool.clone());
    let conversation_repo = SqlxConversationRepository::boxed(pool.clone());
    let exhibition_repo = SqlxExhibitionRepository::boxed(pool.clone());

    // Payment provider
    let payment_provider = Arc::new(HttpPaymentProvider::new(
        config.payment.base_url.clone(),
        config.payment.secret_key.clone(),
        config.payment.success_url.clone(),
        config.payment.cancel_url.clone(),
    ));

    // Services
    let user_service = Arc::new(UserService::new(user_repo.clone(), session_repo.clone()));
    let artwork_service = Arc::new(ArtworkService::new(artwork_repo.clone(), like_repo.clone()));
    let cart_service = Arc::new(CartService::new(cart_repo.clone(), artwork_repo.clone()));
    let checkout_service = Arc::new(CheckoutService::new(
        order_repo,
        cart_repo,
        payment_provider,
    ));
    let comment_service = Arc::new(CommentService::new(comment_repo, artwork_repo, like_repo));
    let follow_service = Arc::new(FollowService::new(follow_repo, user_repo.clone()));
    let message_service = Arc::new(MessageService::new(conversation_repo, user_repo));
    let exhibition_service = Arc::new(ExhibitionService::new(exhibition_repo));
    let analytics_service = Arc::new(AnalyticsService::new(pool.clone()));
    let rate_limiter = Arc::new(LoginRateLimiter::new());

    let state = AppState {
        pool: pool.clone(),
        user_service: user_service.clone(),
        artwork_service,
        cart_service,
        checkout_service,
        comment_service,
        follow_service,
        message_service,
        exhibition_service,
        analytics_service,
        rate_limiter: rate_limiter.clone(),
        webhook_secret: Arc::new(config.payment.webhook_secret.clone()),
    };

    // Background maintenance: drop expired sessions and stale rate-limit
    // windows once an hour
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(3600));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
            match user_service.cleanup_expired_sessions().await {
                Ok(0) => {}
                Ok(n) => tracing::info!("Cleaned up {} expired sessions", n),
                Err(e) => tracing::warn!("Session cleanup failed: {}", e),
            }
        }
    });

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

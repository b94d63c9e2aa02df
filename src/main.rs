//! FocusHub - a community platform for ADHD support

use anyhow::Result;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use focushub::{
    api::{self, AppState},
    config::Config,
    db::{
        self,
        repositories::{
            SqlxForumRepository, SqlxPostRepository, SqlxProfileRepository,
            SqlxResourceRepository, SqlxSessionRepository, SqlxToolRepository,
            SqlxTopicRepository, SqlxUserRepository,
        },
    },
    services::{ForumService, ProfileService, ResourceService, ToolService, UserService},
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "focushub=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting FocusHub...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    // Initialize database
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", config.database.driver);

    // Run migrations
    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    // Create repositories
    let user_repo = SqlxUserRepository::boxed(pool.clone());
    let session_repo = SqlxSessionRepository::boxed(pool.clone());
    let resource_repo = SqlxResourceRepository::boxed(pool.clone());
    let tool_repo = SqlxToolRepository::boxed(pool.clone());
    let forum_repo = SqlxForumRepository::boxed(pool.clone());
    let topic_repo = SqlxTopicRepository::boxed(pool.clone());
    let post_repo = SqlxPostRepository::boxed(pool.clone());
    let profile_repo = SqlxProfileRepository::boxed(pool.clone());

    // Initialize services
    let user_service = Arc::new(UserService::with_session_ttl(
        user_repo,
        session_repo,
        config.auth.session_ttl_days,
    ));
    let resource_service = Arc::new(ResourceService::new(resource_repo));
    let tool_service = Arc::new(ToolService::new(tool_repo));
    let forum_service = Arc::new(ForumService::new(forum_repo, topic_repo, post_repo));
    let profile_service = Arc::new(ProfileService::new(profile_repo));

    // Clean out expired sessions once per hour
    {
        let cleanup_service = user_service.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(3600));
            loop {
                interval.tick().await;
                match cleanup_service.cleanup_expired_sessions().await {
                    Ok(removed) if removed > 0 => {
                        tracing::info!(removed, "Expired sessions cleaned up");
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!("Session cleanup failed: {}", e),
                }
            }
        });
    }

    // Build application state
    let state = AppState {
        pool,
        user_service,
        resource_service,
        tool_service,
        forum_service,
        profile_service,
        auth_config: Arc::new(config.auth.clone()),
        assets_config: Arc::new(config.assets.clone()),
    };

    // Build router
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

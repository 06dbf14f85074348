//! Application Startup
//!
//! Wires storage, the chat gateway and the HTTP router together.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use sqlx::PgPool;
use tokio::net::TcpListener;

use crate::config::Settings;
use crate::domain::{ChatRepository, TypingRepository};
use crate::infrastructure::cache::{self, TypingCacheService};
use crate::infrastructure::database;
use crate::infrastructure::repositories::PgChatRepository;
use crate::presentation::http::{handlers, routes};
use crate::presentation::middleware::{cors, logging};
use crate::presentation::websocket::{ConnectionRegistry, Gateway};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Used by the readiness check; the gateway talks to Redis through its own
    /// connection manager.
    pub redis: redis::Client,
    pub gateway: Arc<Gateway>,
    pub settings: Arc<Settings>,
}

/// Full router with the HTTP middleware stack applied.
pub fn app(state: AppState) -> Router {
    let cors = cors::create_cors_layer(&state.settings.cors);
    routes::create_router(state)
        .layer(logging::create_trace_layer())
        .layer(cors)
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        handlers::health::init_server_start();

        let db = database::create_pool(&settings.database)
            .await
            .context("failed to create database pool")?;
        tracing::info!("Database connection pool created");

        if settings.database.run_migrations {
            database::run_migrations(&db)
                .await
                .context("failed to run database migrations")?;
            tracing::info!("Database migrations applied");
        }

        let redis = cache::open_redis_client(&settings.redis)?;
        let manager = cache::create_connection_manager(redis.clone()).await?;

        let chats: Arc<dyn ChatRepository> = Arc::new(PgChatRepository::new(db.clone()));
        let typing: Arc<dyn TypingRepository> = Arc::new(TypingCacheService::with_ttl(
            manager,
            settings.websocket.typing_ttl_secs,
        ));

        let gateway = Arc::new(Gateway::new(
            Arc::new(ConnectionRegistry::new()),
            chats,
            typing,
        ));

        let addr = settings.server_addr();
        let state = AppState {
            db,
            redis,
            gateway,
            settings: Arc::new(settings),
        };

        let router = app(state);

        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("failed to bind {}", addr))?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until Ctrl-C
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}

// src/main.rs

// --- Module declarations ---
mod db;
mod error;
mod models;
mod services;
mod state;
mod web;

// --- Imports ---
use crate::services::storage_service::StorageService;
use crate::state::AppState;
use axum::serve;
use std::{env, net::SocketAddr};
use time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_cookies::CookieManagerLayer;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, ExpiredDeletion, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // --- Logging (tracing) ---
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            env::var("RUST_LOG")
                .unwrap_or_else(|_| {
                    "thesisrepo=debug,tower_http=info,sqlx=warn,tower_sessions=info".into()
                })
                .into()
        }))
        .with(fmt::layer())
        .init();

    tracing::info!("🚀 Starting thesis repository server...");

    // --- Database ---
    let db_pool = match db::create_db_pool().await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("❌ Fatal: database initialization failed: {}", e);
            return Err(anyhow::anyhow!("failed to connect/migrate db: {}", e));
        }
    };

    // --- Sessions ---
    let session_store = SqliteStore::new(db_pool.clone()).with_table_name("sessions")
        .map_err(|e| anyhow::anyhow!("failed to create session store: {}", e))?;
    session_store
        .migrate()
        .await
        .map_err(|e| anyhow::anyhow!("failed to migrate session store: {}", e))?;

    // Background sweep of expired sessions.
    let sweeper_store = session_store.clone();
    tokio::spawn(async move {
        if let Err(e) = sweeper_store
            .continuously_delete_expired(tokio::time::Duration::from_secs(60 * 60))
            .await
        {
            tracing::error!("Session sweeper task failed: {:?}", e);
        }
    });
    tracing::info!("🧹 Session sweeper task started.");

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(1)));
    tracing::info!("🔑 Session layer configured.");

    // --- Application state ---
    let app_state = AppState {
        db_pool,
        storage: StorageService::from_env(),
    };

    // --- Listener ---
    let port: u16 = env::var("PORT").ok().and_then(|p| p.parse().ok()).unwrap_or(3000);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("📡 Server listening on http://{}", addr);
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("❌ Failed to bind listener on port {}: {}", port, e);
            return Err(e.into());
        }
    };

    // --- Router and middleware stack ---
    let app = web::routes::create_router(app_state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CookieManagerLayer::new())
            .layer(session_layer),
    );
    tracing::info!("✅ Router and middlewares configured.");

    // --- Serve ---
    tracing::info!("👂 Ready to accept connections...");
    if let Err(e) = serve(listener, app.into_make_service()).await {
        tracing::error!("❌ Fatal server error: {}", e);
        return Err(e.into());
    }

    Ok(())
}

//! pacioli API server
//!
//! Main entry point for the bookkeeping service.

use std::sync::Arc;

use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pacioli_api::{create_router, AppState};
use pacioli_db::{connect, Migrator, SqlStore};
use pacioli_shared::{AppConfig, HmacAuth};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pacioli=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Connect to database and bring the schema up to date
    let db = connect(
        &config.database.url,
        config.database.max_connections,
        config.database.min_connections,
    )
    .await?;
    info!("Connected to database");
    Migrator::up(&db, None).await?;
    info!("Migrations applied");

    // Wire the managers over the SQL store
    let store = Arc::new(SqlStore::new(db));
    let auth = HmacAuth::new(config.auth.secret.clone(), config.auth.token_age_minutes);
    let state = AppState::new(store, auth, config.auth.devkey_phrase.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! Bookshelf server: loads settings, prepares the store, and serves the API.

use bookshelf_api::{app, apply_migrations, ensure_database_exists, AppState, MemoryStore, PgStore, Settings};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bookshelf_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let state = if settings.uses_memory_store() {
        tracing::warn!("DATABASE_URL=memory: data lives in this process only");
        AppState::new(MemoryStore::new())
    } else {
        ensure_database_exists(&settings.database_url).await?;
        let store = PgStore::connect(&settings.database_url, settings.max_connections).await?;
        apply_migrations(store.pool()).await?;
        AppState::new(store)
    };

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state, settings.body_limit)).await?;
    Ok(())
}

//! Standalone image-optimization worker. Runs against the same database
//! and object store as the web process, but in its own executable so it
//! can be scaled and restarted independently.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use mnu_portal::config;
use mnu_portal::database;
use mnu_portal::jobs::worker;
use mnu_portal::storage::FsObjectStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let storage = &config::config().storage;
    let store = Arc::new(FsObjectStore::new(
        storage.root.clone(),
        storage.public_base_url.clone(),
    ));

    let pool = database::connect().await?;
    worker::run_loop(pool, store).await;
    Ok(())
}

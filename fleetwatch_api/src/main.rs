use std::sync::Arc;

use axum::serve;
use fleetwatch_api::{DEFAULT_RELAY_ADDR, router, state::AppState};
use tracing::{Level, info};

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::from_filename("./.env.local").ok();
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let addr =
        std::env::var("FLEETWATCH_RELAY_ADDR").unwrap_or_else(|_| DEFAULT_RELAY_ADDR.to_owned());

    let state = Arc::new(AppState::default());
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Fleet relay listening");

    serve(listener, app).await?;

    Ok(())
}

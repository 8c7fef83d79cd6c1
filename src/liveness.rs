//! Liveness endpoint for the hosting platform.

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tracing::info;

pub const ALIVE_BODY: &str = "✅ ASHIM Assistant is running!";

pub fn build_router() -> Router {
    Router::new().route("/", get(alive))
}

async fn alive() -> &'static str {
    ALIVE_BODY
}

/// Bind `0.0.0.0:port` and serve until the listener fails.
pub async fn serve(port: u16) -> std::io::Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    info!("🌐 Liveness endpoint listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router()).await
}

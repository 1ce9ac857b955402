//! # HTTP Service
//!
//! JSON API over the invoice pipeline: page previews, PDF rendering,
//! multi-channel delivery, endpoint probing, and an in-memory draft
//! store with idle expiry.
//!
//! ## Usage
//!
//! ```bash
//! facture serve --listen 0.0.0.0:3000
//! ```
//!
//! Delivery credentials come from the environment at startup or per
//! request in the `/api/send` body.

mod handlers;
mod state;

pub use state::{AppState, BackendDefaults, ServerConfig};

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;

use crate::error::FactureError;
use state::DRAFT_EXPIRATION_SECS;

/// Start the HTTP server.
///
/// ## Example
///
/// ```no_run
/// use facture::server::{serve, BackendDefaults, ServerConfig};
///
/// # async fn example() -> Result<(), facture::error::FactureError> {
/// let config = ServerConfig {
///     listen_addr: "0.0.0.0:3000".to_string(),
///     defaults: BackendDefaults::default(),
/// };
///
/// serve(config).await?;
/// # Ok(())
/// # }
/// ```
pub async fn serve(config: ServerConfig) -> Result<(), FactureError> {
    let app_state = Arc::new(AppState::new(config.clone()));

    // Spawn background draft cleanup task
    tokio::spawn(cleanup_drafts(app_state.clone()));

    let app = Router::new()
        // Health
        .route("/api/health", get(handlers::health))
        // Rendering API
        .route("/api/preview", post(handlers::render::preview))
        .route("/api/pdf", post(handlers::render::pdf))
        // Delivery API
        .route("/api/send", post(handlers::delivery::send))
        .route("/api/endpoint/test", post(handlers::delivery::probe))
        // Draft API
        .route("/api/drafts", post(handlers::drafts::save))
        .route("/api/drafts/:id", get(handlers::drafts::restore))
        .with_state(app_state);

    println!("Facture HTTP server starting...");
    println!("Listening on: {}", config.listen_addr);
    let configured = config.defaults.configured();
    if configured.is_empty() {
        println!("Delivery backends: none configured (request bodies must carry credentials)");
    } else {
        println!("Delivery backends: {}", configured.join(", "));
    }
    println!();

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .map_err(|e| {
            FactureError::Unknown(format!("Failed to bind to {}: {}", config.listen_addr, e))
        })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| FactureError::Unknown(format!("Server error: {}", e)))?;

    Ok(())
}

/// Background task to drop drafts nobody touched for a while.
async fn cleanup_drafts(state: Arc<AppState>) {
    let mut interval = tokio::time::interval(Duration::from_secs(60));
    let expiration = Duration::from_secs(DRAFT_EXPIRATION_SECS);

    loop {
        interval.tick().await;

        let mut drafts = state.drafts.write().await;
        let before = drafts.len();
        drafts.retain(|_, v| !v.is_expired(expiration));
        let after = drafts.len();
        if before != after {
            println!(
                "[drafts] Cleaned up {} expired draft(s) ({} remaining)",
                before - after,
                after
            );
        }
    }
}

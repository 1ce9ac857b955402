//! Draft save and restore handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::invoice::Invoice;

use super::super::state::{AppState, DraftEntry};

/// Response from the save endpoint.
#[derive(Debug, Serialize)]
pub struct DraftSaved {
    pub id: String,
}

/// POST /api/drafts - park an invoice in memory.
pub async fn save(
    State(state): State<Arc<AppState>>,
    Json(invoice): Json<Invoice>,
) -> Json<DraftSaved> {
    let id = Uuid::new_v4();
    {
        let mut drafts = state.drafts.write().await;
        drafts.insert(id, DraftEntry::new(invoice));
    }
    println!("[drafts] saved {}", id);
    Json(DraftSaved { id: id.to_string() })
}

/// GET /api/drafts/:id - restore a saved invoice.
pub async fn restore(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Invoice>, (StatusCode, String)> {
    let draft_id = Uuid::parse_str(&id)
        .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid draft ID".to_string()))?;

    // Clone the invoice to release the lock quickly
    let invoice = {
        let mut drafts = state.drafts.write().await;
        let entry = drafts.get_mut(&draft_id).ok_or((
            StatusCode::NOT_FOUND,
            "Draft not found or expired".to_string(),
        ))?;

        // Touch the draft to keep it alive
        entry.touch();
        entry.invoice.clone()
    };

    Ok(Json(invoice))
}

//! Rendering handlers: PNG page preview and PDF download.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::FactureError;
use crate::invoice::Invoice;
use crate::pdf::{assemble, PdfOptions};
use crate::sheet::compose;
use crate::snapshot::{rasterize, SnapshotOptions};

use super::super::state::AppState;

/// Query parameters for the preview endpoint.
#[derive(Debug, Deserialize)]
pub struct PreviewQuery {
    /// Zero-based page index.
    #[serde(default)]
    pub page: usize,
}

/// POST /api/preview - render one invoice page as a PNG.
///
/// Previews capture at native sheet resolution; the print path doubles it.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PreviewQuery>,
    Json(invoice): Json<Invoice>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sheets = compose(&invoice);
    let page_count = sheets.len();
    let sheet = sheets.into_iter().nth(query.page).ok_or((
        StatusCode::BAD_REQUEST,
        format!("page {} out of range (document has {})", query.page, page_count),
    ))?;

    let images = state.resolver.resolve_sheet(&sheet).await;

    // Move CPU-intensive work to blocking thread pool
    let png_bytes = tokio::task::spawn_blocking(move || {
        let bitmap = rasterize(&sheet, SnapshotOptions::preview(), &images)?;
        let mut png = Vec::new();
        bitmap
            .write_to(&mut std::io::Cursor::new(&mut png), image::ImageFormat::Png)
            .map_err(|e| FactureError::Image(format!("Failed to encode preview: {}", e)))?;
        Ok::<_, FactureError>(png)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Render task failed: {}", e),
        )
    })?
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Preview render failed: {}", e),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "image/png")], png_bytes))
}

/// POST /api/pdf - render the full invoice as a PDF.
pub async fn pdf(
    State(state): State<Arc<AppState>>,
    Json(invoice): Json<Invoice>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let sheets = compose(&invoice);
    let mut resolved = Vec::with_capacity(sheets.len());
    for sheet in &sheets {
        resolved.push(state.resolver.resolve_sheet(sheet).await);
    }

    let options = PdfOptions::print().with_title(format!("Facture {}", invoice.invoice_number));
    let filename = invoice.filename();
    let page_count = sheets.len();

    // Move CPU-intensive work to blocking thread pool
    let document = tokio::task::spawn_blocking(move || {
        let mut pages = Vec::with_capacity(sheets.len());
        for (sheet, images) in sheets.iter().zip(&resolved) {
            pages.push(rasterize(sheet, SnapshotOptions::print(), images)?);
        }
        assemble(&pages, &options)
    })
    .await
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Render task failed: {}", e),
        )
    })?
    .map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("PDF render failed: {}", e),
        )
    })?;

    println!(
        "[render] {} -> {} page(s), {} bytes",
        filename,
        page_count,
        document.len()
    );

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        document.bytes,
    ))
}

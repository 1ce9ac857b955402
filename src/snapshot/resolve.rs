//! Image-source resolution for snapshots.
//!
//! Sheets reference images by source string: either a `data:` URI
//! (signature strokes captured client-side) or an HTTP URL. The resolver
//! decodes or downloads each source ahead of painting, with a shared
//! cache so repeated captures of the same sheet don't refetch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use image::RgbaImage;
use tokio::sync::RwLock;

use crate::error::FactureError;
use crate::sheet::{Sheet, SheetElement};

/// How long to wait for any single image before the snapshot proceeds
/// without it.
pub const IMAGE_WAIT: Duration = Duration::from_secs(2);

pub struct AssetResolver {
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, RgbaImage>>>,
}

impl Default for AssetResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl AssetResolver {
    pub fn new() -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("facture/", env!("CARGO_PKG_VERSION")))
            .timeout(IMAGE_WAIT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Resolve every image slot on a sheet.
    ///
    /// Sources that fail to decode or don't arrive within [`IMAGE_WAIT`]
    /// are skipped with a warning; the snapshot renders without them.
    pub async fn resolve_sheet(&self, sheet: &Sheet) -> HashMap<String, RgbaImage> {
        let mut sources: Vec<&str> = Vec::new();
        for element in &sheet.elements {
            if let SheetElement::Image(slot) = element {
                if !sources.contains(&slot.source.as_str()) {
                    sources.push(&slot.source);
                }
            }
        }

        let mut resolved = HashMap::new();
        for source in sources {
            match tokio::time::timeout(IMAGE_WAIT, self.resolve(source)).await {
                Ok(Ok(bitmap)) => {
                    resolved.insert(source.to_string(), bitmap);
                }
                Ok(Err(e)) => {
                    println!("[snapshot] skipping image {}: {}", source_label(source), e);
                }
                Err(_) => {
                    println!(
                        "[snapshot] image {} timed out after {:?}, rendering without it",
                        source_label(source),
                        IMAGE_WAIT
                    );
                }
            }
        }
        resolved
    }

    /// Resolve a single source: `data:` URIs decode inline, anything else
    /// is fetched over HTTP.
    pub async fn resolve(&self, source: &str) -> Result<RgbaImage, FactureError> {
        {
            let cache = self.cache.read().await;
            if let Some(bitmap) = cache.get(source) {
                return Ok(bitmap.clone());
            }
        }

        let bytes = if source.starts_with("data:") {
            crate::encode::decode(source)?
        } else {
            self.fetch(source).await?
        };

        let bitmap = image::load_from_memory(&bytes)
            .map_err(|e| FactureError::Image(format!("Failed to decode image: {}", e)))?
            .to_rgba8();

        let mut cache = self.cache.write().await;
        cache.insert(source.to_string(), bitmap.clone());

        Ok(bitmap)
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, FactureError> {
        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| FactureError::Image(format!("Failed to download {}: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(FactureError::Image(format!(
                "Failed to download {}: HTTP {}",
                url,
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FactureError::Image(format!("Failed to read {}: {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

fn source_label(source: &str) -> String {
    if source.starts_with("data:") {
        format!("data URI ({} chars)", source.len())
    } else {
        source.to_string()
    }
}

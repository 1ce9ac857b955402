//! # Cloud Storage Backend
//!
//! Archives the PDF to a fixed folder in the store's cloud drive. Auth
//! is a refresh-token grant: the operator signs in once when installing,
//! and the resulting refresh token mints short-lived access tokens here.
//!
//! The cached access token is the only state shared across deliveries.
//! Refresh is idempotent, so concurrent refreshes race harmlessly under
//! a last-writer-wins policy.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::FactureError;
use crate::pdf::RenderedDocument;

use super::{
    map_transport_error, truncate_body, BackendKind, DeliveryBackend, DeliveryReceipt,
    DeliveryRequest,
};

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const UPLOAD_URL: &str = "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart";

/// Uploads carry megabytes; give them more room than a mail send.
const UPLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Refresh a minute before the advertised expiry.
const TOKEN_SLACK: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Deserialize)]
pub struct CloudConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Destination folder identifier inside the drive.
    pub folder_id: String,
}

impl CloudConfig {
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        refresh_token: impl Into<String>,
        folder_id: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            refresh_token: refresh_token.into(),
            folder_id: folder_id.into(),
        }
    }
}

#[derive(Debug, Clone)]
struct SessionToken {
    access_token: String,
    expires_at: Instant,
}

impl SessionToken {
    fn new(access_token: String, expires_in: Duration) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + expires_in.saturating_sub(TOKEN_SLACK),
        }
    }

    fn is_fresh(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

#[derive(Debug)]
pub struct CloudBackend {
    config: CloudConfig,
    http_client: reqwest::Client,
    token: Arc<RwLock<Option<SessionToken>>>,
}

impl CloudBackend {
    pub fn new(config: CloudConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("facture/", env!("CARGO_PKG_VERSION")))
            .timeout(UPLOAD_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            config,
            http_client,
            token: Arc::new(RwLock::new(None)),
        }
    }

    /// Return a fresh access token, minting one from the refresh token
    /// when the cache is empty or stale.
    async fn ensure_token(&self) -> Result<String, FactureError> {
        {
            let token = self.token.read().await;
            if let Some(session) = token.as_ref() {
                if session.is_fresh() {
                    return Ok(session.access_token.clone());
                }
            }
        }

        let response = self
            .http_client
            .post(TOKEN_URL)
            .form(&[
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("refresh_token", self.config.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FactureError::Unauthorized(
                "cloud refresh token was rejected, reconnect the account".to_string(),
            ));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FactureError::InvalidResponse(format!(
                "token endpoint returned HTTP {}: {}",
                status,
                truncate_body(&detail)
            )));
        }

        #[derive(Deserialize)]
        struct TokenResponse {
            access_token: String,
            expires_in: u64,
        }

        let minted: TokenResponse = response.json().await.map_err(|e| {
            FactureError::InvalidResponse(format!("token endpoint sent malformed JSON: {}", e))
        })?;

        let session = SessionToken::new(minted.access_token.clone(), Duration::from_secs(minted.expires_in));
        let mut token = self.token.write().await;
        *token = Some(session);

        Ok(minted.access_token)
    }

    async fn clear_token(&self) {
        let mut token = self.token.write().await;
        *token = None;
    }
}

/// Build a multipart/related body: a JSON metadata part naming the file
/// and its destination folder, then the document bytes.
fn multipart_body(boundary: &str, metadata: &serde_json::Value, bytes: &[u8]) -> Vec<u8> {
    let mut body = Vec::with_capacity(bytes.len() + 512);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

#[async_trait]
impl DeliveryBackend for CloudBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::CloudStorage
    }

    fn timeout(&self) -> Duration {
        UPLOAD_TIMEOUT
    }

    fn check_config(&self) -> Result<(), FactureError> {
        let fields = [
            ("client id", &self.config.client_id),
            ("client secret", &self.config.client_secret),
            ("refresh token", &self.config.refresh_token),
            ("folder id", &self.config.folder_id),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(FactureError::NotConfigured(format!(
                    "cloud storage {} is missing",
                    name
                )));
            }
        }
        Ok(())
    }

    async fn deliver(
        &self,
        document: &RenderedDocument,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, FactureError> {
        self.check_config()?;

        let access_token = self.ensure_token().await?;

        let metadata = json!({
            "name": request.filename,
            "mimeType": "application/pdf",
            "parents": [self.config.folder_id],
        });

        let boundary = format!("facture-{}", Uuid::new_v4());
        let body = multipart_body(&boundary, &metadata, &document.bytes);

        let response = self
            .http_client
            .post(UPLOAD_URL)
            .bearer_auth(&access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            // the cached token went stale mid-flight; drop it so the
            // next attempt re-mints
            self.clear_token().await;
            return Err(FactureError::Unauthorized(
                "cloud session expired during upload".to_string(),
            ));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FactureError::InvalidResponse(format!(
                "upload returned HTTP {}: {}",
                status,
                truncate_body(&detail)
            )));
        }

        #[derive(Deserialize)]
        struct UploadResponse {
            id: String,
            name: String,
        }

        let uploaded: UploadResponse = response.json().await.map_err(|e| {
            FactureError::InvalidResponse(format!("upload response was malformed: {}", e))
        })?;

        println!("[cloud] uploaded {} as {}", uploaded.name, uploaded.id);

        Ok(DeliveryReceipt {
            backend: BackendKind::CloudStorage,
            message: format!("Facture {} archivée sur le drive", uploaded.name),
            remote_id: Some(uploaded.id),
        })
    }
}

//! # Delivery Layer
//!
//! This module provides the channels for getting a finished invoice to
//! its destination.
//!
//! ## Available Backends
//!
//! - [`mail_relay`]: templated email with the PDF attached
//! - [`cloud`]: archive upload to a cloud storage folder
//! - [`endpoint`]: JSON POST to an operator-supplied URL
//!
//! All three implement [`DeliveryBackend`] and are driven by the
//! [`orchestrator`], which owns the render → assemble → encode →
//! dispatch sequence, retries, and outcome aggregation.

pub mod cloud;
pub mod endpoint;
pub mod mail_relay;
pub mod orchestrator;
pub mod retry;

pub use cloud::{CloudBackend, CloudConfig};
pub use endpoint::{EndpointBackend, EndpointConfig, EndpointReply, EndpointVerdict};
pub use mail_relay::{MailRelayBackend, MailRelayConfig};
pub use orchestrator::{DeliveryOutcome, DeliveryStage, DeliverySummary, ErrorClass, Orchestrator};
pub use retry::RetryPolicy;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::encode;
use crate::error::FactureError;
use crate::invoice::format::{format_date, format_eur};
use crate::invoice::Invoice;
use crate::pdf::RenderedDocument;

/// All available backends, in display order.
pub const BACKENDS: &[&str] = &["mail-relay", "cloud-storage", "endpoint"];

/// Which delivery channel a backend drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    MailRelay,
    CloudStorage,
    Endpoint,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::MailRelay => "mail-relay",
            BackendKind::CloudStorage => "cloud-storage",
            BackendKind::Endpoint => "endpoint",
        }
    }

    /// Get a backend kind by name.
    pub fn by_name(name: &str) -> Option<BackendKind> {
        match name.to_lowercase().as_str() {
            "mail-relay" | "mail" | "email" => Some(BackendKind::MailRelay),
            "cloud-storage" | "cloud" | "drive" => Some(BackendKind::CloudStorage),
            "endpoint" | "custom" => Some(BackendKind::Endpoint),
            _ => None,
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Flattened invoice metadata shipped alongside the document.
///
/// Every field is pre-formatted for direct interpolation into a mail
/// template or JSON envelope; amounts carry the locale string, not a
/// number.
#[derive(Debug, Clone)]
pub struct DeliveryRequest {
    pub filename: String,
    pub recipient_email: String,
    pub recipient_name: String,
    pub invoice_number: String,
    pub invoice_date: String,
    pub total_amount: String,
    pub deposit_amount: String,
    pub balance_due: String,
    pub payment_method: String,
    pub item_count: usize,
    pub advisor: String,
    /// Raw base64 of the rendered document, produced once by the
    /// orchestrator's encoding stage. Text-borne channels interpolate
    /// this instead of re-encoding the document themselves.
    pub pdf_base64: String,
}

impl DeliveryRequest {
    pub fn from_invoice(invoice: &Invoice) -> Self {
        Self {
            filename: invoice.filename(),
            recipient_email: invoice.client.email.clone(),
            recipient_name: invoice.client.name.clone(),
            invoice_number: invoice.invoice_number.clone(),
            invoice_date: format_date(invoice.issue_date),
            total_amount: format_eur(invoice.total()),
            deposit_amount: format_eur(invoice.payment.deposit),
            balance_due: format_eur(invoice.balance_due()),
            payment_method: invoice.payment.method.label().to_string(),
            item_count: invoice.items.len(),
            advisor: invoice.advisor.clone().unwrap_or_default(),
            pdf_base64: String::new(),
        }
    }

    /// Attach the document's encoded payload.
    pub fn with_payload(mut self, document: &RenderedDocument) -> Self {
        self.pdf_base64 = encode::encode_raw(&document.bytes);
        self
    }
}

/// What a backend reports after a successful delivery.
#[derive(Debug, Clone)]
pub struct DeliveryReceipt {
    pub backend: BackendKind,
    /// Human-readable confirmation, surfaced to the end user.
    pub message: String,
    /// Remote identifier when the channel returns one (file id, URL).
    pub remote_id: Option<String>,
}

/// A delivery channel.
///
/// Implementations use `&self` with interior mutability where they need
/// shared state (the cloud backend's session token), so one instance can
/// serve concurrent requests.
#[async_trait]
pub trait DeliveryBackend: Send + Sync + std::fmt::Debug {
    fn kind(&self) -> BackendKind;

    /// Hard bound on one delivery attempt. The orchestrator enforces
    /// this independently of the transport's own timeout.
    fn timeout(&self) -> Duration;

    /// Fail-fast credential check. Must not touch the network.
    fn check_config(&self) -> Result<(), FactureError>;

    /// Retry behavior for transient failures. Most channels don't
    /// retry.
    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::none()
    }

    async fn deliver(
        &self,
        document: &RenderedDocument,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, FactureError>;
}

/// Map a transport-level failure onto the error taxonomy.
pub(crate) fn map_transport_error(error: reqwest::Error) -> FactureError {
    if error.is_timeout() {
        FactureError::Timeout(error.to_string())
    } else if error.is_connect() {
        FactureError::NetworkUnreachable(error.to_string())
    } else {
        FactureError::Unknown(error.to_string())
    }
}

/// Shorten a response body for error messages and logs.
pub(crate) fn truncate_body(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= LIMIT {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(LIMIT).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::samples;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_backend_registry_lists_all() {
        assert_eq!(BACKENDS.len(), 3);
        for name in BACKENDS {
            assert!(BackendKind::by_name(name).is_some());
        }
    }

    #[test]
    fn test_by_name_accepts_aliases() {
        assert_eq!(BackendKind::by_name("EMAIL"), Some(BackendKind::MailRelay));
        assert_eq!(BackendKind::by_name("drive"), Some(BackendKind::CloudStorage));
        assert_eq!(BackendKind::by_name("custom"), Some(BackendKind::Endpoint));
        assert_eq!(BackendKind::by_name("pigeon"), None);
    }

    #[test]
    fn test_request_carries_locale_amounts() {
        let invoice = samples::literie_invoice();
        let request = DeliveryRequest::from_invoice(&invoice);
        assert!(request.total_amount.ends_with('€'));
        assert!(request.total_amount.contains(','));
        assert_eq!(request.invoice_number, invoice.invoice_number);
        assert_eq!(request.item_count, invoice.items.len());
    }

    #[test]
    fn test_request_filename_matches_invoice() {
        let invoice = samples::demo_invoice();
        let request = DeliveryRequest::from_invoice(&invoice);
        assert_eq!(request.filename, invoice.filename());
    }

    #[test]
    fn test_with_payload_carries_the_raw_base64() {
        let document = RenderedDocument {
            bytes: b"%PDF-1.4 payload".to_vec(),
            generated_at: chrono::Utc::now(),
        };
        let request =
            DeliveryRequest::from_invoice(&samples::minimal_invoice()).with_payload(&document);
        assert_eq!(request.pdf_base64, encode::encode_raw(b"%PDF-1.4 payload"));

        // without attachment the payload stays empty
        let bare = DeliveryRequest::from_invoice(&samples::minimal_invoice());
        assert!(bare.pdf_base64.is_empty());
    }

    #[test]
    fn test_truncate_body_caps_length() {
        let long = "x".repeat(500);
        let short = truncate_body(&long);
        assert!(short.chars().count() <= 203);
        assert!(short.ends_with("..."));
        assert_eq!(truncate_body("  ok  "), "ok");
    }
}

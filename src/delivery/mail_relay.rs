//! # Mail Relay Backend
//!
//! Sends the invoice by email through a hosted template relay. The relay
//! holds a pre-registered message template; we submit the template's
//! variables plus the PDF as a data-URI attachment and it does the rest.
//!
//! ## Configuration
//!
//! Three identifiers come from the relay dashboard: a service id, a
//! template id, and a public API key. Fresh dashboards hand out
//! `YOUR_SERVICE_ID`-style placeholders; those are rejected before any
//! network call so a misconfigured install fails in microseconds, not
//! after a 30-second timeout.
//!
//! ## Attachment Ceiling
//!
//! The relay's plan tier caps attachments around 2MB of encoded
//! payload. Oversized documents fail fast with `AttachmentTooLarge`;
//! callers should fall back to the cloud backend for those.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use crate::encode;
use crate::error::FactureError;
use crate::invoice::CompanyInfo;
use crate::pdf::RenderedDocument;

use super::{
    map_transport_error, truncate_body, BackendKind, DeliveryBackend, DeliveryReceipt,
    DeliveryRequest, RetryPolicy,
};

/// Relay send API.
const SEND_URL: &str = "https://api.emailjs.com/api/v1.0/email/send";

/// Hard bound on one send attempt.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Encoded-attachment ceiling for the relay's plan tier.
pub const MAX_ATTACHMENT_BYTES: usize = 2 * 1024 * 1024;

fn default_from_name() -> String {
    CompanyInfo::MYCONFORT.name.to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailRelayConfig {
    pub service_id: String,
    pub template_id: String,
    pub public_key: String,
    #[serde(default = "default_from_name")]
    pub from_name: String,
    #[serde(default)]
    pub reply_to: String,
}

impl MailRelayConfig {
    pub fn new(
        service_id: impl Into<String>,
        template_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            service_id: service_id.into(),
            template_id: template_id.into(),
            public_key: public_key.into(),
            from_name: default_from_name(),
            reply_to: String::new(),
        }
    }
}

/// Dashboard placeholders look like `YOUR_SERVICE_ID`.
fn is_placeholder(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || trimmed.starts_with("YOUR_")
}

#[derive(Debug)]
pub struct MailRelayBackend {
    config: MailRelayConfig,
    http_client: reqwest::Client,
}

impl MailRelayBackend {
    pub fn new(config: MailRelayConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .user_agent(concat!("facture/", env!("CARGO_PKG_VERSION")))
            .timeout(SEND_TIMEOUT)
            .build()
            .expect("failed to build HTTP client");

        Self {
            config,
            http_client,
        }
    }

    /// The template's named variables. The template references these by
    /// name, so renaming any of them breaks rendered mails silently.
    fn template_params(&self, request: &DeliveryRequest, attachment: &str) -> serde_json::Value {
        let company = CompanyInfo::MYCONFORT;
        json!({
            "to_email": request.recipient_email,
            "to_name": request.recipient_name,
            "from_name": self.config.from_name,
            "reply_to": self.config.reply_to,
            "subject": format!("Votre facture {} - {}", request.invoice_number, company.name),
            "message": format!(
                "Bonjour {},\n\nVeuillez trouver ci-joint votre facture {} du {}.\n\nCordialement,\n{}",
                request.recipient_name, request.invoice_number, request.invoice_date, company.name
            ),
            "invoice_number": request.invoice_number,
            "invoice_date": request.invoice_date,
            "total_amount": request.total_amount,
            "deposit_amount": request.deposit_amount,
            "balance_due": request.balance_due,
            "payment_method": request.payment_method,
            "item_count": request.item_count.to_string(),
            "advisor_name": request.advisor,
            "company_name": company.name,
            "company_address": company.address_line(),
            "company_phone": company.phone,
            "company_email": company.email,
            "company_siret": company.siret,
            "company_website": company.website,
            "attachment_name": request.filename,
            "attachment_base64": attachment,
        })
    }
}

#[async_trait]
impl DeliveryBackend for MailRelayBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MailRelay
    }

    fn timeout(&self) -> Duration {
        SEND_TIMEOUT
    }

    fn check_config(&self) -> Result<(), FactureError> {
        if is_placeholder(&self.config.service_id) {
            return Err(FactureError::NotConfigured(
                "mail relay service id is missing or a placeholder".to_string(),
            ));
        }
        if is_placeholder(&self.config.template_id) {
            return Err(FactureError::NotConfigured(
                "mail relay template id is missing or a placeholder".to_string(),
            ));
        }
        if is_placeholder(&self.config.public_key) {
            return Err(FactureError::NotConfigured(
                "mail relay public key is missing or a placeholder".to_string(),
            ));
        }
        Ok(())
    }

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::mail_relay()
    }

    async fn deliver(
        &self,
        _document: &RenderedDocument,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, FactureError> {
        self.check_config()?;

        // Prefix concat only; the base64 pass happened upstream.
        let attachment = encode::data_uri_from_raw(&request.pdf_base64);
        if attachment.len() > MAX_ATTACHMENT_BYTES {
            return Err(FactureError::AttachmentTooLarge {
                size: attachment.len(),
                limit: MAX_ATTACHMENT_BYTES,
            });
        }

        let body = json!({
            "service_id": self.config.service_id,
            "template_id": self.config.template_id,
            "user_id": self.config.public_key,
            "template_params": self.template_params(request, &attachment),
        });

        let response = self
            .http_client
            .post(SEND_URL)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Err(FactureError::Unauthorized(
                "mail relay rejected the public key".to_string(),
            ));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FactureError::InvalidResponse(format!(
                "mail relay returned HTTP {}: {}",
                status,
                truncate_body(&detail)
            )));
        }

        println!(
            "[mail-relay] sent {} to {}",
            request.filename, request.recipient_email
        );

        Ok(DeliveryReceipt {
            backend: BackendKind::MailRelay,
            message: format!("Facture envoyée par email à {}", request.recipient_email),
            remote_id: None,
        })
    }
}

//! # Custom Endpoint Backend
//!
//! POSTs the invoice to an operator-authored URL, typically a
//! spreadsheet script or a small webhook the store runs itself. There is
//! no response contract: bodies range from JSON to a bare "OK" to a
//! French sentence. Success is therefore inferred by scanning the body
//! for known markers, and an unrecognized body is reported as delivered
//! with an explicit caveat rather than guessed either way.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::FactureError;
use crate::pdf::RenderedDocument;

use super::{
    map_transport_error, truncate_body, BackendKind, DeliveryBackend, DeliveryReceipt,
    DeliveryRequest,
};

/// Hard bound on a real send.
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Connectivity probes answer fast or not at all.
const PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Body markers that indicate the endpoint accepted the document.
/// Matched against the lowercased body; French stems cover the
/// conjugated forms ("enregistré", "enregistrée", "sauvegardée").
const SUCCESS_MARKERS: &[&str] = &["success", "ok", "enregistr", "sauvegard", "saved", "received"];

/// Body markers that indicate a failure. These win over success markers
/// so "error saving" is never read as a success.
const FAILURE_MARKERS: &[&str] = &["error", "erreur", "fail", "exception", "denied"];

#[derive(Debug, Clone, Deserialize)]
pub struct EndpointConfig {
    pub url: String,
}

impl EndpointConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

/// What the endpoint's free-text reply most likely meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointVerdict {
    /// A success marker matched and no failure marker did.
    Confirmed,
    /// No marker matched either way.
    Ambiguous,
    /// A failure marker matched.
    Failed,
}

impl EndpointVerdict {
    pub fn classify(body: &str) -> Self {
        let lowered = body.to_lowercase();
        if FAILURE_MARKERS.iter().any(|m| lowered.contains(m)) {
            return EndpointVerdict::Failed;
        }
        if SUCCESS_MARKERS.iter().any(|m| lowered.contains(m)) {
            return EndpointVerdict::Confirmed;
        }
        EndpointVerdict::Ambiguous
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EndpointVerdict::Confirmed => "confirmed",
            EndpointVerdict::Ambiguous => "ambiguous",
            EndpointVerdict::Failed => "failed",
        }
    }
}

impl std::fmt::Display for EndpointVerdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict plus the body it was read from, for operator debugging.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointReply {
    pub verdict: EndpointVerdict,
    pub raw_body: String,
}

#[derive(Debug)]
pub struct EndpointBackend {
    config: EndpointConfig,
    http_client: reqwest::Client,
}

impl EndpointBackend {
    pub fn new(config: EndpointConfig) -> Self {
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

    /// The JSON envelope. Field names are part of the operator contract;
    /// deployed scripts read them by name.
    fn envelope(&self, document: &RenderedDocument, request: &DeliveryRequest) -> serde_json::Value {
        json!({
            "pdfBase64": request.pdf_base64,
            "filename": request.filename,
            "email": request.recipient_email,
            "clientName": request.recipient_name,
            "invoiceNumber": request.invoice_number,
            "invoiceDate": request.invoice_date,
            "totalAmount": request.total_amount,
            "depositAmount": request.deposit_amount,
            "balanceDue": request.balance_due,
            "paymentMethod": request.payment_method,
            "itemCount": request.item_count,
            "advisor": request.advisor,
            "generatedAt": document.generated_at.to_rfc3339(),
        })
    }

    /// Lightweight connectivity test: a `requestType: "test"` envelope
    /// with no document, classified like a real reply.
    pub async fn probe(&self) -> Result<EndpointReply, FactureError> {
        self.check_config()?;

        let body = json!({
            "requestType": "test",
            "source": "facture",
            "sentAt": chrono::Utc::now().to_rfc3339(),
        });

        let response = self
            .http_client
            .post(&self.config.url)
            .timeout(PROBE_TIMEOUT)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FactureError::InvalidResponse(format!(
                "endpoint probe returned HTTP {}: {}",
                status,
                truncate_body(&detail)
            )));
        }

        let text = response.text().await.map_err(map_transport_error)?;

        Ok(EndpointReply {
            verdict: EndpointVerdict::classify(&text),
            raw_body: truncate_body(&text),
        })
    }
}

#[async_trait]
impl DeliveryBackend for EndpointBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Endpoint
    }

    fn timeout(&self) -> Duration {
        SEND_TIMEOUT
    }

    fn check_config(&self) -> Result<(), FactureError> {
        let url = self.config.url.trim();
        if url.is_empty() {
            return Err(FactureError::NotConfigured(
                "endpoint URL is missing".to_string(),
            ));
        }
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(FactureError::NotConfigured(format!(
                "endpoint URL must be http(s), got {}",
                url
            )));
        }
        Ok(())
    }

    async fn deliver(
        &self,
        document: &RenderedDocument,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, FactureError> {
        self.check_config()?;

        let envelope = self.envelope(document, request);

        let response = self
            .http_client
            .post(&self.config.url)
            .json(&envelope)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(FactureError::InvalidResponse(format!(
                "endpoint returned HTTP {}: {}",
                status,
                truncate_body(&detail)
            )));
        }

        // The verdict lives in the body; a body that never arrived is a
        // transport failure, not an ambiguous reply.
        let text = response.text().await.map_err(map_transport_error)?;

        match EndpointVerdict::classify(&text) {
            EndpointVerdict::Confirmed => {
                println!("[endpoint] {} accepted {}", self.config.url, request.filename);
                Ok(DeliveryReceipt {
                    backend: BackendKind::Endpoint,
                    message: format!("Facture transmise à l'endpoint ({})", request.filename),
                    remote_id: None,
                })
            }
            EndpointVerdict::Ambiguous => {
                println!(
                    "[endpoint] {} replied without a recognizable marker: {}",
                    self.config.url,
                    truncate_body(&text)
                );
                Ok(DeliveryReceipt {
                    backend: BackendKind::Endpoint,
                    message: format!(
                        "Facture transmise, réponse non confirmée: {}",
                        truncate_body(&text)
                    ),
                    remote_id: None,
                })
            }
            EndpointVerdict::Failed => Err(FactureError::InvalidResponse(format!(
                "endpoint reported a failure: {}",
                truncate_body(&text)
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encode;
    use crate::invoice::samples;
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_classify_success_markers() {
        assert_eq!(
            EndpointVerdict::classify("{\"status\":\"success\"}"),
            EndpointVerdict::Confirmed
        );
        assert_eq!(EndpointVerdict::classify("OK"), EndpointVerdict::Confirmed);
        assert_eq!(
            EndpointVerdict::classify("Facture enregistrée avec succès"),
            EndpointVerdict::Confirmed
        );
        assert_eq!(
            EndpointVerdict::classify("Document sauvegardé"),
            EndpointVerdict::Confirmed
        );
    }

    #[test]
    fn test_classify_failure_markers() {
        assert_eq!(
            EndpointVerdict::classify("Erreur interne"),
            EndpointVerdict::Failed
        );
        assert_eq!(
            EndpointVerdict::classify("{\"error\": \"quota\"}"),
            EndpointVerdict::Failed
        );
        assert_eq!(
            EndpointVerdict::classify("Access denied"),
            EndpointVerdict::Failed
        );
    }

    #[test]
    fn test_failure_wins_over_success() {
        assert_eq!(
            EndpointVerdict::classify("error while saving, not ok"),
            EndpointVerdict::Failed
        );
    }

    #[test]
    fn test_unrecognized_body_is_ambiguous() {
        assert_eq!(EndpointVerdict::classify("42"), EndpointVerdict::Ambiguous);
        assert_eq!(EndpointVerdict::classify(""), EndpointVerdict::Ambiguous);
    }

    #[test]
    fn test_envelope_field_names() {
        let backend = EndpointBackend::new(EndpointConfig::new("https://example.com/hook"));
        let invoice = samples::demo_invoice();
        let document = RenderedDocument {
            bytes: b"%PDF-1.4".to_vec(),
            generated_at: Utc::now(),
        };
        let request = DeliveryRequest::from_invoice(&invoice).with_payload(&document);

        let envelope = backend.envelope(&document, &request);

        // raw base64, no MIME prefix
        assert_eq!(envelope["pdfBase64"], encode::encode_raw(b"%PDF-1.4"));
        assert_eq!(envelope["invoiceNumber"], invoice.invoice_number);
        assert_eq!(envelope["clientName"], invoice.client.name);
        assert_eq!(envelope["totalAmount"], request.total_amount);
        assert!(envelope.get("pdf_base64").is_none());
    }

    #[test]
    fn test_envelope_interpolates_the_attached_payload() {
        let backend = EndpointBackend::new(EndpointConfig::new("https://example.com/hook"));
        let document = RenderedDocument {
            bytes: b"%PDF-1.4".to_vec(),
            generated_at: Utc::now(),
        };
        let mut request = DeliveryRequest::from_invoice(&samples::minimal_invoice());
        request.pdf_base64 = "UERGLXBheWxvYWQ=".to_string();

        // the envelope ships the payload it was handed, no re-encode
        let envelope = backend.envelope(&document, &request);
        assert_eq!(envelope["pdfBase64"], "UERGLXBheWxvYWQ=");
    }

    #[test]
    fn test_check_config_requires_http_url() {
        let empty = EndpointBackend::new(EndpointConfig::new(""));
        assert!(matches!(
            empty.check_config(),
            Err(FactureError::NotConfigured(_))
        ));

        let ftp = EndpointBackend::new(EndpointConfig::new("ftp://files.example.com"));
        assert!(ftp.check_config().is_err());

        let https = EndpointBackend::new(EndpointConfig::new("https://example.com/hook"));
        assert!(https.check_config().is_ok());
    }

    #[tokio::test]
    async fn test_probe_without_url_fails_fast() {
        let backend = EndpointBackend::new(EndpointConfig::new(""));
        let result = backend.probe().await;
        assert!(matches!(result, Err(FactureError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_unreadable_reply_body_is_a_transport_error() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // 200 OK advertising a body that never fully arrives, then hang up.
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 4096];
            let _ = socket.read(&mut request).await;
            let _ = socket
                .write_all(b"HTTP/1.1 200 OK\r\ncontent-length: 100\r\n\r\nok")
                .await;
        });

        let backend = EndpointBackend::new(EndpointConfig::new(format!("http://{}", addr)));
        let document = RenderedDocument {
            bytes: b"%PDF-1.4".to_vec(),
            generated_at: Utc::now(),
        };
        let request = DeliveryRequest::from_invoice(&samples::minimal_invoice())
            .with_payload(&document);

        let result = backend.deliver(&document, &request).await;
        assert!(
            result.is_err(),
            "a reply whose body never arrived must not count as delivered"
        );
    }
}

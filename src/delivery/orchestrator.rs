//! # Delivery Orchestrator
//!
//! Owns one delivery attempt end to end: compose the sheets, capture
//! them, bind the PDF, then dispatch to every requested backend and
//! aggregate the outcomes. Stages run strictly in sequence; an attempt
//! never re-enters a stage, a fresh attempt starts over from idle.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::error::FactureError;
use crate::invoice::Invoice;
use crate::pdf::{assemble, PdfOptions, RenderedDocument};
use crate::sheet::compose;
use crate::snapshot::{rasterize, AssetResolver, SnapshotOptions};

use super::retry::with_retry;
use super::{BackendKind, DeliveryBackend, DeliveryRequest};

/// Pipeline stages, in the order an attempt passes through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStage {
    Idle,
    GeneratingDocument,
    Encoding,
    Dispatching,
    Completed,
    Failed,
}

impl DeliveryStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStage::Idle => "idle",
            DeliveryStage::GeneratingDocument => "generating-document",
            DeliveryStage::Encoding => "encoding",
            DeliveryStage::Dispatching => "dispatching",
            DeliveryStage::Completed => "completed",
            DeliveryStage::Failed => "failed",
        }
    }
}

impl std::fmt::Display for DeliveryStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure classification for diagnostics and remediation hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorClass {
    Timeout,
    NetworkUnreachable,
    Unauthorized,
    NotConfigured,
    InvalidResponse,
    Unknown,
}

impl ErrorClass {
    pub fn of(error: &FactureError) -> Self {
        match error {
            FactureError::Timeout(_) => ErrorClass::Timeout,
            FactureError::NetworkUnreachable(_) => ErrorClass::NetworkUnreachable,
            FactureError::Unauthorized(_) => ErrorClass::Unauthorized,
            FactureError::NotConfigured(_) => ErrorClass::NotConfigured,
            // an oversized attachment needs an operator decision, same
            // as missing credentials
            FactureError::AttachmentTooLarge { .. } => ErrorClass::NotConfigured,
            FactureError::InvalidResponse(_) => ErrorClass::InvalidResponse,
            _ => ErrorClass::Unknown,
        }
    }
}

/// Remediation hint for a failure class, worded for the operator.
fn hint_for(class: ErrorClass, backend: BackendKind) -> Option<String> {
    let hint = match (class, backend) {
        (ErrorClass::Timeout, _) => {
            "Le serveur n'a pas répondu à temps. Réessayez dans quelques minutes."
        }
        (ErrorClass::NetworkUnreachable, BackendKind::Endpoint) => {
            "Vérifiez que l'endpoint est déployé et accessible publiquement."
        }
        (ErrorClass::NetworkUnreachable, _) => "Vérifiez la connexion réseau.",
        (ErrorClass::Unauthorized, BackendKind::CloudStorage) => {
            "Reconnectez le compte de stockage, le jeton a expiré ou a été révoqué."
        }
        (ErrorClass::Unauthorized, _) => "Vérifiez les identifiants du service.",
        (ErrorClass::NotConfigured, BackendKind::MailRelay) => {
            "Renseignez le service, le template et la clé publique du relais mail."
        }
        (ErrorClass::NotConfigured, BackendKind::CloudStorage) => {
            "Renseignez les identifiants OAuth et le dossier de destination."
        }
        (ErrorClass::NotConfigured, BackendKind::Endpoint) => "Renseignez l'URL de l'endpoint.",
        (ErrorClass::InvalidResponse, _) => {
            "La réponse du serveur n'a pas pu être interprétée. Consultez les journaux du service distant."
        }
        (ErrorClass::Unknown, _) => return None,
    };
    Some(hint.to_string())
}

/// One backend's result within a delivery attempt.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryOutcome {
    pub backend: BackendKind,
    pub success: bool,
    pub message: String,
    pub elapsed_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_class: Option<ErrorClass>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

/// Aggregated result of a multi-channel delivery.
///
/// Overall success means at least one backend accepted the document;
/// every individual message is kept so a partial failure is never
/// silently dropped.
#[derive(Debug, Clone, Serialize)]
pub struct DeliverySummary {
    pub success: bool,
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliverySummary {
    pub fn from_outcomes(outcomes: Vec<DeliveryOutcome>) -> Self {
        Self {
            success: outcomes.iter().any(|o| o.success),
            outcomes,
        }
    }

    pub fn messages(&self) -> Vec<&str> {
        self.outcomes.iter().map(|o| o.message.as_str()).collect()
    }
}

pub struct Orchestrator {
    resolver: Arc<AssetResolver>,
    stages: Vec<DeliveryStage>,
}

impl Orchestrator {
    pub fn new(resolver: Arc<AssetResolver>) -> Self {
        Self {
            resolver,
            stages: Vec::new(),
        }
    }

    /// Stage history of the last attempt, ending in completed or failed.
    pub fn stages(&self) -> &[DeliveryStage] {
        &self.stages
    }

    fn enter(&mut self, stage: DeliveryStage) {
        println!("[delivery] stage: {}", stage);
        self.stages.push(stage);
    }

    /// Run one delivery attempt.
    ///
    /// An error means the pipeline failed before dispatch (render or
    /// assembly); dispatch failures are reported per-backend inside the
    /// summary instead.
    pub async fn run(
        &mut self,
        invoice: &Invoice,
        backends: &[Arc<dyn DeliveryBackend>],
    ) -> Result<DeliverySummary, FactureError> {
        self.stages.clear();
        self.enter(DeliveryStage::Idle);

        let result = self.run_inner(invoice, backends).await;
        match &result {
            Ok(summary) if summary.success => self.enter(DeliveryStage::Completed),
            _ => self.enter(DeliveryStage::Failed),
        }
        result
    }

    async fn run_inner(
        &mut self,
        invoice: &Invoice,
        backends: &[Arc<dyn DeliveryBackend>],
    ) -> Result<DeliverySummary, FactureError> {
        self.enter(DeliveryStage::GeneratingDocument);

        let sheets = compose(invoice);
        let mut resolved = Vec::with_capacity(sheets.len());
        for sheet in &sheets {
            resolved.push(self.resolver.resolve_sheet(sheet).await);
        }

        // Painting and PDF binding are pure CPU; keep them off the
        // async workers.
        let options =
            PdfOptions::print().with_title(format!("Facture {}", invoice.invoice_number));
        let document = tokio::task::spawn_blocking(move || {
            let mut pages = Vec::with_capacity(sheets.len());
            for (sheet, images) in sheets.iter().zip(&resolved) {
                pages.push(rasterize(sheet, SnapshotOptions::print(), images)?);
            }
            assemble(&pages, &options)
        })
        .await
        .map_err(|e| FactureError::Unknown(format!("render task failed: {}", e)))??;

        self.enter(DeliveryStage::Encoding);
        if document.is_empty() {
            return Err(FactureError::EmptyDocument(
                "assembly produced zero bytes".to_string(),
            ));
        }
        // The one base64 pass; every backend reuses the request's payload.
        let request = DeliveryRequest::from_invoice(invoice).with_payload(&document);
        println!(
            "[delivery] document ready: {} bytes ({} base64)",
            document.len(),
            request.pdf_base64.len()
        );

        self.enter(DeliveryStage::Dispatching);
        let mut outcomes = Vec::with_capacity(backends.len());
        for backend in backends {
            outcomes.push(dispatch_one(backend.as_ref(), &document, &request).await);
        }

        Ok(DeliverySummary::from_outcomes(outcomes))
    }
}

/// Drive one backend: config check, timeout guard around every attempt,
/// retries per the backend's policy.
async fn dispatch_one(
    backend: &dyn DeliveryBackend,
    document: &RenderedDocument,
    request: &DeliveryRequest,
) -> DeliveryOutcome {
    let kind = backend.kind();
    let started = Instant::now();

    let result = match backend.check_config() {
        Err(e) => Err(e),
        Ok(()) => {
            let policy = backend.retry_policy();
            let bound = backend.timeout();
            with_retry(&policy, kind.as_str(), || async move {
                match tokio::time::timeout(bound, backend.deliver(document, request)).await {
                    Ok(result) => result,
                    Err(_) => Err(FactureError::Timeout(format!(
                        "{} gave no answer within {:?}",
                        kind, bound
                    ))),
                }
            })
            .await
        }
    };

    let elapsed_ms = started.elapsed().as_millis() as u64;
    match result {
        Ok(receipt) => {
            println!("[delivery] {} delivered in {}ms", kind, elapsed_ms);
            DeliveryOutcome {
                backend: kind,
                success: true,
                message: receipt.message,
                elapsed_ms,
                error_class: None,
                hint: None,
            }
        }
        Err(e) => {
            let class = ErrorClass::of(&e);
            println!("[delivery] {} failed: {}", kind, e);
            DeliveryOutcome {
                backend: kind,
                success: false,
                message: e.to_string(),
                elapsed_ms,
                error_class: Some(class),
                hint: hint_for(class, kind),
            }
        }
    }
}

//! # Pipeline Tests
//!
//! End-to-end coverage of the render and delivery pipeline through the
//! public API.
//!
//! ## Test Coverage
//!
//! - **Rendering**: sheet capture dimensions, degenerate sheets, full
//!   invoice-to-PDF assembly.
//! - **Encoding**: base64 round trips with and without the data-URI
//!   prefix.
//! - **Delivery**: orchestrator dispatch with mock backends (retry
//!   timing under a paused clock, config-check short-circuit, partial
//!   failure aggregation) and the real mail relay's placeholder guard.
//!
//! Live delivery against the relay, the drive and a deployed endpoint
//! needs real credentials; run those paths manually via `facture send`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use pretty_assertions::assert_eq;

use facture::delivery::{
    BackendKind, DeliveryBackend, DeliveryReceipt, DeliveryRequest, DeliveryStage, ErrorClass,
    MailRelayBackend, MailRelayConfig, Orchestrator, RetryPolicy,
};
use facture::encode;
use facture::invoice::{samples, Client, Invoice, LineItem};
use facture::pdf::{assemble, PdfOptions, RenderedDocument};
use facture::sheet::{compose, Sheet};
use facture::snapshot::{capture, AssetResolver, SnapshotOptions};
use facture::FactureError;

// ============================================================================
// HELPERS
// ============================================================================

/// The invoice every delivery scenario below starts from: one line,
/// quantity two at 100 € gross, no discount, no terms page.
fn scenario_invoice() -> Invoice {
    let mut invoice = Invoice::new("2025-007", Client::new("Alice Martin", "a@b.com"))
        .with_item(LineItem::new("Oreiller ergonomique", 2, 100.0));
    invoice.issue_date = NaiveDate::from_ymd_opt(2025, 3, 14).unwrap();
    invoice
}

fn tiny_document() -> RenderedDocument {
    RenderedDocument {
        bytes: b"%PDF-1.3 tiny".to_vec(),
        generated_at: Utc::now(),
    }
}

#[derive(Debug)]
enum MockBehavior {
    Succeed,
    AlwaysTimeout,
    FailPermanent,
    MissingConfig,
}

/// Scripted backend that records every deliver call.
#[derive(Debug)]
struct MockBackend {
    kind: BackendKind,
    behavior: MockBehavior,
    policy: RetryPolicy,
    calls: Arc<AtomicUsize>,
    call_times: Arc<Mutex<Vec<tokio::time::Instant>>>,
}

impl MockBackend {
    fn create(
        kind: BackendKind,
        behavior: MockBehavior,
        policy: RetryPolicy,
    ) -> (Arc<dyn DeliveryBackend>, Arc<AtomicUsize>, Arc<Mutex<Vec<tokio::time::Instant>>>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let call_times = Arc::new(Mutex::new(Vec::new()));
        let backend = Arc::new(Self {
            kind,
            behavior,
            policy,
            calls: calls.clone(),
            call_times: call_times.clone(),
        });
        (backend, calls, call_times)
    }
}

#[async_trait]
impl DeliveryBackend for MockBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(5)
    }

    fn check_config(&self) -> Result<(), FactureError> {
        match self.behavior {
            MockBehavior::MissingConfig => Err(FactureError::NotConfigured(
                "scripted missing credentials".to_string(),
            )),
            _ => Ok(()),
        }
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.policy
    }

    async fn deliver(
        &self,
        _document: &RenderedDocument,
        request: &DeliveryRequest,
    ) -> Result<DeliveryReceipt, FactureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.call_times
            .lock()
            .unwrap()
            .push(tokio::time::Instant::now());
        match self.behavior {
            MockBehavior::Succeed => Ok(DeliveryReceipt {
                backend: self.kind,
                message: format!("delivered {}", request.filename),
                remote_id: None,
            }),
            MockBehavior::AlwaysTimeout => {
                Err(FactureError::Timeout("scripted timeout".to_string()))
            }
            MockBehavior::FailPermanent => Err(FactureError::Unauthorized(
                "scripted credential rejection".to_string(),
            )),
            MockBehavior::MissingConfig => unreachable!("config check precedes delivery"),
        }
    }
}

// ============================================================================
// RENDERING
// ============================================================================

#[tokio::test]
async fn test_capture_dimensions_match_sheet_times_scale() {
    let invoice = scenario_invoice();
    let sheets = compose(&invoice);
    let resolver = AssetResolver::new();

    let print = capture(&sheets[0], SnapshotOptions::print(), &resolver)
        .await
        .unwrap();
    assert_eq!(
        print.dimensions(),
        (sheets[0].width * 2, sheets[0].height * 2)
    );

    let preview = capture(&sheets[0], SnapshotOptions::preview(), &resolver)
        .await
        .unwrap();
    assert_eq!(preview.dimensions(), (sheets[0].width, sheets[0].height));
}

#[tokio::test]
async fn test_zero_width_sheet_fails_fast_without_bitmap() {
    let sheet = Sheet::new(0, 1123);
    let resolver = AssetResolver::new();

    let started = std::time::Instant::now();
    let result = capture(&sheet, SnapshotOptions::print(), &resolver).await;

    assert!(matches!(result, Err(FactureError::TargetNotFound(_))));
    assert!(started.elapsed() < Duration::from_millis(100));
}

#[tokio::test]
async fn test_scenario_invoice_renders_one_page_pdf() {
    let invoice = scenario_invoice();
    assert_eq!(invoice.total(), 200.0);

    // No terms page accepted, so the document is a single sheet.
    let sheets = compose(&invoice);
    assert_eq!(sheets.len(), 1);

    let resolver = AssetResolver::new();
    let mut pages = Vec::new();
    for sheet in &sheets {
        pages.push(
            capture(sheet, SnapshotOptions::print(), &resolver)
                .await
                .unwrap(),
        );
    }
    assert_eq!(pages.len(), 1);

    let document = assemble(&pages, &PdfOptions::print()).unwrap();
    assert!(document.bytes.starts_with(b"%PDF"));
    assert!(!document.is_empty());
}

#[tokio::test]
async fn test_demo_invoice_renders_terms_page() {
    let invoice = samples::demo_invoice();
    let sheets = compose(&invoice);
    assert!(sheets.len() >= 2, "accepted terms should add a page");

    let resolver = AssetResolver::new();
    let mut pages = Vec::new();
    for sheet in &sheets {
        pages.push(
            capture(sheet, SnapshotOptions::preview(), &resolver)
                .await
                .unwrap(),
        );
    }

    let document = assemble(&pages, &PdfOptions::preview()).unwrap();
    assert!(document.bytes.starts_with(b"%PDF"));
}

// ============================================================================
// ENCODING
// ============================================================================

#[test]
fn test_encode_round_trip_is_idempotent() {
    let bytes: Vec<u8> = (0..=255).collect();

    let encoded = encode::encode_data_uri(&bytes);
    let decoded = encode::decode(&encoded).unwrap();
    assert_eq!(decoded, bytes);

    // Re-encoding the decoded bytes reproduces the exact string.
    assert_eq!(encode::encode_data_uri(&decoded), encoded);
}

#[test]
fn test_decode_accepts_raw_base64() {
    let raw = encode::encode_raw(b"facture");
    assert_eq!(encode::decode(&raw).unwrap(), b"facture");
}

// ============================================================================
// DELIVERY REQUEST MAPPING
// ============================================================================

#[test]
fn test_delivery_request_carries_locale_formatted_totals() {
    let request = DeliveryRequest::from_invoice(&scenario_invoice());

    assert_eq!(request.invoice_number, "2025-007");
    assert_eq!(request.recipient_email, "a@b.com");
    assert_eq!(request.invoice_date, "14/03/2025");
    assert_eq!(request.total_amount, "200,00\u{a0}€");
    assert_eq!(request.balance_due, "200,00\u{a0}€");
    assert_eq!(request.item_count, 1);
    assert_eq!(request.filename, "Facture_2025-007.pdf");
}

// ============================================================================
// ORCHESTRATION
// ============================================================================

#[tokio::test]
async fn test_full_delivery_walks_stages_in_order() {
    let (backend, calls, _) = MockBackend::create(
        BackendKind::Endpoint,
        MockBehavior::Succeed,
        RetryPolicy::none(),
    );

    let mut orchestrator = Orchestrator::new(Arc::new(AssetResolver::new()));
    let summary = orchestrator
        .run(&scenario_invoice(), &[backend])
        .await
        .unwrap();

    assert!(summary.success);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(
        orchestrator.stages(),
        &[
            DeliveryStage::Idle,
            DeliveryStage::GeneratingDocument,
            DeliveryStage::Encoding,
            DeliveryStage::Dispatching,
            DeliveryStage::Completed,
        ]
    );
}

#[tokio::test]
async fn test_partial_failure_keeps_both_messages() {
    let (good, _, _) = MockBackend::create(
        BackendKind::CloudStorage,
        MockBehavior::Succeed,
        RetryPolicy::none(),
    );
    let (bad, _, _) = MockBackend::create(
        BackendKind::Endpoint,
        MockBehavior::FailPermanent,
        RetryPolicy::none(),
    );

    let mut orchestrator = Orchestrator::new(Arc::new(AssetResolver::new()));
    let summary = orchestrator
        .run(&scenario_invoice(), &[good, bad])
        .await
        .unwrap();

    assert!(summary.success, "one accepted channel is enough");
    assert_eq!(summary.outcomes.len(), 2);
    assert!(summary.outcomes[0].success);
    assert!(!summary.outcomes[1].success);
    assert!(summary.messages().iter().any(|m| m.contains("delivered")));
    assert!(summary
        .messages()
        .iter()
        .any(|m| m.contains("credential rejection")));
    assert_eq!(
        summary.outcomes[1].error_class,
        Some(ErrorClass::Unauthorized)
    );
}

#[tokio::test]
async fn test_unconfigured_backend_is_never_called() {
    let (backend, calls, _) = MockBackend::create(
        BackendKind::MailRelay,
        MockBehavior::MissingConfig,
        RetryPolicy::mail_relay(),
    );

    let mut orchestrator = Orchestrator::new(Arc::new(AssetResolver::new()));
    let summary = orchestrator
        .run(&scenario_invoice(), &[backend])
        .await
        .unwrap();

    assert!(!summary.success);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert_eq!(
        summary.outcomes[0].error_class,
        Some(ErrorClass::NotConfigured)
    );
    assert!(summary.outcomes[0].hint.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_persistent_timeout_retries_with_linear_backoff() {
    let (backend, calls, call_times) = MockBackend::create(
        BackendKind::MailRelay,
        MockBehavior::AlwaysTimeout,
        RetryPolicy::mail_relay(),
    );

    let mut orchestrator = Orchestrator::new(Arc::new(AssetResolver::new()));
    let summary = orchestrator
        .run(&scenario_invoice(), &[backend])
        .await
        .unwrap();

    assert!(!summary.success);
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(summary.outcomes[0].error_class, Some(ErrorClass::Timeout));

    // Attempt gaps follow attempt_number x 1s.
    let times = call_times.lock().unwrap();
    assert!(times[1] - times[0] >= Duration::from_secs(1));
    assert!(times[2] - times[1] >= Duration::from_secs(2));
}

// ============================================================================
// MAIL RELAY GUARDS
// ============================================================================

#[tokio::test]
async fn test_placeholder_credentials_fail_without_network() {
    let backend = MailRelayBackend::new(MailRelayConfig::new(
        "YOUR_SERVICE_ID",
        "template_x",
        "key_x",
    ));
    let request = DeliveryRequest::from_invoice(&scenario_invoice());

    let started = std::time::Instant::now();
    let result = backend.deliver(&tiny_document(), &request).await;

    assert!(matches!(result, Err(FactureError::NotConfigured(_))));
    assert!(started.elapsed() < Duration::from_millis(100));
}

//! Delivery handlers: multi-channel dispatch and endpoint probing.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::delivery::{
    BackendKind, CloudBackend, CloudConfig, DeliveryBackend, DeliverySummary, EndpointBackend,
    EndpointConfig, ErrorClass, MailRelayBackend, MailRelayConfig, Orchestrator,
};
use crate::invoice::Invoice;

use super::super::state::{AppState, BackendDefaults};

/// Request body for POST /api/send.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub invoice: Invoice,
    /// Backend names to dispatch to; empty means every configured backend.
    #[serde(default)]
    pub channels: Vec<String>,
    #[serde(default)]
    pub mail_relay: Option<MailRelayConfig>,
    #[serde(default)]
    pub cloud: Option<CloudConfig>,
    #[serde(default)]
    pub endpoint: Option<EndpointConfig>,
}

/// POST /api/send - render the invoice and dispatch it.
///
/// Partial failure is a domain result, not an HTTP error: the summary
/// comes back 200 with per-backend outcomes. Only a pipeline failure
/// before dispatch (bad channel name, render error) maps to an error
/// status.
pub async fn send(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SendRequest>,
) -> Result<Json<DeliverySummary>, (StatusCode, Json<serde_json::Value>)> {
    let backends = select_backends(&req, &state.config.defaults).map_err(|msg| {
        (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"success": false, "error": msg})),
        )
    })?;

    println!(
        "[send] {} via {} backend(s)",
        req.invoice.invoice_number,
        backends.len()
    );

    let mut orchestrator = Orchestrator::new(state.resolver.clone());
    match orchestrator.run(&req.invoice, &backends).await {
        Ok(summary) => Ok(Json(summary)),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(serde_json::json!({
                "success": false,
                "error": format!("Delivery pipeline failed: {}", e),
            })),
        )),
    }
}

/// Pick the backends for a send request.
///
/// An explicitly selected channel without credentials still gets a
/// backend; its config check reports the missing fields as a
/// per-backend outcome instead of a 400.
fn select_backends(
    req: &SendRequest,
    defaults: &BackendDefaults,
) -> Result<Vec<Arc<dyn DeliveryBackend>>, String> {
    let mail_relay = req.mail_relay.clone().or_else(|| defaults.mail_relay.clone());
    let cloud = req.cloud.clone().or_else(|| defaults.cloud.clone());
    let endpoint = req.endpoint.clone().or_else(|| defaults.endpoint.clone());

    let mut kinds: Vec<BackendKind> = Vec::new();
    if req.channels.is_empty() {
        if mail_relay.is_some() {
            kinds.push(BackendKind::MailRelay);
        }
        if cloud.is_some() {
            kinds.push(BackendKind::CloudStorage);
        }
        if endpoint.is_some() {
            kinds.push(BackendKind::Endpoint);
        }
    } else {
        for name in &req.channels {
            let kind = BackendKind::by_name(name)
                .ok_or_else(|| format!("unknown delivery channel '{}'", name))?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
    }

    if kinds.is_empty() {
        return Err("no delivery channel selected or configured".to_string());
    }

    Ok(kinds
        .into_iter()
        .map(|kind| -> Arc<dyn DeliveryBackend> {
            match kind {
                BackendKind::MailRelay => Arc::new(MailRelayBackend::new(
                    mail_relay.clone().unwrap_or_else(|| MailRelayConfig::new("", "", "")),
                )),
                BackendKind::CloudStorage => Arc::new(CloudBackend::new(
                    cloud.clone().unwrap_or_else(|| CloudConfig::new("", "", "", "")),
                )),
                BackendKind::Endpoint => Arc::new(EndpointBackend::new(
                    endpoint.clone().unwrap_or_else(|| EndpointConfig::new("")),
                )),
            }
        })
        .collect())
}

/// Request body for POST /api/endpoint/test.
#[derive(Debug, Deserialize)]
pub struct ProbeRequest {
    pub url: String,
}

/// POST /api/endpoint/test - connectivity check against a custom endpoint.
pub async fn probe(Json(req): Json<ProbeRequest>) -> impl IntoResponse {
    let backend = EndpointBackend::new(EndpointConfig::new(&req.url));
    match backend.probe().await {
        Ok(reply) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "success": true,
                "verdict": reply.verdict,
                "body": reply.raw_body,
            })),
        ),
        Err(e) => {
            let class = ErrorClass::of(&e);
            let status = match class {
                ErrorClass::NotConfigured => StatusCode::BAD_REQUEST,
                _ => StatusCode::BAD_GATEWAY,
            };
            (
                status,
                Json(serde_json::json!({
                    "success": false,
                    "error": e.to_string(),
                    "class": class,
                })),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::samples;

    fn request_with(channels: &[&str]) -> SendRequest {
        SendRequest {
            invoice: samples::minimal_invoice(),
            channels: channels.iter().map(|s| s.to_string()).collect(),
            mail_relay: None,
            cloud: None,
            endpoint: Some(EndpointConfig::new("https://example.com/hook")),
        }
    }

    #[test]
    fn test_empty_channels_use_configured_backends() {
        let backends = select_backends(&request_with(&[]), &BackendDefaults::default()).unwrap();
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].kind(), BackendKind::Endpoint);
    }

    #[test]
    fn test_named_channel_without_credentials_is_kept() {
        let backends =
            select_backends(&request_with(&["mail-relay"]), &BackendDefaults::default()).unwrap();
        assert_eq!(backends.len(), 1);
        assert_eq!(backends[0].kind(), BackendKind::MailRelay);
        // the missing credentials surface through the config check
        assert!(backends[0].check_config().is_err());
    }

    #[test]
    fn test_unknown_channel_is_rejected() {
        let err = select_backends(&request_with(&["pigeon"]), &BackendDefaults::default())
            .unwrap_err();
        assert!(err.contains("pigeon"));
    }

    #[test]
    fn test_duplicate_channels_collapse() {
        let backends = select_backends(
            &request_with(&["endpoint", "custom"]),
            &BackendDefaults::default(),
        )
        .unwrap();
        assert_eq!(backends.len(), 1);
    }

    #[test]
    fn test_nothing_selected_and_nothing_configured() {
        let mut req = request_with(&[]);
        req.endpoint = None;
        assert!(select_backends(&req, &BackendDefaults::default()).is_err());
    }

    #[test]
    fn test_server_defaults_fill_missing_configs() {
        let mut req = request_with(&[]);
        req.endpoint = None;
        let defaults = BackendDefaults {
            endpoint: Some(EndpointConfig::new("https://example.com/hook")),
            ..BackendDefaults::default()
        };
        let backends = select_backends(&req, &defaults).unwrap();
        assert_eq!(backends.len(), 1);
        assert!(backends[0].check_config().is_ok());
    }
}

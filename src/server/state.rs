//! Server state and configuration.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::delivery::{CloudConfig, EndpointConfig, MailRelayConfig};
use crate::invoice::Invoice;
use crate::snapshot::AssetResolver;

/// Drafts idle longer than this are dropped by the cleanup task.
pub const DRAFT_EXPIRATION_SECS: u64 = 60 * 60;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:3000")
    pub listen_addr: String,
    /// Backend credentials picked up at startup; request bodies override.
    pub defaults: BackendDefaults,
}

/// Delivery credentials the server was started with.
#[derive(Debug, Clone, Default)]
pub struct BackendDefaults {
    pub mail_relay: Option<MailRelayConfig>,
    pub cloud: Option<CloudConfig>,
    pub endpoint: Option<EndpointConfig>,
}

impl BackendDefaults {
    /// Names of the backends that have credentials, for the startup banner.
    pub fn configured(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.mail_relay.is_some() {
            names.push("mail-relay");
        }
        if self.cloud.is_some() {
            names.push("cloud-storage");
        }
        if self.endpoint.is_some() {
            names.push("endpoint");
        }
        names
    }
}

/// An invoice parked between editing sessions.
pub struct DraftEntry {
    pub invoice: Invoice,
    pub last_accessed: Instant,
}

impl DraftEntry {
    pub fn new(invoice: Invoice) -> Self {
        Self {
            invoice,
            last_accessed: Instant::now(),
        }
    }

    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }

    /// Whether the draft sat untouched for the full idle window.
    pub fn is_expired(&self, ttl: Duration) -> bool {
        self.last_accessed.elapsed() >= ttl
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Shared image cache; one fetch per signature across requests.
    pub resolver: Arc<AssetResolver>,
    pub drafts: RwLock<HashMap<Uuid, DraftEntry>>,
    /// Unix timestamp of server boot.
    pub boot_time: u64,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        let boot_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self {
            config,
            resolver: Arc::new(AssetResolver::new()),
            drafts: RwLock::new(HashMap::new()),
            boot_time,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoice::samples;

    #[test]
    fn test_touch_refreshes_last_accessed() {
        let mut entry = DraftEntry::new(samples::minimal_invoice());
        let first = entry.last_accessed;
        entry.touch();
        assert!(entry.last_accessed >= first);
    }

    #[test]
    fn test_fresh_draft_survives_the_default_ttl() {
        let entry = DraftEntry::new(samples::minimal_invoice());
        assert!(!entry.is_expired(Duration::from_secs(DRAFT_EXPIRATION_SECS)));
    }

    #[test]
    fn test_idle_draft_expires_and_touch_rescues() {
        let ttl = Duration::from_millis(10);
        let mut entry = DraftEntry::new(samples::minimal_invoice());
        assert!(!entry.is_expired(ttl));

        std::thread::sleep(Duration::from_millis(50));
        assert!(entry.is_expired(ttl));

        entry.touch();
        assert!(!entry.is_expired(ttl));
    }

    #[test]
    fn test_configured_lists_present_backends() {
        let defaults = BackendDefaults {
            endpoint: Some(EndpointConfig::new("https://example.com/hook")),
            ..BackendDefaults::default()
        };
        assert_eq!(defaults.configured(), vec!["endpoint"]);
        assert!(BackendDefaults::default().configured().is_empty());
    }
}

//! # Error Types
//!
//! This module defines error types used throughout the facture library.

use thiserror::Error;

/// Main error type for facture operations
#[derive(Debug, Error)]
pub enum FactureError {
    /// The render target (sheet) is missing or has zero dimensions.
    /// Not retryable without caller intervention.
    #[error("Render target not found: {0}")]
    TargetNotFound(String),

    /// A backend is missing credentials or identifiers. Checked before
    /// any network call is made.
    #[error("Not configured: {0}")]
    NotConfigured(String),

    /// A stage exceeded its time bound
    #[error("Timed out: {0}")]
    Timeout(String),

    /// The remote host could not be reached
    #[error("Network unreachable: {0}")]
    NetworkUnreachable(String),

    /// The backend rejected the credentials
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The backend replied, but not recognizably successfully
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The encoded attachment exceeds the backend's payload ceiling
    #[error("Attachment too large: {size} bytes (limit {limit})")]
    AttachmentTooLarge { size: usize, limit: usize },

    /// A rendered document with zero bytes reached the dispatch stage
    #[error("Empty document: {0}")]
    EmptyDocument(String),

    /// Image processing error
    #[error("Image error: {0}")]
    Image(String),

    /// PDF assembly error
    #[error("PDF error: {0}")]
    Pdf(String),

    /// I/O error wrapper
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything that does not fit the taxonomy above
    #[error("{0}")]
    Unknown(String),
}

impl FactureError {
    /// Whether a retry without caller intervention could plausibly
    /// succeed. Only timeouts and unreachable networks qualify.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            FactureError::Timeout(_) | FactureError::NetworkUnreachable(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classes() {
        assert!(FactureError::Timeout("t".into()).is_transient());
        assert!(FactureError::NetworkUnreachable("n".into()).is_transient());
    }

    #[test]
    fn test_permanent_classes() {
        assert!(!FactureError::NotConfigured("c".into()).is_transient());
        assert!(!FactureError::TargetNotFound("t".into()).is_transient());
        assert!(!FactureError::Unauthorized("a".into()).is_transient());
        assert!(
            !FactureError::AttachmentTooLarge {
                size: 3_000_000,
                limit: 2_097_152
            }
            .is_transient()
        );
    }

    #[test]
    fn test_display_carries_detail() {
        let err = FactureError::NotConfigured("mail relay service id".into());
        assert_eq!(err.to_string(), "Not configured: mail relay service id");
    }
}

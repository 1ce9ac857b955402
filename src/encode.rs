//! Base64 packaging of rendered documents.
//!
//! Delivery backends ship the PDF as base64 text, either raw or wrapped
//! in a `data:` URI depending on what the receiving side expects. Both
//! forms decode back to the exact input bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::error::FactureError;

const PDF_URI_PREFIX: &str = "data:application/pdf;base64,";

/// Encode bytes as plain base64 (standard alphabet, padded).
pub fn encode_raw(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Encode bytes as a `data:application/pdf;base64,…` URI.
pub fn encode_data_uri(bytes: &[u8]) -> String {
    data_uri_from_raw(&encode_raw(bytes))
}

/// Wrap an already-encoded payload in the data-URI form, without
/// touching the payload itself.
pub fn data_uri_from_raw(raw: &str) -> String {
    format!("{}{}", PDF_URI_PREFIX, raw)
}

/// Strip a `data:…;base64,` prefix if present, returning the bare
/// base64 payload. Strings without a prefix pass through unchanged.
pub fn strip_data_uri(encoded: &str) -> &str {
    if !encoded.starts_with("data:") {
        return encoded;
    }
    match encoded.split_once("base64,") {
        Some((_, payload)) => payload,
        None => encoded,
    }
}

/// Decode base64 text back into bytes, accepting both raw payloads and
/// `data:` URIs.
pub fn decode(encoded: &str) -> Result<Vec<u8>, FactureError> {
    STANDARD
        .decode(strip_data_uri(encoded).trim())
        .map_err(|e| FactureError::InvalidResponse(format!("Invalid base64 payload: {}", e)))
}

//! Photo extraction client
//!
//! The extraction service receives an image or PDF as a data URI together
//! with a schema description, and answers with a loosely typed JSON object.
//! Nothing about that answer is trusted here; the merge policy decides what
//! to take.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::{json, Value};
use std::time::Duration;

use crate::error::ExtractError;

const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Source of best-effort field values for a photographed document
#[async_trait]
pub trait PhotoExtractor: Send + Sync {
    async fn extract(&self, data_uri: &str, schema: &str) -> Result<Value, ExtractError>;
}

/// Extraction service reached over HTTP
pub struct HttpPhotoExtractor {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpPhotoExtractor {
    pub fn new(endpoint: &str) -> Result<Self, ExtractError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| ExtractError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl PhotoExtractor for HttpPhotoExtractor {
    async fn extract(&self, data_uri: &str, schema: &str) -> Result<Value, ExtractError> {
        tracing::debug!(endpoint = %self.endpoint, bytes = data_uri.len(), "Requesting photo extraction");

        let response = self
            .http_client
            .post(&self.endpoint)
            .json(&json!({ "data_uri": data_uri, "schema": schema }))
            .send()
            .await
            .map_err(|e| ExtractError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ExtractError::Api(status.as_u16(), error_text));
        }

        response
            .json()
            .await
            .map_err(|e| ExtractError::Parse(e.to_string()))
    }
}

/// Encode raw file bytes as a data URI
///
/// The media type is sniffed from the content; only images and PDF pass.
pub fn data_uri_from_bytes(bytes: &[u8]) -> Result<String, ExtractError> {
    let kind = infer::get(bytes)
        .ok_or_else(|| ExtractError::UnsupportedMedia("unknown file type".to_string()))?;
    let mime = kind.mime_type();
    if !(mime.starts_with("image/") || mime == "application/pdf") {
        return Err(ExtractError::UnsupportedMedia(mime.to_string()));
    }
    Ok(format!("data:{};base64,{}", mime, STANDARD.encode(bytes)))
}

/// Re-encode a client supplied data URI after checking its content
///
/// The declared media type is ignored in favour of the sniffed one.
pub fn normalize_data_uri(data_uri: &str) -> Result<String, ExtractError> {
    let payload = data_uri
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, payload)| payload.trim())
        .ok_or_else(|| ExtractError::UnsupportedMedia("not a base64 data URI".to_string()))?;
    let bytes = STANDARD
        .decode(payload)
        .map_err(|e| ExtractError::UnsupportedMedia(format!("invalid base64: {}", e)))?;
    data_uri_from_bytes(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_HEADER: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];
    const PDF_HEADER: &[u8] = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n";

    #[test]
    fn test_png_and_pdf_accepted() {
        let uri = data_uri_from_bytes(PNG_HEADER).unwrap();
        assert!(uri.starts_with("data:image/png;base64,"));

        let uri = data_uri_from_bytes(PDF_HEADER).unwrap();
        assert!(uri.starts_with("data:application/pdf;base64,"));
    }

    #[test]
    fn test_other_content_rejected() {
        assert!(matches!(
            data_uri_from_bytes(b"just some text"),
            Err(ExtractError::UnsupportedMedia(_))
        ));
        // zip archive
        assert!(matches!(
            data_uri_from_bytes(&[b'P', b'K', 0x03, 0x04, 0, 0, 0, 0]),
            Err(ExtractError::UnsupportedMedia(_))
        ));
    }

    #[test]
    fn test_normalize_uses_sniffed_type() {
        let declared_wrong = format!("data:image/jpeg;base64,{}", STANDARD.encode(PNG_HEADER));
        let normalized = normalize_data_uri(&declared_wrong).unwrap();
        assert!(normalized.starts_with("data:image/png;base64,"));
    }

    #[test]
    fn test_normalize_rejects_malformed_uris() {
        assert!(normalize_data_uri("http://example.com/a.png").is_err());
        assert!(normalize_data_uri("data:image/png;base64,@@@").is_err());
    }
}

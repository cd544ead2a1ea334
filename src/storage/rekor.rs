//! Rekor v2 client for DSSE entries.

use crate::error::{Error, Result};
use crate::in_toto::dsse::Envelope;
use crate::storage::traits::TransparencyLog;

use log::{debug, warn};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use serde_with::serde_as;
use std::time::Duration;

pub const DEFAULT_REKOR_URL: &str = "https://log2025-1.rekor.sigstore.dev";
pub const ENTRIES_PATH: &str = "/api/v2/log/entries";
pub const DEFAULT_KEY_DETAILS: &str = "PKIX_ECDSA_P256_SHA_256";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicKeyBytes {
    #[serde_as(as = "serde_with::base64::Base64")]
    pub raw_bytes: Vec<u8>,
}

/// Key the log uses to check envelope signatures without prior registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Verifier {
    pub public_key: PublicKeyBytes,
    pub key_details: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsseRequestV002 {
    pub envelope: Envelope,
    pub verifiers: Vec<Verifier>,
}

/// Body of `POST /api/v2/log/entries` for a DSSE entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RekorEntryRequest {
    #[serde(rename = "dsseRequestV002")]
    pub dsse_request_v002: DsseRequestV002,
}

impl RekorEntryRequest {
    /// Wrap a signed envelope with a single verifier.
    pub fn new(envelope: Envelope, public_key_der: Vec<u8>, key_details: &str) -> Self {
        Self {
            dsse_request_v002: DsseRequestV002 {
                envelope,
                verifiers: vec![Verifier {
                    public_key: PublicKeyBytes {
                        raw_bytes: public_key_der,
                    },
                    key_details: key_details.to_string(),
                }],
            },
        }
    }

    pub fn envelope(&self) -> &Envelope {
        &self.dsse_request_v002.envelope
    }

    pub fn verifiers(&self) -> &[Verifier] {
        &self.dsse_request_v002.verifiers
    }
}

/// What the log answered.
#[derive(Clone, Debug, PartialEq)]
pub struct LogResponse {
    pub status: u16,
    pub ok: bool,
    /// Parsed JSON body, or `{"raw": <text>}` when the body is not JSON.
    pub body: Value,
}

impl LogResponse {
    pub fn from_body(status: u16, text: &str) -> Self {
        Self {
            status,
            ok: (200..300).contains(&status),
            body: parse_response_body(text),
        }
    }
}

/// Parse a response body as JSON, keeping the raw text when that fails.
///
/// # Examples
///
/// ```
/// use fcp_rekor::storage::rekor::parse_response_body;
/// use serde_json::json;
///
/// assert_eq!(parse_response_body(r#"{"logIndex":7}"#), json!({"logIndex": 7}));
/// assert_eq!(parse_response_body("bad gateway"), json!({"raw": "bad gateway"}));
/// ```
pub fn parse_response_body(text: &str) -> Value {
    serde_json::from_str(text).unwrap_or_else(|_| json!({ "raw": text }))
}

pub struct RekorClient {
    client: reqwest::blocking::Client,
    base_url: String,
    timeout: Duration,
}

impl RekorClient {
    pub fn new_with_url(url: String, timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::InitializationError(format!("Failed to build HTTP client: {e}")))?;

        Ok(RekorClient {
            client,
            base_url: url.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn transport_error(&self, url: &str, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::SubmissionTimeout {
                url: url.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            Error::SubmissionNetwork {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

impl TransparencyLog for RekorClient {
    fn entries_url(&self) -> String {
        format!("{}{}", self.base_url, ENTRIES_PATH)
    }

    fn submit_entry(&self, request: &RekorEntryRequest) -> Result<LogResponse> {
        let url = self.entries_url();
        let body = serde_json::to_vec(request)
            .map_err(|e| Error::Serialization(format!("Failed to serialize Rekor request: {e}")))?;

        debug!("POST {url} ({} bytes)", body.len());
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body)
            .send()
            .map_err(|e| self.transport_error(&url, e))?;

        let status = response.status().as_u16();
        let text = response
            .text()
            .map_err(|e| self.transport_error(&url, e))?;

        let parsed = LogResponse::from_body(status, &text);
        if !parsed.ok {
            warn!("Rekor responded with status {status}");
        }
        Ok(parsed)
    }
}

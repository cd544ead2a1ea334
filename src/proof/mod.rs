//! # Proof records
//!
//! A [`ProofRecord`] is the audit trail of one submission: what was read,
//! what was sent, and exactly what the log answered. Records are written by
//! [`FilesystemProofStore`](crate::storage::filesystem::FilesystemProofStore)
//! and can be re-checked offline with [`verify::verify_proof_file`].

use crate::in_toto::LoadedArtifact;
use crate::signing::KeySource;
use crate::storage::rekor::{LogResponse, RekorEntryRequest};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod verify;

/// Envelope mode recorded in every proof.
pub const PROOF_MODE: &str = "dsse";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RekorOutcome {
    pub url: String,
    pub status: u16,
    pub ok: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArtifactSummary {
    pub path: String,
    pub size_bytes: u64,
    pub sha256: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvelopeSummary {
    pub payload_type: String,
    pub predicate_type: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProofRecord {
    pub submitted_at: String,
    pub mode: String,
    pub key_source: KeySource,
    pub rekor: RekorOutcome,
    pub artifact: ArtifactSummary,
    pub in_toto: EnvelopeSummary,
    pub request: RekorEntryRequest,
    pub response: Value,
}

impl ProofRecord {
    pub fn new(
        submitted_at: DateTime<Utc>,
        key_source: KeySource,
        url: String,
        artifact: &LoadedArtifact,
        predicate_type: &str,
        request: RekorEntryRequest,
        response: LogResponse,
    ) -> Self {
        let payload_type = request.envelope().payload_type().to_string();

        Self {
            submitted_at: submitted_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            mode: PROOF_MODE.to_string(),
            key_source,
            rekor: RekorOutcome {
                url,
                status: response.status,
                ok: response.ok,
            },
            artifact: ArtifactSummary {
                path: artifact.path.to_string_lossy().into_owned(),
                size_bytes: artifact.size_bytes(),
                sha256: artifact.sha256.clone(),
            },
            in_toto: EnvelopeSummary {
                payload_type,
                predicate_type: predicate_type.to_string(),
            },
            request,
            response: response.body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::in_toto::dsse::{DSSE_PAYLOAD_TYPE, Envelope};
    use crate::in_toto::{FCP_PREDICATE_TYPE, parse_artifact};
    use chrono::TimeZone;
    use std::path::Path;

    #[test]
    fn test_proof_record_json_shape() -> Result<()> {
        let artifact = parse_artifact(
            Path::new("/att/20250102T030405Z.json"),
            br#"{"m":"a","u":"b","r":"c","s":"d"}"#.to_vec(),
        )?;
        let mut envelope = Envelope::new(b"{}".to_vec(), DSSE_PAYLOAD_TYPE.to_string());
        envelope.add_signature(vec![1], String::new())?;
        let request = RekorEntryRequest::new(envelope, vec![2], "PKIX_ECDSA_P256_SHA_256");
        let at = Utc.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();

        let record = ProofRecord::new(
            at,
            KeySource::Ephemeral,
            "https://rekor.test/api/v2/log/entries".to_string(),
            &artifact,
            FCP_PREDICATE_TYPE,
            request,
            LogResponse::from_body(201, r#"{"logIndex":"12"}"#),
        );

        let json = serde_json::to_value(&record)?;
        assert_eq!(json["submittedAt"], "2025-01-02T03:04:05.000Z");
        assert_eq!(json["mode"], "dsse");
        assert_eq!(json["keySource"], "ephemeral");
        assert_eq!(json["rekor"]["status"], 201);
        assert_eq!(json["rekor"]["ok"], true);
        assert_eq!(json["artifact"]["path"], "/att/20250102T030405Z.json");
        assert_eq!(json["artifact"]["sizeBytes"], artifact.size_bytes());
        assert_eq!(json["artifact"]["sha256"], artifact.sha256.as_str());
        assert_eq!(json["inToto"]["payloadType"], DSSE_PAYLOAD_TYPE);
        assert_eq!(json["inToto"]["predicateType"], FCP_PREDICATE_TYPE);
        assert!(json["request"]["dsseRequestV002"].is_object());
        assert_eq!(json["response"]["logIndex"], "12");

        let back: ProofRecord = serde_json::from_value(json)?;
        assert_eq!(back, record);
        Ok(())
    }
}

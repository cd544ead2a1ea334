//! # in-toto statements for statement-attestations
//!
//! Reads an attestation artifact, digests its raw bytes and wraps it in an
//! in-toto v1 Statement, which is then serialized once and signed inside a
//! DSSE [`Envelope`].
//!
//! See: <https://github.com/in-toto/attestation/blob/main/spec/v1/statement.md>
//!
//! ## Examples
//!
//! ```no_run
//! use fcp_rekor::in_toto::{build_statement, generate_signed_statement, load_artifact};
//! use fcp_rekor::signing::KeyPair;
//! use std::path::Path;
//!
//! let artifact = load_artifact(Path::new("20250101T000000Z.json")).unwrap();
//! let statement = build_statement(&artifact);
//! let keys = KeyPair::generate().unwrap();
//! let envelope = generate_signed_statement(&statement, &keys).unwrap();
//! assert!(envelope.validate());
//! ```

use crate::error::{Error, Result};
use crate::hash;
use crate::signing::KeyPair;
use crate::signing::signable::Signable;
use crate::utils::read_file_bytes;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub mod dsse;

use dsse::{DSSE_PAYLOAD_TYPE, Envelope};

/// in-toto Statement v1 type URI.
pub const STATEMENT_TYPE: &str = "https://in-toto.io/Statement/v1";

/// Predicate type for FCP statement-attestations.
pub const FCP_PREDICATE_TYPE: &str = "https://fide.work/fcp/predicate/statement-attestation/v1";

/// A statement-attestation as produced by the seeding process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttestationRecord {
    /// Signing method identifier.
    #[serde(rename = "m")]
    pub method: String,
    /// Signer / user identifier.
    #[serde(rename = "u")]
    pub user: String,
    /// Merkle root over the attested statements.
    #[serde(rename = "r")]
    pub root: String,
    /// Original attestation signature.
    #[serde(rename = "s")]
    pub signature: String,
}

/// An artifact read from disk together with the digest of its exact bytes.
#[derive(Debug, Clone)]
pub struct LoadedArtifact {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub sha256: String,
    pub record: AttestationRecord,
}

impl LoadedArtifact {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Base file name, used as the statement subject.
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.to_string_lossy().into_owned())
    }
}

/// Read and parse an attestation artifact.
///
/// Fails with [`Error::ArtifactEmpty`] when the file holds only whitespace and
/// with [`Error::ArtifactMalformed`] when it is not a complete record. The
/// digest is computed over the bytes as read.
pub fn load_artifact(path: &Path) -> Result<LoadedArtifact> {
    let bytes = read_file_bytes(path)?;
    parse_artifact(path, bytes)
}

pub(crate) fn parse_artifact(path: &Path, bytes: Vec<u8>) -> Result<LoadedArtifact> {
    let malformed = |reason: String| Error::ArtifactMalformed {
        path: path.to_path_buf(),
        reason,
    };

    let text = std::str::from_utf8(&bytes).map_err(|e| malformed(e.to_string()))?;
    if text.trim().is_empty() {
        return Err(Error::ArtifactEmpty {
            path: path.to_path_buf(),
        });
    }

    let record: AttestationRecord =
        serde_json::from_str(text.trim()).map_err(|e| malformed(e.to_string()))?;

    let sha256 = hash::calculate_hash(&bytes);

    Ok(LoadedArtifact {
        path: path.to_path_buf(),
        bytes,
        sha256,
        record,
    })
}

/// A subject of a statement with its digest set (algorithm -> hex).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub digest: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceInfo {
    pub path: String,
}

/// Predicate body: the embedded attestation plus where it was read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementAttestationPredicate {
    pub attestation: AttestationRecord,
    pub source: SourceInfo,
}

/// An in-toto v1 attestation statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statement {
    #[serde(rename = "_type")]
    pub statement_type: String,
    pub subject: Vec<Subject>,
    #[serde(rename = "predicateType")]
    pub predicate_type: String,
    pub predicate: StatementAttestationPredicate,
}

impl Statement {
    /// Digest recorded for the first subject under `alg`, if any.
    pub fn subject_digest(&self, alg: &str) -> Option<&str> {
        self.subject
            .first()
            .and_then(|s| s.digest.get(alg))
            .map(String::as_str)
    }
}

/// Creates a minimal subject with a single digest.
///
/// # Examples
///
/// ```
/// use fcp_rekor::in_toto::make_subject;
///
/// let subject = make_subject("20250101T000000Z.json", "sha256", "abc123");
/// assert_eq!(subject.digest.get("sha256").map(String::as_str), Some("abc123"));
/// ```
pub fn make_subject(name: &str, alg: &str, digest: &str) -> Subject {
    Subject {
        name: name.to_string(),
        digest: BTreeMap::from([(alg.to_string(), digest.to_string())]),
    }
}

/// Build the statement describing `artifact`.
pub fn build_statement(artifact: &LoadedArtifact) -> Statement {
    Statement {
        statement_type: STATEMENT_TYPE.to_string(),
        subject: vec![make_subject(
            &artifact.file_name(),
            hash::SHA256,
            &artifact.sha256,
        )],
        predicate_type: FCP_PREDICATE_TYPE.to_string(),
        predicate: StatementAttestationPredicate {
            attestation: artifact.record.clone(),
            source: SourceInfo {
                path: artifact.path.to_string_lossy().into_owned(),
            },
        },
    }
}

/// Serialize `statement` once and sign it inside a DSSE envelope.
///
/// The serialized bytes become both the signed PAE body and the envelope
/// payload; nothing is re-encoded in between.
pub fn generate_signed_statement(statement: &Statement, keys: &KeyPair) -> Result<Envelope> {
    let payload = serde_json::to_vec(statement)
        .map_err(|e| Error::Serialization(format!("Failed to serialize in-toto statement: {e}")))?;

    let mut envelope = Envelope::new(payload, DSSE_PAYLOAD_TYPE.to_string());
    envelope.sign(keys)?;

    if !envelope.validate() {
        return Err(Error::Signing("DSSE envelope is incomplete after signing".to_string()));
    }

    Ok(envelope)
}

//! Offline re-verification of a recorded proof.

use crate::error::{Error, Result};
use crate::hash;
use crate::in_toto::Statement;
use crate::proof::ProofRecord;
use crate::signing;
use crate::signing::KeySource;
use crate::utils::read_file_bytes;

use log::{debug, info};
use std::path::{Path, PathBuf};

/// Summary of a proof that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedProof {
    pub proof_path: PathBuf,
    pub subject: String,
    pub sha256: String,
    pub status: u16,
    pub ok: bool,
    pub key_source: KeySource,
    pub artifact_checked: bool,
}

/// Load and verify a proof file.
///
/// Checks that every envelope signature verifies against the recorded
/// verifier key over the PAE of the embedded payload, and that the statement
/// subject digest matches the recorded artifact digest. With
/// `check_artifact`, the artifact file is re-hashed as well.
pub fn verify_proof_file(path: &Path, check_artifact: bool) -> Result<VerifiedProof> {
    let bytes = read_file_bytes(path)?;
    let record: ProofRecord = serde_json::from_slice(&bytes)?;
    verify_proof_record(&record, path, check_artifact)
}

pub fn verify_proof_record(
    record: &ProofRecord,
    proof_path: &Path,
    check_artifact: bool,
) -> Result<VerifiedProof> {
    let envelope = record.request.envelope();

    let verifier = match record.request.verifiers() {
        [verifier] => verifier,
        other => {
            return Err(Error::Verification(format!(
                "Expected exactly one verifier, found {}",
                other.len()
            )));
        }
    };

    let public_key = signing::public_key_from_spki_der(&verifier.public_key.raw_bytes)?;
    if !envelope.verify(&public_key)? {
        return Err(Error::Verification(
            "DSSE signature does not verify against the recorded public key".to_string(),
        ));
    }
    debug!("Envelope signature verified");

    if envelope.payload_type() != record.in_toto.payload_type {
        return Err(Error::Verification(format!(
            "Payload type mismatch: envelope has {}, record has {}",
            envelope.payload_type(),
            record.in_toto.payload_type
        )));
    }

    let statement: Statement = serde_json::from_slice(envelope.payload())
        .map_err(|e| Error::Verification(format!("Envelope payload is not a statement: {e}")))?;

    if statement.predicate_type != record.in_toto.predicate_type {
        return Err(Error::Verification(format!(
            "Predicate type mismatch: statement has {}, record has {}",
            statement.predicate_type, record.in_toto.predicate_type
        )));
    }

    let subject_digest = statement
        .subject_digest(hash::SHA256)
        .ok_or_else(|| Error::Verification("Statement has no sha256 subject".to_string()))?;

    if !hash::digests_match(subject_digest, &record.artifact.sha256) {
        return Err(Error::Verification(format!(
            "Subject digest {subject_digest} does not match recorded artifact digest {}",
            record.artifact.sha256
        )));
    }

    if check_artifact {
        let artifact_path = Path::new(&record.artifact.path);
        let actual = hash::calculate_file_hash(artifact_path)?;
        if !hash::digests_match(&actual, &record.artifact.sha256) {
            return Err(Error::Verification(format!(
                "Artifact {} no longer matches recorded digest",
                artifact_path.display()
            )));
        }
        info!("Artifact {} matches recorded digest", artifact_path.display());
    }

    Ok(VerifiedProof {
        proof_path: proof_path.to_path_buf(),
        subject: statement
            .subject
            .first()
            .map(|s| s.name.clone())
            .unwrap_or_default(),
        sha256: record.artifact.sha256.clone(),
        status: record.rekor.status,
        ok: record.rekor.ok,
        key_source: record.key_source,
        artifact_checked: check_artifact,
    })
}

//! # Submission pipeline
//!
//! Locate the newest statement-attestation, wrap it in a signed DSSE
//! in-toto statement, submit it to Rekor and record the proof.
//!
//! Every step depends on the previous one, so the run is strictly
//! sequential. A run ends in one of three ways:
//!
//! - nothing to submit ([`PublishOutcome::NothingToSubmit`]), which is not an
//!   error;
//! - a recorded, accepted submission ([`PublishOutcome::Published`]);
//! - an error. Input, key and signing failures abort before any network
//!   call. Transport failures abort before anything is written. A non-2xx
//!   response is recorded first and then reported as
//!   [`Error::SubmissionRejected`].

use crate::cli::progress;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::in_toto::{LoadedArtifact, build_statement, generate_signed_statement, load_artifact};
use crate::locate;
use crate::proof::ProofRecord;
use crate::signing::{KeyPair, KeySource};
use crate::storage::filesystem::{FilesystemProofStore, StoredProof};
use crate::storage::rekor::RekorEntryRequest;
use crate::storage::traits::TransparencyLog;

use chrono::{DateTime, Utc};
use log::{error, info};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedProof {
    pub artifact_path: PathBuf,
    pub sha256: String,
    pub status: u16,
    pub key_source: KeySource,
    pub stored: StoredProof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    NothingToSubmit { search_root: PathBuf },
    Published(PublishedProof),
}

/// Publish the newest artifact under `config.attestations_path`.
pub fn publish_latest_attestation(
    config: &Config,
    log: &dyn TransparencyLog,
) -> Result<PublishOutcome> {
    let search_root = config.attestations_path.clone();

    match locate::find_latest_attestation(&search_root)? {
        Some(path) => publish_attestation(&path, config, log).map(PublishOutcome::Published),
        None => {
            info!(
                "No statement-attestations found under {}",
                search_root.display()
            );
            Ok(PublishOutcome::NothingToSubmit { search_root })
        }
    }
}

/// Publish a specific artifact file.
pub fn publish_attestation(
    path: &Path,
    config: &Config,
    log: &dyn TransparencyLog,
) -> Result<PublishedProof> {
    info!("Artifact: {}", path.display());
    let artifact = load_artifact(path)?;
    info!("Artifact SHA256: {}", artifact.sha256);

    let keys = KeyPair::resolve(config.supplied_keys.as_ref())?;
    publish_with_keys(&artifact, &keys, config, log, Utc::now)
}

/// Sign, submit and record `artifact` with an already resolved keypair.
///
/// `clock` supplies the submission timestamp, taken once the log has
/// answered.
pub fn publish_with_keys<F>(
    artifact: &LoadedArtifact,
    keys: &KeyPair,
    config: &Config,
    log: &dyn TransparencyLog,
    clock: F,
) -> Result<PublishedProof>
where
    F: Fn() -> DateTime<Utc>,
{
    let statement = build_statement(artifact);
    let envelope = generate_signed_statement(&statement, keys)?;
    let request = RekorEntryRequest::new(envelope, keys.public_key_spki_der()?, &config.key_details);

    let url = log.entries_url();
    info!("DSSE payload type: {}", request.envelope().payload_type());
    info!("Predicate type: {}", statement.predicate_type);
    info!("Submitting to {url}");

    let spinner = config
        .show_progress
        .then(|| progress::create_spinner("Submitting to Rekor..."));
    let response = log.submit_entry(&request);
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let response = response?;

    let submitted_at = clock();
    let status = response.status;
    let ok = response.ok;

    let record = ProofRecord::new(
        submitted_at,
        keys.source(),
        url.clone(),
        artifact,
        &statement.predicate_type,
        request,
        response,
    );

    let store = FilesystemProofStore::new(&config.proofs_path);
    let stored = store.store_proof(&record, &artifact.path, submitted_at)?;

    if !ok {
        error!(
            "Rekor submit failed ({status}); response saved to {}",
            stored.partition_path.display()
        );
        return Err(Error::SubmissionRejected {
            url,
            status,
            proof_path: stored.partition_path,
        });
    }

    info!("Rekor DSSE submit succeeded ({status})");
    Ok(PublishedProof {
        artifact_path: artifact.path.clone(),
        sha256: artifact.sha256.clone(),
        status,
        key_source: keys.source(),
        stored,
    })
}

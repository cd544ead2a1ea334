use crate::error::{Error, Result};
use crate::hash::calculate_hash;
use crate::in_toto::{FCP_PREDICATE_TYPE, Statement, load_artifact};
use crate::proof::ProofRecord;
use crate::proof::verify::verify_proof_file;
use crate::publish::{PublishOutcome, publish_latest_attestation, publish_with_keys};
use crate::signing::test_utils::generate_pem_pair;
use crate::signing::{KeyPair, KeySource};
use crate::tests::common::{
    MockTransparencyLog, VALID_ATTESTATION, files_under, test_config, write_artifact,
};

use chrono::{TimeZone, Utc};
use openssl::pkey::PKey;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_empty_attestation_tree_is_a_no_op() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    fs::create_dir_all(&config.attestations_path)?;
    let log = MockTransparencyLog::responding(201, "{}");

    let outcome = publish_latest_attestation(&config, &log)?;

    assert_eq!(
        outcome,
        PublishOutcome::NothingToSubmit {
            search_root: config.attestations_path.clone()
        }
    );
    assert!(log.requests().is_empty());
    assert!(files_under(&config.proofs_path).is_empty());
    Ok(())
}

#[test]
fn test_missing_attestation_root_is_a_no_op() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    let log = MockTransparencyLog::responding(201, "{}");

    let outcome = publish_latest_attestation(&config, &log)?;

    assert!(matches!(outcome, PublishOutcome::NothingToSubmit { .. }));
    assert!(!config.proofs_path.exists());
    Ok(())
}

#[test]
fn test_malformed_artifact_aborts_before_network() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "2025/01/01/20250101T000000Z.json", "{}");
    let log = MockTransparencyLog::responding(201, "{}");

    let result = publish_latest_attestation(&config, &log);

    assert!(matches!(result, Err(Error::ArtifactMalformed { .. })));
    assert!(log.requests().is_empty());
    assert!(files_under(&config.proofs_path).is_empty());
    Ok(())
}

#[test]
fn test_empty_artifact_aborts_before_network() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "20250101T000000Z.json", "  \n");
    let log = MockTransparencyLog::responding(201, "{}");

    let result = publish_latest_attestation(&config, &log);

    assert!(matches!(result, Err(Error::ArtifactEmpty { .. })));
    assert!(log.requests().is_empty());
    Ok(())
}

#[test]
fn test_bad_supplied_key_aborts_before_network() -> Result<()> {
    let dir = tempdir()?;
    let mut config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "20250101T000000Z.json", VALID_ATTESTATION);
    let first = generate_pem_pair()?;
    let second = generate_pem_pair()?;
    config.supplied_keys = Some(crate::signing::SuppliedKeys {
        private_pem: first.private_pem,
        public_pem: second.public_pem,
    });
    let log = MockTransparencyLog::responding(201, "{}");

    let result = publish_latest_attestation(&config, &log);

    assert!(matches!(result, Err(Error::KeyImport(_))));
    assert!(log.requests().is_empty());
    Ok(())
}

#[test]
fn test_newest_artifact_is_published() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    let root = &config.attestations_path;
    write_artifact(root, "2025/01/31/20250131T235959Z.json", VALID_ATTESTATION);
    let newest = write_artifact(root, "2025/02/01/20250201T000001Z.json", VALID_ATTESTATION);
    write_artifact(root, "2025/02/01/20250201T000000Z.json", VALID_ATTESTATION);
    let log = MockTransparencyLog::responding(201, r#"{"logIndex":"42"}"#);

    let outcome = publish_latest_attestation(&config, &log)?;

    let proof = match outcome {
        PublishOutcome::Published(proof) => proof,
        other => panic!("Unexpected outcome: {other:?}"),
    };
    assert_eq!(proof.artifact_path, newest);
    assert_eq!(
        proof.stored.partition_path.file_name().unwrap(),
        "20250201T000001Z.rekor-v2.json"
    );

    let requests = log.requests();
    assert_eq!(requests.len(), 1);
    let statement: Statement = serde_json::from_slice(requests[0].envelope().payload())?;
    assert_eq!(statement.subject[0].name, "20250201T000001Z.json");
    assert_eq!(statement.predicate_type, FCP_PREDICATE_TYPE);
    assert_eq!(
        statement.predicate.source.path,
        newest.to_string_lossy().as_ref()
    );
    Ok(())
}

#[test]
fn test_proof_digest_matches_artifact_bytes() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    let content = format!("{VALID_ATTESTATION}\n");
    write_artifact(&config.attestations_path, "20250301T101010Z.json", &content);
    let log = MockTransparencyLog::responding(201, "{}");

    let PublishOutcome::Published(proof) = publish_latest_attestation(&config, &log)? else {
        panic!("expected a published proof");
    };

    let record: ProofRecord =
        serde_json::from_str(&fs::read_to_string(&proof.stored.partition_path)?)?;
    assert_eq!(record.artifact.sha256, calculate_hash(content.as_bytes()));
    assert_eq!(record.artifact.size_bytes, content.len() as u64);
    assert_eq!(record.rekor.url, "mock://rekor/api/v2/log/entries");

    let statement: Statement = serde_json::from_slice(record.request.envelope().payload())?;
    assert_eq!(statement.subject_digest("sha256"), Some(record.artifact.sha256.as_str()));
    Ok(())
}

#[test]
fn test_rejected_submission_is_recorded_then_reported() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "20250101T000000Z.json", VALID_ATTESTATION);
    let log = MockTransparencyLog::responding(500, "upstream exploded");

    let result = publish_latest_attestation(&config, &log);

    let proof_path = match result {
        Err(Error::SubmissionRejected {
            status, proof_path, ..
        }) => {
            assert_eq!(status, 500);
            proof_path
        }
        other => panic!("Unexpected result: {other:?}"),
    };

    let record: ProofRecord = serde_json::from_str(&fs::read_to_string(&proof_path)?)?;
    assert!(!record.rekor.ok);
    assert_eq!(record.rekor.status, 500);
    assert_eq!(record.response, serde_json::json!({ "raw": "upstream exploded" }));

    let latest = fs::read_to_string(config.proofs_path.join("latest.json"))?;
    assert_eq!(latest, fs::read_to_string(&proof_path)?);
    Ok(())
}

#[test]
fn test_transport_failure_writes_no_proof() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "20250101T000000Z.json", VALID_ATTESTATION);
    let log = MockTransparencyLog::timing_out();

    let result = publish_latest_attestation(&config, &log);

    assert!(matches!(result, Err(Error::SubmissionTimeout { .. })));
    assert_eq!(log.requests().len(), 1);
    assert!(files_under(&config.proofs_path).is_empty());
    Ok(())
}

#[test]
fn test_supplied_key_is_recorded_and_sent_as_verifier() -> Result<()> {
    let dir = tempdir()?;
    let mut config = test_config(dir.path(), "http://unused");
    write_artifact(&config.attestations_path, "20250101T000000Z.json", VALID_ATTESTATION);
    let keys = generate_pem_pair()?;
    let expected_der = PKey::public_key_from_pem(keys.public_pem.as_bytes())
        .map_err(|e| Error::KeyImport(e.to_string()))?
        .public_key_to_der()
        .map_err(|e| Error::KeyImport(e.to_string()))?;
    config.supplied_keys = Some(keys);
    let log = MockTransparencyLog::responding(201, "{}");

    let PublishOutcome::Published(proof) = publish_latest_attestation(&config, &log)? else {
        panic!("expected a published proof");
    };
    assert_eq!(proof.key_source, KeySource::Supplied);

    let request = &log.requests()[0];
    assert_eq!(request.verifiers()[0].public_key.raw_bytes, expected_der);
    assert_eq!(request.verifiers()[0].key_details, "PKIX_ECDSA_P256_SHA_256");

    let verified = verify_proof_file(&proof.stored.latest_path, true)?;
    assert_eq!(verified.key_source, KeySource::Supplied);
    Ok(())
}

#[test]
fn test_proof_is_partitioned_by_submission_date() -> Result<()> {
    let dir = tempdir()?;
    let config = test_config(dir.path(), "http://unused");
    let path = write_artifact(&config.attestations_path, "20251231T235900Z.json", VALID_ATTESTATION);
    let artifact = load_artifact(&path)?;
    let keys = KeyPair::generate()?;
    let log = MockTransparencyLog::responding(201, "{}");
    let at = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 30).unwrap();

    let proof = publish_with_keys(&artifact, &keys, &config, &log, || at)?;

    assert_eq!(
        proof.stored.partition_path,
        config
            .proofs_path
            .join("2026/01/01/20251231T235900Z.rekor-v2.json")
    );
    let record: ProofRecord =
        serde_json::from_str(&fs::read_to_string(&proof.stored.partition_path)?)?;
    assert_eq!(record.submitted_at, "2026-01-01T00:00:30.000Z");
    assert_eq!(record.key_source, KeySource::Ephemeral);
    assert_eq!(proof.stored.latest_path, config.proofs_path.join("latest.json"));
    Ok(())
}

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Initialization error: {0}")]
    InitializationError(String),

    #[error("Attestation artifact is empty: {}", path.display())]
    ArtifactEmpty { path: PathBuf },

    #[error("Attestation artifact is malformed: {}: {reason}", path.display())]
    ArtifactMalformed { path: PathBuf, reason: String },

    #[error("Key import error: {0}")]
    KeyImport(String),

    #[error("Signing error: {0}")]
    Signing(String),

    #[error("Rekor request to {url} timed out after {timeout_ms} ms")]
    SubmissionTimeout { url: String, timeout_ms: u64 },

    #[error("Rekor request to {url} failed: {reason}")]
    SubmissionNetwork { url: String, reason: String },

    #[error("Rekor rejected submission to {url} with status {status} (response saved to {})", proof_path.display())]
    SubmissionRejected {
        url: String,
        status: u16,
        proof_path: PathBuf,
    },

    #[error("Verification failed: {0}")]
    Verification(String),
}

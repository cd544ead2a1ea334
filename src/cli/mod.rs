pub mod commands;
pub mod handlers;
use crate::error::Error;

// Re-export commonly used items
pub use commands::{LatestArgs, SubmitArgs, VerifyArgs};
pub use handlers::{handle_latest_command, handle_submit_command, handle_verify_command};

pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");
pub const CLI_NAME: &str = "fcp-rekor";

pub fn format_error(error: &Error) -> String {
    match error {
        Error::Io(err) => format!("IO error: {err}"),
        Error::Json(err) => format!("JSON error: {err}"),
        Error::Serialization(msg) => format!("Serialization error: {msg}"),
        Error::Config(msg) => format!("Configuration error: {msg}"),
        Error::Storage(msg) => format!("Storage error: {msg}"),
        Error::Validation(msg) => format!("Validation error: {msg}"),
        Error::InitializationError(msg) => format!("Initialization error: {msg}"),
        Error::ArtifactEmpty { path } => {
            format!("Latest attestation file is empty: {}", path.display())
        }
        Error::ArtifactMalformed { path, reason } => {
            format!("Attestation file {} is malformed: {reason}", path.display())
        }
        Error::KeyImport(msg) => format!("Key import error: {msg}"),
        Error::Signing(msg) => format!("Signing error: {msg}"),
        Error::SubmissionTimeout { url, timeout_ms } => {
            format!("Rekor submit error: request to {url} timed out after {timeout_ms} ms")
        }
        Error::SubmissionNetwork { url, reason } => {
            format!("Rekor submit error: request to {url} failed: {reason}")
        }
        Error::SubmissionRejected {
            url,
            status,
            proof_path,
        } => format!(
            "Rekor submit failed ({status}) at {url}\n   Saved response: {}",
            proof_path.display()
        ),
        Error::Verification(msg) => format!("Verification error: {msg}"),
    }
}

// Shared functionality for progress indication
pub mod progress {
    use indicatif::{ProgressBar, ProgressStyle};
    use std::time::Duration;

    pub fn create_spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner} [{elapsed_precise}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }
}

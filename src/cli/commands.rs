use crate::config::ConfigOverrides;
use clap::Args;
use std::path::PathBuf;

/// Options shared by every command that reads configuration
#[derive(Debug, Clone, Args)]
pub struct ConfigArgs {
    /// Root directory searched for statement-attestations
    #[arg(long = "attestations-path")]
    pub attestations_path: Option<PathBuf>,

    /// Root directory of the date-partitioned proof store
    #[arg(long = "proofs-path")]
    pub proofs_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct SubmitArgs {
    #[command(flatten)]
    pub paths: ConfigArgs,

    /// Publish this artifact instead of the newest one
    #[arg(long = "artifact")]
    pub artifact: Option<PathBuf>,

    /// Rekor base URL (the entries path is appended)
    #[arg(long = "rekor-url")]
    pub rekor_url: Option<String>,

    /// Request timeout in milliseconds
    #[arg(long = "timeout-ms")]
    pub timeout_ms: Option<u64>,

    /// Verifier key details sent to Rekor
    #[arg(long = "key-details")]
    pub key_details: Option<String>,

    /// Do not show a spinner while waiting on Rekor
    #[arg(long = "no-progress", default_value = "false")]
    pub no_progress: bool,
}

#[derive(Debug, Clone, Args)]
pub struct LatestArgs {
    #[command(flatten)]
    pub paths: ConfigArgs,
}

#[derive(Debug, Clone, Args)]
pub struct VerifyArgs {
    #[command(flatten)]
    pub paths: ConfigArgs,

    /// Proof file to verify (default: <proofs-path>/latest.json)
    #[arg(long = "proof")]
    pub proof: Option<PathBuf>,

    /// Also re-hash the artifact recorded in the proof
    #[arg(long = "check-artifact", default_value = "false")]
    pub check_artifact: bool,
}

impl ConfigArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            attestations_path: self.attestations_path.clone(),
            proofs_path: self.proofs_path.clone(),
            ..Default::default()
        }
    }
}

impl SubmitArgs {
    pub fn to_overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            rekor_base_url: self.rekor_url.clone(),
            timeout_ms: self.timeout_ms,
            key_details: self.key_details.clone(),
            show_progress: self.no_progress.then_some(false),
            ..self.paths.to_overrides()
        }
    }
}

use crate::error::{Error, Result};
use crate::proof::ProofRecord;
use crate::utils::safe_create_file;

use chrono::{DateTime, Datelike, Utc};
use log::debug;
use std::fs::create_dir_all;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Suffix of partitioned proof files.
pub const PROOF_SUFFIX: &str = ".rekor-v2.json";

/// Name of the "latest" pointer file at the proof root.
pub const LATEST_FILE: &str = "latest.json";

/// Where a proof ended up on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredProof {
    pub partition_path: PathBuf,
    pub latest_path: PathBuf,
}

/// Date-partitioned proof storage.
///
/// ```text
/// <root>/YYYY/MM/DD/<artifact stem>.rekor-v2.json
/// <root>/latest.json
/// ```
///
/// The partitioned file is the authoritative record; `latest.json` is
/// last-writer-wins and may lag if a run dies between the two writes.
#[derive(Debug, Clone)]
pub struct FilesystemProofStore {
    base_path: PathBuf,
}

impl FilesystemProofStore {
    pub fn new<P: AsRef<Path>>(url: P) -> Self {
        let path_str = url.as_ref().to_string_lossy();
        let path = match path_str.strip_prefix("file://") {
            Some(stripped) => PathBuf::from(stripped),
            None => url.as_ref().to_path_buf(),
        };

        Self { base_path: path }
    }

    /// `<root>/YYYY/MM/DD` for the UTC date of `at`.
    pub fn partition_dir(&self, at: DateTime<Utc>) -> PathBuf {
        self.base_path
            .join(format!("{:04}", at.year()))
            .join(format!("{:02}", at.month()))
            .join(format!("{:02}", at.day()))
    }

    pub fn latest_path(&self) -> PathBuf {
        self.base_path.join(LATEST_FILE)
    }

    /// Partitioned file path for an artifact submitted at `at`.
    pub fn proof_path(&self, artifact_path: &Path, at: DateTime<Utc>) -> PathBuf {
        let stem = artifact_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attestation".to_string());

        self.partition_dir(at).join(format!("{stem}{PROOF_SUFFIX}"))
    }

    /// Write `record` to its partition and mirror it to `latest.json`.
    pub fn store_proof(
        &self,
        record: &ProofRecord,
        artifact_path: &Path,
        at: DateTime<Utc>,
    ) -> Result<StoredProof> {
        let partition_path = self.proof_path(artifact_path, at);
        if let Some(dir) = partition_path.parent() {
            create_dir_all(dir)?;
        }

        let mut json = serde_json::to_string_pretty(record)
            .map_err(|e| Error::Serialization(e.to_string()))?;
        json.push('\n');

        write_all(&partition_path, json.as_bytes())?;
        debug!("Wrote proof {}", partition_path.display());

        let latest_path = self.latest_path();
        write_all(&latest_path, json.as_bytes())?;
        debug!("Updated {}", latest_path.display());

        Ok(StoredProof {
            partition_path,
            latest_path,
        })
    }
}

fn write_all(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = safe_create_file(path, false)?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(())
}

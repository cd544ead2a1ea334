//! # Artifact Locator
//!
//! Finds the most recent statement-attestation under a search root.
//!
//! Attestation file names embed a sortable UTC timestamp, so the newest
//! artifact is the lexicographically greatest path. Selection is split into a
//! filesystem walk ([`list_artifacts`]) and a pure choice over the resulting
//! listing ([`select_latest`]) so the ordering policy can be tested without
//! touching disk.

use crate::error::{Error, Result};
use log::debug;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File extension recognised as an attestation artifact.
pub const ARTIFACT_EXTENSION: &str = "json";

/// A file seen during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactEntry {
    pub path: PathBuf,
    pub name: String,
}

impl ArtifactEntry {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }

    fn is_artifact(&self) -> bool {
        Path::new(&self.name)
            .extension()
            .is_some_and(|ext| ext == ARTIFACT_EXTENSION)
    }
}

/// Pick the newest artifact from a listing.
///
/// Entries without the artifact extension are ignored. The result does not
/// depend on the order of `entries`.
///
/// # Examples
///
/// ```
/// use fcp_rekor::locate::{select_latest, ArtifactEntry};
/// use std::path::PathBuf;
///
/// let listing = vec![
///     ArtifactEntry::new(PathBuf::from("a/2025/01/02/20250102T000000Z.json")),
///     ArtifactEntry::new(PathBuf::from("a/2025/01/01/20250101T000000Z.json")),
///     ArtifactEntry::new(PathBuf::from("a/2025/01/03/notes.txt")),
/// ];
///
/// assert_eq!(
///     select_latest(&listing),
///     Some(PathBuf::from("a/2025/01/02/20250102T000000Z.json"))
/// );
/// ```
pub fn select_latest(entries: &[ArtifactEntry]) -> Option<PathBuf> {
    let mut candidates: Vec<&PathBuf> = entries
        .iter()
        .filter(|e| e.is_artifact())
        .map(|e| &e.path)
        .collect();

    candidates.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
    candidates.last().map(|p| (*p).clone())
}

/// Recursively list every regular file under `root`.
///
/// A missing `root` yields an empty listing; any other filesystem error is
/// returned.
pub fn list_artifacts(root: &Path) -> Result<Vec<ArtifactEntry>> {
    let mut entries = Vec::new();

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() == 0 && root_missing(&e) => {
                debug!("Attestation root {} does not exist", root.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                return Err(match e.into_io_error() {
                    Some(io) => Error::Io(io),
                    None => Error::Storage(format!(
                        "Failed to walk attestation directory at {}",
                        path.display()
                    )),
                });
            }
        };

        if entry.file_type().is_file() {
            entries.push(ArtifactEntry::new(entry.into_path()));
        }
    }

    Ok(entries)
}

fn root_missing(e: &walkdir::Error) -> bool {
    e.io_error()
        .is_some_and(|io| io.kind() == ErrorKind::NotFound)
}

/// Find the newest attestation artifact under `root`, if any.
pub fn find_latest_attestation(root: &Path) -> Result<Option<PathBuf>> {
    let entries = list_artifacts(root)?;
    debug!(
        "Found {} file(s) under {}",
        entries.len(),
        root.display()
    );
    Ok(select_latest(&entries))
}

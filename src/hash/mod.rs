//! # Hash Module
//!
//! SHA-256 content digests for attestation artifacts.
//!
//! Digests are always computed over the raw bytes as read from disk, never
//! over a parsed or re-serialized form, so the value recorded in a proof can
//! be reproduced with `sha256sum` on the artifact file.
//!
//! ## Examples
//!
//! ```
//! use fcp_rekor::hash::{calculate_hash, digests_match};
//!
//! let data = b"{\"m\":\"ed25519\"}";
//! let hash = calculate_hash(data);
//! assert_eq!(hash.len(), 64);
//! assert!(digests_match(&hash, &calculate_hash(data)));
//! ```

use crate::error::Result;
use crate::utils::safe_open_file;
use sha2::{Digest, Sha256};
use std::io::Read;
use std::path::Path;
use subtle::ConstantTimeEq;

/// Digest algorithm name used as the key in in-toto digest sets.
pub const SHA256: &str = "sha256";

/// Calculate the SHA-256 hash of the given data as lowercase hex
///
/// # Examples
///
/// ```
/// use fcp_rekor::hash::calculate_hash;
///
/// let hash = calculate_hash(b"");
/// assert_eq!(
///     hash,
///     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
/// );
/// ```
pub fn calculate_hash(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Calculate the SHA-256 hash of a file, streaming its contents
pub fn calculate_file_hash(path: impl AsRef<Path>) -> Result<String> {
    let file = safe_open_file(path.as_ref(), false)?;
    hash_reader(file)
}

/// Compare two hex digests in constant time (case-insensitive)
pub fn digests_match(left: &str, right: &str) -> bool {
    match (hex::decode(left), hex::decode(right)) {
        (Ok(l), Ok(r)) if l.len() == r.len() => l.ct_eq(&r).into(),
        _ => false,
    }
}

fn hash_reader<R: Read>(mut reader: R) -> Result<String> {
    let mut hasher = Sha256::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

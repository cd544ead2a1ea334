//! # fcp-rekor
//!
//! Publish FCP statement-attestations to a Rekor v2 transparency log.
//!
//! The newest attestation artifact is wrapped in an in-toto v1 Statement,
//! signed as a DSSE envelope with an ECDSA P-256 key and posted to
//! `/api/v2/log/entries`. The request and the log's response are kept as a
//! date-partitioned proof record.
//!
//! ## Quick Start
//!
//! ```bash
//! # submit the newest .fide/statement-attestations/**/*.json
//! fcp-rekor submit
//!
//! # check the last recorded proof
//! fcp-rekor verify --check-artifact
//! ```
//!
//! Configuration is read from `.env` files and the environment
//! (`REKOR_BASE_URL`, `REKOR_TIMEOUT_MS`, `FCP_STATEMENT_ATTESTATIONS_PATH`,
//! ...), see [`config`].

pub mod cli;
pub mod config;
pub mod error;
pub mod hash;
pub mod in_toto;
pub mod locate;
pub mod proof;
pub mod publish;
pub mod signing;
pub mod storage;
#[cfg(test)]
mod tests;
pub mod utils;

// Re-export error and configuration types
pub use config::Config;
pub use error::{Error, Result};

/// Initialize logging for the CLI
///
/// Honors `RUST_LOG`; defaults to `info`.
///
/// # Examples
///
/// ```
/// use fcp_rekor::init_logging;
///
/// let result = init_logging();
/// // Note: This might fail if already initialized
/// assert!(result.is_ok() || result.is_err());
/// ```
pub fn init_logging() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init()
        .map_err(|e| Error::InitializationError(e.to_string()))
}

// Re-export commonly used types and traits
pub use storage::traits::TransparencyLog;

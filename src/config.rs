//! Configuration resolved once at process entry.
//!
//! Values come from, lowest precedence first: built-in defaults, the shared
//! `.env` at the repository root, the process environment, a package-local
//! `.env` in the working directory, and finally explicit CLI overrides.
//! `.env` files are read into a map; the process environment is never
//! modified.

use crate::error::{Error, Result};
use crate::signing::SuppliedKeys;
use crate::storage::rekor::{DEFAULT_KEY_DETAILS, DEFAULT_REKOR_URL, DEFAULT_TIMEOUT_MS};

use log::{debug, warn};
use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use zeroize::Zeroizing;

pub const ENV_ATTESTATIONS_PATH: &str = "FCP_STATEMENT_ATTESTATIONS_PATH";
pub const ENV_ATTESTATIONS_PATH_FALLBACK: &str = "FCP_ATTESTATIONS_PATH";
pub const ENV_PROOFS_PATH: &str = "FCP_REKOR_PROOFS_PATH";
pub const ENV_REKOR_BASE_URL: &str = "REKOR_BASE_URL";
pub const ENV_REKOR_TIMEOUT_MS: &str = "REKOR_TIMEOUT_MS";
pub const ENV_REKOR_KEY_DETAILS: &str = "REKOR_KEY_DETAILS";
pub const ENV_PRIVATE_KEY_PEM: &str = "REKOR_ECDSA_PRIVATE_KEY_PEM";
pub const ENV_PUBLIC_KEY_PEM: &str = "REKOR_ECDSA_PUBLIC_KEY_PEM";

pub const DEFAULT_ATTESTATIONS_PATH: &str = ".fide/statement-attestations";
pub const DEFAULT_PROOFS_PATH: &str = ".fide/rekor-proofs";

/// How far up the repository root is searched for.
const MAX_ROOT_DEPTH: usize = 12;

/// Resolved settings for one submission run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root searched for statement-attestation artifacts
    pub attestations_path: PathBuf,
    /// Root of the date-partitioned proof store
    pub proofs_path: PathBuf,
    /// Rekor base URL without trailing slash
    pub rekor_base_url: String,
    pub timeout: Duration,
    /// Verifier key details sent alongside the public key
    pub key_details: String,
    pub supplied_keys: Option<SuppliedKeys>,
    /// Whether to show a spinner while waiting on Rekor
    pub show_progress: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            attestations_path: PathBuf::from(DEFAULT_ATTESTATIONS_PATH),
            proofs_path: PathBuf::from(DEFAULT_PROOFS_PATH),
            rekor_base_url: DEFAULT_REKOR_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            key_details: DEFAULT_KEY_DETAILS.to_string(),
            supplied_keys: None,
            show_progress: true,
        }
    }
}

/// Explicit overrides, typically from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub attestations_path: Option<PathBuf>,
    pub proofs_path: Option<PathBuf>,
    pub rekor_base_url: Option<String>,
    pub timeout_ms: Option<u64>,
    pub key_details: Option<String>,
    pub show_progress: Option<bool>,
}

impl Config {
    /// Resolve the configuration for a run started in `cwd`.
    pub fn resolve(cwd: &Path, overrides: &ConfigOverrides) -> Result<Self> {
        let env = load_env_layers(cwd, utf8_vars(std::env::vars_os()))?;
        let mut config = Self::from_env_map(&env)?;
        config.apply_overrides(overrides)?;
        Ok(config)
    }

    /// Build a configuration from an already layered variable map.
    ///
    /// Empty values count as unset.
    pub fn from_env_map(env: &HashMap<String, String>) -> Result<Self> {
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut config = Config::default();

        if let Some(path) =
            get(ENV_ATTESTATIONS_PATH).or_else(|| get(ENV_ATTESTATIONS_PATH_FALLBACK))
        {
            config.attestations_path = PathBuf::from(path);
        }
        if let Some(path) = get(ENV_PROOFS_PATH) {
            config.proofs_path = PathBuf::from(path);
        }
        if let Some(url) = get(ENV_REKOR_BASE_URL) {
            config.rekor_base_url = url;
        }
        if let Some(ms) = get(ENV_REKOR_TIMEOUT_MS) {
            let ms = ms.parse::<u64>().map_err(|e| {
                Error::Config(format!(
                    "{ENV_REKOR_TIMEOUT_MS} must be a whole number of milliseconds, got {ms:?}: {e}"
                ))
            })?;
            config.timeout = Duration::from_millis(ms);
        }
        if let Some(details) = get(ENV_REKOR_KEY_DETAILS) {
            config.key_details = details;
        }

        // Raw values: PEM bodies keep their internal newlines
        let private_pem = env.get(ENV_PRIVATE_KEY_PEM).filter(|v| !v.trim().is_empty());
        let public_pem = env.get(ENV_PUBLIC_KEY_PEM).filter(|v| !v.trim().is_empty());
        config.supplied_keys = match (private_pem, public_pem) {
            (Some(private_pem), Some(public_pem)) => Some(SuppliedKeys {
                private_pem: Zeroizing::new(unescape_pem(private_pem)),
                public_pem: unescape_pem(public_pem),
            }),
            (None, None) => None,
            _ => {
                warn!(
                    "Only one of {ENV_PRIVATE_KEY_PEM} / {ENV_PUBLIC_KEY_PEM} is set; using an ephemeral key"
                );
                None
            }
        };

        config.normalize()?;
        Ok(config)
    }

    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) -> Result<()> {
        if let Some(path) = &overrides.attestations_path {
            self.attestations_path = path.clone();
        }
        if let Some(path) = &overrides.proofs_path {
            self.proofs_path = path.clone();
        }
        if let Some(url) = &overrides.rekor_base_url {
            self.rekor_base_url = url.clone();
        }
        if let Some(ms) = overrides.timeout_ms {
            self.timeout = Duration::from_millis(ms);
        }
        if let Some(details) = &overrides.key_details {
            self.key_details = details.clone();
        }
        if let Some(show) = overrides.show_progress {
            self.show_progress = show;
        }

        self.normalize()
    }

    fn normalize(&mut self) -> Result<()> {
        self.rekor_base_url = self.rekor_base_url.trim_end_matches('/').to_string();
        self.validate()
    }

    pub fn validate(&self) -> Result<()> {
        let url = &self.rekor_base_url;
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "Rekor base URL must be http(s), got {:?}",
                self.rekor_base_url
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::Config("Rekor timeout must be greater than zero".to_string()));
        }
        if self.key_details.trim().is_empty() {
            return Err(Error::Config("Rekor key details must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

/// Single-line PEM values in `.env` files often carry literal `\n`.
fn unescape_pem(value: &str) -> String {
    if value.contains("-----BEGIN") && !value.contains('\n') {
        value.replace("\\n", "\n")
    } else {
        value.to_string()
    }
}

/// Nearest ancestor of `start` holding a `.git` entry, or `start` itself.
pub fn find_repo_root(start: &Path) -> PathBuf {
    start
        .ancestors()
        .take(MAX_ROOT_DEPTH)
        .find(|dir| dir.join(".git").exists())
        .unwrap_or(start)
        .to_path_buf()
}

fn read_env_file(path: &Path, into: &mut HashMap<String, String>) -> Result<()> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(()),
        Err(e) => {
            return Err(Error::Config(format!(
                "Failed to read {}: {e}",
                path.display()
            )));
        }
    };

    for item in iter {
        let (key, value) = item
            .map_err(|e| Error::Config(format!("Failed to parse {}: {e}", path.display())))?;
        into.insert(key, value);
    }

    debug!("Loaded environment from {}", path.display());
    Ok(())
}

/// Layer shared `.env`, `process` variables and local `.env` into one map.
/// Keep only variables whose name and value are both valid UTF-8.
pub fn utf8_vars<I>(vars: I) -> Vec<(String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| {
            let name = key.to_string_lossy().into_owned();
            match (key.into_string(), value.into_string()) {
                (Ok(key), Ok(value)) => Some((key, value)),
                _ => {
                    debug!("Skipping environment variable {name}: not valid UTF-8");
                    None
                }
            }
        })
        .collect()
}

pub fn load_env_layers<I>(cwd: &Path, process: I) -> Result<HashMap<String, String>>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut env = HashMap::new();

    let shared = find_repo_root(cwd).join(".env");
    let local = cwd.join(".env");

    if shared != local {
        read_env_file(&shared, &mut env)?;
    }
    env.extend(process);
    read_env_file(&local, &mut env)?;

    Ok(env)
}

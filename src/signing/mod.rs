//! # Key Provider and ECDSA signing
//!
//! Resolves the P-256 keypair used to sign DSSE envelopes, either from PEM
//! material supplied through configuration or by generating an ephemeral key
//! for a single run. Ephemeral keys are never written anywhere; a submission
//! signed with one is verifiable but not attributable.

use crate::error::{Error, Result};
use log::{debug, info};
use openssl::ec::{EcGroup, EcKey};
use openssl::ecdsa::EcdsaSig;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey, PKeyRef, Private, Public};
use openssl::sign::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::{ZeroizeOnDrop, Zeroizing};

pub mod signable;

/// Curve used for every envelope signature.
const CURVE: Nid = Nid::X9_62_PRIME256V1;

/// Secure wrapper for private key data that zeroizes on drop
#[derive(ZeroizeOnDrop)]
pub struct SecurePrivateKey {
    #[zeroize(skip)]
    pkey: PKey<Private>,
    // Original PEM bytes, cleared when the key goes away
    _key_data: Zeroizing<Vec<u8>>,
}

impl SecurePrivateKey {
    /// Create a new SecurePrivateKey from raw PEM data
    pub fn from_pem(pem_data: Vec<u8>) -> Result<Self> {
        let zeroizing_pem = Zeroizing::new(pem_data);

        let pkey = PKey::private_key_from_pem(&zeroizing_pem)
            .map_err(|e| Error::KeyImport(format!("Failed to load private key: {e}")))?;

        Ok(Self {
            pkey,
            _key_data: zeroizing_pem,
        })
    }

    /// Get a reference to the inner PKey
    pub fn as_pkey(&self) -> &PKey<Private> {
        &self.pkey
    }
}

impl fmt::Debug for SecurePrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SecurePrivateKey(<redacted>)")
    }
}

/// PEM key material supplied from configuration.
#[derive(Clone)]
pub struct SuppliedKeys {
    pub private_pem: Zeroizing<String>,
    pub public_pem: String,
}

impl fmt::Debug for SuppliedKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuppliedKeys")
            .field("private_pem", &"<redacted>")
            .field("public_pem", &self.public_pem)
            .finish()
    }
}

/// Where the signing key of a submission came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySource {
    Supplied,
    Ephemeral,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySource::Supplied => write!(f, "env-provided P-256 key"),
            KeySource::Ephemeral => write!(f, "generated ephemeral P-256 key"),
        }
    }
}

/// A resolved signing keypair.
#[derive(Debug)]
pub enum KeyPair {
    Supplied(SecurePrivateKey, PKey<Public>),
    Ephemeral(SecurePrivateKey, PKey<Public>),
}

impl KeyPair {
    /// Resolve the keypair for this run: import `supplied` if present,
    /// otherwise generate a fresh P-256 key.
    pub fn resolve(supplied: Option<&SuppliedKeys>) -> Result<Self> {
        let pair = match supplied {
            Some(keys) => Self::import(keys)?,
            None => Self::generate()?,
        };
        info!("Signing key: {}", pair.source());
        Ok(pair)
    }

    /// Import a PEM keypair, checking both halves are P-256 and belong together.
    pub fn import(keys: &SuppliedKeys) -> Result<Self> {
        let private = SecurePrivateKey::from_pem(keys.private_pem.as_bytes().to_vec())?;
        let public = PKey::public_key_from_pem(keys.public_pem.as_bytes())
            .map_err(|e| Error::KeyImport(format!("Failed to load public key: {e}")))?;

        ensure_p256(private.as_pkey(), "private")?;
        ensure_p256(&public, "public")?;

        if !private.as_pkey().public_eq(&public) {
            return Err(Error::KeyImport(
                "Public key does not match private key".to_string(),
            ));
        }

        Ok(KeyPair::Supplied(private, public))
    }

    /// Generate an ephemeral P-256 keypair.
    pub fn generate() -> Result<Self> {
        let group = EcGroup::from_curve_name(CURVE)
            .map_err(|e| Error::Signing(format!("Failed to load P-256 group: {e}")))?;
        let ec_key = EcKey::generate(&group)
            .map_err(|e| Error::Signing(format!("Failed to generate EC key: {e}")))?;
        let pkey = PKey::from_ec_key(ec_key)
            .map_err(|e| Error::Signing(format!("Failed to wrap EC key: {e}")))?;

        let public_der = pkey
            .public_key_to_der()
            .map_err(|e| Error::Signing(format!("Failed to export public key: {e}")))?;
        let public = PKey::public_key_from_der(&public_der)
            .map_err(|e| Error::Signing(format!("Failed to load public key: {e}")))?;

        debug!("Generated ephemeral P-256 keypair");
        Ok(KeyPair::Ephemeral(pkey_to_secure(pkey)?, public))
    }

    pub fn source(&self) -> KeySource {
        match self {
            KeyPair::Supplied(..) => KeySource::Supplied,
            KeyPair::Ephemeral(..) => KeySource::Ephemeral,
        }
    }

    pub fn private_key(&self) -> &SecurePrivateKey {
        match self {
            KeyPair::Supplied(private, _) | KeyPair::Ephemeral(private, _) => private,
        }
    }

    pub fn public_key(&self) -> &PKey<Public> {
        match self {
            KeyPair::Supplied(_, public) | KeyPair::Ephemeral(_, public) => public,
        }
    }

    /// Public key as DER-encoded SubjectPublicKeyInfo.
    pub fn public_key_spki_der(&self) -> Result<Vec<u8>> {
        self.public_key()
            .public_key_to_der()
            .map_err(|e| Error::Signing(format!("Failed to export public key: {e}")))
    }
}

fn ensure_p256<T>(pkey: &PKeyRef<T>, which: &str) -> Result<()>
where
    T: openssl::pkey::HasPublic,
{
    if pkey.id() != Id::EC {
        return Err(Error::KeyImport(format!(
            "Expected an EC {which} key, got key type {}",
            pkey.id().as_raw()
        )));
    }

    let curve = pkey
        .ec_key()
        .map_err(|e| Error::KeyImport(e.to_string()))?
        .group()
        .curve_name();

    if curve != Some(CURVE) {
        return Err(Error::KeyImport(format!(
            "Expected a P-256 {which} key, got curve {:?}",
            curve.map(|nid| nid.as_raw())
        )));
    }

    Ok(())
}

/// Sign data with ECDSA over SHA-256, returning a DER-encoded signature
pub fn sign_data(data: &[u8], private_key: &SecurePrivateKey) -> Result<Vec<u8>> {
    let mut signer = Signer::new(MessageDigest::sha256(), private_key.as_pkey())
        .map_err(|e| Error::Signing(format!("Failed to create signer: {e}")))?;

    signer
        .update(data)
        .map_err(|e| Error::Signing(format!("Failed to update signer: {e}")))?;

    let signature = signer
        .sign_to_vec()
        .map_err(|e| Error::Signing(format!("Failed to sign data: {e}")))?;

    if signature.is_empty() {
        return Err(Error::Signing("Signer produced an empty signature".to_string()));
    }

    Ok(signature)
}

/// Verify an ECDSA/SHA-256 signature with a P-256 public key
///
/// A signature that is not a canonical DER `ECDSA-Sig-Value` verifies as
/// `false`. Any other OpenSSL failure is returned as an error.
pub fn verify_signature(data: &[u8], signature: &[u8], public_key: &PKey<Public>) -> Result<bool> {
    match EcdsaSig::from_der(signature).and_then(|sig| sig.to_der()) {
        Ok(der) if der == signature => {}
        _ => {
            debug!("Signature is not a DER encoded ECDSA signature");
            return Ok(false);
        }
    }

    ensure_p256(public_key, "public")?;

    let mut verifier = Verifier::new(MessageDigest::sha256(), public_key)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .update(data)
        .map_err(|e| Error::Signing(e.to_string()))?;

    verifier
        .verify(signature)
        .map_err(|e| Error::Signing(format!("Signature verification failed: {e}")))
}

/// Load a public key from DER-encoded SubjectPublicKeyInfo
pub fn public_key_from_spki_der(der: &[u8]) -> Result<PKey<Public>> {
    let key = PKey::public_key_from_der(der)
        .map_err(|e| Error::KeyImport(format!("Failed to load public key: {e}")))?;
    ensure_p256(&key, "public")?;
    Ok(key)
}

pub fn pkey_to_secure(pkey: PKey<Private>) -> Result<SecurePrivateKey> {
    // Round-trip through PEM so the key bytes live in a zeroizing buffer
    let pem_data = pkey
        .private_key_to_pem_pkcs8()
        .map_err(|e| Error::Signing(format!("Failed to export key to PEM: {e}")))?;

    SecurePrivateKey::from_pem(pem_data)
}

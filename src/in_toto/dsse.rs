//! Dead Simple Signing Envelope (DSSE) v1.
//!
//! Signatures cover the pre-authentication encoding ([`pae`]) of the payload
//! type and payload bytes, never the raw payload.

use crate::error::{Error, Result};
use crate::signing;
use crate::signing::KeyPair;
use crate::signing::signable::Signable;

use openssl::pkey::{PKey, Public};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Payload type for in-toto statements.
pub const DSSE_PAYLOAD_TYPE: &str = "application/vnd.in-toto+json";

/// Protocol tag that opens every PAE.
pub const PAE_TAG: &str = "DSSEv1";

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    #[serde_as(as = "serde_with::base64::Base64")]
    pub sig: Vec<u8>,
    #[serde(default)]
    pub keyid: String,
}

impl Signature {
    fn new(sig: Vec<u8>, keyid: String) -> Self {
        Self { sig, keyid }
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde_as(as = "serde_with::base64::Base64")]
    payload: Vec<u8>,
    payload_type: String,
    signatures: Vec<Signature>,
}

/// Pre-authentication encoding:
/// `"DSSEv1" SP len(type) SP type SP len(body) SP body`, lengths in decimal
/// ASCII byte counts, no trailing terminator.
///
/// # Examples
///
/// ```
/// use fcp_rekor::in_toto::dsse::pae;
///
/// assert_eq!(pae("text/plain", b"hi"), b"DSSEv1 10 text/plain 2 hi".to_vec());
/// ```
pub fn pae(payload_type: &str, payload: &[u8]) -> Vec<u8> {
    let type_len = payload_type.len().to_string();
    let body_len = payload.len().to_string();

    let mut out = Vec::with_capacity(
        PAE_TAG.len() + type_len.len() + payload_type.len() + body_len.len() + payload.len() + 4,
    );
    out.extend_from_slice(PAE_TAG.as_bytes());
    out.push(b' ');
    out.extend_from_slice(type_len.as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload_type.as_bytes());
    out.push(b' ');
    out.extend_from_slice(body_len.as_bytes());
    out.push(b' ');
    out.extend_from_slice(payload);
    out
}

impl Envelope {
    pub fn new(payload: Vec<u8>, payload_type: String) -> Self {
        Self {
            payload,
            payload_type,
            signatures: vec![],
        }
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn payload_type(&self) -> &str {
        &self.payload_type
    }

    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The exact bytes covered by each signature.
    pub fn pae(&self) -> Vec<u8> {
        pae(&self.payload_type, &self.payload)
    }

    pub fn add_signature(&mut self, sig: Vec<u8>, keyid: String) -> Result<()> {
        if sig.is_empty() {
            return Err(Error::Signing("DSSE signature cannot be empty".to_string()));
        }

        self.signatures.push(Signature::new(sig, keyid));
        Ok(())
    }

    pub fn validate(&self) -> bool {
        // check for required envelope fields
        if self.payload.is_empty() || self.payload_type.is_empty() || self.signatures.is_empty() {
            return false;
        }

        self.signatures.iter().all(|s| !s.sig.is_empty())
    }

    /// Check every signature against `public_key`.
    ///
    /// Returns `false` for an envelope without signatures.
    pub fn verify(&self, public_key: &PKey<Public>) -> Result<bool> {
        if !self.validate() {
            return Ok(false);
        }

        let message = self.pae();
        for signature in &self.signatures {
            if !signing::verify_signature(&message, &signature.sig, public_key)? {
                return Ok(false);
            }
        }

        Ok(true)
    }
}

impl Signable for Envelope {
    fn sign(&mut self, keys: &KeyPair) -> Result<()> {
        let message = self.pae();
        let signature = signing::sign_data(&message, keys.private_key())?;

        // keyid is optional and left empty
        self.add_signature(signature, String::new())
    }
}

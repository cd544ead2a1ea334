//! # Signable Trait
//!
//! Common interface for values that carry their own detached signatures,
//! such as the DSSE [`Envelope`](crate::in_toto::dsse::Envelope).
//!
//! ## Examples
//!
//! ```
//! use fcp_rekor::in_toto::dsse::{Envelope, DSSE_PAYLOAD_TYPE};
//! use fcp_rekor::signing::KeyPair;
//! use fcp_rekor::signing::signable::Signable;
//!
//! let keys = KeyPair::generate().unwrap();
//! let mut envelope = Envelope::new(b"{}".to_vec(), DSSE_PAYLOAD_TYPE.to_string());
//! envelope.sign(&keys).unwrap();
//!
//! assert!(envelope.validate());
//! assert!(envelope.verify(keys.public_key()).unwrap());
//! ```

use crate::error::Result;
use crate::signing::KeyPair;

/// A trait for types that can be cryptographically signed.
///
/// Implementations decide which bytes are covered by the signature and must
/// fail rather than leave a partially signed value behind.
pub trait Signable {
    /// Sign `self` with the private half of `keys` and attach the signature.
    fn sign(&mut self, keys: &KeyPair) -> Result<()>;
}

// Copyright (C) 2020-2026  The Blockhouse Technology Limited (TBTL).
//
// This program is free software: you can redistribute it and/or modify it
// under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or (at your
// option) any later version.
//
// This program is distributed in the hope that it will be useful, but
// WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU Affero General Public
// License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

use std::str::FromStr;

use poerror::Error;
use serde::{Deserialize, Serialize};

use crate::{error::SignatureError, utils::BoxError};

/// Signature algorithms supported at the PocketOne signing boundary.
///
/// # Algorithms
///
/// Only ECDSA algorithms approved for digital-identity use are carried here, plus the
/// [`Test`][SigningAlgorithm::Test] marker for deterministic synthetic signatures.
///
/// Credentials carrying a [`Test`][SigningAlgorithm::Test] signature must be flagged with a
/// warning by every verifier; they are never equivalent to real signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SigningAlgorithm {
    /// ECDSA over P-256 with SHA-256
    Es256,
    /// ECDSA over P-384 with SHA-384
    Es384,
    /// ECDSA over P-521 with SHA-512
    Es512,
    /// Deterministic synthetic signature, for tests only.
    Test,
}

/// Algorithm identifier for **ECDSA using P-256 and SHA-256**, as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const SIGNING_ALG_ES256: &str = "ES256";
/// Algorithm identifier for **ECDSA using P-384 and SHA-384**, as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const SIGNING_ALG_ES384: &str = "ES384";
/// Algorithm identifier for **ECDSA using P-521 and SHA-512**, as specified in [RFC7518].
///
/// [RFC7518]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.1
pub const SIGNING_ALG_ES512: &str = "ES512";
/// Algorithm identifier for the deterministic synthetic test signature.
pub const SIGNING_ALG_TEST: &str = "TEST";

impl FromStr for SigningAlgorithm {
    type Err = Error<SignatureError>;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            SIGNING_ALG_ES256 => Ok(SigningAlgorithm::Es256),
            SIGNING_ALG_ES384 => Ok(SigningAlgorithm::Es384),
            SIGNING_ALG_ES512 => Ok(SigningAlgorithm::Es512),
            SIGNING_ALG_TEST => Ok(SigningAlgorithm::Test),
            _ => Err(Error::root(SignatureError::InvalidSigningAlgorithm(
                value.to_string(),
            ))),
        }
    }
}

impl std::fmt::Display for SigningAlgorithm {
    // This trait requires `fmt` with this exact signature.
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let message = match self {
            Self::Es256 => SIGNING_ALG_ES256,
            Self::Es384 => SIGNING_ALG_ES384,
            Self::Es512 => SIGNING_ALG_ES512,
            Self::Test => SIGNING_ALG_TEST,
        };
        write!(f, "{}", message)
    }
}

impl SigningAlgorithm {
    /// Whether this is the synthetic test algorithm, which verifiers must flag with a warning.
    pub fn is_synthetic(&self) -> bool {
        matches!(self, Self::Test)
    }
}

/// An external signing backend, HSM-backed in production.
///
/// The credential codecs construct the exact bytes to be signed and delegate here; no signature
/// is ever computed inside the core.
///
/// # Failure
///
/// Implementations must fail closed.  An unreachable backend or an unknown key label must be
/// reported through the returned error, never papered over with a default or synthetic signature.
pub trait Signer {
    /// The algorithm this signer uses. Must be a constant function.
    fn algorithm(&self) -> SigningAlgorithm;

    /// The HSM key label this signer signs under.
    fn key_label(&self) -> &str;

    /// Produce a raw signature over `message` as a byte array.
    ///
    /// For the ECDSA algorithms the signature is the fixed-width `r ‖ s` concatenation.
    fn sign(&self, message: &[u8]) -> Result<Vec<u8>, BoxError>;

    /// Return the DER-encoded `SubjectPublicKeyInfo` of the signing key.
    fn public_key_der(&self) -> Result<Vec<u8>, BoxError>;
}

/// An external backend for signature verification.
pub trait SignatureVerifier: Sync {
    /// The algorithm used for the signature verification.
    fn algorithm(&self) -> SigningAlgorithm;

    /// Verifies the signature of the message, against the provided DER-encoded public key.
    ///
    /// # Return
    ///
    /// Method returns `Ok(true)` if the signature is valid for the given message, `Ok(false)` if
    /// it isn't (but there was no issue with the verifier itself), and `Err(_)` when the verifier
    /// itself encounters an error for any other reason.
    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key_der: &[u8],
    ) -> Result<bool, BoxError>;
}

/// [`SignatureVerifier`] for ECDSA over P-256 with SHA-256, backed by OpenSSL.
#[cfg(feature = "openssl")]
pub struct Es256Verifier;

#[cfg(feature = "openssl")]
impl SignatureVerifier for Es256Verifier {
    fn algorithm(&self) -> SigningAlgorithm {
        SigningAlgorithm::Es256
    }

    fn verify(
        &self,
        message: &[u8],
        signature: &[u8],
        public_key_der: &[u8],
    ) -> Result<bool, BoxError> {
        if signature.len() != 64 {
            return Ok(false);
        }

        let pkey = openssl::pkey::PKey::public_key_from_der(public_key_der)?;
        let ec_key = pkey.ec_key()?;

        let r = openssl::bn::BigNum::from_slice(&signature[..32])?;
        let s = openssl::bn::BigNum::from_slice(&signature[32..])?;
        let sig = openssl::ecdsa::EcdsaSig::from_private_components(r, s)?;

        let digest = openssl::sha::sha256(message);

        Ok(sig.verify(&digest, &ec_key)?)
    }
}

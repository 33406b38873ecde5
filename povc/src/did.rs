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

//! The `did:pkt` method: key-derived identifiers and their DID documents.
//!
//! A `did:pkt` identifier is the truncated (20-byte) SHA-256 of the DER-encoded
//! `SubjectPublicKeyInfo` of the subject's key, hex-encoded.  The identifier is therefore bound
//! to the key: given the key, anyone can recompute the DID and detect substitution.
//!
//! Document *construction* is local and infallible; document *resolution* goes through the
//! asynchronous [`DidResolver`] boundary, registry- or ledger-backed in production.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{error::VcError, Result};

/// The `did:pkt` method prefix.
pub const DID_PKT_PREFIX: &str = "did:pkt:";

/// The verification-method type carried in `did:pkt` documents.
pub const VERIFICATION_METHOD_TYPE: &str = "EcdsaSecp256r1VerificationKey2019";

/// The W3C DID context.
pub const CONTEXT_DID: &str = "https://www.w3.org/ns/did/v1";

/// Derive the `did:pkt` identifier bound to a DER-encoded public key.
pub fn did_from_public_key(public_key_der: &[u8]) -> String {
    let digest = openssl::sha::sha256(public_key_der);
    format!("{DID_PKT_PREFIX}{}", hex::encode(&digest[..20]))
}

/// Check that `did` is a well-formed `did:pkt` identifier.
///
/// # Errors
///
/// [`VcError::InvalidDid`] if the prefix or the 40-hex-character identifier is malformed.
pub fn validate_did(did: &str) -> Result<()> {
    let invalid = || poerror::Error::root(VcError::InvalidDid(did.to_owned()));

    let identifier = did.strip_prefix(DID_PKT_PREFIX).ok_or_else(invalid)?;
    if identifier.len() != 40 || !identifier.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    Ok(())
}

/// A verification method of a DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationMethod {
    /// The method identifier, `<did>#key-1`.
    pub id: String,
    /// The method type, [`VERIFICATION_METHOD_TYPE`].
    #[serde(rename = "type")]
    pub method_type: String,
    /// The DID controlling this key.
    pub controller: String,
    /// The DER-encoded `SubjectPublicKeyInfo`, hex-encoded.
    pub public_key_hex: String,
}

/// A `did:pkt` DID document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The JSON-LD context.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The document subject, the DID itself.
    pub id: String,
    /// The verification methods of the subject.
    pub verification_method: Vec<VerificationMethod>,
    /// Verification-method identifiers usable for authentication.
    pub authentication: Vec<String>,
}

impl DidDocument {
    /// Build the DID document bound to a DER-encoded public key.
    pub fn for_public_key(public_key_der: &[u8]) -> Self {
        let did = did_from_public_key(public_key_der);
        let key_id = format!("{did}#key-1");

        Self {
            context: vec![CONTEXT_DID.to_owned()],
            id: did.clone(),
            verification_method: vec![VerificationMethod {
                id: key_id.clone(),
                method_type: VERIFICATION_METHOD_TYPE.to_owned(),
                controller: did,
                public_key_hex: hex::encode(public_key_der),
            }],
            authentication: vec![key_id],
        }
    }

    /// The DER-encoded public key of the document's first verification method.
    ///
    /// # Errors
    ///
    /// [`VcError::Decode`] if the document carries no verification method or the key is not
    /// valid hex.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let method = self.verification_method.first().ok_or_else(|| {
            poerror::Error::root(VcError::Decode(
                "DID document carries no verification method".to_owned(),
            ))
        })?;

        hex::decode(&method.public_key_hex).map_err(|_| {
            poerror::Error::root(VcError::Decode(
                "verification-method key is not valid hex".to_owned(),
            ))
        })
    }
}

/// Resolution of `did:pkt` identifiers to DID documents.
///
/// Implementations look up documents in a trusted registry; the trait is asynchronous because
/// production resolvers go over the network.  Mock implementations backed by a map are
/// sufficient for tests.
///
/// # Security
///
/// The implementation MUST only resolve documents from trusted sources; otherwise holder
/// authentication is meaningless, since any key could be presented as the holder's.
pub trait DidResolver: Sync {
    /// [`poerror::PoError`] type used in this trait.
    type Err: poerror::PoError;

    /// Resolve a DID to its document.
    fn resolve(
        &self,
        did: &str,
    ) -> impl Future<Output = std::result::Result<DidDocument, poerror::Error<Self::Err>>> + Send;
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_did_is_bound_to_the_key() {
        let did = did_from_public_key(b"public-key-der");

        assert!(did.starts_with(DID_PKT_PREFIX));
        assert_matches!(validate_did(&did), Ok(()));
        assert_eq!(did, did_from_public_key(b"public-key-der"));
        assert_ne!(did, did_from_public_key(b"another-key-der"));
    }

    #[test]
    fn test_malformed_dids_rejected() {
        for did in [
            "did:web:example.com",
            "did:pkt:",
            "did:pkt:abc",
            "did:pkt:zzzc17416a4976db1f2b4c1bd8e57cbfc4f62701",
        ] {
            let err = validate_did(did).unwrap_err();
            assert_matches!(err.error, VcError::InvalidDid(_));
        }
    }

    #[test]
    fn test_document_round_trips_the_key() {
        let document = DidDocument::for_public_key(b"public-key-der");

        assert_eq!(document.id, did_from_public_key(b"public-key-der"));
        assert_eq!(document.public_key_der().unwrap(), b"public-key-der");
        assert_eq!(document.authentication, vec![format!("{}#key-1", document.id)]);
    }

    #[test]
    fn test_empty_document_has_no_key() {
        let mut document = DidDocument::for_public_key(b"public-key-der");
        document.verification_method.clear();

        let err = document.public_key_der().unwrap_err();

        assert_matches!(err.error, VcError::Decode(_));
    }
}

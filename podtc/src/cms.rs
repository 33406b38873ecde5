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

//! The CMS-shaped envelope carrying the signed SOD.
//!
//! This is not DER-encoded CMS; the envelope keeps the [RFC 5652] SignedData shape (content-type
//! and digest-algorithm OIDs, encapsulated content, signer info) but serializes as deterministic
//! CBOR like the rest of the credential.  The signature is produced by an external
//! [`Signer`] over the CBOR encoding of the SOD.
//!
//! [RFC 5652]: <https://datatracker.ietf.org/doc/html/rfc5652>

use po_sign_utils::{SignatureVerifier, Signer, SigningAlgorithm};
use poerror::traits::{ForeignBoxed as _, ForeignError as _};
use serde::{Deserialize, Serialize};

use crate::{error::DtcError, models::Sod, Result};

/// The id-signedData content-type OID of [RFC 5652].
pub const OID_SIGNED_DATA: &str = "1.2.840.113549.1.7.2";

/// The id-sha256 digest-algorithm OID.
pub const OID_SHA256: &str = "2.16.840.1.101.3.4.2.1";

/// The signer information of the envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerInfo {
    /// The signature algorithm.
    pub algorithm: SigningAlgorithm,
    /// The raw signature over the CBOR encoding of the SOD, hex-encoded.
    pub signature: String,
    /// The DER-encoded `SubjectPublicKeyInfo` of the signing key, hex-encoded.
    pub public_key: String,
}

/// The envelope: OIDs, the encapsulated SOD and the signer info.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CmsEnvelope {
    /// Must be [`OID_SIGNED_DATA`].
    pub content_type: String,
    /// Must be [`OID_SHA256`].
    pub digest_algorithm: String,
    /// The encapsulated Security Object Document.
    pub content: Sod,
    /// The signer information.
    pub signer_info: SignerInfo,
}

impl CmsEnvelope {
    /// Sign the SOD and wrap it into an envelope.
    ///
    /// # Errors
    ///
    /// [`DtcError::SignerUnavailable`] if the signing backend fails.
    pub fn sign(sod: Sod, signer: &dyn Signer) -> Result<Self> {
        let message = sod.to_cbor()?;

        let signature = signer
            .sign(&message)
            .foreign_boxed_err(|| DtcError::SignerUnavailable)?;
        let public_key_der = signer
            .public_key_der()
            .foreign_boxed_err(|| DtcError::SignerUnavailable)?;

        Ok(Self {
            content_type: OID_SIGNED_DATA.to_owned(),
            digest_algorithm: OID_SHA256.to_owned(),
            content: sod,
            signer_info: SignerInfo {
                algorithm: signer.algorithm(),
                signature: hex::encode(signature),
                public_key: hex::encode(public_key_der),
            },
        })
    }

    /// Verify the envelope signature against its embedded public key.
    ///
    /// # Errors
    ///
    /// [`DtcError::Decode`] if the signature or public key is not valid hex, or the verifier
    /// backend fails.
    pub fn verify_signature(&self, verifier: &dyn SignatureVerifier) -> Result<bool> {
        let message = self.content.to_cbor()?;
        let signature = hex::decode(&self.signer_info.signature)
            .foreign_err(|| DtcError::Decode("signature is not valid hex".to_owned()))?;
        let public_key_der = hex::decode(&self.signer_info.public_key)
            .foreign_err(|| DtcError::Decode("public key is not valid hex".to_owned()))?;

        verifier
            .verify(&message, &signature, &public_key_der)
            .foreign_boxed_err(|| {
                DtcError::Decode("the signature verifier backend failed".to_owned())
            })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use po_sign_utils::test_utils::{TestSigner, TestVerifier, UnavailableSigner};

    use super::*;
    use crate::models::{DataGroup, Sod};

    fn sod() -> Sod {
        let data_groups = [(2u8, DataGroup::binary(b"face-image"))].into();
        Sod::compute(&data_groups).unwrap()
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = TestSigner::new("dtc-issuer");

        let envelope = CmsEnvelope::sign(sod(), &signer).unwrap();

        assert_eq!(envelope.content_type, OID_SIGNED_DATA);
        assert_eq!(envelope.digest_algorithm, OID_SHA256);
        assert_eq!(envelope.signer_info.algorithm, SigningAlgorithm::Test);
        assert!(envelope.verify_signature(&TestVerifier).unwrap());
    }

    #[test]
    fn test_tampered_content_fails_verification() {
        let signer = TestSigner::new("dtc-issuer");

        let mut envelope = CmsEnvelope::sign(sod(), &signer).unwrap();
        envelope
            .content
            .digests
            .insert(3, "ab".repeat(32));

        assert!(!envelope.verify_signature(&TestVerifier).unwrap());
    }

    #[test]
    fn test_unavailable_signer_fails_closed() {
        let err = CmsEnvelope::sign(sod(), &UnavailableSigner).unwrap_err();

        assert_matches!(err.error, DtcError::SignerUnavailable);
    }

    #[test]
    fn test_cbor_round_trip() {
        let signer = TestSigner::new("dtc-issuer");
        let envelope = CmsEnvelope::sign(sod(), &signer).unwrap();

        let mut bytes = vec![];
        ciborium::into_writer(&envelope, &mut bytes).unwrap();
        let decoded: CmsEnvelope = ciborium::from_reader(bytes.as_slice()).unwrap();

        assert_eq!(decoded, envelope);
    }
}

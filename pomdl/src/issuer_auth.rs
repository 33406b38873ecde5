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

//! The issuer authentication structure, a `COSE_Sign1` ([RFC 9052][1]) over the
//! [`SecurityObject`].
//!
//! The protected header carries the signature algorithm; the unprotected header carries the
//! issuer's DER-encoded public key under the `x5chain` label ([RFC 9360][2], single-certificate
//! form).  The signature itself is produced by the external [`Signer`]; no key material is
//! handled in this crate.
//!
//! [1]: <https://datatracker.ietf.org/doc/rfc9052/>
//! [2]: <https://www.rfc-editor.org/rfc/rfc9360.html>

use coset::{
    iana::{EnumI64 as _, HeaderParameter},
    Algorithm, AsCborValue, Header, Label,
};
use po_sign_utils::{SignatureVerifier, Signer, SigningAlgorithm};
use poerror::traits::{ErrorContext as _, ForeignBoxed as _, ForeignError as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{error::MdlError, models::SecurityObject, Result};

/// Private-use COSE algorithm label for the synthetic test signature.
///
/// Private-use labels must be below -65536 per RFC 9053.
const TEST_COSE_ALG: i64 = -65537;

/// The issuer authentication: a `COSE_Sign1` whose payload is the CBOR-encoded
/// [`SecurityObject`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct IssuerAuth(
    #[serde(
        serialize_with = "serialize_coset",
        deserialize_with = "deserialize_coset"
    )]
    pub(crate) coset::CoseSign1,
);

impl IssuerAuth {
    /// Sign the given [`SecurityObject`] with the external signer.
    ///
    /// # Errors
    ///
    ///   * [`MdlError::SignerUnavailable`] if the signing backend fails; there is no fallback.
    ///   * [`MdlError::IssuerAuth`] if the payload cannot be encoded.
    pub fn sign(security_object: &SecurityObject, signer: &dyn Signer) -> Result<Self> {
        let protected = Header {
            alg: Some(signing_alg_to_coset_alg(signer.algorithm())),
            ..Default::default()
        };

        let public_key_der = signer
            .public_key_der()
            .foreign_boxed_err(|| MdlError::SignerUnavailable)
            .ctx(|| "failed to export the issuer public key")?;

        let unprotected = Header {
            rest: vec![(
                Label::Int(HeaderParameter::X5Chain.to_i64()),
                ciborium::Value::Bytes(public_key_der),
            )],
            ..Default::default()
        };

        let mut payload = vec![];
        ciborium::into_writer(security_object, &mut payload)
            .foreign_err(|| MdlError::IssuerAuth)?;

        let cose_sign1 = coset::CoseSign1Builder::new()
            .protected(protected)
            .unprotected(unprotected)
            .payload(payload)
            .try_create_signature(&[], |data| signer.sign(data))
            .foreign_boxed_err(|| MdlError::SignerUnavailable)?
            .build();

        Ok(Self(cose_sign1))
    }

    /// Verify the issuer signature over the exact signed bytes.
    ///
    /// # Return
    ///
    /// `Ok(true)` if the signature verifies, `Ok(false)` if it does not;
    /// `Err(_)` only when the structure itself cannot be processed.
    pub fn verify_signature(&self, verifier: &dyn SignatureVerifier) -> Result<bool> {
        let public_key_der = self.public_key_der()?;

        let mut verified = false;
        self.0
            .verify_signature(&[], |signature, data| -> Result<()> {
                verified = verifier
                    .verify(data, signature, &public_key_der)
                    .foreign_boxed_err(|| MdlError::IssuerAuth)
                    .ctx(|| "signature verifier failed")?;
                Ok(())
            })?;

        Ok(verified)
    }

    /// The signature algorithm from the protected header, if recognized.
    pub fn signing_algorithm(&self) -> Option<SigningAlgorithm> {
        coset_alg_to_signing_alg(self.0.protected.header.alg.as_ref()?)
    }

    /// The issuer's DER-encoded public key from the unprotected header.
    pub fn public_key_der(&self) -> Result<Vec<u8>> {
        let value = self
            .0
            .unprotected
            .rest
            .iter()
            .find_map(|(label, value)| {
                (label == &Label::Int(HeaderParameter::X5Chain.to_i64())).then_some(value)
            })
            .ok_or_else(|| {
                poerror::Error::root(MdlError::IssuerAuth).ctx("missing issuer public key")
            })?;

        match value {
            ciborium::Value::Bytes(bytes) => Ok(bytes.clone()),
            _ => Err(poerror::Error::root(MdlError::IssuerAuth)
                .ctx("issuer public key must be a byte string")),
        }
    }

    /// The signed [`SecurityObject`], parsed out of the payload.
    pub fn security_object(&self) -> Result<SecurityObject> {
        let payload = self.0.payload.as_ref().ok_or_else(|| {
            poerror::Error::root(MdlError::IssuerAuth).ctx("security object is missing")
        })?;

        ciborium::from_reader(payload.as_slice())
            .foreign_err(|| MdlError::IssuerAuth)
            .ctx(|| "invalid security object")
    }
}

pub(crate) fn serialize_coset<T, S>(
    cose_value: &T,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error>
where
    T: AsCborValue + Clone,
    S: Serializer,
{
    let cbor_value = cose_value
        .clone()
        .to_cbor_value()
        .map_err(serde::ser::Error::custom)?;

    cbor_value.serialize(serializer)
}

pub(crate) fn deserialize_coset<'de, T, D>(deserializer: D) -> std::result::Result<T, D::Error>
where
    T: AsCborValue,
    D: Deserializer<'de>,
{
    let cbor_value = ciborium::Value::deserialize(deserializer)?;

    T::from_cbor_value(cbor_value).map_err(serde::de::Error::custom)
}

fn signing_alg_to_coset_alg(alg: SigningAlgorithm) -> Algorithm {
    match alg {
        SigningAlgorithm::Es256 => Algorithm::Assigned(coset::iana::Algorithm::ES256),
        SigningAlgorithm::Es384 => Algorithm::Assigned(coset::iana::Algorithm::ES384),
        SigningAlgorithm::Es512 => Algorithm::Assigned(coset::iana::Algorithm::ES512),
        SigningAlgorithm::Test => Algorithm::PrivateUse(TEST_COSE_ALG),
    }
}

fn coset_alg_to_signing_alg(alg: &Algorithm) -> Option<SigningAlgorithm> {
    Some(match alg {
        Algorithm::Assigned(coset::iana::Algorithm::ES256) => SigningAlgorithm::Es256,
        Algorithm::Assigned(coset::iana::Algorithm::ES384) => SigningAlgorithm::Es384,
        Algorithm::Assigned(coset::iana::Algorithm::ES512) => SigningAlgorithm::Es512,
        Algorithm::PrivateUse(TEST_COSE_ALG) => SigningAlgorithm::Test,
        _ => return None,
    })
}

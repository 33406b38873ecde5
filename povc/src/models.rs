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

//! The W3C credential and presentation models, per the [VC Data Model][1].
//!
//! Both structures carry a JSON-LD `proof` whose detached compact JWS signs the canonical JSON
//! serialization of the document without its `proof` member, so signing and verification agree
//! on the exact bytes regardless of the key order a producer happened to emit.  Presentation
//! proofs additionally bind the verifier's challenge and domain.
//!
//! [1]: <https://www.w3.org/TR/vc-data-model/>

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use pocommit::{canonical_json, Claim, ClaimValue, Digest, Salt};
use poerror::traits::{ForeignError as _, PropagateError as _};
use serde::{Deserialize, Serialize};

use crate::{error::VcError, Result};

/// The base W3C credentials context.
pub const CONTEXT_CREDENTIALS: &str = "https://www.w3.org/2018/credentials/v1";

/// The base credential type.
pub const TYPE_VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";

/// The PocketOne credential type.
pub const TYPE_POCKETONE_CREDENTIAL: &str = "PocketOneCredential";

/// The presentation type.
pub const TYPE_VERIFIABLE_PRESENTATION: &str = "VerifiablePresentation";

/// The proof type emitted by issuers and holders.
pub const PROOF_TYPE_JWS: &str = "JsonWebSignature2020";

/// Unsalted subject entry carrying the holder DID.
pub const SUBJECT_ID: &str = "id";

/// Subject entry carrying the MasterCode.
pub const SUBJECT_MASTER_CODE: &str = "master_code";

/// Subject entry carrying the TrustCode.
pub const SUBJECT_TRUST_CODE: &str = "trust_code";

/// Unsalted subject entry mirroring the commitment root.
pub const SUBJECT_COMMITMENT_ROOT: &str = "commitment_root";

/// One credential-subject entry: the claim value with the salt it was committed under.
///
/// Entries without a salt (the holder DID, the commitment root) do not participate in the
/// accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectEntry {
    /// The commitment salt, absent for unsalted entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
    /// The claim value.
    pub value: ClaimValue,
}

impl SubjectEntry {
    /// A salted, committed entry.
    pub fn salted(value: ClaimValue, salt: Salt) -> Self {
        Self {
            salt: Some(salt),
            value,
        }
    }

    /// An unsalted entry, outside the commitment accumulator.
    pub fn unsalted(value: ClaimValue) -> Self {
        Self { salt: None, value }
    }
}

/// The JSON-LD proof object of a credential or presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The proof type, [`PROOF_TYPE_JWS`].
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Proof creation time.
    pub created: DateTime<Utc>,
    /// The verification-method identifier, `<did>#key-1`.
    pub verification_method: String,
    /// The verifier challenge; present only on presentation proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge: Option<String>,
    /// The verifier domain; present only on presentation proofs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// The detached compact JWS (`header..signature`).
    pub jws: String,
}

/// A W3C verifiable credential over committed PocketOne claims.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiableCredential {
    /// The JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The credential types.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The issuer DID.
    pub issuer: String,
    /// The issuance timestamp.
    pub issuance_date: DateTime<Utc>,
    /// The expiration timestamp.
    pub expiration_date: DateTime<Utc>,
    /// The subject claims, keyed by claim name.
    pub credential_subject: BTreeMap<String, SubjectEntry>,
    /// The issuer proof; absent only while the credential is being built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiableCredential {
    /// Serialize the credential as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .foreign_err(|| VcError::Decode("JSON encoding failed".to_owned()))
    }

    /// Decode a credential from its JSON serialization.
    ///
    /// # Errors
    ///
    /// [`VcError::Decode`] if the input is not a credential of the expected shape, or
    /// [`VcError::MissingClaim`] if the subject identifier is absent.
    pub fn from_json(input: &str) -> Result<Self> {
        let credential: Self = serde_json::from_str(input)
            .foreign_err(|| VcError::Decode("not a JSON verifiable credential".to_owned()))?;

        credential.validate_structure()?;

        Ok(credential)
    }

    /// Check the contexts, types and the subject identifier.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if !self.context.iter().any(|c| c == CONTEXT_CREDENTIALS) {
            return Err(poerror::Error::root(VcError::Decode(format!(
                "missing the {CONTEXT_CREDENTIALS} context"
            ))));
        }
        for required in [TYPE_VERIFIABLE_CREDENTIAL, TYPE_POCKETONE_CREDENTIAL] {
            if !self.types.iter().any(|t| t == required) {
                return Err(poerror::Error::root(VcError::Decode(format!(
                    "missing the {required} type"
                ))));
            }
        }
        if !self.credential_subject.contains_key(SUBJECT_ID) {
            return Err(poerror::Error::root(VcError::MissingClaim(
                SUBJECT_ID.to_owned(),
            )));
        }

        Ok(())
    }

    /// The holder DID carried in the credential subject.
    pub fn subject_did(&self) -> Result<&str> {
        self.credential_subject
            .get(SUBJECT_ID)
            .and_then(|entry| entry.value.as_str())
            .ok_or_else(|| poerror::Error::root(VcError::MissingClaim(SUBJECT_ID.to_owned())))
    }

    /// The salted claims of the credential subject, in name order.
    pub fn claims(&self) -> Vec<Claim> {
        self.credential_subject
            .iter()
            .filter_map(|(name, entry)| {
                entry
                    .salt
                    .clone()
                    .map(|salt| Claim::new(name.clone(), entry.value.clone(), salt))
            })
            .collect()
    }

    /// The commitment root mirrored in the credential subject.
    pub fn commitment_root(&self) -> Result<Digest> {
        let entry = self
            .credential_subject
            .get(SUBJECT_COMMITMENT_ROOT)
            .ok_or_else(|| {
                poerror::Error::root(VcError::MissingClaim(SUBJECT_COMMITMENT_ROOT.to_owned()))
            })?;

        let hex = entry.value.as_str().ok_or_else(|| {
            poerror::Error::root(VcError::Decode(
                "commitment root must be a hex string".to_owned(),
            ))
        })?;

        Digest::from_hex(hex).with_err(|| VcError::Decode("invalid commitment root".to_owned()))
    }

    pub(crate) fn signing_input(&self, header: &JwsHeader) -> Result<Vec<u8>> {
        detached_signing_input(self, header)
    }
}

/// A W3C verifiable presentation wrapping one or more credentials.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifiablePresentation {
    /// The JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The presentation types.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The holder DID.
    pub holder: String,
    /// The presented credentials.
    pub verifiable_credential: Vec<VerifiableCredential>,
    /// The holder proof binding the challenge and domain; absent only while the presentation is
    /// being built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proof: Option<Proof>,
}

impl VerifiablePresentation {
    /// Serialize the presentation as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .foreign_err(|| VcError::Decode("JSON encoding failed".to_owned()))
    }

    /// Decode a presentation from its JSON serialization.
    pub fn from_json(input: &str) -> Result<Self> {
        let presentation: Self = serde_json::from_str(input)
            .foreign_err(|| VcError::Decode("not a JSON verifiable presentation".to_owned()))?;

        presentation.validate_structure()?;

        Ok(presentation)
    }

    /// Check the contexts, types and that at least one credential is presented.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if !self.context.iter().any(|c| c == CONTEXT_CREDENTIALS) {
            return Err(poerror::Error::root(VcError::Decode(format!(
                "missing the {CONTEXT_CREDENTIALS} context"
            ))));
        }
        if !self.types.iter().any(|t| t == TYPE_VERIFIABLE_PRESENTATION) {
            return Err(poerror::Error::root(VcError::Decode(format!(
                "missing the {TYPE_VERIFIABLE_PRESENTATION} type"
            ))));
        }
        if self.verifiable_credential.is_empty() {
            return Err(poerror::Error::root(VcError::Decode(
                "a presentation must carry at least one credential".to_owned(),
            )));
        }

        Ok(())
    }

    pub(crate) fn signing_input(&self, header: &JwsHeader) -> Result<Vec<u8>> {
        detached_signing_input(self, header)
    }
}

/// The protected JWS header of the detached proof signature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// The signature algorithm name.
    pub alg: String,
    /// Always `false`: the payload is not base64url-encoded (detached, [RFC 7797]).
    ///
    /// [RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797>
    pub b64: bool,
    /// Critical header parameters, always `["b64"]`.
    pub crit: Vec<String>,
}

impl JwsHeader {
    /// The header for the given algorithm name.
    pub fn new(alg: impl Into<String>) -> Self {
        Self {
            alg: alg.into(),
            b64: false,
            crit: vec!["b64".to_owned()],
        }
    }
}

/// The exact signing input of a document's proof.
///
/// This is `base64url(header) ‖ "." ‖ canonical_json(document without proof)`, the
/// detached-payload form of a compact JWS.
fn detached_signing_input<T: Serialize>(document: &T, header: &JwsHeader) -> Result<Vec<u8>> {
    let mut unsigned = serde_json::to_value(document)
        .foreign_err(|| VcError::Decode("unserializable document".to_owned()))?;
    if let Some(object) = unsigned.as_object_mut() {
        object.remove("proof");
    }

    let header_json = serde_json::to_string(header)
        .foreign_err(|| VcError::InvalidProof("unserializable JWS header".to_owned()))?;

    let mut input = URL_SAFE_NO_PAD.encode(header_json).into_bytes();
    input.push(b'.');
    input.extend_from_slice(canonical_json(&unsigned).as_bytes());

    Ok(input)
}

/// Assemble a detached compact JWS from an encoded header and a raw signature.
pub(crate) fn encode_detached_jws(header: &JwsHeader, signature: &[u8]) -> Result<String> {
    let header_json = serde_json::to_string(header)
        .foreign_err(|| VcError::InvalidProof("unserializable JWS header".to_owned()))?;

    Ok(format!(
        "{}..{}",
        URL_SAFE_NO_PAD.encode(header_json),
        URL_SAFE_NO_PAD.encode(signature)
    ))
}

/// Split a detached compact JWS into its header and raw signature.
pub(crate) fn decode_detached_jws(jws: &str) -> Result<(JwsHeader, Vec<u8>)> {
    let mut parts = jws.split('.');
    let (Some(header), Some(""), Some(signature), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(poerror::Error::root(VcError::InvalidProof(
            "expected a detached compact JWS".to_owned(),
        )));
    };

    let header_json = URL_SAFE_NO_PAD
        .decode(header)
        .foreign_err(|| VcError::InvalidProof("JWS header is not base64url".to_owned()))?;
    let header: JwsHeader = serde_json::from_slice(&header_json)
        .foreign_err(|| VcError::InvalidProof("malformed JWS header".to_owned()))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .foreign_err(|| VcError::InvalidProof("JWS signature is not base64url".to_owned()))?;

    Ok((header, signature))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_detached_jws_round_trip() {
        let header = JwsHeader::new("ES256");

        let jws = encode_detached_jws(&header, b"signature-bytes").unwrap();
        let (decoded_header, signature) = decode_detached_jws(&jws).unwrap();

        assert_eq!(decoded_header, header);
        assert_eq!(signature, b"signature-bytes");
    }

    #[test]
    fn test_attached_jws_rejected() {
        let err = decode_detached_jws("aGVhZGVy.cGF5bG9hZA.c2ln").unwrap_err();

        assert_matches!(err.error, VcError::InvalidProof(_));
    }

    #[test]
    fn test_presentation_must_carry_a_credential() {
        let presentation = VerifiablePresentation {
            context: vec![CONTEXT_CREDENTIALS.to_owned()],
            types: vec![TYPE_VERIFIABLE_PRESENTATION.to_owned()],
            holder: "did:pkt:0000000000000000000000000000000000000000".to_owned(),
            verifiable_credential: vec![],
            proof: None,
        };

        let err = presentation.validate_structure().unwrap_err();

        assert_matches!(err.error, VcError::Decode(_));
    }
}

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

//! The PID credential model: a JSON-LD verifiable credential with a detached-JWS proof.
//!
//! The layout follows the [W3C VC Data Model][1] with the eIDAS2 PID claim set in
//! `credentialSubject`.  The proof signs the canonical JSON serialization of the credential
//! without its `proof` member, so signing and verification agree on the exact bytes regardless
//! of the key order a producer happened to emit.
//!
//! [1]: <https://www.w3.org/TR/vc-data-model/>

use std::collections::BTreeMap;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use pocommit::{canonical_json, Claim, ClaimValue, Digest, Salt};
use poerror::traits::{ForeignError as _, PropagateError as _};
use serde::{Deserialize, Serialize};

use crate::{error::PidError, Result};

/// The base W3C credentials context.
pub const CONTEXT_CREDENTIALS: &str = "https://www.w3.org/2018/credentials/v1";

/// The eIDAS2 PID context.
pub const CONTEXT_PID: &str = "https://eudi.europa.eu/2023/credentials/pid/v1";

/// The base credential type.
pub const TYPE_VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";

/// The PID credential type.
pub const TYPE_PID: &str = "PID";

/// The proof type emitted by the issuer.
pub const PROOF_TYPE_JWS: &str = "JsonWebSignature2020";

/// Claims that must be present in the credential subject of every PID.
pub const MANDATORY_CLAIMS: &[&str] = &["family_name", "given_name", "birth_date"];

/// Subject entry carrying the MasterCode.
pub const SUBJECT_MASTER_CODE: &str = "master_code";

/// Subject entry carrying the TrustCode.
pub const SUBJECT_TRUST_CODE: &str = "trust_code";

/// Unsalted subject entry mirroring the commitment root.
pub const SUBJECT_COMMITMENT_ROOT: &str = "commitment_root";

/// One credential-subject entry: the claim value with the salt it was committed under.
///
/// Entries without a salt (the commitment root) do not participate in the accumulator.
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

/// The JSON-LD proof object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Proof {
    /// The proof type, [`PROOF_TYPE_JWS`].
    #[serde(rename = "type")]
    pub proof_type: String,
    /// Proof creation time.
    pub created: DateTime<Utc>,
    /// Identifier of the verification key (the signer's key label).
    pub verification_method: String,
    /// The detached compact JWS (`header..signature`).
    pub jws: String,
}

/// An eIDAS2 PID credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pid {
    /// The JSON-LD contexts.
    #[serde(rename = "@context")]
    pub context: Vec<String>,
    /// The credential types.
    #[serde(rename = "type")]
    pub types: Vec<String>,
    /// The issuer identifier.
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

impl Pid {
    /// Serialize the credential as JSON.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .foreign_err(|| PidError::Decode("JSON encoding failed".to_owned()))
    }

    /// Decode a credential from its JSON serialization.
    ///
    /// # Errors
    ///
    ///   * [`PidError::Decode`] if the input is not a credential of the expected shape.
    ///   * [`PidError::MissingClaim`] if a mandatory claim is absent.
    pub fn from_json(input: &str) -> Result<Self> {
        let pid: Self = serde_json::from_str(input)
            .foreign_err(|| PidError::Decode("not a JSON PID credential".to_owned()))?;

        pid.validate_structure()?;

        Ok(pid)
    }

    /// Check that every mandatory claim is present.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        for claim in MANDATORY_CLAIMS {
            if !self.credential_subject.contains_key(*claim) {
                return Err(poerror::Error::root(PidError::MissingClaim(
                    (*claim).to_owned(),
                )));
            }
        }

        Ok(())
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
                poerror::Error::root(PidError::MissingClaim(SUBJECT_COMMITMENT_ROOT.to_owned()))
            })?;

        let hex = entry.value.as_str().ok_or_else(|| {
            poerror::Error::root(PidError::Decode(
                "commitment root must be a hex string".to_owned(),
            ))
        })?;

        Digest::from_hex(hex).with_err(|| PidError::Decode("invalid commitment root".to_owned()))
    }

    /// The exact signing input of the credential's proof.
    ///
    /// This is `base64url(header) ‖ "." ‖ canonical_json(credential without proof)`, the
    /// detached-payload form of a compact JWS.
    pub(crate) fn signing_input(&self, header: &JwsHeader) -> Result<Vec<u8>> {
        let mut unsigned = serde_json::to_value(self)
            .foreign_err(|| PidError::Decode("unserializable credential".to_owned()))?;
        if let Some(object) = unsigned.as_object_mut() {
            object.remove("proof");
        }

        let header_json = serde_json::to_string(header)
            .foreign_err(|| PidError::InvalidProof("unserializable JWS header".to_owned()))?;

        let mut input = URL_SAFE_NO_PAD.encode(header_json).into_bytes();
        input.push(b'.');
        input.extend_from_slice(canonical_json(&unsigned).as_bytes());

        Ok(input)
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

/// Assemble a detached compact JWS from an encoded header and a raw signature.
pub(crate) fn encode_detached_jws(header: &JwsHeader, signature: &[u8]) -> Result<String> {
    let header_json = serde_json::to_string(header)
        .foreign_err(|| PidError::InvalidProof("unserializable JWS header".to_owned()))?;

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
        return Err(poerror::Error::root(PidError::InvalidProof(
            "expected a detached compact JWS".to_owned(),
        )));
    };

    let header_json = URL_SAFE_NO_PAD
        .decode(header)
        .foreign_err(|| PidError::InvalidProof("JWS header is not base64url".to_owned()))?;
    let header: JwsHeader = serde_json::from_slice(&header_json)
        .foreign_err(|| PidError::InvalidProof("malformed JWS header".to_owned()))?;

    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .foreign_err(|| PidError::InvalidProof("JWS signature is not base64url".to_owned()))?;

    Ok((header, signature))
}

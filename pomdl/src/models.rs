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

//! The mDL document model, loosely following the structures of [ISO/IEC 18013-5:2021][1].
//!
//! The wire format is deterministic CBOR: every map is a [`BTreeMap`], so keys are emitted in
//! sorted order with definite lengths, and re-encoding a decoded document reproduces the exact
//! input bytes.
//!
//! [1]: <https://www.iso.org/standard/69084.html>

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pocommit::{Claim, ClaimValue, Digest, Salt};
use poerror::traits::ForeignError as _;
use serde::{Deserialize, Serialize};

use crate::{error::MdlError, issuer_auth::IssuerAuth, Result};

/// The namespace of the mandatory mDL data elements, per ISO/IEC 18013-5.
pub const MDL_NAMESPACE: &str = "org.iso.18013.5.1";

/// The PocketOne namespace carrying the identity tokens and the commitment root.
pub const POCKETONE_NAMESPACE: &str = "com.pocketone.1";

/// The mDL document type.
pub const MDL_DOC_TYPE: &str = "org.iso.18013.5.1.mDL";

/// Data elements that must be present in the [`MDL_NAMESPACE`] of every document.
pub const MANDATORY_ELEMENTS: &[&str] = &[
    "family_name",
    "given_name",
    "birth_date",
    "document_number",
    "issue_date",
    "expiry_date",
    "issuing_authority",
    "issuing_country",
];

/// Element identifier of the MasterCode in the [`POCKETONE_NAMESPACE`].
pub const ELEMENT_MASTER_CODE: &str = "master_code";

/// Element identifier of the TrustCode in the [`POCKETONE_NAMESPACE`].
pub const ELEMENT_TRUST_CODE: &str = "trust_code";

/// Element identifier of the mirrored commitment root in the [`POCKETONE_NAMESPACE`].
///
/// The authoritative root lives in the signed [`SecurityObject`]; this unsalted mirror exists so
/// a relying party can read the root without parsing the issuer authentication.
pub const ELEMENT_COMMITMENT_ROOT: &str = "commitment_root";

/// The version of the [`SecurityObject`] structure.
pub const SECURITY_OBJECT_VERSION: &str = "1.0";

/// The only digest algorithm a conformant document may declare.
pub const DIGEST_ALGORITHM_SHA256: &str = "SHA-256";

/// One signed data element: the claim value together with the salt it was committed under.
///
/// Elements without a salt (the mirrored commitment root) do not participate in the commitment
/// accumulator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataItem {
    /// The commitment salt, absent for unsalted elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
    /// The element value.
    pub value: ClaimValue,
}

impl DataItem {
    /// A salted, committed data element.
    pub fn salted(value: ClaimValue, salt: Salt) -> Self {
        Self {
            salt: Some(salt),
            value,
        }
    }

    /// An unsalted element, outside the commitment accumulator.
    pub fn unsalted(value: ClaimValue) -> Self {
        Self { salt: None, value }
    }
}

/// Per-namespace data elements, keyed by element identifier.
pub type NameSpaces = BTreeMap<String, BTreeMap<String, DataItem>>;

/// An issued mDL document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mdl {
    /// The document type, [`MDL_DOC_TYPE`] for conformant documents.
    pub doc_type: String,
    /// The signed data elements, grouped by namespace.
    pub name_spaces: NameSpaces,
    /// The issuer authentication over the [`SecurityObject`].
    pub issuer_auth: IssuerAuth,
}

impl Mdl {
    /// Encode the document as deterministic CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        ciborium::into_writer(self, &mut bytes)
            .foreign_err(|| MdlError::Decode("CBOR encoding failed".to_owned()))?;
        Ok(bytes)
    }

    /// Decode a document from CBOR bytes.
    ///
    /// Decoding is the exact inverse of [`to_cbor`][Self::to_cbor] for conformant input.
    ///
    /// # Errors
    ///
    ///   * [`MdlError::Decode`] if the bytes are not a CBOR document of the expected shape.
    ///   * [`MdlError::MissingElement`] if a mandatory data element is absent.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let mdl: Self = ciborium::from_reader(bytes)
            .foreign_err(|| MdlError::Decode("not a CBOR mDL document".to_owned()))?;

        mdl.validate_structure()?;

        Ok(mdl)
    }

    /// Check that every mandatory data element is present.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        let mdl_elements = self
            .name_spaces
            .get(MDL_NAMESPACE)
            .ok_or_else(|| poerror::Error::root(MdlError::MissingElement(MDL_NAMESPACE.into())))?;

        for element in MANDATORY_ELEMENTS {
            if !mdl_elements.contains_key(*element) {
                return Err(poerror::Error::root(MdlError::MissingElement(
                    (*element).to_owned(),
                )));
            }
        }

        let pocketone_elements = self.name_spaces.get(POCKETONE_NAMESPACE).ok_or_else(|| {
            poerror::Error::root(MdlError::MissingElement(POCKETONE_NAMESPACE.into()))
        })?;
        if !pocketone_elements.contains_key(ELEMENT_MASTER_CODE) {
            return Err(poerror::Error::root(MdlError::MissingElement(
                ELEMENT_MASTER_CODE.to_owned(),
            )));
        }

        Ok(())
    }

    /// The salted claims of the document, in namespace-then-element order.
    pub fn claims(&self) -> Vec<Claim> {
        self.name_spaces
            .values()
            .flat_map(|elements| elements.iter())
            .filter_map(|(name, item)| {
                item.salt
                    .clone()
                    .map(|salt| Claim::new(name.clone(), item.value.clone(), salt))
            })
            .collect()
    }

    /// Look up a data element by namespace and identifier.
    pub fn element(&self, name_space: &str, identifier: &str) -> Option<&DataItem> {
        self.name_spaces.get(name_space)?.get(identifier)
    }

    /// The signed [`SecurityObject`], parsed out of the issuer authentication payload.
    pub fn security_object(&self) -> Result<SecurityObject> {
        self.issuer_auth.security_object()
    }

    /// The authoritative commitment root, from the signed [`SecurityObject`].
    pub fn commitment_root(&self) -> Result<Digest> {
        Ok(self.security_object()?.commitment_root)
    }
}

/// Time-validity information of the document, signed as part of the [`SecurityObject`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "ValidityInfoDeserializeHelper")]
pub struct ValidityInfo {
    /// The timestamp at which the signature was created.
    pub signed: DateTime<Utc>,
    /// The timestamp before which the document is not yet valid.
    pub valid_from: DateTime<Utc>,
    /// The timestamp after which the document is no longer valid.
    pub valid_until: DateTime<Utc>,
}

/// A helper struct to [`Deserialize`][serde::Deserialize] [`ValidityInfo`] with
/// custom invariants.
///
/// **NEVER** use this `struct` for anything else.
#[derive(Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct ValidityInfoDeserializeHelper {
    signed: DateTime<Utc>,
    valid_from: DateTime<Utc>,
    valid_until: DateTime<Utc>,
}

impl TryFrom<ValidityInfoDeserializeHelper> for ValidityInfo {
    type Error = poerror::Error<MdlError>;

    fn try_from(value: ValidityInfoDeserializeHelper) -> Result<Self> {
        Self::new(value.signed, value.valid_from, value.valid_until)
    }
}

impl ValidityInfo {
    /// Creates new [`ValidityInfo`], checking the timestamp ordering along the way.
    ///
    /// `valid_from` must be equal to or later than `signed`, and `valid_until` must be later
    /// than `valid_from`.
    pub fn new(
        signed: DateTime<Utc>,
        valid_from: DateTime<Utc>,
        valid_until: DateTime<Utc>,
    ) -> Result<Self> {
        if valid_from < signed {
            return Err(poerror::Error::root(MdlError::InvalidValidityInfo)
                .ctx("`valid_from` must be equal or later than `signed`"));
        }
        if valid_until <= valid_from {
            return Err(poerror::Error::root(MdlError::InvalidValidityInfo)
                .ctx("`valid_until` must be later than `valid_from`"));
        }

        Ok(Self {
            signed,
            valid_from,
            valid_until,
        })
    }

    /// Whether the document is not yet valid at `now`.
    pub fn not_yet_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.valid_from
    }

    /// Whether the document is expired at `now`.
    pub fn expired(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

/// The signed payload of the issuer authentication.
///
/// The analog of the mobile security object of ISO/IEC 18013-5: it fixes the digest algorithm,
/// the per-claim commitment digests and the commitment root the accumulator must reproduce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityObject {
    /// Structure version, [`SECURITY_OBJECT_VERSION`].
    pub version: String,
    /// The declared digest algorithm; only [`DIGEST_ALGORITHM_SHA256`] is conformant.
    pub digest_algorithm: String,
    /// The document type the object was issued for.
    pub doc_type: String,
    /// Per-claim commitment digests, grouped by namespace and element identifier.
    pub claim_commitments: BTreeMap<String, BTreeMap<String, Digest>>,
    /// The root of the commitment accumulator over all salted claims.
    pub commitment_root: Digest,
    /// Time-validity information.
    pub validity_info: ValidityInfo,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    fn timestamp(seconds: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(seconds, 0).unwrap()
    }

    #[test]
    fn test_validity_info_ordering_enforced() {
        assert_matches!(
            ValidityInfo::new(timestamp(100), timestamp(100), timestamp(300)),
            Ok(_)
        );

        // `valid_from` before `signed`
        let err = ValidityInfo::new(timestamp(100), timestamp(50), timestamp(300)).unwrap_err();
        assert_matches!(err.error, MdlError::InvalidValidityInfo);

        // `valid_until` not after `valid_from`
        let err = ValidityInfo::new(timestamp(100), timestamp(200), timestamp(200)).unwrap_err();
        assert_matches!(err.error, MdlError::InvalidValidityInfo);
    }

    #[test]
    fn test_validity_info_deserialization_enforces_ordering() {
        let err = serde_json::from_value::<ValidityInfo>(serde_json::json!({
            "signed": "2025-06-01T12:00:00Z",
            "validFrom": "2025-05-01T12:00:00Z", // before `signed`
            "validUntil": "2026-06-01T12:00:00Z",
        }))
        .unwrap_err();
        assert!(err.is_data());
    }

    #[test]
    fn test_validity_window() {
        let validity =
            ValidityInfo::new(timestamp(100), timestamp(200), timestamp(300)).unwrap();

        assert!(validity.not_yet_valid(timestamp(150)));
        assert!(!validity.not_yet_valid(timestamp(200)));
        assert!(!validity.expired(timestamp(300)));
        assert!(validity.expired(timestamp(301)));
    }
}

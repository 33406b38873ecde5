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

//! The DTC data model: data groups and the Security Object Document (SOD), loosely following
//! the [ICAO Digital Travel Credential][1] structure.
//!
//! The wire format is deterministic CBOR ([`BTreeMap`]s, definite lengths), so re-encoding a
//! decoded credential reproduces the exact input bytes.
//!
//! [1]: <https://www.icao.int/Security/FAL/TRIP/Pages/Publications.aspx>

use std::collections::BTreeMap;

use pocommit::{Claim, ClaimValue, Digest, Salt};
use poerror::traits::ForeignError as _;
use serde::{Deserialize, Serialize};

use crate::{cms::CmsEnvelope, error::DtcError, mrz::Mrz, Result};

/// DG1, the machine-readable zone. Mandatory.
pub const DG_MRZ: u8 = 1;

/// DG2, the face image.
pub const DG_FACE_IMAGE: u8 = 2;

/// DG13, the PocketOne identity tokens and commitment root.
pub const DG_POCKETONE: u8 = 13;

/// The highest assignable data-group number.
pub const MAX_DATA_GROUP: u8 = 16;

/// The only hash algorithm a conformant SOD may declare.
pub const SOD_HASH_ALGORITHM: &str = "SHA-256";

/// Name of the unsalted DG13 entry mirroring the commitment root.
pub const ENTRY_COMMITMENT_ROOT: &str = "commitment_root";

/// Name of the DG13 entry carrying the MasterCode.
pub const ENTRY_MASTER_CODE: &str = "master_code";

/// Name of the DG13 entry carrying the TrustCode.
pub const ENTRY_TRUST_CODE: &str = "trust_code";

/// One DG13 entry: a claim value with the salt it was committed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimEntry {
    /// The commitment salt, absent for unsalted entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub salt: Option<Salt>,
    /// The entry value.
    pub value: ClaimValue,
}

impl ClaimEntry {
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

/// The contents of one data group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataGroup {
    /// DG1: the two TD3 MRZ lines, exactly as printed.
    Mrz {
        /// The first MRZ line.
        line1: String,
        /// The second MRZ line.
        line2: String,
    },
    /// An opaque binary data group (DG2 face image and friends), hex-encoded.
    Binary {
        /// The hex-encoded payload.
        data: String,
    },
    /// DG13: salted claims plus the unsalted commitment-root mirror.
    Claims {
        /// The entries, keyed by claim name.
        entries: BTreeMap<String, ClaimEntry>,
    },
}

impl DataGroup {
    /// An opaque binary data group over raw bytes.
    pub fn binary(data: &[u8]) -> Self {
        Self::Binary {
            data: hex::encode(data),
        }
    }

    /// The SHA-256 digest of the data group's CBOR encoding, hex-encoded.
    pub fn digest(&self) -> Result<String> {
        let mut bytes = vec![];
        ciborium::into_writer(self, &mut bytes)
            .foreign_err(|| DtcError::Decode("CBOR encoding failed".to_owned()))?;

        Ok(hex::encode(openssl::sha::sha256(&bytes)))
    }
}

/// The Security Object Document: the declared hash algorithm and one digest per data group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sod {
    /// The declared hash algorithm; only [`SOD_HASH_ALGORITHM`] is conformant.
    pub hash_algorithm: String,
    /// Hex-encoded digest per data-group number.
    pub digests: BTreeMap<u8, String>,
}

impl Sod {
    /// Compute the SOD over the given data groups.
    pub fn compute(data_groups: &BTreeMap<u8, DataGroup>) -> Result<Self> {
        let digests = data_groups
            .iter()
            .map(|(number, group)| Ok((*number, group.digest()?)))
            .collect::<Result<_>>()?;

        Ok(Self {
            hash_algorithm: SOD_HASH_ALGORITHM.to_owned(),
            digests,
        })
    }

    /// The CBOR bytes the CMS envelope signs.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        ciborium::into_writer(self, &mut bytes)
            .foreign_err(|| DtcError::Decode("CBOR encoding failed".to_owned()))?;
        Ok(bytes)
    }
}

/// An issued Digital Travel Credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dtc {
    /// The data groups, keyed by DG number (1 to 16).
    pub data_groups: BTreeMap<u8, DataGroup>,
    /// The CMS-shaped envelope over the SOD.
    pub envelope: CmsEnvelope,
}

impl Dtc {
    /// Encode the credential as deterministic CBOR.
    pub fn to_cbor(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        ciborium::into_writer(self, &mut bytes)
            .foreign_err(|| DtcError::Decode("CBOR encoding failed".to_owned()))?;
        Ok(bytes)
    }

    /// Decode a credential from CBOR bytes.
    ///
    /// # Errors
    ///
    ///   * [`DtcError::Decode`] if the bytes are not a CBOR credential of the expected shape,
    ///     or a data-group number is out of range.
    ///   * [`DtcError::MissingDataGroup`] if DG1 is absent.
    ///   * [`DtcError::InvalidCheckDigit`] if an MRZ check digit does not validate.
    pub fn from_cbor(bytes: &[u8]) -> Result<Self> {
        let dtc: Self = ciborium::from_reader(bytes)
            .foreign_err(|| DtcError::Decode("not a CBOR DTC".to_owned()))?;

        dtc.validate_structure()?;

        Ok(dtc)
    }

    /// Check data-group numbering, DG1 presence and the MRZ check digits.
    pub(crate) fn validate_structure(&self) -> Result<()> {
        if let Some(number) = self
            .data_groups
            .keys()
            .find(|number| **number < DG_MRZ || **number > MAX_DATA_GROUP)
        {
            return Err(poerror::Error::root(DtcError::Decode(format!(
                "data group number DG{number} is out of range"
            ))));
        }

        match self.data_groups.get(&DG_MRZ) {
            Some(DataGroup::Mrz { line1, line2 }) => {
                Mrz::decode(line1, line2)?;
            }
            Some(_) => {
                return Err(poerror::Error::root(DtcError::Decode(
                    "DG1 must contain an MRZ".to_owned(),
                )))
            }
            None => return Err(poerror::Error::root(DtcError::MissingDataGroup(DG_MRZ))),
        }

        Ok(())
    }

    /// The parsed DG1 MRZ.
    pub fn mrz(&self) -> Result<Mrz> {
        match self.data_groups.get(&DG_MRZ) {
            Some(DataGroup::Mrz { line1, line2 }) => Mrz::decode(line1, line2),
            _ => Err(poerror::Error::root(DtcError::MissingDataGroup(DG_MRZ))),
        }
    }

    /// The salted claims of DG13, in name order.
    pub fn claims(&self) -> Vec<Claim> {
        let Some(DataGroup::Claims { entries }) = self.data_groups.get(&DG_POCKETONE) else {
            return vec![];
        };

        entries
            .iter()
            .filter_map(|(name, entry)| {
                entry
                    .salt
                    .clone()
                    .map(|salt| Claim::new(name.clone(), entry.value.clone(), salt))
            })
            .collect()
    }

    /// The commitment root mirrored in DG13.
    pub fn commitment_root(&self) -> Result<Digest> {
        let Some(DataGroup::Claims { entries }) = self.data_groups.get(&DG_POCKETONE) else {
            return Err(poerror::Error::root(DtcError::MissingDataGroup(
                DG_POCKETONE,
            )));
        };

        let entry = entries.get(ENTRY_COMMITMENT_ROOT).ok_or_else(|| {
            poerror::Error::root(DtcError::Decode(
                "DG13 carries no commitment root".to_owned(),
            ))
        })?;
        let hex = entry.value.as_str().ok_or_else(|| {
            poerror::Error::root(DtcError::Decode(
                "commitment root must be a hex string".to_owned(),
            ))
        })?;

        Digest::from_hex(hex)
            .map_err(|err| poerror::Error::root(DtcError::Decode(err.to_string())))
    }
}

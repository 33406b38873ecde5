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

//! This module defines the core data types shared across the PocketOne credential core.

use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{CommitError, Result};

/// A claim value.
///
/// Values are JSON values serialized canonically (stable key ordering) before hashing, so
/// structurally equal values always produce the same commitment.
pub type ClaimValue = serde_json::Value;

/// A 256-bit digest, as produced by the commitment scheme and the Merkle accumulator.
///
/// Serialized as a lowercase hex string on every wire format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Digest(pub(crate) [u8; 32]);

impl Digest {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Decode a hex string into a [`Digest`].
    ///
    /// The input must be exactly 64 hex characters; anything else (including a truncated
    /// 63-character digest) is rejected.
    pub fn from_hex(value: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(value, &mut bytes).map_err(|_| {
            poerror::Error::root(CommitError::InvalidInput(format!(
                "expected 64 hex characters, found {}",
                value.len()
            )))
        })?;
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Digest {
    type Err = poerror::Error<CommitError>;

    fn from_str(value: &str) -> Result<Self> {
        Self::from_hex(value)
    }
}

impl Serialize for Digest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Digest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// A claim salt, at least 128 bits of caller-supplied randomness.
///
/// A salt must be unique per (credential, claim) and never reused across issuances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(Vec<u8>);

impl Salt {
    /// The raw salt bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Decode a hex string into a [`Salt`].
    pub fn from_hex(value: &str) -> Result<Self> {
        let bytes = hex::decode(value).map_err(|_| {
            poerror::Error::root(CommitError::InvalidInput(
                "salt is not a hex string".to_owned(),
            ))
        })?;
        Ok(Self(bytes))
    }
}

impl From<Vec<u8>> for Salt {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl std::fmt::Display for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

impl Serialize for Salt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Salt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::from_hex(&value).map_err(serde::de::Error::custom)
    }
}

/// One attribute of an identity, together with the salt it was committed under.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    /// The claim type, a non-empty ASCII identifier (e.g. `"birth_date"`).
    pub name: String,
    /// The claim value.
    pub value: ClaimValue,
    /// The commitment salt.
    pub salt: Salt,
}

impl Claim {
    /// Construct a new [`Claim`].
    pub fn new(name: impl Into<String>, value: ClaimValue, salt: Salt) -> Self {
        Self {
            name: name.into(),
            value,
            salt,
        }
    }

    /// Compute the commitment digest of this claim.
    pub fn commitment(&self) -> Result<Digest> {
        crate::commitment::commit(&self.name, &self.value, &self.salt)
    }
}

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

//! Identity tokens: the root MasterCode and purpose-scoped TrustCodes.
//!
//! A [`MasterCode`] is the holder's root identity token, 16 random symbols over a 32-symbol
//! alphabet (80 bits of entropy), displayed in groups of four.  The alphabet excludes the
//! visually ambiguous symbols `I`, `O`, `0` and `1`, since holders read these codes out loud and
//! type them by hand.
//!
//! A [`TrustCode`] is a short-lived, purpose-scoped token derived deterministically from a
//! MasterCode.  Relying parties receive only the TrustCode; the derivation is one-way, so a
//! TrustCode reveals nothing about the MasterCode it was derived from, and TrustCodes derived
//! for different purposes are unlinkable without the MasterCode.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{utils::digest::sha256, CommitError, Result};

/// The token alphabet: 32 symbols, excluding `I`, `O`, `0` and `1`.
const CODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Number of symbols in a MasterCode.
const MASTER_CODE_SYMBOLS: usize = 16;

/// Number of symbols in a TrustCode.
const TRUST_CODE_SYMBOLS: usize = 9;

/// The holder's root identity token.
///
/// Stored as the bare 16-symbol string; [`Display`][std::fmt::Display] renders the grouped form
/// `XXXX-XXXX-XXXX-XXXX`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MasterCode(String);

impl MasterCode {
    /// Generate a fresh MasterCode from the given RNG.
    ///
    /// # Errors
    ///
    /// [`CommitError::WeakEntropy`] if the RNG cannot supply the required bytes.  Generation
    /// fails closed; there is no fallback to a weaker source.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Result<Self> {
        let mut bytes = [0u8; MASTER_CODE_SYMBOLS];
        rng.try_fill_bytes(&mut bytes)
            .map_err(|_| poerror::Error::root(CommitError::WeakEntropy))?;

        let symbols = bytes
            .iter()
            .map(|byte| CODE_ALPHABET[usize::from(byte % 32)] as char)
            .collect();

        Ok(Self(symbols))
    }

    /// Parse a MasterCode from its string form.
    ///
    /// Accepts both the grouped (`XXXX-XXXX-XXXX-XXXX`) and the bare 16-symbol form; lowercase
    /// input is folded to uppercase.
    ///
    /// # Errors
    ///
    /// [`CommitError::InvalidToken`] if the input has the wrong length or contains symbols
    /// outside the token alphabet.
    pub fn parse(value: &str) -> Result<Self> {
        let bare: String = value
            .chars()
            .filter(|c| *c != '-')
            .map(|c| c.to_ascii_uppercase())
            .collect();

        if bare.len() != MASTER_CODE_SYMBOLS {
            return Err(poerror::Error::root(CommitError::InvalidToken(format!(
                "expected {MASTER_CODE_SYMBOLS} symbols, found {}",
                bare.len()
            ))));
        }
        if let Some(invalid) = bare.chars().find(|c| !CODE_ALPHABET.contains(&(*c as u8))) {
            return Err(poerror::Error::root(CommitError::InvalidToken(format!(
                "symbol '{invalid}' is not in the token alphabet"
            ))));
        }

        Ok(Self(bare))
    }

    /// The bare 16-symbol form, without group separators.
    pub fn symbols(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for MasterCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let groups: Vec<&str> = self
            .0
            .as_bytes()
            .chunks(4)
            .map(|group| std::str::from_utf8(group).expect("alphabet symbols are ASCII"))
            .collect();
        write!(f, "{}", groups.join("-"))
    }
}

impl FromStr for MasterCode {
    type Err = poerror::Error<CommitError>;

    fn from_str(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl Serialize for MasterCode {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for MasterCode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(serde::de::Error::custom)
    }
}

/// A purpose-scoped token derived from a [`MasterCode`].
///
/// The same `(master, purpose, issued_at)` triple always derives the same TrustCode, so a holder
/// can re-derive a code they previously handed out and prove it was theirs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrustCode {
    /// The 9-symbol derived code.
    pub code: String,
    /// The purpose the code is scoped to (e.g. `"hotel-checkin"`).
    pub purpose: String,
    /// Derivation timestamp, part of the derivation input.
    pub issued_at: DateTime<Utc>,
}

impl TrustCode {
    /// Derive a TrustCode from a MasterCode for the given purpose.
    ///
    /// The derivation hashes `symbols ‖ ":" ‖ purpose ‖ ":" ‖ unix_seconds` and maps the first
    /// nine digest bytes onto the token alphabet.
    ///
    /// # Errors
    ///
    /// [`CommitError::InvalidInput`] if `purpose` is empty or contains a `:` separator.
    pub fn derive(master: &MasterCode, purpose: &str, issued_at: DateTime<Utc>) -> Result<Self> {
        if purpose.is_empty() {
            return Err(poerror::Error::root(CommitError::InvalidInput(
                "purpose is empty".to_owned(),
            )));
        }
        if purpose.contains(':') {
            return Err(poerror::Error::root(CommitError::InvalidInput(format!(
                "purpose \"{purpose}\" contains the ':' separator"
            ))));
        }

        let input = format!("{}:{}:{}", master.symbols(), purpose, issued_at.timestamp());
        let digest = sha256(input);

        let code = digest[..TRUST_CODE_SYMBOLS]
            .iter()
            .map(|byte| CODE_ALPHABET[usize::from(byte % 32)] as char)
            .collect();

        Ok(Self {
            code,
            purpose: purpose.to_owned(),
            issued_at,
        })
    }

    /// Check whether this TrustCode was derived from the given MasterCode.
    pub fn derived_from(&self, master: &MasterCode) -> bool {
        Self::derive(master, &self.purpose, self.issued_at)
            .map(|rederived| rederived.code == self.code)
            .unwrap_or(false)
    }
}

impl std::fmt::Display for TrustCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code)
    }
}

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

//! Salted claim commitments.
//!
//! A commitment is the hiding/binding digest of a single claim:
//!
//! ```text
//! SHA-256("claim:" ‖ type ‖ ":" ‖ canonical_json(value) ‖ ":" ‖ salt)
//! ```
//!
//! The digest reveals nothing about the value without the salt, and the same `(type, value,
//! salt)` triple always reproduces it.  The salt is supplied by the caller, never generated
//! here, so issuance code controls uniqueness per (credential, claim).

use crate::{
    models::{ClaimValue, Digest, Salt},
    utils::{canonical::canonical_json, digest::sha256, rand::SALT_ENTROPY_BYTES},
    CommitError, Result,
};

/// Domain-separation prefix of claim commitments.
const CLAIM_DOMAIN: &[u8] = b"claim:";

/// Compute the commitment digest of a claim.
///
/// This is a pure function with no side effects.
///
/// # Errors
///
/// [`CommitError::InvalidInput`] if `claim_type` is empty or not ASCII, or if `salt` is shorter
/// than 128 bits.
pub fn commit(claim_type: &str, value: &ClaimValue, salt: &Salt) -> Result<Digest> {
    if claim_type.is_empty() {
        return Err(poerror::Error::root(CommitError::InvalidInput(
            "claim type is empty".to_owned(),
        )));
    }
    if !claim_type.is_ascii() {
        return Err(poerror::Error::root(CommitError::InvalidInput(format!(
            "claim type \"{claim_type}\" is not ASCII"
        ))));
    }
    if salt.as_bytes().len() < SALT_ENTROPY_BYTES {
        return Err(poerror::Error::root(CommitError::InvalidInput(format!(
            "salt has {} bytes, expected at least {}",
            salt.as_bytes().len(),
            SALT_ENTROPY_BYTES
        ))));
    }

    let mut input = CLAIM_DOMAIN.to_vec();
    input.extend_from_slice(claim_type.as_bytes());
    input.push(b':');
    input.extend_from_slice(canonical_json(value).as_bytes());
    input.push(b':');
    input.extend_from_slice(salt.as_bytes());

    Ok(Digest::from(sha256(&input)))
}

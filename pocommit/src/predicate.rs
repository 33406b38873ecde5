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

//! Statement-binding commitments over derived statements.
//!
//! A predicate proof commits to `(statement, result, nonce)`:
//!
//! ```text
//! proof = SHA-256(kind ‖ params ‖ ":" ‖ result ‖ ":" ‖ nonce)
//! ```
//!
//! # Limitation
//!
//! Verifying the commitment requires the verifier to already know (or guess) the statement
//! parameters, the result and the nonce.  It authenticates a claimed result -- it does **not**
//! hide the underlying claim value from an adversary with oracle access.  This is a
//! statement-binding commitment, not a zero-knowledge proof; anyone needing unlinkable predicate
//! proofs (e.g. range proofs over commitments) must treat that as a distinct, larger feature.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    models::{ClaimValue, Digest},
    utils::{canonical::canonical_json, digest::sha256},
    CommitError, Result,
};

/// A derived statement about one underlying claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateStatement {
    /// The holder is at least `threshold_years` old.
    AgeOver {
        /// The age threshold in years.
        threshold_years: u32,
    },
    /// An orderable claim value lies within `[min, max]`.
    Range {
        /// Inclusive lower bound.
        min: i64,
        /// Inclusive upper bound.
        max: i64,
    },
    /// The claim value is a member of a committed set.
    ///
    /// Only the digest of the allowed set is committed, to bound presentation size.
    Membership {
        /// Canonical digest of the allowed set.
        set_digest: Digest,
    },
}

impl PredicateStatement {
    /// Canonical parameter string hashed into the proof.
    fn params(&self) -> String {
        match self {
            Self::AgeOver { threshold_years } => format!("age_over:{threshold_years}"),
            Self::Range { min, max } => format!("range:{min}:{max}"),
            Self::Membership { set_digest } => format!("membership:{set_digest}"),
        }
    }
}

/// A commitment to a derived statement and its result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicateProof {
    /// The committed statement.
    pub statement: PredicateStatement,
    /// The claimed result of evaluating the statement.
    pub result: bool,
    /// The commitment nonce.
    pub nonce: String,
    /// The binding digest over `(statement, result, nonce)`.
    pub proof: Digest,
}

impl PredicateProof {
    /// Commit to an age-over statement.
    ///
    /// The age is computed from the birth-date claim relative to `now` (UTC) at
    /// proof-generation time.
    pub fn age_over(
        threshold_years: u32,
        birth_date: NaiveDate,
        now: DateTime<Utc>,
        nonce: String,
    ) -> Self {
        let result = age_in_years(birth_date, now.date_naive()) >= i64::from(threshold_years);

        Self::bind(
            PredicateStatement::AgeOver { threshold_years },
            result,
            nonce,
        )
    }

    /// Commit to a numeric range statement over an orderable claim value.
    ///
    /// # Errors
    ///
    /// [`CommitError::InvalidInput`] if `min > max`.
    pub fn range(value: i64, min: i64, max: i64, nonce: String) -> Result<Self> {
        if min > max {
            return Err(poerror::Error::root(CommitError::InvalidInput(format!(
                "range bounds are inverted: {min} > {max}"
            ))));
        }

        let result = min <= value && value <= max;

        Ok(Self::bind(PredicateStatement::Range { min, max }, result, nonce))
    }

    /// Commit to a set-membership statement.
    pub fn membership(value: &ClaimValue, allowed_set: &[ClaimValue], nonce: String) -> Self {
        let result = allowed_set.contains(value);
        let set_digest = allowed_set_digest(allowed_set);

        Self::bind(
            PredicateStatement::Membership { set_digest },
            result,
            nonce,
        )
    }

    /// Re-derive the binding digest and compare it with the stored one.
    ///
    /// Per the limitation above, the caller must already hold the statement, result and nonce;
    /// this only checks that the bundle was not altered after commitment.
    pub fn verify(&self) -> bool {
        proof_digest(&self.statement, self.result, &self.nonce) == self.proof
    }

    fn bind(statement: PredicateStatement, result: bool, nonce: String) -> Self {
        let proof = proof_digest(&statement, result, &nonce);
        Self {
            statement,
            result,
            nonce,
            proof,
        }
    }
}

/// Canonical digest of an allowed set: elements are serialized canonically and sorted, so the
/// digest does not depend on the order the verifier supplied them in.
pub fn allowed_set_digest(allowed_set: &[ClaimValue]) -> Digest {
    let mut elements: Vec<String> = allowed_set.iter().map(canonical_json).collect();
    elements.sort();

    Digest::from(sha256(elements.join(",")))
}

fn proof_digest(statement: &PredicateStatement, result: bool, nonce: &str) -> Digest {
    let input = format!("{}:{}:{}", statement.params(), result, nonce);
    Digest::from(sha256(input))
}

fn age_in_years(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    let mut age = i64::from(today.year()) - i64::from(birth_date.year());

    if (today.month(), today.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }

    age
}

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

//! The Merkle accumulator over a credential's claim commitments.
//!
//! The accumulator lets a holder prove possession of a subset of claims without revealing the
//! rest.  Construction rules:
//!
//!   * leaf commitments are sorted lexicographically before the tree is built, so the root is
//!     independent of the input order;
//!   * every leaf is wrapped as `SHA-256("leaf:" ‖ c)` and every parent is
//!     `SHA-256("node:" ‖ sorted_concat(left, right))`, which domain-separates leaves from
//!     internal nodes;
//!   * with an odd node count the last node is promoted unchanged to the next level -- no
//!     duplication, to avoid second-preimage ambiguity.

use serde::{Deserialize, Serialize};

use crate::{
    models::Digest,
    utils::digest::{constant_time_eq, sha256},
    CommitError, Result,
};

/// Domain-separation prefix of leaf hashes.
const LEAF_DOMAIN: &[u8] = b"leaf:";
/// Domain-separation prefix of internal node hashes.
const NODE_DOMAIN: &[u8] = b"node:";

/// Which side of the parent a proof sibling sits on.
///
/// Parent hashing sorts its two children, so recomputing a root does not depend on the side
/// flags; they are recorded to keep proofs self-describing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// The sibling is the left child of the parent.
    Left,
    /// The sibling is the right child of the parent.
    Right,
}

/// One level of a [`MerkleProof`]: the sibling digest and its side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofStep {
    /// The sibling hash at this level.
    pub sibling: Digest,
    /// The side of the parent the sibling is on.
    pub side: Side,
}

/// An inclusion witness for one leaf commitment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerkleProof {
    /// The ordered sibling path, from the leaf level up to (excluding) the root.
    pub path: Vec<ProofStep>,
}

/// A binary hash tree over a credential's claim commitments.
///
/// The tree exclusively owns its nodes; it is built once at issuance and queried for inclusion
/// proofs at presentation time.
#[derive(Debug, Clone, PartialEq)]
pub struct MerkleTree {
    /// `levels[0]` holds the wrapped, sorted leaf hashes; the last level holds only the root.
    levels: Vec<Vec<Digest>>,
}

impl MerkleTree {
    /// Build the accumulator from the given claim commitments.
    ///
    /// # Errors
    ///
    /// [`CommitError::InvalidInput`] if `commitments` is empty.
    pub fn build(commitments: &[Digest]) -> Result<Self> {
        if commitments.is_empty() {
            return Err(poerror::Error::root(CommitError::InvalidInput(
                "cannot build an accumulator over zero commitments".to_owned(),
            )));
        }

        let mut sorted = commitments.to_vec();
        sorted.sort();

        let leaves: Vec<Digest> = sorted.iter().map(leaf_hash).collect();

        let mut levels = vec![leaves];
        while levels.last().expect("at least one level").len() > 1 {
            let previous = levels.last().expect("at least one level");
            let mut next = Vec::with_capacity(previous.len() / 2 + 1);

            for pair in previous.chunks(2) {
                match pair {
                    [left, right] => next.push(node_hash(left, right)),
                    // Odd node count: promote unchanged.
                    [single] => next.push(*single),
                    _ => unreachable!(),
                }
            }

            levels.push(next);
        }

        Ok(Self { levels })
    }

    /// The root of the accumulator.
    pub fn root(&self) -> Digest {
        self.levels.last().expect("at least one level")[0]
    }

    /// Produce an inclusion proof for the given leaf commitment.
    ///
    /// # Errors
    ///
    /// [`CommitError::NotFound`] if the commitment is not a leaf of this tree.
    pub fn prove_inclusion(&self, commitment: &Digest) -> Result<MerkleProof> {
        let target = leaf_hash(commitment);

        let mut index = self.levels[0]
            .iter()
            .position(|leaf| *leaf == target)
            .ok_or_else(|| poerror::Error::root(CommitError::NotFound))?;

        let mut path = Vec::new();
        for level in &self.levels[..self.levels.len() - 1] {
            let sibling_index = index ^ 1;
            if sibling_index < level.len() {
                let side = if sibling_index < index {
                    Side::Left
                } else {
                    Side::Right
                };
                path.push(ProofStep {
                    sibling: level[sibling_index],
                    side,
                });
            }
            // A promoted node has no sibling at this level; the path simply skips it.
            index /= 2;
        }

        Ok(MerkleProof { path })
    }
}

/// Check an inclusion proof against a root.
///
/// Recomputes the root from the leaf commitment and the sibling path and compares the final
/// digest in constant time.  A mismatch is an expected outcome of verification and is therefore
/// a `false` return, not an error.
pub fn verify_inclusion(commitment: &Digest, proof: &MerkleProof, root: &Digest) -> bool {
    let mut current = leaf_hash(commitment);

    for step in &proof.path {
        current = node_hash(&current, &step.sibling);
    }

    constant_time_eq(current.as_bytes(), root.as_bytes())
}

fn leaf_hash(commitment: &Digest) -> Digest {
    let mut input = LEAF_DOMAIN.to_vec();
    input.extend_from_slice(commitment.as_bytes());
    Digest::from(sha256(&input))
}

fn node_hash(lhs: &Digest, rhs: &Digest) -> Digest {
    let (first, second) = if lhs.as_bytes() <= rhs.as_bytes() {
        (lhs, rhs)
    } else {
        (rhs, lhs)
    };

    let mut input = NODE_DOMAIN.to_vec();
    input.extend_from_slice(first.as_bytes());
    input.extend_from_slice(second.as_bytes());
    Digest::from(sha256(&input))
}

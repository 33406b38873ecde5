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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate provides the commitment-and-disclosure engine of the PocketOne credential core.
//!
//! # Details
//!
//! The crate defines the building blocks shared by all four credential codecs.
//!
//!   * [`commitment`] -- salted, domain-separated claim commitments.
//!   * [`merkle`] -- the Merkle accumulator over a credential's claim commitments, producing the
//!     commitment root at issuance and inclusion proofs at presentation time.
//!   * [`predicate`] -- statement-binding commitments over derived statements (age-over, range,
//!     set membership).  These are *not* zero-knowledge proofs; see the module documentation.
//!   * [`token`] -- MasterCode generation and purpose-scoped TrustCode derivation.
//!   * [`presentation`] -- selective-disclosure presentations binding disclosed claims, their
//!     inclusion proofs and a verifier challenge.
//!   * [`verification`] -- the accumulated verification result shared by all credential
//!     verifiers.
//!
//! All operations are pure, synchronous CPU-bound transforms.  Every input (claims, salts,
//! nonces) is supplied by the caller and no component retains cross-call state, so everything
//! here is safe to invoke concurrently without locks.

pub mod commitment;
pub mod error;
pub mod merkle;
pub mod models;
pub mod predicate;
pub mod presentation;
pub mod token;
mod utils;
pub mod verification;

pub use commitment::commit;
pub use error::{CommitError, Result};
pub use merkle::{verify_inclusion, MerkleProof, MerkleTree};
pub use models::{Claim, ClaimValue, Digest, Salt};
pub use predicate::{PredicateProof, PredicateStatement};
pub use presentation::{DisclosedClaim, Presentation, PresentationEngine};
pub use token::{MasterCode, TrustCode};
pub use utils::canonical::canonical_json;
pub use utils::rand::{generate_nonce, generate_salt};
pub use verification::VerificationResult;

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

//! This crate provides the W3C Verifiable Credential and Presentation codec and verifier of the
//! PocketOne credential core.
//!
//! # Details
//!
//! Credentials and presentations follow the [W3C VC Data Model][1] with detached-JWS proofs over
//! their canonical JSON serialization.  Subjects, issuers and holders are identified by the
//! `did:pkt` method, whose identifiers are derived from the key itself; resolution of a DID to
//! its document goes through the asynchronous [`DidResolver`] boundary.  Presentation proofs
//! bind the verifier's challenge and domain.
//!
//! [1]: <https://www.w3.org/TR/vc-data-model/>

pub mod did;
pub mod error;
pub mod holder;
pub mod issuer;
pub mod models;
pub mod verifier;

pub use did::{did_from_public_key, DidDocument, DidResolver};
pub use error::{Result, VcError};
pub use holder::present;
pub use issuer::issue;
pub use models::{Proof, SubjectEntry, VerifiableCredential, VerifiablePresentation};
pub use verifier::{verify_credential, verify_presentation};

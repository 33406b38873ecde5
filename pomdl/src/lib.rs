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

//! This crate provides the mDL credential codec and verifier of the PocketOne credential core,
//! loosely following [ISO/IEC 18013-5:2021][1].
//!
//! # Details
//!
//! Issued documents carry the mandatory mDL data elements in the `org.iso.18013.5.1` namespace
//! and the PocketOne identity tokens (MasterCode, TrustCode) with the commitment root in the
//! `com.pocketone.1` namespace.  Every salted data element is committed into a Merkle
//! accumulator whose root is signed inside a `COSE_Sign1` issuer authentication by an external
//! [`Signer`][po_sign_utils::Signer].
//!
//! The wire format is deterministic CBOR; decoding is the exact inverse of encoding for
//! conformant input, and a missing mandatory data element is a decode error, never an empty
//! claim.
//!
//! Device engagement, session transcripts and reader authentication are session-layer concerns
//! and are not handled here.
//!
//! [1]: <https://www.iso.org/standard/69084.html>

pub mod error;
pub mod issuer;
pub mod issuer_auth;
pub mod models;
pub mod verifier;

pub use error::{MdlError, Result};
pub use issuer::issue;
pub use issuer_auth::IssuerAuth;
pub use models::{
    DataItem, Mdl, SecurityObject, ValidityInfo, MDL_DOC_TYPE, MDL_NAMESPACE, POCKETONE_NAMESPACE,
};
pub use verifier::verify;

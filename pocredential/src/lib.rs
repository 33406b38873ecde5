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

//! This crate provides the unified credential surface of the PocketOne credential core.
//!
//! # Details
//!
//! [`Credential`] wraps a document in any of the four supported standards (ISO mDL, eIDAS2 PID,
//! ICAO DTC, W3C VC) behind one interface for claims, commitment roots and verification, and is
//! the serialized form an external encrypted repository stores.  [`CredentialStatus`] tracks the
//! lifecycle of a held credential; expiry is time-driven, revocation arrives as an external
//! signal at the API boundary.
//!
//! Encryption at rest, transport and the repository itself live outside this crate.

pub mod credential;
pub mod error;
pub mod status;

pub use credential::{Credential, CredentialKind, VerificationContext};
pub use error::{CredentialError, Result};
pub use status::CredentialStatus;

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

//! This crate provides the eIDAS2 PID credential codec and verifier of the PocketOne credential
//! core.
//!
//! # Details
//!
//! A PID is a JSON-LD verifiable credential whose `credentialSubject` carries the person
//! identification claims, the PocketOne identity tokens and the commitment root over all salted
//! claims.  The issuer proof is a detached compact JWS ([RFC 7515], [RFC 7797]) over the
//! canonical JSON serialization of the credential, produced by an external
//! [`Signer`][po_sign_utils::Signer].
//!
//! [RFC 7515]: <https://datatracker.ietf.org/doc/html/rfc7515>
//! [RFC 7797]: <https://datatracker.ietf.org/doc/html/rfc7797>

pub mod error;
pub mod issuer;
pub mod models;
pub mod verifier;

pub use error::{PidError, Result};
pub use issuer::issue;
pub use models::{Pid, Proof, SubjectEntry};
pub use verifier::verify;

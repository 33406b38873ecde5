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

//! This crate provides the ICAO Digital Travel Credential codec and verifier of the PocketOne
//! credential core.
//!
//! # Details
//!
//! A DTC carries numbered data groups: DG1 holds the TD3 machine-readable zone with its ICAO
//! Doc 9303 check digits, DG2 the face image, and DG13 the PocketOne identity tokens with the
//! commitment root over all salted DG13 claims.  The Security Object Document lists a SHA-256
//! digest per data group and is signed by an external [`Signer`][po_sign_utils::Signer] inside
//! a CMS-shaped envelope.  All structures serialize as deterministic CBOR.

pub mod cms;
pub mod error;
pub mod issuer;
pub mod models;
pub mod mrz;
pub mod verifier;

pub use cms::{CmsEnvelope, SignerInfo};
pub use error::{DtcError, Result};
pub use issuer::issue;
pub use models::{DataGroup, Dtc, Sod};
pub use mrz::Mrz;
pub use verifier::verify;

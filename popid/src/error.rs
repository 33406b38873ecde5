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

//! This module defines the error values returned by the crate API.

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum PidError {
    /// A malformed issuance input was provided.
    #[strum(to_string = "Invalid input: {0}")]
    InvalidInput(String),
    /// The PID document is not conformant JSON-LD.
    #[strum(to_string = "Malformed PID credential: {0}")]
    Decode(String),
    /// A mandatory claim is absent from the credential subject.
    #[strum(to_string = "Missing mandatory claim: {0}")]
    MissingClaim(String),
    /// The proof object is structurally invalid.
    #[strum(to_string = "Invalid proof structure: {0}")]
    InvalidProof(String),
    /// The external signing backend failed to produce a signature.
    #[strum(to_string = "The signer is unavailable")]
    SignerUnavailable,
}

impl poerror::PoError for PidError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, PidError>;

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
pub enum VcError {
    /// A malformed issuance or presentation input was provided.
    #[strum(to_string = "Invalid input: {0}")]
    InvalidInput(String),
    /// The credential or presentation JSON is not conformant.
    #[strum(to_string = "Malformed credential: {0}")]
    Decode(String),
    /// A mandatory claim is absent from the credential subject.
    #[strum(to_string = "Missing mandatory claim {0}")]
    MissingClaim(String),
    /// The proof object or its detached JWS is malformed.
    #[strum(to_string = "Invalid proof: {0}")]
    InvalidProof(String),
    /// The DID is not a well-formed `did:pkt` identifier.
    #[strum(to_string = "Invalid DID {0}")]
    InvalidDid(String),
    /// The DID could not be resolved to a DID document.
    #[strum(to_string = "Unknown DID {0}")]
    UnknownDid(String),
    /// The external signing backend failed to produce a signature.
    #[strum(to_string = "The signer is unavailable")]
    SignerUnavailable,
}

impl poerror::PoError for VcError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, VcError>;

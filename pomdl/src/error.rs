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
pub enum MdlError {
    /// A malformed issuance input was provided.
    #[strum(to_string = "Invalid input: {0}")]
    InvalidInput(String),
    /// The mDL wire bytes are not a conformant document.
    #[strum(to_string = "Malformed mDL document: {0}")]
    Decode(String),
    /// A mandatory data element is absent.
    ///
    /// A missing mandatory element is a decode failure, never an empty claim.
    #[strum(to_string = "Missing mandatory data element: {0}")]
    MissingElement(String),
    /// The validity-info timestamps violate their ordering invariants.
    #[strum(to_string = "Invalid validity info")]
    InvalidValidityInfo,
    /// Building or reading the issuer authentication structure failed.
    #[strum(to_string = "Invalid IssuerAuth structure")]
    IssuerAuth,
    /// The external signing backend failed to produce a signature.
    #[strum(to_string = "The signer is unavailable")]
    SignerUnavailable,
}

impl poerror::PoError for MdlError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, MdlError>;

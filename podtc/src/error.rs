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
pub enum DtcError {
    /// A malformed issuance input was provided.
    #[strum(to_string = "Invalid input: {0}")]
    InvalidInput(String),
    /// The DTC wire bytes are not a conformant credential.
    #[strum(to_string = "Malformed DTC: {0}")]
    Decode(String),
    /// A mandatory data group is absent.
    #[strum(to_string = "Missing mandatory data group DG{0}")]
    MissingDataGroup(u8),
    /// An MRZ check digit does not match its field.
    #[strum(to_string = "Invalid MRZ check digit over {0}")]
    InvalidCheckDigit(String),
    /// The external signing backend failed to produce a signature.
    #[strum(to_string = "The signer is unavailable")]
    SignerUnavailable,
}

impl poerror::PoError for DtcError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, DtcError>;

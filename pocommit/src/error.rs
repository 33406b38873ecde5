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
//!
//! Note that commitment and Merkle-proof *mismatches* are not errors; verification failure is an
//! expected outcome and is surfaced as data (a `false` result or an entry in the
//! [`VerificationResult`][crate::verification::VerificationResult]).

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum CommitError {
    /// A malformed claim type, value or salt was provided.
    #[strum(to_string = "Invalid input: {0}")]
    InvalidInput(String),
    /// The requested leaf is not part of the accumulator.
    #[strum(to_string = "Leaf not found in the accumulator")]
    NotFound,
    /// The underlying RNG could not supply the required bytes.
    ///
    /// Token generation must halt; there is no fallback to a weaker source.
    #[strum(to_string = "Entropy source failed")]
    WeakEntropy,
    /// A malformed MasterCode or TrustCode string was provided.
    #[strum(to_string = "Invalid identity token: {0}")]
    InvalidToken(String),
}

impl poerror::PoError for CommitError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, CommitError>;

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
pub enum SignatureError {
    /// The external signing backend could not be reached, or timed out.
    ///
    /// This is distinct from a failed verification; callers must not interpret it as "signature
    /// invalid".
    #[strum(to_string = "Signing backend is unavailable")]
    SignerUnavailable,
    /// The signing backend does not know the requested key label.
    #[strum(to_string = "Key with label \"{0}\" not found")]
    KeyNotFound(String),
    /// An unknown or unsupported signing algorithm identifier was encountered.
    #[strum(to_string = "Invalid signing algorithm: {0}")]
    InvalidSigningAlgorithm(String),
    /// The provided public key could not be parsed.
    #[strum(to_string = "Invalid public key")]
    InvalidPublicKey,
}

impl poerror::PoError for SignatureError {}

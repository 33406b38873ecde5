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

use crate::status::CredentialStatus;

/// Error type used across the crate API.
#[derive(strum_macros::Display, Debug, PartialEq, Clone)]
pub enum CredentialError {
    /// The wrapped credential is not conformant.
    #[strum(to_string = "Malformed credential: {0}")]
    Decode(String),
    /// The requested lifecycle transition is not allowed from the current status.
    #[strum(to_string = "Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// The current status.
        from: CredentialStatus,
        /// The requested status.
        to: CredentialStatus,
    },
}

impl poerror::PoError for CredentialError {}

/// Type alias for [`poerror::Result`] types returned by the crate's API.
pub type Result<T> = poerror::Result<T, CredentialError>;

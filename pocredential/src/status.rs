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

//! The credential lifecycle.
//!
//! Statuses move `Pending → Active → {Expired, Revoked}`.  Expiry is time-driven and applied
//! through [`CredentialStatus::expire_if_due`]; revocation is an external signal delivered at
//! the API boundary.  `Expired` and `Revoked` are terminal.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{error::CredentialError, Result};

/// Lifecycle status of a held credential.
#[derive(
    strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CredentialStatus {
    /// Issued but not yet accepted by the holder.
    #[strum(to_string = "pending")]
    Pending,
    /// Held and usable for presentations.
    #[strum(to_string = "active")]
    Active,
    /// Past its validity window.  Terminal.
    #[strum(to_string = "expired")]
    Expired,
    /// Revoked by the issuer.  Terminal.
    #[strum(to_string = "revoked")]
    Revoked,
}

impl CredentialStatus {
    /// Accept a pending credential.
    ///
    /// # Errors
    ///
    /// [`CredentialError::InvalidTransition`] unless the status is
    /// [`Pending`][CredentialStatus::Pending].
    pub fn activate(self) -> Result<Self> {
        match self {
            Self::Pending => Ok(Self::Active),
            from => Err(poerror::Error::root(CredentialError::InvalidTransition {
                from,
                to: Self::Active,
            })),
        }
    }

    /// Apply an external revocation signal.
    ///
    /// # Errors
    ///
    /// [`CredentialError::InvalidTransition`] unless the status is
    /// [`Active`][CredentialStatus::Active].
    pub fn revoke(self) -> Result<Self> {
        match self {
            Self::Active => Ok(Self::Revoked),
            from => Err(poerror::Error::root(CredentialError::InvalidTransition {
                from,
                to: Self::Revoked,
            })),
        }
    }

    /// Move an active credential to [`Expired`][CredentialStatus::Expired] once its validity
    /// window has passed.
    ///
    /// Credentials without an expiration timestamp never expire this way; terminal statuses are
    /// left untouched.
    pub fn expire_if_due(self, now: DateTime<Utc>, expires_at: Option<DateTime<Utc>>) -> Self {
        match (self, expires_at) {
            (Self::Active, Some(expires_at)) if now >= expires_at => Self::Expired,
            (status, _) => status,
        }
    }

    /// Whether no further transition is possible.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Expired | Self::Revoked)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone as _;

    use super::*;

    fn at(year: i32) -> DateTime<Utc> {
        chrono::Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_happy_path() {
        let status = CredentialStatus::Pending.activate().unwrap();

        assert_eq!(status, CredentialStatus::Active);
        assert_eq!(status.revoke().unwrap(), CredentialStatus::Revoked);
    }

    #[test]
    fn test_time_driven_expiry() {
        let status = CredentialStatus::Active;

        assert_eq!(
            status.expire_if_due(at(2026), Some(at(2030))),
            CredentialStatus::Active
        );
        assert_eq!(
            status.expire_if_due(at(2030), Some(at(2030))),
            CredentialStatus::Expired
        );
        assert_eq!(status.expire_if_due(at(2031), None), CredentialStatus::Active);
    }

    #[test]
    fn test_pending_cannot_be_revoked() {
        let err = CredentialStatus::Pending.revoke().unwrap_err();

        assert_matches!(
            err.error,
            CredentialError::InvalidTransition {
                from: CredentialStatus::Pending,
                to: CredentialStatus::Revoked,
            }
        );
    }

    #[test]
    fn test_terminal_statuses_stay_put() {
        for status in [CredentialStatus::Expired, CredentialStatus::Revoked] {
            assert!(status.is_terminal());
            assert_matches!(status.activate(), Err(_));
            assert_matches!(status.revoke(), Err(_));
            assert_eq!(status.expire_if_due(at(2031), Some(at(2030))), status);
        }
    }

    #[test]
    fn test_pending_does_not_expire() {
        // A credential must be accepted before the clock can expire it.
        assert_eq!(
            CredentialStatus::Pending.expire_if_due(at(2031), Some(at(2030))),
            CredentialStatus::Pending
        );
    }
}

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

//! The accumulated result of verifying a credential or presentation.
//!
//! Verifiers never stop at the first defect: every check runs and records its outcome, so the
//! caller sees the complete picture (an expired credential with a bad signature reports both).
//! A failed check is data, not an error; `Result::Err` is reserved for inputs that cannot be
//! processed at all.

use serde::{Deserialize, Serialize};

/// The outcome of a single verification check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Check {
    /// A stable, human-readable check name (e.g. `"issuer_signature"`).
    pub name: String,
    /// Whether the check passed.
    pub passed: bool,
    /// Failure detail, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// The accumulated outcome of a verification run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationResult {
    /// Every check that ran, in execution order.
    pub checks: Vec<Check>,
    /// Non-fatal findings (e.g. a synthetic test signature on an otherwise valid credential).
    pub warnings: Vec<String>,
}

impl VerificationResult {
    /// Construct an empty result.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a passed check.
    pub fn pass(&mut self, name: impl Into<String>) {
        self.checks.push(Check {
            name: name.into(),
            passed: true,
            detail: None,
        });
    }

    /// Record a failed check with a detail message.
    pub fn fail(&mut self, name: impl Into<String>, detail: impl Into<String>) {
        self.checks.push(Check {
            name: name.into(),
            passed: false,
            detail: Some(detail.into()),
        });
    }

    /// Record a check outcome, with the detail attached only on failure.
    pub fn record(&mut self, name: impl Into<String>, passed: bool, detail: impl Into<String>) {
        if passed {
            self.pass(name);
        } else {
            self.fail(name, detail);
        }
    }

    /// Record a non-fatal warning.
    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Append the checks and warnings of another result.
    pub fn merge(&mut self, other: Self) {
        self.checks.extend(other.checks);
        self.warnings.extend(other.warnings);
    }

    /// Whether verification succeeded: at least one check ran and all of them passed.
    ///
    /// Warnings do not affect the outcome.
    pub fn verified(&self) -> bool {
        !self.checks.is_empty() && self.checks.iter().all(|check| check.passed)
    }

    /// The failed checks, in execution order.
    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks.iter().filter(|check| !check.passed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_result_is_not_verified() {
        assert!(!VerificationResult::new().verified());
    }

    #[test]
    fn test_all_checks_recorded() {
        let mut result = VerificationResult::new();

        result.pass("issuer_signature");
        result.fail("validity_window", "expired 2024-01-01");
        result.fail("commitment_root", "root mismatch");

        assert!(!result.verified());
        assert_eq!(result.checks.len(), 3);
        assert_eq!(result.failures().count(), 2);
    }

    #[test]
    fn test_warnings_do_not_fail_verification() {
        let mut result = VerificationResult::new();

        result.pass("issuer_signature");
        result.warn("signature uses a synthetic test algorithm");

        assert!(result.verified());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_merge() {
        let mut outer = VerificationResult::new();
        outer.pass("envelope");

        let mut inner = VerificationResult::new();
        inner.fail("claim:birth_date", "commitment mismatch");
        inner.warn("synthetic signature");

        outer.merge(inner);

        assert!(!outer.verified());
        assert_eq!(outer.checks.len(), 2);
        assert_eq!(outer.warnings.len(), 1);
    }
}

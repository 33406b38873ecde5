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

//! Verification of Digital Travel Credentials.
//!
//! Checks run in a fixed order and never stop at the first defect: structure (including the MRZ
//! check digits), envelope OIDs, declared hash algorithm, per-data-group digest format and
//! recomputation, the DG13 commitment root, and finally the delegated envelope signature.  A
//! truncated or malformed declared digest is a failed check, never a warning.

use pocommit::{MerkleTree, VerificationResult};
use po_sign_utils::{SignatureVerifier, SigningAlgorithm};

use crate::{
    cms::{OID_SHA256, OID_SIGNED_DATA},
    models::{Dtc, SOD_HASH_ALGORITHM},
};

/// Verify a Digital Travel Credential.
///
/// `get_verifier` supplies the [`SignatureVerifier`] for the envelope's signature algorithm;
/// returning `None` fails the signature check (fail closed).
pub fn verify<'a>(
    dtc: &Dtc,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
) -> VerificationResult {
    let mut result = VerificationResult::new();

    match dtc.validate_structure() {
        Ok(()) => result.pass("structure"),
        Err(err) => result.fail("structure", err.to_string()),
    }

    result.record(
        "cms_content_type",
        dtc.envelope.content_type == OID_SIGNED_DATA,
        format!("unexpected content-type OID {}", dtc.envelope.content_type),
    );
    result.record(
        "cms_digest_algorithm",
        dtc.envelope.digest_algorithm == OID_SHA256,
        format!(
            "unexpected digest-algorithm OID {}",
            dtc.envelope.digest_algorithm
        ),
    );
    result.record(
        "sod_hash_algorithm",
        dtc.envelope.content.hash_algorithm == SOD_HASH_ALGORITHM,
        format!(
            "unsupported hash algorithm {}",
            dtc.envelope.content.hash_algorithm
        ),
    );

    verify_digests(dtc, &mut result);
    verify_commitment_root(dtc, &mut result);
    verify_signature(dtc, get_verifier, &mut result);

    result
}

/// Every declared digest must be well-formed and match its recomputed data group, and every data
/// group must be declared.
fn verify_digests(dtc: &Dtc, result: &mut VerificationResult) {
    let declared = &dtc.envelope.content.digests;

    for (number, digest) in declared {
        let well_formed =
            digest.len() == 64 && digest.chars().all(|c| c.is_ascii_hexdigit());
        result.record(
            format!("digest_format:DG{number}"),
            well_formed,
            format!("declared digest has {} characters, expected 64 hex", digest.len()),
        );

        if !dtc.data_groups.contains_key(number) {
            result.fail(
                format!("digest:DG{number}"),
                "declared digest covers an absent data group",
            );
        }
    }

    for (number, group) in &dtc.data_groups {
        let check = format!("digest:DG{number}");
        match group.digest() {
            Ok(recomputed) => match declared.get(number) {
                Some(digest) => result.record(
                    check,
                    *digest == recomputed,
                    "recomputed data-group digest does not match the declared one",
                ),
                None => result.fail(check, "data group is not covered by the SOD"),
            },
            Err(err) => result.fail(check, err.to_string()),
        }
    }
}

/// Re-derive the accumulator over the salted DG13 claims against the mirrored root.
fn verify_commitment_root(dtc: &Dtc, result: &mut VerificationResult) {
    let mirrored = match dtc.commitment_root() {
        Ok(mirrored) => mirrored,
        Err(err) => {
            result.fail("commitment_root", err.to_string());
            return;
        }
    };

    let mut commitments = Vec::new();
    for claim in dtc.claims() {
        match claim.commitment() {
            Ok(commitment) => commitments.push(commitment),
            Err(err) => result.fail(format!("commitment:{}", claim.name), err.to_string()),
        }
    }

    match MerkleTree::build(&commitments) {
        Ok(tree) => result.record(
            "commitment_root",
            tree.root() == mirrored,
            "recomputed accumulator root does not match the mirrored root",
        ),
        Err(err) => result.fail("commitment_root", err.to_string()),
    }
}

fn verify_signature<'a>(
    dtc: &Dtc,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
    result: &mut VerificationResult,
) {
    let algorithm = dtc.envelope.signer_info.algorithm;

    if algorithm.is_synthetic() {
        result.warn("envelope signature uses the synthetic test algorithm");
    }

    let Some(verifier) = get_verifier(algorithm) else {
        result.fail(
            "sod_signature",
            format!("no signature verifier for algorithm {algorithm}"),
        );
        return;
    };

    match dtc.envelope.verify_signature(verifier) {
        Ok(verified) => result.record(
            "sod_signature",
            verified,
            "envelope signature does not verify",
        ),
        Err(err) => result.fail("sod_signature", err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use po_sign_utils::test_utils::{TestSigner, TestVerifier};
    use pocommit::{generate_salt, Claim, MasterCode};
    use rand::thread_rng;
    use serde_json::json;

    use super::*;
    use crate::{
        models::{DataGroup, DG_POCKETONE},
        mrz::Mrz,
    };

    fn issued_dtc() -> Dtc {
        let mut rng = thread_rng();
        let mrz = Mrz {
            issuing_state: "HRV".to_owned(),
            name: "KOVAC<<ANA".to_owned(),
            document_number: "HR1234567".to_owned(),
            nationality: "HRV".to_owned(),
            birth_date: "900515".to_owned(),
            sex: 'F',
            expiry_date: "300101".to_owned(),
            personal_number: "".to_owned(),
        };
        let claims = vec![
            Claim::new("family_name", json!("Kovač"), generate_salt(&mut rng)),
            Claim::new("given_name", json!("Ana"), generate_salt(&mut rng)),
        ];
        let master_code: MasterCode = "ABCD-EFGH-JKLM-NPQR".parse().unwrap();

        crate::issuer::issue(
            &mrz,
            b"face-image",
            claims,
            &master_code,
            None,
            &TestSigner::new("issuer"),
            &mut rng,
        )
        .unwrap()
    }

    fn test_verifier(
        algorithm: SigningAlgorithm,
    ) -> Option<&'static dyn SignatureVerifier> {
        (algorithm == SigningAlgorithm::Test).then_some(&TestVerifier)
    }

    #[test]
    fn test_valid_credential_verifies_with_synthetic_warning() {
        let result = verify(&issued_dtc(), test_verifier);

        assert!(
            result.verified(),
            "failures: {:?}",
            result.failures().collect::<Vec<_>>()
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_truncated_digest_is_a_failed_check() {
        let mut dtc = issued_dtc();
        let digest = dtc.envelope.content.digests.get_mut(&2).unwrap();
        digest.truncate(63);

        let result = verify(&dtc, test_verifier);

        assert!(!result.verified());
        let failed: Vec<_> = result.failures().map(|check| check.name.clone()).collect();
        assert!(failed.contains(&"digest_format:DG2".to_owned()));
        assert!(failed.contains(&"digest:DG2".to_owned()));
    }

    #[test]
    fn test_tampered_data_group_fails() {
        let mut dtc = issued_dtc();
        dtc.data_groups
            .insert(2, DataGroup::binary(b"substituted-face-image"));

        let result = verify(&dtc, test_verifier);

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "digest:DG2"));
    }

    #[test]
    fn test_tampered_claim_fails_commitment_root() {
        let mut dtc = issued_dtc();
        let Some(DataGroup::Claims { entries }) = dtc.data_groups.get_mut(&DG_POCKETONE) else {
            panic!("DG13 must carry claims");
        };
        entries.get_mut("family_name").unwrap().value = json!("Horvat");

        let result = verify(&dtc, test_verifier);

        assert!(!result.verified());
        let failed: Vec<_> = result.failures().map(|check| check.name.clone()).collect();
        // Both the accumulator and the covering DG13 digest report the substitution.
        assert!(failed.contains(&"commitment_root".to_owned()));
        assert!(failed.contains(&format!("digest:DG{DG_POCKETONE}")));
    }

    #[test]
    fn test_corrupted_mrz_fails_structure() {
        let mut dtc = issued_dtc();
        let Some(DataGroup::Mrz { line2, .. }) = dtc.data_groups.get_mut(&1) else {
            panic!("DG1 must carry an MRZ");
        };
        line2.replace_range(13..14, "8");

        let result = verify(&dtc, test_verifier);

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "structure"));
    }

    #[test]
    fn test_wrong_oid_fails() {
        let mut dtc = issued_dtc();
        dtc.envelope.content_type = "1.2.840.113549.1.7.1".to_owned();

        let result = verify(&dtc, test_verifier);

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "cms_content_type"));
    }

    #[test]
    fn test_missing_verifier_fails_closed() {
        let result = verify(&issued_dtc(), |_| None);

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "sod_signature"));
    }
}

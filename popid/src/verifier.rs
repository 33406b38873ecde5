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

//! Verification of PID credentials.
//!
//! Checks run in a fixed order and all of them run regardless of earlier failures: structure,
//! contexts and types, issuer allow-list, validity window, commitment re-derivation and the
//! delegated proof signature.

use chrono::{DateTime, Utc};
use po_sign_utils::{SignatureVerifier, SigningAlgorithm};
use pocommit::{MerkleTree, VerificationResult};

use crate::models::{
    decode_detached_jws, Pid, CONTEXT_CREDENTIALS, CONTEXT_PID, PROOF_TYPE_JWS, TYPE_PID,
    TYPE_VERIFIABLE_CREDENTIAL,
};

/// Verify a PID credential.
///
/// `trusted_issuers` is the relying party's issuer allow-list; `issuer_public_key_der` is the
/// key the proof is expected to verify under, obtained out of band.  `get_verifier` supplies the
/// [`SignatureVerifier`] for the proof's algorithm; returning `None` fails the signature check.
pub fn verify<'a>(
    pid: &Pid,
    now: DateTime<Utc>,
    trusted_issuers: &[&str],
    issuer_public_key_der: &[u8],
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
) -> VerificationResult {
    let mut result = VerificationResult::new();

    match pid.validate_structure() {
        Ok(()) => result.pass("structure"),
        Err(err) => result.fail("structure", err.to_string()),
    }

    result.record(
        "context",
        pid.context.iter().any(|c| c == CONTEXT_CREDENTIALS)
            && pid.context.iter().any(|c| c == CONTEXT_PID),
        "missing required JSON-LD context",
    );
    result.record(
        "type",
        pid.types.iter().any(|t| t == TYPE_VERIFIABLE_CREDENTIAL)
            && pid.types.iter().any(|t| t == TYPE_PID),
        "missing required credential type",
    );

    result.record(
        "issuer",
        trusted_issuers.contains(&pid.issuer.as_str()),
        format!("issuer {} is not on the allow-list", pid.issuer),
    );

    if now < pid.issuance_date {
        result.fail("validity_window", "credential is not yet valid");
    } else if now > pid.expiration_date {
        result.fail("validity_window", "credential is expired");
    } else {
        result.pass("validity_window");
    }

    verify_commitments(pid, &mut result);
    verify_proof(pid, issuer_public_key_der, get_verifier, &mut result);

    result
}

fn verify_commitments(pid: &Pid, result: &mut VerificationResult) {
    let mut commitments = Vec::new();
    for claim in pid.claims() {
        let check = format!("commitment:{}", claim.name);
        match claim.commitment() {
            Ok(commitment) => {
                result.pass(check);
                commitments.push(commitment);
            }
            Err(err) => result.fail(check, err.to_string()),
        }
    }

    let root = match pid.commitment_root() {
        Ok(root) => root,
        Err(err) => {
            result.fail("commitment_root", err.to_string());
            return;
        }
    };

    match MerkleTree::build(&commitments) {
        Ok(tree) => result.record(
            "commitment_root",
            tree.root() == root,
            "recomputed accumulator root does not match the credential",
        ),
        Err(err) => result.fail("commitment_root", err.to_string()),
    }
}

fn verify_proof<'a>(
    pid: &Pid,
    issuer_public_key_der: &[u8],
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
    result: &mut VerificationResult,
) {
    let Some(proof) = &pid.proof else {
        result.fail("proof", "credential carries no proof");
        return;
    };

    result.record(
        "proof_type",
        proof.proof_type == PROOF_TYPE_JWS,
        format!("unexpected proof type {}", proof.proof_type),
    );

    let (header, signature) = match decode_detached_jws(&proof.jws) {
        Ok(decoded) => decoded,
        Err(err) => {
            result.fail("proof_signature", err.to_string());
            return;
        }
    };

    let algorithm = match header.alg.parse::<SigningAlgorithm>() {
        Ok(algorithm) => algorithm,
        Err(err) => {
            result.fail("proof_signature", err.to_string());
            return;
        }
    };

    if algorithm.is_synthetic() {
        result.warn("proof signature uses the synthetic test algorithm");
    }

    let Some(verifier) = get_verifier(algorithm) else {
        result.fail(
            "proof_signature",
            format!("no signature verifier for algorithm {algorithm}"),
        );
        return;
    };

    let signing_input = match pid.signing_input(&header) {
        Ok(input) => input,
        Err(err) => {
            result.fail("proof_signature", err.to_string());
            return;
        }
    };

    match verifier.verify(&signing_input, &signature, issuer_public_key_der) {
        Ok(verified) => result.record(
            "proof_signature",
            verified,
            "proof signature does not verify",
        ),
        Err(err) => result.fail("proof_signature", err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone as _;
    use po_sign_utils::{
        test_utils::{TestSigner, TestVerifier},
        Signer as _,
    };
    use pocommit::{generate_salt, Claim, MasterCode};
    use rand::thread_rng;
    use serde_json::json;

    use super::*;

    const TRUSTED: &[&str] = &["did:example:issuer"];

    fn issued_pid() -> Pid {
        let mut rng = thread_rng();
        let claims: Vec<Claim> = [
            ("family_name", json!("Kovač")),
            ("given_name", json!("Ana")),
            ("birth_date", json!("1990-05-15")),
            ("nationality", json!("HR")),
        ]
        .into_iter()
        .map(|(name, value)| Claim::new(name, value, generate_salt(&mut rng)))
        .collect();

        let master_code: MasterCode = "ABCD-EFGH-JKLM-NPQR".parse().unwrap();

        crate::issuer::issue(
            claims,
            &master_code,
            None,
            "did:example:issuer",
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            &TestSigner::new("pid-issuer"),
            &mut rng,
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn issuer_key() -> Vec<u8> {
        TestSigner::new("pid-issuer").public_key_der().unwrap()
    }

    fn test_verifier(
        algorithm: SigningAlgorithm,
    ) -> Option<&'static dyn SignatureVerifier> {
        (algorithm == SigningAlgorithm::Test).then_some(&TestVerifier)
    }

    #[test]
    fn test_valid_credential_verifies_with_synthetic_warning() {
        let result = verify(&issued_pid(), now(), TRUSTED, &issuer_key(), test_verifier);

        assert!(result.verified(), "failures: {:?}", result.failures().collect::<Vec<_>>());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn test_untrusted_issuer_fails() {
        let result = verify(
            &issued_pid(),
            now(),
            &["did:example:someone-else"],
            &issuer_key(),
            test_verifier,
        );

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "issuer"));
    }

    #[test]
    fn test_tampered_claim_fails_signature_and_root() {
        let mut pid = issued_pid();
        pid.credential_subject.get_mut("birth_date").unwrap().value = json!("2010-05-15");

        let result = verify(&pid, now(), TRUSTED, &issuer_key(), test_verifier);

        assert!(!result.verified());
        let failed: Vec<_> = result.failures().map(|check| check.name.as_str()).collect();
        assert!(failed.contains(&"commitment_root"));
        assert!(failed.contains(&"proof_signature"));
    }

    #[test]
    fn test_expired_credential_fails() {
        let expired_at = chrono::Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();

        let result = verify(
            &issued_pid(),
            expired_at,
            TRUSTED,
            &issuer_key(),
            test_verifier,
        );

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "validity_window"));
    }

    #[test]
    fn test_wrong_issuer_key_fails_signature() {
        let wrong_key = TestSigner::new("other-issuer").public_key_der().unwrap();

        let result = verify(&issued_pid(), now(), TRUSTED, &wrong_key, test_verifier);

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "proof_signature"));
    }

    #[test]
    fn test_stripped_proof_fails() {
        let mut pid = issued_pid();
        pid.proof = None;

        let result = verify(&pid, now(), TRUSTED, &issuer_key(), test_verifier);

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "proof"));
    }
}

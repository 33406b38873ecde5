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

//! Verification of W3C credentials and presentations.
//!
//! Checks run in a fixed order and never stop at the first defect.  Key material comes from DID
//! resolution: the document's key must re-derive the DID itself, so a registry serving a
//! substituted key is caught before any signature is checked.  A synthetic test signature
//! verifies like any other but is flagged with a warning.

use chrono::{DateTime, Utc};
use po_sign_utils::{SignatureVerifier, SigningAlgorithm};
use pocommit::{MerkleTree, VerificationResult};

use crate::{
    did::{did_from_public_key, validate_did, DidResolver},
    models::{
        decode_detached_jws, JwsHeader, Proof, VerifiableCredential, VerifiablePresentation,
        PROOF_TYPE_JWS,
    },
    Result,
};

/// Verify a single credential.
///
/// The issuer key is obtained by resolving the credential's issuer DID through `resolver`;
/// `get_verifier` supplies the [`SignatureVerifier`] for the proof's signature algorithm.
/// Returning `None` fails the signature check (fail closed).
pub async fn verify_credential<'a>(
    credential: &VerifiableCredential,
    now: DateTime<Utc>,
    resolver: &impl DidResolver,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
) -> VerificationResult {
    let mut result = VerificationResult::new();

    match credential.validate_structure() {
        Ok(()) => result.pass("structure"),
        Err(err) => result.fail("structure", err.to_string()),
    }

    if now < credential.issuance_date {
        result.fail("validity_window", "credential is not yet valid");
    } else if now >= credential.expiration_date {
        result.fail("validity_window", "credential is expired");
    } else {
        result.pass("validity_window");
    }

    verify_commitment_root(credential, &mut result);

    let Some(issuer_key) = resolve_key(&credential.issuer, "issuer", resolver, &mut result).await
    else {
        return result;
    };

    verify_proof(
        "issuer_signature",
        credential.proof.as_ref(),
        |header| credential.signing_input(header),
        &issuer_key,
        &get_verifier,
        &mut result,
    );

    result
}

/// Verify a presentation and every credential it carries.
///
/// The holder proof must bind `expected_challenge` and `expected_domain`, and every presented
/// credential must name the presentation's holder as its subject.
pub async fn verify_presentation<'a>(
    presentation: &VerifiablePresentation,
    expected_challenge: &str,
    expected_domain: &str,
    now: DateTime<Utc>,
    resolver: &impl DidResolver,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier> + Copy,
) -> VerificationResult {
    let mut result = VerificationResult::new();

    match presentation.validate_structure() {
        Ok(()) => result.pass("structure"),
        Err(err) => result.fail("structure", err.to_string()),
    }

    match presentation.proof.as_ref() {
        Some(proof) => {
            result.record(
                "challenge",
                proof.challenge.as_deref() == Some(expected_challenge),
                "proof does not bind the expected challenge",
            );
            result.record(
                "domain",
                proof.domain.as_deref() == Some(expected_domain),
                "proof does not bind the expected domain",
            );
        }
        None => result.fail("holder_signature", "the presentation carries no proof"),
    }

    for credential in &presentation.verifiable_credential {
        result.record(
            "credential_subject",
            credential.subject_did().ok() == Some(presentation.holder.as_str()),
            "presented credential does not belong to the holder",
        );
    }

    if let Some(holder_key) =
        resolve_key(&presentation.holder, "holder", resolver, &mut result).await
    {
        verify_proof(
            "holder_signature",
            presentation.proof.as_ref(),
            |header| presentation.signing_input(header),
            &holder_key,
            &get_verifier,
            &mut result,
        );
    }

    for credential in &presentation.verifiable_credential {
        result.merge(verify_credential(credential, now, resolver, get_verifier).await);
    }

    result
}

/// Resolve a DID to its key, checking the key-to-DID binding on the way.
///
/// Returns `None` when no usable key was obtained; the defect is already recorded.
async fn resolve_key(
    did: &str,
    role: &str,
    resolver: &impl DidResolver,
    result: &mut VerificationResult,
) -> Option<Vec<u8>> {
    let check = format!("{role}_did");

    if let Err(err) = validate_did(did) {
        result.fail(check, err.to_string());
        return None;
    }

    let document = match resolver.resolve(did).await {
        Ok(document) => document,
        Err(err) => {
            result.fail(check, err.to_string());
            return None;
        }
    };

    let key = match document.public_key_der() {
        Ok(key) => key,
        Err(err) => {
            result.fail(check, err.to_string());
            return None;
        }
    };

    if did_from_public_key(&key) != did {
        result.fail(check, "resolved key does not re-derive the DID");
        return None;
    }

    result.pass(check);
    Some(key)
}

fn verify_proof<'a>(
    check: &str,
    proof: Option<&Proof>,
    signing_input: impl FnOnce(&JwsHeader) -> Result<Vec<u8>>,
    public_key_der: &[u8],
    get_verifier: &impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
    result: &mut VerificationResult,
) {
    let Some(proof) = proof else {
        result.fail(check, "the document carries no proof");
        return;
    };

    result.record(
        format!("{check}:proof_type"),
        proof.proof_type == PROOF_TYPE_JWS,
        format!("unexpected proof type {}", proof.proof_type),
    );

    let (header, signature) = match decode_detached_jws(&proof.jws) {
        Ok(decoded) => decoded,
        Err(err) => {
            result.fail(check, err.to_string());
            return;
        }
    };

    let algorithm = match header.alg.parse::<SigningAlgorithm>() {
        Ok(algorithm) => algorithm,
        Err(err) => {
            result.fail(check, err.to_string());
            return;
        }
    };
    if algorithm.is_synthetic() {
        result.warn(format!("{check} uses the synthetic test algorithm"));
    }

    let Some(verifier) = get_verifier(algorithm) else {
        result.fail(
            check,
            format!("no signature verifier for algorithm {algorithm}"),
        );
        return;
    };

    let message = match signing_input(&header) {
        Ok(message) => message,
        Err(err) => {
            result.fail(check, err.to_string());
            return;
        }
    };

    match verifier.verify(&message, &signature, public_key_der) {
        Ok(verified) => result.record(check, verified, "signature does not verify"),
        Err(err) => result.fail(check, err.to_string()),
    }
}

fn verify_commitment_root(credential: &VerifiableCredential, result: &mut VerificationResult) {
    let mirrored = match credential.commitment_root() {
        Ok(mirrored) => mirrored,
        Err(err) => {
            result.fail("commitment_root", err.to_string());
            return;
        }
    };

    let mut commitments = Vec::new();
    for claim in credential.claims() {
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

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::TimeZone as _;
    use po_sign_utils::test_utils::{TestSigner, TestVerifier};
    use po_sign_utils::Signer as _;
    use pocommit::{generate_salt, Claim, MasterCode};
    use rand::thread_rng;
    use serde_json::json;

    use super::*;
    use crate::{did::DidDocument, error::VcError};

    /// Map-backed resolver, the test stand-in for a registry.
    struct StaticResolver(HashMap<String, DidDocument>);

    impl StaticResolver {
        fn for_signers(signers: &[&TestSigner]) -> Self {
            Self(
                signers
                    .iter()
                    .map(|signer| {
                        let document =
                            DidDocument::for_public_key(&signer.public_key_der().unwrap());
                        (document.id.clone(), document)
                    })
                    .collect(),
            )
        }
    }

    impl DidResolver for StaticResolver {
        type Err = VcError;

        async fn resolve(
            &self,
            did: &str,
        ) -> std::result::Result<DidDocument, poerror::Error<Self::Err>> {
            self.0
                .get(did)
                .cloned()
                .ok_or_else(|| poerror::Error::root(VcError::UnknownDid(did.to_owned())))
        }
    }

    fn issuer() -> TestSigner {
        TestSigner::new("vc-issuer")
    }

    fn holder() -> TestSigner {
        TestSigner::new("holder")
    }

    fn issued_credential() -> VerifiableCredential {
        let mut rng = thread_rng();
        let claims = vec![
            Claim::new("family_name", json!("Kovač"), generate_salt(&mut rng)),
            Claim::new("given_name", json!("Ana"), generate_salt(&mut rng)),
        ];
        let master_code: MasterCode = "ABCD-EFGH-JKLM-NPQR".parse().unwrap();
        let holder_did = did_from_public_key(&holder().public_key_der().unwrap());

        crate::issuer::issue(
            claims,
            &master_code,
            None,
            &holder_did,
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            &issuer(),
            &mut rng,
        )
        .unwrap()
    }

    fn presented(credential: VerifiableCredential) -> VerifiablePresentation {
        crate::holder::present(
            vec![credential],
            "nonce-123",
            "verifier.example.com",
            chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            &holder(),
        )
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
    }

    fn test_verifier(algorithm: SigningAlgorithm) -> Option<&'static dyn SignatureVerifier> {
        (algorithm == SigningAlgorithm::Test).then_some(&TestVerifier)
    }

    #[tokio::test]
    async fn test_valid_credential_verifies_with_synthetic_warning() {
        let resolver = StaticResolver::for_signers(&[&issuer()]);

        let result =
            verify_credential(&issued_credential(), now(), &resolver, test_verifier).await;

        assert!(
            result.verified(),
            "failures: {:?}",
            result.failures().collect::<Vec<_>>()
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_tampered_claim_fails_root_and_signature() {
        let resolver = StaticResolver::for_signers(&[&issuer()]);
        let mut credential = issued_credential();
        credential
            .credential_subject
            .get_mut("family_name")
            .unwrap()
            .value = json!("Horvat");

        let result = verify_credential(&credential, now(), &resolver, test_verifier).await;

        assert!(!result.verified());
        let failed: Vec<_> = result.failures().map(|check| check.name.clone()).collect();
        assert!(failed.contains(&"commitment_root".to_owned()));
        assert!(failed.contains(&"issuer_signature".to_owned()));
    }

    #[tokio::test]
    async fn test_unknown_issuer_fails() {
        let resolver = StaticResolver(HashMap::new());

        let result =
            verify_credential(&issued_credential(), now(), &resolver, test_verifier).await;

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "issuer_did"));
    }

    #[tokio::test]
    async fn test_substituted_registry_key_fails_binding() {
        let issuer_did = issued_credential().issuer;
        let mallory = DidDocument::for_public_key(
            &TestSigner::new("mallory").public_key_der().unwrap(),
        );
        let resolver = StaticResolver([(issuer_did, mallory)].into());

        let result =
            verify_credential(&issued_credential(), now(), &resolver, test_verifier).await;

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "issuer_did"
                && check.detail.as_deref() == Some("resolved key does not re-derive the DID")));
    }

    #[tokio::test]
    async fn test_expired_credential_fails() {
        let resolver = StaticResolver::for_signers(&[&issuer()]);
        let expired_at = chrono::Utc.with_ymd_and_hms(2031, 1, 1, 0, 0, 0).unwrap();

        let result =
            verify_credential(&issued_credential(), expired_at, &resolver, test_verifier).await;

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "validity_window"));
    }

    #[tokio::test]
    async fn test_valid_presentation_verifies() {
        let resolver = StaticResolver::for_signers(&[&issuer(), &holder()]);

        let result = verify_presentation(
            &presented(issued_credential()),
            "nonce-123",
            "verifier.example.com",
            now(),
            &resolver,
            test_verifier,
        )
        .await;

        assert!(
            result.verified(),
            "failures: {:?}",
            result.failures().collect::<Vec<_>>()
        );
        // One synthetic-algorithm warning per proof: the holder's and the issuer's.
        assert_eq!(result.warnings.len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_challenge_fails() {
        let resolver = StaticResolver::for_signers(&[&issuer(), &holder()]);

        let result = verify_presentation(
            &presented(issued_credential()),
            "another-nonce",
            "verifier.example.com",
            now(),
            &resolver,
            test_verifier,
        )
        .await;

        assert!(!result.verified());
        assert!(result.failures().any(|check| check.name == "challenge"));
    }

    #[tokio::test]
    async fn test_replayed_proof_fails_signature() {
        let resolver = StaticResolver::for_signers(&[&issuer(), &holder()]);
        let mut presentation = presented(issued_credential());

        // Swapping the bound challenge after signing invalidates the holder proof.
        presentation.proof.as_mut().unwrap().challenge = Some("another-nonce".to_owned());

        let result = verify_presentation(
            &presentation,
            "another-nonce",
            "verifier.example.com",
            now(),
            &resolver,
            test_verifier,
        )
        .await;

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "holder_signature"));
    }

    #[tokio::test]
    async fn test_missing_verifier_fails_closed() {
        let resolver = StaticResolver::for_signers(&[&issuer()]);

        let result =
            verify_credential(&issued_credential(), now(), &resolver, |_| None).await;

        assert!(!result.verified());
        assert!(result
            .failures()
            .any(|check| check.name == "issuer_signature"));
    }
}

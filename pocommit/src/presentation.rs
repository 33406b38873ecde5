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

//! Selective-disclosure presentations.
//!
//! A presentation carries exactly the claims a verifier requested, an inclusion proof for each
//! against the credential's commitment root, any predicate proofs, and an envelope digest that
//! binds the whole bundle to the verifier's challenge and domain.  The challenge prevents
//! replay; the domain prevents a presentation collected by one relying party from being
//! forwarded to another.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    merkle::{verify_inclusion, MerkleProof, MerkleTree},
    models::{Claim, Digest},
    predicate::PredicateProof,
    utils::digest::sha256,
    verification::VerificationResult,
    CommitError, Result,
};

/// Domain-separation prefix of the presentation envelope digest.
const ENVELOPE_DOMAIN: &str = "presentation:";

/// One disclosed claim: the opened `(name, value, salt)` triple plus its inclusion proof.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosedClaim {
    /// The opened claim.
    pub claim: Claim,
    /// Inclusion proof of the claim's commitment against the credential's root.
    pub proof: MerkleProof,
}

/// A selective-disclosure presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Presentation {
    /// Identifier of the credential being presented.
    pub credential_id: String,
    /// The credential's commitment root the proofs verify against.
    pub commitment_root: Digest,
    /// The disclosed claims, exactly those the verifier requested.
    pub disclosed: Vec<DisclosedClaim>,
    /// Predicate proofs over undisclosed claims.
    pub predicates: Vec<PredicateProof>,
    /// The verifier-supplied challenge.
    pub challenge: String,
    /// The relying party's domain the presentation is bound to.
    pub domain: String,
    /// Creation time, part of the envelope.
    pub created_at: DateTime<Utc>,
    /// The envelope digest binding all of the above.
    pub envelope: Digest,
}

/// Creates and verifies [`Presentation`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct PresentationEngine;

impl PresentationEngine {
    /// Create a presentation disclosing exactly the `requested` claims.
    ///
    /// The accumulator is rebuilt over *all* of the credential's claims, so the proofs verify
    /// against the root committed at issuance; only the requested subset is disclosed.
    ///
    /// # Errors
    ///
    ///   * [`CommitError::InvalidInput`] if `requested` and `predicates` are both empty, or a
    ///     claim fails to commit.
    ///   * [`CommitError::NotFound`] if a requested claim is not among the credential's claims.
    pub fn create(
        &self,
        credential_id: impl Into<String>,
        claims: &[Claim],
        requested: &[&str],
        predicates: Vec<PredicateProof>,
        challenge: impl Into<String>,
        domain: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Presentation> {
        if requested.is_empty() && predicates.is_empty() {
            return Err(poerror::Error::root(CommitError::InvalidInput(
                "presentation discloses nothing and proves nothing".to_owned(),
            )));
        }

        let commitments = claims
            .iter()
            .map(Claim::commitment)
            .collect::<Result<Vec<_>>>()?;
        let tree = MerkleTree::build(&commitments)?;

        let mut disclosed = Vec::with_capacity(requested.len());
        for name in requested {
            let position = claims
                .iter()
                .position(|claim| claim.name == *name)
                .ok_or_else(|| poerror::Error::root(CommitError::NotFound))?;

            disclosed.push(DisclosedClaim {
                claim: claims[position].clone(),
                proof: tree.prove_inclusion(&commitments[position])?,
            });
        }

        let credential_id = credential_id.into();
        let challenge = challenge.into();
        let domain = domain.into();
        let commitment_root = tree.root();

        let envelope = envelope_digest(
            &credential_id,
            &commitment_root,
            &disclosed,
            &predicates,
            &challenge,
            &domain,
            created_at,
        )?;

        Ok(Presentation {
            credential_id,
            commitment_root,
            disclosed,
            predicates,
            challenge,
            domain,
            created_at,
            envelope,
        })
    }

    /// Verify a presentation against the expected root, challenge and domain.
    ///
    /// Every check runs regardless of earlier failures; the returned
    /// [`VerificationResult`] lists them all.
    pub fn verify(
        &self,
        presentation: &Presentation,
        expected_root: &Digest,
        expected_challenge: &str,
        expected_domain: &str,
    ) -> VerificationResult {
        let mut result = VerificationResult::new();

        result.record(
            "commitment_root",
            presentation.commitment_root == *expected_root,
            "presentation root does not match the credential's committed root",
        );
        result.record(
            "challenge",
            presentation.challenge == expected_challenge,
            "challenge mismatch, possible replay",
        );
        result.record(
            "domain",
            presentation.domain == expected_domain,
            "presentation is bound to a different relying party",
        );

        match envelope_digest(
            &presentation.credential_id,
            &presentation.commitment_root,
            &presentation.disclosed,
            &presentation.predicates,
            &presentation.challenge,
            &presentation.domain,
            presentation.created_at,
        ) {
            Ok(envelope) => result.record(
                "envelope",
                envelope == presentation.envelope,
                "envelope digest does not recompute, bundle was altered",
            ),
            Err(err) => result.fail("envelope", err.to_string()),
        }

        for disclosed in &presentation.disclosed {
            let check = format!("claim:{}", disclosed.claim.name);
            match disclosed.claim.commitment() {
                Ok(commitment) => result.record(
                    check,
                    verify_inclusion(&commitment, &disclosed.proof, &presentation.commitment_root),
                    "inclusion proof does not verify against the root",
                ),
                Err(err) => result.fail(check, err.to_string()),
            }
        }

        for predicate in &presentation.predicates {
            result.record(
                format!("predicate:{:?}", predicate.statement),
                predicate.verify(),
                "predicate binding digest does not recompute",
            );
        }

        result
    }
}

fn envelope_digest(
    credential_id: &str,
    root: &Digest,
    disclosed: &[DisclosedClaim],
    predicates: &[PredicateProof],
    challenge: &str,
    domain: &str,
    created_at: DateTime<Utc>,
) -> Result<Digest> {
    // Disclosed commitments are sorted so the envelope does not depend on disclosure order.
    let mut commitments = disclosed
        .iter()
        .map(|disclosed| Ok(disclosed.claim.commitment()?.to_string()))
        .collect::<Result<Vec<_>>>()?;
    commitments.sort();

    let mut predicate_digests: Vec<String> = predicates
        .iter()
        .map(|predicate| predicate.proof.to_string())
        .collect();
    predicate_digests.sort();

    let input = format!(
        "{ENVELOPE_DOMAIN}{credential_id}:{root}:{}:{}:{challenge}:{domain}:{}",
        commitments.join(","),
        predicate_digests.join(","),
        created_at.timestamp(),
    );

    Ok(Digest::from(sha256(input)))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;
    use serde_json::json;

    use super::*;
    use crate::models::Salt;

    fn claims() -> Vec<Claim> {
        [
            ("family_name", json!("Kovač")),
            ("given_name", json!("Ana")),
            ("birth_date", json!("1990-05-15")),
            ("nationality", json!("HR")),
        ]
        .into_iter()
        .enumerate()
        .map(|(i, (name, value))| Claim::new(name, value, Salt::from(vec![i as u8 + 1; 16])))
        .collect()
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn root(claims: &[Claim]) -> Digest {
        let commitments: Vec<_> = claims.iter().map(|c| c.commitment().unwrap()).collect();
        MerkleTree::build(&commitments).unwrap().root()
    }

    #[test]
    fn test_create_discloses_only_requested_claims() {
        let claims = claims();

        let presentation = PresentationEngine
            .create(
                "cred-1",
                &claims,
                &["birth_date"],
                vec![],
                "challenge-1",
                "verifier.example",
                created_at(),
            )
            .unwrap();

        assert_eq!(presentation.disclosed.len(), 1);
        assert_eq!(presentation.disclosed[0].claim.name, "birth_date");
    }

    #[test]
    fn test_round_trip_verifies() {
        let claims = claims();

        let presentation = PresentationEngine
            .create(
                "cred-1",
                &claims,
                &["family_name", "birth_date"],
                vec![],
                "challenge-1",
                "verifier.example",
                created_at(),
            )
            .unwrap();

        let result = PresentationEngine.verify(
            &presentation,
            &root(&claims),
            "challenge-1",
            "verifier.example",
        );

        assert!(result.verified(), "failures: {:?}", result.failures().collect::<Vec<_>>());
    }

    #[test]
    fn test_unknown_claim_not_found() {
        let err = PresentationEngine
            .create(
                "cred-1",
                &claims(),
                &["passport_number"],
                vec![],
                "c",
                "d",
                created_at(),
            )
            .unwrap_err();

        assert_matches!(err.error, CommitError::NotFound);
    }

    #[test]
    fn test_empty_presentation_rejected() {
        let err = PresentationEngine
            .create("cred-1", &claims(), &[], vec![], "c", "d", created_at())
            .unwrap_err();

        assert_matches!(err.error, CommitError::InvalidInput(_));
    }

    #[test]
    fn test_tampered_value_fails_and_reports_all_defects() {
        let claims = claims();

        let mut presentation = PresentationEngine
            .create(
                "cred-1",
                &claims,
                &["birth_date", "nationality"],
                vec![],
                "challenge-1",
                "verifier.example",
                created_at(),
            )
            .unwrap();

        presentation.disclosed[0].claim.value = json!("2010-05-15");

        let result = PresentationEngine.verify(
            &presentation,
            &root(&claims),
            "challenge-1",
            "verifier.example",
        );

        assert!(!result.verified());
        // Both the altered claim and the stale envelope must be reported.
        let failed: Vec<_> = result.failures().map(|check| check.name.as_str()).collect();
        assert!(failed.contains(&"claim:birth_date"));
        assert!(failed.contains(&"envelope"));
    }

    #[test]
    fn test_wrong_challenge_or_domain_fails() {
        let claims = claims();

        let presentation = PresentationEngine
            .create(
                "cred-1",
                &claims,
                &["birth_date"],
                vec![],
                "challenge-1",
                "verifier.example",
                created_at(),
            )
            .unwrap();

        let result =
            PresentationEngine.verify(&presentation, &root(&claims), "other", "verifier.example");
        assert!(!result.verified());

        let result =
            PresentationEngine.verify(&presentation, &root(&claims), "challenge-1", "other.example");
        assert!(!result.verified());
    }

    #[test]
    fn test_predicate_only_presentation() {
        let claims = claims();

        let predicate = PredicateProof::age_over(
            18,
            "1990-05-15".parse().unwrap(),
            created_at(),
            "nonce-1".into(),
        );

        let presentation = PresentationEngine
            .create(
                "cred-1",
                &claims,
                &[],
                vec![predicate],
                "challenge-1",
                "verifier.example",
                created_at(),
            )
            .unwrap();

        assert!(presentation.disclosed.is_empty());

        let result = PresentationEngine.verify(
            &presentation,
            &root(&claims),
            "challenge-1",
            "verifier.example",
        );
        assert!(result.verified());
    }
}

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

//! Issuance of PID credentials.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use po_sign_utils::Signer;
use pocommit::{Claim, MasterCode, MerkleTree, TrustCode};
use poerror::traits::{ForeignBoxed as _, ForeignError as _, PropagateError as _};
use rand::Rng;

use crate::{
    error::PidError,
    models::{
        encode_detached_jws, JwsHeader, Pid, Proof, SubjectEntry, CONTEXT_CREDENTIALS,
        CONTEXT_PID, MANDATORY_CLAIMS, PROOF_TYPE_JWS, SUBJECT_COMMITMENT_ROOT,
        SUBJECT_MASTER_CODE, SUBJECT_TRUST_CODE, TYPE_PID, TYPE_VERIFIABLE_CREDENTIAL,
    },
    Result,
};

/// Issue a PID credential over the given claims.
///
/// The identity tokens are committed under fresh salts alongside the subject claims; the
/// resulting commitment root is mirrored unsalted in the credential subject and covered by the
/// detached-JWS proof produced by the external `signer`.
///
/// # Errors
///
///   * [`PidError::MissingClaim`] if a mandatory claim is absent from `claims`.
///   * [`PidError::InvalidInput`] if a claim fails to commit.
///   * [`PidError::SignerUnavailable`] if the signing backend fails.
#[allow(clippy::too_many_arguments)]
pub fn issue<R: Rng + ?Sized>(
    claims: Vec<Claim>,
    master_code: &MasterCode,
    trust_code: Option<&TrustCode>,
    issuer: impl Into<String>,
    issuance_date: DateTime<Utc>,
    expiration_date: DateTime<Utc>,
    signer: &dyn Signer,
    rng: &mut R,
) -> Result<Pid> {
    for claim in MANDATORY_CLAIMS {
        if !claims.iter().any(|c| c.name == *claim) {
            return Err(poerror::Error::root(PidError::MissingClaim(
                (*claim).to_owned(),
            )));
        }
    }
    if expiration_date <= issuance_date {
        return Err(poerror::Error::root(PidError::InvalidInput(
            "expiration date must be later than issuance date".to_owned(),
        )));
    }

    let mut all_claims = claims;
    all_claims.push(Claim::new(
        SUBJECT_MASTER_CODE,
        serde_json::Value::String(master_code.to_string()),
        pocommit::generate_salt(rng),
    ));
    if let Some(trust_code) = trust_code {
        let value = serde_json::to_value(trust_code)
            .foreign_err(|| PidError::InvalidInput("unserializable TrustCode".to_owned()))?;
        all_claims.push(Claim::new(
            SUBJECT_TRUST_CODE,
            value,
            pocommit::generate_salt(rng),
        ));
    }

    let commitments = all_claims
        .iter()
        .map(|claim| {
            claim
                .commitment()
                .with_err(|| PidError::InvalidInput(format!("claim {}", claim.name)))
        })
        .collect::<Result<Vec<_>>>()?;
    let commitment_root = MerkleTree::build(&commitments)
        .with_err(|| PidError::InvalidInput("empty claim set".to_owned()))?
        .root();

    let mut credential_subject: BTreeMap<String, SubjectEntry> = all_claims
        .into_iter()
        .map(|claim| (claim.name, SubjectEntry::salted(claim.value, claim.salt)))
        .collect();
    credential_subject.insert(
        SUBJECT_COMMITMENT_ROOT.to_owned(),
        SubjectEntry::unsalted(serde_json::Value::String(commitment_root.to_string())),
    );

    let mut pid = Pid {
        context: vec![CONTEXT_CREDENTIALS.to_owned(), CONTEXT_PID.to_owned()],
        types: vec![TYPE_VERIFIABLE_CREDENTIAL.to_owned(), TYPE_PID.to_owned()],
        issuer: issuer.into(),
        issuance_date,
        expiration_date,
        credential_subject,
        proof: None,
    };

    let header = JwsHeader::new(signer.algorithm().to_string());
    let signing_input = pid.signing_input(&header)?;
    let signature = signer
        .sign(&signing_input)
        .foreign_boxed_err(|| PidError::SignerUnavailable)?;

    pid.proof = Some(Proof {
        proof_type: PROOF_TYPE_JWS.to_owned(),
        created: issuance_date,
        verification_method: signer.key_label().to_owned(),
        jws: encode_detached_jws(&header, &signature)?,
    });

    Ok(pid)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone as _;
    use po_sign_utils::test_utils::{TestSigner, UnavailableSigner};
    use pocommit::generate_salt;
    use rand::thread_rng;
    use serde_json::json;

    use super::*;

    fn pid_claims() -> Vec<Claim> {
        let mut rng = thread_rng();
        [
            ("family_name", json!("Kovač")),
            ("given_name", json!("Ana")),
            ("birth_date", json!("1990-05-15")),
            ("nationality", json!("HR")),
        ]
        .into_iter()
        .map(|(name, value)| Claim::new(name, value, generate_salt(&mut rng)))
        .collect()
    }

    fn master_code() -> MasterCode {
        "ABCD-EFGH-JKLM-NPQR".parse().unwrap()
    }

    fn dates() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_issue_builds_conformant_credential() {
        let (issued, expires) = dates();

        let pid = issue(
            pid_claims(),
            &master_code(),
            None,
            "did:example:issuer",
            issued,
            expires,
            &TestSigner::new("pid-issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        assert_matches!(pid.validate_structure(), Ok(_));
        assert!(pid.context.contains(&CONTEXT_PID.to_owned()));
        assert!(pid.types.contains(&TYPE_PID.to_owned()));

        // The mirrored root matches the accumulator over the salted claims.
        let commitments: Vec<_> = pid
            .claims()
            .iter()
            .map(|claim| claim.commitment().unwrap())
            .collect();
        let root = MerkleTree::build(&commitments).unwrap().root();
        assert_eq!(pid.commitment_root().unwrap(), root);

        let proof = pid.proof.as_ref().unwrap();
        assert_eq!(proof.proof_type, PROOF_TYPE_JWS);
        assert_eq!(proof.verification_method, "pid-issuer");
    }

    #[test]
    fn test_json_round_trip() {
        let (issued, expires) = dates();

        let pid = issue(
            pid_claims(),
            &master_code(),
            None,
            "did:example:issuer",
            issued,
            expires,
            &TestSigner::new("pid-issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let json = pid.to_json().unwrap();
        let decoded = Pid::from_json(&json).unwrap();

        assert_eq!(decoded, pid);
    }

    #[test]
    fn test_missing_mandatory_claim_rejected() {
        let (issued, expires) = dates();
        let claims = pid_claims()
            .into_iter()
            .filter(|claim| claim.name != "birth_date")
            .collect();

        let err = issue(
            claims,
            &master_code(),
            None,
            "did:example:issuer",
            issued,
            expires,
            &TestSigner::new("pid-issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, PidError::MissingClaim(claim) if claim == "birth_date");
    }

    #[test]
    fn test_inverted_validity_rejected() {
        let (issued, _) = dates();

        let err = issue(
            pid_claims(),
            &master_code(),
            None,
            "did:example:issuer",
            issued,
            issued,
            &TestSigner::new("pid-issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, PidError::InvalidInput(_));
    }

    #[test]
    fn test_unavailable_signer_fails_closed() {
        let (issued, expires) = dates();

        let err = issue(
            pid_claims(),
            &master_code(),
            None,
            "did:example:issuer",
            issued,
            expires,
            &UnavailableSigner,
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_eq!(err.error, PidError::SignerUnavailable);
    }
}

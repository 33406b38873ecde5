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

//! Issuance of W3C verifiable credentials.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use po_sign_utils::Signer;
use pocommit::{Claim, MasterCode, MerkleTree, TrustCode};
use poerror::traits::{ForeignBoxed as _, ForeignError as _, PropagateError as _};
use rand::Rng;

use crate::{
    did::{did_from_public_key, validate_did},
    error::VcError,
    models::{
        encode_detached_jws, JwsHeader, Proof, SubjectEntry, VerifiableCredential,
        CONTEXT_CREDENTIALS, PROOF_TYPE_JWS, SUBJECT_COMMITMENT_ROOT, SUBJECT_ID,
        SUBJECT_MASTER_CODE, SUBJECT_TRUST_CODE, TYPE_POCKETONE_CREDENTIAL,
        TYPE_VERIFIABLE_CREDENTIAL,
    },
    Result,
};

/// Issue a verifiable credential over the given claims.
///
/// The issuer DID is derived from the `signer`'s public key; the `holder_did` lands unsalted in
/// the credential subject.  The identity tokens are committed under fresh salts alongside the
/// subject claims; the resulting commitment root is mirrored unsalted in the subject and covered
/// by the detached-JWS proof.
///
/// # Errors
///
///   * [`VcError::InvalidDid`] if `holder_did` is not a well-formed `did:pkt` identifier.
///   * [`VcError::InvalidInput`] if the validity interval is inverted, a claim name collides
///     with a reserved subject entry, or a claim fails to commit.
///   * [`VcError::SignerUnavailable`] if the signing backend fails.
#[allow(clippy::too_many_arguments)]
pub fn issue<R: Rng + ?Sized>(
    claims: Vec<Claim>,
    master_code: &MasterCode,
    trust_code: Option<&TrustCode>,
    holder_did: &str,
    issuance_date: DateTime<Utc>,
    expiration_date: DateTime<Utc>,
    signer: &dyn Signer,
    rng: &mut R,
) -> Result<VerifiableCredential> {
    validate_did(holder_did)?;
    if expiration_date <= issuance_date {
        return Err(poerror::Error::root(VcError::InvalidInput(
            "expiration date must be later than issuance date".to_owned(),
        )));
    }

    let reserved = [
        SUBJECT_ID,
        SUBJECT_MASTER_CODE,
        SUBJECT_TRUST_CODE,
        SUBJECT_COMMITMENT_ROOT,
    ];
    if let Some(claim) = claims
        .iter()
        .find(|claim| reserved.contains(&claim.name.as_str()))
    {
        return Err(poerror::Error::root(VcError::InvalidInput(format!(
            "claim name {} is reserved",
            claim.name
        ))));
    }

    let mut all_claims = claims;
    all_claims.push(Claim::new(
        SUBJECT_MASTER_CODE,
        serde_json::Value::String(master_code.to_string()),
        pocommit::generate_salt(rng),
    ));
    if let Some(trust_code) = trust_code {
        let value = serde_json::to_value(trust_code)
            .foreign_err(|| VcError::InvalidInput("unserializable TrustCode".to_owned()))?;
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
                .with_err(|| VcError::InvalidInput(format!("claim {}", claim.name)))
        })
        .collect::<Result<Vec<_>>>()?;
    let commitment_root = MerkleTree::build(&commitments)
        .with_err(|| VcError::InvalidInput("empty claim set".to_owned()))?
        .root();

    let mut credential_subject: BTreeMap<String, SubjectEntry> = all_claims
        .into_iter()
        .map(|claim| (claim.name, SubjectEntry::salted(claim.value, claim.salt)))
        .collect();
    credential_subject.insert(
        SUBJECT_ID.to_owned(),
        SubjectEntry::unsalted(serde_json::Value::String(holder_did.to_owned())),
    );
    credential_subject.insert(
        SUBJECT_COMMITMENT_ROOT.to_owned(),
        SubjectEntry::unsalted(serde_json::Value::String(commitment_root.to_string())),
    );

    let issuer_key = signer
        .public_key_der()
        .foreign_boxed_err(|| VcError::SignerUnavailable)?;
    let issuer_did = did_from_public_key(&issuer_key);

    let mut credential = VerifiableCredential {
        context: vec![CONTEXT_CREDENTIALS.to_owned()],
        types: vec![
            TYPE_VERIFIABLE_CREDENTIAL.to_owned(),
            TYPE_POCKETONE_CREDENTIAL.to_owned(),
        ],
        issuer: issuer_did.clone(),
        issuance_date,
        expiration_date,
        credential_subject,
        proof: None,
    };

    let header = JwsHeader::new(signer.algorithm().to_string());
    let signing_input = credential.signing_input(&header)?;
    let signature = signer
        .sign(&signing_input)
        .foreign_boxed_err(|| VcError::SignerUnavailable)?;

    credential.proof = Some(Proof {
        proof_type: PROOF_TYPE_JWS.to_owned(),
        created: issuance_date,
        verification_method: format!("{issuer_did}#key-1"),
        challenge: None,
        domain: None,
        jws: encode_detached_jws(&header, &signature)?,
    });

    Ok(credential)
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

    fn vc_claims() -> Vec<Claim> {
        let mut rng = thread_rng();
        [
            ("family_name", json!("Kovač")),
            ("given_name", json!("Ana")),
            ("birth_date", json!("1990-05-15")),
        ]
        .into_iter()
        .map(|(name, value)| Claim::new(name, value, generate_salt(&mut rng)))
        .collect()
    }

    fn master_code() -> MasterCode {
        "ABCD-EFGH-JKLM-NPQR".parse().unwrap()
    }

    fn holder_did() -> String {
        did_from_public_key(
            &TestSigner::new("holder").public_key_der().unwrap(),
        )
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
        let signer = TestSigner::new("vc-issuer");

        let credential = issue(
            vc_claims(),
            &master_code(),
            None,
            &holder_did(),
            issued,
            expires,
            &signer,
            &mut thread_rng(),
        )
        .unwrap();

        assert_matches!(credential.validate_structure(), Ok(_));
        assert_eq!(credential.subject_did().unwrap(), holder_did());
        assert_eq!(
            credential.issuer,
            did_from_public_key(&signer.public_key_der().unwrap())
        );

        // The mirrored root matches the accumulator over the salted claims.
        let commitments: Vec<_> = credential
            .claims()
            .iter()
            .map(|claim| claim.commitment().unwrap())
            .collect();
        let root = MerkleTree::build(&commitments).unwrap().root();
        assert_eq!(credential.commitment_root().unwrap(), root);

        let proof = credential.proof.as_ref().unwrap();
        assert_eq!(proof.proof_type, PROOF_TYPE_JWS);
        assert_eq!(
            proof.verification_method,
            format!("{}#key-1", credential.issuer)
        );
    }

    #[test]
    fn test_json_round_trip() {
        let (issued, expires) = dates();

        let credential = issue(
            vc_claims(),
            &master_code(),
            None,
            &holder_did(),
            issued,
            expires,
            &TestSigner::new("vc-issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let json = credential.to_json().unwrap();
        let decoded = VerifiableCredential::from_json(&json).unwrap();

        assert_eq!(decoded, credential);
    }

    #[test]
    fn test_malformed_holder_did_rejected() {
        let (issued, expires) = dates();

        let err = issue(
            vc_claims(),
            &master_code(),
            None,
            "did:web:example.com",
            issued,
            expires,
            &TestSigner::new("vc-issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, VcError::InvalidDid(_));
    }

    #[test]
    fn test_reserved_claim_name_rejected() {
        let (issued, expires) = dates();
        let mut poisoned = vc_claims();
        poisoned.push(Claim::new(
            SUBJECT_ID,
            json!("did:pkt:0000000000000000000000000000000000000000"),
            generate_salt(&mut thread_rng()),
        ));

        let err = issue(
            poisoned,
            &master_code(),
            None,
            &holder_did(),
            issued,
            expires,
            &TestSigner::new("vc-issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, VcError::InvalidInput(message) if message.contains("reserved"));
    }

    #[test]
    fn test_unavailable_signer_fails_closed() {
        let (issued, expires) = dates();

        let err = issue(
            vc_claims(),
            &master_code(),
            None,
            &holder_did(),
            issued,
            expires,
            &UnavailableSigner,
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_eq!(err.error, VcError::SignerUnavailable);
    }
}

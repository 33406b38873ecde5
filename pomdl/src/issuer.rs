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

//! Issuance of mDL documents.

use std::collections::BTreeMap;

use pocommit::{Claim, MasterCode, MerkleTree, TrustCode};
use po_sign_utils::Signer;
use poerror::traits::{ForeignError as _, PropagateError as _};
use rand::Rng;

use crate::{
    error::MdlError,
    issuer_auth::IssuerAuth,
    models::{
        DataItem, Mdl, SecurityObject, ValidityInfo, DIGEST_ALGORITHM_SHA256,
        ELEMENT_COMMITMENT_ROOT, ELEMENT_MASTER_CODE, ELEMENT_TRUST_CODE, MANDATORY_ELEMENTS,
        MDL_DOC_TYPE, MDL_NAMESPACE, POCKETONE_NAMESPACE, SECURITY_OBJECT_VERSION,
    },
    Result,
};

/// Issue an mDL document over the given claims.
///
/// The `mdl_claims` populate the [`MDL_NAMESPACE`]; the identity tokens are committed under
/// fresh salts into the [`POCKETONE_NAMESPACE`].  All salted claims feed the commitment
/// accumulator, whose root is signed inside the [`SecurityObject`] by the external `signer`.
///
/// # Errors
///
///   * [`MdlError::MissingElement`] if a mandatory data element is absent from `mdl_claims`.
///   * [`MdlError::InvalidInput`] if a claim fails to commit.
///   * [`MdlError::SignerUnavailable`] if the signing backend fails.
pub fn issue<R: Rng + ?Sized>(
    mdl_claims: Vec<Claim>,
    master_code: &MasterCode,
    trust_code: Option<&TrustCode>,
    validity: ValidityInfo,
    signer: &dyn Signer,
    rng: &mut R,
) -> Result<Mdl> {
    for element in MANDATORY_ELEMENTS {
        if !mdl_claims.iter().any(|claim| claim.name == *element) {
            return Err(poerror::Error::root(MdlError::MissingElement(
                (*element).to_owned(),
            )));
        }
    }

    let mut pocketone_claims = vec![Claim::new(
        ELEMENT_MASTER_CODE,
        serde_json::Value::String(master_code.to_string()),
        pocommit::generate_salt(rng),
    )];
    if let Some(trust_code) = trust_code {
        let value = serde_json::to_value(trust_code)
            .foreign_err(|| MdlError::InvalidInput("unserializable TrustCode".to_owned()))?;
        pocketone_claims.push(Claim::new(
            ELEMENT_TRUST_CODE,
            value,
            pocommit::generate_salt(rng),
        ));
    }

    let commit_claims = |claims: &[Claim]| -> Result<BTreeMap<String, pocommit::Digest>> {
        claims
            .iter()
            .map(|claim| {
                let commitment = claim
                    .commitment()
                    .with_err(|| MdlError::InvalidInput(format!("claim {}", claim.name)))?;
                Ok((claim.name.clone(), commitment))
            })
            .collect()
    };

    let mdl_commitments = commit_claims(&mdl_claims)?;
    let pocketone_commitments = commit_claims(&pocketone_claims)?;

    let all_commitments: Vec<_> = mdl_commitments
        .values()
        .chain(pocketone_commitments.values())
        .copied()
        .collect();
    let commitment_root = MerkleTree::build(&all_commitments)
        .with_err(|| MdlError::InvalidInput("empty claim set".to_owned()))?
        .root();

    let security_object = SecurityObject {
        version: SECURITY_OBJECT_VERSION.to_owned(),
        digest_algorithm: DIGEST_ALGORITHM_SHA256.to_owned(),
        doc_type: MDL_DOC_TYPE.to_owned(),
        claim_commitments: [
            (MDL_NAMESPACE.to_owned(), mdl_commitments),
            (POCKETONE_NAMESPACE.to_owned(), pocketone_commitments),
        ]
        .into(),
        commitment_root,
        validity_info: validity,
    };

    let issuer_auth = IssuerAuth::sign(&security_object, signer)?;

    let to_items = |claims: Vec<Claim>| -> BTreeMap<String, DataItem> {
        claims
            .into_iter()
            .map(|claim| (claim.name, DataItem::salted(claim.value, claim.salt)))
            .collect()
    };

    let mut pocketone_items = to_items(pocketone_claims);
    pocketone_items.insert(
        ELEMENT_COMMITMENT_ROOT.to_owned(),
        DataItem::unsalted(serde_json::Value::String(commitment_root.to_string())),
    );

    Ok(Mdl {
        doc_type: MDL_DOC_TYPE.to_owned(),
        name_spaces: [
            (MDL_NAMESPACE.to_owned(), to_items(mdl_claims)),
            (POCKETONE_NAMESPACE.to_owned(), pocketone_items),
        ]
        .into(),
        issuer_auth,
    })
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

    fn mdl_claims() -> Vec<Claim> {
        let mut rng = thread_rng();
        [
            ("family_name", json!("Kovač")),
            ("given_name", json!("Ana")),
            ("birth_date", json!("1990-05-15")),
            ("document_number", json!("HR1234567")),
            ("issue_date", json!("2025-01-01")),
            ("expiry_date", json!("2030-01-01")),
            ("issuing_authority", json!("MUP RH")),
            ("issuing_country", json!("HR")),
        ]
        .into_iter()
        .map(|(name, value)| Claim::new(name, value, generate_salt(&mut rng)))
        .collect()
    }

    fn validity() -> ValidityInfo {
        ValidityInfo::new(
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
        )
        .unwrap()
    }

    fn master_code() -> MasterCode {
        "ABCD-EFGH-JKLM-NPQR".parse().unwrap()
    }

    #[test]
    fn test_issue_builds_conformant_document() {
        let mdl = issue(
            mdl_claims(),
            &master_code(),
            None,
            validity(),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        assert_eq!(mdl.doc_type, MDL_DOC_TYPE);
        assert_matches!(mdl.validate_structure(), Ok(_));

        // The signed root matches the accumulator over the document's salted claims.
        let commitments: Vec<_> = mdl
            .claims()
            .iter()
            .map(|claim| claim.commitment().unwrap())
            .collect();
        let root = MerkleTree::build(&commitments).unwrap().root();
        assert_eq!(mdl.commitment_root().unwrap(), root);

        // The mirrored root matches the signed one.
        let mirror = mdl
            .element(POCKETONE_NAMESPACE, ELEMENT_COMMITMENT_ROOT)
            .unwrap();
        assert_eq!(mirror.value, json!(root.to_string()));
        assert!(mirror.salt.is_none());
    }

    #[test]
    fn test_issue_commits_identity_tokens() {
        let trust_code = TrustCode::derive(
            &master_code(),
            "hotel-checkin",
            chrono::Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let mdl = issue(
            mdl_claims(),
            &master_code(),
            Some(&trust_code),
            validity(),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let master = mdl.element(POCKETONE_NAMESPACE, ELEMENT_MASTER_CODE).unwrap();
        assert_eq!(master.value, json!(master_code().to_string()));
        assert!(master.salt.is_some());

        let trust = mdl.element(POCKETONE_NAMESPACE, ELEMENT_TRUST_CODE).unwrap();
        assert_eq!(trust.value, serde_json::to_value(&trust_code).unwrap());
    }

    #[test]
    fn test_missing_mandatory_claim_rejected() {
        let claims = mdl_claims()
            .into_iter()
            .filter(|claim| claim.name != "family_name")
            .collect();

        let err = issue(
            claims,
            &master_code(),
            None,
            validity(),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, MdlError::MissingElement(element) if element == "family_name");
    }

    #[test]
    fn test_unavailable_signer_fails_closed() {
        let err = issue(
            mdl_claims(),
            &master_code(),
            None,
            validity(),
            &UnavailableSigner,
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_eq!(err.error, MdlError::SignerUnavailable);
    }

    #[test]
    fn test_cbor_round_trip() {
        let mdl = issue(
            mdl_claims(),
            &master_code(),
            None,
            validity(),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let bytes = mdl.to_cbor().unwrap();
        let decoded = Mdl::from_cbor(&bytes).unwrap();

        assert_eq!(decoded, mdl);
        // Deterministic encoding: re-encoding reproduces the exact bytes.
        assert_eq!(decoded.to_cbor().unwrap(), bytes);
    }

    #[test]
    fn test_decode_rejects_missing_mandatory_element() {
        let mut mdl = issue(
            mdl_claims(),
            &master_code(),
            None,
            validity(),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        mdl.name_spaces
            .get_mut(MDL_NAMESPACE)
            .unwrap()
            .remove("family_name");
        let bytes = mdl.to_cbor().unwrap();

        let err = Mdl::from_cbor(&bytes).unwrap_err();

        assert_matches!(err.error, MdlError::MissingElement(element) if element == "family_name");
    }
}

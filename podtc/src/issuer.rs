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

//! Issuance of Digital Travel Credentials.

use std::collections::BTreeMap;

use po_sign_utils::Signer;
use pocommit::{Claim, MasterCode, MerkleTree, TrustCode};
use poerror::traits::{ForeignError as _, PropagateError as _};
use rand::Rng;

use crate::{
    cms::CmsEnvelope,
    error::DtcError,
    models::{
        ClaimEntry, DataGroup, Dtc, Sod, DG_FACE_IMAGE, DG_MRZ, DG_POCKETONE,
        ENTRY_COMMITMENT_ROOT, ENTRY_MASTER_CODE, ENTRY_TRUST_CODE,
    },
    mrz::Mrz,
    Result,
};

/// Issue a Digital Travel Credential.
///
/// DG1 carries the encoded `mrz`, DG2 the `face_image` and DG13 the salted `claims` together
/// with the identity tokens, committed under fresh salts.  The commitment root over all salted
/// DG13 entries is mirrored unsalted in DG13 and the SOD over every data group is signed by the
/// external `signer` inside a CMS-shaped envelope.
///
/// # Errors
///
///   * [`DtcError::InvalidInput`] if the MRZ fields are not encodable, the face image is empty,
///     or a claim name collides with a reserved DG13 entry.
///   * [`DtcError::SignerUnavailable`] if the signing backend fails.
pub fn issue<R: Rng + ?Sized>(
    mrz: &Mrz,
    face_image: &[u8],
    claims: Vec<Claim>,
    master_code: &MasterCode,
    trust_code: Option<&TrustCode>,
    signer: &dyn Signer,
    rng: &mut R,
) -> Result<Dtc> {
    if face_image.is_empty() {
        return Err(poerror::Error::root(DtcError::InvalidInput(
            "the face image must not be empty".to_owned(),
        )));
    }

    let reserved = [ENTRY_MASTER_CODE, ENTRY_TRUST_CODE, ENTRY_COMMITMENT_ROOT];
    if let Some(claim) = claims
        .iter()
        .find(|claim| reserved.contains(&claim.name.as_str()))
    {
        return Err(poerror::Error::root(DtcError::InvalidInput(format!(
            "claim name {} is reserved",
            claim.name
        ))));
    }

    let mut dg13_claims = claims;
    dg13_claims.push(Claim::new(
        ENTRY_MASTER_CODE,
        serde_json::Value::String(master_code.to_string()),
        pocommit::generate_salt(rng),
    ));
    if let Some(trust_code) = trust_code {
        let value = serde_json::to_value(trust_code)
            .foreign_err(|| DtcError::InvalidInput("unserializable TrustCode".to_owned()))?;
        dg13_claims.push(Claim::new(
            ENTRY_TRUST_CODE,
            value,
            pocommit::generate_salt(rng),
        ));
    }

    let commitments = dg13_claims
        .iter()
        .map(|claim| {
            claim
                .commitment()
                .with_err(|| DtcError::InvalidInput(format!("claim {}", claim.name)))
        })
        .collect::<Result<Vec<_>>>()?;
    let commitment_root = MerkleTree::build(&commitments)
        .with_err(|| DtcError::InvalidInput("empty claim set".to_owned()))?
        .root();

    let mut entries: BTreeMap<String, ClaimEntry> = dg13_claims
        .into_iter()
        .map(|claim| (claim.name, ClaimEntry::salted(claim.value, claim.salt)))
        .collect();
    entries.insert(
        ENTRY_COMMITMENT_ROOT.to_owned(),
        ClaimEntry::unsalted(serde_json::Value::String(commitment_root.to_string())),
    );

    let [line1, line2] = mrz.encode()?;
    let data_groups: BTreeMap<u8, DataGroup> = [
        (DG_MRZ, DataGroup::Mrz { line1, line2 }),
        (DG_FACE_IMAGE, DataGroup::binary(face_image)),
        (DG_POCKETONE, DataGroup::Claims { entries }),
    ]
    .into();

    let sod = Sod::compute(&data_groups)?;
    let envelope = CmsEnvelope::sign(sod, signer)?;

    Ok(Dtc {
        data_groups,
        envelope,
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

    fn mrz() -> Mrz {
        Mrz {
            issuing_state: "HRV".to_owned(),
            name: "KOVAC<<ANA".to_owned(),
            document_number: "HR1234567".to_owned(),
            nationality: "HRV".to_owned(),
            birth_date: "900515".to_owned(),
            sex: 'F',
            expiry_date: "300101".to_owned(),
            personal_number: "".to_owned(),
        }
    }

    fn claims() -> Vec<Claim> {
        let mut rng = thread_rng();
        vec![
            Claim::new("family_name", json!("Kovač"), generate_salt(&mut rng)),
            Claim::new("given_name", json!("Ana"), generate_salt(&mut rng)),
        ]
    }

    fn master_code() -> MasterCode {
        "ABCD-EFGH-JKLM-NPQR".parse().unwrap()
    }

    #[test]
    fn test_issue_builds_conformant_credential() {
        let dtc = issue(
            &mrz(),
            b"face-image",
            claims(),
            &master_code(),
            None,
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        assert_matches!(dtc.validate_structure(), Ok(_));
        assert_eq!(dtc.mrz().unwrap(), mrz());

        // The SOD covers all three data groups and matches their recomputed digests.
        assert_eq!(dtc.envelope.content.digests.len(), 3);
        for (number, group) in &dtc.data_groups {
            assert_eq!(
                dtc.envelope.content.digests.get(number).unwrap(),
                &group.digest().unwrap()
            );
        }

        // The mirrored root matches the accumulator over the salted DG13 claims.
        let commitments: Vec<_> = dtc
            .claims()
            .iter()
            .map(|claim| claim.commitment().unwrap())
            .collect();
        let root = MerkleTree::build(&commitments).unwrap().root();
        assert_eq!(dtc.commitment_root().unwrap(), root);
    }

    #[test]
    fn test_issue_commits_identity_tokens() {
        let trust_code = TrustCode::derive(
            &master_code(),
            "border-crossing",
            chrono::Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap(),
        )
        .unwrap();

        let dtc = issue(
            &mrz(),
            b"face-image",
            claims(),
            &master_code(),
            Some(&trust_code),
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let DataGroup::Claims { entries } = dtc.data_groups.get(&DG_POCKETONE).unwrap() else {
            panic!("DG13 must carry claims");
        };

        let master = entries.get(ENTRY_MASTER_CODE).unwrap();
        assert_eq!(master.value, json!(master_code().to_string()));
        assert!(master.salt.is_some());

        let trust = entries.get(ENTRY_TRUST_CODE).unwrap();
        assert_eq!(trust.value, serde_json::to_value(&trust_code).unwrap());
        assert!(trust.salt.is_some());
    }

    #[test]
    fn test_empty_face_image_rejected() {
        let err = issue(
            &mrz(),
            b"",
            claims(),
            &master_code(),
            None,
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, DtcError::InvalidInput(_));
    }

    #[test]
    fn test_reserved_claim_name_rejected() {
        let mut poisoned = claims();
        poisoned.push(Claim::new(
            ENTRY_COMMITMENT_ROOT,
            json!("not-a-root"),
            generate_salt(&mut thread_rng()),
        ));

        let err = issue(
            &mrz(),
            b"face-image",
            poisoned,
            &master_code(),
            None,
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_matches!(err.error, DtcError::InvalidInput(message) if message.contains("reserved"));
    }

    #[test]
    fn test_unavailable_signer_fails_closed() {
        let err = issue(
            &mrz(),
            b"face-image",
            claims(),
            &master_code(),
            None,
            &UnavailableSigner,
            &mut thread_rng(),
        )
        .unwrap_err();

        assert_eq!(err.error, DtcError::SignerUnavailable);
    }

    #[test]
    fn test_cbor_round_trip() {
        let dtc = issue(
            &mrz(),
            b"face-image",
            claims(),
            &master_code(),
            None,
            &TestSigner::new("issuer"),
            &mut thread_rng(),
        )
        .unwrap();

        let bytes = dtc.to_cbor().unwrap();
        let decoded = Dtc::from_cbor(&bytes).unwrap();

        assert_eq!(decoded, dtc);
        // Deterministic encoding: re-encoding reproduces the exact bytes.
        assert_eq!(decoded.to_cbor().unwrap(), bytes);
    }
}

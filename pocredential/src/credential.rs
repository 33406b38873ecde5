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

//! The unified credential surface over the four supported standards.

use chrono::{DateTime, Utc};
use po_sign_utils::{SignatureVerifier, SigningAlgorithm};
use pocommit::{Claim, Digest, VerificationResult};
use poerror::traits::PropagateError as _;
use povc::DidResolver;
use serde::{Deserialize, Serialize};

use crate::{error::CredentialError, Result};

/// The credential standard a [`Credential`] conforms to.
#[derive(
    strum_macros::Display, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// ISO/IEC 18013-5 mobile driving licence.
    #[strum(to_string = "mdl")]
    Mdl,
    /// eIDAS2 person identification data.
    #[strum(to_string = "pid")]
    Pid,
    /// ICAO Digital Travel Credential.
    #[strum(to_string = "dtc")]
    Dtc,
    /// W3C verifiable credential.
    #[strum(to_string = "vc")]
    Vc,
}

/// Inputs a [`Credential::verify`] call may need, beyond the credential itself.
///
/// Each standard consumes the fields relevant to it: the PID path checks `trusted_issuers` and
/// verifies against `issuer_public_key_der`, the VC path resolves DIDs through `resolver`, and
/// every time-bound standard compares against `now`.
pub struct VerificationContext<'a, R> {
    /// The verification timestamp.
    pub now: DateTime<Utc>,
    /// Issuer identifiers the caller trusts (PID).
    pub trusted_issuers: &'a [&'a str],
    /// The DER-encoded public key of the expected PID issuer.
    pub issuer_public_key_der: &'a [u8],
    /// The DID resolver (VC).
    pub resolver: &'a R,
}

/// A held credential in any of the supported standards.
///
/// The wrapper is what the external encrypted repository stores; the discriminant travels with
/// the serialized form so decoding restores the right codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Credential {
    /// An ISO mDL document.
    Mdl(pomdl::Mdl),
    /// An eIDAS2 PID credential.
    Pid(popid::Pid),
    /// An ICAO Digital Travel Credential.
    Dtc(podtc::Dtc),
    /// A W3C verifiable credential.
    Vc(povc::VerifiableCredential),
}

impl Credential {
    /// The standard this credential conforms to.
    pub fn kind(&self) -> CredentialKind {
        match self {
            Self::Mdl(_) => CredentialKind::Mdl,
            Self::Pid(_) => CredentialKind::Pid,
            Self::Dtc(_) => CredentialKind::Dtc,
            Self::Vc(_) => CredentialKind::Vc,
        }
    }

    /// The salted claims of the credential, in the codec's canonical order.
    pub fn claims(&self) -> Vec<Claim> {
        match self {
            Self::Mdl(mdl) => mdl.claims(),
            Self::Pid(pid) => pid.claims(),
            Self::Dtc(dtc) => dtc.claims(),
            Self::Vc(credential) => credential.claims(),
        }
    }

    /// The commitment root the issuer signed over the credential's claims.
    pub fn commitment_root(&self) -> Result<Digest> {
        match self {
            Self::Mdl(mdl) => mdl
                .commitment_root()
                .with_err(|| CredentialError::Decode("unreadable mDL root".to_owned())),
            Self::Pid(pid) => pid
                .commitment_root()
                .with_err(|| CredentialError::Decode("unreadable PID root".to_owned())),
            Self::Dtc(dtc) => dtc
                .commitment_root()
                .with_err(|| CredentialError::Decode("unreadable DTC root".to_owned())),
            Self::Vc(credential) => credential
                .commitment_root()
                .with_err(|| CredentialError::Decode("unreadable VC root".to_owned())),
        }
    }

    /// When the credential stops being valid, if the standard carries an expiration timestamp.
    ///
    /// The DTC carries its expiry only inside the two-digit-year MRZ date, so it reports `None`
    /// and expires through issuer revocation instead.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Mdl(mdl) => mdl
                .security_object()
                .ok()
                .map(|security_object| security_object.validity_info.valid_until),
            Self::Pid(pid) => Some(pid.expiration_date),
            Self::Dtc(_) => None,
            Self::Vc(credential) => Some(credential.expiration_date),
        }
    }

    /// Verify the credential with its standard's verifier.
    ///
    /// All defects are reported as failed checks in the returned [`VerificationResult`]; a
    /// synthetic test signature is flagged with a warning.
    pub async fn verify<'v>(
        &self,
        context: &VerificationContext<'_, impl DidResolver>,
        get_verifier: impl Fn(SigningAlgorithm) -> Option<&'v dyn SignatureVerifier> + Copy,
    ) -> VerificationResult {
        match self {
            Self::Mdl(mdl) => pomdl::verify(mdl, context.now, get_verifier),
            Self::Pid(pid) => popid::verify(
                pid,
                context.now,
                context.trusted_issuers,
                context.issuer_public_key_der,
                get_verifier,
            ),
            Self::Dtc(dtc) => podtc::verify(dtc, get_verifier),
            Self::Vc(credential) => {
                povc::verify_credential(credential, context.now, context.resolver, get_verifier)
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use assert_matches::assert_matches;
    use chrono::TimeZone as _;
    use po_sign_utils::test_utils::{TestSigner, TestVerifier};
    use po_sign_utils::Signer as _;
    use pocommit::{generate_salt, MasterCode};
    use povc::DidDocument;
    use rand::thread_rng;
    use serde_json::json;

    use super::*;

    /// Map-backed resolver, the test stand-in for a registry.
    struct StaticResolver(HashMap<String, DidDocument>);

    impl DidResolver for StaticResolver {
        type Err = povc::VcError;

        async fn resolve(
            &self,
            did: &str,
        ) -> std::result::Result<DidDocument, poerror::Error<Self::Err>> {
            self.0
                .get(did)
                .cloned()
                .ok_or_else(|| poerror::Error::root(povc::VcError::UnknownDid(did.to_owned())))
        }
    }

    fn master_code() -> MasterCode {
        "ABCD-EFGH-JKLM-NPQR".parse().unwrap()
    }

    fn person_claims() -> Vec<Claim> {
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

    fn issued_pid() -> popid::Pid {
        popid::issue(
            person_claims(),
            &master_code(),
            None,
            "did:example:issuer",
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            &TestSigner::new("pid-issuer"),
            &mut thread_rng(),
        )
        .unwrap()
    }

    fn issued_vc() -> povc::VerifiableCredential {
        let holder_did = povc::did_from_public_key(
            &TestSigner::new("holder").public_key_der().unwrap(),
        );

        povc::issue(
            person_claims(),
            &master_code(),
            None,
            &holder_did,
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap(),
            &TestSigner::new("vc-issuer"),
            &mut thread_rng(),
        )
        .unwrap()
    }

    fn context<'a>(resolver: &'a StaticResolver) -> VerificationContext<'a, StaticResolver> {
        VerificationContext {
            now: chrono::Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            trusted_issuers: &["did:example:issuer"],
            issuer_public_key_der: b"test-public-key:pid-issuer",
            resolver,
        }
    }

    fn test_verifier(algorithm: SigningAlgorithm) -> Option<&'static dyn SignatureVerifier> {
        (algorithm == SigningAlgorithm::Test).then_some(&TestVerifier)
    }

    #[test]
    fn test_kind_and_claims_dispatch() {
        let credential = Credential::Pid(issued_pid());

        assert_eq!(credential.kind(), CredentialKind::Pid);
        assert!(credential
            .claims()
            .iter()
            .any(|claim| claim.name == "family_name"));
        assert_matches!(credential.commitment_root(), Ok(_));
        assert_eq!(
            credential.expires_at(),
            Some(chrono::Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn test_serde_round_trip_restores_the_discriminant() {
        let credential = Credential::Vc(issued_vc());

        let json = serde_json::to_string(&credential).unwrap();
        let decoded: Credential = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded, credential);
        assert_eq!(decoded.kind(), CredentialKind::Vc);
    }

    #[tokio::test]
    async fn test_verify_dispatches_to_the_pid_verifier() {
        let resolver = StaticResolver(HashMap::new());
        let credential = Credential::Pid(issued_pid());

        let result = credential.verify(&context(&resolver), test_verifier).await;

        assert!(
            result.verified(),
            "failures: {:?}",
            result.failures().collect::<Vec<_>>()
        );
        assert_eq!(result.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_verify_dispatches_to_the_vc_verifier() {
        let issuer_document = DidDocument::for_public_key(
            &TestSigner::new("vc-issuer").public_key_der().unwrap(),
        );
        let resolver =
            StaticResolver([(issuer_document.id.clone(), issuer_document)].into());
        let credential = Credential::Vc(issued_vc());

        let result = credential.verify(&context(&resolver), test_verifier).await;

        assert!(
            result.verified(),
            "failures: {:?}",
            result.failures().collect::<Vec<_>>()
        );
    }
}

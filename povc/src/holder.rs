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

//! Holder-side assembly of verifiable presentations.

use chrono::{DateTime, Utc};
use po_sign_utils::Signer;
use poerror::traits::ForeignBoxed as _;

use crate::{
    did::did_from_public_key,
    error::VcError,
    models::{
        encode_detached_jws, JwsHeader, Proof, VerifiableCredential, VerifiablePresentation,
        CONTEXT_CREDENTIALS, PROOF_TYPE_JWS, TYPE_VERIFIABLE_PRESENTATION,
    },
    Result,
};

/// Wrap the given credentials into a presentation bound to the verifier's challenge and domain.
///
/// The holder DID is derived from the `holder_signer`'s public key; every presented credential
/// must name that DID as its subject.  The proof signs the whole presentation, so neither the
/// embedded credentials nor the challenge binding can be altered after the fact.
///
/// # Errors
///
///   * [`VcError::InvalidInput`] if no credential is presented, the challenge or domain is
///     empty, or a credential belongs to a different subject.
///   * [`VcError::SignerUnavailable`] if the signing backend fails.
pub fn present(
    credentials: Vec<VerifiableCredential>,
    challenge: impl Into<String>,
    domain: impl Into<String>,
    created: DateTime<Utc>,
    holder_signer: &dyn Signer,
) -> Result<VerifiablePresentation> {
    let challenge = challenge.into();
    let domain = domain.into();

    if credentials.is_empty() {
        return Err(poerror::Error::root(VcError::InvalidInput(
            "a presentation must carry at least one credential".to_owned(),
        )));
    }
    if challenge.is_empty() || domain.is_empty() {
        return Err(poerror::Error::root(VcError::InvalidInput(
            "the challenge and domain must not be empty".to_owned(),
        )));
    }

    let holder_key = holder_signer
        .public_key_der()
        .foreign_boxed_err(|| VcError::SignerUnavailable)?;
    let holder_did = did_from_public_key(&holder_key);

    for credential in &credentials {
        if credential.subject_did()? != holder_did {
            return Err(poerror::Error::root(VcError::InvalidInput(format!(
                "credential subject is not the holder {holder_did}"
            ))));
        }
    }

    let mut presentation = VerifiablePresentation {
        context: vec![CONTEXT_CREDENTIALS.to_owned()],
        types: vec![TYPE_VERIFIABLE_PRESENTATION.to_owned()],
        holder: holder_did.clone(),
        verifiable_credential: credentials,
        proof: None,
    };

    let header = JwsHeader::new(holder_signer.algorithm().to_string());
    let signing_input = presentation.signing_input(&header)?;
    let signature = holder_signer
        .sign(&signing_input)
        .foreign_boxed_err(|| VcError::SignerUnavailable)?;

    presentation.proof = Some(Proof {
        proof_type: PROOF_TYPE_JWS.to_owned(),
        created,
        verification_method: format!("{holder_did}#key-1"),
        challenge: Some(challenge),
        domain: Some(domain),
        jws: encode_detached_jws(&header, &signature)?,
    });

    Ok(presentation)
}

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

//! Verification of mDL documents.
//!
//! Checks run in a fixed order and never stop at the first defect: structure, doc type, digest
//! algorithm, validity window, commitment re-derivation against the signed root, and finally the
//! delegated issuer signature.  A synthetic test signature verifies like any other but is
//! flagged with a warning.

use chrono::{DateTime, Utc};
use po_sign_utils::{SignatureVerifier, SigningAlgorithm};
use pocommit::{MerkleTree, VerificationResult};

use crate::models::{
    Mdl, ELEMENT_COMMITMENT_ROOT, DIGEST_ALGORITHM_SHA256, MDL_DOC_TYPE, POCKETONE_NAMESPACE,
};

/// Verify an mDL document.
///
/// `get_verifier` supplies the [`SignatureVerifier`] for the document's signature algorithm;
/// returning `None` fails the signature check (fail closed).
pub fn verify<'a>(
    mdl: &Mdl,
    now: DateTime<Utc>,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
) -> VerificationResult {
    let mut result = VerificationResult::new();

    match mdl.validate_structure() {
        Ok(()) => result.pass("structure"),
        Err(err) => result.fail("structure", err.to_string()),
    }

    result.record(
        "doc_type",
        mdl.doc_type == MDL_DOC_TYPE,
        format!("unexpected document type {}", mdl.doc_type),
    );

    let security_object = match mdl.security_object() {
        Ok(security_object) => {
            result.pass("issuer_auth_payload");
            security_object
        }
        Err(err) => {
            // Everything below depends on the signed payload.
            result.fail("issuer_auth_payload", err.to_string());
            return result;
        }
    };

    result.record(
        "signed_doc_type",
        security_object.doc_type == mdl.doc_type,
        "signed doc type does not match the document",
    );
    result.record(
        "digest_algorithm",
        security_object.digest_algorithm == DIGEST_ALGORITHM_SHA256,
        format!(
            "unsupported digest algorithm {}",
            security_object.digest_algorithm
        ),
    );

    if security_object.validity_info.not_yet_valid(now) {
        result.fail("validity_window", "document is not yet valid");
    } else if security_object.validity_info.expired(now) {
        result.fail("validity_window", "document is expired");
    } else {
        result.pass("validity_window");
    }

    // Re-derive every disclosed claim commitment against the signed digests.
    let mut commitments = Vec::new();
    for (name_space, elements) in &mdl.name_spaces {
        for (name, item) in elements {
            let Some(salt) = &item.salt else {
                continue;
            };

            let check = format!("commitment:{name_space}:{name}");
            match pocommit::commit(name, &item.value, salt) {
                Ok(commitment) => {
                    let signed = security_object
                        .claim_commitments
                        .get(name_space)
                        .and_then(|digests| digests.get(name));
                    result.record(
                        check,
                        signed == Some(&commitment),
                        "claim commitment does not match the signed digest",
                    );
                    commitments.push(commitment);
                }
                Err(err) => result.fail(check, err.to_string()),
            }
        }
    }

    match MerkleTree::build(&commitments) {
        Ok(tree) => result.record(
            "commitment_root",
            tree.root() == security_object.commitment_root,
            "recomputed accumulator root does not match the signed root",
        ),
        Err(err) => result.fail("commitment_root", err.to_string()),
    }

    // The unsalted mirror must agree with the signed root.
    if let Some(mirror) = mdl.element(POCKETONE_NAMESPACE, ELEMENT_COMMITMENT_ROOT) {
        let signed_root = security_object.commitment_root.to_string();
        result.record(
            "commitment_root_mirror",
            mirror.value.as_str() == Some(signed_root.as_str()),
            "mirrored root does not match the signed root",
        );
    }

    verify_signature(mdl, get_verifier, &mut result);

    result
}

fn verify_signature<'a>(
    mdl: &Mdl,
    get_verifier: impl Fn(SigningAlgorithm) -> Option<&'a dyn SignatureVerifier>,
    result: &mut VerificationResult,
) {
    let Some(algorithm) = mdl.issuer_auth.signing_algorithm() else {
        result.fail("issuer_signature", "missing or unknown signature algorithm");
        return;
    };

    if algorithm.is_synthetic() {
        result.warn("issuer signature uses the synthetic test algorithm");
    }

    let Some(verifier) = get_verifier(algorithm) else {
        result.fail(
            "issuer_signature",
            format!("no signature verifier for algorithm {algorithm}"),
        );
        return;
    };

    match mdl.issuer_auth.verify_signature(verifier) {
        Ok(verified) => result.record(
            "issuer_signature",
            verified,
            "issuer signature does not verify",
        ),
        Err(err) => result.fail("issuer_signature", err.to_string()),
    }
}

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

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

//! This crate defines the boundary between the PocketOne credential core and the external,
//! HSM-backed signing service.
//!
//! # Details
//!
//! The credential codecs never compute signatures themselves; they build the exact bytes to be
//! signed and delegate to an implementation of the [`Signer`] trait.  Likewise, the credential
//! verifiers delegate raw signature verification to a [`SignatureVerifier`].
//!
//! Both traits must *fail closed*: an unreachable backend or an unknown key label is reported as
//! an error ([`SignatureError::SignerUnavailable`] / [`SignatureError::KeyNotFound`]), never as a
//! default signature or an accept-all result.  Callers are expected to keep such errors distinct
//! from verification failures, so that "could not check" is never confused with "checked and
//! invalid".
//!
//! Cancellation and timeouts around the HSM round trip are owned by the trait implementation;
//! this crate models the boundary only.
//!
//! The `test_utils` module (behind the `test-utils` feature) provides deterministic signer
//! implementations for use in tests.

mod error;
mod traits;
mod utils;

pub use error::SignatureError;
#[cfg(feature = "openssl")]
pub use traits::Es256Verifier;
pub use traits::{
    Signer, SignatureVerifier, SigningAlgorithm, SIGNING_ALG_ES256, SIGNING_ALG_ES384,
    SIGNING_ALG_ES512, SIGNING_ALG_TEST,
};
pub use utils::{base64_url_decode, base64_url_encode, BoxError};

#[cfg(feature = "test-utils")]
pub mod test_utils;

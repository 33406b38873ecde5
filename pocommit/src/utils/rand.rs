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

use rand::Rng;

use crate::models::Salt;

/// A length in bytes of a claim salt.
///
/// The claim commitment scheme requires at least 128 bits of caller-supplied randomness per
/// claim; salts are never generated inside the commitment function itself, so issuance code
/// stays in control of uniqueness.
pub(crate) const SALT_ENTROPY_BYTES: usize = 16;

/// Generates a fresh claim [`Salt`].
pub fn generate_salt<R: Rng + ?Sized>(rng: &mut R) -> Salt {
    let mut salt = vec![0u8; SALT_ENTROPY_BYTES];
    rng.fill_bytes(&mut salt);
    debug_assert_eq!(
        salt.len(),
        SALT_ENTROPY_BYTES,
        "`salt` length MUST be {}",
        SALT_ENTROPY_BYTES
    );
    Salt::from(salt)
}

/// Generates a `nonce` value.
///
/// The `nonce` is generated as a random, `base64-url` encoded `String` with 256 bits of entropy.
pub fn generate_nonce<R: Rng + ?Sized>(rng: &mut R) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};

    let mut nonce_bytes = [0u8; 32];
    rng.fill_bytes(&mut nonce_bytes);
    URL_SAFE_NO_PAD.encode(nonce_bytes)
}

#[cfg(test)]
mod tests {
    use rand::thread_rng;

    use super::*;

    #[test]
    fn test_generate_salt() {
        let mut rng = thread_rng();

        let salt = generate_salt(&mut rng);

        assert_eq!(salt.as_bytes().len(), SALT_ENTROPY_BYTES);

        let all_zero = salt.as_bytes().iter().all(|b| *b == 0);

        assert!(!all_zero);
    }

    #[test]
    fn test_generate_nonce() {
        let mut rng = thread_rng();

        let nonce = generate_nonce(&mut rng);

        assert_eq!(nonce.len(), 43); // 32 bytes, base64url, no padding
        assert_ne!(nonce, generate_nonce(&mut rng));
    }
}

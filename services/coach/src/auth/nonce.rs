//! services/coach/src/auth/nonce.rs
//!
//! Single-use nonces binding a native sign-in request to its credential.
//! The provider only ever sees the SHA-256 of the nonce; the raw value goes
//! to the backend exchange, which checks it against the hash in the token.

use rand::Rng;
use sha2::{Digest, Sha256};

const NONCE_CHARSET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz-._";

pub const NONCE_LENGTH: usize = 32;

/// A fresh nonce drawn from the thread-local CSPRNG.
pub fn generate_nonce() -> String {
    let mut rng = rand::rng();
    (0..NONCE_LENGTH)
        .map(|_| NONCE_CHARSET[rng.random_range(0..NONCE_CHARSET.len())] as char)
        .collect()
}

/// Lowercase hex SHA-256 of the nonce, as handed to the identity provider.
pub fn hash_nonce(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nonce_has_expected_length_and_alphabet() {
        let nonce = generate_nonce();
        assert_eq!(nonce.len(), NONCE_LENGTH);
        assert!(nonce.bytes().all(|b| NONCE_CHARSET.contains(&b)));
    }

    #[test]
    fn charset_covers_every_ascii_alphanumeric() {
        assert!((b'0'..=b'9')
            .chain(b'A'..=b'Z')
            .chain(b'a'..=b'z')
            .all(|c| NONCE_CHARSET.contains(&c)));
        assert_eq!(NONCE_CHARSET.len(), 65);
    }

    #[test]
    fn consecutive_nonces_differ() {
        assert_ne!(generate_nonce(), generate_nonce());
    }

    #[test]
    fn hash_matches_known_vector() {
        assert_eq!(
            hash_nonce("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}

//! Key derivation: secret string → 256-bit envelope key
//!
//! The derivation is a plain truncate-or-zero-pad of the secret's bytes.
//! Every envelope already in a bucket was sealed with a key built this way,
//! so replacing it with a real KDF needs a new envelope prefix.

use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroize;

use crate::KEY_SIZE;

/// A 256-bit envelope key. Zeroized on drop.
#[derive(Clone)]
pub struct SymmetricKey {
    bytes: [u8; KEY_SIZE],
}

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self { bytes }
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.bytes
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.bytes.zeroize();
    }
}

impl std::fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SymmetricKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Derive a key from raw secret bytes.
///
/// Longer secrets are truncated to 32 bytes, shorter ones are right-padded
/// with zero bytes.
pub fn derive_key(secret: &[u8]) -> SymmetricKey {
    let mut bytes = [0u8; KEY_SIZE];
    let n = secret.len().min(KEY_SIZE);
    bytes[..n].copy_from_slice(&secret[..n]);
    SymmetricKey::from_bytes(bytes)
}

/// Derive a key from the configured secret string.
pub fn derive_key_from_secret(secret: &SecretString) -> SymmetricKey {
    derive_key(secret.expose_secret().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_length_for_all_sizes() {
        for len in [0usize, 1, 31, 32, 33, 1000] {
            let secret = vec![0x5Au8; len];
            let key = derive_key(&secret);
            assert_eq!(key.as_bytes().len(), KEY_SIZE, "len {len}");
        }
    }

    #[test]
    fn test_short_secret_zero_padded() {
        let key = derive_key(b"s3cr3t");
        assert_eq!(&key.as_bytes()[..6], b"s3cr3t");
        assert!(key.as_bytes()[6..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_long_secret_truncated() {
        let secret: Vec<u8> = (0u8..64).collect();
        let key = derive_key(&secret);
        assert_eq!(key.as_bytes()[..], secret[..KEY_SIZE]);
    }

    #[test]
    fn test_exact_length_passthrough() {
        let secret = [7u8; KEY_SIZE];
        assert_eq!(derive_key(&secret).as_bytes(), &secret);
    }

    #[test]
    fn test_empty_secret_is_all_zero() {
        assert_eq!(derive_key(b"").as_bytes(), &[0u8; KEY_SIZE]);
    }

    #[test]
    fn test_from_secret_string_matches_bytes() {
        let secret = SecretString::from("correct horse battery staple");
        assert_eq!(
            derive_key_from_secret(&secret).as_bytes(),
            derive_key(b"correct horse battery staple").as_bytes()
        );
    }

    #[test]
    fn test_debug_redacted() {
        let key = derive_key(b"do-not-print-me");
        let debug = format!("{key:?}");
        assert!(!debug.contains("do-not"));
        assert!(debug.contains("REDACTED"));
    }

    proptest! {
        #[test]
        fn derivation_is_deterministic(secret in proptest::collection::vec(any::<u8>(), 0..=128)) {
            let k1 = derive_key(&secret);
            let k2 = derive_key(&secret);
            prop_assert_eq!(k1.as_bytes(), k2.as_bytes());
        }

        #[test]
        fn derivation_keeps_prefix(secret in proptest::collection::vec(any::<u8>(), 0..=128)) {
            let key = derive_key(&secret);
            let n = secret.len().min(KEY_SIZE);
            prop_assert_eq!(&key.as_bytes()[..n], &secret[..n]);
            prop_assert!(key.as_bytes()[n..].iter().all(|&b| b == 0));
        }
    }
}

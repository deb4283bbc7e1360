//! AES-256-GCM envelope encryption/decryption
//!
//! Envelope format (binary):
//! ```text
//! [10 bytes: "ENCRYPTED:"][12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! No AAD. The prefix alone decides whether a fetched object is decrypted,
//! so a bucket can hold encrypted and plaintext objects side by side.

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use rand::{rngs::OsRng, RngCore};

use crate::error::EnvelopeError;
use crate::{KEY_SIZE, NONCE_SIZE};

/// Literal that opens every envelope
pub const MAGIC_PREFIX: &[u8; 10] = b"ENCRYPTED:";

/// Seal `plaintext` under `key` into a new envelope.
///
/// A fresh nonce is drawn from the OS random source on every call.
///
/// Returns: `["ENCRYPTED:"][12-byte nonce][ciphertext][16-byte tag]`
pub fn encrypt(plaintext: &[u8], key: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    let cipher = new_cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng
        .try_fill_bytes(&mut nonce_bytes)
        .map_err(|_| EnvelopeError::RandomSource)?;
    let nonce = Nonce::from_slice(&nonce_bytes);

    // Sealing only fails for plaintexts beyond GCM's length limit (~64 GiB)
    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| EnvelopeError::Seal)?;

    let mut result = Vec::with_capacity(MAGIC_PREFIX.len() + NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(MAGIC_PREFIX);
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    tracing::trace!(
        plaintext_len = plaintext.len(),
        envelope_len = result.len(),
        "sealed envelope"
    );
    Ok(result)
}

/// True iff `blob` starts with the envelope prefix, byte-for-byte.
pub fn is_envelope(blob: &[u8]) -> bool {
    blob.starts_with(MAGIC_PREFIX)
}

/// Open an envelope produced by [`encrypt`].
///
/// Any tag mismatch (wrong key, flipped bit, truncated tag) is reported as
/// [`EnvelopeError::Authentication`]; partial plaintext is never returned.
pub fn decrypt(blob: &[u8], key: &[u8]) -> Result<Vec<u8>, EnvelopeError> {
    if !is_envelope(blob) {
        return Err(EnvelopeError::NotAnEnvelope);
    }

    let body = &blob[MAGIC_PREFIX.len()..];
    if body.len() < NONCE_SIZE {
        return Err(EnvelopeError::Truncated { len: body.len() });
    }

    let cipher = new_cipher(key)?;
    let (nonce_bytes, ciphertext) = body.split_at(NONCE_SIZE);
    let nonce = Nonce::from_slice(nonce_bytes);

    cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| EnvelopeError::Authentication)
}

fn new_cipher(key: &[u8]) -> Result<Aes256Gcm, EnvelopeError> {
    if key.len() != KEY_SIZE {
        return Err(EnvelopeError::KeyLength {
            expected: KEY_SIZE,
            actual: key.len(),
        });
    }
    Aes256Gcm::new_from_slice(key).map_err(|_| EnvelopeError::KeyLength {
        expected: KEY_SIZE,
        actual: key.len(),
    })
}

//! bak-crypto: client-side encryption for bak
//!
//! Envelope wire format (bit-exact, shared with every other bak client):
//! ```text
//! [10 bytes: "ENCRYPTED:"][12 bytes: random nonce][N bytes: ciphertext][16 bytes: GCM tag]
//! ```
//!
//! The key is the configured secret truncated or zero-padded to 32 bytes.
//! Objects without the prefix are plaintext and pass through untouched.

pub mod envelope;
pub mod error;
pub mod kdf;

pub use envelope::{decrypt, encrypt, is_envelope, MAGIC_PREFIX};
pub use error::EnvelopeError;
pub use kdf::{derive_key, derive_key_from_secret, SymmetricKey};

/// Size of an AES-256 key in bytes
pub const KEY_SIZE: usize = 32;

/// Size of an AES-GCM nonce (96-bit)
pub const NONCE_SIZE: usize = 12;

/// Size of a GCM authentication tag
pub const TAG_SIZE: usize = 16;

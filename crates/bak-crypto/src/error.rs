use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EnvelopeError {
    #[error("invalid key length: expected {expected} bytes, got {actual}")]
    KeyLength { expected: usize, actual: usize },

    #[error("secure random source unavailable")]
    RandomSource,

    #[error("encryption failed: plaintext exceeds the AES-GCM length limit")]
    Seal,

    #[error("data is not an encrypted envelope")]
    NotAnEnvelope,

    #[error("envelope truncated: {len} bytes after prefix, nonce needs {}", crate::NONCE_SIZE)]
    Truncated { len: usize },

    #[error("decryption failed: wrong key or corrupted data")]
    Authentication,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_failure_is_not_reported_as_decryption() {
        let msg = EnvelopeError::Seal.to_string();
        assert!(msg.starts_with("encryption failed"), "got: {msg}");
        assert_ne!(EnvelopeError::Seal, EnvelopeError::Authentication);
    }
}

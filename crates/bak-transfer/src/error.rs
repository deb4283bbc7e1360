use std::path::PathBuf;

use bak_crypto::EnvelopeError;
use bak_storage::GatewayError;
use thiserror::Error;

pub type TransferResult<T> = Result<T, TransferError>;

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("{action} {}: {source}", .path.display())]
    LocalIo {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransferError {
    /// True for a tag mismatch: wrong secret or tampered object.
    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Envelope(EnvelopeError::Authentication))
    }

    pub(crate) fn local_io(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::LocalIo {
            action,
            path,
            source,
        }
    }
}

use opendal::ErrorKind;
use thiserror::Error;

/// Failures surfaced from the remote store, one family per storage verb.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("cannot reach object store: {0}")]
    Connectivity(#[source] opendal::Error),

    #[error("object store rejected the request: {0}")]
    Auth(#[source] opendal::Error),

    #[error("object not found: {key}")]
    NotFound { key: String },

    #[error("failed to list objects under '{prefix}': {source}")]
    List {
        prefix: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to upload {key}: {source}")]
    Upload {
        key: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to download {key}: {source}")]
    Download {
        key: String,
        #[source]
        source: opendal::Error,
    },

    #[error("failed to delete {key}: {source}")]
    Delete {
        key: String,
        #[source]
        source: opendal::Error,
    },
}

impl GatewayError {
    /// Sort an OpenDAL error into the taxonomy; `verb` builds the fallback.
    pub(crate) fn classify<F>(err: opendal::Error, verb: F) -> Self
    where
        F: FnOnce(opendal::Error) -> Self,
    {
        match err.kind() {
            ErrorKind::PermissionDenied | ErrorKind::ConfigInvalid => Self::Auth(err),
            _ if err.is_temporary() => Self::Connectivity(err),
            _ => verb(err),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

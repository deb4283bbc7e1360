//! Transfer engine: store and retrieve workflows on top of the gateway
//!
//! Each call is one self-contained operation. Keys are derived per call
//! and dropped (zeroized) before the call returns; nothing is cached.

use secrecy::SecretString;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use zeroize::Zeroize;

use bak_core::RemoteObject;
use bak_crypto::{derive_key_from_secret, MAGIC_PREFIX};
use bak_storage::{Gateway, ProgressFn};

use crate::error::{TransferError, TransferResult};

/// Result of storing a single file
#[derive(Debug)]
pub struct StoreResult {
    pub local_path: PathBuf,
    pub remote_path: String,
    /// Plaintext size read from disk
    pub bytes_read: u64,
    /// Size of the object written to the store (envelope overhead included)
    pub bytes_stored: u64,
    pub encrypted: bool,
}

/// Result of retrieving a single file
#[derive(Debug)]
pub struct RetrieveResult {
    pub remote_path: String,
    pub local_path: PathBuf,
    /// Plaintext size written to disk
    pub bytes: u64,
    pub decrypted: bool,
}

/// Plaintext fetched from the store, not yet written anywhere
pub struct Retrieved {
    pub data: Vec<u8>,
    pub decrypted: bool,
}

impl std::fmt::Debug for Retrieved {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retrieved")
            .field("len", &self.data.len())
            .field("decrypted", &self.decrypted)
            .finish()
    }
}

/// Upload a local file to `remote_path`, sealing it first when `encryption`
/// carries a secret.
pub async fn store_file(
    gateway: &Gateway,
    local_path: &Path,
    remote_path: &str,
    encryption: Option<&SecretString>,
    progress: Option<&ProgressFn>,
) -> TransferResult<StoreResult> {
    check_remote_path(remote_path)?;

    let data = tokio::fs::read(local_path)
        .await
        .map_err(TransferError::local_io("reading", local_path))?;
    let bytes_read = data.len() as u64;

    let bytes_stored = store_bytes(gateway, data, remote_path, encryption, progress).await?;

    info!(
        local = %local_path.display(),
        remote = %remote_path,
        bytes = bytes_read,
        encrypted = encryption.is_some(),
        "stored"
    );

    Ok(StoreResult {
        local_path: local_path.to_path_buf(),
        remote_path: remote_path.to_string(),
        bytes_read,
        bytes_stored,
        encrypted: encryption.is_some(),
    })
}

/// Upload an in-memory blob. Returns the number of bytes written remotely.
pub async fn store_bytes(
    gateway: &Gateway,
    mut data: Vec<u8>,
    remote_path: &str,
    encryption: Option<&SecretString>,
    progress: Option<&ProgressFn>,
) -> TransferResult<u64> {
    check_remote_path(remote_path)?;

    let blob = match encryption {
        Some(secret) => {
            let key = derive_key_from_secret(secret);
            let sealed = bak_crypto::encrypt(&data, key.as_bytes());
            data.zeroize();
            let sealed = sealed?;
            debug!(remote = %remote_path, envelope_len = sealed.len(), "sealed");
            sealed
        }
        None => {
            // Stored as-is; a retrieve will mistake it for an envelope
            if data.starts_with(MAGIC_PREFIX) {
                warn!(
                    remote = %remote_path,
                    "plaintext begins with the envelope prefix and will not download cleanly"
                );
            }
            data
        }
    };

    let stored = blob.len() as u64;
    gateway.put(remote_path, blob, progress).await?;
    Ok(stored)
}

/// Fetch `remote_path` and return its plaintext.
///
/// Envelopes are opened with a key derived from `secret`; anything else is
/// returned byte-for-byte. An envelope with no secret available is a
/// config error, never a silent plaintext fallback.
pub async fn retrieve_bytes(
    gateway: &Gateway,
    remote_path: &str,
    secret: Option<&SecretString>,
    progress: Option<&ProgressFn>,
) -> TransferResult<Retrieved> {
    check_remote_path(remote_path)?;

    let blob = gateway.get(remote_path, progress).await?;

    if !bak_crypto::is_envelope(&blob) {
        debug!(remote = %remote_path, "plaintext object, no decryption");
        return Ok(Retrieved {
            data: blob,
            decrypted: false,
        });
    }

    let secret = secret.ok_or_else(|| {
        TransferError::Config(format!(
            "{remote_path} is encrypted but no secret key is configured"
        ))
    })?;
    let key = derive_key_from_secret(secret);
    let data = bak_crypto::decrypt(&blob, key.as_bytes()).inspect_err(|e| {
        warn!(remote = %remote_path, error = %e, "envelope rejected");
    })?;

    debug!(remote = %remote_path, bytes = data.len(), "opened envelope");
    Ok(Retrieved {
        data,
        decrypted: true,
    })
}

/// Download `remote_path` into `local_path`.
///
/// The plaintext is written to a sibling temp file and renamed into place,
/// so a failed retrieve never leaves a partial or corrupted destination.
pub async fn retrieve_file(
    gateway: &Gateway,
    remote_path: &str,
    local_path: &Path,
    secret: Option<&SecretString>,
    progress: Option<&ProgressFn>,
) -> TransferResult<RetrieveResult> {
    let Retrieved {
        mut data,
        decrypted,
    } = retrieve_bytes(gateway, remote_path, secret, progress).await?;
    let bytes = data.len() as u64;

    let written = write_atomic(local_path, &data).await;
    if decrypted {
        data.zeroize();
    }
    written?;

    info!(
        remote = %remote_path,
        local = %local_path.display(),
        bytes,
        decrypted,
        "retrieved"
    );

    Ok(RetrieveResult {
        remote_path: remote_path.to_string(),
        local_path: local_path.to_path_buf(),
        bytes,
        decrypted,
    })
}

/// Remove `remote_path` from the store.
pub async fn delete_object(gateway: &Gateway, remote_path: &str) -> TransferResult<()> {
    check_remote_path(remote_path)?;
    gateway.delete(remote_path).await?;
    info!(remote = %remote_path, "deleted");
    Ok(())
}

/// List objects under `prefix` (empty lists the whole bucket).
pub async fn list_objects(gateway: &Gateway, prefix: &str) -> TransferResult<Vec<RemoteObject>> {
    Ok(gateway.list(prefix).await?)
}

/// Remote key used when `upload` is given no destination: the file name.
pub fn default_remote_key(local_path: &Path) -> Option<String> {
    local_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
}

/// Local path used when `download` is given no destination: the last key segment.
pub fn default_local_path(remote_path: &str) -> PathBuf {
    let name = remote_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or("downloaded");
    PathBuf::from(name)
}

fn check_remote_path(remote_path: &str) -> TransferResult<()> {
    if remote_path.is_empty() || remote_path.ends_with('/') {
        return Err(TransferError::Config(format!(
            "remote path must name an object, got '{remote_path}'"
        )));
    }
    Ok(())
}

async fn write_atomic(local_path: &Path, data: &[u8]) -> TransferResult<()> {
    if local_path.file_name().is_none() {
        return Err(TransferError::Config(format!(
            "local path has no file name: {}",
            local_path.display()
        )));
    }
    let dir = match local_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(parent) => {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(TransferError::local_io("creating dir", parent))?;
            parent
        }
        None => Path::new("."),
    };

    // Uniquely named and created exclusively; removed on drop unless persisted
    let tmp = tempfile::Builder::new()
        .prefix(".bak-")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(TransferError::local_io("creating tmp in", dir))?
        .into_temp_path();

    tokio::fs::write(&tmp, data)
        .await
        .map_err(TransferError::local_io("writing tmp", &*tmp))?;
    tmp.persist(local_path)
        .map_err(|e| e.error)
        .map_err(TransferError::local_io("renaming to", local_path))
}

//! Object store gateway: the four storage verbs against one bucket
//!
//! Every transfer is full-buffer: `put` sends the whole blob in one write,
//! `get` assembles the whole object in memory. No multipart, no retries here.

use opendal::{ErrorKind, Operator};
use tracing::debug;

use bak_core::RemoteObject;

use crate::error::GatewayError;

/// Progress callback type (bytes_done, bytes_total, message)
pub type ProgressFn = Box<dyn Fn(u64, u64, &str) + Send + Sync>;

/// Window size for ranged downloads; one progress tick per window
const READ_WINDOW: u64 = 256 * 1024;

/// A handle to the configured bucket.
#[derive(Clone, Debug)]
pub struct Gateway {
    op: Operator,
}

impl Gateway {
    pub fn new(op: Operator) -> Self {
        Self { op }
    }

    pub fn operator(&self) -> &Operator {
        &self.op
    }

    /// List every object whose key starts with `prefix`.
    ///
    /// Flat listing (no delimiter); order is whatever the store returns.
    /// An empty prefix lists the whole bucket. Entries whose listed metadata
    /// lacks a size or timestamp are completed with a `stat`.
    pub async fn list(&self, prefix: &str) -> Result<Vec<RemoteObject>, GatewayError> {
        let list_err = |e: opendal::Error| {
            GatewayError::classify(e, |source| GatewayError::List {
                prefix: prefix.to_string(),
                source,
            })
        };

        let path = if prefix.is_empty() { "/" } else { prefix };
        let entries = self
            .op
            .list_with(path)
            .recursive(true)
            .await
            .map_err(list_err)?;

        let mut objects = Vec::with_capacity(entries.len());
        for entry in entries {
            let listed = entry.metadata();
            if listed.mode().is_dir() {
                continue;
            }

            let stat;
            let meta = if listed.content_length() == 0 || listed.last_modified().is_none() {
                stat = self.op.stat(entry.path()).await.map_err(list_err)?;
                &stat
            } else {
                listed
            };

            objects.push(RemoteObject {
                key: entry.path().to_string(),
                size: meta.content_length(),
                last_modified: meta.last_modified().map(|t| t.to_string()),
            });
        }

        debug!(prefix, count = objects.len(), "listed");
        Ok(objects)
    }

    /// Write `blob` to `key` in a single request.
    ///
    /// A failed upload leaves no object (or the previous version) behind;
    /// that atomicity is the store's.
    pub async fn put(
        &self,
        key: &str,
        blob: Vec<u8>,
        progress: Option<&ProgressFn>,
    ) -> Result<(), GatewayError> {
        let total = blob.len() as u64;
        if let Some(cb) = progress {
            cb(0, total, key);
        }

        self.op.write(key, blob).await.map_err(|e| {
            GatewayError::classify(e, |source| GatewayError::Upload {
                key: key.to_string(),
                source,
            })
        })?;

        if let Some(cb) = progress {
            cb(total, total, key);
        }
        debug!(key, bytes = total, "put");
        Ok(())
    }

    /// Read the whole object at `key` into memory.
    pub async fn get(
        &self,
        key: &str,
        progress: Option<&ProgressFn>,
    ) -> Result<Vec<u8>, GatewayError> {
        let download_err = |e: opendal::Error| {
            if e.kind() == ErrorKind::NotFound {
                return GatewayError::NotFound {
                    key: key.to_string(),
                };
            }
            GatewayError::classify(e, |source| GatewayError::Download {
                key: key.to_string(),
                source,
            })
        };

        let total = self.op.stat(key).await.map_err(download_err)?.content_length();
        if let Some(cb) = progress {
            cb(0, total, key);
        }

        // The reader owns the response stream; it is dropped on every return
        let reader = self.op.reader(key).await.map_err(download_err)?;
        let mut data = Vec::with_capacity(total as usize);
        let mut offset = 0u64;
        while offset < total {
            let end = (offset + READ_WINDOW).min(total);
            let buf = reader.read(offset..end).await.map_err(download_err)?;
            data.extend_from_slice(&buf.to_bytes());
            offset = end;
            if let Some(cb) = progress {
                cb(offset, total, key);
            }
        }

        debug!(key, bytes = data.len(), "get");
        Ok(data)
    }

    /// Delete `key`. Deleting a missing key is left to the store's semantics.
    pub async fn delete(&self, key: &str) -> Result<(), GatewayError> {
        self.op.delete(key).await.map_err(|e| {
            GatewayError::classify(e, |source| GatewayError::Delete {
                key: key.to_string(),
                source,
            })
        })?;
        debug!(key, "deleted");
        Ok(())
    }
}

use serde::{Deserialize, Serialize};

/// An object as reported by the remote store listing.
///
/// Never cached locally: every listing goes back to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteObject {
    /// Path-like object key (e.g. `photos/2024/cat.jpg`)
    pub key: String,
    /// Size in bytes
    pub size: u64,
    /// Last-modified timestamp as reported by the store, if any
    pub last_modified: Option<String>,
}

impl RemoteObject {
    /// Last path segment of the key (`a/b/c.txt` → `c.txt`)
    pub fn file_name(&self) -> &str {
        self.key
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.key)
    }
}

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{BakError, BakResult};

/// Environment variables that override values from the config file
pub const ENV_ENDPOINT: &str = "S3_ENDPOINT";
pub const ENV_ACCESS_KEY: &str = "S3_ACCESS_KEY";
pub const ENV_SECRET_KEY: &str = "S3_SECRET_KEY";
pub const ENV_BUCKET: &str = "S3_BUCKET";

/// Top-level configuration (loaded from ~/.bak/config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BakConfig {
    pub storage: StorageConfig,
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// S3-compatible endpoint URL
    pub endpoint: String,
    /// S3 region (default: us-east-1)
    pub region: String,
    /// Bucket every command operates on
    pub bucket: String,
    /// Access key id for the store
    pub access_key: String,
    /// Secret access key; also the secret material for client-side encryption
    pub secret_key: String,
    /// Per-request deadline in seconds, enforced by the transport
    pub timeout_secs: Option<u64>,
    /// Transport-level retry attempts for transient failures
    pub max_retries: usize,
    /// Refuse plaintext HTTP endpoints instead of warning
    pub enforce_tls: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: "us-east-1".into(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            timeout_secs: None,
            max_retries: 3,
            enforce_tls: false,
        }
    }
}

impl std::fmt::Debug for StorageConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key", &self.access_key)
            .field("secret_key", &"[REDACTED]")
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("enforce_tls", &self.enforce_tls)
            .finish()
    }
}

impl StorageConfig {
    /// The configured secret key, wrapped for handing to the key deriver.
    pub fn secret_material(&self) -> Option<SecretString> {
        if self.secret_key.is_empty() {
            None
        } else {
            Some(SecretString::from(self.secret_key.clone()))
        }
    }

    /// Check everything a remote call needs, before any remote call is made.
    pub fn validate(&self) -> BakResult<()> {
        if self.bucket.is_empty() {
            return Err(BakError::Config(
                "no bucket configured; run `bak config set` or export S3_BUCKET".into(),
            ));
        }
        if self.endpoint.is_empty() {
            return Err(BakError::Config(
                "no endpoint configured; run `bak config set` or export S3_ENDPOINT".into(),
            ));
        }
        if self.access_key.is_empty() || self.secret_key.is_empty() {
            return Err(BakError::Config(
                "access key and secret key must both be set".into(),
            ));
        }
        if self.endpoint.starts_with("http://") {
            if self.enforce_tls {
                return Err(BakError::Config(format!(
                    "endpoint uses plaintext HTTP ({}), but enforce_tls is enabled",
                    self.endpoint
                )));
            }
            tracing::warn!(
                endpoint = %self.endpoint,
                "endpoint uses plaintext HTTP; credentials are transmitted unencrypted"
            );
        }
        Ok(())
    }
}

impl BakConfig {
    /// Load config from `path`, then apply environment overrides.
    ///
    /// A missing file is not an error: defaults are used.
    pub fn load(path: &Path) -> BakResult<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Load config from `path` only, without looking at the environment.
    pub fn load_file(path: &Path) -> BakResult<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| BakError::Config(format!("parsing {}: {e}", path.display())))
    }

    /// Override storage settings from non-empty environment values.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = &mut self.storage;
        for (name, slot) in [
            (ENV_ENDPOINT, &mut storage.endpoint),
            (ENV_ACCESS_KEY, &mut storage.access_key),
            (ENV_SECRET_KEY, &mut storage.secret_key),
            (ENV_BUCKET, &mut storage.bucket),
        ] {
            if let Some(value) = lookup(name).filter(|v| !v.is_empty()) {
                *slot = value;
            }
        }
    }

    /// Write config to `path` atomically, owner-readable only on Unix.
    pub fn save(&self, path: &Path) -> BakResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let rendered = toml::to_string_pretty(self)
            .map_err(|e| BakError::Config(format!("serializing config: {e}")))?;

        let tmp = path.with_extension("toml.tmp");
        std::fs::write(&tmp, rendered)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600))?;
        }
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

/// Default config location: `~/.bak/config.toml`
pub fn default_config_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_default();
    PathBuf::from(home).join(".bak").join("config.toml")
}

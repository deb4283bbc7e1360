//! OpenDAL Operator factory for the configured bucket

use anyhow::{Context, Result};
use opendal::Operator;
use std::time::Duration;

/// Everything needed to build an operator for one bucket
#[derive(Clone)]
pub struct OperatorConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    /// Per-request deadline; `None` leaves requests unbounded
    pub timeout: Option<Duration>,
    /// Transport retries for transient failures
    pub max_retries: usize,
}

impl std::fmt::Debug for OperatorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Build an OpenDAL Operator for any S3-compatible endpoint (MinIO, R2, AWS...)
///
/// Uses path-style addressing (default in opendal 0.55), which non-AWS stores
/// need. Retries live in the transport layer; the gateway never retries itself.
pub fn build_operator(cfg: &OperatorConfig) -> Result<Operator> {
    // opendal 0.55: S3 builder uses consuming pattern (methods take `self`, return `Self`)
    let builder = opendal::services::S3::default()
        .endpoint(&cfg.endpoint)
        .region(&cfg.region)
        .bucket(&cfg.bucket)
        .access_key_id(&cfg.access_key_id)
        .secret_access_key(&cfg.secret_access_key);

    let op = Operator::new(builder)
        .context("creating OpenDAL S3 operator")?
        .layer(opendal::layers::LoggingLayer::default())
        .layer(
            opendal::layers::RetryLayer::new()
                .with_max_times(cfg.max_retries)
                .with_jitter(),
        )
        .finish();

    // Timeout sits outermost so a deadline also bounds the retries
    let op = match cfg.timeout {
        Some(timeout) => op.layer(opendal::layers::TimeoutLayer::new().with_timeout(timeout)),
        None => op,
    };

    Ok(op)
}

/// Build an operator from bak-core config.
///
/// Fails before any remote call if the config is incomplete (no bucket,
/// no endpoint, missing credentials) or violates `enforce_tls`.
pub fn build_from_core_config(storage: &bak_core::StorageConfig) -> Result<Operator> {
    storage.validate()?;

    build_operator(&OperatorConfig {
        endpoint: storage.endpoint.clone(),
        region: storage.region.clone(),
        bucket: storage.bucket.clone(),
        access_key_id: storage.access_key.clone(),
        secret_access_key: storage.secret_key.clone(),
        timeout: storage.timeout_secs.map(Duration::from_secs),
        max_retries: storage.max_retries,
    })
}

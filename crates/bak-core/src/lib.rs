pub mod config;
pub mod error;
pub mod types;

pub use config::{BakConfig, StorageConfig};
pub use error::{BakError, BakResult};
pub use types::RemoteObject;

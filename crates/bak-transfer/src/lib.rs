//! bak-transfer: the user-facing workflows
//!
//! Store:    read local → (derive key → seal envelope)? → put
//! Retrieve: get → envelope? → (derive key → open) → atomic local write
//! Delete / List: pass-through to the gateway

pub mod engine;
pub mod error;

pub use engine::{
    default_local_path, default_remote_key, delete_object, list_objects, retrieve_bytes,
    retrieve_file, store_bytes, store_file, RetrieveResult, Retrieved, StoreResult,
};
pub use error::{TransferError, TransferResult};

//! bak-storage: object store gateway (list/put/get/delete) over OpenDAL

pub mod error;
pub mod gateway;
pub mod operator;

pub use error::GatewayError;
pub use gateway::{Gateway, ProgressFn};
pub use operator::{build_from_core_config, build_operator, OperatorConfig};

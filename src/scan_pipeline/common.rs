pub mod config;
pub mod error;

pub use config::{
    BackendConfig,
    BackendConfigBuilder,
};

pub use error::{
    ScanError,
    Result,
};

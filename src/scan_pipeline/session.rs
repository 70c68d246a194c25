pub mod worker;
#[allow(clippy::module_inception)]
pub mod session;

mod tests;

pub use crate::scan_pipeline::common::config::{
    BackendConfig,
    BackendConfigBuilder,
};

pub use session::ScanSession;

pub use worker::ReaderWorker;

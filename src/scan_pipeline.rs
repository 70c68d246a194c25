//! Scanner calibration and pixel-reassembly pipeline
//!
//! This module turns the raw stripe stream of a line-sensor scanner into
//! canonical scanline-major pixel data, with separate modules for the
//! transport seam, sensor calibration, gamma tables, window geometry and
//! the streaming reassembler.

pub mod common;
pub mod transport;
pub mod device;
pub mod geometry;
pub mod calibration;
pub mod gamma;
pub mod reassembly;
pub mod session;

pub use common::{
    ScanError,
    Result,
};

pub use transport::{
    Transport,
    SenseInfo,
    SimScanner,
    SimProfile,
    SimProbe,
    SimCounters,
};

pub use device::{
    AsicGeneration,
    DeviceCaps,
    DeviceDescriptor,
    discover,
};

pub use geometry::{
    ColorMode,
    PixelFormat,
    ScanGeometry,
    ScanParameters,
    ScanRequest,
    Source,
};

pub use calibration::{
    CalibrationFormat,
    Calibrator,
    ShadingTables,
};

pub use gamma::{
    GammaCurves,
    GammaTables,
};

pub use session::{
    BackendConfig,
    BackendConfigBuilder,
    ScanSession,
};

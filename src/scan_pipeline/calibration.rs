pub mod format;
pub mod acquire;
pub mod reduce;
pub mod targets;
pub mod upload;
pub mod calibrate;


pub use format::{
    CalibrationFormat,
    read_calibration_format,
    CAL_FORMAT_LEN,
};

pub use reduce::sort_and_average;

pub use targets::{
    WHITE_MAP_RANGE,
    INVALID_TARGET,
    white_target_looks_swapped,
};

pub use upload::CalibrationUploadStrategy;

pub use calibrate::{
    Calibrator,
    ShadingTables,
};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Transport failure: {0}")]
    Transport(String),

    #[error("Short transfer: expected {expected} bytes, got {got}")]
    ShortTransfer { expected: usize, got: usize },

    #[error("Device not ready after {0} polls")]
    NotReady(usize),

    #[error("Device busy")]
    Busy,

    #[error("No documents in the feeder")]
    NoDocuments,

    #[error("Document jammed in the feeder")]
    Jammed,

    #[error("Device sense: {0}")]
    HardwareSense(String),

    #[error("Invalid calibration format: {0}")]
    InvalidCalibrationFormat(String),

    #[error("Invalid scan window: {0}")]
    InvalidWindow(String),

    #[error("No scan in progress")]
    NotActive,

    #[error("Scan cancelled")]
    Cancelled,

    #[error("Out of memory allocating {0} bytes")]
    OutOfMemory(usize),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ScanError>;

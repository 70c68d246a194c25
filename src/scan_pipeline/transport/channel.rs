//! Byte-oriented command/response channel to the scanner hardware.
//!
//! The wire framing (SCSI command transmission, USB bulk transfers,
//! parallel-port strobing) lives behind this trait; the pipeline only sees
//! opaque command buffers, response payloads and a sense side-channel.

use crate::scan_pipeline::common::{Result, ScanError};

/// Status retrieved from the device's sense/error side-channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SenseInfo {
    Good,
    /// Lamp still warming up; retryable.
    LampWarming,
    /// Media transport not settled yet; retryable.
    MediaNotReady,
    /// ADF hopper is empty.
    NoMedia,
    /// Paper jammed in the feeder.
    Jammed,
    /// Fatal hardware condition with a human-readable sense description.
    Hardware(String),
}

impl SenseInfo {
    pub fn is_retryable(&self) -> bool {
        matches!(self, SenseInfo::LampWarming | SenseInfo::MediaNotReady)
    }

    /// Map a non-good sense to the error surfaced to the consumer. Media
    /// conditions stay distinguishable from generic hardware faults.
    pub fn into_error(self) -> ScanError {
        match self {
            SenseInfo::Good => ScanError::Transport("good sense treated as error".into()),
            SenseInfo::LampWarming | SenseInfo::MediaNotReady => ScanError::Busy,
            SenseInfo::NoMedia => ScanError::NoDocuments,
            SenseInfo::Jammed => ScanError::Jammed,
            SenseInfo::Hardware(code) => ScanError::HardwareSense(code),
        }
    }
}

/// Command/response channel with a bounded single-transfer size.
///
/// `receive` must return exactly `expected` bytes or fail; partial data is
/// never handed upwards. Requests larger than `max_transfer()` have to be
/// chunked by the caller, re-issuing the command per chunk.
pub trait Transport: Send {
    fn send(&mut self, cmd: &[u8], payload: &[u8]) -> Result<()>;

    fn receive(&mut self, cmd: &[u8], expected: usize) -> Result<Vec<u8>>;

    fn max_transfer(&self) -> usize;

    fn sense(&mut self) -> Result<SenseInfo>;
}

//! Raw shading-line acquisition.

use tracing::debug;

use crate::scan_pipeline::calibration::format::CalibrationFormat;
use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::commands::{self, DATA_SHADING_DARK, DATA_SHADING_WHITE};
use crate::scan_pipeline::transport::channel::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShadingKind {
    Dark,
    White,
}

impl ShadingKind {
    fn data_type(self) -> u8 {
        match self {
            ShadingKind::Dark => DATA_SHADING_DARK,
            ShadingKind::White => DATA_SHADING_WHITE,
        }
    }
}

/// Pull the complete raw calibration buffer through the transport, chunked
/// against its maximum transfer size. A zero-length read before the buffer
/// is complete fails the calibration.
pub fn acquire_shading_lines(
    transport: &mut dyn Transport,
    format: &CalibrationFormat,
    kind: ShadingKind,
) -> Result<Vec<u8>> {
    let total = format.raw_buffer_len();
    let mut raw = Vec::new();
    raw.try_reserve_exact(total)
        .map_err(|_| ScanError::OutOfMemory(total))?;

    debug!(?kind, total, "acquiring shading lines");
    while raw.len() < total {
        let want = (total - raw.len()).min(transport.max_transfer());
        let cmd = commands::read_cmd(kind.data_type(), 0, want);
        let chunk = transport.receive(&cmd, want)?;
        if chunk.is_empty() {
            return Err(ScanError::ShortTransfer {
                expected: total,
                got: raw.len(),
            });
        }
        raw.extend_from_slice(&chunk);
    }
    Ok(raw)
}

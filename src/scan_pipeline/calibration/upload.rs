//! Shading-table upload.
//!
//! Re-encodes the corrected tables into the device wire format. Two
//! strategies: one combined transfer (optionally bit-packing dark into the
//! white words) or three independent per-channel transfers. Any transfer
//! failure aborts the whole calibration; the caller retries the scan start,
//! not the failed sub-transfer.

use tracing::debug;

use crate::scan_pipeline::calibration::format::CalibrationFormat;
use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::device::commands::{self, DATA_SHADING_TABLE};
use crate::scan_pipeline::transport::channel::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalibrationUploadStrategy {
    SingleCommand,
    PerChannel,
}

impl CalibrationUploadStrategy {
    /// Ability flag from the calibration header, with a device-family
    /// override for models that only accept the combined form.
    pub fn select(format: &CalibrationFormat, caps: &DeviceCaps) -> Self {
        if caps.one_calibration_command || format.single_command() {
            CalibrationUploadStrategy::SingleCommand
        } else {
            CalibrationUploadStrategy::PerChannel
        }
    }
}

/// Device-specific bit packing: dark rides in the low 6 bits of each white
/// word. Must be reproduced exactly for hardware compatibility.
pub fn merge_dark_bits(white: u16, dark: u16) -> u16 {
    (white & 0xFFC0) | ((dark >> 10) & 0x3F)
}

fn send_in_chunks(
    transport: &mut dyn Transport,
    qualifier: u8,
    wire: &[u8],
) -> Result<()> {
    let cap = transport.max_transfer();
    for chunk in wire.chunks(cap) {
        let cmd = commands::send_cmd(DATA_SHADING_TABLE, qualifier, chunk.len());
        transport.send(&cmd, chunk)?;
    }
    Ok(())
}

/// Encode and send the corrected shading tables. Values travel as u16
/// little-endian; internally they are kept in native order and only
/// converted here.
pub fn upload_shading(
    transport: &mut dyn Transport,
    format: &CalibrationFormat,
    strategy: CalibrationUploadStrategy,
    dark: &[u16],
    white: &[u16],
) -> Result<()> {
    debug!(?strategy, positions = white.len(), "uploading shading tables");
    match strategy {
        CalibrationUploadStrategy::SingleCommand => {
            let total = white.len() * 2;
            let mut wire = Vec::new();
            wire.try_reserve_exact(total)
                .map_err(|_| ScanError::OutOfMemory(total))?;
            for (i, &w) in white.iter().enumerate() {
                let value = if format.dark_merge() {
                    merge_dark_bits(w, dark[i])
                } else {
                    w
                };
                wire.extend_from_slice(&value.to_le_bytes());
            }
            send_in_chunks(transport, 0, &wire)
        }
        CalibrationUploadStrategy::PerChannel => {
            let channels = format.channels;
            for ch in 0..channels {
                let total = white.len() / channels * 2;
                let mut wire = Vec::new();
                wire.try_reserve_exact(total)
                    .map_err(|_| ScanError::OutOfMemory(total))?;
                for &w in white.iter().skip(ch).step_by(channels) {
                    wire.extend_from_slice(&w.to_le_bytes());
                }
                send_in_chunks(transport, ch as u8, &wire)?;
            }
            Ok(())
        }
    }
}

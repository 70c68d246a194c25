//! Calibration format header.
//!
//! One fixed 32-byte read describes the geometry of a calibration scan:
//! how many pixels per line, how many redundant reads, what the firmware
//! wants the shading to converge to.

use tracing::debug;

use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::commands::{self, get_u16_le};
use crate::scan_pipeline::transport::channel::Transport;

pub const CAL_FORMAT_LEN: usize = 32;

/// Header layout (little-endian where multi-byte):
///
/// ```text
/// 0..2    pixels per calibration line, u16
/// 2       bytes per channel sample (1 or 2)
/// 3       redundant line count (color: R+G+B lines concatenated)
/// 4       ability flags
/// 5..8    per-channel analog gains
/// 8..14   white shading targets, u16 x 3
/// 14..20  dark shading targets, u16 x 3
/// 20..32  reserved
/// ```
const FMT_PIXELS: usize = 0;
const FMT_BYTES_PER_CHANNEL: usize = 2;
const FMT_LINE_COUNT: usize = 3;
const FMT_FLAGS: usize = 4;
const FMT_GAINS: usize = 5;
const FMT_WHITE_TARGETS: usize = 8;
const FMT_DARK_TARGETS: usize = 14;

pub const ABILITY_NEEDS_DARK: u8 = 0x01;
pub const ABILITY_MULTI_CHANNEL: u8 = 0x02;
pub const ABILITY_SINGLE_COMMAND: u8 = 0x04;
pub const ABILITY_DARK_MERGE: u8 = 0x08;

/// Decoded calibration geometry. Read-only once created; lives for one
/// calibration pass.
#[derive(Debug, Clone)]
pub struct CalibrationFormat {
    pub pixels_per_line: usize,
    pub bytes_per_channel: usize,
    /// Logical redundant reads per channel (the wire value is divided by 3
    /// for color formats).
    pub line_count: usize,
    pub channels: usize,
    pub flags: u8,
    pub gains: [u8; 3],
    pub white_targets: [u16; 3],
    pub dark_targets: [u16; 3],
}

impl CalibrationFormat {
    pub fn needs_dark(&self) -> bool {
        self.flags & ABILITY_NEEDS_DARK != 0
    }

    pub fn single_command(&self) -> bool {
        self.flags & ABILITY_SINGLE_COMMAND != 0
    }

    pub fn dark_merge(&self) -> bool {
        self.flags & ABILITY_DARK_MERGE != 0
    }

    /// (pixel, channel) positions in one calibration line.
    pub fn positions(&self) -> usize {
        self.pixels_per_line * self.channels
    }

    /// Bytes in the whole raw calibration buffer. Color formats deliver
    /// `line_count` reads per channel, line-interleaved.
    pub fn raw_buffer_len(&self) -> usize {
        self.line_count * self.positions() * self.bytes_per_channel
    }
}

pub fn decode_calibration_format(header: &[u8], color: bool) -> Result<CalibrationFormat> {
    if header.len() < CAL_FORMAT_LEN {
        return Err(ScanError::ShortTransfer {
            expected: CAL_FORMAT_LEN,
            got: header.len(),
        });
    }

    let flags = header[FMT_FLAGS];
    let multi_channel = color || flags & ABILITY_MULTI_CHANNEL != 0;
    let channels = if multi_channel { 3 } else { 1 };

    // A malformed header fails the calibration step, never the process.
    let bytes_per_channel = header[FMT_BYTES_PER_CHANNEL] as usize;
    if bytes_per_channel != 1 && bytes_per_channel != 2 {
        return Err(ScanError::InvalidCalibrationFormat(format!(
            "bytes per channel must be 1 or 2, got {bytes_per_channel}"
        )));
    }

    let pixels_per_line = get_u16_le(header, FMT_PIXELS) as usize;
    if pixels_per_line == 0 {
        return Err(ScanError::InvalidCalibrationFormat(
            "zero pixels per line".into(),
        ));
    }

    // The firmware reports R+G+B redundant lines concatenated: 3*N physical
    // lines are N logical reads.
    let wire_lines = header[FMT_LINE_COUNT] as usize;
    let line_count = if multi_channel { wire_lines / 3 } else { wire_lines };
    if line_count == 0 {
        return Err(ScanError::InvalidCalibrationFormat(format!(
            "no redundant reads ({wire_lines} wire lines for {channels} channels)"
        )));
    }

    let mut white_targets = [0u16; 3];
    let mut dark_targets = [0u16; 3];
    for ch in 0..3 {
        white_targets[ch] = get_u16_le(header, FMT_WHITE_TARGETS + 2 * ch);
        dark_targets[ch] = get_u16_le(header, FMT_DARK_TARGETS + 2 * ch);
    }

    let format = CalibrationFormat {
        pixels_per_line,
        bytes_per_channel,
        line_count,
        channels,
        flags,
        gains: [header[FMT_GAINS], header[FMT_GAINS + 1], header[FMT_GAINS + 2]],
        white_targets,
        dark_targets,
    };
    debug!(?format, "decoded calibration format");
    Ok(format)
}

/// Issue the fixed-size format read. Any transport error or short read
/// fails the whole calibration step.
pub fn read_calibration_format(
    transport: &mut dyn Transport,
    color: bool,
) -> Result<CalibrationFormat> {
    let cmd = commands::read_cmd(commands::DATA_CAL_FORMAT, 0, CAL_FORMAT_LEN);
    let header = transport.receive(&cmd, CAL_FORMAT_LEN)?;
    decode_calibration_format(&header, color)
}

/// Encode a header, for the simulated device and the decode tests.
pub fn encode_calibration_format(
    pixels_per_line: u16,
    bytes_per_channel: u8,
    wire_line_count: u8,
    flags: u8,
    gains: [u8; 3],
    white_targets: [u16; 3],
    dark_targets: [u16; 3],
) -> [u8; CAL_FORMAT_LEN] {
    let mut header = [0u8; CAL_FORMAT_LEN];
    commands::put_u16_le(&mut header, FMT_PIXELS, pixels_per_line);
    header[FMT_BYTES_PER_CHANNEL] = bytes_per_channel;
    header[FMT_LINE_COUNT] = wire_line_count;
    header[FMT_FLAGS] = flags;
    header[FMT_GAINS..FMT_GAINS + 3].copy_from_slice(&gains);
    for ch in 0..3 {
        commands::put_u16_le(&mut header, FMT_WHITE_TARGETS + 2 * ch, white_targets[ch]);
        commands::put_u16_le(&mut header, FMT_DARK_TARGETS + 2 * ch, dark_targets[ch]);
    }
    header
}

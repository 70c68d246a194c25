//! Simulated scanner.
//!
//! A deterministic in-memory device speaking the same command set as real
//! hardware: it serves the calibration format header, noisy shading lines,
//! and a raw image stream with the color read-head offsets applied, so the
//! whole pipeline can run end to end without hardware.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::scan_pipeline::calibration::format::{
    encode_calibration_format, ABILITY_NEEDS_DARK, ABILITY_SINGLE_COMMAND, CAL_FORMAT_LEN,
};
use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::caps::{DeviceCaps, DeviceProbe, InquiryRecord};
use crate::scan_pipeline::device::commands::{
    self, DATA_CAL_FORMAT, DATA_GAMMA, DATA_IMAGE, DATA_SHADING_DARK, DATA_SHADING_TABLE,
    DATA_SHADING_WHITE, OP_MEDIA_EJECT, OP_READ, OP_SEND, OP_SET_WINDOW, OP_START_SCAN,
};
use crate::scan_pipeline::geometry::types::ColorMode;
use crate::scan_pipeline::geometry::window::{decode_window, line_difference_for, WindowView};
use crate::scan_pipeline::transport::channel::{SenseInfo, Transport};

/// Knobs for one simulated device.
#[derive(Debug, Clone)]
pub struct SimProfile {
    pub caps: DeviceCaps,
    pub color: bool,
    pub cal_pixels: u16,
    pub cal_bytes_per_channel: u8,
    /// Wire value: physical redundant lines (R+G+B concatenated for color).
    pub cal_wire_lines: u8,
    pub cal_flags: u8,
    pub white_targets: [u16; 3],
    pub dark_targets: [u16; 3],
    /// Mean 16-bit levels the shading lines scatter around.
    pub white_level: u16,
    pub dark_level: u16,
    /// Sense polls answered "lamp warming" before the device reports ready.
    pub busy_polls: usize,
    pub no_media: bool,
    pub max_transfer: usize,
}

impl SimProfile {
    pub fn flatbed_color() -> Self {
        SimProfile {
            caps: DeviceCaps::flatbed_colorpack(),
            color: true,
            cal_pixels: 256,
            cal_bytes_per_channel: 2,
            cal_wire_lines: 18,
            cal_flags: ABILITY_NEEDS_DARK | ABILITY_SINGLE_COMMAND,
            white_targets: [0xF000, 0xF200, 0xF400],
            dark_targets: [0x0040, 0x0040, 0x0040],
            white_level: 0xE000,
            dark_level: 0x0100,
            busy_polls: 0,
            no_media: false,
            max_transfer: 65536,
        }
    }

    pub fn sheetfed() -> Self {
        SimProfile {
            caps: DeviceCaps::sheetfed_linepack(),
            color: true,
            cal_pixels: 256,
            cal_bytes_per_channel: 1,
            cal_wire_lines: 12,
            cal_flags: ABILITY_NEEDS_DARK,
            white_targets: [0xF000; 3],
            dark_targets: [0x0040; 3],
            white_level: 0xE000,
            dark_level: 0x0100,
            busy_polls: 0,
            no_media: false,
            max_transfer: 65536,
        }
    }
}

/// Command counters, shared so tests keep visibility after the scanner is
/// boxed behind the `Transport` trait.
#[derive(Debug, Default)]
pub struct SimCounters {
    pub ejects: AtomicUsize,
    pub shading_uploads: AtomicUsize,
    pub gamma_bytes: [AtomicUsize; 3],
    pub windows_set: AtomicUsize,
    pub scans_started: AtomicUsize,
}

pub struct SimScanner {
    profile: SimProfile,
    counters: Arc<SimCounters>,
    window: Option<WindowView>,
    line_difference: usize,
    image_cursor: usize,
    dark_cursor: usize,
    white_cursor: usize,
    busy_left: usize,
}

impl SimScanner {
    pub fn new(profile: SimProfile) -> Self {
        let busy_left = profile.busy_polls;
        SimScanner {
            profile,
            counters: Arc::new(SimCounters::default()),
            window: None,
            line_difference: 0,
            image_cursor: 0,
            dark_cursor: 0,
            white_cursor: 0,
            busy_left,
        }
    }

    pub fn counters(&self) -> Arc<SimCounters> {
        Arc::clone(&self.counters)
    }

    /// Reference document pixel, so tests can check reassembled output.
    pub fn doc_rgb(x: usize, y: usize) -> [u8; 3] {
        [
            (x.wrapping_mul(7).wrapping_add(y.wrapping_mul(3))) as u8,
            (x.wrapping_mul(5).wrapping_add(y.wrapping_mul(11))) as u8,
            (x.wrapping_mul(13).wrapping_add(y)) as u8,
        ]
    }

    pub fn doc_gray(x: usize, y: usize) -> u8 {
        (x.wrapping_mul(3).wrapping_add(y.wrapping_mul(7))) as u8
    }

    fn jitter(index: usize) -> u16 {
        ((index as u32).wrapping_mul(2654435761) >> 24) as u16 & 0x3F
    }

    fn shading_byte(&self, level: u16, byte_index: usize) -> u8 {
        if self.profile.cal_bytes_per_channel == 2 {
            // Little-endian sample stream; jitter is per sample, not per byte.
            let value = level.wrapping_add(Self::jitter(byte_index / 2));
            value.to_le_bytes()[byte_index % 2]
        } else {
            let value = level.wrapping_add(Self::jitter(byte_index));
            (value >> 8) as u8
        }
    }

    fn shading_chunk(&self, level: u16, cursor: usize, len: usize) -> Vec<u8> {
        (cursor..cursor + len)
            .map(|i| self.shading_byte(level, i))
            .collect()
    }

    fn mode_from_window(window: &WindowView) -> ColorMode {
        match (window.channels, window.depth) {
            (3, 16) => ColorMode::Color16,
            (3, _) => ColorMode::Color,
            (_, 16) => ColorMode::Gray16,
            (_, 1) => ColorMode::Lineart,
            _ => ColorMode::Gray,
        }
    }

    /// One byte of the raw image stream. Color-pack devices deliver, on raw
    /// row `j`, red of document row `j`, green of `j - offset`, blue of
    /// `j - 2*offset`; rows before the document start read as zero.
    fn image_byte(&self, window: &WindowView, index: usize) -> u8 {
        let bpl = window.bytes_per_line();
        let row = index / bpl;
        let at = index % bpl;
        let bpc = (window.depth as usize / 8).max(1);

        if window.channels == 3 {
            if self.profile.caps.line_pack {
                let sub_row = bpl / 3;
                let channel = at / sub_row;
                let x = at % sub_row / bpc;
                return Self::doc_rgb(x, row)[channel];
            }
            let offset = self.line_difference / 3;
            let pos = at / bpc;
            let channel = pos % 3;
            let x = pos / 3;
            let doc_row = row as isize - (channel * offset) as isize;
            if doc_row < 0 {
                return 0;
            }
            Self::doc_rgb(x, doc_row as usize)[channel]
        } else {
            let x = at / bpc;
            Self::doc_gray(x, row)
        }
    }
}

impl Transport for SimScanner {
    fn send(&mut self, cmd: &[u8], payload: &[u8]) -> Result<()> {
        match commands::opcode(cmd) {
            OP_SET_WINDOW => {
                let window = decode_window(payload);
                let mode = Self::mode_from_window(&window);
                self.line_difference =
                    line_difference_for(mode, window.yres as u32, &self.profile.caps);
                self.window = Some(window);
                self.counters.windows_set.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            OP_START_SCAN => {
                if self.window.is_none() {
                    return Err(ScanError::Transport("scan started without window".into()));
                }
                self.image_cursor = 0;
                self.counters.scans_started.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            OP_MEDIA_EJECT => {
                self.counters.ejects.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            OP_SEND => match commands::data_type(cmd) {
                DATA_GAMMA => {
                    let ch = commands::qualifier(cmd) as usize % 3;
                    self.counters.gamma_bytes[ch].fetch_add(payload.len(), Ordering::SeqCst);
                    Ok(())
                }
                DATA_SHADING_TABLE => {
                    self.counters.shading_uploads.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }
                other => Err(ScanError::Transport(format!(
                    "unsupported send data type {other:#x}"
                ))),
            },
            other => Err(ScanError::Transport(format!("unsupported opcode {other:#x}"))),
        }
    }

    fn receive(&mut self, cmd: &[u8], expected: usize) -> Result<Vec<u8>> {
        if commands::opcode(cmd) != OP_READ {
            return Err(ScanError::Transport("receive without read command".into()));
        }
        if expected > self.profile.max_transfer {
            return Err(ScanError::Transport(format!(
                "transfer of {expected} bytes exceeds device maximum"
            )));
        }
        match commands::data_type(cmd) {
            DATA_CAL_FORMAT => {
                let header = encode_calibration_format(
                    self.profile.cal_pixels,
                    self.profile.cal_bytes_per_channel,
                    self.profile.cal_wire_lines,
                    self.profile.cal_flags,
                    [0x10, 0x10, 0x10],
                    self.profile.white_targets,
                    self.profile.dark_targets,
                );
                Ok(header[..expected.min(CAL_FORMAT_LEN)].to_vec())
            }
            DATA_SHADING_DARK => {
                let chunk = self.shading_chunk(self.profile.dark_level, self.dark_cursor, expected);
                self.dark_cursor += expected;
                Ok(chunk)
            }
            DATA_SHADING_WHITE => {
                let chunk =
                    self.shading_chunk(self.profile.white_level, self.white_cursor, expected);
                self.white_cursor += expected;
                Ok(chunk)
            }
            DATA_IMAGE => {
                let window = self
                    .window
                    .ok_or_else(|| ScanError::Transport("image read without window".into()))?;
                let total = window.bytes_per_line() * window.total_lines;
                if self.image_cursor + expected > total {
                    return Err(ScanError::ShortTransfer {
                        expected,
                        got: total.saturating_sub(self.image_cursor),
                    });
                }
                let chunk: Vec<u8> = (self.image_cursor..self.image_cursor + expected)
                    .map(|i| self.image_byte(&window, i))
                    .collect();
                self.image_cursor += expected;
                Ok(chunk)
            }
            other => Err(ScanError::Transport(format!(
                "unsupported read data type {other:#x}"
            ))),
        }
    }

    fn max_transfer(&self) -> usize {
        self.profile.max_transfer
    }

    fn sense(&mut self) -> Result<SenseInfo> {
        if self.profile.no_media {
            return Ok(SenseInfo::NoMedia);
        }
        if self.busy_left > 0 {
            self.busy_left -= 1;
            return Ok(SenseInfo::LampWarming);
        }
        Ok(SenseInfo::Good)
    }
}

/// Probe reporting the simulated models, for `discover`.
pub struct SimProbe;

impl DeviceProbe for SimProbe {
    fn inquire(&self) -> Vec<InquiryRecord> {
        vec![
            InquiryRecord {
                id: "sim:0".into(),
                vendor: "SimTek".into(),
                model: "SimTek FB1200".into(),
            },
            InquiryRecord {
                id: "sim:1".into(),
                vendor: "SimTek".into(),
                model: "SimTek SF600".into(),
            },
        ]
    }
}

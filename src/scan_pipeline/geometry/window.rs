//! Window/geometry programming.
//!
//! Translates the requested scan area into device-native units, derives the
//! line difference the reassembler needs, and encodes the window block sent
//! to the device.

use tracing::debug;

use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::device::commands::{get_u16_be, put_u16_be};
use crate::scan_pipeline::geometry::types::{
    ColorMode, PixelFormat, ScanParameters, ScanRequest,
};

/// Window block layout, all values big-endian:
///
/// ```text
/// 0..2    x resolution, dpi
/// 2..4    y resolution, dpi
/// 4..6    left edge, pixels at x resolution
/// 6..8    top edge, lines at y resolution
/// 8..10   width, pixels
/// 10..12  height, lines (includes the line difference)
/// 12      channel count
/// 13      depth, bits per channel
/// 14..16  reserved
/// ```
pub const WINDOW_BLOCK_LEN: usize = 16;

const WIN_XRES: usize = 0;
const WIN_YRES: usize = 2;
const WIN_LEFT: usize = 4;
const WIN_TOP: usize = 6;
const WIN_WIDTH: usize = 8;
const WIN_HEIGHT: usize = 10;
const WIN_CHANNELS: usize = 12;
const WIN_DEPTH: usize = 13;

#[derive(Debug, Clone)]
pub struct ScanGeometry {
    pub xres: u32,
    pub yres: u32,
    /// Left/top of the window, in pixels/lines at the requested resolution.
    pub left: usize,
    pub top: usize,
    pub mode: ColorMode,
    /// Extra trailing lines the device must capture so every output row has
    /// all three color rows after de-offsetting.
    pub line_difference: usize,
    pub params: ScanParameters,
}

impl ScanGeometry {
    pub fn compute(req: &ScanRequest, caps: &DeviceCaps) -> Result<Self> {
        if req.xres == 0 || req.yres == 0 {
            return Err(ScanError::InvalidWindow("resolution must be non-zero".into()));
        }
        let (left, top) = req.top_left;
        let (right, bottom) = req.bottom_right;
        if right <= left || bottom <= top {
            return Err(ScanError::InvalidWindow(format!(
                "degenerate area ({left},{top})-({right},{bottom})"
            )));
        }
        if right > caps.max_width || bottom > caps.max_length {
            return Err(ScanError::InvalidWindow(format!(
                "area exceeds device maximum {}x{}",
                caps.max_width, caps.max_length
            )));
        }

        // Device units -> requested-resolution pixels.
        let scale_x = |v: u32| (v as u64 * req.xres as u64 / caps.base_dpi as u64) as usize;
        let scale_y = |v: u32| (v as u64 * req.yres as u64 / caps.base_dpi as u64) as usize;

        let boundary = caps.pixel_boundary.max(1) as usize;
        let mut pixels_per_line = scale_x(right - left);
        pixels_per_line -= pixels_per_line % boundary;
        if pixels_per_line == 0 {
            return Err(ScanError::InvalidWindow("window narrower than one pixel boundary".into()));
        }

        let mut lines = scale_y(bottom - top);
        if lines == 0 {
            return Err(ScanError::InvalidWindow("window shorter than one line".into()));
        }

        let line_difference = line_difference_for(req.mode, req.yres, caps);

        // The device captures `lines + line_difference` physical lines; if
        // that runs past the end of the bed, shorten the image instead.
        let top_lines = scale_y(top);
        let max_lines = scale_y(caps.max_length);
        if top_lines + lines + line_difference > max_lines {
            let available = max_lines.saturating_sub(top_lines + line_difference);
            if available == 0 {
                return Err(ScanError::InvalidWindow(
                    "no scan lines left after line-difference padding".into(),
                ));
            }
            debug!(lines, available, "shortening window for line-difference padding");
            lines = available;
        }

        let params = ScanParameters {
            pixels_per_line,
            bytes_per_line: req.mode.bytes_per_line(pixels_per_line),
            lines,
            depth: req.mode.depth(),
            format: if req.mode.is_color() { PixelFormat::Rgb } else { PixelFormat::Gray },
        };

        Ok(ScanGeometry {
            xres: req.xres,
            yres: req.yres,
            left: scale_x(left),
            top: top_lines,
            mode: req.mode,
            line_difference,
            params,
        })
    }

    /// Physical lines the device will deliver for this window.
    pub fn total_raw_lines(&self) -> usize {
        self.params.lines + self.line_difference
    }

    pub fn encode_window(&self) -> [u8; WINDOW_BLOCK_LEN] {
        let mut block = [0u8; WINDOW_BLOCK_LEN];
        put_u16_be(&mut block, WIN_XRES, self.xres as u16);
        put_u16_be(&mut block, WIN_YRES, self.yres as u16);
        put_u16_be(&mut block, WIN_LEFT, self.left as u16);
        put_u16_be(&mut block, WIN_TOP, self.top as u16);
        put_u16_be(&mut block, WIN_WIDTH, self.params.pixels_per_line as u16);
        put_u16_be(&mut block, WIN_HEIGHT, self.total_raw_lines() as u16);
        block[WIN_CHANNELS] = self.mode.channels() as u8;
        block[WIN_DEPTH] = self.params.depth as u8;
        block
    }
}

/// Head-offset padding at the requested resolution, rounded down to a
/// multiple of 3 so channel alignment survives stripe boundaries. Zero for
/// gray modes, hardware-packed devices and the defect-flagged generations.
pub fn line_difference_for(mode: ColorMode, yres: u32, caps: &DeviceCaps) -> usize {
    if !mode.is_color() || !caps.needs_software_colorpack || caps.line_difference_defect {
        return 0;
    }
    let scaled = (caps.head_offset_lines as u64 * yres as u64 / caps.optical_yres as u64) as usize;
    scaled - scaled % 3
}

/// Decoded view of a window block, as the device firmware sees it. Used by
/// the simulated scanner and the wire tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowView {
    pub xres: u16,
    pub yres: u16,
    pub width: usize,
    pub total_lines: usize,
    pub channels: usize,
    pub depth: u32,
}

impl WindowView {
    pub fn bytes_per_line(&self) -> usize {
        match self.depth {
            1 => self.width / 8,
            d => self.width * self.channels * (d as usize / 8),
        }
    }
}

pub fn decode_window(block: &[u8]) -> WindowView {
    WindowView {
        xres: get_u16_be(block, WIN_XRES),
        yres: get_u16_be(block, WIN_YRES),
        width: get_u16_be(block, WIN_WIDTH) as usize,
        total_lines: get_u16_be(block, WIN_HEIGHT) as usize,
        channels: block[WIN_CHANNELS] as usize,
        depth: block[WIN_DEPTH] as u32,
    }
}

//! Raw-order to canonical-order reassembly.
//!
//! Two scrambled delivery orders exist: color-pack (RGB interleaved rows
//! whose three read-heads are vertically offset by `line_difference / 3`
//! lines each) and line-pack (one line delivered as three concatenated
//! channel rows). A third mode passes already-canonical data through.

use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::geometry::types::ColorMode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorderMode {
    Passthrough,
    ColorPack,
    LinePack,
}

impl ReorderMode {
    pub fn select(caps: &DeviceCaps, mode: ColorMode) -> Self {
        if !mode.is_color() {
            return ReorderMode::Passthrough;
        }
        if caps.line_pack {
            ReorderMode::LinePack
        } else if caps.needs_software_colorpack {
            ReorderMode::ColorPack
        } else {
            ReorderMode::Passthrough
        }
    }
}

/// De-offset the three read-heads: for every output pixel, red comes from
/// the current raw line, green from `line_difference/3` lines later, blue
/// from twice that. With zero offset this degenerates to a straight copy.
///
/// `stripe` must hold at least `out_lines * bytes_per_line` bytes plus the
/// `line_difference` overlap lines behind them.
pub fn color_pack(
    stripe: &[u8],
    bytes_per_line: usize,
    line_difference: usize,
    out_lines: usize,
    out: &mut Vec<u8>,
) {
    let c_offset = line_difference / 3 * bytes_per_line;
    let triplets = out_lines * bytes_per_line / 3;
    out.reserve(out_lines * bytes_per_line);
    for i in 0..triplets {
        out.push(stripe[3 * i]);
        out.push(stripe[c_offset + 3 * i + 1]);
        out.push(stripe[2 * c_offset + 3 * i + 2]);
    }
}

/// Interleave `[R row][G row][B row]` delivery into RGB pixels, one line at
/// a time. `bytes_per_channel` is 1 or 2; 16-bit samples move as a unit.
pub fn line_pack(
    stripe: &[u8],
    bytes_per_line: usize,
    out_lines: usize,
    bytes_per_channel: usize,
    out: &mut Vec<u8>,
) {
    let sub_row = bytes_per_line / 3;
    let pixels = sub_row / bytes_per_channel;
    out.reserve(out_lines * bytes_per_line);
    for line in 0..out_lines {
        let row = &stripe[line * bytes_per_line..(line + 1) * bytes_per_line];
        let (red, rest) = row.split_at(sub_row);
        let (green, blue) = rest.split_at(sub_row);
        for p in 0..pixels {
            let at = p * bytes_per_channel;
            out.extend_from_slice(&red[at..at + bytes_per_channel]);
            out.extend_from_slice(&green[at..at + bytes_per_channel]);
            out.extend_from_slice(&blue[at..at + bytes_per_channel]);
        }
    }
}

/// Device already delivers final row order.
pub fn passthrough(stripe: &[u8], bytes_per_line: usize, out_lines: usize, out: &mut Vec<u8>) {
    out.extend_from_slice(&stripe[..out_lines * bytes_per_line]);
}

pub fn reorder(
    mode: ReorderMode,
    stripe: &[u8],
    bytes_per_line: usize,
    line_difference: usize,
    out_lines: usize,
    bytes_per_channel: usize,
    out: &mut Vec<u8>,
) {
    match mode {
        ReorderMode::Passthrough => passthrough(stripe, bytes_per_line, out_lines, out),
        ReorderMode::ColorPack => {
            color_pack(stripe, bytes_per_line, line_difference, out_lines, out)
        }
        ReorderMode::LinePack => {
            line_pack(stripe, bytes_per_line, out_lines, bytes_per_channel, out)
        }
    }
}

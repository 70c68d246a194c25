//! Per-line post-processing: ADF mirroring and the optional 16-bit
//! software shading correction.

use std::sync::Arc;

use crate::scan_pipeline::calibration::calibrate::ShadingTables;
use crate::scan_pipeline::calibration::targets::WHITE_MAP_RANGE;
use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::geometry::types::{ColorMode, Source};

/// How an output line gets mirrored for ADF delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorMode {
    None,
    /// Plain byte reverse. Also the color case when the device delivers
    /// BGR over the ADF: reversing the bytes flips the line and restores
    /// RGB order in one pass.
    Bytes,
    /// Element-aware reverse: pixels swap position, samples inside a pixel
    /// keep their channel order. Element size in bytes.
    Pixels(usize),
}

impl MirrorMode {
    pub fn select(caps: &DeviceCaps, mode: ColorMode, source: Source) -> Self {
        if source != Source::Adf || !caps.adf_mirrors_image {
            return MirrorMode::None;
        }
        let sample = mode.bytes_per_channel();
        if mode.is_color() {
            if caps.adf_delivers_bgr && sample == 1 {
                MirrorMode::Bytes
            } else {
                MirrorMode::Pixels(sample * 3)
            }
        } else if sample == 1 {
            MirrorMode::Bytes
        } else {
            MirrorMode::Pixels(sample)
        }
    }

    pub fn apply(self, line: &mut [u8]) {
        match self {
            MirrorMode::None => {}
            MirrorMode::Bytes => mirror_line_bytes(line),
            MirrorMode::Pixels(element) => mirror_line_pixels(line, element),
        }
    }
}

pub fn mirror_line_bytes(line: &mut [u8]) {
    line.reverse();
}

/// Reverse a line in `element`-sized units, preserving byte order inside
/// each unit.
pub fn mirror_line_pixels(line: &mut [u8], element: usize) {
    debug_assert!(element > 0 && line.len() % element == 0);
    let pixels = line.len() / element;
    for i in 0..pixels / 2 {
        let j = pixels - 1 - i;
        for b in 0..element {
            line.swap(i * element + b, j * element + b);
        }
    }
}

/// Software dark/white correction for 16-bit modes, per output sample:
/// subtract the residual dark level, scale by the white gain, clamp to 16
/// bits. Samples are little-endian in the line and written back in place.
///
/// The mapping is positional: sample `i` uses table position `i`, so the
/// tables must cover exactly one output line. The session only hands tables
/// over when the calibration width matches the scan window.
///
/// Kept pluggable but off by default; the hardware path never exercised it.
pub fn apply_16bit_shading(line: &mut [u8], shading: &Arc<ShadingTables>) {
    let positions = shading.positions();
    if positions == 0 {
        return;
    }
    for (i, sample) in line.chunks_exact_mut(2).enumerate() {
        let pos = i % positions;
        let raw = u16::from_le_bytes([sample[0], sample[1]]);
        let leveled = raw.saturating_sub(shading.dark[pos]) as u64;
        let corrected = leveled * shading.white[pos] as u64 / WHITE_MAP_RANGE as u64;
        let clamped = corrected.min(u16::MAX as u64) as u16;
        sample.copy_from_slice(&clamped.to_le_bytes());
    }
}

//! Shading-target computation.
//!
//! Turns reduced dark/white vectors into the per-pixel corrections the
//! device (or the 16-bit software path) applies: subtractive for dark,
//! multiplicative for white. Sentinel-invalid firmware values are expected
//! on cheaper hardware and recovered locally, never surfaced as failures.

use tracing::warn;

use crate::scan_pipeline::calibration::format::CalibrationFormat;
use crate::scan_pipeline::device::caps::DeviceCaps;

/// Full scale of the multiplicative white map.
pub const WHITE_MAP_RANGE: u16 = 0x4FFF;

/// Firmware did not measure this value; substitute a default.
pub const INVALID_TARGET: u16 = 0xFFFF;

/// Substitute for a sentinel-invalid reduced white reading.
const DEFAULT_WHITE_RAW: u16 = 0x8000;

/// Any real white target sits in the top of the 16-bit range; a value below
/// this watermark is a byte-swapped report from buggy firmware.
const SWAPPED_TARGET_WATERMARK: u16 = 0xA000;

/// Byte-swap heuristic for white targets, kept as its own predicate because
/// its generality across firmware revisions is unknown.
pub fn white_target_looks_swapped(target: u16) -> bool {
    target < SWAPPED_TARGET_WATERMARK
}

/// Resolve the three dark targets: header value unless sentinel-invalid,
/// else the inquiry-level default. Single-channel formats broadcast their
/// one target to all three slots.
pub fn resolve_dark_targets(format: &CalibrationFormat, caps: &DeviceCaps) -> [u16; 3] {
    let mut targets = [0u16; 3];
    for ch in 0..3 {
        let raw = if format.channels == 1 {
            format.dark_targets[0]
        } else {
            format.dark_targets[ch]
        };
        targets[ch] = if raw == INVALID_TARGET {
            caps.default_dark_target
        } else {
            raw
        };
    }
    targets
}

/// Resolve the three white targets: sentinel substitution plus the
/// byte-swap workaround.
pub fn resolve_white_targets(format: &CalibrationFormat, caps: &DeviceCaps) -> [u16; 3] {
    let mut targets = [0u16; 3];
    for ch in 0..3 {
        let raw = if format.channels == 1 {
            format.white_targets[0]
        } else {
            format.white_targets[ch]
        };
        targets[ch] = if raw == INVALID_TARGET {
            caps.default_white_target
        } else if white_target_looks_swapped(raw) {
            warn!(channel = ch, target = format!("{raw:#06x}"), "byte-swapped white target");
            raw.swap_bytes()
        } else {
            raw
        };
    }
    targets
}

/// Dark pass, in place: `out = max(0, raw - target)`. The vector is
/// channel-interleaved, so position `i` belongs to channel `i % 3` (gray
/// formats broadcast, making the index irrelevant).
pub fn apply_dark_shading(reduced: &mut [u16], targets: &[u16; 3]) {
    for (i, value) in reduced.iter_mut().enumerate() {
        *value = value.saturating_sub(targets[i % 3]);
    }
}

/// White pass, in place: `out = target * WHITE_MAP_RANGE / (raw + 0.5)`,
/// clamped so a near-zero reading cannot over-amplify. On clamp the output
/// is exactly `WHITE_MAP_RANGE`. `overrides` forces a channel to a fixed
/// test constant for visual inspection.
pub fn apply_white_shading(reduced: &mut [u16], targets: &[u16; 3], overrides: &[Option<u16>; 3]) {
    for (i, value) in reduced.iter_mut().enumerate() {
        let ch = i % 3;
        if let Some(forced) = overrides[ch] {
            *value = forced;
            continue;
        }
        let raw = if *value == INVALID_TARGET {
            DEFAULT_WHITE_RAW
        } else {
            *value
        };
        let result = targets[ch] as f64 * WHITE_MAP_RANGE as f64 / (raw as f64 + 0.5);
        *value = if result > 2.0 * WHITE_MAP_RANGE as f64 {
            WHITE_MAP_RANGE
        } else {
            result as u16
        };
    }
}

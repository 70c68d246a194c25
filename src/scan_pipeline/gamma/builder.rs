//! Gamma/brightness/contrast table synthesis.
//!
//! The device wants one raw table per channel whose size depends on the
//! ASIC generation; each 8-bit input level is expanded into
//! `values_per_input` interpolated raw entries.

use tracing::debug;

use crate::scan_pipeline::common::Result;
use crate::scan_pipeline::device::caps::AsicGeneration;
use crate::scan_pipeline::device::commands::{self, DATA_GAMMA};
use crate::scan_pipeline::gamma::types::{GammaCurves, GammaTables};
use crate::scan_pipeline::geometry::types::ColorMode;
use crate::scan_pipeline::transport::channel::Transport;

/// Brightness on the normalized curve value: multiplicative below zero,
/// affine towards white above.
fn apply_brightness(v: f64, brightness: f64) -> f64 {
    if brightness < 0.0 {
        v * (1.0 + brightness)
    } else {
        v + (1.0 - v) * brightness
    }
}

/// Symmetric power law around the 0.5 midpoint. Positive contrast steepens
/// with exponent `1/(1-c)`, negative flattens with `1+c`.
fn apply_contrast(v: f64, contrast: f64) -> f64 {
    let exponent = if contrast >= 0.0 {
        1.0 / (1.0 - contrast).max(f64::EPSILON)
    } else {
        1.0 + contrast
    };
    if v < 0.5 {
        0.5 * (2.0 * v).powf(exponent)
    } else {
        1.0 - 0.5 * (2.0 * (1.0 - v)).powf(exponent)
    }
}

fn adjusted_level(curve: impl Fn(usize) -> f64, level: usize, brightness: f64, contrast: f64) -> f64 {
    let v = curve(level) / 255.0;
    let v = apply_brightness(v.clamp(0.0, 1.0), brightness);
    let v = apply_contrast(v.clamp(0.0, 1.0), contrast);
    v * 255.0
}

fn build_channel(
    asic: AsicGeneration,
    curve: impl Fn(usize) -> f64,
    brightness: f64,
    contrast: f64,
    invert: bool,
) -> Vec<u8> {
    let raw_entries = asic.gamma_raw_entries();
    let values_per_input = asic.gamma_values_per_input();
    let mut table = Vec::with_capacity(raw_entries);

    for level in 0..256usize {
        let v1 = adjusted_level(&curve, level, brightness, contrast);
        let v2 = adjusted_level(&curve, (level + 1).min(255), brightness, contrast);
        for step in 0..values_per_input {
            let t = step as f64 / values_per_input as f64;
            let mut v = v1 + (v2 - v1) * t;
            if invert {
                v = (255.0 - v).max(0.0);
            }
            table.push(v.round().clamp(0.0, 255.0) as u8);
        }
    }

    // Old-protocol padding: replicate the last value out to the raw size.
    let last = *table.last().unwrap_or(&0);
    while table.len() < raw_entries {
        table.push(last);
    }
    table
}

/// Build the three per-channel raw tables. True-color channels use the
/// average of the gray curve and the channel curve, a deliberate blend.
/// Bilevel modes are inverted on generations whose firmware does not
/// threshold for itself.
pub fn build_gamma(
    mode: ColorMode,
    asic: AsicGeneration,
    brightness: f64,
    contrast: f64,
    curves: &GammaCurves,
) -> GammaTables {
    let invert = mode.is_bilevel() && !asic.exempt_from_bilevel_invert();
    debug!(
        ?mode,
        ?asic,
        brightness,
        contrast,
        invert,
        entries = asic.gamma_raw_entries(),
        "building gamma tables"
    );

    let build = |ch: usize| {
        if mode.is_color() {
            let gray = &curves.gray;
            let chan = curves.channel(ch);
            build_channel(
                asic,
                |level| (gray[level] as f64 + chan[level] as f64) / 2.0,
                brightness,
                contrast,
                invert,
            )
        } else {
            let gray = &curves.gray;
            build_channel(asic, |level| gray[level] as f64, brightness, contrast, invert)
        }
    };

    GammaTables {
        red: build(0),
        green: build(1),
        blue: build(2),
    }
}

/// Per-channel upload, three transfers at channel indices 0/1/2, issued
/// even in gray mode.
pub fn upload_gamma(transport: &mut dyn Transport, tables: &GammaTables) -> Result<()> {
    for ch in 0..3 {
        let table = tables.channel(ch);
        for chunk in table.chunks(transport.max_transfer()) {
            let cmd = commands::send_cmd(DATA_GAMMA, ch as u8, chunk.len());
            transport.send(&cmd, chunk)?;
        }
    }
    Ok(())
}

//! Calibration orchestration.
//!
//! Runs the full sequence once per scan session, strictly in order: format
//! read, dark acquire + reduce, white acquire + reduce, target computation,
//! upload. The resulting tables are owned by the session and reused
//! read-only while they stay valid.

use tracing::{info, instrument};

use crate::scan_pipeline::calibration::acquire::{acquire_shading_lines, ShadingKind};
use crate::scan_pipeline::calibration::format::read_calibration_format;
use crate::scan_pipeline::calibration::reduce::sort_and_average;
use crate::scan_pipeline::calibration::targets::{
    apply_dark_shading, apply_white_shading, resolve_dark_targets, resolve_white_targets,
};
use crate::scan_pipeline::calibration::upload::{upload_shading, CalibrationUploadStrategy};
use crate::scan_pipeline::common::{BackendConfig, Result};
use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::geometry::types::ColorMode;
use crate::scan_pipeline::transport::channel::Transport;

/// Corrected per-pixel shading, one u16 per (pixel, channel) position.
/// Valid for the geometry it was measured at; a resolution or window change
/// invalidates it.
#[derive(Debug, Clone)]
pub struct ShadingTables {
    pub dark: Vec<u16>,
    pub white: Vec<u16>,
    pub pixels_per_line: usize,
    pub channels: usize,
}

impl ShadingTables {
    pub fn positions(&self) -> usize {
        self.pixels_per_line * self.channels
    }

    /// Neutral tables for sessions that skip calibration.
    pub fn neutral(pixels_per_line: usize, channels: usize) -> Self {
        use crate::scan_pipeline::calibration::targets::WHITE_MAP_RANGE;
        let positions = pixels_per_line * channels;
        ShadingTables {
            dark: vec![0; positions],
            white: vec![WHITE_MAP_RANGE; positions],
            pixels_per_line,
            channels,
        }
    }
}

pub struct Calibrator<'a> {
    caps: &'a DeviceCaps,
    config: &'a BackendConfig,
}

impl<'a> Calibrator<'a> {
    pub fn new(caps: &'a DeviceCaps, config: &'a BackendConfig) -> Self {
        Self { caps, config }
    }

    #[instrument(skip(self, transport))]
    pub fn calibrate(
        &self,
        transport: &mut dyn Transport,
        mode: ColorMode,
    ) -> Result<ShadingTables> {
        let format = {
            let _span = tracing::info_span!("read_calibration_format").entered();
            read_calibration_format(transport, mode.is_color())?
        };

        let positions = format.positions();

        let mut dark = if format.needs_dark() {
            let _span = tracing::info_span!("dark_pass").entered();
            let raw = acquire_shading_lines(transport, &format, ShadingKind::Dark)?;
            sort_and_average(&raw, format.line_count, positions, format.bytes_per_channel)
        } else {
            vec![0u16; positions]
        };

        let mut white = {
            let _span = tracing::info_span!("white_pass").entered();
            let raw = acquire_shading_lines(transport, &format, ShadingKind::White)?;
            sort_and_average(&raw, format.line_count, positions, format.bytes_per_channel)
        };

        if format.needs_dark() {
            let dark_targets = resolve_dark_targets(&format, self.caps);
            apply_dark_shading(&mut dark, &dark_targets);
        }
        let white_targets = resolve_white_targets(&format, self.caps);
        apply_white_shading(&mut white, &white_targets, &self.config.white_override);

        let strategy = CalibrationUploadStrategy::select(&format, self.caps);
        {
            let _span = tracing::info_span!("upload_shading").entered();
            upload_shading(transport, &format, strategy, &dark, &white)?;
        }

        info!(
            pixels = format.pixels_per_line,
            channels = format.channels,
            reads = format.line_count,
            "calibration complete"
        );

        Ok(ShadingTables {
            dark,
            white,
            pixels_per_line: format.pixels_per_line,
            channels: format.channels,
        })
    }
}

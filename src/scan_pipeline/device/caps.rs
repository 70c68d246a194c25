//! Per-model capability table and device discovery.
//!
//! Everything the pipeline varies on per device family is data in
//! `DeviceCaps`, resolved once at attach time. The components never branch
//! on a model tag at call sites; they read the capability record.

use tracing::debug;

/// ASIC generation, selected at attach time. Governs gamma table sizing
/// and the bilevel-invert quirk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsicGeneration {
    Gen1,
    Gen2,
    Gen3,
    Gen4,
}

impl AsicGeneration {
    /// Raw gamma table entries the device expects per channel.
    pub fn gamma_raw_entries(self) -> usize {
        match self {
            AsicGeneration::Gen1 => 256,
            AsicGeneration::Gen2 => 512,
            AsicGeneration::Gen3 => 2048,
            AsicGeneration::Gen4 => 4096,
        }
    }

    /// Interpolated values computed per 8-bit input level. Gen2 speaks the
    /// old protocol: it pads the table tail instead of interpolating.
    pub fn gamma_values_per_input(self) -> usize {
        match self {
            AsicGeneration::Gen1 => 1,
            AsicGeneration::Gen2 => 1,
            AsicGeneration::Gen3 => 8,
            AsicGeneration::Gen4 => 16,
        }
    }

    /// Newer firmware thresholds bilevel data itself; the host-side curve
    /// inversion must not be applied there.
    pub fn exempt_from_bilevel_invert(self) -> bool {
        matches!(self, AsicGeneration::Gen4)
    }
}

/// Per-model feature record. Supplied by the model table, treated as
/// read-only by every component.
#[derive(Debug, Clone)]
pub struct DeviceCaps {
    pub asic: AsicGeneration,
    /// Native optical resolution of the sensor, dots per inch.
    pub optical_xres: u32,
    pub optical_yres: u32,
    /// Resolution of the device's geometry units.
    pub base_dpi: u32,
    /// Physical scan area in base-DPI units.
    pub max_width: u32,
    pub max_length: u32,
    /// Vertical offset between the R/G/B read-heads at native resolution,
    /// in scan lines.
    pub head_offset_lines: u32,
    /// pixels_per_line must be a multiple of this in every mode.
    pub pixel_boundary: u32,
    /// Color rows need host-side color-pack reassembly.
    pub needs_software_colorpack: bool,
    /// Device delivers one line as [R row][G row][B row] concatenated.
    pub line_pack: bool,
    /// Known firmware defect: line-difference capture is broken, force 0.
    pub line_difference_defect: bool,
    /// Shading tables must go up as one combined transfer.
    pub one_calibration_command: bool,
    /// Shading only needs to be measured once per session, not per scan.
    pub calibrate_once: bool,
    /// ADF path mirrors the image left-to-right.
    pub adf_mirrors_image: bool,
    /// Over the ADF the device delivers BGR channel order.
    pub adf_delivers_bgr: bool,
    /// Inquiry-level fallbacks for sentinel-invalid shading targets.
    pub default_white_target: u16,
    pub default_dark_target: u16,
}

impl DeviceCaps {
    /// A plain flatbed color scanner with host-side color-pack; the shape
    /// most of the supported hardware takes.
    pub fn flatbed_colorpack() -> Self {
        DeviceCaps {
            asic: AsicGeneration::Gen3,
            optical_xres: 600,
            optical_yres: 1200,
            base_dpi: 1200,
            max_width: 10200,
            max_length: 14028,
            head_offset_lines: 24,
            pixel_boundary: 4,
            needs_software_colorpack: true,
            line_pack: false,
            line_difference_defect: false,
            one_calibration_command: true,
            calibrate_once: false,
            adf_mirrors_image: false,
            adf_delivers_bgr: false,
            default_white_target: 0xFFF0,
            default_dark_target: 0x0000,
        }
    }

    /// Sheetfed family: line-pack delivery, mirrored BGR over the ADF.
    pub fn sheetfed_linepack() -> Self {
        DeviceCaps {
            asic: AsicGeneration::Gen2,
            optical_xres: 300,
            optical_yres: 600,
            base_dpi: 1200,
            max_width: 10200,
            max_length: 14028,
            head_offset_lines: 0,
            pixel_boundary: 8,
            needs_software_colorpack: false,
            line_pack: true,
            line_difference_defect: false,
            one_calibration_command: false,
            calibrate_once: true,
            adf_mirrors_image: true,
            adf_delivers_bgr: true,
            default_white_target: 0xFFF0,
            default_dark_target: 0x0000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeviceDescriptor {
    pub id: String,
    pub vendor: String,
    pub model: String,
    pub caps: DeviceCaps,
}

/// Raw identity record produced by a transport probe.
#[derive(Debug, Clone)]
pub struct InquiryRecord {
    pub id: String,
    pub vendor: String,
    pub model: String,
}

/// Enumeration seam over the host transport layer.
pub trait DeviceProbe {
    fn inquire(&self) -> Vec<InquiryRecord>;
}

/// Model substrings mapped to capability records. Data, not algorithm.
fn caps_for_model(model: &str) -> Option<DeviceCaps> {
    if model.contains("FB1200") {
        return Some(DeviceCaps::flatbed_colorpack());
    }
    if model.contains("SF600") {
        return Some(DeviceCaps::sheetfed_linepack());
    }
    None
}

/// Pure enumeration: probe the transport, keep the models we know how to
/// drive. No process-wide device list is mutated.
pub fn discover(probe: &dyn DeviceProbe) -> Vec<DeviceDescriptor> {
    let mut found = Vec::new();
    for record in probe.inquire() {
        match caps_for_model(&record.model) {
            Some(caps) => found.push(DeviceDescriptor {
                id: record.id,
                vendor: record.vendor,
                model: record.model,
                caps,
            }),
            None => debug!(model = %record.model, "skipping unsupported model"),
        }
    }
    found
}

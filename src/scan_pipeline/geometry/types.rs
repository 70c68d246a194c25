//! Scan mode, source and parameter types.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    /// 1-bit thresholded black and white.
    Lineart,
    /// 1-bit halftone/dithered.
    Dithered,
    Gray,
    Gray16,
    Color,
    Color16,
}

impl ColorMode {
    pub fn is_color(self) -> bool {
        matches!(self, ColorMode::Color | ColorMode::Color16)
    }

    pub fn is_bilevel(self) -> bool {
        matches!(self, ColorMode::Lineart | ColorMode::Dithered)
    }

    pub fn channels(self) -> usize {
        if self.is_color() { 3 } else { 1 }
    }

    pub fn depth(self) -> u32 {
        match self {
            ColorMode::Lineart | ColorMode::Dithered => 1,
            ColorMode::Gray | ColorMode::Color => 8,
            ColorMode::Gray16 | ColorMode::Color16 => 16,
        }
    }

    pub fn bytes_per_channel(self) -> usize {
        if self.depth() == 16 { 2 } else { 1 }
    }

    pub fn bytes_per_line(self, pixels_per_line: usize) -> usize {
        match self.depth() {
            1 => pixels_per_line / 8,
            d => pixels_per_line * self.channels() * (d as usize / 8),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Flatbed,
    Adf,
    Transparency,
}

impl Source {
    /// Sheet-feeding sources need a carriage-eject after the last line.
    pub fn needs_eject(self) -> bool {
        matches!(self, Source::Adf)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    Gray,
    Rgb,
}

/// What the consumer asked for. Coordinates are device pixels at
/// `DeviceCaps::base_dpi`.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub xres: u32,
    pub yres: u32,
    pub top_left: (u32, u32),
    pub bottom_right: (u32, u32),
    pub mode: ColorMode,
    pub source: Source,
    /// Normalized to [-1.0, 1.0].
    pub brightness: f64,
    /// Normalized to (-1.0, 1.0).
    pub contrast: f64,
}

impl Default for ScanRequest {
    fn default() -> Self {
        ScanRequest {
            xres: 300,
            yres: 300,
            top_left: (0, 0),
            bottom_right: (2400, 2400),
            mode: ColorMode::Color,
            source: Source::Flatbed,
            brightness: 0.0,
            contrast: 0.0,
        }
    }
}

/// The frame the streaming reassembler will actually produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanParameters {
    pub pixels_per_line: usize,
    pub bytes_per_line: usize,
    pub lines: usize,
    pub depth: u32,
    pub format: PixelFormat,
}

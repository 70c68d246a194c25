use std::fs::File;
use std::io::Write;

use anyhow::{bail, Context};
use tracing::info;

use scanpipe_rs::logger;
use scanpipe_rs::scan_pipeline::{
    discover, BackendConfig, ColorMode, PixelFormat, ScanRequest, ScanSession, SimProbe,
    SimProfile, SimScanner, Source,
};

fn main() -> anyhow::Result<()> {
    logger::init();

    info!("Starting scanpipe...");

    let devices = discover(&SimProbe);
    let Some(device) = devices.first() else {
        bail!("no supported scanner found");
    };
    info!("Using device: {} {}", device.vendor, device.model);

    let config = BackendConfig::builder().build();
    let transport = Box::new(SimScanner::new(SimProfile::flatbed_color()));
    let mut session = ScanSession::new(device.caps.clone(), config, transport);

    session.configure(ScanRequest {
        xres: 300,
        yres: 300,
        top_left: (0, 0),
        bottom_right: (2400, 2400),
        mode: ColorMode::Color,
        source: Source::Flatbed,
        brightness: 0.0,
        contrast: 0.0,
    })?;

    let params = session.get_parameters()?;
    info!(
        "Scanning {}x{} at depth {}",
        params.pixels_per_line, params.lines, params.depth
    );

    let path = "scan.ppm";
    let mut out = File::create(path).context("creating output file")?;
    let magic = match params.format {
        PixelFormat::Rgb => "P6",
        PixelFormat::Gray => "P5",
    };
    writeln!(out, "{magic} {} {} 255", params.pixels_per_line, params.lines)?;
    session.scan_to(&mut out)?;

    info!("Scan written to {path}");
    Ok(())
}

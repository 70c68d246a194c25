//! Consumer-facing scan session.
//!
//! Owns the transport, the capability record and the calibration state for
//! one attached device. One scan (hence one worker) can be active at a
//! time; the shading tables are handed to the worker read-only.

use std::io::Write;
use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::scan_pipeline::calibration::calibrate::{Calibrator, ShadingTables};
use crate::scan_pipeline::common::{BackendConfig, Result, ScanError};
use crate::scan_pipeline::device::caps::DeviceCaps;
use crate::scan_pipeline::device::commands;
use crate::scan_pipeline::gamma::builder::{build_gamma, upload_gamma};
use crate::scan_pipeline::gamma::types::GammaCurves;
use crate::scan_pipeline::geometry::types::{ScanParameters, ScanRequest};
use crate::scan_pipeline::geometry::window::ScanGeometry;
use crate::scan_pipeline::reassembly::postprocess::MirrorMode;
use crate::scan_pipeline::reassembly::reader::ReaderPlan;
use crate::scan_pipeline::reassembly::reorder::ReorderMode;
use crate::scan_pipeline::session::worker::ReaderWorker;
use crate::scan_pipeline::transport::channel::Transport;
use crate::scan_pipeline::transport::ready::wait_until_ready;

/// A4 paper in 1200-dpi base units.
const A4_WIDTH_BASE: u32 = 9920;
const A4_LENGTH_BASE: u32 = 14028;

pub struct ScanSession {
    caps: DeviceCaps,
    config: BackendConfig,
    curves: GammaCurves,
    transport: Option<Box<dyn Transport>>,
    request: Option<ScanRequest>,
    geometry: Option<ScanGeometry>,
    shading: Option<Arc<ShadingTables>>,
    worker: Option<ReaderWorker>,
    pending: Vec<u8>,
    finished: bool,
}

impl ScanSession {
    pub fn new(caps: DeviceCaps, config: BackendConfig, transport: Box<dyn Transport>) -> Self {
        ScanSession {
            caps,
            config,
            curves: GammaCurves::identity(),
            transport: Some(transport),
            request: None,
            geometry: None,
            shading: None,
            worker: None,
            pending: Vec::new(),
            finished: false,
        }
    }

    pub fn caps(&self) -> &DeviceCaps {
        &self.caps
    }

    pub fn set_gamma_curves(&mut self, curves: GammaCurves) {
        self.curves = curves;
    }

    /// Validate and store a scan request. Rejected configurations leave the
    /// previous one untouched; an accepted one invalidates the shading
    /// tables, which are only valid for the geometry they were measured at.
    pub fn configure(&mut self, mut request: ScanRequest) -> Result<()> {
        if self.worker.is_some() {
            return Err(ScanError::Busy);
        }
        if self.config.force_a4 {
            let (r, b) = request.bottom_right;
            request.bottom_right = (r.min(A4_WIDTH_BASE), b.min(A4_LENGTH_BASE));
        }
        let geometry = ScanGeometry::compute(&request, &self.caps)?;
        let geometry_changed = match &self.geometry {
            Some(old) => {
                old.params.pixels_per_line != geometry.params.pixels_per_line
                    || old.xres != geometry.xres
                    || old.yres != geometry.yres
                    || old.mode != geometry.mode
            }
            None => true,
        };
        if geometry_changed {
            self.shading = None;
        }
        self.request = Some(request);
        self.geometry = Some(geometry);
        Ok(())
    }

    /// The frame the reassembler will actually produce for the current
    /// configuration.
    pub fn get_parameters(&self) -> Result<ScanParameters> {
        self.geometry
            .as_ref()
            .map(|g| g.params)
            .ok_or(ScanError::NotActive)
    }

    /// Calibrate, program the window and start the reader worker.
    #[instrument(skip(self))]
    pub fn start_scan(&mut self) -> Result<()> {
        if self.worker.is_some() {
            return Err(ScanError::Busy);
        }
        let request = self.request.clone().ok_or(ScanError::NotActive)?;
        let geometry = self.geometry.clone().ok_or(ScanError::NotActive)?;
        let mut transport = self.transport.take().ok_or(ScanError::Busy)?;

        match self.prepare(transport.as_mut(), &request, &geometry) {
            Ok(()) => {}
            Err(e) => {
                self.transport = Some(transport);
                return Err(e);
            }
        }

        // The correction maps samples positionally, so the tables are only
        // usable when the device calibrated exactly the window being
        // scanned; anything else would apply a neighbour pixel's gains.
        let shading_for_worker = if self.config.software_16bit_correction
            && request.mode.depth() == 16
        {
            match &self.shading {
                Some(tables)
                    if tables.pixels_per_line == geometry.params.pixels_per_line
                        && tables.channels == request.mode.channels() =>
                {
                    Some(Arc::clone(tables))
                }
                Some(tables) => {
                    warn!(
                        calibrated = tables.pixels_per_line,
                        window = geometry.params.pixels_per_line,
                        "calibration width does not match the scan window, skipping software correction"
                    );
                    None
                }
                None => None,
            }
        } else {
            None
        };

        let plan = ReaderPlan {
            bytes_per_line: geometry.params.bytes_per_line,
            total_lines: geometry.params.lines,
            line_difference: geometry.line_difference,
            reorder: ReorderMode::select(&self.caps, request.mode),
            mirror: MirrorMode::select(&self.caps, request.mode, request.source),
            bytes_per_channel: request.mode.bytes_per_channel(),
            yres: geometry.yres,
            eject_after: request.source.needs_eject(),
            shading: shading_for_worker,
        };

        info!(
            lines = plan.total_lines,
            bytes_per_line = plan.bytes_per_line,
            reorder = ?plan.reorder,
            "starting scan"
        );
        self.pending.clear();
        self.finished = false;
        self.worker = Some(ReaderWorker::spawn(transport, plan));
        Ok(())
    }

    /// Everything that must complete before the scan-start command:
    /// ready wait, calibration, gamma upload, window programming.
    fn prepare(
        &mut self,
        transport: &mut dyn Transport,
        request: &ScanRequest,
        geometry: &ScanGeometry,
    ) -> Result<()> {
        wait_until_ready(
            transport,
            self.config.ready_poll_attempts,
            self.config.ready_poll_backoff,
        )?;

        if self.config.disable_calibration {
            self.shading = None;
        } else {
            let reuse = self.caps.calibrate_once && self.shading.is_some();
            if !reuse {
                let calibrator = Calibrator::new(&self.caps, &self.config);
                let tables = calibrator.calibrate(transport, request.mode)?;
                self.shading = Some(Arc::new(tables));
            }
        }

        if !self.config.disable_gamma {
            let tables = build_gamma(
                request.mode,
                self.caps.asic,
                request.brightness,
                request.contrast,
                &self.curves,
            );
            upload_gamma(transport, &tables)?;
        }

        let window = geometry.encode_window();
        transport.send(&commands::set_window_cmd(window.len()), &window)?;
        transport.send(&commands::start_scan_cmd(), &[])?;
        Ok(())
    }

    /// Read reassembled pixel data. Returns 0 at end of image. Blocks until
    /// at least one row is available.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            if !self.pending.is_empty() {
                let n = self.pending.len().min(buf.len());
                buf[..n].copy_from_slice(&self.pending[..n]);
                self.pending.drain(..n);
                return Ok(n);
            }

            let Some(worker) = self.worker.take() else {
                if self.finished {
                    return Ok(0);
                }
                return Err(ScanError::NotActive);
            };

            let recv = worker
                .rows()
                .map(|rx| rx.recv())
                .unwrap_or(Err(std::sync::mpsc::RecvError));
            match recv {
                Ok(row) => {
                    self.pending = row;
                    self.worker = Some(worker);
                }
                Err(_) => {
                    // Worker exited: reclaim the transport and surface its
                    // result exactly once.
                    let (transport, result) = worker.join();
                    self.transport = Some(transport);
                    self.finished = true;
                    result?;
                }
            }
        }
    }

    /// Cancel a running scan. The worker stops issuing reads, runs the
    /// hardware eject path on sheetfed sources and is joined before this
    /// returns; eject problems are logged, never re-raised.
    pub fn cancel(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };
        worker.cancel();
        let (transport, result) = worker.join();
        self.transport = Some(transport);
        self.pending.clear();
        self.finished = true;
        match result {
            Ok(()) | Err(ScanError::Cancelled) => {}
            Err(e) => warn!(error = %e, "scan ended with error during cancel"),
        }
    }

    /// Convenience: run one whole scan into a writer, returning the frame
    /// parameters.
    pub fn scan_to(&mut self, out: &mut dyn Write) -> Result<ScanParameters> {
        let params = self.get_parameters()?;
        self.start_scan()?;
        let mut buf = vec![0u8; params.bytes_per_line.max(4096)];
        loop {
            let n = self.read(&mut buf)?;
            if n == 0 {
                break;
            }
            out.write_all(&buf[..n])?;
        }
        Ok(params)
    }
}

impl Drop for ScanSession {
    fn drop(&mut self) {
        self.cancel();
    }
}

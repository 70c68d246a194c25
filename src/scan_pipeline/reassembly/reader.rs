//! The streaming reader loop.
//!
//! Pulls raw stripes from the transport, reorders and post-processes them,
//! and emits whole canonical lines to the sink. Written against a
//! cancellation token and a plain `Write` sink so the same loop runs under
//! any execution strategy (dedicated thread today).

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::scan_pipeline::calibration::calibrate::ShadingTables;
use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::device::commands::{self, DATA_IMAGE};
use crate::scan_pipeline::reassembly::postprocess::{apply_16bit_shading, MirrorMode};
use crate::scan_pipeline::reassembly::reorder::{reorder, ReorderMode};
use crate::scan_pipeline::reassembly::stripe::StripeBuffer;
use crate::scan_pipeline::transport::channel::Transport;

/// Cooperative cancellation flag shared between controller and worker.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Everything the reader loop needs to know about one scan, resolved
/// before the worker starts.
#[derive(Debug, Clone)]
pub struct ReaderPlan {
    pub bytes_per_line: usize,
    /// Output lines requested by the consumer.
    pub total_lines: usize,
    pub line_difference: usize,
    pub reorder: ReorderMode,
    pub mirror: MirrorMode,
    pub bytes_per_channel: usize,
    pub yres: u32,
    /// Sheet-feeding sources get a carriage eject after the last line, and
    /// on cancellation.
    pub eject_after: bool,
    /// Present only when software 16-bit correction is enabled.
    pub shading: Option<Arc<ShadingTables>>,
}

impl ReaderPlan {
    fn total_raw_bytes(&self) -> usize {
        (self.total_lines + self.line_difference) * self.bytes_per_line
    }
}

/// Run one scan to completion. Rows are emitted strictly top-to-bottom and
/// only as whole lines; any mid-stream failure aborts without emitting the
/// partial row. The eject/home command is issued exactly once on sheetfed
/// sources, whether the loop finished, failed or was cancelled.
pub fn run_reader(
    cancel: &CancelToken,
    transport: &mut dyn Transport,
    plan: &ReaderPlan,
    sink: &mut dyn Write,
) -> Result<()> {
    let result = reader_loop(cancel, transport, plan, sink);

    if plan.eject_after {
        let cmd = commands::eject_cmd();
        if let Err(e) = transport.send(&cmd, &[]) {
            // Best effort: the eject failure never masks the scan result.
            warn!(error = %e, "media eject failed");
        }
    }

    result
}

fn reader_loop(
    cancel: &CancelToken,
    transport: &mut dyn Transport,
    plan: &ReaderPlan,
    sink: &mut dyn Write,
) -> Result<()> {
    let bpl = plan.bytes_per_line;
    let total_raw = plan.total_raw_bytes();
    let mut stripe = StripeBuffer::new(bpl, plan.line_difference)?;

    // Never over-request on the first read: half a vertical inch keeps
    // preview scans responsive.
    let half_inch = ((plan.yres as usize / 2) * bpl).max(bpl);

    let mut received = 0usize;
    let mut emitted = 0usize;
    let mut out: Vec<u8> = Vec::new();

    debug!(
        total_raw,
        lines = plan.total_lines,
        line_difference = plan.line_difference,
        stripe_lines = stripe.lines_per_stripe(),
        "reader starting"
    );

    while emitted < plan.total_lines {
        if cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        let want = stripe
            .space()
            .min((transport.max_transfer() / 2).max(1))
            .min(half_inch)
            .min(total_raw - received);

        if want > 0 {
            let cmd = commands::read_cmd(DATA_IMAGE, 0, want);
            let chunk = transport.receive(&cmd, want)?;
            if chunk.is_empty() {
                return Err(ScanError::ShortTransfer {
                    expected: total_raw,
                    got: received,
                });
            }
            stripe.push(&chunk);
            received += chunk.len();
        }

        let done_receiving = received == total_raw;
        if !stripe.is_full() && !done_receiving {
            continue;
        }

        let available = stripe.filled_lines().saturating_sub(plan.line_difference);
        let out_lines = available.min(plan.total_lines - emitted);
        if out_lines == 0 {
            if done_receiving {
                // Device promised more lines than it delivered.
                return Err(ScanError::ShortTransfer {
                    expected: total_raw,
                    got: received,
                });
            }
            continue;
        }

        out.clear();
        reorder(
            plan.reorder,
            stripe.bytes(),
            bpl,
            plan.line_difference,
            out_lines,
            plan.bytes_per_channel,
            &mut out,
        );

        for line in out.chunks_exact_mut(bpl) {
            plan.mirror.apply(line);
            if let Some(shading) = &plan.shading {
                apply_16bit_shading(line, shading);
            }
        }

        sink.write_all(&out)?;
        emitted += out_lines;
        stripe.consume_lines(out_lines);
    }

    debug!(emitted, "reader finished");
    Ok(())
}

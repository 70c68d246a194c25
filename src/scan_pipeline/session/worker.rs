//! Background reader worker.
//!
//! The reader loop runs on its own thread so a blocking hardware read can
//! never stall the controller. Rows travel over a bounded channel; its
//! capacity provides the backpressure an OS pipe would.

use std::io::{self, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};
use std::thread::JoinHandle;

use tracing::debug;

use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::reassembly::reader::{run_reader, CancelToken, ReaderPlan};
use crate::scan_pipeline::transport::channel::Transport;

/// Rows buffered between worker and controller before the worker blocks.
const ROW_CHANNEL_DEPTH: usize = 32;

/// Write adapter that slices the reader's output into whole rows and sends
/// them to the controller. A closed channel surfaces as `BrokenPipe`, which
/// the worker treats as cancellation.
struct RowSink {
    tx: SyncSender<Vec<u8>>,
    bytes_per_line: usize,
    pending: Vec<u8>,
}

impl Write for RowSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while self.pending.len() >= self.bytes_per_line {
            let row: Vec<u8> = self.pending.drain(..self.bytes_per_line).collect();
            self.tx
                .send(row)
                .map_err(|_| io::Error::from(io::ErrorKind::BrokenPipe))?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Handle to one running scan. Joining returns the transport so the
/// session can issue further commands after the scan ends.
pub struct ReaderWorker {
    handle: JoinHandle<(Box<dyn Transport>, Result<()>)>,
    rows: Option<Receiver<Vec<u8>>>,
    cancel: CancelToken,
}

impl ReaderWorker {
    pub fn spawn(mut transport: Box<dyn Transport>, plan: ReaderPlan) -> Self {
        let cancel = CancelToken::new();
        let token = cancel.clone();
        let (tx, rx) = sync_channel(ROW_CHANNEL_DEPTH);
        let bytes_per_line = plan.bytes_per_line;

        let handle = std::thread::spawn(move || {
            let mut sink = RowSink {
                tx,
                bytes_per_line,
                pending: Vec::new(),
            };
            let result = run_reader(&token, transport.as_mut(), &plan, &mut sink);
            debug!(ok = result.is_ok(), "reader worker exiting");
            (transport, result)
        });

        ReaderWorker {
            handle,
            rows: Some(rx),
            cancel,
        }
    }

    pub fn rows(&self) -> Option<&Receiver<Vec<u8>>> {
        self.rows.as_ref()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Wait for the worker to exit. Drops the row channel first so a worker
    /// blocked on a full channel wakes up and runs its eject path.
    pub fn join(mut self) -> (Box<dyn Transport>, Result<()>) {
        drop(self.rows.take());
        match self.handle.join() {
            Ok(outcome) => outcome,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    }
}

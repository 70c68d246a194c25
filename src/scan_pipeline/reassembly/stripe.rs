//! Fixed-capacity stripe working buffer.
//!
//! Bounds the reassembler's memory to a handful of scan lines: the stripe
//! holds `max(8, 2 * line_difference)` raw lines, and after each reorder
//! pass the line-difference overlap plus any partial trailing bytes are
//! moved to the front for the next fill.

use crate::scan_pipeline::common::{Result, ScanError};

#[derive(Debug)]
pub struct StripeBuffer {
    data: Vec<u8>,
    bytes_per_line: usize,
    lines_per_stripe: usize,
    line_difference: usize,
    fill: usize,
}

impl StripeBuffer {
    pub fn new(bytes_per_line: usize, line_difference: usize) -> Result<Self> {
        let lines_per_stripe = (2 * line_difference).max(8);
        let capacity = bytes_per_line * lines_per_stripe;
        let mut data = Vec::new();
        data.try_reserve_exact(capacity)
            .map_err(|_| ScanError::OutOfMemory(capacity))?;
        data.resize(capacity, 0);
        Ok(StripeBuffer {
            data,
            bytes_per_line,
            lines_per_stripe,
            line_difference,
            fill: 0,
        })
    }

    pub fn lines_per_stripe(&self) -> usize {
        self.lines_per_stripe
    }

    /// Whole output lines one full stripe yields after the overlap.
    pub fn lines_per_output(&self) -> usize {
        self.lines_per_stripe - self.line_difference
    }

    pub fn space(&self) -> usize {
        self.data.len() - self.fill
    }

    pub fn is_full(&self) -> bool {
        self.space() == 0
    }

    /// Complete raw lines currently buffered.
    pub fn filled_lines(&self) -> usize {
        self.fill / self.bytes_per_line
    }

    pub fn bytes(&self) -> &[u8] {
        &self.data[..self.fill]
    }

    pub fn push(&mut self, chunk: &[u8]) {
        debug_assert!(chunk.len() <= self.space());
        self.data[self.fill..self.fill + chunk.len()].copy_from_slice(chunk);
        self.fill += chunk.len();
    }

    /// Drop `lines` processed lines from the front; the overlap and any
    /// partial trailing bytes slide down for the next fill.
    pub fn consume_lines(&mut self, lines: usize) {
        let consumed = lines * self.bytes_per_line;
        debug_assert!(consumed <= self.fill);
        self.data.copy_within(consumed..self.fill, 0);
        self.fill -= consumed;
    }
}

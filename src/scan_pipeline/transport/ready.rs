use std::time::Duration;

use tracing::debug;

use crate::scan_pipeline::common::{Result, ScanError};
use crate::scan_pipeline::transport::channel::{SenseInfo, Transport};

pub const READY_POLL_ATTEMPTS: usize = 10;
pub const READY_POLL_BACKOFF: Duration = Duration::from_secs(1);

/// Bounded wait-for-ready loop, used only before the first command of a
/// session. Retryable sense states (lamp warming, media settling) are
/// polled again after `backoff`; anything else fails immediately.
pub fn wait_until_ready(
    transport: &mut dyn Transport,
    attempts: usize,
    backoff: Duration,
) -> Result<()> {
    for attempt in 0..attempts {
        let sense = transport.sense()?;
        match sense {
            SenseInfo::Good => return Ok(()),
            ref s if s.is_retryable() => {
                debug!(attempt, ?s, "device not ready yet");
                std::thread::sleep(backoff);
            }
            other => return Err(other.into_error()),
        }
    }
    Err(ScanError::NotReady(attempts))
}

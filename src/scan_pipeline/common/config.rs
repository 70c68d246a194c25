//! Backend-wide configuration.
//!
//! Built once at startup and passed by reference into every session; no
//! process-global flags.

use std::time::Duration;

use crate::scan_pipeline::transport::ready::{READY_POLL_ATTEMPTS, READY_POLL_BACKOFF};

#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Skip the whole shading calibration pass.
    pub disable_calibration: bool,
    /// Skip the gamma table upload.
    pub disable_gamma: bool,
    /// Clamp every request to A4 regardless of what the device reports.
    pub force_a4: bool,
    /// Apply dark/white correction in software for 16-bit modes. The
    /// hardware path never exercised this; off by default.
    pub software_16bit_correction: bool,
    /// Force a channel's white shading output to a fixed test constant.
    pub white_override: [Option<u16>; 3],
    pub ready_poll_attempts: usize,
    pub ready_poll_backoff: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig {
            disable_calibration: false,
            disable_gamma: false,
            force_a4: false,
            software_16bit_correction: false,
            white_override: [None; 3],
            ready_poll_attempts: READY_POLL_ATTEMPTS,
            ready_poll_backoff: READY_POLL_BACKOFF,
        }
    }
}

impl BackendConfig {
    pub fn builder() -> BackendConfigBuilder {
        BackendConfigBuilder::default()
    }
}

#[derive(Default)]
pub struct BackendConfigBuilder {
    disable_calibration: Option<bool>,
    disable_gamma: Option<bool>,
    force_a4: Option<bool>,
    software_16bit_correction: Option<bool>,
    white_override: Option<[Option<u16>; 3]>,
    ready_poll_attempts: Option<usize>,
    ready_poll_backoff: Option<Duration>,
}

impl BackendConfigBuilder {
    pub fn disable_calibration(mut self, disable: bool) -> Self {
        self.disable_calibration = Some(disable);
        self
    }

    pub fn disable_gamma(mut self, disable: bool) -> Self {
        self.disable_gamma = Some(disable);
        self
    }

    pub fn force_a4(mut self, force: bool) -> Self {
        self.force_a4 = Some(force);
        self
    }

    pub fn software_16bit_correction(mut self, enable: bool) -> Self {
        self.software_16bit_correction = Some(enable);
        self
    }

    pub fn white_override(mut self, overrides: [Option<u16>; 3]) -> Self {
        self.white_override = Some(overrides);
        self
    }

    pub fn ready_poll_attempts(mut self, attempts: usize) -> Self {
        self.ready_poll_attempts = Some(attempts);
        self
    }

    pub fn ready_poll_backoff(mut self, backoff: Duration) -> Self {
        self.ready_poll_backoff = Some(backoff);
        self
    }

    pub fn build(self) -> BackendConfig {
        let default = BackendConfig::default();
        BackendConfig {
            disable_calibration: self.disable_calibration.unwrap_or(default.disable_calibration),
            disable_gamma: self.disable_gamma.unwrap_or(default.disable_gamma),
            force_a4: self.force_a4.unwrap_or(default.force_a4),
            software_16bit_correction: self
                .software_16bit_correction
                .unwrap_or(default.software_16bit_correction),
            white_override: self.white_override.unwrap_or(default.white_override),
            ready_poll_attempts: self.ready_poll_attempts.unwrap_or(default.ready_poll_attempts),
            ready_poll_backoff: self.ready_poll_backoff.unwrap_or(default.ready_poll_backoff),
        }
    }
}

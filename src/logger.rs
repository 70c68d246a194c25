use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

/// Filter applied when `RUST_LOG` is unset: pipeline events at info,
/// everything else quiet.
const DEFAULT_DIRECTIVE: &str = "scanpipe_rs=info";

pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

    // The calibration phases and the reader loop run under spans; close
    // events give per-phase timings when verbose output is requested.
    let verbose = std::env::var("RUST_LOG")
        .is_ok_and(|v| v.contains("debug") || v.contains("trace"));
    let span_events = if verbose { FmtSpan::CLOSE } else { FmtSpan::NONE };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_timer(tracing_subscriber::fmt::time::uptime())
        .with_span_events(span_events)
        .init();
}

//! Request and response tracing, adapted from a conventional `log_request`/
//! `log_response` pair. Secret redaction has no grounding in this domain (an
//! access point is a test fixture, not a credentialed upstream) and is
//! dropped entirely.

use tracing::{debug, info, trace};

/// Logs an outbound trial request at info level, with headers at debug.
pub fn log_request(side: &str, method: &str, url: &str, headers: &indexmap::IndexMap<String, String>) {
    info!(target: "twinspan::trial", "-> {side} {} {url}", method.to_uppercase());
    debug!(target: "twinspan::trial", "{side} request headers:");
    for (name, value) in headers {
        debug!(target: "twinspan::trial", "  {name}: {value}");
    }
}

/// Logs a trial response at info level, with the body length at trace.
pub fn log_response(side: &str, status_code: Option<u16>, elapsed_sec: Option<f64>, body: &[u8]) {
    match (status_code, elapsed_sec) {
        (Some(status), Some(elapsed)) => {
            info!(target: "twinspan::trial", "<- {side} {status} ({elapsed:.2}s)");
        }
        _ => {
            info!(target: "twinspan::trial", "<- {side} failed");
        }
    }
    trace!(target: "twinspan::trial", "{side} response body: {} bytes", body.len());
}

/// Installs the process-wide tracing subscriber. Filter defaults to `info`
/// and honors `RUST_LOG` when set, the conventional `tracing_subscriber`
/// usage.
pub fn init_default_subscriber() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = fmt().with_env_filter(filter).try_init();
}

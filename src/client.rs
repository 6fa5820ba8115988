//! Builds the shared `reqwest::Client` for one access point.
//!
//! Proxies are a client-construction concern in `reqwest`, not a per-request
//! one, so each side gets its own client (built once, cloned into every
//! spawned trial task — `reqwest::Client` is `Clone + Send + Sync` and
//! internally reference-counts its connection pool, §5 "Shared resources").
//! Connect/request timeouts are configured here too, the socket-level
//! complement to the `max_retries` retry policy in `crate::retry` (§5
//! "Cancellation and timeouts").

use crate::error::Error;
use crate::model::AccessPoint;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Builds a `reqwest::Client` for one access point, honoring its optional
/// per-side proxy.
///
/// # Errors
/// Returns an error if the proxy URL is malformed or TLS setup fails.
pub fn build_client(access_point: &AccessPoint) -> Result<reqwest::Client, Error> {
    let mut builder = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(REQUEST_TIMEOUT);

    if let Some(proxy_config) = &access_point.proxy {
        if let Some(http_proxy) = &proxy_config.http {
            builder = builder.proxy(
                reqwest::Proxy::http(http_proxy)
                    .map_err(|e| Error::configuration(format!("invalid http proxy: {e}")))?,
            );
        }
        if let Some(https_proxy) = &proxy_config.https {
            builder = builder.proxy(
                reqwest::Proxy::https(https_proxy)
                    .map_err(|e| Error::configuration(format!("invalid https proxy: {e}")))?,
            );
        }
    }

    builder
        .build()
        .map_err(|e| Error::configuration(format!("failed to build HTTP client for '{}': {e}", access_point.name)))
}

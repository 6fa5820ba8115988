//! A differential HTTP testing engine: dispatches each request to two
//! access points, diffs their responses, and classifies the result.
//!
//! [`run`] is the top-level entry point: given a resolved [`config::Config`]
//! and the already-parsed request list (reading and parsing the input file
//! is the `log2reqs` add-on's job, §4.1), it prepares the output directory,
//! dispatches every trial under bounded concurrency, and assembles the
//! final [`model::Report`].

pub mod addon;
pub mod client;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod error;
pub mod headers;
pub mod logging;
pub mod model;
pub mod report;
pub mod retry;
pub mod session;
pub mod trial;
pub mod url;

use crate::addon::AddOnExecutor;
use crate::config::Config;
use crate::error::Error;
use crate::model::{Report, Request};
use chrono::Local;
use std::sync::Arc;

/// Runs one full differential-testing session: builds the per-side HTTP
/// clients, prepares the output directory tree, dispatches every request's
/// trial under bounded concurrency, and assembles the `Report`.
///
/// `retry_hash` is `None` for a fresh run, or the session key of the prior
/// report this run replays (the engine accepts this label verbatim; building
/// the replayed `requests` list from that prior report is the caller's job,
/// via `report::requests_from_report`).
///
/// The `Final` add-on stage (§4.1) runs last and may rewrite the assembled
/// report before it is returned.
///
/// # Errors
/// Returns an error if either access point's HTTP client cannot be built, if
/// the output directory cannot be prepared, or if any trial's add-on chain
/// or artifact persistence fails.
pub async fn run(
    config: &Config,
    addons: Arc<AddOnExecutor>,
    requests: &[Request],
    retry_hash: Option<String>,
) -> Result<Report, Error> {
    let start = Local::now();
    let key = trial::new_session_key(config).map_err(|e| {
        Error::configuration(format!("failed to compute session key: {e}"))
    })?;

    let response_dir = std::path::Path::new(&config.output.response_dir);
    report::prepare_output_dirs(response_dir, &key)?;

    let client_one = client::build_client(&config.one)?;
    let client_other = client::build_client(&config.other)?;

    let requests = addons.apply_reqs2reqs(requests.to_vec(), config)?;

    let trials = dispatch::run_all(
        config,
        &addons,
        &client_one,
        &client_other,
        response_dir,
        &key,
        &requests,
    )
    .await?;

    let end = Local::now();
    report::update_latest_symlink(response_dir, &key)?;

    let report = report::build_report(key, config, trials, start, end, retry_hash);
    let output_summary = model::OutputSummary {
        response_dir: config.output.response_dir.clone(),
        encoding: config.output.encoding.clone(),
    };
    let (report, _output_summary) = addons.apply_final(report, output_summary, &config.notifiers)?;

    Ok(report)
}

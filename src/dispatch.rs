//! The concurrency harness (§4.3): bounded-concurrency fan-out over the
//! input request list, preserving output order regardless of completion
//! order.
//!
//! Grounded on a `BatchProcessor::execute_concurrent_batch`-style harness:
//! one `tokio::spawn` per item, gated by a shared `Arc<Semaphore>`, with
//! each task's result written to its own index slot so collection does not
//! depend on task completion order. This unifies the original tool's
//! threaded/process-parallel split into the one mechanism — a process pool
//! there exists only to route around a single-interpreter global lock with
//! no Rust analogue — so `effective_concurrency()` sizes the semaphore
//! regardless of which `Config` knob (`threads` or `processes`) produced it.

use crate::addon::AddOnExecutor;
use crate::config::Config;
use crate::error::{Error, ErrorKind};
use crate::model::{Request, Trial};
use crate::trial::{run_trial, TrialContext};
use reqwest::Client;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs every request's trial concurrently, bounded by
/// `config.effective_concurrency()`, and returns the trials ordered to
/// match the input request order (§4.3 "ordering of the emitted trial list
/// matches the input request order").
///
/// A transport failure on one trial never cancels its peers (§4.3 "Worker
/// isolation is per-trial"); an add-on-internal error on one trial aborts
/// only that trial's slot and is surfaced once all tasks complete, matching
/// §7 taxonomy 3 ("propagates to abort the trial").
///
/// # Errors
/// Returns the first add-on-internal or artifact I/O error raised by any
/// trial.
pub async fn run_all(
    config: &Config,
    addons: &Arc<AddOnExecutor>,
    client_one: &Client,
    client_other: &Client,
    response_dir: &Path,
    session_key: &str,
    requests: &[Request],
) -> Result<Vec<Trial>, Error> {
    let semaphore = Arc::new(Semaphore::new(config.effective_concurrency()));
    let mut handles = Vec::with_capacity(requests.len());

    for (index, request) in requests.iter().enumerate() {
        let semaphore = Arc::clone(&semaphore);
        let request = request.clone();
        let config = config.clone();
        let addons = Arc::clone(addons);
        let client_one = client_one.clone();
        let client_other = client_other.clone();
        let response_dir = response_dir.to_path_buf();
        let session_key = session_key.to_string();
        let seq = u32::try_from(index + 1).unwrap_or(u32::MAX);

        let handle = tokio::spawn(async move {
            let _permit = semaphore
                .acquire_owned()
                .await
                .expect("semaphore should not be closed");
            let ctx = TrialContext {
                client_one: &client_one,
                client_other: &client_other,
                config: &config,
                addons: &addons,
                response_dir: &response_dir,
                session_key: &session_key,
            };
            run_trial(&ctx, seq, &request).await
        });

        handles.push((index, handle));
    }

    let mut trials: Vec<Option<Trial>> = (0..requests.len()).map(|_| None).collect();
    for (index, handle) in handles {
        let trial = handle.await.map_err(|e| Error::Internal {
            kind: ErrorKind::Dispatch,
            message: format!("trial task panicked: {e}").into(),
            context: None,
        })??;
        trials[index] = Some(trial);
    }

    Ok(trials.into_iter().map(|t| t.expect("every slot is filled")).collect())
}

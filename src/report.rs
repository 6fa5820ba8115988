//! Report assembly (§4.4): status histogram, `Summary` construction, the
//! `latest` symlink swap, and the pure `requests_from_report` reconstruction
//! a retry run replays from a prior session's trials.

use crate::config::Config;
use crate::error::Error;
use crate::model::{Concurrency, OutputSummary, Report, Request, Status, Summary, Trial};
use chrono::{DateTime, Local};
use indexmap::IndexMap;
use std::path::Path;

/// Computes the status histogram from a trial list (§4.4 step 1).
#[must_use]
pub fn status_histogram(trials: &[Trial]) -> IndexMap<String, usize> {
    let mut histogram = IndexMap::new();
    histogram.insert(Status::Same.as_str().to_string(), 0);
    histogram.insert(Status::Different.as_str().to_string(), 0);
    histogram.insert(Status::Failure.as_str().to_string(), 0);

    for trial in trials {
        *histogram.entry(trial.status.as_str().to_string()).or_insert(0) += 1;
    }

    histogram
}

/// Assembles the `Report` for a completed run (§4.4 steps 1-2, §6 Report
/// model). Does not run the `Final` add-on stage; the caller does that
/// separately (§4.4 step 4) since `Final` may mutate the output summary.
#[allow(clippy::too_many_arguments)]
#[must_use]
pub fn build_report(
    key: String,
    config: &Config,
    trials: Vec<Trial>,
    start: DateTime<Local>,
    end: DateTime<Local>,
    retry_hash: Option<String>,
) -> Report {
    let elapsed_sec = (end - start).num_milliseconds() as f64 / 1000.0;
    let status = status_histogram(&trials);

    let summary = Summary {
        one: config.one.clone(),
        other: config.other.clone(),
        status,
        tags: config.tags.clone(),
        start: start.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        end: end.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        elapsed_sec,
        output: OutputSummary {
            response_dir: config.output.response_dir.clone(),
            encoding: config.output.encoding.clone(),
        },
        concurrency: Concurrency {
            processes: config.processes,
            threads: config.threads,
        },
    };

    Report {
        version: env!("CARGO_PKG_VERSION").to_string(),
        key,
        title: config.title.clone(),
        description: config.description.clone(),
        summary,
        trials,
        addons: serde_json::to_value(&config.addons).unwrap_or(serde_json::Value::Null),
        retry_hash,
    }
}

/// Creates the output directory tree for one session before any trial
/// starts (§4.2 step 10, §5 "Output directory structure is created before
/// workers start"), matching the original implementation's idempotent,
/// permissive `make_dir`.
///
/// # Errors
/// Returns an I/O error if directory creation fails.
pub fn prepare_output_dirs(response_dir: &Path, key: &str) -> Result<(), Error> {
    let session_dir = response_dir.join(key);
    for sub in ["one", "other", "one-props", "other-props"] {
        std::fs::create_dir_all(session_dir.join(sub))?;
    }
    Ok(())
}

/// Replaces any existing `latest` entry under `response_dir` with a symlink
/// (or, on platforms without one, a pointer file) targeting the session key
/// directory (§4.4 step 3, §9 "Latest symlink").
///
/// # Errors
/// Returns an I/O error if the existing entry cannot be removed or the new
/// one cannot be created.
pub fn update_latest_symlink(response_dir: &Path, key: &str) -> Result<(), Error> {
    let latest = response_dir.join("latest");

    match std::fs::symlink_metadata(&latest) {
        Ok(_) => {
            std::fs::remove_file(&latest).or_else(|_| std::fs::remove_dir_all(&latest))?;
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e.into()),
    }

    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(key, &latest)?;
    }
    #[cfg(not(unix))]
    {
        std::fs::write(&latest, key)?;
    }

    Ok(())
}

/// Resolves `<response_dir>/latest` back to a session key, whether it is a
/// real symlink or the Windows-fallback pointer file.
///
/// # Errors
/// Returns an I/O error if `latest` does not exist or cannot be read.
pub fn read_latest_key(response_dir: &Path) -> Result<String, Error> {
    let latest = response_dir.join("latest");
    match std::fs::read_link(&latest) {
        Ok(target) => Ok(target.to_string_lossy().to_string()),
        Err(_) => Ok(std::fs::read_to_string(&latest)?.trim().to_string()),
    }
}

/// Reconstructs the `Vec<Request>` a retry run would replay, by echoing each
/// prior trial's method/path/queries/form/json/headers back into a fresh
/// `Request`, grounded on the original implementation's retry path in
/// `jumeaux/executor.py::main`. This is a pure data transform; the engine
/// does not itself load a prior report from disk or drive a retry run —
/// that orchestration remains a caller concern (§1).
#[must_use]
pub fn requests_from_report(report: &Report) -> Vec<Request> {
    report
        .trials
        .iter()
        .map(|trial| Request {
            name: Some(trial.name.clone()),
            method: trial.method,
            path: trial.path.clone(),
            qs: trial.queries.clone(),
            headers: trial.headers.clone(),
            form: trial.form.clone(),
            json: trial.json.clone(),
            url_encoding: "utf-8".to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, QueryMap, TrialSide};

    fn sample_trial(seq: u32, status: Status) -> Trial {
        Trial {
            seq,
            name: seq.to_string(),
            tags: Vec::new(),
            request_time: "2026-07-27T00:00:00Z".to_string(),
            status,
            method: Method::Get,
            path: "/p".to_string(),
            queries: QueryMap::new(),
            form: None,
            json: None,
            headers: indexmap::IndexMap::new(),
            diffs_by_cognition: Default::default(),
            one: TrialSide::failure("http://one.test/p".to_string()),
            other: TrialSide::failure("http://other.test/p".to_string()),
        }
    }

    #[test]
    fn histogram_sums_to_trial_count() {
        let trials = vec![
            sample_trial(1, Status::Same),
            sample_trial(2, Status::Different),
            sample_trial(3, Status::Same),
        ];
        let histogram = status_histogram(&trials);
        let total: usize = histogram.values().sum();
        assert_eq!(total, trials.len());
        assert_eq!(histogram["same"], 2);
        assert_eq!(histogram["different"], 1);
        assert_eq!(histogram["failure"], 0);
    }

    #[test]
    fn latest_symlink_points_at_session_key() {
        let dir = tempfile::tempdir().unwrap();
        prepare_output_dirs(dir.path(), "session-a").unwrap();
        update_latest_symlink(dir.path(), "session-a").unwrap();
        assert_eq!(read_latest_key(dir.path()).unwrap(), "session-a");

        prepare_output_dirs(dir.path(), "session-b").unwrap();
        update_latest_symlink(dir.path(), "session-b").unwrap();
        assert_eq!(read_latest_key(dir.path()).unwrap(), "session-b");
    }

    #[test]
    fn requests_from_report_echoes_trial_fields() {
        let trial = sample_trial(1, Status::Different);
        let report = Report {
            version: "0".to_string(),
            key: "k".to_string(),
            title: None,
            description: None,
            summary: build_report(
                "k".to_string(),
                &sample_config(),
                Vec::new(),
                Local::now(),
                Local::now(),
                None,
            )
            .summary,
            trials: vec![trial.clone()],
            addons: serde_json::Value::Null,
            retry_hash: None,
        };
        let requests = requests_from_report(&report);
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].path, trial.path);
        assert_eq!(requests[0].method, trial.method);
    }

    fn sample_config() -> Config {
        use crate::config::OutputConfig;
        use crate::model::AccessPoint;
        Config {
            one: AccessPoint {
                name: "one".to_string(),
                host: "http://one.test".to_string(),
                proxy: None,
                path: None,
                query: None,
                headers: indexmap::IndexMap::new(),
                default_response_encoding: None,
            },
            other: AccessPoint {
                name: "other".to_string(),
                host: "http://other.test".to_string(),
                proxy: None,
                path: None,
                query: None,
                headers: indexmap::IndexMap::new(),
                default_response_encoding: None,
            },
            output: OutputConfig {
                response_dir: "/tmp/out".to_string(),
                encoding: "utf-8".to_string(),
            },
            threads: 1,
            processes: None,
            max_retries: 3,
            title: None,
            description: None,
            tags: Vec::new(),
            input_files: Vec::new(),
            notifiers: serde_json::Value::Null,
            addons: Default::default(),
            skip_addon_tag: Vec::new(),
        }
    }
}

//! The trial executor: the eleven-step per-request pipeline (§4.2).
//!
//! Grounded on the original Python implementation's `challenge()` function —
//! URL construction, concurrent dispatch to both sides inside a private
//! two-worker pool, failure short-circuiting, res2res/res2dict, structured
//! diff, judgement, store-criterion, dump-and-persist, and final
//! `did_challenge` decoration, executed in that exact order for one request.

use crate::addon::{
    AddOnExecutor, DidChallengeReference, DumpPayload, JudgementReference, StoreCriterionReference,
};
use crate::config::Config;
use crate::diff;
use crate::error::Error;
use crate::headers::merge_headers;
use crate::model::{
    AccessPoint, DiffsByCognition, Method, QueryMap, Request, Response, ResponseType, Status, Trial, TrialSide,
};
use crate::session::session_key;
use crate::url::build_url;
use chrono::Local;
use reqwest::Client;
use std::path::Path;
use std::time::Instant;

/// Everything the trial executor needs that is constant across all trials
/// in a run: the shared HTTP client, both access points, the add-on
/// executor, and the response directory this run writes artifacts under.
pub struct TrialContext<'a> {
    /// Client configured with `config.one`'s proxy settings (a shared
    /// `reqwest::Client` per side, since proxies are a client-construction
    /// concern, not a per-request one — see `client::build_clients`).
    pub client_one: &'a Client,
    pub client_other: &'a Client,
    pub config: &'a Config,
    pub addons: &'a AddOnExecutor,
    pub response_dir: &'a Path,
    pub session_key: &'a str,
}

struct DispatchOutcome {
    response: Response,
}

async fn dispatch_one(
    client: &Client,
    access_point: &AccessPoint,
    max_retries: u32,
    url: &str,
    method: Method,
    headers: &indexmap::IndexMap<String, String>,
    form: Option<&str>,
    json: Option<&serde_json::Value>,
) -> Result<DispatchOutcome, reqwest::Error> {
    let started = Instant::now();
    let method_str = match method {
        Method::Get => "GET",
        Method::Post => "POST",
    };
    crate::logging::log_request(&access_point.name, method_str, url, headers);

    let build_request = || {
        let mut builder = match method {
            Method::Get => client.get(url),
            Method::Post => client.post(url),
        };
        for (key, value) in headers {
            builder = builder.header(key.as_str(), value.as_str());
        }
        if let Some(json_body) = json {
            builder = builder.json(json_body);
        } else if let Some(form_body) = form {
            builder = builder.body(form_body.to_string());
        }
        builder
    };

    let response = crate::retry::with_retry(max_retries, || build_request().send()).await?;

    let elapsed = round_two_decimals(started.elapsed().as_secs_f64());
    let final_url = response.url().to_string();
    let status_code = response.status().as_u16();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.bytes().await?.to_vec();
    let byte = body.len();
    let kind = classify_content_type(content_type.as_deref());
    crate::logging::log_response(&access_point.name, Some(status_code), Some(elapsed), &body);

    Ok(DispatchOutcome {
        response: Response {
            url: final_url,
            status_code: Some(status_code),
            body,
            encoding: access_point
                .default_response_encoding
                .clone()
                .unwrap_or_else(|| "utf-8".to_string()),
            mime_type: content_type.clone(),
            content_type,
            byte: Some(byte),
            elapsed_sec: Some(elapsed),
            kind,
        },
    })
}

fn classify_content_type(content_type: Option<&str>) -> ResponseType {
    let Some(content_type) = content_type else {
        return ResponseType::Unknown;
    };
    let lowered = content_type.to_ascii_lowercase();
    if lowered.contains("json") {
        ResponseType::Json
    } else if lowered.contains("xml") {
        ResponseType::Xml
    } else if lowered.contains("html") {
        ResponseType::Html
    } else if lowered.contains("text/plain") {
        ResponseType::Plain
    } else {
        ResponseType::Unknown
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Runs the full eleven-step pipeline for a single request and produces its
/// `Trial`. Connection failure on either side short-circuits to a minimal
/// `Status::Failure` trial (§4.2 step 4) rather than propagating an error —
/// the run continues for every other trial regardless (§7 taxonomy 1).
///
/// # Errors
/// Propagates add-on internal failures (§7 taxonomy 3) and artifact I/O
/// failures (§7 taxonomy 4). Transport failures are *not* propagated; they
/// are folded into the returned `Trial`.
pub async fn run_trial(ctx: &TrialContext<'_>, seq: u32, request: &Request) -> Result<Trial, Error> {
    let request_time = Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    let name = request.display_name(seq);

    let url_one = build_url(&ctx.config.one, &request.path, &request.qs, &request.url_encoding);
    let url_other = build_url(&ctx.config.other, &request.path, &request.qs, &request.url_encoding);

    let headers_one = merge_headers(&ctx.config.one.headers, &request.headers);
    let headers_other = merge_headers(&ctx.config.other.headers, &request.headers);

    let (result_one, result_other) = tokio::join!(
        dispatch_one(
            ctx.client_one,
            &ctx.config.one,
            ctx.config.max_retries,
            &url_one,
            request.method,
            &headers_one,
            request.form.as_deref(),
            request.json.as_ref(),
        ),
        dispatch_one(
            ctx.client_other,
            &ctx.config.other,
            ctx.config.max_retries,
            &url_other,
            request.method,
            &headers_other,
            request.form.as_deref(),
            request.json.as_ref(),
        ),
    );

    let (outcome_one, outcome_other) = match (result_one, result_other) {
        (Ok(one), Ok(other)) => (one, other),
        _ => {
            return Ok(failure_trial(seq, &name, request, url_one, url_other));
        }
    };

    let (response_one, tags_one) = ctx.addons.apply_res2res(outcome_one.response, request)?;
    let (response_other, tags_other) = ctx.addons.apply_res2res(outcome_other.response, request)?;
    let mut tags: Vec<String> = tags_one.into_iter().chain(tags_other).collect();
    tags.sort();
    tags.dedup();

    let (response_one, dict_one) = ctx.addons.apply_res2dict(response_one)?;
    let (response_other, dict_other) = ctx.addons.apply_res2dict(response_other)?;

    let (diffs_by_cognition, regard_as_same) =
        compute_diff(&response_one, &response_other, &dict_one, &dict_other);

    let judgement_reference = JudgementReference {
        name: &name,
        path: &request.path,
        qs: &request.qs,
        headers: &request.headers,
        dict_one: &dict_one,
        dict_other: &dict_other,
        res_one: &response_one,
        res_other: &response_other,
    };
    let (diffs_by_cognition, regard_as_same) =
        ctx.addons
            .apply_judgement(diffs_by_cognition, regard_as_same, &judgement_reference)?;

    let diffs_by_cognition = drop_empty_cognitions(diffs_by_cognition);
    let status = if regard_as_same { Status::Same } else { Status::Different };

    let default_stored = status == Status::Different;
    let store_reference = StoreCriterionReference {
        status,
        req: request,
        res_one: &response_one,
        res_other: &response_other,
    };
    let stored = ctx.addons.apply_store_criterion(default_stored, &store_reference)?;

    let (file_one, prop_file_one, file_other, prop_file_other) = if stored {
        persist_artifacts(ctx, seq, &name, &response_one, &response_other, &dict_one, &dict_other)?
    } else {
        (None, None, None, None)
    };

    let trial = Trial {
        seq,
        name: name.clone(),
        tags,
        request_time,
        status,
        method: request.method,
        path: request.path.clone(),
        queries: request.qs.clone(),
        form: request.form.clone(),
        json: request.json.clone(),
        headers: request.headers.clone(),
        diffs_by_cognition,
        one: TrialSide {
            url: response_one.url.clone(),
            kind: response_one.kind,
            status_code: response_one.status_code,
            byte: response_one.byte,
            response_sec: response_one.elapsed_sec,
            content_type: response_one.content_type.clone(),
            mime_type: response_one.mime_type.clone(),
            encoding: Some(response_one.encoding.clone()),
            file: file_one,
            prop_file: prop_file_one,
        },
        other: TrialSide {
            url: response_other.url.clone(),
            kind: response_other.kind,
            status_code: response_other.status_code,
            byte: response_other.byte,
            response_sec: response_other.elapsed_sec,
            content_type: response_other.content_type.clone(),
            mime_type: response_other.mime_type.clone(),
            encoding: Some(response_other.encoding.clone()),
            file: file_other,
            prop_file: prop_file_other,
        },
    };

    let did_challenge_reference = DidChallengeReference {
        res_one: &response_one,
        res_other: &response_other,
        dict_one: &dict_one,
        dict_other: &dict_other,
    };
    let trial = ctx.addons.apply_did_challenge(trial, &did_challenge_reference)?;

    Ok(trial)
}

/// §4.2 step 7: compute the structured diff, or fall back to raw-byte
/// equality when either side lacks a structured dict.
fn compute_diff(
    response_one: &Response,
    response_other: &Response,
    dict_one: &Option<serde_json::Value>,
    dict_other: &Option<serde_json::Value>,
) -> (DiffsByCognition, bool) {
    match (dict_one, dict_other) {
        (Some(one), Some(other)) => {
            if response_one.body == response_other.body {
                (DiffsByCognition::new(), true)
            } else {
                let keys = diff::diff("<root>", one, other);
                let is_empty = keys.is_empty();
                let mut map = DiffsByCognition::new();
                map.insert("unknown".to_string(), keys);
                (map, is_empty)
            }
        }
        _ => {
            let equal = response_one.body == response_other.body;
            (DiffsByCognition::new(), equal)
        }
    }
}

fn drop_empty_cognitions(map: DiffsByCognition) -> DiffsByCognition {
    map.into_iter().filter(|(_, keys)| !keys.is_empty()).collect()
}

fn failure_trial(seq: u32, name: &str, request: &Request, url_one: String, url_other: String) -> Trial {
    let request_time = Local::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, false);
    Trial {
        seq,
        name: name.to_string(),
        tags: Vec::new(),
        request_time,
        status: Status::Failure,
        method: request.method,
        path: request.path.clone(),
        queries: request.qs.clone(),
        form: request.form.clone(),
        json: request.json.clone(),
        headers: request.headers.clone(),
        diffs_by_cognition: DiffsByCognition::new(),
        one: TrialSide::failure(url_one),
        other: TrialSide::failure(url_other),
    }
}

#[allow(clippy::too_many_arguments)]
fn persist_artifacts(
    ctx: &TrialContext<'_>,
    seq: u32,
    name: &str,
    response_one: &Response,
    response_other: &Response,
    dict_one: &Option<serde_json::Value>,
    dict_other: &Option<serde_json::Value>,
) -> Result<(Option<String>, Option<String>, Option<String>, Option<String>), Error> {
    let session_dir = ctx.response_dir.join(ctx.session_key);
    let file_name = format!("({seq}){name}");

    let dump_one = ctx.addons.apply_dump(
        response_one.clone(),
        response_one.body.clone(),
        response_one.encoding.clone(),
    )?;
    let dump_other = ctx.addons.apply_dump(
        response_other.clone(),
        response_other.body.clone(),
        response_other.encoding.clone(),
    )?;

    let one_path = session_dir.join("one").join(&file_name);
    let other_path = session_dir.join("other").join(&file_name);
    write_dump(&one_path, &dump_one)?;
    write_dump(&other_path, &dump_other)?;

    let mut prop_file_one = None;
    let mut prop_file_other = None;

    if let Some(dict) = dict_one {
        let path = session_dir.join("one-props").join(format!("{file_name}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(dict)?)?;
        prop_file_one = Some(path.to_string_lossy().to_string());
    }
    if let Some(dict) = dict_other {
        let path = session_dir.join("other-props").join(format!("{file_name}.json"));
        std::fs::write(&path, serde_json::to_vec_pretty(dict)?)?;
        prop_file_other = Some(path.to_string_lossy().to_string());
    }

    Ok((
        Some(one_path.to_string_lossy().to_string()),
        prop_file_one,
        Some(other_path.to_string_lossy().to_string()),
        prop_file_other,
    ))
}

fn write_dump(path: &Path, dump: &DumpPayload) -> Result<(), Error> {
    std::fs::write(path, &dump.body).map_err(Error::from)
}

/// Computes the session key for a new run from the resolved config and the
/// local time it started at (§6, §9).
///
/// # Errors
/// Returns an error if `config` cannot be serialized to JSON.
pub fn new_session_key(config: &Config) -> Result<String, serde_json::Error> {
    session_key(Local::now(), config)
}

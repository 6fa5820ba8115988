//! Data model: the replayable `Request`, the two-sided `AccessPoint`, the
//! captured `Response`, and the outcome types (`Status`, `Trial`, `Summary`,
//! `Report`) a run produces.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Multi-valued query string: each key maps to an ordered list of values.
pub type QueryMap = IndexMap<String, Vec<String>>;

/// HTTP method a `Request` may use. The engine only ever dispatches GET or POST.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
}

/// A single replayable input unit. Immutable once constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub name: Option<String>,
    pub method: Method,
    pub path: String,
    #[serde(default)]
    pub qs: QueryMap,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub form: Option<String>,
    #[serde(default)]
    pub json: Option<serde_json::Value>,
    #[serde(default = "default_url_encoding")]
    pub url_encoding: String,
}

fn default_url_encoding() -> String {
    "utf-8".to_string()
}

impl Request {
    /// The display name for this request: the configured `name`, or the
    /// stringified sequence number if absent (§4.2 tie-break).
    #[must_use]
    pub fn display_name(&self, seq: u32) -> String {
        self.name.clone().unwrap_or_else(|| seq.to_string())
    }
}

/// A path rewrite rule: `before` is matched as a regex against the request
/// path, `after` is the replacement (may reference capture groups).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRewrite {
    pub before: String,
    pub after: String,
}

/// Query customization for one access point: `overwrite` replaces or adds
/// keys, `remove` drops keys. Both match case-insensitively when the
/// configured key ends in `/i`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryCustomization {
    #[serde(default)]
    pub overwrite: QueryMap,
    #[serde(default)]
    pub remove: Vec<String>,
}

/// A proxy configuration for one access point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    pub http: Option<String>,
    pub https: Option<String>,
}

/// One side ("one" or "other") of the differential pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessPoint {
    pub name: String,
    pub host: String,
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
    #[serde(default)]
    pub path: Option<PathRewrite>,
    #[serde(default)]
    pub query: Option<QueryCustomization>,
    #[serde(default)]
    pub headers: IndexMap<String, String>,
    #[serde(default)]
    pub default_response_encoding: Option<String>,
}

/// Coarse content classification of a captured response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    Json,
    Xml,
    Html,
    Plain,
    Unknown,
}

/// One HTTP call's captured result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub url: String,
    pub status_code: Option<u16>,
    #[serde(skip)]
    pub body: Vec<u8>,
    pub encoding: String,
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub byte: Option<usize>,
    pub elapsed_sec: Option<f64>,
    #[serde(rename = "type")]
    pub kind: ResponseType,
}

impl Response {
    /// A minimal, unknown-typed response carrying only the attempted URL —
    /// used for the failure-trial minimal record (§4.2 step 4, §8 scenario 4).
    #[must_use]
    pub fn url_only(url: String) -> Self {
        Self {
            url,
            status_code: None,
            body: Vec::new(),
            encoding: String::new(),
            content_type: None,
            mime_type: None,
            byte: None,
            elapsed_sec: None,
            kind: ResponseType::Unknown,
        }
    }
}

/// Three ordered, deduplicated, lexicographically sorted lists of
/// XPath-like key strings.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiffKeys {
    pub added: Vec<String>,
    pub changed: Vec<String>,
    pub removed: Vec<String>,
}

impl DiffKeys {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.changed.is_empty() && self.removed.is_empty()
    }

    #[must_use]
    pub fn from_sets(
        added: BTreeSet<String>,
        changed: BTreeSet<String>,
        removed: BTreeSet<String>,
    ) -> Self {
        Self {
            added: added.into_iter().collect(),
            changed: changed.into_iter().collect(),
            removed: removed.into_iter().collect(),
        }
    }
}

/// Mapping from cognition label (e.g. `"unknown"`) to its `DiffKeys`.
pub type DiffsByCognition = IndexMap<String, DiffKeys>;

/// Outcome of comparing one trial's two responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Same,
    Different,
    Failure,
}

impl Status {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Different => "different",
            Self::Failure => "failure",
        }
    }
}

/// Per-side sub-record embedded in a `Trial`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrialSide {
    pub url: String,
    #[serde(rename = "type")]
    pub kind: ResponseType,
    pub status_code: Option<u16>,
    pub byte: Option<usize>,
    pub response_sec: Option<f64>,
    pub content_type: Option<String>,
    pub mime_type: Option<String>,
    pub encoding: Option<String>,
    pub file: Option<String>,
    pub prop_file: Option<String>,
}

impl TrialSide {
    /// Builds the minimal failure-side record: only `url` and `type: unknown`
    /// are populated (§8 "Failure minimality").
    #[must_use]
    pub fn failure(url: String) -> Self {
        Self {
            url,
            kind: ResponseType::Unknown,
            status_code: None,
            byte: None,
            response_sec: None,
            content_type: None,
            mime_type: None,
            encoding: None,
            file: None,
            prop_file: None,
        }
    }
}

/// A single request's full outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trial {
    pub seq: u32,
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub request_time: String,
    pub status: Status,
    pub method: Method,
    pub path: String,
    pub queries: QueryMap,
    pub form: Option<String>,
    pub json: Option<serde_json::Value>,
    pub headers: IndexMap<String, String>,
    pub diffs_by_cognition: DiffsByCognition,
    pub one: TrialSide,
    pub other: TrialSide,
}

/// Concurrency configuration echoed into the `Summary` (§4.3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Concurrency {
    pub processes: Option<usize>,
    pub threads: usize,
}

/// Output configuration echoed into the `Summary`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSummary {
    pub response_dir: String,
    pub encoding: String,
}

/// Run-level aggregate produced after all trials complete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub one: AccessPoint,
    pub other: AccessPoint,
    pub status: IndexMap<String, usize>,
    pub tags: Vec<String>,
    pub start: String,
    pub end: String,
    pub elapsed_sec: f64,
    pub output: OutputSummary,
    pub concurrency: Concurrency,
}

/// The run's top-level emitted document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub version: String,
    pub key: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub summary: Summary,
    pub trials: Vec<Trial>,
    pub addons: serde_json::Value,
    pub retry_hash: Option<String>,
}

//! Typed, resolved engine configuration.
//!
//! Configuration file loading and hierarchical merging are explicitly a
//! caller concern; `Config` is the fully resolved object the engine accepts
//! (§6). It deserializes with `serde_yaml` or `toml` directly, the same way
//! the rest of this crate's stack handles typed config, with `#[serde(default)]`
//! field defaults mirroring how config types elsewhere in this stack fill in unset keys.

use crate::model::AccessPoint;
use serde::{Deserialize, Serialize};

fn default_threads() -> usize {
    1
}

fn default_max_retries() -> u32 {
    3
}

fn default_encoding() -> String {
    "utf-8".to_string()
}

/// Output directory and encoding configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub response_dir: String,
    #[serde(default = "default_encoding")]
    pub encoding: String,
}

/// Ten add-on lists keyed by extension-point name. Each entry is an opaque
/// configuration fragment; the engine does not interpret the contents, only
/// passes them to the add-on registered under that name at construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddonsConfig {
    #[serde(default)]
    pub log2reqs: Vec<AddonSpec>,
    #[serde(default)]
    pub reqs2reqs: Vec<AddonSpec>,
    #[serde(default)]
    pub res2res: Vec<AddonSpec>,
    #[serde(default)]
    pub res2dict: Vec<AddonSpec>,
    #[serde(default)]
    pub judgement: Vec<AddonSpec>,
    #[serde(default)]
    pub store_criterion: Vec<AddonSpec>,
    #[serde(default)]
    pub dump: Vec<AddonSpec>,
    #[serde(default)]
    pub did_challenge: Vec<AddonSpec>,
    #[serde(default)]
    pub final_stage: Vec<AddonSpec>,
}

/// One configured add-on: the name it is registered under, its tags (for
/// `skip_addon_tag` filtering), and an opaque config fragment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddonSpec {
    pub name: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub config: serde_json::Value,
}

/// The fully resolved configuration the engine accepts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub one: AccessPoint,
    pub other: AccessPoint,
    pub output: OutputConfig,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub processes: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub input_files: Vec<String>,
    #[serde(default)]
    pub notifiers: serde_json::Value,
    #[serde(default)]
    pub addons: AddonsConfig,
    #[serde(default)]
    pub skip_addon_tag: Vec<String>,
}

impl Config {
    /// Effective worker count for the concurrency harness (§4.3): process
    /// count takes precedence when configured, else thread count, floored at 1.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.processes.unwrap_or(self.threads).max(1)
    }
}

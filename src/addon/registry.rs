//! Name-keyed add-on registry and config-driven loader (§4.1, §9 design
//! note: "Register concrete add-ons in a table keyed by name; the executor
//! iterates the configured list per stage").
//!
//! `build_executor` resolves `config.addons` (§6) against this table,
//! excluding any configured add-on whose tags intersect `config.skip_addon_tag`
//! before construction (§4.1 "an engine-wide skip_addon_tag set excludes
//! matching add-ons at load time"). Unknown fields in an add-on's own config
//! fragment are rejected by that add-on's constructor, per §9's "unknown
//! fields are rejected".

use super::log2reqs::JsonLines;
use super::reqs2reqs::Repeat;
use super::{AddOnExecutor, Log2ReqsAddOn, Reqs2ReqsAddOn};
use crate::config::{AddonSpec, Config};
use crate::error::Error;

fn is_tagged_out(spec: &AddonSpec, skip_addon_tag: &[String]) -> bool {
    spec.tags.iter().any(|tag| skip_addon_tag.contains(tag))
}

fn build_log2reqs(spec: &AddonSpec) -> Result<Box<dyn Log2ReqsAddOn>, Error> {
    match spec.name.as_str() {
        "json_lines" => Ok(Box::new(JsonLines)),
        other => Err(Error::configuration(format!(
            "no log2reqs registry entry for '{other}'"
        ))),
    }
}

fn build_reqs2reqs(spec: &AddonSpec) -> Result<Box<dyn Reqs2ReqsAddOn>, Error> {
    match spec.name.as_str() {
        "repeat" => {
            let times = spec
                .config
                .get("times")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(1);
            Ok(Box::new(Repeat {
                times: usize::try_from(times).unwrap_or(1),
            }))
        }
        other => Err(Error::configuration(format!(
            "no reqs2reqs registry entry for '{other}'"
        ))),
    }
}

/// Fails loudly if any (non-tagged-out) add-on is configured for a stage
/// with no first-party registry entry (§1: every concrete add-on beyond the
/// two illustrative ones in §10.6 remains plug-in code this crate cannot
/// resolve by name — silently dropping the request would violate §7's "no
/// error is silently dropped").
fn reject_unregistered(stage: &str, specs: &[AddonSpec], skip_addon_tag: &[String]) -> Result<(), Error> {
    for spec in specs {
        if is_tagged_out(spec, skip_addon_tag) {
            continue;
        }
        return Err(Error::configuration(format!(
            "no {stage} registry entry for '{}': concrete {stage} add-ons are plug-in code",
            spec.name
        )));
    }
    Ok(())
}

/// Builds an `AddOnExecutor` from `config.addons`, resolving each configured
/// `AddonSpec` by name against this module's registry and skipping entries
/// tagged out by `config.skip_addon_tag`.
///
/// # Errors
/// Returns a `Configuration` error if any configured add-on name has no
/// registry entry for its stage.
pub fn build_executor(config: &Config) -> Result<AddOnExecutor, Error> {
    let addons = &config.addons;
    let skip = &config.skip_addon_tag;
    let mut executor = AddOnExecutor::new();

    for spec in &addons.log2reqs {
        if is_tagged_out(spec, skip) {
            continue;
        }
        executor.log2reqs.push(build_log2reqs(spec)?);
    }
    for spec in &addons.reqs2reqs {
        if is_tagged_out(spec, skip) {
            continue;
        }
        executor.reqs2reqs.push(build_reqs2reqs(spec)?);
    }

    reject_unregistered("res2res", &addons.res2res, skip)?;
    reject_unregistered("res2dict", &addons.res2dict, skip)?;
    reject_unregistered("judgement", &addons.judgement, skip)?;
    reject_unregistered("store_criterion", &addons.store_criterion, skip)?;
    reject_unregistered("dump", &addons.dump, skip)?;
    reject_unregistered("did_challenge", &addons.did_challenge, skip)?;
    reject_unregistered("final", &addons.final_stage, skip)?;

    Ok(executor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AddonsConfig, OutputConfig};
    use crate::model::AccessPoint;
    use indexmap::IndexMap;

    fn base_config() -> Config {
        Config {
            one: AccessPoint {
                name: "one".to_string(),
                host: "http://one.test".to_string(),
                proxy: None,
                path: None,
                query: None,
                headers: IndexMap::new(),
                default_response_encoding: None,
            },
            other: AccessPoint {
                name: "other".to_string(),
                host: "http://other.test".to_string(),
                proxy: None,
                path: None,
                query: None,
                headers: IndexMap::new(),
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
            addons: AddonsConfig::default(),
            skip_addon_tag: Vec::new(),
        }
    }

    #[test]
    fn resolves_configured_add_ons_by_name() {
        let mut config = base_config();
        config.addons.reqs2reqs.push(AddonSpec {
            name: "repeat".to_string(),
            tags: Vec::new(),
            config: serde_json::json!({"times": 3}),
        });

        let executor = build_executor(&config).unwrap();
        assert_eq!(executor.reqs2reqs.len(), 1);
    }

    #[test]
    fn skip_addon_tag_excludes_matching_entries_at_load_time() {
        let mut config = base_config();
        config.skip_addon_tag.push("disabled".to_string());
        config.addons.reqs2reqs.push(AddonSpec {
            name: "repeat".to_string(),
            tags: vec!["disabled".to_string()],
            config: serde_json::json!({"times": 3}),
        });

        let executor = build_executor(&config).unwrap();
        assert!(executor.reqs2reqs.is_empty());
    }

    #[test]
    fn unknown_add_on_name_is_a_configuration_error() {
        let mut config = base_config();
        config.addons.reqs2reqs.push(AddonSpec {
            name: "nonexistent".to_string(),
            tags: Vec::new(),
            config: serde_json::Value::Null,
        });

        assert!(build_executor(&config).is_err());
    }

    #[test]
    fn unregistered_stage_addon_is_a_configuration_error() {
        let mut config = base_config();
        config.addons.judgement.push(AddonSpec {
            name: "ignore_properties".to_string(),
            tags: Vec::new(),
            config: serde_json::Value::Null,
        });

        assert!(build_executor(&config).is_err());
    }
}

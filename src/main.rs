//! Minimal demo binary: loads a config file, resolves its `addons.log2reqs`/
//! `addons.reqs2reqs` entries against the first-party registry, runs the
//! session, and prints the resulting report as JSON. No CLI parsing of
//! consequence — argument handling beyond the config path is a caller
//! concern (§1).

use std::sync::Arc;
use twinspan::addon::registry;
use twinspan::config::Config;

#[tokio::main]
async fn main() {
    twinspan::logging::init_default_subscriber();

    let config_path = std::env::args().nth(1).unwrap_or_else(|| "twinspan.yml".to_string());

    let config: Config = match std::fs::read_to_string(&config_path) {
        Ok(contents) => match serde_yaml::from_str(&contents) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("failed to parse '{config_path}': {e}");
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("failed to read '{config_path}': {e}");
            std::process::exit(1);
        }
    };

    let mut executor = match registry::build_executor(&config) {
        Ok(executor) => executor,
        Err(e) => {
            eprintln!("failed to resolve configured add-ons: {e}");
            std::process::exit(1);
        }
    };
    // No log2reqs add-on configured: fall back to the illustrative default
    // so this demo binary stays runnable against a bare config.
    if executor.log2reqs.is_empty() {
        executor.log2reqs.push(Box::new(twinspan::addon::log2reqs::JsonLines));
    }
    let addons = Arc::new(executor);

    let mut requests = Vec::new();
    for file in &config.input_files {
        match addons.apply_log2reqs(file) {
            Ok(parsed) => requests.extend(parsed),
            Err(e) => {
                eprintln!("failed to load requests from '{file}': {e}");
                std::process::exit(1);
            }
        }
    }

    match twinspan::run(&config, addons, &requests, None).await {
        Ok(report) => match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => eprintln!("failed to serialize report: {e}"),
        },
        Err(e) => {
            eprintln!("run failed: {e}");
            std::process::exit(1);
        }
    }
}

//! Concurrency harness invariants (§4.3, §8): output order matches input
//! order regardless of completion order, and every request produces exactly
//! one trial.

use indexmap::IndexMap;
use std::sync::Arc;
use twinspan::addon::AddOnExecutor;
use twinspan::config::{Config, OutputConfig};
use twinspan::dispatch::run_all;
use twinspan::model::{AccessPoint, Method, QueryMap, Request};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn access_point(name: &str, host: String) -> AccessPoint {
    AccessPoint {
        name: name.to_string(),
        host,
        proxy: None,
        path: None,
        query: None,
        headers: IndexMap::new(),
        default_response_encoding: None,
    }
}

#[tokio::test]
async fn trial_order_matches_request_order_under_variable_latency() {
    let one_server = MockServer::start().await;
    let other_server = MockServer::start().await;

    // The first request is delayed longer than the later ones, so a
    // completion-order collection would misplace it.
    Mock::given(method("GET"))
        .and(path_regex(r"^/slow"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_millis(120)).set_body_string("ok"))
        .mount(&one_server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/fast"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&one_server)
        .await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&other_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let cfg = Config {
        one: access_point("one", one_server.uri()),
        other: access_point("other", other_server.uri()),
        output: OutputConfig {
            response_dir: dir.path().to_string_lossy().to_string(),
            encoding: "utf-8".to_string(),
        },
        threads: 8,
        processes: None,
        max_retries: 0,
        title: None,
        description: None,
        tags: Vec::new(),
        input_files: Vec::new(),
        notifiers: serde_json::Value::Null,
        addons: Default::default(),
        skip_addon_tag: Vec::new(),
    };

    let requests: Vec<Request> = vec!["/slow/1", "/fast/2", "/fast/3", "/fast/4"]
        .into_iter()
        .map(|p| Request {
            name: Some(p.to_string()),
            method: Method::Get,
            path: p.to_string(),
            qs: QueryMap::new(),
            headers: IndexMap::new(),
            form: None,
            json: None,
            url_encoding: "utf-8".to_string(),
        })
        .collect();

    let addons = Arc::new(AddOnExecutor::new());
    let client_one = twinspan::client::build_client(&cfg.one).unwrap();
    let client_other = twinspan::client::build_client(&cfg.other).unwrap();

    let trials = run_all(&cfg, &addons, &client_one, &client_other, dir.path(), "order-test", &requests)
        .await
        .unwrap();

    assert_eq!(trials.len(), requests.len());
    for (i, trial) in trials.iter().enumerate() {
        assert_eq!(trial.seq, u32::try_from(i + 1).unwrap());
        assert_eq!(trial.path, requests[i].path);
    }
}

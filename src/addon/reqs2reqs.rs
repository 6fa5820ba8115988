//! A `reqs2reqs` add-on that repeats the parsed request list `times`-fold.
//! Directly grounded on the original Python implementation's
//! `jumeaux/addons/reqs2reqs/repeat.py`, whose entire behavior is multiplying
//! `payload.requests` by a configured `times` count.

use super::{Reqs2ReqsAddOn, Reqs2ReqsPayload};
use crate::config::Config;
use crate::error::Error;

pub struct Repeat {
    pub times: usize,
}

impl Reqs2ReqsAddOn for Repeat {
    fn exec(&self, payload: Reqs2ReqsPayload, _config: &Config) -> Result<Reqs2ReqsPayload, Error> {
        let mut requests = Vec::with_capacity(payload.requests.len() * self.times);
        for _ in 0..self.times {
            requests.extend(payload.requests.iter().cloned());
        }
        Ok(Reqs2ReqsPayload { requests })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Method, QueryMap, Request};
    use indexmap::IndexMap;

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
            addons: Default::default(),
            skip_addon_tag: Vec::new(),
        }
    }

    #[test]
    fn repeats_requests_times_fold() {
        let req = Request {
            name: Some("r".to_string()),
            method: Method::Get,
            path: "/p".to_string(),
            qs: QueryMap::new(),
            headers: IndexMap::new(),
            form: None,
            json: None,
            url_encoding: "utf-8".to_string(),
        };
        let addon = Repeat { times: 3 };
        let result = addon
            .exec(
                Reqs2ReqsPayload {
                    requests: vec![req],
                },
                &sample_config(),
            )
            .unwrap();
        assert_eq!(result.requests.len(), 3);
    }
}

//! The add-on executor: ten extension points, each a capability of a payload
//! type (mutated, threaded through a configured list of add-ons) and an
//! optional reference type (immutable context, §4.1).
//!
//! Concrete add-ons are plug-in code per §1's Non-goals; this module defines
//! only the contract plus a first-party `Identity` implementation per stage
//! (the default when a stage has no configured add-ons). The shape — a trait
//! per pipeline stage, a registry of boxed trait objects invoked in
//! configured order — is modeled on a dispatcher that separates execution
//! context (`ExecutionContext`, `OperationCall`) from the thing being
//! dispatched, generalized here to a fold over a payload rather than a
//! single call.

pub mod log2reqs;
pub mod registry;
pub mod reqs2reqs;

use crate::config::Config;
use crate::error::Error;
use crate::model::{DiffsByCognition, OutputSummary, QueryMap, Report, Request, Response, Status, Trial};
use indexmap::IndexMap;
use serde_json::Value;

pub struct Log2ReqsPayload {
    pub file: String,
    pub requests: Vec<Request>,
}

pub trait Log2ReqsAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: Log2ReqsPayload) -> Result<Log2ReqsPayload, Error>;
}

pub struct Reqs2ReqsPayload {
    pub requests: Vec<Request>,
}

pub trait Reqs2ReqsAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: Reqs2ReqsPayload, config: &Config) -> Result<Reqs2ReqsPayload, Error>;
}

pub struct Res2ResPayload {
    pub response: Response,
    pub tags: Vec<String>,
}

pub trait Res2ResAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: Res2ResPayload, req: &Request) -> Result<Res2ResPayload, Error>;
}

pub struct Res2DictPayload {
    pub response: Response,
    pub result: Option<Value>,
}

pub trait Res2DictAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: Res2DictPayload) -> Result<Res2DictPayload, Error>;
}

pub struct JudgementReference<'a> {
    pub name: &'a str,
    pub path: &'a str,
    pub qs: &'a QueryMap,
    pub headers: &'a IndexMap<String, String>,
    pub dict_one: &'a Option<Value>,
    pub dict_other: &'a Option<Value>,
    pub res_one: &'a Response,
    pub res_other: &'a Response,
}

pub struct JudgementPayload {
    pub diffs_by_cognition: DiffsByCognition,
    pub regard_as_same: bool,
}

pub trait JudgementAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: JudgementPayload, reference: &JudgementReference<'_>) -> Result<JudgementPayload, Error>;
}

pub struct StoreCriterionReference<'a> {
    pub status: Status,
    pub req: &'a Request,
    pub res_one: &'a Response,
    pub res_other: &'a Response,
}

pub struct StoreCriterionPayload {
    pub stored: bool,
}

pub trait StoreCriterionAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(
        &self,
        payload: StoreCriterionPayload,
        reference: &StoreCriterionReference<'_>,
    ) -> Result<StoreCriterionPayload, Error>;
}

pub struct DumpPayload {
    pub response: Response,
    pub body: Vec<u8>,
    pub encoding: String,
}

pub trait DumpAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: DumpPayload) -> Result<DumpPayload, Error>;
}

pub struct DidChallengeReference<'a> {
    pub res_one: &'a Response,
    pub res_other: &'a Response,
    pub dict_one: &'a Option<Value>,
    pub dict_other: &'a Option<Value>,
}

pub struct DidChallengePayload {
    pub trial: Trial,
}

pub trait DidChallengeAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: DidChallengePayload, reference: &DidChallengeReference<'_>) -> Result<DidChallengePayload, Error>;
}

pub struct FinalPayload {
    pub report: Report,
    pub output_summary: OutputSummary,
}

pub trait FinalAddOn: Send + Sync {
    /// # Errors
    /// Propagates any add-on-internal failure (§7 taxonomy 3).
    fn exec(&self, payload: FinalPayload, notifiers: &Value) -> Result<FinalPayload, Error>;
}

/// Holds the configured add-on list for each of the ten extension points and
/// applies each stage by folding the list over the payload in order.
/// Unconfigured stages are identities (§4.1 "Default stages are identities").
#[derive(Default)]
pub struct AddOnExecutor {
    pub log2reqs: Vec<Box<dyn Log2ReqsAddOn>>,
    pub reqs2reqs: Vec<Box<dyn Reqs2ReqsAddOn>>,
    pub res2res: Vec<Box<dyn Res2ResAddOn>>,
    pub res2dict: Vec<Box<dyn Res2DictAddOn>>,
    pub judgement: Vec<Box<dyn JudgementAddOn>>,
    pub store_criterion: Vec<Box<dyn StoreCriterionAddOn>>,
    pub dump: Vec<Box<dyn DumpAddOn>>,
    pub did_challenge: Vec<Box<dyn DidChallengeAddOn>>,
    pub final_stage: Vec<Box<dyn FinalAddOn>>,
}

impl AddOnExecutor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_log2reqs(&self, file: &str) -> Result<Vec<Request>, Error> {
        let mut payload = Log2ReqsPayload {
            file: file.to_string(),
            requests: Vec::new(),
        };
        for addon in &self.log2reqs {
            payload = addon.exec(payload)?;
        }
        Ok(payload.requests)
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_reqs2reqs(&self, requests: Vec<Request>, config: &Config) -> Result<Vec<Request>, Error> {
        let mut payload = Reqs2ReqsPayload { requests };
        for addon in &self.reqs2reqs {
            payload = addon.exec(payload, config)?;
        }
        Ok(payload.requests)
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_res2res(&self, response: Response, req: &Request) -> Result<(Response, Vec<String>), Error> {
        let mut payload = Res2ResPayload {
            response,
            tags: Vec::new(),
        };
        for addon in &self.res2res {
            payload = addon.exec(payload, req)?;
        }
        Ok((payload.response, payload.tags))
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_res2dict(&self, response: Response) -> Result<(Response, Option<Value>), Error> {
        let mut payload = Res2DictPayload {
            response,
            result: None,
        };
        for addon in &self.res2dict {
            payload = addon.exec(payload)?;
        }
        Ok((payload.response, payload.result))
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_judgement(
        &self,
        diffs_by_cognition: DiffsByCognition,
        regard_as_same: bool,
        reference: &JudgementReference<'_>,
    ) -> Result<(DiffsByCognition, bool), Error> {
        let mut payload = JudgementPayload {
            diffs_by_cognition,
            regard_as_same,
        };
        for addon in &self.judgement {
            payload = addon.exec(payload, reference)?;
        }
        Ok((payload.diffs_by_cognition, payload.regard_as_same))
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_store_criterion(
        &self,
        default_stored: bool,
        reference: &StoreCriterionReference<'_>,
    ) -> Result<bool, Error> {
        let mut payload = StoreCriterionPayload {
            stored: default_stored,
        };
        for addon in &self.store_criterion {
            payload = addon.exec(payload, reference)?;
        }
        Ok(payload.stored)
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_dump(&self, response: Response, body: Vec<u8>, encoding: String) -> Result<DumpPayload, Error> {
        let mut payload = DumpPayload {
            response,
            body,
            encoding,
        };
        for addon in &self.dump {
            payload = addon.exec(payload)?;
        }
        Ok(payload)
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_did_challenge(&self, trial: Trial, reference: &DidChallengeReference<'_>) -> Result<Trial, Error> {
        let mut payload = DidChallengePayload { trial };
        for addon in &self.did_challenge {
            payload = addon.exec(payload, reference)?;
        }
        Ok(payload.trial)
    }

    /// # Errors
    /// Propagates the first add-on-internal failure encountered.
    pub fn apply_final(
        &self,
        report: Report,
        output_summary: OutputSummary,
        notifiers: &Value,
    ) -> Result<(Report, OutputSummary), Error> {
        let mut payload = FinalPayload {
            report,
            output_summary,
        };
        for addon in &self.final_stage {
            payload = addon.exec(payload, notifiers)?;
        }
        Ok((payload.report, payload.output_summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unconfigured_stages_are_identities() {
        let executor = AddOnExecutor::new();
        let response = Response::url_only("http://example.test".to_string());
        let (out, tags) = executor
            .apply_res2res(
                response,
                &Request {
                    name: None,
                    method: crate::model::Method::Get,
                    path: "/".to_string(),
                    qs: QueryMap::new(),
                    headers: IndexMap::new(),
                    form: None,
                    json: None,
                    url_encoding: "utf-8".to_string(),
                },
            )
            .unwrap();
        assert!(tags.is_empty());
        assert_eq!(out.url, "http://example.test");
    }

    #[test]
    fn store_criterion_default_policy_passes_through_when_unconfigured() {
        let executor = AddOnExecutor::new();
        let req = Request {
            name: None,
            method: crate::model::Method::Get,
            path: "/".to_string(),
            qs: QueryMap::new(),
            headers: IndexMap::new(),
            form: None,
            json: None,
            url_encoding: "utf-8".to_string(),
        };
        let res = Response::url_only("http://example.test".to_string());
        let reference = StoreCriterionReference {
            status: Status::Different,
            req: &req,
            res_one: &res,
            res_other: &res,
        };
        let stored = executor.apply_store_criterion(true, &reference).unwrap();
        assert!(stored);
    }
}

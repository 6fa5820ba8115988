//! A minimal `log2reqs` add-on: one JSON-encoded `Request` per line of the
//! input file. Illustrative first-party implementation of the simplest
//! faithful `log2reqs` contract (§10.6); concrete parsers for other input
//! formats remain plug-in code per §1.

use super::{Log2ReqsAddOn, Log2ReqsPayload};
use crate::error::Error;
use crate::model::Request;
use std::fs;

pub struct JsonLines;

impl Log2ReqsAddOn for JsonLines {
    fn exec(&self, mut payload: Log2ReqsPayload) -> Result<Log2ReqsPayload, Error> {
        let contents = fs::read_to_string(&payload.file)?;

        for (line_no, line) in contents.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let request: Request = serde_json::from_str(trimmed).map_err(|e| {
                Error::addon_named(
                    "log2reqs",
                    "json_lines",
                    format!("line {}: {e}", line_no + 1),
                )
            })?;
            payload.requests.push(request);
        }

        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_one_request_per_line() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"name":"a","method":"GET","path":"/p1"}}"#).unwrap();
        writeln!(file).unwrap();
        writeln!(file, r#"{{"name":"b","method":"POST","path":"/p2"}}"#).unwrap();

        let executor = JsonLines;
        let payload = Log2ReqsPayload {
            file: file.path().to_string_lossy().to_string(),
            requests: Vec::new(),
        };
        let result = executor.exec(payload).unwrap();
        assert_eq!(result.requests.len(), 2);
        assert_eq!(result.requests[0].path, "/p1");
        assert_eq!(result.requests[1].path, "/p2");
    }
}

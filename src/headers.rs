//! Header merge for one side of a trial (§4.2 step 2).
//!
//! Precedence, later wins: default `User-Agent` ← access-point `headers` ←
//! request `headers`. Grounded on the original Python implementation's
//! `merge_headers`, whose base value is the tool's own name and version; this
//! crate substitutes its own (§9 open question resolution).

use indexmap::IndexMap;

fn default_user_agent() -> String {
    concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string()
}

/// Merges the default `User-Agent`, the access point's header overlay, and
/// the request's own headers, in that precedence order.
#[must_use]
pub fn merge_headers(
    access_point_headers: &IndexMap<String, String>,
    request_headers: &IndexMap<String, String>,
) -> IndexMap<String, String> {
    let mut merged = IndexMap::new();
    merged.insert("User-Agent".to_string(), default_user_agent());

    for (key, value) in access_point_headers {
        merged.insert(key.clone(), value.clone());
    }
    for (key, value) in request_headers {
        merged.insert(key.clone(), value.clone());
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_user_agent_is_used_when_nothing_overlays_it() {
        let merged = merge_headers(&IndexMap::new(), &IndexMap::new());
        assert_eq!(merged.get("User-Agent"), Some(&default_user_agent()));
    }

    #[test]
    fn request_headers_win_over_access_point_headers() {
        let mut side = IndexMap::new();
        side.insert("X-Trace".to_string(), "side".to_string());
        let mut req = IndexMap::new();
        req.insert("X-Trace".to_string(), "request".to_string());

        let merged = merge_headers(&side, &req);
        assert_eq!(merged.get("X-Trace"), Some(&"request".to_string()));
    }

    #[test]
    fn access_point_headers_win_over_default_user_agent() {
        let mut side = IndexMap::new();
        side.insert("User-Agent".to_string(), "custom-agent/1".to_string());

        let merged = merge_headers(&side, &IndexMap::new());
        assert_eq!(merged.get("User-Agent"), Some(&"custom-agent/1".to_string()));
    }

    #[test]
    fn full_precedence_chain() {
        let mut side = IndexMap::new();
        side.insert("User-Agent".to_string(), "side-agent".to_string());
        let mut req = IndexMap::new();
        req.insert("User-Agent".to_string(), "req-agent".to_string());

        let merged = merge_headers(&side, &req);
        assert_eq!(merged.get("User-Agent"), Some(&"req-agent".to_string()));
    }
}

//! URL construction: path rewrite, query customization, and multi-valued
//! query-string encoding (§4.2 step 1).
//!
//! Grounded on the original Python implementation's
//! `select_key_as_case_insensitive` and `create_query_string`: case-insensitive
//! key matching is opted into per-key by a trailing `/i` suffix on the
//! *configured* key, never on the request's own query keys.

use crate::model::{AccessPoint, PathRewrite, QueryCustomization, QueryMap};
use encoding_rs::Encoding;
use regex::Regex;

/// Applies a path rewrite rule, or returns the original path unchanged if
/// none is configured (§4.2 step 1, first clause).
#[must_use]
pub fn rewrite_path(path: &str, rewrite: Option<&PathRewrite>) -> String {
    let Some(rewrite) = rewrite else {
        return path.to_string();
    };
    let Ok(re) = Regex::new(&rewrite.before) else {
        return path.to_string();
    };
    re.replace(path, rewrite.after.as_str()).into_owned()
}

/// Strips a trailing `/i` case-insensitivity marker from a configured key,
/// returning the bare key and whether the marker was present.
fn strip_ci_marker(key: &str) -> (&str, bool) {
    key.strip_suffix("/i").map_or((key, false), |bare| (bare, true))
}

/// Looks up `target_key` in `qs`, honoring an `/i`-suffixed `target_key` as a
/// case-insensitive match against the query's own keys. Returns the actual
/// key present in `qs`, if any.
fn resolve_key<'a>(target_key: &str, qs: &'a QueryMap) -> Option<&'a str> {
    let (bare, case_insensitive) = strip_ci_marker(target_key);
    if case_insensitive {
        qs.keys()
            .find(|k| k.eq_ignore_ascii_case(bare))
            .map(String::as_str)
    } else {
        qs.keys().find(|k| k.as_str() == bare).map(String::as_str)
    }
}

/// Applies `overwrite` then `remove` from a `QueryCustomization` to a base
/// query map, both matched case-insensitively when the configured key ends
/// in `/i` (§4.2 step 1, second clause).
#[must_use]
pub fn customize_query(base: &QueryMap, customization: Option<&QueryCustomization>) -> QueryMap {
    let mut qs = base.clone();

    let Some(customization) = customization else {
        return qs;
    };

    for (key, values) in &customization.overwrite {
        let (bare, _) = strip_ci_marker(key);
        let target_key = match resolve_key(key, &qs) {
            Some(existing) => existing.to_string(),
            None => bare.to_string(),
        };
        qs.shift_remove(&target_key);
        qs.insert(target_key, values.clone());
    }

    for key in &customization.remove {
        if let Some(existing) = resolve_key(key, &qs) {
            let existing = existing.to_string();
            qs.shift_remove(&existing);
        }
    }

    qs
}

/// Resolves a `Request.url_encoding` label (e.g. `"utf-8"`, `"shift_jis"`) to
/// an `encoding_rs::Encoding`, defaulting to UTF-8 for an empty or
/// unrecognized label.
fn resolve_encoding(url_encoding: &str) -> &'static Encoding {
    Encoding::for_label(url_encoding.as_bytes()).unwrap_or(encoding_rs::UTF_8)
}

/// Serializes a multi-valued query map with `doseq`-style repeated keys:
/// `{k: [a, b]}` becomes `k=a&k=b` (§4.2 step 1, §8 "Query encoding"), with
/// key and value bytes transcoded into `url_encoding` (defaulting to UTF-8)
/// before percent-encoding, matching the original's `create_query_string`
/// encoding parameter. An empty map yields an empty string (no leading `?`
/// is added by the caller).
#[must_use]
pub fn encode_query(qs: &QueryMap, url_encoding: &str) -> String {
    let encoding = resolve_encoding(url_encoding);
    let mut pairs = Vec::new();
    for (key, values) in qs {
        let (encoded_key, _, _) = encoding.encode(key);
        for value in values {
            let (encoded_value, _, _) = encoding.encode(value);
            pairs.push(format!(
                "{}={}",
                urlencoding::encode_binary(&encoded_key),
                urlencoding::encode_binary(&encoded_value)
            ));
        }
    }
    pairs.join("&")
}

/// Builds the final URL for one access point: host + rewritten path +
/// encoded, customized query string (§4.2 step 1).
#[must_use]
pub fn build_url(access_point: &AccessPoint, path: &str, qs: &QueryMap, url_encoding: &str) -> String {
    let rewritten_path = rewrite_path(path, access_point.path.as_ref());
    let customized = customize_query(qs, access_point.query.as_ref());
    let encoded = encode_query(&customized, url_encoding);

    if encoded.is_empty() {
        format!("{}{}", access_point.host, rewritten_path)
    } else {
        format!("{}{}?{}", access_point.host, rewritten_path, encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;

    fn qs_of(pairs: &[(&str, &[&str])]) -> QueryMap {
        pairs
            .iter()
            .map(|(k, vs)| ((*k).to_string(), vs.iter().map(|v| (*v).to_string()).collect()))
            .collect()
    }

    #[test]
    fn empty_query_has_no_question_mark() {
        let qs = QueryMap::new();
        assert_eq!(encode_query(&qs, "utf-8"), "");
    }

    #[test]
    fn multi_valued_query_repeats_the_key() {
        let qs = qs_of(&[("q1", &["1"]), ("q2", &["2-1", "2-2"])]);
        assert_eq!(encode_query(&qs, "utf-8"), "q1=1&q2=2-1&q2=2-2");
    }

    #[test]
    fn unrecognized_encoding_label_falls_back_to_utf8() {
        let qs = qs_of(&[("q1", &["1"])]);
        assert_eq!(encode_query(&qs, ""), "q1=1");
    }

    #[test]
    fn non_utf8_encoding_transcodes_before_percent_encoding() {
        // U+00E9 (é) is a single byte (0xE9) in Latin-1/windows-1252, versus
        // the two UTF-8 bytes (0xC3 0xA9) it would percent-encode to otherwise.
        let qs = qs_of(&[("q", &["\u{00e9}"])]);
        let encoded = encode_query(&qs, "iso-8859-1");
        assert_eq!(encoded, "q=%E9");
    }

    #[test]
    fn path_rewrite_applies_regex_substitution() {
        let rewrite = PathRewrite {
            before: "^/v1/".to_string(),
            after: "/v2/".to_string(),
        };
        assert_eq!(rewrite_path("/v1/users", Some(&rewrite)), "/v2/users");
    }

    #[test]
    fn path_rewrite_absent_keeps_original() {
        assert_eq!(rewrite_path("/v1/users", None), "/v1/users");
    }

    #[test]
    fn overwrite_with_ci_marker_matches_case_insensitively() {
        let base = qs_of(&[("q1", &["1"])]);
        let customization = QueryCustomization {
            overwrite: qs_of(&[("Q1/i", &["z"])]),
            remove: Vec::new(),
        };
        let result = customize_query(&base, Some(&customization));
        assert_eq!(result.get("q1"), Some(&vec!["z".to_string()]));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn remove_with_ci_marker_drops_case_insensitively() {
        let base = qs_of(&[("Q1", &["1"]), ("q2", &["2"])]);
        let mut overwrite = IndexMap::new();
        overwrite.insert("unused".to_string(), vec!["x".to_string()]);
        let customization = QueryCustomization {
            overwrite: IndexMap::new(),
            remove: vec!["q1/i".to_string()],
        };
        let _ = overwrite;
        let result = customize_query(&base, Some(&customization));
        assert!(result.get("Q1").is_none());
        assert_eq!(result.get("q2"), Some(&vec!["2".to_string()]));
    }

    #[test]
    fn customization_scoped_to_one_side_leaves_other_untouched() {
        let base = qs_of(&[("q1", &["1"])]);
        assert_eq!(customize_query(&base, None), base);
    }
}

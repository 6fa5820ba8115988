//! Structured diff between two JSON-like trees and XPath-like key normalization.
//!
//! Grounded on the four edit kinds named in the original Python tool's
//! `DeepDiff`-based comparison (`type_changes`, `values_changed`,
//! `dictionary_item_added`/`iterable_item_added`,
//! `dictionary_item_removed`/`iterable_item_removed`) and on its
//! `to_jumeaux_xpath` path normalization, reimplemented here as a plain
//! recursive comparator (§9): no external deep-diff dependency is required,
//! a tagged-union tree walk suffices.

use crate::model::DiffKeys;
use serde_json::Value;
use std::collections::BTreeSet;

/// Walks two JSON trees and produces the added/changed/removed XPath-like
/// key sets (§4.2 step 7). `root` is the already-bracketed path segment for
/// the tree root, e.g. `"<root>"`, so a nested path reads `<root><items><3>`
/// as in §8 scenario 2.
#[must_use]
pub fn diff(root: &str, one: &Value, other: &Value) -> DiffKeys {
    let mut added = BTreeSet::new();
    let mut changed = BTreeSet::new();
    let mut removed = BTreeSet::new();

    walk(root, one, other, &mut added, &mut changed, &mut removed);

    DiffKeys::from_sets(added, changed, removed)
}

fn walk(
    path: &str,
    one: &Value,
    other: &Value,
    added: &mut BTreeSet<String>,
    changed: &mut BTreeSet<String>,
    removed: &mut BTreeSet<String>,
) {
    match (one, other) {
        (Value::Object(a), Value::Object(b)) => {
            for (key, a_val) in a {
                let child_path = format!("{path}<{key}>");
                match b.get(key) {
                    Some(b_val) => walk(&child_path, a_val, b_val, added, changed, removed),
                    None => {
                        removed.insert(child_path);
                    }
                }
            }
            for key in b.keys() {
                if !a.contains_key(key) {
                    added.insert(format!("{path}<{key}>"));
                }
            }
        }
        (Value::Array(a), Value::Array(b)) => {
            for (i, a_val) in a.iter().enumerate() {
                let child_path = format!("{path}<{i}>");
                match b.get(i) {
                    Some(b_val) => walk(&child_path, a_val, b_val, added, changed, removed),
                    None => {
                        removed.insert(child_path);
                    }
                }
            }
            for i in a.len()..b.len() {
                added.insert(format!("{path}<{i}>"));
            }
        }
        (a_val, b_val) => {
            if std::mem::discriminant(a_val) != std::mem::discriminant(b_val) || a_val != b_val {
                changed.insert(path.to_string());
            }
        }
    }
}

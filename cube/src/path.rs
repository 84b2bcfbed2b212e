//! FILENAME: cube/src/path.rs
//! PURPOSE: Slash-delimited path resolution with wildcard fan-out.
//! CONTEXT: Locates a representation's root node list inside an arbitrary
//! layout document without shape-specific code at the call sites. Resolution
//! never fails: a missing key simply stops the descent.

use serde_json::Value;

/// Result of resolving a path: a single container, or the flattened
/// concatenation produced by wildcard fan-out.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'a> {
    One(&'a Value),
    Many(Vec<&'a Value>),
}

impl<'a> Resolved<'a> {
    /// The single resolved value, when no fan-out occurred.
    pub fn as_one(&self) -> Option<&'a Value> {
        match self {
            Resolved::One(v) => Some(v),
            Resolved::Many(_) => None,
        }
    }

    /// The resolved values as a list. A single value becomes a one-element
    /// list; a single sequence yields its elements.
    pub fn into_vec(self) -> Vec<&'a Value> {
        match self {
            Resolved::One(Value::Array(items)) => items.iter().collect(),
            Resolved::One(v) => vec![v],
            Resolved::Many(vs) => vs,
        }
    }
}

/// Resolves a slash-delimited path against a nested value.
///
/// A `*` (or empty) segment applied to a sequence fans out: the remaining
/// sub-path is resolved against every element and the results are
/// concatenated, with sequence-valued sub-results spliced in rather than
/// nested (one level of flattening per fan-out). A named segment descends
/// when the key — or, for sequences, the parsed index — exists; otherwise
/// resolution stops and returns the last reached container.
pub fn resolve<'a>(path: &str, root: &'a Value) -> Resolved<'a> {
    let segments: Vec<&str> = path.split('/').collect();
    resolve_segments(&segments, root)
}

fn resolve_segments<'a>(segments: &[&str], container: &'a Value) -> Resolved<'a> {
    let Some((segment, rest)) = segments.split_first() else {
        return Resolved::One(container);
    };

    if *segment == "*" || segment.is_empty() {
        if let Value::Array(items) = container {
            let mut out = Vec::new();
            for item in items {
                match resolve_segments(rest, item) {
                    Resolved::One(Value::Array(inner)) => out.extend(inner.iter()),
                    Resolved::One(v) => out.push(v),
                    Resolved::Many(vs) => out.extend(vs),
                }
            }
            return Resolved::Many(out);
        }
        // Wildcard over a non-sequence is a no-op descent.
        return resolve_segments(rest, container);
    }

    let next = match container {
        Value::Object(map) => map.get(*segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    };

    match next {
        Some(inner) => resolve_segments(rest, inner),
        None => Resolved::One(container),
    }
}

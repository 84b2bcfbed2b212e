//! FILENAME: cube/src/value.rs
//! PURPOSE: Defines the universal value type and the per-item cell view.
//! CONTEXT: Every extracted record carries a `CubeValue`; every accessor
//! function (value, label, filter) reads from a `Cell`. Both are designed to
//! be lightweight as one instance exists per visited cube cell.

use serde::{Deserialize, Serialize};

/// The universal value type flowing out of the extraction layer.
///
/// `List` holds an unreduced group of raw values: when records are grouped
/// without an explicit reduction, the bucket's value sequence is kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CubeValue {
    Null,
    Number(f64),
    Text(String),
    Bool(bool),
    List(Vec<CubeValue>),
}

impl CubeValue {
    /// Returns the numeric content, if this value is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CubeValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CubeValue::Null)
    }

    /// Returns the display form of the value as a String.
    /// Numbers drop unnecessary decimal places; lists join their elements.
    pub fn display(&self) -> String {
        match self {
            CubeValue::Null => String::new(),
            CubeValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{:.0}", n)
                } else {
                    format!("{}", n)
                }
            }
            CubeValue::Text(s) => s.clone(),
            CubeValue::Bool(b) => {
                if *b { "true" } else { "false" }.to_string()
            }
            CubeValue::List(items) => items
                .iter()
                .map(CubeValue::display)
                .collect::<Vec<_>>()
                .join(", "),
        }
    }
}

impl From<f64> for CubeValue {
    fn from(n: f64) -> Self {
        CubeValue::Number(n)
    }
}

impl From<&str> for CubeValue {
    fn from(s: &str) -> Self {
        CubeValue::Text(s.to_string())
    }
}

impl From<String> for CubeValue {
    fn from(s: String) -> Self {
        CubeValue::Text(s)
    }
}

/// The unified per-item view handed to accessor functions.
///
/// Regardless of which physical representation an item came from (matrix
/// cell, stacked node, tree node, or an attribute embedded in one of those),
/// accessors always see this shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// Display text of the cell, if the source provided one.
    pub text: Option<String>,

    /// Numeric content of the cell, if any.
    pub num: Option<f64>,

    /// Identifier of the cell's value within its column (-1 when absent).
    pub elem: i64,

    /// Absolute row number in the logical matrix, when the representation
    /// has one.
    pub row: Option<usize>,
}

impl Cell {
    pub fn empty() -> Self {
        Cell {
            text: None,
            num: None,
            elem: -1,
            row: None,
        }
    }

    /// The cell's display text, falling back to its trimmed numeric form.
    pub fn display(&self) -> String {
        if let Some(text) = &self.text {
            return text.clone();
        }
        match self.num {
            Some(n) => CubeValue::Number(n).display(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_displays_numbers_without_trailing_decimals() {
        assert_eq!(CubeValue::Number(42.0).display(), "42");
        assert_eq!(CubeValue::Number(1.5).display(), "1.5");
    }

    #[test]
    fn it_joins_list_values() {
        let v = CubeValue::List(vec![CubeValue::from("SE"), CubeValue::from("IT")]);
        assert_eq!(v.display(), "SE, IT");
    }

    #[test]
    fn cell_display_prefers_text() {
        let cell = Cell {
            text: Some("Sweden".to_string()),
            num: Some(7.0),
            elem: 0,
            row: Some(3),
        };
        assert_eq!(cell.display(), "Sweden");
    }

    #[test]
    fn untagged_value_serializes_flat() {
        let json = serde_json::to_string(&CubeValue::from("SE")).unwrap();
        assert_eq!(json, "\"SE\"");
        let json = serde_json::to_string(&CubeValue::Number(4.0)).unwrap();
        assert_eq!(json, "4.0");
    }
}

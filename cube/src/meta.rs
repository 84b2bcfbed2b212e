//! FILENAME: cube/src/meta.rs
//! PURPOSE: Per-column metadata carried by the cube source.
//! CONTEXT: These structures are deserialized from the cube layout and
//! describe each dimension/measure: display title, numeric range, tags,
//! format descriptor, and any attached attribute columns.

use serde::{Deserialize, Serialize};

/// Numeric extent of a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: f64,
    pub max: f64,
}

/// How a column's values should be rendered as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// No declared format; use the general number form.
    #[default]
    None,
    /// Fixed number of decimals with thousands separators.
    Number,
    /// Value is a ratio, rendered as a percentage.
    Percent,
}

/// Raw format descriptor attached to a column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FormatMeta {
    #[serde(default)]
    pub kind: FormatKind,

    /// Decimal places, when `kind` calls for a fixed precision.
    #[serde(default)]
    pub decimals: Option<u8>,
}

/// Metadata for an attribute column attached to a dimension or measure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMeta {
    pub title: String,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub format: Option<FormatMeta>,
}

/// Attribute columns embedded in a dimension's or measure's cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AttachedAttributes {
    /// Attribute dimensions (categorical sub-columns).
    #[serde(default)]
    pub dimensions: Vec<AttributeMeta>,

    /// Attribute expressions (computed sub-columns).
    #[serde(default)]
    pub expressions: Vec<AttributeMeta>,
}

/// Metadata for one dimension column of the cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionMeta {
    pub title: String,

    #[serde(default)]
    pub key: Option<String>,

    /// Number of distinct values in the column.
    #[serde(default)]
    pub cardinality: usize,

    #[serde(default)]
    pub range: Option<ValueRange>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub format: Option<FormatMeta>,

    #[serde(default)]
    pub attributes: AttachedAttributes,
}

/// Metadata for one measure column of the cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasureMeta {
    pub title: String,

    #[serde(default)]
    pub key: Option<String>,

    #[serde(default)]
    pub range: Option<ValueRange>,

    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default)]
    pub format: Option<FormatMeta>,

    #[serde(default)]
    pub attributes: AttachedAttributes,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_deserializes_minimal_dimension_meta() {
        let meta: DimensionMeta = serde_json::from_value(json!({
            "title": "Country"
        }))
        .unwrap();
        assert_eq!(meta.title, "Country");
        assert_eq!(meta.cardinality, 0);
        assert!(meta.attributes.dimensions.is_empty());
    }

    #[test]
    fn it_deserializes_measure_with_format_and_range() {
        let meta: MeasureMeta = serde_json::from_value(json!({
            "title": "Sales",
            "range": { "min": 0.0, "max": 815.0 },
            "format": { "kind": "number", "decimals": 2 }
        }))
        .unwrap();
        assert_eq!(meta.range.unwrap().max, 815.0);
        assert_eq!(meta.format.unwrap().kind, FormatKind::Number);
    }
}

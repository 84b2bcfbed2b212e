//! FILENAME: extract-engine/src/datum.rs
//! PURPOSE: The normalized output record emitted by extraction.
//! CONTEXT: One `Datum` is produced per item (or per group when grouping is
//! active). Named properties nest further records one level deep; when the
//! record is serialized they appear as flat named members alongside
//! value/label/source.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use cube::CubeValue;

/// Names the field (and owning dataset) a record's value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    /// Key of the dataset the value was extracted from.
    pub key: String,

    /// Identifier of the originating field.
    pub field: String,
}

/// One normalized output record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Datum {
    pub value: CubeValue,

    pub label: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<Source>,

    /// Named sub-records, one per configured property.
    #[serde(flatten)]
    pub props: FxHashMap<String, Datum>,
}

impl Datum {
    pub fn new(value: CubeValue, label: String) -> Self {
        Datum {
            value,
            label,
            source: None,
            props: FxHashMap::default(),
        }
    }

    pub fn with_source(mut self, source: Source) -> Self {
        self.source = Some(source);
        self
    }

    pub fn set_prop(&mut self, name: &str, datum: Datum) {
        self.props.insert(name.to_string(), datum);
    }

    /// Looks up a named sub-record.
    pub fn prop(&self, name: &str) -> Option<&Datum> {
        self.props.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn props_serialize_as_flat_members() {
        let mut datum = Datum::new(CubeValue::from("SE"), "Sweden".to_string());
        datum.set_prop(
            "sales",
            Datum::new(CubeValue::Number(815.0), "815".to_string()),
        );
        let json = serde_json::to_value(&datum).unwrap();
        assert_eq!(json["value"], "SE");
        assert_eq!(json["sales"]["value"], 815.0);
        assert!(json.get("source").is_none());
    }
}

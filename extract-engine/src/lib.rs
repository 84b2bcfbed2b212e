//! FILENAME: extract-engine/src/lib.rs
//! Cube extraction subsystem.
//!
//! This crate binds a multi-dimensional data cube to normalized per-item
//! output records for visualization code. It works uniformly across the
//! three physical cube representations and depends on `cube` for the shared
//! model types.
//!
//! Layers:
//! - `config`: Extraction configuration and its canonical plan (what to extract)
//! - `field`/`dataset`: Field resolution and the dataset facade (where from)
//! - `matrix`/`tree`: Representation-specific extractors (how)
//! - `tracker`: Optional grouping/reduction stage
//! - `reducers`: The named reduction registry

pub mod config;
pub mod dataset;
pub mod datum;
pub mod error;
pub mod field;
pub mod reducers;

mod matrix;
mod tracker;
mod tree;

pub use config::{
    ExtractConfig, FieldRef, FieldSource, PropConfig, PropJoin, PropSelect, ReduceSpec, TrackBy,
};
pub use dataset::{Dataset, FieldQuery};
pub use datum::{Datum, Source};
pub use error::ExtractError;
pub use field::{Field, FieldKind, RawMeta};
pub use tree::HierarchyNode;

#[cfg(test)]
mod tests {
    use super::*;
    use cube::CubeValue;
    use serde_json::json;

    #[test]
    fn it_extracts_and_groups_end_to_end() {
        let _ = env_logger::builder().is_test(true).try_init();
        let doc = json!({
            "cube": {
                "mode": "matrix",
                "size": { "rows": 3, "columns": 1 },
                "dimensions": [ { "title": "Country" } ],
                "measures": [],
                "pages": [ {
                    "area": { "left": 0, "top": 0, "width": 1, "height": 3 },
                    "rows": [
                        [ { "text": "SE", "elem": 0 } ],
                        [ { "text": "IT", "elem": 1 } ],
                        [ { "text": "SE", "elem": 0 } ]
                    ]
                } ]
            }
        });
        let ds = Dataset::from_layout(&doc).unwrap();

        let flat = ds.extract(&ExtractConfig::new(0)).unwrap();
        assert_eq!(flat.len(), 3);

        let grouped = ds
            .extract(&ExtractConfig::new(0).track_by(TrackBy::Text))
            .unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(
            grouped[0].value,
            CubeValue::List(vec![CubeValue::from("SE"), CubeValue::from("SE")])
        );

        let err = ds
            .extract(&ExtractConfig::new(0).reduce("median"))
            .unwrap_err();
        assert!(matches!(err, ExtractError::UnknownReducer(_)));
    }
}

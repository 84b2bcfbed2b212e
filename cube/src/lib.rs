//! FILENAME: cube/src/lib.rs
//! PURPOSE: Shared data model for the cube extraction engine.
//! CONTEXT: Re-exports the value types, per-column metadata, the three
//! physical cube representations, the path resolver, and the default
//! formatter for use by other crates.

pub mod error;
pub mod format;
pub mod layout;
pub mod meta;
pub mod path;
pub mod value;

// Re-export commonly used types at the crate root
pub use error::CubeError;
pub use format::ValueFormatter;
pub use layout::{
    AttachedCells, CubeLayout, CubeMode, CubeSize, MatrixCell, MatrixPage, NodeKind, PageArea,
    StackedNode, StackedPage, TreeNode, TreePage,
};
pub use meta::{
    AttachedAttributes, AttributeMeta, DimensionMeta, FormatKind, FormatMeta, MeasureMeta,
    ValueRange,
};
pub use path::{resolve, Resolved};
pub use value::{Cell, CubeValue};

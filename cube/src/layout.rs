//! FILENAME: cube/src/layout.rs
//! PURPOSE: The three physical cube representations and their page types.
//! CONTEXT: A cube arrives in exactly one of three shapes: a flat paginated
//! matrix, a stacked pivot tree, or a dimensional tree. These structures are
//! immutable snapshots; the extraction engine never mutates them.

use serde::{Deserialize, Serialize};

use crate::meta::{DimensionMeta, MeasureMeta};

/// Which physical representation the cube carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CubeMode {
    /// Flat row/column matrix, delivered as rectangular windows.
    Matrix,
    /// Pivoted tree with nested sub-node lists under one root.
    Stacked,
    /// Dimensional tree where each node carries its measure values.
    Tree,
}

/// Logical extent of the full matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct CubeSize {
    pub rows: usize,
    pub columns: usize,
}

/// Absolute position and extent of one rectangular page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PageArea {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl PageArea {
    /// Whether the absolute column falls inside this window.
    pub fn contains_column(&self, column: usize) -> bool {
        column >= self.left && column < self.left + self.width
    }

    /// Whether the absolute row falls inside this window.
    pub fn contains_row(&self, row: usize) -> bool {
        row >= self.top && row < self.top + self.height
    }
}

fn default_elem() -> i64 {
    -1
}

/// Attribute cells embedded in a matrix cell or tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct AttachedCells {
    #[serde(default)]
    pub dimensions: Vec<MatrixCell>,

    #[serde(default)]
    pub expressions: Vec<MatrixCell>,
}

/// One cell of the flat matrix. Also used for the per-measure value cells
/// of tree nodes and for embedded attribute cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct MatrixCell {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub num: Option<f64>,

    #[serde(default = "default_elem")]
    pub elem: i64,

    #[serde(default)]
    pub attrs: Option<AttachedCells>,
}

/// One rectangular window over the logical matrix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatrixPage {
    pub area: PageArea,

    /// Row-major cell data, `area.height` rows of `area.width` cells.
    pub rows: Vec<Vec<MatrixCell>>,
}

/// Role of a node within the stacked pivot tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Root,
    #[default]
    Normal,
    Total,
    /// Synthetic fan-out node standing in for one measure when several
    /// measures are interleaved as siblings.
    Pseudo,
    Empty,
}

/// One node of the stacked pivot representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedNode {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub num: Option<f64>,

    #[serde(default = "default_elem")]
    pub elem: i64,

    #[serde(default)]
    pub kind: NodeKind,

    #[serde(default)]
    pub row: usize,

    /// Nested sub-node list (next level of the pivot).
    #[serde(default)]
    pub sub: Vec<StackedNode>,

    #[serde(default)]
    pub attrs: Option<AttachedCells>,
}

/// One page of the stacked representation. `data` holds the root node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedPage {
    #[serde(default)]
    pub area: PageArea,

    #[serde(default)]
    pub data: Vec<StackedNode>,
}

/// One node of the dimensional tree representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub num: Option<f64>,

    #[serde(default = "default_elem")]
    pub elem: i64,

    #[serde(default)]
    pub row: usize,

    /// Per-measure value cells carried by this node.
    #[serde(default)]
    pub values: Vec<MatrixCell>,

    #[serde(default)]
    pub children: Vec<TreeNode>,

    #[serde(default)]
    pub attrs: Option<AttachedCells>,
}

/// One page of the dimensional tree. `data` holds the top-level nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreePage {
    #[serde(default)]
    pub data: Vec<TreeNode>,
}

/// The complete cube layout: column metadata plus whichever page list the
/// declared mode calls for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeLayout {
    pub mode: CubeMode,

    #[serde(default)]
    pub size: CubeSize,

    #[serde(default)]
    pub dimensions: Vec<DimensionMeta>,

    #[serde(default)]
    pub measures: Vec<MeasureMeta>,

    /// Effective column order for the tree representations: dimension
    /// indices in traversal order, with -1 marking the pseudo-dimension
    /// position when one exists.
    #[serde(default)]
    pub order: Vec<i64>,

    #[serde(default)]
    pub pages: Vec<MatrixPage>,

    #[serde(default)]
    pub stacked_pages: Vec<StackedPage>,

    #[serde(default)]
    pub tree_pages: Vec<TreePage>,
}

impl CubeLayout {
    /// Position of the pseudo-dimension marker in the effective order.
    pub fn pseudo_position(&self) -> Option<usize> {
        self.order.iter().position(|&o| o == -1)
    }

    /// Depth of a dimension in the tree representations, 1-indexed past the
    /// implicit root. Falls back to the raw index when no explicit order
    /// names the dimension.
    pub fn dimension_depth(&self, dim_index: usize) -> usize {
        self.order
            .iter()
            .position(|&o| o == dim_index as i64)
            .map(|pos| pos + 1)
            .unwrap_or(dim_index + 1)
    }

    /// Depth of the deepest dimension level.
    pub fn max_dimension_depth(&self) -> usize {
        (0..self.dimensions.len())
            .map(|i| self.dimension_depth(i))
            .max()
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_deserializes_a_matrix_page() {
        let page: MatrixPage = serde_json::from_value(json!({
            "area": { "left": 0, "top": 0, "width": 2, "height": 1 },
            "rows": [[ { "text": "SE", "elem": 0 }, { "num": 42.0 } ]]
        }))
        .unwrap();
        assert!(page.area.contains_column(1));
        assert!(!page.area.contains_column(2));
        assert_eq!(page.rows[0][0].text.as_deref(), Some("SE"));
        assert_eq!(page.rows[0][1].elem, -1);
    }

    #[test]
    fn dimension_depth_follows_effective_order() {
        let layout: CubeLayout = serde_json::from_value(json!({
            "mode": "stacked",
            "dimensions": [ { "title": "A" }, { "title": "B" } ],
            "measures": [ { "title": "M1" }, { "title": "M2" } ],
            "order": [1, -1, 0]
        }))
        .unwrap();
        assert_eq!(layout.dimension_depth(1), 1);
        assert_eq!(layout.dimension_depth(0), 3);
        assert_eq!(layout.pseudo_position(), Some(1));
        assert_eq!(layout.max_dimension_depth(), 3);
    }

    #[test]
    fn dimension_depth_defaults_to_raw_index() {
        let layout: CubeLayout = serde_json::from_value(json!({
            "mode": "tree",
            "dimensions": [ { "title": "A" }, { "title": "B" } ],
            "measures": []
        }))
        .unwrap();
        assert_eq!(layout.dimension_depth(0), 1);
        assert_eq!(layout.dimension_depth(1), 2);
    }
}

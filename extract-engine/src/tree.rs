//! FILENAME: extract-engine/src/tree.rs
//! PURPOSE: Extraction over the two hierarchical cube representations.
//! CONTEXT: The stacked pivot tree and the dimensional tree share one
//! algorithm: nodes are loaded once into an index-addressed arena with
//! explicit parent/child links, field references are resolved to structural
//! depths, and a depth-to-depth accessor walks ancestors or flattens
//! descendants to reach each property's nodes.

use log::{debug, warn};
use smallvec::{smallvec, SmallVec};

use cube::{AttachedCells, Cell, CubeLayout, CubeMode, CubeValue, MatrixCell, NodeKind, StackedNode, TreeNode};

use crate::config::{CanonicalPlan, ResolvedProp};
use crate::dataset::Dataset;
use crate::datum::{Datum, Source};
use crate::error::ExtractError;
use crate::field::FieldKind;
use crate::tracker::{grouping_key, PropSample, RawItem, Tracker};

/// Ancestor walks are clamped to this many steps to guard malformed trees.
const MAX_ASCENT: usize = 64;

// ============================================================================
// HIERARCHY ARENA
// ============================================================================

/// Owned payload of one arena node.
#[derive(Debug, Clone, Default)]
pub(crate) struct NodeData {
    pub text: Option<String>,
    pub num: Option<f64>,
    pub elem: i64,
    pub row: usize,
    pub kind: NodeKind,

    /// Per-measure value cells (dimensional tree shape).
    pub values: Vec<MatrixCell>,

    pub attrs: Option<AttachedCells>,
}

impl From<&StackedNode> for NodeData {
    fn from(node: &StackedNode) -> Self {
        NodeData {
            text: node.text.clone(),
            num: node.num,
            elem: node.elem,
            row: node.row,
            kind: node.kind,
            values: Vec::new(),
            attrs: node.attrs.clone(),
        }
    }
}

impl From<&TreeNode> for NodeData {
    fn from(node: &TreeNode) -> Self {
        NodeData {
            text: node.text.clone(),
            num: node.num,
            elem: node.elem,
            row: node.row,
            kind: NodeKind::Normal,
            values: node.values.clone(),
            attrs: node.attrs.clone(),
        }
    }
}

/// One node of the arena: payload plus explicit parent/child index links.
#[derive(Debug, Clone)]
pub(crate) struct ArenaNode {
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    pub depth: usize,
    pub data: NodeData,
}

/// Index-addressed view of the hierarchical representation. Node 0 is the
/// implicit root at depth 0. Built once per dataset and reused.
#[derive(Debug, Clone)]
pub(crate) struct HierarchyArena {
    pub nodes: Vec<ArenaNode>,
}

impl HierarchyArena {
    fn with_root(data: NodeData) -> Self {
        HierarchyArena {
            nodes: vec![ArenaNode {
                parent: None,
                children: Vec::new(),
                depth: 0,
                data,
            }],
        }
    }

    fn push_subtree<'n, N>(
        &mut self,
        parent: usize,
        node: &'n N,
        children_of: &dyn Fn(&'n N) -> &'n [N],
        data_of: &dyn Fn(&'n N) -> NodeData,
    ) {
        let depth = self.nodes[parent].depth + 1;
        let index = self.nodes.len();
        self.nodes.push(ArenaNode {
            parent: Some(parent),
            children: Vec::new(),
            depth,
            data: data_of(node),
        });
        self.nodes[parent].children.push(index);
        for child in children_of(node) {
            self.push_subtree(index, child, children_of, data_of);
        }
    }
}

/// Builds the arena from whichever hierarchical representation the cube
/// carries. Returns `None` when the root page is absent or empty.
pub(crate) fn build_arena(layout: &CubeLayout) -> Option<HierarchyArena> {
    let arena = match layout.mode {
        CubeMode::Matrix => return None,
        CubeMode::Stacked => {
            // The cube's own root node becomes the arena root.
            let root = layout.stacked_pages.first()?.data.first()?;
            let mut arena = HierarchyArena::with_root(NodeData::from(root));
            for child in &root.sub {
                arena.push_subtree(0, child, &|n| n.sub.as_slice(), &|n| NodeData::from(n));
            }
            arena
        }
        CubeMode::Tree => {
            let page = layout.tree_pages.first()?;
            if page.data.is_empty() {
                return None;
            }
            let mut arena = HierarchyArena::with_root(NodeData::default());
            for top in &page.data {
                arena.push_subtree(0, top, &|n| n.children.as_slice(), &|n| NodeData::from(n));
            }
            arena
        }
    };
    debug!("built hierarchy arena with {} nodes", arena.nodes.len());
    Some(arena)
}

// ============================================================================
// FIELD DEPTH RESOLUTION
// ============================================================================

/// How to project a cell out of the node found at a field's depth.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct Projection {
    /// Select the node's per-measure value cell first (dimensional tree).
    pub value_index: Option<usize>,

    /// Then select an embedded attribute cell: (is_expression, index).
    pub attr: Option<(bool, usize)>,
}

/// A field's position within the tree structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FieldDepth {
    /// 1-indexed past the implicit root.
    pub depth: usize,

    /// Fixed sibling index at the bottom of a descent, disambiguating one
    /// measure among interleaved pseudo-dimension siblings.
    pub pseudo_index: Option<usize>,

    pub projection: Projection,
}

/// Resolves a field to its structural depth, recursing transparently
/// through the origin of attribute fields.
pub(crate) fn field_depth(ds: &Dataset, field_index: usize) -> FieldDepth {
    let field = ds.field_at(field_index);
    let (base_index, attr) = match field.kind() {
        FieldKind::AttributeDimension => (
            field.origin_index().unwrap_or(field_index),
            Some((false, field.index)),
        ),
        FieldKind::AttributeExpression => (
            field.origin_index().unwrap_or(field_index),
            Some((true, field.index)),
        ),
        _ => (field_index, None),
    };

    let base = ds.field_at(base_index);
    let layout = ds.layout();
    match base.kind() {
        FieldKind::Dimension | FieldKind::AttributeDimension => FieldDepth {
            depth: layout.dimension_depth(base.index),
            pseudo_index: None,
            projection: Projection {
                value_index: None,
                attr,
            },
        },
        FieldKind::Measure | FieldKind::AttributeExpression => {
            let measure = base.index;
            match layout.mode {
                CubeMode::Tree => FieldDepth {
                    // Nodes carry their measure values; the deepest dimension
                    // level owns them unless the order places a pseudo marker.
                    depth: layout
                        .pseudo_position()
                        .map(|p| p + 1)
                        .unwrap_or_else(|| layout.max_dimension_depth().max(1)),
                    pseudo_index: None,
                    projection: Projection {
                        value_index: Some(measure),
                        attr,
                    },
                },
                _ => match layout.pseudo_position() {
                    // Measures interleaved as pseudo-dimension siblings.
                    Some(p) => FieldDepth {
                        depth: p + 1,
                        pseudo_index: Some(measure),
                        projection: Projection {
                            value_index: None,
                            attr,
                        },
                    },
                    // Measure cells are leaf nodes below the deepest level.
                    None => FieldDepth {
                        depth: layout.max_dimension_depth() + 1,
                        pseudo_index: None,
                        projection: Projection {
                            value_index: None,
                            attr,
                        },
                    },
                },
            }
        }
    }
}

/// Builds the unified cell view for a node under a projection.
pub(crate) fn project_cell(data: &NodeData, projection: &Projection) -> Cell {
    let row = Some(data.row);

    // Base: the node itself, or one of its per-measure value cells.
    let (text, num, elem, attrs) = match projection.value_index {
        Some(i) => match data.values.get(i) {
            Some(v) => (v.text.clone(), v.num, v.elem, v.attrs.as_ref()),
            None => return Cell { row, ..Cell::empty() },
        },
        None => (data.text.clone(), data.num, data.elem, data.attrs.as_ref()),
    };

    // Then an embedded attribute cell, when the field selects one.
    if let Some((is_expression, index)) = projection.attr {
        let cell = attrs.and_then(|a| {
            if is_expression {
                a.expressions.get(index)
            } else {
                a.dimensions.get(index)
            }
        });
        return match cell {
            Some(c) => Cell {
                text: c.text.clone(),
                num: c.num,
                elem: c.elem,
                row,
            },
            None => Cell { row, ..Cell::empty() },
        };
    }

    Cell {
        text,
        num,
        elem,
        row,
    }
}

// ============================================================================
// TREE ACCESSOR
// ============================================================================

/// Maps a node at one depth to the node(s) at another depth.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeAccessor {
    source: usize,
    target: usize,
    pseudo_index: Option<usize>,
}

impl TreeAccessor {
    pub fn new(source: usize, target: usize, pseudo_index: Option<usize>) -> Self {
        TreeAccessor {
            source,
            target,
            pseudo_index,
        }
    }

    /// Collects the nodes reached at the target depth: the node itself for
    /// equal depths, the ancestor reached by walking the parent link, or
    /// every descendant reached after the needed levels, left-to-right.
    pub fn collect(&self, arena: &HierarchyArena, node: usize) -> SmallVec<[usize; 8]> {
        if self.target == self.source {
            return smallvec![node];
        }

        if self.target < self.source {
            let mut steps = self.source - self.target;
            if steps > MAX_ASCENT {
                warn!("ancestor walk of {} steps clamped to {}", steps, MAX_ASCENT);
                steps = MAX_ASCENT;
            }
            let mut current = node;
            for _ in 0..steps {
                match arena.nodes[current].parent {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
            return smallvec![current];
        }

        let levels = self.target - self.source;
        let mut frontier: SmallVec<[usize; 8]> = smallvec![node];
        for level in 0..levels {
            let last = level + 1 == levels;
            let mut next: SmallVec<[usize; 8]> = SmallVec::new();
            for &n in &frontier {
                let children = &arena.nodes[n].children;
                match (last, self.pseudo_index) {
                    // Disambiguate one pseudo-dimension sibling at the bottom.
                    (true, Some(i)) => {
                        if let Some(&child) = children.get(i) {
                            next.push(child);
                        }
                    }
                    _ => next.extend(children.iter().copied()),
                }
            }
            frontier = next;
        }
        frontier
    }
}

// ============================================================================
// EXTRACTION
// ============================================================================

fn source_for(ds: &Dataset, field_index: usize) -> Option<Source> {
    Some(Source {
        key: ds.key().to_string(),
        field: ds.field_at(field_index).id().to_string(),
    })
}

/// Evaluates one resolved property for an item node.
fn eval_prop(
    ds: &Dataset,
    arena: &HierarchyArena,
    prop: &ResolvedProp,
    item: usize,
    item_depth: usize,
    main_cell: &Cell,
) -> PropSample {
    if prop.is_join() {
        let mut values = Vec::with_capacity(prop.sub.len());
        let mut labels = Vec::with_capacity(prop.sub.len());
        for sub in &prop.sub {
            let sample = eval_prop(ds, arena, sub, item, item_depth, main_cell);
            values.push(sample.value);
            labels.push(sample.label);
        }
        let value = match &prop.join_value {
            Some(combine) => combine(&values),
            None => CubeValue::List(values),
        };
        let label = match &prop.join_label {
            Some(combine) => combine(&labels),
            None => labels.join(", "),
        };
        let source = prop.field.and_then(|i| source_for(ds, i));
        return PropSample {
            value,
            label,
            source,
        };
    }

    let Some(field_index) = prop.field else {
        return PropSample {
            value: (prop.value)(main_cell),
            label: (prop.label)(main_cell),
            source: None,
        };
    };

    let fd = field_depth(ds, field_index);
    let accessor = TreeAccessor::new(item_depth, fd.depth, fd.pseudo_index);
    let nodes = accessor.collect(arena, item);

    if fd.depth <= item_depth {
        // Ancestor or same depth: a single node.
        let cell = match nodes.first() {
            Some(&n) => project_cell(&arena.nodes[n].data, &fd.projection),
            None => Cell::empty(),
        };
        if let Some(filter) = &prop.filter {
            if !filter(&cell) {
                return PropSample {
                    value: CubeValue::Null,
                    label: String::new(),
                    source: source_for(ds, field_index),
                };
            }
        }
        return PropSample {
            value: (prop.value)(&cell),
            label: (prop.label)(&cell),
            source: source_for(ds, field_index),
        };
    }

    // Descendant collection: gather per-node samples, collapse via the
    // configured reduction or the field's default.
    let mut values = Vec::with_capacity(nodes.len());
    let mut labels = Vec::with_capacity(nodes.len());
    for &n in &nodes {
        let cell = project_cell(&arena.nodes[n].data, &fd.projection);
        if let Some(filter) = &prop.filter {
            if !filter(&cell) {
                continue;
            }
        }
        values.push((prop.value)(&cell));
        labels.push((prop.label)(&cell));
    }

    let field = ds.field_at(field_index);
    let value = match &prop.reduce {
        Some(reduce) => reduce(&values),
        None => (field.default_reduce())(&values),
    };
    let label = if let Some(reduce_label) = &prop.reduce_label {
        reduce_label(&labels, &value)
    } else {
        field.format(&value)
    };

    PropSample {
        value,
        label,
        source: source_for(ds, field_index),
    }
}

/// Extracts a flat record sequence from the hierarchical representation.
pub(crate) fn extract(ds: &Dataset, plan: &CanonicalPlan) -> Result<Vec<Datum>, ExtractError> {
    let Some(arena) = ds.arena() else {
        return Ok(Vec::new());
    };
    let main_index = plan
        .main
        .field
        .ok_or_else(|| ExtractError::InvalidConfig("main resolves to no field".to_string()))?;
    let main_fd = field_depth(ds, main_index);

    let root_accessor = TreeAccessor::new(0, main_fd.depth, main_fd.pseudo_index);
    let items = root_accessor.collect(arena, 0);

    let mut out = Vec::new();
    let mut tracker = plan.track_by.as_ref().map(|_| Tracker::new());

    for &item in &items {
        let cell = project_cell(&arena.nodes[item].data, &main_fd.projection);

        if let Some(filter) = &plan.main.filter {
            if !filter(&cell) {
                continue;
            }
        }

        let main_sample = if plan.main.is_join() {
            eval_prop(ds, arena, &plan.main, item, main_fd.depth, &cell)
        } else {
            PropSample {
                value: (plan.main.value)(&cell),
                label: (plan.main.label)(&cell),
                source: source_for(ds, main_index),
            }
        };

        let props = plan
            .props
            .iter()
            .map(|(_, prop)| eval_prop(ds, arena, prop, item, main_fd.depth, &cell))
            .collect();

        let raw = RawItem {
            main: main_sample,
            props,
        };

        match (&plan.track_by, tracker.as_mut()) {
            (Some(track_by), Some(tracker)) => {
                tracker.track(&grouping_key(track_by, &cell), raw);
            }
            _ => out.push(raw.into_datum(&plan.props)),
        }
    }

    match tracker {
        Some(tracker) => Ok(tracker.collect(ds, plan)),
        None => Ok(out),
    }
}

// ============================================================================
// AUGMENTATION
// ============================================================================

/// One node of the augmented tree returned by `Dataset::hierarchy`.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    /// Positional depth: distance from the root.
    pub depth: usize,

    /// The node's output record.
    pub data: Datum,

    pub children: Vec<HierarchyNode>,
}

/// The primary field owning a structural depth, if any: the dimension placed
/// there by the effective order, else a measure when the depth is the
/// measure level (pseudo siblings select by their position).
fn field_owning_depth(ds: &Dataset, arena: &HierarchyArena, node: usize, depth: usize) -> Option<usize> {
    let layout = ds.layout();
    for (i, field) in ds.fields_slice().iter().enumerate() {
        if field.kind() == FieldKind::Dimension && layout.dimension_depth(field.index) == depth {
            return Some(i);
        }
    }
    let measure_count = layout.measures.len();
    if measure_count == 0 {
        return None;
    }
    let first_measure = field_depth(ds, layout.dimensions.len());
    if first_measure.depth != depth {
        return None;
    }
    // At a pseudo level, the sibling position selects the measure.
    let measure = match layout.pseudo_position() {
        Some(_) => {
            let parent = arena.nodes[node].parent?;
            arena.nodes[parent]
                .children
                .iter()
                .position(|&c| c == node)
                .map(|p| p.min(measure_count - 1))
                .unwrap_or(0)
        }
        None => 0,
    };
    Some(ds.layout().dimensions.len() + measure)
}

fn augment_node(
    ds: &Dataset,
    arena: &HierarchyArena,
    plan: &CanonicalPlan,
    node: usize,
) -> HierarchyNode {
    let arena_node = &arena.nodes[node];
    let depth = arena_node.depth;

    let owner = field_owning_depth(ds, arena, node, depth);
    let (cell, sample) = match owner {
        Some(field_index) => {
            let fd = field_depth(ds, field_index);
            let cell = project_cell(&arena_node.data, &fd.projection);
            // The configured accessors apply at the main field's depth; other
            // owned depths use their field's defaults.
            let sample = if plan.main.field == Some(field_index) {
                PropSample {
                    value: (plan.main.value)(&cell),
                    label: (plan.main.label)(&cell),
                    source: source_for(ds, field_index),
                }
            } else {
                let field = ds.field_at(field_index);
                PropSample {
                    value: field.value(&cell),
                    label: field.label(&cell),
                    source: source_for(ds, field_index),
                }
            };
            (cell, sample)
        }
        None => {
            let cell = project_cell(&arena_node.data, &Projection::default());
            let sample = PropSample {
                value: match (&cell.text, cell.num) {
                    (Some(text), _) => CubeValue::Text(text.clone()),
                    (None, Some(n)) => CubeValue::Number(n),
                    (None, None) => CubeValue::Null,
                },
                label: cell.display(),
                source: None,
            };
            (cell, sample)
        }
    };

    let mut datum = Datum::new(sample.value, sample.label);
    datum.source = sample.source;
    for (name, prop) in &plan.props {
        let resolved = eval_prop(ds, arena, prop, node, depth, &cell);
        let mut prop_datum = Datum::new(resolved.value, resolved.label);
        prop_datum.source = resolved.source;
        datum.set_prop(name, prop_datum);
    }

    let children = arena_node
        .children
        .iter()
        .map(|&child| augment_node(ds, arena, plan, child))
        .collect();

    HierarchyNode {
        depth,
        data: datum,
        children,
    }
}

/// Augments the cached hierarchy into an owned tree of output records.
pub(crate) fn augment(
    ds: &Dataset,
    arena: &HierarchyArena,
    plan: &CanonicalPlan,
) -> Result<HierarchyNode, ExtractError> {
    if plan.main.field.is_none() {
        return Err(ExtractError::InvalidConfig(
            "main resolves to no field".to_string(),
        ));
    }
    Ok(augment_node(ds, arena, plan, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractConfig, PropConfig, PropSelect};
    use serde_json::json;

    /// Two top-level nodes with three children each.
    fn two_level_tree() -> Dataset {
        let doc = json!({
            "cube": {
                "mode": "tree",
                "dimensions": [ { "title": "Region" }, { "title": "City" } ],
                "measures": [ { "title": "Sales" } ],
                "order": [0, 1],
                "tree_pages": [ { "data": [
                    { "text": "North", "elem": 0, "children": [
                        { "text": "Oslo", "elem": 0, "values": [ { "num": 10.0 } ] },
                        { "text": "Umea", "elem": 1, "values": [ { "num": 20.0 } ] },
                        { "text": "Kiruna", "elem": 2, "values": [ { "num": 30.0 } ] }
                    ] },
                    { "text": "South", "elem": 1, "children": [
                        { "text": "Rome", "elem": 3, "values": [ { "num": 40.0 } ] },
                        { "text": "Nice", "elem": 4, "values": [ { "num": 50.0 } ] },
                        { "text": "Bari", "elem": 5, "values": [ { "num": 60.0 } ] }
                    ] }
                ] } ]
            }
        });
        Dataset::from_layout(&doc).unwrap()
    }

    /// One dimension, two measures interleaved as pseudo siblings.
    fn stacked_pseudo_cube() -> Dataset {
        let doc = json!({
            "cube": {
                "mode": "stacked",
                "dimensions": [ { "title": "Year" } ],
                "measures": [ { "title": "Sales" }, { "title": "Margin" } ],
                "order": [0, -1],
                "stacked_pages": [ { "data": [ {
                    "kind": "root",
                    "sub": [
                        { "text": "2023", "elem": 0, "sub": [
                            { "text": "100", "num": 100.0, "kind": "pseudo", "row": 0 },
                            { "text": "0.3", "num": 0.3, "kind": "pseudo", "row": 0 }
                        ] },
                        { "text": "2024", "elem": 1, "sub": [
                            { "text": "200", "num": 200.0, "kind": "pseudo", "row": 1 },
                            { "text": "0.4", "num": 0.4, "kind": "pseudo", "row": 1 }
                        ] }
                    ]
                } ] } ]
            }
        });
        Dataset::from_layout(&doc).unwrap()
    }

    fn arena_of(ds: &Dataset) -> &HierarchyArena {
        ds.arena().expect("hierarchical cube")
    }

    #[test]
    fn accessor_at_equal_depth_is_identity() {
        let ds = two_level_tree();
        let arena = arena_of(&ds);
        for node in 0..arena.nodes.len() {
            let depth = arena.nodes[node].depth;
            let reached = TreeAccessor::new(depth, depth, None).collect(arena, node);
            assert_eq!(reached.as_slice(), &[node]);
        }
    }

    #[test]
    fn accessor_walks_parent_links_upward() {
        let ds = two_level_tree();
        let arena = arena_of(&ds);
        let leaf = arena.nodes.iter().position(|n| n.depth == 2).unwrap();
        let reached = TreeAccessor::new(2, 1, None).collect(arena, leaf);
        assert_eq!(reached.as_slice(), &[arena.nodes[leaf].parent.unwrap()]);
        let reached = TreeAccessor::new(2, 0, None).collect(arena, leaf);
        assert_eq!(reached.as_slice(), &[0]);
    }

    #[test]
    fn accessor_flattens_descendants_left_to_right() {
        let ds = two_level_tree();
        let arena = arena_of(&ds);
        let reached = TreeAccessor::new(0, 2, None).collect(arena, 0);
        assert_eq!(reached.len(), 6);
        let texts: Vec<&str> = reached
            .iter()
            .map(|&n| arena.nodes[n].data.text.as_deref().unwrap())
            .collect();
        assert_eq!(texts, ["Oslo", "Umea", "Kiruna", "Rome", "Nice", "Bari"]);
    }

    #[test]
    fn ancestor_walk_stops_at_the_root() {
        let ds = two_level_tree();
        let arena = arena_of(&ds);
        let leaf = arena.nodes.iter().position(|n| n.depth == 2).unwrap();
        // Requesting far past the root clamps and stops at node 0.
        let reached = TreeAccessor::new(MAX_ASCENT + 10, 0, None).collect(arena, leaf);
        assert_eq!(reached.as_slice(), &[0]);
    }

    #[test]
    fn child_records_attach_their_ancestors_label() {
        let ds = two_level_tree();
        let config = ExtractConfig::new("City").prop(
            "parent",
            PropConfig::Select(PropSelect::new().field("Region").value(|cell| {
                CubeValue::Text(cell.text.clone().unwrap_or_default())
            })),
        );
        let items = ds.extract(&config).unwrap();
        assert_eq!(items.len(), 6);
        for item in &items[..3] {
            assert_eq!(item.prop("parent").unwrap().value, CubeValue::from("North"));
        }
        for item in &items[3..] {
            assert_eq!(item.prop("parent").unwrap().value, CubeValue::from("South"));
        }
    }

    #[test]
    fn descendant_props_collapse_through_reduce() {
        let ds = two_level_tree();
        let config = ExtractConfig::new("Region").prop(
            "total",
            PropConfig::Select(PropSelect::new().field("Sales").reduce("sum")),
        );
        let items = ds.extract(&config).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].prop("total").unwrap().value, CubeValue::Number(60.0));
        assert_eq!(items[1].prop("total").unwrap().value, CubeValue::Number(150.0));
    }

    #[test]
    fn descendant_props_default_to_the_fields_reduction() {
        let ds = two_level_tree();
        // Measures default to "avg" when no reduction is configured.
        let config = ExtractConfig::new("Region").prop("sales", PropConfig::field("Sales"));
        let items = ds.extract(&config).unwrap();
        assert_eq!(items[0].prop("sales").unwrap().value, CubeValue::Number(20.0));
        assert_eq!(items[1].prop("sales").unwrap().value, CubeValue::Number(50.0));
    }

    #[test]
    fn pseudo_siblings_select_one_measure_each() {
        let ds = stacked_pseudo_cube();
        let items = ds.extract(&ExtractConfig::new("Margin")).unwrap();
        let values: Vec<CubeValue> = items.iter().map(|d| d.value.clone()).collect();
        assert_eq!(values, vec![CubeValue::Number(0.3), CubeValue::Number(0.4)]);

        let config = ExtractConfig::new("Year").prop("sales", PropConfig::field("Sales"));
        let items = ds.extract(&config).unwrap();
        assert_eq!(items[0].prop("sales").unwrap().value, CubeValue::Number(100.0));
        assert_eq!(items[1].prop("sales").unwrap().value, CubeValue::Number(200.0));
    }

    #[test]
    fn measures_without_pseudo_live_below_the_deepest_dimension() {
        let doc = json!({
            "cube": {
                "mode": "stacked",
                "dimensions": [ { "title": "Year" } ],
                "measures": [ { "title": "Sales" } ],
                "order": [0],
                "stacked_pages": [ { "data": [ {
                    "kind": "root",
                    "sub": [
                        { "text": "2023", "elem": 0, "sub": [ { "num": 100.0, "row": 0 } ] },
                        { "text": "2024", "elem": 1, "sub": [ { "num": 200.0, "row": 1 } ] }
                    ]
                } ] } ]
            }
        });
        let ds = Dataset::from_layout(&doc).unwrap();
        let items = ds.extract(&ExtractConfig::new("Sales")).unwrap();
        let values: Vec<CubeValue> = items.iter().map(|d| d.value.clone()).collect();
        assert_eq!(values, vec![CubeValue::Number(100.0), CubeValue::Number(200.0)]);
    }

    #[test]
    fn empty_root_extracts_to_an_empty_sequence() {
        let doc = json!({
            "cube": {
                "mode": "stacked",
                "dimensions": [ { "title": "Year" } ],
                "measures": [],
                "stacked_pages": []
            }
        });
        let ds = Dataset::from_layout(&doc).unwrap();
        assert!(ds.extract(&ExtractConfig::new(0)).unwrap().is_empty());
        assert!(ds.hierarchy(&ExtractConfig::new(0)).unwrap().is_none());
    }

    #[test]
    fn hierarchy_augments_every_node_with_records() {
        let ds = two_level_tree();
        let config = ExtractConfig::new("City").prop(
            "total",
            PropConfig::Select(PropSelect::new().field("Sales").reduce("sum")),
        );
        let root = ds.hierarchy(&config).unwrap().expect("tree cube");
        assert_eq!(root.depth, 0);
        assert_eq!(root.children.len(), 2);

        let north = &root.children[0];
        assert_eq!(north.data.value, CubeValue::from("North"));
        // Props resolve relative to each node's own depth.
        assert_eq!(
            north.data.prop("total").unwrap().value,
            CubeValue::Number(60.0)
        );
        let oslo = &north.children[0];
        assert_eq!(oslo.depth, 2);
        assert_eq!(oslo.data.value, CubeValue::from("Oslo"));
        assert_eq!(
            oslo.data.prop("total").unwrap().value,
            CubeValue::Number(10.0)
        );
    }
}

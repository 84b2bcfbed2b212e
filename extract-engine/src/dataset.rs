//! FILENAME: extract-engine/src/dataset.rs
//! PURPOSE: The dataset facade binding one immutable cube to its fields.
//! CONTEXT: A Dataset is built once per cube snapshot. Fields are created
//! eagerly; the hierarchy arena and each field's item list are lazy,
//! write-once caches. Reflecting new cube data means building a new Dataset.

use log::debug;
use once_cell::unsync::OnceCell;
use serde_json::Value;

use cube::{resolve, CubeError, CubeLayout, CubeMode, ValueFormatter};

use crate::config::{normalize, ExtractConfig};
use crate::datum::Datum;
use crate::error::ExtractError;
use crate::field::{Field, FieldKind, RawMeta};
use crate::matrix;
use crate::tree::{self, HierarchyArena, HierarchyNode};

/// An index or exact-name field query. Misses raise `FieldNotFound`;
/// for recoverable predicate lookups see `Dataset::field_matching`.
pub enum FieldQuery {
    Index(usize),
    Name(String),
}

impl From<usize> for FieldQuery {
    fn from(i: usize) -> Self {
        FieldQuery::Index(i)
    }
}

impl From<&str> for FieldQuery {
    fn from(s: &str) -> Self {
        FieldQuery::Name(s.to_string())
    }
}

impl From<String> for FieldQuery {
    fn from(s: String) -> Self {
        FieldQuery::Name(s)
    }
}

impl From<&Field> for FieldQuery {
    fn from(f: &Field) -> Self {
        FieldQuery::Name(f.id().to_string())
    }
}

/// Binds one immutable cube layout to its resolved field list and the
/// extraction entry points.
#[derive(Debug)]
pub struct Dataset {
    key: String,
    layout: CubeLayout,
    fields: Vec<Field>,
    arena: OnceCell<Option<HierarchyArena>>,
}

impl Dataset {
    /// Builds a dataset from a layout document carrying the cube at `/cube`.
    pub fn from_layout(doc: &Value) -> Result<Self, ExtractError> {
        Self::from_layout_at(doc, "/cube")
    }

    /// Builds a dataset from a layout document carrying the cube at `path`.
    ///
    /// Raises `MalformedCube` when the required structure is absent: a
    /// stopped path descent hands back an unrelated container, which the
    /// layout deserialization rejects.
    pub fn from_layout_at(doc: &Value, path: &str) -> Result<Self, ExtractError> {
        let located = resolve(path, doc);
        let value = located.as_one().ok_or_else(|| {
            CubeError::MalformedCube(format!("cube path {path} fans out over a sequence"))
        })?;
        let layout: CubeLayout = serde_json::from_value(value.clone())
            .map_err(|e| CubeError::MalformedCube(e.to_string()))?;
        Ok(Self::with_layout(layout, path.to_string()))
    }

    /// Builds a dataset from an already-typed cube layout.
    pub fn new(layout: CubeLayout) -> Self {
        Self::with_layout(layout, "/cube".to_string())
    }

    fn with_layout(layout: CubeLayout, key: String) -> Self {
        let fields = build_fields(&layout);
        debug!("dataset {}: {} fields", key, fields.len());
        Dataset {
            key,
            layout,
            fields,
            arena: OnceCell::new(),
        }
    }

    /// The dataset's key: the layout path the cube was located at.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn layout(&self) -> &CubeLayout {
        &self.layout
    }

    /// The resolved field list, as a fresh collection in lookup order.
    pub fn fields(&self) -> Vec<&Field> {
        self.fields.iter().collect()
    }

    pub(crate) fn fields_slice(&self) -> &[Field] {
        &self.fields
    }

    pub(crate) fn field_at(&self, index: usize) -> &Field {
        &self.fields[index]
    }

    /// Looks a field up by column index, exact key, or exact title.
    ///
    /// Search order: primary fields, then attribute dimensions, then
    /// attribute expressions. A miss always raises `FieldNotFound`; this is
    /// deliberately different from `field_matching`, which misses
    /// recoverably.
    pub fn field(&self, query: impl Into<FieldQuery>) -> Result<&Field, ExtractError> {
        match query.into() {
            FieldQuery::Index(i) => self.field_index_of(i).map(|i| &self.fields[i]),
            FieldQuery::Name(name) => self.field_index_named(&name).map(|i| &self.fields[i]),
        }
    }

    /// The first field the predicate accepts, or `None`: a recoverable
    /// "maybe", never an error.
    pub fn field_matching(&self, pred: impl Fn(&Field) -> bool) -> Option<&Field> {
        self.field_index_matching(pred).map(|i| &self.fields[i])
    }

    pub(crate) fn field_index_of(&self, index: usize) -> Result<usize, ExtractError> {
        if index < self.fields.len() {
            Ok(index)
        } else {
            Err(ExtractError::FieldNotFound(format!("column {}", index)))
        }
    }

    pub(crate) fn field_index_named(&self, name: &str) -> Result<usize, ExtractError> {
        self.fields
            .iter()
            .position(|f| f.id() == name || f.key() == name || f.title() == name)
            .ok_or_else(|| ExtractError::FieldNotFound(name.to_string()))
    }

    pub(crate) fn field_index_matching(&self, pred: impl Fn(&Field) -> bool) -> Option<usize> {
        self.fields.iter().position(|f| pred(f))
    }

    /// Extracts a flat, ordered sequence of output records.
    pub fn extract(&self, config: &ExtractConfig) -> Result<Vec<Datum>, ExtractError> {
        let Some(plan) = normalize(self, config)? else {
            return Ok(Vec::new());
        };
        match self.layout.mode {
            CubeMode::Matrix => matrix::extract(self, &plan),
            CubeMode::Stacked | CubeMode::Tree => tree::extract(self, &plan),
        }
    }

    /// Augments the cube's hierarchical representation into a tree of
    /// output records. `None` when the cube has no tree representation or
    /// its root page is absent or empty.
    pub fn hierarchy(&self, config: &ExtractConfig) -> Result<Option<HierarchyNode>, ExtractError> {
        let Some(plan) = normalize(self, config)? else {
            return Ok(None);
        };
        let Some(arena) = self.arena() else {
            return Ok(None);
        };
        tree::augment(self, arena, &plan).map(Some)
    }

    /// The shared hierarchy arena, built on first use and reused for the
    /// dataset's lifetime.
    pub(crate) fn arena(&self) -> Option<&HierarchyArena> {
        self.arena
            .get_or_init(|| tree::build_arena(&self.layout))
            .as_ref()
    }
}

/// Creates the field list: dimensions and measures first, then every
/// attached attribute dimension, then every attached attribute expression.
fn build_fields(layout: &CubeLayout) -> Vec<Field> {
    let dim_count = layout.dimensions.len();
    let mut fields = Vec::new();

    for (i, meta) in layout.dimensions.iter().enumerate() {
        fields.push(Field::new(
            format!("dimensions/{}", i),
            meta.key.clone(),
            meta.title.clone(),
            FieldKind::Dimension,
            i,
            i,
            None,
            meta.tags.clone(),
            meta.range,
            ValueFormatter::from_meta(meta.format.as_ref()),
            RawMeta::Dimension(meta.clone()),
        ));
    }

    for (j, meta) in layout.measures.iter().enumerate() {
        fields.push(Field::new(
            format!("measures/{}", j),
            meta.key.clone(),
            meta.title.clone(),
            FieldKind::Measure,
            j,
            dim_count + j,
            None,
            meta.tags.clone(),
            meta.range,
            ValueFormatter::from_meta(meta.format.as_ref()),
            RawMeta::Measure(meta.clone()),
        ));
    }

    // Carrier id, origin index, and attached attribute metadata per primary.
    let carriers: Vec<(String, usize, &cube::AttachedAttributes)> = layout
        .dimensions
        .iter()
        .enumerate()
        .map(|(i, m)| (format!("dimensions/{}", i), i, &m.attributes))
        .chain(
            layout
                .measures
                .iter()
                .enumerate()
                .map(|(j, m)| (format!("measures/{}", j), dim_count + j, &m.attributes)),
        )
        .collect();

    for (base_id, origin, attrs) in &carriers {
        for (k, meta) in attrs.dimensions.iter().enumerate() {
            fields.push(Field::new(
                format!("{}/attributes/dimensions/{}", base_id, k),
                meta.key.clone(),
                meta.title.clone(),
                FieldKind::AttributeDimension,
                k,
                fields[*origin].column,
                Some(*origin),
                meta.tags.clone(),
                None,
                ValueFormatter::from_meta(meta.format.as_ref()),
                RawMeta::Attribute(meta.clone()),
            ));
        }
    }

    for (base_id, origin, attrs) in &carriers {
        for (k, meta) in attrs.expressions.iter().enumerate() {
            fields.push(Field::new(
                format!("{}/attributes/expressions/{}", base_id, k),
                meta.key.clone(),
                meta.title.clone(),
                FieldKind::AttributeExpression,
                k,
                fields[*origin].column,
                Some(*origin),
                meta.tags.clone(),
                None,
                ValueFormatter::from_meta(meta.format.as_ref()),
                RawMeta::Attribute(meta.clone()),
            ));
        }
    }

    fields
}

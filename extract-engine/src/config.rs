//! FILENAME: extract-engine/src/config.rs
//! PURPOSE: Extraction configuration and its normalization into a plan.
//! CONTEXT: Callers describe what to extract with `ExtractConfig`; the
//! normalizer resolves every field reference once and produces a
//! `CanonicalPlan` the extractors execute without further type inspection.

use std::rc::Rc;

use cube::{Cell, CubeValue};

use crate::dataset::Dataset;
use crate::error::ExtractError;
use crate::field::{default_value, Field};
use crate::reducers;

/// Per-cell value accessor.
pub type ValueFn = Rc<dyn Fn(&Cell) -> CubeValue>;

/// Per-cell label accessor.
pub type LabelFn = Rc<dyn Fn(&Cell) -> String>;

/// Per-cell inclusion predicate.
pub type FilterFn = Rc<dyn Fn(&Cell) -> bool>;

/// Collapses a sequence of values into one. Join combiners share this shape.
pub type Reducer = Rc<dyn Fn(&[CubeValue]) -> CubeValue>;

/// Labels a reduced value from the raw labels and the reduction result.
pub type ReduceLabelFn = Rc<dyn Fn(&[String], &CubeValue) -> String>;

/// Combines the labels of a multi-field join.
pub type JoinLabelFn = Rc<dyn Fn(&[String]) -> String>;

/// Field predicate for `FieldRef::Matching`.
pub type FieldPredicate = Rc<dyn Fn(&Field) -> bool>;

/// A reference to a field of the dataset.
///
/// Index and key references that match nothing raise `FieldNotFound`;
/// a predicate that matches nothing resolves to "no field" recoverably.
#[derive(Clone)]
pub enum FieldRef {
    /// Numeric column index.
    Index(usize),
    /// Exact key or title.
    Key(String),
    /// First field the predicate accepts.
    Matching(FieldPredicate),
}

impl From<usize> for FieldRef {
    fn from(i: usize) -> Self {
        FieldRef::Index(i)
    }
}

impl From<&str> for FieldRef {
    fn from(s: &str) -> Self {
        FieldRef::Key(s.to_string())
    }
}

impl From<String> for FieldRef {
    fn from(s: String) -> Self {
        FieldRef::Key(s)
    }
}

impl From<&Field> for FieldRef {
    fn from(f: &Field) -> Self {
        FieldRef::Key(f.id().to_string())
    }
}

/// Named reducer, or a caller-supplied reduction.
#[derive(Clone)]
pub enum ReduceSpec {
    Named(String),
    Custom(Reducer),
}

impl From<&str> for ReduceSpec {
    fn from(name: &str) -> Self {
        ReduceSpec::Named(name.to_string())
    }
}

/// Grouping key for the tracker: a property of the raw cell, or a supplied
/// key function.
#[derive(Clone)]
pub enum TrackBy {
    Text,
    Num,
    Elem,
    Row,
    Key(ValueFn),
}

/// Configuration of one named property.
#[derive(Clone)]
pub enum PropConfig {
    /// A constant; its label defaults to the constant's display form.
    Primitive(CubeValue),

    /// Derived from the main field's cell.
    Function(ValueFn),

    /// A field selection with optional accessor overrides.
    Select(PropSelect),

    /// A multi-field join.
    Join(PropJoin),
}

impl PropConfig {
    pub fn field(r: impl Into<FieldRef>) -> Self {
        PropConfig::Select(PropSelect::new().field(r))
    }

    pub fn primitive(v: impl Into<CubeValue>) -> Self {
        PropConfig::Primitive(v.into())
    }

    pub fn function(f: impl Fn(&Cell) -> CubeValue + 'static) -> Self {
        PropConfig::Function(Rc::new(f))
    }
}

/// Field selection with optional overrides. A selection without a field
/// inherits the enclosing field's accessors.
#[derive(Clone, Default)]
pub struct PropSelect {
    pub field: Option<FieldRef>,
    pub value: Option<ValueFn>,
    pub label: Option<LabelFn>,
    pub reduce: Option<ReduceSpec>,
    pub reduce_label: Option<ReduceLabelFn>,
    pub filter: Option<FilterFn>,
}

impl PropSelect {
    pub fn new() -> Self {
        PropSelect::default()
    }

    pub fn field(mut self, r: impl Into<FieldRef>) -> Self {
        self.field = Some(r.into());
        self
    }

    pub fn value(mut self, f: impl Fn(&Cell) -> CubeValue + 'static) -> Self {
        self.value = Some(Rc::new(f));
        self
    }

    pub fn label(mut self, f: impl Fn(&Cell) -> String + 'static) -> Self {
        self.label = Some(Rc::new(f));
        self
    }

    pub fn reduce(mut self, r: impl Into<ReduceSpec>) -> Self {
        self.reduce = Some(r.into());
        self
    }

    pub fn filter(mut self, f: impl Fn(&Cell) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(f));
        self
    }
}

/// Multi-field join: each entry resolves independently, and the join's own
/// combiners collapse the collected sequence into one value/label.
#[derive(Clone, Default)]
pub struct PropJoin {
    pub fields: Vec<PropConfig>,
    pub value: Option<Reducer>,
    pub label: Option<JoinLabelFn>,
    pub reduce: Option<ReduceSpec>,
}

impl PropJoin {
    pub fn new(fields: Vec<PropConfig>) -> Self {
        PropJoin {
            fields,
            value: None,
            label: None,
            reduce: None,
        }
    }

    pub fn value(mut self, f: impl Fn(&[CubeValue]) -> CubeValue + 'static) -> Self {
        self.value = Some(Rc::new(f));
        self
    }

    pub fn label(mut self, f: impl Fn(&[String]) -> String + 'static) -> Self {
        self.label = Some(Rc::new(f));
        self
    }
}

/// The main extraction target: one field, or a multi-field join.
#[derive(Clone)]
pub enum FieldSource {
    Single(FieldRef),
    Join(PropJoin),
}

impl From<FieldRef> for FieldSource {
    fn from(r: FieldRef) -> Self {
        FieldSource::Single(r)
    }
}

impl From<usize> for FieldSource {
    fn from(i: usize) -> Self {
        FieldSource::Single(FieldRef::Index(i))
    }
}

impl From<&str> for FieldSource {
    fn from(s: &str) -> Self {
        FieldSource::Single(FieldRef::Key(s.to_string()))
    }
}

impl From<String> for FieldSource {
    fn from(s: String) -> Self {
        FieldSource::Single(FieldRef::Key(s))
    }
}

impl From<&Field> for FieldSource {
    fn from(f: &Field) -> Self {
        FieldSource::Single(FieldRef::from(f))
    }
}

impl From<PropJoin> for FieldSource {
    fn from(j: PropJoin) -> Self {
        FieldSource::Join(j)
    }
}

/// Caller-supplied extraction configuration.
#[derive(Clone)]
pub struct ExtractConfig {
    pub field: FieldSource,
    pub value: Option<ValueFn>,
    pub label: Option<LabelFn>,
    pub reduce: Option<ReduceSpec>,
    pub reduce_label: Option<ReduceLabelFn>,
    pub filter: Option<FilterFn>,
    pub track_by: Option<TrackBy>,
    pub props: Vec<(String, PropConfig)>,
}

impl ExtractConfig {
    pub fn new(field: impl Into<FieldSource>) -> Self {
        ExtractConfig {
            field: field.into(),
            value: None,
            label: None,
            reduce: None,
            reduce_label: None,
            filter: None,
            track_by: None,
            props: Vec::new(),
        }
    }

    pub fn matching(pred: impl Fn(&Field) -> bool + 'static) -> Self {
        ExtractConfig::new(FieldSource::Single(FieldRef::Matching(Rc::new(pred))))
    }

    pub fn value(mut self, f: impl Fn(&Cell) -> CubeValue + 'static) -> Self {
        self.value = Some(Rc::new(f));
        self
    }

    pub fn label(mut self, f: impl Fn(&Cell) -> String + 'static) -> Self {
        self.label = Some(Rc::new(f));
        self
    }

    pub fn reduce(mut self, r: impl Into<ReduceSpec>) -> Self {
        self.reduce = Some(r.into());
        self
    }

    pub fn reduce_label(mut self, f: impl Fn(&[String], &CubeValue) -> String + 'static) -> Self {
        self.reduce_label = Some(Rc::new(f));
        self
    }

    pub fn filter(mut self, f: impl Fn(&Cell) -> bool + 'static) -> Self {
        self.filter = Some(Rc::new(f));
        self
    }

    pub fn track_by(mut self, t: TrackBy) -> Self {
        self.track_by = Some(t);
        self
    }

    pub fn track_key(mut self, f: impl Fn(&Cell) -> CubeValue + 'static) -> Self {
        self.track_by = Some(TrackBy::Key(Rc::new(f)));
        self
    }

    pub fn prop(mut self, name: &str, prop: PropConfig) -> Self {
        self.props.push((name.to_string(), prop));
        self
    }
}

// ============================================================================
// CANONICAL PLAN
// ============================================================================

/// One resolved property of the plan.
pub(crate) struct ResolvedProp {
    /// Dataset field index; `None` for primitives and missed predicates.
    pub field: Option<usize>,

    pub value: ValueFn,
    pub label: LabelFn,
    pub filter: Option<FilterFn>,

    /// Explicitly configured reduction only; extractors fall back to the
    /// field's default where the representation demands a collapse.
    pub reduce: Option<Reducer>,
    pub reduce_label: Option<ReduceLabelFn>,

    /// Join sub-entries; non-empty marks this property as a join.
    pub sub: Vec<ResolvedProp>,
    pub join_value: Option<Reducer>,
    pub join_label: Option<JoinLabelFn>,
}

impl ResolvedProp {
    pub fn is_join(&self) -> bool {
        !self.sub.is_empty()
    }
}

/// The canonical extraction plan: main plus named properties, all field
/// references resolved.
pub(crate) struct CanonicalPlan {
    pub main: ResolvedProp,
    pub props: Vec<(String, ResolvedProp)>,
    pub track_by: Option<TrackBy>,
}

fn const_value(v: CubeValue) -> ValueFn {
    Rc::new(move |_| v.clone())
}

fn const_label(s: String) -> LabelFn {
    Rc::new(move |_| s.clone())
}

fn default_value_fn(field: &Field) -> ValueFn {
    let kind = field.kind();
    Rc::new(move |cell: &Cell| default_value(kind, cell))
}

fn default_label_fn() -> LabelFn {
    Rc::new(|cell: &Cell| cell.display())
}

fn resolve_reduce(spec: &Option<ReduceSpec>) -> Result<Option<Reducer>, ExtractError> {
    match spec {
        None => Ok(None),
        Some(ReduceSpec::Custom(r)) => Ok(Some(Rc::clone(r))),
        Some(ReduceSpec::Named(name)) => match reducers::lookup(name) {
            Some(f) => Ok(Some(Rc::new(f))),
            None => Err(ExtractError::UnknownReducer(name.clone())),
        },
    }
}

/// Resolves a field reference. Index/key misses raise; predicate misses
/// resolve to `None`.
fn resolve_field_ref(ds: &Dataset, r: &FieldRef) -> Result<Option<usize>, ExtractError> {
    match r {
        FieldRef::Index(i) => ds.field_index_of(*i).map(Some),
        FieldRef::Key(k) => ds.field_index_named(k).map(Some),
        FieldRef::Matching(pred) => Ok(ds.field_index_matching(|f| pred(f))),
    }
}

/// Resolves one field-bearing property: defaults from the field's own
/// accessors, explicit overrides applied on top.
#[allow(clippy::too_many_arguments)]
fn resolve_select(
    ds: &Dataset,
    field_index: usize,
    value: Option<ValueFn>,
    label: Option<LabelFn>,
    reduce: &Option<ReduceSpec>,
    reduce_label: Option<ReduceLabelFn>,
    filter: Option<FilterFn>,
) -> Result<ResolvedProp, ExtractError> {
    let field = ds.field_at(field_index);
    Ok(ResolvedProp {
        field: Some(field_index),
        value: value.unwrap_or_else(|| default_value_fn(field)),
        label: label.unwrap_or_else(default_label_fn),
        filter,
        reduce: resolve_reduce(reduce)?,
        reduce_label,
        sub: Vec::new(),
        join_value: None,
        join_label: None,
    })
}

/// A property that resolved to nothing (missed predicate).
fn null_prop() -> ResolvedProp {
    ResolvedProp {
        field: None,
        value: const_value(CubeValue::Null),
        label: const_label(String::new()),
        filter: None,
        reduce: None,
        reduce_label: None,
        sub: Vec::new(),
        join_value: None,
        join_label: None,
    }
}

fn resolve_prop(
    ds: &Dataset,
    prop: &PropConfig,
    enclosing: usize,
) -> Result<ResolvedProp, ExtractError> {
    match prop {
        PropConfig::Primitive(v) => Ok(ResolvedProp {
            field: None,
            value: const_value(v.clone()),
            label: const_label(v.display()),
            filter: None,
            reduce: None,
            reduce_label: None,
            sub: Vec::new(),
            join_value: None,
            join_label: None,
        }),
        PropConfig::Function(f) => {
            let f2 = Rc::clone(f);
            Ok(ResolvedProp {
                field: Some(enclosing),
                value: Rc::clone(f),
                label: Rc::new(move |cell: &Cell| f2(cell).display()),
                filter: None,
                reduce: None,
                reduce_label: None,
                sub: Vec::new(),
                join_value: None,
                join_label: None,
            })
        }
        PropConfig::Select(s) => {
            let field_index = match &s.field {
                Some(r) => match resolve_field_ref(ds, r)? {
                    Some(i) => i,
                    None => return Ok(null_prop()),
                },
                None => enclosing,
            };
            resolve_select(
                ds,
                field_index,
                s.value.clone(),
                s.label.clone(),
                &s.reduce,
                s.reduce_label.clone(),
                s.filter.clone(),
            )
        }
        PropConfig::Join(j) => resolve_join(ds, j, Some(enclosing)),
    }
}

/// Resolves a multi-field join. Sub-entries without a field fall back to the
/// enclosing field; the join anchors on its first field-bearing entry.
fn resolve_join(
    ds: &Dataset,
    join: &PropJoin,
    enclosing: Option<usize>,
) -> Result<ResolvedProp, ExtractError> {
    // Anchor on the first entry that names a field of its own.
    let mut anchor = enclosing;
    for entry in &join.fields {
        if let PropConfig::Select(PropSelect { field: Some(r), .. }) = entry {
            if let Some(i) = resolve_field_ref(ds, r)? {
                anchor = Some(i);
                break;
            }
        }
    }
    let Some(anchor) = anchor else {
        return Err(ExtractError::InvalidConfig(
            "multi-field join names no resolvable field".to_string(),
        ));
    };

    let sub = join
        .fields
        .iter()
        .map(|entry| resolve_prop(ds, entry, anchor))
        .collect::<Result<Vec<_>, _>>()?;

    let field = ds.field_at(anchor);
    Ok(ResolvedProp {
        field: Some(anchor),
        value: default_value_fn(field),
        label: default_label_fn(),
        filter: None,
        reduce: resolve_reduce(&join.reduce)?,
        reduce_label: None,
        sub,
        join_value: join.value.clone(),
        join_label: join.label.clone(),
    })
}

/// Normalizes a caller configuration into the canonical plan.
///
/// Returns `Ok(None)` when the main field is referenced by a predicate that
/// matches nothing: a recoverable miss that extracts to an empty sequence.
/// Index and key misses propagate as `FieldNotFound`.
pub(crate) fn normalize(
    ds: &Dataset,
    config: &ExtractConfig,
) -> Result<Option<CanonicalPlan>, ExtractError> {
    let main = match &config.field {
        FieldSource::Single(r) => {
            let Some(index) = resolve_field_ref(ds, r)? else {
                return Ok(None);
            };
            resolve_select(
                ds,
                index,
                config.value.clone(),
                config.label.clone(),
                &config.reduce,
                config.reduce_label.clone(),
                config.filter.clone(),
            )?
        }
        FieldSource::Join(j) => {
            let mut resolved = resolve_join(ds, j, None)?;
            resolved.filter = config.filter.clone();
            if let Some(r) = resolve_reduce(&config.reduce)? {
                resolved.reduce = Some(r);
            }
            resolved.reduce_label = config.reduce_label.clone();
            resolved
        }
    };

    let main_field = main
        .field
        .ok_or_else(|| ExtractError::InvalidConfig("main resolves to no field".to_string()))?;

    let mut props = Vec::with_capacity(config.props.len());
    for (name, prop) in &config.props {
        props.push((name.clone(), resolve_prop(ds, prop, main_field)?));
    }

    Ok(Some(CanonicalPlan {
        main,
        props,
        track_by: config.track_by.clone(),
    }))
}

//! FILENAME: extract-engine/src/field.rs
//! PURPOSE: Wraps one cube column with identity and per-cell accessors.
//! CONTEXT: Fields are created eagerly when a Dataset is built, one per
//! dimension, measure, and attached attribute column. The materialized item
//! list is lazy and computed at most once.

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize};

use cube::{AttributeMeta, Cell, CubeValue, DimensionMeta, MeasureMeta, ValueFormatter, ValueRange};

use crate::config::ExtractConfig;
use crate::dataset::Dataset;
use crate::datum::Datum;
use crate::error::ExtractError;
use crate::reducers::{self, ReduceFn};

/// What kind of cube column a field wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    Dimension,
    Measure,
    AttributeDimension,
    AttributeExpression,
}

impl FieldKind {
    pub fn is_attribute(&self) -> bool {
        matches!(
            self,
            FieldKind::AttributeDimension | FieldKind::AttributeExpression
        )
    }
}

/// The untouched metadata a field was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMeta {
    Dimension(DimensionMeta),
    Measure(MeasureMeta),
    Attribute(AttributeMeta),
}

/// One column of the cube: dimension, measure, or attached attribute.
#[derive(Debug)]
pub struct Field {
    pub(crate) id: String,
    pub(crate) key: String,
    pub(crate) title: String,
    pub(crate) kind: FieldKind,

    /// Index within the field's own metadata list: dimension index, measure
    /// index, or attribute index on the carrying field.
    pub(crate) index: usize,

    /// Global matrix column. Attribute fields use their origin's column.
    pub(crate) column: usize,

    /// Dataset field index of the carrying field, for attribute fields.
    pub(crate) origin: Option<usize>,

    pub(crate) tags: Vec<String>,
    pub(crate) range: Option<ValueRange>,
    pub(crate) formatter: ValueFormatter,
    pub(crate) raw: RawMeta,

    items: OnceCell<Vec<Datum>>,
}

impl Field {
    pub(crate) fn new(
        id: String,
        key: Option<String>,
        title: String,
        kind: FieldKind,
        index: usize,
        column: usize,
        origin: Option<usize>,
        tags: Vec<String>,
        range: Option<ValueRange>,
        formatter: ValueFormatter,
        raw: RawMeta,
    ) -> Self {
        let key = key.unwrap_or_else(|| id.clone());
        Field {
            id,
            key,
            title,
            kind,
            index,
            column,
            origin,
            tags,
            range,
            formatter,
            raw,
            items: OnceCell::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn range(&self) -> Option<ValueRange> {
        self.range
    }

    pub fn min(&self) -> Option<f64> {
        self.range.map(|r| r.min)
    }

    pub fn max(&self) -> Option<f64> {
        self.range.map(|r| r.max)
    }

    /// The untouched source metadata.
    pub fn raw(&self) -> &RawMeta {
        &self.raw
    }

    /// The carrying field's dataset index, for attribute fields.
    pub(crate) fn origin_index(&self) -> Option<usize> {
        self.origin
    }

    /// The carrying field, for attribute fields.
    pub fn origin<'a>(&self, dataset: &'a Dataset) -> Option<&'a Field> {
        self.origin.map(|i| dataset.field_at(i))
    }

    /// Default per-cell value projection for this field's kind.
    pub fn value(&self, cell: &Cell) -> CubeValue {
        default_value(self.kind, cell)
    }

    /// Default per-cell label projection: the cell's display text.
    pub fn label(&self, cell: &Cell) -> String {
        cell.display()
    }

    /// Renders a value with this field's formatter.
    pub fn format(&self, value: &CubeValue) -> String {
        self.formatter.format(value)
    }

    pub fn formatter(&self) -> ValueFormatter {
        self.formatter
    }

    /// Default reduction policy: "first" for dimensions, "avg" for measures.
    pub fn default_reduce(&self) -> ReduceFn {
        match self.kind {
            FieldKind::Dimension | FieldKind::AttributeDimension => reducers::first,
            FieldKind::Measure | FieldKind::AttributeExpression => reducers::avg,
        }
    }

    /// The field's materialized item list.
    ///
    /// On first call this runs a single-field extraction against the owning
    /// dataset; the result is memoized and later calls return it without
    /// walking the pages again.
    pub fn items(&self, dataset: &Dataset) -> Result<&[Datum], ExtractError> {
        self.items
            .get_or_try_init(|| dataset.extract(&ExtractConfig::new(self.id.as_str())))
            .map(Vec::as_slice)
    }
}

/// Kind-appropriate default value: dimensions carry their display text
/// (falling back to the element identifier), measures their numeric content.
pub(crate) fn default_value(kind: FieldKind, cell: &Cell) -> CubeValue {
    match kind {
        FieldKind::Dimension | FieldKind::AttributeDimension => match &cell.text {
            Some(text) => CubeValue::Text(text.clone()),
            None if cell.elem >= 0 => CubeValue::Number(cell.elem as f64),
            None => CubeValue::Null,
        },
        FieldKind::Measure | FieldKind::AttributeExpression => match cell.num {
            Some(n) => CubeValue::Number(n),
            None => CubeValue::Null,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_value_defaults_to_text() {
        let cell = Cell {
            text: Some("SE".to_string()),
            num: None,
            elem: 0,
            row: Some(0),
        };
        assert_eq!(
            default_value(FieldKind::Dimension, &cell),
            CubeValue::from("SE")
        );
    }

    #[test]
    fn measure_value_defaults_to_number() {
        let cell = Cell {
            text: Some("815".to_string()),
            num: Some(815.0),
            elem: 0,
            row: Some(0),
        };
        assert_eq!(
            default_value(FieldKind::Measure, &cell),
            CubeValue::Number(815.0)
        );
    }

    #[test]
    fn dimension_without_text_falls_back_to_elem() {
        let cell = Cell {
            text: None,
            num: None,
            elem: 3,
            row: None,
        };
        assert_eq!(
            default_value(FieldKind::Dimension, &cell),
            CubeValue::Number(3.0)
        );
        assert_eq!(default_value(FieldKind::Dimension, &Cell::empty()), CubeValue::Null);
    }
}

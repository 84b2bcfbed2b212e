//! FILENAME: extract-engine/src/matrix.rs
//! PURPOSE: Extraction over the flat paginated matrix representation.
//! CONTEXT: Walks every page window the main field's column falls into,
//! builds one cell per row, and resolves each configured property from the
//! same row — or from whichever page holds that property's own column.

use log::debug;

use cube::{Cell, CubeValue, MatrixCell, MatrixPage};

use crate::config::{CanonicalPlan, ResolvedProp};
use crate::dataset::Dataset;
use crate::datum::{Datum, Source};
use crate::error::ExtractError;
use crate::field::{Field, FieldKind};
use crate::tracker::{grouping_key, PropSample, RawItem, Tracker};

/// Builds the unified cell view for a field from a raw matrix cell,
/// projecting the embedded attribute cell for attribute fields.
fn cell_view(field: &Field, raw: &MatrixCell, row: usize) -> Cell {
    let projected = match field.kind() {
        FieldKind::AttributeDimension => raw
            .attrs
            .as_ref()
            .and_then(|a| a.dimensions.get(field.index)),
        FieldKind::AttributeExpression => raw
            .attrs
            .as_ref()
            .and_then(|a| a.expressions.get(field.index)),
        _ => Some(raw),
    };
    match projected {
        Some(c) => Cell {
            text: c.text.clone(),
            num: c.num,
            elem: c.elem,
            row: Some(row),
        },
        None => Cell {
            row: Some(row),
            ..Cell::empty()
        },
    }
}

/// Finds the raw cell for an absolute (column, row) position, preferring the
/// page the main cell came from.
fn locate<'a>(
    pages: &'a [MatrixPage],
    current: &'a MatrixPage,
    column: usize,
    row: usize,
) -> Option<&'a MatrixCell> {
    let page = if current.area.contains_column(column) && current.area.contains_row(row) {
        current
    } else {
        pages
            .iter()
            .find(|p| p.area.contains_column(column) && p.area.contains_row(row))?
    };
    page.rows
        .get(row - page.area.top)
        .and_then(|cells| cells.get(column - page.area.left))
}

fn source_for(ds: &Dataset, field: &Field) -> Option<Source> {
    Some(Source {
        key: ds.key().to_string(),
        field: field.id().to_string(),
    })
}

/// Evaluates one resolved property against the current row.
fn eval_prop(
    ds: &Dataset,
    prop: &ResolvedProp,
    main_index: usize,
    main_cell: &Cell,
    pages: &[MatrixPage],
    page: &MatrixPage,
    row: usize,
) -> PropSample {
    if prop.is_join() {
        let mut values = Vec::with_capacity(prop.sub.len());
        let mut labels = Vec::with_capacity(prop.sub.len());
        for sub in &prop.sub {
            let sample = eval_prop(ds, sub, main_index, main_cell, pages, page, row);
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
        let source = prop.field.and_then(|i| source_for(ds, ds.field_at(i)));
        return PropSample {
            value,
            label,
            source,
        };
    }

    let Some(field_index) = prop.field else {
        // Primitive or missed predicate: evaluate on the main cell.
        return PropSample {
            value: (prop.value)(main_cell),
            label: (prop.label)(main_cell),
            source: None,
        };
    };

    let field = ds.field_at(field_index);
    let cell = if field_index == main_index {
        main_cell.clone()
    } else {
        match locate(pages, page, field.column, row) {
            Some(raw) => cell_view(field, raw, row),
            None => Cell {
                row: Some(row),
                ..Cell::empty()
            },
        }
    };

    if let Some(filter) = &prop.filter {
        if !filter(&cell) {
            return PropSample {
                value: CubeValue::Null,
                label: String::new(),
                source: source_for(ds, field),
            };
        }
    }

    PropSample {
        value: (prop.value)(&cell),
        label: (prop.label)(&cell),
        source: source_for(ds, field),
    }
}

/// Walks the paginated matrix and emits one record per non-filtered row of
/// the main field, in row order — or one per grouping key when tracking.
pub(crate) fn extract(ds: &Dataset, plan: &CanonicalPlan) -> Result<Vec<Datum>, ExtractError> {
    let pages = &ds.layout().pages;
    let main_index = plan
        .main
        .field
        .ok_or_else(|| ExtractError::InvalidConfig("main resolves to no field".to_string()))?;
    let main_field = ds.field_at(main_index);

    let mut out = Vec::new();
    let mut tracker = plan.track_by.as_ref().map(|_| Tracker::new());

    for page in pages {
        if !page.area.contains_column(main_field.column) {
            debug!(
                "skipping page at ({}, {}): main column {} outside extent",
                page.area.left, page.area.top, main_field.column
            );
            continue;
        }
        let local = main_field.column - page.area.left;

        for (offset, cells) in page.rows.iter().enumerate() {
            let Some(raw) = cells.get(local) else {
                continue;
            };
            let row = page.area.top + offset;
            let cell = cell_view(main_field, raw, row);

            if let Some(filter) = &plan.main.filter {
                if !filter(&cell) {
                    continue;
                }
            }

            let main_sample = if plan.main.is_join() {
                eval_prop(ds, &plan.main, main_index, &cell, pages, page, row)
            } else {
                PropSample {
                    value: (plan.main.value)(&cell),
                    label: (plan.main.label)(&cell),
                    source: source_for(ds, main_field),
                }
            };

            let props = plan
                .props
                .iter()
                .map(|(_, prop)| eval_prop(ds, prop, main_index, &cell, pages, page, row))
                .collect();

            let item = RawItem {
                main: main_sample,
                props,
            };

            match (&plan.track_by, tracker.as_mut()) {
                (Some(track_by), Some(tracker)) => {
                    tracker.track(&grouping_key(track_by, &cell), item);
                }
                _ => out.push(item.into_datum(&plan.props)),
            }
        }
    }

    match tracker {
        Some(tracker) => Ok(tracker.collect(ds, plan)),
        None => Ok(out),
    }
}

//! FILENAME: extract-engine/src/reducers.rs
//! PURPOSE: The named reducer registry.
//! CONTEXT: Reductions collapse a sequence of raw values into one. The
//! numeric reducers silently discard non-numeric inputs and yield NaN when
//! nothing numeric remains; `first`/`last` pick by position regardless of
//! type.

use cube::CubeValue;

/// A registered reduction function.
pub type ReduceFn = fn(&[CubeValue]) -> CubeValue;

/// Resolves a reducer by its registered name.
pub fn lookup(name: &str) -> Option<ReduceFn> {
    match name {
        "first" => Some(first),
        "last" => Some(last),
        "min" => Some(min),
        "max" => Some(max),
        "sum" => Some(sum),
        "avg" => Some(avg),
        _ => None,
    }
}

pub fn first(values: &[CubeValue]) -> CubeValue {
    values.first().cloned().unwrap_or(CubeValue::Null)
}

pub fn last(values: &[CubeValue]) -> CubeValue {
    values.last().cloned().unwrap_or(CubeValue::Null)
}

fn numeric(values: &[CubeValue]) -> impl Iterator<Item = f64> + '_ {
    values.iter().filter_map(CubeValue::as_f64)
}

pub fn min(values: &[CubeValue]) -> CubeValue {
    CubeValue::Number(numeric(values).fold(f64::NAN, f64::min))
}

pub fn max(values: &[CubeValue]) -> CubeValue {
    CubeValue::Number(numeric(values).fold(f64::NAN, f64::max))
}

pub fn sum(values: &[CubeValue]) -> CubeValue {
    let mut total = f64::NAN;
    for n in numeric(values) {
        total = if total.is_nan() { n } else { total + n };
    }
    CubeValue::Number(total)
}

pub fn avg(values: &[CubeValue]) -> CubeValue {
    let mut total = 0.0;
    let mut count = 0usize;
    for n in numeric(values) {
        total += n;
        count += 1;
    }
    if count == 0 {
        CubeValue::Number(f64::NAN)
    } else {
        CubeValue::Number(total / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mixed() -> Vec<CubeValue> {
        vec![
            CubeValue::Number(1.0),
            CubeValue::from("x"),
            CubeValue::Number(3.0),
        ]
    }

    #[test]
    fn sum_discards_non_numeric_inputs() {
        assert_eq!(sum(&mixed()), CubeValue::Number(4.0));
    }

    #[test]
    fn avg_of_nothing_numeric_is_nan() {
        let result = avg(&[]).as_f64().unwrap();
        assert!(result.is_nan());
        let result = avg(&[CubeValue::from("x")]).as_f64().unwrap();
        assert!(result.is_nan());
    }

    #[test]
    fn min_max_ignore_non_numeric_entries() {
        assert_eq!(min(&mixed()), CubeValue::Number(1.0));
        assert_eq!(max(&mixed()), CubeValue::Number(3.0));
    }

    #[test]
    fn first_and_last_pick_by_position() {
        assert_eq!(first(&mixed()), CubeValue::Number(1.0));
        assert_eq!(last(&mixed()), CubeValue::Number(3.0));
        assert_eq!(first(&[]), CubeValue::Null);
    }

    #[test]
    fn registry_resolves_all_names() {
        for name in ["first", "last", "min", "max", "sum", "avg"] {
            assert!(lookup(name).is_some(), "missing reducer {name}");
        }
        assert!(lookup("median").is_none());
    }
}

//! FILENAME: extract-engine/src/tracker.rs
//! PURPOSE: Grouping stage that buckets raw items and reduces each bucket.
//! CONTEXT: When a grouping key is configured, extractors route every raw
//! item through `Tracker::track`; `collect` then collapses each bucket into
//! one output record, in first-seen key order.

use rustc_hash::FxHashMap;

use cube::{Cell, CubeValue};

use crate::config::{CanonicalPlan, ResolvedProp, TrackBy};
use crate::dataset::Dataset;
use crate::datum::{Datum, Source};

/// Raw per-item sample for one property: value, label, and origin.
#[derive(Debug, Clone)]
pub(crate) struct PropSample {
    pub value: CubeValue,
    pub label: String,
    pub source: Option<Source>,
}

/// One raw item as produced by an extractor, before grouping.
#[derive(Debug, Clone)]
pub(crate) struct RawItem {
    pub main: PropSample,

    /// Aligned with the plan's property list.
    pub props: Vec<PropSample>,
}

impl RawItem {
    /// Converts an ungrouped item directly into its output record.
    pub fn into_datum(self, names: &[(String, ResolvedProp)]) -> Datum {
        let mut datum = Datum::new(self.main.value, self.main.label);
        datum.source = self.main.source;
        for ((name, _), sample) in names.iter().zip(self.props) {
            let mut prop_datum = Datum::new(sample.value, sample.label);
            prop_datum.source = sample.source;
            datum.set_prop(name, prop_datum);
        }
        datum
    }
}

/// Computes the grouping key for a raw cell.
pub(crate) fn grouping_key(track_by: &TrackBy, cell: &Cell) -> CubeValue {
    match track_by {
        TrackBy::Text => cell
            .text
            .clone()
            .map(CubeValue::Text)
            .unwrap_or(CubeValue::Null),
        TrackBy::Num => cell.num.map(CubeValue::Number).unwrap_or(CubeValue::Null),
        TrackBy::Elem => CubeValue::Number(cell.elem as f64),
        TrackBy::Row => cell
            .row
            .map(|r| CubeValue::Number(r as f64))
            .unwrap_or(CubeValue::Null),
        TrackBy::Key(f) => f(cell),
    }
}

/// Collision-free bucket key text for a grouping value.
fn bucket_key(value: &CubeValue) -> String {
    match value {
        CubeValue::Null => "0:".to_string(),
        CubeValue::Number(n) => format!("n:{}", n),
        CubeValue::Text(s) => format!("t:{}", s),
        CubeValue::Bool(b) => format!("b:{}", b),
        CubeValue::List(items) => {
            let parts: Vec<String> = items.iter().map(bucket_key).collect();
            format!("l:{}", parts.join("|"))
        }
    }
}

/// Buckets raw items by grouping key, preserving first-seen order.
pub(crate) struct Tracker {
    buckets: Vec<Vec<RawItem>>,
    index: FxHashMap<String, usize>,
}

impl Tracker {
    pub fn new() -> Self {
        Tracker {
            buckets: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Appends an item to its key's bucket, creating the bucket on first
    /// encounter.
    pub fn track(&mut self, key: &CubeValue, item: RawItem) {
        let key = bucket_key(key);
        let slot = *self.index.entry(key).or_insert_with(|| {
            self.buckets.push(Vec::new());
            self.buckets.len() - 1
        });
        self.buckets[slot].push(item);
    }

    /// Collapses every bucket into one record, in first-seen order.
    pub fn collect(self, ds: &Dataset, plan: &CanonicalPlan) -> Vec<Datum> {
        self.buckets
            .into_iter()
            .map(|bucket| collapse(ds, plan, bucket))
            .collect()
    }
}

/// Reduces one bucket into a single output record.
fn collapse(ds: &Dataset, plan: &CanonicalPlan, bucket: Vec<RawItem>) -> Datum {
    let main = reduce_samples(
        ds,
        &plan.main,
        bucket.iter().map(|item| &item.main).collect::<Vec<_>>(),
    );
    let mut datum = Datum::new(main.value, main.label);
    datum.source = main.source;

    for (i, (name, prop)) in plan.props.iter().enumerate() {
        let samples: Vec<&PropSample> = bucket.iter().map(|item| &item.props[i]).collect();
        let reduced = reduce_samples(ds, prop, samples);
        let mut prop_datum = Datum::new(reduced.value, reduced.label);
        prop_datum.source = reduced.source;
        datum.set_prop(name, prop_datum);
    }
    datum
}

/// Collapses one property's samples across a bucket.
///
/// The value applies the configured reduction when present, else keeps the
/// raw sequence. The label tries, in order: an explicit reduce-label, the
/// field's formatter over the reduced value, the joined raw label sequence.
fn reduce_samples(ds: &Dataset, prop: &ResolvedProp, samples: Vec<&PropSample>) -> PropSample {
    let values: Vec<CubeValue> = samples.iter().map(|s| s.value.clone()).collect();
    let labels: Vec<String> = samples.iter().map(|s| s.label.clone()).collect();
    let source = samples.first().and_then(|s| s.source.clone());

    let (value, reduced) = match &prop.reduce {
        Some(reduce) => (reduce(&values), true),
        None => (CubeValue::List(values), false),
    };

    let label = if let Some(reduce_label) = &prop.reduce_label {
        reduce_label(&labels, &value)
    } else if reduced {
        match prop.field {
            Some(i) => ds.field_at(i).format(&value),
            None => labels.join(", "),
        }
    } else {
        labels.join(", ")
    };

    PropSample {
        value,
        label,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_keep_first_seen_order() {
        let mut tracker = Tracker::new();
        for key in ["SE", "IT", "SE"] {
            tracker.track(
                &CubeValue::from(key),
                RawItem {
                    main: PropSample {
                        value: CubeValue::from(key),
                        label: key.to_string(),
                        source: None,
                    },
                    props: Vec::new(),
                },
            );
        }
        assert_eq!(tracker.buckets.len(), 2);
        assert_eq!(tracker.buckets[0].len(), 2);
        assert_eq!(tracker.buckets[1].len(), 1);
    }

    #[test]
    fn bucket_keys_do_not_collide_across_types() {
        assert_ne!(
            bucket_key(&CubeValue::from("1")),
            bucket_key(&CubeValue::Number(1.0))
        );
    }
}

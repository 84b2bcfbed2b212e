//! FILENAME: extract-engine/benches/extraction.rs
//! Benchmarks for the extraction hot paths: flat matrix walks and
//! hierarchical depth resolution.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;

use extract_engine::{Dataset, ExtractConfig, PropConfig, TrackBy};

fn matrix_dataset(rows: usize) -> Dataset {
    let page_rows: Vec<_> = (0..rows)
        .map(|r| {
            json!([
                { "text": format!("dim-{}", r % 50), "elem": r % 50 },
                { "num": (r % 997) as f64 }
            ])
        })
        .collect();
    let doc = json!({
        "cube": {
            "mode": "matrix",
            "size": { "rows": rows, "columns": 2 },
            "dimensions": [ { "title": "Category" } ],
            "measures": [ { "title": "Value" } ],
            "pages": [ {
                "area": { "left": 0, "top": 0, "width": 2, "height": rows },
                "rows": page_rows
            } ]
        }
    });
    Dataset::from_layout(&doc).unwrap()
}

fn stacked_dataset(groups: usize, leaves: usize) -> Dataset {
    let data: Vec<_> = (0..groups)
        .map(|g| {
            let sub: Vec<_> = (0..leaves)
                .map(|l| json!({ "text": format!("leaf-{}", l), "elem": l, "sub": [
                    { "num": (g * leaves + l) as f64, "row": g * leaves + l }
                ] }))
                .collect();
            json!({ "text": format!("group-{}", g), "elem": g, "sub": sub })
        })
        .collect();
    let doc = json!({
        "cube": {
            "mode": "stacked",
            "dimensions": [ { "title": "Group" }, { "title": "Leaf" } ],
            "measures": [ { "title": "Value" } ],
            "order": [0, 1],
            "stacked_pages": [ { "data": [ { "kind": "root", "sub": data } ] } ]
        }
    });
    Dataset::from_layout(&doc).unwrap()
}

fn bench_matrix(c: &mut Criterion) {
    let ds = matrix_dataset(10_000);
    let config = ExtractConfig::new(0).prop("value", PropConfig::field(1));
    c.bench_function("matrix_extract_10k", |b| {
        b.iter(|| black_box(ds.extract(&config).unwrap()))
    });

    let grouped = ExtractConfig::new(0)
        .track_by(TrackBy::Elem)
        .prop("value", PropConfig::field(1));
    c.bench_function("matrix_extract_10k_grouped", |b| {
        b.iter(|| black_box(ds.extract(&grouped).unwrap()))
    });
}

fn bench_stacked(c: &mut Criterion) {
    let ds = stacked_dataset(100, 50);
    let config = ExtractConfig::new("Leaf").prop("group", PropConfig::field("Group"));
    c.bench_function("stacked_extract_5k", |b| {
        b.iter(|| black_box(ds.extract(&config).unwrap()))
    });
}

criterion_group!(benches, bench_matrix, bench_stacked);
criterion_main!(benches);

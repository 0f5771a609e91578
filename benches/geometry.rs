//! Benchmarks for geometry snapshot ingestion and positional queries.
//!
//! Run with: cargo bench
//!
//! Results are saved to `target/criterion/` with HTML reports.
#![allow(clippy::expect_used, clippy::unwrap_used)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gridgeom::{GeometrySnapshot, GridGeometry, Point, Unit};

const PAYLOAD: &str = r#"{
    "commandName": "GridGeometryData",
    "maxColumnIndex": "1023",
    "maxRowIndex": "500000",
    "columns": {
        "sizes": "1280:0 1470:1 1280:5 1755:6 1280:7 2145:8 2655:9 1280:22 2025:23 1280:1023 ",
        "hidden": "0:1023 ",
        "filtered": "0:1023 ",
        "groups": ""
    },
    "rows": {
        "sizes": "256:6 583:7 256:10 264:11 256:13 450:14 256:19 1485:20 256:1048575 ",
        "hidden": "0:21 22 1048575 ",
        "filtered": "0:1048575 ",
        "groups": "10:14:0:1, 13:9:0:1, 17:4:1:1, "
    }
}"#;

fn geometry() -> GridGeometry {
    let snapshot = GeometrySnapshot::from_json(PAYLOAD).expect("Failed to parse payload");
    GridGeometry::new(&snapshot, 3840, 3840, 256, 0).expect("Failed to build geometry")
}

/// Benchmark ingesting a full snapshot (JSON + run-length parsing + caches)
fn bench_snapshot_ingest(c: &mut Criterion) {
    c.bench_function("snapshot_ingest", |b| {
        b.iter(|| {
            let snapshot =
                GeometrySnapshot::from_json(black_box(PAYLOAD)).expect("Failed to parse payload");
            GridGeometry::new(&snapshot, 3840, 3840, 256, 0).expect("Failed to build geometry")
        })
    });
}

/// Benchmark single-cell rectangle lookups at the current zoom
fn bench_cell_rect(c: &mut Criterion) {
    let geometry = geometry();
    c.bench_function("cell_rect", |b| {
        b.iter(|| geometry.cell_rect(black_box(20), black_box(5_230), None))
    });
}

/// Benchmark hit testing a device-pixel point back to cell indices
fn bench_cell_from_point(c: &mut Criterion) {
    let geometry = geometry();
    let point = Point::new(1_920.0, 89_030.0);
    c.bench_function("cell_from_point", |b| {
        b.iter(|| geometry.cell_from_point(black_box(point), Unit::Device))
    });
}

/// Benchmark reprojecting a point to another zoom (uncached run walk)
fn bench_reprojection(c: &mut Criterion) {
    let geometry = geometry();
    let point = Point::new(40_000.0, 17_280.0);
    c.bench_function("aligned_point_at_zoom", |b| {
        b.iter(|| geometry.aligned_point_at_zoom(black_box(point), black_box(1.2)))
    });
}

/// Benchmark rescaling the cached positions to a new tile geometry
fn bench_rescale(c: &mut Criterion) {
    c.bench_function("rescale", |b| {
        let mut geometry = geometry();
        let mut flip = false;
        b.iter(|| {
            let twips = if flip { 3_840 } else { 6_636 };
            flip = !flip;
            geometry.set_tile_geometry(black_box(twips), black_box(twips), 256);
        })
    });
}

criterion_group!(
    benches,
    bench_snapshot_ingest,
    bench_cell_rect,
    bench_cell_from_point,
    bench_reprojection,
    bench_rescale,
);

criterion_main!(benches);

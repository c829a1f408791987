//! Benchmark for height map shape construction
//!
//! Measures both representations on terrain-sized grids plus collider export.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use heightmap_physics::collider::to_collider;
use heightmap_physics::{HeightGrid, HeightMapBuilder, PhysicsSettings};
use std::hint::black_box;

/// Rolling hills, enough variation to need full sample precision
fn create_terrain(width: i32, depth: i32) -> HeightGrid {
    HeightGrid::from_fn(width, depth, |x, z| {
        let (x, z) = (x as f32, z as f32);
        (x * 0.15).sin() * 4.0 + (z * 0.1).cos() * 3.0 + (x * z * 0.01).sin()
    })
}

fn builder() -> HeightMapBuilder {
    HeightMapBuilder::new().with_settings(PhysicsSettings::default())
}

fn bench_height_field(c: &mut Criterion) {
    let mut group = c.benchmark_group("height_field");
    for size in [17, 65, 129] {
        let grid = create_terrain(size, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            let builder = builder();
            b.iter(|| builder.build(black_box(grid)))
        });
    }
    group.finish();
}

fn bench_mesh(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh");
    for size in [17, 65, 129] {
        // Non-square so the dispatcher picks the mesh path
        let grid = create_terrain(size, size + 1);
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            let builder = builder();
            b.iter(|| builder.build(black_box(grid)))
        });
    }
    group.finish();
}

fn bench_collider_export(c: &mut Criterion) {
    let grid = create_terrain(65, 65);
    let shape = match builder().build(&grid) {
        Ok(Some(shape)) => shape,
        _ => panic!("Failed to build benchmark terrain"),
    };

    c.bench_function("collider_export_65", |b| {
        b.iter(|| to_collider(black_box(&shape)))
    });
}

criterion_group!(
    benches,
    bench_height_field,
    bench_mesh,
    bench_collider_export
);
criterion_main!(benches);

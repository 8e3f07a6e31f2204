use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use flatmap_geom::polygonize;
use geo::{Coord, LineString};
use std::hint::black_box;
use std::time::Duration;

/// A square boundary cut by `n` vertical and `n` horizontal dividers that overshoot it slightly.
fn grid_lines(n: usize) -> Vec<LineString<f64>> {
    let side = 100.0;
    let mut lines = vec![LineString::new(vec![
        Coord { x: 0.0, y: 0.0 },
        Coord { x: side, y: 0.0 },
        Coord { x: side, y: side },
        Coord { x: 0.0, y: side },
        Coord { x: 0.0, y: 0.0 },
    ])];
    for i in 1..=n {
        let at = side * i as f64 / (n + 1) as f64;
        lines.push(LineString::new(vec![
            Coord { x: at, y: -1.0 },
            Coord { x: at, y: side + 1.0 },
        ]));
        lines.push(LineString::new(vec![
            Coord { x: -1.0, y: at },
            Coord { x: side + 1.0, y: at },
        ]));
    }
    lines
}

fn bench_polygonize(c: &mut Criterion) {
    let mut group = c.benchmark_group("polygonize");
    group.measurement_time(Duration::from_secs(10));

    for n in [4usize, 16, 48] {
        let lines = grid_lines(n);
        group.bench_with_input(BenchmarkId::new("grid", n), &lines, |b, lines| {
            b.iter(|| {
                let polygons = polygonize(black_box(lines), 1e-6);
                black_box(polygons.len());
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_polygonize);
criterion_main!(benches);

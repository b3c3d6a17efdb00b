use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use trackoss_engine::geometry::compute_statistics;
use trackoss_engine::models::{ActivityType, Point, PointKind};
use trackoss_engine::road_type::RoadType;
use trackoss_engine::segmentation::analyze;

const CYCLE: [RoadType; 4] = [
    RoadType::Residential,
    RoadType::BikePath,
    RoadType::GravelRoad,
    RoadType::BikePath,
];

fn synthetic_route(n: usize) -> (Vec<Point>, Vec<RoadType>) {
    let points = (0..n)
        .map(|i| {
            let t = i as f64 * 0.0005;
            Point::new(45.0 + t, 5.0 + t.sin() * 0.01, PointKind::TrackPoint)
                .with_elevation(Some(400.0 + (t * 50.0).sin() * 30.0))
        })
        .collect();
    // road type changes every 25 points
    let road_types = (0..n).map(|i| CYCLE[(i / 25) % CYCLE.len()]).collect();
    (points, road_types)
}

fn benchmark_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("road_type_segmentation");

    for size in [100, 1_000, 10_000] {
        let (points, road_types) = synthetic_route(size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| analyze(black_box(&points), black_box(&road_types), None));
        });
    }

    group.finish();
}

fn benchmark_statistics(c: &mut Criterion) {
    let (points, _) = synthetic_route(10_000);
    c.bench_function("route_statistics_10k", |b| {
        b.iter(|| compute_statistics(black_box(&points), ActivityType::Cycling));
    });
}

criterion_group!(benches, benchmark_segmentation, benchmark_statistics);
criterion_main!(benches);

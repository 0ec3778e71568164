use criterion::{criterion_group, criterion_main, Criterion};
use drive_tracker::models::LocationSample;
use drive_tracker::services::scoring::score_speeds;
use drive_tracker::services::DriveSession;
use std::hint::black_box;

/// An hour of 1 Hz fixes: stop-and-go driving with a few long stops.
fn commute() -> Vec<LocationSample> {
    let mut samples = Vec::with_capacity(3_600);
    let mut lat = 37.40;
    for i in 0..3_600i64 {
        let speed = match i % 900 {
            0..=599 => 30.0 + (i % 60) as f32 * 0.8,
            _ => 0.0,
        };
        lat += speed as f64 * 2.5e-6;
        samples.push(LocationSample::new(lat, -122.1, speed, i * 1_000));
    }
    samples
}

fn benchmark_session(c: &mut Criterion) {
    let samples = commute();
    let speeds: Vec<f32> = samples.iter().map(|s| s.speed_kmh).collect();

    let mut group = c.benchmark_group("drive_session");

    group.bench_function("process_one_hour", |b| {
        b.iter(|| {
            let mut session = DriveSession::new("bench-user", 0.0);
            for sample in &samples {
                black_box(session.process(black_box(sample)));
            }
            session.close()
        })
    });

    group.bench_function("score_one_hour", |b| {
        b.iter(|| score_speeds(black_box(&speeds)))
    });

    group.finish();
}

criterion_group!(benches, benchmark_session);
criterion_main!(benches);

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use nacre_motion::{Particle, step_particles};

fn batch(count: usize) -> Vec<Particle> {
    (0..count)
        .map(|i| {
            let f = i as f64;
            Particle {
                x: (f * 37.0) % 800.0,
                y: (f * 53.0) % 400.0,
                vx: if i % 2 == 0 { 0.7 } else { -0.9 },
                vy: if i % 3 == 0 { -0.4 } else { 0.6 },
                size: 1.0 + (f % 3.0),
                opacity: 0.2 + (f % 5.0) / 10.0,
            }
        })
        .collect()
}

fn bench_step(c: &mut Criterion) {
    for count in [50usize, 500, 5000] {
        let mut particles = batch(count);
        c.bench_function(&format!("step_particles/{count}"), |b| {
            b.iter(|| {
                step_particles(black_box(&mut particles), 800.0, 400.0);
            });
        });
    }
}

criterion_group!(benches, bench_step);
criterion_main!(benches);

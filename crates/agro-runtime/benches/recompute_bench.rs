use agro_core::{Control, Sliders};
use agro_runtime::{SessionSettings, SimulatorDashboard};
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn bench_apply(c: &mut Criterion) {
    let settings = SessionSettings {
        seed: Some(42),
        ..SessionSettings::default()
    };
    let mut dashboard = SimulatorDashboard::new(&settings).unwrap();
    let sliders = Sliders::default()
        .with(Control::Temperature, 31.5)
        .with(Control::Irrigation, 2500.0);
    c.bench_function("simulator_apply", |b| {
        b.iter(|| dashboard.apply(black_box(&sliders)))
    });
    c.bench_function("simulator_reroll", |b| {
        b.iter(|| dashboard.reroll())
    });
}

criterion_group!(benches, bench_apply);
criterion_main!(benches);

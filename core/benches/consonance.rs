use std::sync::Arc;

use criterion::criterion_group;
use criterion::criterion_main;
use criterion::BenchmarkId;
use criterion::Criterion;

use consona_core::consonance::ConsonanceConfig;
use consona_core::consonance::DissonanceTable;
use consona_core::voices::VoiceManager;
use consona_core::voices::VoiceManagerConfig;
use consona_core::NoOutput;

fn stress_manager(manager: &VoiceManager) {
    for key in manager.note_range().step_by(3) {
        manager.note_on(key, 0.8);
    }
    for _ in 0..60 {
        manager.tick();
    }
    manager.all_notes_off();
    for _ in 0..60 {
        manager.tick();
    }
}

fn criterion_benchmark(c: &mut Criterion) {
    let config = ConsonanceConfig::default();

    let mut group = c.benchmark_group("build table (88 notes)");
    group.sample_size(10);
    for maxfrac in [16, 64, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(maxfrac), &maxfrac, |b, &maxfrac| {
            b.iter(|| DissonanceTable::new(config.notecount, maxfrac, config.bell_width))
        });
    }
    group.finish();

    let manager = VoiceManager::new(VoiceManagerConfig::default(), Arc::new(NoOutput))
        .expect("default config is valid");

    c.bench_function("tick (88 notes, 30 voices)", |b| {
        for key in manager.note_range().step_by(3) {
            manager.note_on(key, 0.8);
        }
        b.iter(|| manager.tick())
    });

    c.bench_function("note events and ticks", |b| {
        b.iter(|| stress_manager(&manager))
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

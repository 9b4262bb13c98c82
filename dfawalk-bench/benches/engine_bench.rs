//! Execution engine benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use dfawalk_core::{presets, Engine, Recorder, Stepper, Symbol};

const SENTENCE: &str = "Some MEN and some women met at the station. ";

fn text_of_len(len: usize) -> String {
    SENTENCE.chars().cycle().take(len).collect()
}

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_full_run");
    let definition = presets::men_women().unwrap();

    for len in [64usize, 1024, 16 * 1024] {
        let text = text_of_len(len);
        group.throughput(Throughput::Elements(len as u64));

        group.bench_with_input(BenchmarkId::new("no_observer", len), &text, |b, text| {
            let mut engine = Engine::new(());
            b.iter(|| black_box(engine.run(black_box(text), &definition).unwrap()));
        });

        group.bench_with_input(BenchmarkId::new("recorder", len), &text, |b, text| {
            let mut engine = Engine::new(Recorder::new());
            b.iter(|| {
                engine.observer_mut().clear();
                black_box(engine.run(black_box(text), &definition).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_single_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine_single_step");
    let definition = presets::men_women().unwrap();
    let text = text_of_len(1024);
    group.throughput(Throughput::Elements(1024));

    // Threads the returned state back in by hand, one call per symbol
    group.bench_function("manual_threading", |b| {
        let mut engine = Engine::new(());
        b.iter(|| {
            let mut state = None;
            for index in 0..1024 {
                state = Some(engine.step(&text, &definition, index, state).unwrap());
            }
            black_box(state)
        });
    });

    group.bench_function("stepper", |b| {
        let mut engine = Engine::new(());
        b.iter(|| {
            let mut stepper = Stepper::new(&definition, text.as_str());
            let mut last = None;
            while !stepper.is_finished() {
                last = Some(stepper.step(&mut engine).unwrap().state);
            }
            black_box(last)
        });
    });

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("next_state");
    let definition = presets::men_women().unwrap();

    let me = definition.state_by_name("me").unwrap();
    group.bench_function("explicit_match", |b| {
        b.iter(|| black_box(definition.next_state(me, black_box(Symbol::Char('n')))))
    });
    group.bench_function("fallback", |b| {
        b.iter(|| black_box(definition.next_state(me, black_box(Symbol::Char('z')))))
    });
    group.bench_function("epsilon", |b| {
        b.iter(|| black_box(definition.next_state(me, black_box(Symbol::Epsilon))))
    });

    group.finish();
}

criterion_group!(benches, bench_full_run, bench_single_step, bench_lookup);
criterion_main!(benches);

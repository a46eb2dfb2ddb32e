use criterion::{black_box, criterion_group, criterion_main, Criterion};
use naboo::platform::HeadlessPlatform;
use naboo::transition::{AnimateArgs, AnimateOptions, Properties, TransitionDriver};
use naboo::{NabooConfig, Sequence};
use std::rc::Rc;

fn bench_synchronous_chain(c: &mut Criterion) {
    c.bench_function("sequence_10k_sync_steps", |b| {
        b.iter(|| {
            let seq = Sequence::new();
            for _ in 0..10_000 {
                seq.step(|advance| advance.advance());
            }
            let _ = seq.start();
            black_box(seq.is_ended())
        })
    });
}

fn bench_parallel_fan_out(c: &mut Criterion) {
    c.bench_function("parallel_100_children", |b| {
        b.iter(|| {
            let children = (0..100)
                .map(|_| {
                    let child = Sequence::new();
                    child.step(|advance| advance.advance());
                    child
                })
                .collect();
            let seq = naboo::parallel(children);
            let _ = seq.start();
            black_box(seq.is_ended())
        })
    });
}

fn bench_headless_transitions(c: &mut Criterion) {
    c.bench_function("headless_50_transitions", |b| {
        b.iter(|| {
            let platform = HeadlessPlatform::default();
            let driver = Rc::new(TransitionDriver::new(&platform, &NabooConfig::default()));
            let el = platform.create_element("div");
            let seq = Sequence::new();
            for i in 0..50 {
                seq.with_animate(
                    &driver,
                    AnimateArgs::new(el.clone(), Properties::new().set("left", format!("{}px", i)))
                        .options(AnimateOptions::new().duration(16)),
                );
            }
            let _ = seq.start();
            platform.event_loop().run_until_idle();
            black_box(seq.is_ended())
        })
    });
}

criterion_group!(
    benches,
    bench_synchronous_chain,
    bench_parallel_fan_out,
    bench_headless_transitions
);
criterion_main!(benches);

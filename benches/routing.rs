//! Routing decision benchmarks
//!
//! The routing decision sits on every query's critical path and is
//! documented as fast, local, and synchronous; these benchmarks keep that
//! claim honest.

use criterion::{Criterion, criterion_group, criterion_main};
use pagepilot::context::PageContext;
use pagepilot::router::{RuleBasedRouter, ScoredRouter};
use std::hint::black_box;

fn sample_context() -> PageContext {
    PageContext {
        url: "https://example.com/product".to_string(),
        title: "Widget 3000 documentation".to_string(),
        visible_text: "The Widget 3000 supports three operating modes. \
            Installation requires a mounting bracket and two screws. "
            .repeat(40),
        ..Default::default()
    }
}

fn bench_rule_cascade(c: &mut Criterion) {
    let router = RuleBasedRouter::new();
    let context = sample_context();
    let queries = [
        "When is the marathon this year?",
        "Recommend a restaurant near Lisbon",
        "Who founded Meridian Analytics?",
        "Summarize this page for me",
        "Explain why the sky is blue",
    ];

    c.bench_function("rule_cascade_decide", |b| {
        b.iter(|| {
            for query in &queries {
                black_box(router.decide(black_box(query), Some(&context)));
            }
        })
    });
}

fn bench_scored_combiner(c: &mut Criterion) {
    let router = ScoredRouter::new();
    let context = sample_context();

    c.bench_function("scored_combiner_decide", |b| {
        b.iter(|| {
            black_box(router.decide(
                black_box(
                    "Analyze the current weather trends and explain the \
                    underlying atmospheric theory near Boston",
                ),
                Some(&context),
            ))
        })
    });
}

criterion_group!(benches, bench_rule_cascade, bench_scored_combiner);
criterion_main!(benches);

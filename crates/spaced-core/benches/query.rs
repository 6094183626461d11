use criterion::{black_box, criterion_group, criterion_main, Criterion};

use spaced_core::filter;
use spaced_core::model::{Item, DAY_MS};
use spaced_core::query::parse_query;
use spaced_core::scheduler::Scheduler;

const QUERY: &str = "graph company:google difficulty:medium is:due stability:<30 order:fsrs";

fn make_items(n: usize) -> Vec<Item> {
    let companies = ["google", "meta", "amazon", "apple"];
    let difficulties = ["easy", "medium", "hard"];
    (0..n)
        .map(|i| {
            let mut item = Item::new(format!("item-{i}"), format!("Graph problem {i}"), 0)
                .with_tags([
                    format!("company:{}", companies[i % companies.len()]),
                    format!("difficulty:{}", difficulties[i % difficulties.len()]),
                    "graph".to_string(),
                ]);
            if let Some(review) = item.review.as_mut() {
                review.state = spaced_core::model::CardState::Review;
                review.stability = 1.0 + (i % 50) as f64;
                review.difficulty = 5.0;
                review.reps = 3;
                review.last_review = Some(0);
                review.due = (i as i64 % 20) * DAY_MS;
            }
            item
        })
        .collect()
}

fn bench_parse(c: &mut Criterion) {
    c.bench_function("parse_query", |b| {
        b.iter(|| parse_query(black_box(Some(QUERY))))
    });
}

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_apply");
    let scheduler = Scheduler::default();
    let query = parse_query(Some(QUERY));

    for n in [100, 1_000, 10_000] {
        let items = make_items(n);
        group.bench_function(format!("n={n}"), |b| {
            b.iter(|| filter::apply(&scheduler, black_box(&items), &query, black_box(10 * DAY_MS)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_parse, bench_apply);
criterion_main!(benches);

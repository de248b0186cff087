use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use urbandict_rs::{CachePolicy, ClientConfig, MemorySource, UrbanCursor, Word};

const BASE: &str = "http://bench.invalid/v0/";
const PAGES: usize = 20;
const WORDS_PER_PAGE: u64 = 10;

fn word(id: u64) -> Word {
    Word {
        id,
        term: "bench".to_string(),
        definition: format!("definition {id} with a [link]"),
        example: format!("example {id}"),
        author: "bench".to_string(),
        written_on: Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(),
        permalink: format!("http://bench.urbanup.com/{id}"),
        thumbs_up: id,
        thumbs_down: 0,
        current_vote: String::new(),
        featured_on: None,
    }
}

fn source() -> MemorySource {
    (0..PAGES).fold(MemorySource::new(), |source, page| {
        let first = page as u64 * WORDS_PER_PAGE;
        let words = (first..first + WORDS_PER_PAGE).map(word).collect();
        source.with_page(format!("{BASE}define?term=bench&page={}", page + 1), words)
    })
}

fn bench_walk(c: &mut Criterion) {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .expect("bench runtime");
    let cases = [
        ("unbounded", CachePolicy::Unbounded),
        ("bounded_4", CachePolicy::Bounded(4)),
        ("disabled", CachePolicy::Disabled),
    ];
    for (label, cache) in cases {
        c.bench_with_input(BenchmarkId::new("walk_forward_back", label), &cache, |b, &cache| {
            b.iter(|| {
                runtime.block_on(async {
                    let config = ClientConfig {
                        api_base: BASE.to_string(),
                        cache,
                        ..ClientConfig::default()
                    };
                    let mut cursor = UrbanCursor::with_source(source(), &config);
                    cursor.define("bench").await.expect("first page");
                    while cursor.go_to_next_word().await.is_ok() {}
                    while cursor.go_to_previous_word().await.is_ok() {}
                    black_box(cursor.source().fetch_count());
                });
            });
        });
    }
}

criterion_group!(benches, bench_walk);
criterion_main!(benches);

use criterion::{criterion_group, criterion_main, Criterion};
use reshelf_engine::rules::{first_match, sample_contains};

fn make_keys(count: usize) -> Vec<String> {
    let exts = ["bak", "log", "csv", "pdf", "py", "ipynb", "bin", "txt"];
    (0..count)
        .map(|i| format!("in/dir-{}/file-{}.{}", i % 16, i, exts[i % exts.len()]))
        .collect()
}

fn bench_rule_chain(c: &mut Criterion) {
    let keys = make_keys(1024);
    c.bench_function("first_match_1024_keys", |b| {
        b.iter(|| {
            for key in &keys {
                let _ = first_match(key);
            }
        })
    });
}

fn bench_keyword_scan(c: &mut Criterion) {
    let mut sample = vec![b'x'; 4096];
    let tail = b"... ERROR: last line";
    let start = sample.len() - tail.len();
    sample[start..].copy_from_slice(tail);

    c.bench_function("sample_contains_4k", |b| {
        b.iter(|| sample_contains(&sample, &["error", "fatal"]))
    });
}

criterion_group!(benches, bench_rule_chain, bench_keyword_scan);
criterion_main!(benches);

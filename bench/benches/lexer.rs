use criterion::{criterion_group, criterion_main, Criterion};
use imprs::lexer::{lex, SUGGESTED_TOKENS_CAPACITY};
use std::hint::black_box;

static INPUT: &str = include_str!("../../demos/big.imp");

fn criterion_benchmark(c: &mut Criterion) {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY * 2);

    c.bench_function("lexer", |b| {
        b.iter(|| {
            tokens.clear();
            lex(black_box(INPUT), &mut tokens);
            black_box(&tokens);
        })
    });
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

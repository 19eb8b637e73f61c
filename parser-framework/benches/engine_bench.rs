use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use parser_framework::combinators::{choice, fold, just, seq3, token};
use parser_framework::text::{character, natural};
use parser_framework::{CharIndex, Engine, EngineConfig, Forward, Grammar, Index, Policy, TextSource};

// --- Types ---
#[derive(Debug, Clone, PartialEq)]
enum BenchToken {
    Number(u64),
    Plus,
    Star,
}

type At = Index<BenchToken>;

// --- Grammars ---
// expr := expr '+' term | term
// term := term '*' number | number
fn token_grammar() -> Grammar<At, u64> {
    let number = token::<At, u64, _>("number", |t: &BenchToken| match t {
        BenchToken::Number(n) => Some(*n),
        _ => None,
    });

    let term: Forward<At, u64> = Forward::new("term");
    term.bind(choice(vec![
        seq3(&term.grammar(), &just(BenchToken::Star), &number).map(|(a, _, b)| a.wrapping_mul(b)),
        number.clone(),
    ]))
    .unwrap();

    let expr: Forward<At, u64> = Forward::new("expr");
    expr.bind(choice(vec![
        seq3(&expr.grammar(), &just(BenchToken::Plus), &term.grammar()).map(|(a, _, b)| a.wrapping_add(b)),
        term.grammar(),
    ]))
    .unwrap();
    expr.grammar()
}

fn text_sum_grammar() -> Grammar<CharIndex, u64> {
    let expr: Forward<CharIndex, u64> = Forward::new("expr");
    expr.bind(choice(vec![
        seq3(&expr.grammar(), &character('+'), &natural()).map(|(a, _, b)| a.wrapping_add(b)),
        natural(),
    ]))
    .unwrap();
    expr.grammar()
}

// --- Data Generation ---
// "1 + 2 * 3 + 4 * 5 ..." as tokens
fn generate_tokens(count: usize) -> Vec<BenchToken> {
    let mut tokens = Vec::with_capacity(count);
    tokens.push(BenchToken::Number(1));
    let mut n = 2;
    while tokens.len() + 2 <= count {
        tokens.push(if n % 2 == 0 { BenchToken::Plus } else { BenchToken::Star });
        tokens.push(BenchToken::Number(n));
        n += 1;
    }
    tokens
}

fn bench_engine(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine");

    let size = 10_000;
    let tokens = generate_tokens(size);
    let grammar = token_grammar();
    group.throughput(Throughput::Elements(tokens.len() as u64));
    group.bench_function("left_recursive_tokens", |b| {
        b.iter(|| {
            let outcome = Engine::run(
                &grammar,
                tokens.clone().into_iter().peekable(),
                At::default(),
                EngineConfig::default(),
            )
            .unwrap();
            black_box(outcome.into_longest_success())
        })
    });

    let text = vec!["12"; size / 3].join("+");
    let sum = text_sum_grammar();
    group.throughput(Throughput::Bytes(text.len() as u64));
    group.bench_function("left_recursive_text_tracking_failures", |b| {
        b.iter(|| {
            let outcome = Engine::run(
                &sum,
                TextSource::new(text.as_str()),
                CharIndex::default(),
                EngineConfig::new(Policy::TrackFailures),
            )
            .unwrap();
            black_box(outcome.successes.len())
        })
    });

    let run = "a".repeat(size);
    let count = fold(&just::<CharIndex>('a'), 0usize, |n, _| n + 1);
    group.throughput(Throughput::Bytes(run.len() as u64));
    group.bench_function("fold_with_collection", |b| {
        b.iter(|| {
            let outcome = Engine::run(
                &count,
                run.chars().peekable(),
                CharIndex::default(),
                EngineConfig::default(),
            )
            .unwrap();
            black_box(outcome.successes.len())
        })
    });

    group.finish();
}

criterion_group!(benches, bench_engine);
criterion_main!(benches);

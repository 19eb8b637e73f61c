use parser_framework::combinators::{choice, fold, just, many, seq3};
use parser_framework::text::{character, natural};
use parser_framework::{CharIndex, Engine, EngineConfig, Forward, Grammar};

fn run_with<R: Clone + 'static>(
    grammar: &Grammar<CharIndex, R>,
    input: &str,
    config: EngineConfig,
) -> Engine<CharIndex, R> {
    let mut engine = Engine::start(grammar, CharIndex::default(), config).unwrap();
    for c in input.chars() {
        engine.feed(c).unwrap();
    }
    engine
}

#[test]
fn test_fold_keeps_live_set_constant() {
    let count = fold(&just::<CharIndex>('a'), 0usize, |n, _| n + 1);
    let input = "a".repeat(10_000);
    let engine = run_with(&count, &input, EngineConfig::default());

    let stats = engine.stats();
    assert_eq!(stats.steps, 10_000);
    assert_eq!(stats.closures_created, 10_002);
    assert!(stats.peak_live_closures <= 4, "peak was {}", stats.peak_live_closures);
    assert!(stats.collected >= 9_990);

    let outcome = engine.finish().unwrap();
    assert_eq!(outcome.into_longest_success().map(|s| s.value), Some(10_000));
}

#[test]
fn test_many_keeps_live_set_constant() {
    let root = many(&just::<CharIndex>('a'));
    let input = "a".repeat(2_000);
    let engine = run_with(&root, &input, EngineConfig::default());
    assert!(engine.closure_count() <= 4);
    assert!(engine.stats().peak_live_closures <= 4);
    assert_eq!(engine.finish().unwrap().successes.len(), 2_001);
}

#[test]
fn test_sweep_interval() {
    let root = many(&just::<CharIndex>('a'));
    let input = "a".repeat(100);

    let lazy = run_with(&root, &input, EngineConfig::default().with_gc_interval(1_000));
    assert_eq!(lazy.closure_count(), 102);
    assert_eq!(lazy.stats().collected, 0);

    let every_ten = run_with(&root, &input, EngineConfig::default().with_gc_interval(10));
    assert!(every_ten.closure_count() <= 4);
    assert!(every_ten.stats().peak_live_closures <= 4);
}

#[test]
fn test_left_recursion_live_set_is_bounded() {
    let expr: Forward<CharIndex, u64> = Forward::new("expr");
    let sum = choice(vec![
        seq3(&expr.grammar(), &character('+'), &natural()).map(|(a, _, b)| a + b),
        natural(),
    ]);
    expr.bind(sum).unwrap();

    let mut input = "1+".repeat(1_000);
    input.push('1');
    let engine = run_with(&expr.grammar(), &input, EngineConfig::default());
    assert!(
        engine.stats().peak_live_closures < 50,
        "peak was {}",
        engine.stats().peak_live_closures
    );

    let outcome = engine.finish().unwrap();
    assert_eq!(outcome.into_longest_success().map(|s| s.value), Some(1_001));
}

use parser_framework::combinators::{choice, failure, just, left, pure, seq2};
use parser_framework::text::{digit, letter, natural};
use parser_framework::{
    render_failures, CharIndex, Engine, EngineConfig, Failure, Grammar, Outcome, Policy, TextPosition, TextSource,
};
use pretty_assertions::assert_eq;

fn track<R: Clone + 'static>(grammar: &Grammar<CharIndex, R>, input: &str) -> Outcome<CharIndex, R> {
    Engine::run(
        grammar,
        input.chars().peekable(),
        CharIndex::default(),
        EngineConfig::new(Policy::TrackFailures),
    )
    .unwrap()
}

fn at(description: &str, index: usize) -> Failure<CharIndex> {
    Failure::new(description, CharIndex::new(index))
}

#[test]
fn test_sibling_failure_is_suppressed_by_success() {
    let succeeds_first = choice(vec![pure::<CharIndex, u8>(1), failure("never")]);
    let outcome = track(&succeeds_first, "");
    assert_eq!(outcome.successes.len(), 1);
    assert_eq!(outcome.failures, vec![]);

    let fails_first = choice(vec![failure("never"), pure::<CharIndex, u8>(1)]);
    let outcome = track(&fails_first, "");
    assert_eq!(outcome.successes.len(), 1);
    assert_eq!(outcome.failures, vec![]);
}

#[test]
fn test_every_failing_alternative_is_reported() {
    let root: Grammar<CharIndex, u8> = choice(vec![failure("left"), failure("right")]);
    let outcome = track(&root, "");
    assert!(outcome.successes.is_empty());
    assert_eq!(outcome.failures, vec![at("left", 0), at("right", 0)]);
}

#[test]
fn test_failures_ignored_without_tracking() {
    let root: Grammar<CharIndex, u8> = choice(vec![failure("left"), failure("right")]);
    let outcome = Engine::run(
        &root,
        "".chars().peekable(),
        CharIndex::default(),
        EngineConfig::default(),
    )
    .unwrap();
    assert_eq!(outcome.failures, vec![]);
}

#[test]
fn test_later_success_invalidates_earlier_failure() {
    let a = just::<CharIndex>('a');
    let root = choice(vec![
        seq2(&a, &just('b')).map(|_| 1),
        seq2(&a, &just('c')).map(|_| 2),
    ]);
    let outcome = track(&root, "ac");
    assert_eq!(outcome.successes.len(), 1);
    assert_eq!(outcome.failures, vec![]);

    let outcome = track(&root, "ad");
    assert_eq!(outcome.failures, vec![at("'b'", 1), at("'c'", 1)]);
}

#[test]
fn test_failure_after_partial_match() {
    let root = seq2(&letter::<CharIndex>(), &digit());
    let outcome = track(&root, "a!");
    assert_eq!(outcome.failures, vec![at("digit", 1)]);

    let outcome = track(&root, "");
    assert_eq!(outcome.failures, vec![at("letter", 0)]);
}

#[test]
fn test_failures_of_finished_repetition_are_dropped() {
    let root = left(&natural::<CharIndex>(), &just(';'));
    let outcome = track(&root, "12a");
    assert_eq!(outcome.failures, vec![at("';'", 1), at("';'", 2)]);
    assert_eq!(render_failures(&outcome.failures), "';' at 1 or ';' at 2");
}

#[test]
fn test_failures_survive_collection() {
    let root = left(&natural::<CharIndex>(), &just(';'));
    let outcome = Engine::run(
        &root,
        "123456x".chars().peekable(),
        CharIndex::default(),
        EngineConfig::new(Policy::TrackFailures).with_gc_interval(1),
    )
    .unwrap();
    assert_eq!(outcome.failures.len(), 6);
    assert_eq!(outcome.failures.first(), Some(&at("';'", 1)));
}

#[test]
fn test_failure_positions_use_text_positions() {
    let root = seq2(&letter::<TextPosition>(), &digit());
    let outcome = Engine::run(
        &root,
        TextSource::new("\nab"),
        TextPosition::new(),
        EngineConfig::new(Policy::TrackFailures),
    )
    .unwrap();
    assert_eq!(outcome.failures, vec![Failure::new("letter", TextPosition::new())]);

    let outcome = Engine::run(
        &root,
        TextSource::new("ab"),
        TextPosition::new(),
        EngineConfig::new(Policy::TrackFailures),
    )
    .unwrap();
    assert_eq!(render_failures(&outcome.failures), "digit at line 1, column 2");
}

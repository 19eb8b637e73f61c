//! Entry points that run a complete parse and select from its outcome.

use common_framework::{Position, TextSource, TokenSource};

use crate::combinators::{eof, left};
use crate::config::{EngineConfig, Policy};
use crate::engine::{Engine, Outcome, Success};
use crate::error::{ParseError, Result};
use crate::failure::{render_failures, Failure};
use crate::grammar::Grammar;

/// Either a selected result or the failures explaining why there is none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed<T, P> {
    Matched(T),
    Failed(Vec<Failure<P>>),
}

impl<T, P> Parsed<T, P> {
    pub fn is_matched(&self) -> bool {
        matches!(self, Parsed::Matched(_))
    }

    pub fn matched(self) -> Option<T> {
        match self {
            Parsed::Matched(value) => Some(value),
            Parsed::Failed(_) => None,
        }
    }

    pub fn failures(&self) -> &[Failure<P>] {
        match self {
            Parsed::Matched(_) => &[],
            Parsed::Failed(failures) => failures,
        }
    }
}

impl<T, P: std::fmt::Display> Parsed<T, P> {
    /// Converts into a `Result`, rendering the failures into
    /// [`ParseError::NoMatch`].
    pub fn into_result(self) -> Result<T> {
        match self {
            Parsed::Matched(value) => Ok(value),
            Parsed::Failed(failures) => Err(no_match(&failures)),
        }
    }
}

fn no_match<P: std::fmt::Display>(failures: &[Failure<P>]) -> ParseError {
    let expected = if failures.is_empty() {
        "no parse".to_string()
    } else {
        render_failures(failures)
    };
    ParseError::NoMatch { expected }
}

fn run<P, R, S>(grammar: &Grammar<P, R>, source: S, start: P, policy: Policy) -> Result<Outcome<P, R>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    Engine::run(grammar, source, start, EngineConfig::new(policy))
}

/// Every root success, in discovery order.
pub fn parse_all_successes<P, R, S>(grammar: &Grammar<P, R>, source: S, start: P) -> Result<Vec<Success<P, R>>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    Ok(run(grammar, source, start, Policy::SuccessOnly)?.successes)
}

/// Every root success, or every valid failure when there is none.
pub fn parse_successes_or_failures<P, R, S>(
    grammar: &Grammar<P, R>,
    source: S,
    start: P,
) -> Result<Parsed<Vec<Success<P, R>>, P>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    let outcome = run(grammar, source, start, Policy::TrackFailures)?;
    if outcome.successes.is_empty() {
        Ok(Parsed::Failed(outcome.failures))
    } else {
        Ok(Parsed::Matched(outcome.successes))
    }
}

/// The success ending furthest into the input.
pub fn parse_longest_success<P, R, S>(grammar: &Grammar<P, R>, source: S, start: P) -> Result<Option<Success<P, R>>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    Ok(run(grammar, source, start, Policy::SuccessOnly)?.into_longest_success())
}

/// The longest success, or every valid failure when there is none.
pub fn parse_longest_success_or_failures<P, R, S>(
    grammar: &Grammar<P, R>,
    source: S,
    start: P,
) -> Result<Parsed<Success<P, R>, P>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    let outcome = run(grammar, source, start, Policy::TrackFailures)?;
    let failures = outcome.failures.clone();
    Ok(match outcome.into_longest_success() {
        Some(success) => Parsed::Matched(success),
        None => Parsed::Failed(failures),
    })
}

/// The longest success, or the failure furthest into the input when there
/// is none.
pub fn parse_longest_success_or_longest_failure<P, R, S>(
    grammar: &Grammar<P, R>,
    source: S,
    start: P,
) -> Result<Parsed<Success<P, R>, P>>
where
    P: Position,
    R: Clone + 'static,
    S: TokenSource<Token = P::Token>,
{
    let outcome = run(grammar, source, start, Policy::TrackFailures)?;
    let longest_failure: Vec<Failure<P>> = outcome.longest_failure().cloned().into_iter().collect();
    Ok(match outcome.into_longest_success() {
        Some(success) => Parsed::Matched(success),
        None => Parsed::Failed(longest_failure),
    })
}

/// Parses all of `text` and returns the single result.
///
/// Fails with [`ParseError::NoMatch`] listing what was expected when nothing
/// matches the whole text, and with [`ParseError::Ambiguous`] when more than
/// one derivation does.
pub fn parse_exactly_one<P, R>(grammar: &Grammar<P, R>, text: &str) -> Result<R>
where
    P: Position<Token = char> + Default,
    R: Clone + 'static,
{
    let whole = left(grammar, &eof());
    let outcome = run(&whole, TextSource::new(text), P::default(), Policy::TrackFailures)?;
    let mut successes = outcome.successes;
    match successes.len() {
        0 => Err(no_match(&outcome.failures)),
        1 => Ok(successes.remove(0).value),
        count => Err(ParseError::Ambiguous {
            count,
            positions: successes
                .iter()
                .map(|success| success.position.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        }),
    }
}

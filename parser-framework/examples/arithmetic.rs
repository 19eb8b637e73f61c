//! Arithmetic over a left-recursive grammar.
//!
//! ```text
//! expr   := expr ('+' | '-') term | term
//! term   := term ('*' | '/') factor | factor
//! factor := natural | '(' expr ')'
//! ```
//!
//! Run with `RUST_LOG=parser_framework=trace` to watch the engine step.

use parser_framework::combinators::{choice, seq3};
use parser_framework::text::{character, natural};
use parser_framework::{
    parse_exactly_one, parse_longest_success_or_longest_failure, render_failures, Forward, Grammar, Parsed,
    TextPosition, TextSource,
};
use tracing_subscriber::{fmt, EnvFilter};

type Expr = Grammar<TextPosition, i64>;

fn binary(left: &Expr, op: char, right: &Expr, apply: fn(i64, i64) -> Option<i64>) -> Expr {
    seq3(left, &character(op), right).try_map(move |(a, _, b)| apply(a, b))
}

fn arithmetic() -> parser_framework::Result<Expr> {
    let expr: Forward<TextPosition, i64> = Forward::new("expression");
    let term: Forward<TextPosition, i64> = Forward::new("term");

    let number = natural().try_map(|n| i64::try_from(n).ok());
    let parenthesized = seq3(&character('('), &expr.grammar(), &character(')')).map(|(_, e, _)| e);
    let factor = choice(vec![number, parenthesized]).named("factor");

    term.bind(choice(vec![
        binary(&term.grammar(), '*', &factor, i64::checked_mul),
        binary(&term.grammar(), '/', &factor, i64::checked_div),
        factor,
    ]))?;
    expr.bind(choice(vec![
        binary(&expr.grammar(), '+', &term.grammar(), i64::checked_add),
        binary(&expr.grammar(), '-', &term.grammar(), i64::checked_sub),
        term.grammar(),
    ]))?;
    Ok(expr.grammar())
}

fn main() -> parser_framework::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_target(false).init();

    let grammar = arithmetic()?;

    for input in ["1+2*3", "(1+2)*3", "100-10-1", "8/2/2"] {
        let value = parse_exactly_one(&grammar, input)?;
        println!("{} = {}", input, value);
    }

    for input in ["1+*2", "(1+2", "7/0"] {
        match parse_exactly_one(&grammar, input) {
            Ok(value) => println!("{} = {}", input, value),
            Err(error) => println!("{}: {}", input, error),
        }
    }

    let input = "2*(3+4))";
    match parse_longest_success_or_longest_failure(&grammar, TextSource::new(input), TextPosition::new())? {
        Parsed::Matched(success) => println!(
            "longest prefix of {:?} is {} ending at {}",
            input, success.value, success.position
        ),
        Parsed::Failed(failures) => println!("{:?}: {}", input, render_failures(&failures)),
    }

    Ok(())
}

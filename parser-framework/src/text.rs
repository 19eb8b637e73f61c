//! Leaf grammars over character input.

use std::rc::Rc;

use common_framework::Position;

use crate::closure::ClosureRef;
use crate::combinators::{just, many1, satisfy};
use crate::context::{Context, Feed};
use crate::grammar::{Grammar, Rule};

pub fn character<P: Position<Token = char>>(expected: char) -> Grammar<P, char> {
    just(expected)
}

pub fn digit<P: Position<Token = char>>() -> Grammar<P, char> {
    satisfy("digit", char::is_ascii_digit)
}

pub fn letter<P: Position<Token = char>>() -> Grammar<P, char> {
    satisfy("letter", |c: &char| c.is_alphabetic())
}

pub fn whitespace<P: Position<Token = char>>() -> Grammar<P, char> {
    satisfy("whitespace", |c: &char| c.is_whitespace())
}

/// A non-empty run of decimal digits read as a `u64`.
///
/// Every prefix of the run is reported. A run that overflows `u64` fails.
pub fn natural<P: Position<Token = char>>() -> Grammar<P, u64> {
    many1(&digit())
        .try_map(|digits: Vec<char>| {
            digits.iter().try_fold(0u64, |acc, c| {
                let digit = u64::from(c.to_digit(10)?);
                acc.checked_mul(10)?.checked_add(digit)
            })
        })
        .named("natural")
}

struct Literal {
    text: Rc<str>,
    chars: Rc<[char]>,
}

impl<P: Position<Token = char>> Rule<P, String> for Literal {
    fn description(&self) -> String {
        format!("{:?}", self.text)
    }

    fn run(&self, closure: ClosureRef<P, String>, cx: &mut Context<P>) {
        match_from(Rc::clone(&self.text), Rc::clone(&self.chars), 0, closure, cx);
    }
}

fn match_from<P: Position<Token = char>>(
    text: Rc<str>,
    chars: Rc<[char]>,
    matched: usize,
    closure: ClosureRef<P, String>,
    cx: &mut Context<P>,
) {
    let Some(&expected) = chars.get(matched) else {
        cx.succeed(closure, text.to_string());
        return;
    };
    cx.await_token(closure, move |feed, cx| match feed {
        Feed::Token(&c) if c == expected => match_from(text, chars, matched + 1, closure, cx),
        _ => cx.fail(closure),
    });
}

/// Matches `text` exactly, one character at a time.
pub fn literal<P: Position<Token = char>>(text: &str) -> Grammar<P, String> {
    Grammar::new(Literal {
        text: Rc::from(text),
        chars: text.chars().collect(),
    })
}

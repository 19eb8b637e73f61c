//! The standard combinator library.
//!
//! Every combinator is an ordinary [`Rule`] built on the four context
//! operations. Combinators report every result they can derive: a
//! repetition reports each matched prefix, a choice reports the union of its
//! alternatives, and a sequence reports every combination of sub-results.

use std::fmt;
use std::rc::Rc;

use common_framework::Position;

use crate::closure::ClosureRef;
use crate::context::{Context, Feed};
use crate::grammar::{Grammar, GrammarNode, Rule};

fn describe_all<P: Position, R: 'static>(grammars: &[Grammar<P, R>], separator: &str) -> String {
    grammars
        .iter()
        .map(Grammar::description)
        .collect::<Vec<_>>()
        .join(separator)
}

// ---------------------------------------------------------------------------
// Leaves
// ---------------------------------------------------------------------------

struct Pure<R> {
    value: R,
}

impl<P: Position, R: Clone + 'static> Rule<P, R> for Pure<R> {
    fn description(&self) -> String {
        "pure".to_string()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        cx.succeed(closure, self.value.clone());
    }
}

/// Succeeds with `value` without consuming input.
pub fn pure<P: Position, R: Clone + 'static>(value: R) -> Grammar<P, R> {
    Grammar::new(Pure { value })
}

struct Never {
    name: String,
}

impl<P: Position, R: Clone + 'static> Rule<P, R> for Never {
    fn description(&self) -> String {
        self.name.clone()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        cx.fail(closure);
    }
}

/// Fails immediately, reporting itself as `name`.
pub fn failure<P: Position, R: Clone + 'static>(name: impl Into<String>) -> Grammar<P, R> {
    Grammar::new(Never { name: name.into() })
}

struct TokenRule<P: Position, R> {
    name: String,
    test: Rc<dyn Fn(&P::Token) -> Option<R>>,
}

impl<P: Position, R: Clone + 'static> Rule<P, R> for TokenRule<P, R> {
    fn description(&self) -> String {
        self.name.clone()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        let test = Rc::clone(&self.test);
        cx.await_token(closure, move |feed, cx| {
            match feed.token().and_then(|token| test(token)) {
                Some(value) => cx.succeed(closure, value),
                None => cx.fail(closure),
            }
        });
    }
}

/// Consumes one token and succeeds with `test(token)` when that is `Some`.
pub fn token<P, R, F>(name: impl Into<String>, test: F) -> Grammar<P, R>
where
    P: Position,
    R: Clone + 'static,
    F: Fn(&P::Token) -> Option<R> + 'static,
{
    Grammar::new(TokenRule {
        name: name.into(),
        test: Rc::new(test),
    })
}

/// Consumes one token matching `predicate`.
pub fn satisfy<P, F>(name: impl Into<String>, predicate: F) -> Grammar<P, P::Token>
where
    P: Position,
    P::Token: Clone,
    F: Fn(&P::Token) -> bool + 'static,
{
    token(name, move |token: &P::Token| predicate(token).then(|| token.clone()))
}

/// Consumes exactly the token `expected`.
pub fn just<P>(expected: P::Token) -> Grammar<P, P::Token>
where
    P: Position,
    P::Token: Clone + PartialEq + fmt::Debug,
{
    let name = format!("{:?}", expected);
    satisfy(name, move |token: &P::Token| *token == expected)
}

struct EndOfInput;

impl<P: Position> Rule<P, ()> for EndOfInput {
    fn description(&self) -> String {
        "EOF".to_string()
    }

    fn run(&self, closure: ClosureRef<P, ()>, cx: &mut Context<P>) {
        cx.await_token(closure, move |feed, cx| match feed {
            Feed::Eof => cx.succeed(closure, ()),
            Feed::Token(_) => cx.fail(closure),
        });
    }
}

/// Succeeds only when the input is exhausted; never consumes a token.
pub fn eof<P: Position>() -> Grammar<P, ()> {
    Grammar::new(EndOfInput)
}

// ---------------------------------------------------------------------------
// Transformation
// ---------------------------------------------------------------------------

struct Map<P: Position, S, R> {
    inner: Grammar<P, S>,
    f: Rc<dyn Fn(S) -> R>,
}

impl<P: Position, S: Clone + 'static, R: Clone + 'static> Rule<P, R> for Map<P, S, R> {
    fn description(&self) -> String {
        self.inner.description()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        let f = Rc::clone(&self.f);
        cx.evaluate(&self.inner, closure, move |value, cx| cx.succeed(closure, f(value)));
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.inner);
    }
}

pub fn map<P, S, R, F>(grammar: &Grammar<P, S>, f: F) -> Grammar<P, R>
where
    P: Position,
    S: Clone + 'static,
    R: Clone + 'static,
    F: Fn(S) -> R + 'static,
{
    Grammar::new(Map {
        inner: grammar.clone(),
        f: Rc::new(f),
    })
}

struct TryMap<P: Position, S, R> {
    inner: Grammar<P, S>,
    f: Rc<dyn Fn(S) -> Option<R>>,
}

impl<P: Position, S: Clone + 'static, R: Clone + 'static> Rule<P, R> for TryMap<P, S, R> {
    fn description(&self) -> String {
        self.inner.description()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        let f = Rc::clone(&self.f);
        cx.evaluate(&self.inner, closure, move |value, cx| match f(value) {
            Some(mapped) => cx.succeed(closure, mapped),
            None => cx.fail(closure),
        });
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.inner);
    }
}

/// Like [`map`], but a `None` from `f` turns that result into a failure.
pub fn try_map<P, S, R, F>(grammar: &Grammar<P, S>, f: F) -> Grammar<P, R>
where
    P: Position,
    S: Clone + 'static,
    R: Clone + 'static,
    F: Fn(S) -> Option<R> + 'static,
{
    Grammar::new(TryMap {
        inner: grammar.clone(),
        f: Rc::new(f),
    })
}

// ---------------------------------------------------------------------------
// Sequencing and alternation
// ---------------------------------------------------------------------------

struct Sequence<P: Position, R, T> {
    parts: Rc<[Grammar<P, R>]>,
    combine: Rc<dyn Fn(Vec<R>) -> T>,
}

impl<P: Position, R: Clone + 'static, T: Clone + 'static> Rule<P, T> for Sequence<P, R, T> {
    fn description(&self) -> String {
        format!("({})", describe_all(&self.parts, " "))
    }

    fn run(&self, closure: ClosureRef<P, T>, cx: &mut Context<P>) {
        sequence_from(
            Rc::clone(&self.parts),
            Rc::clone(&self.combine),
            Vec::new(),
            closure,
            cx,
        );
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        for part in self.parts.iter() {
            visitor(part);
        }
    }
}

fn sequence_from<P, R, T>(
    parts: Rc<[Grammar<P, R>]>,
    combine: Rc<dyn Fn(Vec<R>) -> T>,
    done: Vec<R>,
    closure: ClosureRef<P, T>,
    cx: &mut Context<P>,
) where
    P: Position,
    R: Clone + 'static,
    T: Clone + 'static,
{
    let Some(next) = parts.get(done.len()).cloned() else {
        cx.succeed(closure, combine(done));
        return;
    };
    cx.evaluate(&next, closure, move |value, cx| {
        let mut done = done.clone();
        done.push(value);
        sequence_from(Rc::clone(&parts), Rc::clone(&combine), done, closure, cx);
    });
}

/// Matches `parts` one after another and reports `combine` of every
/// combination of their results.
pub fn sequence<P, R, T, F>(parts: Vec<Grammar<P, R>>, combine: F) -> Grammar<P, T>
where
    P: Position,
    R: Clone + 'static,
    T: Clone + 'static,
    F: Fn(Vec<R>) -> T + 'static,
{
    Grammar::new(Sequence {
        parts: Rc::from(parts),
        combine: Rc::new(combine),
    })
}

struct Pair<P: Position, A, B> {
    first: Grammar<P, A>,
    second: Grammar<P, B>,
}

impl<P, A, B> Rule<P, (A, B)> for Pair<P, A, B>
where
    P: Position,
    A: Clone + 'static,
    B: Clone + 'static,
{
    fn description(&self) -> String {
        format!("({} {})", self.first.description(), self.second.description())
    }

    fn run(&self, closure: ClosureRef<P, (A, B)>, cx: &mut Context<P>) {
        let second = self.second.clone();
        cx.evaluate(&self.first, closure, move |a, cx| {
            cx.evaluate(&second, closure, move |b, cx| cx.succeed(closure, (a.clone(), b)));
        });
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.first);
        visitor(&self.second);
    }
}

/// Two grammars in sequence, keeping both results.
pub fn seq2<P, A, B>(first: &Grammar<P, A>, second: &Grammar<P, B>) -> Grammar<P, (A, B)>
where
    P: Position,
    A: Clone + 'static,
    B: Clone + 'static,
{
    Grammar::new(Pair {
        first: first.clone(),
        second: second.clone(),
    })
}

pub fn seq3<P, A, B, C>(
    first: &Grammar<P, A>,
    second: &Grammar<P, B>,
    third: &Grammar<P, C>,
) -> Grammar<P, (A, B, C)>
where
    P: Position,
    A: Clone + 'static,
    B: Clone + 'static,
    C: Clone + 'static,
{
    map(&seq2(&seq2(first, second), third), |((a, b), c)| (a, b, c))
}

/// Two grammars in sequence, keeping the first result.
pub fn left<P, A, B>(first: &Grammar<P, A>, second: &Grammar<P, B>) -> Grammar<P, A>
where
    P: Position,
    A: Clone + 'static,
    B: Clone + 'static,
{
    map(&seq2(first, second), |(a, _)| a)
}

/// Two grammars in sequence, keeping the second result.
pub fn right<P, A, B>(first: &Grammar<P, A>, second: &Grammar<P, B>) -> Grammar<P, B>
where
    P: Position,
    A: Clone + 'static,
    B: Clone + 'static,
{
    map(&seq2(first, second), |(_, b)| b)
}

struct Choice<P: Position, R> {
    alternatives: Vec<Grammar<P, R>>,
}

impl<P: Position, R: Clone + 'static> Rule<P, R> for Choice<P, R> {
    fn description(&self) -> String {
        format!("({})", describe_all(&self.alternatives, " | "))
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        if self.alternatives.is_empty() {
            cx.fail(closure);
            return;
        }
        for alternative in &self.alternatives {
            cx.evaluate(alternative, closure, move |value, cx| cx.succeed(closure, value));
        }
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        for alternative in &self.alternatives {
            visitor(alternative);
        }
    }
}

/// Reports the union of the results of every alternative.
pub fn choice<P: Position, R: Clone + 'static>(alternatives: Vec<Grammar<P, R>>) -> Grammar<P, R> {
    Grammar::new(Choice { alternatives })
}

struct Optional<P: Position, R> {
    inner: Grammar<P, R>,
}

impl<P: Position, R: Clone + 'static> Rule<P, Option<R>> for Optional<P, R> {
    fn description(&self) -> String {
        format!("{}?", self.inner.description())
    }

    fn run(&self, closure: ClosureRef<P, Option<R>>, cx: &mut Context<P>) {
        cx.succeed(closure, None);
        cx.evaluate(&self.inner, closure, move |value, cx| cx.succeed(closure, Some(value)));
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.inner);
    }
}

/// Reports `None` at once and `Some` for every result of `grammar`.
pub fn option<P: Position, R: Clone + 'static>(grammar: &Grammar<P, R>) -> Grammar<P, Option<R>> {
    Grammar::new(Optional {
        inner: grammar.clone(),
    })
}

// ---------------------------------------------------------------------------
// Repetition
//
// A repetition reports after every matched prefix. An element result that
// consumed nothing is reported but never repeated from again at the same
// position, otherwise a nullable element would recurse forever.
// ---------------------------------------------------------------------------

struct Repeat<P: Position, R> {
    element: Grammar<P, R>,
    min: usize,
}

impl<P: Position, R: Clone + 'static> Rule<P, Vec<R>> for Repeat<P, R> {
    fn description(&self) -> String {
        let element = self.element.description();
        match self.min {
            0 => format!("{}*", element),
            1 => format!("{}+", element),
            n => format!("{}{{{},}}", element, n),
        }
    }

    fn run(&self, closure: ClosureRef<P, Vec<R>>, cx: &mut Context<P>) {
        repeat_from(self.element.clone(), self.min, Vec::new(), closure, cx);
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.element);
    }
}

fn repeat_from<P: Position, R: Clone + 'static>(
    element: Grammar<P, R>,
    min: usize,
    items: Vec<R>,
    closure: ClosureRef<P, Vec<R>>,
    cx: &mut Context<P>,
) {
    if items.len() >= min {
        cx.succeed(closure, items.clone());
    }
    let start = cx.position().clone();
    let again = element.clone();
    cx.evaluate(&element, closure, move |value, cx| {
        let mut items = items.clone();
        items.push(value);
        if *cx.position() > start || items.len() < min {
            repeat_from(again.clone(), min, items, closure, cx);
        } else {
            cx.succeed(closure, items);
        }
    });
}

/// Zero or more repetitions of `grammar`.
///
/// Every prefix is reported as its own `Vec`, so time and memory grow with
/// the square of the repetition length. Use [`fold`] when only the
/// accumulated value of a long run is needed.
pub fn many<P: Position, R: Clone + 'static>(grammar: &Grammar<P, R>) -> Grammar<P, Vec<R>> {
    many_n(grammar, 0)
}

/// One or more repetitions of `grammar`.
pub fn many1<P: Position, R: Clone + 'static>(grammar: &Grammar<P, R>) -> Grammar<P, Vec<R>> {
    many_n(grammar, 1)
}

/// At least `min` repetitions of `grammar`.
pub fn many_n<P: Position, R: Clone + 'static>(grammar: &Grammar<P, R>, min: usize) -> Grammar<P, Vec<R>> {
    Grammar::new(Repeat {
        element: grammar.clone(),
        min,
    })
}

struct Separated<P: Position, R, D> {
    value: Grammar<P, R>,
    delimiter: Grammar<P, D>,
    allow_empty: bool,
}

impl<P, R, D> Rule<P, Vec<R>> for Separated<P, R, D>
where
    P: Position,
    R: Clone + 'static,
    D: Clone + 'static,
{
    fn description(&self) -> String {
        let value = self.value.description();
        let list = format!("{} ({} {})*", value, self.delimiter.description(), value);
        if self.allow_empty {
            format!("[{}]", list)
        } else {
            list
        }
    }

    fn run(&self, closure: ClosureRef<P, Vec<R>>, cx: &mut Context<P>) {
        if self.allow_empty {
            cx.succeed(closure, Vec::new());
        }
        let value = self.value.clone();
        let delimiter = self.delimiter.clone();
        cx.evaluate(&self.value, closure, move |first, cx| {
            separated_from(value.clone(), delimiter.clone(), vec![first], closure, cx);
        });
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.value);
        visitor(&self.delimiter);
    }
}

fn separated_from<P, R, D>(
    value: Grammar<P, R>,
    delimiter: Grammar<P, D>,
    items: Vec<R>,
    closure: ClosureRef<P, Vec<R>>,
    cx: &mut Context<P>,
) where
    P: Position,
    R: Clone + 'static,
    D: Clone + 'static,
{
    cx.succeed(closure, items.clone());
    let start = cx.position().clone();
    let again = delimiter.clone();
    cx.evaluate(&delimiter, closure, move |_, cx| {
        let items = items.clone();
        let start = start.clone();
        let next = value.clone();
        let again = again.clone();
        cx.evaluate(&value, closure, move |item, cx| {
            let mut items = items.clone();
            items.push(item);
            if *cx.position() > start {
                separated_from(next.clone(), again.clone(), items, closure, cx);
            } else {
                cx.succeed(closure, items);
            }
        });
    });
}

/// Zero or more `value`s separated by `delimiter`, reporting every valid
/// prefix list.
pub fn separated<P, R, D>(value: &Grammar<P, R>, delimiter: &Grammar<P, D>) -> Grammar<P, Vec<R>>
where
    P: Position,
    R: Clone + 'static,
    D: Clone + 'static,
{
    Grammar::new(Separated {
        value: value.clone(),
        delimiter: delimiter.clone(),
        allow_empty: true,
    })
}

/// Like [`separated`], but at least one `value` is required.
pub fn separated1<P, R, D>(value: &Grammar<P, R>, delimiter: &Grammar<P, D>) -> Grammar<P, Vec<R>>
where
    P: Position,
    R: Clone + 'static,
    D: Clone + 'static,
{
    Grammar::new(Separated {
        value: value.clone(),
        delimiter: delimiter.clone(),
        allow_empty: false,
    })
}

struct Fold<P: Position, R, A> {
    element: Grammar<P, R>,
    seed: A,
    step: Rc<dyn Fn(A, R) -> A>,
}

impl<P, R, A> Rule<P, A> for Fold<P, R, A>
where
    P: Position,
    R: Clone + 'static,
    A: Clone + 'static,
{
    fn description(&self) -> String {
        format!("{}*", self.element.description())
    }

    fn run(&self, closure: ClosureRef<P, A>, cx: &mut Context<P>) {
        fold_from(
            self.element.clone(),
            Rc::clone(&self.step),
            self.seed.clone(),
            closure,
            cx,
        );
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        visitor(&self.element);
    }
}

fn fold_from<P, R, A>(
    element: Grammar<P, R>,
    step: Rc<dyn Fn(A, R) -> A>,
    acc: A,
    closure: ClosureRef<P, A>,
    cx: &mut Context<P>,
) where
    P: Position,
    R: Clone + 'static,
    A: Clone + 'static,
{
    cx.succeed(closure, acc.clone());
    let start = cx.position().clone();
    let again = element.clone();
    cx.evaluate(&element, closure, move |value, cx| {
        let acc = step(acc.clone(), value);
        if *cx.position() > start {
            fold_from(again.clone(), Rc::clone(&step), acc, closure, cx);
        } else {
            cx.succeed(closure, acc);
        }
    });
}

/// Incremental left fold over repeated matches of `grammar`: reports `seed`
/// at once, then the accumulator after every further match.
pub fn fold<P, R, A, F>(grammar: &Grammar<P, R>, seed: A, step: F) -> Grammar<P, A>
where
    P: Position,
    R: Clone + 'static,
    A: Clone + 'static,
    F: Fn(A, R) -> A + 'static,
{
    Grammar::new(Fold {
        element: grammar.clone(),
        seed,
        step: Rc::new(step),
    })
}

// ---------------------------------------------------------------------------
// Method forms
// ---------------------------------------------------------------------------

impl<P: Position, R: Clone + 'static> Grammar<P, R> {
    pub fn map<T, F>(&self, f: F) -> Grammar<P, T>
    where
        T: Clone + 'static,
        F: Fn(R) -> T + 'static,
    {
        map(self, f)
    }

    pub fn try_map<T, F>(&self, f: F) -> Grammar<P, T>
    where
        T: Clone + 'static,
        F: Fn(R) -> Option<T> + 'static,
    {
        try_map(self, f)
    }

    pub fn then<T: Clone + 'static>(&self, next: &Grammar<P, T>) -> Grammar<P, (R, T)> {
        seq2(self, next)
    }

    pub fn then_ignore<T: Clone + 'static>(&self, next: &Grammar<P, T>) -> Grammar<P, R> {
        left(self, next)
    }

    pub fn ignore_then<T: Clone + 'static>(&self, next: &Grammar<P, T>) -> Grammar<P, T> {
        right(self, next)
    }

    pub fn or(&self, other: &Grammar<P, R>) -> Grammar<P, R> {
        choice(vec![self.clone(), other.clone()])
    }

    pub fn many(&self) -> Grammar<P, Vec<R>> {
        many(self)
    }

    pub fn many1(&self) -> Grammar<P, Vec<R>> {
        many1(self)
    }

    pub fn optional(&self) -> Grammar<P, Option<R>> {
        option(self)
    }

    pub fn separated_by<D: Clone + 'static>(&self, delimiter: &Grammar<P, D>) -> Grammar<P, Vec<R>> {
        separated(self, delimiter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_framework::CharIndex;

    #[test]
    fn test_descriptions() {
        let a: Grammar<CharIndex, char> = just('a');
        let b: Grammar<CharIndex, char> = just('b');
        assert_eq!(a.description(), "'a'");
        assert_eq!(choice(vec![a.clone(), b.clone()]).description(), "('a' | 'b')");
        assert_eq!(sequence(vec![a.clone(), b.clone()], |v| v).description(), "('a' 'b')");
        assert_eq!(many(&a).description(), "'a'*");
        assert_eq!(many1(&a).description(), "'a'+");
        assert_eq!(many_n(&a, 3).description(), "'a'{3,}");
        assert_eq!(option(&a).description(), "'a'?");
        assert_eq!(separated1(&a, &b).description(), "'a' ('b' 'a')*");
        assert_eq!(eof::<CharIndex>().description(), "EOF");
    }

    #[test]
    fn test_map_keeps_inner_description() {
        let digit: Grammar<CharIndex, char> = satisfy("digit", char::is_ascii_digit);
        assert_eq!(digit.map(|c| c as u32).description(), "digit");
    }
}

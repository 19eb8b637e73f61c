//! Grammars and the rule trait they wrap.
//!
//! A [`Grammar`] is an immutable, cheaply cloned handle around a [`Rule`].
//! Every grammar carries a process-unique [`GrammarId`]; the engine memoizes
//! evaluations by that identity, never by structure, so two grammars built by
//! separate calls are evaluated separately even when they look identical.

use std::cell::OnceCell;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common_framework::Position;

use crate::closure::ClosureRef;
use crate::context::Context;
use crate::error::{ParseError, Result};

/// Identity of a grammar node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GrammarId(usize);

impl GrammarId {
    fn fresh() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn as_usize(self) -> usize {
        self.0
    }
}

impl fmt::Display for GrammarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// The behavior behind a grammar.
///
/// `run` is called at most once per (grammar, position) pair. It must not
/// block or loop: it reacts through the [`Context`] by evaluating
/// sub-grammars, awaiting the next token, or reporting success and failure
/// for `closure`, and then returns.
pub trait Rule<P: Position, R>: 'static {
    /// Human-readable description used in diagnostics.
    fn description(&self) -> String;

    /// Starts evaluating this rule for `closure` at `cx.position()`.
    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>);

    /// Calls `visitor` for every grammar this rule evaluates directly.
    fn visit(&self, _visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {}

    /// Checks that the rule can run. Called once before a parse starts.
    fn check(&self) -> Result<()> {
        Ok(())
    }
}

/// Type-erased view of a grammar, used to walk grammar graphs.
pub trait GrammarNode<P: Position> {
    fn id(&self) -> GrammarId;

    fn description(&self) -> String;

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>));

    fn check(&self) -> Result<()>;
}

/// An immutable parsing rule producing results of type `R`.
pub struct Grammar<P: Position, R> {
    id: GrammarId,
    rule: Rc<dyn Rule<P, R>>,
}

impl<P: Position, R> Clone for Grammar<P, R> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            rule: Rc::clone(&self.rule),
        }
    }
}

impl<P: Position, R: 'static> Grammar<P, R> {
    /// Wraps a rule into a grammar with a fresh identity.
    pub fn new(rule: impl Rule<P, R>) -> Self {
        Self::from_rc(Rc::new(rule))
    }

    fn from_rc(rule: Rc<dyn Rule<P, R>>) -> Self {
        Self {
            id: GrammarId::fresh(),
            rule,
        }
    }

    pub fn id(&self) -> GrammarId {
        self.id
    }

    pub fn description(&self) -> String {
        self.rule.description()
    }

    pub(crate) fn rule(&self) -> &dyn Rule<P, R> {
        &*self.rule
    }

    /// Checks every grammar reachable from this one, following forward
    /// references, and fails on the first unbound reference.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        walk(self, &mut seen)
    }

    /// Returns a grammar with the same behavior, a new identity, and
    /// `name` as its description.
    pub fn named(&self, name: impl Into<String>) -> Self {
        Grammar::new(Named {
            name: name.into(),
            inner: Rc::clone(&self.rule),
        })
    }
}

impl<P: Position, R: 'static> GrammarNode<P> for Grammar<P, R> {
    fn id(&self) -> GrammarId {
        self.id
    }

    fn description(&self) -> String {
        self.rule.description()
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        self.rule.visit(visitor);
    }

    fn check(&self) -> Result<()> {
        self.rule.check()
    }
}

impl<P: Position, R: 'static> fmt::Debug for Grammar<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Grammar")
            .field("id", &self.id)
            .field("description", &self.description())
            .finish()
    }
}

struct Named<P: Position, R> {
    name: String,
    inner: Rc<dyn Rule<P, R>>,
}

impl<P: Position, R: 'static> Rule<P, R> for Named<P, R> {
    fn description(&self) -> String {
        self.name.clone()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        self.inner.run(closure, cx);
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        self.inner.visit(visitor);
    }

    fn check(&self) -> Result<()> {
        self.inner.check()
    }
}

fn walk<P: Position>(node: &dyn GrammarNode<P>, seen: &mut HashSet<GrammarId>) -> Result<()> {
    if !seen.insert(node.id()) {
        return Ok(());
    }
    node.check()?;
    let mut outcome = Ok(());
    node.visit(&mut |child: &dyn GrammarNode<P>| {
        if outcome.is_ok() {
            outcome = walk(child, seen);
        }
    });
    outcome
}

/// A single-assignment cell for recursive grammars.
///
/// Build the recursive graph against [`Forward::grammar`], then [`bind`]
/// the cell once. The cell is dereferenced when the grammar runs, so the
/// target may be built after the grammars that refer to it. Parsing a grammar
/// that reaches an unbound cell fails before the first token is consumed.
///
/// [`bind`]: Forward::bind
pub struct Forward<P: Position, R> {
    name: Rc<str>,
    target: Rc<OnceCell<Grammar<P, R>>>,
    grammar: Grammar<P, R>,
}

impl<P: Position, R: Clone + 'static> Forward<P, R> {
    pub fn new(name: impl Into<String>) -> Self {
        let name: Rc<str> = Rc::from(name.into());
        let target = Rc::new(OnceCell::new());
        let grammar = Grammar::new(ForwardRule {
            name: Rc::clone(&name),
            target: Rc::clone(&target),
        });
        Self {
            name,
            target,
            grammar,
        }
    }

    /// The grammar that stands in for the eventual target.
    pub fn grammar(&self) -> Grammar<P, R> {
        self.grammar.clone()
    }

    pub fn bind(&self, target: Grammar<P, R>) -> Result<()> {
        self.target
            .set(target)
            .map_err(|_| ParseError::AlreadyBound {
                name: self.name.to_string(),
            })
    }

    pub fn is_bound(&self) -> bool {
        self.target.get().is_some()
    }
}

struct ForwardRule<P: Position, R> {
    name: Rc<str>,
    target: Rc<OnceCell<Grammar<P, R>>>,
}

impl<P: Position, R: Clone + 'static> Rule<P, R> for ForwardRule<P, R> {
    fn description(&self) -> String {
        self.name.to_string()
    }

    fn run(&self, closure: ClosureRef<P, R>, cx: &mut Context<P>) {
        match self.target.get() {
            Some(target) => {
                cx.evaluate(target, closure, move |value, cx| cx.succeed(closure, value));
            }
            None => cx.abort(ParseError::UnboundReference {
                name: self.name.to_string(),
            }),
        }
    }

    fn visit(&self, visitor: &mut dyn FnMut(&dyn GrammarNode<P>)) {
        if let Some(target) = self.target.get() {
            visitor(target);
        }
    }

    fn check(&self) -> Result<()> {
        match self.target.get() {
            Some(_) => Ok(()),
            None => Err(ParseError::UnboundReference {
                name: self.name.to_string(),
            }),
        }
    }
}

//! The step context handed to grammars, handlers and continuations.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use common_framework::Position;
use tracing::{trace, warn};

use crate::closure::{AnyClosure, ClosureCell, ClosureId, ClosureRef, Handler, Lineage, React};
use crate::config::EngineConfig;
use crate::engine::EngineStats;
use crate::error::ParseError;
use crate::failure::{Failure, Recorded};
use crate::grammar::{Grammar, GrammarId};

/// What a suspended continuation is resumed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed<'a, T> {
    /// The next token of the input.
    Token(&'a T),
    /// The input is exhausted.
    Eof,
}

impl<'a, T> Feed<'a, T> {
    pub fn token(&self) -> Option<&'a T> {
        match *self {
            Feed::Token(token) => Some(token),
            Feed::Eof => None,
        }
    }
}

type Resume<P> = Box<dyn FnOnce(Feed<'_, <P as Position>::Token>, &mut Context<P>)>;

/// A computation waiting for the next token or end of input.
pub(crate) struct Continuation<P: Position> {
    pub(crate) closure: ClosureId,
    resume: Resume<P>,
}

impl<P: Position> Continuation<P> {
    pub(crate) fn resume(self, feed: Feed<'_, P::Token>, cx: &mut Context<P>) {
        (self.resume)(feed, cx)
    }
}

/// Per-position bookkeeping: at most one closure per grammar.
struct Frame<P> {
    index: usize,
    position: P,
    closures: HashMap<GrammarId, ClosureId>,
}

impl<P> Frame<P> {
    fn new(index: usize, position: P) -> Self {
        Self {
            index,
            position,
            closures: HashMap::new(),
        }
    }
}

/// Mediates closure creation and reuse, continuation bookkeeping, and result
/// and failure reporting for the current position.
///
/// Grammars never touch the engine directly: every effect of
/// [`Rule::run`](crate::Rule::run) goes through these methods.
pub struct Context<P: Position> {
    config: EngineConfig,
    frame: Frame<P>,
    arena: HashMap<ClosureId, Rc<dyn AnyClosure<P>>>,
    pub(crate) pending: Vec<Continuation<P>>,
    failures: Vec<Recorded<P>>,
    fault: Option<ParseError>,
    next_closure: usize,
    pub(crate) stats: EngineStats,
}

impl<P: Position> Context<P> {
    pub(crate) fn new(start: P, config: EngineConfig) -> Self {
        Self {
            config,
            frame: Frame::new(0, start),
            arena: HashMap::new(),
            pending: Vec::new(),
            failures: Vec::new(),
            fault: None,
            next_closure: 0,
            stats: EngineStats::default(),
        }
    }

    /// The position results reported right now end at.
    pub fn position(&self) -> &P {
        &self.frame.position
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns true once a grammar has aborted the parse.
    pub fn is_aborted(&self) -> bool {
        self.fault.is_some()
    }

    /// Evaluates `grammar` at the current position on behalf of `requester`.
    ///
    /// `on_result` is called with every result the evaluation produces,
    /// including results it already produced before this call. The grammar
    /// itself runs only the first time it is requested at this position.
    pub fn evaluate<S, R, F>(&mut self, grammar: &Grammar<P, S>, requester: ClosureRef<P, R>, on_result: F)
    where
        S: Clone + 'static,
        F: Fn(S, &mut Context<P>) + 'static,
    {
        self.subscribe(grammar, Some(requester.id()), Rc::new(on_result));
    }

    pub(crate) fn evaluate_root<R, F>(&mut self, grammar: &Grammar<P, R>, on_result: F)
    where
        R: Clone + 'static,
        F: Fn(R, &mut Context<P>) + 'static,
    {
        self.subscribe(grammar, None, Rc::new(on_result));
    }

    fn subscribe<S: Clone + 'static>(
        &mut self,
        grammar: &Grammar<P, S>,
        owner: Option<ClosureId>,
        react: React<P, S>,
    ) {
        if self.fault.is_some() {
            return;
        }
        let handler = Handler { owner, react };

        if let Some(&id) = self.frame.closures.get(&grammar.id()) {
            if let Some(cell) = self.resolve(ClosureRef::<P, S>::new(id)) {
                self.attach(&cell, handler);
            }
            return;
        }

        let id = ClosureId::new(self.next_closure);
        self.next_closure += 1;
        let lineage = if self.config.tracks_failures() {
            let parent = owner
                .and_then(|owner| self.arena.get(&owner))
                .and_then(|cell| cell.lineage().cloned());
            Some(Lineage::child_of(parent))
        } else {
            None
        };
        let cell = Rc::new(ClosureCell::new(
            id,
            grammar.clone(),
            self.frame.position.clone(),
            self.frame.index,
            lineage,
        ));
        cell.push_handler(handler);
        self.arena.insert(id, cell);
        self.frame.closures.insert(grammar.id(), id);
        self.stats.closures_created += 1;

        grammar.rule().run(ClosureRef::new(id), self);
    }

    /// Replays existing results to `handler`, then keeps it for later ones.
    fn attach<S: Clone + 'static>(&mut self, cell: &Rc<ClosureCell<P, S>>, handler: Handler<P, S>) {
        let mut index = 0;
        while let Some(value) = cell.result_at(index) {
            (handler.react)(value, self);
            if self.fault.is_some() {
                return;
            }
            index += 1;
        }
        cell.push_handler(handler);
    }

    /// Suspends `closure` until the next token or end of input arrives.
    pub fn await_token<R, F>(&mut self, closure: ClosureRef<P, R>, resume: F)
    where
        F: FnOnce(Feed<'_, P::Token>, &mut Context<P>) + 'static,
    {
        self.pending.push(Continuation {
            closure: closure.id(),
            resume: Box::new(resume),
        });
    }

    /// Reports a result for `closure`, ending at the current position.
    ///
    /// Equal values found through different derivations are all reported.
    pub fn succeed<R: Clone + 'static>(&mut self, closure: ClosureRef<P, R>, value: R) {
        if self.fault.is_some() {
            return;
        }
        let Some(cell) = self.resolve(closure) else {
            return;
        };
        for react in cell.record(value.clone(), self.frame.index) {
            react(value.clone(), self);
            if self.fault.is_some() {
                return;
            }
        }
    }

    /// Reports that `closure` cannot match from its position.
    ///
    /// Ignored unless failures are tracked. The failure is kept only while
    /// neither the closure nor any of its ancestors has succeeded.
    pub fn fail<R: 'static>(&mut self, closure: ClosureRef<P, R>) {
        if self.fault.is_some() || !self.config.tracks_failures() {
            return;
        }
        let Some(cell) = self.arena.get(&closure.id()).cloned() else {
            self.abort(ParseError::internal(format!(
                "closure {} failed after it was collected",
                closure.id()
            )));
            return;
        };
        let Some(lineage) = cell.lineage() else {
            return;
        };
        if lineage.is_valid() {
            let failure = Failure::new(cell.describe(), cell.position().clone());
            trace!(closure = %cell.id(), failure = %failure, "failure recorded");
            self.failures.push(Recorded {
                failure,
                lineage: Rc::clone(lineage),
            });
        }
    }

    /// Stops the parse with `error`. Only the first error is kept.
    pub fn abort(&mut self, error: ParseError) {
        if self.fault.is_none() {
            warn!(%error, position = %self.frame.position, "parse aborted");
            self.fault = Some(error);
        }
    }

    fn resolve<R: 'static>(&mut self, closure: ClosureRef<P, R>) -> Option<Rc<ClosureCell<P, R>>> {
        let Some(cell) = self.arena.get(&closure.id()).cloned() else {
            self.abort(ParseError::internal(format!(
                "closure {} was collected while still referenced",
                closure.id()
            )));
            return None;
        };
        match cell.into_any().downcast::<ClosureCell<P, R>>() {
            Ok(cell) => Some(cell),
            Err(_) => {
                self.abort(ParseError::internal(format!(
                    "closure {} does not produce the requested result type",
                    closure.id()
                )));
                None
            }
        }
    }

    pub(crate) fn take_fault(&mut self) -> Option<ParseError> {
        self.fault.take()
    }

    /// Starts a fresh frame for the position reached by consuming `token`.
    pub(crate) fn advance(&mut self, token: &P::Token) {
        let position = self.frame.position.next(token);
        self.frame = Frame::new(self.frame.index + 1, position);
    }

    /// Drops every closure that can no longer receive a result.
    ///
    /// Roots are the closures awaiting input and the closures of the current
    /// frame; a live closure keeps alive the owners of all its handlers.
    pub(crate) fn collect_garbage(&mut self) {
        let mut stack: Vec<ClosureId> = self
            .pending
            .iter()
            .map(|continuation| continuation.closure)
            .chain(self.frame.closures.values().copied())
            .collect();
        let mut live = HashSet::with_capacity(stack.len());
        while let Some(id) = stack.pop() {
            if !live.insert(id) {
                continue;
            }
            if let Some(cell) = self.arena.get(&id) {
                cell.push_owners(&mut stack);
            }
        }

        let before = self.arena.len();
        self.arena.retain(|id, _| live.contains(id));
        let collected = before - self.arena.len();
        self.failures.retain(Recorded::is_valid);

        self.stats.collected += collected;
        self.stats.live_closures = self.arena.len();
        self.stats.peak_live_closures = self.stats.peak_live_closures.max(self.arena.len());
        trace!(live = self.arena.len(), collected, "garbage collected");
    }

    pub(crate) fn live_closures(&self) -> usize {
        self.arena.len()
    }

    /// Valid failures in discovery order.
    pub(crate) fn take_failures(&mut self) -> Vec<Failure<P>> {
        std::mem::take(&mut self.failures)
            .into_iter()
            .filter(Recorded::is_valid)
            .map(|recorded| recorded.failure)
            .collect()
    }
}

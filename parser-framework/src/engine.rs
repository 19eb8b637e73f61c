//! The incremental engine.
//!
//! A parse moves through `Seeding → Stepping* → Draining → Done`. Seeding
//! evaluates the root grammar at the start position. Each step consumes one
//! token, opens a fresh frame at the next position and resumes every pending
//! continuation with the token. Draining resumes the remaining continuations
//! with end of input. Stepping stops early as soon as nothing is pending:
//! no later token could change the outcome.

use std::cell::RefCell;
use std::mem;
use std::rc::Rc;

use common_framework::{Position, TokenSource};
use tracing::{debug, trace};

use crate::config::EngineConfig;
use crate::context::{Context, Feed};
use crate::error::{ParseError, Result};
use crate::failure::Failure;
use crate::grammar::Grammar;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Seeding,
    Stepping,
    Draining,
    Done,
}

/// Counters describing the work an engine has done so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Tokens consumed.
    pub steps: usize,
    pub closures_created: usize,
    /// Closures collected by the reachability sweep.
    pub collected: usize,
    /// Closures alive after the most recent sweep.
    pub live_closures: usize,
    pub peak_live_closures: usize,
}

/// A root result and the position it ends at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Success<P, R> {
    pub value: R,
    pub position: P,
}

/// Everything a finished parse discovered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome<P, R> {
    /// Root successes in discovery order.
    pub successes: Vec<Success<P, R>>,
    /// Valid failures in discovery order; empty unless failures are tracked.
    pub failures: Vec<Failure<P>>,
}

impl<P: Ord, R> Outcome<P, R> {
    /// The success ending furthest into the input; the first one found wins
    /// ties.
    pub fn into_longest_success(self) -> Option<Success<P, R>> {
        longest_by(self.successes, |success| &success.position)
    }

    /// The failure furthest into the input; the first one found wins ties.
    pub fn longest_failure(&self) -> Option<&Failure<P>> {
        self.failures
            .iter()
            .fold(None, |best: Option<&Failure<P>>, failure| match best {
                Some(best) if failure.position() <= best.position() => Some(best),
                _ => Some(failure),
            })
    }
}

pub(crate) fn longest_by<T, P: Ord>(items: Vec<T>, position: impl Fn(&T) -> &P) -> Option<T> {
    let mut best: Option<T> = None;
    for item in items {
        match &best {
            Some(current) if position(&item) <= position(current) => {}
            _ => best = Some(item),
        }
    }
    best
}

/// Drives one parse of a root grammar.
///
/// Tokens are pushed with [`feed`](Engine::feed) and the parse is completed
/// with [`finish`](Engine::finish); [`run`](Engine::run) does both for a
/// [`TokenSource`].
pub struct Engine<P: Position, R> {
    cx: Context<P>,
    successes: Rc<RefCell<Vec<Success<P, R>>>>,
    phase: Phase,
}

impl<P: Position, R: Clone + 'static> Engine<P, R> {
    /// Validates `grammar` and evaluates it at `start`.
    pub fn start(grammar: &Grammar<P, R>, start: P, config: EngineConfig) -> Result<Self> {
        grammar.validate()?;
        debug!(
            grammar = %grammar.description(),
            policy = ?config.policy(),
            start = %start,
            "parse started"
        );

        let mut engine = Self {
            cx: Context::new(start, config),
            successes: Rc::new(RefCell::new(Vec::new())),
            phase: Phase::Seeding,
        };
        let sink = Rc::clone(&engine.successes);
        engine
            .cx
            .evaluate_root(grammar, move |value, cx: &mut Context<P>| {
                sink.borrow_mut().push(Success {
                    value,
                    position: cx.position().clone(),
                });
            });
        engine.check_fault()?;
        engine.phase = Phase::Stepping;
        Ok(engine)
    }

    /// Runs a complete parse over `source`.
    pub fn run<S>(grammar: &Grammar<P, R>, mut source: S, start: P, config: EngineConfig) -> Result<Outcome<P, R>>
    where
        S: TokenSource<Token = P::Token>,
    {
        let mut engine = Self::start(grammar, start, config)?;
        while engine.is_waiting() && source.has_next() {
            let Some(token) = source.next_token() else {
                break;
            };
            engine.feed(token)?;
        }
        engine.finish()
    }

    /// Consumes one token.
    ///
    /// Returns whether the engine still waits for input. Once it returns
    /// false further tokens are ignored.
    pub fn feed(&mut self, token: P::Token) -> Result<bool> {
        if self.phase != Phase::Stepping || !self.is_waiting() {
            return Ok(false);
        }

        self.cx.advance(&token);
        for continuation in mem::take(&mut self.cx.pending) {
            continuation.resume(Feed::Token(&token), &mut self.cx);
            self.check_fault()?;
        }

        self.cx.stats.steps += 1;
        if self.cx.stats.steps % self.cx.config().gc_interval() == 0 {
            self.cx.collect_garbage();
        }
        trace!(
            step = self.cx.stats.steps,
            position = %self.cx.position(),
            pending = self.cx.pending.len(),
            "step complete"
        );
        Ok(self.is_waiting())
    }

    /// Resumes every remaining continuation with end of input and returns
    /// the outcome.
    pub fn finish(mut self) -> Result<Outcome<P, R>> {
        if self.phase != Phase::Stepping {
            return Err(ParseError::internal("parse was aborted before it finished"));
        }
        self.phase = Phase::Draining;
        while !self.cx.pending.is_empty() {
            for continuation in mem::take(&mut self.cx.pending) {
                continuation.resume(Feed::Eof, &mut self.cx);
                self.check_fault()?;
            }
        }
        self.phase = Phase::Done;

        let successes = mem::take(&mut *self.successes.borrow_mut());
        let failures = self.cx.take_failures();
        debug!(
            steps = self.cx.stats.steps,
            successes = successes.len(),
            failures = failures.len(),
            closures = self.cx.stats.closures_created,
            "parse finished"
        );
        Ok(Outcome {
            successes,
            failures,
        })
    }

    /// True while at least one continuation waits for input.
    pub fn is_waiting(&self) -> bool {
        !self.cx.pending.is_empty()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn position(&self) -> &P {
        self.cx.position()
    }

    pub fn stats(&self) -> EngineStats {
        self.cx.stats
    }

    /// Closures currently held, live or not yet swept.
    pub fn closure_count(&self) -> usize {
        self.cx.live_closures()
    }

    /// Root successes found so far, in discovery order.
    pub fn successes(&self) -> Vec<Success<P, R>> {
        self.successes.borrow().clone()
    }

    fn check_fault(&mut self) -> Result<()> {
        match self.cx.take_fault() {
            Some(error) => {
                self.phase = Phase::Done;
                Err(error)
            }
            None => Ok(()),
        }
    }
}

//! Closures: memoized evaluations of one grammar at one position.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use common_framework::Position;

use crate::context::Context;
use crate::grammar::Grammar;

/// Identity of a closure within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClosureId(usize);

impl ClosureId {
    pub(crate) fn new(raw: usize) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ClosureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Typed handle to a closure producing results of type `R`.
///
/// Handles are plain identifiers: they are `Copy`, can be captured by any
/// number of continuations and handlers, and are resolved through the
/// [`Context`] each time they are used.
pub struct ClosureRef<P, R> {
    id: ClosureId,
    _types: PhantomData<fn() -> (P, R)>,
}

impl<P, R> ClosureRef<P, R> {
    pub(crate) fn new(id: ClosureId) -> Self {
        Self {
            id,
            _types: PhantomData,
        }
    }

    pub fn id(&self) -> ClosureId {
        self.id
    }
}

impl<P, R> Clone for ClosureRef<P, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<P, R> Copy for ClosureRef<P, R> {}

impl<P, R> fmt::Debug for ClosureRef<P, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClosureRef({})", self.id)
    }
}

pub(crate) type React<P, R> = Rc<dyn Fn(R, &mut Context<P>)>;

/// A subscription to a closure's results.
///
/// `owner` is the closure the callback reports into; `None` only for the
/// root handler installed by the engine.
pub(crate) struct Handler<P: Position, R> {
    pub(crate) owner: Option<ClosureId>,
    pub(crate) react: React<P, R>,
}

/// Ancestry of a closure, kept for the failure-validity rule.
///
/// Lineages outlive their closures: a recorded failure holds on to its chain
/// after the closures themselves have been collected.
#[derive(Debug)]
pub(crate) struct Lineage {
    parent: Option<Rc<Lineage>>,
    succeeded: Cell<bool>,
}

impl Lineage {
    pub(crate) fn child_of(parent: Option<Rc<Lineage>>) -> Rc<Self> {
        Rc::new(Self {
            parent,
            succeeded: Cell::new(false),
        })
    }

    pub(crate) fn mark_succeeded(&self) {
        self.succeeded.set(true);
    }

    /// True while neither this closure nor any ancestor has produced a result.
    pub(crate) fn is_valid(&self) -> bool {
        let mut node = Some(self);
        while let Some(lineage) = node {
            if lineage.succeeded.get() {
                return false;
            }
            node = lineage.parent.as_deref();
        }
        true
    }
}

struct ClosureState<P: Position, R> {
    results: Vec<R>,
    handlers: Vec<Handler<P, R>>,
}

pub(crate) struct ClosureCell<P: Position, R> {
    id: ClosureId,
    grammar: Grammar<P, R>,
    position: P,
    frame: usize,
    lineage: Option<Rc<Lineage>>,
    state: RefCell<ClosureState<P, R>>,
}

impl<P: Position, R: Clone + 'static> ClosureCell<P, R> {
    pub(crate) fn new(
        id: ClosureId,
        grammar: Grammar<P, R>,
        position: P,
        frame: usize,
        lineage: Option<Rc<Lineage>>,
    ) -> Self {
        Self {
            id,
            grammar,
            position,
            frame,
            lineage,
            state: RefCell::new(ClosureState {
                results: Vec::new(),
                handlers: Vec::new(),
            }),
        }
    }

    /// Records a result discovered during frame `frame` and returns the
    /// callbacks to notify, in registration order.
    ///
    /// Only results found while the closure's own frame is current are kept
    /// for replay: subscribers can only arrive through that frame's table.
    pub(crate) fn record(&self, value: R, frame: usize) -> Vec<React<P, R>> {
        if let Some(lineage) = &self.lineage {
            lineage.mark_succeeded();
        }
        let mut state = self.state.borrow_mut();
        if frame == self.frame {
            state.results.push(value);
        }
        state
            .handlers
            .iter()
            .map(|handler| Rc::clone(&handler.react))
            .collect()
    }

    pub(crate) fn result_at(&self, index: usize) -> Option<R> {
        self.state.borrow().results.get(index).cloned()
    }

    pub(crate) fn push_handler(&self, handler: Handler<P, R>) {
        self.state.borrow_mut().handlers.push(handler);
    }
}

/// Result-type-erased view of a closure, as stored in the engine's arena.
pub(crate) trait AnyClosure<P: Position> {
    fn id(&self) -> ClosureId;

    fn describe(&self) -> String;

    fn position(&self) -> &P;

    fn lineage(&self) -> Option<&Rc<Lineage>>;

    /// Appends the owners of every registered handler to `out`.
    fn push_owners(&self, out: &mut Vec<ClosureId>);

    fn into_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<P: Position, R: Clone + 'static> AnyClosure<P> for ClosureCell<P, R> {
    fn id(&self) -> ClosureId {
        self.id
    }

    fn describe(&self) -> String {
        self.grammar.description()
    }

    fn position(&self) -> &P {
        &self.position
    }

    fn lineage(&self) -> Option<&Rc<Lineage>> {
        self.lineage.as_ref()
    }

    fn push_owners(&self, out: &mut Vec<ClosureId>) {
        out.extend(
            self.state
                .borrow()
                .handlers
                .iter()
                .filter_map(|handler| handler.owner),
        );
    }

    fn into_any(self: Rc<Self>) -> Rc<dyn Any> {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lineage_validity_follows_ancestors() {
        let root = Lineage::child_of(None);
        let middle = Lineage::child_of(Some(Rc::clone(&root)));
        let leaf = Lineage::child_of(Some(Rc::clone(&middle)));
        assert!(leaf.is_valid());

        root.mark_succeeded();
        assert!(!leaf.is_valid());
        assert!(!middle.is_valid());
    }

    #[test]
    fn test_sibling_success_does_not_invalidate() {
        let root = Lineage::child_of(None);
        let left = Lineage::child_of(Some(Rc::clone(&root)));
        let right = Lineage::child_of(Some(Rc::clone(&root)));
        right.mark_succeeded();
        assert!(left.is_valid());
        assert!(!right.is_valid());
    }

    #[test]
    fn test_closure_id_display() {
        assert_eq!(ClosureId::new(7).to_string(), "#7");
    }
}

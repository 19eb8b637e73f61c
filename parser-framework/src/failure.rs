use std::fmt;
use std::rc::Rc;

use crate::closure::Lineage;

/// A grammar that could not match at a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure<P> {
    description: String,
    position: P,
}

impl<P> Failure<P> {
    pub fn new(description: impl Into<String>, position: P) -> Self {
        Self {
            description: description.into(),
            position,
        }
    }

    /// Description of the grammar that failed.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Position at which the failing grammar started.
    pub fn position(&self) -> &P {
        &self.position
    }
}

impl<P: fmt::Display> fmt::Display for Failure<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}", self.description, self.position)
    }
}

/// A failure together with the ancestry that decides whether it still
/// matters.
pub(crate) struct Recorded<P> {
    pub(crate) failure: Failure<P>,
    pub(crate) lineage: Rc<Lineage>,
}

impl<P> Recorded<P> {
    pub(crate) fn is_valid(&self) -> bool {
        self.lineage.is_valid()
    }
}

/// Renders failures as `"<grammar> at <position>"` joined by `" or "`.
pub fn render_failures<P: fmt::Display>(failures: &[Failure<P>]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" or ")
}

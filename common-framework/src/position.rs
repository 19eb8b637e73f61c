use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// A marker of progress through a token stream.
///
/// Positions are immutable values: consuming a token produces a new position
/// through [`Position::next`]. The total order is what the drivers use to pick
/// the "longest" of several ambiguous results, and `Display` is what ends up
/// in diagnostics.
pub trait Position: Clone + Ord + fmt::Debug + fmt::Display + 'static {
    /// The token type this position advances over.
    type Token: 'static;

    /// Returns the position reached after consuming `token`.
    fn next(&self, token: &Self::Token) -> Self;
}

/// Represents a location in source text.
///
/// Line and column are tracked for diagnostics; ordering only looks at the
/// byte offset, which grows by exactly one character per consumed token.
#[derive(Debug, Clone, Copy, Eq)]
pub struct TextPosition {
    /// Line number (1-indexed)
    pub line: usize,
    /// Column number (1-indexed)
    pub column: usize,
    /// Byte offset from the start of the input
    pub offset: usize,
}

impl TextPosition {
    /// Creates a new position at the start of the input.
    pub fn new() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// Creates a position with the given values.
    pub fn at(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line,
            column,
            offset,
        }
    }
}

impl Default for TextPosition {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TextPosition {
    fn eq(&self, other: &Self) -> bool {
        self.offset == other.offset
    }
}

impl Hash for TextPosition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.offset.hash(state);
    }
}

impl PartialOrd for TextPosition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TextPosition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.offset.cmp(&other.offset)
    }
}

impl fmt::Display for TextPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

impl Position for TextPosition {
    type Token = char;

    fn next(&self, token: &char) -> Self {
        let mut next = *self;
        if *token == '\n' {
            next.line += 1;
            next.column = 1;
        } else {
            next.column += 1;
        }
        next.offset += token.len_utf8();
        next
    }
}

/// The number of tokens consumed so far, for any token type.
///
/// Displays as the bare index, so a failure renders as `digit at 2`.
pub struct Index<T> {
    index: usize,
    _token: PhantomData<fn(&T)>,
}

impl<T> Index<T> {
    pub fn new(index: usize) -> Self {
        Self {
            index,
            _token: PhantomData,
        }
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

impl<T> Default for Index<T> {
    fn default() -> Self {
        Self::new(0)
    }
}

impl<T> Clone for Index<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Index<T> {}

impl<T> PartialEq for Index<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T> Eq for Index<T> {}

impl<T> Hash for Index<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T> PartialOrd for Index<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Index<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.index.cmp(&other.index)
    }
}

impl<T> fmt::Debug for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Index").field(&self.index).finish()
    }
}

impl<T> fmt::Display for Index<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.index)
    }
}

impl<T: 'static> Position for Index<T> {
    type Token = T;

    fn next(&self, _token: &T) -> Self {
        Self::new(self.index + 1)
    }
}

/// Index position over characters, the default for whole-text parses.
pub type CharIndex = Index<char>;

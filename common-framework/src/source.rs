use std::iter::Peekable;
use std::sync::Arc;

/// A pull-based supply of tokens.
///
/// The engine asks `has_next` before every step and consumes each token
/// exactly once through `next_token`.
pub trait TokenSource {
    type Token;

    /// Returns true if at least one more token is available.
    fn has_next(&mut self) -> bool;

    /// Consumes and returns the next token.
    fn next_token(&mut self) -> Option<Self::Token>;
}

impl<I: Iterator> TokenSource for Peekable<I> {
    type Token = I::Item;

    fn has_next(&mut self) -> bool {
        self.peek().is_some()
    }

    fn next_token(&mut self) -> Option<Self::Token> {
        self.next()
    }
}

/// A character source over a shared text buffer.
///
/// The buffer is kept behind an `Arc<str>` so a source can be created from
/// text that is also held elsewhere without copying it.
#[derive(Debug, Clone)]
pub struct TextSource {
    buffer: Arc<str>,
    current: usize,
}

impl TextSource {
    /// Creates a new source from the input string.
    pub fn new<S: Into<String>>(input: S) -> Self {
        let owned = input.into();
        Self::with_arc(Arc::<str>::from(owned))
    }

    /// Creates a source from an existing shared buffer.
    pub fn with_arc(buffer: Arc<str>) -> Self {
        Self { buffer, current: 0 }
    }

    /// Returns the current offset in bytes.
    pub fn offset(&self) -> usize {
        self.current
    }

    /// Returns the input that has not been consumed yet.
    pub fn remaining(&self) -> &str {
        &self.buffer[self.current..]
    }

    fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }
}

impl TokenSource for TextSource {
    type Token = char;

    fn has_next(&mut self) -> bool {
        self.current < self.buffer.len()
    }

    fn next_token(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.current += ch.len_utf8();
        Some(ch)
    }
}

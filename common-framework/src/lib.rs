//! Common Framework
//!
//! Positions and token sources shared by every grammar built on
//! parser-framework.

pub mod position;
pub mod source;

pub use position::{CharIndex, Index, Position, TextPosition};
pub use source::{TextSource, TokenSource};

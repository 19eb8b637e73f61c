//! Parser Framework
//!
//! An incremental, continuation-passing parser-combinator engine. Grammars are
//! composed from small combinators into a single [`Grammar`] value and driven
//! one token at a time. A parse discovers every result the grammar admits,
//! including left-recursive and ambiguous ones, and optionally the failures
//! that explain a missing result.
//!
//! ```
//! use parser_framework::{parse_exactly_one, text::natural, CharIndex};
//!
//! let number = natural::<CharIndex>();
//! assert_eq!(parse_exactly_one(&number, "12345").unwrap(), 12345);
//! ```

mod closure;
pub mod combinators;
pub mod config;
mod context;
pub mod driver;
pub mod engine;
pub mod error;
mod failure;
pub mod grammar;
pub mod text;

pub use closure::{ClosureId, ClosureRef};
pub use common_framework::{CharIndex, Index, Position, TextPosition, TextSource, TokenSource};
pub use config::{EngineConfig, Policy};
pub use context::{Context, Feed};
pub use driver::{
    parse_all_successes, parse_exactly_one, parse_longest_success, parse_longest_success_or_failures,
    parse_longest_success_or_longest_failure, parse_successes_or_failures, Parsed,
};
pub use engine::{Engine, EngineStats, Outcome, Phase, Success};
pub use error::{ParseError, Result};
pub use failure::{render_failures, Failure};
pub use grammar::{Forward, Grammar, GrammarId, GrammarNode, Rule};

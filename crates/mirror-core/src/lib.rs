//! Keyword pattern-match responder.
//!
//! Scores free text against an ordered table of categories (fraction of each
//! category's keywords found as case-insensitive substrings), picks the best
//! category or the table default, and fills that category's template.
//!
//! Zero I/O. Randomness is injected, so a seeded generator gives
//! reproducible replies.

pub mod builtin;
pub mod category;
pub mod counter;
pub mod matcher;
pub mod responder;
pub mod template;
pub mod time;

pub use builtin::{DEFAULT_CATEGORY, builtin_spec};
pub use category::{Category, CategorySpec, CategoryTable, TableError, TableSpec, Tone};
pub use counter::{CategoryCount, CounterSnapshot, InteractionCounter};
pub use matcher::{CategoryScore, Classification, classify, fold_case, score};
pub use responder::{DEFAULT_SUBJECT, Rendered, Responder, Response};
pub use template::{Placeholder, RenderContext, Template, TemplateError};
pub use time::Timestamp;

//! Token system for Lys lexical analysis
//!
//! The tokenizer in [`crate::lexical`] produces [`Token`]s on demand. The
//! parser consumes them through a [`TokenCursor`], which adds nested revert
//! points on top of any [`TokenSource`].
//!
//! ## Key Components
//!
//! - **[`TokenKind`]** - closed set of operator, punctuation, name and literal kinds
//! - **[`TokenValue`]** - payload of names, strings and numeric literals
//! - **[`RawInt`] / [`RawFloat`]** - numeric literals kept as digit strings,
//!   so bit-width and signedness suffixes can pick the static type later
//! - **[`TokenCursor`]** - single-token view with checkpoint / revert / commit

pub mod cursor;
pub mod literal;
pub mod token;

pub use cursor::{TokenCursor, TokenSource};
pub use literal::{IntBase, RawFloat, RawInt};
pub use token::{Token, TokenKind, TokenValue};

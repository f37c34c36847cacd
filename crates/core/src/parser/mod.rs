//! Content stream parsing.

pub mod lexer;

pub use lexer::{ContentLexer, Token, tokenize};

//! Lexical analysis for template source.

mod cursor;
mod error;
mod lexer;
mod token;

pub use error::LexerError;
pub use lexer::Lexer;
pub use token::{Token, TokenKind};

//! Template parser crate.
//!
//! This crate provides the lexer, the syntax tree and the parser for the
//! `{{ ... }}` action language of Go-style text and HTML templates.
//! It includes:
//! - Lexical analysis (text runs, actions, trim markers, comments)
//! - The [`Node`] sum type and [`Tree`]
//! - A [`Parser`] producing one tree per template defined in a source
//!
//! # Example
//!
//! ```
//! use tmplcheck_parser::Parser;
//!
//! let source = r#"
//!     {{define "user"}}{{.Name}} <{{.Email}}>{{end}}
//!     {{range .Users}}{{template "user" .}}{{end}}
//! "#;
//!
//! match Parser::parse("users.gohtml", source) {
//!     Ok(trees) => println!("parsed {} templates", trees.len()),
//!     Err(error) => eprintln!("{}", error.display_with_source(source)),
//! }
//! ```

pub mod ast;
pub mod lexer;

pub use ast::{
    ActionNode, BoolNode, BranchNode, ChainNode, CommandNode, CommentNode, FieldNode, Ident,
    IdentifierNode, ListNode, Node, NumberKind, NumberNode, Parser, PipeNode, StringNode,
    TemplateNode, TextNode, Tree, VariableNode,
};
pub use lexer::{Lexer, Token, TokenKind};
pub use tmplcheck_core::{ParseError, ParseErrorKind};

//! Syntax tree for template source.
//!
//! This module provides:
//! - node definitions ([`Node`] and one struct per node kind)
//! - [`Tree`], a named template root
//! - the [`Parser`] that builds trees from source
//!
//! # Example
//!
//! ```
//! use tmplcheck_parser::{Node, Parser};
//!
//! let trees = Parser::parse("greeting", "Hello, {{.User.Name}}!").unwrap();
//! let tree = &trees[0];
//! assert_eq!(tree.name, "greeting");
//! assert!(matches!(tree.root.nodes[1], Node::Action(_)));
//! ```

mod literal;
mod node;
mod parser;
mod pipe_parser;
mod tree;

pub use literal::{NumberKind, unquote_char, unquote_string};
pub use node::*;
pub use parser::Parser;
pub use tree::Tree;

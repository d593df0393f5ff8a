//! Parsed templates.

use std::fmt;

use tmplcheck_core::{Location, Span};

use super::node::ListNode;

/// Longest node text shown in error context before it is elided.
const CONTEXT_LIMIT: usize = 20;

/// One named template: a root list plus the source it was parsed from.
#[derive(Debug, Clone, PartialEq)]
pub struct Tree {
    /// Template name, as used by `{{template "name"}}`.
    pub name: String,
    /// Name of the source the tree was parsed from.
    pub parse_name: String,
    pub root: ListNode,
}

impl Tree {
    pub fn new(name: impl Into<String>, parse_name: impl Into<String>, root: ListNode) -> Self {
        Self {
            name: name.into(),
            parse_name: parse_name.into(),
            root,
        }
    }

    /// Resolve a node position against this tree's source.
    pub fn location(&self, span: Span) -> Location {
        Location::new(self.parse_name.clone(), span)
    }

    /// Source text of a node or pipeline, elided for diagnostics.
    pub fn context_text(node: &impl fmt::Display) -> String {
        let mut context = node.to_string();
        if let Some((cut, _)) = context.char_indices().nth(CONTEXT_LIMIT) {
            context.truncate(cut);
            context.push_str("...");
        }
        context
    }

    /// Whether the tree renders nothing but whitespace.
    pub fn is_blank(&self) -> bool {
        self.root.is_blank()
    }
}

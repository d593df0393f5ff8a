//! The node walker.
//!
//! A [`Walker`] runs one check. It threads three things through the tree:
//! the current dot type, the variable [`Scope`], and for pipeline stages the
//! result of the preceding stage. Every node yields a type or the first
//! error found, which aborts the walk.
//!
//! The walk is split by node family:
//! - `pipe`: pipelines, commands and argument values
//! - `chain`: dotted field and method chains
//! - `control`: `if`, `with` and `range`
//! - `template`: sub-template calls
//! - `literals`: constant operands

mod chain;
mod control;
mod literals;
mod pipe;
mod template;

use std::fmt;

use tmplcheck_core::{CheckError, CheckErrorKind, Span, TypeId, TypeSystem};
use tmplcheck_parser::{ListNode, Node, Tree};
use tmplcheck_registry::{FunctionRegistry, TreeFinder};

use crate::scope::Scope;
use crate::Checker;

pub(crate) use pipe::DeclMode;

/// State of one check.
pub(crate) struct Walker<'a> {
    types: &'a dyn TypeSystem,
    functions: &'a FunctionRegistry,
    trees: &'a dyn TreeFinder,
    max_depth: usize,
    /// Templates being checked, outermost first, with the dot each was
    /// entered with.
    stack: Vec<(String, TypeId)>,
}

impl<'a> Walker<'a> {
    pub(crate) fn new(checker: &Checker<'a>) -> Self {
        Self {
            types: checker.types,
            functions: checker.functions,
            trees: checker.trees,
            max_depth: checker.options.max_template_depth,
            stack: Vec::new(),
        }
    }

    /// Check a whole tree with `dot` as its initial dot.
    pub(crate) fn check_tree(&mut self, tree: &Tree, dot: TypeId) -> Result<(), CheckError> {
        self.stack.push((tree.name.clone(), dot));
        let mut scope = Scope::new(dot);
        let result = self.walk_list(tree, dot, &mut scope, &tree.root);
        self.stack.pop();
        result.map(|_| ())
    }

    /// Walk the nodes of a list in order. The list itself yields the dot.
    fn walk_list(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        list: &ListNode,
    ) -> Result<TypeId, CheckError> {
        for node in &list.nodes {
            self.walk(tree, dot, scope, node)?;
        }
        Ok(dot)
    }

    /// Compute the type of one node.
    fn walk(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        node: &Node,
    ) -> Result<TypeId, CheckError> {
        match node {
            Node::Text(_) | Node::Comment(_) | Node::Break(_) | Node::Continue(_) => Ok(dot),
            Node::List(list) => self.walk_list(tree, dot, scope, list),
            Node::Action(action) => self.walk_pipe(tree, dot, scope, &action.pipe, DeclMode::Bind),
            Node::Pipe(pipe) => self.walk_pipe(tree, dot, scope, pipe, DeclMode::Bind),
            Node::Command(cmd) => self.walk_command(tree, dot, scope, cmd, None),
            Node::If(branch) => self.walk_if(tree, dot, scope, branch),
            Node::With(branch) => self.walk_with(tree, dot, scope, branch),
            Node::Range(branch) => self.walk_range(tree, dot, scope, branch),
            Node::Template(call) => self.walk_template(tree, dot, scope, call),
            Node::Field(_)
            | Node::Chain(_)
            | Node::Variable(_)
            | Node::Identifier(_)
            | Node::Dot(_)
            | Node::Nil(_)
            | Node::Bool(_)
            | Node::String(_)
            | Node::Number(_) => self.eval_arg(tree, dot, scope, node),
        }
    }

    /// Locate a failure at `span`, quoting `context`.
    fn error(
        &self,
        tree: &Tree,
        span: Span,
        context: &dyn fmt::Display,
        kind: CheckErrorKind,
    ) -> CheckError {
        CheckError::new(
            kind,
            tree.name.clone(),
            Tree::context_text(&context),
            tree.location(span),
        )
    }
}

//! Pipelines, commands and argument values.

use tmplcheck_core::{CheckError, CheckErrorKind, TypeId};
use tmplcheck_parser::{CommandNode, Node, PipeNode, Tree};

use super::Walker;
use super::chain::CallArgs;
use crate::scope::Scope;

/// What a pipeline does with its declared variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeclMode {
    /// Bind the declared names to the pipeline's value, or to its parts
    /// when the value is a container.
    Bind,
    /// Leave declarations to the caller (`range` binds container parts).
    Defer,
}

impl Walker<'_> {
    /// Check a pipeline. Each stage after the first receives the previous
    /// stage's result as its final argument.
    pub(super) fn walk_pipe(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        pipe: &PipeNode,
        mode: DeclMode,
    ) -> Result<TypeId, CheckError> {
        let mut prev = None;
        for cmd in &pipe.cmds {
            prev = Some(self.walk_command(tree, dot, scope, cmd, prev)?);
        }
        let result = prev.unwrap_or(dot);

        if mode == DeclMode::Defer || pipe.decl.is_empty() {
            return Ok(result);
        }
        if pipe.is_assign {
            for ident in &pipe.decl {
                scope
                    .assign(self.types, &ident.name, result)
                    .map_err(|kind| self.error(tree, ident.span, pipe, kind))?;
            }
        } else {
            let names: Vec<&str> = pipe.decl.iter().map(|ident| ident.name.as_str()).collect();
            scope
                .declare(self.types, names.as_slice(), result)
                .map_err(|kind| self.error(tree, pipe.span, pipe, kind))?;
        }
        Ok(result)
    }

    /// Check one pipeline stage, dispatching on its first operand.
    pub(super) fn walk_command(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        cmd: &CommandNode,
        prev: Option<TypeId>,
    ) -> Result<TypeId, CheckError> {
        let Some((first, rest)) = cmd.args.split_first() else {
            return Ok(prev.unwrap_or(dot));
        };
        let call = CallArgs { nodes: rest, prev };

        match first {
            Node::Field(field) => {
                self.resolve_chain(tree, dot, scope, cmd, dot, &field.idents, call)
            }
            Node::Chain(chain) => {
                let base = self.eval_arg(tree, dot, scope, &chain.node)?;
                self.resolve_chain(tree, dot, scope, cmd, base, &chain.fields, call)
            }
            Node::Variable(var) => {
                let base = self.variable(tree, scope, var.name(), first)?;
                if var.fields().is_empty() {
                    self.expect_no_arguments(tree, first, call)?;
                    return Ok(base);
                }
                self.resolve_chain(tree, dot, scope, cmd, base, var.fields(), call)
            }
            Node::Identifier(ident) => {
                let arg_types = self.arg_types(tree, dot, scope, call)?;
                self.functions
                    .check_call(self.types, &ident.name, rest, &arg_types)
                    .map_err(|kind| self.error(tree, ident.span, cmd, kind))
            }
            Node::Pipe(pipe) => {
                self.expect_no_arguments(tree, first, call)?;
                self.walk_pipe(tree, dot, scope, pipe, DeclMode::Bind)
            }
            _ => {
                self.expect_no_arguments(tree, first, call)?;
                self.eval_arg(tree, dot, scope, first)
            }
        }
    }

    /// Type of an operand used as a value rather than called with arguments.
    pub(super) fn eval_arg(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        node: &Node,
    ) -> Result<TypeId, CheckError> {
        match node {
            Node::Dot(_) => Ok(dot),
            Node::Field(field) => {
                self.resolve_chain(tree, dot, scope, node, dot, &field.idents, CallArgs::NONE)
            }
            Node::Chain(chain) => {
                let base = self.eval_arg(tree, dot, scope, &chain.node)?;
                self.resolve_chain(tree, dot, scope, node, base, &chain.fields, CallArgs::NONE)
            }
            Node::Variable(var) => {
                let base = self.variable(tree, scope, var.name(), node)?;
                if var.fields().is_empty() {
                    return Ok(base);
                }
                self.resolve_chain(tree, dot, scope, node, base, var.fields(), CallArgs::NONE)
            }
            Node::Identifier(ident) => self
                .functions
                .check_call(self.types, &ident.name, &[], &[])
                .map_err(|kind| self.error(tree, ident.span, node, kind)),
            Node::Pipe(pipe) => self.walk_pipe(tree, dot, scope, pipe, DeclMode::Bind),
            Node::Bool(_) | Node::String(_) | Node::Number(_) | Node::Nil(_) => {
                self.literal(tree, node)
            }
            _ => Err(self.error(
                tree,
                node.span(),
                node,
                CheckErrorKind::NotAFunction {
                    node: node.to_string(),
                },
            )),
        }
    }

    /// Types of call arguments, with the preceding stage's result last.
    pub(super) fn arg_types(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        call: CallArgs<'_>,
    ) -> Result<Vec<TypeId>, CheckError> {
        let mut types = Vec::with_capacity(call.nodes.len() + 1);
        for arg in call.nodes {
            types.push(self.eval_arg(tree, dot, scope, arg)?);
        }
        types.extend(call.prev);
        Ok(types)
    }

    fn variable(
        &self,
        tree: &Tree,
        scope: &Scope,
        name: &str,
        node: &Node,
    ) -> Result<TypeId, CheckError> {
        scope.lookup(name).ok_or_else(|| {
            self.error(
                tree,
                node.span(),
                node,
                CheckErrorKind::UndefinedVariable {
                    name: name.to_string(),
                },
            )
        })
    }

    /// Operands that are not functions cannot take arguments.
    fn expect_no_arguments(
        &self,
        tree: &Tree,
        node: &Node,
        call: CallArgs<'_>,
    ) -> Result<(), CheckError> {
        if call.is_empty() {
            return Ok(());
        }
        Err(self.error(
            tree,
            node.span(),
            node,
            CheckErrorKind::NotAFunction {
                node: node.to_string(),
            },
        ))
    }
}

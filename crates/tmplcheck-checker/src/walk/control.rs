//! `if`, `with` and `range`.

use tmplcheck_core::{ChanDir, CheckError, CheckErrorKind, TypeData, TypeId};
use tmplcheck_parser::{BranchNode, Tree};

use super::{DeclMode, Walker};
use crate::scope::{Scope, decompose};

impl Walker<'_> {
    /// The condition is checked in the enclosing scope; both bodies run in
    /// their own child scope with the same dot.
    pub(super) fn walk_if(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        branch: &BranchNode,
    ) -> Result<TypeId, CheckError> {
        self.walk_pipe(tree, dot, scope, &branch.pipe, DeclMode::Bind)?;
        self.walk_list(tree, dot, &mut scope.child(), &branch.list)?;
        if let Some(else_list) = &branch.else_list {
            self.walk_list(tree, dot, &mut scope.child(), else_list)?;
        }
        Ok(dot)
    }

    /// The body sees the condition's value as dot; `else` keeps the
    /// original dot.
    pub(super) fn walk_with(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        branch: &BranchNode,
    ) -> Result<TypeId, CheckError> {
        let mut inner = scope.child();
        let value = self.walk_pipe(tree, dot, &mut inner, &branch.pipe, DeclMode::Bind)?;
        let new_dot = self.types.concretize(value);

        self.walk_list(tree, new_dot, &mut inner.child(), &branch.list)?;
        if let Some(else_list) = &branch.else_list {
            self.walk_list(tree, dot, &mut inner.child(), else_list)?;
        }
        Ok(dot)
    }

    /// Both the body and `else` see the element type as dot.
    pub(super) fn walk_range(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        branch: &BranchNode,
    ) -> Result<TypeId, CheckError> {
        let pipe = &branch.pipe;
        let mut inner = scope.child();
        let ranged = self.walk_pipe(tree, dot, &mut inner, pipe, DeclMode::Defer)?;
        let container = self.types.deref(ranged);

        let elem = match self.types.data(self.types.underlying(container)) {
            TypeData::Slice(elem) | TypeData::Array { elem, .. } | TypeData::Map { elem, .. } => {
                *elem
            }
            TypeData::Chan { dir, elem } if *dir != ChanDir::Send => *elem,
            _ => {
                return Err(self.error(
                    tree,
                    pipe.span,
                    pipe,
                    CheckErrorKind::CannotRange {
                        type_name: self.types.type_name(ranged),
                    },
                ));
            }
        };

        if !pipe.decl.is_empty() {
            let names: Vec<&str> = pipe.decl.iter().map(|ident| ident.name.as_str()).collect();
            let bound = if pipe.is_assign {
                decompose(self.types, names.len(), ranged).and_then(|parts| {
                    names
                        .iter()
                        .zip(parts)
                        .try_for_each(|(name, ty)| inner.assign(self.types, name, ty))
                })
            } else {
                inner.declare(self.types, names.as_slice(), ranged)
            };
            bound.map_err(|kind| self.error(tree, pipe.span, pipe, kind))?;
        }

        self.walk_list(tree, elem, &mut inner.child(), &branch.list)?;
        if let Some(else_list) = &branch.else_list {
            self.walk_list(tree, elem, &mut inner.child(), else_list)?;
        }
        Ok(dot)
    }
}

//! `{{template "name" pipeline}}`.

use tmplcheck_core::{BasicKind, CheckError, CheckErrorKind, TypeId};
use tmplcheck_parser::{TemplateNode, Tree};
use tracing::trace;

use super::{DeclMode, Walker};
use crate::scope::Scope;

impl Walker<'_> {
    /// Check the called template with the pipeline's value as its dot.
    ///
    /// The callee starts from a fresh scope holding only `$`. A call with a
    /// (template, dot) pair already on the stack is recursion and is not
    /// walked again.
    pub(super) fn walk_template(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        call: &TemplateNode,
    ) -> Result<TypeId, CheckError> {
        let value = match &call.pipe {
            Some(pipe) => self.walk_pipe(tree, dot, scope, pipe, DeclMode::Bind)?,
            None => self.types.basic(BasicKind::UntypedNil),
        };
        let new_dot = self.types.concretize(value);

        let trees = self.trees;
        let Some(target) = trees.find_tree(&call.name) else {
            return Err(self.template_error(
                tree,
                call,
                CheckErrorKind::TemplateNotFound {
                    name: call.name.clone(),
                },
            ));
        };

        let recursive = self
            .stack
            .iter()
            .any(|(name, entered)| *name == call.name && *entered == new_dot);
        if recursive {
            trace!(template = %call.name, "recursive template call already being checked");
            return Ok(dot);
        }
        if self.stack.len() > self.max_depth {
            return Err(self.template_error(
                tree,
                call,
                CheckErrorKind::TemplateDepthExceeded {
                    name: call.name.clone(),
                    limit: self.max_depth,
                },
            ));
        }

        trace!(
            template = %call.name,
            dot = %self.types.type_name(new_dot),
            depth = self.stack.len(),
            "checking called template"
        );
        self.stack.push((call.name.clone(), new_dot));
        let result = self.walk_list(target, new_dot, &mut Scope::new(new_dot), &target.root);
        self.stack.pop();
        result.map(|_| dot)
    }

    fn template_error(&self, tree: &Tree, call: &TemplateNode, kind: CheckErrorKind) -> CheckError {
        self.error(
            tree,
            call.span,
            &format!("template {:?}", call.name),
            kind,
        )
    }
}

//! Dotted chains: `.A.B`, `$x.A.B`, `(pipeline).A.B`.
//!
//! Each identifier is resolved against the type produced by the one before
//! it. Pointers are looked through, maps are indexed by the identifier, and
//! everything else goes through field-or-method lookup.

use std::fmt;

use tmplcheck_core::{BasicInfo, CheckError, CheckErrorKind, Member, Signature, TypeData, TypeId};
use tmplcheck_parser::{Ident, Node, Tree};
use tmplcheck_registry::{check_arguments, check_results};

use super::Walker;
use crate::scope::Scope;

/// Arguments supplied to the last element of a chain.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallArgs<'n> {
    /// Operands written after the chain in its command.
    pub nodes: &'n [Node],
    /// Result of the preceding pipeline stage.
    pub prev: Option<TypeId>,
}

impl CallArgs<'_> {
    pub const NONE: CallArgs<'static> = CallArgs {
        nodes: &[],
        prev: None,
    };

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.prev.is_none()
    }
}

impl Walker<'_> {
    /// Resolve `idents` starting from `receiver`. Only the last identifier
    /// may receive `call`.
    #[allow(clippy::too_many_arguments)]
    pub(super) fn resolve_chain(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        context: &dyn fmt::Display,
        receiver: TypeId,
        idents: &[Ident],
        call: CallArgs<'_>,
    ) -> Result<TypeId, CheckError> {
        let mut current = receiver;

        for (i, ident) in idents.iter().enumerate() {
            let is_last = i + 1 == idents.len();
            let base = self.types.deref(current);

            if let TypeData::Map { key, elem } = self.types.data(self.types.underlying(base)) {
                let (key, elem) = (*key, *elem);
                self.check_map_key(key, base, ident)
                    .map_err(|kind| self.error(tree, ident.span, context, kind))?;
                if is_last && !call.is_empty() {
                    return self.call_value(tree, dot, scope, context, ident, elem, call);
                }
                current = elem;
                continue;
            }

            if !self.types.is_exported(&ident.name) {
                return Err(self.error(
                    tree,
                    ident.span,
                    context,
                    CheckErrorKind::Unexported {
                        name: ident.name.clone(),
                        type_name: self.types.type_name(current),
                    },
                ));
            }

            let Some(member) = self.types.lookup_field_or_method(current, &ident.name) else {
                return Err(self.error(
                    tree,
                    ident.span,
                    context,
                    CheckErrorKind::FieldNotFound {
                        name: ident.name.clone(),
                        type_name: self.types.type_name(current),
                    },
                ));
            };

            current = match member {
                Member::Method { signature } => {
                    let Some(sig) = self.types.signature(signature).cloned() else {
                        return Err(self.error(
                            tree,
                            ident.span,
                            context,
                            CheckErrorKind::NotCallable {
                                type_name: self.types.type_name(signature),
                            },
                        ));
                    };
                    let args = if is_last { call } else { CallArgs::NONE };
                    self.check_callable(tree, dot, scope, context, ident, &sig, args)?
                }
                Member::Field { ty } => {
                    if is_last && !call.is_empty() {
                        return self.call_value(tree, dot, scope, context, ident, ty, call);
                    }
                    if !is_last && self.types.signature(ty).is_some() {
                        let next = &idents[i + 1];
                        return Err(self.error(
                            tree,
                            next.span,
                            context,
                            CheckErrorKind::CallableField {
                                name: next.name.clone(),
                                type_name: self.types.type_name(ty),
                            },
                        ));
                    }
                    ty
                }
            };
        }

        Ok(current)
    }

    /// Call a field or map value of function type; anything else cannot
    /// take arguments.
    #[allow(clippy::too_many_arguments)]
    fn call_value(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        context: &dyn fmt::Display,
        ident: &Ident,
        value: TypeId,
        call: CallArgs<'_>,
    ) -> Result<TypeId, CheckError> {
        let Some(sig) = self.types.signature(value).cloned() else {
            return Err(self.field_arguments(tree, ident, context));
        };
        self.check_callable(tree, dot, scope, context, ident, &sig, call)
    }

    /// Validate a callable's results and arguments; yields its first result.
    #[allow(clippy::too_many_arguments)]
    fn check_callable(
        &mut self,
        tree: &Tree,
        dot: TypeId,
        scope: &mut Scope,
        context: &dyn fmt::Display,
        ident: &Ident,
        signature: &Signature,
        call: CallArgs<'_>,
    ) -> Result<TypeId, CheckError> {
        let result = check_results(self.types, &ident.name, signature)
            .map_err(|kind| self.error(tree, ident.span, context, kind))?;
        let arg_types = self.arg_types(tree, dot, scope, call)?;
        check_arguments(self.types, &ident.name, signature, &arg_types)
            .map_err(|kind| self.error(tree, ident.span, context, kind))?;
        Ok(result)
    }

    /// Field names index maps with string keys; integer keys need a numeric
    /// name.
    fn check_map_key(&self, key: TypeId, map: TypeId, ident: &Ident) -> Result<(), CheckErrorKind> {
        let numeric = !ident.name.is_empty() && ident.name.bytes().all(|b| b.is_ascii_digit());
        let info = self.types.basic_kind(key).map(|kind| kind.info());
        match info {
            Some(info) if info.contains(BasicInfo::STRING) => Ok(()),
            Some(info) if info.contains(BasicInfo::INTEGER) && numeric => Ok(()),
            _ => Err(CheckErrorKind::MapKey {
                key: ident.name.clone(),
                type_name: self.types.type_name(map),
            }),
        }
    }

    fn field_arguments(
        &self,
        tree: &Tree,
        ident: &Ident,
        context: &dyn fmt::Display,
    ) -> CheckError {
        self.error(
            tree,
            ident.span,
            context,
            CheckErrorKind::FieldArguments {
                name: ident.name.clone(),
            },
        )
    }
}

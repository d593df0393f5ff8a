//! Variable scope for template checking.
//!
//! A [`Scope`] maps `$`-names to the types they hold. It always binds `$` to
//! the dot the template was entered with.
//!
//! Branch bodies and sub-template calls work on independent copies made with
//! [`Scope::child`]; declarations inside them never reach the parent. A
//! declaration made directly in a pipeline lands in the scope the pipeline
//! was checked in and stays visible for the rest of it.

use rustc_hash::FxHashMap;
use tmplcheck_core::{BasicKind, ChanDir, CheckErrorKind, TypeData, TypeId, TypeSystem};

// ============================================================================
// Scope
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    variables: FxHashMap<String, TypeId>,
}

impl Scope {
    /// Create a scope with `$` bound to `dot`.
    pub fn new(dot: TypeId) -> Self {
        let mut variables = FxHashMap::default();
        variables.insert("$".to_string(), dot);
        Self { variables }
    }

    /// An independent copy for a nested body.
    pub fn child(&self) -> Self {
        self.clone()
    }

    /// Type of a variable.
    pub fn lookup(&self, name: &str) -> Option<TypeId> {
        self.variables.get(name).copied()
    }

    /// Number of bound variables, including `$`.
    pub fn len(&self) -> usize {
        self.variables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty()
    }

    /// Bind the names of a declaration: `{{$x := pipeline}}`,
    /// `{{range $i, $e := pipeline}}`.
    ///
    /// | Result        | One name | Two names        |
    /// |---------------|----------|------------------|
    /// | slice, array  | element  | (int, element)   |
    /// | map           | element  | (key, element)   |
    /// | channel       | element  | (int, element)   |
    /// | anything else | value    | error            |
    pub fn declare<S: AsRef<str>>(
        &mut self,
        types: &dyn TypeSystem,
        names: &[S],
        result: TypeId,
    ) -> Result<(), CheckErrorKind> {
        let bound = decompose(types, names.len(), result)?;
        for (name, ty) in names.iter().zip(bound) {
            self.variables.insert(name.as_ref().to_string(), ty);
        }
        Ok(())
    }

    /// Assign to an existing variable: `{{$x = pipeline}}`.
    ///
    /// The variable keeps its declared type; the new value must be
    /// assignable to it.
    pub fn assign(
        &mut self,
        types: &dyn TypeSystem,
        name: &str,
        ty: TypeId,
    ) -> Result<(), CheckErrorKind> {
        let Some(declared) = self.lookup(name) else {
            return Err(CheckErrorKind::UndefinedVariable {
                name: name.to_string(),
            });
        };
        if types.assignable(ty, declared) {
            Ok(())
        } else {
            Err(CheckErrorKind::NotAssignable {
                what: format!("assignment to {name}"),
                expected: types.type_name(declared),
                found: types.type_name(ty),
            })
        }
    }
}

/// Split a container type into the types bound by `count` names.
pub(crate) fn decompose(
    types: &dyn TypeSystem,
    count: usize,
    result: TypeId,
) -> Result<Vec<TypeId>, CheckErrorKind> {
    let base = types.deref(result);
    let int = types.basic(BasicKind::Int);

    let parts = match types.data(types.underlying(base)) {
        TypeData::Slice(_) | TypeData::Array { .. } => types.elem(base).map(|elem| (int, elem)),
        TypeData::Map { .. } => types.key(base).zip(types.elem(base)),
        TypeData::Chan { dir, .. } if *dir != ChanDir::Send => {
            types.elem(base).map(|elem| (int, elem))
        }
        _ => None,
    };

    match (count, parts) {
        (0, _) => Ok(Vec::new()),
        (1, Some((_, elem))) => Ok(vec![elem]),
        (1, None) => Ok(vec![result]),
        (2, Some((index, elem))) => Ok(vec![index, elem]),
        (2, None) => Err(CheckErrorKind::InvalidDeclaration {
            message: format!(
                "can't declare two variables over type {}",
                types.type_name(result)
            ),
        }),
        (n, _) => Err(CheckErrorKind::InvalidDeclaration {
            message: format!("too many declarations: {n}"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmplcheck_core::{ErrorCategory, HostTypes, TypeTable};

    struct Fixture {
        types: HostTypes,
        int: TypeId,
        string: TypeId,
        strings: TypeId,
        by_name: TypeId,
        events: TypeId,
    }

    fn fixture() -> Fixture {
        let mut table = TypeTable::new();
        let int = table.int();
        let string = table.string();
        let bool = table.bool();
        let strings = table.slice(string);
        let by_name = table.map(string, bool);
        let events = table.chan(ChanDir::Recv, string);
        Fixture {
            types: HostTypes::new(table),
            int,
            string,
            strings,
            by_name,
            events,
        }
    }

    #[test]
    fn new_binds_dollar() {
        let f = fixture();
        let scope = Scope::new(f.string);
        assert_eq!(scope.lookup("$"), Some(f.string));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn child_is_independent() {
        let f = fixture();
        let mut parent = Scope::new(f.string);
        let mut child = parent.child();
        child.declare(&f.types, &["$x"], f.int).unwrap();
        assert_eq!(parent.lookup("$x"), None);

        parent.declare(&f.types, &["$y"], f.int).unwrap();
        assert_eq!(child.lookup("$y"), None);
    }

    #[test]
    fn declare_over_slice() {
        let f = fixture();
        let mut scope = Scope::new(f.string);
        scope.declare(&f.types, &["$e"], f.strings).unwrap();
        assert_eq!(scope.lookup("$e"), Some(f.string));

        scope.declare(&f.types, &["$i", "$e"], f.strings).unwrap();
        assert_eq!(scope.lookup("$i"), Some(f.int));
        assert_eq!(scope.lookup("$e"), Some(f.string));
    }

    #[test]
    fn declare_over_map_and_channel() {
        let f = fixture();
        let mut scope = Scope::new(f.string);
        scope.declare(&f.types, &["$k", "$v"], f.by_name).unwrap();
        assert_eq!(scope.lookup("$k"), Some(f.string));
        assert_eq!(scope.lookup("$v"), Some(f.types.basic(BasicKind::Bool)));

        scope.declare(&f.types, &["$n", "$ev"], f.events).unwrap();
        assert_eq!(scope.lookup("$n"), Some(f.int));
        assert_eq!(scope.lookup("$ev"), Some(f.string));
    }

    #[test]
    fn declare_over_plain_value() {
        let f = fixture();
        let mut scope = Scope::new(f.string);
        scope.declare(&f.types, &["$x"], f.int).unwrap();
        assert_eq!(scope.lookup("$x"), Some(f.int));

        let err = scope.declare(&f.types, &["$a", "$b"], f.int).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::UnsupportedOperation);
    }

    #[test]
    fn assign_requires_existing_assignable_variable() {
        let f = fixture();
        let mut scope = Scope::new(f.string);
        scope.declare(&f.types, &["$x"], f.int).unwrap();

        assert!(scope.assign(&f.types, "$x", f.types.basic(BasicKind::UntypedInt)).is_ok());
        assert_eq!(scope.lookup("$x"), Some(f.int));

        let err = scope.assign(&f.types, "$x", f.string).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);

        let err = scope.assign(&f.types, "$missing", f.int).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}

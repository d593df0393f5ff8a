//! The function registry.
//!
//! Maps function names to signatures. Lookups consult registered entries
//! first (defaults and caller-supplied functions), then fall back to the
//! built-ins in [`Builtin`].
//!
//! A registry is built once and then shared read-only between checks.

use rustc_hash::FxHashMap;
use tmplcheck_core::{CheckErrorKind, HostTypes, Signature, TypeId, TypeSystem};
use tmplcheck_parser::Node;

use crate::builtins::Builtin;
use crate::calls::{check_arguments, check_results};

/// Name to signature mapping used to check function calls.
#[derive(Debug, Clone, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Signature>,
}

impl FunctionRegistry {
    /// An empty registry. Only built-ins resolve.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the default printing and escaping functions.
    ///
    /// | Name | Signature |
    /// |------|-----------|
    /// | `print`, `println`, `html`, `js`, `urlquery` | `func(...any) string` |
    /// | `printf` | `func(string, ...any) string` |
    pub fn with_defaults(types: &HostTypes) -> Self {
        let table = types.table();
        let any_slice = table.any_slice();
        let string = table.string();

        let mut registry = Self::new();
        for name in ["print", "println", "html", "js", "urlquery"] {
            registry.insert(name, Signature::variadic(vec![any_slice], vec![string]));
        }
        registry.insert(
            "printf",
            Signature::variadic(vec![string, any_slice], vec![string]),
        );
        registry
    }

    /// Merge caller-supplied functions, overriding entries of the same name.
    pub fn with_functions<I, S>(mut self, functions: I) -> Self
    where
        I: IntoIterator<Item = (S, Signature)>,
        S: Into<String>,
    {
        for (name, signature) in functions {
            self.insert(name, signature);
        }
        self
    }

    /// Register one function, returning the signature it replaced.
    pub fn insert(&mut self, name: impl Into<String>, signature: Signature) -> Option<Signature> {
        self.functions.insert(name.into(), signature)
    }

    /// Whether `name` resolves to a registered function or a built-in.
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name) || Builtin::from_name(name).is_some()
    }

    /// Signature of a registered function.
    pub fn get(&self, name: &str) -> Option<&Signature> {
        self.functions.get(name)
    }

    /// Registered function names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered functions, excluding built-ins.
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    /// Whether no functions are registered.
    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Check a call to `name` and return its result type.
    ///
    /// `args` are the argument nodes as written; `arg_types` are their
    /// types, followed by the preceding pipeline result when there is one.
    pub fn check_call(
        &self,
        types: &dyn TypeSystem,
        name: &str,
        args: &[Node],
        arg_types: &[TypeId],
    ) -> Result<TypeId, CheckErrorKind> {
        if let Some(signature) = self.functions.get(name) {
            let result = check_results(types, name, signature)?;
            check_arguments(types, name, signature, arg_types)?;
            return Ok(result);
        }

        match Builtin::from_name(name) {
            Some(builtin) => {
                tracing::trace!(function = name, args = arg_types.len(), "checking built-in");
                builtin.check(types, args, arg_types)
            }
            None => Err(CheckErrorKind::UndefinedFunction {
                name: name.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tmplcheck_core::{BasicKind, ErrorCategory, TypeTable};

    fn host() -> HostTypes {
        HostTypes::new(TypeTable::new())
    }

    #[test]
    fn defaults_are_registered() {
        let types = host();
        let registry = FunctionRegistry::with_defaults(&types);
        for name in ["print", "printf", "println", "html", "js", "urlquery"] {
            assert!(registry.get(name).is_some(), "{name} missing");
        }
        assert_eq!(
            registry.names(),
            ["html", "js", "print", "printf", "println", "urlquery"]
        );
        assert!(registry.contains("len"));
        assert!(!registry.contains("upper"));
    }

    #[test]
    fn default_calls() {
        let types = host();
        let registry = FunctionRegistry::with_defaults(&types);
        let string = types.basic(BasicKind::String);
        let int = types.basic(BasicKind::Int);
        let format = types.basic(BasicKind::UntypedString);

        assert_eq!(registry.check_call(&types, "print", &[], &[]), Ok(string));
        assert_eq!(registry.check_call(&types, "html", &[], &[int, string]), Ok(string));
        assert_eq!(registry.check_call(&types, "printf", &[], &[format, int]), Ok(string));

        let err = registry.check_call(&types, "printf", &[], &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ArityMismatch);
        let err = registry.check_call(&types, "printf", &[], &[int]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::AssignabilityError);
    }

    #[test]
    fn custom_functions_override_defaults() {
        let mut table = TypeTable::new();
        let string = table.string();
        let int = table.int();
        let types = HostTypes::new(table);

        let registry = FunctionRegistry::with_defaults(&types).with_functions([
            ("upper", Signature::new(vec![string], vec![string])),
            ("html", Signature::new(vec![string], vec![int])),
        ]);

        assert_eq!(registry.check_call(&types, "upper", &[], &[string]), Ok(string));
        assert_eq!(
            registry.check_call(&types, "upper", &[], &[int]),
            Err(CheckErrorKind::ArgumentType {
                name: "upper".to_string(),
                index: 0,
                expected: "string".to_string(),
                found: "int".to_string(),
            })
        );
        assert_eq!(registry.check_call(&types, "html", &[], &[string]), Ok(int));
    }

    #[test]
    fn custom_entries_shadow_builtins() {
        let mut table = TypeTable::new();
        let string = table.string();
        let types = HostTypes::new(table);
        let mut registry = FunctionRegistry::new();
        registry.insert("len", Signature::new(vec![string], vec![string]));

        assert_eq!(registry.check_call(&types, "len", &[], &[string]), Ok(string));
    }

    #[test]
    fn result_shape_is_checked_before_arguments() {
        let mut table = TypeTable::new();
        let string = table.string();
        let int = table.int();
        let types = HostTypes::new(table);
        let mut registry = FunctionRegistry::new();
        registry.insert("pair", Signature::new(vec![string], vec![string, int]));

        let err = registry.check_call(&types, "pair", &[], &[]).unwrap_err();
        assert_eq!(err.category(), ErrorCategory::SignatureShapeError);
    }

    #[test]
    fn unknown_function() {
        let types = host();
        let registry = FunctionRegistry::new();
        let err = registry.check_call(&types, "missing", &[], &[]).unwrap_err();
        assert_eq!(
            err,
            CheckErrorKind::UndefinedFunction {
                name: "missing".to_string()
            }
        );
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }
}

//! TypeTable - arena storage for host types.
//!
//! The table owns every [`TypeData`] and hands out [`TypeId`] handles. It is
//! populated once (usually by whatever loads the host program's types) and
//! then frozen behind an `Arc` in [`HostTypes`](crate::HostTypes).
//!
//! # Example
//!
//! ```
//! use tmplcheck_core::{Field, TypeTable};
//!
//! let mut table = TypeTable::new();
//! let string = table.string();
//! let fields = table.struct_type(vec![Field::new("Name", string)]);
//! let user = table.named(Some("example.com/app"), "User", fields);
//!
//! assert_eq!(table.display(user).to_string(), "app.User");
//! let users = table.slice(user);
//! assert_eq!(table.display(users).to_string(), "[]app.User");
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use super::{
    BasicKind, ChanDir, Field, InterfaceMethod, InterfaceType, Method, NamedType, Signature,
    StructType, TypeData, TypeId,
};
use crate::TypeError;

/// Arena of host types.
#[derive(Debug, Clone)]
pub struct TypeTable {
    /// All types, indexed by `TypeId`.
    types: Vec<TypeData>,
    /// Structural interning for unnamed types.
    interned: FxHashMap<TypeData, TypeId>,
    /// Predeclared basic types, indexed by `BasicKind as usize`.
    basics: Vec<TypeId>,
    /// The empty interface.
    any: TypeId,
    /// `[]any`, the variadic slot of the print family.
    any_slice: TypeId,
    /// The predeclared `error` interface.
    error: TypeId,
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeTable {
    /// Create a table holding the predeclared types.
    pub fn new() -> Self {
        let mut table = Self {
            types: Vec::with_capacity(64),
            interned: FxHashMap::default(),
            basics: Vec::with_capacity(BasicKind::ALL.len()),
            any: TypeId(0),
            any_slice: TypeId(0),
            error: TypeId(0),
        };

        for kind in BasicKind::ALL {
            let id = table.intern(TypeData::Basic(kind));
            table.basics.push(id);
        }

        table.any = table.intern(TypeData::Interface(InterfaceType::default()));
        table.any_slice = table.slice(table.any);

        let string = table.string();
        let error_sig = table.func(vec![], vec![string]);
        let error_iface = table.interface(vec![InterfaceMethod {
            name: "Error".to_string(),
            signature: error_sig,
        }]);
        table.error = table.named(None, "error", error_iface);

        table
    }

    // ==========================================================================
    // Lookup
    // ==========================================================================

    /// Get the structure of a type.
    #[inline]
    pub fn get(&self, id: TypeId) -> &TypeData {
        &self.types[id.index()]
    }

    /// Number of types in the table.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether the table holds no types. Never true for a table built by `new`.
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Strip a named type to its underlying type.
    pub fn underlying(&self, id: TypeId) -> TypeId {
        match self.get(id) {
            TypeData::Named(named) => named.underlying,
            _ => id,
        }
    }

    /// Format a type for messages.
    pub fn display(&self, id: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { table: self, id }
    }

    // ==========================================================================
    // Predeclared types
    // ==========================================================================

    /// Get a predeclared basic type.
    #[inline]
    pub fn basic(&self, kind: BasicKind) -> TypeId {
        self.basics[kind as usize]
    }

    pub fn bool(&self) -> TypeId {
        self.basic(BasicKind::Bool)
    }

    pub fn int(&self) -> TypeId {
        self.basic(BasicKind::Int)
    }

    pub fn string(&self) -> TypeId {
        self.basic(BasicKind::String)
    }

    /// The empty interface.
    pub fn any(&self) -> TypeId {
        self.any
    }

    /// `[]any`.
    pub fn any_slice(&self) -> TypeId {
        self.any_slice
    }

    /// The predeclared `error` interface.
    pub fn error(&self) -> TypeId {
        self.error
    }

    // ==========================================================================
    // Type construction
    // ==========================================================================

    pub fn pointer(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Pointer(elem))
    }

    pub fn slice(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Slice(elem))
    }

    pub fn array(&mut self, len: u64, elem: TypeId) -> TypeId {
        self.intern(TypeData::Array { len, elem })
    }

    pub fn map(&mut self, key: TypeId, elem: TypeId) -> TypeId {
        self.intern(TypeData::Map { key, elem })
    }

    pub fn chan(&mut self, dir: ChanDir, elem: TypeId) -> TypeId {
        self.intern(TypeData::Chan { dir, elem })
    }

    pub fn struct_type(&mut self, fields: Vec<Field>) -> TypeId {
        self.intern(TypeData::Struct(StructType { fields }))
    }

    pub fn signature(&mut self, signature: Signature) -> TypeId {
        self.intern(TypeData::Signature(signature))
    }

    /// Shorthand for a non-variadic function type.
    pub fn func(&mut self, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        self.signature(Signature::new(params, results))
    }

    /// Shorthand for a variadic function type; the last parameter must be a slice.
    pub fn variadic_func(&mut self, params: Vec<TypeId>, results: Vec<TypeId>) -> TypeId {
        self.signature(Signature::variadic(params, results))
    }

    /// Create an interface from a method set. Methods are stored sorted by name.
    pub fn interface(&mut self, mut methods: Vec<InterfaceMethod>) -> TypeId {
        methods.sort_by(|a, b| a.name.cmp(&b.name));
        self.intern(TypeData::Interface(InterfaceType { methods }))
    }

    /// Declare a named type.
    ///
    /// A named `underlying` is resolved to its own underlying type, as a type
    /// declaration `type B A` does.
    pub fn named(
        &mut self,
        package: Option<&str>,
        name: impl Into<String>,
        underlying: TypeId,
    ) -> TypeId {
        let underlying = self.underlying(underlying);
        self.push(TypeData::Named(NamedType {
            package: package.map(str::to_string),
            name: name.into(),
            underlying,
            methods: Vec::new(),
        }))
    }

    /// Declare a named type whose underlying type is supplied later with
    /// [`set_underlying`](Self::set_underlying). Needed for self-referential types.
    pub fn declare_named(&mut self, package: Option<&str>, name: impl Into<String>) -> TypeId {
        let placeholder = self.struct_type(Vec::new());
        self.named(package, name, placeholder)
    }

    /// Replace the underlying type of a named type.
    pub fn set_underlying(&mut self, named: TypeId, underlying: TypeId) -> Result<(), TypeError> {
        let underlying = self.underlying(underlying);
        let name = self.display(named).to_string();
        match &mut self.types[named.index()] {
            TypeData::Named(n) => {
                n.underlying = underlying;
                Ok(())
            }
            _ => Err(TypeError::NotNamed(name)),
        }
    }

    /// Add a method to a named type.
    pub fn add_method(
        &mut self,
        named: TypeId,
        name: impl Into<String>,
        signature: TypeId,
        pointer_receiver: bool,
    ) -> Result<(), TypeError> {
        let name = name.into();
        if self.get(signature).as_signature().is_none() {
            return Err(TypeError::NotASignature(self.display(signature).to_string()));
        }
        let type_name = self.display(named).to_string();
        let TypeData::Named(n) = &mut self.types[named.index()] else {
            return Err(TypeError::NotNamed(type_name));
        };
        if n.methods.iter().any(|m| m.name == name) {
            return Err(TypeError::DuplicateMethod {
                type_name,
                method: name,
            });
        }
        n.methods.push(Method {
            name,
            signature,
            pointer_receiver,
        });
        Ok(())
    }

    fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.interned.get(&data) {
            return id;
        }
        let id = self.push(data.clone());
        self.interned.insert(data, id);
        id
    }

    fn push(&mut self, data: TypeData) -> TypeId {
        let id = TypeId(self.types.len() as u32);
        self.types.push(data);
        id
    }
}

// ============================================================================
// Display
// ============================================================================

/// Borrowing formatter returned by [`TypeTable::display`].
pub struct TypeDisplay<'a> {
    table: &'a TypeTable,
    id: TypeId,
}

impl TypeDisplay<'_> {
    fn nested(&self, id: TypeId) -> Self {
        TypeDisplay {
            table: self.table,
            id,
        }
    }

    fn write_signature(&self, f: &mut fmt::Formatter<'_>, sig: &Signature) -> fmt::Result {
        f.write_str("(")?;
        for (i, &param) in sig.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            let last = i + 1 == sig.params.len();
            match (sig.variadic && last, self.table.get(param)) {
                (true, TypeData::Slice(elem)) => write!(f, "...{}", self.nested(*elem))?,
                _ => write!(f, "{}", self.nested(param))?,
            }
        }
        f.write_str(")")?;
        match sig.results.as_slice() {
            [] => Ok(()),
            [single] => write!(f, " {}", self.nested(*single)),
            many => {
                f.write_str(" (")?;
                for (i, &result) in many.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", self.nested(result))?;
                }
                f.write_str(")")
            }
        }
    }
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.table.get(self.id) {
            TypeData::Basic(kind) => f.write_str(kind.name()),
            TypeData::Named(named) => match &named.package {
                Some(path) => {
                    let package = path.rsplit('/').next().unwrap_or(path);
                    write!(f, "{}.{}", package, named.name)
                }
                None => f.write_str(&named.name),
            },
            TypeData::Pointer(elem) => write!(f, "*{}", self.nested(*elem)),
            TypeData::Slice(elem) => write!(f, "[]{}", self.nested(*elem)),
            TypeData::Array { len, elem } => write!(f, "[{}]{}", len, self.nested(*elem)),
            TypeData::Map { key, elem } => {
                write!(f, "map[{}]{}", self.nested(*key), self.nested(*elem))
            }
            TypeData::Chan { dir, elem } => match dir {
                ChanDir::Both => write!(f, "chan {}", self.nested(*elem)),
                ChanDir::Send => write!(f, "chan<- {}", self.nested(*elem)),
                ChanDir::Recv => write!(f, "<-chan {}", self.nested(*elem)),
            },
            TypeData::Struct(st) => {
                f.write_str("struct{")?;
                for (i, field) in st.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    if field.embedded {
                        write!(f, "{}", self.nested(field.ty))?;
                    } else {
                        write!(f, "{} {}", field.name, self.nested(field.ty))?;
                    }
                }
                f.write_str("}")
            }
            TypeData::Signature(sig) => {
                f.write_str("func")?;
                self.write_signature(f, sig)
            }
            TypeData::Interface(iface) if iface.is_empty() => f.write_str("any"),
            TypeData::Interface(iface) => {
                f.write_str("interface{")?;
                for (i, method) in iface.methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    f.write_str(&method.name)?;
                    match self.table.get(method.signature) {
                        TypeData::Signature(sig) => self.write_signature(f, sig)?,
                        _ => f.write_str("()")?,
                    }
                }
                f.write_str("}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unnamed_types_are_interned() {
        let mut table = TypeTable::new();
        let int = table.int();
        let a = table.slice(int);
        let b = table.slice(int);
        assert_eq!(a, b);

        let m1 = table.map(table.string(), int);
        let m2 = table.map(table.string(), int);
        assert_eq!(m1, m2);
    }

    #[test]
    fn named_types_are_distinct() {
        let mut table = TypeTable::new();
        let empty = table.struct_type(vec![]);
        let a = table.named(Some("app"), "A", empty);
        let b = table.named(Some("app"), "A", empty);
        assert_ne!(a, b);
        assert_eq!(table.underlying(a), empty);
    }

    #[test]
    fn named_of_named_takes_underlying() {
        let mut table = TypeTable::new();
        let a = table.named(Some("app"), "A", table.int());
        let b = table.named(Some("app"), "B", a);
        assert_eq!(table.underlying(b), table.int());
    }

    #[test]
    fn display_composites() {
        let mut table = TypeTable::new();
        let string = table.string();
        let int = table.int();
        let error = table.error();

        let ptr = table.pointer(string);
        assert_eq!(table.display(ptr).to_string(), "*string");

        let arr = table.array(3, int);
        assert_eq!(table.display(arr).to_string(), "[3]int");

        let map = table.map(string, int);
        assert_eq!(table.display(map).to_string(), "map[string]int");

        let recv = table.chan(ChanDir::Recv, int);
        assert_eq!(table.display(recv).to_string(), "<-chan int");

        let any_slice = table.any_slice();
        let printf = table.variadic_func(vec![string, any_slice], vec![string, error]);
        assert_eq!(
            table.display(printf).to_string(),
            "func(string, ...any) (string, error)"
        );

        let st = table.struct_type(vec![Field::new("A", int)]);
        assert_eq!(table.display(st).to_string(), "struct{A int}");
    }

    #[test]
    fn error_is_predeclared_named_interface() {
        let table = TypeTable::new();
        let error = table.error();
        assert_eq!(table.display(error).to_string(), "error");
        let underlying = table.underlying(error);
        assert!(table.get(underlying).as_interface().is_some());
    }

    #[test]
    fn add_method_rejects_duplicates_and_unnamed() {
        let mut table = TypeTable::new();
        let empty = table.struct_type(vec![]);
        let t = table.named(Some("app"), "T", empty);
        let sig = table.func(vec![], vec![table.int()]);

        assert!(table.add_method(t, "Count", sig, false).is_ok());
        assert_eq!(
            table.add_method(t, "Count", sig, false),
            Err(TypeError::DuplicateMethod {
                type_name: "app.T".to_string(),
                method: "Count".to_string(),
            })
        );
        assert!(matches!(
            table.add_method(empty, "Count", sig, false),
            Err(TypeError::NotNamed(_))
        ));
        assert!(matches!(
            table.add_method(t, "Bad", table.int(), false),
            Err(TypeError::NotASignature(_))
        ));
    }

    #[test]
    fn recursive_named_type() {
        let mut table = TypeTable::new();
        let node = table.declare_named(Some("app"), "Node");
        let ptr = table.pointer(node);
        let children = table.slice(ptr);
        let body = table.struct_type(vec![Field::new("Children", children)]);
        table.set_underlying(node, body).unwrap();

        assert_eq!(table.underlying(node), body);
        assert_eq!(
            table.display(body).to_string(),
            "struct{Children []*app.Node}"
        );
    }
}

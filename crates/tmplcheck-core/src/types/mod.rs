//! Host type model.
//!
//! Types live in a [`TypeTable`] and are referenced by the `Copy` handle
//! [`TypeId`]. The table interns unnamed types structurally, so two unnamed
//! types are identical exactly when their ids are equal. Named types are
//! always distinct, even when they share an underlying type.
//!
//! ```text
//! TypeData
//! ├── Basic(BasicKind)        - bool, int, string, ..., untyped constants
//! ├── Named(NamedType)        - package-qualified name, underlying type, methods
//! ├── Pointer / Slice / Array / Map / Chan
//! ├── Struct(StructType)      - ordered fields, some embedded
//! ├── Signature(Signature)    - params, results, variadic flag
//! └── Interface(InterfaceType)
//! ```

mod basic;
mod table;

pub use basic::{BasicInfo, BasicKind};
pub use table::{TypeDisplay, TypeTable};

use std::fmt;

/// Handle to a type stored in a [`TypeTable`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Index of this type in its table.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

/// Channel direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

/// Structural description of a type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeData {
    Basic(BasicKind),
    Named(NamedType),
    Pointer(TypeId),
    Slice(TypeId),
    Array { len: u64, elem: TypeId },
    Map { key: TypeId, elem: TypeId },
    Chan { dir: ChanDir, elem: TypeId },
    Struct(StructType),
    Signature(Signature),
    Interface(InterfaceType),
}

impl TypeData {
    /// Get the basic kind, if this is a basic type.
    pub fn as_basic(&self) -> Option<BasicKind> {
        match self {
            TypeData::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Get the signature, if this is a function type.
    pub fn as_signature(&self) -> Option<&Signature> {
        match self {
            TypeData::Signature(sig) => Some(sig),
            _ => None,
        }
    }

    /// Get the named type, if this is a named type.
    pub fn as_named(&self) -> Option<&NamedType> {
        match self {
            TypeData::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Get the interface, if this is an interface type.
    pub fn as_interface(&self) -> Option<&InterfaceType> {
        match self {
            TypeData::Interface(iface) => Some(iface),
            _ => None,
        }
    }
}

/// A declared type with a name and (optionally) methods.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedType {
    /// Package path the type is declared in (`None` for predeclared types).
    pub package: Option<String>,
    /// Declared name.
    pub name: String,
    /// Underlying type. Never another named type.
    pub underlying: TypeId,
    /// Declared methods.
    pub methods: Vec<Method>,
}

/// A method declared on a named type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method {
    pub name: String,
    /// The method's signature type (receiver excluded).
    pub signature: TypeId,
    /// Declared with a pointer receiver (`func (t *T) M()`).
    pub pointer_receiver: bool,
}

/// A struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeId,
    /// Embedded fields promote their own fields and methods.
    pub embedded: bool,
}

impl Field {
    /// Create a regular named field.
    pub fn new(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: false,
        }
    }

    /// Create an embedded field. Its name is the embedded type's name.
    pub fn embedded(name: impl Into<String>, ty: TypeId) -> Self {
        Self {
            name: name.into(),
            ty,
            embedded: true,
        }
    }
}

/// Ordered struct fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StructType {
    pub fields: Vec<Field>,
}

/// A function signature.
///
/// When `variadic` is set the last parameter is a slice type holding the
/// variadic element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    pub params: Vec<TypeId>,
    pub results: Vec<TypeId>,
    pub variadic: bool,
}

impl Signature {
    /// Create a non-variadic signature.
    pub fn new(params: Vec<TypeId>, results: Vec<TypeId>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    /// Create a variadic signature. The last parameter must be a slice type.
    pub fn variadic(params: Vec<TypeId>, results: Vec<TypeId>) -> Self {
        Self {
            params,
            results,
            variadic: true,
        }
    }
}

/// A method required by an interface.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: TypeId,
}

/// An interface type: a method set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct InterfaceType {
    /// Methods sorted by name.
    pub methods: Vec<InterfaceMethod>,
}

impl InterfaceType {
    /// Whether this is the empty interface (`any`).
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// The result of looking up a name on a type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Member {
    /// A struct field, possibly promoted through embedding.
    Field { ty: TypeId },
    /// A method, carrying its signature type.
    Method { signature: TypeId },
}

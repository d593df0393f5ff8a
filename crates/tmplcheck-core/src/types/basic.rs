//! Predeclared basic types, including the untyped constant kinds.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Properties shared by groups of basic kinds.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BasicInfo: u8 {
        const BOOLEAN = 1 << 0;
        const INTEGER = 1 << 1;
        const UNSIGNED = 1 << 2;
        const FLOAT = 1 << 3;
        const COMPLEX = 1 << 4;
        const STRING = 1 << 5;
        const UNTYPED = 1 << 6;

        const ORDERED = Self::INTEGER.bits() | Self::FLOAT.bits() | Self::STRING.bits();
        const NUMERIC = Self::INTEGER.bits() | Self::FLOAT.bits() | Self::COMPLEX.bits();
        const CONST_TYPE = Self::BOOLEAN.bits() | Self::NUMERIC.bits() | Self::STRING.bits();
    }
}

/// Basic type kinds.
///
/// The `Untyped*` kinds describe template literals before they are bound to
/// a concrete type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UnsafePointer,

    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    /// Every basic kind, in declaration order.
    pub const ALL: [BasicKind; 25] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::Complex64,
        BasicKind::Complex128,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::UntypedBool,
        BasicKind::UntypedInt,
        BasicKind::UntypedRune,
        BasicKind::UntypedFloat,
        BasicKind::UntypedComplex,
        BasicKind::UntypedString,
        BasicKind::UntypedNil,
    ];

    /// Get the property flags for this kind.
    pub const fn info(self) -> BasicInfo {
        match self {
            BasicKind::Bool => BasicInfo::BOOLEAN,
            BasicKind::Int
            | BasicKind::Int8
            | BasicKind::Int16
            | BasicKind::Int32
            | BasicKind::Int64 => BasicInfo::INTEGER,
            BasicKind::Uint
            | BasicKind::Uint8
            | BasicKind::Uint16
            | BasicKind::Uint32
            | BasicKind::Uint64
            | BasicKind::Uintptr => BasicInfo::INTEGER.union(BasicInfo::UNSIGNED),
            BasicKind::Float32 | BasicKind::Float64 => BasicInfo::FLOAT,
            BasicKind::Complex64 | BasicKind::Complex128 => BasicInfo::COMPLEX,
            BasicKind::String => BasicInfo::STRING,
            BasicKind::UnsafePointer => BasicInfo::empty(),
            BasicKind::UntypedBool => BasicInfo::BOOLEAN.union(BasicInfo::UNTYPED),
            BasicKind::UntypedInt | BasicKind::UntypedRune => {
                BasicInfo::INTEGER.union(BasicInfo::UNTYPED)
            }
            BasicKind::UntypedFloat => BasicInfo::FLOAT.union(BasicInfo::UNTYPED),
            BasicKind::UntypedComplex => BasicInfo::COMPLEX.union(BasicInfo::UNTYPED),
            BasicKind::UntypedString => BasicInfo::STRING.union(BasicInfo::UNTYPED),
            BasicKind::UntypedNil => BasicInfo::UNTYPED,
        }
    }

    /// Whether this is one of the untyped constant kinds.
    #[inline]
    pub const fn is_untyped(self) -> bool {
        self.info().contains(BasicInfo::UNTYPED)
    }

    /// The kind an untyped constant takes when it needs a concrete type.
    ///
    /// Concrete kinds and untyped nil are returned unchanged.
    pub const fn default_kind(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }

    /// Source name of this kind.
    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }
}

impl fmt::Display for BasicKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

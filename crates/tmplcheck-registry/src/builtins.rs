//! Built-in template functions that cannot be described by a signature.
//!
//! These are checked by rule rather than by signature, since their result
//! type depends on their operands (`index`, `slice`, `and`, ...).

use tmplcheck_core::{BasicInfo, BasicKind, CheckErrorKind, TypeData, TypeId, TypeSystem};
use tmplcheck_parser::Node;

use crate::calls::{check_arguments, check_results};

/// A built-in function checked by rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `len x`
    Len,
    /// `slice x i j k`
    Slice,
    /// `index x k1 k2 ...`
    Index,
    /// `and x y ...`
    And,
    /// `or x y ...`
    Or,
    /// `eq x y ...`
    Eq,
    /// `ne x y`
    Ne,
    /// `lt x y`
    Lt,
    /// `le x y`
    Le,
    /// `gt x y`
    Gt,
    /// `ge x y`
    Ge,
    /// `not x`
    Not,
    /// `call f args...`
    Call,
    /// Escaper inserted by the HTML escaper for attribute values.
    AttrEscaper,
}

impl Builtin {
    /// Every built-in, in table order.
    pub const ALL: [Builtin; 14] = [
        Builtin::Len,
        Builtin::Slice,
        Builtin::Index,
        Builtin::And,
        Builtin::Or,
        Builtin::Eq,
        Builtin::Ne,
        Builtin::Lt,
        Builtin::Le,
        Builtin::Gt,
        Builtin::Ge,
        Builtin::Not,
        Builtin::Call,
        Builtin::AttrEscaper,
    ];

    /// Resolve a function name to a built-in.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "len" => Some(Builtin::Len),
            "slice" => Some(Builtin::Slice),
            "index" => Some(Builtin::Index),
            "and" => Some(Builtin::And),
            "or" => Some(Builtin::Or),
            "eq" => Some(Builtin::Eq),
            "ne" => Some(Builtin::Ne),
            "lt" => Some(Builtin::Lt),
            "le" => Some(Builtin::Le),
            "gt" => Some(Builtin::Gt),
            "ge" => Some(Builtin::Ge),
            "not" => Some(Builtin::Not),
            "call" => Some(Builtin::Call),
            "attrescaper" => Some(Builtin::AttrEscaper),
            _ => None,
        }
    }

    /// Name as written in templates.
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Len => "len",
            Builtin::Slice => "slice",
            Builtin::Index => "index",
            Builtin::And => "and",
            Builtin::Or => "or",
            Builtin::Eq => "eq",
            Builtin::Ne => "ne",
            Builtin::Lt => "lt",
            Builtin::Le => "le",
            Builtin::Gt => "gt",
            Builtin::Ge => "ge",
            Builtin::Not => "not",
            Builtin::Call => "call",
            Builtin::AttrEscaper => "attrescaper",
        }
    }

    /// Check a call and compute its result type.
    ///
    /// `args` are the argument nodes as written; `arg_types` are their types,
    /// followed by the preceding pipeline result when there is one.
    pub fn check(
        self,
        types: &dyn TypeSystem,
        args: &[Node],
        arg_types: &[TypeId],
    ) -> Result<TypeId, CheckErrorKind> {
        match self {
            Builtin::Len => {
                self.expect_exactly(1, arg_types)?;
                check_len(types, arg_types[0])
            }
            Builtin::Slice => {
                self.expect_at_least(1, arg_types)?;
                check_slice(types, args, arg_types)
            }
            Builtin::Index => {
                self.expect_at_least(1, arg_types)?;
                check_index(types, arg_types)
            }
            Builtin::And | Builtin::Or => {
                self.expect_at_least(1, arg_types)?;
                let first = arg_types[0];
                if arg_types[1..].iter().any(|&ty| !types.assignable(ty, first)) {
                    tracing::trace!(
                        builtin = self.name(),
                        first = %types.type_name(first),
                        "operand types differ; reporting the first operand's type"
                    );
                }
                Ok(first)
            }
            Builtin::Eq | Builtin::Ne | Builtin::Lt | Builtin::Le | Builtin::Gt | Builtin::Ge => {
                self.expect_at_least(2, arg_types)?;
                Ok(types.basic(BasicKind::Bool))
            }
            Builtin::Not => {
                self.expect_at_least(1, arg_types)?;
                Ok(types.basic(BasicKind::Bool))
            }
            Builtin::Call => {
                self.expect_at_least(1, arg_types)?;
                check_call_builtin(types, args, arg_types)
            }
            Builtin::AttrEscaper => Ok(types.basic(BasicKind::String)),
        }
    }

    fn expect_exactly(self, expected: usize, arg_types: &[TypeId]) -> Result<(), CheckErrorKind> {
        if arg_types.len() == expected {
            Ok(())
        } else {
            Err(self.arity_error(expected, arg_types.len(), false))
        }
    }

    fn expect_at_least(self, expected: usize, arg_types: &[TypeId]) -> Result<(), CheckErrorKind> {
        if arg_types.len() >= expected {
            Ok(())
        } else {
            Err(self.arity_error(expected, arg_types.len(), true))
        }
    }

    fn arity_error(self, expected: usize, found: usize, variadic: bool) -> CheckErrorKind {
        CheckErrorKind::WrongArgumentCount {
            name: self.name().to_string(),
            expected,
            found,
            variadic,
        }
    }
}

fn is_integer(types: &dyn TypeSystem, ty: TypeId) -> bool {
    types
        .basic_kind(ty)
        .is_some_and(|kind| kind.info().contains(BasicInfo::INTEGER))
}

fn check_len(types: &dyn TypeSystem, ty: TypeId) -> Result<TypeId, CheckErrorKind> {
    let base = types.deref(ty);
    match types.data(types.underlying(base)) {
        TypeData::Basic(kind) if kind.info().contains(BasicInfo::STRING) => {
            Ok(types.basic(BasicKind::Int))
        }
        TypeData::Array { .. } | TypeData::Slice(_) | TypeData::Map { .. } => {
            Ok(types.basic(BasicKind::Int))
        }
        _ => Err(CheckErrorKind::CannotTakeLen {
            type_name: types.type_name(ty),
        }),
    }
}

/// Slicing yields the element type; a string stays a string.
fn check_slice(
    types: &dyn TypeSystem,
    args: &[Node],
    arg_types: &[TypeId],
) -> Result<TypeId, CheckErrorKind> {
    let base = types.deref(arg_types[0]);
    let indexes = &arg_types[1..];

    if indexes.len() > 3 {
        return Err(CheckErrorKind::CannotSlice {
            type_name: types.type_name(base),
            detail: format!("too many slice indexes: {}", indexes.len()),
        });
    }

    for (offset, &index) in indexes.iter().enumerate() {
        if let Some(Node::Number(number)) = args.get(offset + 1) {
            if number.is_negative() {
                return Err(CheckErrorKind::NegativeIndex {
                    text: number.text.clone(),
                });
            }
        }
        if !is_integer(types, index) {
            return Err(CheckErrorKind::ArgumentType {
                name: "slice".to_string(),
                index: offset + 1,
                expected: "int".to_string(),
                found: types.type_name(index),
            });
        }
    }

    match types.data(types.underlying(base)) {
        TypeData::Basic(kind) if kind.info().contains(BasicInfo::STRING) => {
            if indexes.len() == 3 {
                return Err(CheckErrorKind::CannotSlice {
                    type_name: types.type_name(base),
                    detail: "cannot 3-index slice a string".to_string(),
                });
            }
            Ok(types.concretize(base))
        }
        TypeData::Slice(elem) | TypeData::Array { elem, .. } => Ok(*elem),
        _ => Err(CheckErrorKind::CannotSlice {
            type_name: types.type_name(base),
            detail: String::new(),
        }),
    }
}

fn check_index(types: &dyn TypeSystem, arg_types: &[TypeId]) -> Result<TypeId, CheckErrorKind> {
    let mut current = arg_types[0];

    for (offset, &index) in arg_types[1..].iter().enumerate() {
        let base = types.deref(current);
        current = match types.data(types.underlying(base)) {
            TypeData::Array { elem, .. } | TypeData::Slice(elem) => {
                if !is_integer(types, index) {
                    return Err(CheckErrorKind::ArgumentType {
                        name: "index".to_string(),
                        index: offset + 1,
                        expected: "int".to_string(),
                        found: types.type_name(index),
                    });
                }
                *elem
            }
            TypeData::Map { key, elem } => {
                if !types.assignable(index, *key) {
                    return Err(CheckErrorKind::ArgumentType {
                        name: "index".to_string(),
                        index: offset + 1,
                        expected: types.type_name(*key),
                        found: types.type_name(index),
                    });
                }
                *elem
            }
            TypeData::Basic(kind) if kind.info().contains(BasicInfo::STRING) => {
                if !is_integer(types, index) {
                    return Err(CheckErrorKind::ArgumentType {
                        name: "index".to_string(),
                        index: offset + 1,
                        expected: "int".to_string(),
                        found: types.type_name(index),
                    });
                }
                types.basic(BasicKind::Uint8)
            }
            _ => {
                return Err(CheckErrorKind::CannotIndex {
                    type_name: types.type_name(base),
                });
            }
        };
    }
    Ok(current)
}

fn check_call_builtin(
    types: &dyn TypeSystem,
    args: &[Node],
    arg_types: &[TypeId],
) -> Result<TypeId, CheckErrorKind> {
    let target = arg_types[0];
    let name = args
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "call".to_string());
    let Some(signature) = types.signature(target) else {
        return Err(CheckErrorKind::NotCallable {
            type_name: types.type_name(target),
        });
    };
    let result = check_results(types, &name, signature)?;
    check_arguments(types, &name, signature, &arg_types[1..])?;
    Ok(result)
}

//! Signature checks shared by functions, methods and `call`.
//!
//! A callable is usable from a template when it returns one value, or a value
//! and an error. Its arguments must be assignable to its parameters, with
//! pointers looked through in either direction.

use tmplcheck_core::{CheckErrorKind, Signature, TypeData, TypeId, TypeSystem};

/// Validate the result list of a callable and return its value type.
pub fn check_results(
    types: &dyn TypeSystem,
    name: &str,
    signature: &Signature,
) -> Result<TypeId, CheckErrorKind> {
    match signature.results.as_slice() {
        [value] => Ok(*value),
        [value, second] if types.is_error_capable(*second) => Ok(*value),
        [_, second] => Err(CheckErrorKind::SecondResultNotError {
            name: name.to_string(),
            found: types.type_name(*second),
        }),
        other => Err(CheckErrorKind::ResultCount {
            name: name.to_string(),
            count: other.len(),
        }),
    }
}

/// Check argument types against a signature.
///
/// A variadic signature accepts any number of arguments after its fixed
/// parameters, each checked against the element type of the final slice
/// parameter. Argument indices in errors are zero-based.
pub fn check_arguments(
    types: &dyn TypeSystem,
    name: &str,
    signature: &Signature,
    args: &[TypeId],
) -> Result<(), CheckErrorKind> {
    let fixed = if signature.variadic {
        signature.params.len().saturating_sub(1)
    } else {
        signature.params.len()
    };

    let count_ok = if signature.variadic {
        args.len() >= fixed
    } else {
        args.len() == fixed
    };
    if !count_ok {
        return Err(CheckErrorKind::WrongArgumentCount {
            name: name.to_string(),
            expected: fixed,
            found: args.len(),
            variadic: signature.variadic,
        });
    }

    let variadic_elem = signature
        .params
        .last()
        .filter(|_| signature.variadic)
        .map(|&slot| types.elem(slot).unwrap_or(slot));

    for (index, &arg) in args.iter().enumerate() {
        let param = match signature.params.get(index) {
            Some(&param) if index < fixed => param,
            _ => match variadic_elem {
                Some(elem) => elem,
                None => continue,
            },
        };
        if !assignable_through_pointers(types, arg, param) {
            return Err(CheckErrorKind::ArgumentType {
                name: name.to_string(),
                index,
                expected: types.type_name(param),
                found: types.type_name(arg),
            });
        }
    }
    Ok(())
}

/// Assignability that also accepts `*T` for `T` and `T` for `*T`.
pub fn assignable_through_pointers(types: &dyn TypeSystem, from: TypeId, to: TypeId) -> bool {
    if types.assignable(from, to) {
        return true;
    }
    if let Some(elem) = pointer_elem(types, from) {
        if types.assignable(elem, to) {
            return true;
        }
    }
    pointer_elem(types, to).is_some_and(|elem| types.assignable(from, elem))
}

fn pointer_elem(types: &dyn TypeSystem, ty: TypeId) -> Option<TypeId> {
    match types.data(types.underlying(ty)) {
        TypeData::Pointer(elem) => Some(*elem),
        _ => None,
    }
}

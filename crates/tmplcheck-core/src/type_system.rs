//! The type system adapter queried by the checker.
//!
//! [`TypeSystem`] is the seam between the checker and whatever describes the
//! host program's types. The checker never inspects a `TypeTable` directly; it
//! asks the adapter for structure, member lookup, assignability and the
//! error-capability predicate.
//!
//! [`HostTypes`] is the implementation shipped with the crate: a frozen
//! [`TypeTable`] bound to one package, which decides what counts as visible.
//!
//! # Thread Safety
//!
//! Adapters are `Send + Sync` and read-only, so one instance can back many
//! concurrent checks.

use std::sync::Arc;

use rustc_hash::FxHashSet;

use crate::types::{
    BasicInfo, BasicKind, ChanDir, Member, Signature, TypeData, TypeId, TypeTable,
};

/// Type queries needed to check templates.
pub trait TypeSystem: Send + Sync {
    /// Structure of a type.
    fn data(&self, ty: TypeId) -> &TypeData;

    /// Strip a named type to its underlying type.
    fn underlying(&self, ty: TypeId) -> TypeId;

    /// Find a field or method called `name` on `ty`.
    ///
    /// Pointers are looked through, methods with pointer receivers are
    /// found on addressable values, and fields of embedded structs are
    /// promoted (shallowest match wins).
    fn lookup_field_or_method(&self, ty: TypeId, name: &str) -> Option<Member>;

    /// Whether a value of type `from` may be assigned to `to`.
    fn assignable(&self, from: TypeId, to: TypeId) -> bool;

    /// Whether `ty` satisfies the predeclared `error` interface.
    fn is_error_capable(&self, ty: TypeId) -> bool;

    /// Predeclared basic type of the given kind.
    fn basic(&self, kind: BasicKind) -> TypeId;

    /// Display name used in messages.
    fn type_name(&self, ty: TypeId) -> String;

    /// Strip every level of pointer indirection.
    ///
    /// A named pointer type that points back to itself (`type P *P`) stops
    /// at the first repeat.
    fn deref(&self, ty: TypeId) -> TypeId {
        let mut current = ty;
        let mut seen = FxHashSet::default();
        while let TypeData::Pointer(elem) = self.data(self.underlying(current)) {
            if !seen.insert(current) {
                break;
            }
            current = *elem;
        }
        current
    }

    /// Element type of a pointer, slice, array, map or channel.
    fn elem(&self, ty: TypeId) -> Option<TypeId> {
        match self.data(self.underlying(ty)) {
            TypeData::Pointer(elem) | TypeData::Slice(elem) => Some(*elem),
            TypeData::Array { elem, .. }
            | TypeData::Map { elem, .. }
            | TypeData::Chan { elem, .. } => Some(*elem),
            _ => None,
        }
    }

    /// Key type of a map.
    fn key(&self, ty: TypeId) -> Option<TypeId> {
        match self.data(self.underlying(ty)) {
            TypeData::Map { key, .. } => Some(*key),
            _ => None,
        }
    }

    /// Signature of a function type.
    fn signature(&self, ty: TypeId) -> Option<&Signature> {
        self.data(self.underlying(ty)).as_signature()
    }

    /// Basic kind of a type's underlying type.
    fn basic_kind(&self, ty: TypeId) -> Option<BasicKind> {
        self.data(self.underlying(ty)).as_basic()
    }

    /// Replace an untyped constant kind with its default concrete type.
    ///
    /// Concrete types and untyped nil are returned unchanged.
    fn concretize(&self, ty: TypeId) -> TypeId {
        match self.data(ty) {
            TypeData::Basic(kind) if kind.is_untyped() => self.basic(kind.default_kind()),
            _ => ty,
        }
    }

    /// Whether a name is visible outside its package.
    fn is_exported(&self, name: &str) -> bool {
        name.chars().next().is_some_and(char::is_uppercase)
    }
}

// ============================================================================
// HostTypes
// ============================================================================

/// [`TypeSystem`] over a frozen [`TypeTable`].
#[derive(Debug, Clone)]
pub struct HostTypes {
    table: Arc<TypeTable>,
    /// Package the templates belong to.
    package: Option<String>,
}

impl HostTypes {
    /// Freeze a table for checking.
    pub fn new(table: TypeTable) -> Self {
        Self {
            table: Arc::new(table),
            package: None,
        }
    }

    /// Bind the adapter to the package whose templates are being checked.
    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = Some(package.into());
        self
    }

    /// The package this adapter is bound to.
    pub fn package(&self) -> Option<&str> {
        self.package.as_deref()
    }

    /// The underlying table.
    pub fn table(&self) -> &TypeTable {
        &self.table
    }

    fn visible(&self, name: &str, owner: Option<&str>) -> bool {
        self.is_exported(name) || (owner.is_some() && owner == self.package.as_deref())
    }

    /// Breadth-first member search through embedded fields.
    fn find_member(&self, ty: TypeId, name: &str) -> Option<Member> {
        let mut level = vec![ty];
        let mut seen = FxHashSet::default();

        while !level.is_empty() {
            let mut next = Vec::new();
            let mut found = None;

            for &current in &level {
                let base = self.deref_once(current);
                if !seen.insert(base) {
                    continue;
                }

                let owner = self
                    .table
                    .get(base)
                    .as_named()
                    .and_then(|named| named.package.as_deref());

                if let TypeData::Named(named) = self.table.get(base) {
                    if let Some(method) = named.methods.iter().find(|m| m.name == name) {
                        if self.visible(name, owner) && found.is_none() {
                            found = Some(Member::Method {
                                signature: method.signature,
                            });
                        }
                    }
                }

                if let TypeData::Interface(iface) = self.table.get(self.table.underlying(base)) {
                    if let Some(method) = iface.methods.iter().find(|m| m.name == name) {
                        if found.is_none() {
                            found = Some(Member::Method {
                                signature: method.signature,
                            });
                        }
                    }
                }

                if let TypeData::Struct(st) = self.table.get(self.table.underlying(base)) {
                    for field in &st.fields {
                        if field.name == name && found.is_none() && self.visible(name, owner) {
                            found = Some(Member::Field { ty: field.ty });
                        }
                        if field.embedded {
                            next.push(field.ty);
                        }
                    }
                }
            }

            if found.is_some() {
                return found;
            }
            level = next;
        }

        None
    }

    fn deref_once(&self, ty: TypeId) -> TypeId {
        match self.table.get(ty) {
            TypeData::Pointer(elem) => *elem,
            _ => ty,
        }
    }

    fn is_named(&self, ty: TypeId) -> bool {
        matches!(self.table.get(ty), TypeData::Named(_))
    }

    /// Whether `ty` has every method of the interface `iface`.
    fn implements(&self, ty: TypeId, iface: TypeId) -> bool {
        let Some(required) = self.table.get(self.table.underlying(iface)).as_interface() else {
            return false;
        };
        if required.is_empty() {
            return true;
        }

        if let Some(have) = self.table.get(self.table.underlying(ty)).as_interface() {
            return required.methods.iter().all(|m| {
                have.methods
                    .iter()
                    .any(|h| h.name == m.name && h.signature == m.signature)
            });
        }

        // Method set of T holds value receivers only; *T holds both.
        let (named, pointer) = match self.table.get(ty) {
            TypeData::Pointer(elem) => (*elem, true),
            _ => (ty, false),
        };
        let Some(named) = self.table.get(named).as_named() else {
            return false;
        };
        required.methods.iter().all(|m| {
            named.methods.iter().any(|h| {
                h.name == m.name && h.signature == m.signature && (pointer || !h.pointer_receiver)
            })
        })
    }

    fn assignable_untyped(&self, kind: BasicKind, to: TypeId) -> bool {
        let target = self.table.get(self.table.underlying(to));
        if kind == BasicKind::UntypedNil {
            return matches!(
                target,
                TypeData::Pointer(_)
                    | TypeData::Slice(_)
                    | TypeData::Map { .. }
                    | TypeData::Chan { .. }
                    | TypeData::Signature(_)
                    | TypeData::Interface(_)
            ) || target.as_basic() == Some(BasicKind::UnsafePointer);
        }

        match target {
            TypeData::Basic(to_kind) => {
                let from = kind.info();
                let to_info = to_kind.info();
                if from.contains(BasicInfo::BOOLEAN) {
                    to_info.contains(BasicInfo::BOOLEAN)
                } else if from.contains(BasicInfo::STRING) {
                    to_info.contains(BasicInfo::STRING)
                } else if from.contains(BasicInfo::INTEGER) {
                    to_info.intersects(BasicInfo::NUMERIC)
                } else if from.contains(BasicInfo::FLOAT) {
                    to_info.intersects(BasicInfo::FLOAT | BasicInfo::COMPLEX)
                } else if from.contains(BasicInfo::COMPLEX) {
                    to_info.contains(BasicInfo::COMPLEX)
                } else {
                    false
                }
            }
            TypeData::Interface(_) => self.implements(self.basic(kind.default_kind()), to),
            _ => false,
        }
    }
}

impl TypeSystem for HostTypes {
    fn data(&self, ty: TypeId) -> &TypeData {
        self.table.get(ty)
    }

    fn underlying(&self, ty: TypeId) -> TypeId {
        self.table.underlying(ty)
    }

    fn lookup_field_or_method(&self, ty: TypeId, name: &str) -> Option<Member> {
        self.find_member(ty, name)
    }

    fn assignable(&self, from: TypeId, to: TypeId) -> bool {
        if from == to {
            return true;
        }

        if let TypeData::Basic(kind) = self.table.get(from) {
            if kind.is_untyped() {
                return self.assignable_untyped(*kind, to);
            }
        }

        let from_under = self.table.underlying(from);
        let to_under = self.table.underlying(to);

        if from_under == to_under && (!self.is_named(from) || !self.is_named(to)) {
            return true;
        }

        if self.table.get(to_under).as_interface().is_some() {
            return self.implements(from, to);
        }

        if let (
            TypeData::Chan {
                dir: ChanDir::Both,
                elem: from_elem,
            },
            TypeData::Chan { elem: to_elem, .. },
        ) = (self.table.get(from_under), self.table.get(to_under))
        {
            return from_elem == to_elem && (!self.is_named(from) || !self.is_named(to));
        }

        false
    }

    fn is_error_capable(&self, ty: TypeId) -> bool {
        self.implements(ty, self.table.error())
    }

    fn basic(&self, kind: BasicKind) -> TypeId {
        self.table.basic(kind)
    }

    fn type_name(&self, ty: TypeId) -> String {
        self.table.display(ty).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Field, InterfaceMethod};

    fn table_with_user() -> (TypeTable, TypeId) {
        let mut table = TypeTable::new();
        let string = table.string();
        let fields = table.struct_type(vec![
            Field::new("Name", string),
            Field::new("email", string),
        ]);
        let user = table.named(Some("example.com/app"), "User", fields);
        let greet = table.func(vec![], vec![string]);
        table.add_method(user, "Greet", greet, false).unwrap();
        let save = table.func(vec![], vec![table.error()]);
        table.add_method(user, "Save", save, true).unwrap();
        (table, user)
    }

    #[test]
    fn lookup_fields_and_methods() {
        let (table, user) = table_with_user();
        let types = HostTypes::new(table);

        assert_eq!(
            types.lookup_field_or_method(user, "Name"),
            Some(Member::Field {
                ty: types.basic(BasicKind::String)
            })
        );
        assert!(matches!(
            types.lookup_field_or_method(user, "Greet"),
            Some(Member::Method { .. })
        ));
        // pointer receiver methods are found on addressable values
        assert!(matches!(
            types.lookup_field_or_method(user, "Save"),
            Some(Member::Method { .. })
        ));
        assert_eq!(types.lookup_field_or_method(user, "Missing"), None);
    }

    #[test]
    fn lookup_through_pointer_and_embedding() {
        let (mut table, user) = table_with_user();
        let int = table.int();
        let admin_fields = table.struct_type(vec![
            Field::embedded("User", user),
            Field::new("Level", int),
        ]);
        let admin = table.named(Some("example.com/app"), "Admin", admin_fields);
        let admin_ptr = table.pointer(admin);
        let types = HostTypes::new(table);

        assert_eq!(
            types.lookup_field_or_method(admin_ptr, "Level"),
            Some(Member::Field { ty: int })
        );
        assert!(matches!(
            types.lookup_field_or_method(admin, "Name"),
            Some(Member::Field { .. })
        ));
        assert!(matches!(
            types.lookup_field_or_method(admin, "Greet"),
            Some(Member::Method { .. })
        ));
    }

    #[test]
    fn assignability_rules() {
        let (mut table, user) = table_with_user();
        let int = table.int();
        let string = table.string();
        let float = table.basic(BasicKind::Float64);
        let ints = table.slice(int);
        let celsius = table.named(Some("example.com/app"), "Celsius", float);
        let ptr = table.pointer(user);
        let any = table.any();
        let both = table.chan(ChanDir::Both, int);
        let recv = table.chan(ChanDir::Recv, int);
        let types = HostTypes::new(table);

        assert!(types.assignable(int, int));
        assert!(!types.assignable(int, string));
        assert!(types.assignable(types.basic(BasicKind::UntypedInt), float));
        assert!(types.assignable(types.basic(BasicKind::UntypedInt), celsius));
        assert!(!types.assignable(types.basic(BasicKind::UntypedFloat), int));
        assert!(!types.assignable(types.basic(BasicKind::UntypedString), int));
        assert!(types.assignable(types.basic(BasicKind::UntypedNil), ints));
        assert!(types.assignable(types.basic(BasicKind::UntypedNil), ptr));
        assert!(!types.assignable(types.basic(BasicKind::UntypedNil), int));
        assert!(!types.assignable(float, celsius));
        assert!(types.assignable(user, any));
        assert!(types.assignable(types.basic(BasicKind::UntypedBool), any));
        assert!(types.assignable(both, recv));
        assert!(!types.assignable(recv, both));
    }

    #[test]
    fn error_capability_respects_receivers() {
        let mut table = TypeTable::new();
        let string = table.string();
        let empty = table.struct_type(vec![]);
        let value_err = table.named(Some("app"), "ValueErr", empty);
        let ptr_err = table.named(Some("app"), "PtrErr", empty);
        let error_sig = table.func(vec![], vec![string]);
        table.add_method(value_err, "Error", error_sig, false).unwrap();
        table.add_method(ptr_err, "Error", error_sig, true).unwrap();
        let ptr_err_ptr = table.pointer(ptr_err);
        let error = table.error();
        let types = HostTypes::new(table);

        assert!(types.is_error_capable(error));
        assert!(types.is_error_capable(value_err));
        assert!(!types.is_error_capable(ptr_err));
        assert!(types.is_error_capable(ptr_err_ptr));
        assert!(!types.is_error_capable(string));
    }

    #[test]
    fn interface_to_interface() {
        let mut table = TypeTable::new();
        let string = table.string();
        let sig = table.func(vec![], vec![string]);
        let stringer = table.interface(vec![InterfaceMethod {
            name: "String".to_string(),
            signature: sig,
        }]);
        let both = table.interface(vec![
            InterfaceMethod {
                name: "String".to_string(),
                signature: sig,
            },
            InterfaceMethod {
                name: "Error".to_string(),
                signature: sig,
            },
        ]);
        let types = HostTypes::new(table);

        assert!(types.assignable(both, stringer));
        assert!(!types.assignable(stringer, both));
    }

    #[test]
    fn provided_helpers() {
        let (mut table, user) = table_with_user();
        let ptr = table.pointer(user);
        let ptr_ptr = table.pointer(ptr);
        let map = table.map(table.string(), user);
        let users = table.array(3, user);
        let types = HostTypes::new(table);

        assert!(types.elem(users) == Some(user));
        assert_eq!(types.key(users), None);

        assert_eq!(types.deref(ptr_ptr), user);
        assert_eq!(types.elem(map), Some(user));
        assert_eq!(types.key(map), Some(types.basic(BasicKind::String)));
        assert_eq!(
            types.concretize(types.basic(BasicKind::UntypedRune)),
            types.basic(BasicKind::Int32)
        );
        assert!(types.is_exported("Name"));
        assert!(!types.is_exported("name"));
        assert_eq!(types.type_name(ptr), "*app.User");
    }

    #[test]
    fn deref_stops_on_self_pointer() {
        let mut table = TypeTable::new();
        let p = table.declare_named(Some("app"), "P");
        let ptr = table.pointer(p);
        table.set_underlying(p, ptr).unwrap();
        let types = HostTypes::new(table);

        assert_eq!(types.deref(p), p);
        assert_eq!(types.deref(ptr), p);
        assert_eq!(types.type_name(ptr), "*app.P");
    }

    #[test]
    fn unexported_members_visible_inside_package() {
        let (table, user) = table_with_user();
        let outside = HostTypes::new(table.clone());
        let inside = HostTypes::new(table).with_package("example.com/app");

        assert_eq!(outside.lookup_field_or_method(user, "email"), None);
        assert!(inside.lookup_field_or_method(user, "email").is_some());
        assert_eq!(inside.package(), Some("example.com/app"));
    }
}

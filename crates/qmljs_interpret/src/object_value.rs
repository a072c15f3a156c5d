//! Objects: member tables, prototypes and member lookup.
//!
//! An [`ObjectValue`] carries an ordered member table and an optional
//! prototype. Its [`ObjectKind`] adds members that are computed rather than
//! stored (C++ meta-object members, QML-declared properties and signals) and
//! overrides lookup for the import scopes.

use std::sync::{Arc, Weak};

use bitflags::bitflags;
use indexmap::IndexMap;
use parking_lot::RwLock;

use crate::ast_values::AstObjectValue;
use crate::context::ContextPtr;
use crate::cpp_types::{CppComponentValue, QmlEnumValue};
use crate::imports::{self, ImportList};
use crate::member_processor::{LookupMember, MemberProcessor};
use crate::prototype_iterator::PrototypeIterator;
use crate::value::{Value, ValueRef, WeakValue};

bitflags! {
    /// Access and shape of a property.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PropertyInfo: u8 {
        const READABLE = 1;
        const WRITEABLE = 1 << 1;
        const LIST_TYPE = 1 << 2;
        const POINTER_TYPE = 1 << 3;
        const VALUE_TYPE = 1 << 4;
        const DEFAULT = Self::READABLE.bits() | Self::WRITEABLE.bits();
    }
}

impl Default for PropertyInfo {
    fn default() -> Self {
        PropertyInfo::DEFAULT
    }
}

impl PropertyInfo {
    pub fn is_readable(self) -> bool {
        self.contains(PropertyInfo::READABLE)
    }

    pub fn is_writeable(self) -> bool {
        self.contains(PropertyInfo::WRITEABLE)
    }

    pub fn is_list(self) -> bool {
        self.contains(PropertyInfo::LIST_TYPE)
    }

    pub fn is_pointer(self) -> bool {
        self.contains(PropertyInfo::POINTER_TYPE)
    }
}

#[derive(Clone)]
struct Member {
    value: WeakValue,
    info: PropertyInfo,
}

/// What kind of object an [`ObjectValue`] is.
pub enum ObjectKind {
    Plain,
    /// An instantiable C++ type.
    CppComponent(CppComponentValue),
    /// An object instantiated in a QML document.
    AstObject(AstObjectValue),
    /// A C++ enum, as the type of a property.
    QmlEnum(QmlEnumValue),
    /// Every type visible through a document's imports.
    TypeScope(ImportList),
    /// Every JavaScript file imported with an alias.
    JsImportScope(ImportList),
}

pub struct ObjectValue {
    class_name: String,
    members: RwLock<IndexMap<String, Member>>,
    prototype: RwLock<Option<WeakValue>>,
    kind: ObjectKind,
}

impl ObjectValue {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self::with_kind(class_name, ObjectKind::Plain)
    }

    pub fn with_kind(class_name: impl Into<String>, kind: ObjectKind) -> Self {
        Self {
            class_name: class_name.into(),
            members: RwLock::new(IndexMap::new()),
            prototype: RwLock::new(None),
            kind,
        }
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn kind(&self) -> &ObjectKind {
        &self.kind
    }

    /// The prototype exactly as stored; it may be a reference.
    pub fn raw_prototype(&self) -> Option<ValueRef> {
        self.prototype.read().as_ref().and_then(Weak::upgrade)
    }

    pub fn has_prototype(&self) -> bool {
        self.raw_prototype().is_some()
    }

    pub fn set_prototype(&self, prototype: Option<&ValueRef>) {
        *self.prototype.write() = prototype.map(Arc::downgrade);
    }

    pub fn set_member(&self, name: impl Into<String>, value: &ValueRef) {
        self.set_property(name, value, PropertyInfo::DEFAULT);
    }

    pub fn set_property(&self, name: impl Into<String>, value: &ValueRef, info: PropertyInfo) {
        self.members.write().insert(
            name.into(),
            Member {
                value: Arc::downgrade(value),
                info,
            },
        );
    }

    pub fn remove_member(&self, name: &str) -> bool {
        self.members.write().shift_remove(name).is_some()
    }

    /// A member of the stored table only.
    pub fn own_member(&self, name: &str) -> Option<ValueRef> {
        self.members.read().get(name).and_then(|m| m.value.upgrade())
    }

    pub fn own_member_info(&self, name: &str) -> Option<PropertyInfo> {
        self.members.read().get(name).map(|m| m.info)
    }

    /// Names of the stored table, in insertion order.
    pub fn member_names(&self) -> Vec<String> {
        self.members.read().keys().cloned().collect()
    }

    pub fn member_count(&self) -> usize {
        self.members.read().len()
    }

    /// Report every member, computed ones first, to `processor`.
    pub fn process_members(&self, processor: &mut dyn MemberProcessor) {
        let keep_going = match &self.kind {
            ObjectKind::CppComponent(component) => component.process_members(processor),
            ObjectKind::AstObject(object) => object.process_members(processor),
            ObjectKind::TypeScope(imports) => {
                imports::process_type_scope(imports, processor);
                return;
            }
            ObjectKind::JsImportScope(imports) => {
                imports::process_js_import_scope(imports, processor);
                return;
            }
            ObjectKind::Plain | ObjectKind::QmlEnum(_) => true,
        };
        if keep_going {
            self.process_own_members(processor);
        }
    }

    pub(crate) fn process_own_members(&self, processor: &mut dyn MemberProcessor) -> bool {
        let members = self.members.read();
        for (name, member) in members.iter() {
            let Some(value) = member.value.upgrade() else {
                continue;
            };
            if !processor.process_property(name, &value, member.info) {
                return false;
            }
        }
        true
    }
}

impl Value {
    /// Look `name` up on this object, then along its prototype chain.
    pub fn lookup_member(self: &Arc<Self>, name: &str, context: Option<&ContextPtr>) -> Option<ValueRef> {
        self.lookup_member_with_owner(name, context, true)
            .map(|(value, _)| value)
    }

    /// Look `name` up and also report the object that holds it.
    ///
    /// Prototypes that are references are resolved through `context`; without
    /// one the walk stops at the first reference.
    pub fn lookup_member_with_owner(
        self: &Arc<Self>,
        name: &str,
        context: Option<&ContextPtr>,
        examine_prototypes: bool,
    ) -> Option<(ValueRef, ValueRef)> {
        let object = self.as_object()?;
        match object.kind() {
            ObjectKind::TypeScope(imports) => {
                return imports::lookup_in_type_scope(self, imports, name, context)
            }
            ObjectKind::JsImportScope(imports) => {
                return imports::lookup_in_js_import_scope(self, imports, name)
            }
            _ => {}
        }

        if let Some(value) = object.own_member(name) {
            return Some((value, self.clone()));
        }
        let mut lookup = LookupMember::new(name);
        object.process_members(&mut lookup);
        if let Some(value) = lookup.into_value() {
            return Some((value, self.clone()));
        }

        if examine_prototypes {
            let mut prototypes = PrototypeIterator::new(Some(self.clone()), context);
            prototypes.next();
            for prototype in prototypes {
                if let Some(found) = prototype.lookup_member_with_owner(name, context, false) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// The prototype, with a reference resolved through `context`.
    pub fn prototype(&self, context: Option<&ContextPtr>) -> Option<ValueRef> {
        let raw = self.as_object()?.raw_prototype()?;
        if raw.is_object() {
            return Some(raw);
        }
        context?.lookup_reference(&raw).filter(|value| value.is_object())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value_owner::ValueOwner;

    #[test]
    fn test_members_keep_insertion_order() {
        let owner = ValueOwner::new();
        let object = owner.new_object(None);
        let number = owner.number_value();
        let string = owner.string_value();
        let o = object.as_object().unwrap();
        o.set_member("b", &number);
        o.set_member("a", &string);
        o.set_member("c", &number);
        assert_eq!(o.member_names(), vec!["b", "a", "c"]);
        assert!(o.remove_member("a"));
        assert_eq!(o.member_names(), vec!["b", "c"]);
        assert!(!o.remove_member("a"));
    }

    #[test]
    fn test_lookup_walks_prototypes() {
        let owner = ValueOwner::new();
        let base = owner.new_object(None);
        base.as_object().unwrap().set_member("inherited", &owner.boolean_value());
        let derived = owner.new_object(Some(&base));
        derived.as_object().unwrap().set_member("own", &owner.number_value());

        let (value, found_in) = derived
            .lookup_member_with_owner("inherited", None, true)
            .unwrap();
        assert!(value.is_boolean());
        assert!(Arc::ptr_eq(&found_in, &base));
        assert!(derived.lookup_member_with_owner("inherited", None, false).is_none());
        assert!(derived.lookup_member("own", None).unwrap().is_number());
        assert!(derived.lookup_member("missing", None).is_none());
    }

    #[test]
    fn test_shadowing_prefers_own_member() {
        let owner = ValueOwner::new();
        let base = owner.new_object(None);
        base.as_object().unwrap().set_member("x", &owner.boolean_value());
        let derived = owner.new_object(Some(&base));
        derived.as_object().unwrap().set_member("x", &owner.string_value());
        assert!(derived.lookup_member("x", None).unwrap().is_string());
    }

    #[test]
    fn test_lookup_on_non_object() {
        let owner = ValueOwner::new();
        assert!(owner.number_value().lookup_member("x", None).is_none());
    }

    #[test]
    fn test_property_info_flags() {
        let info = PropertyInfo::READABLE | PropertyInfo::LIST_TYPE;
        assert!(info.is_readable());
        assert!(!info.is_writeable());
        assert!(info.is_list());
        assert_eq!(PropertyInfo::default(), PropertyInfo::DEFAULT);
    }
}

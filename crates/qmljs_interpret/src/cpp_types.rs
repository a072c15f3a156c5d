//! Values for C++ types registered with QML.
//!
//! [`CppQmlTypes`] turns [`FakeMetaObject`] descriptions into
//! [`CppComponentValue`] objects. Every described class is reachable by its
//! C++ name in the `<cpp>` package; importing a module at a version creates
//! one value per exported type name, showing the members whose revision the
//! export allows.

use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::debug;

use qmljs_core::version::ComponentVersion;
use qmljs_metatypes::{Access, FakeMetaEnum, FakeMetaMethod, FakeMetaObject, MethodType};

use crate::function_value::FunctionKind;
use crate::member_processor::{generated_slot_name, MemberProcessor};
use crate::object_value::{ObjectKind, ObjectValue, PropertyInfo};
use crate::prototype_iterator::PrototypeIterator;
use crate::value::ValueRef;
use crate::value_owner::{shared, ValueOwner};

pub use qmljs_metatypes::CPP_PACKAGE;

/// Types in this package are visible in every document without an import.
pub const DEFAULT_PACKAGE: &str = "<default>";

/// `package/Type M.m`
pub fn qualified_name(package: &str, type_name: &str, version: ComponentVersion) -> String {
    format!("{}/{} {}", package, type_name, version)
}

// ============================================================================
// Enums and meta functions
// ============================================================================

/// A C++ enum used as a property type.
pub struct QmlEnumValue {
    name: String,
    keys: Vec<String>,
}

impl QmlEnumValue {
    pub fn new(meta_enum: &FakeMetaEnum) -> Self {
        Self {
            name: meta_enum.name.clone(),
            keys: meta_enum.keys.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn has_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k == key)
    }
}

/// A method, slot or signal of a C++ type.
pub struct MetaFunction {
    method: FakeMetaMethod,
    owner: Weak<ValueOwner>,
    module_name: String,
    import_version: ComponentVersion,
}

impl MetaFunction {
    pub fn method(&self) -> &FakeMetaMethod {
        &self.method
    }

    pub fn return_value(&self) -> ValueRef {
        let Some(owner) = self.owner.upgrade() else {
            return shared().unknown();
        };
        match self.method.return_type.as_deref() {
            None | Some("") | Some("void") => shared().undefined(),
            Some(type_name) => {
                value_for_cpp_name(&owner, type_name, &self.module_name, self.import_version, None)
            }
        }
    }

    pub fn argument(&self, index: usize) -> Option<ValueRef> {
        let owner = self.owner.upgrade()?;
        let type_name = self.method.parameter_types.get(index)?;
        Some(value_for_cpp_name(
            &owner,
            type_name,
            &self.module_name,
            self.import_version,
            None,
        ))
    }
}

// ============================================================================
// CppComponentValue
// ============================================================================

pub struct CppComponentValue {
    meta_object: Arc<FakeMetaObject>,
    module_name: String,
    component_version: ComponentVersion,
    import_version: ComponentVersion,
    meta_object_revision: i32,
    owner: Weak<ValueOwner>,
    /// One function value per meta method, by index.
    signatures: Vec<ValueRef>,
    /// Scopes of `on<Signal>` handlers, by handler name; built on first use.
    signal_scopes: RwLock<Option<FxHashMap<String, ValueRef>>>,
}

/// Create and register the value for one export of `meta_object`.
pub(crate) fn new_cpp_component(
    owner: &Arc<ValueOwner>,
    meta_object: Arc<FakeMetaObject>,
    class_name: &str,
    module_name: &str,
    component_version: ComponentVersion,
    import_version: ComponentVersion,
    meta_object_revision: i32,
) -> ValueRef {
    let signatures = meta_object
        .methods
        .iter()
        .map(|method| {
            owner.new_function_value(FunctionKind::Meta(MetaFunction {
                method: method.clone(),
                owner: Arc::downgrade(owner),
                module_name: module_name.to_string(),
                import_version,
            }))
        })
        .collect();
    let enums: Vec<(String, ValueRef)> = meta_object
        .enums
        .iter()
        .map(|meta_enum| {
            let value = owner.new_object_value(ObjectValue::with_kind(
                meta_enum.name.clone(),
                ObjectKind::QmlEnum(QmlEnumValue::new(meta_enum)),
            ));
            (meta_enum.name.clone(), value)
        })
        .collect();

    let component = CppComponentValue {
        meta_object,
        module_name: module_name.to_string(),
        component_version,
        import_version,
        meta_object_revision,
        owner: Arc::downgrade(owner),
        signatures,
        signal_scopes: RwLock::new(None),
    };
    let object = ObjectValue::with_kind(class_name, ObjectKind::CppComponent(component));
    for (name, value) in &enums {
        object.set_property(name.clone(), value, PropertyInfo::READABLE);
    }
    owner.new_object_value(object)
}

impl CppComponentValue {
    pub fn meta_object(&self) -> &Arc<FakeMetaObject> {
        &self.meta_object
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    pub fn component_version(&self) -> ComponentVersion {
        self.component_version
    }

    pub fn import_version(&self) -> ComponentVersion {
        self.import_version
    }

    pub fn meta_object_revision(&self) -> i32 {
        self.meta_object_revision
    }

    pub fn default_property_name(&self) -> Option<&str> {
        self.meta_object.default_property_name.as_deref()
    }

    /// The C++ type of a property declared by this class itself.
    pub fn property_type(&self, name: &str) -> Option<&str> {
        self.meta_object.property(name).map(|p| p.type_name.as_str())
    }

    pub fn has_local_property(&self, name: &str) -> bool {
        self.meta_object.property(name).is_some()
    }

    pub fn is_list_property(&self, name: &str) -> bool {
        self.meta_object.property(name).is_some_and(|p| p.is_list)
    }

    pub fn is_writable(&self, name: &str) -> bool {
        self.meta_object.property(name).is_some_and(|p| p.is_writable)
    }

    pub fn is_pointer(&self, name: &str) -> bool {
        self.meta_object.property(name).is_some_and(|p| p.is_pointer)
    }

    pub fn get_enum(&self, name: &str) -> Option<&FakeMetaEnum> {
        self.meta_object.enumerator(name)
    }

    pub(crate) fn process_members(&self, processor: &mut dyn MemberProcessor) -> bool {
        let mut visited = Vec::new();
        self.process_members_guarded(processor, &mut visited)
    }

    fn process_members_guarded(
        &self,
        processor: &mut dyn MemberProcessor,
        visited: &mut Vec<*const FakeMetaObject>,
    ) -> bool {
        visited.push(Arc::as_ptr(&self.meta_object));
        let Some(owner) = self.owner.upgrade() else {
            return true;
        };
        let fmo = &self.meta_object;

        for meta_enum in &fmo.enums {
            for key in &meta_enum.keys {
                if !processor.process_enumerator(key, &shared().number()) {
                    return false;
                }
            }
        }

        let mut explicit_signals: Vec<&str> = Vec::new();
        for (method, signature) in fmo.methods.iter().zip(&self.signatures) {
            if method.revision > self.meta_object_revision {
                continue;
            }
            match method.method_type {
                MethodType::Slot | MethodType::Method if method.access == Access::Public => {
                    if !processor.process_slot(&method.name, signature) {
                        return false;
                    }
                }
                MethodType::Signal if method.access != Access::Private => {
                    if !processor.process_signal(&method.name, signature) {
                        return false;
                    }
                    explicit_signals.push(&method.name);
                    if !processor.process_generated_slot(&generated_slot_name(&method.name), signature) {
                        return false;
                    }
                }
                _ => {}
            }
        }

        for property in &fmo.properties {
            if property.revision > self.meta_object_revision {
                continue;
            }
            let mut info = PropertyInfo::READABLE;
            if property.is_writable {
                info |= PropertyInfo::WRITEABLE;
            }
            if property.is_list {
                info |= PropertyInfo::LIST_TYPE;
            }
            if property.is_pointer {
                info |= PropertyInfo::POINTER_TYPE;
            } else {
                info |= PropertyInfo::VALUE_TYPE;
            }
            let value = if property.is_list {
                shared().array_instance()
            } else {
                value_for_cpp_name(
                    &owner,
                    &property.type_name,
                    &self.module_name,
                    self.import_version,
                    Some(&self.meta_object),
                )
            };
            if !processor.process_property(&property.name, &value, info) {
                return false;
            }

            // Every property has an on<Name>Changed handler, whatever its
            // notify signal is called.
            let signal_name = format!("{}Changed", property.name);
            if !explicit_signals.contains(&signal_name.as_str())
                && !processor.process_generated_slot(&generated_slot_name(&signal_name), &shared().unknown())
            {
                return false;
            }
        }

        if let Some(attached_name) = &fmo.attached_type_name {
            if let Some(attached) = owner.cpp_qml_types().object_by_cpp_name(attached_name) {
                if let Some(object) = attached.as_object() {
                    if let ObjectKind::CppComponent(component) = object.kind() {
                        if !visited.contains(&Arc::as_ptr(&component.meta_object)) {
                            if !component.process_members_guarded(processor, visited) {
                                return false;
                            }
                            if !object.process_own_members(processor) {
                                return false;
                            }
                        }
                    }
                }
            }
        }
        true
    }

    /// The scope of an `on<Signal>` handler: the signal's parameters.
    pub fn signal_scope(&self, handler_name: &str) -> Option<ValueRef> {
        if let Some(scopes) = self.signal_scopes.read().as_ref() {
            return scopes.get(handler_name).cloned();
        }

        let owner = self.owner.upgrade()?;
        let mut cache = self.signal_scopes.write();
        if let Some(scopes) = cache.as_ref() {
            return scopes.get(handler_name).cloned();
        }
        let mut scopes = FxHashMap::default();
        for method in self.meta_object.signals() {
            if method.access == Access::Private || method.revision > self.meta_object_revision {
                continue;
            }
            let scope = owner.new_object(None);
            if let Some(object) = scope.as_object() {
                for (name, type_name) in method.parameter_names.iter().zip(&method.parameter_types) {
                    if name.is_empty() {
                        continue;
                    }
                    let value = value_for_cpp_name(
                        &owner,
                        type_name,
                        &self.module_name,
                        self.import_version,
                        Some(&self.meta_object),
                    );
                    object.set_member(name.clone(), &value);
                }
            }
            scopes.insert(generated_slot_name(&method.name), scope);
        }
        let result = scopes.get(handler_name).cloned();
        *cache = Some(scopes);
        result
    }
}

/// The abstract value of a C++ type name as used by properties, method
/// parameters and return types.
///
/// Tried in order: a type of the same module and version, a C++ class, a
/// builtin QML type name, the well-known Qt value types, an enum
/// (`Class::Enum` or an enum of `this_type`). Anything else is unknown.
pub fn value_for_cpp_name(
    owner: &ValueOwner,
    type_name: &str,
    module_name: &str,
    import_version: ComponentVersion,
    this_type: Option<&Arc<FakeMetaObject>>,
) -> ValueRef {
    let types = owner.cpp_qml_types();
    if let Some(object) = types.object_by_qualified_name(module_name, type_name, import_version) {
        return object;
    }
    if let Some(object) = types.object_by_cpp_name(type_name) {
        return object;
    }

    let builtins = shared();
    let builtin = builtins.default_value_for_builtin_type(type_name);
    if !builtin.is_undefined() {
        return builtin;
    }

    match type_name {
        "QByteArray" | "QString" => return builtins.string(),
        "QUrl" => return builtins.url(),
        "long" | "uint" | "qlonglong" | "qulonglong" => return builtins.int(),
        "float" | "qreal" => return builtins.real(),
        "QFont" => return builtins.qml_font_object(),
        "QPoint" | "QPointF" | "QVector2D" => return builtins.qml_point_object(),
        "QSize" | "QSizeF" => return builtins.qml_size_object(),
        "QRect" | "QRectF" => return builtins.qml_rect_object(),
        "QVector3D" => return builtins.qml_vector3d_object(),
        "QColor" => return builtins.color(),
        "QDeclarativeAnchorLine" | "QQuickAnchorLine" => return builtins.anchor_line(),
        "QDateTime" | "QDate" | "QTime" => return builtins.date_prototype(),
        _ => {}
    }

    // Maybe an enum, either `Class::Enum` or an enum of this type.
    let (base, enum_name) = match type_name.split_once("::") {
        Some((class_name, enum_name)) => (types.object_by_cpp_name(class_name), enum_name),
        None => (
            this_type.and_then(|fmo| types.object_by_cpp_name(&fmo.class_name)),
            type_name,
        ),
    };
    if let Some(base) = base {
        for object in PrototypeIterator::new(Some(base), None) {
            if let Some(value) = object.as_object().and_then(|o| o.own_member(enum_name)) {
                if value.as_qml_enum().is_some() {
                    return value;
                }
            }
        }
    }

    builtins.unknown()
}

// ============================================================================
// CppQmlTypes
// ============================================================================

#[derive(Clone)]
struct MetaObjectWithOrigin {
    meta_object: Arc<FakeMetaObject>,
    origin: String,
    /// The package exports without one were registered under.
    unpackaged_as: String,
}

#[derive(Default)]
struct TypesState {
    by_package: FxHashMap<String, Vec<MetaObjectWithOrigin>>,
    by_qualified_name: FxHashMap<String, ValueRef>,
    exports_by_import: FxHashMap<(String, ComponentVersion), Vec<ValueRef>>,
}

/// The registry of C++ types known to a linked context.
#[derive(Default)]
pub struct CppQmlTypes {
    state: RwLock<TypesState>,
    cpp_context_properties: RwLock<Option<ValueRef>>,
}

impl CppQmlTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `objects`. Exports without a package go to
    /// `override_package`. Every class gets a value under its C++ name.
    #[tracing::instrument(level = "debug", skip(self, owner, objects), fields(objects = objects.len()))]
    pub fn load(
        &self,
        owner: &Arc<ValueOwner>,
        origin: &str,
        objects: &[Arc<FakeMetaObject>],
        override_package: Option<&str>,
    ) {
        let mut state = self.state.write();
        let mut new_cpp_types = Vec::new();
        for fmo in objects {
            for export in &fmo.exports {
                let package = if export.package.is_empty() {
                    override_package.unwrap_or_default()
                } else {
                    export.package.as_str()
                };
                let known = state.by_package.entry(package.to_string()).or_default();
                if !known.iter().any(|m| Arc::ptr_eq(&m.meta_object, fmo)) {
                    known.push(MetaObjectWithOrigin {
                        meta_object: fmo.clone(),
                        origin: origin.to_string(),
                        unpackaged_as: override_package.unwrap_or_default().to_string(),
                    });
                }

                if export.package == CPP_PACKAGE {
                    let key = qualified_name(CPP_PACKAGE, &fmo.class_name, ComponentVersion::default());
                    if state.by_qualified_name.contains_key(&key) {
                        continue;
                    }
                    let value = new_cpp_component(
                        owner,
                        fmo.clone(),
                        &fmo.class_name,
                        CPP_PACKAGE,
                        ComponentVersion::default(),
                        ComponentVersion::default(),
                        i32::MAX,
                    );
                    state.by_qualified_name.insert(key, value.clone());
                    new_cpp_types.push(value);
                }
            }
        }

        // Types loaded earlier may name a superclass that only arrives now.
        let cpp_prefix = format!("{}/", CPP_PACKAGE);
        let mut linked = 0usize;
        for (key, value) in state.by_qualified_name.iter() {
            if !key.starts_with(&cpp_prefix) {
                continue;
            }
            let (Some(object), Some(component)) = (value.as_object(), value.as_cpp_component()) else {
                continue;
            };
            if object.has_prototype() {
                continue;
            }
            let Some(superclass) = &component.meta_object.superclass_name else {
                continue;
            };
            let super_key = qualified_name(CPP_PACKAGE, superclass, ComponentVersion::default());
            if let Some(prototype) = state.by_qualified_name.get(&super_key) {
                object.set_prototype(Some(prototype));
                linked += 1;
            }
        }
        debug!(origin, objects = objects.len(), cpp_types = new_cpp_types.len(), linked, "loaded C++ types");
    }

    /// The values a `package` import at `version` makes visible, by export
    /// name. Repeated calls return the same values.
    pub fn create_objects_for_import(
        &self,
        owner: &Arc<ValueOwner>,
        package: &str,
        version: ComponentVersion,
    ) -> Vec<ValueRef> {
        let cache_key = (package.to_string(), version);
        if let Some(existing) = self.state.read().exports_by_import.get(&cache_key) {
            return existing.clone();
        }

        let mut state = self.state.write();
        if let Some(existing) = state.exports_by_import.get(&cache_key) {
            return existing.clone();
        }

        let mut exported: Vec<(String, ValueRef)> = Vec::new();
        let mut new_objects = Vec::new();
        let candidates = state.by_package.get(package).cloned().unwrap_or_default();
        for candidate in &candidates {
            let fmo = &candidate.meta_object;

            // The highest export not above `version`, per exported name.
            let mut best: Vec<&qmljs_metatypes::Export> = Vec::new();
            for export in &fmo.exports {
                let export_package = if export.package.is_empty() {
                    candidate.unpackaged_as.as_str()
                } else {
                    export.package.as_str()
                };
                if export_package != package || version < export.version {
                    continue;
                }
                match best.iter_mut().find(|b| b.type_name == export.type_name) {
                    Some(slot) if slot.version >= export.version => {}
                    Some(slot) => *slot = export,
                    None => best.push(export),
                }
            }
            if best.is_empty() {
                continue;
            }

            let key = qualified_name(package, &fmo.class_name, version);
            if state.by_qualified_name.contains_key(&key) {
                continue;
            }

            let mut cpp_version = ComponentVersion::default();
            for export in best {
                let (name, is_exported) = if export.type_name.is_empty() {
                    (fmo.class_name.clone(), false)
                } else {
                    (export.type_name.clone(), true)
                };
                let component = new_cpp_component(
                    owner,
                    fmo.clone(),
                    &name,
                    package,
                    export.version,
                    version,
                    export.meta_object_revision,
                );
                if cpp_version <= export.version {
                    cpp_version = export.version;
                    state.by_qualified_name.insert(key.clone(), component.clone());
                }
                if is_exported {
                    match exported.iter_mut().find(|(n, _)| *n == name) {
                        Some((_, existing)) => {
                            let newer = existing
                                .as_cpp_component()
                                .is_some_and(|c| c.component_version < export.version);
                            if newer {
                                *existing = component.clone();
                            }
                        }
                        None => exported.push((name, component.clone())),
                    }
                }
                new_objects.push(component);
            }
        }

        // Link prototypes within the module first, so that the superclass
        // seen through an import has the import's revision.
        for object in &new_objects {
            let mut current = object.clone();
            loop {
                let Some(component) = current.as_cpp_component() else {
                    break;
                };
                if current.as_object().is_some_and(ObjectValue::has_prototype) {
                    break;
                }
                let Some(superclass) = component.meta_object.superclass_name.clone() else {
                    break;
                };

                let key = qualified_name(package, &superclass, version);
                if let Some(prototype) = state.by_qualified_name.get(&key).cloned() {
                    if let Some(o) = current.as_object() {
                        o.set_prototype(Some(&prototype));
                    }
                    break;
                }

                let cpp_key = qualified_name(CPP_PACKAGE, &superclass, ComponentVersion::default());
                let Some(cpp_prototype) = state.by_qualified_name.get(&cpp_key).cloned() else {
                    break;
                };
                let Some(prototype_fmo) = cpp_prototype
                    .as_cpp_component()
                    .map(|c| c.meta_object.clone())
                else {
                    break;
                };
                let prototype = new_cpp_component(
                    owner,
                    prototype_fmo,
                    &superclass,
                    package,
                    ComponentVersion::default(),
                    version,
                    i32::MAX,
                );
                state.by_qualified_name.insert(key, prototype.clone());
                if let Some(o) = current.as_object() {
                    o.set_prototype(Some(&prototype));
                }
                current = prototype;
            }
        }

        let exported: Vec<ValueRef> = exported.into_iter().map(|(_, value)| value).collect();
        debug!(package, %version, types = exported.len(), "created import objects");
        state.exports_by_import.insert(cache_key, exported.clone());
        exported
    }

    pub fn has_module(&self, package: &str) -> bool {
        self.state
            .read()
            .by_package
            .get(package)
            .is_some_and(|objects| !objects.is_empty())
    }

    /// Every package with at least one described class, sorted.
    pub fn packages(&self) -> Vec<String> {
        let mut packages: Vec<String> = self.state.read().by_package.keys().cloned().collect();
        packages.sort();
        packages
    }

    /// The described classes exported into `package`, with the origin each
    /// was loaded from.
    pub fn meta_objects_in_package(&self, package: &str) -> Vec<(Arc<FakeMetaObject>, String)> {
        self.state
            .read()
            .by_package
            .get(package)
            .map(|objects| {
                objects
                    .iter()
                    .map(|m| (m.meta_object.clone(), m.origin.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn object_by_qualified_name_str(&self, name: &str) -> Option<ValueRef> {
        self.state.read().by_qualified_name.get(name).cloned()
    }

    pub fn object_by_qualified_name(
        &self,
        package: &str,
        type_name: &str,
        version: ComponentVersion,
    ) -> Option<ValueRef> {
        self.object_by_qualified_name_str(&qualified_name(package, type_name, version))
    }

    pub fn object_by_cpp_name(&self, cpp_name: &str) -> Option<ValueRef> {
        self.object_by_qualified_name(CPP_PACKAGE, cpp_name, ComponentVersion::default())
    }

    pub fn set_cpp_context_properties(&self, properties: ValueRef) {
        *self.cpp_context_properties.write() = Some(properties);
    }

    pub fn cpp_context_properties(&self) -> Option<ValueRef> {
        self.cpp_context_properties.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member_processor::{CollectMembers, MemberKind};
    use qmljs_metatypes::{FakeMetaMethod, FakeMetaProperty};

    fn v(major: i32, minor: i32) -> ComponentVersion {
        ComponentVersion::new(major, minor)
    }

    fn with_cpp(mut fmo: FakeMetaObject) -> Arc<FakeMetaObject> {
        fmo.ensure_cpp_export();
        Arc::new(fmo)
    }

    fn sample_types() -> Vec<Arc<FakeMetaObject>> {
        vec![
            with_cpp(
                FakeMetaObject::new("QObject")
                    .with_property(FakeMetaProperty::new("objectName", "QString"))
                    .with_method(
                        FakeMetaMethod::new("objectNameChanged", MethodType::Signal)
                            .with_parameter("objectName", "QString"),
                    ),
            ),
            with_cpp(
                FakeMetaObject::new("QQuickItem")
                    .with_superclass("QObject")
                    .with_export("QtQuick", "Item", v(2, 0))
                    .with_property(FakeMetaProperty::new("width", "qreal"))
                    .with_property(FakeMetaProperty::new("parent", "QQuickItem").pointer())
                    .with_property(FakeMetaProperty::new("children", "QQuickItem").list().pointer())
                    .with_property(FakeMetaProperty::new("antialiasing", "bool").with_revision(1))
                    .with_method(FakeMetaMethod::new("forceActiveFocus", MethodType::Method))
                    .with_enum(FakeMetaEnum::new("TransformOrigin", &["TopLeft", "Center"]))
                    .with_property(FakeMetaProperty::new("transformOrigin", "TransformOrigin")),
            ),
            {
                let mut fmo = FakeMetaObject::new("QQuickRectangle").with_superclass("QQuickItem");
                fmo.add_export("QtQuick", "Rectangle", v(2, 0), 0);
                fmo.add_export("QtQuick", "Rectangle", v(2, 5), 1);
                with_cpp(
                    fmo.with_property(FakeMetaProperty::new("color", "QColor"))
                        .with_property(FakeMetaProperty::new("radius", "qreal").with_revision(1)),
                )
            },
        ]
    }

    fn loaded() -> Arc<ValueOwner> {
        let owner = ValueOwner::new();
        owner.cpp_qml_types().load(&owner, "test", &sample_types(), None);
        owner
    }

    fn find<'a>(values: &'a [ValueRef], name: &str) -> &'a ValueRef {
        values
            .iter()
            .find(|v| v.as_object().is_some_and(|o| o.class_name() == name))
            .unwrap_or_else(|| panic!("{name} not exported"))
    }

    #[test]
    fn test_cpp_names_and_prototypes() {
        let owner = loaded();
        let types = owner.cpp_qml_types();
        let item = types.object_by_cpp_name("QQuickItem").unwrap();
        let object = types.object_by_cpp_name("QObject").unwrap();
        assert!(Arc::ptr_eq(&item.prototype(None).unwrap(), &object));
        assert!(types.has_module("QtQuick"));
        assert!(types.has_module(CPP_PACKAGE));
        assert!(!types.has_module("QtQuick.Controls"));
    }

    #[test]
    fn test_superclass_loaded_later_links_earlier_types() {
        let types = sample_types();
        let owner = ValueOwner::new();
        let cpp_types = owner.cpp_qml_types();
        cpp_types.load(&owner, "derived", &types[2..], None);
        let rect = cpp_types.object_by_cpp_name("QQuickRectangle").unwrap();
        assert!(rect.prototype(None).is_none());

        cpp_types.load(&owner, "base", &types[..2], None);
        let item = cpp_types.object_by_cpp_name("QQuickItem").unwrap();
        assert!(Arc::ptr_eq(&rect.prototype(None).unwrap(), &item));
        assert!(rect.lookup_member("width", None).is_some());
    }

    #[test]
    fn test_signal_scope_is_built_once() {
        let owner = loaded();
        let object = owner.cpp_qml_types().object_by_cpp_name("QObject").unwrap();
        let component = object.as_cpp_component().unwrap();
        let scopes: Vec<ValueRef> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..4)
                .map(|_| s.spawn(|| component.signal_scope("onObjectNameChanged").unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(scopes.iter().all(|scope| Arc::ptr_eq(scope, &scopes[0])));
    }

    #[test]
    fn test_import_picks_best_version() {
        let owner = loaded();
        let types = owner.cpp_qml_types();

        let old = types.create_objects_for_import(&owner, "QtQuick", v(2, 0));
        let rect = find(&old, "Rectangle").as_cpp_component().unwrap();
        assert_eq!(rect.component_version(), v(2, 0));
        assert_eq!(rect.meta_object_revision(), 0);

        let new = types.create_objects_for_import(&owner, "QtQuick", v(2, 15));
        let rect = find(&new, "Rectangle");
        assert_eq!(rect.as_cpp_component().unwrap().component_version(), v(2, 5));
        assert!(rect.lookup_member("radius", None).is_some());
        assert!(find(&old, "Rectangle").lookup_member("radius", None).is_none());

        assert!(types.create_objects_for_import(&owner, "QtQuick", v(1, 0)).is_empty());
    }

    #[test]
    fn test_import_is_cached() {
        let owner = loaded();
        let types = owner.cpp_qml_types();
        let first = types.create_objects_for_import(&owner, "QtQuick", v(2, 0));
        let count = owner.registered_count();
        let second = types.create_objects_for_import(&owner, "QtQuick", v(2, 0));
        assert_eq!(first.len(), second.len());
        assert!(Arc::ptr_eq(find(&first, "Item"), find(&second, "Item")));
        assert_eq!(owner.registered_count(), count);
    }

    #[test]
    fn test_imported_prototype_chain() {
        let owner = loaded();
        let objects = owner.cpp_qml_types().create_objects_for_import(&owner, "QtQuick", v(2, 0));
        let rect = find(&objects, "Rectangle");
        let item = rect.prototype(None).unwrap();
        assert!(Arc::ptr_eq(&item, find(&objects, "Item")));
        // QObject is not exported to QtQuick; a module copy is made.
        let object = item.prototype(None).unwrap();
        assert_eq!(object.as_object().unwrap().class_name(), "QObject");
        assert_eq!(object.as_cpp_component().unwrap().module_name(), "QtQuick");
        assert!(rect.lookup_member("objectName", None).unwrap().is_string());
    }

    #[test]
    fn test_member_processing() {
        let owner = loaded();
        let objects = owner.cpp_qml_types().create_objects_for_import(&owner, "QtQuick", v(2, 0));
        let item = find(&objects, "Item");
        let mut collect = CollectMembers::new();
        item.as_object().unwrap().process_members(&mut collect);
        let kind_of = |name: &str| collect.members.iter().find(|m| m.name == name).map(|m| m.kind);

        assert_eq!(kind_of("TopLeft"), Some(MemberKind::Enumerator));
        assert_eq!(kind_of("forceActiveFocus"), Some(MemberKind::Slot));
        assert_eq!(kind_of("width"), Some(MemberKind::Property));
        assert_eq!(kind_of("onWidthChanged"), Some(MemberKind::GeneratedSlot));
        assert_eq!(kind_of("antialiasing"), None, "revision 1 is hidden at 2.0");
        assert_eq!(kind_of("TransformOrigin"), Some(MemberKind::Property));

        let width = item.lookup_member("width", None).unwrap();
        assert_eq!(width.number_kind(), Some(crate::value::NumberKind::Real));
        let parent = item.lookup_member("parent", None).unwrap();
        assert!(Arc::ptr_eq(&parent, find(&objects, "Item")));
        assert!(item.lookup_member("children", None).unwrap().lookup_member("length", None).is_some());
        let origin = item.lookup_member("transformOrigin", None).unwrap();
        assert!(origin.as_qml_enum().unwrap().has_key("Center"));
    }

    #[test]
    fn test_signal_scope() {
        let owner = loaded();
        let object = owner.cpp_qml_types().object_by_cpp_name("QObject").unwrap();
        let component = object.as_cpp_component().unwrap();
        let scope = component.signal_scope("onObjectNameChanged").unwrap();
        assert!(scope.lookup_member("objectName", None).unwrap().is_string());
        assert!(component.signal_scope("onMissing").is_none());
        // The property's generated handler is the explicit signal's.
        let mut collect = CollectMembers::new();
        object.as_object().unwrap().process_members(&mut collect);
        let handlers = collect
            .members
            .iter()
            .filter(|m| m.name == "onObjectNameChanged")
            .count();
        assert_eq!(handlers, 1);
    }

    #[test]
    fn test_value_for_cpp_name() {
        let owner = loaded();
        let enum_value = value_for_cpp_name(&owner, "QQuickItem::TransformOrigin", "", ComponentVersion::default(), None);
        assert!(enum_value.as_qml_enum().is_some());
        assert!(value_for_cpp_name(&owner, "QString", "", ComponentVersion::default(), None).is_string());
        assert!(value_for_cpp_name(&owner, "QColor", "", ComponentVersion::default(), None).is_color());
        assert!(value_for_cpp_name(&owner, "QQuickAnchorLine", "", ComponentVersion::default(), None).is_anchor_line());
        assert!(value_for_cpp_name(&owner, "QVariant", "", ComponentVersion::default(), None).is_unknown());
        assert!(value_for_cpp_name(&owner, "QObject", "", ComponentVersion::default(), None).as_cpp_component().is_some());
    }
}

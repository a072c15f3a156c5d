//! Static descriptions of C++ types exposed to QML.
//!
//! A [`FakeMetaObject`] mirrors what the Qt meta-object system knows about
//! a class: its superclass, properties, methods, signals, enums and the
//! `(module, name, version)` triples under which QML can instantiate it.

use qmljs_core::version::ComponentVersion;

/// Package name under which every described class is reachable by its
/// C++ class name.
pub const CPP_PACKAGE: &str = "<cpp>";

/// One `(module, type name, version)` under which a class is exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub package: String,
    pub type_name: String,
    pub version: ComponentVersion,
    /// The meta-object revision visible through this export. Members with a
    /// higher revision are hidden.
    pub meta_object_revision: i32,
}

impl Export {
    pub fn is_valid(&self) -> bool {
        !self.type_name.is_empty() && (self.version.is_valid() || self.package == CPP_PACKAGE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodType {
    #[default]
    Method,
    Slot,
    Signal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    Private,
    Protected,
    #[default]
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FakeMetaMethod {
    pub name: String,
    pub method_type: MethodType,
    pub access: Access,
    /// `None` or `void` for methods without a result.
    pub return_type: Option<String>,
    pub parameter_names: Vec<String>,
    pub parameter_types: Vec<String>,
    pub revision: i32,
}

impl FakeMetaMethod {
    pub fn new(name: impl Into<String>, method_type: MethodType) -> Self {
        Self {
            name: name.into(),
            method_type,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.parameter_names.push(name.into());
        self.parameter_types.push(type_name.into());
        self
    }

    pub fn with_return_type(mut self, type_name: impl Into<String>) -> Self {
        self.return_type = Some(type_name.into());
        self
    }

    pub fn with_revision(mut self, revision: i32) -> Self {
        self.revision = revision;
        self
    }

    pub fn with_access(mut self, access: Access) -> Self {
        self.access = access;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMetaProperty {
    pub name: String,
    pub type_name: String,
    pub is_list: bool,
    pub is_writable: bool,
    pub is_pointer: bool,
    pub revision: i32,
}

impl FakeMetaProperty {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            is_list: false,
            is_writable: true,
            is_pointer: false,
            revision: 0,
        }
    }

    pub fn pointer(mut self) -> Self {
        self.is_pointer = true;
        self
    }

    pub fn list(mut self) -> Self {
        self.is_list = true;
        self
    }

    pub fn readonly(mut self) -> Self {
        self.is_writable = false;
        self
    }

    pub fn with_revision(mut self, revision: i32) -> Self {
        self.revision = revision;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMetaEnum {
    pub name: String,
    pub keys: Vec<String>,
}

impl FakeMetaEnum {
    pub fn new(name: impl Into<String>, keys: &[&str]) -> Self {
        Self {
            name: name.into(),
            keys: keys.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// The description of one C++ class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FakeMetaObject {
    pub class_name: String,
    pub superclass_name: Option<String>,
    pub attached_type_name: Option<String>,
    pub default_property_name: Option<String>,
    pub exports: Vec<Export>,
    pub properties: Vec<FakeMetaProperty>,
    pub methods: Vec<FakeMetaMethod>,
    pub enums: Vec<FakeMetaEnum>,
    pub is_singleton: bool,
    pub is_creatable: bool,
    pub is_composite: bool,
}

impl FakeMetaObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            superclass_name: None,
            attached_type_name: None,
            default_property_name: None,
            exports: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            enums: Vec::new(),
            is_singleton: false,
            is_creatable: true,
            is_composite: false,
        }
    }

    pub fn with_superclass(mut self, name: impl Into<String>) -> Self {
        self.superclass_name = Some(name.into());
        self
    }

    pub fn with_attached_type(mut self, name: impl Into<String>) -> Self {
        self.attached_type_name = Some(name.into());
        self
    }

    pub fn with_default_property(mut self, name: impl Into<String>) -> Self {
        self.default_property_name = Some(name.into());
        self
    }

    pub fn with_export(mut self, package: &str, type_name: &str, version: ComponentVersion) -> Self {
        self.add_export(package, type_name, version, 0);
        self
    }

    pub fn with_property(mut self, property: FakeMetaProperty) -> Self {
        self.properties.push(property);
        self
    }

    pub fn with_method(mut self, method: FakeMetaMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn with_enum(mut self, meta_enum: FakeMetaEnum) -> Self {
        self.enums.push(meta_enum);
        self
    }

    pub fn add_export(
        &mut self,
        package: &str,
        type_name: &str,
        version: ComponentVersion,
        meta_object_revision: i32,
    ) {
        self.exports.push(Export {
            package: package.to_string(),
            type_name: type_name.to_string(),
            version,
            meta_object_revision,
        });
    }

    /// Make the class reachable by its C++ name, unless it already is.
    pub fn ensure_cpp_export(&mut self) {
        if self.export_in_package(CPP_PACKAGE).is_none() {
            let class_name = self.class_name.clone();
            self.add_export(CPP_PACKAGE, &class_name, ComponentVersion::default(), 0);
        }
    }

    /// The first export into `package`.
    pub fn export_in_package(&self, package: &str) -> Option<&Export> {
        self.exports.iter().find(|e| e.package == package)
    }

    pub fn property(&self, name: &str) -> Option<&FakeMetaProperty> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub fn enumerator(&self, name: &str) -> Option<&FakeMetaEnum> {
        self.enums.iter().find(|e| e.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a FakeMetaMethod> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn signals(&self) -> impl Iterator<Item = &FakeMetaMethod> {
        self.methods
            .iter()
            .filter(|m| m.method_type == MethodType::Signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_and_queries() {
        let fmo = FakeMetaObject::new("QQuickListView")
            .with_superclass("QQuickItem")
            .with_export("QtQuick", "ListView", ComponentVersion::new(2, 0))
            .with_property(FakeMetaProperty::new("count", "int").readonly())
            .with_method(FakeMetaMethod::new("countChanged", MethodType::Signal))
            .with_enum(FakeMetaEnum::new("PositionMode", &["Beginning", "Center", "End"]));

        assert_eq!(fmo.superclass_name.as_deref(), Some("QQuickItem"));
        assert!(!fmo.property("count").unwrap().is_writable);
        assert_eq!(fmo.enumerator("PositionMode").unwrap().keys.len(), 3);
        assert_eq!(fmo.signals().count(), 1);
        assert_eq!(fmo.export_in_package("QtQuick").unwrap().type_name, "ListView");
    }

    #[test]
    fn test_ensure_cpp_export_is_idempotent() {
        let mut fmo = FakeMetaObject::new("QObject");
        fmo.ensure_cpp_export();
        fmo.ensure_cpp_export();
        assert_eq!(fmo.exports.len(), 1);
        let export = fmo.export_in_package(CPP_PACKAGE).unwrap();
        assert_eq!(export.type_name, "QObject");
        assert!(export.is_valid());
    }
}

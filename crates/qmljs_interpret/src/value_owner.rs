//! Ownership of values.
//!
//! A [`ValueOwner`] holds a strong handle to every value registered with it,
//! so dropping the owner releases them all. Registration takes a mutex and
//! may happen from several analysis threads at once.
//!
//! Values shared by every owner (the primitives, the JavaScript builtins and
//! the global object) live in one immutable
//! [`SharedValueOwner`](crate::builtins::SharedValueOwner), built on first
//! use and reached through [`shared`].

use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::ContextPtr;
use crate::cpp_types::CppQmlTypes;
use crate::function_value::{FunctionKind, FunctionValue, NativeFunction};
use crate::object_value::ObjectValue;
use crate::reference::Reference;
use crate::value::{NumberKind, StringKind, Value, ValueRef, ValueVisitor};

pub use crate::builtins::{shared, SharedValueOwner};

pub struct ValueOwner {
    values: Mutex<Vec<ValueRef>>,
    cpp_qml_types: CppQmlTypes,
}

impl std::fmt::Debug for ValueOwner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueOwner")
            .field("values", &self.registered_count())
            .finish()
    }
}

impl ValueOwner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            values: Mutex::new(Vec::new()),
            cpp_qml_types: CppQmlTypes::new(),
        })
    }

    /// Take ownership of `value` and hand out a shared handle to it.
    pub fn register(&self, value: Value) -> ValueRef {
        let value = Arc::new(value);
        self.values.lock().push(value.clone());
        value
    }

    pub fn registered_count(&self) -> usize {
        self.values.lock().len()
    }

    pub fn cpp_qml_types(&self) -> &CppQmlTypes {
        &self.cpp_qml_types
    }

    pub fn builtins(&self) -> &'static SharedValueOwner {
        shared()
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    pub fn new_object(&self, prototype: Option<&ValueRef>) -> ValueRef {
        self.new_object_with_class("", prototype)
    }

    pub fn new_object_with_class(&self, class_name: &str, prototype: Option<&ValueRef>) -> ValueRef {
        let object = ObjectValue::new(class_name);
        object.set_prototype(prototype);
        self.new_object_value(object)
    }

    pub fn new_object_value(&self, object: ObjectValue) -> ValueRef {
        self.register(Value::Object(object))
    }

    pub fn new_function(&self, native: NativeFunction) -> ValueRef {
        self.new_function_value(FunctionKind::Native(native))
    }

    pub fn new_function_value(&self, kind: FunctionKind) -> ValueRef {
        let builtins = shared();
        let object = ObjectValue::new("Function");
        object.set_member("length", &builtins.number());
        object.set_prototype(Some(&builtins.function_prototype()));
        self.register(Value::Function(FunctionValue::new(object, kind)))
    }

    pub fn new_reference(&self, reference: Reference) -> ValueRef {
        self.register(Value::Reference(reference))
    }

    // ------------------------------------------------------------------
    // Shared values
    // ------------------------------------------------------------------

    pub fn null_value(&self) -> ValueRef {
        shared().null()
    }

    pub fn undefined_value(&self) -> ValueRef {
        shared().undefined()
    }

    pub fn unknown_value(&self) -> ValueRef {
        shared().unknown()
    }

    pub fn number_value(&self) -> ValueRef {
        shared().number()
    }

    pub fn int_value(&self) -> ValueRef {
        shared().int()
    }

    pub fn real_value(&self) -> ValueRef {
        shared().real()
    }

    pub fn boolean_value(&self) -> ValueRef {
        shared().boolean()
    }

    pub fn string_value(&self) -> ValueRef {
        shared().string()
    }

    pub fn url_value(&self) -> ValueRef {
        shared().url()
    }

    pub fn color_value(&self) -> ValueRef {
        shared().color()
    }

    pub fn anchor_line_value(&self) -> ValueRef {
        shared().anchor_line()
    }

    pub fn global_object(&self) -> ValueRef {
        shared().global_object()
    }

    /// The value of a property declared with a builtin QML type name;
    /// `undefined` when `name` is not one.
    pub fn default_value_for_builtin_type(&self, name: &str) -> ValueRef {
        shared().default_value_for_builtin_type(name)
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    pub fn convert_to_boolean(&self, _value: &ValueRef) -> ValueRef {
        shared().boolean()
    }

    /// `ToNumber`: numbers stay as they are, objects go through `valueOf`.
    pub fn convert_to_number(&self, value: &ValueRef, context: Option<&ContextPtr>) -> ValueRef {
        let mut convert = ConvertToPrimitive {
            value,
            context,
            target: Primitive::Number,
            result: None,
        };
        value.accept(&mut convert);
        convert.result.unwrap_or_else(|| shared().number())
    }

    /// `ToString`: strings stay as they are, objects go through `toString`.
    pub fn convert_to_string(&self, value: &ValueRef, context: Option<&ContextPtr>) -> ValueRef {
        let mut convert = ConvertToPrimitive {
            value,
            context,
            target: Primitive::String,
            result: None,
        };
        value.accept(&mut convert);
        convert.result.unwrap_or_else(|| shared().string())
    }

    /// `ToObject`: primitives are boxed into their wrapper instances; `null`,
    /// `undefined` and values without a wrapper have no object form.
    pub fn convert_to_object(&self, value: &ValueRef) -> Option<ValueRef> {
        let builtins = shared();
        match &**value {
            Value::Object(_) | Value::Function(_) => Some(value.clone()),
            Value::Number(_) => Some(builtins.number_instance()),
            Value::Boolean => Some(builtins.boolean_instance()),
            Value::String(_) => Some(builtins.string_instance()),
            _ => None,
        }
    }

    /// The name of the value's type as JavaScript code would see it.
    pub fn type_id(&self, value: &Value) -> String {
        let mut type_id = TypeId::default();
        value.accept(&mut type_id);
        type_id.result
    }
}

#[derive(Clone, Copy)]
enum Primitive {
    Number,
    String,
}

struct ConvertToPrimitive<'a> {
    value: &'a ValueRef,
    context: Option<&'a ContextPtr>,
    target: Primitive,
    result: Option<ValueRef>,
}

impl ConvertToPrimitive<'_> {
    fn target_value(&self) -> ValueRef {
        match self.target {
            Primitive::Number => shared().number(),
            Primitive::String => shared().string(),
        }
    }

    fn from_method(&mut self) {
        let method = match self.target {
            Primitive::Number => "valueOf",
            Primitive::String => "toString",
        };
        let returned = self
            .value
            .lookup_member(method, self.context)
            .and_then(|member| member.as_function().map(FunctionValue::return_value));
        self.result = match (self.target, returned) {
            (Primitive::Number, Some(r)) if r.is_number() => Some(r),
            (Primitive::String, Some(r)) if r.is_string() => Some(r),
            _ => Some(self.target_value()),
        };
    }
}

impl ValueVisitor for ConvertToPrimitive<'_> {
    fn visit_number(&mut self, _kind: NumberKind) {
        self.result = Some(match self.target {
            Primitive::Number => self.value.clone(),
            Primitive::String => shared().string(),
        });
    }

    fn visit_string(&mut self, _kind: StringKind) {
        self.result = Some(match self.target {
            Primitive::Number => shared().number(),
            Primitive::String => self.value.clone(),
        });
    }

    fn visit_object(&mut self, _object: &ObjectValue) {
        self.from_method();
    }

    fn visit_function(&mut self, _function: &FunctionValue) {
        self.from_method();
    }
}

struct TypeId {
    result: String,
}

impl Default for TypeId {
    fn default() -> Self {
        Self {
            result: "unknown".to_string(),
        }
    }
}

impl ValueVisitor for TypeId {
    fn visit_null(&mut self) {
        self.result = "null".to_string();
    }

    fn visit_undefined(&mut self) {
        self.result = "undefined".to_string();
    }

    fn visit_number(&mut self, _kind: NumberKind) {
        self.result = "number".to_string();
    }

    fn visit_boolean(&mut self) {
        self.result = "boolean".to_string();
    }

    fn visit_string(&mut self, _kind: StringKind) {
        self.result = "string".to_string();
    }

    fn visit_color(&mut self) {
        self.result = "string".to_string();
    }

    fn visit_anchor_line(&mut self) {
        self.result = "AnchorLine".to_string();
    }

    fn visit_object(&mut self, object: &ObjectValue) {
        self.result = match object.class_name() {
            "" => "object".to_string(),
            name => name.to_string(),
        };
    }

    fn visit_function(&mut self, function: &FunctionValue) {
        self.result = match function.object().class_name() {
            "" => "Function".to_string(),
            name => name.to_string(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_and_drop() {
        let owner = ValueOwner::new();
        let object = owner.new_object(None);
        let weak = Arc::downgrade(&object);
        assert_eq!(owner.registered_count(), 1);
        drop(object);
        assert!(weak.upgrade().is_some(), "owner keeps its values alive");
        drop(owner);
        assert!(weak.upgrade().is_none(), "dropping the owner releases its values");
        assert!(shared().null().is_null());
    }

    #[test]
    fn test_default_values_for_builtin_types() {
        let owner = ValueOwner::new();
        assert_eq!(owner.default_value_for_builtin_type("int").number_kind(), Some(NumberKind::Int));
        assert_eq!(owner.default_value_for_builtin_type("real").number_kind(), Some(NumberKind::Real));
        assert_eq!(owner.default_value_for_builtin_type("double").number_kind(), Some(NumberKind::Real));
        assert!(owner.default_value_for_builtin_type("bool").is_boolean());
        assert_eq!(owner.default_value_for_builtin_type("url").string_kind(), Some(StringKind::Url));
        assert!(owner.default_value_for_builtin_type("color").is_color());
        assert!(owner.default_value_for_builtin_type("var").is_unknown());
        assert!(owner.default_value_for_builtin_type("variant").is_unknown());
        assert!(Arc::ptr_eq(
            &owner.default_value_for_builtin_type("date"),
            &shared().date_prototype()
        ));
        assert!(owner.default_value_for_builtin_type("Item").is_undefined());
    }

    #[test]
    fn test_conversions() {
        let owner = ValueOwner::new();
        let int = owner.int_value();
        assert!(Arc::ptr_eq(&owner.convert_to_number(&int, None), &int));
        assert!(owner.convert_to_number(&owner.string_value(), None).is_number());
        assert!(owner.convert_to_string(&owner.number_value(), None).is_string());
        assert!(owner.convert_to_boolean(&owner.null_value()).is_boolean());

        let date = owner.new_object(Some(&shared().date_prototype()));
        assert!(owner.convert_to_number(&date, None).is_number());
        assert!(owner.convert_to_string(&date, None).is_string());

        assert!(owner.convert_to_object(&owner.null_value()).is_none());
        assert!(owner.convert_to_object(&owner.undefined_value()).is_none());
        let boxed = owner.convert_to_object(&owner.string_value()).unwrap();
        assert!(boxed.lookup_member("charAt", None).unwrap().is_function());
        assert!(Arc::ptr_eq(&owner.convert_to_object(&date).unwrap(), &date));
    }

    #[test]
    fn test_type_id() {
        let owner = ValueOwner::new();
        assert_eq!(owner.type_id(&Value::Null), "null");
        assert_eq!(owner.type_id(&Value::Number(NumberKind::Int)), "number");
        assert_eq!(owner.type_id(&Value::Color), "string");
        assert_eq!(owner.type_id(&owner.new_object(None)), "object");
        assert_eq!(owner.type_id(&owner.new_object_with_class("Rect", None)), "Rect");
        assert_eq!(owner.type_id(&Value::Unknown), "unknown");
    }
}

//! The value lattice.
//!
//! Every abstract value the analysis produces is a [`Value`]. Values are
//! shared through [`ValueRef`] handles and owned by a
//! [`ValueOwner`](crate::value_owner::ValueOwner), which keeps them alive for
//! as long as the owner itself. Members and prototypes point to other values
//! through [`WeakValue`] so that graphs of values never keep each other alive.
//!
//! Kind dispatch is a plain `match`; [`ValueVisitor`] is available for code
//! that wants one callback per kind.

use std::fmt;
use std::sync::{Arc, Weak};

use crate::ast_values::AstObjectValue;
use crate::cpp_types::{CppComponentValue, QmlEnumValue};
use crate::function_value::FunctionValue;
use crate::object_value::{ObjectKind, ObjectValue};
use crate::reference::Reference;

pub type ValueRef = Arc<Value>;
pub type WeakValue = Weak<Value>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumberKind {
    Plain,
    Int,
    Real,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringKind {
    Plain,
    Url,
}

/// An abstract JavaScript/QML value.
pub enum Value {
    Null,
    Undefined,
    /// Nothing is known about the value.
    Unknown,
    Number(NumberKind),
    Boolean,
    String(StringKind),
    Color,
    AnchorLine,
    Object(ObjectValue),
    Function(FunctionValue),
    /// A value that must be computed on demand, see
    /// [`ReferenceContext`](crate::reference_context::ReferenceContext).
    Reference(Reference),
}

/// One callback per value kind.
pub trait ValueVisitor {
    fn visit_null(&mut self) {}
    fn visit_undefined(&mut self) {}
    fn visit_unknown(&mut self) {}
    fn visit_number(&mut self, _kind: NumberKind) {}
    fn visit_boolean(&mut self) {}
    fn visit_string(&mut self, _kind: StringKind) {}
    fn visit_color(&mut self) {}
    fn visit_anchor_line(&mut self) {}
    fn visit_object(&mut self, _object: &ObjectValue) {}
    fn visit_function(&mut self, _function: &FunctionValue) {}
    fn visit_reference(&mut self, _reference: &Reference) {}
}

impl Value {
    pub fn accept(&self, visitor: &mut dyn ValueVisitor) {
        match self {
            Value::Null => visitor.visit_null(),
            Value::Undefined => visitor.visit_undefined(),
            Value::Unknown => visitor.visit_unknown(),
            Value::Number(kind) => visitor.visit_number(*kind),
            Value::Boolean => visitor.visit_boolean(),
            Value::String(kind) => visitor.visit_string(*kind),
            Value::Color => visitor.visit_color(),
            Value::AnchorLine => visitor.visit_anchor_line(),
            Value::Object(object) => visitor.visit_object(object),
            Value::Function(function) => visitor.visit_function(function),
            Value::Reference(reference) => visitor.visit_reference(reference),
        }
    }

    /// The object part of objects and functions.
    pub fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Value::Object(object) => Some(object),
            Value::Function(function) => Some(function.object()),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&FunctionValue> {
        match self {
            Value::Function(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    pub fn as_cpp_component(&self) -> Option<&CppComponentValue> {
        match self.as_object()?.kind() {
            ObjectKind::CppComponent(component) => Some(component),
            _ => None,
        }
    }

    pub fn as_ast_object(&self) -> Option<&AstObjectValue> {
        match self.as_object()?.kind() {
            ObjectKind::AstObject(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_qml_enum(&self) -> Option<&QmlEnumValue> {
        match self.as_object()?.kind() {
            ObjectKind::QmlEnum(value) => Some(value),
            _ => None,
        }
    }

    pub fn number_kind(&self) -> Option<NumberKind> {
        match self {
            Value::Number(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn string_kind(&self) -> Option<StringKind> {
        match self {
            Value::String(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_undefined(&self) -> bool {
        matches!(self, Value::Undefined)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Value::Number(_))
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean)
    }

    /// Plain strings and urls.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn is_color(&self) -> bool {
        matches!(self, Value::Color)
    }

    pub fn is_anchor_line(&self) -> bool {
        matches!(self, Value::AnchorLine)
    }

    pub fn is_object(&self) -> bool {
        self.as_object().is_some()
    }

    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Value::Reference(_))
    }

    /// A short name of the value kind, for logging and display.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Undefined => "undefined",
            Value::Unknown => "unknown",
            Value::Number(NumberKind::Plain) => "number",
            Value::Number(NumberKind::Int) => "int",
            Value::Number(NumberKind::Real) => "real",
            Value::Boolean => "boolean",
            Value::String(StringKind::Plain) => "string",
            Value::String(StringKind::Url) => "url",
            Value::Color => "color",
            Value::AnchorLine => "anchorLine",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Reference(_) => "reference",
        }
    }
}

/// Two handles denote the same value.
pub fn same_value(a: &ValueRef, b: &ValueRef) -> bool {
    Arc::ptr_eq(a, b)
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Objects print their class only; member graphs may be cyclic.
        match self {
            Value::Object(object) => write!(f, "Object({})", object.class_name()),
            Value::Function(function) => write!(f, "Function({})", function.object().class_name()),
            Value::Reference(reference) => write!(f, "Reference({})", reference.kind_name()),
            other => f.write_str(other.kind_name()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Object(object) if !object.class_name().is_empty() => {
                f.write_str(object.class_name())
            }
            other => f.write_str(other.kind_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Counter {
        numbers: Vec<NumberKind>,
        strings: usize,
        others: usize,
    }

    impl ValueVisitor for Counter {
        fn visit_number(&mut self, kind: NumberKind) {
            self.numbers.push(kind);
        }
        fn visit_string(&mut self, _kind: StringKind) {
            self.strings += 1;
        }
        fn visit_null(&mut self) {
            self.others += 1;
        }
    }

    #[test]
    fn test_visitor_dispatch() {
        let mut counter = Counter::default();
        for value in [
            Value::Number(NumberKind::Int),
            Value::Number(NumberKind::Real),
            Value::String(StringKind::Url),
            Value::Null,
            Value::Boolean,
        ] {
            value.accept(&mut counter);
        }
        assert_eq!(counter.numbers, vec![NumberKind::Int, NumberKind::Real]);
        assert_eq!(counter.strings, 1);
        assert_eq!(counter.others, 1);
    }

    #[test]
    fn test_kind_queries() {
        assert!(Value::String(StringKind::Url).is_string());
        assert!(!Value::Color.is_string());
        assert_eq!(Value::Number(NumberKind::Int).number_kind(), Some(NumberKind::Int));
        assert!(Value::Unknown.as_object().is_none());
        assert_eq!(format!("{:?}", Value::AnchorLine), "anchorLine");
    }
}

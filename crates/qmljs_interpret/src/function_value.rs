//! Callable values.

use crate::ast_values::{AstFunction, AstSignal};
use crate::cpp_types::MetaFunction;
use crate::object_value::ObjectValue;
use crate::value::{ValueRef, WeakValue};
use crate::value_owner::shared;

/// A function: an object plus a signature.
pub struct FunctionValue {
    object: ObjectValue,
    kind: FunctionKind,
}

pub enum FunctionKind {
    /// A builtin with a fixed signature.
    Native(NativeFunction),
    /// A JavaScript function declared in a document.
    Ast(AstFunction),
    /// A `signal` declared in a QML document.
    Signal(AstSignal),
    /// A method, slot or signal of a C++ type.
    Meta(MetaFunction),
}

#[derive(Default)]
pub struct NativeFunction {
    return_value: Option<WeakValue>,
    arguments: Vec<NativeArgument>,
    optional_count: usize,
    variadic: bool,
}

struct NativeArgument {
    name: String,
    value: WeakValue,
}

impl NativeFunction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn returning(mut self, value: &ValueRef) -> Self {
        self.return_value = Some(std::sync::Arc::downgrade(value));
        self
    }

    pub fn argument(mut self, name: &str, value: &ValueRef) -> Self {
        self.arguments.push(NativeArgument {
            name: name.to_string(),
            value: std::sync::Arc::downgrade(value),
        });
        self
    }

    /// The last `count` named arguments may be omitted.
    pub fn optional(mut self, count: usize) -> Self {
        self.optional_count = count;
        self
    }

    pub fn variadic(mut self) -> Self {
        self.variadic = true;
        self
    }
}

impl FunctionValue {
    pub(crate) fn new(object: ObjectValue, kind: FunctionKind) -> Self {
        Self { object, kind }
    }

    pub fn object(&self) -> &ObjectValue {
        &self.object
    }

    pub fn kind(&self) -> &FunctionKind {
        &self.kind
    }

    pub fn as_ast_function(&self) -> Option<&AstFunction> {
        match &self.kind {
            FunctionKind::Ast(function) => Some(function),
            _ => None,
        }
    }

    pub fn as_signal(&self) -> Option<&AstSignal> {
        match &self.kind {
            FunctionKind::Signal(signal) => Some(signal),
            _ => None,
        }
    }

    pub fn as_meta_function(&self) -> Option<&MetaFunction> {
        match &self.kind {
            FunctionKind::Meta(function) => Some(function),
            _ => None,
        }
    }

    /// What calling the function yields.
    pub fn return_value(&self) -> ValueRef {
        match &self.kind {
            FunctionKind::Native(native) => native
                .return_value
                .as_ref()
                .and_then(WeakValue::upgrade)
                .unwrap_or_else(|| shared().unknown()),
            FunctionKind::Ast(_) => shared().unknown(),
            FunctionKind::Signal(_) => shared().undefined(),
            FunctionKind::Meta(meta) => meta.return_value(),
        }
    }

    pub fn named_argument_count(&self) -> usize {
        match &self.kind {
            FunctionKind::Native(native) => native.arguments.len(),
            FunctionKind::Ast(function) => function.formals().len(),
            FunctionKind::Signal(signal) => signal.parameters().len(),
            FunctionKind::Meta(meta) => meta.method().parameter_names.len(),
        }
    }

    pub fn optional_named_argument_count(&self) -> usize {
        match &self.kind {
            FunctionKind::Native(native) => native.optional_count,
            _ => 0,
        }
    }

    pub fn argument_name(&self, index: usize) -> Option<String> {
        match &self.kind {
            FunctionKind::Native(native) => native.arguments.get(index).map(|a| a.name.clone()),
            FunctionKind::Ast(function) => function.formals().get(index).cloned(),
            FunctionKind::Signal(signal) => signal.parameters().get(index).map(|p| p.name.clone()),
            FunctionKind::Meta(meta) => meta.method().parameter_names.get(index).cloned(),
        }
    }

    /// The abstract value of argument `index` as seen inside the function.
    pub fn argument(&self, index: usize) -> ValueRef {
        let value = match &self.kind {
            FunctionKind::Native(native) => native.arguments.get(index).and_then(|a| a.value.upgrade()),
            FunctionKind::Signal(signal) => signal
                .parameters()
                .get(index)
                .map(|p| shared().default_value_for_builtin_type(&p.type_name)),
            FunctionKind::Meta(meta) => meta.argument(index),
            FunctionKind::Ast(_) => None,
        };
        value.unwrap_or_else(|| shared().unknown())
    }

    pub fn is_variadic(&self) -> bool {
        match &self.kind {
            FunctionKind::Native(native) => native.variadic,
            FunctionKind::Ast(_) => true,
            FunctionKind::Signal(_) | FunctionKind::Meta(_) => false,
        }
    }
}

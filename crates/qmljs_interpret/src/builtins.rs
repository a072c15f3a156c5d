//! The values every owner shares: primitives, the ECMAScript builtins, the
//! QML value types and the global object.
//!
//! The set is built once, on first use, and never changes afterwards.

use std::sync::Arc;

use lazy_static::lazy_static;

use crate::function_value::{FunctionKind, FunctionValue, NativeFunction};
use crate::object_value::{ObjectValue, PropertyInfo};
use crate::reference::Reference;
use crate::value::{NumberKind, StringKind, Value, ValueRef};

lazy_static! {
    static ref SHARED_VALUE_OWNER: SharedValueOwner = SharedValueOwner::new();
}

/// The process-wide shared values.
pub fn shared() -> &'static SharedValueOwner {
    &SHARED_VALUE_OWNER
}

pub struct SharedValueOwner {
    values: Vec<ValueRef>,

    null: ValueRef,
    undefined: ValueRef,
    unknown: ValueRef,
    number: ValueRef,
    int: ValueRef,
    real: ValueRef,
    boolean: ValueRef,
    string: ValueRef,
    url: ValueRef,
    color: ValueRef,
    anchor_line: ValueRef,

    global_object: ValueRef,

    object_prototype: ValueRef,
    function_prototype: ValueRef,
    number_prototype: ValueRef,
    boolean_prototype: ValueRef,
    string_prototype: ValueRef,
    array_prototype: ValueRef,
    date_prototype: ValueRef,
    regexp_prototype: ValueRef,
    error_prototype: ValueRef,

    object_ctor: ValueRef,
    function_ctor: ValueRef,
    array_ctor: ValueRef,
    string_ctor: ValueRef,
    boolean_ctor: ValueRef,
    number_ctor: ValueRef,
    date_ctor: ValueRef,
    regexp_ctor: ValueRef,

    number_instance: ValueRef,
    boolean_instance: ValueRef,
    string_instance: ValueRef,
    array_instance: ValueRef,

    math_object: ValueRef,
    json_object: ValueRef,
    qt_object: ValueRef,
    console_object: ValueRef,

    qml_font_object: ValueRef,
    qml_point_object: ValueRef,
    qml_size_object: ValueRef,
    qml_rect_object: ValueRef,
    qml_vector3d_object: ValueRef,
}

macro_rules! accessors {
    ($($name:ident),* $(,)?) => {
        $(
            pub fn $name(&self) -> ValueRef {
                self.$name.clone()
            }
        )*
    };
}

impl SharedValueOwner {
    accessors!(
        null,
        undefined,
        unknown,
        number,
        int,
        real,
        boolean,
        string,
        url,
        color,
        anchor_line,
        global_object,
        object_prototype,
        function_prototype,
        number_prototype,
        boolean_prototype,
        string_prototype,
        array_prototype,
        date_prototype,
        regexp_prototype,
        error_prototype,
        object_ctor,
        function_ctor,
        array_ctor,
        string_ctor,
        boolean_ctor,
        number_ctor,
        date_ctor,
        regexp_ctor,
        number_instance,
        boolean_instance,
        string_instance,
        array_instance,
        math_object,
        json_object,
        qt_object,
        console_object,
        qml_font_object,
        qml_point_object,
        qml_size_object,
        qml_rect_object,
        qml_vector3d_object,
    );

    pub fn value_count(&self) -> usize {
        self.values.len()
    }

    /// The value of a property declared with a builtin QML type name;
    /// `undefined` when `name` is not one.
    pub fn default_value_for_builtin_type(&self, name: &str) -> ValueRef {
        match name {
            "int" => self.int(),
            "bool" => self.boolean(),
            "double" | "real" => self.real(),
            "string" => self.string(),
            "url" => self.url(),
            "color" => self.color(),
            "date" => self.date_prototype(),
            "var" | "variant" => self.unknown(),
            _ => self.undefined(),
        }
    }

    fn new() -> Self {
        let mut b = Builder::default();

        let null = b.register(Value::Null);
        let undefined = b.register(Value::Undefined);
        let unknown = b.register(Value::Unknown);
        let number = b.register(Value::Number(NumberKind::Plain));
        let int = b.register(Value::Number(NumberKind::Int));
        let real = b.register(Value::Number(NumberKind::Real));
        let boolean = b.register(Value::Boolean);
        let string = b.register(Value::String(StringKind::Plain));
        let url = b.register(Value::String(StringKind::Url));
        let color = b.register(Value::Color);
        let anchor_line = b.register(Value::AnchorLine);
        b.number = Some(number.clone());
        b.unknown = Some(unknown.clone());

        // Prototypes.
        let object_prototype = b.object("Object", None);
        let function_prototype = b.object("Function", Some(&object_prototype));
        b.function_prototype = Some(function_prototype.clone());
        let number_prototype = b.object("Number", Some(&object_prototype));
        let boolean_prototype = b.object("Boolean", Some(&object_prototype));
        let string_prototype = b.object("String", Some(&object_prototype));
        let array_prototype = b.object("Array", Some(&object_prototype));
        let date_prototype = b.object("Date", Some(&object_prototype));
        let regexp_prototype = b.object("RegExp", Some(&object_prototype));
        let error_prototype = b.object("Error", Some(&object_prototype));

        // Instances handed out by constructors and boxing conversions.
        let object_instance = b.object("Object", Some(&object_prototype));
        let number_instance = b.object("Number", Some(&number_prototype));
        let boolean_instance = b.object("Boolean", Some(&boolean_prototype));
        let string_instance = b.object("String", Some(&string_prototype));
        let array_instance = b.object("Array", Some(&array_prototype));
        let date_instance = b.object("Date", Some(&date_prototype));
        let regexp_instance = b.object("RegExp", Some(&regexp_prototype));
        let any_function = b.function(NativeFunction::new().variadic());

        // Constructors.
        let object_ctor = b.constructor(&object_prototype, &object_instance, 1);
        let function_ctor = b.constructor(&function_prototype, &any_function, 0);
        let array_ctor = b.constructor(&array_prototype, &array_instance, 0);
        let string_ctor = b.constructor(&string_prototype, &string, 1);
        let boolean_ctor = b.constructor(&boolean_prototype, &boolean, 1);
        let number_ctor = b.constructor(&number_prototype, &number, 1);
        let date_ctor = b.constructor(&date_prototype, &date_instance, 7);
        let regexp_ctor = b.constructor(&regexp_prototype, &regexp_instance, 2);

        // Object
        b.methods(&object_prototype, &string, &[("toString", 0), ("toLocaleString", 0)]);
        b.methods(&object_prototype, &unknown, &[("valueOf", 0)]);
        b.methods(
            &object_prototype,
            &boolean,
            &[("hasOwnProperty", 1), ("isPrototypeOf", 1), ("propertyIsEnumerable", 1)],
        );
        b.methods(
            &object_ctor,
            &unknown,
            &[
                ("getPrototypeOf", 1),
                ("getOwnPropertyDescriptor", 2),
                ("create", 2),
                ("defineProperty", 3),
                ("defineProperties", 2),
                ("seal", 1),
                ("freeze", 1),
                ("preventExtensions", 1),
            ],
        );
        b.methods(&object_ctor, &array_instance, &[("getOwnPropertyNames", 1), ("keys", 1)]);
        b.methods(
            &object_ctor,
            &boolean,
            &[("isSealed", 1), ("isFrozen", 1), ("isExtensible", 1)],
        );

        // Function
        b.methods(&function_prototype, &string, &[("toString", 0)]);
        b.methods(&function_prototype, &unknown, &[("apply", 2), ("call", 1), ("bind", 1)]);
        set(&function_prototype, "length", &number);

        // Array
        set(&array_prototype, "length", &number);
        set(&array_instance, "length", &number);
        b.methods(
            &array_prototype,
            &string,
            &[("toString", 0), ("toLocaleString", 0), ("join", 1)],
        );
        b.methods(
            &array_prototype,
            &array_instance,
            &[
                ("concat", 1),
                ("reverse", 0),
                ("slice", 2),
                ("sort", 1),
                ("splice", 2),
                ("map", 1),
                ("filter", 1),
            ],
        );
        b.methods(&array_prototype, &unknown, &[("pop", 0), ("shift", 0), ("reduce", 1), ("reduceRight", 1)]);
        b.methods(
            &array_prototype,
            &number,
            &[("push", 1), ("unshift", 1), ("indexOf", 1), ("lastIndexOf", 1)],
        );
        b.methods(&array_prototype, &boolean, &[("every", 1), ("some", 1)]);
        b.methods(&array_prototype, &undefined, &[("forEach", 1)]);
        b.methods(&array_ctor, &boolean, &[("isArray", 1)]);

        // String
        set(&string_prototype, "length", &number);
        b.methods(
            &string_prototype,
            &string,
            &[
                ("toString", 0),
                ("valueOf", 0),
                ("charAt", 1),
                ("concat", 1),
                ("replace", 2),
                ("slice", 2),
                ("substring", 2),
                ("substr", 2),
                ("toLowerCase", 0),
                ("toLocaleLowerCase", 0),
                ("toUpperCase", 0),
                ("toLocaleUpperCase", 0),
                ("trim", 0),
                ("arg", 1),
            ],
        );
        b.methods(
            &string_prototype,
            &number,
            &[
                ("charCodeAt", 1),
                ("indexOf", 1),
                ("lastIndexOf", 1),
                ("localeCompare", 1),
                ("search", 1),
            ],
        );
        b.methods(&string_prototype, &array_instance, &[("match", 1), ("split", 2)]);
        b.methods(&string_ctor, &string, &[("fromCharCode", 1)]);

        // Boolean
        b.methods(&boolean_prototype, &string, &[("toString", 0)]);
        b.methods(&boolean_prototype, &boolean, &[("valueOf", 0)]);

        // Number
        b.methods(
            &number_prototype,
            &string,
            &[
                ("toString", 1),
                ("toLocaleString", 0),
                ("toFixed", 1),
                ("toExponential", 1),
                ("toPrecision", 1),
            ],
        );
        b.methods(&number_prototype, &number, &[("valueOf", 0)]);
        for name in [
            "MAX_VALUE",
            "MIN_VALUE",
            "NaN",
            "NEGATIVE_INFINITY",
            "POSITIVE_INFINITY",
        ] {
            set(&number_ctor, name, &number);
        }

        // Date
        b.methods(
            &date_prototype,
            &string,
            &[
                ("toString", 0),
                ("toDateString", 0),
                ("toTimeString", 0),
                ("toLocaleString", 0),
                ("toLocaleDateString", 0),
                ("toLocaleTimeString", 0),
                ("toUTCString", 0),
                ("toISOString", 0),
                ("toJSON", 1),
            ],
        );
        b.methods(
            &date_prototype,
            &number,
            &[
                ("valueOf", 0),
                ("getTime", 0),
                ("getFullYear", 0),
                ("getUTCFullYear", 0),
                ("getMonth", 0),
                ("getUTCMonth", 0),
                ("getDate", 0),
                ("getUTCDate", 0),
                ("getDay", 0),
                ("getUTCDay", 0),
                ("getHours", 0),
                ("getUTCHours", 0),
                ("getMinutes", 0),
                ("getUTCMinutes", 0),
                ("getSeconds", 0),
                ("getUTCSeconds", 0),
                ("getMilliseconds", 0),
                ("getUTCMilliseconds", 0),
                ("getTimezoneOffset", 0),
                ("setTime", 1),
                ("setMilliseconds", 1),
                ("setSeconds", 2),
                ("setMinutes", 3),
                ("setHours", 4),
                ("setDate", 1),
                ("setMonth", 2),
                ("setFullYear", 3),
            ],
        );
        b.methods(&date_ctor, &number, &[("parse", 1), ("UTC", 7), ("now", 0)]);

        // RegExp
        set(&regexp_prototype, "source", &string);
        set(&regexp_prototype, "global", &boolean);
        set(&regexp_prototype, "ignoreCase", &boolean);
        set(&regexp_prototype, "multiline", &boolean);
        set(&regexp_prototype, "lastIndex", &number);
        b.methods(&regexp_prototype, &array_instance, &[("exec", 1)]);
        b.methods(&regexp_prototype, &boolean, &[("test", 1)]);
        b.methods(&regexp_prototype, &string, &[("toString", 0)]);

        // Errors
        set(&error_prototype, "name", &string);
        set(&error_prototype, "message", &string);
        b.methods(&error_prototype, &string, &[("toString", 0)]);
        let error_instance = b.object("Error", Some(&error_prototype));
        let error_ctor = b.constructor(&error_prototype, &error_instance, 1);
        let mut error_ctors = vec![("Error".to_string(), error_ctor)];
        for name in [
            "EvalError",
            "RangeError",
            "ReferenceError",
            "SyntaxError",
            "TypeError",
            "URIError",
        ] {
            let prototype = b.object(name, Some(&error_prototype));
            let instance = b.object(name, Some(&prototype));
            let ctor = b.constructor(&prototype, &instance, 1);
            error_ctors.push((name.to_string(), ctor));
        }

        // Math
        let math_object = b.object("Math", Some(&object_prototype));
        for name in ["E", "LN10", "LN2", "LOG2E", "LOG10E", "PI", "SQRT1_2", "SQRT2"] {
            set(&math_object, name, &number);
        }
        b.methods(
            &math_object,
            &number,
            &[
                ("abs", 1),
                ("acos", 1),
                ("asin", 1),
                ("atan", 1),
                ("atan2", 2),
                ("ceil", 1),
                ("cos", 1),
                ("exp", 1),
                ("floor", 1),
                ("log", 1),
                ("max", 2),
                ("min", 2),
                ("pow", 2),
                ("random", 0),
                ("round", 1),
                ("sign", 1),
                ("sin", 1),
                ("sqrt", 1),
                ("tan", 1),
                ("trunc", 1),
            ],
        );

        // JSON
        let json_object = b.object("JSON", Some(&object_prototype));
        b.methods(&json_object, &unknown, &[("parse", 2)]);
        b.methods(&json_object, &string, &[("stringify", 3)]);

        // console
        let console_object = b.object("console", Some(&object_prototype));
        b.methods(
            &console_object,
            &undefined,
            &[
                ("log", 1),
                ("debug", 1),
                ("info", 1),
                ("warn", 1),
                ("error", 1),
                ("assert", 2),
                ("count", 1),
                ("profile", 0),
                ("profileEnd", 0),
                ("time", 1),
                ("timeEnd", 1),
                ("trace", 0),
                ("exception", 1),
            ],
        );

        // QML value types.
        let qml_font_object = b.object("Font", Some(&object_prototype));
        for name in ["family", "styleName"] {
            set(&qml_font_object, name, &string);
        }
        for name in ["bold", "italic", "underline", "overline", "strikeout", "kerning"] {
            set(&qml_font_object, name, &boolean);
        }
        for name in ["pointSize", "letterSpacing", "wordSpacing"] {
            set(&qml_font_object, name, &real);
        }
        for name in ["pixelSize", "weight", "capitalization", "hintingPreference"] {
            set(&qml_font_object, name, &int);
        }
        let qml_point_object = b.value_type("Point", &["x", "y"], &real, &object_prototype);
        let qml_size_object = b.value_type("Size", &["width", "height"], &real, &object_prototype);
        let qml_rect_object = b.value_type("Rect", &["x", "y", "width", "height"], &real, &object_prototype);
        let qml_vector3d_object = b.value_type("Vector3D", &["x", "y", "z"], &real, &object_prototype);
        b.methods(&qml_vector3d_object, &qml_vector3d_object, &[("crossProduct", 1), ("normalized", 0), ("plus", 1), ("minus", 1), ("times", 1)]);
        b.methods(&qml_vector3d_object, &real, &[("dotProduct", 1), ("length", 0)]);
        b.methods(&qml_vector3d_object, &boolean, &[("fuzzyEquals", 2)]);

        // Qt
        let qt_prototype = b.register(Value::Reference(Reference::QtObjectPrototype));
        let qt_object = b.object("Qt", Some(&qt_prototype));
        b.methods(&qt_object, &unknown, &[
            ("include", 2),
            ("createQmlObject", 3),
            ("createComponent", 1),
            ("binding", 1),
            ("locale", 1),
            ("callLater", 1),
        ]);
        b.methods(&qt_object, &boolean, &[("isQtObject", 1), ("openUrlExternally", 1)]);
        b.methods(&qt_object, &color, &[
            ("rgba", 4),
            ("hsla", 4),
            ("hsva", 4),
            ("colorEqual", 2),
            ("lighter", 2),
            ("darker", 2),
            ("tint", 2),
        ]);
        b.methods(&qt_object, &qml_rect_object, &[("rect", 4)]);
        b.methods(&qt_object, &qml_point_object, &[("point", 2)]);
        b.methods(&qt_object, &qml_size_object, &[("size", 2)]);
        b.methods(&qt_object, &qml_vector3d_object, &[("vector3d", 3)]);
        b.methods(&qt_object, &qml_font_object, &[("font", 1)]);
        b.methods(&qt_object, &url, &[("resolvedUrl", 1)]);
        b.methods(&qt_object, &string, &[
            ("formatDate", 2),
            ("formatTime", 2),
            ("formatDateTime", 2),
            ("md5", 1),
            ("btoa", 1),
            ("atob", 1),
            ("qsTr", 1),
        ]);
        b.methods(&qt_object, &array_instance, &[("fontFamilies", 0)]);
        b.methods(&qt_object, &undefined, &[("quit", 0), ("exit", 1)]);
        for name in ["application", "platform", "inputMethod", "styleHints"] {
            set(&qt_object, name, &unknown);
        }

        // The global object.
        let global_object = b.object("Global", None);
        let globals: [(&str, &ValueRef); 13] = [
            ("Object", &object_ctor),
            ("Function", &function_ctor),
            ("Array", &array_ctor),
            ("String", &string_ctor),
            ("Boolean", &boolean_ctor),
            ("Number", &number_ctor),
            ("Date", &date_ctor),
            ("RegExp", &regexp_ctor),
            ("Math", &math_object),
            ("JSON", &json_object),
            ("Qt", &qt_object),
            ("console", &console_object),
            ("undefined", &undefined),
        ];
        for (name, value) in globals {
            set(&global_object, name, value);
        }
        for (name, ctor) in &error_ctors {
            set(&global_object, name, ctor);
        }
        set(&global_object, "NaN", &number);
        set(&global_object, "Infinity", &number);
        b.methods(&global_object, &unknown, &[("eval", 1)]);
        b.methods(&global_object, &number, &[("parseInt", 2), ("parseFloat", 1)]);
        b.methods(&global_object, &boolean, &[("isNaN", 1), ("isFinite", 1)]);
        b.methods(&global_object, &string, &[
            ("decodeURI", 1),
            ("decodeURIComponent", 1),
            ("encodeURI", 1),
            ("encodeURIComponent", 1),
            ("escape", 1),
            ("unescape", 1),
            ("qsTr", 3),
            ("qsTranslate", 4),
            ("qsTrId", 2),
            ("QT_TR_NOOP", 1),
            ("QT_TRANSLATE_NOOP", 2),
            ("QT_TRID_NOOP", 1),
        ]);
        b.methods(&global_object, &undefined, &[("print", 1), ("gc", 0)]);

        Self {
            values: b.values,
            null,
            undefined,
            unknown,
            number,
            int,
            real,
            boolean,
            string,
            url,
            color,
            anchor_line,
            global_object,
            object_prototype,
            function_prototype,
            number_prototype,
            boolean_prototype,
            string_prototype,
            array_prototype,
            date_prototype,
            regexp_prototype,
            error_prototype,
            object_ctor,
            function_ctor,
            array_ctor,
            string_ctor,
            boolean_ctor,
            number_ctor,
            date_ctor,
            regexp_ctor,
            number_instance,
            boolean_instance,
            string_instance,
            array_instance,
            math_object,
            json_object,
            qt_object,
            console_object,
            qml_font_object,
            qml_point_object,
            qml_size_object,
            qml_rect_object,
            qml_vector3d_object,
        }
    }
}

fn set(target: &ValueRef, name: &str, value: &ValueRef) {
    if let Some(object) = target.as_object() {
        object.set_member(name, value);
    }
}

/// Construction helper. It must not reach [`shared`], which is being built.
#[derive(Default)]
struct Builder {
    values: Vec<ValueRef>,
    number: Option<ValueRef>,
    unknown: Option<ValueRef>,
    function_prototype: Option<ValueRef>,
}

impl Builder {
    fn register(&mut self, value: Value) -> ValueRef {
        let value = Arc::new(value);
        self.values.push(value.clone());
        value
    }

    fn object(&mut self, class_name: &str, prototype: Option<&ValueRef>) -> ValueRef {
        let object = ObjectValue::new(class_name);
        object.set_prototype(prototype);
        self.register(Value::Object(object))
    }

    fn function(&mut self, signature: NativeFunction) -> ValueRef {
        let object = ObjectValue::new("Function");
        if let Some(number) = &self.number {
            object.set_property("length", number, PropertyInfo::READABLE);
        }
        object.set_prototype(self.function_prototype.as_ref());
        self.register(Value::Function(FunctionValue::new(
            object,
            FunctionKind::Native(signature),
        )))
    }

    fn method(&mut self, returns: &ValueRef, argument_count: usize) -> ValueRef {
        let mut signature = NativeFunction::new().returning(returns);
        if let Some(unknown) = self.unknown.clone() {
            for index in 0..argument_count {
                signature = signature.argument(&format!("arg{}", index + 1), &unknown);
            }
        }
        self.function(signature)
    }

    fn methods(&mut self, target: &ValueRef, returns: &ValueRef, methods: &[(&str, usize)]) {
        for (name, argument_count) in methods {
            let function = self.method(returns, *argument_count);
            set(target, name, &function);
        }
    }

    fn constructor(&mut self, prototype: &ValueRef, instance: &ValueRef, argument_count: usize) -> ValueRef {
        let ctor = self.method(instance, argument_count);
        set(&ctor, "prototype", prototype);
        set(prototype, "constructor", &ctor);
        ctor
    }

    fn value_type(
        &mut self,
        class_name: &str,
        fields: &[&str],
        field_value: &ValueRef,
        prototype: &ValueRef,
    ) -> ValueRef {
        let object = self.object(class_name, Some(prototype));
        for field in fields {
            set(&object, field, field_value);
        }
        object
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn global(name: &str) -> ValueRef {
        shared()
            .global_object()
            .lookup_member(name, None)
            .unwrap_or_else(|| panic!("missing global {name}"))
    }

    #[test]
    fn test_primitives_are_singletons() {
        let s = shared();
        assert!(Arc::ptr_eq(&s.number(), &shared().number()));
        assert!(s.null().is_null());
        assert_eq!(s.int().number_kind(), Some(NumberKind::Int));
        assert_eq!(s.url().string_kind(), Some(StringKind::Url));
    }

    #[test]
    fn test_global_object_contents() {
        for name in [
            "Object", "Function", "Array", "String", "Boolean", "Number", "Date", "RegExp",
            "Error", "TypeError", "Math", "JSON", "Qt", "console", "parseInt", "qsTr", "print",
        ] {
            global(name);
        }
        assert!(global("undefined").is_undefined());
        assert!(global("NaN").is_number());
    }

    #[test]
    fn test_constructor_prototype_links() {
        let array = global("Array");
        let prototype = array.lookup_member("prototype", None).unwrap();
        assert!(Arc::ptr_eq(&prototype, &shared().array_prototype()));
        let ctor = prototype.lookup_member("constructor", None).unwrap();
        assert!(Arc::ptr_eq(&ctor, &array));
        let instance = array.as_function().unwrap().return_value();
        assert!(instance.lookup_member("push", None).unwrap().is_function());
        assert!(instance.lookup_member("hasOwnProperty", None).is_some());
    }

    #[test]
    fn test_builtin_return_values() {
        let math = global("Math");
        let floor = math.lookup_member("floor", None).unwrap();
        assert!(floor.as_function().unwrap().return_value().is_number());
        let rgba = global("Qt").lookup_member("rgba", None).unwrap();
        assert!(rgba.as_function().unwrap().return_value().is_color());
        let string_ctor = global("String");
        assert!(string_ctor.as_function().unwrap().return_value().is_string());
    }

    #[test]
    fn test_qt_prototype_is_a_reference() {
        let qt = global("Qt");
        let prototype = qt.as_object().unwrap().raw_prototype().unwrap();
        assert!(prototype.is_reference());
        // Without a context the reference cannot be resolved.
        assert!(qt.prototype(None).is_none());
    }
}

//! qmljs_metatypes: Descriptions of C++ types registered with QML.
//!
//! [`FakeMetaObject`] is the in-memory model; [`description`] reads the
//! JSON descriptors that type libraries ship.

pub mod description;
pub mod fake_meta_object;

pub use description::{
    load_type_description_file, load_type_description_files, parse_type_description,
    MetaTypesError, TypeDescription,
};
pub use fake_meta_object::*;

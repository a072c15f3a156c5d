//! Enumeration of object members.
//!
//! Objects report their members, stored or computed, through a
//! [`MemberProcessor`]. Each callback returns `false` to stop the walk.

use crate::object_value::PropertyInfo;
use crate::value::ValueRef;

pub trait MemberProcessor {
    fn process_property(&mut self, _name: &str, _value: &ValueRef, _info: PropertyInfo) -> bool {
        true
    }

    fn process_enumerator(&mut self, _name: &str, _value: &ValueRef) -> bool {
        true
    }

    fn process_signal(&mut self, _name: &str, _value: &ValueRef) -> bool {
        true
    }

    fn process_slot(&mut self, _name: &str, _value: &ValueRef) -> bool {
        true
    }

    /// `on<Signal>` handlers derived from signals and property notifications.
    fn process_generated_slot(&mut self, _name: &str, _value: &ValueRef) -> bool {
        true
    }
}

/// Finds the first member with a given name.
pub struct LookupMember<'a> {
    name: &'a str,
    value: Option<ValueRef>,
    info: PropertyInfo,
}

impl<'a> LookupMember<'a> {
    pub fn new(name: &'a str) -> Self {
        Self {
            name,
            value: None,
            info: PropertyInfo::empty(),
        }
    }

    pub fn value(&self) -> Option<&ValueRef> {
        self.value.as_ref()
    }

    pub fn info(&self) -> PropertyInfo {
        self.info
    }

    pub fn into_value(self) -> Option<ValueRef> {
        self.value
    }

    fn found(&mut self, name: &str, value: &ValueRef, info: PropertyInfo) -> bool {
        if name != self.name {
            return true;
        }
        self.value = Some(value.clone());
        self.info = info;
        false
    }
}

impl MemberProcessor for LookupMember<'_> {
    fn process_property(&mut self, name: &str, value: &ValueRef, info: PropertyInfo) -> bool {
        self.found(name, value, info)
    }

    fn process_enumerator(&mut self, name: &str, value: &ValueRef) -> bool {
        self.found(name, value, PropertyInfo::READABLE)
    }

    fn process_signal(&mut self, name: &str, value: &ValueRef) -> bool {
        self.found(name, value, PropertyInfo::READABLE)
    }

    fn process_slot(&mut self, name: &str, value: &ValueRef) -> bool {
        self.found(name, value, PropertyInfo::READABLE)
    }

    fn process_generated_slot(&mut self, name: &str, value: &ValueRef) -> bool {
        self.found(name, value, PropertyInfo::READABLE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberKind {
    Property,
    Enumerator,
    Signal,
    Slot,
    GeneratedSlot,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Property => "property",
            MemberKind::Enumerator => "enumerator",
            MemberKind::Signal => "signal",
            MemberKind::Slot => "slot",
            MemberKind::GeneratedSlot => "handler",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectedMember {
    pub name: String,
    pub kind: MemberKind,
    pub value: ValueRef,
    pub info: PropertyInfo,
}

/// Collects every member in the order it is reported.
#[derive(Debug, Default)]
pub struct CollectMembers {
    pub members: Vec<CollectedMember>,
    /// Skip generated `on<Signal>` handlers.
    pub skip_generated_slots: bool,
}

impl CollectMembers {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, name: &str, kind: MemberKind, value: &ValueRef, info: PropertyInfo) -> bool {
        self.members.push(CollectedMember {
            name: name.to_string(),
            kind,
            value: value.clone(),
            info,
        });
        true
    }
}

impl MemberProcessor for CollectMembers {
    fn process_property(&mut self, name: &str, value: &ValueRef, info: PropertyInfo) -> bool {
        self.push(name, MemberKind::Property, value, info)
    }

    fn process_enumerator(&mut self, name: &str, value: &ValueRef) -> bool {
        self.push(name, MemberKind::Enumerator, value, PropertyInfo::READABLE)
    }

    fn process_signal(&mut self, name: &str, value: &ValueRef) -> bool {
        self.push(name, MemberKind::Signal, value, PropertyInfo::READABLE)
    }

    fn process_slot(&mut self, name: &str, value: &ValueRef) -> bool {
        self.push(name, MemberKind::Slot, value, PropertyInfo::READABLE)
    }

    fn process_generated_slot(&mut self, name: &str, value: &ValueRef) -> bool {
        if self.skip_generated_slots {
            return true;
        }
        self.push(name, MemberKind::GeneratedSlot, value, PropertyInfo::READABLE)
    }
}

/// `clicked` -> `onClicked`, `_private` -> `on_Private`.
pub fn generated_slot_name(base: &str) -> String {
    let mut slot = String::with_capacity(base.len() + 2);
    slot.push_str("on");
    let mut rest = "";
    for (index, c) in base.char_indices() {
        slot.extend(c.to_uppercase());
        if c != '_' {
            rest = &base[index + c.len_utf8()..];
            break;
        }
    }
    slot.push_str(rest);
    slot
}

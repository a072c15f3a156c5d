//! Cycle-safe resolution of references.

use std::cell::RefCell;
use std::ops::Deref;
use std::sync::Arc;

use tracing::trace;

use crate::context::ContextPtr;
use crate::value::ValueRef;

/// Resolves [`Reference`](crate::reference::Reference) values against a
/// linked context.
///
/// The references currently being resolved are kept on a stack. Asking for a
/// reference that is already on the stack returns the reference itself
/// instead of recursing, so `property var a: a` terminates.
///
/// A `ReferenceContext` belongs to one thread; create one per evaluation.
pub struct ReferenceContext {
    context: ContextPtr,
    in_flight: RefCell<Vec<ValueRef>>,
}

impl ReferenceContext {
    pub fn new(context: ContextPtr) -> Self {
        Self {
            context,
            in_flight: RefCell::new(Vec::new()),
        }
    }

    pub fn context(&self) -> &ContextPtr {
        &self.context
    }

    /// Number of references currently being resolved.
    pub fn depth(&self) -> usize {
        self.in_flight.borrow().len()
    }

    /// Resolve `value` if it is a reference; other values are returned as
    /// they are. `None` when the referenced value cannot be determined.
    pub fn lookup_reference(&self, value: &ValueRef) -> Option<ValueRef> {
        let Some(reference) = value.as_reference() else {
            return Some(value.clone());
        };

        if self.in_flight.borrow().iter().any(|r| Arc::ptr_eq(r, value)) {
            trace!(kind = reference.kind_name(), "reference depends on itself");
            return Some(value.clone());
        }

        self.in_flight.borrow_mut().push(value.clone());
        let resolved = reference.value(self);
        self.in_flight.borrow_mut().pop();
        resolved
    }
}

/// A reference context lent by the caller, or a private one.
pub(crate) enum ReferenceContextHandle<'a> {
    Owned(ReferenceContext),
    Borrowed(&'a ReferenceContext),
}

impl Deref for ReferenceContextHandle<'_> {
    type Target = ReferenceContext;

    fn deref(&self) -> &ReferenceContext {
        match self {
            ReferenceContextHandle::Owned(rc) => rc,
            ReferenceContextHandle::Borrowed(rc) => rc,
        }
    }
}

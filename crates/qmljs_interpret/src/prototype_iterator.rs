//! Walking prototype chains.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use tracing::trace;

use crate::context::ContextPtr;
use crate::value::ValueRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrototypeError {
    #[default]
    NoError,
    /// A prototype is a reference that did not resolve to an object.
    ReferenceResolutionError,
    /// The chain returns to an object it already visited.
    CycleError,
}

/// Yields an object, then its prototype, then that prototype's prototype.
///
/// The walk stops at the first missing prototype, at a prototype reference
/// that cannot be resolved, or when an object would be yielded twice;
/// [`error`](Self::error) tells which.
pub struct PrototypeIterator<'a> {
    current: Option<ValueRef>,
    next: Option<ValueRef>,
    context: Option<&'a ContextPtr>,
    seen: FxHashSet<usize>,
    error: PrototypeError,
}

fn address(value: &ValueRef) -> usize {
    Arc::as_ptr(value) as usize
}

impl<'a> PrototypeIterator<'a> {
    /// `start` is yielded first; non-objects yield nothing. References among
    /// the prototypes are resolved through `context`.
    pub fn new(start: Option<ValueRef>, context: Option<&'a ContextPtr>) -> Self {
        Self {
            current: None,
            next: start.filter(|value| value.is_object()),
            context,
            seen: FxHashSet::default(),
            error: PrototypeError::NoError,
        }
    }

    pub fn has_next(&mut self) -> bool {
        if self.next.is_some() {
            return true;
        }
        if self.error != PrototypeError::NoError {
            return false;
        }
        let Some(prototype) = self
            .current
            .as_ref()
            .and_then(|current| current.as_object())
            .and_then(|object| object.raw_prototype())
        else {
            return false;
        };

        let resolved = if prototype.is_object() {
            Some(prototype)
        } else {
            self.context
                .and_then(|context| context.lookup_reference(&prototype))
                .filter(|value| value.is_object())
        };
        let Some(next) = resolved else {
            trace!(object = self.current_class_name(), "prototype does not resolve");
            self.error = PrototypeError::ReferenceResolutionError;
            return false;
        };
        if self.seen.contains(&address(&next)) {
            trace!(object = self.current_class_name(), "prototype cycle");
            self.error = PrototypeError::CycleError;
            return false;
        }
        self.next = Some(next);
        true
    }

    pub fn peek_next(&mut self) -> Option<ValueRef> {
        if self.has_next() {
            self.next.clone()
        } else {
            None
        }
    }

    /// Every remaining object of the chain, the start object included if it
    /// was not consumed yet.
    pub fn all(mut self) -> Vec<ValueRef> {
        let mut out = Vec::new();
        while let Some(value) = Iterator::next(&mut self) {
            out.push(value);
        }
        out
    }

    pub fn error(&self) -> PrototypeError {
        self.error
    }

    fn current_class_name(&self) -> &str {
        self.current
            .as_ref()
            .and_then(|value| value.as_object())
            .map_or("", |object| object.class_name())
    }
}

impl Iterator for PrototypeIterator<'_> {
    type Item = ValueRef;

    fn next(&mut self) -> Option<ValueRef> {
        if !self.has_next() {
            return None;
        }
        let next = self.next.take()?;
        self.seen.insert(address(&next));
        self.current = Some(next.clone());
        Some(next)
    }
}

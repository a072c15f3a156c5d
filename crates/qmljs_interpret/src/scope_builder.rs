//! Entering and leaving AST nodes while keeping a [`ScopeChain`] current.

use tracing::{debug, trace};

use qmljs_ast::{NodeId, NodeKind, UiScriptBinding};

use crate::evaluate::Evaluate;
use crate::prototype_iterator::PrototypeIterator;
use crate::reference_context::{ReferenceContext, ReferenceContextHandle};
use crate::scope_chain::ScopeChain;
use crate::value::ValueRef;

/// C++ types whose instances must not expose their properties to the
/// bindings inside them.
const SCOPE_CLEARING_TYPES: &[&str] = &["ListElement", "Connections"];
const SCOPE_CLEARING_MODULES: &[&str] = &["Qt", "QtQml", "QtQuick"];
const PROPERTY_CHANGES_MODULES: &[&str] = &["Qt", "QtQuick"];

struct Frame {
    node: NodeId,
    chain: ScopeChain,
}

/// Keeps one chain per entered node. [`push`](Self::push) derives the chain
/// of a node from the current one; [`pop`](Self::pop) returns to the chain
/// that was current before.
pub struct ScopeBuilder<'a> {
    root: ScopeChain,
    frames: Vec<Frame>,
    rc: ReferenceContextHandle<'a>,
}

impl ScopeBuilder<'static> {
    pub fn new(chain: ScopeChain) -> Self {
        let rc = ReferenceContext::new(chain.context().clone());
        Self {
            root: chain,
            frames: Vec::new(),
            rc: ReferenceContextHandle::Owned(rc),
        }
    }
}

impl<'a> ScopeBuilder<'a> {
    /// Resolve references through `rc`, so that scopes built while a
    /// reference is being resolved see the references in flight.
    pub fn with_reference_context(chain: ScopeChain, rc: &'a ReferenceContext) -> Self {
        Self {
            root: chain,
            frames: Vec::new(),
            rc: ReferenceContextHandle::Borrowed(rc),
        }
    }

    pub fn scope_chain(&self) -> &ScopeChain {
        self.frames.last().map_or(&self.root, |frame| &frame.chain)
    }

    pub fn into_scope_chain(mut self) -> ScopeChain {
        match self.frames.pop() {
            Some(frame) => frame.chain,
            None => self.root,
        }
    }

    /// Number of nodes entered and not left.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn push_path(&mut self, path: &[NodeId]) {
        for node in path {
            self.push(*node);
        }
    }

    /// Enter `node`: object definitions and bindings set the QML scope
    /// objects; signal handlers, functions and block-bodied bindings add
    /// their JavaScript scope.
    pub fn push(&mut self, node: NodeId) {
        let mut chain = self.scope_chain().clone();
        let document = chain.document().clone();
        let kind = document.ast().kind(node);

        if kind.is_some_and(NodeKind::is_object_node) {
            if let Some(objects) = self.qml_scope_objects_for(&chain, node) {
                chain.set_qml_scope_objects(objects);
            }
        }

        if let Some(NodeKind::UiScriptBinding(binding)) = kind {
            if let Some(scope) = self.signal_handler_scope(&chain, binding) {
                chain.append_js_scope(&scope);
            }
        }

        if matches!(
            kind,
            Some(NodeKind::UiScriptBinding(_))
                | Some(NodeKind::FunctionDeclaration(_))
                | Some(NodeKind::FunctionExpression(_))
                | Some(NodeKind::UiPublicMember(_))
        ) {
            if let Some(scope) = document.bind().find_attached_js_scope(node) {
                chain.append_js_scope(&scope);
            }
        }

        trace!(node = node.0, kind = kind.map(NodeKind::name), "enter scope");
        self.frames.push(Frame { node, chain });
    }

    /// Leave the most recently entered node. Popping with nothing entered
    /// does nothing.
    pub fn pop(&mut self) {
        match self.frames.pop() {
            Some(frame) => trace!(node = frame.node.0, "leave scope"),
            None => debug!("scope builder popped more nodes than it pushed"),
        }
    }

    /// Look a dotted property path up on the current QML scope objects.
    pub fn scope_object_lookup(&self, segments: &[String]) -> Option<ValueRef> {
        let chain = self.scope_chain();
        lookup_on_scope_objects(chain, &self.rc, segments)
    }

    /// The first prototype of `object` that is the `PropertyChanges` type.
    pub fn property_changes_prototype(&self, object: &ValueRef) -> Option<ValueRef> {
        let context = self.scope_chain().context();
        PrototypeIterator::new(Some(object.clone()), Some(context)).find(|prototype| {
            prototype.as_cpp_component().is_some_and(|component| {
                prototype.as_object().map(|o| o.class_name()) == Some("PropertyChanges")
                    && PROPERTY_CHANGES_MODULES.contains(&component.module_name())
            })
        })
    }

    /// The scope objects inside the object at `node`, or `None` to keep the
    /// current ones.
    fn qml_scope_objects_for(&self, chain: &ScopeChain, node: NodeId) -> Option<Vec<ValueRef>> {
        let document = chain.document().clone();
        let bind = document.bind();
        let ast = document.ast();

        if bind.is_grouped_property_binding(node) {
            // `anchors { ... }`: the scope is the value of the grouped property.
            let NodeKind::UiObjectDefinition(definition) = ast.kind(node)? else {
                return None;
            };
            let segments = ast.qualified_id(definition.qualified_type_name_id)?.segments.clone();
            let object = lookup_on_scope_objects(chain, &self.rc, &segments)?;
            return object.is_object().then(|| vec![object]);
        }

        let Some(scope_object) = bind.find_qml_object(node) else {
            debug!(node = node.0, "no object bound for node");
            return None;
        };
        let context = chain.context();

        let mut prototypes = PrototypeIterator::new(Some(scope_object.clone()), Some(context));
        prototypes.next();
        let clears_scope = prototypes.any(|prototype| {
            let Some(component) = prototype.as_cpp_component() else {
                return false;
            };
            let class_name = prototype.as_object().map(|o| o.class_name()).unwrap_or_default();
            SCOPE_CLEARING_TYPES.contains(&class_name) && SCOPE_CLEARING_MODULES.contains(&component.module_name())
        });
        if clears_scope {
            return Some(Vec::new());
        }

        let mut objects = vec![scope_object.clone()];
        let is_property_changes = scope_object
            .prototype(Some(context))
            .and_then(|prototype| self.property_changes_prototype(&prototype))
            .is_some();
        if is_property_changes {
            for member in ast.object_members(node) {
                let Some(NodeKind::UiScriptBinding(binding)) = ast.kind(*member) else {
                    continue;
                };
                let is_target = ast
                    .qualified_id(binding.qualified_id)
                    .is_some_and(|q| q.segments.len() == 1 && q.first() == Some("target"));
                if !is_target {
                    continue;
                }
                let target = Evaluate::with_reference_context(chain, &self.rc).value(binding.statement);
                if target.is_object() {
                    objects.insert(0, target);
                } else {
                    objects.clear();
                }
            }
        }
        Some(objects)
    }

    /// The parameter scope of an `on<Signal>: ...` handler.
    fn signal_handler_scope(&self, chain: &ScopeChain, binding: &UiScriptBinding) -> Option<ValueRef> {
        let document = chain.document().clone();
        let qualified_id = document.ast().qualified_id(binding.qualified_id)?;
        let [name] = qualified_id.segments.as_slice() else {
            return None;
        };
        if !name.starts_with("on") || chain.qml_scope_objects().is_empty() {
            return None;
        }

        let context = chain.context();
        let (value, owner) = chain
            .qml_scope_objects()
            .iter()
            .find_map(|scope| scope.lookup_member_with_owner(name, Some(context), true))?;

        if let Some(signal) = value.as_function().and_then(|f| f.as_signal()) {
            return Some(signal.body_scope().clone());
        }
        owner.as_cpp_component()?.signal_scope(name)
    }
}

fn lookup_on_scope_objects(chain: &ScopeChain, rc: &ReferenceContext, segments: &[String]) -> Option<ValueRef> {
    let context = chain.context();
    'scopes: for scope in chain.qml_scope_objects() {
        let mut object = scope.clone();
        let mut result = None;
        for (index, segment) in segments.iter().enumerate() {
            if segment.is_empty() {
                return None;
            }
            let Some(value) = object.lookup_member(segment, Some(context)) else {
                continue 'scopes;
            };
            let Some(value) = rc.lookup_reference(&value) else {
                continue 'scopes;
            };
            if index + 1 < segments.len() {
                if !value.is_object() {
                    continue 'scopes;
                }
                object = value;
            } else {
                result = Some(value);
            }
        }
        if result.is_some() {
            return result;
        }
    }
    None
}

impl std::fmt::Debug for ScopeBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeBuilder")
            .field("depth", &self.frames.len())
            .field("chain", self.scope_chain())
            .finish()
    }
}

//! Programmatic construction of trees.
//!
//! The analysis consumes trees produced elsewhere; `AstBuilder` is how
//! embedders without a parser (and the test suites) produce them. Nodes get
//! synthetic, strictly increasing source ranges: every leaf occupies its
//! own span and every composite node encloses its children, so offset
//! based queries behave as they would on parsed text.

use crate::ast::Ast;
use crate::node::*;
use crate::types::*;
use qmljs_core::text::{TextPos, TextRange};

#[derive(Debug, Default)]
pub struct AstBuilder {
    nodes: Vec<Node>,
    cursor: TextPos,
}

impl AstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn alloc(&mut self, kind: NodeKind, width: usize) -> NodeId {
        let children = kind.children();
        let range = if children.is_empty() {
            let pos = self.cursor;
            TextRange::new(pos, pos + width.max(1) as TextPos)
        } else {
            let covered = children
                .iter()
                .filter_map(|child| self.nodes.get(child.index()))
                .map(|node| node.range)
                .reduce(|acc, range| acc.cover(&range))
                .unwrap_or_else(|| TextRange::empty(self.cursor));
            TextRange::new(covered.pos, covered.end.max(self.cursor) + 1)
        };
        self.cursor = self.cursor.max(range.end + 1);
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node { kind, range });
        id
    }

    // ========================================================================
    // QML
    // ========================================================================

    pub fn qualified_id(&mut self, dotted: &str) -> NodeId {
        let segments = dotted.split('.').map(str::to_string).collect();
        self.alloc(
            NodeKind::UiQualifiedId(UiQualifiedId { segments }),
            dotted.len(),
        )
    }

    pub fn pragma(&mut self, name: &str) -> NodeId {
        self.alloc(
            NodeKind::UiPragma(UiPragma {
                name: name.to_string(),
            }),
            name.len(),
        )
    }

    /// `import <uri> [version] [as alias]`
    pub fn import_module(&mut self, uri: &str, version: Option<&str>, alias: Option<&str>) -> NodeId {
        let import_uri = Some(self.qualified_id(uri));
        self.alloc(
            NodeKind::UiImport(UiImport {
                import_uri,
                file_name: None,
                version: version.map(str::to_string),
                import_id: alias.map(str::to_string),
            }),
            uri.len(),
        )
    }

    /// `import "<path>" [version] [as alias]`
    pub fn import_file(&mut self, path: &str, version: Option<&str>, alias: Option<&str>) -> NodeId {
        self.alloc(
            NodeKind::UiImport(UiImport {
                import_uri: None,
                file_name: Some(path.to_string()),
                version: version.map(str::to_string),
                import_id: alias.map(str::to_string),
            }),
            path.len() + 2,
        )
    }

    pub fn object_initializer(&mut self, members: Vec<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::UiObjectInitializer(UiObjectInitializer { members }),
            2,
        )
    }

    /// `<Type> { members }`
    pub fn object_definition(&mut self, type_name: &str, members: Vec<NodeId>) -> NodeId {
        let qualified_type_name_id = Some(self.qualified_id(type_name));
        let initializer = Some(self.object_initializer(members));
        self.alloc(
            NodeKind::UiObjectDefinition(UiObjectDefinition {
                qualified_type_name_id,
                initializer,
            }),
            type_name.len(),
        )
    }

    /// `<name>: <Type> { members }`
    pub fn object_binding(&mut self, name: &str, type_name: &str, members: Vec<NodeId>) -> NodeId {
        let qualified_id = Some(self.qualified_id(name));
        let qualified_type_name_id = Some(self.qualified_id(type_name));
        let initializer = Some(self.object_initializer(members));
        self.alloc(
            NodeKind::UiObjectBinding(UiObjectBinding {
                qualified_id,
                qualified_type_name_id,
                initializer,
                has_on_token: false,
            }),
            name.len(),
        )
    }

    /// `<name>: <statement>`
    pub fn script_binding(&mut self, name: &str, statement: NodeId) -> NodeId {
        let qualified_id = Some(self.qualified_id(name));
        self.alloc(
            NodeKind::UiScriptBinding(UiScriptBinding {
                qualified_id,
                statement: Some(statement),
            }),
            name.len(),
        )
    }

    /// `<name>: <expression>`
    pub fn script_expression(&mut self, name: &str, expression: NodeId) -> NodeId {
        let statement = self.expression_statement(expression);
        self.script_binding(name, statement)
    }

    /// `<name>: [ members ]`
    pub fn array_binding(&mut self, name: &str, members: Vec<NodeId>) -> NodeId {
        let qualified_id = Some(self.qualified_id(name));
        self.alloc(
            NodeKind::UiArrayBinding(UiArrayBinding {
                qualified_id,
                members,
            }),
            name.len(),
        )
    }

    /// `property <type> <name>[: <expression>]`
    pub fn property(&mut self, member_type: &str, name: &str, expression: Option<NodeId>) -> NodeId {
        self.property_with(member_type, None, name, expression, MemberFlags::NONE)
    }

    /// `[readonly|default] property [<modifier><]<type>[>] <name>[: <expression>]`
    pub fn property_with(
        &mut self,
        member_type: &str,
        type_modifier: Option<&str>,
        name: &str,
        expression: Option<NodeId>,
        flags: MemberFlags,
    ) -> NodeId {
        let statement = expression.map(|expr| self.expression_statement(expr));
        self.alloc(
            NodeKind::UiPublicMember(UiPublicMember {
                kind: PublicMemberKind::Property,
                name: name.to_string(),
                member_type: Some(member_type.to_string()),
                type_modifier: type_modifier.map(str::to_string),
                parameters: Vec::new(),
                statement,
                binding: None,
                flags,
            }),
            name.len(),
        )
    }

    /// `signal <name>(<type> <param>, ...)`
    pub fn signal(&mut self, name: &str, parameters: &[(&str, &str)]) -> NodeId {
        let parameters = parameters
            .iter()
            .map(|(type_name, name)| UiParameter {
                name: name.to_string(),
                type_name: type_name.to_string(),
            })
            .collect();
        self.alloc(
            NodeKind::UiPublicMember(UiPublicMember {
                kind: PublicMemberKind::Signal,
                name: name.to_string(),
                member_type: None,
                type_modifier: None,
                parameters,
                statement: None,
                binding: None,
                flags: MemberFlags::NONE,
            }),
            name.len(),
        )
    }

    /// Wrap a function declaration or variable statement for use inside an object.
    pub fn source_element(&mut self, element: NodeId) -> NodeId {
        self.alloc(
            NodeKind::UiSourceElement(UiSourceElement {
                source_element: Some(element),
            }),
            1,
        )
    }

    /// `component <name>: <object definition>`
    pub fn inline_component(&mut self, name: &str, component: NodeId) -> NodeId {
        self.alloc(
            NodeKind::UiInlineComponent(UiInlineComponent {
                name: name.to_string(),
                component: Some(component),
            }),
            name.len(),
        )
    }

    /// Finish a QML document with its import/pragma headers and root object.
    pub fn finish_qml(mut self, headers: Vec<NodeId>, root_object: NodeId) -> Ast {
        let root = self.alloc(
            NodeKind::UiProgram(UiProgram {
                headers,
                members: vec![root_object],
            }),
            1,
        );
        Ast::from_nodes(self.nodes, Some(root))
    }

    /// Finish a JavaScript document.
    pub fn finish_program(mut self, elements: Vec<NodeId>) -> Ast {
        let root = self.alloc(NodeKind::Program { elements }, 1);
        Ast::from_nodes(self.nodes, Some(root))
    }

    // ========================================================================
    // JavaScript statements
    // ========================================================================

    pub fn block(&mut self, statements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::Block { statements }, 2)
    }

    pub fn expression_statement(&mut self, expression: NodeId) -> NodeId {
        self.alloc(
            NodeKind::ExpressionStatement {
                expression: Some(expression),
            },
            1,
        )
    }

    pub fn return_statement(&mut self, expression: Option<NodeId>) -> NodeId {
        self.alloc(NodeKind::ReturnStatement { expression }, 6)
    }

    pub fn if_statement(&mut self, condition: NodeId, ok: NodeId, ko: Option<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::IfStatement {
                condition: Some(condition),
                ok: Some(ok),
                ko,
            },
            2,
        )
    }

    pub fn variable_declaration(&mut self, name: &str, initializer: Option<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::VariableDeclaration(VariableDeclaration {
                name: name.to_string(),
                kind: VariableKind::Var,
                initializer,
            }),
            name.len(),
        )
    }

    /// `var a = <init>, b;`
    pub fn var_statement(&mut self, declarations: Vec<(&str, Option<NodeId>)>) -> NodeId {
        let declarations = declarations
            .into_iter()
            .map(|(name, init)| self.variable_declaration(name, init))
            .collect();
        self.alloc(NodeKind::VariableStatement { declarations }, 3)
    }

    pub fn function_declaration(&mut self, name: &str, formals: &[&str], body: Vec<NodeId>) -> NodeId {
        let body = Some(self.block(body));
        self.alloc(
            NodeKind::FunctionDeclaration(FunctionNode {
                name: Some(name.to_string()),
                formals: formals.iter().map(|f| f.to_string()).collect(),
                body,
            }),
            name.len(),
        )
    }

    pub fn function_expression(&mut self, name: Option<&str>, formals: &[&str], body: Vec<NodeId>) -> NodeId {
        let body = Some(self.block(body));
        self.alloc(
            NodeKind::FunctionExpression(FunctionNode {
                name: name.map(str::to_string),
                formals: formals.iter().map(|f| f.to_string()).collect(),
                body,
            }),
            8,
        )
    }

    // ========================================================================
    // JavaScript expressions
    // ========================================================================

    pub fn identifier(&mut self, name: &str) -> NodeId {
        self.alloc(
            NodeKind::IdentifierExpression {
                name: name.to_string(),
            },
            name.len(),
        )
    }

    pub fn this(&mut self) -> NodeId {
        self.alloc(NodeKind::ThisExpression, 4)
    }

    pub fn null(&mut self) -> NodeId {
        self.alloc(NodeKind::NullExpression, 4)
    }

    pub fn boolean(&mut self, value: bool) -> NodeId {
        if value {
            self.alloc(NodeKind::TrueLiteral, 4)
        } else {
            self.alloc(NodeKind::FalseLiteral, 5)
        }
    }

    pub fn string(&mut self, value: &str) -> NodeId {
        self.alloc(
            NodeKind::StringLiteral {
                value: value.to_string(),
            },
            value.len() + 2,
        )
    }

    pub fn number(&mut self, value: f64) -> NodeId {
        self.alloc(NodeKind::NumericLiteral { value }, value.to_string().len())
    }

    pub fn regexp(&mut self, pattern: &str, flags: &str) -> NodeId {
        self.alloc(
            NodeKind::RegExpLiteral {
                pattern: pattern.to_string(),
                flags: flags.to_string(),
            },
            pattern.len() + flags.len() + 2,
        )
    }

    pub fn array(&mut self, elements: Vec<NodeId>) -> NodeId {
        self.alloc(NodeKind::ArrayLiteral { elements }, 2)
    }

    /// `{ name: value, ... }`
    pub fn object_literal(&mut self, properties: Vec<(&str, NodeId)>) -> NodeId {
        let properties = properties
            .into_iter()
            .map(|(name, value)| {
                self.alloc(
                    NodeKind::PropertyAssignment {
                        name: name.to_string(),
                        value: Some(value),
                    },
                    name.len(),
                )
            })
            .collect();
        self.alloc(NodeKind::ObjectLiteral { properties }, 2)
    }

    /// `<base>.<name>`
    pub fn field(&mut self, base: NodeId, name: &str) -> NodeId {
        self.alloc(
            NodeKind::FieldMemberExpression {
                base: Some(base),
                name: name.to_string(),
            },
            name.len(),
        )
    }

    /// A dotted chain of identifiers: `a.b.c`.
    pub fn path(&mut self, dotted: &str) -> NodeId {
        let mut segments = dotted.split('.');
        let first = segments.next().unwrap_or_default();
        let mut expr = self.identifier(first);
        for segment in segments {
            expr = self.field(expr, segment);
        }
        expr
    }

    /// `<base>[<expression>]`
    pub fn index(&mut self, base: NodeId, expression: NodeId) -> NodeId {
        self.alloc(
            NodeKind::ArrayMemberExpression {
                base: Some(base),
                expression: Some(expression),
            },
            2,
        )
    }

    pub fn call(&mut self, base: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::CallExpression(CallExpression {
                base: Some(base),
                arguments,
            }),
            2,
        )
    }

    /// `new <base>(arguments)`
    pub fn new_member(&mut self, base: NodeId, arguments: Vec<NodeId>) -> NodeId {
        self.alloc(
            NodeKind::NewMemberExpression(CallExpression {
                base: Some(base),
                arguments,
            }),
            3,
        )
    }

    /// `new <expression>`
    pub fn new_expression(&mut self, expression: NodeId) -> NodeId {
        self.alloc(
            NodeKind::NewExpression {
                expression: Some(expression),
            },
            3,
        )
    }

    pub fn binary(&mut self, op: BinaryOp, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(
            NodeKind::BinaryExpression(BinaryExpression {
                op,
                left: Some(left),
                right: Some(right),
            }),
            op.as_str().len(),
        )
    }

    pub fn unary(&mut self, op: UnaryOp, expression: NodeId) -> NodeId {
        self.alloc(
            NodeKind::UnaryExpression {
                op,
                expression: Some(expression),
            },
            1,
        )
    }

    pub fn conditional(&mut self, condition: NodeId, ok: NodeId, ko: NodeId) -> NodeId {
        self.alloc(
            NodeKind::ConditionalExpression {
                condition: Some(condition),
                ok: Some(ok),
                ko: Some(ko),
            },
            1,
        )
    }

    /// `<left>, <right>`
    pub fn comma(&mut self, left: NodeId, right: NodeId) -> NodeId {
        self.alloc(
            NodeKind::Expression {
                left: Some(left),
                right: Some(right),
            },
            1,
        )
    }

    /// `( <expression> )`
    pub fn nested(&mut self, expression: NodeId) -> NodeId {
        self.alloc(
            NodeKind::NestedExpression {
                expression: Some(expression),
            },
            2,
        )
    }

    /// Insert an arbitrary node, e.g. one with missing children.
    pub fn raw(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(kind, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leaf_ranges_do_not_overlap() {
        let mut b = AstBuilder::new();
        let a = b.identifier("alpha");
        let c = b.identifier("c");
        let ast = b.finish_program(vec![a, c]);
        let ra = ast.range(a);
        let rc = ast.range(c);
        assert_eq!(ra.len(), 5);
        assert!(ra.end < rc.pos);
    }

    #[test]
    fn test_path_builds_field_chain() {
        let mut b = AstBuilder::new();
        let expr = b.path("a.b.c");
        let ast = b.finish_program(vec![expr]);
        match ast.kind(expr) {
            Some(NodeKind::FieldMemberExpression { name, base }) => {
                assert_eq!(name, "c");
                assert!(matches!(
                    base.and_then(|b| ast.kind(b)),
                    Some(NodeKind::FieldMemberExpression { .. })
                ));
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_object_definition_shape() {
        let mut b = AstBuilder::new();
        let prop = b.property("int", "count", None);
        let obj = b.object_definition("QtQuick.Item", vec![prop]);
        let ast = b.finish_qml(vec![], obj);
        let (type_id, initializer) = ast.kind(obj).and_then(NodeKind::object_parts).unwrap();
        assert_eq!(
            ast.qualified_id(type_id).map(|q| q.segments.clone()),
            Some(vec!["QtQuick".to_string(), "Item".to_string()])
        );
        assert!(initializer.is_some());
        assert_eq!(ast.object_members(obj), &[prop]);
        assert_eq!(ast.parent(prop), initializer);
    }
}

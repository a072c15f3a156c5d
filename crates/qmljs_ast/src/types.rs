//! Identifiers, operator kinds and flag types used by AST nodes.

use std::fmt;

/// Index of a node inside its [`Ast`](crate::Ast).
///
/// Ids are only meaningful together with the tree that produced them.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The language a document is written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    #[default]
    Qml,
    JavaScript,
}

impl Dialect {
    pub fn is_qml(self) -> bool {
        self == Dialect::Qml
    }
}

/// Binary and assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Exp,
    LShift,
    RShift,
    URShift,
    BitAnd,
    BitOr,
    BitXor,
    And,
    Or,
    Coalesce,
    Equal,
    NotEqual,
    StrictEqual,
    StrictNotEqual,
    Lt,
    Le,
    Gt,
    Ge,
    In,
    InstanceOf,
    Assign,
    InplaceAdd,
    InplaceSub,
    InplaceMul,
    InplaceDiv,
    InplaceMod,
    InplaceExp,
    InplaceLeftShift,
    InplaceRightShift,
    InplaceURightShift,
    InplaceAnd,
    InplaceOr,
    InplaceXor,
}

impl BinaryOp {
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Exp => "**",
            BinaryOp::LShift => "<<",
            BinaryOp::RShift => ">>",
            BinaryOp::URShift => ">>>",
            BinaryOp::BitAnd => "&",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Coalesce => "??",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::StrictEqual => "===",
            BinaryOp::StrictNotEqual => "!==",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::In => "in",
            BinaryOp::InstanceOf => "instanceof",
            BinaryOp::Assign => "=",
            BinaryOp::InplaceAdd => "+=",
            BinaryOp::InplaceSub => "-=",
            BinaryOp::InplaceMul => "*=",
            BinaryOp::InplaceDiv => "/=",
            BinaryOp::InplaceMod => "%=",
            BinaryOp::InplaceExp => "**=",
            BinaryOp::InplaceLeftShift => "<<=",
            BinaryOp::InplaceRightShift => ">>=",
            BinaryOp::InplaceURightShift => ">>>=",
            BinaryOp::InplaceAnd => "&=",
            BinaryOp::InplaceOr => "|=",
            BinaryOp::InplaceXor => "^=",
        }
    }
}

/// Prefix and postfix unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Tilde,
    Not,
    TypeOf,
    Void,
    Delete,
    PreIncrement,
    PreDecrement,
    PostIncrement,
    PostDecrement,
}

/// `var`, `let` or `const`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum VariableKind {
    #[default]
    Var,
    Let,
    Const,
}

/// Whether a `UiPublicMember` declares a property or a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PublicMemberKind {
    Property,
    Signal,
}

bitflags::bitflags! {
    /// Modifiers on a QML `property` declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        const NONE     = 0;
        const READONLY = 1 << 0;
        const DEFAULT  = 1 << 1;
        const REQUIRED = 1 << 2;
    }
}

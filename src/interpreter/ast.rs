use std::fmt::{Display, Formatter};
use std::rc::Rc;
use crate::interpreter::value::{TypeTag, Value};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Add, Subtract, Multiply, Divide, Modulo,
    Equal, NotEqual,
    Less, LessEqual,
    Greater, GreaterEqual,
    And, Or,
}

impl BinOp {
    pub fn is_comparison(&self) -> bool {
        matches!(self, BinOp::Equal | BinOp::NotEqual
            | BinOp::Less | BinOp::LessEqual
            | BinOp::Greater | BinOp::GreaterEqual)
    }
}

impl Display for BinOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::Less => "<",
            BinOp::LessEqual => "<=",
            BinOp::Greater => ">",
            BinOp::GreaterEqual => ">=",
            BinOp::And => "&&",
            BinOp::Or => "||",
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

impl Display for UnaryOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            UnaryOp::Negate => "-",
            UnaryOp::Not => "!",
        })
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    Literal(Value),
    Variable(String),
    Binary {
        left: Box<Expr>,
        op: BinOp,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    FuncCall {
        name: String,
        args: Vec<Expr>,
    },
    FieldAccess {
        target: Box<Expr>,
        field: String,
    },
    /// Instance construction with per-field initializer overrides.
    ClassExpr {
        name: String,
        initializers: Vec<(String, Expr)>,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub enum Stmt {
    VarDeclaration {
        name: String,
        declared_type: Option<TypeTag>,
        initializer: Option<Expr>,
    },
    /// Target is a `Variable` or a `FieldAccess` expression.
    Assignment {
        target: Expr,
        value: Expr,
    },
    Expression(Expr),
    If {
        condition: Expr,
        then_branch: Vec<Stmt>,
        else_branch: Option<Vec<Stmt>>,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
    },
    FuncDefinition(Rc<FuncDecl>),
    ClassDefinition(Rc<ClassDecl>),
    Return(Option<Expr>),
}

#[derive(Debug, PartialEq)]
pub struct FuncDecl {
    pub name: String,
    pub parameters: Vec<String>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FieldDecl {
    pub name: String,
    pub initializer: Option<Expr>,
}

/// Root of a parsed program.
#[derive(Debug, PartialEq)]
pub struct Program {
    pub statements: Vec<Stmt>,
}

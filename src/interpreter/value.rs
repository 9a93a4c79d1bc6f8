use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use crate::interpreter::ast::{ClassDecl, FuncDecl};
use crate::interpreter::evaluator::RuntimeError;
use crate::interpreter::scope::ScopeRef;

/// A runtime value. Integers and floats stay distinct; arithmetic only
/// promotes to float when a float operand is involved.
#[derive(Clone)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
    Instance(Rc<ClassInstance>),
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Str(_) => "string",
            Value::Instance(_) => "instance",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            // Instances compare by identity
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Int(n) => write!(f, "{}", n),
            // Floats always render with a decimal point so they stay
            // distinguishable from integers in print output
            Value::Float(n) if n.is_finite() && n.fract() == 0.0 => write!(f, "{:.1}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Str(s) => f.write_str(s),
            Value::Instance(instance) => write!(f, "<{} instance>", instance.class.name),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => write!(f, "{:?}", s),
            Value::Instance(instance) => write!(f, "Instance({})", instance.class.name),
            _ => write!(f, "{}", self),
        }
    }
}

/// Runtime tag attached to a variable binding; assignments to a tagged
/// binding must keep the tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TypeTag {
    Int,
    Float,
    Bool,
    Str,
}

impl TypeTag {
    /// Tag inferred from a declaration's initial value. Null and instances
    /// leave the binding untagged.
    pub fn infer(value: &Value) -> Option<TypeTag> {
        match value {
            Value::Int(_) => Some(TypeTag::Int),
            Value::Float(_) => Some(TypeTag::Float),
            Value::Bool(_) => Some(TypeTag::Bool),
            Value::Str(_) => Some(TypeTag::Str),
            Value::Null | Value::Instance(_) => None,
        }
    }

    pub fn matches(&self, value: &Value) -> bool {
        matches!((self, value),
            (TypeTag::Int, Value::Int(_))
            | (TypeTag::Float, Value::Float(_))
            | (TypeTag::Bool, Value::Bool(_))
            | (TypeTag::Str, Value::Str(_)))
    }

    pub fn check(&self, value: &Value) -> Result<(), RuntimeError> {
        if self.matches(value) {
            Ok(())
        } else {
            Err(RuntimeError::TypeMismatch { expected: *self, found: value.type_name() })
        }
    }
}

impl Display for TypeTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TypeTag::Int => "int",
            TypeTag::Float => "float",
            TypeTag::Bool => "bool",
            TypeTag::Str => "string",
        })
    }
}

/// A defined function together with the scope captured at its definition
/// site. Every call chains a fresh scope onto `closure`, not onto the
/// caller's scope.
#[derive(Clone)]
pub struct Function {
    pub decl: Rc<FuncDecl>,
    pub closure: ScopeRef,
}

impl Debug for Function {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        // The closure scope is omitted: scope chains are cyclic through
        // the functions they hold
        write!(f, "Function({}/{})", self.decl.name, self.decl.parameters.len())
    }
}

/// An instantiated class: its definition plus an owned scope holding the
/// field bindings.
pub struct ClassInstance {
    pub class: Rc<ClassDecl>,
    pub fields: ScopeRef,
}

impl Debug for ClassInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ClassInstance({})", self.class.name)
    }
}

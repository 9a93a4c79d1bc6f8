use std::fmt::{Display, Formatter};
use std::rc::Rc;
use crate::interpreter::ast::{BinOp, Expr, Program, Stmt, UnaryOp};
use crate::interpreter::scope::{Scope, ScopeRef};
use crate::interpreter::value::{ClassInstance, Function, TypeTag, Value};

#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    UndefinedVariable(String),
    UndefinedFunction(String),
    UndefinedClass(String),
    VariableAlreadyDeclared(String),
    FunctionAlreadyDefined(String),
    ClassAlreadyDefined(String),
    TypeMismatch { expected: TypeTag, found: &'static str },
    ConditionNotBoolean { construct: &'static str, found: &'static str },
    UnsupportedOperands { op: BinOp, left: &'static str, right: &'static str },
    UnsupportedUnary { op: UnaryOp, operand: &'static str },
    InvalidComparison { op: BinOp, operands: &'static str },
    DivisionByZero,
    ArityMismatch { name: String, expected: usize, found: usize },
    FieldAccessOnNonInstance { found: &'static str },
    UndefinedField { field: String, class: String },
    InvalidAssignmentTarget,
}

impl Display for RuntimeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            RuntimeError::UndefinedVariable(name) => write!(f, "Undefined variable: {}", name),
            RuntimeError::UndefinedFunction(name) => write!(f, "Undefined function: {}", name),
            RuntimeError::UndefinedClass(name) => write!(f, "Undefined class: {}", name),
            RuntimeError::VariableAlreadyDeclared(name) => write!(f, "Variable already declared: {}", name),
            RuntimeError::FunctionAlreadyDefined(name) => write!(f, "Function already defined: {}", name),
            RuntimeError::ClassAlreadyDefined(name) => write!(f, "Class already defined: {}", name),
            RuntimeError::TypeMismatch { expected, found } =>
                write!(f, "Type mismatch: expected {}, got {}", expected, found),
            RuntimeError::ConditionNotBoolean { construct, found } =>
                write!(f, "{} condition must be boolean, got {}", construct, found),
            RuntimeError::UnsupportedOperands { op, left, right } =>
                write!(f, "Unsupported operand types for '{}': {} and {}", op, left, right),
            RuntimeError::UnsupportedUnary { op, operand } =>
                write!(f, "Unsupported operand type for unary '{}': {}", op, operand),
            RuntimeError::InvalidComparison { op, operands } =>
                write!(f, "{} values can only be compared with == or !=, not '{}'", operands, op),
            RuntimeError::DivisionByZero => f.write_str("Division or modulo by zero"),
            RuntimeError::ArityMismatch { name, expected, found } =>
                write!(f, "Function {} expects {} arguments but got {}", name, expected, found),
            RuntimeError::FieldAccessOnNonInstance { found } =>
                write!(f, "Field access on non-instance type: {}", found),
            RuntimeError::UndefinedField { field, class } =>
                write!(f, "Undefined field '{}' in class {}", field, class),
            RuntimeError::InvalidAssignmentTarget => f.write_str("Invalid assignment target"),
        }
    }
}

type EvalResult<T> = Result<T, RuntimeError>;

/// Outcome of executing a statement: either fall through to the next one,
/// or unwind to the nearest enclosing function-call boundary with a value.
/// This is ordinary data threaded through compound statements, kept apart
/// from `RuntimeError` so genuine faults never mix with intended control
/// flow.
#[derive(Debug, Clone, PartialEq)]
pub enum ExecOutcome {
    Continue,
    Return(Value),
}

/// Runs a program's statements top to bottom against the given scope.
///
/// A return outcome surfacing here has no enclosing call to receive it;
/// it stops the remaining statements and its value is discarded.
pub fn execute(program: &Program, scope: &ScopeRef) -> EvalResult<()> {
    for stmt in &program.statements {
        if let ExecOutcome::Return(_) = exec_stmt(stmt, scope)? {
            break;
        }
    }

    Ok(())
}

pub fn exec_stmt(stmt: &Stmt, scope: &ScopeRef) -> EvalResult<ExecOutcome> {
    match stmt {
        Stmt::VarDeclaration { name, declared_type, initializer } => {
            let value = match initializer {
                Some(expr) => eval_expr(expr, scope)?,
                None => Value::Null,
            };

            let tag = match declared_type {
                Some(tag) => {
                    tag.check(&value)?;
                    Some(*tag)
                },
                None => TypeTag::infer(&value),
            };

            scope.borrow_mut().declare_variable(name, tag, value)?;
            Ok(ExecOutcome::Continue)
        },
        Stmt::Assignment { target, value } => {
            let value = eval_expr(value, scope)?;

            match target {
                Expr::Variable(name) => scope.borrow_mut().set_variable(name, value)?,
                Expr::FieldAccess { target, field } => {
                    let instance = match eval_expr(target, scope)? {
                        Value::Instance(instance) => instance,
                        other => return Err(RuntimeError::FieldAccessOnNonInstance { found: other.type_name() }),
                    };

                    instance.fields.borrow_mut().set_variable(field, value)?;
                },
                _ => return Err(RuntimeError::InvalidAssignmentTarget),
            }

            Ok(ExecOutcome::Continue)
        },
        Stmt::Expression(expr) => {
            eval_expr(expr, scope)?;
            Ok(ExecOutcome::Continue)
        },
        Stmt::If { condition, then_branch, else_branch } => {
            if eval_condition(condition, scope, "If")? {
                exec_branch(then_branch, scope)
            } else if let Some(else_branch) = else_branch {
                exec_branch(else_branch, scope)
            } else {
                Ok(ExecOutcome::Continue)
            }
        },
        Stmt::While { condition, body } => {
            while eval_condition(condition, scope, "While")? {
                // Fresh scope per iteration: declarations don't leak
                // across iterations, and a closure made in one iteration
                // still sees that iteration's own bindings
                let loop_scope = Scope::new_with_parent(Rc::clone(scope));

                for stmt in body {
                    if let ExecOutcome::Return(value) = exec_stmt(stmt, &loop_scope)? {
                        return Ok(ExecOutcome::Return(value));
                    }
                }
            }

            Ok(ExecOutcome::Continue)
        },
        Stmt::FuncDefinition(decl) => {
            // The scope in effect right now becomes the function's closure
            // environment, fixed for every future call
            let function = Function { decl: Rc::clone(decl), closure: Rc::clone(scope) };
            scope.borrow_mut().declare_function(&decl.name, function)?;

            Ok(ExecOutcome::Continue)
        },
        Stmt::ClassDefinition(decl) => {
            scope.borrow_mut().declare_class(&decl.name, Rc::clone(decl))?;
            Ok(ExecOutcome::Continue)
        },
        Stmt::Return(expr) => {
            let value = match expr {
                Some(expr) => eval_expr(expr, scope)?,
                None => Value::Null,
            };

            Ok(ExecOutcome::Return(value))
        },
    }
}

fn eval_condition(condition: &Expr, scope: &ScopeRef, construct: &'static str) -> EvalResult<bool> {
    match eval_expr(condition, scope)? {
        Value::Bool(b) => Ok(b),
        other => Err(RuntimeError::ConditionNotBoolean { construct, found: other.type_name() }),
    }
}

// Branches run in a fresh child scope so their declarations stay local
fn exec_branch(branch: &[Stmt], scope: &ScopeRef) -> EvalResult<ExecOutcome> {
    let branch_scope = Scope::new_with_parent(Rc::clone(scope));

    for stmt in branch {
        if let ExecOutcome::Return(value) = exec_stmt(stmt, &branch_scope)? {
            return Ok(ExecOutcome::Return(value));
        }
    }

    Ok(ExecOutcome::Continue)
}

pub fn eval_expr(expr: &Expr, scope: &ScopeRef) -> EvalResult<Value> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Variable(name) => scope.borrow().get_variable(name),
        Expr::Unary { op, operand } => {
            let value = eval_expr(operand, scope)?;

            match (op, value) {
                (UnaryOp::Negate, Value::Int(n)) => Ok(Value::Int(n.wrapping_neg())),
                (UnaryOp::Negate, Value::Float(n)) => Ok(Value::Float(-n)),
                (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                (op, value) => Err(RuntimeError::UnsupportedUnary { op: *op, operand: value.type_name() }),
            }
        },
        Expr::Binary { left, op, right } => {
            // Both operands evaluate before dispatch; && and || do not
            // short-circuit
            let left = eval_expr(left, scope)?;
            let right = eval_expr(right, scope)?;

            eval_binary(left, *op, right)
        },
        Expr::FuncCall { name, args } => eval_call(name, args, scope),
        Expr::FieldAccess { target, field } => {
            let instance = match eval_expr(target, scope)? {
                Value::Instance(instance) => instance,
                other => return Err(RuntimeError::FieldAccessOnNonInstance { found: other.type_name() }),
            };

            let fields = instance.fields.borrow();

            if !fields.has_variable(field) {
                return Err(RuntimeError::UndefinedField {
                    field: field.clone(),
                    class: instance.class.name.clone(),
                });
            }

            fields.get_variable(field)
        },
        Expr::ClassExpr { name, initializers } => {
            let class = scope.borrow().get_class(name)
                .ok_or_else(|| RuntimeError::UndefinedClass(name.clone()))?;

            let instance_scope = Scope::new_with_parent(Rc::clone(scope));

            for field in &class.fields {
                let explicit = initializers.iter()
                    .find(|(init_name, _)| init_name == &field.name)
                    .map(|(_, expr)| expr);

                // Explicit initializer beats the field default; an
                // uninitialized field starts as null
                let value = match explicit.or(field.initializer.as_ref()) {
                    Some(expr) => eval_expr(expr, scope)?,
                    None => Value::Null,
                };

                instance_scope.borrow_mut().declare_variable(&field.name, None, value)?;
            }

            Ok(Value::Instance(Rc::new(ClassInstance { class, fields: instance_scope })))
        },
    }
}

fn eval_binary(left: Value, op: BinOp, right: Value) -> EvalResult<Value> {
    if op == BinOp::And || op == BinOp::Or {
        return eval_logical(left, op, right);
    }

    if op.is_comparison() {
        return eval_comparison(left, op, right);
    }

    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => {
            let (a, b) = (*a, *b);

            // Integer arithmetic wraps on overflow, two's complement;
            // division truncates toward zero
            match op {
                BinOp::Add => Ok(Value::Int(a.wrapping_add(b))),
                BinOp::Subtract => Ok(Value::Int(a.wrapping_sub(b))),
                BinOp::Multiply => Ok(Value::Int(a.wrapping_mul(b))),
                BinOp::Divide if b == 0 => Err(RuntimeError::DivisionByZero),
                BinOp::Divide => Ok(Value::Int(a.wrapping_div(b))),
                BinOp::Modulo if b == 0 => Err(RuntimeError::DivisionByZero),
                BinOp::Modulo => Ok(Value::Int(a.wrapping_rem(b))),
                _ => Err(unsupported(op, &left, &right)),
            }
        },
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            // A float on either side promotes both operands; division by
            // zero yields an infinite value under float semantics
            let a = as_float(&left);
            let b = as_float(&right);

            match op {
                BinOp::Add => Ok(Value::Float(a + b)),
                BinOp::Subtract => Ok(Value::Float(a - b)),
                BinOp::Multiply => Ok(Value::Float(a * b)),
                BinOp::Divide => Ok(Value::Float(a / b)),
                BinOp::Modulo => Ok(Value::Float(a % b)),
                _ => Err(unsupported(op, &left, &right)),
            }
        },
        (Value::Str(_), _) | (_, Value::Str(_)) if op == BinOp::Add => {
            Ok(Value::Str(format!("{}{}", left, right)))
        },
        _ => Err(unsupported(op, &left, &right)),
    }
}

fn eval_logical(left: Value, op: BinOp, right: Value) -> EvalResult<Value> {
    let (a, b) = match (&left, &right) {
        (Value::Bool(a), Value::Bool(b)) => (*a, *b),
        _ => return Err(unsupported(op, &left, &right)),
    };

    match op {
        BinOp::And => Ok(Value::Bool(a && b)),
        BinOp::Or => Ok(Value::Bool(a || b)),
        _ => Err(unsupported(op, &left, &right)),
    }
}

fn eval_comparison(left: Value, op: BinOp, right: Value) -> EvalResult<Value> {
    // Null only supports equality checks
    if left == Value::Null || right == Value::Null {
        return match op {
            BinOp::Equal => Ok(Value::Bool(left == right)),
            BinOp::NotEqual => Ok(Value::Bool(left != right)),
            _ => Err(RuntimeError::InvalidComparison { op, operands: "null" }),
        };
    }

    match (&left, &right) {
        // Numbers compare as floats regardless of the int/float split
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            let a = as_float(&left);
            let b = as_float(&right);

            Ok(Value::Bool(match op {
                BinOp::Equal => a == b,
                BinOp::NotEqual => a != b,
                BinOp::Less => a < b,
                BinOp::Greater => a > b,
                BinOp::LessEqual => a <= b,
                BinOp::GreaterEqual => a >= b,
                _ => return Err(unsupported(op, &left, &right)),
            }))
        },
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(match op {
            BinOp::Equal => a == b,
            BinOp::NotEqual => a != b,
            BinOp::Less => a < b,
            BinOp::Greater => a > b,
            BinOp::LessEqual => a <= b,
            BinOp::GreaterEqual => a >= b,
            _ => return Err(unsupported(op, &left, &right)),
        })),
        (Value::Bool(a), Value::Bool(b)) => match op {
            BinOp::Equal => Ok(Value::Bool(a == b)),
            BinOp::NotEqual => Ok(Value::Bool(a != b)),
            _ => Err(RuntimeError::InvalidComparison { op, operands: "boolean" }),
        },
        // Anything else falls back to generic equality: instances compare
        // by identity, mismatched types are never equal
        _ => match op {
            BinOp::Equal => Ok(Value::Bool(left == right)),
            BinOp::NotEqual => Ok(Value::Bool(left != right)),
            _ => Err(RuntimeError::InvalidComparison { op, operands: left.type_name() }),
        },
    }
}

fn as_float(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => f64::NAN,
    }
}

fn unsupported(op: BinOp, left: &Value, right: &Value) -> RuntimeError {
    RuntimeError::UnsupportedOperands { op, left: left.type_name(), right: right.type_name() }
}

fn eval_call(name: &str, args: &[Expr], scope: &ScopeRef) -> EvalResult<Value> {
    // Builtins resolve before user functions and produce no value
    if name == "print" || name == "println" {
        for arg in args {
            print!("{}", eval_expr(arg, scope)?);
        }

        if name == "println" {
            println!();
        }

        return Ok(Value::Null);
    }

    let function = scope.borrow().get_function(name)
        .ok_or_else(|| RuntimeError::UndefinedFunction(name.to_owned()))?;

    if args.len() != function.decl.parameters.len() {
        return Err(RuntimeError::ArityMismatch {
            name: name.to_owned(),
            expected: function.decl.parameters.len(),
            found: args.len(),
        });
    }

    // The call scope chains onto the closure environment, not the caller's
    // scope: lexical, not dynamic, scoping. Arguments still evaluate in
    // the caller's scope.
    let call_scope = Scope::new_with_parent(Rc::clone(&function.closure));

    for (parameter, arg) in function.decl.parameters.iter().zip(args) {
        let value = eval_expr(arg, scope)?;
        call_scope.borrow_mut().declare_variable(parameter, None, value)?;
    }

    for stmt in &function.decl.body {
        if let ExecOutcome::Return(value) = exec_stmt(stmt, &call_scope)? {
            return Ok(value);
        }
    }

    Ok(Value::Null)
}

#[cfg(test)]
mod tests;

use pretty_assertions::assert_eq;
use crate::interpreter::ast::{ClassDecl, FieldDecl};
use crate::interpreter::lexer::tokenize;
use crate::interpreter::parser::parse;
use super::*;

fn run(source: &str) -> ScopeRef {
    let (scope, result) = try_run(source);
    result.unwrap();
    scope
}

fn try_run(source: &str) -> (ScopeRef, Result<(), RuntimeError>) {
    let scope = Scope::new_root();
    let program = parse(tokenize(source).unwrap()).unwrap();
    let result = execute(&program, &scope);

    (scope, result)
}

fn run_err(source: &str) -> RuntimeError {
    try_run(source).1.unwrap_err()
}

fn get(scope: &ScopeRef, name: &str) -> Value {
    scope.borrow().get_variable(name).unwrap()
}

#[test]
fn integer_division_truncates() {
    let scope = run("var a = 7 / 2; var b = -7 / 2; var c = 7 % 3;");

    assert_eq!(get(&scope, "a"), Value::Int(3));
    assert_eq!(get(&scope, "b"), Value::Int(-3));
    assert_eq!(get(&scope, "c"), Value::Int(1));
}

#[test]
fn integer_arithmetic_wraps_on_overflow() {
    let source = "var min = 0 - 9223372036854775807 - 1; \
        var a = min / -1; \
        var b = 9223372036854775806 + 2; \
        var c = min - 1; \
        var d = -min;";
    let scope = run(source);

    assert_eq!(get(&scope, "min"), Value::Int(i64::MIN));
    assert_eq!(get(&scope, "a"), Value::Int(i64::MIN));
    assert_eq!(get(&scope, "b"), Value::Int(i64::MIN));
    assert_eq!(get(&scope, "c"), Value::Int(i64::MAX));
    assert_eq!(get(&scope, "d"), Value::Int(i64::MIN));
}

#[test]
fn float_operand_promotes_the_result() {
    let scope = run("var a = 7.0 / 2; var b = 1 + 0.5;");

    assert_eq!(get(&scope, "a"), Value::Float(3.5));
    assert_eq!(get(&scope, "b"), Value::Float(1.5));
}

#[test]
fn integer_division_by_zero_faults() {
    assert_eq!(run_err("var x = 1 / 0;"), RuntimeError::DivisionByZero);
    assert_eq!(run_err("var x = 1 % 0;"), RuntimeError::DivisionByZero);
}

#[test]
fn float_division_by_zero_is_infinite() {
    let scope = run("var x = 1.0 / 0; var y = -1 / 0.0;");

    assert_eq!(get(&scope, "x"), Value::Float(f64::INFINITY));
    assert_eq!(get(&scope, "y"), Value::Float(f64::NEG_INFINITY));
}

#[test]
fn string_concatenation_stringifies_either_side() {
    let scope = run(r#"var a = "a" + 1; var b = 1 + "a"; var c = "v=" + 2.0; var d = "is " + true;"#);

    assert_eq!(get(&scope, "a"), Value::Str(String::from("a1")));
    assert_eq!(get(&scope, "b"), Value::Str(String::from("1a")));
    assert_eq!(get(&scope, "c"), Value::Str(String::from("v=2.0")));
    assert_eq!(get(&scope, "d"), Value::Str(String::from("is true")));
}

#[test]
fn subtraction_of_strings_is_unsupported() {
    assert_eq!(run_err(r#"var x = "a" - "b";"#),
        RuntimeError::UnsupportedOperands { op: BinOp::Subtract, left: "string", right: "string" });
}

#[test]
fn unary_operators() {
    let scope = run("var a = -(2 + 3); var b = !true; var c = -2.5;");

    assert_eq!(get(&scope, "a"), Value::Int(-5));
    assert_eq!(get(&scope, "b"), Value::Bool(false));
    assert_eq!(get(&scope, "c"), Value::Float(-2.5));

    assert_eq!(run_err("var x = -true;"),
        RuntimeError::UnsupportedUnary { op: UnaryOp::Negate, operand: "bool" });
}

#[test]
fn numbers_compare_across_int_and_float() {
    let scope = run("var a = 1 == 1.0; var b = 2 < 2.5; var c = 3.0 >= 3;");

    assert_eq!(get(&scope, "a"), Value::Bool(true));
    assert_eq!(get(&scope, "b"), Value::Bool(true));
    assert_eq!(get(&scope, "c"), Value::Bool(true));
}

#[test]
fn strings_compare_lexicographically() {
    let scope = run(r#"var a = "abc" < "abd"; var b = "b" > "a"; var c = "x" == "x";"#);

    assert_eq!(get(&scope, "a"), Value::Bool(true));
    assert_eq!(get(&scope, "b"), Value::Bool(true));
    assert_eq!(get(&scope, "c"), Value::Bool(true));
}

#[test]
fn null_supports_only_equality() {
    let scope = run("var n; var a = n == n; var b = n == 1; var c = n != 1;");

    assert_eq!(get(&scope, "a"), Value::Bool(true));
    assert_eq!(get(&scope, "b"), Value::Bool(false));
    assert_eq!(get(&scope, "c"), Value::Bool(true));

    assert_eq!(run_err("var n; var x = n < 1;"),
        RuntimeError::InvalidComparison { op: BinOp::Less, operands: "null" });
}

#[test]
fn booleans_do_not_order() {
    assert_eq!(run_err("var x = true < false;"),
        RuntimeError::InvalidComparison { op: BinOp::Less, operands: "boolean" });
}

#[test]
fn mixed_types_are_never_equal() {
    let scope = run(r#"var a = 1 == "1"; var b = true == 1;"#);

    assert_eq!(get(&scope, "a"), Value::Bool(false));
    assert_eq!(get(&scope, "b"), Value::Bool(false));
}

// Both operands of && and || always evaluate; there is no short-circuit.
#[test]
fn logical_operators_are_eager() {
    let scope = run("var a = true && false; var b = false || true;");

    assert_eq!(get(&scope, "a"), Value::Bool(false));
    assert_eq!(get(&scope, "b"), Value::Bool(true));

    assert_eq!(run_err("var x = false && 1 / 0 == 0;"), RuntimeError::DivisionByZero);
    assert_eq!(run_err("var x = true || 1 / 0 == 0;"), RuntimeError::DivisionByZero);
}

#[test]
fn logical_operators_require_booleans() {
    assert_eq!(run_err("var x = 1 && true;"),
        RuntimeError::UnsupportedOperands { op: BinOp::And, left: "int", right: "bool" });
}

#[test]
fn duplicate_declaration_faults() {
    assert_eq!(run_err("var x = 1; var x = 2;"),
        RuntimeError::VariableAlreadyDeclared(String::from("x")));
}

#[test]
fn shadowing_leaves_the_outer_binding_unchanged() {
    let scope = run("var x = 1; if true { var x = 2; x = 3; }");

    assert_eq!(get(&scope, "x"), Value::Int(1));
}

#[test]
fn assignment_in_a_block_reaches_the_outer_binding() {
    let scope = run("var x = 1; if true { x = 5; }");

    assert_eq!(get(&scope, "x"), Value::Int(5));
}

#[test]
fn block_declarations_do_not_leak() {
    let scope = run("if true { var inner = 1; }");

    assert!(!scope.borrow().has_variable("inner"));
}

#[test]
fn type_tag_is_inferred_at_declaration() {
    assert_eq!(run_err(r#"var x = 1; x = "s";"#),
        RuntimeError::TypeMismatch { expected: TypeTag::Int, found: "string" });

    // A null-initialized binding stays untagged and accepts anything
    let scope = run(r#"var x; x = 1; x = "s";"#);
    assert_eq!(get(&scope, "x"), Value::Str(String::from("s")));
}

#[test]
fn condition_must_be_boolean() {
    assert_eq!(run_err("if 1 { }"),
        RuntimeError::ConditionNotBoolean { construct: "If", found: "int" });
    assert_eq!(run_err("while \"x\" { }"),
        RuntimeError::ConditionNotBoolean { construct: "While", found: "string" });
}

#[test]
fn false_condition_skips_the_loop_entirely() {
    let scope = run("var c = 0; while false { c = 1; }");

    assert_eq!(get(&scope, "c"), Value::Int(0));
}

#[test]
fn loop_iterations_get_a_fresh_scope() {
    let scope = run("var total = 0; var i = 0; while i < 3 { var d = i; total = total + d; i = i + 1; }");

    assert_eq!(get(&scope, "total"), Value::Int(3));
}

#[test]
fn countdown_loop() {
    let scope = run("var n = 5; var sum = 0; while n > 0 { sum = sum + n; n = n - 1; }");

    assert_eq!(get(&scope, "sum"), Value::Int(15));
}

#[test]
fn function_call_and_return() {
    let scope = run("func add(a, b) { return a + b; } var r = add(2, 3);");

    assert_eq!(get(&scope, "r"), Value::Int(5));
}

#[test]
fn function_without_return_yields_null() {
    let scope = run("func nop() { } var r = nop();");

    assert_eq!(get(&scope, "r"), Value::Null);
}

#[test]
fn recursive_fibonacci() {
    let scope = run("func fib(n) { if n < 2 { return n; } return fib(n - 1) + fib(n - 2); } var r = fib(10);");

    assert_eq!(get(&scope, "r"), Value::Int(55));
}

#[test]
fn return_propagates_out_of_a_loop() {
    let scope = run("func f() { var i = 0; while true { i = i + 1; if i == 3 { return i; } } } var r = f();");

    assert_eq!(get(&scope, "r"), Value::Int(3));
}

#[test]
fn closure_sees_live_bindings() {
    let scope = run("var x = 1; func get_x() { return x; } x = 2; var r = get_x();");

    assert_eq!(get(&scope, "r"), Value::Int(2));
}

#[test]
fn calls_use_the_definition_scope_not_the_call_site() {
    // f reads x from its closure chain; the x at the call site is a
    // different binding
    let source = "var x = 1; \
        func f() { return x; } \
        func g() { var x = 99; return f(); } \
        var r = g();";
    let scope = run(source);

    assert_eq!(get(&scope, "r"), Value::Int(1));
}

#[test]
fn nested_function_captures_the_call_scope() {
    let scope = run("func outer() { var n = 5; func inner() { return n; } return inner(); } var r = outer();");

    assert_eq!(get(&scope, "r"), Value::Int(5));
}

#[test]
fn arguments_evaluate_in_the_caller_scope() {
    let scope = run("func f(x) { return x; } var x = 10; var r = f(x + 1);");

    assert_eq!(get(&scope, "r"), Value::Int(11));
}

#[test]
fn parameters_are_untyped() {
    let scope = run(r#"func id(v) { v = "swapped"; return v; } var r = id(1);"#);

    assert_eq!(get(&scope, "r"), Value::Str(String::from("swapped")));
}

#[test]
fn arity_mismatch_faults() {
    assert_eq!(run_err("func f(a) { return a; } var r = f(1, 2);"),
        RuntimeError::ArityMismatch { name: String::from("f"), expected: 1, found: 2 });
}

#[test]
fn undefined_function_faults() {
    assert_eq!(run_err("var r = missing();"),
        RuntimeError::UndefinedFunction(String::from("missing")));
}

#[test]
fn builtins_win_over_user_functions() {
    // The definition is accepted but the builtin still answers the call
    let scope = run("func print(x) { return x; } var r = print(5);");

    assert_eq!(get(&scope, "r"), Value::Null);
}

#[test]
fn undefined_variable_halts_execution() {
    let (scope, result) = try_run("var a = 1; a = b; var c = 2;");

    assert_eq!(result, Err(RuntimeError::UndefinedVariable(String::from("b"))));
    assert!(!scope.borrow().has_variable("c"));
}

#[test]
fn top_level_return_stops_remaining_statements() {
    let scope = run("var x = 1; return; x = 2;");

    assert_eq!(get(&scope, "x"), Value::Int(1));
}

#[test]
fn top_level_return_inside_a_block_stops_the_program() {
    let scope = run("var x = 1; if true { return 99; } x = 2;");

    assert_eq!(get(&scope, "x"), Value::Int(1));
}

fn point_class() -> Rc<ClassDecl> {
    Rc::new(ClassDecl {
        name: String::from("Point"),
        fields: vec![
            FieldDecl { name: String::from("x"), initializer: Some(Expr::Literal(Value::Int(1))) },
            FieldDecl { name: String::from("y"), initializer: None },
        ],
    })
}

fn new_point(scope: &ScopeRef, initializers: Vec<(String, Expr)>) -> Value {
    let expr = Expr::ClassExpr { name: String::from("Point"), initializers };
    eval_expr(&expr, scope).unwrap()
}

#[test]
fn instantiation_applies_defaults_and_overrides() {
    let scope = Scope::new_root();
    scope.borrow_mut().declare_class("Point", point_class()).unwrap();

    let point = new_point(&scope, vec![(String::from("y"), Expr::Literal(Value::Int(5)))]);

    let x = Expr::FieldAccess {
        target: Box::new(Expr::Literal(point.clone())),
        field: String::from("x"),
    };
    let y = Expr::FieldAccess {
        target: Box::new(Expr::Literal(point)),
        field: String::from("y"),
    };

    assert_eq!(eval_expr(&x, &scope), Ok(Value::Int(1)));
    assert_eq!(eval_expr(&y, &scope), Ok(Value::Int(5)));
}

#[test]
fn uninitialized_field_starts_null() {
    let scope = Scope::new_root();
    scope.borrow_mut().declare_class("Point", point_class()).unwrap();

    let point = new_point(&scope, Vec::new());
    let y = Expr::FieldAccess { target: Box::new(Expr::Literal(point)), field: String::from("y") };

    assert_eq!(eval_expr(&y, &scope), Ok(Value::Null));
}

#[test]
fn unknown_field_faults() {
    let scope = Scope::new_root();
    scope.borrow_mut().declare_class("Point", point_class()).unwrap();

    let point = new_point(&scope, Vec::new());
    let z = Expr::FieldAccess { target: Box::new(Expr::Literal(point)), field: String::from("z") };

    assert_eq!(eval_expr(&z, &scope), Err(RuntimeError::UndefinedField {
        field: String::from("z"),
        class: String::from("Point"),
    }));
}

#[test]
fn field_assignment_updates_the_instance() {
    let scope = Scope::new_root();
    scope.borrow_mut().declare_class("Point", point_class()).unwrap();

    let point = new_point(&scope, Vec::new());
    let stmt = Stmt::Assignment {
        target: Expr::FieldAccess {
            target: Box::new(Expr::Literal(point.clone())),
            field: String::from("x"),
        },
        value: Expr::Literal(Value::Int(42)),
    };

    assert_eq!(exec_stmt(&stmt, &scope), Ok(ExecOutcome::Continue));

    let x = Expr::FieldAccess { target: Box::new(Expr::Literal(point)), field: String::from("x") };
    assert_eq!(eval_expr(&x, &scope), Ok(Value::Int(42)));
}

#[test]
fn field_access_on_non_instance_faults() {
    let scope = Scope::new_root();
    let expr = Expr::FieldAccess {
        target: Box::new(Expr::Literal(Value::Int(1))),
        field: String::from("x"),
    };

    assert_eq!(eval_expr(&expr, &scope),
        Err(RuntimeError::FieldAccessOnNonInstance { found: "int" }));
}

#[test]
fn undefined_class_faults() {
    let scope = Scope::new_root();
    let expr = Expr::ClassExpr { name: String::from("Ghost"), initializers: Vec::new() };

    assert_eq!(eval_expr(&expr, &scope),
        Err(RuntimeError::UndefinedClass(String::from("Ghost"))));
}

#[test]
fn instances_compare_by_identity() {
    let scope = Scope::new_root();
    scope.borrow_mut().declare_class("Point", point_class()).unwrap();

    let a = new_point(&scope, Vec::new());
    let b = new_point(&scope, Vec::new());

    assert_eq!(a, a.clone());
    assert_ne!(a, b);
}

#[test]
fn assignment_target_must_be_a_place() {
    let stmt = Stmt::Assignment {
        target: Expr::Literal(Value::Int(1)),
        value: Expr::Literal(Value::Int(2)),
    };

    assert_eq!(exec_stmt(&stmt, &Scope::new_root()),
        Err(RuntimeError::InvalidAssignmentTarget));
}

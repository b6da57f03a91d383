use indoc::indoc;

use crate::engine::{Engine, Error};
use crate::error::CompilerError;
use crate::program;
use crate::symbols::ClosureId;
use crate::types::Type;

fn compile(source: &str) -> Engine {
    let mut engine = Engine::new();
    if let Err(Error::CompilationFailed { diagnostics, .. }) = engine.compile(source) {
        panic!(
            "compilation failed:\n{}",
            diagnostics.printer(source).render()
        );
    }
    engine
}

fn compile_err(source: &str) -> Vec<CompilerError> {
    let mut engine = Engine::new();
    match engine.compile(source) {
        Ok(_) => panic!("expected a compilation failure"),
        Err(Error::CompilationFailed { diagnostics, .. }) => diagnostics
            .messages()
            .iter()
            .filter_map(|m| match m.code {
                crate::diagnostics::DiagnosticCode::Compiler(code) => Some(code),
                _ => None,
            })
            .collect(),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

#[test]
fn mixed_capture_lists() {
    // `x` and `y` by value through the default, `z` by reference.
    let engine = compile(indoc! {"
        void f()
        {
            int x = 1;
            int y = 2;
            int z = 3;
            auto fn = [=, &z](){ z = z + x + y; y = y + 1; };
            fn();
        }
    "});

    let closure = engine.type_system().closure(ClosureId(0));
    assert_eq!(closure.captures.len(), 3);

    let z = closure
        .captures
        .iter()
        .find(|c| c.name == "z")
        .expect("z captured");
    assert!(z.by_reference);

    for name in ["x", "y"] {
        let capture = closure
            .captures
            .iter()
            .find(|c| c.name == name)
            .unwrap_or_else(|| panic!("{name} captured"));
        assert!(!capture.by_reference);
        assert_eq!(capture.ty, Type::INT);
    }

    // The call operator body was compiled and rewrites outer names into
    // capture accesses.
    let body = engine
        .function(closure.call_operator)
        .body
        .clone()
        .expect("call operator body");
    let mut capture_accesses = 0;
    for stmt in &body.statements {
        count_capture_accesses(stmt, &mut capture_accesses);
    }
    assert!(capture_accesses > 0);
}

fn count_capture_accesses(stmt: &program::Statement, count: &mut usize) {
    if let program::Statement::Compound(c) = stmt {
        for s in &c.statements {
            count_capture_accesses(s, count);
        }
    }
    if let program::Statement::ExpressionStatement(es) = stmt {
        count_in_expr(&es.expr, count);
    }
}

fn count_in_expr(expr: &program::Expression, count: &mut usize) {
    match expr {
        program::Expression::CaptureAccess(_) => *count += 1,
        program::Expression::FunctionCall(c) => {
            for a in &c.args {
                count_in_expr(a, count);
            }
        }
        program::Expression::Copy(c) => count_in_expr(&c.src, count),
        program::Expression::FundamentalConversion(c) => count_in_expr(&c.src, count),
        _ => {}
    }
}

#[test]
fn explicit_value_captures() {
    let engine = compile(indoc! {"
        void f()
        {
            int a = 1;
            auto fn = [a](){ return; };
            fn();
        }
    "});

    let closure = engine.type_system().closure(ClosureId(0));
    assert_eq!(closure.captures.len(), 1);
    assert_eq!(closure.captures[0].name, "a");
    assert!(!closure.captures[0].by_reference);
}

#[test]
fn lambda_return_type_is_deduced() {
    let engine = compile(indoc! {"
        void f()
        {
            auto fn = [](int n){ return n * 2; };
            int r = fn(4);
        }
    "});

    let closure = engine.type_system().closure(ClosureId(0));
    let call_op = engine.function(closure.call_operator);
    assert_eq!(call_op.prototype.return_type(), Type::INT);
}

#[test]
fn body_with_no_return_deduces_void() {
    let engine = compile("void f() { auto fn = [](){ }; fn(); }");
    let closure = engine.type_system().closure(ClosureId(0));
    assert_eq!(
        engine
            .function(closure.call_operator)
            .prototype
            .return_type(),
        Type::VOID
    );
}

#[test]
fn captureless_lambda_converts_to_a_function_variable() {
    let engine = compile(indoc! {"
        void f()
        {
            int(int) h = [](int n){ return n * 2; };
            int r = h(4);
        }
    "});

    // The closure decays to the interned function type `int(int)`.
    let closure = engine.type_system().closure(ClosureId(0));
    assert!(closure.captures.is_empty());
}

#[test]
fn capturing_lambda_cannot_become_a_function_variable() {
    let errors = compile_err(indoc! {"
        void f()
        {
            int a = 1;
            int(int) h = [a](int n){ return n + a; };
        }
    "});
    assert!(errors.contains(&CompilerError::LambdaMustBeCaptureless));
}

#[test]
fn unknown_capture_names_are_rejected() {
    let errors = compile_err("void f() { auto fn = [nope](){ }; }");
    assert!(errors.contains(&CompilerError::UnknownCaptureName));
}

#[test]
fn conflicting_capture_defaults_are_rejected() {
    let errors = compile_err(indoc! {"
        void f()
        {
            int a = 1;
            auto fn = [=, &](){ a = 2; };
        }
    "});
    assert!(errors.contains(&CompilerError::CannotCaptureByValueAndByRef));
}

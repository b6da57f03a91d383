use indoc::indoc;

use crate::ast::{Decl, Stmt};
use crate::parser::parse;

#[test]
fn empty_program() {
    let ast = parse("").unwrap();
    assert!(ast.statements.is_empty());
}

#[test]
fn null_statement() {
    let ast = parse(";").unwrap();
    assert!(matches!(ast.statements[0], Stmt::Null(_)));
}

#[test]
fn expression_statement() {
    let ast = parse("f(1);").unwrap();
    assert!(matches!(ast.statements[0], Stmt::Expr(_)));
}

#[test]
fn if_else() {
    let src = indoc! {"
        if(a) { f(); } else { g(); }
    "};
    let ast = parse(src).unwrap();
    let Stmt::If(if_stmt) = &ast.statements[0] else {
        panic!("expected if");
    };
    assert!(matches!(if_stmt.body, Stmt::Compound(_)));
    assert!(if_stmt.else_clause.is_some());
}

#[test]
fn dangling_else_attaches_to_inner_if() {
    let src = "if(a) if(b) f(); else g();";
    let ast = parse(src).unwrap();
    let Stmt::If(outer) = &ast.statements[0] else {
        panic!("expected if");
    };
    assert!(outer.else_clause.is_none());
    let Stmt::If(inner) = &outer.body else {
        panic!("expected nested if");
    };
    assert!(inner.else_clause.is_some());
}

#[test]
fn while_loop() {
    let ast = parse("while(i < 10) { i = i + 1; }").unwrap();
    let Stmt::While(while_loop) = &ast.statements[0] else {
        panic!("expected while");
    };
    assert!(matches!(while_loop.body, Stmt::Compound(_)));
}

#[test]
fn for_loop_with_decl_init() {
    let ast = parse("for(int i = 0; i < 10; ++i) { f(i); }").unwrap();
    let Stmt::For(for_loop) = &ast.statements[0] else {
        panic!("expected for");
    };
    assert!(matches!(
        for_loop.init_statement,
        Some(Stmt::Decl(Decl::Variable(_)))
    ));
    assert!(for_loop.condition.is_some());
    assert!(for_loop.loop_increment.is_some());
}

#[test]
fn for_loop_with_empty_init() {
    let ast = parse("for(; i < 10; ++i) f(i);").unwrap();
    let Stmt::For(for_loop) = &ast.statements[0] else {
        panic!("expected for");
    };
    assert!(for_loop.init_statement.is_none());
}

#[test]
fn for_loop_with_expression_init() {
    let ast = parse("for(i = 0; i < 3; ++i) { }").unwrap();
    let Stmt::For(for_loop) = &ast.statements[0] else {
        panic!("expected for");
    };
    assert!(matches!(for_loop.init_statement, Some(Stmt::Expr(_))));
}

#[test]
fn break_and_continue() {
    let src = indoc! {"
        while(true) { break; }
        while(true) { continue; }
    "};
    let ast = parse(src).unwrap();
    let Stmt::While(first) = &ast.statements[0] else {
        panic!("expected while");
    };
    let Stmt::Compound(body) = &first.body else {
        panic!("expected compound");
    };
    assert!(matches!(body.statements[0], Stmt::Break(_)));
}

#[test]
fn return_with_and_without_value() {
    let src = indoc! {"
        int f() { return 5; }
        void g() { return; }
    "};
    let ast = parse(src).unwrap();
    assert_eq!(ast.statements.len(), 2);
}

#[test]
fn nested_compound_statements() {
    let ast = parse("{ { f(); } g(); }").unwrap();
    let Stmt::Compound(outer) = &ast.statements[0] else {
        panic!("expected compound");
    };
    assert_eq!(outer.statements.len(), 2);
    assert!(matches!(outer.statements[0], Stmt::Compound(_)));
}

#[test]
fn namespace_with_members() {
    let src = indoc! {"
        namespace math
        {
            int abs(int n) { return n < 0 ? -n : n; }
            const double pi = 3.14;
        }
    "};
    let ast = parse(src).unwrap();
    let Stmt::Decl(Decl::Namespace(ns)) = &ast.statements[0] else {
        panic!("expected namespace");
    };
    assert_eq!(ns.statements.len(), 2);
}

#[test]
fn friend_at_top_level_is_rejected() {
    assert!(parse("friend class A;").is_err());
}

#[test]
fn several_statements_share_one_line() {
    let ast = parse("int a = 0; a = a + 1; f(a);").unwrap();
    assert_eq!(ast.statements.len(), 3);
}

#[test]
fn source_spans_point_into_the_source() {
    let src = "int foo = 42;";
    let ast = parse(src).unwrap();
    let Stmt::Decl(Decl::Variable(var)) = &ast.statements[0] else {
        panic!("expected variable");
    };
    assert_eq!(ast.text(&var.name), "foo");
}

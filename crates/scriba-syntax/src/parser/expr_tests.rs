use crate::ast::{Expr, Literal};
use crate::operators::OperatorId;
use crate::parser::parse_expression;
use crate::token::TokenKind;

fn operation(expr: &Expr) -> &crate::ast::Operation {
    match expr {
        Expr::Operation(op) => op,
        other => panic!("expected operation, got {other:?}"),
    }
}

#[test]
fn literals() {
    assert!(matches!(
        parse_expression("true").unwrap(),
        Expr::Literal(Literal::Bool(_))
    ));
    assert!(matches!(
        parse_expression("42").unwrap(),
        Expr::Literal(Literal::Integer(_))
    ));
    assert!(matches!(
        parse_expression("3.14").unwrap(),
        Expr::Literal(Literal::FloatingPoint(_))
    ));
    assert!(matches!(
        parse_expression("\"hi\"").unwrap(),
        Expr::Literal(Literal::Str(_))
    ));
    assert!(matches!(
        parse_expression("3.0km").unwrap(),
        Expr::Literal(Literal::UserDefined(_))
    ));
}

#[test]
fn precedence_mul_over_add() {
    // a + b * c => a + (b * c)
    let expr = parse_expression("a + b * c").unwrap();
    let add = operation(&expr);
    assert_eq!(add.op.kind, TokenKind::Plus);

    let rhs = operation(add.arg2.as_ref().unwrap());
    assert_eq!(rhs.op.kind, TokenKind::Mul);
}

#[test]
fn left_associativity() {
    // a - b - c => (a - b) - c
    let expr = parse_expression("a - b - c").unwrap();
    let outer = operation(&expr);
    assert_eq!(outer.op.kind, TokenKind::Minus);

    let lhs = operation(&outer.arg1);
    assert_eq!(lhs.op.kind, TokenKind::Minus);
    assert!(outer.arg2.as_ref().unwrap().is_identifier());
}

#[test]
fn assignment_is_right_associative() {
    // a = b = c => a = (b = c)
    let expr = parse_expression("a = b = c").unwrap();
    let outer = operation(&expr);
    assert_eq!(outer.op.kind, TokenKind::Eq);
    assert!(outer.arg1.is_identifier());

    let rhs = operation(outer.arg2.as_ref().unwrap());
    assert_eq!(rhs.op.kind, TokenKind::Eq);
}

#[test]
fn parenthesized_grouping() {
    // (a + b) * c
    let expr = parse_expression("(a + b) * c").unwrap();
    let mul = operation(&expr);
    assert_eq!(mul.op.kind, TokenKind::Mul);
    let lhs = operation(&mul.arg1);
    assert_eq!(lhs.op.kind, TokenKind::Plus);
}

#[test]
fn prefix_and_postfix_operators() {
    let expr = parse_expression("-a").unwrap();
    let neg = operation(&expr);
    assert!(neg.arg2.is_none());
    assert!(!neg.postfix);
    assert_eq!(neg.operator_id(), Some(OperatorId::UnaryMinus));

    let expr = parse_expression("a++").unwrap();
    let inc = operation(&expr);
    assert!(inc.arg2.is_none());
    assert!(inc.postfix);
    assert_eq!(inc.operator_id(), Some(OperatorId::PostIncrement));
}

#[test]
fn conditional_expression() {
    let expr = parse_expression("a ? b : c").unwrap();
    let Expr::Conditional(cond) = expr else {
        panic!("expected conditional");
    };
    assert!(cond.condition.is_identifier());
    assert!(cond.on_true.is_identifier());
    assert!(cond.on_false.is_identifier());
}

#[test]
fn conditional_binds_looser_than_comparison() {
    let expr = parse_expression("a < b ? x : y").unwrap();
    let Expr::Conditional(cond) = expr else {
        panic!("expected conditional");
    };
    let cmp = operation(&cond.condition);
    assert_eq!(cmp.op.kind, TokenKind::LeftAngle);
}

#[test]
fn function_call() {
    let expr = parse_expression("f(1, 2, 3)").unwrap();
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    assert!(call.callee.is_identifier());
    assert_eq!(call.args.len(), 3);
}

#[test]
fn empty_call_and_chained_calls() {
    let expr = parse_expression("f()").unwrap();
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    assert!(call.args.is_empty());

    let expr = parse_expression("f(1)(2)").unwrap();
    let Expr::Call(outer) = expr else {
        panic!("expected call");
    };
    assert!(matches!(outer.callee, Expr::Call(_)));
}

#[test]
fn member_access_and_method_call() {
    let expr = parse_expression("obj.field").unwrap();
    let access = operation(&expr);
    assert!(access.is_member_access());

    let expr = parse_expression("obj.method(1)").unwrap();
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    assert!(operation(&call.callee).is_member_access());
}

#[test]
fn subscript() {
    let expr = parse_expression("v[0]").unwrap();
    let Expr::Subscript(sub) = expr else {
        panic!("expected subscript");
    };
    assert!(sub.array.is_identifier());

    assert!(parse_expression("v[]").is_err());
}

#[test]
fn array_literal() {
    let expr = parse_expression("[1, 2, 3]").unwrap();
    let Expr::Array(array) = expr else {
        panic!("expected array");
    };
    assert_eq!(array.elements.len(), 3);
}

#[test]
fn brace_construction() {
    let expr = parse_expression("Point{1, 2}").unwrap();
    let Expr::Brace(brace) = expr else {
        panic!("expected brace construction");
    };
    assert_eq!(brace.args.len(), 2);
}

#[test]
fn lambda_with_captures_and_params() {
    let expr = parse_expression("[x, &y](int a){ return a; }").unwrap();
    let Expr::Lambda(lambda) = expr else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.captures.len(), 2);
    assert!(lambda.captures[0].reference.is_none());
    assert!(lambda.captures[1].reference.is_some());
    assert_eq!(lambda.params.len(), 1);
    assert_eq!(lambda.body.statements.len(), 1);
}

#[test]
fn capture_defaults() {
    let expr = parse_expression("[=](){ }").unwrap();
    let Expr::Lambda(lambda) = expr else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.captures.len(), 1);
    assert!(lambda.captures[0].is_default());
    assert!(lambda.captures[0].by_value_sign.is_some());

    let expr = parse_expression("[&, z](){ }").unwrap();
    let Expr::Lambda(lambda) = expr else {
        panic!("expected lambda");
    };
    assert_eq!(lambda.captures.len(), 2);
    assert!(lambda.captures[0].is_default());
    assert!(lambda.captures[0].reference.is_some());
}

#[test]
fn template_id_followed_by_call_is_kept() {
    let expr = parse_expression("max<int>(1, 2)").unwrap();
    let Expr::Call(call) = expr else {
        panic!("expected call");
    };
    let Some(id) = call.callee.as_identifier() else {
        panic!("expected identifier callee");
    };
    assert!(id.is_template());
}

#[test]
fn comparison_chain_is_not_a_template() {
    // a < b, no closing angle: a plain comparison.
    let expr = parse_expression("a < b").unwrap();
    let cmp = operation(&expr);
    assert_eq!(cmp.op.kind, TokenKind::LeftAngle);
}

#[test]
fn empty_parens_are_rejected() {
    assert!(parse_expression("()").is_err());
}

#[test]
fn missing_conditional_colon_is_rejected() {
    assert!(parse_expression("a ? b").is_err());
}

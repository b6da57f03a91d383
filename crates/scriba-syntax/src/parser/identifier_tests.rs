use crate::ast::{Identifier, TemplateArg};
use crate::parser::parse_identifier;

#[test]
fn simple_identifier() {
    let id = parse_identifier("foo").unwrap();
    assert!(id.is_simple());
}

#[test]
fn fundamental_type_names_are_identifiers() {
    for src in ["int", "bool", "double", "auto", "void"] {
        let id = parse_identifier(src).unwrap();
        assert!(id.is_simple(), "{src} should parse as a simple identifier");
    }
}

#[test]
fn template_identifier() {
    let id = parse_identifier("pair<int, float>").unwrap();
    let Identifier::Template(tid) = id else {
        panic!("expected template identifier");
    };
    assert_eq!(tid.args.len(), 2);
    assert!(matches!(tid.args[0], TemplateArg::Type(_)));
    assert!(matches!(tid.args[1], TemplateArg::Type(_)));
}

#[test]
fn template_identifier_with_expression_argument() {
    let id = parse_identifier("buffer<16>").unwrap();
    let Identifier::Template(tid) = id else {
        panic!("expected template identifier");
    };
    assert_eq!(tid.args.len(), 1);
    assert!(matches!(tid.args[0], TemplateArg::Expr(_)));
}

#[test]
fn nested_template_identifier_splits_right_right_angle() {
    let id = parse_identifier("list<list<int>>").unwrap();
    let Identifier::Template(outer) = id else {
        panic!("expected template identifier");
    };
    assert_eq!(outer.args.len(), 1);

    let TemplateArg::Type(inner) = &outer.args[0] else {
        panic!("expected type argument");
    };
    let Some(Identifier::Template(inner)) = &inner.name else {
        panic!("expected nested template identifier");
    };
    assert_eq!(inner.args.len(), 1);
}

#[test]
fn qualified_identifier() {
    let id = parse_identifier("a::b::c").unwrap();
    let Identifier::Scoped(scoped) = id else {
        panic!("expected scoped identifier");
    };
    // a::b::c folds to (a::b)::c
    assert!(scoped.lhs.is_scoped());
    assert!(scoped.rhs.is_simple());
}

#[test]
fn qualified_template_identifier() {
    let id = parse_identifier("std::vector<int>").unwrap();
    let Identifier::Scoped(scoped) = id else {
        panic!("expected scoped identifier");
    };
    assert!(scoped.lhs.is_simple());
    assert!(scoped.rhs.is_template());
}

#[test]
fn operator_names() {
    let id = parse_identifier("operator+").unwrap();
    assert!(matches!(id, Identifier::Operator(_)));

    let id = parse_identifier("operator()").unwrap();
    let Identifier::Operator(op) = id else {
        panic!("expected operator name");
    };
    assert_eq!(op.symbol.kind, crate::token::TokenKind::LeftRightPar);

    let id = parse_identifier("operator[]").unwrap();
    let Identifier::Operator(op) = id else {
        panic!("expected operator name");
    };
    assert_eq!(op.symbol.kind, crate::token::TokenKind::LeftRightBracket);
}

#[test]
fn literal_operator_name() {
    let id = parse_identifier("operator\"\" km").unwrap();
    let Identifier::LiteralOperator(lon) = id else {
        panic!("expected literal operator name");
    };
    assert_eq!(lon.suffix.kind, crate::token::TokenKind::UserDefinedName);
}

#[test]
fn literal_operator_name_with_fused_literal() {
    // `""km` lexes as one user-defined literal token.
    let id = parse_identifier("operator\"\"km").unwrap();
    assert!(matches!(id, Identifier::LiteralOperator(_)));
}

#[test]
fn garbage_is_rejected() {
    assert!(parse_identifier("123").is_err());
    assert!(parse_identifier("operator").is_err());
}

#[test]
fn generated_identifier_chains_round_trip_their_spans() {
    // A deterministic sweep over nested template/scope shapes: every
    // generated chain must parse, and the root node's span must cover the
    // whole input (whitespace-free by construction).
    let names = ["a", "bb", "ccc"];
    let args = ["int", "x", "box<int>"];

    let mut sources = Vec::new();
    for name in names {
        sources.push(name.to_string());
        for arg in args {
            sources.push(format!("{name}<{arg}>"));
            for inner in args {
                sources.push(format!("{name}<{arg},{inner}>"));
                sources.push(format!("{name}<{arg}>::{name}<{inner}>"));
            }
        }
        for rhs in names {
            sources.push(format!("{name}::{rhs}"));
            sources.push(format!("{name}::{rhs}::{name}"));
        }
    }

    for source in sources {
        let id = parse_identifier(&source)
            .unwrap_or_else(|e| panic!("{source} should parse: {e:?}"));
        let span = id.span();
        assert_eq!(u32::from(span.start()), 0, "{source}");
        assert_eq!(u32::from(span.end()) as usize, source.len(), "{source}");
    }
}

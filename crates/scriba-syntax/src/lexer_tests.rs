use crate::lexer::{LexicalError, lex, split_user_defined_literal, unescape};
use crate::token::TokenKind;

fn kinds(src: &str) -> Vec<TokenKind> {
    lex(src).expect("lexes").into_iter().map(|t| t.kind).collect()
}

#[test]
fn punctuators_and_operators() {
    let tokens = kinds("( ) [ ] { } ; : :: , . ?");
    insta::assert_yaml_snapshot!(tokens, @r"
    - LeftPar
    - RightPar
    - LeftBracket
    - RightBracket
    - LeftBrace
    - RightBrace
    - Semicolon
    - Colon
    - ScopeResolution
    - Comma
    - Dot
    - QuestionMark
    ");
}

#[test]
fn compound_operators_prefer_longest_match() {
    let tokens = kinds("<< >> <<= >>= <= >= == != && || ++ --");
    insta::assert_yaml_snapshot!(tokens, @r"
    - LeftShift
    - RightRightAngle
    - LeftShiftEq
    - RightShiftEq
    - Leq
    - Geq
    - EqEq
    - Neq
    - LogicalAnd
    - LogicalOr
    - PlusPlus
    - MinusMinus
    ");
}

#[test]
fn keywords_and_identifiers() {
    let tokens = kinds("class classes int integer for forty");
    insta::assert_yaml_snapshot!(tokens, @r"
    - Class
    - UserDefinedName
    - Int
    - UserDefinedName
    - For
    - UserDefinedName
    ");
}

#[test]
fn numeric_literals_detect_radix() {
    let tokens = kinds("0 123 0x1f 0b101 017 3.14 3.14f 1e10 2.5e-3 12f");
    insta::assert_yaml_snapshot!(tokens, @r"
    - OctalLiteral
    - IntegerLiteral
    - HexadecimalLiteral
    - BinaryLiteral
    - OctalLiteral
    - DecimalLiteral
    - DecimalLiteral
    - DecimalLiteral
    - DecimalLiteral
    - DecimalLiteral
    ");
}

#[test]
fn string_and_char_literals() {
    let tokens = kinds(r#""hello" 'a' "with \"escape\"""#);
    assert_eq!(
        tokens,
        vec![
            TokenKind::StringLiteral,
            TokenKind::StringLiteral,
            TokenKind::StringLiteral
        ]
    );
}

#[test]
fn user_defined_literals() {
    let tokens = kinds(r#"125km 3.14deg ""suffix "text"unit"#);
    assert_eq!(tokens, vec![TokenKind::UserDefinedLiteral; 4]);
}

#[test]
fn comments_and_whitespace_are_dropped() {
    let tokens = kinds("a // line\n /* block\n comment */ b");
    assert_eq!(
        tokens,
        vec![TokenKind::UserDefinedName, TokenKind::UserDefinedName]
    );
}

#[test]
fn token_text_round_trips() {
    let src = "foo + 0x1f";
    let tokens = lex(src).expect("lexes");
    let texts: Vec<&str> = tokens
        .iter()
        .map(|t| crate::token::token_text(src, t))
        .collect();
    assert_eq!(texts, vec!["foo", "+", "0x1f"]);
}

#[test]
fn unterminated_string_is_an_error() {
    let err = lex("a = \"oops").expect_err("should fail");
    assert!(matches!(err, LexicalError::UnterminatedStringLiteral(_)));
    assert_eq!(u32::from(err.offset()), 4);
}

#[test]
fn unexpected_character_is_an_error() {
    let err = lex("a = $;").expect_err("should fail");
    assert!(matches!(err, LexicalError::UnexpectedCharacter(_)));
}

#[test]
fn unterminated_comment_is_an_error() {
    let err = lex("a /* never closed").expect_err("should fail");
    assert!(matches!(err, LexicalError::UnterminatedComment(_)));
}

#[test]
fn escape_sequences() {
    assert_eq!(unescape(r"a\nb\tc"), "a\nb\tc");
    assert_eq!(unescape(r#"say \"hi\""#), "say \"hi\"");
    assert_eq!(unescape(r"back\\slash"), "back\\slash");
    assert_eq!(unescape(r"nul\0"), "nul\0");
}

#[test]
fn user_defined_literal_splitting() {
    assert_eq!(split_user_defined_literal("125km"), ("125", "km"));
    assert_eq!(split_user_defined_literal("3.14deg"), ("3.14", "deg"));
    assert_eq!(split_user_defined_literal("2e5w"), ("2e5", "w"));
    assert_eq!(split_user_defined_literal("\"\"suffix"), ("\"\"", "suffix"));
    assert_eq!(split_user_defined_literal("\"txt\"unit"), ("\"txt\"", "unit"));
}

#[test]
fn category_predicates() {
    assert!(TokenKind::Class.is_keyword());
    assert!(TokenKind::IntegerLiteral.is_literal());
    assert!(TokenKind::True.is_literal());
    assert!(TokenKind::Int.is_identifier());
    assert!(TokenKind::UserDefinedName.is_identifier());
    assert!(TokenKind::Plus.is_operator());
    assert!(!TokenKind::LeftPar.is_operator());
    assert!(TokenKind::Comma.is_operator());
}

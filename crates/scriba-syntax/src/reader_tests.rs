use crate::errors::ParserError;
use crate::fragment::{Fragment, FragmentKind};
use crate::lexer::lex;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

fn tokens_of(src: &str) -> Vec<Token> {
    lex(src).expect("lexes")
}

fn fragment_text(src: &str, tokens: &[Token], fragment: Fragment) -> String {
    tokens[fragment.begin..fragment.end]
        .iter()
        .map(|t| crate::token::token_text(src, t))
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn read_and_peek() {
    let src = "a + b";
    let tokens = tokens_of(src);
    let mut reader = TokenReader::new(src, &tokens);

    assert_eq!(reader.peek().unwrap().kind, TokenKind::UserDefinedName);
    assert_eq!(reader.read().unwrap().kind, TokenKind::UserDefinedName);
    assert_eq!(reader.read_kind(TokenKind::Plus).unwrap().kind, TokenKind::Plus);
    assert!(!reader.at_end());
    reader.read().unwrap();
    assert!(reader.at_end());

    let err = reader.read().unwrap_err();
    assert_eq!(err.error, ParserError::UnexpectedEndOfInput);
}

#[test]
fn read_kind_mismatch_reports_both_tokens() {
    let src = "a b";
    let tokens = tokens_of(src);
    let mut reader = TokenReader::new(src, &tokens);
    reader.read().unwrap();

    let err = reader.read_kind(TokenKind::Semicolon).unwrap_err();
    assert_eq!(err.error, ParserError::UnexpectedToken);
    assert_eq!(err.expected, Some(TokenKind::Semicolon));
    assert_eq!(err.found.map(|t| t.kind), Some(TokenKind::UserDefinedName));
}

#[test]
fn delimiter_pair_carves_balanced_content() {
    let src = "f(a, (b), c) rest";
    let tokens = tokens_of(src);
    let mut reader = TokenReader::new(src, &tokens);
    reader.read().unwrap(); // f

    let sub = reader.subfragment_of(FragmentKind::DelimiterPair).unwrap();
    assert_eq!(fragment_text(src, &tokens, sub.fragment()), "a , ( b ) , c");
}

#[test]
fn unbalanced_delimiter_pair_is_an_error() {
    let src = "(a, b";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);

    let err = reader.subfragment_of(FragmentKind::DelimiterPair).unwrap_err();
    assert_eq!(err.error, ParserError::UnexpectedFragmentEnd);
}

#[test]
fn statement_fragment_stops_at_top_level_semicolon() {
    let src = "int x = f(1; 2); y;";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);

    // The ';' inside the parens is not at the top level.
    let sub = reader.subfragment_of(FragmentKind::Statement).unwrap();
    assert_eq!(
        fragment_text(src, &tokens, sub.fragment()),
        "int x = f ( 1 ; 2 )"
    );
}

#[test]
fn list_element_stops_at_comma_or_end() {
    let src = "g(1, 2), h";
    let tokens = tokens_of(src);
    let mut reader = TokenReader::new(src, &tokens);

    let first = reader.next(FragmentKind::ListElement).unwrap();
    assert_eq!(fragment_text(src, &tokens, first.fragment()), "g ( 1 , 2 )");
    reader.read_kind(TokenKind::Comma).unwrap();

    let second = reader.next(FragmentKind::ListElement).unwrap();
    assert_eq!(fragment_text(src, &tokens, second.fragment()), "h");
    assert!(reader.at_end());
}

#[test]
fn template_fragment_simple() {
    let src = "<int, float> x";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);

    let sub = reader.try_template().expect("carves");
    assert_eq!(fragment_text(src, &tokens, sub.fragment()), "int , float");
}

#[test]
fn template_fragment_splits_double_right_angle() {
    // A<B<C>> - the `>>` closes both templates.
    let src = "<B<C>> x";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);

    let outer = reader.try_template().expect("carves outer");
    assert_eq!(fragment_text(src, &tokens, outer.fragment()), "B < C");

    // The inner fragment still sees the remaining `>` of the `>>`.
    let mut inner_reader = outer;
    inner_reader.read().unwrap(); // B
    let inner = inner_reader.try_template().expect("carves inner");
    assert_eq!(fragment_text(src, &tokens, inner.fragment()), "C");
}

#[test]
fn template_fragment_ignores_angles_inside_parens() {
    // A<(B > C)> - the '>' inside parens is a comparison.
    let src = "<(B > C)> x";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);

    let sub = reader.try_template().expect("carves");
    assert_eq!(fragment_text(src, &tokens, sub.fragment()), "( B > C )");
}

#[test]
fn template_fragment_rejects_non_template() {
    let src = "a + b";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);
    assert!(reader.try_template().is_none());

    // `<` with no closer.
    let src = "<a + b";
    let tokens = tokens_of(src);
    let reader = TokenReader::new(src, &tokens);
    assert!(reader.try_template().is_none());
}

#[test]
fn next_advances_past_the_carved_fragment() {
    let src = "(a) b";
    let tokens = tokens_of(src);
    let mut reader = TokenReader::new(src, &tokens);

    let sub = reader.next(FragmentKind::DelimiterPair).unwrap();
    assert_eq!(fragment_text(src, &tokens, sub.fragment()), "a");

    // The cursor sits on the closing delimiter.
    assert_eq!(reader.read().unwrap().kind, TokenKind::RightPar);
    assert_eq!(reader.read().unwrap().kind, TokenKind::UserDefinedName);
}

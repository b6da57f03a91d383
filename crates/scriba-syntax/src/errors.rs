//! Parser error codes and the syntax-error type they travel in.

use rowan::TextSize;

use crate::token::{Token, TokenKind};

/// Stable identifiers for everything that can go wrong while parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ParserError {
    #[error("unexpected end of input")]
    UnexpectedEndOfInput,
    #[error("unexpected end of fragment")]
    UnexpectedFragmentEnd,
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("expected an empty string literal")]
    ExpectedEmptyStringLiteral,
    #[error("invalid empty brackets")]
    InvalidEmptyBrackets,
    #[error("illegal use of keyword")]
    IllegalUseOfKeyword,
    #[error("expected an identifier")]
    ExpectedIdentifier,
    #[error("expected a user-defined name")]
    ExpectedUserDefinedName,
    #[error("expected a literal")]
    ExpectedLiteral,
    #[error("expected an operator")]
    ExpectedOperator,
    #[error("expected a binary operator")]
    ExpectedBinaryOperator,
    #[error("expected a prefix operator")]
    ExpectedPrefixOperator,
    #[error("expected an operator symbol")]
    ExpectedOperatorSymbol,
    #[error("invalid empty operand")]
    InvalidEmptyOperand,
    #[error("expected a declaration")]
    ExpectedDeclaration,
    #[error("missing ':' in conditional expression")]
    MissingConditionalColon,
    #[error("could not parse lambda capture")]
    CouldNotParseLambdaCapture,
    #[error("expected the name of the current class")]
    ExpectedCurrentClassName,
    #[error("could not read type")]
    CouldNotReadType,
}

/// A syntax error, carrying its code, the source offset at which it was
/// raised, and - when available - the offending and expected tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{error} at offset {}", u32::from(*.offset))]
pub struct SyntaxError {
    pub error: ParserError,
    pub offset: TextSize,
    pub found: Option<Token>,
    pub expected: Option<TokenKind>,
}

impl SyntaxError {
    pub fn new(error: ParserError, offset: TextSize) -> Self {
        Self {
            error,
            offset,
            found: None,
            expected: None,
        }
    }

    pub fn with_found(mut self, token: Token) -> Self {
        self.offset = token.span.start();
        self.found = Some(token);
        self
    }

    pub fn with_expected(mut self, kind: TokenKind) -> Self {
        self.expected = Some(kind);
        self
    }
}

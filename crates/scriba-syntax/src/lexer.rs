//! Lexer for the scriba language.
//!
//! Tokenization is total except for genuinely unreadable input: unterminated
//! string literals or comments, and bytes no token can start with.

use logos::Logos;
use rowan::{TextRange, TextSize};
use std::ops::Range;

use crate::token::{Token, TokenKind};

/// Error raised when the source cannot be tokenized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LexicalError {
    #[error("unterminated string literal at offset {}", u32::from(*.0))]
    UnterminatedStringLiteral(TextSize),
    #[error("unterminated comment at offset {}", u32::from(*.0))]
    UnterminatedComment(TextSize),
    #[error("unexpected character at offset {}", u32::from(*.0))]
    UnexpectedCharacter(TextSize),
}

impl LexicalError {
    pub fn offset(&self) -> TextSize {
        match *self {
            LexicalError::UnterminatedStringLiteral(o)
            | LexicalError::UnterminatedComment(o)
            | LexicalError::UnexpectedCharacter(o) => o,
        }
    }
}

fn range_to_text_range(range: Range<usize>) -> TextRange {
    TextRange::new((range.start as u32).into(), (range.end as u32).into())
}

/// Tokenizes source into a vector of span-based tokens.
///
/// Whitespace and comments are dropped by the lexer itself; the first
/// unlexable byte aborts tokenization with a [`LexicalError`].
pub fn lex(source: &str) -> Result<Vec<Token>, LexicalError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut lexer = TokenKind::lexer(source);

    while let Some(item) = lexer.next() {
        match item {
            Ok(kind) => {
                let token = Token::new(kind, range_to_text_range(lexer.span()));

                // An unterminated block comment degrades into adjacent `/`
                // and `*` tokens; nothing else in the language can produce
                // that pair back to back.
                if kind == TokenKind::Mul
                    && let Some(prev) = tokens.last()
                    && prev.kind == TokenKind::Div
                    && prev.span.end() == token.span.start()
                {
                    return Err(LexicalError::UnterminatedComment(prev.span.start()));
                }

                tokens.push(token);
            }
            Err(()) => return Err(classify_error(source, lexer.span().start)),
        }
    }

    Ok(tokens)
}

/// Distinguishes the few hard failure modes by looking at the offending byte.
fn classify_error(source: &str, start: usize) -> LexicalError {
    let offset = TextSize::from(start as u32);
    let rest = &source[start..];

    if rest.starts_with('"') || rest.starts_with('\'') {
        LexicalError::UnterminatedStringLiteral(offset)
    } else if rest.starts_with("/*") {
        LexicalError::UnterminatedComment(offset)
    } else {
        LexicalError::UnexpectedCharacter(offset)
    }
}

/// Interprets the escape sequences of a string-literal body.
///
/// `text` is the content between the quotes. Unknown escapes keep the
/// escaped character as-is.
pub fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}

/// Splits a user-defined literal into its literal part and suffix.
///
/// For `3.14km` this returns (`3.14`, `km`); for `""deg` it returns
/// (`""`, `deg`). The token is guaranteed by the lexer to have this shape.
pub fn split_user_defined_literal(text: &str) -> (&str, &str) {
    if let Some(pos) = text.rfind('"') {
        return text.split_at(pos + 1);
    }

    // Numeric literal: the suffix starts at the first character that can
    // start an identifier, except an exponent's `e`/`E` followed by digits.
    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_digit() || b == b'.' {
            i += 1;
        } else if (b == b'e' || b == b'E')
            && i + 1 < bytes.len()
            && (bytes[i + 1].is_ascii_digit() || bytes[i + 1] == b'+' || bytes[i + 1] == b'-')
        {
            i += 2;
        } else {
            break;
        }
    }
    text.split_at(i)
}

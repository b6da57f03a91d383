//! Syntax front-end for the scriba language: lexer, token fragments and a
//! family of cooperating recursive-descent parsers producing a typed AST.
//!
//! - `lexer` / `token` - byte stream to span-based tokens
//! - `fragment` / `reader` - structured slicing of the token list
//! - `ast` - the typed tree
//! - `parser` - the parser family (`parse`, `parse_expression`, ...)

pub mod ast;
pub mod errors;
pub mod fragment;
pub mod lexer;
pub mod operators;
pub mod parser;
pub mod reader;
pub mod token;

pub use errors::{ParserError, SyntaxError};
pub use lexer::{LexicalError, lex};
pub use parser::{parse, parse_expression, parse_identifier};
pub use reader::TokenReader;
pub use token::{Token, TokenKind, token_text};

/// Errors that can occur while turning source text into an AST.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Lexical(#[from] LexicalError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod lexer_tests;
#[cfg(test)]
mod reader_tests;

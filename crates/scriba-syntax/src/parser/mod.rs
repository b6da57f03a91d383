//! The parser family.
//!
//! Each construct is handled by a dedicated sub-parser operating on a
//! [`TokenReader`] over its fragment of the token list. A sub-parser consumes
//! a prefix of its fragment; the caller re-synchronizes with
//! `reader.seek(sub.pos())` afterwards.

mod attribute;
mod class;
mod decl;
mod expr;
mod identifier;
mod lambda;
mod namespace;
mod program;
mod template;
mod types;

#[cfg(test)]
mod decl_tests;
#[cfg(test)]
mod expr_tests;
#[cfg(test)]
mod identifier_tests;
#[cfg(test)]
mod program_tests;

pub use attribute::AttributeParser;
pub use class::{ClassParser, EnumParser};
pub use decl::{Decision, DeclParser};
pub use expr::{ExpressionListParser, ExpressionParser};
pub use identifier::{IdentifierOptions, IdentifierParser};
pub use lambda::LambdaParser;
pub use namespace::{ImportParser, NamespaceParser, TypedefParser, UsingParser};
pub use program::ProgramParser;
pub use template::{TemplateArgParser, TemplateParser};
pub use types::{FunctionParamParser, TypeParser};

use crate::Error;
use crate::ast::{Ast, Expr, Identifier};
use crate::errors::{ParserError, SyntaxError};
use crate::lexer::lex;
use crate::reader::TokenReader;
use crate::token::Token;

/// Owns the source text and its token list for the duration of a parse.
#[derive(Debug, Clone)]
pub struct ParserContext {
    source: String,
    tokens: Vec<Token>,
}

impl ParserContext {
    pub fn new(source: impl Into<String>) -> Result<Self, Error> {
        let source = source.into();
        let tokens = lex(&source)?;
        Ok(Self { source, tokens })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// A reader over the full token list.
    pub fn reader(&self) -> TokenReader<'_> {
        TokenReader::new(&self.source, &self.tokens)
    }
}

/// Parses a whole script.
pub fn parse(source: &str) -> Result<Ast, Error> {
    let context = ParserContext::new(source)?;

    let mut statements = Vec::new();
    {
        let mut parser = ProgramParser::new(context.reader());
        while !parser.at_end() {
            statements.push(parser.parse_statement()?);
        }
    }

    Ok(Ast {
        source: context.source,
        tokens: context.tokens,
        statements,
    })
}

/// Parses a single expression covering the whole input.
pub fn parse_expression(source: &str) -> Result<Expr, Error> {
    let context = ParserContext::new(source)?;
    let mut parser = ExpressionParser::new(context.reader());
    Ok(parser.parse()?)
}

/// Parses a single identifier covering the whole input.
pub fn parse_identifier(source: &str) -> Result<Identifier, Error> {
    let context = ParserContext::new(source)?;
    let mut parser = IdentifierParser::new(context.reader());
    let result = parser.parse()?;

    if !parser.at_end() {
        return Err(SyntaxError::new(ParserError::ExpectedIdentifier, parser.offset()).into());
    }

    Ok(result)
}

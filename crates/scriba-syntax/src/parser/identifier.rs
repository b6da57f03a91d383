//! Identifier parsing: simple, qualified, template, operator names and
//! literal-operator names.

use rowan::TextRange;

use crate::ast::{
    Identifier, LiteralOperatorName, OperatorName, ScopedIdentifier, SimpleIdentifier,
    TemplateArg, TemplateIdentifier,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

use super::template::TemplateArgParser;

/// Which identifier shapes an [`IdentifierParser`] may produce.
///
/// Simple identifiers are always allowed.
#[derive(Debug, Clone, Copy)]
pub struct IdentifierOptions {
    pub template_id: bool,
    pub qualified_id: bool,
    pub operator_name: bool,
}

impl IdentifierOptions {
    pub fn all() -> Self {
        Self {
            template_id: true,
            qualified_id: true,
            operator_name: true,
        }
    }

    pub fn simple_only() -> Self {
        Self {
            template_id: false,
            qualified_id: false,
            operator_name: false,
        }
    }

    pub fn with_template_id(mut self) -> Self {
        self.template_id = true;
        self
    }

    pub fn with_qualified_id(mut self) -> Self {
        self.qualified_id = true;
        self
    }

    pub fn with_operator_name(mut self) -> Self {
        self.operator_name = true;
        self
    }
}

pub struct IdentifierParser<'s> {
    reader: TokenReader<'s>,
    options: IdentifierOptions,
}

impl<'s> IdentifierParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self::with_options(reader, IdentifierOptions::all())
    }

    pub fn with_options(reader: TokenReader<'s>, options: IdentifierOptions) -> Self {
        Self { reader, options }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn at_end(&self) -> bool {
        self.reader.at_end()
    }

    pub fn offset(&self) -> rowan::TextSize {
        self.reader.offset()
    }

    /// Whether the current token can start an identifier.
    pub fn look_ahead(&self) -> bool {
        match self.reader.peek_at(0) {
            Some(t) => t.kind.is_identifier() || t.kind == TokenKind::Operator,
            None => false,
        }
    }

    pub fn parse(&mut self) -> Result<Identifier, SyntaxError> {
        let t = self.reader.peek()?;

        match t.kind {
            TokenKind::Void
            | TokenKind::Bool
            | TokenKind::Char
            | TokenKind::Int
            | TokenKind::Float
            | TokenKind::Double
            | TokenKind::Auto
            | TokenKind::This => {
                let name = self.reader.read()?;
                Ok(Identifier::Simple(SimpleIdentifier { name }))
            }
            TokenKind::Operator => self.read_operator_name(),
            TokenKind::UserDefinedName => self.read_user_defined_name(),
            _ => Err(self
                .reader
                .syntax_err(ParserError::ExpectedIdentifier)
                .with_found(t)),
        }
    }

    fn read_operator_name(&mut self) -> Result<Identifier, SyntaxError> {
        if !self.options.operator_name {
            let t = self.reader.peek()?;
            return Err(self
                .reader
                .syntax_err(ParserError::UnexpectedToken)
                .with_found(t));
        }

        let keyword = self.reader.read()?;
        let op = self.reader.peek()?;

        if op.kind.is_operator() {
            let symbol = self.reader.read()?;
            return Ok(Identifier::Operator(OperatorName { keyword, symbol }));
        }

        match op.kind {
            TokenKind::LeftPar => {
                let lp = self.reader.read()?;
                let rp = self.reader.read_kind(TokenKind::RightPar)?;
                if lp.span.end() != rp.span.start() {
                    return Err(SyntaxError::new(ParserError::UnexpectedToken, lp.span.start())
                        .with_found(lp)
                        .with_expected(TokenKind::LeftRightPar));
                }
                let symbol =
                    Token::new(TokenKind::LeftRightPar, TextRange::new(lp.span.start(), rp.span.end()));
                Ok(Identifier::Operator(OperatorName { keyword, symbol }))
            }
            TokenKind::LeftBracket => {
                let lb = self.reader.read()?;
                let rb = self.reader.read_kind(TokenKind::RightBracket)?;
                if lb.span.end() != rb.span.start() {
                    return Err(SyntaxError::new(ParserError::UnexpectedToken, lb.span.start())
                        .with_found(lb)
                        .with_expected(TokenKind::LeftRightBracket));
                }
                let symbol = Token::new(
                    TokenKind::LeftRightBracket,
                    TextRange::new(lb.span.start(), rb.span.end()),
                );
                Ok(Identifier::Operator(OperatorName { keyword, symbol }))
            }
            TokenKind::StringLiteral => {
                if self.reader.text(&op).len() != 2 {
                    return Err(self
                        .reader
                        .syntax_err(ParserError::ExpectedEmptyStringLiteral)
                        .with_found(op));
                }

                let double_quotes = self.reader.read()?;
                let mut suffix_parser = IdentifierParser::with_options(
                    self.reader.subfragment(),
                    IdentifierOptions::simple_only(),
                );
                let suffix = suffix_parser.parse()?;
                self.reader.seek(suffix_parser.pos());

                let suffix = match suffix {
                    Identifier::Simple(s) => s.name,
                    other => {
                        return Err(SyntaxError::new(
                            ParserError::ExpectedUserDefinedName,
                            other.span().start(),
                        ));
                    }
                };

                Ok(Identifier::LiteralOperator(LiteralOperatorName {
                    keyword,
                    double_quotes,
                    suffix,
                }))
            }
            TokenKind::UserDefinedLiteral => {
                let op = self.reader.read()?;
                let text = self.reader.text(&op);

                if !text.starts_with("\"\"") {
                    return Err(SyntaxError::new(
                        ParserError::ExpectedEmptyStringLiteral,
                        op.span.start(),
                    )
                    .with_found(op));
                }

                // Split `""suffix` into the synthetic quotes and suffix tokens.
                let quotes_span = TextRange::at(op.span.start(), 2.into());
                let suffix_span = TextRange::new(op.span.start() + rowan::TextSize::from(2), op.span.end());
                let double_quotes = Token::new(TokenKind::StringLiteral, quotes_span);
                let suffix = Token::new(TokenKind::UserDefinedName, suffix_span);

                Ok(Identifier::LiteralOperator(LiteralOperatorName {
                    keyword,
                    double_quotes,
                    suffix,
                }))
            }
            _ => Err(self
                .reader
                .syntax_err(ParserError::ExpectedOperatorSymbol)
                .with_found(op)),
        }
    }

    fn read_user_defined_name(&mut self) -> Result<Identifier, SyntaxError> {
        let base = self.reader.read()?;

        if base.kind != TokenKind::UserDefinedName {
            return Err(SyntaxError::new(ParserError::ExpectedUserDefinedName, base.span.start())
                .with_found(base));
        }

        let mut ret = Identifier::Simple(SimpleIdentifier { name: base });

        if self.reader.at_end() {
            return Ok(ret);
        }

        if self.options.template_id && self.reader.at(TokenKind::LeftAngle) {
            if let Some(mut template_reader) = self.reader.try_template() {
                match read_template_arguments(base, &mut template_reader) {
                    Ok(id) => {
                        ret = id;
                        if template_reader.end() != self.reader.end() {
                            self.reader.seek(template_reader.end() + 1);
                        } else {
                            self.reader.seek(template_reader.end());
                        }
                    }
                    // Not a template-argument list after all, e.g. `a < b`.
                    Err(_) => return Ok(ret),
                }
            }
        }

        if self.reader.at_end() {
            return Ok(ret);
        }

        if self.options.qualified_id && self.reader.at(TokenKind::ScopeResolution) {
            while self.reader.at(TokenKind::ScopeResolution) {
                let scope_resolution = self.reader.read()?;

                let mut part_parser = IdentifierParser::with_options(
                    self.reader.subfragment(),
                    IdentifierOptions {
                        template_id: true,
                        qualified_id: false,
                        operator_name: false,
                    },
                );
                let rhs = part_parser.parse()?;
                self.reader.seek(part_parser.pos());

                ret = Identifier::Scoped(ScopedIdentifier {
                    lhs: Box::new(ret),
                    scope_resolution,
                    rhs: Box::new(rhs),
                });

                if self.reader.at_end() {
                    break;
                }
            }
        }

        Ok(ret)
    }
}

/// Parses the contents of a carved template-argument fragment.
fn read_template_arguments(
    base: Token,
    reader: &mut TokenReader<'_>,
) -> Result<Identifier, SyntaxError> {
    let mut args: Vec<TemplateArg> = Vec::new();

    while !reader.at_end() {
        let mut arg_parser = TemplateArgParser::new(reader.next(FragmentKind::ListElement)?);
        args.push(arg_parser.parse()?);

        if !reader.at_end() {
            reader.read_kind(TokenKind::Comma)?;
        }
    }

    let left_angle = reader.tokens()[reader.begin() - 1];
    let right_angle = reader.tokens()[reader.end()];

    Ok(Identifier::Template(TemplateIdentifier {
        name: base,
        left_angle,
        args,
        right_angle,
    }))
}

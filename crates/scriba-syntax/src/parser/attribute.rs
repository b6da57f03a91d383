//! `[[ expr ]]` attributes.

use rowan::TextRange;

use crate::ast::Attribute;
use crate::errors::SyntaxError;
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

use super::expr::ExpressionParser;

pub struct AttributeParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> AttributeParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    /// Whether an attribute starts at the cursor.
    pub fn ready(&self) -> bool {
        self.reader.at(TokenKind::LeftBracket)
            && self
                .reader
                .peek_at(1)
                .is_some_and(|t| t.kind == TokenKind::LeftBracket)
    }

    pub fn parse(&mut self) -> Result<Attribute, SyntaxError> {
        let outer = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
        let inner = outer.subfragment_of(FragmentKind::DelimiterPair)?;

        let lb1 = self.reader.read_kind(TokenKind::LeftBracket)?;
        let lb2 = self.reader.read_kind(TokenKind::LeftBracket)?;
        let double_left_bracket = Token::new(
            TokenKind::DblLeftBracket,
            TextRange::new(lb1.span.start(), lb2.span.end()),
        );

        let mut expr_parser = ExpressionParser::new(inner);
        let expr = expr_parser.parse()?;
        self.reader.seek(expr_parser.pos());

        let rb1 = self.reader.read_kind(TokenKind::RightBracket)?;
        let rb2 = self.reader.read_kind(TokenKind::RightBracket)?;
        let double_right_bracket = Token::new(
            TokenKind::DblRightBracket,
            TextRange::new(rb1.span.start(), rb2.span.end()),
        );

        Ok(Attribute {
            double_left_bracket,
            expr,
            double_right_bracket,
        })
    }
}

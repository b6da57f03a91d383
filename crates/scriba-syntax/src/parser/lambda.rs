//! Lambda expressions and array literals.
//!
//! Both start with `[`; the decision is made by looking at the token that
//! follows the matching `]`: a `(` means lambda, anything else means array.

use crate::ast::{ArrayExpr, Expr, LambdaCapture, LambdaExpr};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::TokenKind;

use super::expr::ExpressionParser;
use super::identifier::{IdentifierOptions, IdentifierParser};
use super::program::ProgramParser;
use super::types::FunctionParamParser;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    ParsingArray,
    ParsingLambda,
}

pub struct LambdaParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> LambdaParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let bracket_content = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;

        if self.detect(&bracket_content) == Decision::ParsingArray {
            self.parse_array(bracket_content)
        } else {
            self.parse_lambda(bracket_content)
        }
    }

    fn detect(&self, bracket_content: &TokenReader<'s>) -> Decision {
        // The carved fragment ends on `]`; look one token past it in the
        // full token list, which may reach beyond our own fragment.
        match self.reader.tokens().get(bracket_content.end() + 1) {
            Some(t) if t.kind == TokenKind::LeftPar => Decision::ParsingLambda,
            _ => Decision::ParsingArray,
        }
    }

    fn parse_array(&mut self, mut bracket_content: TokenReader<'s>) -> Result<Expr, SyntaxError> {
        let left_bracket = self.reader.read_kind(TokenKind::LeftBracket)?;
        let mut elements = Vec::new();

        while !bracket_content.at_end() {
            let mut elem_parser =
                ExpressionParser::new(bracket_content.next(FragmentKind::ListElement)?);
            elements.push(elem_parser.parse()?);

            if !bracket_content.at_end() {
                bracket_content.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.seek(bracket_content.end());
        let right_bracket = self.reader.read()?;

        Ok(Expr::Array(ArrayExpr {
            left_bracket,
            elements,
            right_bracket,
        }))
    }

    fn parse_lambda(&mut self, mut bracket_content: TokenReader<'s>) -> Result<Expr, SyntaxError> {
        let left_bracket = self.reader.read_kind(TokenKind::LeftBracket)?;
        let mut captures = Vec::new();

        while !bracket_content.at_end() {
            let capture_reader = bracket_content.next(FragmentKind::ListElement)?;
            let mut capture_parser = LambdaCaptureParser::new(capture_reader);

            if !capture_parser.detect() {
                return Err(capture_parser
                    .reader
                    .syntax_err(ParserError::CouldNotParseLambdaCapture));
            }

            captures.push(capture_parser.parse()?);

            if !bracket_content.at_end() {
                bracket_content.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.seek(bracket_content.end());
        let right_bracket = self.reader.read()?;

        // Parameter list.
        let mut params_reader = self.reader.next(FragmentKind::DelimiterPair)?;
        let left_par = self.reader.tokens()[params_reader.begin() - 1];
        let mut params = Vec::new();

        while !params_reader.at_end() {
            let mut param_parser =
                FunctionParamParser::new(params_reader.next(FragmentKind::ListElement)?);
            params.push(param_parser.parse()?);

            if !params_reader.at_end() {
                params_reader.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.seek(params_reader.end());
        let right_par = self.reader.read()?;

        // Body.
        if !self.reader.at(TokenKind::LeftBrace) {
            return Err(match self.reader.peek_at(0) {
                Some(t) => self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::LeftBrace),
                None => self.reader.syntax_err(ParserError::UnexpectedEndOfInput),
            });
        }

        let mut body_parser = ProgramParser::new(self.reader.subfragment());
        let body = body_parser.parse_compound_statement()?;
        self.reader.seek(body_parser.pos());

        Ok(Expr::Lambda(Box::new(LambdaExpr {
            left_bracket,
            captures,
            right_bracket,
            left_par,
            params,
            right_par,
            body,
        })))
    }
}

pub struct LambdaCaptureParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> LambdaCaptureParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn detect(&self) -> bool {
        match self.reader.peek_at(0) {
            Some(t) => matches!(
                t.kind,
                TokenKind::Eq | TokenKind::Ampersand | TokenKind::UserDefinedName
            ),
            None => false,
        }
    }

    pub fn parse(&mut self) -> Result<LambdaCapture, SyntaxError> {
        if self.reader.at_end() {
            return Err(self.reader.syntax_err(ParserError::UnexpectedFragmentEnd));
        }

        let mut cap = LambdaCapture {
            by_value_sign: None,
            reference: None,
            name: None,
            assignment_sign: None,
            value: None,
        };

        if self.reader.at(TokenKind::Eq) {
            let sign = self.reader.read()?;
            cap.by_value_sign = Some(sign);
            if !self.reader.at_end() {
                return Err(SyntaxError::new(ParserError::UnexpectedToken, sign.span.start())
                    .with_found(sign)
                    .with_expected(TokenKind::RightBracket));
            }
            return Ok(cap);
        }

        if self.reader.at(TokenKind::Ampersand) {
            cap.reference = Some(self.reader.read()?);
            if self.reader.at_end() {
                return Ok(cap);
            }
        }

        let mut id_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());
        cap.name = Some(name.base_token());

        if self.reader.at_end() {
            return Ok(cap);
        }

        cap.assignment_sign = Some(self.reader.read_kind(TokenKind::Eq)?);
        let mut expr_parser = ExpressionParser::new(self.reader.subfragment());
        cap.value = Some(expr_parser.parse()?);
        self.reader.seek(expr_parser.pos());

        Ok(cap)
    }
}

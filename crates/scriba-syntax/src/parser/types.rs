//! Type annotations and function parameters.

use crate::ast::{FunctionParameter, FunctionType, QualifiedType};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::{DelimitersCounter, FragmentKind};
use crate::reader::TokenReader;
use crate::token::TokenKind;

use super::expr::ExpressionParser;
use super::identifier::{IdentifierOptions, IdentifierParser};

/// How thoroughly [`TypeParser::detect`] inspects its fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Detection {
    /// Only look at the first token.
    LookAhead,
    /// Scan the whole fragment for a type-shaped token sequence.
    FullFragment,
}

pub struct TypeParser<'s> {
    reader: TokenReader<'s>,
    read_function_signature: bool,
}

impl<'s> TypeParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self {
            reader,
            read_function_signature: true,
        }
    }

    /// Disables trailing `(paramlist)` function-signature parsing.
    pub fn set_read_function_signature(&mut self, on: bool) {
        self.read_function_signature = on;
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn at_end(&self) -> bool {
        self.reader.at_end()
    }

    pub fn syntax_err(&self, error: ParserError) -> SyntaxError {
        self.reader.syntax_err(error)
    }

    pub fn parse(&mut self) -> Result<QualifiedType, SyntaxError> {
        let mut ret = QualifiedType::default();

        if self.reader.at(TokenKind::Const) {
            ret.const_qualifier = Some(self.reader.read()?);
        }

        let mut id_parser = IdentifierParser::new(self.reader.subfragment());
        ret.name = Some(id_parser.parse()?);
        self.reader.seek(id_parser.pos());

        if self.reader.at_end() {
            return Ok(ret);
        }

        if self.reader.at(TokenKind::Const) {
            ret.const_qualifier = Some(self.reader.read()?);

            if self.reader.at(TokenKind::Ampersand) || self.reader.at(TokenKind::LogicalAnd) {
                ret.reference = Some(self.reader.read()?);
            }
        } else if self.reader.at(TokenKind::Ampersand) || self.reader.at(TokenKind::LogicalAnd) {
            ret.reference = Some(self.reader.read()?);

            if self.reader.at(TokenKind::Const) {
                ret.const_qualifier = Some(self.reader.read()?);
            }
        }

        if self.reader.at_end() {
            return Ok(ret);
        }

        if self.read_function_signature && self.look_ahead_function_signature()? {
            let save_point = self.reader.pos();
            match self.try_read_function_signature(ret.clone()) {
                Ok(sig) => return Ok(sig),
                Err(_) => self.reader.seek(save_point),
            }
        }

        Ok(ret)
    }

    /// Checks whether a type could be read here, without committing.
    pub fn detect(&self, opt: Detection) -> bool {
        let Some(first) = self.reader.peek_at(0) else {
            return false;
        };

        let look_ahead = first.kind == TokenKind::Const || first.kind.is_identifier();

        if opt == Detection::LookAhead {
            return look_ahead;
        }

        if !look_ahead {
            return false;
        }

        // A full-fragment scan rejects shapes a type cannot have:
        // 1. two consecutive identifiers, as in `int v` (but `const T` is fine);
        // 2. an identifier followed by anything but `<`, `::`, `&` or `&&`;
        // 3. `&` / `&&` anywhere but at the end;
        // 4. improperly nested `<` and `>`.
        let n = self.reader.end() - self.reader.pos();
        let mut prev_was_identifier = false;
        let mut counter = DelimitersCounter::default();
        let mut template_delimiters: i32 = 0;

        for i in 0..n {
            let Some(t) = self.reader.peek_at(i) else {
                return false;
            };

            if t.kind == TokenKind::Const {
                prev_was_identifier = false;
                continue;
            }

            if prev_was_identifier
                && t.kind != TokenKind::LeftAngle
                && t.kind != TokenKind::ScopeResolution
                && t.kind != TokenKind::Ampersand
                && t.kind != TokenKind::LogicalAnd
            {
                return false;
            }

            if (t.kind == TokenKind::Ampersand || t.kind == TokenKind::LogicalAnd) && i != n - 1 {
                return false;
            }

            if counter.balanced() {
                match t.kind {
                    TokenKind::LeftAngle => template_delimiters += 1,
                    TokenKind::RightAngle => template_delimiters -= 1,
                    TokenKind::RightRightAngle => template_delimiters -= 2,
                    _ => {}
                }
            }

            counter.feed(&t);

            if t.kind.is_identifier() {
                if prev_was_identifier {
                    return false;
                }
                prev_was_identifier = true;
            } else {
                prev_was_identifier = false;
            }
        }

        template_delimiters == 0
    }

    fn look_ahead_function_signature(&self) -> Result<bool, SyntaxError> {
        if !self.reader.at(TokenKind::LeftPar) {
            return Ok(false);
        }

        let mut params_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;

        while !params_reader.at_end() {
            let element = params_reader.next(FragmentKind::ListElement)?;
            let param_parser = TypeParser::new(element);

            if !param_parser.detect(Detection::FullFragment) {
                return Ok(false);
            }

            if !params_reader.at_end() {
                params_reader.read_kind(TokenKind::Comma)?;
            }
        }

        Ok(true)
    }

    fn try_read_function_signature(
        &mut self,
        return_type: QualifiedType,
    ) -> Result<QualifiedType, SyntaxError> {
        let mut function_type = FunctionType {
            return_type,
            params: Vec::new(),
        };

        let mut params_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;

        while !params_reader.at_end() {
            let mut param_parser = TypeParser::new(params_reader.next(FragmentKind::ListElement)?);
            let param = param_parser.parse()?;
            function_type.params.push(param);

            if !param_parser.at_end() {
                let t = param_parser.reader.peek()?;
                return Err(param_parser
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t));
            }

            if !params_reader.at_end() {
                params_reader.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.seek(params_reader.end() + 1);

        let mut ret = QualifiedType {
            function_type: Some(Box::new(function_type)),
            ..QualifiedType::default()
        };

        if self.reader.at(TokenKind::Const) {
            ret.const_qualifier = Some(self.reader.read()?);
        }

        if self.reader.at(TokenKind::Ampersand) {
            ret.reference = Some(self.reader.read()?);
        }

        Ok(ret)
    }
}

pub struct FunctionParamParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> FunctionParamParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<FunctionParameter, SyntaxError> {
        let mut type_parser = TypeParser::new(self.reader.subfragment());
        let param_type = type_parser.parse()?;
        self.reader.seek(type_parser.pos());

        let mut param = FunctionParameter {
            param_type,
            name: None,
            default_value: None,
        };

        if self.reader.at_end() {
            return Ok(param);
        }

        let mut id_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());
        param.name = Some(name.base_token());

        if self.reader.at_end() {
            return Ok(param);
        }

        self.reader.read_kind(TokenKind::Eq)?;
        let mut expr_parser = ExpressionParser::new(self.reader.subfragment());
        param.default_value = Some(expr_parser.parse()?);
        self.reader.seek(expr_parser.pos());

        Ok(param)
    }
}

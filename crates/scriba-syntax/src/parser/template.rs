//! Template declarations, parameters and arguments.

use std::rc::Rc;

use crate::ast::{Decl, TemplateArg, TemplateDecl, TemplateParameter};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::TokenKind;

use super::class::ClassParser;
use super::decl::{Decision, DeclParser};
use super::expr::ExpressionParser;
use super::identifier::IdentifierOptions;
use super::types::{Detection, TypeParser};

pub struct TemplateParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> TemplateParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<TemplateDecl>, SyntaxError> {
        let template_keyword = self.reader.read()?;

        let Some(mut params_reader) = self.reader.try_template() else {
            return Err(self.reader.syntax_err(ParserError::UnexpectedFragmentEnd));
        };

        let left_angle = self.reader.read_kind(TokenKind::LeftAngle)?;

        let mut parameters = Vec::new();
        while !params_reader.at_end() {
            let mut param_parser =
                TemplateParameterParser::new(params_reader.next(FragmentKind::ListElement)?);
            parameters.push(param_parser.parse()?);

            if !params_reader.at_end() {
                params_reader.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.seek(params_reader.end());

        let right_angle = self.reader.read()?;
        debug_assert!(
            right_angle.kind == TokenKind::RightAngle
                || right_angle.kind == TokenKind::RightRightAngle
        );

        let declaration = self.parse_decl()?;

        Ok(Rc::new(TemplateDecl {
            template_keyword,
            left_angle,
            parameters,
            right_angle,
            declaration,
        }))
    }

    fn parse_decl(&mut self) -> Result<Decl, SyntaxError> {
        if self.reader.at(TokenKind::Class) || self.reader.at(TokenKind::Struct) {
            let mut class_parser = ClassParser::new(self.reader.subfragment());
            class_parser.set_template_specialization(true);
            let class = class_parser.parse()?;
            self.reader.seek(class_parser.pos());
            return Ok(Decl::Class(class));
        }

        let mut func_parser = DeclParser::new(self.reader.subfragment(), None);
        func_parser.set_declarator_options(IdentifierOptions {
            template_id: true,
            qualified_id: false,
            operator_name: true,
        });

        if !func_parser.detect_decl()? {
            return Err(self.reader.syntax_err(ParserError::ExpectedDeclaration));
        }

        func_parser.set_decision(Decision::ParsingFunction);
        let decl = func_parser.parse()?;
        self.reader.seek(func_parser.pos());
        Ok(decl)
    }
}

pub struct TemplateParameterParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> TemplateParameterParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn parse(&mut self) -> Result<TemplateParameter, SyntaxError> {
        let t = self.reader.peek()?;

        let kind = match t.kind {
            TokenKind::Typename | TokenKind::Int | TokenKind::Bool => self.reader.read()?,
            _ => {
                return Err(self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::Invalid));
            }
        };

        let name = self.reader.peek()?;
        if !name.kind.is_identifier() {
            return Err(self
                .reader
                .syntax_err(ParserError::ExpectedIdentifier)
                .with_found(name));
        }
        let name = self.reader.read()?;

        if self.reader.at_end() {
            return Ok(TemplateParameter {
                kind,
                name,
                eq: None,
                default_value: None,
            });
        }

        let eq = self.reader.read_kind(TokenKind::Eq)?;

        let mut arg_parser = TemplateArgParser::new(self.reader.subfragment());
        let default_value = arg_parser.parse()?;
        self.reader.seek(arg_parser.pos());

        Ok(TemplateParameter {
            kind,
            name,
            eq: Some(eq),
            default_value: Some(default_value),
        })
    }
}

/// A template argument: a type when the tokens read as one, otherwise a
/// constant expression.
pub struct TemplateArgParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> TemplateArgParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<TemplateArg, SyntaxError> {
        let save_point = self.reader.pos();

        {
            let mut type_parser = TypeParser::new(self.reader.subfragment());
            if type_parser.detect(Detection::LookAhead) {
                if let Ok(qt) = type_parser.parse() {
                    self.reader.seek(type_parser.pos());
                    if self.reader.at_end() {
                        return Ok(TemplateArg::Type(qt));
                    }
                }
            }
        }

        self.reader.seek(save_point);

        let mut expr_parser = ExpressionParser::new(self.reader.subfragment());
        let expr = expr_parser.parse()?;
        self.reader.seek(expr_parser.pos());
        Ok(TemplateArg::Expr(expr))
    }
}

//! Class and enum declarations.

use std::rc::Rc;

use crate::ast::{
    AccessSpecifier, Attribute, ClassContent, ClassDecl, Decl, EnumDecl, EnumValueDecl,
    Identifier,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

use super::attribute::AttributeParser;
use super::decl::DeclParser;
use super::expr::ExpressionParser;
use super::identifier::{IdentifierOptions, IdentifierParser};
use super::namespace::{TypedefParser, UsingParser};
use super::template::TemplateParser;

pub struct ClassParser<'s> {
    reader: TokenReader<'s>,
    template_specialization: bool,
}

impl<'s> ClassParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self {
            reader,
            template_specialization: false,
        }
    }

    /// Allows the class name to be a template-id, for specializations.
    pub fn set_template_specialization(&mut self, on: bool) {
        self.template_specialization = on;
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<ClassDecl>, SyntaxError> {
        let class_keyword = self.reader.read()?;
        let attribute = self.read_optional_attribute()?;
        let name = self.read_class_name()?;

        let (colon, parent) = self.read_optional_parent()?;
        let opening_brace = self.reader.read_kind(TokenKind::LeftBrace)?;

        let mut content = Vec::new();
        let (closing_brace, ending_semicolon) = loop {
            if self.reader.at(TokenKind::RightBrace) {
                let closing = self.reader.read()?;
                let semicolon = self.reader.read_kind(TokenKind::Semicolon)?;
                break (closing, semicolon);
            }
            self.read_node(&name, &mut content)?;
        };

        Ok(Rc::new(ClassDecl {
            class_keyword,
            attribute,
            name,
            colon,
            parent,
            opening_brace,
            content,
            closing_brace,
            ending_semicolon,
        }))
    }

    fn read_optional_attribute(&mut self) -> Result<Option<Attribute>, SyntaxError> {
        let mut parser = AttributeParser::new(self.reader.subfragment());
        if !parser.ready() {
            return Ok(None);
        }
        let attr = parser.parse()?;
        self.reader.seek(parser.pos());
        Ok(Some(attr))
    }

    fn read_class_name(&mut self) -> Result<Identifier, SyntaxError> {
        let options = IdentifierOptions {
            template_id: self.template_specialization,
            qualified_id: false,
            operator_name: false,
        };
        let mut name_parser = IdentifierParser::with_options(self.reader.subfragment(), options);
        let name = name_parser.parse()?;
        self.reader.seek(name_parser.pos());
        Ok(name)
    }

    fn read_optional_parent(&mut self) -> Result<(Option<Token>, Option<Identifier>), SyntaxError> {
        if self.reader.at_end() {
            return Err(self.reader.syntax_err(ParserError::UnexpectedEndOfInput));
        }

        if !self.reader.at(TokenKind::Colon) {
            return Ok((None, None));
        }

        let colon = self.reader.read()?;

        let mut name_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions {
                template_id: true,
                qualified_id: true,
                operator_name: false,
            },
        );
        let parent = name_parser.parse()?;
        self.reader.seek(name_parser.pos());

        Ok((Some(colon), Some(parent)))
    }

    fn read_node(
        &mut self,
        class_name: &Identifier,
        content: &mut Vec<ClassContent>,
    ) -> Result<(), SyntaxError> {
        let t = self.reader.peek()?;

        match t.kind {
            TokenKind::Public | TokenKind::Protected | TokenKind::Private => {
                let visibility = self.reader.read()?;
                let colon = self.reader.read_kind(TokenKind::Colon)?;
                content.push(ClassContent::AccessSpecifier(AccessSpecifier {
                    visibility,
                    colon,
                }));
            }
            TokenKind::Friend => {
                let mut parser = super::namespace::FriendParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                content.push(ClassContent::Declaration(Decl::Friend(decl)));
            }
            TokenKind::Using => {
                let mut parser = UsingParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                content.push(ClassContent::Declaration(decl));
            }
            TokenKind::Template => {
                let mut parser = TemplateParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                content.push(ClassContent::Declaration(Decl::Template(decl)));
            }
            TokenKind::Typedef => {
                let mut parser = TypedefParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                content.push(ClassContent::Declaration(Decl::Typedef(decl)));
            }
            _ => {
                let mut parser =
                    DeclParser::new(self.reader.subfragment(), Some(class_name.clone()));

                if !parser.detect_decl()? {
                    return Err(self.reader.syntax_err(ParserError::ExpectedDeclaration));
                }

                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                content.push(ClassContent::Declaration(decl));
            }
        }

        Ok(())
    }
}

pub struct EnumParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> EnumParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<EnumDecl>, SyntaxError> {
        let enum_keyword = self.reader.read()?;

        let class_keyword = if self.reader.at(TokenKind::Class) {
            Some(self.reader.read()?)
        } else {
            None
        };

        let mut attribute = None;
        {
            let mut parser = AttributeParser::new(self.reader.subfragment());
            if parser.ready() {
                attribute = Some(parser.parse()?);
                self.reader.seek(parser.pos());
            }
        }

        let mut name_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = name_parser.parse()?.base_token();
        self.reader.seek(name_parser.pos());

        let values_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
        let left_brace = self.reader.read_kind(TokenKind::LeftBrace)?;

        let values = read_enum_values(values_reader)?;
        self.reader.seek(values_reader.end());

        let right_brace = self.reader.read_kind(TokenKind::RightBrace)?;
        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Rc::new(EnumDecl {
            enum_keyword,
            class_keyword,
            attribute,
            name,
            left_brace,
            values,
            right_brace,
        }))
    }
}

fn read_enum_values(mut reader: TokenReader<'_>) -> Result<Vec<EnumValueDecl>, SyntaxError> {
    let mut values = Vec::new();

    while !reader.at_end() {
        let mut value_reader = reader.next(FragmentKind::ListElement)?;

        let mut id_parser = IdentifierParser::with_options(
            value_reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = id_parser.parse()?.base_token();
        value_reader.seek(id_parser.pos());

        if value_reader.at_end() {
            values.push(EnumValueDecl { name, value: None });
        } else {
            value_reader.read_kind(TokenKind::Eq)?;
            let mut value_parser = ExpressionParser::new(value_reader.subfragment());
            let value = value_parser.parse()?;
            values.push(EnumValueDecl {
                name,
                value: Some(value),
            });
        }

        if !reader.at_end() {
            reader.read_kind(TokenKind::Comma)?;
        }
    }

    Ok(values)
}

//! Namespaces, using declarations/directives, typedefs, friends, imports.

use std::rc::Rc;

use crate::ast::{
    Decl, FriendDecl, Identifier, ImportDirective, NamespaceAliasDecl, NamespaceDecl,
    TypeAliasDecl, TypedefDecl, UsingDecl, UsingDirectiveDecl,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::TokenKind;

use super::identifier::{IdentifierOptions, IdentifierParser};
use super::program::ProgramParser;
use super::types::TypeParser;

pub struct NamespaceParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> NamespaceParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Decl, SyntaxError> {
        let namespace_keyword = self.reader.read()?;
        let name = self.read_namespace_name()?;

        if self.reader.at(TokenKind::Eq) {
            let eq = self.reader.read()?;

            let mut id_parser = IdentifierParser::new(self.reader.subfragment());
            let aliased_name = id_parser.parse()?;
            self.reader.seek(id_parser.pos());

            self.reader.read_kind(TokenKind::Semicolon)?;

            return Ok(Decl::NamespaceAlias(Rc::new(NamespaceAliasDecl {
                namespace_keyword,
                alias_name: name,
                eq,
                aliased_name,
            })));
        }

        let body_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
        let left_brace = self.reader.read_kind(TokenKind::LeftBrace)?;

        let mut body_parser = ProgramParser::new(body_reader);
        let statements = body_parser.parse_program()?;
        self.reader.seek(body_reader.end());

        let right_brace = self.reader.read_kind(TokenKind::RightBrace)?;

        Ok(Decl::Namespace(Rc::new(NamespaceDecl {
            namespace_keyword,
            name,
            left_brace,
            statements,
            right_brace,
        })))
    }

    fn read_namespace_name(&mut self) -> Result<crate::token::Token, SyntaxError> {
        let mut id_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());
        Ok(name.base_token())
    }
}

pub struct UsingParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> UsingParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Decl, SyntaxError> {
        let using_keyword = self.reader.read_kind(TokenKind::Using)?;

        if self.reader.at(TokenKind::Namespace) {
            let namespace_keyword = self.reader.read()?;
            let namespace_name = self.read_name()?;
            self.reader.read_kind(TokenKind::Semicolon)?;
            return Ok(Decl::UsingDirective(Rc::new(UsingDirectiveDecl {
                using_keyword,
                namespace_keyword,
                namespace_name,
            })));
        }

        let name = self.read_name()?;

        if let Identifier::Scoped(scoped) = name {
            self.reader.read_kind(TokenKind::Semicolon)?;
            return Ok(Decl::Using(Rc::new(UsingDecl {
                using_keyword,
                used_name: scoped,
            })));
        }

        let Identifier::Simple(simple) = name else {
            return Err(SyntaxError::new(
                ParserError::ExpectedIdentifier,
                name.span().start(),
            ));
        };

        let eq = self.reader.read_kind(TokenKind::Eq)?;
        let aliased_type = self.read_name()?;
        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Decl::TypeAlias(Rc::new(TypeAliasDecl {
            using_keyword,
            alias_name: simple.name,
            eq,
            aliased_type,
        })))
    }

    fn read_name(&mut self) -> Result<Identifier, SyntaxError> {
        let mut id_parser = IdentifierParser::new(self.reader.subfragment());
        let name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());
        Ok(name)
    }
}

pub struct TypedefParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> TypedefParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<TypedefDecl>, SyntaxError> {
        let typedef_keyword = self.reader.read_kind(TokenKind::Typedef)?;

        let mut type_parser = TypeParser::new(self.reader.subfragment());
        let qualified_type = type_parser.parse()?;
        self.reader.seek(type_parser.pos());

        let mut id_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions::simple_only(),
        );
        let name = id_parser.parse()?.base_token();
        self.reader.seek(id_parser.pos());

        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Rc::new(TypedefDecl {
            typedef_keyword,
            qualified_type,
            name,
        }))
    }
}

pub struct FriendParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> FriendParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<FriendDecl>, SyntaxError> {
        let friend_keyword = self.reader.read_kind(TokenKind::Friend)?;
        let class_keyword = self.reader.read_kind(TokenKind::Class)?;

        let mut id_parser = IdentifierParser::new(self.reader.subfragment());
        let class_name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());

        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Rc::new(FriendDecl {
            friend_keyword,
            class_keyword,
            class_name,
        }))
    }
}

pub struct ImportParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> ImportParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn parse(&mut self) -> Result<Rc<ImportDirective>, SyntaxError> {
        let export_keyword = if self.reader.at(TokenKind::Export) {
            Some(self.reader.read()?)
        } else {
            None
        };

        let import_keyword = self.reader.read_kind(TokenKind::Import)?;

        let mut names = Vec::new();

        let tok = self.reader.read()?;
        if !tok.kind.is_identifier() {
            return Err(SyntaxError::new(ParserError::ExpectedIdentifier, tok.span.start())
                .with_found(tok));
        }
        names.push(tok);

        while self.reader.at(TokenKind::Dot) {
            self.reader.read()?;

            let tok = self.reader.read()?;
            if !tok.kind.is_identifier() {
                return Err(SyntaxError::new(ParserError::ExpectedIdentifier, tok.span.start())
                    .with_found(tok));
            }
            names.push(tok);
        }

        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Rc::new(ImportDirective {
            export_keyword,
            import_keyword,
            names,
        }))
    }
}

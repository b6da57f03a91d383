//! Top-level statement parsing.

use crate::ast::{
    CompoundStatement, Decl, ExprStatement, ForLoop, IfStatement, ReturnStatement, Stmt,
    WhileLoop,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::TokenKind;

use super::class::{ClassParser, EnumParser};
use super::decl::{Decision, DeclParser};
use super::expr::ExpressionParser;
use super::namespace::{ImportParser, NamespaceParser, TypedefParser, UsingParser};
use super::template::TemplateParser;

pub struct ProgramParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> ProgramParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn at_end(&self) -> bool {
        self.reader.at_end()
    }

    /// Parses statements until the fragment is exhausted.
    pub fn parse_program(&mut self) -> Result<Vec<Stmt>, SyntaxError> {
        let mut ret = Vec::new();

        while !self.reader.at_end() {
            ret.push(self.parse_statement()?);
        }

        Ok(ret)
    }

    pub fn parse_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let t = self.reader.peek()?;

        match t.kind {
            TokenKind::Semicolon => Ok(Stmt::Null(self.reader.read()?)),
            TokenKind::Break => {
                let kw = self.reader.read()?;
                self.reader.read_kind(TokenKind::Semicolon)?;
                Ok(Stmt::Break(kw))
            }
            TokenKind::Continue => {
                let kw = self.reader.read()?;
                self.reader.read_kind(TokenKind::Semicolon)?;
                Ok(Stmt::Continue(kw))
            }
            TokenKind::Class | TokenKind::Struct => {
                let mut parser = ClassParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(Decl::Class(decl)))
            }
            TokenKind::Enum => {
                let mut parser = EnumParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(Decl::Enum(decl)))
            }
            TokenKind::If => self.parse_if_statement(),
            TokenKind::Return => self.parse_return_statement(),
            TokenKind::Using => {
                let mut parser = UsingParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(decl))
            }
            TokenKind::While => self.parse_while_loop(),
            TokenKind::For => self.parse_for_loop(),
            TokenKind::LeftBrace => Ok(Stmt::Compound(self.parse_compound_statement()?)),
            TokenKind::Template => {
                let mut parser = TemplateParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(Decl::Template(decl)))
            }
            TokenKind::Typedef => {
                let mut parser = TypedefParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(Decl::Typedef(decl)))
            }
            TokenKind::Namespace => {
                let mut parser = NamespaceParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(decl))
            }
            TokenKind::Friend => Err(SyntaxError::new(
                ParserError::IllegalUseOfKeyword,
                t.span.start(),
            )
            .with_found(t)),
            TokenKind::Export | TokenKind::Import => {
                let mut parser = ImportParser::new(self.reader.subfragment());
                let decl = parser.parse()?;
                self.reader.seek(parser.pos());
                Ok(Stmt::Decl(Decl::Import(decl)))
            }
            _ => self.parse_ambiguous(),
        }
    }

    /// Statements that start with neither a keyword nor a brace: either a
    /// declaration or an expression statement.
    fn parse_ambiguous(&mut self) -> Result<Stmt, SyntaxError> {
        let save_point = self.reader.pos();

        let mut decl_parser = DeclParser::new(self.reader.subfragment(), None);
        if decl_parser.detect_decl()? {
            let decl = decl_parser.parse()?;
            self.reader.seek(decl_parser.pos());
            return Ok(Stmt::Decl(decl));
        }

        self.reader.seek(save_point);

        let mut expr_parser =
            ExpressionParser::new(self.reader.subfragment_of(FragmentKind::Statement)?);
        let expr = expr_parser.parse()?;
        self.reader.seek(expr_parser.pos());
        let semicolon = self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Stmt::Expr(Box::new(ExprStatement { expr, semicolon })))
    }

    fn parse_return_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.reader.read_kind(TokenKind::Return)?;

        if self.reader.at(TokenKind::Semicolon) {
            self.reader.read()?;
            return Ok(Stmt::Return(Box::new(ReturnStatement {
                keyword,
                expression: None,
            })));
        }

        let mut expr_parser =
            ExpressionParser::new(self.reader.subfragment_of(FragmentKind::Statement)?);
        let expression = expr_parser.parse()?;
        self.reader.seek(expr_parser.pos());

        self.reader.read_kind(TokenKind::Semicolon)?;

        Ok(Stmt::Return(Box::new(ReturnStatement {
            keyword,
            expression: Some(expression),
        })))
    }

    pub fn parse_compound_statement(&mut self) -> Result<CompoundStatement, SyntaxError> {
        let compound_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
        let open_brace = self.reader.read_kind(TokenKind::LeftBrace)?;

        let mut body_parser = ProgramParser::new(compound_reader);
        let statements = body_parser.parse_program()?;
        self.reader.seek(compound_reader.end());

        let close_brace = self.reader.read_kind(TokenKind::RightBrace)?;

        Ok(CompoundStatement {
            open_brace,
            statements,
            close_brace,
        })
    }

    fn parse_if_statement(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.reader.read_kind(TokenKind::If)?;

        let mut cond_parser =
            ExpressionParser::new(self.reader.subfragment_of(FragmentKind::DelimiterPair)?);
        let condition = cond_parser.parse()?;
        self.reader.seek(cond_parser.pos());
        self.reader.read_kind(TokenKind::RightPar)?;

        let body = self.parse_statement()?;

        if !self.reader.at(TokenKind::Else) {
            return Ok(Stmt::If(Box::new(IfStatement {
                keyword,
                condition,
                body,
                else_keyword: None,
                else_clause: None,
            })));
        }

        let else_keyword = self.reader.read()?;
        let else_clause = self.parse_statement()?;

        Ok(Stmt::If(Box::new(IfStatement {
            keyword,
            condition,
            body,
            else_keyword: Some(else_keyword),
            else_clause: Some(else_clause),
        })))
    }

    fn parse_while_loop(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.reader.read_kind(TokenKind::While)?;

        let mut cond_parser =
            ExpressionParser::new(self.reader.subfragment_of(FragmentKind::DelimiterPair)?);
        let condition = cond_parser.parse()?;
        self.reader.seek(cond_parser.pos());
        self.reader.read_kind(TokenKind::RightPar)?;

        let body = self.parse_statement()?;

        Ok(Stmt::While(Box::new(WhileLoop {
            keyword,
            condition,
            body,
        })))
    }

    fn parse_for_loop(&mut self) -> Result<Stmt, SyntaxError> {
        let keyword = self.reader.read_kind(TokenKind::For)?;

        let mut header_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;

        // Init statement: a variable declaration, an expression, or empty.
        let init_statement: Option<Stmt>;
        {
            let mut init_parser = DeclParser::new(header_reader.subfragment(), None);
            if init_parser.detect_decl()? {
                init_parser.set_decision(Decision::ParsingVariable);
                let decl = init_parser.parse()?;
                header_reader.seek(init_parser.pos());
                init_statement = Some(Stmt::Decl(decl));
            } else {
                let expr_reader = header_reader.next(FragmentKind::Statement)?;

                if !expr_reader.at_end() {
                    let mut expr_parser = ExpressionParser::new(expr_reader);
                    let init_expr = expr_parser.parse()?;
                    let semicolon = header_reader.read_kind(TokenKind::Semicolon)?;
                    init_statement = Some(Stmt::Expr(Box::new(ExprStatement {
                        expr: init_expr,
                        semicolon,
                    })));
                } else {
                    header_reader.read_kind(TokenKind::Semicolon)?;
                    init_statement = None;
                }
            }
        }

        // Condition.
        let condition = {
            let cond_reader = header_reader.next(FragmentKind::Statement)?;

            let condition = if !cond_reader.at_end() {
                let mut cond_parser = ExpressionParser::new(cond_reader);
                Some(cond_parser.parse()?)
            } else {
                None
            };

            header_reader.read_kind(TokenKind::Semicolon)?;
            condition
        };

        // Loop increment.
        let loop_increment = {
            let incr_reader = header_reader.subfragment();

            if !incr_reader.at_end() {
                let mut incr_parser = ExpressionParser::new(incr_reader);
                let expr = incr_parser.parse()?;
                header_reader.seek(incr_parser.pos());
                Some(expr)
            } else {
                None
            }
        };

        self.reader.seek(header_reader.end() + 1);

        let body = self.parse_statement()?;

        Ok(Stmt::For(Box::new(ForLoop {
            keyword,
            init_statement,
            condition,
            loop_increment,
            body,
        })))
    }
}

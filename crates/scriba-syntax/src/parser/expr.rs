//! Expression parsing.
//!
//! Operands and operator tokens are collected in a single left-to-right scan;
//! the tree is then built by repeatedly splitting at the loosest-binding
//! operator, honoring precedence and associativity. The ternary operator is
//! handled by locating the `:` matching each `?`.

use crate::ast::{
    ArraySubscript, BraceConstruction, ConditionalExpr, Expr, FunctionCall, ListExpr, Literal,
    Operation,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::operators::{Associativity, OperatorId, OperatorPosition, associativity};
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

use super::identifier::{IdentifierOptions, IdentifierParser};
use super::lambda::LambdaParser;

pub struct ExpressionParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> ExpressionParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn at_end(&self) -> bool {
        self.reader.at_end()
    }

    pub fn parse(&mut self) -> Result<Expr, SyntaxError> {
        let mut operands = Vec::new();
        let mut operators = Vec::new();

        operands.push(self.read_operand()?);

        while !self.reader.at_end() {
            operators.push(self.read_binary_operator()?);
            operands.push(self.read_operand()?);
        }

        build_expression(&operands, &operators)
    }

    fn is_prefix_operator(tok: &Token) -> bool {
        OperatorId::from_token(tok.kind, OperatorPosition::Prefix).is_some()
    }

    fn is_infix_operator(tok: &Token) -> bool {
        OperatorId::from_token(tok.kind, OperatorPosition::Infix).is_some()
    }

    fn read_operand(&mut self) -> Result<Expr, SyntaxError> {
        if self.reader.at_end() {
            return Err(self.reader.syntax_err(ParserError::UnexpectedFragmentEnd));
        }

        let pos_backup = self.reader.pos();
        let t = self.reader.peek()?;

        let mut operand: Expr;

        if t.kind.is_operator() {
            if !Self::is_prefix_operator(&t) {
                return Err(self
                    .reader
                    .syntax_err(ParserError::ExpectedPrefixOperator)
                    .with_found(t));
            }

            let op = self.reader.read()?;
            let inner = self.read_operand()?;
            operand = Expr::Operation(Box::new(Operation {
                op,
                arg1: inner,
                arg2: None,
                postfix: false,
            }));
        } else if t.kind == TokenKind::LeftPar {
            if self.reader.peek_at(1).is_some_and(|t| t.kind == TokenKind::RightPar) {
                return Err(self.reader.syntax_err(ParserError::InvalidEmptyOperand));
            }

            let mut sub_parser = ExpressionParser::new(self.reader.next(FragmentKind::DelimiterPair)?);
            operand = sub_parser.parse()?;
            self.reader.read_kind(TokenKind::RightPar)?;
        } else if t.kind == TokenKind::LeftBracket {
            // Array literal or lambda - the LambdaParser disambiguates.
            let mut lambda_parser = LambdaParser::new(self.reader.subfragment());
            operand = lambda_parser.parse()?;
            self.reader.seek(lambda_parser.pos());
        } else if t.kind == TokenKind::LeftBrace {
            let left_brace = t;
            let mut list_reader = self.reader.next(FragmentKind::DelimiterPair)?;
            let mut elements = Vec::new();

            while !list_reader.at_end() {
                let mut elem_parser =
                    ExpressionParser::new(list_reader.next(FragmentKind::ListElement)?);
                elements.push(elem_parser.parse()?);

                if !list_reader.at_end() {
                    list_reader.read_kind(TokenKind::Comma)?;
                }
            }

            let right_brace = self.reader.read_kind(TokenKind::RightBrace)?;
            operand = Expr::List(ListExpr {
                left_brace,
                elements,
                right_brace,
            });
        } else if t.kind.is_literal() {
            operand = Expr::Literal(self.read_literal()?);
        } else {
            let mut id_parser = IdentifierParser::new(self.reader.subfragment());
            operand = Expr::Id(id_parser.parse()?);
            self.reader.seek(id_parser.pos());
        }

        while !self.reader.at_end() {
            let t = self.reader.peek()?;

            if t.kind == TokenKind::PlusPlus || t.kind == TokenKind::MinusMinus {
                let op = self.reader.read()?;
                operand = Expr::Operation(Box::new(Operation {
                    op,
                    arg1: operand,
                    arg2: None,
                    postfix: true,
                }));
            } else if t.kind == TokenKind::Dot {
                let op = self.reader.read()?;
                let mut id_parser = IdentifierParser::with_options(
                    self.reader.subfragment(),
                    IdentifierOptions {
                        template_id: true,
                        qualified_id: false,
                        operator_name: false,
                    },
                );
                let member_name = id_parser.parse()?;
                self.reader.seek(id_parser.pos());
                operand = Expr::Operation(Box::new(Operation {
                    op,
                    arg1: operand,
                    arg2: Some(Expr::Id(member_name)),
                    postfix: false,
                }));
            } else if t.kind == TokenKind::LeftPar {
                let left_par = t;
                let mut args_parser =
                    ExpressionListParser::new(self.reader.next(FragmentKind::DelimiterPair)?);
                let args = args_parser.parse()?;
                let right_par = self.reader.read_kind(TokenKind::RightPar)?;
                operand = Expr::Call(Box::new(FunctionCall {
                    callee: operand,
                    left_par,
                    args,
                    right_par,
                }));
            } else if t.kind == TokenKind::LeftBracket {
                let subscript_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                let left_bracket = self.reader.read()?;

                if subscript_reader.fragment().is_empty() {
                    return Err(self.reader.syntax_err(ParserError::InvalidEmptyBrackets));
                }

                let mut index_parser = ExpressionParser::new(subscript_reader);
                let index = index_parser.parse()?;
                self.reader.seek(index_parser.pos());
                let right_bracket = self.reader.read()?;

                operand = Expr::Subscript(Box::new(ArraySubscript {
                    array: operand,
                    left_bracket,
                    index,
                    right_bracket,
                }));
            } else if t.kind == TokenKind::LeftBrace && operand.is_identifier() {
                let brace_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                let left_brace = self.reader.read()?;

                let Expr::Id(temporary_type) = operand else {
                    unreachable!("checked by is_identifier");
                };

                let mut args_parser = ExpressionListParser::new(brace_reader);
                let args = args_parser.parse()?;
                self.reader.seek(args_parser.pos());
                let right_brace = self.reader.read_kind(TokenKind::RightBrace)?;

                operand = Expr::Brace(Box::new(BraceConstruction {
                    temporary_type,
                    left_brace,
                    args,
                    right_brace,
                }));
            } else if t.kind.is_operator()
                || t.kind == TokenKind::QuestionMark
                || t.kind == TokenKind::Colon
            {
                break;
            } else {
                if let Expr::Id(id) = &operand
                    && id.is_template()
                {
                    // Template identifiers cannot be used as operands; what
                    // looked like `a<b, c>` must be reparsed as comparisons.
                    self.reader.seek(pos_backup);
                    let mut id_parser = IdentifierParser::with_options(
                        self.reader.subfragment(),
                        IdentifierOptions {
                            template_id: false,
                            qualified_id: true,
                            operator_name: true,
                        },
                    );
                    operand = Expr::Id(id_parser.parse()?);
                    self.reader.seek(id_parser.pos());
                    continue;
                }

                return Err(self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::Invalid));
            }
        }

        Ok(operand)
    }

    fn read_literal(&mut self) -> Result<Literal, SyntaxError> {
        let lit = self.reader.read()?;

        match lit.kind {
            TokenKind::True | TokenKind::False => Ok(Literal::Bool(lit)),
            TokenKind::IntegerLiteral
            | TokenKind::BinaryLiteral
            | TokenKind::OctalLiteral
            | TokenKind::HexadecimalLiteral => Ok(Literal::Integer(lit)),
            TokenKind::DecimalLiteral => Ok(Literal::FloatingPoint(lit)),
            TokenKind::StringLiteral => Ok(Literal::Str(lit)),
            TokenKind::UserDefinedLiteral => Ok(Literal::UserDefined(lit)),
            _ => Err(SyntaxError::new(ParserError::ExpectedLiteral, lit.span.start())
                .with_found(lit)),
        }
    }

    fn read_binary_operator(&mut self) -> Result<Token, SyntaxError> {
        let t = self.reader.peek()?;

        if t.kind == TokenKind::QuestionMark || t.kind == TokenKind::Colon {
            return self.reader.read();
        }

        if !t.kind.is_operator() {
            return Err(self
                .reader
                .syntax_err(ParserError::ExpectedOperator)
                .with_found(t));
        }

        if !Self::is_infix_operator(&t) {
            return Err(self
                .reader
                .syntax_err(ParserError::ExpectedBinaryOperator)
                .with_found(t));
        }

        self.reader.read()
    }
}

/// Binding strength of an infix operator token; the tree roots at the
/// loosest (largest) one. A `:` never roots - its `?` does.
fn op_precedence(tok: &Token) -> i32 {
    if tok.kind == TokenKind::Colon {
        -66
    } else if tok.kind == TokenKind::QuestionMark {
        OperatorId::Conditional.precedence()
    } else {
        OperatorId::from_token(tok.kind, OperatorPosition::Infix)
            .map(OperatorId::precedence)
            .unwrap_or(-66)
    }
}

fn build_expression(operands: &[Expr], operators: &[Token]) -> Result<Expr, SyntaxError> {
    if operators.is_empty() {
        debug_assert_eq!(operands.len(), 1);
        return Ok(operands[0].clone());
    }

    let mut index = 0;
    let mut preced = op_precedence(&operators[0]);
    for (i, op) in operators.iter().enumerate().skip(1) {
        let p = op_precedence(op);
        if p > preced {
            index = i;
            preced = p;
        } else if p == preced && associativity(preced) == Associativity::LeftToRight {
            index = i;
        }
    }

    if operators[index].kind == TokenKind::QuestionMark {
        let condition = build_expression(&operands[..=index], &operators[..index])?;

        let mut colon_index = None;
        for j in (index + 1..operators.len()).rev() {
            if operators[j].kind == TokenKind::Colon {
                colon_index = Some(j);
                break;
            }
        }

        let Some(colon_index) = colon_index else {
            return Err(SyntaxError::new(
                ParserError::MissingConditionalColon,
                operators[index].span.start(),
            ));
        };

        let on_true = build_expression(
            &operands[index + 1..=colon_index],
            &operators[index + 1..colon_index],
        )?;
        let on_false =
            build_expression(&operands[colon_index + 1..], &operators[colon_index + 1..])?;

        Ok(Expr::Conditional(Box::new(ConditionalExpr {
            condition,
            question_mark: operators[index],
            on_true,
            colon: operators[colon_index],
            on_false,
        })))
    } else {
        let lhs = build_expression(&operands[..=index], &operators[..index])?;
        let rhs = build_expression(&operands[index + 1..], &operators[index + 1..])?;

        Ok(Expr::Operation(Box::new(Operation {
            op: operators[index],
            arg1: lhs,
            arg2: Some(rhs),
            postfix: false,
        })))
    }
}

pub struct ExpressionListParser<'s> {
    reader: TokenReader<'s>,
}

impl<'s> ExpressionListParser<'s> {
    pub fn new(reader: TokenReader<'s>) -> Self {
        Self { reader }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    /// Parses a comma-separated list of expressions until the fragment ends.
    pub fn parse(&mut self) -> Result<Vec<Expr>, SyntaxError> {
        let mut result = Vec::new();

        while !self.reader.at_end() {
            let mut expr_parser =
                ExpressionParser::new(self.reader.next(FragmentKind::ListElement)?);
            result.push(expr_parser.parse()?);

            if !self.reader.at_end() {
                self.reader.read()?;
            }
        }

        Ok(result)
    }
}

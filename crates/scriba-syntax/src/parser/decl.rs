//! Declaration parsing.
//!
//! `T x(…)` is ambiguous between a variable initialized by constructor call
//! and a function declaration; the parser builds both interpretations
//! concurrently and lets the first disambiguating token commit. Inside a
//! class body the same machinery also recognizes constructors, destructors
//! and cast operators from the leading tokens.

use std::rc::Rc;

use crate::ast::{
    Attribute, CtorInitArgs, Decl, Expr, FunctionDecl, FunctionDeclKind, Identifier,
    MemberInitialization, QualifiedType, VariableDecl, VariableInit,
};
use crate::errors::{ParserError, SyntaxError};
use crate::fragment::FragmentKind;
use crate::reader::TokenReader;
use crate::token::{Token, TokenKind};

use super::attribute::AttributeParser;
use super::expr::{ExpressionListParser, ExpressionParser};
use super::identifier::{IdentifierOptions, IdentifierParser};
use super::program::ProgramParser;
use super::types::{FunctionParamParser, TypeParser};

/// What the declaration parser has committed to so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Decision {
    Undecided,
    NotADecl,
    ParsingVariable,
    ParsingFunction,
    ParsingConstructor,
    ParsingDestructor,
    ParsingCastDecl,
}

pub struct DeclParser<'s> {
    reader: TokenReader<'s>,
    decision: Decision,
    /// Name of the enclosing class when parsing a member declaration.
    class_name: Option<Identifier>,
    params_already_read: bool,
    declarator_options: IdentifierOptions,

    attribute: Option<Attribute>,
    static_kw: Option<Token>,
    virtual_kw: Option<Token>,
    explicit_kw: Option<Token>,
    var_type: QualifiedType,
    name: Option<Identifier>,

    /// Function interpretation under construction.
    func: Option<FunctionDecl>,
    /// Variable-initializer interpretation under construction.
    var_init: Option<VariableInit>,
    /// Whether the variable interpretation is still alive.
    var_possible: bool,
}

impl<'s> DeclParser<'s> {
    pub fn new(reader: TokenReader<'s>, class_name: Option<Identifier>) -> Self {
        Self {
            reader,
            decision: Decision::Undecided,
            class_name,
            params_already_read: false,
            declarator_options: IdentifierOptions {
                template_id: false,
                qualified_id: false,
                operator_name: true,
            },
            attribute: None,
            static_kw: None,
            virtual_kw: None,
            explicit_kw: None,
            var_type: QualifiedType::default(),
            name: None,
            func: None,
            var_init: None,
            var_possible: true,
        }
    }

    pub fn pos(&self) -> usize {
        self.reader.pos()
    }

    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Overrides which identifier shapes the declarator may use; template
    /// declarations allow template-ids so specializations parse.
    pub fn set_declarator_options(&mut self, options: IdentifierOptions) {
        self.declarator_options = options;
    }

    fn is_parsing_function(&self) -> bool {
        self.decision >= Decision::ParsingFunction
    }

    fn is_parsing_member(&self) -> bool {
        self.class_name.is_some()
    }

    fn func_mut(&mut self) -> &mut FunctionDecl {
        self.func.as_mut().expect("function interpretation is alive")
    }

    /// Forces a decision from the outside (for-init or template contexts).
    pub fn set_decision(&mut self, decision: Decision) {
        debug_assert_eq!(self.decision, Decision::Undecided);

        self.decision = decision;
        if decision == Decision::ParsingVariable {
            self.func = None;
        } else if self.is_parsing_function() {
            self.var_possible = false;
            if self.func.is_none() {
                let name = self.name.clone().expect("declarator was read");
                let mut func = FunctionDecl::new(name);
                func.return_type = self.var_type.clone();
                func.static_keyword = self.static_kw;
                func.virtual_keyword = self.virtual_kw;
                self.func = Some(func);
            }
        }
    }

    // -- Detection ----------------------------------------------------------

    /// Reads the prefix of the fragment and decides whether a declaration
    /// starts here. Returns false when the tokens form an expression instead.
    pub fn detect_decl(&mut self) -> Result<bool, SyntaxError> {
        self.read_optional_attribute()?;
        self.read_optional_decl_specifiers()?;

        if self.detect_before_reading_type_specifier()? {
            return Ok(true);
        }

        if !self.read_type_specifier()? {
            return Ok(false);
        }

        if self.detect_before_reading_declarator()? {
            return Ok(true);
        }

        if !self.read_declarator()? {
            return Ok(false);
        }

        self.detect_from_declarator();

        if self.reader.at(TokenKind::Semicolon) {
            self.decision = Decision::ParsingVariable;
        }

        Ok(true)
    }

    fn read_optional_attribute(&mut self) -> Result<(), SyntaxError> {
        let mut parser = AttributeParser::new(self.reader.subfragment());
        if parser.ready() {
            self.attribute = Some(parser.parse()?);
            self.reader.seek(parser.pos());
        }
        Ok(())
    }

    fn read_optional_decl_specifiers(&mut self) -> Result<(), SyntaxError> {
        if self.reader.at(TokenKind::Virtual) {
            let kw = self.reader.read()?;
            if !self.is_parsing_member() {
                return Err(SyntaxError::new(ParserError::IllegalUseOfKeyword, kw.span.start())
                    .with_found(kw));
            }
            self.virtual_kw = Some(kw);
        }

        if self.reader.at(TokenKind::Static) {
            self.static_kw = Some(self.reader.read()?);
        }

        if self.reader.at(TokenKind::Explicit) {
            let kw = self.reader.read()?;
            if !self.is_parsing_member() {
                return Err(SyntaxError::new(ParserError::IllegalUseOfKeyword, kw.span.start())
                    .with_found(kw));
            }
            self.explicit_kw = Some(kw);
        }

        Ok(())
    }

    fn detect_before_reading_type_specifier(&mut self) -> Result<bool, SyntaxError> {
        if !self.is_parsing_member() {
            return Ok(false);
        }
        Ok(self.detect_dtor_decl()? || self.detect_cast_decl()? || self.detect_ctor_decl()?)
    }

    fn read_type_specifier(&mut self) -> Result<bool, SyntaxError> {
        let mut type_parser = TypeParser::new(self.reader.subfragment());
        match type_parser.parse() {
            Ok(t) => {
                self.var_type = t;
                self.reader.seek(type_parser.pos());
                Ok(true)
            }
            Err(err) => {
                if self.decision != Decision::Undecided {
                    return Err(err);
                }
                self.decision = Decision::NotADecl;
                Ok(false)
            }
        }
    }

    /// Recognizes constructors whose tokens were misread as a type,
    /// e.g. `A(int, int) : a(0) { }` parsed as a function type `A(int, int)`.
    fn detect_before_reading_declarator(&mut self) -> Result<bool, SyntaxError> {
        if !self.is_parsing_member() {
            return Ok(false);
        }

        if self.var_type.function_type.is_some()
            && (self.reader.at(TokenKind::Colon)
                || self.reader.at(TokenKind::LeftBrace)
                || self.reader.at(TokenKind::Eq))
        {
            let ft = self.var_type.function_type.as_ref().expect("checked above");
            if ft.return_type.is_simple()
                && self.is_class_name(ft.return_type.name.as_ref().expect("simple type has a name"))
            {
                let ft = self.var_type.function_type.take().expect("checked above");
                let name = ft.return_type.name.clone().expect("simple type has a name");

                let mut ctor = FunctionDecl::new(name);
                ctor.kind = FunctionDeclKind::Constructor {
                    member_initializations: Vec::new(),
                };
                ctor.attribute = self.attribute.take();
                for p in &ft.params {
                    ctor.params.push(crate::ast::FunctionParameter {
                        param_type: p.clone(),
                        name: None,
                        default_value: None,
                    });
                }

                self.decision = Decision::ParsingConstructor;
                self.func = Some(ctor);
                self.params_already_read = true;
                self.var_type = QualifiedType::default();
                return Ok(true);
            }
        } else if self.reader.at(TokenKind::LeftPar)
            && self.var_type.is_simple()
            && self.is_class_name(self.var_type.name.as_ref().expect("simple type has a name"))
        {
            let name = self.var_type.name.take().expect("checked above");

            let mut ctor = FunctionDecl::new(name);
            ctor.kind = FunctionDeclKind::Constructor {
                member_initializations: Vec::new(),
            };
            ctor.attribute = self.attribute.take();

            self.decision = Decision::ParsingConstructor;
            self.func = Some(ctor);
            self.var_type = QualifiedType::default();
            return Ok(true);
        }

        Ok(false)
    }

    fn read_declarator(&mut self) -> Result<bool, SyntaxError> {
        let mut id_parser =
            IdentifierParser::with_options(self.reader.subfragment(), self.declarator_options);

        if self.decision != Decision::Undecided {
            self.name = Some(id_parser.parse()?);
            self.reader.seek(id_parser.pos());
            return Ok(true);
        }

        if !id_parser.look_ahead() {
            self.decision = Decision::NotADecl;
            return Ok(false);
        }

        match id_parser.parse() {
            Ok(name) => {
                self.name = Some(name);
                self.reader.seek(id_parser.pos());
                Ok(true)
            }
            Err(_) => {
                self.decision = Decision::NotADecl;
                Ok(false)
            }
        }
    }

    fn detect_from_declarator(&mut self) {
        let name = self.name.as_ref().expect("declarator was read");

        match name {
            Identifier::Operator(_) | Identifier::LiteralOperator(_) => {
                let mut overload = FunctionDecl::new(name.clone());
                overload.kind = FunctionDeclKind::OperatorOverload;
                overload.return_type = self.var_type.clone();
                overload.attribute = self.attribute.take();
                self.decision = Decision::ParsingFunction;
                self.func = Some(overload);
                self.var_possible = false;
            }
            _ if self.virtual_kw.is_some() => {
                let mut func = FunctionDecl::new(name.clone());
                func.attribute = self.attribute.take();
                func.return_type = self.var_type.clone();
                func.virtual_keyword = self.virtual_kw;
                self.decision = Decision::ParsingFunction;
                self.func = Some(func);
                self.var_possible = false;
            }
            _ => {}
        }
    }

    fn detect_ctor_decl(&mut self) -> Result<bool, SyntaxError> {
        if self.explicit_kw.is_none() {
            return Ok(false);
        }

        let save_point = self.reader.pos();
        let mut id_parser = IdentifierParser::new(self.reader.subfragment());

        let name = match id_parser.parse() {
            Ok(name) => name,
            Err(_) => {
                self.reader.seek(save_point);
                return Ok(false);
            }
        };

        if !self.is_class_name(&name) {
            self.reader.seek(save_point);
            return Ok(false);
        }

        self.reader.seek(id_parser.pos());

        if !self.reader.at(TokenKind::LeftPar) {
            self.reader.seek(save_point);
            return Ok(false);
        }

        let mut ctor = FunctionDecl::new(name);
        ctor.kind = FunctionDeclKind::Constructor {
            member_initializations: Vec::new(),
        };
        ctor.explicit_keyword = self.explicit_kw;

        self.decision = Decision::ParsingConstructor;
        self.func = Some(ctor);
        Ok(true)
    }

    fn detect_dtor_decl(&mut self) -> Result<bool, SyntaxError> {
        if !self.reader.at(TokenKind::Tilde) {
            return Ok(false);
        }

        let tilde = self.reader.read()?;

        let mut id_parser = IdentifierParser::with_options(
            self.reader.subfragment(),
            IdentifierOptions {
                template_id: true,
                qualified_id: false,
                operator_name: false,
            },
        );
        let name = id_parser.parse()?;
        self.reader.seek(id_parser.pos());

        if !self.is_class_name(&name) {
            return Err(SyntaxError::new(
                ParserError::ExpectedCurrentClassName,
                name.span().start(),
            ));
        }

        let mut dtor = FunctionDecl::new(name);
        dtor.kind = FunctionDeclKind::Destructor { tilde };
        dtor.virtual_keyword = self.virtual_kw;

        self.decision = Decision::ParsingDestructor;
        self.func = Some(dtor);
        Ok(true)
    }

    fn detect_cast_decl(&mut self) -> Result<bool, SyntaxError> {
        if !self.reader.at(TokenKind::Operator) {
            return Ok(false);
        }

        let save_point = self.reader.pos();
        let operator_keyword = self.reader.read()?;

        let mut type_parser = TypeParser::new(self.reader.subfragment());
        // A cast to a function type would be ambiguous with the parameter
        // list; people should use a typedef in that situation.
        type_parser.set_read_function_signature(false);

        let target_type = match type_parser.parse() {
            Ok(t) => t,
            Err(_) => {
                if self.explicit_kw.is_some() {
                    return Err(self.reader.syntax_err(ParserError::CouldNotReadType));
                }
                self.reader.seek(save_point);
                return Ok(false);
            }
        };
        self.reader.seek(type_parser.pos());

        let mut cast = FunctionDecl::new(Identifier::Simple(crate::ast::SimpleIdentifier {
            name: operator_keyword,
        }));
        cast.kind = FunctionDeclKind::Cast { operator_keyword };
        cast.return_type = target_type;
        cast.explicit_keyword = self.explicit_kw;

        self.decision = Decision::ParsingCastDecl;
        self.func = Some(cast);
        Ok(true)
    }

    fn is_class_name(&self, name: &Identifier) -> bool {
        let Some(simple) = name.as_simple() else {
            return false;
        };
        let source = self.reader.source();
        let name_text = crate::token::token_text(source, &simple.name);

        match &self.class_name {
            Some(Identifier::Simple(class)) => {
                crate::token::token_text(source, &class.name) == name_text
            }
            Some(Identifier::Template(class)) => {
                crate::token::token_text(source, &class.name) == name_text
            }
            _ => false,
        }
    }

    // -- Parsing ------------------------------------------------------------

    pub fn parse(&mut self) -> Result<Decl, SyntaxError> {
        debug_assert_ne!(self.decision, Decision::NotADecl);

        match self.decision {
            Decision::ParsingDestructor => return self.parse_destructor(),
            Decision::ParsingConstructor => return self.parse_constructor(),
            Decision::ParsingCastDecl | Decision::ParsingFunction => {
                return self.parse_function_decl();
            }
            Decision::ParsingVariable => return self.parse_var_decl(),
            _ => {}
        }

        debug_assert_eq!(self.decision, Decision::Undecided);

        let t = self.reader.peek()?;
        match t.kind {
            TokenKind::LeftBrace | TokenKind::Eq => {
                self.decision = Decision::ParsingVariable;
                return self.parse_var_decl();
            }
            TokenKind::LeftPar => {
                let name = self.name.clone().expect("declarator was read");
                let mut func = FunctionDecl::new(name);
                func.attribute = self.attribute.take();
                func.return_type = self.var_type.clone();
                func.static_keyword = self.static_kw;
                func.virtual_keyword = self.virtual_kw;
                self.func = Some(func);
            }
            _ => {
                return Err(self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::Invalid));
            }
        }

        self.read_args_or_params()?;
        self.read_optional_const()?;

        if self.read_optional_delete_specifier()?
            || self.read_optional_default_specifier()?
            || (self.is_parsing_member() && self.read_optional_virtual_pure_specifier()?)
        {
            return Ok(self.take_function());
        }

        let t = self.reader.peek()?;
        if t.kind == TokenKind::LeftBrace {
            if self.decision == Decision::ParsingVariable {
                return Err(self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::Invalid));
            }

            self.decision = Decision::ParsingFunction;
            self.var_possible = false;
            let body = self.read_function_body()?;
            self.func_mut().body = Some(body);
            return Ok(self.take_function());
        } else if t.kind == TokenKind::Semicolon {
            if self.decision == Decision::ParsingFunction {
                return Err(self
                    .reader
                    .syntax_err(ParserError::UnexpectedToken)
                    .with_found(t)
                    .with_expected(TokenKind::LeftBrace));
            }

            let semicolon = self.reader.read()?;
            return Ok(self.take_variable(Some(semicolon))?);
        }

        Err(self
            .reader
            .syntax_err(ParserError::UnexpectedToken)
            .with_found(t)
            .with_expected(TokenKind::Invalid))
    }

    fn take_function(&mut self) -> Decl {
        let func = self.func.take().expect("function interpretation is alive");
        Decl::Function(Rc::new(func))
    }

    fn take_variable(&mut self, semicolon: Option<Token>) -> Result<Decl, SyntaxError> {
        let name = self.name.clone().expect("declarator was read");
        let Some(simple) = name.as_simple() else {
            return Err(SyntaxError::new(
                ParserError::ExpectedUserDefinedName,
                name.span().start(),
            ));
        };

        Ok(Decl::Variable(Rc::new(VariableDecl {
            attribute: self.attribute.take(),
            static_specifier: self.static_kw,
            var_type: std::mem::take(&mut self.var_type),
            name: simple.name,
            init: self.var_init.take(),
            semicolon,
        })))
    }

    fn parse_var_decl(&mut self) -> Result<Decl, SyntaxError> {
        let t = self.reader.peek()?;

        match t.kind {
            TokenKind::Eq => {
                let eq = self.reader.read()?;
                let mut expr_parser =
                    ExpressionParser::new(self.reader.subfragment_of(FragmentKind::Statement)?);
                let value = expr_parser.parse()?;
                self.reader.seek(expr_parser.pos());
                self.var_init = Some(VariableInit::Assignment { eq, value });
            }
            TokenKind::LeftBrace => {
                let brace_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                let left_brace = self.reader.read()?;
                let mut args_parser = ExpressionListParser::new(brace_reader);
                let args = args_parser.parse()?;
                self.reader.seek(args_parser.pos());
                self.reader.read_kind(TokenKind::RightBrace)?;
                self.var_init = Some(VariableInit::Brace { left_brace, args });
            }
            TokenKind::LeftPar => {
                let par_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                let left_par = self.reader.read()?;
                let mut args_parser = ExpressionListParser::new(par_reader);
                let args = args_parser.parse()?;
                self.reader.seek(args_parser.pos());
                self.reader.read_kind(TokenKind::RightPar)?;
                self.var_init = Some(VariableInit::Constructor { left_par, args });
            }
            _ => {}
        }

        let semicolon = self.reader.read_kind(TokenKind::Semicolon)?;
        self.take_variable(Some(semicolon))
    }

    fn parse_function_decl(&mut self) -> Result<Decl, SyntaxError> {
        debug_assert!(self.is_parsing_function());

        self.read_params()?;
        self.read_optional_const()?;

        if self.read_optional_delete_specifier()?
            || self.read_optional_default_specifier()?
            || (self.is_parsing_member() && self.read_optional_virtual_pure_specifier()?)
        {
            return Ok(self.take_function());
        }

        let body = self.read_function_body()?;
        self.func_mut().body = Some(body);
        Ok(self.take_function())
    }

    fn parse_constructor(&mut self) -> Result<Decl, SyntaxError> {
        if !self.params_already_read {
            self.read_params()?;
        }

        self.read_optional_member_initializers()?;

        if self.read_optional_delete_specifier()? || self.read_optional_default_specifier()? {
            return Ok(self.take_function());
        }

        let body = self.read_function_body()?;
        self.func_mut().body = Some(body);
        Ok(self.take_function())
    }

    fn read_optional_member_initializers(&mut self) -> Result<(), SyntaxError> {
        if !self.reader.at(TokenKind::Colon) {
            return Ok(());
        }

        self.reader.read()?;
        let mut initializers = Vec::new();

        loop {
            let mut id_parser = IdentifierParser::with_options(
                self.reader.subfragment(),
                IdentifierOptions {
                    template_id: true,
                    qualified_id: false,
                    operator_name: false,
                },
            );
            let id = id_parser.parse()?;
            self.reader.seek(id_parser.pos());

            if self.reader.at(TokenKind::LeftBrace) {
                let brace_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                self.reader.read()?;
                let mut args_parser = ExpressionListParser::new(brace_reader);
                let args = args_parser.parse()?;
                self.reader.seek(args_parser.pos());
                self.reader.read_kind(TokenKind::RightBrace)?;
                initializers.push(MemberInitialization {
                    name: id,
                    init: CtorInitArgs::Brace(args),
                });
            } else if self.reader.at(TokenKind::LeftPar) {
                let par_reader = self.reader.subfragment_of(FragmentKind::DelimiterPair)?;
                self.reader.read()?;
                let mut args_parser = ExpressionListParser::new(par_reader);
                let args = args_parser.parse()?;
                self.reader.seek(args_parser.pos());
                self.reader.read_kind(TokenKind::RightPar)?;
                initializers.push(MemberInitialization {
                    name: id,
                    init: CtorInitArgs::Paren(args),
                });
            }

            if self.reader.at(TokenKind::LeftBrace) {
                break;
            }

            self.reader.read_kind(TokenKind::Comma)?;
        }

        if let FunctionDeclKind::Constructor {
            member_initializations,
        } = &mut self.func_mut().kind
        {
            *member_initializations = initializers;
        }

        Ok(())
    }

    fn parse_destructor(&mut self) -> Result<Decl, SyntaxError> {
        self.reader.read_kind(TokenKind::LeftPar)?;
        self.reader.read_kind(TokenKind::RightPar)?;

        if self.read_optional_delete_specifier()? || self.read_optional_default_specifier()? {
            return Ok(self.take_function());
        }

        let body = self.read_function_body()?;
        self.func_mut().body = Some(body);
        Ok(self.take_function())
    }

    fn read_params(&mut self) -> Result<(), SyntaxError> {
        let mut parameters = self.reader.next(FragmentKind::DelimiterPair)?;

        while !parameters.at_end() {
            let mut param_parser =
                FunctionParamParser::new(parameters.next(FragmentKind::ListElement)?);
            let param = param_parser.parse()?;
            self.func_mut().params.push(param);

            if !parameters.at_end() {
                parameters.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.read_kind(TokenKind::RightPar)?;
        Ok(())
    }

    /// Reads `(…)` as a call-argument list and a parameter list at once,
    /// keeping whichever interpretations survive.
    fn read_args_or_params(&mut self) -> Result<(), SyntaxError> {
        let left_par = self.reader.peek()?;
        debug_assert_eq!(left_par.kind, TokenKind::LeftPar);

        let mut args_or_params = self.reader.next(FragmentKind::DelimiterPair)?;

        let mut var_args: Option<Vec<Expr>> = if matches!(
            self.decision,
            Decision::Undecided | Decision::ParsingVariable
        ) && self.var_possible
        {
            Some(Vec::new())
        } else {
            None
        };

        while !args_or_params.at_end() {
            let elem_reader = args_or_params.next(FragmentKind::ListElement)?;

            if let Some(args) = &mut var_args {
                let mut expr_parser = ExpressionParser::new(elem_reader);
                match expr_parser.parse() {
                    Ok(expr) => args.push(expr),
                    Err(err) => {
                        if self.decision == Decision::ParsingVariable {
                            return Err(err);
                        }
                        self.decision = Decision::ParsingFunction;
                        var_args = None;
                        self.var_possible = false;
                    }
                }
            }

            if self.decision == Decision::Undecided || self.is_parsing_function() {
                let mut param_parser = FunctionParamParser::new(elem_reader);
                match param_parser.parse() {
                    Ok(param) => self.func_mut().params.push(param),
                    Err(err) => {
                        if self.is_parsing_function() {
                            return Err(err);
                        }
                        self.decision = Decision::ParsingVariable;
                        self.func = None;
                    }
                }
            }

            if !args_or_params.at_end() {
                args_or_params.read_kind(TokenKind::Comma)?;
            }
        }

        self.reader.read_kind(TokenKind::RightPar)?;

        if let Some(args) = var_args {
            self.var_init = Some(VariableInit::Constructor { left_par, args });
        }

        Ok(())
    }

    fn read_optional_const(&mut self) -> Result<bool, SyntaxError> {
        if !self.reader.at(TokenKind::Const) {
            return Ok(false);
        }

        let t = self.reader.peek()?;
        if self.decision == Decision::ParsingVariable {
            return Err(self
                .reader
                .syntax_err(ParserError::UnexpectedToken)
                .with_found(t)
                .with_expected(TokenKind::Invalid));
        }

        self.decision = Decision::ParsingFunction;
        self.var_possible = false;
        let kw = self.reader.read()?;
        self.func_mut().const_qualifier = Some(kw);
        Ok(true)
    }

    /// Shared machinery of `= delete;`, `= default;` and `= 0;`.
    fn read_optional_specifier(
        &mut self,
        kind: TokenKind,
    ) -> Result<Option<(Token, Token)>, SyntaxError> {
        if self.decision == Decision::ParsingVariable || self.func.is_none() {
            return Ok(None);
        }

        if !self.reader.at(TokenKind::Eq) {
            return Ok(None);
        }

        let save_point = self.reader.pos();
        let eq = self.reader.read()?;

        if self.reader.at_end() {
            return Err(self.reader.syntax_err(ParserError::UnexpectedEndOfInput));
        }

        if !self.reader.at(kind) {
            self.reader.seek(save_point);
            return Ok(None);
        }

        let spec = self.reader.read()?;

        self.decision = if self.decision == Decision::Undecided {
            Decision::ParsingFunction
        } else {
            self.decision
        };
        self.var_possible = false;

        self.reader.read_kind(TokenKind::Semicolon)?;
        Ok(Some((eq, spec)))
    }

    fn read_optional_delete_specifier(&mut self) -> Result<bool, SyntaxError> {
        match self.read_optional_specifier(TokenKind::Delete)? {
            Some((eq, kw)) => {
                let func = self.func_mut();
                func.equal_sign = Some(eq);
                func.delete_keyword = Some(kw);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read_optional_default_specifier(&mut self) -> Result<bool, SyntaxError> {
        match self.read_optional_specifier(TokenKind::Default)? {
            Some((eq, kw)) => {
                let func = self.func_mut();
                func.equal_sign = Some(eq);
                func.default_keyword = Some(kw);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read_optional_virtual_pure_specifier(&mut self) -> Result<bool, SyntaxError> {
        // `0` lexes as an octal literal.
        match self.read_optional_specifier(TokenKind::OctalLiteral)? {
            Some((eq, zero)) => {
                if self.reader.text(&zero) != "0" {
                    return Err(SyntaxError::new(ParserError::UnexpectedToken, zero.span.start())
                        .with_found(zero)
                        .with_expected(TokenKind::OctalLiteral));
                }
                let func = self.func_mut();
                func.equal_sign = Some(eq);
                func.virtual_pure = Some(zero);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn read_function_body(&mut self) -> Result<crate::ast::CompoundStatement, SyntaxError> {
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
        Ok(body)
    }
}

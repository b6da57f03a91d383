//! Expression compilation: AST expressions to typed IR.

use std::rc::Rc;

use scriba_syntax::ast;
use scriba_syntax::lexer::{split_user_defined_literal, unescape};
use scriba_syntax::operators::OperatorId;
use scriba_syntax::{TokenKind, token_text};

use crate::conversion::{Conversion, ConversionPolicy};
use crate::error::{CompilationFailure, CompilerError};
use crate::initialization::Initialization;
use crate::lookup::{LookupContext, NameLookup, NameResolution, parse_integer_literal};
use crate::program;
use crate::symbols::{AccessSpecifier, ClassId, FunctionId, TemplateKind};
use crate::types::Type;
use crate::value::Value;

use super::function::FunctionCompiler;

impl FunctionCompiler<'_> {
    pub(crate) fn lookup_ctx(&mut self) -> LookupContext<'_> {
        LookupContext {
            engine: &mut *self.engine,
            scopes: &mut *self.scopes,
            source: self.source,
            tnp: &mut *self.tnp,
        }
    }

    pub(crate) fn resolve_type(
        &mut self,
        qt: &ast::QualifiedType,
    ) -> Result<Type, CompilationFailure> {
        let scope = self.scope;
        let mut ctx = self.lookup_ctx();
        crate::lookup::resolve_type(&mut ctx, qt, scope)
    }

    /// Resolves a name, checking frame-local bindings (locals, captures)
    /// before the scope chain.
    pub(crate) fn resolve_name(
        &mut self,
        id: &ast::Identifier,
    ) -> Result<NameResolution, CompilationFailure> {
        if let ast::Identifier::Simple(simple) = id
            && simple.name.kind == TokenKind::UserDefinedName
        {
            let name = token_text(self.source, &simple.name);

            if let Some(index) = self.stack.last_index_of(name) {
                let var = self.stack.at(index);
                return Ok(NameResolution::Local {
                    stack_index: var.index,
                    ty: var.ty,
                });
            }

            if let Some(pos) = self.captures.iter().position(|c| c.name == name) {
                let capture = &self.captures[pos];
                return Ok(NameResolution::Capture {
                    capture_index: pos,
                    ty: capture.ty,
                });
            }
        }

        let scope = self.scope;
        let mut ctx = self.lookup_ctx();
        NameLookup::resolve(&mut ctx, id, scope)
    }

    // -- Entry ---------------------------------------------------------------

    pub(crate) fn generate_expr(
        &mut self,
        expr: &ast::Expr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        match expr {
            ast::Expr::Literal(lit) => self.generate_literal(lit),
            ast::Expr::Id(id) => self.generate_identifier(id),
            ast::Expr::Operation(op) => self.generate_operation(op),
            ast::Expr::Conditional(cond) => self.generate_conditional(cond),
            ast::Expr::Call(call) => self.generate_call(call),
            ast::Expr::Subscript(sub) => self.generate_subscript(sub),
            ast::Expr::List(list) => self.generate_list(list),
            ast::Expr::Array(array) => self.generate_array(array),
            ast::Expr::Brace(brace) => self.generate_brace_construction(brace),
            ast::Expr::Lambda(lambda) => self.generate_lambda(lambda),
        }
    }

    /// Compiles an expression and converts it to `bool`.
    pub(crate) fn generate_condition(
        &mut self,
        expr: &ast::Expr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let value = self.generate_expr(expr)?;
        let conv = Conversion::compute(
            value.ty(),
            Type::BOOLEAN,
            self.engine,
            ConversionPolicy::NoExplicitConversions,
        );
        if conv.is_invalid() {
            return Err(self.failure(CompilerError::CouldNotConvert, expr.span()));
        }
        self.apply_conversion(value, &conv, expr.span())
    }

    // -- Literals ------------------------------------------------------------

    fn generate_literal(
        &mut self,
        lit: &ast::Literal,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let token = lit.token();
        let text = token_text(self.source, &token).to_owned();
        let span = token.span;

        let (value, ty) = match lit {
            ast::Literal::Bool(_) => (Value::Bool(text == "true"), Type::BOOLEAN),
            ast::Literal::Integer(_) => {
                let n = parse_integer_literal(&text)
                    .ok_or_else(|| self.failure(CompilerError::SyntaxError, span))?;
                (Value::Int(n), Type::INT)
            }
            ast::Literal::FloatingPoint(_) => {
                if let Some(stripped) = text.strip_suffix('f') {
                    let f: f32 = stripped
                        .parse()
                        .map_err(|_| self.failure(CompilerError::SyntaxError, span))?;
                    (Value::Float(f), Type::FLOAT)
                } else {
                    let d: f64 = text
                        .parse()
                        .map_err(|_| self.failure(CompilerError::SyntaxError, span))?;
                    (Value::Double(d), Type::DOUBLE)
                }
            }
            ast::Literal::Str(_) => {
                let body = unescape(&text[1..text.len() - 1]);
                if text.starts_with('\'') {
                    let mut chars = body.chars();
                    let (Some(c), None) = (chars.next(), chars.next()) else {
                        return Err(self.failure(CompilerError::InvalidCharacterLiteral, span));
                    };
                    (Value::Char(c), Type::CHAR)
                } else {
                    (Value::String(body), self.engine.string_type())
                }
            }
            ast::Literal::UserDefined(_) => return self.generate_user_defined_literal(&text, span),
        };

        Ok(Rc::new(program::Expression::Literal(program::Literal {
            value,
            ty,
        })))
    }

    /// `3.0km` - compile the literal part, then call the `km` operator.
    fn generate_user_defined_literal(
        &mut self,
        text: &str,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let (literal, suffix) = split_user_defined_literal(text);

        let (value, ty) = if literal.starts_with('"') {
            (
                Value::String(unescape(&literal[1..literal.len() - 1])),
                self.engine.string_type(),
            )
        } else if literal.contains('.') || literal.contains('e') || literal.contains('E') {
            let d: f64 = literal
                .parse()
                .map_err(|_| self.failure(CompilerError::SyntaxError, span))?;
            (Value::Double(d), Type::DOUBLE)
        } else {
            let n = parse_integer_literal(literal)
                .ok_or_else(|| self.failure(CompilerError::SyntaxError, span))?;
            (Value::Int(n), Type::INT)
        };

        let arg = Rc::new(program::Expression::Literal(program::Literal { value, ty }));

        let candidates =
            NameLookup::resolve_literal_operator(self.engine, self.scopes, suffix, self.scope);
        if candidates.is_empty() {
            return Err(self.failure(CompilerError::CouldNotFindValidLiteralOperator, span));
        }

        let args = vec![arg];
        let selected = crate::overload::resolve_overloads(self.engine, &candidates, &args)
            .ok_or_else(|| {
                self.failure(CompilerError::CouldNotFindValidLiteralOperator, span)
            })?;

        let converted = self.prepare_args(args, &selected, span)?;
        let ty = self
            .engine
            .function(selected.function)
            .prototype
            .return_type();
        Ok(Rc::new(program::Expression::FunctionCall(
            program::FunctionCall {
                function: selected.function,
                args: converted,
                ty,
            },
        )))
    }

    // -- Names ---------------------------------------------------------------

    fn generate_identifier(
        &mut self,
        id: &ast::Identifier,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let span = id.span();

        if let ast::Identifier::Simple(simple) = id
            && simple.name.kind == TokenKind::This
        {
            return self.generate_this(span);
        }

        match self.resolve_name(id)? {
            NameResolution::Local { stack_index, ty } => Ok(Rc::new(
                program::Expression::StackValue(program::StackValue { stack_index, ty }),
            )),
            NameResolution::Capture { capture_index, ty } => {
                let this = self.generate_this(span)?;
                Ok(Rc::new(program::Expression::CaptureAccess(
                    program::CaptureAccess {
                        object: this,
                        offset: capture_index,
                        ty,
                    },
                )))
            }
            NameResolution::DataMember { offset, ty } => {
                let this = self.generate_this(span)?;
                Ok(Rc::new(program::Expression::MemberAccess(
                    program::MemberAccess {
                        object: this,
                        offset,
                        ty,
                    },
                )))
            }
            NameResolution::StaticDataMember { class, name } => {
                let member = self.engine.class(class).static_data_members[&name].clone();
                Ok(Rc::new(program::Expression::FetchGlobal(
                    program::FetchGlobal {
                        script: member.script,
                        global_index: member.index,
                        ty: member.ty,
                    },
                )))
            }
            NameResolution::Global { script, index, ty } => Ok(Rc::new(
                program::Expression::FetchGlobal(program::FetchGlobal {
                    script,
                    global_index: index,
                    ty,
                }),
            )),
            NameResolution::EnumValue { enum_id, value } => {
                let ty = self.engine.enum_(enum_id).ty;
                Ok(Rc::new(program::Expression::Literal(program::Literal {
                    value: Value::EnumValue {
                        enum_type: ty,
                        value,
                    },
                    ty,
                })))
            }
            NameResolution::Constant(value) => {
                let ty = value.fundamental_type().unwrap_or(Type::INT);
                Ok(Rc::new(program::Expression::Literal(program::Literal {
                    value,
                    ty,
                })))
            }
            NameResolution::Function(functions) => {
                if functions.len() != 1 {
                    return Err(self.failure(CompilerError::AmbiguousFunctionName, span));
                }
                let function = functions[0];
                let prototype = self.engine.function(function).prototype.clone();
                let ty = self.engine.type_system_mut().function_type(prototype);
                Ok(Rc::new(program::Expression::Literal(program::Literal {
                    value: Value::Function(function),
                    ty,
                })))
            }
            NameResolution::Type(_) => {
                Err(self.failure(CompilerError::TypeNameInExpression, span))
            }
            NameResolution::Namespace(_) => {
                Err(self.failure(CompilerError::NamespaceNameInExpression, span))
            }
            NameResolution::Template(_) => {
                Err(self.failure(CompilerError::TemplateNamesAreNotExpressions, span))
            }
            NameResolution::Unknown => {
                Err(self.failure(CompilerError::InvalidTypeName, span))
            }
        }
    }

    // -- Operations ----------------------------------------------------------

    fn generate_operation(
        &mut self,
        op: &ast::Operation,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        if op.is_member_access() {
            return self.generate_member_access(op);
        }

        let span = op.op.span;

        // `lhs, rhs` is not an overloadable call.
        if op.op.kind == TokenKind::Comma
            && let Some(rhs) = &op.arg2
        {
            let lhs = self.generate_expr(&op.arg1)?;
            let rhs = self.generate_expr(rhs)?;
            return Ok(self.generate_comma(lhs, rhs));
        }

        // Short-circuit operators keep their special form on booleans.
        if let Some(rhs) = &op.arg2 {
            if op.op.kind == TokenKind::LogicalAnd || op.op.kind == TokenKind::LogicalOr {
                let lhs = self.generate_expr(&op.arg1)?;
                let rhs = self.generate_expr(rhs)?;
                if lhs.ty().base_type() == Type::BOOLEAN && rhs.ty().base_type() == Type::BOOLEAN {
                    return Ok(Rc::new(if op.op.kind == TokenKind::LogicalAnd {
                        program::Expression::LogicalAnd(program::LogicalAnd { lhs, rhs })
                    } else {
                        program::Expression::LogicalOr(program::LogicalOr { lhs, rhs })
                    }));
                }
                return self.generate_operator_call_from(
                    op.operator_id()
                        .ok_or_else(|| self.failure(CompilerError::CouldNotResolveOperatorName, span))?,
                    vec![lhs, rhs],
                    span,
                );
            }
        }

        let operator = op
            .operator_id()
            .ok_or_else(|| self.failure(CompilerError::CouldNotResolveOperatorName, span))?;

        let mut args = vec![self.generate_expr(&op.arg1)?];
        if let Some(rhs) = &op.arg2 {
            args.push(self.generate_expr(rhs)?);
        }

        self.generate_operator_call_from(operator, args, span)
    }

    fn generate_operator_call_from(
        &mut self,
        operator: OperatorId,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let operand_types: Vec<Type> = args.iter().map(|a| a.ty()).collect();
        let candidates = NameLookup::resolve_operator(
            self.engine,
            self.scopes,
            operator,
            &operand_types,
            self.scope,
        );

        let selected = crate::overload::resolve_overloads(self.engine, &candidates, &args)
            .ok_or_else(|| self.failure(CompilerError::CouldNotFindValidOperator, span))?;

        self.emit_call(selected, args, span)
    }

    fn emit_call(
        &mut self,
        selected: crate::overload::Candidate,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        if self.engine.function(selected.function).flags.is_deleted {
            return Err(self.failure(CompilerError::CallToDeletedFunction, span));
        }

        let converted = self.prepare_args(args, &selected, span)?;
        let ty = self
            .engine
            .function(selected.function)
            .prototype
            .return_type();
        Ok(Rc::new(program::Expression::FunctionCall(
            program::FunctionCall {
                function: selected.function,
                args: converted,
                ty,
            },
        )))
    }

    // -- Member access -------------------------------------------------------

    fn generate_member_access(
        &mut self,
        op: &ast::Operation,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let object = self.generate_expr(&op.arg1)?;
        let span = op.op.span;

        let Some(member_id) = op.arg2.as_ref().and_then(|e| e.as_identifier()) else {
            return Err(self.failure(CompilerError::NoSuchMember, span));
        };
        let name = member_id.name_text(self.source);

        let Some(class_id) = self.engine.type_system().get_class(object.ty().base_type())
        else {
            return Err(self.failure(CompilerError::CannotAccessMemberOfNonObject, span));
        };

        self.generate_member_access_on(object, class_id, name, member_id.span())
    }

    fn generate_member_access_on(
        &mut self,
        object: Rc<program::Expression>,
        class_id: ClassId,
        name: &str,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let mut current = Some(class_id);
        while let Some(c) = current {
            let data = self.engine.class(c);
            if let Some(pos) = data.data_member_index(name) {
                let member = data.data_members[pos].clone();
                let offset = NameLookup::data_member_base_offset(self.engine, c) + pos;
                self.check_access(member.access, c, span)?;
                return Ok(Rc::new(program::Expression::MemberAccess(
                    program::MemberAccess {
                        object,
                        offset,
                        ty: member.ty,
                    },
                )));
            }
            if let Some(member) = data.static_data_members.get(name) {
                let member = member.clone();
                self.check_access(member.access, c, span)?;
                return Ok(Rc::new(program::Expression::FetchGlobal(
                    program::FetchGlobal {
                        script: member.script,
                        global_index: member.index,
                        ty: member.ty,
                    },
                )));
            }
            current = data.parent;
        }

        Err(self.failure(CompilerError::NoSuchMember, span))
    }

    /// Access control for class members.
    pub(crate) fn check_access(
        &self,
        access: AccessSpecifier,
        owner: ClassId,
        span: rowan::TextRange,
    ) -> Result<(), CompilationFailure> {
        let allowed = match access {
            AccessSpecifier::Public => true,
            AccessSpecifier::Private => match self.class {
                Some(current) => {
                    current == owner || self.engine.class(owner).friends.contains(&current)
                }
                None => false,
            },
            AccessSpecifier::Protected => match self.class {
                Some(current) => {
                    self.engine.derived_to_base_depth(current, owner).is_some()
                        || self.engine.class(owner).friends.contains(&current)
                }
                None => false,
            },
        };

        if allowed {
            Ok(())
        } else {
            Err(self.failure(CompilerError::InaccessibleMember, span))
        }
    }

    // -- Conditionals --------------------------------------------------------

    fn generate_conditional(
        &mut self,
        cond: &ast::ConditionalExpr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let condition = self.generate_condition(&cond.condition)?;
        let on_true = self.generate_expr(&cond.on_true)?;
        let on_false = self.generate_expr(&cond.on_false)?;

        let t1 = on_true.ty();
        let t2 = on_false.ty();

        // The common type is whichever direction converts best; on a tie the
        // true branch's type wins.
        let to_t1 = Conversion::compute(t2, t1.base_type(), self.engine, ConversionPolicy::NoExplicitConversions);
        let to_t2 = Conversion::compute(t1, t2.base_type(), self.engine, ConversionPolicy::NoExplicitConversions);

        let (common, on_true, on_false) = if !to_t1.is_invalid()
            && (to_t2.is_invalid() || to_t1.rank() <= to_t2.rank())
        {
            let converted = self.apply_conversion(on_false, &to_t1, cond.on_false.span())?;
            (t1.base_type(), on_true, converted)
        } else if !to_t2.is_invalid() {
            let converted = self.apply_conversion(on_true, &to_t2, cond.on_true.span())?;
            (t2.base_type(), converted, on_false)
        } else {
            return Err(self.failure(
                CompilerError::CouldNotFindCommonType,
                cond.question_mark.span,
            ));
        };

        Ok(Rc::new(program::Expression::Conditional(
            program::Conditional {
                condition,
                on_true,
                on_false,
                ty: common,
            },
        )))
    }

    // -- Calls ---------------------------------------------------------------

    fn generate_call(
        &mut self,
        call: &ast::FunctionCall,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let span = call.left_par.span;

        let mut args = Vec::with_capacity(call.args.len());
        for arg in &call.args {
            args.push(self.generate_expr(arg)?);
        }

        // Method call: `object.name(args)`.
        if let ast::Expr::Operation(op) = &call.callee
            && op.is_member_access()
        {
            let object = self.generate_expr(&op.arg1)?;
            let Some(member_id) = op.arg2.as_ref().and_then(|e| e.as_identifier()) else {
                return Err(self.failure(CompilerError::NoSuchMember, span));
            };
            let name = member_id.name_text(self.source).to_owned();
            return self.generate_method_call(object, &name, args, span);
        }

        // Named callee.
        if let ast::Expr::Id(id) = &call.callee {
            return self.generate_named_call(id, args, span);
        }

        // Arbitrary callee expression.
        let callee = self.generate_expr(&call.callee)?;
        self.generate_value_call(callee, args, span)
    }

    fn generate_named_call(
        &mut self,
        id: &ast::Identifier,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        match self.resolve_name(id)? {
            NameResolution::Function(candidates) => {
                // Inside a member function an unqualified method call goes
                // through the implicit object.
                let has_member_candidate = candidates
                    .iter()
                    .any(|&f| self.engine.function(f).has_implicit_object());

                let selected = if has_member_candidate && self.class.is_some() {
                    let this = self.generate_this(span)?;
                    let object_type = this.ty();
                    let selected = crate::overload::resolve_member_overloads(
                        self.engine,
                        &candidates,
                        object_type,
                        &args,
                    )
                    .ok_or_else(|| self.failure(CompilerError::NoSuchCallee, span))?;

                    if self.engine.function(selected.function).has_implicit_object() {
                        let mut full_args = vec![this];
                        full_args.extend(args);
                        return self.emit_possibly_virtual_call(selected, full_args, span);
                    }
                    selected
                } else {
                    crate::overload::resolve_overloads(self.engine, &candidates, &args)
                        .ok_or_else(|| self.failure(CompilerError::NoSuchCallee, span))?
                };

                self.emit_call(selected, args, span)
            }
            NameResolution::Type(t) => {
                // `T(args)` constructs a value.
                self.construct(t, args, span)
            }
            NameResolution::Template(template) => {
                let arg_types: Vec<Type> = args.iter().map(|a| a.ty()).collect();
                let function = self.instantiate_function_template_for_call(
                    template, &arg_types, span,
                )?;
                let selected =
                    crate::overload::resolve_overloads(self.engine, &[function], &args)
                        .ok_or_else(|| self.failure(CompilerError::NoSuchCallee, span))?;
                self.emit_call(selected, args, span)
            }
            NameResolution::Local { .. }
            | NameResolution::Global { .. }
            | NameResolution::Capture { .. }
            | NameResolution::DataMember { .. }
            | NameResolution::StaticDataMember { .. } => {
                let callee = self.generate_identifier(id)?;
                self.generate_value_call(callee, args, span)
            }
            _ => Err(self.failure(CompilerError::NoSuchCallee, span)),
        }
    }

    fn generate_method_call(
        &mut self,
        object: Rc<program::Expression>,
        name: &str,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let Some(class_id) = self.engine.type_system().get_class(object.ty().base_type())
        else {
            return Err(self.failure(CompilerError::CannotAccessMemberOfNonObject, span));
        };

        // Collect same-named methods along the class chain.
        let mut candidates: Vec<FunctionId> = Vec::new();
        let mut current = Some(class_id);
        while let Some(c) = current {
            for &m in &self.engine.class(c).methods {
                if self.engine.function(m).name() == Some(name) {
                    candidates.push(m);
                }
            }
            current = self.engine.class(c).parent;
        }

        if candidates.is_empty() {
            return Err(self.failure(CompilerError::NoSuchMember, span));
        }

        let selected = crate::overload::resolve_member_overloads(
            self.engine,
            &candidates,
            object.ty(),
            &args,
        )
        .ok_or_else(|| self.failure(CompilerError::CouldNotFindValidMemberFunction, span))?;

        let func = self.engine.function(selected.function);
        let owner = func.member_of().unwrap_or(class_id);
        let access = func.access;
        self.check_access(access, owner, span)?;

        if self.engine.function(selected.function).has_implicit_object() {
            let mut full_args = vec![object];
            full_args.extend(args);
            self.emit_possibly_virtual_call(selected, full_args, span)
        } else {
            self.emit_call(selected, args, span)
        }
    }

    /// Member calls dispatch through the vtable when the target is virtual.
    fn emit_possibly_virtual_call(
        &mut self,
        selected: crate::overload::Candidate,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let func = self.engine.function(selected.function);
        let is_virtual = func.flags.is_virtual;
        let vtable_index = func.virtual_index;
        let ty = func.prototype.return_type();

        if func.flags.is_deleted {
            return Err(self.failure(CompilerError::CallToDeletedFunction, span));
        }

        let converted = self.prepare_args(args, &selected, span)?;

        if is_virtual && let Some(slot) = vtable_index {
            let mut iter = converted.into_iter();
            let object = iter.next().expect("member calls carry their object");
            return Ok(Rc::new(program::Expression::VirtualCall(
                program::VirtualCall {
                    object,
                    vtable_index: slot,
                    args: iter.collect(),
                    ty,
                },
            )));
        }

        Ok(Rc::new(program::Expression::FunctionCall(
            program::FunctionCall {
                function: selected.function,
                args: converted,
                ty,
            },
        )))
    }

    /// Calls through a closure or function-typed value.
    fn generate_value_call(
        &mut self,
        callee: Rc<program::Expression>,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let callee_type = callee.ty();

        if let Some(closure) = self.engine.type_system().get_closure(callee_type.base_type()) {
            let call_op = self.engine.type_system().closure(closure).call_operator;
            let proto = self.engine.function(call_op).prototype.clone();

            if args.len() + 1 != proto.param_count() {
                return Err(self.failure(CompilerError::CouldNotFindValidCallOperator, span));
            }

            let mut converted = Vec::with_capacity(args.len());
            for (i, arg) in args.into_iter().enumerate() {
                let init = Initialization::compute_expr(proto.param(i + 1), &arg, self.engine);
                if !init.is_valid() {
                    return Err(self.failure(CompilerError::CouldNotConvert, span));
                }
                converted.push(self.construct_with_init(
                    proto.param(i + 1),
                    Some(arg),
                    &init,
                    span,
                )?);
            }

            return Ok(Rc::new(program::Expression::FunctionVariableCall(
                program::FunctionVariableCall {
                    callee,
                    args: converted,
                    ty: proto.return_type(),
                },
            )));
        }

        if let Some(proto) = self
            .engine
            .type_system()
            .get_prototype(callee_type.base_type())
            .cloned()
        {
            if args.len() != proto.param_count() {
                return Err(self.failure(CompilerError::NoSuchCallee, span));
            }

            let mut converted = Vec::with_capacity(args.len());
            for (i, arg) in args.into_iter().enumerate() {
                let init = Initialization::compute_expr(proto.param(i), &arg, self.engine);
                if !init.is_valid() {
                    return Err(self.failure(CompilerError::CouldNotConvert, span));
                }
                converted.push(self.construct_with_init(proto.param(i), Some(arg), &init, span)?);
            }

            return Ok(Rc::new(program::Expression::FunctionVariableCall(
                program::FunctionVariableCall {
                    callee,
                    args: converted,
                    ty: proto.return_type(),
                },
            )));
        }

        // An object with a call operator.
        if let Some(class_id) = self.engine.type_system().get_class(callee_type.base_type()) {
            let mut candidates: Vec<FunctionId> = Vec::new();
            let mut current = Some(class_id);
            while let Some(c) = current {
                for &op in &self.engine.class(c).operators {
                    if self.engine.function(op).operator_id() == Some(OperatorId::FunctionCall) {
                        candidates.push(op);
                    }
                }
                current = self.engine.class(c).parent;
            }

            let selected = crate::overload::resolve_member_overloads(
                self.engine,
                &candidates,
                callee_type,
                &args,
            )
            .ok_or_else(|| self.failure(CompilerError::CouldNotFindValidCallOperator, span))?;

            let mut full_args = vec![callee];
            full_args.extend(args);
            return self.emit_possibly_virtual_call(selected, full_args, span);
        }

        Err(self.failure(CompilerError::NoSuchCallee, span))
    }

    fn instantiate_function_template_for_call(
        &mut self,
        template: crate::symbols::TemplateId,
        arg_types: &[Type],
        span: rowan::TextRange,
    ) -> Result<FunctionId, CompilationFailure> {
        let is_function_template = matches!(
            self.engine.template(template).kind,
            TemplateKind::Function { .. }
        );
        if !is_function_template {
            return Err(self.failure(CompilerError::TemplateNamesAreNotExpressions, span));
        }

        let deduced = super::templates::TemplateArgumentDeduction::deduce_from_call(
            self.engine,
            template,
            arg_types,
        )
        .ok_or_else(|| {
            self.failure(CompilerError::CouldNotFindPrimaryFunctionTemplate, span)
        })?;

        super::templates::instantiate_function_template(
            self.engine,
            self.scopes,
            template,
            deduced,
        )
    }

    // -- Subscript, arrays, lists --------------------------------------------

    fn generate_subscript(
        &mut self,
        sub: &ast::ArraySubscript,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let object = self.generate_expr(&sub.array)?;
        let index = self.generate_expr(&sub.index)?;
        let span = sub.left_bracket.span;

        let Some(class_id) = self.engine.type_system().get_class(object.ty().base_type())
        else {
            return Err(self.failure(CompilerError::ArraySubscriptOnNonObject, span));
        };

        let mut candidates: Vec<FunctionId> = Vec::new();
        let mut current = Some(class_id);
        while let Some(c) = current {
            for &op in &self.engine.class(c).operators {
                if self.engine.function(op).operator_id() == Some(OperatorId::Subscript) {
                    candidates.push(op);
                }
            }
            current = self.engine.class(c).parent;
        }

        let args = vec![index];
        let selected = crate::overload::resolve_member_overloads(
            self.engine,
            &candidates,
            object.ty(),
            &args,
        )
        .ok_or_else(|| self.failure(CompilerError::CouldNotFindValidSubscriptOperator, span))?;

        let mut full_args = vec![object];
        full_args.extend(args);
        self.emit_possibly_virtual_call(selected, full_args, span)
    }

    fn generate_list(
        &mut self,
        list: &ast::ListExpr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let mut elements = Vec::with_capacity(list.elements.len());
        for element in &list.elements {
            elements.push(self.generate_expr(element)?);
        }
        Ok(Rc::new(program::Expression::InitializerList(
            program::InitializerList {
                initializer_list_type: Type::INITIALIZER_LIST,
                elements,
            },
        )))
    }

    fn generate_array(
        &mut self,
        array: &ast::ArrayExpr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let span = array.left_bracket.span;

        let mut elements = Vec::with_capacity(array.elements.len());
        for element in &array.elements {
            elements.push(self.generate_expr(element)?);
        }

        let Some(first) = elements.first() else {
            return Err(self.failure(CompilerError::ArrayElementNotConvertible, span));
        };
        if first.is_initializer_list() {
            return Err(self.failure(CompilerError::InitializerListAsFirstArrayElement, span));
        }

        let element_type = first.ty().base_type().without_const();

        let mut converted = Vec::with_capacity(elements.len());
        for (i, element) in elements.into_iter().enumerate() {
            let conv = Conversion::compute(
                element.ty(),
                element_type,
                self.engine,
                ConversionPolicy::NoExplicitConversions,
            );
            if conv.is_invalid() {
                return Err(self.failure(
                    CompilerError::ArrayElementNotConvertible,
                    array.elements[i].span(),
                ));
            }
            converted.push(self.apply_conversion(element, &conv, span)?);
        }

        let Some(array_template) = self.engine.array_template() else {
            return Err(self.failure(CompilerError::InvalidTypeName, span));
        };

        let array_type = {
            let scopes = &mut *self.scopes;
            self.tnp.instantiate(
                self.engine,
                scopes,
                array_template,
                vec![crate::symbols::TemplateArgument::Type(element_type)],
            )?
        };

        Ok(Rc::new(program::Expression::ArrayExpression(
            program::ArrayExpression {
                array_type,
                elements: converted,
            },
        )))
    }

    fn generate_brace_construction(
        &mut self,
        brace: &ast::BraceConstruction,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let span = brace.temporary_type.span();

        let resolution = self.resolve_name(&brace.temporary_type)?;
        let NameResolution::Type(ty) = resolution else {
            return Err(self.failure(CompilerError::UnknownTypeInBraceInitialization, span));
        };

        let mut args = Vec::with_capacity(brace.args.len());
        for arg in &brace.args {
            args.push(self.generate_expr(arg)?);
        }

        self.brace_construct(ty, args, span)
    }

    /// Comma chains compile left-to-right into `CommaExpression`s.
    pub(crate) fn generate_comma(
        &mut self,
        lhs: Rc<program::Expression>,
        rhs: Rc<program::Expression>,
    ) -> Rc<program::Expression> {
        Rc::new(program::Expression::CommaExpression(
            program::CommaExpression { lhs, rhs },
        ))
    }
}

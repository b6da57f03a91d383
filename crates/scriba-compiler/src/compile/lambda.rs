//! Lambda compilation.
//!
//! A lambda becomes a synthesized closure type: one field per capture, plus
//! a function-call operator whose body sees the captures through `this`.
//! The capture initializers evaluate in the enclosing frame.

use std::rc::Rc;

use indexmap::IndexSet;

use scriba_syntax::ast;
use scriba_syntax::operators::OperatorId;
use scriba_syntax::{TokenKind, token_text};

use crate::error::{CompilationFailure, CompilerError};
use crate::program;
use crate::prototype::Prototype;
use crate::scope::FunctionScopeCategory;
use crate::symbols::{
    AccessSpecifier, Capture, ClosureData, FunctionData, FunctionFlags, FunctionKind, Symbol,
};
use crate::types::Type;

use super::function::FunctionCompiler;

impl FunctionCompiler<'_> {
    pub(crate) fn generate_lambda(
        &mut self,
        lambda: &ast::LambdaExpr,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let captures = self.preprocess_captures(lambda)?;

        // Parameter types of the call operator.
        let mut param_types = Vec::with_capacity(lambda.params.len());
        for param in &lambda.params {
            param_types.push(self.resolve_type(&param.param_type)?);
        }

        // Capture initializers, evaluated in the enclosing frame.
        let mut initializers = Vec::with_capacity(captures.len());
        let mut fields = Vec::with_capacity(captures.len());
        for capture in &captures {
            let value = match &capture.init {
                Some(expr) => self.generate_expr(expr)?,
                None => {
                    let index = self
                        .stack
                        .last_index_of(&capture.name)
                        .ok_or_else(|| {
                            self.failure(CompilerError::UnknownCaptureName, capture.span)
                        })?;
                    let var = self.stack.at(index);
                    Rc::new(program::Expression::StackValue(program::StackValue {
                        stack_index: var.index,
                        ty: var.ty,
                    }))
                }
            };

            let field_type = if capture.by_reference {
                value.ty().base_type().with_reference()
            } else {
                let base = value.ty().base_type();
                // Captured-by-value class objects must be copyable.
                if let Some(class_id) = self.engine.type_system().get_class(base) {
                    let copyable = self
                        .engine
                        .copy_constructor(class_id)
                        .is_some_and(|c| !self.engine.function(c).flags.is_deleted);
                    if !copyable {
                        return Err(
                            self.failure(CompilerError::CannotCaptureNonCopyable, capture.span)
                        );
                    }
                }
                base
            };

            let value = if capture.by_reference {
                value
            } else {
                Rc::new(program::Expression::Copy(program::Copy {
                    ty: field_type,
                    src: value,
                }))
            };

            fields.push(Capture {
                name: capture.name.clone(),
                ty: field_type,
                by_reference: capture.by_reference,
            });
            initializers.push(value);
        }

        // Synthesize the closure type; the call operator is patched in once
        // its prototype (which needs the closure type) exists.
        let placeholder = crate::symbols::FunctionId(u32::MAX);
        let (closure_id, closure_type) =
            self.engine.type_system_mut().register_closure(ClosureData {
                ty: Type::NULL,
                captures: fields.clone(),
                call_operator: placeholder,
            });

        let mut params = vec![closure_type.with_reference().with_this()];
        params.extend(param_types.iter().copied());

        let enclosing = match self.class {
            Some(class) => Symbol::Class(class),
            None => Symbol::Namespace(self.engine.root_namespace()),
        };

        let call_operator = self.engine.add_function(FunctionData {
            kind: FunctionKind::Operator(OperatorId::FunctionCall),
            prototype: Prototype::new(Type::AUTO, params),
            flags: FunctionFlags::default(),
            owner: enclosing,
            access: AccessSpecifier::Public,
            default_arguments: Vec::new(),
            virtual_index: None,
            body: None,
        });
        self.engine
            .type_system_mut()
            .closure_mut(closure_id)
            .call_operator = call_operator;

        // Compile the body with a nested compiler whose scope sees the
        // captures as members of `this`.
        {
            let mut body_compiler = FunctionCompiler::new(
                &mut *self.engine,
                &mut *self.scopes,
                &mut *self.tnp,
                self.source,
                self.script,
                self.scope,
                Some(call_operator),
            );
            body_compiler.captures = fields;

            body_compiler.enter_scope(FunctionScopeCategory::FunctionArguments);
            body_compiler.stack.add_var(Type::AUTO, "__return_value__");
            body_compiler
                .stack
                .add_var(closure_type.with_reference(), "this");
            for (i, param) in lambda.params.iter().enumerate() {
                let name = match &param.name {
                    Some(tok) => token_text(body_compiler.source, tok).to_owned(),
                    None => format!("__arg{i}"),
                };
                body_compiler.stack.add_var(param_types[i], name);
            }

            body_compiler.enter_scope(FunctionScopeCategory::FunctionBody);
            for stmt in &lambda.body.statements {
                body_compiler.process_statement(stmt)?;
            }
            body_compiler.leave_scope()?;

            let body = program::CompoundStatement {
                statements: std::mem::take(&mut body_compiler.statements),
            };

            // A body with no value-returning statement deduces `void`.
            if body_compiler
                .engine
                .function(call_operator)
                .prototype
                .return_type()
                .is_auto()
            {
                body_compiler
                    .engine
                    .function_mut(call_operator)
                    .prototype
                    .set_return_type(Type::VOID);
            }

            body_compiler.engine.function_mut(call_operator).body = Some(Rc::new(body));
        }

        Ok(Rc::new(program::Expression::LambdaExpression(
            program::LambdaExpression {
                closure_type,
                captures: initializers,
            },
        )))
    }

    fn preprocess_captures(
        &mut self,
        lambda: &ast::LambdaExpr,
    ) -> Result<Vec<PreparedCapture>, CompilationFailure> {
        let mut default_by_value = false;
        let mut default_by_ref = false;
        let mut named: Vec<PreparedCapture> = Vec::new();

        for capture in &lambda.captures {
            let span = capture
                .name
                .map(|t| t.span)
                .or(capture.by_value_sign.map(|t| t.span))
                .or(capture.reference.map(|t| t.span))
                .unwrap_or(lambda.left_bracket.span);

            if capture.is_default() {
                if capture.by_value_sign.is_some() {
                    default_by_value = true;
                } else {
                    default_by_ref = true;
                }
                if default_by_value && default_by_ref {
                    return Err(
                        self.failure(CompilerError::CannotCaptureByValueAndByRef, span)
                    );
                }
                continue;
            }

            let name_tok = capture.name.expect("non-default captures are named");
            let name = token_text(self.source, &name_tok).to_owned();

            if name == "this" {
                return Err(self.failure(CompilerError::CannotCaptureThis, span));
            }
            if capture.value.is_none() && !self.stack.exists(&name) {
                return Err(self.failure(CompilerError::UnknownCaptureName, span));
            }

            named.push(PreparedCapture {
                name,
                by_reference: capture.reference.is_some(),
                init: capture.value.clone(),
                span,
            });
        }

        // `[=]` / `[&]`: scan the body for free names that resolve to
        // locals of the enclosing frame.
        if default_by_value || default_by_ref {
            let mut free = IndexSet::new();
            collect_free_names(&lambda.body.statements, self.source, &mut free);

            let params: IndexSet<String> = lambda
                .params
                .iter()
                .filter_map(|p| p.name.as_ref())
                .map(|t| token_text(self.source, t).to_owned())
                .collect();

            for name in free {
                if params.contains(&name)
                    || named.iter().any(|c| c.name == name)
                    || !self.stack.exists(&name)
                {
                    continue;
                }
                named.push(PreparedCapture {
                    name,
                    by_reference: default_by_ref,
                    init: None,
                    span: lambda.left_bracket.span,
                });
            }
        }

        Ok(named)
    }
}

struct PreparedCapture {
    name: String,
    by_reference: bool,
    init: Option<ast::Expr>,
    span: rowan::TextRange,
}

/// Collects simple identifiers appearing free in a statement list.
fn collect_free_names(statements: &[ast::Stmt], source: &str, out: &mut IndexSet<String>) {
    for stmt in statements {
        collect_stmt(stmt, source, out);
    }
}

fn collect_stmt(stmt: &ast::Stmt, source: &str, out: &mut IndexSet<String>) {
    match stmt {
        ast::Stmt::Null(_) | ast::Stmt::Break(_) | ast::Stmt::Continue(_) => {}
        ast::Stmt::Expr(es) => collect_expr(&es.expr, source, out),
        ast::Stmt::Compound(cs) => collect_free_names(&cs.statements, source, out),
        ast::Stmt::If(s) => {
            collect_expr(&s.condition, source, out);
            collect_stmt(&s.body, source, out);
            if let Some(else_clause) = &s.else_clause {
                collect_stmt(else_clause, source, out);
            }
        }
        ast::Stmt::While(s) => {
            collect_expr(&s.condition, source, out);
            collect_stmt(&s.body, source, out);
        }
        ast::Stmt::For(s) => {
            if let Some(init) = &s.init_statement {
                collect_stmt(init, source, out);
            }
            if let Some(cond) = &s.condition {
                collect_expr(cond, source, out);
            }
            if let Some(incr) = &s.loop_increment {
                collect_expr(incr, source, out);
            }
            collect_stmt(&s.body, source, out);
        }
        ast::Stmt::Return(s) => {
            if let Some(expr) = &s.expression {
                collect_expr(expr, source, out);
            }
        }
        ast::Stmt::Decl(ast::Decl::Variable(v)) => {
            if let Some(init) = &v.init {
                match init {
                    ast::VariableInit::Assignment { value, .. } => collect_expr(value, source, out),
                    ast::VariableInit::Constructor { args, .. }
                    | ast::VariableInit::Brace { args, .. } => {
                        for arg in args {
                            collect_expr(arg, source, out);
                        }
                    }
                }
            }
        }
        ast::Stmt::Decl(_) => {}
    }
}

fn collect_expr(expr: &ast::Expr, source: &str, out: &mut IndexSet<String>) {
    match expr {
        ast::Expr::Literal(_) => {}
        ast::Expr::Id(id) => {
            if let ast::Identifier::Simple(simple) = id
                && simple.name.kind == TokenKind::UserDefinedName
            {
                out.insert(token_text(source, &simple.name).to_owned());
            }
        }
        ast::Expr::Operation(op) => {
            collect_expr(&op.arg1, source, out);
            // The right side of a member access is not a free name.
            if !op.is_member_access()
                && let Some(arg2) = &op.arg2
            {
                collect_expr(arg2, source, out);
            }
        }
        ast::Expr::Conditional(c) => {
            collect_expr(&c.condition, source, out);
            collect_expr(&c.on_true, source, out);
            collect_expr(&c.on_false, source, out);
        }
        ast::Expr::Call(c) => {
            collect_expr(&c.callee, source, out);
            for arg in &c.args {
                collect_expr(arg, source, out);
            }
        }
        ast::Expr::Subscript(s) => {
            collect_expr(&s.array, source, out);
            collect_expr(&s.index, source, out);
        }
        ast::Expr::List(l) => {
            for element in &l.elements {
                collect_expr(element, source, out);
            }
        }
        ast::Expr::Array(a) => {
            for element in &a.elements {
                collect_expr(element, source, out);
            }
        }
        ast::Expr::Brace(b) => {
            for arg in &b.args {
                collect_expr(arg, source, out);
            }
        }
        ast::Expr::Lambda(inner) => {
            // Nested lambdas see the outer frame through their own captures.
            collect_free_names(&inner.body.statements, source, out);
        }
    }
}

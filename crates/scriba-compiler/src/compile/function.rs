//! Function-body compilation.
//!
//! Translates AST statements into IR statements while maintaining the frame
//! model: a growable stack of named variables and a chain of function-local
//! scopes. Every control-flow path out of a scope gets explicit destruction
//! statements; the IR visitor performs no implicit cleanup.

use std::rc::Rc;

use scriba_syntax::ast;
use scriba_syntax::token_text;

use crate::engine::Engine;
use crate::error::{CompilationFailure, CompilerError};
use crate::initialization::Initialization;
use crate::lookup::TemplateNameProcessor;
use crate::program;
use crate::scope::{FunctionScopeCategory, ScopeId, ScopeKind, Scopes};
use crate::symbols::{Capture, ClassId, FunctionId, FunctionKind, ScriptId};
use crate::types::Type;

use super::CompileFunctionTask;

/// One entry of the compile-time stack.
#[derive(Debug, Clone)]
pub struct Variable {
    pub ty: Type,
    pub name: String,
    pub index: usize,
    pub global: bool,
}

/// The growable stack of frame variables.
#[derive(Debug, Default)]
pub struct Stack {
    vars: Vec<Variable>,
}

impl Stack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.vars.len()
    }

    pub fn add_var(&mut self, ty: Type, name: impl Into<String>) -> usize {
        let index = self.vars.len();
        self.vars.push(Variable {
            ty,
            name: name.into(),
            index,
            global: false,
        });
        index
    }

    pub fn at(&self, index: usize) -> &Variable {
        &self.vars[index]
    }

    pub fn exists(&self, name: &str) -> bool {
        self.last_index_of(name).is_some()
    }

    /// Most recent binding wins - inner declarations shadow outer ones.
    pub fn last_index_of(&self, name: &str) -> Option<usize> {
        self.vars.iter().rposition(|v| v.name == name)
    }

    /// Pops the `n` most recent variables.
    pub fn destroy(&mut self, n: usize) {
        let new_len = self.vars.len().saturating_sub(n);
        self.vars.truncate(new_len);
    }
}

pub struct FunctionCompiler<'a> {
    pub(crate) engine: &'a mut Engine,
    pub(crate) scopes: &'a mut Scopes,
    pub(crate) tnp: &'a mut dyn TemplateNameProcessor,
    pub(crate) source: &'a str,
    pub(crate) script: ScriptId,
    pub(crate) function: Option<FunctionId>,
    pub(crate) class: Option<ClassId>,
    pub(crate) stack: Stack,
    pub(crate) scope: ScopeId,
    pub(crate) statements: Vec<Rc<program::Statement>>,
    /// Captures visible while compiling a closure's call operator.
    pub(crate) captures: Vec<Capture>,
}

impl<'a> FunctionCompiler<'a> {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        engine: &'a mut Engine,
        scopes: &'a mut Scopes,
        tnp: &'a mut dyn TemplateNameProcessor,
        source: &'a str,
        script: ScriptId,
        scope: ScopeId,
        function: Option<FunctionId>,
    ) -> Self {
        let class = function.and_then(|f| engine.function(f).member_of());
        Self {
            engine,
            scopes,
            tnp,
            source,
            script,
            function,
            class,
            stack: Stack::new(),
            scope,
            statements: Vec::new(),
            captures: Vec::new(),
        }
    }

    /// Compiles one scheduled function body and attaches it.
    pub fn compile_task(
        engine: &mut Engine,
        scopes: &mut Scopes,
        tnp: &mut dyn TemplateNameProcessor,
        ast: &Rc<ast::Ast>,
        task: &CompileFunctionTask,
    ) -> Result<(), CompilationFailure> {
        let mut compiler = FunctionCompiler::new(
            engine,
            scopes,
            tnp,
            &ast.source,
            task.script,
            task.scope,
            Some(task.function),
        );

        let body = if task.declaration.is_defaulted() {
            compiler.generate_defaulted(&task.declaration)?
        } else {
            compiler.generate_body(&task.declaration)?
        };

        engine.function_mut(task.function).body = Some(Rc::new(body));
        Ok(())
    }

    /// Compiles the top-level statements of a script as its root function.
    #[allow(clippy::too_many_arguments)]
    pub fn compile_root(
        engine: &mut Engine,
        scopes: &mut Scopes,
        tnp: &mut dyn TemplateNameProcessor,
        ast: &Rc<ast::Ast>,
        script: ScriptId,
        scope: ScopeId,
        function: FunctionId,
        statements: &[ast::Stmt],
    ) -> Result<(), CompilationFailure> {
        let mut compiler = FunctionCompiler::new(
            engine,
            scopes,
            tnp,
            &ast.source,
            script,
            scope,
            Some(function),
        );

        compiler.enter_scope(FunctionScopeCategory::FunctionBody);
        for stmt in statements {
            compiler.process_statement(stmt)?;
        }
        compiler.leave_scope()?;

        let body = program::CompoundStatement {
            statements: std::mem::take(&mut compiler.statements),
        };
        engine.function_mut(function).body = Some(Rc::new(body));
        Ok(())
    }

    /// Compiles a default-argument expression in its declaring scope.
    pub fn compile_default_argument(
        engine: &mut Engine,
        scopes: &mut Scopes,
        tnp: &mut dyn TemplateNameProcessor,
        source: &str,
        scope: ScopeId,
        expr: &ast::Expr,
        param_type: Type,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let script = ScriptId(0);
        let mut compiler =
            FunctionCompiler::new(engine, scopes, tnp, source, script, scope, None);

        let value = compiler.generate_expr(expr)?;
        let init = Initialization::compute_expr(param_type, &value, compiler.engine);
        if !init.is_valid() {
            return Err(CompilationFailure::new(
                CompilerError::CouldNotConvert,
                expr.span(),
            ));
        }
        compiler.construct_with_init(param_type, Some(value), &init, expr.span())
    }

    // -- Shared helpers ------------------------------------------------------

    pub(crate) fn function_id(&self) -> Option<FunctionId> {
        self.function
    }

    pub(crate) fn failure(
        &self,
        error: CompilerError,
        span: rowan::TextRange,
    ) -> CompilationFailure {
        CompilationFailure::new(error, span)
    }

    pub(crate) fn write(&mut self, statement: program::Statement) {
        self.statements.push(Rc::new(statement));
    }

    /// Runs `f` against a fresh buffer and returns what it emitted as a
    /// single statement.
    pub(crate) fn generate_in_buffer(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<(), CompilationFailure>,
    ) -> Result<Rc<program::Statement>, CompilationFailure> {
        let mut buffer = Vec::new();
        std::mem::swap(&mut self.statements, &mut buffer);
        let result = f(self);
        std::mem::swap(&mut self.statements, &mut buffer);

        result?;
        Ok(match buffer.len() {
            1 => buffer.into_iter().next().expect("length checked"),
            _ => Rc::new(program::Statement::Compound(program::CompoundStatement {
                statements: buffer,
            })),
        })
    }

    // -- Scopes --------------------------------------------------------------

    pub(crate) fn enter_scope(&mut self, category: FunctionScopeCategory) {
        self.scope = self.scopes.add(
            Some(self.scope),
            ScopeKind::FunctionLocal {
                category,
                stack_pointer: self.stack.size(),
            },
        );
    }

    fn scope_stack_pointer(&self, scope: ScopeId) -> usize {
        match self.scopes.node(scope).kind {
            ScopeKind::FunctionLocal { stack_pointer, .. } => stack_pointer,
            _ => 0,
        }
    }

    /// Emits destruction for everything above the current scope's stack
    /// pointer, shrinks the stack, and steps out.
    pub(crate) fn leave_scope(&mut self) -> Result<(), CompilationFailure> {
        let sp = self.scope_stack_pointer(self.scope);
        let pops = self.destruction_statements(sp)?;
        for pop in pops {
            self.statements.push(pop);
        }
        self.stack.destroy(self.stack.size() - sp);
        self.scope = self
            .scopes
            .parent(self.scope)
            .expect("function scopes always have a parent");
        Ok(())
    }

    /// Leaves the scope without emitting pops; the caller places them.
    pub(crate) fn leave_scope_deferred(
        &mut self,
    ) -> Result<Vec<Rc<program::Statement>>, CompilationFailure> {
        let sp = self.scope_stack_pointer(self.scope);
        let pops = self.destruction_statements(sp)?;
        self.stack.destroy(self.stack.size() - sp);
        self.scope = self
            .scopes
            .parent(self.scope)
            .expect("function scopes always have a parent");
        Ok(pops)
    }

    /// Destruction statements for every variable at index >= `down_to`,
    /// most recent first. Leaves the stack untouched.
    pub(crate) fn destruction_statements(
        &mut self,
        down_to: usize,
    ) -> Result<Vec<Rc<program::Statement>>, CompilationFailure> {
        let mut out = Vec::new();
        for index in (down_to..self.stack.size()).rev() {
            let var = self.stack.at(index).clone();
            out.push(Rc::new(self.pop_statement(&var)?));
        }
        Ok(out)
    }

    fn pop_statement(&self, var: &Variable) -> Result<program::Statement, CompilationFailure> {
        if let Some(class_id) = self.engine.type_system().get_class(var.ty.base_type()) {
            // A reference does not own its object.
            if var.ty.is_any_reference() {
                return Ok(program::Statement::PopValue(program::PopValue {
                    stack_index: var.index,
                    destroy: false,
                    destructor: None,
                }));
            }

            let Some(destructor) = self.engine.class(class_id).destructor else {
                return Err(CompilationFailure::new(
                    CompilerError::ObjectHasNoDestructor,
                    rowan::TextRange::default(),
                ));
            };
            return Ok(program::Statement::PopValue(program::PopValue {
                stack_index: var.index,
                destroy: true,
                destructor: Some(destructor),
            }));
        }

        Ok(program::Statement::PopValue(program::PopValue {
            stack_index: var.index,
            destroy: false,
            destructor: None,
        }))
    }

    /// The stack pointer of the innermost loop scope, for break/continue.
    fn innermost_loop_sp(&self) -> Option<usize> {
        for scope in self.scopes.chain(self.scope) {
            if let ScopeKind::FunctionLocal {
                category,
                stack_pointer,
            } = self.scopes.node(scope).kind
                && category.is_loop()
            {
                return Some(stack_pointer);
            }
        }
        None
    }

    /// The stack pointer of the function-body scope, for returns.
    fn function_body_sp(&self) -> usize {
        for scope in self.scopes.chain(self.scope) {
            if let ScopeKind::FunctionLocal {
                category: FunctionScopeCategory::FunctionBody,
                stack_pointer,
            } = self.scopes.node(scope).kind
            {
                return stack_pointer;
            }
        }
        0
    }

    // -- Body generation -----------------------------------------------------

    fn generate_body(
        &mut self,
        decl: &Rc<ast::FunctionDecl>,
    ) -> Result<program::CompoundStatement, CompilationFailure> {
        let function = self.function.expect("bodies belong to functions");
        let prototype = self.engine.function(function).prototype.clone();
        let is_destructor = self.engine.function(function).is_destructor();
        let is_constructor = self.engine.function(function).is_constructor();

        self.enter_scope(FunctionScopeCategory::FunctionArguments);

        // The implicit return-value slot occupies index 0.
        if !is_destructor {
            self.stack
                .add_var(prototype.return_type(), "__return_value__");
        }

        // Constructors receive their object right after the return slot.
        if is_constructor && let Some(class_id) = self.class {
            let class_type = self.engine.class(class_id).ty;
            self.stack.add_var(class_type.with_reference(), "this");
        }

        // Parameters; the implicit object is named `this`.
        let mut decl_params = decl.params.iter();
        for (i, &param_ty) in prototype.params().iter().enumerate() {
            if i == 0 && param_ty.is_this() {
                self.stack.add_var(param_ty, "this");
                continue;
            }
            let name = match decl_params.next().and_then(|p| p.name.as_ref()) {
                Some(tok) => token_text(self.source, tok).to_owned(),
                None => format!("__arg{i}"),
            };
            self.stack.add_var(param_ty, name);
        }

        self.enter_scope(FunctionScopeCategory::FunctionBody);

        if is_constructor {
            self.generate_constructor_header(decl)?;
        }

        let body = decl
            .body
            .as_ref()
            .ok_or_else(|| self.failure(CompilerError::ExpectedDeclaration, decl.name.span()))?
            .clone();
        for stmt in &body.statements {
            self.process_statement(stmt)?;
        }

        if is_destructor {
            self.generate_destructor_footer()?;
        }

        self.leave_scope()?; // function body
        self.scope = self
            .scopes
            .parent(self.scope)
            .expect("arguments scope has a parent"); // arguments, no pops
        self.stack = Stack::new();

        Ok(program::CompoundStatement {
            statements: std::mem::take(&mut self.statements),
        })
    }

    /// `this`, as a stack value.
    pub(crate) fn generate_this(
        &self,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let Some(index) = self.stack.last_index_of("this") else {
            return Err(self.failure(CompilerError::IllegalUseOfThis, span));
        };
        let var = self.stack.at(index);
        Ok(Rc::new(program::Expression::StackValue(program::StackValue {
            stack_index: var.index,
            ty: var.ty,
        })))
    }

    // -- Constructors & destructors -----------------------------------------

    fn generate_constructor_header(
        &mut self,
        decl: &Rc<ast::FunctionDecl>,
    ) -> Result<(), CompilationFailure> {
        let class_id = self.class.expect("constructors belong to classes");
        let class_name = self.engine.class(class_id).name.clone();
        let parent = self.engine.class(class_id).parent;
        let parent_name = parent.map(|p| self.engine.class(p).name.clone());
        let span = decl.name.span();

        let inits = decl.member_initializations().to_vec();

        // Delegating constructor?
        for init in &inits {
            if init.name.name_text(self.source) == class_name {
                if inits.len() > 1 {
                    return Err(
                        self.failure(CompilerError::InvalidUseOfDelegatedConstructor, span)
                    );
                }
                return self.generate_delegating_call(class_id, init, span);
            }
        }

        // Base-class construction.
        let parent_init = inits
            .iter()
            .find(|i| Some(i.name.name_text(self.source)) == parent_name.as_deref());

        if let Some(parent_id) = parent {
            let args = match parent_init {
                Some(init) => {
                    let mut compiled = Vec::new();
                    for arg in init.init.args() {
                        compiled.push(self.generate_expr(arg)?);
                    }
                    compiled
                }
                None => Vec::new(),
            };

            let candidates = self.engine.class(parent_id).constructors.clone();
            let selected =
                crate::overload::resolve_overloads(self.engine, &candidates, &args)
                    .ok_or_else(|| {
                        self.failure(CompilerError::CouldNotFindValidBaseConstructor, span)
                    })?;

            let this = self.generate_this(span)?;
            let converted = self.prepare_args(args, &selected, span)?;
            self.write(program::Statement::Placement(program::PlacementStatement {
                object: this,
                constructor: selected.function,
                args: converted,
            }));
        }

        // Data members, in declaration order.
        let members = self.engine.class(class_id).data_members.clone();
        let mut used = vec![false; inits.len()];

        // Initializer names must refer to the class, its base, or an own
        // data member.
        for (idx, init) in inits.iter().enumerate() {
            let name = init.name.name_text(self.source);
            if Some(name) == parent_name.as_deref() || name == class_name {
                used[idx] = true;
                continue;
            }
            if members.iter().any(|m| m.name == name) {
                continue;
            }
            // Inherited members cannot be initialized from here.
            let mut ancestor = parent;
            while let Some(a) = ancestor {
                if self.engine.class(a).data_members.iter().any(|m| m.name == name) {
                    return Err(
                        self.failure(CompilerError::InheritedDataMember, init.name.span())
                    );
                }
                ancestor = self.engine.class(a).parent;
            }
            return Err(self.failure(CompilerError::NotDataMember, init.name.span()));
        }

        for member in &members {
            let mut explicit: Option<&ast::MemberInitialization> = None;
            for (idx, init) in inits.iter().enumerate() {
                if init.name.name_text(self.source) == member.name {
                    if used[idx] || explicit.is_some() {
                        return Err(self.failure(
                            CompilerError::DataMemberAlreadyHasInitializer,
                            init.name.span(),
                        ));
                    }
                    used[idx] = true;
                    explicit = Some(init);
                }
            }

            let value = match explicit {
                Some(init) => {
                    let mut args = Vec::new();
                    for arg in init.init.args() {
                        args.push(self.generate_expr(arg)?);
                    }
                    match &init.init {
                        ast::CtorInitArgs::Brace(_) => {
                            self.brace_construct(member.ty, args, init.name.span())?
                        }
                        ast::CtorInitArgs::Paren(_) => {
                            self.construct(member.ty, args, init.name.span())?
                        }
                    }
                }
                None => self.construct_member_default(member, span)?,
            };

            self.write(program::Statement::PushDataMember(program::PushDataMember {
                value,
            }));
        }

        Ok(())
    }

    /// Falls back to the member's written initializer (`int x = 5;`),
    /// then to default construction.
    pub(crate) fn construct_member_default(
        &mut self,
        member: &crate::symbols::DataMember,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        match &member.default_value {
            Some(ast::VariableInit::Assignment { value, .. }) => {
                let value = value.clone();
                let expr = self.generate_expr(&value)?;
                let init = Initialization::compute_expr(member.ty, &expr, self.engine);
                if !init.is_valid() {
                    return Err(self.failure(CompilerError::CouldNotConvert, value.span()));
                }
                self.construct_with_init(member.ty, Some(expr), &init, value.span())
            }
            Some(ast::VariableInit::Brace { args, .. }) => {
                let args = args.clone();
                let mut compiled = Vec::with_capacity(args.len());
                for arg in &args {
                    compiled.push(self.generate_expr(arg)?);
                }
                self.brace_construct(member.ty, compiled, span)
            }
            Some(ast::VariableInit::Constructor { args, .. }) => {
                let args = args.clone();
                let mut compiled = Vec::with_capacity(args.len());
                for arg in &args {
                    compiled.push(self.generate_expr(arg)?);
                }
                self.construct(member.ty, compiled, span)
            }
            None => self.construct_default(member.ty, span),
        }
    }

    fn generate_delegating_call(
        &mut self,
        class_id: ClassId,
        init: &ast::MemberInitialization,
        span: rowan::TextRange,
    ) -> Result<(), CompilationFailure> {
        let mut args = Vec::new();
        for arg in init.init.args() {
            args.push(self.generate_expr(arg)?);
        }

        let own = self.function;
        let candidates: Vec<FunctionId> = self
            .engine
            .class(class_id)
            .constructors
            .iter()
            .copied()
            .filter(|&c| Some(c) != own)
            .collect();

        let selected = crate::overload::resolve_overloads(self.engine, &candidates, &args)
            .ok_or_else(|| self.failure(CompilerError::NoDelegatingConstructorFound, span))?;

        let this = self.generate_this(span)?;
        let converted = self.prepare_args(args, &selected, span)?;
        self.write(program::Statement::Placement(program::PlacementStatement {
            object: this,
            constructor: selected.function,
            args: converted,
        }));
        Ok(())
    }

    fn generate_destructor_footer(&mut self) -> Result<(), CompilationFailure> {
        let class_id = self.class.expect("destructors belong to classes");
        let members = self.engine.class(class_id).data_members.clone();

        for member in members.iter().rev() {
            let destructor = self
                .engine
                .type_system()
                .get_class(member.ty.base_type())
                .and_then(|c| self.engine.class(c).destructor);
            self.write(program::Statement::PopDataMember(program::PopDataMember {
                destructor,
            }));
        }

        if let Some(parent) = self.engine.class(class_id).parent
            && let Some(parent_dtor) = self.engine.class(parent).destructor
        {
            let this = self.generate_this(rowan::TextRange::default())?;
            self.write(program::Statement::Placement(program::PlacementStatement {
                object: this,
                constructor: parent_dtor,
                args: Vec::new(),
            }));
        }

        Ok(())
    }

    // -- Statements ----------------------------------------------------------

    pub(crate) fn process_statement(
        &mut self,
        stmt: &ast::Stmt,
    ) -> Result<(), CompilationFailure> {
        match stmt {
            ast::Stmt::Null(_) => Ok(()),
            ast::Stmt::Compound(cs) => {
                self.process_compound(cs, FunctionScopeCategory::CompoundStatement)
            }
            ast::Stmt::Expr(es) => {
                let expr = self.generate_expr(&es.expr)?;
                self.write(program::Statement::ExpressionStatement(
                    program::ExpressionStatement { expr },
                ));
                Ok(())
            }
            ast::Stmt::If(if_stmt) => self.process_if(if_stmt),
            ast::Stmt::While(while_loop) => self.process_while(while_loop),
            ast::Stmt::For(for_loop) => self.process_for(for_loop),
            ast::Stmt::Break(tok) => self.process_break(tok.span),
            ast::Stmt::Continue(tok) => self.process_continue(tok.span),
            ast::Stmt::Return(ret) => self.process_return(ret),
            ast::Stmt::Decl(ast::Decl::Variable(decl)) => self.process_variable_decl(decl),
            ast::Stmt::Decl(other) => Err(self.failure(
                CompilerError::ExpectedDeclaration,
                other.base_token().span,
            )),
        }
    }

    fn process_compound(
        &mut self,
        cs: &ast::CompoundStatement,
        category: FunctionScopeCategory,
    ) -> Result<(), CompilationFailure> {
        self.enter_scope(category);
        for stmt in &cs.statements {
            self.process_statement(stmt)?;
        }
        self.leave_scope()
    }

    /// Compiles a (possibly non-compound) statement in a child scope and
    /// returns it as one IR statement.
    fn generate_scoped_statement(
        &mut self,
        stmt: &ast::Stmt,
        category: FunctionScopeCategory,
    ) -> Result<Rc<program::Statement>, CompilationFailure> {
        self.generate_in_buffer(|fc| {
            match stmt {
                ast::Stmt::Compound(cs) => fc.process_compound(cs, category),
                other => {
                    fc.enter_scope(category);
                    fc.process_statement(other)?;
                    fc.leave_scope()
                }
            }
        })
    }

    fn process_if(&mut self, if_stmt: &ast::IfStatement) -> Result<(), CompilationFailure> {
        let condition = self.generate_condition(&if_stmt.condition)?;
        let body = self.generate_scoped_statement(&if_stmt.body, FunctionScopeCategory::IfBody)?;

        let else_clause = match &if_stmt.else_clause {
            Some(clause) => Some(
                self.generate_scoped_statement(clause, FunctionScopeCategory::IfBody)?,
            ),
            None => None,
        };

        self.write(program::Statement::If(program::IfStatement {
            condition,
            body,
            else_clause,
        }));
        Ok(())
    }

    fn process_while(&mut self, while_loop: &ast::WhileLoop) -> Result<(), CompilationFailure> {
        let condition = self.generate_condition(&while_loop.condition)?;
        let body =
            self.generate_scoped_statement(&while_loop.body, FunctionScopeCategory::WhileBody)?;

        self.write(program::Statement::While(program::WhileLoop {
            condition,
            body,
        }));
        Ok(())
    }

    fn process_for(&mut self, for_loop: &ast::ForLoop) -> Result<(), CompilationFailure> {
        self.enter_scope(FunctionScopeCategory::ForInit);

        let init = match &for_loop.init_statement {
            Some(stmt) => Some(self.generate_in_buffer(|fc| fc.process_statement(stmt))?),
            None => None,
        };

        let condition = match &for_loop.condition {
            Some(cond) => Some(self.generate_condition(cond)?),
            None => None,
        };

        let loop_increment = match &for_loop.loop_increment {
            Some(incr) => Some(self.generate_expr(incr)?),
            None => None,
        };

        let body =
            self.generate_scoped_statement(&for_loop.body, FunctionScopeCategory::ForBody)?;

        // Destruction of the init variable belongs to the loop itself.
        let pops = self.leave_scope_deferred()?;
        let destroy = if pops.is_empty() {
            None
        } else {
            Some(Rc::new(program::Statement::Compound(
                program::CompoundStatement { statements: pops },
            )))
        };

        self.write(program::Statement::For(program::ForLoop {
            init,
            condition,
            loop_increment,
            body,
            destroy,
        }));
        Ok(())
    }

    fn process_break(&mut self, span: rowan::TextRange) -> Result<(), CompilationFailure> {
        let Some(sp) = self.innermost_loop_sp() else {
            return Err(self.failure(CompilerError::SyntaxError, span));
        };
        let destruction = self.destruction_statements(sp)?;
        self.write(program::Statement::Break(program::BreakStatement {
            destruction,
        }));
        Ok(())
    }

    fn process_continue(&mut self, span: rowan::TextRange) -> Result<(), CompilationFailure> {
        let Some(sp) = self.innermost_loop_sp() else {
            return Err(self.failure(CompilerError::SyntaxError, span));
        };
        let destruction = self.destruction_statements(sp)?;
        self.write(program::Statement::Continue(program::ContinueStatement {
            destruction,
        }));
        Ok(())
    }

    fn process_return(&mut self, ret: &ast::ReturnStatement) -> Result<(), CompilationFailure> {
        let function = self.function.expect("returns occur in functions");
        let return_type = self.engine.function(function).prototype.return_type();
        let span = ret.keyword.span;

        let value = match &ret.expression {
            None => {
                if !return_type.is_void() && !return_type.is_auto() {
                    return Err(self.failure(CompilerError::ReturnStatementWithoutValue, span));
                }
                if return_type.is_auto() {
                    self.engine
                        .function_mut(function)
                        .prototype
                        .set_return_type(Type::VOID);
                }
                None
            }
            Some(expr) => {
                if return_type.is_void() {
                    return Err(self.failure(CompilerError::ReturnStatementWithValue, span));
                }

                let value = self.generate_expr(expr)?;

                // Lambda return-type deduction commits to the first
                // value-returning statement.
                let return_type = if return_type.is_auto() {
                    let deduced = value.ty().base_type();
                    self.engine
                        .function_mut(function)
                        .prototype
                        .set_return_type(deduced);
                    deduced
                } else {
                    return_type
                };

                let init = Initialization::compute_expr(return_type, &value, self.engine);
                if !init.is_valid() {
                    return Err(self.failure(CompilerError::CouldNotConvert, expr.span()));
                }
                Some(self.construct_with_init(return_type, Some(value), &init, expr.span())?)
            }
        };

        let destruction = self.destruction_statements(self.function_body_sp())?;
        self.write(program::Statement::Return(program::ReturnStatement {
            value,
            destruction,
        }));
        Ok(())
    }

    // -- Variables -----------------------------------------------------------

    fn process_variable_decl(
        &mut self,
        decl: &Rc<ast::VariableDecl>,
    ) -> Result<(), CompilationFailure> {
        let span = decl.name.span;

        if decl.static_specifier.is_some() {
            return Err(self.failure(CompilerError::InvalidUseOfStaticKeyword, span));
        }

        let mut var_type = self.resolve_type(&decl.var_type)?;

        let value = match &decl.init {
            None => {
                if var_type.is_auto() {
                    return Err(self.failure(CompilerError::AutoMustBeUsedWithAssignment, span));
                }
                Some(self.construct_default(var_type, span)?)
            }
            Some(ast::VariableInit::Assignment { value, .. }) => {
                let expr = self.generate_expr(value)?;

                if var_type.is_auto() {
                    var_type = deduce_auto(var_type, expr.ty(), &decl.var_type);
                }

                // A function-typed variable takes a captureless lambda or a
                // function name directly.
                if var_type.is_function_type() {
                    if let Some(closure) =
                        self.engine.type_system().get_closure(expr.ty().base_type())
                    {
                        if !self.engine.type_system().closure(closure).captures.is_empty() {
                            return Err(
                                self.failure(CompilerError::LambdaMustBeCaptureless, span)
                            );
                        }
                    }
                }

                let init = Initialization::compute_expr(var_type, &expr, self.engine);
                if !init.is_valid() {
                    return Err(self.failure(CompilerError::CouldNotConvert, value.span()));
                }
                Some(self.construct_with_init(var_type, Some(expr), &init, value.span())?)
            }
            Some(ast::VariableInit::Constructor { args, .. }) => {
                if var_type.is_auto() {
                    return Err(self.failure(CompilerError::AutoMustBeUsedWithAssignment, span));
                }
                let mut compiled = Vec::new();
                for arg in args {
                    compiled.push(self.generate_expr(arg)?);
                }
                Some(self.construct(var_type, compiled, span)?)
            }
            Some(ast::VariableInit::Brace { args, .. }) => {
                if var_type.is_auto() {
                    return Err(self.failure(CompilerError::AutoMustBeUsedWithAssignment, span));
                }
                let mut compiled = Vec::new();
                for arg in args {
                    compiled.push(self.generate_expr(arg)?);
                }
                Some(self.brace_construct(var_type, compiled, span)?)
            }
        };

        let name = token_text(self.source, &decl.name).to_owned();
        self.process_variable_creation(var_type, name, value);
        Ok(())
    }

    pub(crate) fn process_variable_creation(
        &mut self,
        ty: Type,
        name: String,
        value: Option<Rc<program::Expression>>,
    ) {
        let index = self.stack.add_var(ty, name.clone());
        self.write(program::Statement::PushValue(program::PushValue {
            ty,
            name: Some(name),
            stack_index: index,
            value,
        }));
    }
}

/// `auto` deduction: take the initializer's type, re-applying the written
/// qualifiers.
fn deduce_auto(declared: Type, init_type: Type, annotation: &ast::QualifiedType) -> Type {
    let mut ty = init_type.base_type();
    if declared.is_const() || annotation.is_const() {
        ty = ty.with_const();
    }
    if annotation.is_ref() {
        ty = ty.with_reference();
        if init_type.is_const() {
            ty = ty.with_const();
        }
    }
    ty
}

//! Script-level compilation: declaration collection, class and enum
//! assembly, function registration, and the re-queue pass loop.

use std::collections::VecDeque;
use std::rc::Rc;

use indexmap::IndexMap;

use scriba_syntax::ast;
use scriba_syntax::operators::OperatorId;
use scriba_syntax::{TokenKind, token_text};

use crate::engine::Engine;
use crate::error::{CompilationFailure, CompilerError};
use crate::lookup::{LookupContext, NameLookup, NameResolution, parse_integer_literal, resolve_type};
use crate::prototype::Prototype;
use crate::scope::{ScopeId, ScopeKind, Scopes};
use crate::symbols::{
    AccessSpecifier, ClassData, ClassId, EnumData, FunctionData, FunctionFlags, FunctionId,
    FunctionKind, GlobalVariable, NamespaceId, ScriptId, StaticDataMember, Symbol,
    TemplateArgument, TemplateData, TemplateId, TemplateKind, TemplateParameterDef,
    TemplateParameterKind, TemplateSpecialization,
};
use crate::types::Type;

use super::templates::DefaultTemplateNameProcessor;
use super::{CompileFunctionTask, PendingVariable, ScopedDeclaration};

pub struct ScriptCompiler<'e> {
    pub(crate) engine: &'e mut Engine,
    pub(crate) script: ScriptId,
    pub(crate) scopes: Scopes,
    pub(crate) tnp: DefaultTemplateNameProcessor,
    ast: Option<Rc<ast::Ast>>,
    queue: VecDeque<ScopedDeclaration>,
    tasks: VecDeque<CompileFunctionTask>,
    variables: Vec<PendingVariable>,
    root_statements: Vec<ast::Stmt>,
    script_scope: ScopeId,
}

impl<'e> ScriptCompiler<'e> {
    pub fn new(engine: &'e mut Engine, script: ScriptId) -> Self {
        let mut scopes = Scopes::new();
        let root_scope = scopes.add(None, ScopeKind::RootNamespace);
        let script_scope = scopes.add(Some(root_scope), ScopeKind::Script(script));

        Self {
            engine,
            script,
            scopes,
            tnp: DefaultTemplateNameProcessor,
            ast: None,
            queue: VecDeque::new(),
            tasks: VecDeque::new(),
            variables: Vec::new(),
            root_statements: Vec::new(),
            script_scope,
        }
    }

    pub fn compile(mut self, source: &str) {
        let ast = match scriba_syntax::parse(source) {
            Ok(ast) => Rc::new(ast),
            Err(scriba_syntax::Error::Lexical(e)) => {
                self.engine
                    .script_mut(self.script)
                    .diagnostics
                    .lexical_error(&e);
                return;
            }
            Err(scriba_syntax::Error::Syntax(e)) => {
                self.engine
                    .script_mut(self.script)
                    .diagnostics
                    .syntax_error(e.error, rowan::TextRange::empty(e.offset));
                return;
            }
        };

        self.engine.script_mut(self.script).ast = Some(ast.clone());
        self.ast = Some(ast.clone());

        // First pass: collect declarations; everything else belongs to the
        // root function.
        for stmt in &ast.statements {
            match stmt {
                ast::Stmt::Decl(decl) => {
                    self.process_or_collect(decl.clone(), self.script_scope);
                }
                other => self.root_statements.push(other.clone()),
            }
        }

        self.process_pending_declarations();
        self.compile_functions();
        self.compile_root_function();
        self.process_variables();

        self.engine.script_mut(self.script).compiled = true;
    }

    pub(crate) fn source(&self) -> Rc<ast::Ast> {
        self.ast.clone().expect("ast is set before processing")
    }

    fn diagnose(&mut self, failure: CompilationFailure) {
        self.engine
            .script_mut(self.script)
            .diagnostics
            .error(failure.error, failure.span);
    }

    // -- Pass loop ----------------------------------------------------------

    fn process_or_collect(&mut self, declaration: ast::Decl, scope: ScopeId) {
        match self.process_declaration(&declaration, scope) {
            Ok(()) => {}
            Err(failure) if failure.is_reprocessable() => {
                self.queue.push_back(ScopedDeclaration { declaration, scope });
            }
            Err(failure) => self.diagnose(failure),
        }
    }

    /// Runs passes over the re-queued declarations until the queue empties
    /// or a full pass makes no progress.
    fn process_pending_declarations(&mut self) {
        while !self.queue.is_empty() {
            let mut progress = false;
            let pending: Vec<ScopedDeclaration> = self.queue.drain(..).collect();

            for item in pending {
                match self.process_declaration(&item.declaration, item.scope) {
                    Ok(()) => progress = true,
                    Err(failure) if failure.is_reprocessable() => {
                        self.queue.push_back(item);
                    }
                    Err(failure) => {
                        self.diagnose(failure);
                        progress = true;
                    }
                }
            }

            if !progress {
                // Stuck: report what is left and stop.
                let stuck: Vec<ScopedDeclaration> = self.queue.drain(..).collect();
                for item in stuck {
                    let span = item.declaration.base_token().span;
                    self.diagnose(CompilationFailure::new(CompilerError::InvalidTypeName, span));
                }
                return;
            }
        }
    }

    fn compile_functions(&mut self) {
        while let Some(task) = self.tasks.pop_front() {
            let ast = self.source();
            let result = super::function::FunctionCompiler::compile_task(
                self.engine,
                &mut self.scopes,
                &mut self.tnp,
                &ast,
                &task,
            );
            if let Err(failure) = result {
                self.diagnose(failure);
            }
        }
    }

    fn compile_root_function(&mut self) {
        if self.root_statements.is_empty() {
            return;
        }

        let root_fn = self.engine.add_function(FunctionData {
            kind: FunctionKind::Regular {
                name: "__root".to_owned(),
            },
            prototype: Prototype::new(Type::VOID, Vec::new()),
            flags: FunctionFlags::default(),
            owner: Symbol::Namespace(self.engine.root_namespace()),
            access: AccessSpecifier::Public,
            default_arguments: Vec::new(),
            virtual_index: None,
            body: None,
        });
        self.engine.script_mut(self.script).root_function = Some(root_fn);

        let ast = self.source();
        let statements = std::mem::take(&mut self.root_statements);
        let result = super::function::FunctionCompiler::compile_root(
            self.engine,
            &mut self.scopes,
            &mut self.tnp,
            &ast,
            self.script,
            self.script_scope,
            root_fn,
            &statements,
        );
        if let Err(failure) = result {
            self.diagnose(failure);
        }
    }

    fn process_variables(&mut self) {
        let pending = std::mem::take(&mut self.variables);
        let ast = self.source();
        for item in pending {
            let result = super::variable::process_variable(
                self.engine,
                &mut self.scopes,
                &mut self.tnp,
                &ast,
                self.script,
                &item,
            );
            if let Err(failure) = result {
                self.diagnose(failure);
            }
        }
    }

    // -- Declaration processing --------------------------------------------

    fn process_declaration(
        &mut self,
        declaration: &ast::Decl,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        match declaration {
            ast::Decl::Class(decl) => self.process_class_declaration(decl, scope),
            ast::Decl::Enum(decl) => self.process_enum_declaration(decl, scope),
            ast::Decl::Function(decl) => self.process_function_declaration(decl, scope),
            ast::Decl::Variable(decl) => self.process_global_variable(decl, scope),
            ast::Decl::Typedef(decl) => self.process_typedef(decl, scope),
            ast::Decl::TypeAlias(decl) => self.process_type_alias(decl, scope),
            ast::Decl::Namespace(decl) => self.process_namespace_declaration(decl, scope),
            ast::Decl::NamespaceAlias(decl) => self.process_namespace_alias(decl, scope),
            ast::Decl::Using(decl) => self.process_using_declaration(decl, scope),
            ast::Decl::UsingDirective(decl) => self.process_using_directive(decl, scope),
            ast::Decl::Import(decl) => {
                let ast = self.source();
                super::import::process_import(self.engine, decl, ast)
            }
            ast::Decl::Template(decl) => self.process_template_declaration(decl, scope),
            ast::Decl::Friend(decl) => {
                // Friends are only meaningful inside a class body.
                Err(CompilationFailure::new(
                    CompilerError::FriendMustBeAClass,
                    decl.friend_keyword.span,
                ))
            }
        }
    }

    fn process_class_declaration(
        &mut self,
        decl: &Rc<ast::ClassDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let output = build_class(
            self.engine,
            &mut self.scopes,
            &mut self.tnp,
            self.script,
            &ast.source,
            decl,
            scope,
            None,
        )?;
        self.tasks.extend(output.tasks);
        self.variables.extend(output.variables);
        Ok(())
    }

    fn process_enum_declaration(
        &mut self,
        decl: &Rc<ast::EnumDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());
        let enum_id = build_enum(
            self.engine,
            &ast.source,
            decl,
            Symbol::Namespace(namespace),
        )?;
        self.engine.namespace_mut(namespace).enums.push(enum_id);
        Ok(())
    }

    fn process_function_declaration(
        &mut self,
        decl: &Rc<ast::FunctionDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());

        let function = register_function(
            self.engine,
            &mut self.scopes,
            &mut self.tnp,
            &ast.source,
            decl,
            scope,
            Symbol::Namespace(namespace),
            None,
            AccessSpecifier::Public,
        )?;

        match self.engine.function(function).kind.clone() {
            FunctionKind::Regular { .. } => {
                self.engine.namespace_mut(namespace).functions.push(function);
            }
            FunctionKind::Operator(_) => {
                self.engine.namespace_mut(namespace).operators.push(function);
            }
            FunctionKind::LiteralOperator { .. } => {
                self.engine
                    .namespace_mut(namespace)
                    .literal_operators
                    .push(function);
            }
            _ => {
                return Err(CompilationFailure::new(
                    CompilerError::ExpectedDeclaration,
                    decl.name.span(),
                ));
            }
        }

        if decl.body.is_some() {
            self.tasks.push_back(CompileFunctionTask {
                function,
                declaration: decl.clone(),
                scope,
                script: self.script,
            });
        }

        Ok(())
    }

    fn process_global_variable(
        &mut self,
        decl: &Rc<ast::VariableDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let name = token_text(&ast.source, &decl.name).to_owned();

        let ty = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            resolve_type(&mut ctx, &decl.var_type, scope)?
        };

        if ty.is_auto() {
            return Err(CompilationFailure::new(
                CompilerError::GlobalVariablesCannotBeAuto,
                decl.name.span,
            ));
        }
        if decl.init.is_none() {
            return Err(CompilationFailure::new(
                CompilerError::GlobalVariablesMustBeInitialized,
                decl.name.span,
            ));
        }

        let index = {
            let script = self.engine.script_mut(self.script);
            let index = script.globals.len();
            script.globals.insert(name.clone(), ty);
            script.global_inits.push(None);
            index
        };

        // Namespace-level variables stay reachable by qualified name.
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());
        self.engine.namespace_mut(namespace).variables.insert(
            name,
            GlobalVariable {
                ty,
                script: self.script,
                index,
            },
        );

        self.variables.push(PendingVariable {
            declaration: decl.clone(),
            scope,
            class: None,
        });

        Ok(())
    }

    fn process_typedef(
        &mut self,
        decl: &Rc<ast::TypedefDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let ty = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            resolve_type(&mut ctx, &decl.qualified_type, scope)?
        };

        let name = token_text(&ast.source, &decl.name).to_owned();
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());
        self.engine
            .namespace_mut(namespace)
            .typedefs
            .insert(name, ty);
        Ok(())
    }

    fn process_type_alias(
        &mut self,
        decl: &Rc<ast::TypeAliasDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let ty = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            match NameLookup::resolve(&mut ctx, &decl.aliased_type, scope)? {
                NameResolution::Type(t) => t,
                _ => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidTypeName,
                        decl.aliased_type.span(),
                    ));
                }
            }
        };

        let name = token_text(&ast.source, &decl.alias_name).to_owned();
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());
        self.engine
            .namespace_mut(namespace)
            .typedefs
            .insert(name, ty);
        Ok(())
    }

    fn process_namespace_declaration(
        &mut self,
        decl: &Rc<ast::NamespaceDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        // Namespaces only nest inside namespaces (or the script top level).
        let inside_namespace = self.scopes.chain(scope).iter().all(|&s| {
            matches!(
                self.scopes.node(s).kind,
                ScopeKind::Namespace(_) | ScopeKind::RootNamespace | ScopeKind::Script(_)
            )
        });
        if !inside_namespace {
            return Err(CompilationFailure::new(
                CompilerError::NamespaceDeclarationCannotAppearAtThisLevel,
                decl.namespace_keyword.span,
            ));
        }

        let ast = self.source();
        let name = token_text(&ast.source, &decl.name).to_owned();
        let parent = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());
        let namespace = self.engine.get_or_create_namespace(parent, &name);
        let inner_scope = self.scopes.add(Some(scope), ScopeKind::Namespace(namespace));

        for stmt in &decl.statements {
            match stmt {
                ast::Stmt::Decl(inner) => self.process_or_collect(inner.clone(), inner_scope),
                other => {
                    self.diagnose(CompilationFailure::new(
                        CompilerError::ExpectedDeclaration,
                        other.base_token().span,
                    ));
                }
            }
        }

        Ok(())
    }

    fn process_namespace_alias(
        &mut self,
        decl: &Rc<ast::NamespaceAliasDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let target = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            match NameLookup::resolve(&mut ctx, &decl.aliased_name, scope)? {
                NameResolution::Namespace(ns) => ns,
                _ => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidNameInUsingDirective,
                        decl.aliased_name.span(),
                    ));
                }
            }
        };

        let alias = token_text(&ast.source, &decl.alias_name).to_owned();
        self.scopes
            .node_mut(scope)
            .injections
            .namespace_aliases
            .insert(alias, target);
        Ok(())
    }

    fn process_using_declaration(
        &mut self,
        decl: &Rc<ast::UsingDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let id = ast::Identifier::Scoped(decl.used_name.clone());
        let name = id.name_text(&ast.source).to_owned();

        let symbol = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            match NameLookup::resolve(&mut ctx, &id, scope)? {
                NameResolution::Type(t) => {
                    if let Some(c) = ctx.engine.type_system().get_class(t.base_type()) {
                        Symbol::Class(c)
                    } else if let Some(e) = ctx.engine.type_system().get_enum(t.base_type()) {
                        Symbol::Enum(e)
                    } else {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidNameInUsingDirective,
                            id.span(),
                        ));
                    }
                }
                NameResolution::Function(fs) if !fs.is_empty() => Symbol::Function(fs[0]),
                NameResolution::Namespace(ns) => Symbol::Namespace(ns),
                NameResolution::Template(t) => Symbol::Template(t),
                _ => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidNameInUsingDirective,
                        id.span(),
                    ));
                }
            }
        };

        self.scopes
            .node_mut(scope)
            .injections
            .names
            .push((name, symbol));
        Ok(())
    }

    fn process_using_directive(
        &mut self,
        decl: &Rc<ast::UsingDirectiveDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let namespace = {
            let mut ctx = LookupContext {
                engine: &mut *self.engine,
                scopes: &mut self.scopes,
                source: &ast.source,
                tnp: &mut self.tnp,
            };
            match NameLookup::resolve(&mut ctx, &decl.namespace_name, scope)? {
                NameResolution::Namespace(ns) => ns,
                _ => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidNameInUsingDirective,
                        decl.namespace_name.span(),
                    ));
                }
            }
        };

        self.scopes
            .node_mut(scope)
            .injections
            .namespaces
            .push(namespace);
        Ok(())
    }

    fn process_template_declaration(
        &mut self,
        decl: &Rc<ast::TemplateDecl>,
        scope: ScopeId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();
        let namespace = self
            .scopes
            .enclosing_namespace(scope, self.engine.root_namespace());

        let parameters = template_parameters(&ast.source, decl);

        if decl.is_full_specialization() || decl.is_partial_specialization() {
            return self.attach_specialization(decl, parameters, namespace);
        }

        let (name, kind) = match &decl.declaration {
            ast::Decl::Class(class_decl) => {
                let name = class_decl.name.name_text(&ast.source).to_owned();
                (
                    name,
                    TemplateKind::Class {
                        decl: class_decl.clone(),
                        specializations: Vec::new(),
                        instances: IndexMap::new(),
                    },
                )
            }
            ast::Decl::Function(fun_decl) => {
                let name = fun_decl.name.name_text(&ast.source).to_owned();
                (
                    name,
                    TemplateKind::Function {
                        decl: fun_decl.clone(),
                        instances: IndexMap::new(),
                    },
                )
            }
            other => {
                return Err(CompilationFailure::new(
                    CompilerError::ExpectedDeclaration,
                    other.base_token().span,
                ));
            }
        };

        let template = self.engine.add_template(TemplateData {
            name,
            parameters,
            enclosing: Symbol::Namespace(namespace),
            script: self.script,
            declaration: decl.clone(),
            kind,
        });
        self.engine.namespace_mut(namespace).templates.push(template);
        Ok(())
    }

    fn attach_specialization(
        &mut self,
        decl: &Rc<ast::TemplateDecl>,
        parameters: Vec<TemplateParameterDef>,
        namespace: NamespaceId,
    ) -> Result<(), CompilationFailure> {
        let ast = self.source();

        let (name, span, is_class) = match &decl.declaration {
            ast::Decl::Class(class_decl) => (
                class_decl.name.name_text(&ast.source).to_owned(),
                class_decl.name.span(),
                true,
            ),
            ast::Decl::Function(fun_decl) => (
                fun_decl.name.name_text(&ast.source).to_owned(),
                fun_decl.name.span(),
                false,
            ),
            other => {
                return Err(CompilationFailure::new(
                    CompilerError::ExpectedDeclaration,
                    other.base_token().span,
                ));
            }
        };

        let primary = self
            .engine
            .namespace(namespace)
            .templates
            .iter()
            .copied()
            .find(|&t| self.engine.template(t).name == name);

        let Some(primary) = primary else {
            let code = if is_class {
                CompilerError::CouldNotFindPrimaryClassTemplate
            } else {
                CompilerError::CouldNotFindPrimaryFunctionTemplate
            };
            return Err(CompilationFailure::new(code, span));
        };

        match &mut self.engine.template_mut(primary).kind {
            TemplateKind::Class { specializations, .. } if is_class => {
                specializations.push(TemplateSpecialization {
                    parameters,
                    decl: decl.clone(),
                    script: self.script,
                });
                Ok(())
            }
            _ => {
                let code = if is_class {
                    CompilerError::CouldNotFindPrimaryClassTemplate
                } else {
                    CompilerError::CouldNotFindPrimaryFunctionTemplate
                };
                Err(CompilationFailure::new(code, span))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Shared builders (also used by template instantiation)
// ---------------------------------------------------------------------------

pub(crate) struct ClassBuildOutput {
    pub class: ClassId,
    pub tasks: Vec<CompileFunctionTask>,
    pub variables: Vec<PendingVariable>,
}

pub(crate) fn template_parameters(
    source: &str,
    decl: &ast::TemplateDecl,
) -> Vec<TemplateParameterDef> {
    decl.parameters
        .iter()
        .map(|p| TemplateParameterDef {
            kind: match p.kind.kind {
                TokenKind::Int => TemplateParameterKind::IntParameter,
                TokenKind::Bool => TemplateParameterKind::BoolParameter,
                _ => TemplateParameterKind::TypeParameter,
            },
            name: token_text(source, &p.name).to_owned(),
            has_default: p.default_value.is_some(),
        })
        .collect()
}

/// Registers a class (or class-template instance) and all of its members.
///
/// Registration is transactional: when a type fails to resolve mid-way, the
/// type system is rolled back and the error propagates so the caller can
/// re-queue the declaration.
#[allow(clippy::too_many_arguments)]
pub(crate) fn build_class(
    engine: &mut Engine,
    scopes: &mut Scopes,
    tnp: &mut dyn crate::lookup::TemplateNameProcessor,
    script: ScriptId,
    source: &str,
    decl: &Rc<ast::ClassDecl>,
    scope: ScopeId,
    instance: Option<(String, TemplateId, Vec<TemplateArgument>)>,
) -> Result<ClassBuildOutput, CompilationFailure> {
    let snapshot = engine.type_system().snapshot();

    match build_class_inner(engine, scopes, tnp, script, source, decl, scope, instance) {
        Ok(output) => Ok(output),
        Err(failure) => {
            engine.type_system_mut().rollback_to(snapshot);
            Err(failure)
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_class_inner(
    engine: &mut Engine,
    scopes: &mut Scopes,
    tnp: &mut dyn crate::lookup::TemplateNameProcessor,
    script: ScriptId,
    source: &str,
    decl: &Rc<ast::ClassDecl>,
    scope: ScopeId,
    instance: Option<(String, TemplateId, Vec<TemplateArgument>)>,
) -> Result<ClassBuildOutput, CompilationFailure> {
    let is_instance = instance.is_some();
    let name = match &instance {
        Some((name, _, _)) => name.clone(),
        None => decl.name.name_text(source).to_owned(),
    };

    // Resolve the base class before registering anything.
    let parent = match &decl.parent {
        Some(parent_id) => {
            let mut ctx = LookupContext {
                engine: &mut *engine,
                scopes: &mut *scopes,
                source,
                tnp: &mut *tnp,
            };
            match NameLookup::resolve(&mut ctx, parent_id, scope)? {
                NameResolution::Type(t) => {
                    let Some(parent_class) = ctx.engine.type_system().get_class(t.base_type())
                    else {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidBaseClass,
                            parent_id.span(),
                        ));
                    };
                    Some(parent_class)
                }
                NameResolution::Unknown => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidTypeName,
                        parent_id.span(),
                    ));
                }
                _ => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidBaseClass,
                        parent_id.span(),
                    ));
                }
            }
        }
        None => None,
    };

    let enclosing = enclosing_symbol(engine, scopes, scope);
    let vtable = parent.map(|p| engine.class(p).vtable.clone()).unwrap_or_default();

    let (class_id, class_type) = engine.type_system_mut().register_class(ClassData {
        name,
        ty: Type::NULL,
        parent,
        enclosing,
        data_members: Vec::new(),
        static_data_members: IndexMap::new(),
        constructors: Vec::new(),
        destructor: None,
        methods: Vec::new(),
        operators: Vec::new(),
        casts: Vec::new(),
        vtable,
        classes: Vec::new(),
        enums: Vec::new(),
        typedefs: IndexMap::new(),
        templates: Vec::new(),
        friends: Vec::new(),
        template_instance_of: instance.as_ref().map(|(_, t, args)| (*t, args.clone())),
    });

    let class_scope = scopes.add(Some(scope), ScopeKind::Class(class_id));

    // Members default to public; `private:` / `protected:` narrow from
    // there.
    let mut access = AccessSpecifier::Public;

    let mut tasks = Vec::new();
    let mut variables = Vec::new();

    for item in &decl.content {
        match item {
            ast::ClassContent::AccessSpecifier(spec) => {
                access = match spec.visibility.kind {
                    TokenKind::Public => AccessSpecifier::Public,
                    TokenKind::Protected => AccessSpecifier::Protected,
                    _ => AccessSpecifier::Private,
                };
            }
            ast::ClassContent::Declaration(ast::Decl::Variable(member)) => {
                build_class_variable(
                    engine, scopes, tnp, script, source, class_id, class_scope, member, access,
                    &mut variables,
                )?;
            }
            ast::ClassContent::Declaration(ast::Decl::Function(member)) => {
                let function = register_function(
                    engine,
                    scopes,
                    tnp,
                    source,
                    member,
                    class_scope,
                    Symbol::Class(class_id),
                    Some(class_type),
                    access,
                )?;

                attach_member_function(engine, class_id, function);

                let needs_body = member.body.is_some() || member.is_defaulted();
                if needs_body {
                    tasks.push(CompileFunctionTask {
                        function,
                        declaration: member.clone(),
                        scope: class_scope,
                        script,
                    });
                }
            }
            ast::ClassContent::Declaration(ast::Decl::Class(nested)) => {
                let output =
                    build_class(engine, scopes, tnp, script, source, nested, class_scope, None)?;
                engine.class_mut(class_id).classes.push(output.class);
                tasks.extend(output.tasks);
                variables.extend(output.variables);
            }
            ast::ClassContent::Declaration(ast::Decl::Enum(nested)) => {
                let enum_id = build_enum(engine, source, nested, Symbol::Class(class_id))?;
                engine.class_mut(class_id).enums.push(enum_id);
            }
            ast::ClassContent::Declaration(ast::Decl::Typedef(td)) => {
                let ty = {
                    let mut ctx = LookupContext {
                        engine,
                        scopes,
                        source,
                        tnp,
                    };
                    resolve_type(&mut ctx, &td.qualified_type, class_scope)?
                };
                let name = token_text(source, &td.name).to_owned();
                engine.class_mut(class_id).typedefs.insert(name, ty);
            }
            ast::ClassContent::Declaration(ast::Decl::Friend(friend)) => {
                let mut ctx = LookupContext {
                    engine: &mut *engine,
                    scopes: &mut *scopes,
                    source,
                    tnp: &mut *tnp,
                };
                match NameLookup::resolve(&mut ctx, &friend.class_name, class_scope)? {
                    NameResolution::Type(t) => {
                        let Some(friend_class) = ctx.engine.type_system().get_class(t.base_type())
                        else {
                            return Err(CompilationFailure::new(
                                CompilerError::FriendMustBeAClass,
                                friend.class_name.span(),
                            ));
                        };
                        engine.class_mut(class_id).friends.push(friend_class);
                    }
                    NameResolution::Unknown => {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidTypeName,
                            friend.class_name.span(),
                        ));
                    }
                    _ => {
                        return Err(CompilationFailure::new(
                            CompilerError::FriendMustBeAClass,
                            friend.class_name.span(),
                        ));
                    }
                }
            }
            ast::ClassContent::Declaration(ast::Decl::Template(member_template)) => {
                let parameters = template_parameters(source, member_template);
                let (name, kind) = match &member_template.declaration {
                    ast::Decl::Class(class_decl) => (
                        class_decl.name.name_text(source).to_owned(),
                        TemplateKind::Class {
                            decl: class_decl.clone(),
                            specializations: Vec::new(),
                            instances: IndexMap::new(),
                        },
                    ),
                    ast::Decl::Function(fun_decl) => (
                        fun_decl.name.name_text(source).to_owned(),
                        TemplateKind::Function {
                            decl: fun_decl.clone(),
                            instances: IndexMap::new(),
                        },
                    ),
                    other => {
                        return Err(CompilationFailure::new(
                            CompilerError::ExpectedDeclaration,
                            other.base_token().span,
                        ));
                    }
                };
                let template = engine.add_template(TemplateData {
                    name,
                    parameters,
                    enclosing: Symbol::Class(class_id),
                    script,
                    declaration: member_template.clone(),
                    kind,
                });
                engine.class_mut(class_id).templates.push(template);
            }
            ast::ClassContent::Declaration(ast::Decl::TypeAlias(alias)) => {
                let mut ctx = LookupContext {
                    engine: &mut *engine,
                    scopes: &mut *scopes,
                    source,
                    tnp: &mut *tnp,
                };
                let ty = match NameLookup::resolve(&mut ctx, &alias.aliased_type, class_scope)? {
                    NameResolution::Type(t) => t,
                    _ => {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidTypeName,
                            alias.aliased_type.span(),
                        ));
                    }
                };
                let name = token_text(source, &alias.alias_name).to_owned();
                engine.class_mut(class_id).typedefs.insert(name, ty);
            }
            ast::ClassContent::Declaration(other) => {
                return Err(CompilationFailure::new(
                    CompilerError::ExpectedDeclaration,
                    other.base_token().span,
                ));
            }
        }
    }

    // Anonymous template instances are not listed in any namespace.
    if !is_instance {
        match enclosing {
            Symbol::Namespace(ns) => engine.namespace_mut(ns).classes.push(class_id),
            Symbol::Class(_) => { /* added by the enclosing build */ }
            _ => {}
        }
    }

    Ok(ClassBuildOutput {
        class: class_id,
        tasks,
        variables,
    })
}

#[allow(clippy::too_many_arguments)]
fn build_class_variable(
    engine: &mut Engine,
    scopes: &mut Scopes,
    tnp: &mut dyn crate::lookup::TemplateNameProcessor,
    script: ScriptId,
    source: &str,
    class_id: ClassId,
    class_scope: ScopeId,
    member: &Rc<ast::VariableDecl>,
    access: AccessSpecifier,
    variables: &mut Vec<PendingVariable>,
) -> Result<(), CompilationFailure> {
    let ty = {
        let mut ctx = LookupContext {
            engine: &mut *engine,
            scopes: &mut *scopes,
            source,
            tnp: &mut *tnp,
        };
        resolve_type(&mut ctx, &member.var_type, class_scope)?
    };

    if ty.is_auto() {
        return Err(CompilationFailure::new(
            CompilerError::DataMemberCannotBeAuto,
            member.name.span,
        ));
    }

    let name = token_text(source, &member.name).to_owned();

    if member.static_specifier.is_some() {
        if member.init.is_none() {
            return Err(CompilationFailure::new(
                CompilerError::MissingStaticInitialization,
                member.name.span,
            ));
        }

        // Static members are stored among the script's globals. A re-queued
        // class may register twice; the slot stays stable.
        let qualified = format!("{}::{}", engine.class(class_id).name, name);
        let index = {
            let data = engine.script_mut(script);
            match data.globals.get_index_of(&qualified) {
                Some(index) => index,
                None => {
                    let index = data.globals.len();
                    data.globals.insert(qualified, ty);
                    data.global_inits.push(None);
                    index
                }
            }
        };

        engine.class_mut(class_id).static_data_members.insert(
            name,
            StaticDataMember {
                ty,
                access,
                script,
                index,
                init: None,
            },
        );
        variables.push(PendingVariable {
            declaration: member.clone(),
            scope: class_scope,
            class: Some(class_id),
        });
        return Ok(());
    }

    engine
        .class_mut(class_id)
        .data_members
        .push(crate::symbols::DataMember {
            name,
            ty,
            access,
            default_value: member.init.clone(),
        });
    Ok(())
}

fn enclosing_symbol(engine: &Engine, scopes: &Scopes, scope: ScopeId) -> Symbol {
    for s in scopes.chain(scope) {
        match scopes.node(s).kind {
            ScopeKind::Class(c) => return Symbol::Class(c),
            ScopeKind::Namespace(n) => return Symbol::Namespace(n),
            ScopeKind::RootNamespace => return Symbol::Namespace(engine.root_namespace()),
            _ => {}
        }
    }
    Symbol::Namespace(engine.root_namespace())
}

/// Registers an enum and its values.
pub(crate) fn build_enum(
    engine: &mut Engine,
    source: &str,
    decl: &Rc<ast::EnumDecl>,
    enclosing: Symbol,
) -> Result<crate::symbols::EnumId, CompilationFailure> {
    let mut values = IndexMap::new();
    let mut next = 0;

    for value in &decl.values {
        let n = match &value.value {
            None => next,
            Some(expr) => enum_value(source, expr).ok_or_else(|| {
                CompilationFailure::new(CompilerError::InvalidLiteralTemplateArgument, expr.span())
            })?,
        };
        values.insert(token_text(source, &value.name).to_owned(), n);
        next = n + 1;
    }

    let (enum_id, _) = engine.type_system_mut().register_enum(EnumData {
        name: token_text(source, &decl.name).to_owned(),
        ty: Type::NULL,
        enum_class: decl.class_keyword.is_some(),
        enclosing,
        values,
    });

    Ok(enum_id)
}

fn enum_value(source: &str, expr: &ast::Expr) -> Option<i32> {
    match expr {
        ast::Expr::Literal(ast::Literal::Integer(tok)) => {
            parse_integer_literal(token_text(source, tok))
        }
        ast::Expr::Operation(op) if op.op.kind == TokenKind::Minus && op.arg2.is_none() => {
            match &op.arg1 {
                ast::Expr::Literal(ast::Literal::Integer(tok)) => {
                    parse_integer_literal(token_text(source, tok)).map(|n| -n)
                }
                _ => None,
            }
        }
        _ => None,
    }
}

/// Builds the prototype of a function declaration and registers it.
///
/// `member_of` carries the class type for member functions; the implicit
/// object becomes a `this`-flagged reference parameter.
#[allow(clippy::too_many_arguments)]
pub(crate) fn register_function(
    engine: &mut Engine,
    scopes: &mut Scopes,
    tnp: &mut dyn crate::lookup::TemplateNameProcessor,
    source: &str,
    decl: &Rc<ast::FunctionDecl>,
    scope: ScopeId,
    owner: Symbol,
    member_of: Option<Type>,
    access: AccessSpecifier,
) -> Result<FunctionId, CompilationFailure> {
    let span = decl.name.span();
    let class_id = owner.as_class();

    // Specifier validity.
    if member_of.is_none() {
        if decl.virtual_keyword.is_some() {
            return Err(CompilationFailure::new(
                CompilerError::InvalidUseOfVirtualKeyword,
                span,
            ));
        }
        if decl.explicit_keyword.is_some() {
            return Err(CompilationFailure::new(
                CompilerError::InvalidUseOfExplicitKeyword,
                span,
            ));
        }
    }

    let kind = match &decl.kind {
        ast::FunctionDeclKind::Function => {
            let ast::Identifier::Simple(simple) = &decl.name else {
                return Err(CompilationFailure::new(
                    CompilerError::ExpectedDeclaration,
                    span,
                ));
            };
            FunctionKind::Regular {
                name: token_text(source, &simple.name).to_owned(),
            }
        }
        ast::FunctionDeclKind::Constructor { .. } => FunctionKind::Constructor,
        ast::FunctionDeclKind::Destructor { .. } => FunctionKind::Destructor,
        ast::FunctionDeclKind::Cast { .. } => FunctionKind::Cast,
        ast::FunctionDeclKind::OperatorOverload => match &decl.name {
            ast::Identifier::Operator(op_name) => {
                let Some(op) = op_name.operator_id() else {
                    return Err(CompilationFailure::new(
                        CompilerError::CouldNotResolveOperatorName,
                        span,
                    ));
                };
                FunctionKind::Operator(op)
            }
            ast::Identifier::LiteralOperator(lon) => {
                if member_of.is_some() {
                    return Err(CompilationFailure::new(
                        CompilerError::LiteralOperatorNotInNamespace,
                        span,
                    ));
                }
                FunctionKind::LiteralOperator {
                    suffix: token_text(source, &lon.suffix).to_owned(),
                }
            }
            _ => {
                return Err(CompilationFailure::new(
                    CompilerError::CouldNotResolveOperatorName,
                    span,
                ));
            }
        },
    };

    // Operators that mutate or alias their object must be members.
    if let FunctionKind::Operator(op) = &kind
        && member_of.is_none()
        && matches!(
            op,
            OperatorId::Assignment | OperatorId::FunctionCall | OperatorId::Subscript
        )
    {
        return Err(CompilationFailure::new(
            CompilerError::OpOverloadMustBeDeclaredAsMember,
            span,
        ));
    }

    // Return type.
    let return_type = match &kind {
        FunctionKind::Constructor => member_of.unwrap_or(Type::NULL),
        FunctionKind::Destructor => Type::VOID,
        _ => {
            let mut ctx = LookupContext {
                engine: &mut *engine,
                scopes: &mut *scopes,
                source,
                tnp: &mut *tnp,
            };
            resolve_type(&mut ctx, &decl.return_type, scope)?
        }
    };

    // Parameters.
    let mut params = Vec::new();

    let is_static = decl.static_keyword.is_some();
    if let Some(class_type) = member_of
        && !is_static
        && !matches!(kind, FunctionKind::Constructor)
    {
        let mut this_type = class_type.with_reference();
        if decl.const_qualifier.is_some() {
            this_type = this_type.with_const();
        }
        params.push(this_type.with_this());
    }

    let mut default_started = false;
    let mut ast_defaults = Vec::new();
    for param in &decl.params {
        let ty = {
            let mut ctx = LookupContext {
                engine: &mut *engine,
                scopes: &mut *scopes,
                source,
                tnp: &mut *tnp,
            };
            resolve_type(&mut ctx, &param.param_type, scope)?
        };
        params.push(ty);

        match &param.default_value {
            Some(default) => {
                default_started = true;
                ast_defaults.push((ty, default.clone()));
            }
            None if default_started => {
                return Err(CompilationFailure::new(
                    CompilerError::InvalidUseOfDefaultArgument,
                    span,
                ));
            }
            None => {}
        }
    }

    // Operator arity, counting the implicit object. Symbols shared between
    // the unary and binary flavors resolve by parameter count.
    let kind = match kind {
        FunctionKind::Operator(op) => {
            let op = match (op, params.len()) {
                (OperatorId::Addition, 1) => OperatorId::UnaryPlus,
                (OperatorId::Subtraction, 1) => OperatorId::UnaryMinus,
                (op, _) => op,
            };

            let matches_arity = match op {
                OperatorId::FunctionCall => !params.is_empty(),
                _ => params.len() == op.arity(),
            };
            if !matches_arity {
                return Err(CompilationFailure::new(
                    CompilerError::InvalidParamCountInOperatorOverload,
                    span,
                ));
            }
            FunctionKind::Operator(op)
        }
        other => other,
    };

    let prototype = match &kind {
        FunctionKind::Destructor => {
            Prototype::destructor(member_of.unwrap_or(Type::NULL))
        }
        _ => Prototype::new(return_type, params),
    };

    // Virtual dispatch slots.
    let mut flags = FunctionFlags {
        is_static,
        is_virtual: decl.is_virtual(),
        is_pure_virtual: decl.is_pure_virtual(),
        is_explicit: decl.explicit_keyword.is_some(),
        is_const: decl.const_qualifier.is_some(),
        is_deleted: decl.is_deleted(),
        is_defaulted: decl.is_defaulted(),
    };

    let mut virtual_index = None;
    if let (Some(class_id), FunctionKind::Regular { name }) = (class_id, &kind) {
        if let Some(slot) = find_override_slot(engine, class_id, name, &prototype) {
            flags.is_virtual = true;
            virtual_index = Some(slot);
        } else if flags.is_virtual {
            virtual_index = Some(engine.class(class_id).vtable.len());
        }
    }

    if flags.is_defaulted && !defaultable(&kind, &prototype, member_of) {
        return Err(CompilationFailure::new(
            CompilerError::FunctionCannotBeDefaulted,
            span,
        ));
    }

    let function = engine.add_function(FunctionData {
        kind,
        prototype,
        flags,
        owner,
        access,
        default_arguments: Vec::new(),
        virtual_index,
        body: None,
    });

    // Record the vtable slot.
    if let (Some(class_id), Some(slot)) = (class_id, virtual_index) {
        let vtable = &mut engine.class_mut(class_id).vtable;
        if slot == vtable.len() {
            vtable.push(function);
        } else {
            vtable[slot] = function;
        }
    }

    // Default arguments compile in the declaring scope.
    for (ty, default_expr) in ast_defaults {
        let compiled = super::function::FunctionCompiler::compile_default_argument(
            engine, scopes, tnp, source, scope, &default_expr, ty,
        )?;
        engine.function_mut(function).default_arguments.push(compiled);
    }

    // A bodyless declaration with an attribute may get a native body from
    // the host's function creator.
    if decl.body.is_none()
        && !decl.is_defaulted()
        && !decl.is_deleted()
        && let Some(attribute) = &decl.attribute
    {
        let text = &source[std::ops::Range::<usize>::from(attribute.expr.span())];
        let attribute = text.to_owned();
        engine.run_function_creator(function, &attribute);
    }

    Ok(function)
}

/// A method overriding a parent's virtual method reuses its slot.
fn find_override_slot(
    engine: &Engine,
    class: ClassId,
    name: &str,
    prototype: &Prototype,
) -> Option<usize> {
    let parent = engine.class(class).parent?;
    let vtable = &engine.class(parent).vtable;

    for (slot, &candidate) in vtable.iter().enumerate() {
        let func = engine.function(candidate);
        if func.name() != Some(name) {
            continue;
        }
        // Compare signatures, skipping the implicit object.
        if func.prototype.param_count() != prototype.param_count() {
            continue;
        }
        let same = func
            .prototype
            .params()
            .iter()
            .zip(prototype.params())
            .skip(1)
            .all(|(a, b)| a == b)
            && func.prototype.return_type() == prototype.return_type();
        if same {
            return Some(slot);
        }
    }

    None
}

/// Only special members can be `= default`.
fn defaultable(kind: &FunctionKind, prototype: &Prototype, member_of: Option<Type>) -> bool {
    let Some(class_type) = member_of else {
        return false;
    };

    match kind {
        FunctionKind::Destructor => true,
        FunctionKind::Constructor => match prototype.param_count() {
            0 => true,
            1 => {
                let p = prototype.param(0);
                p.base_type() == class_type.base_type()
                    && (p.is_const_reference() || p.is_forward_reference())
            }
            _ => false,
        },
        FunctionKind::Operator(OperatorId::Assignment) => true,
        _ => false,
    }
}

pub(crate) fn attach_member_function(engine: &mut Engine, class_id: ClassId, function: FunctionId) {
    match engine.function(function).kind.clone() {
        FunctionKind::Constructor => engine.class_mut(class_id).constructors.push(function),
        FunctionKind::Destructor => engine.class_mut(class_id).destructor = Some(function),
        FunctionKind::Operator(_) => engine.class_mut(class_id).operators.push(function),
        FunctionKind::Cast => engine.class_mut(class_id).casts.push(function),
        _ => engine.class_mut(class_id).methods.push(function),
    }
}

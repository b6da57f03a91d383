//! Template instantiation: memoized monomorphization of class and function
//! templates, partial-specialization selection and argument deduction.

use std::rc::Rc;

use indexmap::IndexMap;

use scriba_syntax::ast;
use scriba_syntax::{TokenKind, token_text};

use crate::engine::Engine;
use crate::error::{CompilationFailure, CompilerError};
use crate::lookup::{LookupContext, TemplateNameProcessor, parse_integer_literal};
use crate::scope::{ScopeId, ScopeKind, Scopes};
use crate::symbols::{
    FunctionId, Symbol, TemplateArgument, TemplateId, TemplateKind, TemplateParameterKind,
};
use crate::types::Type;

/// The default instantiation hook: monomorphize on demand, memoized per
/// argument tuple.
pub struct DefaultTemplateNameProcessor;

impl TemplateNameProcessor for DefaultTemplateNameProcessor {
    fn instantiate(
        &mut self,
        engine: &mut Engine,
        scopes: &mut Scopes,
        template: TemplateId,
        args: Vec<TemplateArgument>,
    ) -> Result<Type, CompilationFailure> {
        instantiate_class_template(engine, scopes, template, args)
    }
}

/// Builds a scope chain reflecting a symbol's lexical position.
pub(crate) fn scope_for_symbol(
    engine: &Engine,
    scopes: &mut Scopes,
    symbol: Symbol,
) -> ScopeId {
    match symbol {
        Symbol::Namespace(ns) => {
            if ns == engine.root_namespace() {
                scopes.add(None, ScopeKind::RootNamespace)
            } else {
                let parent = engine
                    .namespace(ns)
                    .parent
                    .map(Symbol::Namespace)
                    .unwrap_or(Symbol::Namespace(engine.root_namespace()));
                let parent_scope = scope_for_symbol(engine, scopes, parent);
                scopes.add(Some(parent_scope), ScopeKind::Namespace(ns))
            }
        }
        Symbol::Class(class) => {
            let parent = engine.class(class).enclosing;
            let parent_scope = scope_for_symbol(engine, scopes, parent);
            scopes.add(Some(parent_scope), ScopeKind::Class(class))
        }
        _ => scopes.add(None, ScopeKind::RootNamespace),
    }
}

/// Fills the trailing defaulted parameters of a template-argument tuple.
fn complete_arguments(
    engine: &mut Engine,
    scopes: &mut Scopes,
    template: TemplateId,
    mut args: Vec<TemplateArgument>,
) -> Result<Vec<TemplateArgument>, CompilationFailure> {
    let data = engine.template(template);
    let param_count = data.parameters.len();
    if args.len() >= param_count {
        return Ok(args);
    }

    let declaration = data.declaration.clone();
    let enclosing = data.enclosing;
    let script = data.script;
    let source_ast = engine
        .script(script)
        .ast
        .clone()
        .expect("template scripts keep their ast");

    let base_scope = scope_for_symbol(engine, scopes, enclosing);

    for i in args.len()..param_count {
        let param = &declaration.parameters[i];
        let Some(default) = &param.default_value else {
            return Err(CompilationFailure::new(
                CompilerError::MissingNonDefaultedTemplateParameter,
                param.name.span,
            ));
        };

        // Defaults may reference earlier parameters.
        let mut bindings = IndexMap::new();
        for (j, bound) in args.iter().enumerate() {
            bindings.insert(
                token_text(&source_ast.source, &declaration.parameters[j].name).to_owned(),
                bound.clone(),
            );
        }
        let default_scope = scopes.add(Some(base_scope), ScopeKind::TemplateArguments(bindings));

        let mut tnp = DefaultTemplateNameProcessor;
        let mut ctx = LookupContext {
            engine: &mut *engine,
            scopes: &mut *scopes,
            source: &source_ast.source,
            tnp: &mut tnp,
        };

        let converted = match default {
            ast::TemplateArg::Type(qt) => {
                TemplateArgument::Type(crate::lookup::resolve_type(&mut ctx, qt, default_scope)?)
            }
            ast::TemplateArg::Expr(expr) => {
                constant_template_argument(&source_ast.source, expr).ok_or_else(|| {
                    CompilationFailure::new(
                        CompilerError::InvalidLiteralTemplateArgument,
                        expr.span(),
                    )
                })?
            }
        };

        args.push(converted);
    }

    Ok(args)
}

fn constant_template_argument(source: &str, expr: &ast::Expr) -> Option<TemplateArgument> {
    match expr {
        ast::Expr::Literal(ast::Literal::Integer(tok)) => {
            parse_integer_literal(token_text(source, tok)).map(TemplateArgument::Int)
        }
        ast::Expr::Literal(ast::Literal::Bool(tok)) => {
            Some(TemplateArgument::Bool(tok.kind == TokenKind::True))
        }
        _ => None,
    }
}

/// Renders `name<args...>` for the instance's class name.
fn instance_name(engine: &Engine, template: TemplateId, args: &[TemplateArgument]) -> String {
    let rendered: Vec<String> = args
        .iter()
        .map(|arg| match arg {
            TemplateArgument::Type(t) => engine.type_name(*t),
            TemplateArgument::Int(n) => n.to_string(),
            TemplateArgument::Bool(b) => b.to_string(),
        })
        .collect();
    format!("{}<{}>", engine.template(template).name, rendered.join(", "))
}

/// Instantiates a class template for an argument tuple.
///
/// Specializations are tried in declaration order; the first whose pattern
/// deduces successfully wins, otherwise the primary is used. The result is
/// memoized per tuple.
pub fn instantiate_class_template(
    engine: &mut Engine,
    scopes: &mut Scopes,
    template: TemplateId,
    args: Vec<TemplateArgument>,
) -> Result<Type, CompilationFailure> {
    let args = complete_arguments(engine, scopes, template, args)?;

    // Memoization.
    if let TemplateKind::Class { instances, .. } = &engine.template(template).kind
        && let Some(existing) = instances.get(&args)
    {
        return Ok(engine.class(*existing).ty);
    }

    let data = engine.template(template).clone();
    let TemplateKind::Class {
        decl: primary_decl,
        specializations,
        ..
    } = &data.kind
    else {
        return Err(CompilationFailure::new(
            CompilerError::CouldNotFindPrimaryClassTemplate,
            rowan::TextRange::default(),
        ));
    };

    let script_ast = engine
        .script(data.script)
        .ast
        .clone()
        .expect("template scripts keep their ast");

    // Pick the declaration and parameter bindings to compile with.
    let mut chosen_decl = primary_decl.clone();
    let mut bindings: IndexMap<String, TemplateArgument> = IndexMap::new();

    let mut matched = false;
    for spec in specializations {
        let spec_source = engine
            .script(spec.script)
            .ast
            .clone()
            .expect("specialization scripts keep their ast");
        let Some(class_decl) = spec.decl.class_decl() else {
            continue;
        };
        let Some(pattern) = class_decl.name.as_template() else {
            continue;
        };

        if let Some(deduced) = TemplatePatternMatching::match_arguments(
            &spec_source.source,
            &pattern.args,
            &args,
            &spec
                .parameters
                .iter()
                .map(|p| p.name.clone())
                .collect::<Vec<_>>(),
        ) {
            chosen_decl = class_decl.clone();
            bindings = deduced;
            matched = true;
            break;
        }
    }

    if !matched {
        for (param, arg) in data.parameters.iter().zip(&args) {
            bindings.insert(param.name.clone(), arg.clone());
        }
    }

    // Compile the chosen body in the template's lexical scope, under the
    // argument bindings.
    let base_scope = scope_for_symbol(engine, scopes, data.enclosing);
    let arg_scope = scopes.add(Some(base_scope), ScopeKind::TemplateArguments(bindings));

    let name = instance_name(engine, template, &args);
    let mut tnp = DefaultTemplateNameProcessor;
    let output = super::script::build_class(
        engine,
        scopes,
        &mut tnp,
        data.script,
        &script_ast.source,
        &chosen_decl,
        arg_scope,
        Some((name, template, args.clone())),
    )?;

    if let TemplateKind::Class { instances, .. } = &mut engine.template_mut(template).kind {
        instances.insert(args, output.class);
    }

    // Member bodies compile immediately.
    for task in &output.tasks {
        super::function::FunctionCompiler::compile_task(
            engine,
            scopes,
            &mut tnp,
            &script_ast,
            task,
        )?;
    }
    for pending in &output.variables {
        super::variable::process_variable(
            engine,
            scopes,
            &mut tnp,
            &script_ast,
            data.script,
            pending,
        )?;
    }

    Ok(engine.class(output.class).ty)
}

/// Instantiates a function template for a deduced argument tuple.
pub fn instantiate_function_template(
    engine: &mut Engine,
    scopes: &mut Scopes,
    template: TemplateId,
    args: Vec<TemplateArgument>,
) -> Result<FunctionId, CompilationFailure> {
    let args = complete_arguments(engine, scopes, template, args)?;

    if let TemplateKind::Function { instances, .. } = &engine.template(template).kind
        && let Some(existing) = instances.get(&args)
    {
        return Ok(*existing);
    }

    let data = engine.template(template).clone();
    let TemplateKind::Function { decl, .. } = &data.kind else {
        return Err(CompilationFailure::new(
            CompilerError::CouldNotFindPrimaryFunctionTemplate,
            rowan::TextRange::default(),
        ));
    };

    let script_ast = engine
        .script(data.script)
        .ast
        .clone()
        .expect("template scripts keep their ast");

    let mut bindings = IndexMap::new();
    for (param, arg) in data.parameters.iter().zip(&args) {
        bindings.insert(param.name.clone(), arg.clone());
    }

    let base_scope = scope_for_symbol(engine, scopes, data.enclosing);
    let arg_scope = scopes.add(Some(base_scope), ScopeKind::TemplateArguments(bindings));

    let mut tnp = DefaultTemplateNameProcessor;
    let function = super::script::register_function(
        engine,
        scopes,
        &mut tnp,
        &script_ast.source,
        decl,
        arg_scope,
        data.enclosing,
        None,
        crate::symbols::AccessSpecifier::Public,
    )?;

    if let TemplateKind::Function { instances, .. } = &mut engine.template_mut(template).kind {
        instances.insert(args, function);
    }

    if decl.body.is_some() {
        let task = super::CompileFunctionTask {
            function,
            declaration: decl.clone(),
            scope: arg_scope,
            script: data.script,
        };
        super::function::FunctionCompiler::compile_task(
            engine,
            scopes,
            &mut tnp,
            &script_ast,
            &task,
        )?;
    }

    Ok(function)
}

/// Unification of template-argument patterns against concrete arguments.
pub struct TemplatePatternMatching;

impl TemplatePatternMatching {
    /// Matches a specialization's pattern list (e.g. the `<T, T>` of
    /// `pair<T, T>`) against concrete arguments. Returns the deduced
    /// parameter bindings, or `None` when the pattern does not apply.
    pub fn match_arguments(
        source: &str,
        patterns: &[ast::TemplateArg],
        args: &[TemplateArgument],
        parameter_names: &[String],
    ) -> Option<IndexMap<String, TemplateArgument>> {
        if patterns.len() != args.len() {
            return None;
        }

        let mut bindings: IndexMap<String, TemplateArgument> = IndexMap::new();

        for (pattern, arg) in patterns.iter().zip(args) {
            if !Self::match_one(source, pattern, arg, parameter_names, &mut bindings) {
                return None;
            }
        }

        // Every specialization parameter must have been deduced.
        if parameter_names.iter().any(|p| !bindings.contains_key(p)) {
            return None;
        }

        Some(bindings)
    }

    fn match_one(
        source: &str,
        pattern: &ast::TemplateArg,
        arg: &TemplateArgument,
        parameter_names: &[String],
        bindings: &mut IndexMap<String, TemplateArgument>,
    ) -> bool {
        match pattern {
            ast::TemplateArg::Type(qt) => Self::match_type(source, qt, arg, parameter_names, bindings),
            ast::TemplateArg::Expr(expr) => match constant_template_argument(source, expr) {
                Some(constant) => constant == *arg,
                None => {
                    // A lone identifier can bind a value parameter.
                    if let ast::Expr::Id(ast::Identifier::Simple(simple)) = expr {
                        let name = token_text(source, &simple.name);
                        return Self::bind(name, arg.clone(), parameter_names, bindings);
                    }
                    false
                }
            },
        }
    }

    fn match_type(
        source: &str,
        pattern: &ast::QualifiedType,
        arg: &TemplateArgument,
        parameter_names: &[String],
        bindings: &mut IndexMap<String, TemplateArgument>,
    ) -> bool {
        let Some(name) = &pattern.name else {
            return false;
        };

        match name {
            ast::Identifier::Simple(simple) => {
                let text = token_text(source, &simple.name);

                // A parameter name binds whatever stands in its position
                // (with the pattern's own qualifiers stripped from types).
                if parameter_names.iter().any(|p| p == text) {
                    let bound = match arg {
                        TemplateArgument::Type(t) => {
                            let mut t = *t;
                            if pattern.is_const() {
                                t = t.without_const();
                            }
                            if pattern.is_ref() {
                                t = t.without_reference();
                            }
                            TemplateArgument::Type(t)
                        }
                        other => other.clone(),
                    };
                    return Self::bind(text, bound, parameter_names, bindings);
                }

                // A concrete fundamental name must match exactly.
                match (crate::lookup::fundamental_type(simple.name.kind), arg) {
                    (Some(t), TemplateArgument::Type(u)) => t == u.base_type(),
                    _ => false,
                }
            }
            _ => false,
        }
    }

    fn bind(
        name: &str,
        value: TemplateArgument,
        parameter_names: &[String],
        bindings: &mut IndexMap<String, TemplateArgument>,
    ) -> bool {
        if !parameter_names.iter().any(|p| p == name) {
            return false;
        }

        match bindings.get(name) {
            // Conflicting deductions for one parameter fail; agreeing
            // duplicates collapse.
            Some(existing) => *existing == value,
            None => {
                bindings.insert(name.to_owned(), value);
                true
            }
        }
    }
}

/// Deduction of function-template arguments from a call's argument types.
pub struct TemplateArgumentDeduction;

impl TemplateArgumentDeduction {
    pub fn deduce_from_call(
        engine: &Engine,
        template: TemplateId,
        arg_types: &[Type],
    ) -> Option<Vec<TemplateArgument>> {
        let data = engine.template(template);
        let TemplateKind::Function { decl, .. } = &data.kind else {
            return None;
        };

        let source_ast = engine.script(data.script).ast.clone()?;
        let source = &source_ast.source;

        let parameter_names: Vec<String> =
            data.parameters.iter().map(|p| p.name.clone()).collect();
        let mut bindings: IndexMap<String, TemplateArgument> = IndexMap::new();

        if decl.params.len() != arg_types.len() {
            return None;
        }

        for (param, &arg_type) in decl.params.iter().zip(arg_types) {
            let Some(name) = &param.param_type.name else {
                continue;
            };
            let ast::Identifier::Simple(simple) = name else {
                continue;
            };
            let text = token_text(source, &simple.name);

            if parameter_names.iter().any(|p| p == text) {
                let deduced =
                    TemplateArgument::Type(arg_type.base_type().without_const());
                match bindings.get(text) {
                    Some(existing) if *existing != deduced => return None,
                    Some(_) => {}
                    None => {
                        bindings.insert(text.to_owned(), deduced);
                    }
                }
            }
        }

        // Positions not deduced must have defaults.
        let mut out = Vec::with_capacity(data.parameters.len());
        for param in &data.parameters {
            match bindings.shift_remove(&param.name) {
                Some(arg) => out.push(arg),
                None if param.has_default => break,
                None => return None,
            }
        }

        Some(out)
    }
}

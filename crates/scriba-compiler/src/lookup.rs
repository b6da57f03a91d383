//! Name lookup.
//!
//! Resolution starts from a scope and walks the chain outward on a miss;
//! qualified names resolve their left part first and then look up the right
//! part *without* fallback inside the named scope. Template identifiers are
//! forwarded to a [`TemplateNameProcessor`] for instantiation.

use scriba_syntax::TokenKind;
use scriba_syntax::ast;
use scriba_syntax::operators::OperatorId;

use crate::engine::Engine;
use crate::error::{CompilationFailure, CompilerError};
use crate::prototype::Prototype;
use crate::scope::{ScopeId, ScopeKind, Scopes};
use crate::symbols::{
    ClassId, EnumId, FunctionId, NamespaceId, ScriptId, Symbol, TemplateArgument, TemplateId,
    TemplateParameterKind,
};
use crate::types::Type;
use crate::value::Value;

/// What a name resolved to.
#[derive(Debug, Clone)]
pub enum NameResolution {
    Unknown,
    /// All functions visible under the name.
    Function(Vec<FunctionId>),
    /// A non-static data member: class layout offset plus its type.
    DataMember { offset: usize, ty: Type },
    StaticDataMember { class: ClassId, name: String },
    EnumValue { enum_id: EnumId, value: i32 },
    Global { script: ScriptId, index: usize, ty: Type },
    /// Assigned by the function compiler before scope lookup runs.
    Local { stack_index: usize, ty: Type },
    Capture { capture_index: usize, ty: Type },
    Namespace(NamespaceId),
    Template(TemplateId),
    Type(Type),
    /// A compile-time constant (non-type template argument).
    Constant(Value),
}

/// Hook driving lazy template instantiation during lookup.
pub trait TemplateNameProcessor {
    fn instantiate(
        &mut self,
        engine: &mut Engine,
        scopes: &mut Scopes,
        template: TemplateId,
        args: Vec<TemplateArgument>,
    ) -> Result<Type, CompilationFailure>;
}

/// Everything a lookup needs, bundled to keep signatures flat.
pub struct LookupContext<'a> {
    pub engine: &'a mut Engine,
    pub scopes: &'a mut Scopes,
    pub source: &'a str,
    pub tnp: &'a mut dyn TemplateNameProcessor,
}

pub struct NameLookup;

impl NameLookup {
    /// Resolves an identifier starting from `scope`.
    pub fn resolve(
        ctx: &mut LookupContext<'_>,
        id: &ast::Identifier,
        scope: ScopeId,
    ) -> Result<NameResolution, CompilationFailure> {
        match id {
            ast::Identifier::Simple(simple) => {
                if let Some(t) = fundamental_type(simple.name.kind) {
                    return Ok(NameResolution::Type(t));
                }
                let name = scriba_syntax::token_text(ctx.source, &simple.name);
                Ok(Self::resolve_unqualified(ctx, name, scope))
            }
            ast::Identifier::Template(template_id) => {
                Self::resolve_template_id(ctx, template_id, scope)
            }
            ast::Identifier::Scoped(scoped) => Self::resolve_qualified(ctx, scoped, scope),
            ast::Identifier::Operator(op_name) => {
                let Some(op) = op_name.operator_id() else {
                    return Err(CompilationFailure::new(
                        CompilerError::CouldNotResolveOperatorName,
                        op_name.symbol.span,
                    ));
                };
                let functions = Self::resolve_operator(ctx.engine, ctx.scopes, op, &[], scope);
                Ok(NameResolution::Function(functions))
            }
            ast::Identifier::LiteralOperator(lon) => {
                let suffix = scriba_syntax::token_text(ctx.source, &lon.suffix);
                let functions = Self::resolve_literal_operator(ctx.engine, ctx.scopes, suffix, scope);
                Ok(NameResolution::Function(functions))
            }
        }
    }

    /// Unqualified lookup: each scope in the chain, innermost first.
    pub fn resolve_unqualified(
        ctx: &mut LookupContext<'_>,
        name: &str,
        scope: ScopeId,
    ) -> NameResolution {
        for node_id in ctx.scopes.chain(scope) {
            let resolution = Self::resolve_in_scope(ctx.engine, ctx.scopes, name, node_id);
            if !matches!(resolution, NameResolution::Unknown) {
                return resolution;
            }
        }
        NameResolution::Unknown
    }

    /// Lookup inside one scope node, with no chain fallback.
    fn resolve_in_scope(
        engine: &Engine,
        scopes: &Scopes,
        name: &str,
        scope: ScopeId,
    ) -> NameResolution {
        let node = scopes.node(scope);

        let mut resolution = match &node.kind {
            ScopeKind::RootNamespace => {
                Self::resolve_in_namespace(engine, name, engine.root_namespace())
            }
            ScopeKind::Namespace(ns) => Self::resolve_in_namespace(engine, name, *ns),
            ScopeKind::Class(class) => Self::resolve_in_class(engine, name, *class),
            ScopeKind::Enum(enum_id) => Self::resolve_in_enum(engine, name, *enum_id),
            ScopeKind::Script(script) => {
                let data = engine.script(*script);
                match data.globals.get_full(name) {
                    Some((index, _, ty)) => NameResolution::Global {
                        script: *script,
                        index,
                        ty: *ty,
                    },
                    None => NameResolution::Unknown,
                }
            }
            ScopeKind::TemplateArguments(map) => match map.get(name) {
                Some(TemplateArgument::Type(t)) => NameResolution::Type(*t),
                Some(TemplateArgument::Int(n)) => NameResolution::Constant(Value::Int(*n)),
                Some(TemplateArgument::Bool(b)) => NameResolution::Constant(Value::Bool(*b)),
                None => NameResolution::Unknown,
            },
            ScopeKind::FunctionLocal { .. } => NameResolution::Unknown,
        };

        // `using` injections extend the scope without altering the chain.
        if matches!(resolution, NameResolution::Unknown) {
            for (injected_name, symbol) in &node.injections.names {
                if injected_name == name {
                    resolution = Self::symbol_resolution(engine, *symbol);
                    break;
                }
            }
        }

        if matches!(resolution, NameResolution::Unknown) {
            if let Some(aliased) = node.injections.namespace_aliases.get(name) {
                return NameResolution::Namespace(*aliased);
            }
            for ns in &node.injections.namespaces {
                resolution = Self::resolve_in_namespace(engine, name, *ns);
                if !matches!(resolution, NameResolution::Unknown) {
                    break;
                }
            }
        }

        resolution
    }

    fn symbol_resolution(engine: &Engine, symbol: Symbol) -> NameResolution {
        match symbol {
            Symbol::Namespace(ns) => NameResolution::Namespace(ns),
            Symbol::Class(c) => NameResolution::Type(engine.class(c).ty),
            Symbol::Enum(e) => NameResolution::Type(engine.enum_(e).ty),
            Symbol::Function(f) => NameResolution::Function(vec![f]),
            Symbol::Template(t) => NameResolution::Template(t),
        }
    }

    fn resolve_in_namespace(
        engine: &Engine,
        name: &str,
        namespace: NamespaceId,
    ) -> NameResolution {
        let data = engine.namespace(namespace);

        if let Some(child) = data.namespaces.get(name) {
            return NameResolution::Namespace(*child);
        }
        if let Some(aliased) = data.namespace_aliases.get(name) {
            return NameResolution::Namespace(*aliased);
        }
        for &class in &data.classes {
            if engine.class(class).name == name {
                return NameResolution::Type(engine.class(class).ty);
            }
        }
        for &enum_id in &data.enums {
            let enum_data = engine.enum_(enum_id);
            if enum_data.name == name {
                return NameResolution::Type(enum_data.ty);
            }
            // Plain enums leak their values into the enclosing scope.
            if !enum_data.enum_class
                && let Some(value) = enum_data.values.get(name)
            {
                return NameResolution::EnumValue {
                    enum_id,
                    value: *value,
                };
            }
        }
        if let Some(ty) = data.typedefs.get(name) {
            return NameResolution::Type(*ty);
        }
        if let Some(var) = data.variables.get(name) {
            return NameResolution::Global {
                script: var.script,
                index: var.index,
                ty: var.ty,
            };
        }
        for &template in &data.templates {
            if engine.template(template).name == name {
                return NameResolution::Template(template);
            }
        }

        let functions: Vec<FunctionId> = data
            .functions
            .iter()
            .copied()
            .filter(|&f| engine.function(f).name() == Some(name))
            .collect();
        if !functions.is_empty() {
            return NameResolution::Function(functions);
        }

        NameResolution::Unknown
    }

    /// Class lookup: own members first, then the parent chain.
    fn resolve_in_class(engine: &Engine, name: &str, class: ClassId) -> NameResolution {
        let mut current = Some(class);

        while let Some(class_id) = current {
            let data = engine.class(class_id);

            if let Some(pos) = data.data_member_index(name) {
                let offset = Self::data_member_base_offset(engine, class_id) + pos;
                return NameResolution::DataMember {
                    offset,
                    ty: data.data_members[pos].ty,
                };
            }
            if data.static_data_members.contains_key(name) {
                return NameResolution::StaticDataMember {
                    class: class_id,
                    name: name.to_owned(),
                };
            }

            let methods: Vec<FunctionId> = data
                .methods
                .iter()
                .copied()
                .filter(|&f| engine.function(f).name() == Some(name))
                .collect();
            if !methods.is_empty() {
                return NameResolution::Function(methods);
            }

            for &nested in &data.classes {
                if engine.class(nested).name == name {
                    return NameResolution::Type(engine.class(nested).ty);
                }
            }
            for &enum_id in &data.enums {
                let enum_data = engine.enum_(enum_id);
                if enum_data.name == name {
                    return NameResolution::Type(enum_data.ty);
                }
                if !enum_data.enum_class
                    && let Some(value) = enum_data.values.get(name)
                {
                    return NameResolution::EnumValue {
                        enum_id,
                        value: *value,
                    };
                }
            }
            if let Some(ty) = data.typedefs.get(name) {
                return NameResolution::Type(*ty);
            }
            for &template in &data.templates {
                if engine.template(template).name == name {
                    return NameResolution::Template(template);
                }
            }

            current = data.parent;
        }

        NameResolution::Unknown
    }

    /// Data members of bases come first in the object layout.
    pub fn data_member_base_offset(engine: &Engine, class: ClassId) -> usize {
        let mut offset = 0;
        let mut current = engine.class(class).parent;
        while let Some(parent) = current {
            offset += engine.class(parent).data_members.len();
            current = engine.class(parent).parent;
        }
        offset
    }

    fn resolve_in_enum(engine: &Engine, name: &str, enum_id: EnumId) -> NameResolution {
        match engine.enum_(enum_id).values.get(name) {
            Some(value) => NameResolution::EnumValue {
                enum_id,
                value: *value,
            },
            None => NameResolution::Unknown,
        }
    }

    /// `lhs::rhs` - the left part must name a scope.
    fn resolve_qualified(
        ctx: &mut LookupContext<'_>,
        scoped: &ast::ScopedIdentifier,
        scope: ScopeId,
    ) -> Result<NameResolution, CompilationFailure> {
        let lhs = Self::resolve(ctx, &scoped.lhs, scope)?;

        let rhs_simple = match scoped.rhs.as_ref() {
            ast::Identifier::Simple(s) => Some(scriba_syntax::token_text(ctx.source, &s.name)),
            _ => None,
        };

        match lhs {
            NameResolution::Namespace(ns) => match scoped.rhs.as_ref() {
                ast::Identifier::Template(t) => {
                    let inner = ctx.scopes.add(None, ScopeKind::Namespace(ns));
                    Self::resolve_template_id(ctx, t, inner)
                }
                _ => {
                    let Some(name) = rhs_simple else {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidTypeName,
                            scoped.rhs.span(),
                        ));
                    };
                    Ok(Self::resolve_in_namespace(ctx.engine, name, ns))
                }
            },
            NameResolution::Type(t) => {
                if let Some(class) = ctx.engine.type_system().get_class(t.base_type()) {
                    match scoped.rhs.as_ref() {
                        ast::Identifier::Template(template_rhs) => {
                            let inner = ctx.scopes.add(None, ScopeKind::Class(class));
                            Self::resolve_template_id(ctx, template_rhs, inner)
                        }
                        _ => {
                            let Some(name) = rhs_simple else {
                                return Err(CompilationFailure::new(
                                    CompilerError::InvalidTypeName,
                                    scoped.rhs.span(),
                                ));
                            };
                            Ok(Self::resolve_in_class(ctx.engine, name, class))
                        }
                    }
                } else if let Some(enum_id) = ctx.engine.type_system().get_enum(t.base_type()) {
                    let Some(name) = rhs_simple else {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidTypeName,
                            scoped.rhs.span(),
                        ));
                    };
                    Ok(Self::resolve_in_enum(ctx.engine, name, enum_id))
                } else {
                    Ok(NameResolution::Unknown)
                }
            }
            _ => Ok(NameResolution::Unknown),
        }
    }

    /// `F<args>` - `F` must name a class template.
    fn resolve_template_id(
        ctx: &mut LookupContext<'_>,
        id: &ast::TemplateIdentifier,
        scope: ScopeId,
    ) -> Result<NameResolution, CompilationFailure> {
        let name = scriba_syntax::token_text(ctx.source, &id.name);

        let NameResolution::Template(template) = Self::resolve_unqualified(ctx, name, scope)
        else {
            return Err(CompilationFailure::new(
                CompilerError::InvalidTypeName,
                id.name.span,
            ));
        };

        let args = Self::convert_template_arguments(ctx, template, &id.args, scope)?;
        let ty = ctx
            .tnp
            .instantiate(ctx.engine, ctx.scopes, template, args)?;
        Ok(NameResolution::Type(ty))
    }

    /// Maps AST template arguments onto typed ones, consuming defaults.
    pub fn convert_template_arguments(
        ctx: &mut LookupContext<'_>,
        template: TemplateId,
        args: &[ast::TemplateArg],
        scope: ScopeId,
    ) -> Result<Vec<TemplateArgument>, CompilationFailure> {
        let parameters = ctx.engine.template(template).parameters.clone();

        let mut out = Vec::with_capacity(parameters.len());

        for (i, param) in parameters.iter().enumerate() {
            let Some(arg) = args.get(i) else {
                if param.has_default {
                    // Defaults are re-read from the template's declaration
                    // at instantiation time.
                    break;
                }
                return Err(CompilationFailure::new(
                    CompilerError::MissingNonDefaultedTemplateParameter,
                    args.last().map(|a| a.span()).unwrap_or_default(),
                ));
            };

            let converted = match (param.kind, arg) {
                (TemplateParameterKind::TypeParameter, ast::TemplateArg::Type(qt)) => {
                    TemplateArgument::Type(resolve_type(ctx, qt, scope)?)
                }
                (TemplateParameterKind::TypeParameter, ast::TemplateArg::Expr(e)) => {
                    return Err(CompilationFailure::new(
                        CompilerError::InvalidTemplateArgument,
                        e.span(),
                    ));
                }
                (kind, ast::TemplateArg::Expr(e)) => constant_argument(ctx, kind, e)?,
                (kind, ast::TemplateArg::Type(qt)) => {
                    // `B<2>`-style args parse as types when the token is an
                    // identifier; re-check for a constant binding.
                    let span = qt.span();
                    let Some(name) = qt.name.as_ref() else {
                        return Err(CompilationFailure::new(
                            CompilerError::InvalidTemplateArgument,
                            span,
                        ));
                    };
                    let resolution = Self::resolve(ctx, name, scope)?;
                    match (kind, resolution) {
                        (TemplateParameterKind::IntParameter, NameResolution::Constant(Value::Int(n))) => {
                            TemplateArgument::Int(n)
                        }
                        (TemplateParameterKind::BoolParameter, NameResolution::Constant(Value::Bool(b))) => {
                            TemplateArgument::Bool(b)
                        }
                        _ => {
                            return Err(CompilationFailure::new(
                                CompilerError::InvalidTemplateArgument,
                                span,
                            ));
                        }
                    }
                }
            };

            out.push(converted);
        }

        if args.len() > parameters.len() {
            return Err(CompilationFailure::new(
                CompilerError::InvalidTemplateArgument,
                args[parameters.len()].span(),
            ));
        }

        Ok(out)
    }

    /// Collects the operators named `op` that are visible from `scope` for
    /// the given operand types: member operators of the operand classes,
    /// operators of the scope chain's namespaces, and operators of the
    /// namespaces enclosing the operand types. Duplicates are removed.
    pub fn resolve_operator(
        engine: &Engine,
        scopes: &Scopes,
        op: OperatorId,
        operands: &[Type],
        scope: ScopeId,
    ) -> Vec<FunctionId> {
        let mut out: Vec<FunctionId> = Vec::new();
        let mut add = |f: FunctionId, out: &mut Vec<FunctionId>| {
            if !out.contains(&f) {
                out.push(f);
            }
        };

        // Member operators of the first operand's class (and bases).
        if let Some(first) = operands.first()
            && let Some(class) = engine.type_system().get_class(first.base_type())
        {
            let mut current = Some(class);
            while let Some(class_id) = current {
                for &f in &engine.class(class_id).operators {
                    if engine.function(f).operator_id() == Some(op) {
                        add(f, &mut out);
                    }
                }
                current = engine.class(class_id).parent;
            }
        }

        // Namespaces of the scope chain.
        for node_id in scopes.chain(scope) {
            let namespace = match scopes.node(node_id).kind {
                ScopeKind::Namespace(ns) => Some(ns),
                ScopeKind::RootNamespace => Some(engine.root_namespace()),
                _ => None,
            };
            if let Some(ns) = namespace {
                for &f in &engine.namespace(ns).operators {
                    if engine.function(f).operator_id() == Some(op) {
                        add(f, &mut out);
                    }
                }
            }
            for &ns in &scopes.node(node_id).injections.namespaces {
                for &f in &engine.namespace(ns).operators {
                    if engine.function(f).operator_id() == Some(op) {
                        add(f, &mut out);
                    }
                }
            }
        }

        // Namespaces enclosing the operand types.
        for operand in operands {
            let enclosing = if let Some(c) = engine.type_system().get_class(operand.base_type()) {
                Some(engine.class(c).enclosing)
            } else {
                engine
                    .type_system()
                    .get_enum(operand.base_type())
                    .map(|e| engine.enum_(e).enclosing)
            };

            let mut symbol = enclosing;
            while let Some(s) = symbol {
                match s {
                    Symbol::Namespace(ns) => {
                        for &f in &engine.namespace(ns).operators {
                            if engine.function(f).operator_id() == Some(op) {
                                add(f, &mut out);
                            }
                        }
                        symbol = engine.namespace(ns).parent.map(Symbol::Namespace);
                    }
                    Symbol::Class(c) => symbol = Some(engine.class(c).enclosing),
                    _ => symbol = None,
                }
            }
        }

        out
    }

    /// Literal operators visible in the scope chain's namespaces, by suffix.
    pub fn resolve_literal_operator(
        engine: &Engine,
        scopes: &Scopes,
        suffix: &str,
        scope: ScopeId,
    ) -> Vec<FunctionId> {
        let mut out = Vec::new();

        for node_id in scopes.chain(scope) {
            let namespace = match scopes.node(node_id).kind {
                ScopeKind::Namespace(ns) => Some(ns),
                ScopeKind::RootNamespace => Some(engine.root_namespace()),
                _ => None,
            };
            let Some(ns) = namespace else { continue };

            for &f in &engine.namespace(ns).literal_operators {
                let matches_suffix = matches!(
                    &engine.function(f).kind,
                    crate::symbols::FunctionKind::LiteralOperator { suffix: s } if s == suffix
                );
                if matches_suffix && !out.contains(&f) {
                    out.push(f);
                }
            }
        }

        out
    }
}

/// The fundamental-type keywords always resolve to their type.
pub fn fundamental_type(kind: TokenKind) -> Option<Type> {
    match kind {
        TokenKind::Void => Some(Type::VOID),
        TokenKind::Bool => Some(Type::BOOLEAN),
        TokenKind::Char => Some(Type::CHAR),
        TokenKind::Int => Some(Type::INT),
        TokenKind::Float => Some(Type::FLOAT),
        TokenKind::Double => Some(Type::DOUBLE),
        TokenKind::Auto => Some(Type::AUTO),
        _ => None,
    }
}

fn constant_argument(
    ctx: &mut LookupContext<'_>,
    kind: TemplateParameterKind,
    expr: &ast::Expr,
) -> Result<TemplateArgument, CompilationFailure> {
    let span = expr.span();
    let ast::Expr::Literal(lit) = expr else {
        return Err(CompilationFailure::new(
            CompilerError::InvalidLiteralTemplateArgument,
            span,
        ));
    };

    match (kind, lit) {
        (TemplateParameterKind::IntParameter, ast::Literal::Integer(tok)) => {
            let text = scriba_syntax::token_text(ctx.source, tok);
            let value = parse_integer_literal(text).ok_or_else(|| {
                CompilationFailure::new(CompilerError::InvalidLiteralTemplateArgument, span)
            })?;
            Ok(TemplateArgument::Int(value))
        }
        (TemplateParameterKind::BoolParameter, ast::Literal::Bool(tok)) => {
            Ok(TemplateArgument::Bool(tok.kind == TokenKind::True))
        }
        _ => Err(CompilationFailure::new(
            CompilerError::InvalidLiteralTemplateArgument,
            span,
        )),
    }
}

/// Parses an integer literal in any of the supported radixes.
pub fn parse_integer_literal(text: &str) -> Option<i32> {
    if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        i32::from_str_radix(hex, 16).ok()
    } else if let Some(bin) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        i32::from_str_radix(bin, 2).ok()
    } else if text.len() > 1 && text.starts_with('0') {
        i32::from_str_radix(&text[1..], 8).ok()
    } else {
        text.parse().ok()
    }
}

/// Resolves an AST type annotation into a type handle.
pub fn resolve_type(
    ctx: &mut LookupContext<'_>,
    qt: &ast::QualifiedType,
    scope: ScopeId,
) -> Result<Type, CompilationFailure> {
    let mut ty = if let Some(ft) = &qt.function_type {
        let return_type = resolve_type(ctx, &ft.return_type, scope)?;
        let mut params = Vec::with_capacity(ft.params.len());
        for p in &ft.params {
            params.push(resolve_type(ctx, p, scope)?);
        }
        ctx.engine
            .type_system_mut()
            .function_type(Prototype::new(return_type, params))
    } else {
        let Some(name) = &qt.name else {
            return Err(CompilationFailure::new(
                CompilerError::InvalidTypeName,
                qt.span(),
            ));
        };

        match NameLookup::resolve(ctx, name, scope)? {
            NameResolution::Type(t) => t,
            _ => {
                return Err(CompilationFailure::new(
                    CompilerError::InvalidTypeName,
                    name.span(),
                ));
            }
        }
    };

    if qt.is_const() {
        ty = ty.with_const();
    }
    if let Some(reference) = &qt.reference {
        ty = if reference.kind == TokenKind::LogicalAnd {
            ty.with_forward_reference()
        } else {
            ty.with_reference()
        };
    }

    Ok(ty)
}

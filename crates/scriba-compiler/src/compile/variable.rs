//! Deferred initialization of namespace/script globals and static data
//! members.
//!
//! These run after the declaration passes so their initializers can refer
//! to anything the script declares.

use std::rc::Rc;

use scriba_syntax::ast;
use scriba_syntax::token_text;

use crate::engine::Engine;
use crate::error::{CompilationFailure, CompilerError};
use crate::initialization::Initialization;
use crate::lookup::TemplateNameProcessor;
use crate::scope::Scopes;
use crate::symbols::ScriptId;

use super::PendingVariable;
use super::function::FunctionCompiler;

pub(crate) fn process_variable(
    engine: &mut Engine,
    scopes: &mut Scopes,
    tnp: &mut dyn TemplateNameProcessor,
    ast: &Rc<ast::Ast>,
    script: ScriptId,
    pending: &PendingVariable,
) -> Result<(), CompilationFailure> {
    let decl = &pending.declaration;
    let span = decl.name.span;
    let name = token_text(&ast.source, &decl.name).to_owned();

    let is_static_member = pending.class.is_some();

    // The stored type was resolved at registration time.
    let ty = match pending.class {
        Some(class) => {
            engine
                .class(class)
                .static_data_members
                .get(&name)
                .ok_or_else(|| {
                    CompilationFailure::new(CompilerError::MissingStaticInitialization, span)
                })?
                .ty
        }
        None => *engine.script(script).globals.get(&name).ok_or_else(|| {
            CompilationFailure::new(CompilerError::GlobalVariablesMustBeInitialized, span)
        })?,
    };

    // Globals and statics initialize by assignment.
    let value_expr = match &decl.init {
        Some(ast::VariableInit::Assignment { value, .. }) => value,
        Some(_) => {
            let code = if is_static_member {
                CompilerError::InvalidStaticInitialization
            } else {
                CompilerError::GlobalVariablesMustBeAssigned
            };
            return Err(CompilationFailure::new(code, span));
        }
        None => {
            let code = if is_static_member {
                CompilerError::MissingStaticInitialization
            } else {
                CompilerError::GlobalVariablesMustBeInitialized
            };
            return Err(CompilationFailure::new(code, span));
        }
    };

    let mut compiler = FunctionCompiler::new(
        engine,
        scopes,
        tnp,
        &ast.source,
        script,
        pending.scope,
        None,
    );

    let compiled = compiler.generate_expr(value_expr)?;
    let init = Initialization::compute_expr(ty, &compiled, compiler.engine);
    if !init.is_valid() {
        let code = if is_static_member {
            CompilerError::FailedToInitializeStaticVariable
        } else {
            CompilerError::CouldNotConvert
        };
        return Err(CompilationFailure::new(code, value_expr.span()));
    }

    let value = compiler.construct_with_init(ty, Some(compiled), &init, value_expr.span())?;

    match pending.class {
        Some(class) => {
            let index = {
                let member = engine
                    .class_mut(class)
                    .static_data_members
                    .get_mut(&name)
                    .expect("checked above");
                member.init = Some(value.clone());
                member.index
            };
            engine.script_mut(script).global_inits[index] = Some(value);
        }
        None => {
            let index = engine
                .script(script)
                .globals
                .get_index_of(&name)
                .expect("registered at declaration time");
            engine.script_mut(script).global_inits[index] = Some(value);
        }
    }

    Ok(())
}

//! `import` directives.
//!
//! Module loading is a host concern: the engine's [`ModuleLoader`] receives
//! the dotted module name and may compile further scripts. The session flag
//! is released around the call so the loader can re-enter the compiler.

use std::rc::Rc;

use scriba_syntax::ast;
use scriba_syntax::token_text;

use crate::engine::{Engine, Error};
use crate::error::{CompilationFailure, CompilerError};

pub(crate) fn process_import(
    engine: &mut Engine,
    decl: &Rc<ast::ImportDirective>,
    ast: Rc<ast::Ast>,
) -> Result<(), CompilationFailure> {
    let span = decl.import_keyword.span;

    let name = decl
        .names
        .iter()
        .map(|tok| token_text(&ast.source, tok))
        .collect::<Vec<_>>()
        .join(".");

    let Some(mut loader) = engine.take_module_loader() else {
        return Err(CompilationFailure::new(
            CompilerError::UnknownModuleName,
            span,
        ));
    };

    let result = engine.suspend_session(|e| loader.load(e, &name));
    engine.put_back_module_loader(Some(loader));

    match result {
        Ok(_) => Ok(()),
        Err(Error::UnknownModule(_)) => Err(CompilationFailure::new(
            CompilerError::UnknownModuleName,
            span,
        )),
        Err(_) => Err(CompilationFailure::new(
            CompilerError::ModuleImportationFailed,
            span,
        )),
    }
}

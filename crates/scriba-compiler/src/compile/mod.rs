//! The semantic compiler.
//!
//! Compilation is a script-level pass that collects declarations and builds
//! the semantic model, followed by a deferred pass that compiles every
//! scheduled function body into typed IR. Declarations whose types cannot be
//! resolved yet are re-queued; the loop stops when a full iteration makes no
//! progress.

mod expr;
mod function;
mod import;
mod lambda;
mod script;
mod special;
mod templates;
mod value;
mod variable;

pub use function::{FunctionCompiler, Stack, Variable};
pub use script::ScriptCompiler;
pub use templates::{
    DefaultTemplateNameProcessor, TemplateArgumentDeduction, TemplatePatternMatching,
};

use std::rc::Rc;

use scriba_syntax::ast;

use crate::engine::Engine;
use crate::scope::ScopeId;
use crate::symbols::{ClassId, FunctionId, ScriptId};

/// A function whose body still needs to be compiled.
#[derive(Debug, Clone)]
pub struct CompileFunctionTask {
    pub function: FunctionId,
    pub declaration: Rc<ast::FunctionDecl>,
    pub scope: ScopeId,
    pub script: ScriptId,
}

/// A declaration that could not be processed yet (its signature references
/// unresolved names) and waits for a later pass.
#[derive(Debug, Clone)]
pub struct ScopedDeclaration {
    pub declaration: ast::Decl,
    pub scope: ScopeId,
}

/// A namespace/static variable awaiting deferred initialization.
#[derive(Debug, Clone)]
pub struct PendingVariable {
    pub declaration: Rc<ast::VariableDecl>,
    pub scope: ScopeId,
    /// Set for `static` data members.
    pub class: Option<ClassId>,
}

/// Compiles `source` into `script`, leaving diagnostics on the script.
pub fn compile_script(engine: &mut Engine, script: ScriptId, source: &str) {
    ScriptCompiler::new(engine, script).compile(source);
}

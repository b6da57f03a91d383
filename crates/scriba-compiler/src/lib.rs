//! Semantic compiler for the scriba language: type system, conversions,
//! overload resolution, name lookup, and lowering of the AST into a typed
//! IR ("program tree").
//!
//! # Example
//!
//! ```
//! use scriba_compiler::Engine;
//!
//! let mut engine = Engine::new();
//! let script = engine
//!     .compile("int add(int a, int b) { return a + b; }")
//!     .expect("valid script");
//! assert!(!engine.script(script).failed());
//! ```
//!
//! The pipeline: `scriba-syntax` parses the source into an AST; the script
//! compiler collects declarations and builds the semantic model
//! (re-queueing the ones whose types are not resolvable yet); the function
//! compiler then lowers every scheduled body into `program::*` nodes.

pub mod builders;
pub mod compile;
pub mod conversion;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod initialization;
pub mod lookup;
pub mod overload;
pub mod program;
pub mod prototype;
pub mod scope;
pub mod symbols;
pub mod types;
pub mod typesystem;
pub mod value;

pub use diagnostics::{DiagnosticMessage, Diagnostics, DiagnosticsPrinter, Severity};
pub use engine::{Engine, Error, FunctionCreator, ModuleLoader, Result};
pub use error::{CompilationFailure, CompilerError};
pub use prototype::Prototype;
pub use types::{Type, TypeCategory};
pub use typesystem::{TypeSystem, TypeSystemTransaction};
pub use value::Value;

#[cfg(test)]
mod compile_tests;
#[cfg(test)]
mod conversion_tests;
#[cfg(test)]
mod lambda_tests;
#[cfg(test)]
mod overload_tests;
#[cfg(test)]
mod template_tests;
#[cfg(test)]
mod typesystem_tests;

//! Semantic entities and their arena handles.
//!
//! Classes, enums, functions, namespaces and templates live in flat arenas
//! (classes and enums inside the type system, the rest on the engine) and
//! are referred to by small copyable ids. A [`Symbol`] is the tagged union
//! used by name lookup and parent links.

use std::rc::Rc;

use indexmap::IndexMap;

use scriba_syntax::ast;
use scriba_syntax::operators::OperatorId;

use crate::program;
use crate::prototype::Prototype;
use crate::types::Type;
use crate::value::Value;

macro_rules! arena_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

arena_id!(ClassId);
arena_id!(EnumId);
arena_id!(FunctionId);
arena_id!(NamespaceId);
arena_id!(TemplateId);
arena_id!(ClosureId);
arena_id!(ScriptId);

/// Root namespace handle; the engine guarantees it exists at index 0.
pub const ROOT_NAMESPACE: NamespaceId = NamespaceId(0);

/// A semantic entity, with enough identity to rebuild qualified names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Namespace(NamespaceId),
    Class(ClassId),
    Function(FunctionId),
    Enum(EnumId),
    Template(TemplateId),
}

impl Symbol {
    pub fn as_class(self) -> Option<ClassId> {
        match self {
            Symbol::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_namespace(self) -> Option<NamespaceId> {
        match self {
            Symbol::Namespace(n) => Some(n),
            _ => None,
        }
    }
}

/// Member visibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
pub enum AccessSpecifier {
    #[default]
    Public,
    Protected,
    Private,
}

#[derive(Debug, Clone)]
pub struct DataMember {
    pub name: String,
    pub ty: Type,
    pub access: AccessSpecifier,
    /// The member's written initializer, used by constructors when their
    /// member-initialization list leaves the field out.
    pub default_value: Option<ast::VariableInit>,
}

#[derive(Debug, Clone)]
pub struct StaticDataMember {
    pub ty: Type,
    pub access: AccessSpecifier,
    /// Storage slot: static members live among their script's globals.
    pub script: ScriptId,
    pub index: usize,
    /// Filled by the variable processor once the initializer compiles.
    pub init: Option<Rc<program::Expression>>,
}

/// A class definition.
#[derive(Debug, Clone)]
pub struct ClassData {
    pub name: String,
    pub ty: Type,
    pub parent: Option<ClassId>,
    pub enclosing: Symbol,
    pub data_members: Vec<DataMember>,
    pub static_data_members: IndexMap<String, StaticDataMember>,
    pub constructors: Vec<FunctionId>,
    pub destructor: Option<FunctionId>,
    pub methods: Vec<FunctionId>,
    pub operators: Vec<FunctionId>,
    pub casts: Vec<FunctionId>,
    /// Virtual methods in slot order; derived classes copy then override.
    pub vtable: Vec<FunctionId>,
    pub classes: Vec<ClassId>,
    pub enums: Vec<EnumId>,
    pub typedefs: IndexMap<String, Type>,
    pub templates: Vec<TemplateId>,
    pub friends: Vec<ClassId>,
    /// Set when this class is an instance of a class template.
    pub template_instance_of: Option<(TemplateId, Vec<TemplateArgument>)>,
}

impl ClassData {
    pub fn data_member_index(&self, name: &str) -> Option<usize> {
        self.data_members.iter().position(|m| m.name == name)
    }
}

/// An enumeration definition.
#[derive(Debug, Clone)]
pub struct EnumData {
    pub name: String,
    pub ty: Type,
    pub enum_class: bool,
    pub enclosing: Symbol,
    pub values: IndexMap<String, i32>,
}

/// A closure type synthesized for a lambda expression.
#[derive(Debug, Clone)]
pub struct ClosureData {
    pub ty: Type,
    pub captures: Vec<Capture>,
    /// The function-call operator of the closure.
    pub call_operator: FunctionId,
}

#[derive(Debug, Clone)]
pub struct Capture {
    pub name: String,
    pub ty: Type,
    pub by_reference: bool,
}

/// What a function is, beyond its signature.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionKind {
    Regular { name: String },
    Constructor,
    Destructor,
    Operator(OperatorId),
    LiteralOperator { suffix: String },
    Cast,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FunctionFlags {
    pub is_static: bool,
    pub is_virtual: bool,
    pub is_pure_virtual: bool,
    pub is_explicit: bool,
    pub is_const: bool,
    pub is_deleted: bool,
    pub is_defaulted: bool,
}

#[derive(Debug, Clone)]
pub struct FunctionData {
    pub kind: FunctionKind,
    pub prototype: Prototype,
    pub flags: FunctionFlags,
    pub owner: Symbol,
    pub access: AccessSpecifier,
    pub default_arguments: Vec<Rc<program::Expression>>,
    /// Slot in the owning class's vtable, for virtual methods.
    pub virtual_index: Option<usize>,
    /// The compiled body; `None` until the function compiler ran (or for
    /// native functions supplied by the host).
    pub body: Option<Rc<program::CompoundStatement>>,
}

impl FunctionData {
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            FunctionKind::Regular { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Constructor)
    }

    pub fn is_destructor(&self) -> bool {
        matches!(self.kind, FunctionKind::Destructor)
    }

    pub fn is_cast(&self) -> bool {
        matches!(self.kind, FunctionKind::Cast)
    }

    pub fn operator_id(&self) -> Option<OperatorId> {
        match self.kind {
            FunctionKind::Operator(op) => Some(op),
            _ => None,
        }
    }

    pub fn is_member(&self) -> bool {
        matches!(self.owner, Symbol::Class(_))
    }

    pub fn member_of(&self) -> Option<ClassId> {
        self.owner.as_class()
    }

    /// Whether calls pass the object as a hidden first argument.
    pub fn has_implicit_object(&self) -> bool {
        self.prototype
            .params()
            .first()
            .is_some_and(|p| p.is_this())
    }
}

/// A variable defined at namespace (or script top) level.
#[derive(Debug, Clone)]
pub struct GlobalVariable {
    pub ty: Type,
    pub script: ScriptId,
    pub index: usize,
}

/// A namespace definition.
#[derive(Debug, Clone, Default)]
pub struct NamespaceData {
    pub name: String,
    pub parent: Option<NamespaceId>,
    pub namespaces: IndexMap<String, NamespaceId>,
    pub namespace_aliases: IndexMap<String, NamespaceId>,
    pub classes: Vec<ClassId>,
    pub enums: Vec<EnumId>,
    pub functions: Vec<FunctionId>,
    pub operators: Vec<FunctionId>,
    pub literal_operators: Vec<FunctionId>,
    pub variables: IndexMap<String, GlobalVariable>,
    pub typedefs: IndexMap<String, Type>,
    pub templates: Vec<TemplateId>,
}

/// Template-argument values; identity keys template-instance memoization.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TemplateArgument {
    Type(Type),
    Int(i32),
    Bool(bool),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateParameterKind {
    TypeParameter,
    IntParameter,
    BoolParameter,
}

#[derive(Debug, Clone)]
pub struct TemplateParameterDef {
    pub kind: TemplateParameterKind,
    pub name: String,
    pub has_default: bool,
}

/// A partial or full specialization of a class template.
#[derive(Debug, Clone)]
pub struct TemplateSpecialization {
    /// The specialization's own template parameters (empty for a full
    /// specialization).
    pub parameters: Vec<TemplateParameterDef>,
    pub decl: Rc<ast::TemplateDecl>,
    pub script: ScriptId,
}

#[derive(Debug, Clone)]
pub enum TemplateKind {
    Class {
        decl: Rc<ast::ClassDecl>,
        /// Tried in declaration order; the first matching one wins.
        specializations: Vec<TemplateSpecialization>,
        instances: IndexMap<Vec<TemplateArgument>, ClassId>,
    },
    Function {
        decl: Rc<ast::FunctionDecl>,
        instances: IndexMap<Vec<TemplateArgument>, FunctionId>,
    },
}

/// A template definition: parameters plus the AST it re-compiles from.
#[derive(Debug, Clone)]
pub struct TemplateData {
    pub name: String,
    pub parameters: Vec<TemplateParameterDef>,
    pub enclosing: Symbol,
    /// Script whose AST owns the declaration nodes (and their source text).
    pub script: ScriptId,
    /// The full `template<...>` node; parameter defaults are re-read from it
    /// at instantiation time.
    pub declaration: Rc<ast::TemplateDecl>,
    pub kind: TemplateKind,
}

impl TemplateData {
    pub fn is_class_template(&self) -> bool {
        matches!(self.kind, TemplateKind::Class { .. })
    }
}

/// A compiled (or failing) script.
#[derive(Debug, Default)]
pub struct ScriptData {
    pub ast: Option<Rc<ast::Ast>>,
    pub globals: IndexMap<String, Type>,
    /// Initializers for globals, in slot order, filled by the variable
    /// processor.
    pub global_inits: Vec<Option<Rc<program::Expression>>>,
    pub diagnostics: crate::diagnostics::Diagnostics,
    pub root_function: Option<FunctionId>,
    pub compiled: bool,
}

impl ScriptData {
    pub fn failed(&self) -> bool {
        self.diagnostics.has_errors()
    }
}

/// A constant enumeration value, used by name-lookup results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValue {
    pub enum_id: EnumId,
    pub value: i32,
}

impl EnumValue {
    pub fn to_value(self, enum_type: Type) -> Value {
        Value::EnumValue {
            enum_type,
            value: self.value,
        }
    }
}

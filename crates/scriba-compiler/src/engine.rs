//! The engine: owner of the semantic model.
//!
//! Holds the type system, the symbol arenas, the root namespace with its
//! built-in operator set, the compiled scripts and the module-loader hook.
//! One compilation session may be active at a time.

use scriba_syntax::operators::OperatorId;

use crate::diagnostics::Diagnostics;
use crate::prototype::Prototype;
use crate::symbols::{
    AccessSpecifier, ClassData, ClassId, EnumData, EnumId, FunctionData, FunctionFlags,
    FunctionId, FunctionKind, NamespaceData, NamespaceId, ROOT_NAMESPACE, ScriptData, ScriptId,
    Symbol, TemplateData, TemplateId,
};
use crate::types::Type;
use crate::typesystem::TypeSystem;

/// Loads the script behind an `import` directive.
///
/// The loader may itself call [`Engine::compile`] for the module's source;
/// the engine's session flag is released around the call.
pub trait ModuleLoader {
    fn load(&mut self, engine: &mut Engine, module_name: &str) -> Result<ScriptId>;
}

/// Produces native bodies for bodyless, attribute-decorated declarations.
///
/// When the compiler registers a function whose declaration has no body but
/// carries a `[[...]]` attribute, the creator is offered the function; it
/// returns `true` after installing a native implementation.
pub trait FunctionCreator {
    fn create(&mut self, engine: &mut Engine, function: FunctionId, attribute: &str) -> bool;
}

/// Top-level errors of the compilation entry points.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("a compilation session is already active")]
    SessionAlreadyActive,
    #[error("compilation failed with {} error(s)", .diagnostics.error_count())]
    CompilationFailed {
        script: ScriptId,
        diagnostics: Diagnostics,
    },
    #[error("unknown module: {0}")]
    UnknownModule(String),
}

pub type Result<T> = std::result::Result<T, Error>;

pub struct Engine {
    type_system: TypeSystem,
    functions: Vec<FunctionData>,
    namespaces: Vec<NamespaceData>,
    templates: Vec<TemplateData>,
    scripts: Vec<ScriptData>,
    module_loader: Option<Box<dyn ModuleLoader>>,
    function_creator: Option<Box<dyn FunctionCreator>>,
    session_active: bool,
    string_type: Type,
    /// The `Array<T>` class template backing `[...]` literals, when a host
    /// or prelude registered one.
    array_template: Option<TemplateId>,
    /// The `initializer_list<T>` class template backing brace lists.
    initializer_list_template: Option<TemplateId>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        let mut engine = Self {
            type_system: TypeSystem::new(),
            functions: Vec::new(),
            namespaces: vec![NamespaceData::default()],
            templates: Vec::new(),
            scripts: Vec::new(),
            module_loader: None,
            function_creator: None,
            session_active: false,
            string_type: Type::NULL,
            array_template: None,
            initializer_list_template: None,
        };

        engine.register_builtin_operators();
        engine.register_string_class();
        engine
    }

    // -- Accessors ----------------------------------------------------------

    pub fn type_system(&self) -> &TypeSystem {
        &self.type_system
    }

    pub fn type_system_mut(&mut self) -> &mut TypeSystem {
        &mut self.type_system
    }

    pub fn root_namespace(&self) -> NamespaceId {
        ROOT_NAMESPACE
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        self.type_system.class(id)
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassData {
        self.type_system.class_mut(id)
    }

    pub fn enum_(&self, id: EnumId) -> &EnumData {
        self.type_system.enum_(id)
    }

    pub fn function(&self, id: FunctionId) -> &FunctionData {
        &self.functions[id.index()]
    }

    pub fn function_mut(&mut self, id: FunctionId) -> &mut FunctionData {
        &mut self.functions[id.index()]
    }

    pub fn namespace(&self, id: NamespaceId) -> &NamespaceData {
        &self.namespaces[id.index()]
    }

    pub fn namespace_mut(&mut self, id: NamespaceId) -> &mut NamespaceData {
        &mut self.namespaces[id.index()]
    }

    pub fn template(&self, id: TemplateId) -> &TemplateData {
        &self.templates[id.index()]
    }

    pub fn template_mut(&mut self, id: TemplateId) -> &mut TemplateData {
        &mut self.templates[id.index()]
    }

    pub fn script(&self, id: ScriptId) -> &ScriptData {
        &self.scripts[id.index()]
    }

    pub fn script_mut(&mut self, id: ScriptId) -> &mut ScriptData {
        &mut self.scripts[id.index()]
    }

    pub fn string_type(&self) -> Type {
        self.string_type
    }

    pub fn array_template(&self) -> Option<TemplateId> {
        self.array_template
    }

    pub fn set_array_template(&mut self, template: TemplateId) {
        self.array_template = Some(template);
    }

    pub fn initializer_list_template(&self) -> Option<TemplateId> {
        self.initializer_list_template
    }

    pub fn set_initializer_list_template(&mut self, template: TemplateId) {
        self.initializer_list_template = Some(template);
    }

    pub fn set_module_loader(&mut self, loader: Box<dyn ModuleLoader>) {
        self.module_loader = Some(loader);
    }

    pub(crate) fn take_module_loader(&mut self) -> Option<Box<dyn ModuleLoader>> {
        self.module_loader.take()
    }

    pub(crate) fn put_back_module_loader(&mut self, loader: Option<Box<dyn ModuleLoader>>) {
        self.module_loader = loader;
    }

    pub fn set_function_creator(&mut self, creator: Box<dyn FunctionCreator>) {
        self.function_creator = Some(creator);
    }

    /// Offers a bodyless, attribute-decorated function to the host's
    /// creator hook.
    pub(crate) fn run_function_creator(&mut self, function: FunctionId, attribute: &str) -> bool {
        let Some(mut creator) = self.function_creator.take() else {
            return false;
        };
        let created = creator.create(self, function, attribute);
        self.function_creator = Some(creator);
        created
    }

    // -- Registration -------------------------------------------------------

    pub(crate) fn add_function(&mut self, data: FunctionData) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        self.functions.push(data);
        id
    }

    pub(crate) fn add_namespace(&mut self, data: NamespaceData) -> NamespaceId {
        let id = NamespaceId(self.namespaces.len() as u32);
        self.namespaces.push(data);
        id
    }

    pub(crate) fn add_template(&mut self, data: TemplateData) -> TemplateId {
        let id = TemplateId(self.templates.len() as u32);
        self.templates.push(data);
        id
    }

    pub(crate) fn add_script(&mut self, data: ScriptData) -> ScriptId {
        let id = ScriptId(self.scripts.len() as u32);
        self.scripts.push(data);
        id
    }

    /// Finds or creates a child namespace.
    pub fn get_or_create_namespace(&mut self, parent: NamespaceId, name: &str) -> NamespaceId {
        if let Some(existing) = self.namespaces[parent.index()].namespaces.get(name) {
            return *existing;
        }

        let id = self.add_namespace(NamespaceData {
            name: name.to_owned(),
            parent: Some(parent),
            ..NamespaceData::default()
        });
        self.namespaces[parent.index()]
            .namespaces
            .insert(name.to_owned(), id);
        id
    }

    // -- Semantic queries ---------------------------------------------------

    /// How many inheritance steps separate `derived` from `base`.
    pub fn derived_to_base_depth(&self, derived: ClassId, base: ClassId) -> Option<u32> {
        let mut depth = 0;
        let mut current = Some(derived);

        while let Some(c) = current {
            if c == base {
                return Some(depth);
            }
            current = self.class(c).parent;
            depth += 1;
        }

        None
    }

    /// Whether `t` names an instance of the `initializer_list<T>` template.
    pub fn is_initializer_list(&self, t: Type) -> bool {
        if t.base_type() == Type::INITIALIZER_LIST {
            return true;
        }
        let Some(class_id) = self.type_system.get_class(t) else {
            return false;
        };
        match (&self.class(class_id).template_instance_of, self.initializer_list_template) {
            (Some((template, _)), Some(init_list)) => *template == init_list,
            _ => false,
        }
    }

    /// The element type of an `initializer_list<T>` instance.
    pub fn initializer_list_element_type(&self, t: Type) -> Option<Type> {
        let class_id = self.type_system.get_class(t)?;
        let (template, args) = self.class(class_id).template_instance_of.as_ref()?;
        if Some(*template) != self.initializer_list_template {
            return None;
        }
        match args.first() {
            Some(crate::symbols::TemplateArgument::Type(ty)) => Some(*ty),
            _ => None,
        }
    }

    pub fn default_constructor(&self, class: ClassId) -> Option<FunctionId> {
        self.class(class)
            .constructors
            .iter()
            .copied()
            .find(|&f| {
                let func = self.function(f);
                func.prototype.param_count() == func.default_arguments.len()
            })
    }

    pub fn copy_constructor(&self, class: ClassId) -> Option<FunctionId> {
        let class_type = self.class(class).ty;
        self.class(class).constructors.iter().copied().find(|&f| {
            let func = self.function(f);
            func.prototype.param_count() == 1
                && func.prototype.param(0).base_type() == class_type
                && func.prototype.param(0).is_const_reference()
        })
    }

    pub fn move_constructor(&self, class: ClassId) -> Option<FunctionId> {
        let class_type = self.class(class).ty;
        self.class(class).constructors.iter().copied().find(|&f| {
            let func = self.function(f);
            func.prototype.param_count() == 1
                && func.prototype.param(0).base_type() == class_type
                && func.prototype.param(0).is_forward_reference()
        })
    }

    pub fn assignment_operator(&self, class: ClassId) -> Option<FunctionId> {
        let class_type = self.class(class).ty;
        self.class(class).operators.iter().copied().find(|&f| {
            let func = self.function(f);
            func.operator_id() == Some(OperatorId::Assignment)
                && func.prototype.param_count() == 2
                && func.prototype.param(1).base_type() == class_type
        })
    }

    /// A human-readable name for a type, for diagnostics and tests.
    pub fn type_name(&self, t: Type) -> String {
        let base = match t.base_type() {
            Type::VOID => "void".to_owned(),
            Type::BOOLEAN => "bool".to_owned(),
            Type::CHAR => "char".to_owned(),
            Type::INT => "int".to_owned(),
            Type::FLOAT => "float".to_owned(),
            Type::DOUBLE => "double".to_owned(),
            Type::AUTO => "auto".to_owned(),
            Type::INITIALIZER_LIST => "initializer_list".to_owned(),
            base => {
                if let Some(c) = self.type_system.get_class(base) {
                    self.qualified_name(Symbol::Class(c))
                } else if let Some(e) = self.type_system.get_enum(base) {
                    self.qualified_name(Symbol::Enum(e))
                } else if let Some(proto) = self.type_system.get_prototype(base) {
                    let params: Vec<String> = proto
                        .params()
                        .iter()
                        .map(|p| self.type_name(*p))
                        .collect();
                    format!(
                        "{}({})",
                        self.type_name(proto.return_type()),
                        params.join(", ")
                    )
                } else if base.is_closure_type() {
                    "<closure>".to_owned()
                } else {
                    "<invalid>".to_owned()
                }
            }
        };

        let mut name = String::new();
        if t.is_const() {
            name.push_str("const ");
        }
        name.push_str(&base);
        if t.is_reference() {
            name.push_str(" &");
        } else if t.is_forward_reference() {
            name.push_str(" &&");
        }
        name
    }

    /// Rebuilds the `::`-qualified name of a symbol from its parent links.
    pub fn qualified_name(&self, symbol: Symbol) -> String {
        let (own_name, parent) = match symbol {
            Symbol::Namespace(id) => {
                let ns = self.namespace(id);
                (
                    ns.name.clone(),
                    ns.parent.map(Symbol::Namespace),
                )
            }
            Symbol::Class(id) => {
                let c = self.class(id);
                (c.name.clone(), Some(c.enclosing))
            }
            Symbol::Enum(id) => {
                let e = self.enum_(id);
                (e.name.clone(), Some(e.enclosing))
            }
            Symbol::Function(id) => {
                let f = self.function(id);
                let name = match &f.kind {
                    FunctionKind::Regular { name } => name.clone(),
                    FunctionKind::Constructor => "<ctor>".to_owned(),
                    FunctionKind::Destructor => "<dtor>".to_owned(),
                    FunctionKind::Operator(op) => format!("operator{}", op.symbol()),
                    FunctionKind::LiteralOperator { suffix } => {
                        format!("operator\"\"{suffix}")
                    }
                    FunctionKind::Cast => "<cast>".to_owned(),
                };
                (name, Some(f.owner))
            }
            Symbol::Template(id) => {
                let t = self.template(id);
                (t.name.clone(), Some(t.enclosing))
            }
        };

        match parent {
            Some(p) => {
                let parent_name = self.qualified_name(p);
                if parent_name.is_empty() {
                    own_name
                } else {
                    format!("{parent_name}::{own_name}")
                }
            }
            None => own_name,
        }
    }

    // -- Compilation --------------------------------------------------------

    /// Compiles a source text into a new script.
    ///
    /// On failure the script still exists and holds the diagnostics.
    pub fn compile(&mut self, source: &str) -> Result<ScriptId> {
        if self.session_active {
            return Err(Error::SessionAlreadyActive);
        }

        self.session_active = true;
        let script = self.add_script(ScriptData::default());
        crate::compile::compile_script(self, script, source);
        self.session_active = false;

        if self.script(script).failed() {
            Err(Error::CompilationFailed {
                script,
                diagnostics: self.script(script).diagnostics.clone(),
            })
        } else {
            Ok(script)
        }
    }

    /// Releases the session flag around a module-loader callback.
    pub(crate) fn suspend_session<T>(
        &mut self,
        f: impl FnOnce(&mut Engine) -> T,
    ) -> T {
        self.session_active = false;
        let out = f(self);
        self.session_active = true;
        out
    }

    // -- Built-ins ----------------------------------------------------------

    fn add_builtin_operator(&mut self, op: OperatorId, prototype: Prototype) {
        let id = self.add_function(FunctionData {
            kind: FunctionKind::Operator(op),
            prototype,
            flags: FunctionFlags::default(),
            owner: Symbol::Namespace(ROOT_NAMESPACE),
            access: AccessSpecifier::Public,
            default_arguments: Vec::new(),
            virtual_index: None,
            body: None,
        });
        self.namespaces[ROOT_NAMESPACE.index()].operators.push(id);
    }

    /// Installs the built-in operator set over the fundamental types.
    fn register_builtin_operators(&mut self) {
        use OperatorId::*;

        let numeric = [Type::INT, Type::FLOAT, Type::DOUBLE];
        let all = [Type::BOOLEAN, Type::CHAR, Type::INT, Type::FLOAT, Type::DOUBLE];

        for &t in &all {
            // Assignment and (in)equality exist for every fundamental type.
            self.add_builtin_operator(
                Assignment,
                Prototype::binary_operator(t.with_reference(), t.with_reference(), t.const_reference()),
            );
            for op in [Equal, Inequal] {
                self.add_builtin_operator(
                    op,
                    Prototype::binary_operator(Type::BOOLEAN, t.const_reference(), t.const_reference()),
                );
            }
        }

        for &t in &[Type::CHAR, Type::INT, Type::FLOAT, Type::DOUBLE] {
            for op in [Less, Greater, LessEqual, GreaterEqual] {
                self.add_builtin_operator(
                    op,
                    Prototype::binary_operator(Type::BOOLEAN, t.const_reference(), t.const_reference()),
                );
            }
        }

        for &t in &numeric {
            for op in [Addition, Subtraction, Multiplication, Division] {
                self.add_builtin_operator(
                    op,
                    Prototype::binary_operator(t, t.const_reference(), t.const_reference()),
                );
            }
            for op in [
                AdditionAssignment,
                SubstractionAssignment,
                MultiplicationAssignment,
                DivisionAssignment,
            ] {
                self.add_builtin_operator(
                    op,
                    Prototype::binary_operator(t.with_reference(), t.with_reference(), t.const_reference()),
                );
            }
            for op in [UnaryPlus, UnaryMinus] {
                self.add_builtin_operator(op, Prototype::unary_operator(t, t.const_reference()));
            }
            for op in [PreIncrement, PreDecrement] {
                self.add_builtin_operator(
                    op,
                    Prototype::unary_operator(t.with_reference(), t.with_reference()),
                );
            }
            for op in [PostIncrement, PostDecrement] {
                self.add_builtin_operator(op, Prototype::unary_operator(t, t.with_reference()));
            }
        }

        // Integer-only bit and remainder operators.
        let int = Type::INT;
        for op in [Remainder, LeftShift, RightShift, BitwiseAnd, BitwiseOr, BitwiseXor] {
            self.add_builtin_operator(
                op,
                Prototype::binary_operator(int, int.const_reference(), int.const_reference()),
            );
        }
        for op in [
            RemainderAssignment,
            LeftShiftAssignment,
            RightShiftAssignment,
            BitwiseAndAssignment,
            BitwiseOrAssignment,
            BitwiseXorAssignment,
        ] {
            self.add_builtin_operator(
                op,
                Prototype::binary_operator(int.with_reference(), int.with_reference(), int.const_reference()),
            );
        }
        self.add_builtin_operator(
            BitwiseNot,
            Prototype::unary_operator(int, int.const_reference()),
        );

        self.add_builtin_operator(
            LogicalNot,
            Prototype::unary_operator(Type::BOOLEAN, Type::BOOLEAN.const_reference()),
        );
    }

    /// Registers the built-in `string` class.
    fn register_string_class(&mut self) {
        let (class_id, ty) = self.type_system.register_class(ClassData {
            name: "string".to_owned(),
            ty: Type::NULL,
            parent: None,
            enclosing: Symbol::Namespace(ROOT_NAMESPACE),
            data_members: Vec::new(),
            static_data_members: indexmap::IndexMap::new(),
            constructors: Vec::new(),
            destructor: None,
            methods: Vec::new(),
            operators: Vec::new(),
            casts: Vec::new(),
            vtable: Vec::new(),
            classes: Vec::new(),
            enums: Vec::new(),
            typedefs: indexmap::IndexMap::new(),
            templates: Vec::new(),
            friends: Vec::new(),
            template_instance_of: None,
        });
        self.string_type = ty;
        self.namespaces[ROOT_NAMESPACE.index()].classes.push(class_id);

        let member = |kind, prototype| FunctionData {
            kind,
            prototype,
            flags: FunctionFlags::default(),
            owner: Symbol::Class(class_id),
            access: AccessSpecifier::Public,
            default_arguments: Vec::new(),
            virtual_index: None,
            body: None,
        };

        let default_ctor =
            self.add_function(member(FunctionKind::Constructor, Prototype::new(ty, vec![])));
        let copy_ctor = self.add_function(member(
            FunctionKind::Constructor,
            Prototype::new(ty, vec![ty.const_reference()]),
        ));
        let dtor = self.add_function(member(FunctionKind::Destructor, Prototype::destructor(ty)));
        self.class_mut(class_id).constructors = vec![default_ctor, copy_ctor];
        self.class_mut(class_id).destructor = Some(dtor);

        let assign = self.add_function(member(
            FunctionKind::Operator(OperatorId::Assignment),
            Prototype::binary_operator(
                ty.with_reference(),
                ty.with_reference().with_this(),
                ty.const_reference(),
            ),
        ));
        let concat = self.add_function(member(
            FunctionKind::Operator(OperatorId::Addition),
            Prototype::binary_operator(ty, ty.const_reference().with_this(), ty.const_reference()),
        ));
        let eq = self.add_function(member(
            FunctionKind::Operator(OperatorId::Equal),
            Prototype::binary_operator(
                Type::BOOLEAN,
                ty.const_reference().with_this(),
                ty.const_reference(),
            ),
        ));
        self.class_mut(class_id).operators = vec![assign, concat, eq];
    }
}

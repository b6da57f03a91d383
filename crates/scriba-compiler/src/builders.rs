//! Builder surface for host-registered symbols.
//!
//! Embedders (and tests) use these to assemble classes, enums and functions
//! without going through source text: pick a name, chain the properties,
//! then `build()` against the engine.

use indexmap::IndexMap;

use scriba_syntax::operators::OperatorId;

use crate::engine::Engine;
use crate::prototype::Prototype;
use crate::symbols::{
    AccessSpecifier, ClassData, ClassId, DataMember, EnumData, EnumId, FunctionData,
    FunctionFlags, FunctionId, FunctionKind, NamespaceId, Symbol,
};
use crate::types::Type;

/// Builds a class in a namespace.
pub struct ClassBuilder<'e> {
    engine: &'e mut Engine,
    namespace: NamespaceId,
    name: String,
    parent: Option<ClassId>,
    members: Vec<DataMember>,
}

impl<'e> ClassBuilder<'e> {
    pub fn new(engine: &'e mut Engine, name: impl Into<String>) -> Self {
        let namespace = engine.root_namespace();
        Self {
            engine,
            namespace,
            name: name.into(),
            parent: None,
            members: Vec::new(),
        }
    }

    pub fn namespace(mut self, namespace: NamespaceId) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn base(mut self, parent: ClassId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn member(mut self, name: impl Into<String>, ty: Type) -> Self {
        self.members.push(DataMember {
            name: name.into(),
            ty,
            access: AccessSpecifier::Public,
            default_value: None,
        });
        self
    }

    pub fn build(self) -> (ClassId, Type) {
        let vtable = self
            .parent
            .map(|p| self.engine.class(p).vtable.clone())
            .unwrap_or_default();

        let (id, ty) = self.engine.type_system_mut().register_class(ClassData {
            name: self.name,
            ty: Type::NULL,
            parent: self.parent,
            enclosing: Symbol::Namespace(self.namespace),
            data_members: self.members,
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
            template_instance_of: None,
        });

        self.engine.namespace_mut(self.namespace).classes.push(id);
        (id, ty)
    }
}

/// Builds an enum in a namespace.
pub struct EnumBuilder<'e> {
    engine: &'e mut Engine,
    namespace: NamespaceId,
    name: String,
    enum_class: bool,
    values: IndexMap<String, i32>,
}

impl<'e> EnumBuilder<'e> {
    pub fn new(engine: &'e mut Engine, name: impl Into<String>) -> Self {
        let namespace = engine.root_namespace();
        Self {
            engine,
            namespace,
            name: name.into(),
            enum_class: false,
            values: IndexMap::new(),
        }
    }

    pub fn namespace(mut self, namespace: NamespaceId) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn enum_class(mut self, on: bool) -> Self {
        self.enum_class = on;
        self
    }

    pub fn value(mut self, name: impl Into<String>) -> Self {
        let next = self.values.values().max().map_or(0, |m| m + 1);
        self.values.insert(name.into(), next);
        self
    }

    pub fn value_with(mut self, name: impl Into<String>, value: i32) -> Self {
        self.values.insert(name.into(), value);
        self
    }

    pub fn build(self) -> (EnumId, Type) {
        let (id, ty) = self.engine.type_system_mut().register_enum(EnumData {
            name: self.name,
            ty: Type::NULL,
            enum_class: self.enum_class,
            enclosing: Symbol::Namespace(self.namespace),
            values: self.values,
        });
        self.engine.namespace_mut(self.namespace).enums.push(id);
        (id, ty)
    }
}

/// Builds functions: free functions, methods, operators, casts,
/// constructors and destructors.
pub struct FunctionBuilder<'e> {
    engine: &'e mut Engine,
    kind: FunctionKind,
    owner: Symbol,
    class: Option<ClassId>,
    return_type: Type,
    params: Vec<Type>,
    flags: FunctionFlags,
}

impl<'e> FunctionBuilder<'e> {
    /// A free function in the root namespace.
    pub fn function(engine: &'e mut Engine, name: impl Into<String>) -> Self {
        let owner = Symbol::Namespace(engine.root_namespace());
        Self {
            engine,
            kind: FunctionKind::Regular { name: name.into() },
            owner,
            class: None,
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A method of `class`; the implicit object parameter is added by
    /// `build()`.
    pub fn method(engine: &'e mut Engine, class: ClassId, name: impl Into<String>) -> Self {
        Self {
            engine,
            kind: FunctionKind::Regular { name: name.into() },
            owner: Symbol::Class(class),
            class: Some(class),
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A constructor of `class`.
    pub fn constructor(engine: &'e mut Engine, class: ClassId) -> Self {
        let class_type = engine.class(class).ty;
        Self {
            engine,
            kind: FunctionKind::Constructor,
            owner: Symbol::Class(class),
            class: Some(class),
            return_type: class_type,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// The destructor of `class`.
    pub fn destructor(engine: &'e mut Engine, class: ClassId) -> Self {
        Self {
            engine,
            kind: FunctionKind::Destructor,
            owner: Symbol::Class(class),
            class: Some(class),
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A member operator of `class`.
    pub fn operator(engine: &'e mut Engine, class: ClassId, op: OperatorId) -> Self {
        Self {
            engine,
            kind: FunctionKind::Operator(op),
            owner: Symbol::Class(class),
            class: Some(class),
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A free operator in the root namespace.
    pub fn free_operator(engine: &'e mut Engine, op: OperatorId) -> Self {
        let owner = Symbol::Namespace(engine.root_namespace());
        Self {
            engine,
            kind: FunctionKind::Operator(op),
            owner,
            class: None,
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A conversion operator of `class`.
    pub fn cast(engine: &'e mut Engine, class: ClassId, dest: Type) -> Self {
        Self {
            engine,
            kind: FunctionKind::Cast,
            owner: Symbol::Class(class),
            class: Some(class),
            return_type: dest,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    /// A literal operator, keyed by its suffix.
    pub fn literal_operator(engine: &'e mut Engine, suffix: impl Into<String>) -> Self {
        let owner = Symbol::Namespace(engine.root_namespace());
        Self {
            engine,
            kind: FunctionKind::LiteralOperator {
                suffix: suffix.into(),
            },
            owner,
            class: None,
            return_type: Type::VOID,
            params: Vec::new(),
            flags: FunctionFlags::default(),
        }
    }

    pub fn returns(mut self, ty: Type) -> Self {
        self.return_type = ty;
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = Type>) -> Self {
        self.params.extend(params);
        self
    }

    pub fn explicit(mut self) -> Self {
        self.flags.is_explicit = true;
        self
    }

    pub fn virtual_(mut self) -> Self {
        self.flags.is_virtual = true;
        self
    }

    pub fn const_(mut self) -> Self {
        self.flags.is_const = true;
        self
    }

    pub fn static_(mut self) -> Self {
        self.flags.is_static = true;
        self
    }

    pub fn deleted(mut self) -> Self {
        self.flags.is_deleted = true;
        self
    }

    pub fn build(self) -> FunctionId {
        let Self {
            engine,
            kind,
            owner,
            class,
            return_type,
            mut params,
            mut flags,
        } = self;

        // Member functions (except constructors) receive their object.
        if let Some(class_id) = class
            && !matches!(kind, FunctionKind::Constructor)
        {
            let class_type = engine.class(class_id).ty;
            let mut this_type = class_type.with_reference();
            if flags.is_const {
                this_type = this_type.with_const();
            }
            if !flags.is_static {
                params.insert(0, this_type.with_this());
            }
        }

        let prototype = match kind {
            FunctionKind::Destructor => {
                Prototype::destructor(engine.class(class.expect("destructors need a class")).ty)
            }
            _ => Prototype::new(return_type, params),
        };

        let mut virtual_index = None;
        if flags.is_virtual && let Some(class_id) = class {
            virtual_index = Some(engine.class(class_id).vtable.len());
        }
        if flags.is_pure_virtual {
            flags.is_virtual = true;
        }

        let id = engine.add_function(FunctionData {
            kind: kind.clone(),
            prototype,
            flags,
            owner,
            access: AccessSpecifier::Public,
            default_arguments: Vec::new(),
            virtual_index,
            body: None,
        });

        match owner {
            Symbol::Class(class_id) => {
                match kind {
                    FunctionKind::Constructor => engine.class_mut(class_id).constructors.push(id),
                    FunctionKind::Destructor => engine.class_mut(class_id).destructor = Some(id),
                    FunctionKind::Operator(_) => engine.class_mut(class_id).operators.push(id),
                    FunctionKind::Cast => engine.class_mut(class_id).casts.push(id),
                    _ => engine.class_mut(class_id).methods.push(id),
                }
                if let Some(slot) = virtual_index {
                    let vtable = &mut engine.class_mut(class_id).vtable;
                    if slot == vtable.len() {
                        vtable.push(id);
                    } else {
                        vtable[slot] = id;
                    }
                }
            }
            Symbol::Namespace(ns) => match kind {
                FunctionKind::Operator(_) => engine.namespace_mut(ns).operators.push(id),
                FunctionKind::LiteralOperator { .. } => {
                    engine.namespace_mut(ns).literal_operators.push(id)
                }
                _ => engine.namespace_mut(ns).functions.push(id),
            },
            _ => {}
        }

        id
    }
}

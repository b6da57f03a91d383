//! Type identity and registration.
//!
//! The type system owns class, enum and closure definitions and interns
//! function-type signatures. Registration happens inside a transaction or
//! against an explicit snapshot, so a half-built class hierarchy can be
//! rolled back instead of leaking.

use indexmap::IndexMap;

use crate::prototype::Prototype;
use crate::symbols::{ClassData, ClassId, ClosureData, ClosureId, EnumData, EnumId};
use crate::types::{Type, TypeCategory};

#[derive(Debug, Default)]
pub struct TypeSystem {
    classes: Vec<ClassData>,
    enums: Vec<EnumData>,
    closures: Vec<ClosureData>,
    function_types: IndexMap<Prototype, Type>,
    prototypes: Vec<Prototype>,
}

/// Marks a point the type system can be rolled back to.
#[derive(Debug, Clone, Copy)]
pub struct TypeSystemSnapshot {
    classes: usize,
    enums: usize,
    closures: usize,
    function_types: usize,
}

impl TypeSystem {
    pub fn new() -> Self {
        Self::default()
    }

    // -- Registration -------------------------------------------------------

    pub fn register_class(&mut self, mut data: ClassData) -> (ClassId, Type) {
        let id = ClassId(self.classes.len() as u32);
        let ty = Type::new(id.0, TypeCategory::Object);
        data.ty = ty;
        self.classes.push(data);
        (id, ty)
    }

    pub fn register_enum(&mut self, mut data: EnumData) -> (EnumId, Type) {
        let id = EnumId(self.enums.len() as u32);
        let ty = Type::new(id.0, TypeCategory::Enum);
        data.ty = ty;
        self.enums.push(data);
        (id, ty)
    }

    pub fn register_closure(&mut self, mut data: ClosureData) -> (ClosureId, Type) {
        let id = ClosureId(self.closures.len() as u32);
        let ty = Type::new(id.0, TypeCategory::Closure);
        data.ty = ty;
        self.closures.push(data);
        (id, ty)
    }

    /// Interns a signature: equal prototypes share one function type.
    pub fn function_type(&mut self, prototype: Prototype) -> Type {
        if let Some(ty) = self.function_types.get(&prototype) {
            return *ty;
        }

        let ty = Type::new(self.prototypes.len() as u32, TypeCategory::Prototype);
        self.function_types.insert(prototype.clone(), ty);
        self.prototypes.push(prototype);
        ty
    }

    // -- Queries ------------------------------------------------------------

    /// Whether the base type of `t` refers to a registered (or fundamental)
    /// type.
    pub fn exists(&self, t: Type) -> bool {
        let index = t.index() as usize;
        match t.category() {
            TypeCategory::Fundamental => (t.index()) < Type::FIRST_FREE_INDEX && !t.is_null(),
            TypeCategory::Enum => index < self.enums.len(),
            TypeCategory::Object => index < self.classes.len(),
            TypeCategory::Prototype => index < self.prototypes.len(),
            TypeCategory::Closure => index < self.closures.len(),
        }
    }

    pub fn get_class(&self, t: Type) -> Option<ClassId> {
        if t.is_object_type() && (t.index() as usize) < self.classes.len() {
            Some(ClassId(t.index()))
        } else {
            None
        }
    }

    pub fn get_enum(&self, t: Type) -> Option<EnumId> {
        if t.is_enum_type() && (t.index() as usize) < self.enums.len() {
            Some(EnumId(t.index()))
        } else {
            None
        }
    }

    pub fn get_closure(&self, t: Type) -> Option<ClosureId> {
        if t.is_closure_type() && (t.index() as usize) < self.closures.len() {
            Some(ClosureId(t.index()))
        } else {
            None
        }
    }

    /// The interned signature behind a function type.
    pub fn get_prototype(&self, t: Type) -> Option<&Prototype> {
        if t.is_function_type() {
            self.prototypes.get(t.index() as usize)
        } else {
            None
        }
    }

    pub fn class(&self, id: ClassId) -> &ClassData {
        &self.classes[id.index()]
    }

    pub fn class_mut(&mut self, id: ClassId) -> &mut ClassData {
        &mut self.classes[id.index()]
    }

    pub fn enum_(&self, id: EnumId) -> &EnumData {
        &self.enums[id.index()]
    }

    pub fn enum_mut(&mut self, id: EnumId) -> &mut EnumData {
        &mut self.enums[id.index()]
    }

    pub fn closure(&self, id: ClosureId) -> &ClosureData {
        &self.closures[id.index()]
    }

    pub fn closure_mut(&mut self, id: ClosureId) -> &mut ClosureData {
        &mut self.closures[id.index()]
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn classes(&self) -> impl Iterator<Item = (ClassId, &ClassData)> {
        self.classes
            .iter()
            .enumerate()
            .map(|(i, c)| (ClassId(i as u32), c))
    }

    // -- Transactions -------------------------------------------------------

    pub fn snapshot(&self) -> TypeSystemSnapshot {
        TypeSystemSnapshot {
            classes: self.classes.len(),
            enums: self.enums.len(),
            closures: self.closures.len(),
            function_types: self.function_types.len(),
        }
    }

    /// Forgets everything registered since the snapshot was taken.
    pub fn rollback_to(&mut self, snapshot: TypeSystemSnapshot) {
        self.classes.truncate(snapshot.classes);
        self.enums.truncate(snapshot.enums);
        self.closures.truncate(snapshot.closures);
        self.function_types.truncate(snapshot.function_types);
        self.prototypes.truncate(snapshot.function_types);
    }

    /// Starts a guarded transaction; dropping the guard without committing
    /// rolls back every registration performed through it.
    pub fn transaction(&mut self) -> TypeSystemTransaction<'_> {
        let snapshot = self.snapshot();
        TypeSystemTransaction {
            type_system: self,
            snapshot,
            committed: false,
        }
    }
}

/// Guard over a batch of registrations.
///
/// Mirrors the drop-on-unwind rollback of the transactional registration
/// model, with an explicit [`TypeSystemTransaction::commit`] instead of
/// relying on unwinding.
pub struct TypeSystemTransaction<'a> {
    type_system: &'a mut TypeSystem,
    snapshot: TypeSystemSnapshot,
    committed: bool,
}

impl TypeSystemTransaction<'_> {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for TypeSystemTransaction<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.type_system.rollback_to(self.snapshot);
        }
    }
}

impl std::ops::Deref for TypeSystemTransaction<'_> {
    type Target = TypeSystem;

    fn deref(&self) -> &TypeSystem {
        self.type_system
    }
}

impl std::ops::DerefMut for TypeSystemTransaction<'_> {
    fn deref_mut(&mut self) -> &mut TypeSystem {
        self.type_system
    }
}

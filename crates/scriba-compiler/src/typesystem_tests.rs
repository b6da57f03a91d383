use crate::Engine;
use crate::builders::ClassBuilder;
use crate::prototype::Prototype;
use crate::types::{Type, TypeCategory};

#[test]
fn type_packing_round_trips() {
    let t = Type::new(42, TypeCategory::Object);
    assert_eq!(t.index(), 42);
    assert_eq!(t.category(), TypeCategory::Object);
    assert!(t.is_object_type());
    assert!(!t.is_const());
    assert!(!t.is_reference());
}

#[test]
fn qualifier_flags_do_not_alter_identity() {
    let t = Type::new(7, TypeCategory::Enum);
    let qualified = t.with_const().with_reference();

    assert!(qualified.is_const());
    assert!(qualified.is_reference());
    assert_eq!(qualified.base_type(), t);
    assert_eq!(qualified.index(), t.index());
    assert_eq!(qualified.category(), t.category());

    assert_eq!(qualified.without_const().without_reference(), t);
}

#[test]
fn const_reference_composition() {
    let t = Type::INT;
    let cref = t.const_reference();
    assert!(cref.is_const_reference());
    assert_eq!(cref, t.with_const().with_reference());

    let fwd = t.with_forward_reference();
    assert!(fwd.is_forward_reference());
    assert!(fwd.is_any_reference());
    assert!(!fwd.is_reference());
}

#[test]
fn fundamental_constants_exist() {
    let engine = Engine::new();
    for t in [
        Type::VOID,
        Type::BOOLEAN,
        Type::CHAR,
        Type::INT,
        Type::FLOAT,
        Type::DOUBLE,
    ] {
        assert!(engine.type_system().exists(t), "{t:?} should exist");
    }
    assert!(!engine.type_system().exists(Type::NULL));
}

#[test]
fn function_types_are_interned() {
    let mut engine = Engine::new();

    let p1 = Prototype::new(Type::INT, vec![Type::INT, Type::DOUBLE]);
    let p2 = Prototype::new(Type::INT, vec![Type::INT, Type::DOUBLE]);
    let p3 = Prototype::new(Type::INT, vec![Type::DOUBLE, Type::INT]);

    let t1 = engine.type_system_mut().function_type(p1);
    let t2 = engine.type_system_mut().function_type(p2);
    let t3 = engine.type_system_mut().function_type(p3);

    assert_eq!(t1, t2);
    assert_ne!(t1, t3);
    assert!(t1.is_function_type());

    let proto = engine.type_system().get_prototype(t1).expect("interned");
    assert_eq!(proto.return_type(), Type::INT);
    assert_eq!(proto.param_count(), 2);
}

#[test]
fn class_registration_is_queryable() {
    let mut engine = Engine::new();
    let (id, ty) = ClassBuilder::new(&mut engine, "A").build();

    assert!(engine.type_system().exists(ty));
    assert_eq!(engine.type_system().get_class(ty), Some(id));
    assert_eq!(engine.class(id).name, "A");
    assert_eq!(engine.type_name(ty), "A");
}

#[test]
fn transaction_commit_keeps_registrations() {
    let mut engine = Engine::new();
    let before = engine.type_system().class_count();

    let ty = {
        let mut tx = engine.type_system_mut().transaction();
        let (_, ty) = tx.register_class(crate::symbols::ClassData {
            name: "Tmp".to_owned(),
            ty: Type::NULL,
            parent: None,
            enclosing: crate::symbols::Symbol::Namespace(crate::symbols::ROOT_NAMESPACE),
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
        tx.commit();
        ty
    };

    assert_eq!(engine.type_system().class_count(), before + 1);
    assert!(engine.type_system().exists(ty));
}

#[test]
fn dropped_transaction_rolls_back() {
    let mut engine = Engine::new();
    let before = engine.type_system().class_count();

    let ty = {
        let mut tx = engine.type_system_mut().transaction();
        let (_, ty) = tx.register_class(crate::symbols::ClassData {
            name: "Doomed".to_owned(),
            ty: Type::NULL,
            parent: None,
            enclosing: crate::symbols::Symbol::Namespace(crate::symbols::ROOT_NAMESPACE),
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
        let _ = tx.function_type(Prototype::new(ty, vec![ty]));
        ty
        // tx dropped here without commit
    };

    assert_eq!(engine.type_system().class_count(), before);
    assert!(!engine.type_system().exists(ty));
    assert!(engine.type_system().get_class(ty).is_none());
}

#[test]
fn snapshot_rollback_is_equivalent() {
    let mut engine = Engine::new();
    let snapshot = engine.type_system().snapshot();

    let (_, ty) = ClassBuilder::new(&mut engine, "Gone").build();
    assert!(engine.type_system().exists(ty));

    engine.type_system_mut().rollback_to(snapshot);
    assert!(!engine.type_system().exists(ty));
}

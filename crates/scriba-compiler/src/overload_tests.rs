use crate::Engine;
use crate::builders::{ClassBuilder, FunctionBuilder};
use crate::overload::{resolve_member_overloads, resolve_overloads};
use crate::symbols::FunctionId;
use crate::types::Type;

fn max_overloads(engine: &mut Engine) -> (FunctionId, FunctionId) {
    let int_max = FunctionBuilder::function(engine, "max")
        .returns(Type::INT)
        .params([Type::INT, Type::INT])
        .build();
    let float_max = FunctionBuilder::function(engine, "max")
        .returns(Type::FLOAT)
        .params([Type::FLOAT, Type::FLOAT])
        .build();
    (int_max, float_max)
}

#[test]
fn exact_match_wins_over_promotion() {
    // int max(int, int); int max(float, float); max(1, 2) selects the ints.
    let mut engine = Engine::new();
    let (int_max, _) = max_overloads(&mut engine);

    let selected = resolve_overloads(&engine, &candidates(&engine), &[Type::INT, Type::INT])
        .expect("unique best");
    assert_eq!(selected.function, int_max);

    // Both argument initializations are plain copies.
    for init in &selected.initializations {
        assert!(init.conversion().first_standard_conversion().is_copy());
    }

    fn candidates(engine: &Engine) -> Vec<FunctionId> {
        engine
            .namespace(engine.root_namespace())
            .functions
            .iter()
            .copied()
            .filter(|&f| engine.function(f).name() == Some("max"))
            .collect()
    }
}

#[test]
fn promotion_beats_nothing() {
    let mut engine = Engine::new();
    let (_, float_max) = max_overloads(&mut engine);

    // max(1.5f, 2.5f) selects the float overload exactly.
    let selected = resolve_overloads(
        &engine,
        &[float_max],
        &[Type::FLOAT, Type::FLOAT],
    )
    .expect("unique best");
    assert_eq!(selected.function, float_max);
}

#[test]
fn equal_rank_candidates_are_ambiguous() {
    // void f(float); void f(double); f(1) finds no unique best.
    let mut engine = Engine::new();
    let f_float = FunctionBuilder::function(&mut engine, "f")
        .params([Type::FLOAT])
        .build();
    let f_double = FunctionBuilder::function(&mut engine, "f")
        .params([Type::DOUBLE])
        .build();

    let result = resolve_overloads(&engine, &[f_float, f_double], &[Type::INT]);
    assert!(result.is_none());
}

#[test]
fn candidate_order_does_not_change_the_outcome() {
    let mut engine = Engine::new();
    let (int_max, float_max) = max_overloads(&mut engine);

    let a = resolve_overloads(&engine, &[int_max, float_max], &[Type::INT, Type::INT]);
    let b = resolve_overloads(&engine, &[float_max, int_max], &[Type::INT, Type::INT]);
    assert_eq!(a.map(|c| c.function), b.map(|c| c.function));

    // The ambiguous case stays ambiguous in both orders.
    let f_float = FunctionBuilder::function(&mut engine, "g")
        .params([Type::FLOAT])
        .build();
    let f_double = FunctionBuilder::function(&mut engine, "g")
        .params([Type::DOUBLE])
        .build();

    assert!(resolve_overloads(&engine, &[f_float, f_double], &[Type::INT]).is_none());
    assert!(resolve_overloads(&engine, &[f_double, f_float], &[Type::INT]).is_none());
}

#[test]
fn arity_mismatches_are_rejected() {
    let mut engine = Engine::new();
    let f = FunctionBuilder::function(&mut engine, "f")
        .params([Type::INT, Type::INT])
        .build();

    assert!(resolve_overloads(&engine, &[f], &[Type::INT]).is_none());
    assert!(resolve_overloads(&engine, &[f], &[Type::INT, Type::INT, Type::INT]).is_none());
}

#[test]
fn no_viable_candidate_yields_none() {
    let mut engine = Engine::new();
    let (_, a_ty) = ClassBuilder::new(&mut engine, "A").build();
    let f = FunctionBuilder::function(&mut engine, "f")
        .params([a_ty])
        .build();

    assert!(resolve_overloads(&engine, &[f], &[Type::INT]).is_none());
}

#[test]
fn member_calls_convert_the_implicit_object() {
    let mut engine = Engine::new();
    let (a, a_ty) = ClassBuilder::new(&mut engine, "A").build();
    let (b, b_ty) = ClassBuilder::new(&mut engine, "B").base(a).build();
    let _ = b;

    let method = FunctionBuilder::method(&mut engine, a, "foo")
        .returns(Type::INT)
        .const_()
        .build();

    // A derived object binds to the base method's implicit object.
    let selected =
        resolve_member_overloads(&engine, &[method], b_ty, &[] as &[Type]).expect("viable");
    assert_eq!(selected.function, method);
    assert!(
        selected.initializations[0]
            .conversion()
            .first_standard_conversion()
            .is_reference_binding()
    );
}

#[test]
fn implicit_object_binds_const_agnostically() {
    // Calling a non-const method through `const A &` is allowed; the
    // implicit object only distinguishes copy from reference binding.
    let mut engine = Engine::new();
    let (a, a_ty) = ClassBuilder::new(&mut engine, "A").build();

    let mutating = FunctionBuilder::method(&mut engine, a, "set").build();
    let reading = FunctionBuilder::method(&mut engine, a, "get").const_().build();

    let const_obj = a_ty.const_reference();
    assert!(resolve_member_overloads(&engine, &[mutating], const_obj, &[] as &[Type]).is_some());
    assert!(resolve_member_overloads(&engine, &[reading], const_obj, &[] as &[Type]).is_some());
}

#[test]
fn default_arguments_extend_viability() {
    let mut engine = Engine::new();
    let f = FunctionBuilder::function(&mut engine, "f")
        .returns(Type::INT)
        .params([Type::INT, Type::INT])
        .build();

    // Fake one default argument on the trailing parameter.
    engine.function_mut(f).default_arguments.push(std::rc::Rc::new(
        crate::program::Expression::Literal(crate::program::Literal {
            value: crate::Value::Int(1),
            ty: Type::INT,
        }),
    ));

    assert!(resolve_overloads(&engine, &[f], &[Type::INT]).is_some());
    assert!(resolve_overloads(&engine, &[f], &[Type::INT, Type::INT]).is_some());
    assert!(resolve_overloads(&engine, &[f], &[] as &[Type]).is_none());
}

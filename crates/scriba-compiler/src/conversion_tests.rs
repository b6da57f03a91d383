use crate::Engine;
use crate::builders::{ClassBuilder, FunctionBuilder};
use crate::conversion::{Conversion, ConversionPolicy, ConversionRank, StandardConversion};
use crate::types::Type;

fn std_conv(src: Type, dest: Type, engine: &Engine) -> StandardConversion {
    StandardConversion::compute(src, dest, engine)
}

#[test]
fn identity_is_an_exact_match_copy() {
    let engine = Engine::new();
    let conv = std_conv(Type::INT, Type::INT, &engine);
    assert!(conv.is_convertible());
    assert!(conv.is_copy());
    assert_eq!(conv.rank(), ConversionRank::ExactMatch);
}

#[test]
fn reference_binding_rules() {
    let engine = Engine::new();

    // T -> const T& always binds.
    let conv = std_conv(Type::INT, Type::INT.const_reference(), &engine);
    assert!(conv.is_convertible());
    assert!(conv.is_reference_binding());
    assert_eq!(conv.rank(), ConversionRank::ExactMatch);

    // const T& -> T& never does.
    let conv = std_conv(
        Type::INT.const_reference(),
        Type::INT.with_reference(),
        &engine,
    );
    assert!(!conv.is_convertible());

    // T& -> const T& adjusts qualification.
    let conv = std_conv(
        Type::INT.with_reference(),
        Type::INT.const_reference(),
        &engine,
    );
    assert!(conv.is_convertible());
    assert!(conv.has_qualification_adjustment());
}

#[test]
fn numeric_promotions() {
    let engine = Engine::new();

    for (src, dest) in [
        (Type::INT, Type::FLOAT),
        (Type::INT, Type::DOUBLE),
        (Type::FLOAT, Type::DOUBLE),
        (Type::CHAR, Type::INT),
        (Type::BOOLEAN, Type::INT),
    ] {
        let conv = std_conv(src, dest, &engine);
        assert!(conv.is_convertible());
        assert!(conv.is_numeric_promotion(), "{src:?} -> {dest:?}");
        assert_eq!(conv.rank(), ConversionRank::Promotion);
        assert!(!conv.is_narrowing());
    }
}

#[test]
fn narrowing_conversions() {
    let engine = Engine::new();

    for (src, dest) in [
        (Type::DOUBLE, Type::INT),
        (Type::FLOAT, Type::INT),
        (Type::INT, Type::CHAR),
        (Type::DOUBLE, Type::FLOAT),
        (Type::INT, Type::BOOLEAN),
        (Type::DOUBLE, Type::BOOLEAN),
    ] {
        let conv = std_conv(src, dest, &engine);
        assert!(conv.is_convertible());
        assert!(conv.is_numeric_conversion(), "{src:?} -> {dest:?}");
        assert!(conv.is_narrowing(), "{src:?} -> {dest:?}");
        assert_eq!(conv.rank(), ConversionRank::Conversion);
    }
}

#[test]
fn enum_to_int_is_a_conversion() {
    let mut engine = Engine::new();
    let (_, enum_ty) = crate::builders::EnumBuilder::new(&mut engine, "Color")
        .value("Red")
        .value("Green")
        .build();

    let conv = std_conv(enum_ty, Type::INT, &engine);
    assert!(conv.is_convertible());
    assert_eq!(conv.rank(), ConversionRank::Conversion);

    // The other direction does not exist.
    assert!(!std_conv(Type::INT, enum_ty, &engine).is_convertible());
}

#[test]
fn derived_to_base_walks_the_hierarchy() {
    let mut engine = Engine::new();
    let (a, a_ty) = ClassBuilder::new(&mut engine, "A").build();
    let (b, b_ty) = ClassBuilder::new(&mut engine, "B").base(a).build();
    let (_, c_ty) = ClassBuilder::new(&mut engine, "C").base(b).build();

    let conv = std_conv(b_ty, a_ty, &engine);
    assert!(conv.is_convertible());
    assert!(conv.is_derived_to_base());
    assert_eq!(conv.derived_to_base_depth(), 1);
    assert_eq!(conv.rank(), ConversionRank::Conversion);

    // Deeper walks stay convertible; the depth grows monotonically.
    let deep = std_conv(c_ty, a_ty, &engine);
    assert_eq!(deep.derived_to_base_depth(), 2);
    assert_eq!(deep.rank(), ConversionRank::Conversion);

    // Binding a reference to a base is an exact match.
    let bind = std_conv(b_ty, a_ty.const_reference(), &engine);
    assert!(bind.is_reference_binding());
    assert_eq!(bind.rank(), ConversionRank::ExactMatch);

    // Base to derived never converts.
    assert!(!std_conv(a_ty, b_ty, &engine).is_convertible());
}

#[test]
fn unrelated_classes_do_not_convert() {
    let mut engine = Engine::new();
    let (_, a_ty) = ClassBuilder::new(&mut engine, "A").build();
    let (_, b_ty) = ClassBuilder::new(&mut engine, "B").build();

    assert!(!std_conv(a_ty, b_ty, &engine).is_convertible());
    assert_eq!(
        Conversion::compute(a_ty, b_ty, &engine, ConversionPolicy::NoExplicitConversions).rank(),
        ConversionRank::NotConvertible
    );
}

#[test]
fn converting_constructor_is_found() {
    let mut engine = Engine::new();
    let (class, class_ty) = ClassBuilder::new(&mut engine, "Meters").build();
    FunctionBuilder::constructor(&mut engine, class)
        .params([Type::DOUBLE])
        .build();

    let conv = Conversion::compute(
        Type::DOUBLE,
        class_ty,
        &engine,
        ConversionPolicy::NoExplicitConversions,
    );
    assert!(!conv.is_invalid());
    assert!(conv.is_user_defined());
    assert_eq!(conv.rank(), ConversionRank::UserDefinedConversion);

    // The constructor also accepts anything convertible to double.
    let conv = Conversion::compute(
        Type::INT,
        class_ty,
        &engine,
        ConversionPolicy::NoExplicitConversions,
    );
    assert!(!conv.is_invalid());
}

#[test]
fn explicit_constructor_requires_the_policy() {
    let mut engine = Engine::new();
    let (class, class_ty) = ClassBuilder::new(&mut engine, "Guard").build();
    FunctionBuilder::constructor(&mut engine, class)
        .params([Type::INT])
        .explicit()
        .build();

    let implicit = Conversion::compute(
        Type::INT,
        class_ty,
        &engine,
        ConversionPolicy::NoExplicitConversions,
    );
    assert!(implicit.is_invalid());

    let explicit = Conversion::compute(
        Type::INT,
        class_ty,
        &engine,
        ConversionPolicy::AllowExplicitConversions,
    );
    assert!(!explicit.is_invalid());
}

#[test]
fn cast_operator_is_found() {
    let mut engine = Engine::new();
    let (class, class_ty) = ClassBuilder::new(&mut engine, "Celsius").build();
    FunctionBuilder::cast(&mut engine, class, Type::DOUBLE)
        .const_()
        .build();

    let conv = Conversion::compute(
        class_ty,
        Type::DOUBLE,
        &engine,
        ConversionPolicy::NoExplicitConversions,
    );
    assert!(!conv.is_invalid());
    assert!(conv.is_user_defined());

    // Through the second standard conversion, a cast to double also
    // reaches int.
    let conv = Conversion::compute(
        class_ty,
        Type::INT,
        &engine,
        ConversionPolicy::NoExplicitConversions,
    );
    assert!(!conv.is_invalid());
    assert!(conv.second_standard_conversion().is_narrowing());
}

#[test]
fn conversion_determinism_and_rank_order() {
    let mut engine = Engine::new();
    let (a, a_ty) = ClassBuilder::new(&mut engine, "A").build();
    let (_, b_ty) = ClassBuilder::new(&mut engine, "B").base(a).build();

    let universe = [
        Type::BOOLEAN,
        Type::CHAR,
        Type::INT,
        Type::FLOAT,
        Type::DOUBLE,
        a_ty,
        b_ty,
    ];

    for &src in &universe {
        // compute(T, T) is always a copy.
        let conv = std_conv(src, src, &engine);
        assert!(conv.is_copy(), "{src:?}");
        assert_eq!(conv.rank(), ConversionRank::ExactMatch);

        for &dest in &universe {
            let once = std_conv(src, dest, &engine);
            let twice = std_conv(src, dest, &engine);
            assert_eq!(once, twice, "determinism for {src:?} -> {dest:?}");
        }
    }

    // Rank ordering is total and matches the declared order.
    assert!(ConversionRank::ExactMatch < ConversionRank::Promotion);
    assert!(ConversionRank::Promotion < ConversionRank::Conversion);
    assert!(ConversionRank::Conversion < ConversionRank::UserDefinedConversion);
    assert!(ConversionRank::UserDefinedConversion < ConversionRank::NotConvertible);
}

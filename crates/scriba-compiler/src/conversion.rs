//! The implicit-conversion algebra.
//!
//! A [`StandardConversion`] converts without running user code: numeric
//! promotions and conversions, reference binding, derived-to-base walks and
//! qualification adjustments. A [`Conversion`] optionally sandwiches one
//! user-defined conversion (converting constructor or cast operator) between
//! two standard ones.

use std::cmp::Ordering;

use crate::engine::Engine;
use crate::symbols::FunctionId;
use crate::types::Type;

/// Rank of a conversion sequence; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConversionRank {
    ExactMatch = 1,
    Promotion = 2,
    Conversion = 3,
    UserDefinedConversion = 4,
    NotConvertible = 5,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericPromotion {
    #[default]
    None,
    Integral,
    FloatingPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NumericConversion {
    #[default]
    None,
    Integral,
    FloatingPoint,
    Boolean,
}

/// A conversion that does not invoke user code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StandardConversion {
    src: Type,
    dest: Type,
    promotion: NumericPromotion,
    conversion: NumericConversion,
    /// Binding as a reference instead of copying.
    reference_binding: bool,
    enum_to_int: bool,
    derived_to_base_depth: u32,
    qualification_adjustment: bool,
    narrowing: bool,
    convertible: bool,
}

impl StandardConversion {
    /// The "no conversion" sequence (used as the empty second leg of
    /// user-defined conversions).
    pub fn none() -> Self {
        Self {
            src: Type::NULL,
            dest: Type::NULL,
            promotion: NumericPromotion::None,
            conversion: NumericConversion::None,
            reference_binding: false,
            enum_to_int: false,
            derived_to_base_depth: 0,
            qualification_adjustment: false,
            narrowing: false,
            convertible: true,
        }
    }

    pub fn not_convertible() -> Self {
        Self {
            convertible: false,
            ..Self::none()
        }
    }

    /// Plain same-type copy.
    pub fn copy(src: Type, dest: Type) -> Self {
        Self {
            src,
            dest,
            ..Self::none()
        }
    }

    pub fn is_none(&self) -> bool {
        self.convertible && self.src.is_null() && self.dest.is_null()
    }

    pub fn is_convertible(&self) -> bool {
        self.convertible
    }

    pub fn is_narrowing(&self) -> bool {
        self.narrowing
    }

    pub fn is_copy(&self) -> bool {
        self.convertible && !self.reference_binding
    }

    pub fn is_reference_binding(&self) -> bool {
        self.reference_binding
    }

    pub fn is_numeric_promotion(&self) -> bool {
        self.promotion != NumericPromotion::None
    }

    pub fn numeric_promotion(&self) -> NumericPromotion {
        self.promotion
    }

    pub fn is_numeric_conversion(&self) -> bool {
        self.conversion != NumericConversion::None
    }

    pub fn numeric_conversion(&self) -> NumericConversion {
        self.conversion
    }

    pub fn is_derived_to_base(&self) -> bool {
        self.derived_to_base_depth > 0
    }

    pub fn derived_to_base_depth(&self) -> u32 {
        self.derived_to_base_depth
    }

    pub fn has_qualification_adjustment(&self) -> bool {
        self.qualification_adjustment
    }

    pub fn src_type(&self) -> Type {
        self.src
    }

    pub fn dest_type(&self) -> Type {
        self.dest
    }

    pub fn rank(&self) -> ConversionRank {
        if !self.convertible {
            return ConversionRank::NotConvertible;
        }
        if self.promotion != NumericPromotion::None {
            return ConversionRank::Promotion;
        }
        if self.conversion != NumericConversion::None
            || self.enum_to_int
            || (self.derived_to_base_depth > 0 && !self.reference_binding)
        {
            return ConversionRank::Conversion;
        }
        ConversionRank::ExactMatch
    }

    /// Computes the standard conversion from `src` to `dest`.
    pub fn compute(src: Type, dest: Type, engine: &Engine) -> StandardConversion {
        if src.is_null() || dest.is_null() || src.is_auto() || dest.is_auto() {
            return Self::not_convertible();
        }

        let src_base = src.base_type();
        let dest_base = dest.base_type();

        // Identity, reference binding and qualification adjustments.
        if src_base == dest_base {
            if dest.is_any_reference() {
                // A const value never binds to a mutable reference.
                if !dest.is_const() && src.is_const() {
                    return Self::not_convertible();
                }
                return StandardConversion {
                    src,
                    dest,
                    reference_binding: true,
                    qualification_adjustment: dest.is_const() && !src.is_const(),
                    ..Self::copy(src, dest)
                };
            }
            return Self::copy(src, dest);
        }

        // Fundamental numeric promotions and conversions.
        if is_numeric(src_base) && is_numeric(dest_base) {
            if dest.is_any_reference() && !dest.is_const() {
                return Self::not_convertible();
            }
            return numeric_conversion(src, dest);
        }

        // Enum to int.
        if src_base.is_enum_type() && dest_base == Type::INT {
            if dest.is_any_reference() && !dest.is_const() {
                return Self::not_convertible();
            }
            return StandardConversion {
                enum_to_int: true,
                ..Self::copy(src, dest)
            };
        }

        // A captureless closure decays to the matching function type.
        if src_base.is_closure_type() && dest_base.is_function_type() {
            let matches = engine
                .type_system()
                .get_closure(src_base)
                .map(|c| engine.type_system().closure(c))
                .filter(|c| c.captures.is_empty())
                .map(|c| engine.function(c.call_operator).prototype.clone())
                .zip(engine.type_system().get_prototype(dest_base))
                .is_some_and(|(call_op, proto)| {
                    call_op.return_type() == proto.return_type()
                        && call_op.params().len() == proto.params().len() + 1
                        && call_op.params().iter().skip(1).eq(proto.params().iter())
                });

            if matches {
                return Self::copy(src, dest);
            }
            return Self::not_convertible();
        }

        // Derived to base.
        if src_base.is_object_type() && dest_base.is_object_type() {
            let (Some(src_class), Some(dest_class)) = (
                engine.type_system().get_class(src_base),
                engine.type_system().get_class(dest_base),
            ) else {
                return Self::not_convertible();
            };

            let Some(depth) = engine.derived_to_base_depth(src_class, dest_class) else {
                return Self::not_convertible();
            };
            debug_assert!(depth > 0, "equal classes are handled above");

            if dest.is_any_reference() {
                if !dest.is_const() && src.is_const() {
                    return Self::not_convertible();
                }
                return StandardConversion {
                    reference_binding: true,
                    derived_to_base_depth: depth,
                    qualification_adjustment: dest.is_const() && !src.is_const(),
                    ..Self::copy(src, dest)
                };
            }

            return StandardConversion {
                derived_to_base_depth: depth,
                ..Self::copy(src, dest)
            };
        }

        Self::not_convertible()
    }

    /// Total deterministic order used to break overload ties: rank first,
    /// then shallower base walks, then reference bindings over copies, then
    /// fewer qualification adjustments.
    pub fn comp(a: &StandardConversion, b: &StandardConversion) -> Ordering {
        a.rank()
            .cmp(&b.rank())
            .then(a.derived_to_base_depth.cmp(&b.derived_to_base_depth))
            .then_with(|| match (a.reference_binding, b.reference_binding) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => Ordering::Equal,
            })
            .then(a.qualification_adjustment.cmp(&b.qualification_adjustment))
    }
}

fn is_numeric(t: Type) -> bool {
    matches!(
        t,
        Type::BOOLEAN | Type::CHAR | Type::INT | Type::FLOAT | Type::DOUBLE
    )
}

/// Width order of the numeric fundamentals.
fn numeric_level(t: Type) -> u32 {
    match t {
        Type::BOOLEAN => 1,
        Type::CHAR => 2,
        Type::INT => 3,
        Type::FLOAT => 4,
        Type::DOUBLE => 5,
        _ => 0,
    }
}

fn numeric_conversion(src: Type, dest: Type) -> StandardConversion {
    let src_base = src.base_type();
    let dest_base = dest.base_type();
    let from = numeric_level(src_base);
    let to = numeric_level(dest_base);
    debug_assert!(from != to && from != 0 && to != 0);

    if to > from {
        let promotion = if dest_base == Type::FLOAT || dest_base == Type::DOUBLE {
            NumericPromotion::FloatingPoint
        } else {
            NumericPromotion::Integral
        };
        StandardConversion {
            promotion,
            ..StandardConversion::copy(src, dest)
        }
    } else {
        let conversion = if dest_base == Type::BOOLEAN {
            NumericConversion::Boolean
        } else if dest_base == Type::CHAR || dest_base == Type::INT {
            NumericConversion::Integral
        } else {
            NumericConversion::FloatingPoint
        };
        StandardConversion {
            conversion,
            narrowing: true,
            ..StandardConversion::copy(src, dest)
        }
    }
}

/// How eagerly `explicit` functions participate in conversions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConversionPolicy {
    #[default]
    NoExplicitConversions,
    AllowExplicitConversions,
}

/// A full conversion sequence: standard, then optionally one user-defined
/// function, then standard again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    first: StandardConversion,
    function: Option<FunctionId>,
    second: StandardConversion,
}

impl Conversion {
    pub fn standard(first: StandardConversion) -> Self {
        Self {
            first,
            function: None,
            second: StandardConversion::none(),
        }
    }

    pub fn user_defined(
        first: StandardConversion,
        function: FunctionId,
        second: StandardConversion,
    ) -> Self {
        Self {
            first,
            function: Some(function),
            second,
        }
    }

    pub fn not_convertible() -> Self {
        Self::standard(StandardConversion::not_convertible())
    }

    pub fn first_standard_conversion(&self) -> &StandardConversion {
        &self.first
    }

    pub fn user_defined_conversion(&self) -> Option<FunctionId> {
        self.function
    }

    pub fn second_standard_conversion(&self) -> &StandardConversion {
        &self.second
    }

    pub fn is_invalid(&self) -> bool {
        !self.first.is_convertible() || !self.second.is_convertible()
    }

    pub fn is_user_defined(&self) -> bool {
        self.function.is_some()
    }

    pub fn is_narrowing(&self) -> bool {
        self.first.is_narrowing() || self.second.is_narrowing()
    }

    pub fn rank(&self) -> ConversionRank {
        if self.is_invalid() {
            return ConversionRank::NotConvertible;
        }
        if self.function.is_some() {
            return ConversionRank::UserDefinedConversion;
        }
        self.first.rank()
    }

    pub fn src_type(&self) -> Type {
        self.first.src_type()
    }

    pub fn dest_type(&self) -> Type {
        if self.second.is_none() {
            self.first.dest_type()
        } else {
            self.second.dest_type()
        }
    }

    /// Computes the best conversion from `src` to `dest`.
    ///
    /// Tries the standard path first, then enumerates converting
    /// constructors of `dest` and cast operators of `src`. `explicit`
    /// functions participate only under
    /// [`ConversionPolicy::AllowExplicitConversions`].
    pub fn compute(
        src: Type,
        dest: Type,
        engine: &Engine,
        policy: ConversionPolicy,
    ) -> Conversion {
        let std = StandardConversion::compute(src, dest, engine);
        if std.is_convertible() {
            return Conversion::standard(std);
        }

        let mut best: Option<Conversion> = None;
        let mut consider = |candidate: Conversion| {
            match &best {
                None => best = Some(candidate),
                Some(current) => {
                    if Conversion::comp(&candidate, current) == Ordering::Less {
                        best = Some(candidate);
                    }
                }
            }
        };

        // Converting constructors of the destination class.
        if let Some(dest_class) = engine.type_system().get_class(dest.base_type()) {
            for &ctor in &engine.class(dest_class).constructors {
                let func = engine.function(ctor);
                if func.flags.is_deleted {
                    continue;
                }
                if func.flags.is_explicit && policy == ConversionPolicy::NoExplicitConversions {
                    continue;
                }

                let params = func.prototype.param_count();
                let defaults = func.default_arguments.len();
                if params == 0 || params > defaults + 1 {
                    continue;
                }

                let first = StandardConversion::compute(src, func.prototype.param(0), engine);
                if first.is_convertible() {
                    consider(Conversion::user_defined(
                        first,
                        ctor,
                        StandardConversion::none(),
                    ));
                }
            }
        }

        // Cast operators of the source class, including inherited ones.
        if let Some(src_class) = engine.type_system().get_class(src.base_type()) {
            let mut current = Some(src_class);
            while let Some(class_id) = current {
                for &cast in &engine.class(class_id).casts {
                    let func = engine.function(cast);
                    if func.flags.is_deleted {
                        continue;
                    }
                    if func.flags.is_explicit
                        && policy == ConversionPolicy::NoExplicitConversions
                    {
                        continue;
                    }

                    // A const object only converts through const casts.
                    let this_param = func.prototype.param(0);
                    if src.is_const() && !this_param.is_const() {
                        continue;
                    }

                    let second =
                        StandardConversion::compute(func.prototype.return_type(), dest, engine);
                    if second.is_convertible() {
                        consider(Conversion::user_defined(
                            StandardConversion::none(),
                            cast,
                            second,
                        ));
                    }
                }
                current = engine.class(class_id).parent;
            }
        }

        best.unwrap_or_else(Conversion::not_convertible)
    }

    /// Lexicographic comparison; `Less` means `a` is the better conversion.
    pub fn comp(a: &Conversion, b: &Conversion) -> Ordering {
        a.rank()
            .cmp(&b.rank())
            .then_with(|| StandardConversion::comp(&a.first, &b.first))
    }
}

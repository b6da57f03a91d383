//! Initialization plans.
//!
//! An [`Initialization`] wraps a conversion with the way it will be
//! performed (default, direct, copy, reference, list or aggregate) and, for
//! brace lists, the per-element sub-plans. The value constructor later
//! executes the plan, turning it into copies, fundamental conversions or
//! constructor calls.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::conversion::{Conversion, ConversionPolicy, ConversionRank};
use crate::engine::Engine;
use crate::program;
use crate::symbols::FunctionId;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitializationKind {
    Invalid,
    Default,
    Direct,
    Copy,
    Reference,
    List,
    Aggregate,
}

#[derive(Debug, Clone)]
pub struct Initialization {
    kind: InitializationKind,
    dest: Type,
    conversion: Conversion,
    /// The selected constructor, for list/aggregate initialization of
    /// classes.
    constructor: Option<FunctionId>,
    /// Per-element plans of a brace list.
    elements: Vec<Initialization>,
}

impl Initialization {
    fn new(kind: InitializationKind, dest: Type, conversion: Conversion) -> Self {
        Self {
            kind,
            dest,
            conversion,
            constructor: None,
            elements: Vec::new(),
        }
    }

    pub fn invalid(dest: Type) -> Self {
        Self::new(InitializationKind::Invalid, dest, Conversion::not_convertible())
    }

    /// Wraps an already-computed conversion.
    pub fn with_conversion(kind: InitializationKind, dest: Type, conversion: Conversion) -> Self {
        Self::new(kind, dest, conversion)
    }

    pub fn kind(&self) -> InitializationKind {
        self.kind
    }

    pub fn is_valid(&self) -> bool {
        self.kind != InitializationKind::Invalid
    }

    pub fn is_reference_initialization(&self) -> bool {
        self.kind == InitializationKind::Reference
    }

    pub fn conversion(&self) -> &Conversion {
        &self.conversion
    }

    pub fn constructor(&self) -> Option<FunctionId> {
        self.constructor
    }

    pub fn dest_type(&self) -> Type {
        self.dest
    }

    pub fn has_elements(&self) -> bool {
        !self.elements.is_empty()
    }

    pub fn elements(&self) -> &[Initialization] {
        &self.elements
    }

    pub fn rank(&self) -> ConversionRank {
        match self.kind {
            InitializationKind::Invalid => ConversionRank::NotConvertible,
            InitializationKind::List | InitializationKind::Aggregate => self
                .elements
                .iter()
                .map(Initialization::rank)
                .max()
                .unwrap_or(ConversionRank::ExactMatch),
            _ => self.conversion.rank(),
        }
    }

    /// Narrowing anywhere in the plan poisons the whole plan.
    pub fn is_narrowing(&self) -> bool {
        self.conversion.is_narrowing() || self.elements.iter().any(Initialization::is_narrowing)
    }

    /// Default initialization of a variable of type `t`.
    ///
    /// Reference, enum and function-typed variables cannot be defaulted;
    /// the caller maps the invalid plan onto its own error code.
    pub fn compute_default(t: Type, engine: &Engine) -> Initialization {
        if t.is_any_reference() || t.is_enum_type() || t.is_function_type() {
            return Initialization::invalid(t);
        }

        if let Some(class_id) = engine.type_system().get_class(t.base_type()) {
            let Some(ctor) = engine.default_constructor(class_id) else {
                return Initialization::invalid(t);
            };
            if engine.function(ctor).flags.is_deleted {
                return Initialization::invalid(t);
            }
            let mut init = Initialization::new(
                InitializationKind::Default,
                t,
                Conversion::standard(crate::conversion::StandardConversion::none()),
            );
            init.constructor = Some(ctor);
            return init;
        }

        Initialization::new(
            InitializationKind::Default,
            t,
            Conversion::standard(crate::conversion::StandardConversion::none()),
        )
    }

    /// Initialization of `dest` from a value of type `arg`.
    pub fn compute(
        dest: Type,
        arg: Type,
        engine: &Engine,
        kind: InitializationKind,
    ) -> Initialization {
        let policy = if kind == InitializationKind::Direct {
            ConversionPolicy::AllowExplicitConversions
        } else {
            ConversionPolicy::NoExplicitConversions
        };

        let conversion = Conversion::compute(arg, dest, engine, policy);
        if conversion.is_invalid() {
            return Initialization::invalid(dest);
        }

        let kind = if dest.is_any_reference()
            && conversion.first_standard_conversion().is_reference_binding()
        {
            InitializationKind::Reference
        } else {
            kind
        };

        Initialization::new(kind, dest, conversion)
    }

    /// Initialization of `dest` from an already-compiled expression.
    ///
    /// Brace lists follow the list-initialization rules; everything else is
    /// a copy initialization from the expression's type.
    pub fn compute_expr(
        dest: Type,
        expr: &Rc<program::Expression>,
        engine: &Engine,
    ) -> Initialization {
        let program::Expression::InitializerList(list) = expr.as_ref() else {
            return Self::compute(dest, expr.ty(), engine, InitializationKind::Copy);
        };

        // Empty list: default initialization.
        if list.elements.is_empty() {
            return Self::compute_default(dest, engine);
        }

        // Destination is itself initializer_list<T>.
        if let Some(element_type) = engine.initializer_list_element_type(dest.base_type()) {
            return Self::compute_list(dest, element_type, &list.elements, engine);
        }

        if let Some(class_id) = engine.type_system().get_class(dest.base_type()) {
            // A constructor taking initializer_list<T> wins first.
            for &ctor in &engine.class(class_id).constructors {
                let func = engine.function(ctor);
                if func.flags.is_deleted || func.prototype.param_count() != 1 {
                    continue;
                }
                let param = func.prototype.param(0);
                if let Some(element_type) =
                    engine.initializer_list_element_type(param.base_type())
                {
                    let mut init =
                        Self::compute_list(param.base_type(), element_type, &list.elements, engine);
                    if init.is_valid() {
                        init.constructor = Some(ctor);
                        init.dest = dest;
                        return init;
                    }
                }
            }

            // Otherwise a constructor whose parameters match element-wise.
            'ctors: for &ctor in &engine.class(class_id).constructors {
                let func = engine.function(ctor);
                if func.flags.is_deleted
                    || func.prototype.param_count() != list.elements.len()
                {
                    continue;
                }

                let mut elements = Vec::with_capacity(list.elements.len());
                for (i, element) in list.elements.iter().enumerate() {
                    let sub = Self::compute_expr(func.prototype.param(i), element, engine);
                    if !sub.is_valid() {
                        continue 'ctors;
                    }
                    elements.push(sub);
                }

                let mut init = Initialization::new(
                    InitializationKind::Aggregate,
                    dest,
                    Conversion::standard(crate::conversion::StandardConversion::none()),
                );
                init.constructor = Some(ctor);
                init.elements = elements;
                return init;
            }

            return Initialization::invalid(dest);
        }

        // Fundamental destination: a one-element list behaves like a copy.
        if list.elements.len() == 1 {
            return Self::compute_expr(dest, &list.elements[0], engine);
        }

        Initialization::invalid(dest)
    }

    /// Element-wise copy-initialization into an `initializer_list<T>`.
    fn compute_list(
        dest: Type,
        element_type: Type,
        elements: &[Rc<program::Expression>],
        engine: &Engine,
    ) -> Initialization {
        let mut init = Initialization::new(
            InitializationKind::List,
            dest,
            Conversion::standard(crate::conversion::StandardConversion::none()),
        );

        for element in elements {
            let sub = Self::compute_expr(element_type, element, engine);
            if !sub.is_valid() {
                return Initialization::invalid(dest);
            }
            init.elements.push(sub);
        }

        init
    }

    /// Lexicographic comparison; `Less` means `a` is the better plan.
    pub fn comp(a: &Initialization, b: &Initialization) -> Ordering {
        a.rank()
            .cmp(&b.rank())
            .then_with(|| Conversion::comp(&a.conversion, &b.conversion))
    }
}

//! Overload resolution.
//!
//! A tournament over the candidate set: each viable candidate is compared
//! against the current best; near-ties are retained as "ambiguous" and must
//! be beaten before the result counts as unique. Candidate order never
//! affects the outcome.

use std::cmp::Ordering;
use std::rc::Rc;

use crate::conversion::{Conversion, ConversionPolicy};
use crate::engine::Engine;
use crate::initialization::{Initialization, InitializationKind};
use crate::program;
use crate::symbols::FunctionId;
use crate::types::Type;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverloadComparison {
    FirstIsBetter,
    SecondIsBetter,
    Indistinguishable,
    NotComparable,
}

/// A viable candidate: the function plus one initialization per argument
/// slot (including the implicit object, when there is one).
#[derive(Debug, Clone)]
pub struct Candidate {
    pub function: FunctionId,
    pub initializations: Vec<Initialization>,
}

/// Anything usable as an overload-resolution argument.
pub trait OverloadArg {
    fn arg_type(&self) -> Type;

    fn initialization(&self, parameter: Type, engine: &Engine) -> Initialization {
        Initialization::compute(parameter, self.arg_type(), engine, InitializationKind::Copy)
    }
}

impl OverloadArg for Type {
    fn arg_type(&self) -> Type {
        *self
    }
}

impl OverloadArg for Rc<program::Expression> {
    fn arg_type(&self) -> Type {
        self.ty()
    }

    fn initialization(&self, parameter: Type, engine: &Engine) -> Initialization {
        Initialization::compute_expr(parameter, self, engine)
    }
}

/// Compares two viable candidates slot by slot.
pub fn compare(a: &Candidate, b: &Candidate) -> OverloadComparison {
    if a.initializations.len() != b.initializations.len() {
        return OverloadComparison::NotComparable;
    }

    let mut first_wins = false;
    let mut second_wins = false;

    for (ia, ib) in a.initializations.iter().zip(&b.initializations) {
        match Initialization::comp(ia, ib) {
            Ordering::Less => first_wins = true,
            Ordering::Greater => second_wins = true,
            Ordering::Equal => {}
        }
    }

    match (first_wins, second_wins) {
        (true, false) => OverloadComparison::FirstIsBetter,
        (false, true) => OverloadComparison::SecondIsBetter,
        (false, false) => OverloadComparison::Indistinguishable,
        (true, true) => OverloadComparison::NotComparable,
    }
}

struct Tournament {
    selected: Option<Candidate>,
    ambiguous: Option<Candidate>,
}

impl Tournament {
    fn new() -> Self {
        Self {
            selected: None,
            ambiguous: None,
        }
    }

    fn process(&mut self, current: Candidate) {
        if self.selected.as_ref().is_some_and(|s| s.function == current.function)
            || self.ambiguous.as_ref().is_some_and(|a| a.function == current.function)
        {
            return;
        }

        let Some(selected) = &self.selected else {
            self.selected = Some(current);
            return;
        };

        match compare(&current, selected) {
            OverloadComparison::Indistinguishable | OverloadComparison::NotComparable => {
                self.ambiguous = Some(current);
            }
            OverloadComparison::FirstIsBetter => {
                self.selected = Some(current);

                // The previous ambiguity may be beaten by the new winner.
                if let (Some(selected), Some(ambiguous)) = (&self.selected, &self.ambiguous)
                    && compare(selected, ambiguous) == OverloadComparison::FirstIsBetter
                {
                    self.ambiguous = None;
                }
            }
            OverloadComparison::SecondIsBetter => {
                if let Some(ambiguous) = &self.ambiguous {
                    if compare(&current, ambiguous) == OverloadComparison::FirstIsBetter {
                        self.ambiguous = Some(current);
                    }
                }
            }
        }
    }

    fn finish(self) -> Option<Candidate> {
        if self.ambiguous.is_some() {
            return None;
        }
        self.selected
    }
}

/// Builds the per-slot initializations of one candidate, or rejects it.
fn viable_candidate<T: OverloadArg>(
    engine: &Engine,
    function: FunctionId,
    implicit_object: Option<Type>,
    args: &[T],
) -> Option<Candidate> {
    let func = engine.function(function);
    let has_object = implicit_object.is_some() && func.has_implicit_object();
    let argc = args.len() + usize::from(has_object);

    let param_count = func.prototype.param_count();
    let defaults = func.default_arguments.len();

    if argc > param_count || argc + defaults < param_count {
        return None;
    }

    let mut initializations = Vec::with_capacity(argc);

    if has_object {
        // The implicit object binds const-agnostically; only the copy/ref
        // distinction participates in viability.
        let object_type = implicit_object.unwrap_or(Type::NULL).without_const();
        let conv = Conversion::compute(
            object_type,
            func.prototype.param(0),
            engine,
            ConversionPolicy::NoExplicitConversions,
        );
        // The implicit object binds by reference; slicing copies are out.
        if conv.is_invalid() || conv.first_standard_conversion().is_copy() {
            return None;
        }
        initializations.push(Initialization::with_conversion(
            InitializationKind::Direct,
            func.prototype.param(0),
            conv,
        ));
    }

    let offset = usize::from(has_object);
    for (i, arg) in args.iter().enumerate() {
        let init = arg.initialization(func.prototype.param(i + offset), engine);
        if !init.is_valid() {
            return None;
        }
        initializations.push(init);
    }

    Some(Candidate {
        function,
        initializations,
    })
}

/// Selects the unique best candidate for a free call.
///
/// Returns `None` both when nothing is viable and when the best candidate
/// is ambiguous.
pub fn resolve_overloads<T: OverloadArg>(
    engine: &Engine,
    candidates: &[FunctionId],
    args: &[T],
) -> Option<Candidate> {
    let mut tournament = Tournament::new();

    for &function in candidates {
        if let Some(candidate) = viable_candidate(engine, function, None, args) {
            tournament.process(candidate);
        }
    }

    tournament.finish()
}

/// Selects the unique best candidate for a member call with an implicit
/// object argument.
pub fn resolve_member_overloads<T: OverloadArg>(
    engine: &Engine,
    candidates: &[FunctionId],
    implicit_object: Type,
    args: &[T],
) -> Option<Candidate> {
    let mut tournament = Tournament::new();

    for &function in candidates {
        if let Some(candidate) =
            viable_candidate(engine, function, Some(implicit_object), args)
        {
            tournament.process(candidate);
        }
    }

    tournament.finish()
}

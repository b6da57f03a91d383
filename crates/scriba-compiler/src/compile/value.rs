//! Value construction.
//!
//! All value-creation rules live here: default construction, direct
//! construction from arguments, brace (list) construction, execution of a
//! pre-computed [`Initialization`] plan, and per-argument conversion of call
//! arguments against a selected overload.

use std::rc::Rc;

use crate::conversion::Conversion;
use crate::error::{CompilationFailure, CompilerError};
use crate::initialization::{Initialization, InitializationKind};
use crate::overload::Candidate;
use crate::program;
use crate::types::Type;
use crate::value::Value;

use super::function::FunctionCompiler;

impl FunctionCompiler<'_> {
    /// Default construction of a value of type `ty`.
    pub(crate) fn construct_default(
        &mut self,
        ty: Type,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        if ty.is_any_reference() {
            return Err(self.failure(CompilerError::ReferencesMustBeInitialized, span));
        }
        if ty.is_enum_type() {
            return Err(self.failure(CompilerError::EnumerationsMustBeInitialized, span));
        }
        if ty.is_function_type() || ty.is_closure_type() {
            return Err(self.failure(CompilerError::FunctionVariablesMustBeInitialized, span));
        }

        if let Some(class_id) = self.engine.type_system().get_class(ty.base_type()) {
            let Some(ctor) = self.engine.default_constructor(class_id) else {
                return Err(self.failure(CompilerError::VariableCannotBeDefaultConstructed, span));
            };
            if self.engine.function(ctor).flags.is_deleted {
                return Err(self.failure(CompilerError::ClassHasDeletedDefaultCtor, span));
            }
            return Ok(Rc::new(program::Expression::ConstructorCall(
                program::ConstructorCall {
                    constructor: ctor,
                    args: Vec::new(),
                    ty: ty.base_type(),
                },
            )));
        }

        Ok(Rc::new(program::Expression::Literal(program::Literal {
            value: default_fundamental_value(ty.base_type()),
            ty: ty.base_type(),
        })))
    }

    /// Direct construction: `T x(args...)` or `T(args...)`.
    pub(crate) fn construct(
        &mut self,
        ty: Type,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        if args.is_empty() {
            return self.construct_default(ty, span);
        }

        if let Some(class_id) = self.engine.type_system().get_class(ty.base_type()) {
            let candidates = self.engine.class(class_id).constructors.clone();
            let selected = crate::overload::resolve_overloads(self.engine, &candidates, &args)
                .ok_or_else(|| self.failure(CompilerError::CouldNotFindValidConstructor, span))?;

            if self.engine.function(selected.function).flags.is_deleted {
                return Err(self.failure(CompilerError::CallToDeletedFunction, span));
            }

            let converted = self.prepare_args(args, &selected, span)?;
            return Ok(Rc::new(program::Expression::ConstructorCall(
                program::ConstructorCall {
                    constructor: selected.function,
                    args: converted,
                    ty: ty.base_type(),
                },
            )));
        }

        // Fundamental, enum, reference and function-typed destinations take
        // exactly one argument.
        if args.len() > 1 {
            let code = if ty.is_any_reference() {
                CompilerError::TooManyArgumentInReferenceInitialization
            } else {
                CompilerError::TooManyArgumentInVariableInitialization
            };
            return Err(self.failure(code, span));
        }

        let arg = args.into_iter().next().expect("length checked");
        let init = Initialization::compute_expr(ty, &arg, self.engine);
        if !init.is_valid() {
            return Err(self.failure(CompilerError::CouldNotConvert, span));
        }
        self.construct_with_init(ty, Some(arg), &init, span)
    }

    /// List construction: `T x{args...}` or `T{args...}`. Narrowing rejects.
    pub(crate) fn brace_construct(
        &mut self,
        ty: Type,
        args: Vec<Rc<program::Expression>>,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        let list = Rc::new(program::Expression::InitializerList(
            program::InitializerList {
                initializer_list_type: Type::INITIALIZER_LIST,
                elements: args,
            },
        ));

        let init = Initialization::compute_expr(ty, &list, self.engine);
        if !init.is_valid() {
            return Err(self.failure(CompilerError::CouldNotFindValidConstructor, span));
        }
        if init.is_narrowing() {
            return Err(self.failure(
                CompilerError::NarrowingConversionInBraceInitialization,
                span,
            ));
        }

        self.construct_with_init(ty, Some(list), &init, span)
    }

    /// Executes a pre-computed initialization plan.
    pub(crate) fn construct_with_init(
        &mut self,
        ty: Type,
        expr: Option<Rc<program::Expression>>,
        init: &Initialization,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        match init.kind() {
            InitializationKind::Invalid => {
                Err(self.failure(CompilerError::CouldNotConvert, span))
            }
            InitializationKind::Default => match init.constructor() {
                Some(ctor) => Ok(Rc::new(program::Expression::ConstructorCall(
                    program::ConstructorCall {
                        constructor: ctor,
                        args: Vec::new(),
                        ty: ty.base_type(),
                    },
                ))),
                None => self.construct_default(ty, span),
            },
            InitializationKind::Reference => {
                // Reference bindings use the operand in place.
                let expr =
                    expr.ok_or_else(|| self.failure(CompilerError::CouldNotConvert, span))?;
                Ok(expr)
            }
            InitializationKind::Copy | InitializationKind::Direct => {
                let expr =
                    expr.ok_or_else(|| self.failure(CompilerError::CouldNotConvert, span))?;
                self.apply_conversion(expr, init.conversion(), span)
            }
            InitializationKind::List => {
                let Some(expr) = expr else {
                    return Err(self.failure(CompilerError::CouldNotConvert, span));
                };
                let program::Expression::InitializerList(list) = expr.as_ref() else {
                    return self.apply_conversion(expr, init.conversion(), span);
                };

                // Element-wise construction into the concrete list type.
                let element_type = init
                    .elements()
                    .first()
                    .map(Initialization::dest_type)
                    .unwrap_or(Type::INT);
                let mut elements = Vec::with_capacity(list.elements.len());
                for (element, sub) in list.elements.iter().zip(init.elements()) {
                    elements.push(self.construct_with_init(
                        element_type,
                        Some(element.clone()),
                        sub,
                        span,
                    )?);
                }

                let list_expr = Rc::new(program::Expression::InitializerList(
                    program::InitializerList {
                        initializer_list_type: init.dest_type().base_type(),
                        elements,
                    },
                ));

                match init.constructor() {
                    Some(ctor) => Ok(Rc::new(program::Expression::ConstructorCall(
                        program::ConstructorCall {
                            constructor: ctor,
                            args: vec![list_expr],
                            ty: ty.base_type(),
                        },
                    ))),
                    None => Ok(list_expr),
                }
            }
            InitializationKind::Aggregate => {
                let Some(expr) = expr else {
                    return Err(self.failure(CompilerError::CouldNotConvert, span));
                };
                let program::Expression::InitializerList(list) = expr.as_ref() else {
                    return Err(self.failure(CompilerError::CouldNotConvert, span));
                };
                let Some(ctor) = init.constructor() else {
                    return Err(self.failure(CompilerError::CouldNotFindValidConstructor, span));
                };

                let mut args = Vec::with_capacity(list.elements.len());
                for (element, sub) in list.elements.iter().zip(init.elements()) {
                    args.push(self.construct_with_init(
                        sub.dest_type(),
                        Some(element.clone()),
                        sub,
                        span,
                    )?);
                }

                Ok(Rc::new(program::Expression::ConstructorCall(
                    program::ConstructorCall {
                        constructor: ctor,
                        args,
                        ty: ty.base_type(),
                    },
                )))
            }
        }
    }

    /// Applies the per-slot conversions of a selected overload and fills in
    /// default arguments for the missing trailing parameters.
    pub(crate) fn prepare_args(
        &mut self,
        args: Vec<Rc<program::Expression>>,
        candidate: &Candidate,
        span: rowan::TextRange,
    ) -> Result<Vec<Rc<program::Expression>>, CompilationFailure> {
        debug_assert_eq!(args.len(), candidate.initializations.len());

        let mut converted = Vec::with_capacity(args.len());
        for (arg, init) in args.into_iter().zip(&candidate.initializations) {
            converted.push(self.construct_with_init(init.dest_type(), Some(arg), init, span)?);
        }

        // Default arguments for the unfilled trailing parameters.
        let func = self.engine.function(candidate.function);
        let missing = func.prototype.param_count() - converted.len();
        if missing > 0 {
            let defaults = &func.default_arguments;
            let used = &defaults[defaults.len() - missing..];
            converted.extend(used.iter().cloned());
        }

        Ok(converted)
    }

    /// Lowers one conversion sequence over an expression.
    pub(crate) fn apply_conversion(
        &mut self,
        expr: Rc<program::Expression>,
        conversion: &Conversion,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        if conversion.is_invalid() {
            return Err(self.failure(CompilerError::CouldNotConvert, span));
        }

        if let Some(function) = conversion.user_defined_conversion() {
            let func = self.engine.function(function);
            if func.flags.is_deleted {
                return Err(self.failure(CompilerError::CallToDeletedFunction, span));
            }

            if func.is_constructor() {
                let param = func.prototype.param(0);
                let first = apply_standard(expr, conversion.first_standard_conversion(), param);
                let ty = func.prototype.return_type();
                return Ok(Rc::new(program::Expression::ConstructorCall(
                    program::ConstructorCall {
                        constructor: function,
                        args: vec![first],
                        ty,
                    },
                )));
            }

            // Cast operator: call it, then apply the second conversion.
            let ty = func.prototype.return_type();
            let call = Rc::new(program::Expression::FunctionCall(program::FunctionCall {
                function,
                args: vec![expr],
                ty,
            }));
            let second = conversion.second_standard_conversion();
            return Ok(apply_standard(call, second, second.dest_type()));
        }

        let std = conversion.first_standard_conversion();
        Ok(apply_standard(expr, std, std.dest_type()))
    }
}

/// Lowers a standard conversion: nothing for reference bindings, a
/// `FundamentalConversion` for numeric changes, a `Copy` otherwise.
fn apply_standard(
    expr: Rc<program::Expression>,
    conv: &crate::conversion::StandardConversion,
    dest: Type,
) -> Rc<program::Expression> {
    if conv.is_none() || conv.is_reference_binding() {
        return expr;
    }

    if conv.is_numeric_promotion() || conv.is_numeric_conversion() {
        return Rc::new(program::Expression::FundamentalConversion(
            program::FundamentalConversion {
                dest_type: dest.base_type(),
                src: expr,
            },
        ));
    }

    Rc::new(program::Expression::Copy(program::Copy {
        ty: dest.base_type(),
        src: expr,
    }))
}

fn default_fundamental_value(ty: Type) -> Value {
    match ty {
        Type::BOOLEAN => Value::Bool(false),
        Type::CHAR => Value::Char('\0'),
        Type::INT => Value::Int(0),
        Type::FLOAT => Value::Float(0.0),
        Type::DOUBLE => Value::Double(0.0),
        _ => Value::Void,
    }
}

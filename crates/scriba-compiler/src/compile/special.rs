//! Synthesis of defaulted special members.
//!
//! `= default` constructors, destructors and assignment operators get a
//! field-wise body: parent first, then each data member in declaration
//! order (reverse order for destruction).

use std::rc::Rc;

use scriba_syntax::ast;

use crate::error::{CompilationFailure, CompilerError};
use crate::program;
use crate::symbols::{ClassId, FunctionKind};

use super::function::FunctionCompiler;

impl FunctionCompiler<'_> {
    pub(crate) fn generate_defaulted(
        &mut self,
        decl: &Rc<ast::FunctionDecl>,
    ) -> Result<program::CompoundStatement, CompilationFailure> {
        let function = self.function.expect("defaulted members are functions");
        let class_id = self
            .class
            .ok_or_else(|| self.failure(CompilerError::FunctionCannotBeDefaulted, decl.name.span()))?;

        let func = self.engine.function(function);
        let prototype = func.prototype.clone();
        let kind = func.kind.clone();
        let span = decl.name.span();

        // Frame layout mirrors ordinary bodies; constructors receive their
        // object right after the return slot.
        if !matches!(kind, FunctionKind::Destructor) {
            self.stack
                .add_var(prototype.return_type(), "__return_value__");
        }
        if matches!(kind, FunctionKind::Constructor) {
            let class_type = self.engine.class(class_id).ty;
            self.stack.add_var(class_type.with_reference(), "this");
        }
        for (i, &param) in prototype.params().iter().enumerate() {
            if i == 0 && param.is_this() {
                self.stack.add_var(param, "this");
            } else {
                self.stack.add_var(param, format!("__arg{i}"));
            }
        }

        match kind {
            FunctionKind::Constructor => match prototype.param_count() {
                0 => self.generate_default_constructor(class_id, span)?,
                _ => {
                    let moving = prototype.param(0).is_forward_reference();
                    self.generate_copy_constructor(class_id, moving, span)?;
                }
            },
            FunctionKind::Destructor => self.generate_default_destructor()?,
            FunctionKind::Operator(_) => self.generate_default_assignment(class_id, span)?,
            _ => {
                return Err(self.failure(CompilerError::FunctionCannotBeDefaulted, span));
            }
        }

        self.stack = super::function::Stack::new();
        Ok(program::CompoundStatement {
            statements: std::mem::take(&mut self.statements),
        })
    }

    fn generate_default_constructor(
        &mut self,
        class_id: ClassId,
        span: rowan::TextRange,
    ) -> Result<(), CompilationFailure> {
        if let Some(parent) = self.engine.class(class_id).parent {
            let Some(ctor) = self.engine.default_constructor(parent) else {
                return Err(self.failure(CompilerError::ParentHasNoDefaultConstructor, span));
            };
            if self.engine.function(ctor).flags.is_deleted {
                return Err(
                    self.failure(CompilerError::ParentHasDeletedDefaultConstructor, span)
                );
            }
            let this = self.generate_this(span)?;
            self.write(program::Statement::Placement(program::PlacementStatement {
                object: this,
                constructor: ctor,
                args: Vec::new(),
            }));
        }

        let members = self.engine.class(class_id).data_members.clone();
        for member in &members {
            let value = self.construct_member_default(member, span)?;
            self.write(program::Statement::PushDataMember(program::PushDataMember {
                value,
            }));
        }

        Ok(())
    }

    fn generate_copy_constructor(
        &mut self,
        class_id: ClassId,
        moving: bool,
        span: rowan::TextRange,
    ) -> Result<(), CompilationFailure> {
        let other = self.other_argument(span)?;

        if let Some(parent) = self.engine.class(class_id).parent {
            let ctor = if moving {
                // Move falls back to copy when the parent has no move ctor.
                match self.engine.move_constructor(parent) {
                    Some(m) if self.engine.function(m).flags.is_deleted => {
                        return Err(
                            self.failure(CompilerError::ParentHasDeletedMoveConstructor, span)
                        );
                    }
                    Some(m) => Some(m),
                    None => self.engine.copy_constructor(parent),
                }
            } else {
                match self.engine.copy_constructor(parent) {
                    Some(c) if self.engine.function(c).flags.is_deleted => {
                        return Err(
                            self.failure(CompilerError::ParentHasDeletedCopyConstructor, span)
                        );
                    }
                    found => found,
                }
            };

            let Some(ctor) = ctor else {
                return Err(self.failure(CompilerError::ParentHasNoCopyConstructor, span));
            };

            let this = self.generate_this(span)?;
            self.write(program::Statement::Placement(program::PlacementStatement {
                object: this,
                constructor: ctor,
                args: vec![other.clone()],
            }));
        }

        let members = self.engine.class(class_id).data_members.clone();
        let base_offset = crate::lookup::NameLookup::data_member_base_offset(self.engine, class_id);

        for (i, member) in members.iter().enumerate() {
            let source = Rc::new(program::Expression::MemberAccess(program::MemberAccess {
                object: other.clone(),
                offset: base_offset + i,
                ty: member.ty,
            }));

            let value = if let Some(member_class) =
                self.engine.type_system().get_class(member.ty.base_type())
            {
                let ctor = if moving {
                    self.engine
                        .move_constructor(member_class)
                        .or_else(|| self.engine.copy_constructor(member_class))
                } else {
                    self.engine.copy_constructor(member_class)
                };

                let error = if moving {
                    CompilerError::DataMemberIsNotMovable
                } else {
                    CompilerError::DataMemberIsNotCopyable
                };

                let Some(ctor) = ctor else {
                    return Err(self.failure(error, span));
                };
                if self.engine.function(ctor).flags.is_deleted {
                    return Err(self.failure(error, span));
                }

                Rc::new(program::Expression::ConstructorCall(program::ConstructorCall {
                    constructor: ctor,
                    args: vec![source],
                    ty: member.ty.base_type(),
                }))
            } else {
                Rc::new(program::Expression::Copy(program::Copy {
                    ty: member.ty.base_type(),
                    src: source,
                }))
            };

            self.write(program::Statement::PushDataMember(program::PushDataMember {
                value,
            }));
        }

        Ok(())
    }

    fn generate_default_destructor(&mut self) -> Result<(), CompilationFailure> {
        self.generate_defaulted_destructor_footer()
    }

    pub(crate) fn generate_defaulted_destructor_footer(
        &mut self,
    ) -> Result<(), CompilationFailure> {
        let class_id = self.class.expect("destructors belong to classes");
        let members = self.engine.class(class_id).data_members.clone();

        for member in members.iter().rev() {
            let destructor = self
                .engine
                .type_system()
                .get_class(member.ty.base_type())
                .and_then(|c| self.engine.class(c).destructor);
            self.write(program::Statement::PopDataMember(program::PopDataMember {
                destructor,
            }));
        }

        if let Some(parent) = self.engine.class(class_id).parent
            && let Some(parent_dtor) = self.engine.class(parent).destructor
        {
            let this = self.generate_this(rowan::TextRange::default())?;
            self.write(program::Statement::Placement(program::PlacementStatement {
                object: this,
                constructor: parent_dtor,
                args: Vec::new(),
            }));
        }

        Ok(())
    }

    fn generate_default_assignment(
        &mut self,
        class_id: ClassId,
        span: rowan::TextRange,
    ) -> Result<(), CompilationFailure> {
        let this = self.generate_this(span)?;
        let other = self.other_argument(span)?;

        if let Some(parent) = self.engine.class(class_id).parent {
            let Some(assign) = self.engine.assignment_operator(parent) else {
                return Err(self.failure(CompilerError::ParentHasNoAssignmentOperator, span));
            };
            if self.engine.function(assign).flags.is_deleted {
                return Err(
                    self.failure(CompilerError::ParentHasDeletedAssignmentOperator, span)
                );
            }
            let ty = self.engine.function(assign).prototype.return_type();
            let call = Rc::new(program::Expression::FunctionCall(program::FunctionCall {
                function: assign,
                args: vec![this.clone(), other.clone()],
                ty,
            }));
            self.write(program::Statement::ExpressionStatement(
                program::ExpressionStatement { expr: call },
            ));
        }

        let members = self.engine.class(class_id).data_members.clone();
        let base_offset = crate::lookup::NameLookup::data_member_base_offset(self.engine, class_id);

        for (i, member) in members.iter().enumerate() {
            if member.ty.is_any_reference() {
                return Err(
                    self.failure(CompilerError::DataMemberIsReferenceAndCannotBeAssigned, span)
                );
            }

            let lhs = Rc::new(program::Expression::MemberAccess(program::MemberAccess {
                object: this.clone(),
                offset: base_offset + i,
                ty: member.ty,
            }));
            let rhs = Rc::new(program::Expression::MemberAccess(program::MemberAccess {
                object: other.clone(),
                offset: base_offset + i,
                ty: member.ty,
            }));

            let expr = if let Some(member_class) =
                self.engine.type_system().get_class(member.ty.base_type())
            {
                let Some(assign) = self.engine.assignment_operator(member_class) else {
                    return Err(
                        self.failure(CompilerError::DataMemberHasNoAssignmentOperator, span)
                    );
                };
                if self.engine.function(assign).flags.is_deleted {
                    return Err(self.failure(
                        CompilerError::DataMemberHasDeletedAssignmentOperator,
                        span,
                    ));
                }
                let ty = self.engine.function(assign).prototype.return_type();
                Rc::new(program::Expression::FunctionCall(program::FunctionCall {
                    function: assign,
                    args: vec![lhs, rhs],
                    ty,
                }))
            } else {
                // Fundamental members copy through the built-in assignment.
                Rc::new(program::Expression::Copy(program::Copy {
                    ty: member.ty.base_type(),
                    src: rhs,
                }))
            };

            self.write(program::Statement::ExpressionStatement(
                program::ExpressionStatement { expr },
            ));
        }

        // `operator=` returns the object.
        let destruction = Vec::new();
        self.write(program::Statement::Return(program::ReturnStatement {
            value: Some(this),
            destruction,
        }));

        Ok(())
    }

    /// The `other` parameter of copy/move/assignment members.
    fn other_argument(
        &self,
        span: rowan::TextRange,
    ) -> Result<Rc<program::Expression>, CompilationFailure> {
        // It always sits right after `this` on the frame.
        let Some(this_index) = self.stack.last_index_of("this") else {
            return Err(self.failure(CompilerError::IllegalUseOfThis, span));
        };
        let index = this_index + 1;
        if index >= self.stack.size() {
            return Err(self.failure(CompilerError::FunctionCannotBeDefaulted, span));
        }
        let var = self.stack.at(index);
        Ok(Rc::new(program::Expression::StackValue(program::StackValue {
            stack_index: var.index,
            ty: var.ty,
        })))
    }
}

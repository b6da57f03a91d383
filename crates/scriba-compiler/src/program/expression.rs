//! Typed IR expressions.
//!
//! Every node knows the [`Type`] of the value it produces. Subtrees are
//! shared through `Rc`, matching how the compiler reuses converted argument
//! expressions and default arguments.

use std::rc::Rc;

use crate::symbols::{FunctionId, ScriptId};
use crate::types::Type;
use crate::value::Value;

#[derive(Debug, Clone)]
pub enum Expression {
    Literal(Literal),
    VariableAccess(VariableAccess),
    StackValue(StackValue),
    FetchGlobal(FetchGlobal),
    LogicalAnd(LogicalAnd),
    LogicalOr(LogicalOr),
    Conditional(Conditional),
    FunctionCall(FunctionCall),
    VirtualCall(VirtualCall),
    ConstructorCall(ConstructorCall),
    FunctionVariableCall(FunctionVariableCall),
    Copy(Copy),
    FundamentalConversion(FundamentalConversion),
    ArrayExpression(ArrayExpression),
    MemberAccess(MemberAccess),
    InitializerList(InitializerList),
    LambdaExpression(LambdaExpression),
    CaptureAccess(CaptureAccess),
    BindExpression(BindExpression),
    CommaExpression(CommaExpression),
}

/// A constant.
#[derive(Debug, Clone)]
pub struct Literal {
    pub value: Value,
    pub ty: Type,
}

/// A pre-existing value (an enum constant, a host-provided variable).
#[derive(Debug, Clone)]
pub struct VariableAccess {
    pub value: Value,
    pub ty: Type,
}

/// A local variable, addressed relative to the frame.
#[derive(Debug, Clone)]
pub struct StackValue {
    pub stack_index: usize,
    pub ty: Type,
}

/// A script global.
#[derive(Debug, Clone)]
pub struct FetchGlobal {
    pub script: ScriptId,
    pub global_index: usize,
    pub ty: Type,
}

/// Short-circuiting `&&`.
#[derive(Debug, Clone)]
pub struct LogicalAnd {
    pub lhs: Rc<Expression>,
    pub rhs: Rc<Expression>,
}

/// Short-circuiting `||`.
#[derive(Debug, Clone)]
pub struct LogicalOr {
    pub lhs: Rc<Expression>,
    pub rhs: Rc<Expression>,
}

/// `cond ? a : b` with a computed common type.
#[derive(Debug, Clone)]
pub struct Conditional {
    pub condition: Rc<Expression>,
    pub on_true: Rc<Expression>,
    pub on_false: Rc<Expression>,
    pub ty: Type,
}

/// A direct call; arguments are already converted.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub function: FunctionId,
    pub args: Vec<Rc<Expression>>,
    pub ty: Type,
}

/// A call dispatched through the object's vtable.
#[derive(Debug, Clone)]
pub struct VirtualCall {
    pub object: Rc<Expression>,
    pub vtable_index: usize,
    pub args: Vec<Rc<Expression>>,
    pub ty: Type,
}

/// Object construction.
#[derive(Debug, Clone)]
pub struct ConstructorCall {
    pub constructor: FunctionId,
    pub args: Vec<Rc<Expression>>,
    pub ty: Type,
}

/// Calling a closure or function-typed variable.
#[derive(Debug, Clone)]
pub struct FunctionVariableCall {
    pub callee: Rc<Expression>,
    pub args: Vec<Rc<Expression>>,
    pub ty: Type,
}

/// A copy of the operand's value.
#[derive(Debug, Clone)]
pub struct Copy {
    pub ty: Type,
    pub src: Rc<Expression>,
}

/// Conversion between fundamental types.
#[derive(Debug, Clone)]
pub struct FundamentalConversion {
    pub dest_type: Type,
    pub src: Rc<Expression>,
}

/// An `Array<T>` literal.
#[derive(Debug, Clone)]
pub struct ArrayExpression {
    pub array_type: Type,
    pub elements: Vec<Rc<Expression>>,
}

/// Reading a data member by offset.
#[derive(Debug, Clone)]
pub struct MemberAccess {
    pub object: Rc<Expression>,
    pub offset: usize,
    pub ty: Type,
}

/// An `initializer_list<T>` value.
#[derive(Debug, Clone)]
pub struct InitializerList {
    pub initializer_list_type: Type,
    pub elements: Vec<Rc<Expression>>,
}

/// Closure creation: the capture initializers run in the enclosing frame.
#[derive(Debug, Clone)]
pub struct LambdaExpression {
    pub closure_type: Type,
    pub captures: Vec<Rc<Expression>>,
}

/// Reading a capture through the closure object.
#[derive(Debug, Clone)]
pub struct CaptureAccess {
    pub object: Rc<Expression>,
    pub offset: usize,
    pub ty: Type,
}

/// Binds a name to a value in the host's context (REPL-style assignment).
#[derive(Debug, Clone)]
pub struct BindExpression {
    pub name: String,
    pub value: Rc<Expression>,
}

/// `lhs, rhs` - evaluates both, produces the right operand.
#[derive(Debug, Clone)]
pub struct CommaExpression {
    pub lhs: Rc<Expression>,
    pub rhs: Rc<Expression>,
}

impl Expression {
    /// The type of the value this expression produces.
    pub fn ty(&self) -> Type {
        match self {
            Expression::Literal(e) => e.ty,
            Expression::VariableAccess(e) => e.ty,
            Expression::StackValue(e) => e.ty,
            Expression::FetchGlobal(e) => e.ty,
            Expression::LogicalAnd(_) | Expression::LogicalOr(_) => Type::BOOLEAN,
            Expression::Conditional(e) => e.ty,
            Expression::FunctionCall(e) => e.ty,
            Expression::VirtualCall(e) => e.ty,
            Expression::ConstructorCall(e) => e.ty,
            Expression::FunctionVariableCall(e) => e.ty,
            Expression::Copy(e) => e.ty,
            Expression::FundamentalConversion(e) => e.dest_type,
            Expression::ArrayExpression(e) => e.array_type,
            Expression::MemberAccess(e) => e.ty,
            Expression::InitializerList(e) => e.initializer_list_type,
            Expression::LambdaExpression(e) => e.closure_type,
            Expression::CaptureAccess(e) => e.ty,
            Expression::BindExpression(e) => e.value.ty(),
            Expression::CommaExpression(e) => e.rhs.ty(),
        }
    }

    pub fn is_initializer_list(&self) -> bool {
        matches!(self, Expression::InitializerList(_))
    }
}

/// External visitor over expression nodes (tree-walking interpreters).
pub trait ExpressionVisitor {
    type Value;

    fn visit_literal(&mut self, node: &Literal) -> Self::Value;
    fn visit_variable_access(&mut self, node: &VariableAccess) -> Self::Value;
    fn visit_stack_value(&mut self, node: &StackValue) -> Self::Value;
    fn visit_fetch_global(&mut self, node: &FetchGlobal) -> Self::Value;
    fn visit_logical_and(&mut self, node: &LogicalAnd) -> Self::Value;
    fn visit_logical_or(&mut self, node: &LogicalOr) -> Self::Value;
    fn visit_conditional(&mut self, node: &Conditional) -> Self::Value;
    fn visit_function_call(&mut self, node: &FunctionCall) -> Self::Value;
    fn visit_virtual_call(&mut self, node: &VirtualCall) -> Self::Value;
    fn visit_constructor_call(&mut self, node: &ConstructorCall) -> Self::Value;
    fn visit_function_variable_call(&mut self, node: &FunctionVariableCall) -> Self::Value;
    fn visit_copy(&mut self, node: &Copy) -> Self::Value;
    fn visit_fundamental_conversion(&mut self, node: &FundamentalConversion) -> Self::Value;
    fn visit_array_expression(&mut self, node: &ArrayExpression) -> Self::Value;
    fn visit_member_access(&mut self, node: &MemberAccess) -> Self::Value;
    fn visit_initializer_list(&mut self, node: &InitializerList) -> Self::Value;
    fn visit_lambda_expression(&mut self, node: &LambdaExpression) -> Self::Value;
    fn visit_capture_access(&mut self, node: &CaptureAccess) -> Self::Value;
    fn visit_bind_expression(&mut self, node: &BindExpression) -> Self::Value;
    fn visit_comma_expression(&mut self, node: &CommaExpression) -> Self::Value;
}

/// Dispatches `expr` to the matching visitor method.
pub fn accept<V: ExpressionVisitor>(expr: &Expression, visitor: &mut V) -> V::Value {
    match expr {
        Expression::Literal(e) => visitor.visit_literal(e),
        Expression::VariableAccess(e) => visitor.visit_variable_access(e),
        Expression::StackValue(e) => visitor.visit_stack_value(e),
        Expression::FetchGlobal(e) => visitor.visit_fetch_global(e),
        Expression::LogicalAnd(e) => visitor.visit_logical_and(e),
        Expression::LogicalOr(e) => visitor.visit_logical_or(e),
        Expression::Conditional(e) => visitor.visit_conditional(e),
        Expression::FunctionCall(e) => visitor.visit_function_call(e),
        Expression::VirtualCall(e) => visitor.visit_virtual_call(e),
        Expression::ConstructorCall(e) => visitor.visit_constructor_call(e),
        Expression::FunctionVariableCall(e) => visitor.visit_function_variable_call(e),
        Expression::Copy(e) => visitor.visit_copy(e),
        Expression::FundamentalConversion(e) => visitor.visit_fundamental_conversion(e),
        Expression::ArrayExpression(e) => visitor.visit_array_expression(e),
        Expression::MemberAccess(e) => visitor.visit_member_access(e),
        Expression::InitializerList(e) => visitor.visit_initializer_list(e),
        Expression::LambdaExpression(e) => visitor.visit_lambda_expression(e),
        Expression::CaptureAccess(e) => visitor.visit_capture_access(e),
        Expression::BindExpression(e) => visitor.visit_bind_expression(e),
        Expression::CommaExpression(e) => visitor.visit_comma_expression(e),
    }
}

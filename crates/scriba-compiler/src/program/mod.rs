//! The typed IR ("program tree") produced by the semantic compiler.
//!
//! Two closed sums: [`Expression`] nodes produce a value of a known type,
//! [`Statement`] nodes produce control flow. The executing interpreter is a
//! host concern; it walks these trees through the visitor traits.

mod expression;
mod statement;

pub use expression::{
    ArrayExpression, BindExpression, CaptureAccess, CommaExpression, Conditional,
    ConstructorCall, Copy, Expression, ExpressionVisitor, FetchGlobal, FundamentalConversion,
    FunctionCall, FunctionVariableCall, InitializerList, LambdaExpression, Literal, LogicalAnd,
    LogicalOr, MemberAccess, StackValue, VariableAccess, VirtualCall,
    accept as accept_expression,
};
pub use statement::{
    BreakStatement, CompoundStatement, ContinueStatement, ExpressionStatement, ForLoop,
    IfStatement, InitObject, PlacementStatement, PopDataMember, PopGlobal, PopValue,
    PushDataMember, PushGlobal, PushValue, ReturnStatement, Statement, StatementVisitor,
    WhileLoop, accept as accept_statement,
};

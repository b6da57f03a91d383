//! Operator identities, precedence and associativity.
//!
//! The expression parser reads operators as plain tokens and resolves their
//! identity here; the compiler reuses [`OperatorId`] as the key for operator
//! overload registration and lookup.

use crate::token::TokenKind;

/// Identity of a built-in (overloadable) operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum OperatorId {
    // Postfix
    PostIncrement,
    PostDecrement,
    FunctionCall,
    Subscript,
    // Prefix
    PreIncrement,
    PreDecrement,
    LogicalNot,
    BitwiseNot,
    UnaryPlus,
    UnaryMinus,
    // Binary
    Multiplication,
    Division,
    Remainder,
    Addition,
    Subtraction,
    LeftShift,
    RightShift,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    Inequal,
    BitwiseAnd,
    BitwiseXor,
    BitwiseOr,
    LogicalAnd,
    LogicalOr,
    Conditional,
    Assignment,
    AdditionAssignment,
    SubstractionAssignment,
    MultiplicationAssignment,
    DivisionAssignment,
    RemainderAssignment,
    LeftShiftAssignment,
    RightShiftAssignment,
    BitwiseAndAssignment,
    BitwiseOrAssignment,
    BitwiseXorAssignment,
    Comma,
}

/// Position in which an operator token is being interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorPosition {
    Prefix,
    Infix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    LeftToRight,
    RightToLeft,
}

impl OperatorId {
    /// Resolves a token to an operator in the given position.
    pub fn from_token(kind: TokenKind, position: OperatorPosition) -> Option<OperatorId> {
        use OperatorPosition::*;

        let op = match (kind, position) {
            (TokenKind::PlusPlus, Prefix) => OperatorId::PreIncrement,
            (TokenKind::PlusPlus, Postfix) => OperatorId::PostIncrement,
            (TokenKind::MinusMinus, Prefix) => OperatorId::PreDecrement,
            (TokenKind::MinusMinus, Postfix) => OperatorId::PostDecrement,
            (TokenKind::LogicalNot, Prefix) => OperatorId::LogicalNot,
            (TokenKind::Tilde, Prefix) => OperatorId::BitwiseNot,
            (TokenKind::Plus, Prefix) => OperatorId::UnaryPlus,
            (TokenKind::Minus, Prefix) => OperatorId::UnaryMinus,
            (TokenKind::Plus, Infix) => OperatorId::Addition,
            (TokenKind::Minus, Infix) => OperatorId::Subtraction,
            (TokenKind::Mul, Infix) => OperatorId::Multiplication,
            (TokenKind::Div, Infix) => OperatorId::Division,
            (TokenKind::Remainder, Infix) => OperatorId::Remainder,
            (TokenKind::LeftShift, Infix) => OperatorId::LeftShift,
            (TokenKind::RightRightAngle, Infix) => OperatorId::RightShift,
            (TokenKind::LeftAngle, Infix) => OperatorId::Less,
            (TokenKind::RightAngle, Infix) => OperatorId::Greater,
            (TokenKind::Leq, Infix) => OperatorId::LessEqual,
            (TokenKind::Geq, Infix) => OperatorId::GreaterEqual,
            (TokenKind::EqEq, Infix) => OperatorId::Equal,
            (TokenKind::Neq, Infix) => OperatorId::Inequal,
            (TokenKind::Ampersand, Infix) => OperatorId::BitwiseAnd,
            (TokenKind::BitXor, Infix) => OperatorId::BitwiseXor,
            (TokenKind::BitOr, Infix) => OperatorId::BitwiseOr,
            (TokenKind::LogicalAnd, Infix) => OperatorId::LogicalAnd,
            (TokenKind::LogicalOr, Infix) => OperatorId::LogicalOr,
            (TokenKind::Eq, Infix) => OperatorId::Assignment,
            (TokenKind::PlusEq, Infix) => OperatorId::AdditionAssignment,
            (TokenKind::MinusEq, Infix) => OperatorId::SubstractionAssignment,
            (TokenKind::MulEq, Infix) => OperatorId::MultiplicationAssignment,
            (TokenKind::DivEq, Infix) => OperatorId::DivisionAssignment,
            (TokenKind::RemainderEq, Infix) => OperatorId::RemainderAssignment,
            (TokenKind::LeftShiftEq, Infix) => OperatorId::LeftShiftAssignment,
            (TokenKind::RightShiftEq, Infix) => OperatorId::RightShiftAssignment,
            (TokenKind::BitAndEq, Infix) => OperatorId::BitwiseAndAssignment,
            (TokenKind::BitOrEq, Infix) => OperatorId::BitwiseOrAssignment,
            (TokenKind::BitXorEq, Infix) => OperatorId::BitwiseXorAssignment,
            (TokenKind::Comma, Infix) => OperatorId::Comma,
            _ => return None,
        };

        Some(op)
    }

    /// Resolves the symbol written after the `operator` keyword,
    /// e.g. in `operator+`. Position-ambiguous symbols resolve to their
    /// binary flavor; `++`/`--` resolve to the prefix flavor.
    pub fn from_symbol(kind: TokenKind) -> Option<OperatorId> {
        match kind {
            TokenKind::LeftRightPar => Some(OperatorId::FunctionCall),
            TokenKind::LeftRightBracket => Some(OperatorId::Subscript),
            TokenKind::PlusPlus => Some(OperatorId::PreIncrement),
            TokenKind::MinusMinus => Some(OperatorId::PreDecrement),
            TokenKind::Plus => Some(OperatorId::Addition),
            TokenKind::Minus => Some(OperatorId::Subtraction),
            _ => OperatorId::from_token(kind, OperatorPosition::Infix)
                .or_else(|| OperatorId::from_token(kind, OperatorPosition::Prefix)),
        }
    }

    /// Binding strength; larger numbers bind more loosely. The expression
    /// builder roots the tree at the operator with the largest precedence.
    pub fn precedence(self) -> i32 {
        use OperatorId::*;

        match self {
            PostIncrement | PostDecrement | FunctionCall | Subscript => 2,
            PreIncrement | PreDecrement | LogicalNot | BitwiseNot | UnaryPlus | UnaryMinus => 3,
            Multiplication | Division | Remainder => 5,
            Addition | Subtraction => 6,
            LeftShift | RightShift => 7,
            Less | Greater | LessEqual | GreaterEqual => 8,
            Equal | Inequal => 9,
            BitwiseAnd => 10,
            BitwiseXor => 11,
            BitwiseOr => 12,
            LogicalAnd => 13,
            LogicalOr => 14,
            Conditional => 15,
            Assignment | AdditionAssignment | SubstractionAssignment
            | MultiplicationAssignment | DivisionAssignment | RemainderAssignment
            | LeftShiftAssignment | RightShiftAssignment | BitwiseAndAssignment
            | BitwiseOrAssignment | BitwiseXorAssignment => 16,
            Comma => 17,
        }
    }

    /// Whether this is one of the `=`-family operators.
    pub fn is_assignment(self) -> bool {
        self.precedence() == 16
    }

    /// Number of operands, counting the implicit object of members.
    pub fn arity(self) -> usize {
        use OperatorId::*;

        match self {
            PostIncrement | PostDecrement | PreIncrement | PreDecrement | LogicalNot
            | BitwiseNot | UnaryPlus | UnaryMinus => 1,
            FunctionCall | Subscript | Conditional => 2,
            _ => 2,
        }
    }

    /// The symbol as written in source, for diagnostics and qualified names.
    pub fn symbol(self) -> &'static str {
        use OperatorId::*;

        match self {
            PostIncrement | PreIncrement => "++",
            PostDecrement | PreDecrement => "--",
            FunctionCall => "()",
            Subscript => "[]",
            LogicalNot => "!",
            BitwiseNot => "~",
            UnaryPlus | Addition => "+",
            UnaryMinus | Subtraction => "-",
            Multiplication => "*",
            Division => "/",
            Remainder => "%",
            LeftShift => "<<",
            RightShift => ">>",
            Less => "<",
            Greater => ">",
            LessEqual => "<=",
            GreaterEqual => ">=",
            Equal => "==",
            Inequal => "!=",
            BitwiseAnd => "&",
            BitwiseXor => "^",
            BitwiseOr => "|",
            LogicalAnd => "&&",
            LogicalOr => "||",
            Conditional => "?:",
            Assignment => "=",
            AdditionAssignment => "+=",
            SubstractionAssignment => "-=",
            MultiplicationAssignment => "*=",
            DivisionAssignment => "/=",
            RemainderAssignment => "%=",
            LeftShiftAssignment => "<<=",
            RightShiftAssignment => ">>=",
            BitwiseAndAssignment => "&=",
            BitwiseOrAssignment => "|=",
            BitwiseXorAssignment => "^=",
            Comma => ",",
        }
    }
}

/// Associativity of a precedence level.
pub fn associativity(precedence: i32) -> Associativity {
    if precedence == 3 || precedence == 16 {
        Associativity::RightToLeft
    } else {
        Associativity::LeftToRight
    }
}

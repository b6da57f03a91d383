//! Token definitions for the scriba language.
//!
//! Produces span-based tokens without storing text - text is sliced from the
//! source only when needed via [`token_text`].

use logos::Logos;
use rowan::TextRange;

/// Kind of a lexed (or synthesized) token.
///
/// Most variants are produced by the lexer. `DblLeftBracket`,
/// `DblRightBracket`, `LeftRightPar` and `LeftRightBracket` are synthesized
/// by the parser when it recognizes `[[`, `]]`, `()` and `[]` pairs, and
/// `Invalid` is only used as the "expected" slot of syntax errors.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip(r"//[^\n]*", allow_greedy = true))]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum TokenKind {
    // Keywords
    #[token("auto")]
    Auto,
    #[token("bool")]
    Bool,
    #[token("break")]
    Break,
    #[token("char")]
    Char,
    #[token("class")]
    Class,
    #[token("const")]
    Const,
    #[token("continue")]
    Continue,
    #[token("default")]
    Default,
    #[token("delete")]
    Delete,
    #[token("double")]
    Double,
    #[token("else")]
    Else,
    #[token("enum")]
    Enum,
    #[token("explicit")]
    Explicit,
    #[token("export")]
    Export,
    #[token("false")]
    False,
    #[token("float")]
    Float,
    #[token("for")]
    For,
    #[token("friend")]
    Friend,
    #[token("if")]
    If,
    #[token("import")]
    Import,
    #[token("int")]
    Int,
    #[token("mutable")]
    Mutable,
    #[token("namespace")]
    Namespace,
    #[token("operator")]
    Operator,
    #[token("private")]
    Private,
    #[token("protected")]
    Protected,
    #[token("public")]
    Public,
    #[token("return")]
    Return,
    #[token("static")]
    Static,
    #[token("struct")]
    Struct,
    #[token("template")]
    Template,
    #[token("this")]
    This,
    #[token("true")]
    True,
    #[token("typedef")]
    Typedef,
    #[token("typeid")]
    Typeid,
    #[token("typename")]
    Typename,
    #[token("using")]
    Using,
    #[token("virtual")]
    Virtual,
    #[token("void")]
    Void,
    #[token("while")]
    While,

    // Punctuators
    #[token("(")]
    LeftPar,
    #[token(")")]
    RightPar,
    #[token("[")]
    LeftBracket,
    #[token("]")]
    RightBracket,
    #[token("{")]
    LeftBrace,
    #[token("}")]
    RightBrace,
    #[token(";")]
    Semicolon,
    #[token(":")]
    Colon,
    #[token("::")]
    ScopeResolution,
    #[token(",")]
    Comma,
    #[token(".")]
    Dot,
    #[token("?")]
    QuestionMark,

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Mul,
    #[token("/")]
    Div,
    #[token("%")]
    Remainder,
    #[token("++")]
    PlusPlus,
    #[token("--")]
    MinusMinus,
    #[token("=")]
    Eq,
    #[token("==")]
    EqEq,
    #[token("!=")]
    Neq,
    #[token("<")]
    LeftAngle,
    #[token(">")]
    RightAngle,
    #[token("<=")]
    Leq,
    #[token(">=")]
    Geq,
    #[token("<<")]
    LeftShift,
    /// `>>` - right shift, or two closing template angle brackets.
    #[token(">>")]
    RightRightAngle,
    /// `&` - bitwise and, or a reference sign in type contexts.
    #[token("&")]
    Ampersand,
    /// `&&` - logical and, or an rvalue-reference sign in type contexts.
    #[token("&&")]
    LogicalAnd,
    #[token("|")]
    BitOr,
    #[token("||")]
    LogicalOr,
    #[token("^")]
    BitXor,
    #[token("~")]
    Tilde,
    #[token("!")]
    LogicalNot,
    #[token("+=")]
    PlusEq,
    #[token("-=")]
    MinusEq,
    #[token("*=")]
    MulEq,
    #[token("/=")]
    DivEq,
    #[token("%=")]
    RemainderEq,
    #[token("<<=")]
    LeftShiftEq,
    #[token(">>=")]
    RightShiftEq,
    #[token("&=")]
    BitAndEq,
    #[token("|=")]
    BitOrEq,
    #[token("^=")]
    BitXorEq,

    // Literals
    /// Decimal integer literal (no leading zero).
    #[regex(r"[1-9][0-9]*", priority = 5)]
    IntegerLiteral,
    /// `0b`/`0B` prefixed integer literal.
    #[regex(r"0[bB][01]+", priority = 10)]
    BinaryLiteral,
    /// Leading-zero integer literal. A lone `0` lexes as octal.
    #[regex(r"0[0-7]*", priority = 6)]
    OctalLiteral,
    /// `0x`/`0X` prefixed integer literal.
    #[regex(r"0[xX][0-9a-fA-F]+", priority = 10)]
    HexadecimalLiteral,
    /// Floating-point literal: fraction, exponent or `f` suffix.
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?f?", priority = 6)]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+f?", priority = 6)]
    #[regex(r"[0-9]+f", priority = 6)]
    DecimalLiteral,
    /// Double- or single-quoted string. Single-quoted strings are
    /// reinterpreted as character literals by the compiler.
    #[regex(r#""([^"\\\n]|\\.)*""#, priority = 5)]
    #[regex(r"'([^'\\\n]|\\.)*'", priority = 5)]
    StringLiteral,
    /// A numeric or string literal immediately followed by a suffix
    /// identifier, e.g. `3.14km` or `""deg`.
    #[regex(r"[0-9]+[a-zA-Z_][a-zA-Z0-9_]*", priority = 3)]
    #[regex(r"[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?[a-zA-Z_][a-zA-Z0-9_]*", priority = 3)]
    #[regex(r#""([^"\\\n]|\\.)*"[a-zA-Z_][a-zA-Z0-9_]*"#, priority = 6)]
    UserDefinedLiteral,

    /// Identifier that is not a keyword.
    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*", priority = 2)]
    UserDefinedName,

    // Synthesized kinds - never produced by the lexer.
    /// `[[`, synthesized while parsing attributes.
    DblLeftBracket,
    /// `]]`, synthesized while parsing attributes.
    DblRightBracket,
    /// `()`, synthesized while parsing `operator()`.
    LeftRightPar,
    /// `[]`, synthesized while parsing `operator[]`.
    LeftRightBracket,
    /// Placeholder used in "unexpected token" errors.
    Invalid,
}

impl TokenKind {
    pub fn is_keyword(self) -> bool {
        matches!(
            self,
            TokenKind::Auto
                | TokenKind::Bool
                | TokenKind::Break
                | TokenKind::Char
                | TokenKind::Class
                | TokenKind::Const
                | TokenKind::Continue
                | TokenKind::Default
                | TokenKind::Delete
                | TokenKind::Double
                | TokenKind::Else
                | TokenKind::Enum
                | TokenKind::Explicit
                | TokenKind::Export
                | TokenKind::False
                | TokenKind::Float
                | TokenKind::For
                | TokenKind::Friend
                | TokenKind::If
                | TokenKind::Import
                | TokenKind::Int
                | TokenKind::Mutable
                | TokenKind::Namespace
                | TokenKind::Operator
                | TokenKind::Private
                | TokenKind::Protected
                | TokenKind::Public
                | TokenKind::Return
                | TokenKind::Static
                | TokenKind::Struct
                | TokenKind::Template
                | TokenKind::This
                | TokenKind::True
                | TokenKind::Typedef
                | TokenKind::Typeid
                | TokenKind::Typename
                | TokenKind::Using
                | TokenKind::Virtual
                | TokenKind::Void
                | TokenKind::While
        )
    }

    pub fn is_literal(self) -> bool {
        matches!(
            self,
            TokenKind::True
                | TokenKind::False
                | TokenKind::IntegerLiteral
                | TokenKind::BinaryLiteral
                | TokenKind::OctalLiteral
                | TokenKind::HexadecimalLiteral
                | TokenKind::DecimalLiteral
                | TokenKind::StringLiteral
                | TokenKind::UserDefinedLiteral
        )
    }

    /// Whether this token can appear where a name is expected.
    ///
    /// Fundamental-type keywords double as identifiers so that `int` can be
    /// parsed as a type name or a template argument.
    pub fn is_identifier(self) -> bool {
        matches!(
            self,
            TokenKind::UserDefinedName
                | TokenKind::Void
                | TokenKind::Bool
                | TokenKind::Char
                | TokenKind::Int
                | TokenKind::Float
                | TokenKind::Double
                | TokenKind::Auto
                | TokenKind::This
        )
    }

    /// Whether this token is an operator symbol (overloadable or not).
    pub fn is_operator(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Mul
                | TokenKind::Div
                | TokenKind::Remainder
                | TokenKind::PlusPlus
                | TokenKind::MinusMinus
                | TokenKind::Eq
                | TokenKind::EqEq
                | TokenKind::Neq
                | TokenKind::LeftAngle
                | TokenKind::RightAngle
                | TokenKind::Leq
                | TokenKind::Geq
                | TokenKind::LeftShift
                | TokenKind::RightRightAngle
                | TokenKind::Ampersand
                | TokenKind::LogicalAnd
                | TokenKind::BitOr
                | TokenKind::LogicalOr
                | TokenKind::BitXor
                | TokenKind::Tilde
                | TokenKind::LogicalNot
                | TokenKind::PlusEq
                | TokenKind::MinusEq
                | TokenKind::MulEq
                | TokenKind::DivEq
                | TokenKind::RemainderEq
                | TokenKind::LeftShiftEq
                | TokenKind::RightShiftEq
                | TokenKind::BitAndEq
                | TokenKind::BitOrEq
                | TokenKind::BitXorEq
                | TokenKind::Comma
        )
    }
}

/// Zero-copy token: kind + span, text retrieved via [`token_text`] when needed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: TextRange,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: TextRange) -> Self {
        Self { kind, span }
    }

    #[inline]
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}

/// Retrieves the text slice for a token. O(1) slice into source.
#[inline]
pub fn token_text<'s>(source: &'s str, token: &Token) -> &'s str {
    &source[std::ops::Range::<usize>::from(token.span)]
}

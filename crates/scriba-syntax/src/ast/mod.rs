//! Abstract syntax tree for the scriba language.
//!
//! Nodes own their tokens (kind + span); any text is re-derived from the
//! source through the spans. Declarations that later passes revisit (class
//! bodies, function bodies, templates) are held behind `Rc` so the semantic
//! compiler can keep handles to them without cloning subtrees.

use std::rc::Rc;

use rowan::TextRange;

use crate::operators::OperatorId;
use crate::token::{Token, token_text};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Identifier {
    Simple(SimpleIdentifier),
    Template(TemplateIdentifier),
    Scoped(ScopedIdentifier),
    Operator(OperatorName),
    LiteralOperator(LiteralOperatorName),
}

/// A plain name, e.g. `foo` or `int`.
#[derive(Debug, Clone, Copy)]
pub struct SimpleIdentifier {
    pub name: Token,
}

/// `name<arg, ...>`.
#[derive(Debug, Clone)]
pub struct TemplateIdentifier {
    pub name: Token,
    pub left_angle: Token,
    pub args: Vec<TemplateArg>,
    /// `>` or `>>` - possibly shared with an enclosing template.
    pub right_angle: Token,
}

/// `lhs::rhs`; chains fold to the left: `a::b::c` is `(a::b)::c`.
#[derive(Debug, Clone)]
pub struct ScopedIdentifier {
    pub lhs: Box<Identifier>,
    pub scope_resolution: Token,
    pub rhs: Box<Identifier>,
}

/// `operator+`, `operator()`, ...
#[derive(Debug, Clone, Copy)]
pub struct OperatorName {
    pub keyword: Token,
    pub symbol: Token,
}

impl OperatorName {
    pub fn operator_id(&self) -> Option<OperatorId> {
        OperatorId::from_symbol(self.symbol.kind)
    }
}

/// `operator"" suffix`.
#[derive(Debug, Clone, Copy)]
pub struct LiteralOperatorName {
    pub keyword: Token,
    pub double_quotes: Token,
    pub suffix: Token,
}

impl Identifier {
    pub fn span(&self) -> TextRange {
        match self {
            Identifier::Simple(id) => id.name.span,
            Identifier::Template(id) => id.name.span.cover(id.right_angle.span),
            Identifier::Scoped(id) => id.lhs.span().cover(id.rhs.span()),
            Identifier::Operator(id) => id.keyword.span.cover(id.symbol.span),
            Identifier::LiteralOperator(id) => id.keyword.span.cover(id.suffix.span),
        }
    }

    /// The token diagnostics should point at.
    pub fn base_token(&self) -> Token {
        match self {
            Identifier::Simple(id) => id.name,
            Identifier::Template(id) => id.name,
            Identifier::Scoped(id) => id.rhs.base_token(),
            Identifier::Operator(id) => id.keyword,
            Identifier::LiteralOperator(id) => id.keyword,
        }
    }

    /// The unqualified name this identifier introduces or refers to.
    ///
    /// For scoped identifiers this is the rightmost component's name.
    pub fn name_text<'s>(&self, source: &'s str) -> &'s str {
        match self {
            Identifier::Simple(id) => token_text(source, &id.name),
            Identifier::Template(id) => token_text(source, &id.name),
            Identifier::Scoped(id) => id.rhs.name_text(source),
            Identifier::Operator(id) => token_text(source, &id.symbol),
            Identifier::LiteralOperator(id) => token_text(source, &id.suffix),
        }
    }

    pub fn is_simple(&self) -> bool {
        matches!(self, Identifier::Simple(_))
    }

    pub fn is_template(&self) -> bool {
        matches!(self, Identifier::Template(_))
    }

    pub fn is_scoped(&self) -> bool {
        matches!(self, Identifier::Scoped(_))
    }

    pub fn as_simple(&self) -> Option<&SimpleIdentifier> {
        match self {
            Identifier::Simple(id) => Some(id),
            _ => None,
        }
    }

    pub fn as_template(&self) -> Option<&TemplateIdentifier> {
        match self {
            Identifier::Template(id) => Some(id),
            _ => None,
        }
    }

    /// Folds a non-empty list of identifiers into a left-leaning scoped chain.
    pub fn scoped(parts: Vec<Identifier>, scope_resolution: Token) -> Identifier {
        let mut iter = parts.into_iter();
        let mut ret = iter.next().expect("scoped identifier needs at least one part");
        for rhs in iter {
            ret = Identifier::Scoped(ScopedIdentifier {
                lhs: Box::new(ret),
                scope_resolution,
                rhs: Box::new(rhs),
            });
        }
        ret
    }
}

/// A template argument: either a type or a constant expression.
#[derive(Debug, Clone)]
pub enum TemplateArg {
    Type(QualifiedType),
    Expr(Expr),
}

impl TemplateArg {
    pub fn span(&self) -> TextRange {
        match self {
            TemplateArg::Type(t) => t.span(),
            TemplateArg::Expr(e) => e.span(),
        }
    }
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A (possibly const- and reference-qualified) type annotation.
///
/// Either `name` or `function_type` is set; a default-constructed value
/// (both `None`) stands for "no type written", as in constructors.
#[derive(Debug, Clone, Default)]
pub struct QualifiedType {
    pub const_qualifier: Option<Token>,
    /// `&` or `&&`.
    pub reference: Option<Token>,
    pub name: Option<Identifier>,
    pub function_type: Option<Box<FunctionType>>,
}

/// A function type `R(A, B)`, usable as a variable type.
#[derive(Debug, Clone)]
pub struct FunctionType {
    pub return_type: QualifiedType,
    pub params: Vec<QualifiedType>,
}

impl QualifiedType {
    pub fn named(name: Identifier) -> Self {
        Self {
            name: Some(name),
            ..Self::default()
        }
    }

    pub fn is_null(&self) -> bool {
        self.name.is_none() && self.function_type.is_none()
    }

    /// A bare name with no qualifier, reference or signature.
    pub fn is_simple(&self) -> bool {
        self.const_qualifier.is_none()
            && self.reference.is_none()
            && self.function_type.is_none()
            && self.name.is_some()
    }

    pub fn is_const(&self) -> bool {
        self.const_qualifier.is_some()
    }

    pub fn is_ref(&self) -> bool {
        self.reference.is_some()
    }

    pub fn is_function_type(&self) -> bool {
        self.function_type.is_some()
    }

    pub fn span(&self) -> TextRange {
        let mut span = match (&self.name, &self.function_type) {
            (Some(name), _) => name.span(),
            (None, Some(ft)) => ft.return_type.span(),
            (None, None) => return TextRange::default(),
        };
        if let Some(c) = &self.const_qualifier {
            span = span.cover(c.span);
        }
        if let Some(r) = &self.reference {
            span = span.cover(r.span);
        }
        span
    }
}

// ---------------------------------------------------------------------------
// Expressions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Expr {
    Literal(Literal),
    Id(Identifier),
    Operation(Box<Operation>),
    Conditional(Box<ConditionalExpr>),
    Call(Box<FunctionCall>),
    Subscript(Box<ArraySubscript>),
    List(ListExpr),
    Array(ArrayExpr),
    Brace(Box<BraceConstruction>),
    Lambda(Box<LambdaExpr>),
}

#[derive(Debug, Clone, Copy)]
pub enum Literal {
    Bool(Token),
    Integer(Token),
    FloatingPoint(Token),
    Str(Token),
    UserDefined(Token),
}

impl Literal {
    pub fn token(&self) -> Token {
        match *self {
            Literal::Bool(t)
            | Literal::Integer(t)
            | Literal::FloatingPoint(t)
            | Literal::Str(t)
            | Literal::UserDefined(t) => t,
        }
    }
}

/// A unary or binary operation. Member access `a.b` is an operation whose
/// operator token is `.` and whose second operand is an identifier.
#[derive(Debug, Clone)]
pub struct Operation {
    pub op: Token,
    pub arg1: Expr,
    pub arg2: Option<Expr>,
    /// True for `x++` / `x--`.
    pub postfix: bool,
}

impl Operation {
    pub fn is_member_access(&self) -> bool {
        self.op.kind == crate::token::TokenKind::Dot
    }

    pub fn operator_id(&self) -> Option<OperatorId> {
        use crate::operators::OperatorPosition::*;
        let position = if self.arg2.is_some() {
            Infix
        } else if self.postfix {
            Postfix
        } else {
            Prefix
        };
        OperatorId::from_token(self.op.kind, position)
    }
}

#[derive(Debug, Clone)]
pub struct ConditionalExpr {
    pub condition: Expr,
    pub question_mark: Token,
    pub on_true: Expr,
    pub colon: Token,
    pub on_false: Expr,
}

#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub callee: Expr,
    pub left_par: Token,
    pub args: Vec<Expr>,
    pub right_par: Token,
}

#[derive(Debug, Clone)]
pub struct ArraySubscript {
    pub array: Expr,
    pub left_bracket: Token,
    pub index: Expr,
    pub right_bracket: Token,
}

/// A brace list `{ a, b }` appearing in expression position.
#[derive(Debug, Clone)]
pub struct ListExpr {
    pub left_brace: Token,
    pub elements: Vec<Expr>,
    pub right_brace: Token,
}

/// An array literal `[ a, b ]`.
#[derive(Debug, Clone)]
pub struct ArrayExpr {
    pub left_bracket: Token,
    pub elements: Vec<Expr>,
    pub right_bracket: Token,
}

/// Construction of a temporary: `T{ a, b }`.
#[derive(Debug, Clone)]
pub struct BraceConstruction {
    pub temporary_type: Identifier,
    pub left_brace: Token,
    pub args: Vec<Expr>,
    pub right_brace: Token,
}

#[derive(Debug, Clone)]
pub struct LambdaExpr {
    pub left_bracket: Token,
    pub captures: Vec<LambdaCapture>,
    pub right_bracket: Token,
    pub left_par: Token,
    pub params: Vec<FunctionParameter>,
    pub right_par: Token,
    pub body: CompoundStatement,
}

/// One element of a lambda capture list.
///
/// `=` and `&` defaults leave `name` empty; `x`, `&x` and `x = expr` fill
/// the corresponding fields.
#[derive(Debug, Clone)]
pub struct LambdaCapture {
    pub by_value_sign: Option<Token>,
    pub reference: Option<Token>,
    pub name: Option<Token>,
    pub assignment_sign: Option<Token>,
    pub value: Option<Expr>,
}

impl LambdaCapture {
    /// Whether this is a `[=]` or `[&]` capture-default.
    pub fn is_default(&self) -> bool {
        self.name.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionParameter {
    pub param_type: QualifiedType,
    pub name: Option<Token>,
    pub default_value: Option<Expr>,
}

impl Expr {
    pub fn span(&self) -> TextRange {
        match self {
            Expr::Literal(lit) => lit.token().span,
            Expr::Id(id) => id.span(),
            Expr::Operation(op) => {
                let mut span = op.op.span.cover(op.arg1.span());
                if let Some(arg2) = &op.arg2 {
                    span = span.cover(arg2.span());
                }
                span
            }
            Expr::Conditional(c) => c.condition.span().cover(c.on_false.span()),
            Expr::Call(c) => c.callee.span().cover(c.right_par.span),
            Expr::Subscript(s) => s.array.span().cover(s.right_bracket.span),
            Expr::List(l) => l.left_brace.span.cover(l.right_brace.span),
            Expr::Array(a) => a.left_bracket.span.cover(a.right_bracket.span),
            Expr::Brace(b) => b.temporary_type.span().cover(b.right_brace.span),
            Expr::Lambda(l) => l.left_bracket.span.cover(l.body.close_brace.span),
        }
    }

    /// The token diagnostics should point at.
    pub fn base_token(&self) -> Token {
        match self {
            Expr::Literal(lit) => lit.token(),
            Expr::Id(id) => id.base_token(),
            Expr::Operation(op) => op.op,
            Expr::Conditional(c) => c.question_mark,
            Expr::Call(c) => c.callee.base_token(),
            Expr::Subscript(s) => s.left_bracket,
            Expr::List(l) => l.left_brace,
            Expr::Array(a) => a.left_bracket,
            Expr::Brace(b) => b.temporary_type.base_token(),
            Expr::Lambda(l) => l.left_bracket,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Expr::Id(id) => Some(id),
            _ => None,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self, Expr::Id(_))
    }
}

// ---------------------------------------------------------------------------
// Statements
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Stmt {
    Null(Token),
    Expr(Box<ExprStatement>),
    Compound(CompoundStatement),
    If(Box<IfStatement>),
    While(Box<WhileLoop>),
    For(Box<ForLoop>),
    Break(Token),
    Continue(Token),
    Return(Box<ReturnStatement>),
    Decl(Decl),
}

#[derive(Debug, Clone)]
pub struct ExprStatement {
    pub expr: Expr,
    pub semicolon: Token,
}

#[derive(Debug, Clone)]
pub struct CompoundStatement {
    pub open_brace: Token,
    pub statements: Vec<Stmt>,
    pub close_brace: Token,
}

#[derive(Debug, Clone)]
pub struct IfStatement {
    pub keyword: Token,
    pub condition: Expr,
    pub body: Stmt,
    pub else_keyword: Option<Token>,
    pub else_clause: Option<Stmt>,
}

#[derive(Debug, Clone)]
pub struct WhileLoop {
    pub keyword: Token,
    pub condition: Expr,
    pub body: Stmt,
}

#[derive(Debug, Clone)]
pub struct ForLoop {
    pub keyword: Token,
    pub init_statement: Option<Stmt>,
    pub condition: Option<Expr>,
    pub loop_increment: Option<Expr>,
    pub body: Stmt,
}

#[derive(Debug, Clone)]
pub struct ReturnStatement {
    pub keyword: Token,
    pub expression: Option<Expr>,
}

impl Stmt {
    /// The token diagnostics should point at.
    pub fn base_token(&self) -> Token {
        match self {
            Stmt::Null(t) | Stmt::Break(t) | Stmt::Continue(t) => *t,
            Stmt::Expr(es) => es.expr.base_token(),
            Stmt::Compound(cs) => cs.open_brace,
            Stmt::If(s) => s.keyword,
            Stmt::While(s) => s.keyword,
            Stmt::For(s) => s.keyword,
            Stmt::Return(s) => s.keyword,
            Stmt::Decl(d) => d.base_token(),
        }
    }

    pub fn as_declaration(&self) -> Option<&Decl> {
        match self {
            Stmt::Decl(d) => Some(d),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Declarations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Decl {
    Variable(Rc<VariableDecl>),
    Function(Rc<FunctionDecl>),
    Class(Rc<ClassDecl>),
    Enum(Rc<EnumDecl>),
    Typedef(Rc<TypedefDecl>),
    Namespace(Rc<NamespaceDecl>),
    NamespaceAlias(Rc<NamespaceAliasDecl>),
    Friend(Rc<FriendDecl>),
    Using(Rc<UsingDecl>),
    UsingDirective(Rc<UsingDirectiveDecl>),
    TypeAlias(Rc<TypeAliasDecl>),
    Import(Rc<ImportDirective>),
    Template(Rc<TemplateDecl>),
}

impl Decl {
    /// The token diagnostics should point at.
    pub fn base_token(&self) -> Token {
        match self {
            Decl::Variable(d) => d.name,
            Decl::Function(d) => d.name.base_token(),
            Decl::Class(d) => d.name.base_token(),
            Decl::Enum(d) => d.name,
            Decl::Typedef(d) => d.name,
            Decl::Namespace(d) => d.name,
            Decl::NamespaceAlias(d) => d.alias_name,
            Decl::Friend(d) => d.friend_keyword,
            Decl::Using(d) => d.using_keyword,
            Decl::UsingDirective(d) => d.using_keyword,
            Decl::TypeAlias(d) => d.alias_name,
            Decl::Import(d) => d.import_keyword,
            Decl::Template(d) => d.declaration.base_token(),
        }
    }
}

/// `[[ expr ]]` attached to a declaration.
#[derive(Debug, Clone)]
pub struct Attribute {
    pub double_left_bracket: Token,
    pub expr: Expr,
    pub double_right_bracket: Token,
}

#[derive(Debug, Clone)]
pub struct VariableDecl {
    pub attribute: Option<Attribute>,
    pub static_specifier: Option<Token>,
    pub var_type: QualifiedType,
    pub name: Token,
    pub init: Option<VariableInit>,
    pub semicolon: Option<Token>,
}

#[derive(Debug, Clone)]
pub enum VariableInit {
    /// `= expr`
    Assignment { eq: Token, value: Expr },
    /// `(args...)`
    Constructor { left_par: Token, args: Vec<Expr> },
    /// `{args...}`
    Brace { left_brace: Token, args: Vec<Expr> },
}

/// What kind of function a [`FunctionDecl`] declares.
#[derive(Debug, Clone)]
pub enum FunctionDeclKind {
    Function,
    Constructor {
        member_initializations: Vec<MemberInitialization>,
    },
    Destructor {
        tilde: Token,
    },
    OperatorOverload,
    /// `operator T()` - the target type lives in `return_type`.
    Cast {
        operator_keyword: Token,
    },
}

/// One entry of a constructor's member-initialization list: the name of the
/// enclosing class (delegating), of a base (parent constructor) or of a data
/// member, together with its paren or brace arguments.
#[derive(Debug, Clone)]
pub struct MemberInitialization {
    pub name: Identifier,
    pub init: CtorInitArgs,
}

#[derive(Debug, Clone)]
pub enum CtorInitArgs {
    Paren(Vec<Expr>),
    Brace(Vec<Expr>),
}

impl CtorInitArgs {
    pub fn args(&self) -> &[Expr] {
        match self {
            CtorInitArgs::Paren(args) | CtorInitArgs::Brace(args) => args,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub attribute: Option<Attribute>,
    pub return_type: QualifiedType,
    pub name: Identifier,
    pub params: Vec<FunctionParameter>,
    pub body: Option<CompoundStatement>,
    pub explicit_keyword: Option<Token>,
    pub static_keyword: Option<Token>,
    pub virtual_keyword: Option<Token>,
    pub const_qualifier: Option<Token>,
    pub equal_sign: Option<Token>,
    pub default_keyword: Option<Token>,
    pub delete_keyword: Option<Token>,
    /// The `0` of `= 0`.
    pub virtual_pure: Option<Token>,
    pub kind: FunctionDeclKind,
}

impl FunctionDecl {
    pub fn new(name: Identifier) -> Self {
        Self {
            attribute: None,
            return_type: QualifiedType::default(),
            name,
            params: Vec::new(),
            body: None,
            explicit_keyword: None,
            static_keyword: None,
            virtual_keyword: None,
            const_qualifier: None,
            equal_sign: None,
            default_keyword: None,
            delete_keyword: None,
            virtual_pure: None,
            kind: FunctionDeclKind::Function,
        }
    }

    pub fn is_constructor(&self) -> bool {
        matches!(self.kind, FunctionDeclKind::Constructor { .. })
    }

    pub fn is_destructor(&self) -> bool {
        matches!(self.kind, FunctionDeclKind::Destructor { .. })
    }

    pub fn is_operator_overload(&self) -> bool {
        matches!(self.kind, FunctionDeclKind::OperatorOverload)
    }

    pub fn is_cast(&self) -> bool {
        matches!(self.kind, FunctionDeclKind::Cast { .. })
    }

    pub fn is_deleted(&self) -> bool {
        self.delete_keyword.is_some()
    }

    pub fn is_defaulted(&self) -> bool {
        self.default_keyword.is_some()
    }

    pub fn is_pure_virtual(&self) -> bool {
        self.virtual_pure.is_some()
    }

    pub fn is_virtual(&self) -> bool {
        self.virtual_keyword.is_some() || self.is_pure_virtual()
    }

    pub fn member_initializations(&self) -> &[MemberInitialization] {
        match &self.kind {
            FunctionDeclKind::Constructor {
                member_initializations,
            } => member_initializations,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone)]
pub enum ClassContent {
    Declaration(Decl),
    AccessSpecifier(AccessSpecifier),
}

/// `public:` / `protected:` / `private:`.
#[derive(Debug, Clone, Copy)]
pub struct AccessSpecifier {
    pub visibility: Token,
    pub colon: Token,
}

#[derive(Debug, Clone)]
pub struct ClassDecl {
    pub class_keyword: Token,
    pub attribute: Option<Attribute>,
    pub name: Identifier,
    pub colon: Option<Token>,
    pub parent: Option<Identifier>,
    pub opening_brace: Token,
    pub content: Vec<ClassContent>,
    pub closing_brace: Token,
    pub ending_semicolon: Token,
}

#[derive(Debug, Clone)]
pub struct EnumValueDecl {
    pub name: Token,
    pub value: Option<Expr>,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub enum_keyword: Token,
    pub class_keyword: Option<Token>,
    pub attribute: Option<Attribute>,
    pub name: Token,
    pub left_brace: Token,
    pub values: Vec<EnumValueDecl>,
    pub right_brace: Token,
}

#[derive(Debug, Clone)]
pub struct TypedefDecl {
    pub typedef_keyword: Token,
    pub qualified_type: QualifiedType,
    pub name: Token,
}

#[derive(Debug, Clone)]
pub struct NamespaceDecl {
    pub namespace_keyword: Token,
    pub name: Token,
    pub left_brace: Token,
    pub statements: Vec<Stmt>,
    pub right_brace: Token,
}

#[derive(Debug, Clone)]
pub struct NamespaceAliasDecl {
    pub namespace_keyword: Token,
    pub alias_name: Token,
    pub eq: Token,
    pub aliased_name: Identifier,
}

#[derive(Debug, Clone)]
pub struct FriendDecl {
    pub friend_keyword: Token,
    pub class_keyword: Token,
    pub class_name: Identifier,
}

/// `using A::b;`
#[derive(Debug, Clone)]
pub struct UsingDecl {
    pub using_keyword: Token,
    pub used_name: ScopedIdentifier,
}

/// `using namespace A;`
#[derive(Debug, Clone)]
pub struct UsingDirectiveDecl {
    pub using_keyword: Token,
    pub namespace_keyword: Token,
    pub namespace_name: Identifier,
}

/// `using alias = T;`
#[derive(Debug, Clone)]
pub struct TypeAliasDecl {
    pub using_keyword: Token,
    pub alias_name: Token,
    pub eq: Token,
    pub aliased_type: Identifier,
}

/// `import a.b.c;`, optionally `export`-ed.
#[derive(Debug, Clone)]
pub struct ImportDirective {
    pub export_keyword: Option<Token>,
    pub import_keyword: Token,
    pub names: Vec<Token>,
}

#[derive(Debug, Clone)]
pub struct TemplateParameter {
    /// `typename`, `int` or `bool`.
    pub kind: Token,
    pub name: Token,
    pub eq: Option<Token>,
    pub default_value: Option<TemplateArg>,
}

#[derive(Debug, Clone)]
pub struct TemplateDecl {
    pub template_keyword: Token,
    pub left_angle: Token,
    pub parameters: Vec<TemplateParameter>,
    pub right_angle: Token,
    pub declaration: Decl,
}

impl TemplateDecl {
    /// `template<> class A<int> ...`
    pub fn is_full_specialization(&self) -> bool {
        self.parameters.is_empty()
    }

    /// `template<typename T> class A<T, T> ...`
    pub fn is_partial_specialization(&self) -> bool {
        if self.is_full_specialization() {
            return false;
        }
        match &self.declaration {
            Decl::Class(class) => class.name.is_template(),
            _ => false,
        }
    }

    pub fn is_class_template(&self) -> bool {
        matches!(self.declaration, Decl::Class(_))
    }

    pub fn is_function_template(&self) -> bool {
        matches!(self.declaration, Decl::Function(_))
    }

    pub fn class_decl(&self) -> Option<&Rc<ClassDecl>> {
        match &self.declaration {
            Decl::Class(c) => Some(c),
            _ => None,
        }
    }

    pub fn function_decl(&self) -> Option<&Rc<FunctionDecl>> {
        match &self.declaration {
            Decl::Function(f) => Some(f),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root
// ---------------------------------------------------------------------------

/// A parsed script: the source, its token list and the top-level statements.
///
/// Tokens and nodes only carry spans, so the AST is fully owned and `'static`.
#[derive(Debug, Clone)]
pub struct Ast {
    pub source: String,
    pub tokens: Vec<Token>,
    pub statements: Vec<Stmt>,
}

impl Ast {
    /// Source text of a token of this tree.
    pub fn text(&self, token: &Token) -> &str {
        token_text(&self.source, token)
    }
}

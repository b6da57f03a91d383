//! Compiler error codes and the failure type that carries them.

use rowan::TextRange;

/// Stable identifiers for semantic errors.
///
/// Codes are grouped the way the compiler raises them; the `#[error]`
/// strings are the rendered human messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CompilerError {
    // Flow
    #[error("syntax error")]
    SyntaxError,
    #[error("expected a declaration")]
    ExpectedDeclaration,

    // `this` and members
    #[error("illegal use of 'this'")]
    IllegalUseOfThis,
    #[error("invalid use of delegated constructor")]
    InvalidUseOfDelegatedConstructor,
    #[error("name does not refer to a data member")]
    NotDataMember,
    #[error("data members of a base class cannot be initialized here")]
    InheritedDataMember,
    #[error("data member already has an initializer")]
    DataMemberAlreadyHasInitializer,
    #[error("no delegating constructor found")]
    NoDelegatingConstructorFound,
    #[error("could not find valid base constructor")]
    CouldNotFindValidBaseConstructor,

    // Initialization
    #[error("references must be initialized")]
    ReferencesMustBeInitialized,
    #[error("enumerations cannot be default constructed")]
    EnumerationsCannotBeDefaultConstructed,
    #[error("enumerations must be initialized")]
    EnumerationsMustBeInitialized,
    #[error("function variables must be initialized")]
    FunctionVariablesMustBeInitialized,
    #[error("variable cannot be default constructed")]
    VariableCannotBeDefaultConstructed,
    #[error("class has a deleted default constructor")]
    ClassHasDeletedDefaultCtor,
    #[error("return statement without a value in a function returning non-void")]
    ReturnStatementWithoutValue,
    #[error("return statement with a value in a function returning void")]
    ReturnStatementWithValue,
    #[error("'auto' must be used with an assignment initializer")]
    AutoMustBeUsedWithAssignment,
    #[error("narrowing conversion in brace initialization")]
    NarrowingConversionInBraceInitialization,
    #[error("too many arguments in variable initialization")]
    TooManyArgumentInVariableInitialization,
    #[error("too many arguments in initialization")]
    TooManyArgumentInInitialization,
    #[error("too many arguments in reference initialization")]
    TooManyArgumentInReferenceInitialization,
    #[error("an initializer list cannot be the first element of an array")]
    InitializerListAsFirstArrayElement,

    // Lookup
    #[error("invalid type name")]
    InvalidTypeName,
    #[error("ambiguous function name")]
    AmbiguousFunctionName,
    #[error("template names are not expressions")]
    TemplateNamesAreNotExpressions,
    #[error("type name cannot be used in an expression")]
    TypeNameInExpression,
    #[error("namespace name cannot be used in an expression")]
    NamespaceNameInExpression,
    #[error("no such member")]
    NoSuchMember,
    #[error("expression cannot be used as a callee")]
    NoSuchCallee,
    #[error("cannot access a member of a non-object value")]
    CannotAccessMemberOfNonObject,

    // Overload resolution
    #[error("could not convert between types")]
    CouldNotConvert,
    #[error("could not find a common type")]
    CouldNotFindCommonType,
    #[error("could not find a valid constructor")]
    CouldNotFindValidConstructor,
    #[error("could not find a valid operator")]
    CouldNotFindValidOperator,
    #[error("could not find a valid member function")]
    CouldNotFindValidMemberFunction,
    #[error("could not find a valid call operator")]
    CouldNotFindValidCallOperator,
    #[error("could not find a valid subscript operator")]
    CouldNotFindValidSubscriptOperator,
    #[error("could not find a valid literal operator")]
    CouldNotFindValidLiteralOperator,
    #[error("could not resolve operator name")]
    CouldNotResolveOperatorName,
    #[error("invalid parameter count in operator overload")]
    InvalidParamCountInOperatorOverload,
    #[error("this operator overload must be declared as a member")]
    OpOverloadMustBeDeclaredAsMember,

    // Inheritance / defaulted members
    #[error("this function cannot be defaulted")]
    FunctionCannotBeDefaulted,
    #[error("parent class has no default constructor")]
    ParentHasNoDefaultConstructor,
    #[error("parent class has a deleted default constructor")]
    ParentHasDeletedDefaultConstructor,
    #[error("parent class has no copy constructor")]
    ParentHasNoCopyConstructor,
    #[error("parent class has a deleted copy constructor")]
    ParentHasDeletedCopyConstructor,
    #[error("data member is not copyable")]
    DataMemberIsNotCopyable,
    #[error("parent class has a deleted move constructor")]
    ParentHasDeletedMoveConstructor,
    #[error("data member is not movable")]
    DataMemberIsNotMovable,
    #[error("parent class has no assignment operator")]
    ParentHasNoAssignmentOperator,
    #[error("parent class has a deleted assignment operator")]
    ParentHasDeletedAssignmentOperator,
    #[error("data member has no assignment operator")]
    DataMemberHasNoAssignmentOperator,
    #[error("data member has a deleted assignment operator")]
    DataMemberHasDeletedAssignmentOperator,
    #[error("reference data members cannot be assigned")]
    DataMemberIsReferenceAndCannotBeAssigned,
    #[error("object has no destructor")]
    ObjectHasNoDestructor,
    #[error("call to a deleted function")]
    CallToDeletedFunction,
    #[error("invalid base class")]
    InvalidBaseClass,

    // Captures / lambdas
    #[error("'this' cannot be captured here")]
    CannotCaptureThis,
    #[error("unknown capture name")]
    UnknownCaptureName,
    #[error("cannot capture a non-copyable value")]
    CannotCaptureNonCopyable,
    #[error("some local variables cannot be captured")]
    SomeLocalsCannotBeCaptured,
    #[error("cannot capture both by value and by reference")]
    CannotCaptureByValueAndByRef,
    #[error("this lambda must be captureless")]
    LambdaMustBeCaptureless,
    #[error("could not deduce the lambda's return type")]
    CannotDeduceLambdaReturnType,

    // Templates
    #[error("invalid template argument")]
    InvalidTemplateArgument,
    #[error("invalid literal template argument")]
    InvalidLiteralTemplateArgument,
    #[error("missing non-defaulted template parameter")]
    MissingNonDefaultedTemplateParameter,
    #[error("could not find the primary class template")]
    CouldNotFindPrimaryClassTemplate,
    #[error("could not find the primary function template")]
    CouldNotFindPrimaryFunctionTemplate,

    // Modules
    #[error("unknown module name")]
    UnknownModuleName,
    #[error("unknown submodule name")]
    UnknownSubModuleName,
    #[error("module importation failed")]
    ModuleImportationFailed,
    #[error("invalid name in using directive")]
    InvalidNameInUsingDirective,

    // Misc
    #[error("member is inaccessible")]
    InaccessibleMember,
    #[error("a friend must be a class")]
    FriendMustBeAClass,
    #[error("invalid character literal")]
    InvalidCharacterLiteral,
    #[error("global variables cannot be 'auto'")]
    GlobalVariablesCannotBeAuto,
    #[error("global variables must be initialized")]
    GlobalVariablesMustBeInitialized,
    #[error("global variables must be initialized by assignment")]
    GlobalVariablesMustBeAssigned,
    #[error("namespace declarations cannot appear at this level")]
    NamespaceDeclarationCannotAppearAtThisLevel,
    #[error("literal operators must be declared at namespace scope")]
    LiteralOperatorNotInNamespace,
    #[error("data members cannot be 'auto'")]
    DataMemberCannotBeAuto,
    #[error("static data member is missing its initialization")]
    MissingStaticInitialization,
    #[error("invalid static initialization")]
    InvalidStaticInitialization,
    #[error("failed to initialize static variable")]
    FailedToInitializeStaticVariable,
    #[error("invalid use of default argument")]
    InvalidUseOfDefaultArgument,
    #[error("array element is not convertible to the array's element type")]
    ArrayElementNotConvertible,
    #[error("array subscript used on a non-object value")]
    ArraySubscriptOnNonObject,
    #[error("unknown type in brace initialization")]
    UnknownTypeInBraceInitialization,
    #[error("invalid use of 'const'")]
    InvalidUseOfConstKeyword,
    #[error("invalid use of 'explicit'")]
    InvalidUseOfExplicitKeyword,
    #[error("invalid use of 'static'")]
    InvalidUseOfStaticKeyword,
    #[error("invalid use of 'virtual'")]
    InvalidUseOfVirtualKeyword,
}

impl CompilerError {
    /// Whether a declaration failing with this error may succeed on a later
    /// pass, once more names are registered.
    pub fn is_reprocessable(self) -> bool {
        self == CompilerError::InvalidTypeName
    }
}

/// A semantic error bound to a source location.
///
/// Raising one aborts the declaration being processed; the script compiler
/// catches it, records a diagnostic, and possibly re-queues the declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{error}")]
pub struct CompilationFailure {
    pub error: CompilerError,
    pub span: TextRange,
}

impl CompilationFailure {
    pub fn new(error: CompilerError, span: TextRange) -> Self {
        Self { error, span }
    }

    pub fn is_reprocessable(&self) -> bool {
        self.error.is_reprocessable()
    }
}

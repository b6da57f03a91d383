use indoc::indoc;

use crate::ast::{
    ClassContent, Decl, FunctionDeclKind, Stmt, VariableInit,
};
use crate::parser::parse;

fn single_decl(src: &str) -> Decl {
    let ast = parse(src).expect("parses");
    assert_eq!(ast.statements.len(), 1, "expected one statement");
    match &ast.statements[0] {
        Stmt::Decl(d) => d.clone(),
        other => panic!("expected declaration, got {other:?}"),
    }
}

#[test]
fn variable_with_assignment() {
    let Decl::Variable(var) = single_decl("int a = 5;") else {
        panic!("expected variable");
    };
    assert!(matches!(var.init, Some(VariableInit::Assignment { .. })));
    assert!(var.semicolon.is_some());
}

#[test]
fn variable_with_ctor_init() {
    let Decl::Variable(var) = single_decl("Point p(1, 2);") else {
        panic!("expected variable");
    };
    let Some(VariableInit::Constructor { args, .. }) = &var.init else {
        panic!("expected constructor init");
    };
    assert_eq!(args.len(), 2);
}

#[test]
fn variable_with_brace_init() {
    let Decl::Variable(var) = single_decl("int a{3};") else {
        panic!("expected variable");
    };
    assert!(matches!(var.init, Some(VariableInit::Brace { .. })));
}

#[test]
fn uninitialized_variable() {
    let Decl::Variable(var) = single_decl("int a;") else {
        panic!("expected variable");
    };
    assert!(var.init.is_none());
}

#[test]
fn function_declaration() {
    let Decl::Function(f) = single_decl("int add(int a, int b) { return a + b; }") else {
        panic!("expected function");
    };
    assert_eq!(f.params.len(), 2);
    assert!(f.body.is_some());
    assert!(matches!(f.kind, FunctionDeclKind::Function));
}

#[test]
fn function_with_default_argument() {
    let Decl::Function(f) = single_decl("int f(int a, int b = 3) { return a; }") else {
        panic!("expected function");
    };
    assert!(f.params[0].default_value.is_none());
    assert!(f.params[1].default_value.is_some());
}

#[test]
fn const_ref_parameters() {
    let Decl::Function(f) = single_decl("int f(const string & s) { return 0; }") else {
        panic!("expected function");
    };
    assert!(f.params[0].param_type.is_const());
    assert!(f.params[0].param_type.is_ref());
}

#[test]
fn deleted_and_defaulted_members() {
    let src = indoc! {"
        class A
        {
            A() = default;
            A(const A & other) = delete;
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };

    let decls: Vec<_> = class
        .content
        .iter()
        .filter_map(|c| match c {
            ClassContent::Declaration(Decl::Function(f)) => Some(f),
            _ => None,
        })
        .collect();
    assert_eq!(decls.len(), 2);
    assert!(decls[0].is_defaulted());
    assert!(decls[0].is_constructor());
    assert!(decls[1].is_deleted());
}

#[test]
fn class_with_members_and_access_specifiers() {
    let src = indoc! {"
        class A : B
        {
        public:
            A() { }
            ~A() { }
            int n;
            void foo() const { }
        private:
            static int count;
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    assert!(class.parent.is_some());

    let mut functions = 0;
    let mut variables = 0;
    let mut access_specifiers = 0;
    for item in &class.content {
        match item {
            ClassContent::Declaration(Decl::Function(_)) => functions += 1,
            ClassContent::Declaration(Decl::Variable(_)) => variables += 1,
            ClassContent::AccessSpecifier(_) => access_specifiers += 1,
            other => panic!("unexpected member: {other:?}"),
        }
    }
    assert_eq!(functions, 3);
    assert_eq!(variables, 2);
    assert_eq!(access_specifiers, 2);
}

#[test]
fn constructor_with_member_initializers() {
    let src = indoc! {"
        class A
        {
            A() : n(0), m{1} { }
            int n;
            int m;
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };

    let ClassContent::Declaration(Decl::Function(ctor)) = &class.content[0] else {
        panic!("expected constructor");
    };
    assert!(ctor.is_constructor());
    assert_eq!(ctor.member_initializations().len(), 2);
}

#[test]
fn destructor_is_detected() {
    let src = indoc! {"
        class A
        {
            ~A() { }
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    let ClassContent::Declaration(Decl::Function(dtor)) = &class.content[0] else {
        panic!("expected destructor");
    };
    assert!(dtor.is_destructor());
}

#[test]
fn virtual_and_pure_virtual_members() {
    let src = indoc! {"
        class A
        {
            virtual int foo() { return 0; }
            virtual int bar() = 0;
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    let ClassContent::Declaration(Decl::Function(foo)) = &class.content[0] else {
        panic!("expected function");
    };
    assert!(foo.is_virtual());
    assert!(!foo.is_pure_virtual());

    let ClassContent::Declaration(Decl::Function(bar)) = &class.content[1] else {
        panic!("expected function");
    };
    assert!(bar.is_pure_virtual());
}

#[test]
fn cast_operator() {
    let src = indoc! {"
        class A
        {
            operator int() const { return 0; }
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    let ClassContent::Declaration(Decl::Function(cast)) = &class.content[0] else {
        panic!("expected cast");
    };
    assert!(cast.is_cast());
    assert!(cast.const_qualifier.is_some());
}

#[test]
fn operator_overload_member() {
    let src = indoc! {"
        class A
        {
            A operator+(const A & other) { return other; }
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    let ClassContent::Declaration(Decl::Function(op)) = &class.content[0] else {
        panic!("expected operator overload");
    };
    assert!(op.is_operator_overload());
}

#[test]
fn explicit_constructor() {
    let src = indoc! {"
        class A
        {
            explicit A(int n) { }
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    let ClassContent::Declaration(Decl::Function(ctor)) = &class.content[0] else {
        panic!("expected constructor");
    };
    assert!(ctor.is_constructor());
    assert!(ctor.explicit_keyword.is_some());
}

#[test]
fn enum_declaration() {
    let Decl::Enum(decl) = single_decl("enum Color { Red, Green = 4, Blue };") else {
        panic!("expected enum");
    };
    assert_eq!(decl.values.len(), 3);
    assert!(decl.values[0].value.is_none());
    assert!(decl.values[1].value.is_some());
    assert!(decl.class_keyword.is_none());

    let Decl::Enum(decl) = single_decl("enum class State { On, Off };") else {
        panic!("expected enum");
    };
    assert!(decl.class_keyword.is_some());
}

#[test]
fn typedef_and_type_alias() {
    let Decl::Typedef(td) = single_decl("typedef double real;") else {
        panic!("expected typedef");
    };
    assert!(td.qualified_type.name.is_some());

    let Decl::TypeAlias(alias) = single_decl("using real = double;") else {
        panic!("expected type alias");
    };
    let _ = alias;
}

#[test]
fn using_declarations_and_directives() {
    assert!(matches!(single_decl("using a::b;"), Decl::Using(_)));
    assert!(matches!(
        single_decl("using namespace a;"),
        Decl::UsingDirective(_)
    ));
    assert!(matches!(
        single_decl("namespace fs = filesystem;"),
        Decl::NamespaceAlias(_)
    ));
}

#[test]
fn import_directives() {
    let Decl::Import(import) = single_decl("import a.b.c;") else {
        panic!("expected import");
    };
    assert_eq!(import.names.len(), 3);
    assert!(import.export_keyword.is_none());

    let Decl::Import(import) = single_decl("export import a;") else {
        panic!("expected import");
    };
    assert!(import.export_keyword.is_some());
}

#[test]
fn template_class_declaration() {
    let src = "template<typename T> class Box { T value; };";
    let Decl::Template(td) = single_decl(src) else {
        panic!("expected template");
    };
    assert!(td.is_class_template());
    assert!(!td.is_full_specialization());
    assert!(!td.is_partial_specialization());
    assert_eq!(td.parameters.len(), 1);
}

#[test]
fn template_full_specialization() {
    let src = "template<> class Box<int> { };";
    let Decl::Template(td) = single_decl(src) else {
        panic!("expected template");
    };
    assert!(td.is_full_specialization());
}

#[test]
fn template_partial_specialization() {
    let src = "template<typename T> class pair<T, T> { };";
    let Decl::Template(td) = single_decl(src) else {
        panic!("expected template");
    };
    assert!(td.is_partial_specialization());
}

#[test]
fn function_template() {
    let src = "template<typename T> T max(T a, T b) { return a > b ? a : b; }";
    let Decl::Template(td) = single_decl(src) else {
        panic!("expected template");
    };
    assert!(td.is_function_template());
}

#[test]
fn template_parameter_defaults() {
    let src = "template<typename T, int N = 4> class small_vec { };";
    let Decl::Template(td) = single_decl(src) else {
        panic!("expected template");
    };
    assert_eq!(td.parameters.len(), 2);
    assert!(td.parameters[0].default_value.is_none());
    assert!(td.parameters[1].default_value.is_some());
}

#[test]
fn friend_declaration_inside_class() {
    let src = indoc! {"
        class A
        {
            friend class B;
        };
    "};
    let Decl::Class(class) = single_decl(src) else {
        panic!("expected class");
    };
    assert!(matches!(
        class.content[0],
        ClassContent::Declaration(Decl::Friend(_))
    ));
}

#[test]
fn attribute_on_function() {
    let Decl::Function(f) = single_decl("[[native]] void beep() { }") else {
        panic!("expected function");
    };
    assert!(f.attribute.is_some());
}

use std::rc::Rc;

use indoc::indoc;

use crate::diagnostics::DiagnosticCode;
use crate::engine::{Engine, Error, ModuleLoader};
use crate::error::CompilerError;
use crate::program;
use crate::symbols::{FunctionId, ScriptId};
use crate::types::Type;

fn compile(source: &str) -> (Engine, ScriptId) {
    let mut engine = Engine::new();
    match engine.compile(source) {
        Ok(script) => (engine, script),
        Err(Error::CompilationFailed { diagnostics, .. }) => {
            panic!(
                "compilation failed:\n{}",
                diagnostics.printer(source).render()
            )
        }
        Err(other) => panic!("compilation failed: {other}"),
    }
}

fn compile_err(source: &str) -> Vec<CompilerError> {
    let mut engine = Engine::new();
    match engine.compile(source) {
        Ok(_) => panic!("expected a compilation failure"),
        Err(Error::CompilationFailed { diagnostics, .. }) => diagnostics
            .messages()
            .iter()
            .filter_map(|m| match m.code {
                DiagnosticCode::Compiler(code) => Some(code),
                _ => None,
            })
            .collect(),
        Err(other) => panic!("unexpected error: {other}"),
    }
}

fn find_function(engine: &Engine, name: &str) -> FunctionId {
    engine
        .namespace(engine.root_namespace())
        .functions
        .iter()
        .copied()
        .find(|&f| engine.function(f).name() == Some(name))
        .unwrap_or_else(|| panic!("no function named {name}"))
}

fn body_of(engine: &Engine, function: FunctionId) -> Rc<program::CompoundStatement> {
    engine
        .function(function)
        .body
        .clone()
        .expect("function has a compiled body")
}

// -- IR walking helpers ------------------------------------------------------

fn walk_statements(stmt: &program::Statement, visit: &mut impl FnMut(&program::Statement)) {
    visit(stmt);
    match stmt {
        program::Statement::Compound(c) => {
            for s in &c.statements {
                walk_statements(s, visit);
            }
        }
        program::Statement::If(s) => {
            walk_statements(&s.body, visit);
            if let Some(e) = &s.else_clause {
                walk_statements(e, visit);
            }
        }
        program::Statement::While(s) => walk_statements(&s.body, visit),
        program::Statement::For(s) => {
            if let Some(init) = &s.init {
                walk_statements(init, visit);
            }
            walk_statements(&s.body, visit);
            if let Some(destroy) = &s.destroy {
                walk_statements(destroy, visit);
            }
        }
        _ => {}
    }
}

fn walk_body(body: &program::CompoundStatement, visit: &mut impl FnMut(&program::Statement)) {
    for stmt in &body.statements {
        walk_statements(stmt, visit);
    }
}

fn walk_expressions(expr: &program::Expression, visit: &mut impl FnMut(&program::Expression)) {
    visit(expr);
    match expr {
        program::Expression::LogicalAnd(e) => {
            walk_expressions(&e.lhs, visit);
            walk_expressions(&e.rhs, visit);
        }
        program::Expression::LogicalOr(e) => {
            walk_expressions(&e.lhs, visit);
            walk_expressions(&e.rhs, visit);
        }
        program::Expression::Conditional(e) => {
            walk_expressions(&e.condition, visit);
            walk_expressions(&e.on_true, visit);
            walk_expressions(&e.on_false, visit);
        }
        program::Expression::FunctionCall(e) => {
            for a in &e.args {
                walk_expressions(a, visit);
            }
        }
        program::Expression::VirtualCall(e) => {
            walk_expressions(&e.object, visit);
            for a in &e.args {
                walk_expressions(a, visit);
            }
        }
        program::Expression::ConstructorCall(e) => {
            for a in &e.args {
                walk_expressions(a, visit);
            }
        }
        program::Expression::FunctionVariableCall(e) => {
            walk_expressions(&e.callee, visit);
            for a in &e.args {
                walk_expressions(a, visit);
            }
        }
        program::Expression::Copy(e) => walk_expressions(&e.src, visit),
        program::Expression::FundamentalConversion(e) => walk_expressions(&e.src, visit),
        program::Expression::ArrayExpression(e) => {
            for a in &e.elements {
                walk_expressions(a, visit);
            }
        }
        program::Expression::MemberAccess(e) => walk_expressions(&e.object, visit),
        program::Expression::InitializerList(e) => {
            for a in &e.elements {
                walk_expressions(a, visit);
            }
        }
        program::Expression::LambdaExpression(e) => {
            for a in &e.captures {
                walk_expressions(a, visit);
            }
        }
        program::Expression::CaptureAccess(e) => walk_expressions(&e.object, visit),
        program::Expression::BindExpression(e) => walk_expressions(&e.value, visit),
        program::Expression::CommaExpression(e) => {
            walk_expressions(&e.lhs, visit);
            walk_expressions(&e.rhs, visit);
        }
        _ => {}
    }
}

fn body_expressions(body: &program::CompoundStatement, visit: &mut impl FnMut(&program::Expression)) {
    walk_body(body, &mut |stmt| {
        let mut exprs: Vec<&Rc<program::Expression>> = Vec::new();
        match stmt {
            program::Statement::PushValue(s) => {
                if let Some(v) = &s.value {
                    exprs.push(v);
                }
            }
            program::Statement::PushDataMember(s) => exprs.push(&s.value),
            program::Statement::ExpressionStatement(s) => exprs.push(&s.expr),
            program::Statement::Return(s) => {
                if let Some(v) = &s.value {
                    exprs.push(v);
                }
            }
            program::Statement::If(s) => exprs.push(&s.condition),
            program::Statement::While(s) => exprs.push(&s.condition),
            program::Statement::Placement(s) => {
                exprs.push(&s.object);
                exprs.extend(&s.args);
            }
            _ => {}
        }
        for e in exprs {
            walk_expressions(e, visit);
        }
    });
}

// -- Basics ------------------------------------------------------------------

#[test]
fn simple_function_compiles() {
    let (engine, _) = compile("int add(int a, int b) { return a + b; }");
    let add = find_function(&engine, "add");
    let body = body_of(&engine, add);
    assert!(!body.statements.is_empty());
}

#[test]
fn arithmetic_uses_builtin_operators() {
    let (engine, _) = compile("int f(int a) { return a * 2 + 1; }");
    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut calls = 0;
    body_expressions(&body, &mut |e| {
        if matches!(e, program::Expression::FunctionCall(_)) {
            calls += 1;
        }
    });
    assert_eq!(calls, 2, "one call for * and one for +");
}

#[test]
fn fundamental_conversion_in_return() {
    let (engine, _) = compile("double f(int a) { return a; }");
    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut conversions = 0;
    body_expressions(&body, &mut |e| {
        if matches!(e, program::Expression::FundamentalConversion(_)) {
            conversions += 1;
        }
    });
    assert_eq!(conversions, 1);
}

#[test]
fn logical_operators_short_circuit() {
    let (engine, _) = compile("bool f(bool a, bool b) { return a && b || a; }");
    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut and = 0;
    let mut or = 0;
    body_expressions(&body, &mut |e| match e {
        program::Expression::LogicalAnd(_) => and += 1,
        program::Expression::LogicalOr(_) => or += 1,
        _ => {}
    });
    assert_eq!((and, or), (1, 1));
}

#[test]
fn globals_compile_and_resolve() {
    let (engine, script) = compile(indoc! {"
        int counter = 5;
        int next() { return counter + 1; }
    "});

    let data = engine.script(script);
    assert_eq!(data.globals.len(), 1);
    assert!(data.global_inits[0].is_some());

    let next = find_function(&engine, "next");
    let body = body_of(&engine, next);
    let mut fetches = 0;
    body_expressions(&body, &mut |e| {
        if matches!(e, program::Expression::FetchGlobal(_)) {
            fetches += 1;
        }
    });
    assert_eq!(fetches, 1);
}

#[test]
fn enums_compile_and_convert_to_int() {
    let (engine, _) = compile(indoc! {"
        enum Color { Red, Green = 4, Blue };
        int f() { Color c = Green; return c; }
    "});

    let ns = engine.namespace(engine.root_namespace());
    let color = engine.enum_(ns.enums[0]);
    assert_eq!(color.values.get("Red"), Some(&0));
    assert_eq!(color.values.get("Green"), Some(&4));
    assert_eq!(color.values.get("Blue"), Some(&5));
}

#[test]
fn declarations_resolve_across_forward_references() {
    // `make` mentions A before the class exists; the declaration re-queues
    // and succeeds on a later pass.
    let (engine, _) = compile(indoc! {"
        A make() { return A(); }
        class A { public: A() { } };
    "});
    let make = find_function(&engine, "make");
    assert!(engine.function(make).body.is_some());
}

#[test]
fn unresolvable_names_are_reported_after_the_pass_loop() {
    let errors = compile_err("Missing x = 5;");
    assert!(errors.contains(&CompilerError::InvalidTypeName));
}

// -- Classes -----------------------------------------------------------------

#[test]
fn class_with_members_and_methods() {
    let (engine, _) = compile(indoc! {"
        class Point
        {
        public:
            Point(int a, int b) : x(a), y{b} { }
            int norm1() const { return x + y; }
            int x;
            int y;
        };
        int f() { Point p(1, 2); return p.norm1() + p.x; }
    "});

    let ns = engine.namespace(engine.root_namespace());
    let point = ns
        .classes
        .iter()
        .map(|&c| engine.class(c))
        .find(|c| c.name == "Point")
        .expect("Point exists");
    assert_eq!(point.data_members.len(), 2);
    assert_eq!(point.constructors.len(), 1);
    assert_eq!(point.methods.len(), 1);

    // The constructor body starts with the two member pushes.
    let ctor = point.constructors[0];
    let body = body_of(&engine, ctor);
    let mut pushes = 0;
    walk_body(&body, &mut |s| {
        if matches!(s, program::Statement::PushDataMember(_)) {
            pushes += 1;
        }
    });
    assert_eq!(pushes, 2);
}

#[test]
fn virtual_dispatch_goes_through_the_vtable() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() { }
            virtual int foo() { return 0; }
        };
        class B : A
        {
        public:
            B() { }
            int foo() { return 1; }
        };
        int bar(const A & a) { return a.foo(); }
    "});

    let ns = engine.namespace(engine.root_namespace());
    let a = ns
        .classes
        .iter()
        .map(|&c| (c, engine.class(c)))
        .find(|(_, c)| c.name == "A")
        .expect("A exists");
    let b = ns
        .classes
        .iter()
        .map(|&c| (c, engine.class(c)))
        .find(|(_, c)| c.name == "B")
        .expect("B exists");

    // B overrides A's slot.
    assert_eq!(a.1.vtable.len(), 1);
    assert_eq!(b.1.vtable.len(), 1);
    assert_ne!(a.1.vtable[0], b.1.vtable[0]);
    let override_fn = engine.function(b.1.vtable[0]);
    assert!(override_fn.flags.is_virtual);
    assert_eq!(override_fn.virtual_index, Some(0));

    // bar's IR dispatches virtually.
    let bar = find_function(&engine, "bar");
    let body = body_of(&engine, bar);
    let mut virtual_calls = 0;
    body_expressions(&body, &mut |e| {
        if let program::Expression::VirtualCall(call) = e {
            assert_eq!(call.vtable_index, 0);
            virtual_calls += 1;
        }
    });
    assert_eq!(virtual_calls, 1);
}

#[test]
fn narrowing_brace_initialization_is_rejected() {
    let errors = compile_err("int f() { int a{3.14}; return a; }");
    assert!(errors.contains(&CompilerError::NarrowingConversionInBraceInitialization));
}

#[test]
fn ambiguous_call_is_rejected() {
    let errors = compile_err(indoc! {"
        void f(float x) { }
        void f(double x) { }
        void g() { f(1); }
    "});
    assert!(errors.contains(&CompilerError::NoSuchCallee));
}

#[test]
fn member_initializer_must_name_a_member() {
    let errors = compile_err(indoc! {"
        class A
        {
        public:
            A() : z(0) { }
            int x;
        };
    "});
    assert!(errors.contains(&CompilerError::NotDataMember));
}

#[test]
fn default_member_initializers_feed_the_constructor() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() { }
            int x = 5;
            int y;
        };
    "});

    let ns = engine.namespace(engine.root_namespace());
    let a = ns
        .classes
        .iter()
        .map(|&c| engine.class(c))
        .find(|c| c.name == "A")
        .expect("A exists");
    assert!(a.data_members[0].default_value.is_some());

    // Both members get pushed: `x` from its initializer, `y` defaulted.
    let body = body_of(&engine, a.constructors[0]);
    let mut pushes = 0;
    walk_body(&body, &mut |s| {
        if matches!(s, program::Statement::PushDataMember(_)) {
            pushes += 1;
        }
    });
    assert_eq!(pushes, 2);
}

#[test]
fn delegating_constructor() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A(int n) : x(n) { }
            A() : A(0) { }
            int x;
        };
    "});

    let ns = engine.namespace(engine.root_namespace());
    let a = ns
        .classes
        .iter()
        .map(|&c| engine.class(c))
        .find(|c| c.name == "A")
        .expect("A exists");

    // The delegating constructor is a single placement call.
    let delegating = a
        .constructors
        .iter()
        .copied()
        .find(|&c| engine.function(c).prototype.param_count() == 0)
        .expect("a default constructor");
    let body = body_of(&engine, delegating);
    let mut placements = 0;
    let mut member_pushes = 0;
    walk_body(&body, &mut |s| match s {
        program::Statement::Placement(_) => placements += 1,
        program::Statement::PushDataMember(_) => member_pushes += 1,
        _ => {}
    });
    assert_eq!(placements, 1);
    assert_eq!(member_pushes, 0);
}

#[test]
fn private_members_are_inaccessible_outside() {
    let errors = compile_err(indoc! {"
        class A
        {
        public:
            A() { }
        private:
            int secret;
        };
        int f(A a) { return a.secret; }
    "});
    assert!(errors.contains(&CompilerError::InaccessibleMember));
}

#[test]
fn static_data_members_live_among_globals() {
    let (engine, script) = compile(indoc! {"
        class Counter
        {
        public:
            Counter() { }
            static int count = 7;
        };
        int f() { return Counter::count; }
    "});

    let data = engine.script(script);
    assert!(data.globals.contains_key("Counter::count"));
    assert!(data.global_inits[0].is_some());
}

#[test]
fn defaulted_special_members_are_synthesized() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() = default;
            ~A() = default;
            int x;
        };
        void f() { A a; }
    "});

    let ns = engine.namespace(engine.root_namespace());
    let a = ns
        .classes
        .iter()
        .map(|&c| engine.class(c))
        .find(|c| c.name == "A")
        .expect("A exists");

    let ctor = a.constructors[0];
    assert!(engine.function(ctor).flags.is_defaulted);
    let body = body_of(&engine, ctor);
    let mut pushes = 0;
    walk_body(&body, &mut |s| {
        if matches!(s, program::Statement::PushDataMember(_)) {
            pushes += 1;
        }
    });
    assert_eq!(pushes, 1);

    let dtor = a.destructor.expect("destructor");
    assert!(engine.function(dtor).body.is_some());
}

// -- Destructor coverage -----------------------------------------------------

#[test]
fn every_push_has_a_pop_on_scope_exit() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() { }
            ~A() { }
        };
        void f()
        {
            A a;
            {
                A b;
            }
        }
    "});

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut pushes = 0;
    let mut pops = 0;
    walk_body(&body, &mut |s| match s {
        program::Statement::PushValue(_) => pushes += 1,
        program::Statement::PopValue(p) => {
            assert!(p.destroy);
            assert!(p.destructor.is_some());
            pops += 1;
        }
        _ => {}
    });
    assert_eq!(pushes, 2);
    assert_eq!(pops, 2);
}

#[test]
fn early_return_destroys_everything_in_scope() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() { }
            ~A() { }
        };
        void f(bool c)
        {
            A a;
            if(c)
            {
                A b;
                return;
            }
        }
    "});

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut return_pops = None;
    walk_body(&body, &mut |s| {
        if let program::Statement::Return(r) = s {
            return_pops = Some(r.destruction.len());
        }
    });
    // Both `b` and `a` are destroyed on the early return path.
    assert_eq!(return_pops, Some(2));
}

#[test]
fn break_destroys_loop_locals() {
    let (engine, _) = compile(indoc! {"
        class A
        {
        public:
            A() { }
            ~A() { }
        };
        void f()
        {
            while(true)
            {
                A a;
                break;
            }
        }
    "});

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut break_pops = None;
    walk_body(&body, &mut |s| {
        if let program::Statement::Break(b) = s {
            break_pops = Some(b.destruction.len());
        }
    });
    assert_eq!(break_pops, Some(1));
}

// -- User-defined literals ---------------------------------------------------

#[test]
fn user_defined_literal_resolves_its_operator() {
    let (engine, _) = compile(indoc! {"
        double operator\"\"km(double x) { return x * 1000.0; }
        double f() { auto d = 3.0km; return d; }
    "});

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    // The literal lowers to a call of the literal operator, and `auto`
    // deduces double.
    let mut found = false;
    walk_body(&body, &mut |s| {
        if let program::Statement::PushValue(push) = s {
            assert_eq!(push.ty, Type::DOUBLE);
            found = true;
        }
    });
    assert!(found);
}

#[test]
fn unknown_literal_suffix_is_rejected() {
    let errors = compile_err("double f() { return 3.0parsecs; }");
    assert!(errors.contains(&CompilerError::CouldNotFindValidLiteralOperator));
}

// -- Operators ---------------------------------------------------------------

#[test]
fn member_operator_overload() {
    let (engine, _) = compile(indoc! {"
        class Vec
        {
        public:
            Vec(int a) : x(a) { }
            Vec operator+(const Vec & other) const { return Vec(x + other.x); }
            int x;
        };
        Vec f(Vec a, Vec b) { return a + b; }
    "});

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);
    let mut overload_calls = 0;
    body_expressions(&body, &mut |e| {
        if let program::Expression::FunctionCall(call) = e
            && engine.function(call.function).operator_id().is_some()
            && engine.function(call.function).is_member()
        {
            overload_calls += 1;
        }
    });
    assert_eq!(overload_calls, 1);
}

#[test]
fn conditional_computes_a_common_type() {
    let (engine, _) = compile("double f(bool c, int a, double b) { return c ? a : b; }");
    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);

    let mut conditional_type = None;
    body_expressions(&body, &mut |e| {
        if let program::Expression::Conditional(cond) = e {
            conditional_type = Some(cond.ty);
        }
    });
    assert_eq!(conditional_type, Some(Type::DOUBLE));
}

#[test]
fn incompatible_conditional_branches_are_rejected() {
    let errors = compile_err(indoc! {"
        class A { public: A() { } };
        class B { public: B() { } };
        void f(bool c) { c ? A() : B(); }
    "});
    assert!(errors.contains(&CompilerError::CouldNotFindCommonType));
}

// -- Namespaces & imports ----------------------------------------------------

#[test]
fn namespaces_nest_and_resolve_qualified_names() {
    let (engine, _) = compile(indoc! {"
        namespace math
        {
            double twice(double x) { return x * 2.0; }
            double pi = 3.14;
        }
        double f() { return math::twice(math::pi); }
    "});

    let root = engine.namespace(engine.root_namespace());
    let math = root.namespaces.get("math").copied().expect("math exists");
    assert_eq!(engine.namespace(math).functions.len(), 1);
    assert!(engine.namespace(math).variables.contains_key("pi"));

    let f = find_function(&engine, "f");
    assert!(engine.function(f).body.is_some());
}

#[test]
fn using_directive_injects_a_namespace() {
    let (engine, _) = compile(indoc! {"
        namespace math
        {
            double twice(double x) { return x * 2.0; }
        }
        using namespace math;
        double f() { return twice(2.0); }
    "});
    let f = find_function(&engine, "f");
    assert!(engine.function(f).body.is_some());
}

struct FixtureLoader {
    modules: Vec<(&'static str, &'static str)>,
}

impl ModuleLoader for FixtureLoader {
    fn load(&mut self, engine: &mut Engine, module_name: &str) -> crate::Result<ScriptId> {
        let source = self
            .modules
            .iter()
            .find(|(name, _)| *name == module_name)
            .map(|(_, source)| *source)
            .ok_or_else(|| Error::UnknownModule(module_name.to_owned()))?;
        engine.compile(source)
    }
}

#[test]
fn imports_go_through_the_module_loader() {
    let mut engine = Engine::new();
    engine.set_module_loader(Box::new(FixtureLoader {
        modules: vec![("geo", "double half(double x) { return x / 2.0; }")],
    }));

    let script = engine
        .compile(indoc! {"
            import geo;
            double f() { return half(4.0); }
        "})
        .expect("compiles");
    assert!(!engine.script(script).failed());
}

#[test]
fn unknown_imports_are_reported() {
    let mut engine = Engine::new();
    engine.set_module_loader(Box::new(FixtureLoader { modules: vec![] }));

    let Err(Error::CompilationFailed { diagnostics, .. }) = engine.compile("import nowhere;")
    else {
        panic!("expected failure");
    };
    assert!(diagnostics.messages().iter().any(|m| matches!(
        m.code,
        DiagnosticCode::Compiler(CompilerError::UnknownModuleName)
    )));
}

// -- Arrays ------------------------------------------------------------------

#[test]
fn array_literals_instantiate_the_array_template() {
    let mut engine = Engine::new();
    engine
        .compile("template<typename T> class Array { public: Array() { } };")
        .expect("prelude compiles");
    let array_template = engine.namespace(engine.root_namespace()).templates[0];
    engine.set_array_template(array_template);

    let script = engine
        .compile("void f() { auto xs = [1, 2, 3]; }")
        .expect("compiles");
    assert!(!engine.script(script).failed());

    let f = find_function(&engine, "f");
    let body = body_of(&engine, f);
    let mut array_exprs = 0;
    body_expressions(&body, &mut |e| {
        if let program::Expression::ArrayExpression(a) = e {
            assert_eq!(a.elements.len(), 3);
            array_exprs += 1;
        }
    });
    assert_eq!(array_exprs, 1);
}

#[test]
fn mixed_array_elements_must_convert_to_the_first() {
    let mut engine = Engine::new();
    engine
        .compile("template<typename T> class Array { public: Array() { } };")
        .expect("prelude compiles");
    let array_template = engine.namespace(engine.root_namespace()).templates[0];
    engine.set_array_template(array_template);

    let Err(Error::CompilationFailed { diagnostics, .. }) = engine.compile(indoc! {"
        class A { public: A() { } };
        void f() { auto xs = [1, A()]; }
    "}) else {
        panic!("expected failure");
    };
    assert!(diagnostics.messages().iter().any(|m| matches!(
        m.code,
        DiagnosticCode::Compiler(CompilerError::ArrayElementNotConvertible)
    )));
}

// -- Function creator --------------------------------------------------------

struct NativeStubs;

impl crate::engine::FunctionCreator for NativeStubs {
    fn create(&mut self, engine: &mut Engine, function: FunctionId, attribute: &str) -> bool {
        assert_eq!(attribute, "native_area");
        engine.function_mut(function).body =
            Some(Rc::new(program::CompoundStatement::default()));
        true
    }
}

#[test]
fn attribute_decorated_bodyless_functions_go_through_the_creator() {
    let mut engine = Engine::new();
    engine.set_function_creator(Box::new(NativeStubs));

    let script = engine
        .compile(indoc! {"
            class Shape
            {
            public:
                Shape() { }
                [[native_area]] virtual double area() = 0;
            };
        "})
        .expect("compiles");
    assert!(!engine.script(script).failed());

    let ns = engine.namespace(engine.root_namespace());
    let shape = ns
        .classes
        .iter()
        .map(|&c| engine.class(c))
        .find(|c| c.name == "Shape")
        .expect("Shape exists");
    let area = shape.methods[0];
    assert!(engine.function(area).flags.is_pure_virtual);
    assert!(engine.function(area).body.is_some(), "creator supplied a body");
}

// -- Sessions ----------------------------------------------------------------

#[test]
fn scripts_keep_their_diagnostics() {
    let mut engine = Engine::new();
    let Err(Error::CompilationFailed { script, .. }) =
        engine.compile("int f() { return unknown_name; }")
    else {
        panic!("expected failure");
    };

    assert!(engine.script(script).failed());
    assert!(engine.script(script).diagnostics.has_errors());
}

#[test]
fn diagnostic_messages_render_location_and_text() {
    let mut engine = Engine::new();
    let Err(Error::CompilationFailed { diagnostics, .. }) =
        engine.compile("int f() { int a{3.14}; return a; }")
    else {
        panic!("expected failure");
    };

    let rendered = diagnostics.messages()[0].to_string();
    insta::assert_snapshot!(rendered, @"error at 14..15: narrowing conversion in brace initialization");
}

#[test]
fn syntax_errors_become_diagnostics() {
    let mut engine = Engine::new();
    let Err(Error::CompilationFailed { script, .. }) = engine.compile("class { oops") else {
        panic!("expected failure");
    };
    assert!(engine.script(script).diagnostics.has_errors());
}

use indoc::indoc;

use crate::engine::{Engine, Error};
use crate::symbols::{TemplateArgument, TemplateKind};
use crate::types::Type;

fn compile(source: &str) -> Engine {
    let mut engine = Engine::new();
    if let Err(Error::CompilationFailed { diagnostics, .. }) = engine.compile(source) {
        panic!(
            "compilation failed:\n{}",
            diagnostics.printer(source).render()
        );
    }
    engine
}

#[test]
fn class_template_instantiates_on_demand() {
    let engine = compile(indoc! {"
        template<typename T> class Box
        {
        public:
            Box(T v) : value(v) { }
            T value;
        };
        int f() { Box<int> b(5); return b.value; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let template = root.templates[0];
    let TemplateKind::Class { instances, .. } = &engine.template(template).kind else {
        panic!("expected a class template");
    };

    assert_eq!(instances.len(), 1);
    let (args, &class) = instances.first().expect("one instance");
    assert_eq!(args, &vec![TemplateArgument::Type(Type::INT)]);

    let instance = engine.class(class);
    assert_eq!(instance.name, "Box<int>");
    assert_eq!(instance.data_members[0].ty, Type::INT);
    assert!(instance.template_instance_of.is_some());
}

#[test]
fn instantiation_is_memoized_per_argument_tuple() {
    let engine = compile(indoc! {"
        template<typename T> class Box
        {
        public:
            Box() { }
            T value;
        };
        void f() { Box<int> a; Box<int> b; Box<double> c; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Class { instances, .. } = &engine.template(root.templates[0]).kind else {
        panic!("expected a class template");
    };
    // Two distinct tuples, three uses.
    assert_eq!(instances.len(), 2);
}

#[test]
fn partial_specialization_wins_on_matching_arguments() {
    let engine = compile(indoc! {"
        template<typename T, typename U> class pair
        {
        public:
            pair() { }
            T first;
            U second;
        };
        template<typename T> class pair<T, T>
        {
        public:
            pair() { }
            T both;
        };
        void f() { pair<int, int> p; pair<int, float> q; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Class { instances, .. } = &engine.template(root.templates[0]).kind else {
        panic!("expected a class template");
    };
    assert_eq!(instances.len(), 2);

    let same = instances
        .get(&vec![
            TemplateArgument::Type(Type::INT),
            TemplateArgument::Type(Type::INT),
        ])
        .copied()
        .expect("pair<int, int> instantiated");
    let mixed = instances
        .get(&vec![
            TemplateArgument::Type(Type::INT),
            TemplateArgument::Type(Type::FLOAT),
        ])
        .copied()
        .expect("pair<int, float> instantiated");

    // `p` uses the specialization, `q` the primary.
    let same = engine.class(same);
    assert_eq!(same.data_members.len(), 1);
    assert_eq!(same.data_members[0].name, "both");

    let mixed = engine.class(mixed);
    assert_eq!(mixed.data_members.len(), 2);
    assert_eq!(mixed.data_members[0].name, "first");
}

#[test]
fn defaulted_template_parameters_fill_in() {
    let engine = compile(indoc! {"
        template<typename T, typename U = T> class wrap
        {
        public:
            wrap() { }
            T first;
            U second;
        };
        void f() { wrap<int> w; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Class { instances, .. } = &engine.template(root.templates[0]).kind else {
        panic!("expected a class template");
    };

    let (args, &class) = instances.first().expect("one instance");
    assert_eq!(
        args,
        &vec![
            TemplateArgument::Type(Type::INT),
            TemplateArgument::Type(Type::INT)
        ]
    );
    assert_eq!(engine.class(class).data_members[1].ty, Type::INT);
}

#[test]
fn function_template_deduces_from_the_call() {
    let engine = compile(indoc! {"
        template<typename T> T biggest(T a, T b) { return a > b ? a : b; }
        int f() { return biggest(3, 5); }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Function { instances, .. } = &engine.template(root.templates[0]).kind
    else {
        panic!("expected a function template");
    };

    assert_eq!(instances.len(), 1);
    let (args, &function) = instances.first().expect("one instance");
    assert_eq!(args, &vec![TemplateArgument::Type(Type::INT)]);
    assert_eq!(engine.function(function).prototype.return_type(), Type::INT);
    assert!(engine.function(function).body.is_some());
}

#[test]
fn conflicting_deduction_fails_the_call() {
    let mut engine = Engine::new();
    let result = engine.compile(indoc! {"
        template<typename T> T biggest(T a, T b) { return a > b ? a : b; }
        int f() { return biggest(3, 5.0); }
    "});
    assert!(result.is_err());
}

#[test]
fn value_parameters_participate_in_identity() {
    let engine = compile(indoc! {"
        template<typename T, int N> class small
        {
        public:
            small() { }
            T value;
        };
        void f() { small<int, 4> a; small<int, 8> b; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Class { instances, .. } = &engine.template(root.templates[0]).kind else {
        panic!("expected a class template");
    };
    assert_eq!(instances.len(), 2);
    assert!(instances.contains_key(&vec![
        TemplateArgument::Type(Type::INT),
        TemplateArgument::Int(4)
    ]));
}

#[test]
fn nested_template_arguments_parse_and_instantiate() {
    let engine = compile(indoc! {"
        template<typename T> class Box
        {
        public:
            Box() { }
            T value;
        };
        void f() { Box<Box<int>> bb; }
    "});

    let root = engine.namespace(engine.root_namespace());
    let TemplateKind::Class { instances, .. } = &engine.template(root.templates[0]).kind else {
        panic!("expected a class template");
    };
    // Box<int> plus Box<Box<int>>.
    assert_eq!(instances.len(), 2);
}

#[cfg(test)]
mod typing_tests {
    use std::rc::Rc;

    use gris::error::GrisError;
    use gris::types::{ClassId, FunctionType, Type, TypeTag};

    fn check(source: &str) -> Result<(), GrisError> {
        let statements = gris::parse(source).expect("parse");
        gris::analyze(&statements).map(|_| ())
    }

    fn assert_ok(source: &str) {
        if let Err(e) = check(source) {
            panic!("expected {:?} to type-check, got: {}", source, e);
        }
    }

    fn type_err(source: &str) -> String {
        match check(source) {
            Ok(()) => panic!("expected a type error for {:?}", source),
            Err(e) => {
                assert!(matches!(e, GrisError::Type(_)), "wrong kind: {:?}", e);
                e.message()
            }
        }
    }

    // ─── compatibility rule ───

    #[test]
    fn test_match_rule() {
        let a = ClassId::new(0, "A");
        let b = ClassId::new(1, "A");

        assert!(Type::Number.matches(&Type::Number));
        assert!(!Type::Number.matches(&Type::String));

        // Nominal: same name, different declarations.
        assert!(Type::Instance(a.clone()).matches(&Type::Instance(a.clone())));
        assert!(!Type::Instance(a.clone()).matches(&Type::Instance(b)));
        assert!(!Type::Instance(a.clone()).matches(&Type::Class(a)));

        // Generic accepts any listed tag, from either side.
        let numeric = Type::Generic(vec![TypeTag::Number]);
        assert!(numeric.matches(&Type::Number));
        assert!(Type::Number.matches(&numeric));
        assert!(!numeric.matches(&Type::Void));
        assert!(Type::any().matches(&Type::Void));

        // Functions compare structurally.
        let f = Type::Function(Rc::new(FunctionType::new("f", vec![Type::Number], Type::Void)));
        let g = Type::Function(Rc::new(FunctionType::new("g", vec![Type::Number], Type::Void)));
        let h = Type::Function(Rc::new(FunctionType::new("h", vec![], Type::Void)));
        assert!(f.matches(&g));
        assert!(!f.matches(&h));
    }

    // ─── operators ───

    #[test]
    fn test_arithmetic_requires_numbers() {
        assert_ok("1 + 2;");
        assert_ok("val n: Number = 2 ^ 3 % 2;");
        assert_eq!(type_err("1 + \"a\";"), "Right of operator '+' is not a Number");
        assert_eq!(type_err("true * 2;"), "Left of operator '*' is not a Number");
    }

    #[test]
    fn test_relational_yields_boolean() {
        assert_ok("val b: Boolean = 1 < 2;");
        assert!(type_err("val n: Number = 1 < 2;").contains("cannot be initialized"));
    }

    #[test]
    fn test_equality_requires_matching_types() {
        assert_ok("val b: Boolean = \"a\" == \"b\";");
        assert!(type_err("1 == \"1\";").starts_with("Left, type 'Number'"));
    }

    #[test]
    fn test_logical_and_unary() {
        assert_ok("!(true and false or true);");
        assert_ok("-(1);");
        assert_eq!(type_err("true and 1;"), "Right expression is not a Boolean");
        assert_eq!(type_err("!1;"), "Unary '!' requires a Boolean");
        assert_eq!(type_err("-\"a\";"), "Unary '-' requires a Number");
    }

    #[test]
    fn test_ternary() {
        assert_ok("val s: String = 1 < 2 ? \"a\" : \"b\";");
        assert_eq!(type_err("1 ? 1 : 2;"), "Ternary condition is not a Boolean");
        assert!(type_err("true ? 1 : \"a\";").starts_with("Ternary branches"));
    }

    #[test]
    fn test_conditions_must_be_boolean() {
        assert_ok("if (1 < 2) {} while (false) {}");
        assert!(type_err("if (1) {}").starts_with("Condition must be a Boolean"));
        assert!(type_err("while (\"x\") {}").starts_with("Condition must be a Boolean"));
    }

    // ─── declarations ───

    #[test]
    fn test_val_declared_type_must_match_initializer() {
        assert_ok("val a: Number = 1; val b = a + 1;");
        assert_ok("val v: Void = null;");
        type_err("val a: Number = \"s\";");
        type_err("val a = 1; val b: String = a;");
    }

    #[test]
    fn test_assignment() {
        assert_ok("val a = 1; a = 2;");
        type_err("val a = 1; a = \"two\";");
        assert!(type_err("def f() {} f = 1;").starts_with("Cannot assign to 'f'"));
        assert!(type_err("class A {} A = 1;").starts_with("Cannot assign to 'A'"));
    }

    #[test]
    fn test_return_types() {
        assert_ok("def f() -> Boolean { return 1 > 0; }");
        assert!(type_err("def f() -> Boolean { return 1; }").starts_with("Return type 'Number'"));
        assert_ok("def g() { return; }");
        type_err("def g() { return 1; }");
        assert_ok("def h(a: Number) -> Number { if (a < 0) return -a; return a; }");
    }

    #[test]
    fn test_calls() {
        assert_ok("def f(a: Number, b: String) -> Number { return a; } val n: Number = f(1, \"x\");");
        assert!(type_err("def f(a: Number) {} f(\"x\");").starts_with("Arguments do not match"));
        type_err("def f(a: Number) {} f();");
        assert!(type_err("val a = 1; a();").contains("is not callable"));
    }

    #[test]
    fn test_builtins() {
        assert_ok("println(1); println(\"s\"); print(true); println(null);");
        assert_ok("val n: Number = abs(-1) + len(\"abc\"); val c: String = charAt(\"ab\", 0);");
        type_err("abs(\"x\");");
        type_err("len(1);");
        type_err("charAt(\"ab\");");
        type_err("println();");
    }

    #[test]
    fn test_recursion_sees_own_signature() {
        assert_ok("def fib(n: Number) -> Number { if (n < 2) return n; return fib(n - 1) + fib(n - 2); }");
    }

    // ─── classes ───

    #[test]
    fn test_class_annotations_are_nominal() {
        assert_ok("class A {} val a: A = A();");
        type_err("class A {} class B {} val a: A = B();");
        assert_eq!(
            type_err("val n = 1; val a: n = 1;"),
            "Type 'n' does not name a class (found 'Number')"
        );
    }

    #[test]
    fn test_class_can_name_itself_in_signatures() {
        assert_ok("class Node { link(other: Node) -> Node { return other; } } val n: Node = Node().link(Node());");
    }

    #[test]
    fn test_constructor_arguments() {
        let class = "class A { constructor(x: Number) { this.x = x; } } ";

        assert_ok(&format!("{}A(1);", class));
        type_err(&format!("{}A();", class));
        type_err(&format!("{}A(\"x\");", class));

        // Inherited constructor.
        assert_ok(&format!("{}class B < A {{}} B(2);", class));

        // No constructor anywhere: zero arguments.
        assert_ok("class C {} C();");
        type_err("class C {} C(1);");
    }

    #[test]
    fn test_only_methods_visible_outside_class() {
        let class = "class A { constructor(x: Number) { this.x = x; } get() -> Number { return this.x; } } val a = A(1); ";

        assert_ok(&format!("{}val n: Number = a.get();", class));
        assert!(type_err(&format!("{}a.x;", class)).contains("does not have property 'x'"));
    }

    #[test]
    fn test_fields_visible_in_subclass_methods() {
        assert_ok(
            "class A { constructor() { this.x = 1; } } \
             class B < A { twice() -> Number { return this.x * 2; } }",
        );
    }

    #[test]
    fn test_property_set_rules() {
        assert!(
            type_err("class A { m() {} } val a = A(); a.m = 1;").starts_with("Cannot assign to method")
        );
        assert!(type_err("val a = 1; a.x = 2;").contains("is not an instance"));
        assert_ok("class A {} val a = A(); a.x = 2;");
    }

    #[test]
    fn test_super_methods() {
        assert_ok(
            "class A { m() -> Number { return 1; } } \
             class B < A { m() -> Number { return super.m() + 1; } }",
        );
        assert!(type_err(
            "class A {} class B < A { m() { super.missing(); } }"
        )
        .contains("does not have method 'missing'"));
    }

    #[test]
    fn test_superclass_must_be_a_class() {
        assert!(type_err("val A = 1; class B < A {}").starts_with("Superclass must be a class"));
    }

    #[test]
    fn test_this_is_an_instance_of_the_class() {
        assert_ok("class A { me() -> A { return this; } }");
        type_err("class A { me() -> Number { return this; } }");
    }

    #[test]
    fn test_static_errors_stop_before_running() {
        let errors = gris::check("val s: String = 1;").expect_err("type error");
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].exit_code(), 65);
        assert_eq!(
            errors[0].diagnostic().map(|d| d.source_line.as_str()),
            Some("val s: String = 1;")
        );
    }
}

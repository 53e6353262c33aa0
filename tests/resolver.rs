#[cfg(test)]
mod resolver_tests {
    use gris::ast::{Expr, Stmt};
    use gris::error::GrisError;
    use gris::resolver::{Locals, Resolver};

    fn resolve(source: &str) -> Result<Locals, GrisError> {
        let statements = gris::parse(source).expect("parse");
        Resolver::new().resolve(&statements)
    }

    fn resolve_err(source: &str) -> String {
        match resolve(source) {
            Ok(_) => panic!("expected a resolve error for {:?}", source),
            Err(e) => {
                assert!(matches!(e, GrisError::Resolve(_)), "wrong kind: {:?}", e);
                e.message()
            }
        }
    }

    #[test]
    fn test_duplicate_global_declaration() {
        assert_eq!(
            resolve_err("val a = 1; val a = 2;"),
            "Already a variable with this name in this scope"
        );
    }

    #[test]
    fn test_duplicate_regardless_of_kind() {
        assert_eq!(
            resolve_err("val a: Number = 1; def a() {}"),
            "Already a variable with this name in this scope"
        );
        assert_eq!(
            resolve_err("class A {} val A = 1;"),
            "Already a variable with this name in this scope"
        );
    }

    #[test]
    fn test_duplicate_local_and_parameter() {
        resolve_err("{ val a = 1; val a = 2; }");
        resolve_err("def f(a: Number, a: Number) {}");
        resolve_err("def f(a: Number) { val a = 1; }");
    }

    #[test]
    fn test_shadowing_in_nested_scope_is_allowed() {
        assert!(resolve("val a = 1; { val a = 2; { val a = 3; } }").is_ok());
    }

    #[test]
    fn test_builtins_cannot_be_redeclared() {
        resolve_err("val println = 1;");
    }

    #[test]
    fn test_self_reference_in_initializer() {
        assert_eq!(
            resolve_err("val x: Number = x;"),
            "Can't read local variable in its own initializer"
        );
        resolve_err("val x = 1; { val x = x; }");
    }

    #[test]
    fn test_class_cannot_inherit_from_itself() {
        assert_eq!(
            resolve_err("class A < A {}"),
            "Class can't inherit from itself"
        );
    }

    #[test]
    fn test_local_class_rejected() {
        assert_eq!(
            resolve_err("{ class A {} }"),
            "Class declared in local scope"
        );
        resolve_err("def f() { class A {} }");
    }

    #[test]
    fn test_this_and_super_misuse() {
        assert_eq!(resolve_err("this;"), "'this' outside of a class");
        assert_eq!(resolve_err("def f() { super.m(); }"), "'super' outside of class");
        assert_eq!(
            resolve_err("class A { m() { super.m(); } }"),
            "'super' in a class with no superclass"
        );
    }

    #[test]
    fn test_return_rules() {
        assert_eq!(
            resolve_err("return;"),
            "Can't return from top-level code"
        );
        assert_eq!(
            resolve_err("class A { constructor() { return 1; } }"),
            "Can't return a value from an initializer"
        );

        // A bare return in a constructor and a value return in a nested function are fine.
        assert!(resolve("class A { constructor() { return; } }").is_ok());
        assert!(resolve("class A { constructor() { def f() -> Number { return 1; } } }").is_ok());
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(resolve_err("y;"), "Undefined variable");
        assert_eq!(resolve_err("val a: Missing = 1;"), "Undefined variable");
    }

    #[test]
    fn test_globals_have_no_distance() {
        let locals = resolve("val a = 1; a; def f() { a; println(a); }").expect("resolve");
        assert!(locals.is_empty());
    }

    #[test]
    fn test_local_distances() {
        let statements = gris::parse("{ val a = 1; { a; } }").expect("parse");
        let locals = Resolver::new().resolve(&statements).expect("resolve");

        let reference = match &statements[0] {
            Stmt::Block(outer) => match &outer[1] {
                Stmt::Block(inner) => match &inner[0] {
                    Stmt::Expression(Expr::Variable(reference)) => reference.clone(),
                    other => panic!("unexpected {:?}", other),
                },
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(locals.get(reference.id), Some(1));
        assert_eq!(locals.len(), 1);
    }

    #[test]
    fn test_parameters_and_body_share_a_frame() {
        let statements = gris::parse("def f(a: Number) { val b = a; b; }").expect("parse");
        let locals = Resolver::new().resolve(&statements).expect("resolve");

        let body = match &statements[0] {
            Stmt::Function(decl) => &decl.body,
            other => panic!("unexpected {:?}", other),
        };

        let a = match &body[0] {
            Stmt::Val {
                initializer: Some(Expr::Variable(reference)),
                ..
            } => reference.id,
            other => panic!("unexpected {:?}", other),
        };

        assert_eq!(locals.get(a), Some(0));
    }

    #[test]
    fn test_this_and_super_distances() {
        let source = "class A { m() {} } class B < A { m() { this; super.m(); } }";
        let statements = gris::parse(source).expect("parse");
        let locals = Resolver::new().resolve(&statements).expect("resolve");

        let body = match &statements[1] {
            Stmt::Class(decl) => &decl.methods[0].body,
            other => panic!("unexpected {:?}", other),
        };

        let this = match &body[0] {
            Stmt::Expression(Expr::This(reference)) => reference.id,
            other => panic!("unexpected {:?}", other),
        };

        let sup = match &body[1] {
            Stmt::Expression(Expr::Call { callee, .. }) => match callee.as_ref() {
                Expr::Super { keyword, .. } => keyword.id,
                other => panic!("unexpected {:?}", other),
            },
            other => panic!("unexpected {:?}", other),
        };

        // method frame (0) → `this` frame (1) → `super` frame (2)
        assert_eq!(locals.get(this), Some(1));
        assert_eq!(locals.get(sup), Some(2));
    }

    #[test]
    fn test_error_rendering_includes_source_line() {
        let errors = gris::check("val a = 1;\nval a = 2;").expect_err("duplicate");

        assert_eq!(
            errors[0].to_string(),
            format!(
                "[Resolving Error] Already a variable with this name in this scope\n\t2:5 | val a = 2;\n\t{}^",
                " ".repeat(10)
            )
        );
        assert_eq!(errors[0].exit_code(), 65);
    }
}

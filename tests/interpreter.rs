#[cfg(test)]
mod interpreter_tests {
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    use gris::error::GrisError;

    /// Output sink the test keeps a handle to after the interpreter takes ownership.
    #[derive(Clone, Default)]
    struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

    impl SharedBuffer {
        fn contents(&self) -> String {
            String::from_utf8(self.0.borrow().clone()).expect("utf-8 output")
        }
    }

    impl Write for SharedBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(source: &str) -> String {
        let output = SharedBuffer::default();

        if let Err(errors) = gris::run(source, Box::new(output.clone())) {
            panic!("program failed: {}", errors[0]);
        }

        output.contents()
    }

    /// Runs a program expected to fail; returns the error and what was printed before it.
    fn run_err(source: &str) -> (GrisError, String) {
        let output = SharedBuffer::default();

        match gris::run(source, Box::new(output.clone())) {
            Ok(()) => panic!("expected {:?} to fail", source),
            Err(mut errors) => (errors.remove(0), output.contents()),
        }
    }

    // ─── expressions ───

    #[test]
    fn test_arithmetic() {
        let expected = "7\n3.5\n1\n-4\n";
        let output = run("println(1 + 2 * 3); println(7 / 2); println(7 % 3); println(-(2 + 2));");
        assert_eq!(expected, output);
    }

    #[test]
    fn test_exponent_truncates_operands() {
        let expected = "1024\n-8\n0.5\n4\n";
        let output = run("println(2 ^ 10); println((-2) ^ 3); println(2 ^ -1); println(2.9 ^ 2.9);");
        assert_eq!(expected, output);
    }

    #[test]
    fn test_division_by_zero_follows_ieee() {
        assert_eq!("inf\n", run("println(1 / 0);"));
    }

    #[test]
    fn test_comparison_and_equality() {
        let expected = "true\nfalse\ntrue\ntrue\nfalse\n";
        let output = run(
            "println(1 < 2); println(2 <= 1); println(\"a\" == \"a\"); println(1 != 2); println(true == false);",
        );
        assert_eq!(expected, output);
    }

    #[test]
    fn test_logical_short_circuit() {
        let source = "
            def boom() -> Boolean { println(\"boom\"); return true; }
            println(false and boom());
            println(true or boom());
            println(true and boom());
        ";

        assert_eq!("false\ntrue\nboom\ntrue\n", run(source));
    }

    #[test]
    fn test_ternary() {
        assert_eq!(
            "yes\nno\n",
            run("println(1 < 2 ? \"yes\" : \"no\"); println(1 > 2 ? \"yes\" : \"no\");")
        );
    }

    // ─── built-ins ───

    #[test]
    fn test_builtins() {
        let expected = "3\n5\ne\n";
        let output = run("println(abs(-3)); println(len(\"hello\")); println(charAt(\"hello\", 1));");
        assert_eq!(expected, output);
    }

    #[test]
    fn test_print_and_println() {
        let expected = "a1true\nVoid\n2.5\n";
        let output = run("print(\"a\"); print(1); println(true); println(null); println(2.5);");
        assert_eq!(expected, output);
    }

    #[test]
    fn test_value_rendering() {
        let source = "
            class P {}
            def f() {}
            println(P);
            println(P());
            println(f);
            println(println);
            val v: Number;
            println(v);
        ";

        assert_eq!("P\n<P instance>\nf\n<built-in println>\nVoid\n", run(source));
    }

    // ─── statements and scope ───

    #[test]
    fn test_loops() {
        let source = "
            for (val i = 0; i < 3; i = i + 1) print(i);
            println(\"\");
            val n = 3;
            while (n > 0) { print(n); n = n - 1; }
            println(\"\");
        ";

        assert_eq!("012\n321\n", run(source));
    }

    #[test]
    fn test_block_scoping_and_shadowing() {
        let source = "
            val a = \"outer\";
            {
                val a = \"inner\";
                println(a);
            }
            println(a);
        ";

        assert_eq!("inner\nouter\n", run(source));
    }

    #[test]
    fn test_closures_bind_statically() {
        let source = "
            val a = \"global\";
            {
                def show() { println(a); }
                show();
                val a = \"block\";
                show();
            }
        ";

        assert_eq!("global\nglobal\n", run(source));
    }

    #[test]
    fn test_closure_sees_later_assignment() {
        let source = "
            val x = 1;
            def show() { println(x); }
            x = 2;
            show();
        ";

        assert_eq!("2\n", run(source));
    }

    #[test]
    fn test_nested_function_captures_enclosing_local() {
        let source = "
            def outer() -> Number {
                val a = 10;
                def inner() -> Number { return a + 1; }
                return inner();
            }
            println(outer());
        ";

        assert_eq!("11\n", run(source));
    }

    #[test]
    fn test_recursion() {
        let source = "
            def fib(n: Number) -> Number {
                if (n < 2) return n;
                return fib(n - 1) + fib(n - 2);
            }
            println(fib(10));
        ";

        assert_eq!("55\n", run(source));
    }

    #[test]
    fn test_early_return_restores_environment() {
        let source = "
            def find() -> Number {
                val i = 0;
                while (true) {
                    i = i + 1;
                    { if (i == 3) return i; }
                }
                return 0;
            }
            println(find());
            val after = 5;
            println(after);
        ";

        assert_eq!("3\n5\n", run(source));
    }

    #[test]
    fn test_function_without_return_yields_void() {
        assert_eq!("Void\n", run("def f() {} println(f());"));
    }

    // ─── classes ───

    #[test]
    fn test_fields_and_methods() {
        let source = "
            class Counter {
                constructor(start: Number) { this.count = start; }
                increment() -> Number { this.count = this.count + 1; return this.count; }
            }
            val c = Counter(10);
            c.increment();
            println(c.increment());
        ";

        assert_eq!("12\n", run(source));
    }

    #[test]
    fn test_inherited_constructor_through_super() {
        let source = "
            class A {
                constructor(x: Number) -> Void { this.x = x; }
                getX() -> Number { return this.x; }
            }
            class B < A {
                constructor(x: Number) -> Void { super.constructor(x); }
            }
            val b = B(5);
            println(b.getX());
        ";

        assert_eq!("5\n", run(source));
    }

    #[test]
    fn test_constructor_inherited_without_override() {
        let source = "
            class A { constructor(x: Number) { this.x = x; } getX() -> Number { return this.x; } }
            class B < A {}
            println(B(7).getX());
        ";

        assert_eq!("7\n", run(source));
    }

    #[test]
    fn test_super_keeps_original_receiver() {
        let source = "
            class A {
                name() -> String { return \"A\"; }
                describe() -> String { return this.name(); }
            }
            class B < A {
                name() -> String { return \"B\"; }
                describe() -> String { return super.describe(); }
            }
            println(B().describe());
        ";

        assert_eq!("B\n", run(source));
    }

    #[test]
    fn test_method_lookup_walks_ancestors() {
        let source = "
            class A { hello() -> String { return \"hello from A\"; } }
            class B < A {}
            class C < B {}
            println(C().hello());
        ";

        assert_eq!("hello from A\n", run(source));
    }

    #[test]
    fn test_initializer_always_yields_instance() {
        let source = "
            class A {
                constructor(x: Number) { this.x = x; return; }
                getX() -> Number { return this.x; }
            }
            val a = A(1);
            println(a.constructor(7));
            println(a.getX());
        ";

        assert_eq!("<A instance>\n7\n", run(source));
    }

    #[test]
    fn test_bound_method_remembers_receiver() {
        let source = "
            class A {
                constructor(n: String) { this.n = n; }
                name() -> String { return this.n; }
            }
            val first = A(\"first\");
            val second = A(\"second\");
            val method = first.name;
            println(method());
            println(second.name());
        ";

        assert_eq!("first\nsecond\n", run(source));
    }

    #[test]
    fn test_instance_identity() {
        let source = "
            class A {}
            val a = A();
            val b = A();
            println(a == b);
            println(a == a);
        ";

        assert_eq!("false\ntrue\n", run(source));
    }

    // ─── failures ───

    #[test]
    fn test_static_error_prevents_execution() {
        let (err, output) = run_err("println(\"x\"); val a = 1; val a = 2;");

        assert!(matches!(err, GrisError::Resolve(_)));
        assert_eq!("", output);
    }

    #[test]
    fn test_char_at_out_of_range_is_runtime_error() {
        let (err, output) = run_err("println(\"before\"); charAt(\"abc\", 5);");

        assert!(matches!(err, GrisError::Runtime(_)));
        assert!(err.message().contains("out of range"));
        assert_eq!(err.exit_code(), 70);
        assert_eq!("before\n", output);
    }

    #[test]
    fn test_void_operand_is_runtime_error() {
        let (err, _) = run_err("val v: Number; println(v + 1);");

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Operands of '+' must be Numbers, got Void and Number");
        assert_eq!(
            err.diagnostic().map(|d| (d.line, d.col, d.source_line.as_str())),
            Some((1, 26, "val v: Number; println(v + 1);"))
        );
    }

    #[test]
    fn test_char_at_rejects_non_finite_index() {
        let (err, _) = run_err("charAt(\"abc\", 0 / 0);");

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Index NaN out of range for string of length 3");
    }

    // Field reads inside a class type-check as `Any`, so these only fail at runtime.

    #[test]
    fn test_undefined_field_is_runtime_error() {
        let source = "
            class A { m() -> Number { return this.missing; } }
            println(\"pre\");
            A().m();
        ";

        let (err, output) = run_err(source);

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Undefined property 'missing'");
        assert_eq!(err.diagnostic().map(|d| d.line), Some(2));
        assert_eq!(err.exit_code(), 70);
        assert_eq!("pre\n", output);
    }

    #[test]
    fn test_calling_a_number_field_is_runtime_error() {
        let source = "
            class A {
                constructor() { this.f = 1; }
                m() { this.f(); }
            }
            println(\"pre\");
            A().m();
        ";

        let (err, output) = run_err(source);

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Can only call functions and classes, got Number");
        assert_eq!(err.exit_code(), 70);
        assert_eq!("pre\n", output);
    }

    #[test]
    fn test_field_function_arity_is_checked_at_runtime() {
        let source = "
            def g(x: Number) {}
            class A {
                constructor() { this.f = g; }
                m() { this.f(); }
            }
            println(\"pre\");
            A().m();
        ";

        let (err, output) = run_err(source);

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Expected 1 arguments but got 0");
        assert_eq!(err.exit_code(), 70);
        assert_eq!("pre\n", output);
    }

    #[test]
    fn test_string_field_in_arithmetic_is_runtime_error() {
        let source = "
            class A {
                constructor() { this.s = \"x\"; }
                m() -> Number { return this.s + 1; }
            }
            println(\"pre\");
            A().m();
        ";

        let (err, output) = run_err(source);

        assert!(matches!(err, GrisError::Runtime(_)));
        assert_eq!(err.message(), "Operands of '+' must be Numbers, got String and Number");
        assert_eq!(err.exit_code(), 70);
        assert_eq!("pre\n", output);
    }
}

#[cfg(test)]
mod parser_tests {
    use gris::ast::{Expr, Stmt};
    use gris::ast_printer::AstPrinter;
    use gris::error::GrisError;

    fn print(source: &str) -> Vec<String> {
        let statements = gris::parse(source)
            .unwrap_or_else(|errors| panic!("parse failed: {:?}", errors));

        statements.iter().map(AstPrinter::print_stmt).collect()
    }

    fn parse_errors(source: &str) -> Vec<GrisError> {
        match gris::parse(source) {
            Ok(statements) => panic!("expected parse errors, got {:?}", statements),
            Err(errors) => errors,
        }
    }

    #[test]
    fn test_precedence_exponent_binds_tighter_than_factor() {
        assert_eq!(
            print("1 + 2 * 3 ^ 2;"),
            vec!["(expr (+ 1.0 (* 2.0 (^ 3.0 2.0))))"]
        );
    }

    #[test]
    fn test_unary_binds_tighter_than_exponent() {
        assert_eq!(print("-2 ^ 3;"), vec!["(expr (^ (- 2.0) 3.0))"]);
    }

    #[test]
    fn test_binary_levels_are_left_associative() {
        assert_eq!(print("1 - 2 - 3;"), vec!["(expr (- (- 1.0 2.0) 3.0))"]);
        assert_eq!(print("8 % 3 / 2;"), vec!["(expr (/ (% 8.0 3.0) 2.0))"]);
    }

    #[test]
    fn test_ternary_is_right_associative_and_below_or() {
        assert_eq!(
            print("a or b ? c : d ? e : f;"),
            vec!["(expr (?: (or a b) c (?: d e f)))"]
        );
    }

    #[test]
    fn test_assignment_and_property_set() {
        assert_eq!(
            print("a = b = 1; obj.field = 2;"),
            vec!["(expr (= a (= b 1.0)))", "(expr (.= obj field 2.0))"]
        );
    }

    #[test]
    fn test_call_chain_and_super() {
        assert_eq!(
            print("a.b(1, \"s\").c; super.m;"),
            vec![
                "(expr (. (call (. a b) 1.0 \"s\") c))",
                "(expr (super m))"
            ]
        );
    }

    #[test]
    fn test_val_forms() {
        assert_eq!(
            print("val a: Number = 1; val b = true; val c: String; val d = null;"),
            vec![
                "(val a: Number 1.0)",
                "(val b true)",
                "(val c: String)",
                "(val d null)"
            ]
        );
    }

    #[test]
    fn test_function_declaration() {
        assert_eq!(
            print("def f(a: Number, b: Point) -> Boolean { return true; }"),
            vec!["(def f (a: Number, b: Point) -> Boolean (block (return true)))"]
        );

        // The return type defaults to Void.
        assert_eq!(print("def g() { return; }"), vec!["(def g () -> Void (block (return)))"]);
    }

    #[test]
    fn test_class_declaration() {
        assert_eq!(
            print("class B < A { constructor(x: Number) { this.x = x; } m() {} }"),
            vec![
                "(class B < A (def constructor (x: Number) -> Void (block (expr (.= this x x)))) (def m () -> Void (block)))"
            ]
        );
    }

    #[test]
    fn test_for_desugars_to_while() {
        assert_eq!(
            print("for (val i = 0; i < 3; i = i + 1) println(i);"),
            vec![
                "(block (val i 0.0) (while (< i 3.0) (block (expr (call println i)) (expr (= i (+ i 1.0))))))"
            ]
        );

        assert_eq!(print("for (;;) x;"), vec!["(while true (expr x))"]);
    }

    #[test]
    fn test_if_else_and_while() {
        assert_eq!(
            print("if (a) b; else { c; } while (d) e;"),
            vec![
                "(if a (expr b) (block (expr c)))",
                "(while d (expr e))"
            ]
        );
    }

    #[test]
    fn test_errors_accumulate_across_statements() {
        let errors = parse_errors("val = 1;\nval y = ;\nval z = 3;");

        assert_eq!(errors.len(), 2);
        assert!(errors.iter().all(|e| matches!(e, GrisError::Parse(_))));
        assert_eq!(errors[0].message(), "Expected variable name");
        assert_eq!(errors[1].message(), "Expected expression");
        assert_eq!(errors[1].diagnostic().map(|d| d.line), Some(2));
        assert_eq!(
            errors[1].diagnostic().map(|d| d.source_line.as_str()),
            Some("val y = ;")
        );
    }

    #[test]
    fn test_invalid_assignment_target() {
        let errors = parse_errors("1 = 2;");

        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].message(), "Invalid assignment target");
    }

    #[test]
    fn test_val_requires_type_or_initializer() {
        let errors = parse_errors("val x;");

        assert_eq!(
            errors[0].message(),
            "Expected a type annotation or an initializer"
        );
    }

    #[test]
    fn test_parameters_require_types() {
        let errors = parse_errors("def f(a) {}");

        assert_eq!(errors[0].message(), "Expected ':' after parameter name");
    }

    #[test]
    fn test_too_many_arguments() {
        let args = vec!["1"; 256].join(", ");
        let errors = parse_errors(&format!("f({});", args));

        assert_eq!(errors[0].message(), "No more than 255 arguments");
    }

    #[test]
    fn test_references_get_distinct_ids() {
        let statements = gris::parse("a; a;").expect("parse");

        let ids: Vec<_> = statements
            .iter()
            .map(|stmt| match stmt {
                Stmt::Expression(Expr::Variable(reference)) => reference.id,
                other => panic!("unexpected statement {:?}", other),
            })
            .collect();

        assert_ne!(ids[0], ids[1]);
    }
}

use crate::ast::{Expr, LiteralValue, Stmt, TypeExpr};

/// Converts parsed statements and expressions to a parenthesised prefix form,
/// used by `gris parse`.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", Self::print(expr)),

            Stmt::Val {
                name,
                type_expr,
                initializer,
            } => {
                let mut s = format!("(val {}", name.lexeme);
                if let Some(t) = type_expr {
                    s.push_str(": ");
                    s.push_str(&Self::print_type(t));
                }
                if let Some(init) = initializer {
                    s.push(' ');
                    s.push_str(&Self::print(init));
                }
                s.push(')');
                s
            }

            Stmt::Block(statements) => Self::print_block(statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
                ..
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch),
                    Self::print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(condition),
                    Self::print_stmt(then_branch)
                ),
            },

            Stmt::While {
                condition, body, ..
            } => format!(
                "(while {} {})",
                Self::print(condition),
                Self::print_stmt(body)
            ),

            Stmt::Function(decl) => {
                let params: Vec<String> = decl
                    .params
                    .iter()
                    .map(|p| format!("{}: {}", p.name.lexeme, Self::print_type(&p.type_expr)))
                    .collect();
                let ret = decl
                    .return_type
                    .as_ref()
                    .map_or_else(|| "Void".to_string(), Self::print_type);

                format!(
                    "(def {} ({}) -> {} {})",
                    decl.name.lexeme,
                    params.join(", "),
                    ret,
                    Self::print_block(&decl.body)
                )
            }

            Stmt::Return { value, .. } => match value {
                Some(v) => format!("(return {})", Self::print(v)),
                None => "(return)".into(),
            },

            Stmt::Class(decl) => {
                let mut s = format!("(class {}", decl.name.lexeme);
                if let Some(superclass) = &decl.superclass {
                    s.push_str(" < ");
                    s.push_str(&superclass.name.lexeme);
                }
                for method in &decl.methods {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(&Stmt::Function(method.clone())));
                }
                s.push(')');
                s
            }
        }
    }

    fn print_block(statements: &[Stmt]) -> String {
        let mut s = String::from("(block");
        for stmt in statements {
            s.push(' ');
            s.push_str(&Self::print_stmt(stmt));
        }
        s.push(')');
        s
    }

    fn print_type(type_expr: &TypeExpr) -> String {
        match type_expr {
            TypeExpr::Boolean => "Boolean".into(),
            TypeExpr::Number => "Number".into(),
            TypeExpr::String => "String".into(),
            TypeExpr::Void => "Void".into(),
            TypeExpr::Named(reference) => reference.name.lexeme.clone(),
        }
    }

    pub fn print(expr: &Expr) -> String {
        match expr {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal { value, .. } => match value {
                LiteralValue::Bool(b) => b.to_string(),

                LiteralValue::Null => "null".into(),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(right))
            }

            // ── binary / logical operator ───────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(left),
                Self::print(right)
            ),

            Expr::Ternary {
                condition,
                then_branch,
                else_branch,
                ..
            } => format!(
                "(?: {} {} {})",
                Self::print(condition),
                Self::print(then_branch),
                Self::print(else_branch)
            ),

            Expr::Variable(reference) => reference.name.lexeme.clone(),

            Expr::Assign { target, value } => {
                format!("(= {} {})", target.name.lexeme, Self::print(value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => format!("(. {} {})", Self::print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(object),
                name.lexeme,
                Self::print(value)
            ),

            Expr::This(_) => "this".into(),

            Expr::Super { method, .. } => format!("(super {})", method.lexeme),
        }
    }
}

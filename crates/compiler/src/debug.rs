//! AST debug printer.
//!
//! Deterministic, indented, leaves-last rendering of a parsed program.
//! Used by tests to snapshot parser output and by `deltac ast` for
//! diagnostics. No line numbers appear in the output, so two programs
//! differing only in whitespace print identically.

use crate::ast::{
    Binary, Expr, ExternDecl, FunctionDecl, IfChain, IfStatement, Program, Scope, Statement, Term,
};

const NODE_PREFIX: &str = "- ";

/// Render the whole program.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    node(&mut out, 0, "Node Program");

    node(&mut out, 1, "Externals");
    for ext in &program.externs {
        print_extern(&mut out, ext, 2);
    }

    node(&mut out, 1, "Functions");
    for func in &program.functions {
        print_function(&mut out, func, 2);
    }

    node(&mut out, 1, "Statements");
    for stmt in &program.statements {
        print_statement(&mut out, stmt, 2);
    }

    out
}

fn node(out: &mut String, depth: usize, text: &str) {
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(NODE_PREFIX);
    out.push_str(text);
    out.push('\n');
}

fn print_extern(out: &mut String, ext: &ExternDecl, depth: usize) {
    let mut params: Vec<String> = ext.params.iter().map(|t| t.name().to_string()).collect();
    if ext.is_variadic {
        params.push("...".to_string());
    }
    node(
        out,
        depth,
        &format!(
            "External \"{} {}({})\"",
            ext.return_type.name(),
            ext.name,
            params.join(", ")
        ),
    );
}

fn print_function(out: &mut String, func: &FunctionDecl, depth: usize) {
    let params: Vec<String> = func
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty.name(), p.name))
        .collect();
    node(
        out,
        depth,
        &format!(
            "Define \"{} {}({})\"",
            func.return_type.name(),
            func.name,
            params.join(", ")
        ),
    );
    print_scope(out, func.body, depth + 1);
}

fn print_scope(out: &mut String, scope: &Scope, depth: usize) {
    for stmt in scope.statements {
        print_statement(out, stmt, depth);
    }
}

fn print_statement(out: &mut String, stmt: &Statement, depth: usize) {
    match stmt {
        Statement::Exit { expr, .. } => {
            node(out, depth, "Exit");
            print_expr(out, expr, depth + 1);
        }
        Statement::Let {
            name,
            ty,
            is_const,
            expr,
            ..
        } => {
            let constness = if *is_const { "const " } else { "" };
            node(
                out,
                depth,
                &format!("Let {}\"{} {}\"", constness, ty.name(), name),
            );
            print_expr(out, expr, depth + 1);
        }
        Statement::Assign { name, expr, .. } => {
            node(out, depth, &format!("Assign \"{}\"", name));
            print_expr(out, expr, depth + 1);
        }
        Statement::If(if_stmt) => print_if(out, if_stmt, depth),
        Statement::While { cond, body, .. } => {
            node(out, depth, "While");
            node(out, depth + 1, "Expression");
            print_expr(out, cond, depth + 2);
            node(out, depth + 1, "Scope");
            print_scope(out, body, depth + 2);
        }
        Statement::Return { expr, .. } => {
            node(out, depth, "Return");
            if let Some(expr) = expr {
                print_expr(out, expr, depth + 1);
            }
        }
        Statement::Scope(scope) => print_scope(out, scope, depth),
        Statement::Expression(expr) => print_expr(out, expr, depth),
        Statement::PointerAssign { ptr, value, .. } => {
            node(out, depth, "Pointer Assign");
            node(out, depth + 1, "Pointer Expression");
            print_expr(out, ptr, depth + 2);
            node(out, depth + 1, "Value Expression");
            print_expr(out, value, depth + 2);
        }
        Statement::ArrayAssign {
            array,
            index,
            value,
            ..
        } => {
            node(out, depth, "Array Assign");
            node(out, depth + 1, "Array Expression");
            print_expr(out, array, depth + 2);
            node(out, depth + 1, "Index Expression");
            print_expr(out, index, depth + 2);
            node(out, depth + 1, "Value Expression");
            print_expr(out, value, depth + 2);
        }
    }
}

fn print_if(out: &mut String, if_stmt: &IfStatement, depth: usize) {
    node(out, depth, "If");
    node(out, depth + 1, "Expression");
    print_expr(out, if_stmt.cond, depth + 2);
    node(out, depth + 1, "Scope");
    print_scope(out, if_stmt.scope, depth + 2);
    if let Some(chain) = if_stmt.chain {
        print_chain(out, chain, depth);
    }
}

fn print_chain(out: &mut String, chain: &IfChain, depth: usize) {
    match chain {
        IfChain::Elif {
            cond,
            scope,
            chain,
            ..
        } => {
            node(out, depth, "Elif");
            node(out, depth + 1, "Expression");
            print_expr(out, cond, depth + 2);
            node(out, depth + 1, "Scope");
            print_scope(out, scope, depth + 2);
            if let Some(chain) = chain {
                print_chain(out, chain, depth);
            }
        }
        IfChain::Else { scope } => {
            node(out, depth, "Else");
            node(out, depth + 1, "Scope");
            print_scope(out, scope, depth + 2);
        }
    }
}

fn print_expr(out: &mut String, expr: &Expr, depth: usize) {
    match expr {
        Expr::Term(term) => print_term(out, term, depth),
        Expr::Binary(binary) => print_binary(out, binary, depth),
    }
}

fn print_binary(out: &mut String, binary: &Binary, depth: usize) {
    node(out, depth, &format!("Binary \"{}\"", binary.op.symbol()));
    print_expr(out, binary.lhs, depth + 1);
    print_expr(out, binary.rhs, depth + 1);
}

fn print_term(out: &mut String, term: &Term, depth: usize) {
    match term {
        Term::IntLiteral { value, .. } => node(out, depth, &format!("Literal: {}", value)),
        Term::FloatLiteral { value, .. } => node(out, depth, &format!("Literal: {}f", value)),
        Term::DoubleLiteral { value, .. } => node(out, depth, &format!("Literal: {}", value)),
        Term::StringLiteral { value, .. } => {
            node(out, depth, &format!("Literal: \"{}\"", escape(value)));
        }
        Term::Identifier { name, .. } => node(out, depth, &format!("Variable \"{}\"", name)),
        // Parentheses are transparent in the printed tree
        Term::Paren { expr } => print_expr(out, expr, depth),
        Term::Call { name, args, .. } => {
            node(out, depth, &format!("Call \"{}\"", name));
            for arg in *args {
                print_expr(out, arg, depth + 1);
            }
        }
        Term::Cast { target, expr, .. } => {
            node(out, depth, &format!("Cast {}", target.name()));
            print_expr(out, expr, depth + 1);
        }
        Term::AddressOf { name, .. } => {
            node(out, depth, &format!("Address of \"{}\"", name));
        }
        Term::Deref { expr, .. } => {
            node(out, depth, "Dereference");
            print_expr(out, expr, depth + 1);
        }
        Term::ArrayAccess { array, index, .. } => {
            node(out, depth, "Array Access");
            node(out, depth + 1, "Array Expression");
            print_expr(out, array, depth + 2);
            node(out, depth + 1, "Index Expression");
            print_expr(out, index, depth + 2);
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;
    use bumpalo::Bump;

    fn print(source: &str) -> String {
        let arena = Bump::new();
        let tokens = Lexer::new(source).tokenize().unwrap();
        let program = Parser::new(tokens, &arena).parse().unwrap();
        print_program(&program)
    }

    #[test]
    fn test_snapshot_small_program() {
        let printed = print("fn main() -> int { let x: int = 1 + 2; return x; }");
        let expected = "\
- Node Program
\t- Externals
\t- Functions
\t\t- Define \"int32 main()\"
\t\t\t- Let \"int32 x\"
\t\t\t\t- Binary \"+\"
\t\t\t\t\t- Literal: 1
\t\t\t\t\t- Literal: 2
\t\t\t- Return
\t\t\t\t- Variable \"x\"
\t- Statements
";
        assert_eq!(printed, expected);
    }

    #[test]
    fn test_whitespace_insensitive() {
        let a = print("fn f(a: int) -> int { if (a > 0) { return 1; } else { return 0; } }");
        let b = print("fn f(a:int)->int{\n  if(a>0){return 1;}\n  else{return 0;}\n}");
        assert_eq!(a, b);
    }

    #[test]
    fn test_deterministic() {
        let source = "external void draw(int, int);\nfn main() -> int { draw(1, 2); return 0; }";
        assert_eq!(print(source), print(source));
    }

    #[test]
    fn test_string_literals_escaped() {
        let printed = print("fn main() { log(\"a\\nb\"); }");
        assert!(printed.contains("- Literal: \"a\\nb\""));
    }

    #[test]
    fn test_paren_is_transparent() {
        let with_paren = print("fn f() -> int { return (1 + 2); }");
        let without = print("fn f() -> int { return 1 + 2; }");
        assert_eq!(with_paren, without);
    }

    #[test]
    fn test_pointer_statements_print() {
        let printed = print("fn f() { *p = 1; a[0] = 2; let q: int* = &v; }");
        assert!(printed.contains("- Pointer Assign"));
        assert!(printed.contains("- Array Assign"));
        assert!(printed.contains("- Address of \"v\""));
    }
}

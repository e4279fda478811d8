//! Whole-module emission.
//!
//! Assembles the final IR text: target triple and datalayout, `declare`
//! lines for every source-declared external plus each built-in the
//! program actually calls, one global per pooled string literal, the
//! function definitions, and the fixed metadata epilogue.

use super::platform::{target_datalayout, target_triple};
use super::state::FunctionEntry;
use super::CodeGen;
use crate::ast::{Expr, ExternDecl, FunctionDecl, IfChain, Program, Scope, Statement, Term};
use crate::error::CompileError;
use crate::types::DataType;
use std::fmt::Write as _;

impl CodeGen {
    /// Compile a program to one textual LLVM module.
    pub fn codegen_program(&mut self, program: &Program) -> Result<String, CompileError> {
        for ext in &program.externs {
            self.register_extern(ext)?;
        }
        for func in &program.functions {
            self.register_function(func)?;
        }

        // Top-level statements become the implicit entry point; a module
        // with neither is fine (the link step decides whether `main` is
        // required).
        if program.find_function("main").is_some() && !program.statements.is_empty() {
            return Err(CompileError::semantic(
                "top-level statements conflict with an explicit 'main' function",
                program.statements[0].line(),
            ));
        }

        // Pre-pass: pool string literals in first-occurrence order so all
        // globals can sit at the top of the module.
        self.collect_strings(program);

        for func in &program.functions {
            self.emit_function(func)?;
        }
        if !program.statements.is_empty() {
            self.emit_implicit_main(&program.statements)?;
        }

        self.assemble_module()
    }

    fn register_extern(&mut self, ext: &ExternDecl) -> Result<(), CompileError> {
        for &param in ext.params {
            if param == DataType::Void {
                return Err(CompileError::semantic(
                    format!("parameter of '{}' has type 'void'", ext.name),
                    ext.line,
                ));
            }
        }

        let entry = FunctionEntry {
            name: ext.name.to_string(),
            params: ext.params.to_vec(),
            return_type: ext.return_type,
            is_external: true,
            is_variadic: ext.is_variadic,
        };

        if let Some(existing) = self.lookup_function(ext.name) {
            // Re-declaring a known external (a built-in, or a repeated
            // include) is fine when the signatures agree.
            if *existing == entry {
                if !self.declared_externs.iter().any(|n| n == ext.name) {
                    self.declared_externs.push(ext.name.to_string());
                }
                return Ok(());
            }
            return Err(CompileError::semantic(
                format!("conflicting declaration of '{}'", ext.name),
                ext.line,
            ));
        }

        self.functions.push(entry);
        self.declared_externs.push(ext.name.to_string());
        Ok(())
    }

    fn register_function(&mut self, func: &FunctionDecl) -> Result<(), CompileError> {
        if self.lookup_function(func.name).is_some() {
            return Err(CompileError::semantic(
                format!("duplicate declaration of '{}'", func.name),
                func.line,
            ));
        }
        for param in func.params {
            if param.ty == DataType::Void {
                return Err(CompileError::semantic(
                    format!("parameter '{}' has type 'void'", param.name),
                    param.line,
                ));
            }
        }
        self.functions.push(FunctionEntry {
            name: func.name.to_string(),
            params: func.params.iter().map(|p| p.ty).collect(),
            return_type: func.return_type,
            is_external: false,
            is_variadic: false,
        });
        Ok(())
    }

    fn assemble_module(&mut self) -> Result<String, CompileError> {
        let mut ir = String::new();
        writeln!(ir, "; ModuleID = 'delta'")?;
        writeln!(ir, "target triple = \"{}\"", target_triple(self.target))?;
        writeln!(
            ir,
            "target datalayout = \"{}\"",
            target_datalayout(self.target)
        )?;
        writeln!(ir)?;

        // Every declare precedes any call: source externals first (in
        // declaration order), then the built-ins the program used (in
        // registration order).
        let mut declares: Vec<String> = self.declared_externs.clone();
        for entry in &self.functions {
            if entry.is_external
                && self.called_externals.contains(&entry.name)
                && !declares.iter().any(|n| *n == entry.name)
            {
                declares.push(entry.name.clone());
            }
        }
        for name in &declares {
            let entry = self
                .lookup_function(name)
                .ok_or_else(|| CompileError::internal(format!("undeclarable external '{}'", name)))?;
            let mut params: Vec<String> = entry
                .params
                .iter()
                .map(|p| p.llvm_name().to_string())
                .collect();
            if entry.is_variadic {
                params.push("...".to_string());
            }
            writeln!(
                ir,
                "declare {} @{}({})",
                entry.return_type.llvm_name(),
                entry.name,
                params.join(", ")
            )?;
        }
        if !declares.is_empty() {
            writeln!(ir)?;
        }

        for (index, literal) in self.string_pool.iter().enumerate() {
            writeln!(
                ir,
                "@str.{} = private unnamed_addr constant [{} x i8] c\"{}\\00\"",
                index,
                literal.len() + 1,
                escape_ir_string(literal)?
            )?;
        }
        if !self.string_pool.is_empty() {
            writeln!(ir)?;
        }

        ir.push_str(&self.output);

        writeln!(ir, "!llvm.ident = !{{!0}}")?;
        writeln!(
            ir,
            "!0 = !{{!\"{} {}\"}}",
            crate::COMPILER_NAME,
            env!("CARGO_PKG_VERSION")
        )?;
        Ok(ir)
    }

    // ---------------------------------------------------------------
    // String-literal pre-pass
    // ---------------------------------------------------------------

    fn collect_strings(&mut self, program: &Program) {
        for func in &program.functions {
            self.collect_scope(func.body);
        }
        for stmt in &program.statements {
            self.collect_statement(stmt);
        }
    }

    fn collect_scope(&mut self, scope: &Scope) {
        for stmt in scope.statements {
            self.collect_statement(stmt);
        }
    }

    fn collect_statement(&mut self, stmt: &Statement) {
        match stmt {
            Statement::Exit { expr, .. }
            | Statement::Assign { expr, .. }
            | Statement::Let { expr, .. }
            | Statement::Expression(expr) => self.collect_expr(expr),
            Statement::If(if_stmt) => {
                self.collect_expr(if_stmt.cond);
                self.collect_scope(if_stmt.scope);
                let mut chain = if_stmt.chain;
                while let Some(link) = chain {
                    match link {
                        IfChain::Elif {
                            cond, scope, chain: next, ..
                        } => {
                            self.collect_expr(cond);
                            self.collect_scope(scope);
                            chain = *next;
                        }
                        IfChain::Else { scope } => {
                            self.collect_scope(scope);
                            chain = None;
                        }
                    }
                }
            }
            Statement::While { cond, body, .. } => {
                self.collect_expr(cond);
                self.collect_scope(body);
            }
            Statement::Return { expr, .. } => {
                if let Some(expr) = expr {
                    self.collect_expr(expr);
                }
            }
            Statement::Scope(scope) => self.collect_scope(scope),
            Statement::PointerAssign { ptr, value, .. } => {
                self.collect_expr(ptr);
                self.collect_expr(value);
            }
            Statement::ArrayAssign {
                array,
                index,
                value,
                ..
            } => {
                self.collect_expr(array);
                self.collect_expr(index);
                self.collect_expr(value);
            }
        }
    }

    fn collect_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Term(term) => self.collect_term(term),
            Expr::Binary(binary) => {
                self.collect_expr(binary.lhs);
                self.collect_expr(binary.rhs);
            }
        }
    }

    fn collect_term(&mut self, term: &Term) {
        match term {
            Term::StringLiteral { value, .. } => {
                self.intern_string(value);
            }
            Term::Paren { expr } => self.collect_expr(expr),
            Term::Call { args, .. } => {
                for arg in *args {
                    self.collect_expr(arg);
                }
            }
            Term::Cast { expr, .. } | Term::Deref { expr, .. } => self.collect_expr(expr),
            Term::ArrayAccess { array, index, .. } => {
                self.collect_expr(array);
                self.collect_expr(index);
            }
            Term::IntLiteral { .. }
            | Term::FloatLiteral { .. }
            | Term::DoubleLiteral { .. }
            | Term::Identifier { .. }
            | Term::AddressOf { .. } => {}
        }
    }
}

/// Escape a string for an LLVM `c"..."` constant. Printable characters
/// pass through; quotes, backslashes and control characters become
/// two-digit hex escapes.
fn escape_ir_string(s: &str) -> Result<String, std::fmt::Error> {
    let mut result = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            ' '..='!' | '#'..='[' | ']'..='~' => result.push(ch),
            '\\' => result.push_str(r"\5C"),
            '"' => result.push_str(r"\22"),
            '\n' => result.push_str(r"\0A"),
            '\r' => result.push_str(r"\0D"),
            '\t' => result.push_str(r"\09"),
            _ => {
                for byte in ch.to_string().as_bytes() {
                    write!(result, r"\{:02X}", byte)?;
                }
            }
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_ir_string() {
        assert_eq!(escape_ir_string("Hello %s\n").unwrap(), r"Hello %s\0A");
        assert_eq!(escape_ir_string("a\"b\\c").unwrap(), r"a\22b\5Cc");
        assert_eq!(escape_ir_string("tab\there").unwrap(), r"tab\09here");
    }
}

//! Statement and function emission.
//!
//! Control flow is built from `bbN` labels allocated by the per-function
//! block counter. After a terminator (`ret`, `unreachable`, `br`) the
//! emitter tracks that the block is closed; a following statement opens
//! a fresh block so every label is terminated exactly once.

use super::state::Binding;
use super::CodeGen;
use crate::ast::{Expr, FunctionDecl, IfChain, IfStatement, Scope, Statement};
use crate::error::CompileError;
use crate::types::DataType;
use std::fmt::Write as _;

impl CodeGen {
    pub(super) fn emit_function(&mut self, func: &FunctionDecl) -> Result<(), CompileError> {
        self.temp_counter = 0;
        self.block_counter = 0;
        self.block_terminated = false;
        self.current_return_type = func.return_type;

        let signature: Vec<String> = func
            .params
            .iter()
            .enumerate()
            .map(|(i, p)| format!("{} %a{}", p.ty.llvm_name(), i))
            .collect();
        writeln!(
            self.output,
            "define {} @{}({}) {{",
            func.return_type.llvm_name(),
            func.name,
            signature.join(", ")
        )?;
        writeln!(self.output, "entry:")?;

        self.push_scope();

        // Incoming values get a stack slot; the alloca register becomes
        // the parameter's storage handle.
        for (i, param) in func.params.iter().enumerate() {
            let slot = self.fresh_temp();
            writeln!(
                self.output,
                "  {} = alloca {}, align {}",
                slot,
                param.ty.llvm_name(),
                param.ty.alignment()
            )?;
            writeln!(
                self.output,
                "  store {} %a{}, {}* {}, align {}",
                param.ty.llvm_name(),
                i,
                param.ty.llvm_name(),
                slot,
                param.ty.alignment()
            )?;
            self.declare_binding(
                Binding {
                    name: param.name.to_string(),
                    ty: param.ty,
                    is_const: false,
                    storage: slot,
                },
                param.line,
            )?;
        }

        self.emit_scope(func.body)?;
        self.pop_scope();

        if !self.block_terminated {
            self.emit_default_return()?;
        }
        writeln!(self.output, "}}")?;
        writeln!(self.output)?;
        Ok(())
    }

    /// Top-level statements become the body of an implicit `@main`
    /// returning `i32 0` when control falls off the end.
    pub(super) fn emit_implicit_main(
        &mut self,
        statements: &[&Statement],
    ) -> Result<(), CompileError> {
        self.temp_counter = 0;
        self.block_counter = 0;
        self.block_terminated = false;
        self.current_return_type = DataType::Int32;

        writeln!(self.output, "define i32 @main() {{")?;
        writeln!(self.output, "entry:")?;
        self.push_scope();
        for stmt in statements {
            self.emit_statement(stmt)?;
        }
        self.pop_scope();
        if !self.block_terminated {
            self.emit_default_return()?;
        }
        writeln!(self.output, "}}")?;
        writeln!(self.output)?;
        Ok(())
    }

    fn emit_default_return(&mut self) -> Result<(), CompileError> {
        let ty = self.current_return_type;
        match ty {
            DataType::Void => writeln!(self.output, "  ret void")?,
            t if t.is_integer() => writeln!(self.output, "  ret {} 0", t.llvm_name())?,
            t if t.is_float() => {
                writeln!(self.output, "  ret {} 0x0000000000000000", t.llvm_name())?;
            }
            t => writeln!(self.output, "  ret {} null", t.llvm_name())?,
        }
        self.block_terminated = true;
        Ok(())
    }

    pub(super) fn emit_scope(&mut self, scope: &Scope) -> Result<(), CompileError> {
        self.push_scope();
        for stmt in scope.statements {
            self.emit_statement(stmt)?;
        }
        self.pop_scope();
        Ok(())
    }

    pub(super) fn emit_statement(&mut self, stmt: &Statement) -> Result<(), CompileError> {
        self.ensure_block_open()?;
        match stmt {
            Statement::Exit { expr, line } => {
                let ty = self.expr_type(expr)?;
                let value = self.emit_expression(expr)?;
                let value = self.coerce(&value, ty, DataType::Int32, *line)?;
                self.called_externals.insert("exit".to_string());
                writeln!(self.output, "  call void @exit(i32 {})", value)?;
                writeln!(self.output, "  unreachable")?;
                self.block_terminated = true;
            }
            Statement::Let {
                name,
                ty,
                is_const,
                expr,
                line,
            } => {
                if *ty == DataType::Void {
                    return Err(CompileError::semantic(
                        format!("cannot declare variable '{}' of type 'void'", name),
                        *line,
                    ));
                }
                if self.bound_in_current_scope(name) {
                    return Err(CompileError::semantic(
                        format!("redeclaration of '{}'", name),
                        *line,
                    ));
                }
                let slot = self.fresh_temp();
                writeln!(
                    self.output,
                    "  {} = alloca {}, align {}",
                    slot,
                    ty.llvm_name(),
                    ty.alignment()
                )?;
                let value_ty = self.expr_type(expr)?;
                let value = self.emit_expression(expr)?;
                let value = self.coerce(&value, value_ty, *ty, *line)?;
                writeln!(
                    self.output,
                    "  store {} {}, {}* {}, align {}",
                    ty.llvm_name(),
                    value,
                    ty.llvm_name(),
                    slot,
                    ty.alignment()
                )?;
                self.declare_binding(
                    Binding {
                        name: name.to_string(),
                        ty: *ty,
                        is_const: *is_const,
                        storage: slot,
                    },
                    *line,
                )?;
            }
            Statement::Assign { name, expr, line } => {
                let binding = self.lookup(name).ok_or_else(|| {
                    CompileError::semantic(
                        format!("assignment to undeclared identifier '{}'", name),
                        *line,
                    )
                })?;
                if binding.is_const {
                    return Err(CompileError::semantic(
                        format!("assignment to constant '{}'", name),
                        *line,
                    ));
                }
                let (ty, storage) = (binding.ty, binding.storage.clone());
                let value_ty = self.expr_type(expr)?;
                let value = self.emit_expression(expr)?;
                let value = self.coerce(&value, value_ty, ty, *line)?;
                writeln!(
                    self.output,
                    "  store {} {}, {}* {}, align {}",
                    ty.llvm_name(),
                    value,
                    ty.llvm_name(),
                    storage,
                    ty.alignment()
                )?;
            }
            Statement::If(if_stmt) => self.emit_if(if_stmt)?,
            Statement::While { cond, body, .. } => self.emit_while(cond, body)?,
            Statement::Return { expr, line } => {
                let ret = self.current_return_type;
                match expr {
                    None => {
                        if ret != DataType::Void {
                            return Err(CompileError::semantic(
                                format!("missing return value in function returning '{}'", ret),
                                *line,
                            ));
                        }
                        writeln!(self.output, "  ret void")?;
                    }
                    Some(expr) => {
                        if ret == DataType::Void {
                            return Err(CompileError::semantic(
                                "returning a value from a void function",
                                *line,
                            ));
                        }
                        let ty = self.expr_type(expr)?;
                        let value = self.emit_expression(expr)?;
                        let value = self.coerce(&value, ty, ret, *line)?;
                        writeln!(self.output, "  ret {} {}", ret.llvm_name(), value)?;
                    }
                }
                self.block_terminated = true;
            }
            Statement::Scope(scope) => self.emit_scope(scope)?,
            Statement::Expression(expr) => {
                // Result, if any, is discarded.
                self.emit_expression(expr)?;
            }
            Statement::PointerAssign { ptr, value, line } => {
                let ptr_ty = self.expr_type(ptr)?;
                let pointee = ptr_ty.pointee().ok_or_else(|| {
                    CompileError::semantic(
                        format!("cannot assign through a value of type '{}'", ptr_ty),
                        *line,
                    )
                })?;
                if pointee == DataType::Void {
                    return Err(CompileError::semantic(
                        "cannot assign through 'void*'",
                        *line,
                    ));
                }
                let pointer = self.emit_expression(ptr)?;
                let value_ty = self.expr_type(value)?;
                let value = self.emit_expression(value)?;
                let value = self.coerce(&value, value_ty, pointee, *line)?;
                writeln!(
                    self.output,
                    "  store {} {}, {}* {}, align {}",
                    pointee.llvm_name(),
                    value,
                    pointee.llvm_name(),
                    pointer,
                    pointee.alignment()
                )?;
            }
            Statement::ArrayAssign {
                array,
                index,
                value,
                line,
            } => {
                let (pointer, element) = self.emit_element_ptr(array, index, *line)?;
                let value_ty = self.expr_type(value)?;
                let value = self.emit_expression(value)?;
                let value = self.coerce(&value, value_ty, element, *line)?;
                writeln!(
                    self.output,
                    "  store {} {}, {}* {}, align {}",
                    element.llvm_name(),
                    value,
                    element.llvm_name(),
                    pointer,
                    element.alignment()
                )?;
            }
        }
        Ok(())
    }

    /// Open a fresh (unreachable) block when the previous statement
    /// terminated the current one. Keeps trailing statements after a
    /// `return` legal without breaking block-termination invariants.
    fn ensure_block_open(&mut self) -> Result<(), CompileError> {
        if self.block_terminated {
            let label = self.fresh_block();
            writeln!(self.output, "{}:", label)?;
            self.block_terminated = false;
        }
        Ok(())
    }

    /// Materialize any value as an `i1` by comparing against zero.
    fn emit_condition(&mut self, expr: &Expr) -> Result<String, CompileError> {
        let ty = self.expr_type(expr)?;
        let value = self.emit_expression(expr)?;
        let temp = self.fresh_temp();
        if ty.is_float() {
            writeln!(
                self.output,
                "  {} = fcmp one {} {}, 0x0000000000000000",
                temp,
                ty.llvm_name(),
                value
            )?;
        } else if ty.is_integer() {
            writeln!(
                self.output,
                "  {} = icmp ne {} {}, 0",
                temp,
                ty.llvm_name(),
                value
            )?;
        } else if ty.is_pointer() {
            writeln!(
                self.output,
                "  {} = icmp ne {} {}, null",
                temp,
                ty.llvm_name(),
                value
            )?;
        } else {
            return Err(CompileError::semantic(
                format!("cannot use a '{}' value as a condition", ty),
                expr.line(),
            ));
        }
        Ok(temp)
    }

    fn emit_if(&mut self, if_stmt: &IfStatement) -> Result<(), CompileError> {
        let merge = self.fresh_block();
        self.emit_if_arm(if_stmt.cond, if_stmt.scope, if_stmt.chain, &merge)?;
        writeln!(self.output, "{}:", merge)?;
        self.block_terminated = false;
        Ok(())
    }

    /// One `if`/`elif` arm: branch on the condition, emit the taken
    /// scope, then recurse into the rest of the chain. All arms jump to
    /// the shared merge label.
    fn emit_if_arm(
        &mut self,
        cond: &Expr,
        scope: &Scope,
        chain: Option<&IfChain>,
        merge: &str,
    ) -> Result<(), CompileError> {
        let cond_val = self.emit_condition(cond)?;
        let then_label = self.fresh_block();
        let next_label = match chain {
            Some(_) => self.fresh_block(),
            None => merge.to_string(),
        };

        writeln!(
            self.output,
            "  br i1 {}, label %{}, label %{}",
            cond_val, then_label, next_label
        )?;

        writeln!(self.output, "{}:", then_label)?;
        self.block_terminated = false;
        self.emit_scope(scope)?;
        if !self.block_terminated {
            writeln!(self.output, "  br label %{}", merge)?;
            self.block_terminated = true;
        }

        if let Some(chain) = chain {
            writeln!(self.output, "{}:", next_label)?;
            self.block_terminated = false;
            match chain {
                IfChain::Elif {
                    cond,
                    scope,
                    chain,
                    ..
                } => self.emit_if_arm(cond, scope, *chain, merge)?,
                IfChain::Else { scope } => {
                    self.emit_scope(scope)?;
                    if !self.block_terminated {
                        writeln!(self.output, "  br label %{}", merge)?;
                        self.block_terminated = true;
                    }
                }
            }
        }
        Ok(())
    }

    /// Three labels: condition, body, exit. The condition block is
    /// re-entered from the body, so the loop header gets an explicit
    /// unconditional branch first.
    fn emit_while(&mut self, cond: &Expr, body: &Scope) -> Result<(), CompileError> {
        let cond_label = self.fresh_block();
        let body_label = self.fresh_block();
        let exit_label = self.fresh_block();

        writeln!(self.output, "  br label %{}", cond_label)?;
        writeln!(self.output, "{}:", cond_label)?;
        self.block_terminated = false;
        let cond_val = self.emit_condition(cond)?;
        writeln!(
            self.output,
            "  br i1 {}, label %{}, label %{}",
            cond_val, body_label, exit_label
        )?;

        writeln!(self.output, "{}:", body_label)?;
        self.block_terminated = false;
        self.emit_scope(body)?;
        if !self.block_terminated {
            writeln!(self.output, "  br label %{}", cond_label)?;
        }

        writeln!(self.output, "{}:", exit_label)?;
        self.block_terminated = false;
        Ok(())
    }
}

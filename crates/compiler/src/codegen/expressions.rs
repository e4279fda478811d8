//! Expression emission and type inference.
//!
//! Emission returns the name of the IR value holding the result: a
//! literal rendered inline, a `%tN` temporary, or a loaded value. Types
//! are inferred lazily into the write-once cache keyed by node identity.

use super::CodeGen;
use crate::ast::{Binary, BinaryOp, Expr, Term};
use crate::error::CompileError;
use crate::types::DataType;
use std::fmt::Write as _;

impl CodeGen {
    /// Inferred type of an expression, from the cache when available.
    pub(super) fn expr_type(&mut self, expr: &Expr) -> Result<DataType, CompileError> {
        let key = expr as *const Expr as usize;
        if let Some(&ty) = self.expr_types.get(&key) {
            return Ok(ty);
        }
        let ty = match expr {
            Expr::Term(term) => self.term_type(term)?,
            Expr::Binary(binary) => self.binary_type(binary)?,
        };
        self.expr_types.insert(key, ty);
        Ok(ty)
    }

    fn binary_type(&mut self, binary: &Binary) -> Result<DataType, CompileError> {
        let lhs = self.expr_type(binary.lhs)?;
        let rhs = self.expr_type(binary.rhs)?;
        let common = DataType::common_type(lhs, rhs).ok_or_else(|| {
            CompileError::semantic(
                format!(
                    "invalid operands to binary '{}' ('{}' and '{}')",
                    binary.op.symbol(),
                    lhs,
                    rhs
                ),
                binary.line,
            )
        })?;
        // Comparisons produce a 32-bit boolean regardless of operand type.
        if binary.op.is_comparison() {
            Ok(DataType::Int32)
        } else {
            Ok(common)
        }
    }

    fn term_type(&mut self, term: &Term) -> Result<DataType, CompileError> {
        match term {
            // Integer literals type uniformly as i32.
            Term::IntLiteral { .. } => Ok(DataType::Int32),
            Term::FloatLiteral { .. } => Ok(DataType::Float32),
            Term::DoubleLiteral { .. } => Ok(DataType::Float64),
            Term::StringLiteral { .. } => Ok(DataType::Int8Ptr),
            Term::Identifier { name, line } => self
                .lookup(name)
                .map(|b| b.ty)
                .ok_or_else(|| {
                    CompileError::semantic(
                        format!("use of undeclared identifier '{}'", name),
                        *line,
                    )
                }),
            Term::Paren { expr } => self.expr_type(expr),
            Term::Call { name, line, .. } => self
                .lookup_function(name)
                .map(|f| f.return_type)
                .ok_or_else(|| {
                    CompileError::semantic(format!("call to unknown function '{}'", name), *line)
                }),
            Term::Cast { target, .. } => Ok(*target),
            Term::AddressOf { name, line } => {
                let ty = self
                    .lookup(name)
                    .map(|b| b.ty)
                    .ok_or_else(|| {
                        CompileError::semantic(
                            format!("use of undeclared identifier '{}'", name),
                            *line,
                        )
                    })?;
                ty.pointer_to().ok_or_else(|| {
                    CompileError::semantic(
                        format!("cannot take the address of '{}': no pointer type for '{}'", name, ty),
                        *line,
                    )
                })
            }
            Term::Deref { expr, line } => {
                let ty = self.expr_type(expr)?;
                let pointee = ty.pointee().ok_or_else(|| {
                    CompileError::semantic(
                        format!("cannot dereference a value of type '{}'", ty),
                        *line,
                    )
                })?;
                if pointee == DataType::Void {
                    return Err(CompileError::semantic("cannot dereference 'void*'", *line));
                }
                Ok(pointee)
            }
            Term::ArrayAccess { array, line, .. } => {
                let ty = self.expr_type(array)?;
                let element = ty.pointee().ok_or_else(|| {
                    CompileError::semantic(
                        format!("subscripted value has non-pointer type '{}'", ty),
                        *line,
                    )
                })?;
                if element == DataType::Void {
                    return Err(CompileError::semantic("cannot index 'void*'", *line));
                }
                Ok(element)
            }
        }
    }

    pub(super) fn emit_expression(&mut self, expr: &Expr) -> Result<String, CompileError> {
        match expr {
            Expr::Term(term) => self.emit_term(term),
            Expr::Binary(binary) => self.emit_binary(binary),
        }
    }

    fn emit_term(&mut self, term: &Term) -> Result<String, CompileError> {
        match term {
            // Literal text stands in for itself; no instruction.
            Term::IntLiteral { value, .. } => Ok((*value).to_string()),
            Term::FloatLiteral { value, line } => {
                let parsed: f32 = value.parse().map_err(|_| {
                    CompileError::semantic(format!("invalid float literal '{}'", value), *line)
                })?;
                Ok(format!("0x{:016X}", (parsed as f64).to_bits()))
            }
            Term::DoubleLiteral { value, line } => {
                let parsed: f64 = value.parse().map_err(|_| {
                    CompileError::semantic(format!("invalid double literal '{}'", value), *line)
                })?;
                Ok(format!("0x{:016X}", parsed.to_bits()))
            }
            Term::StringLiteral { value, .. } => {
                let index = self.intern_string(value);
                let len = value.len() + 1;
                let temp = self.fresh_temp();
                writeln!(
                    self.output,
                    "  {} = getelementptr inbounds [{} x i8], [{} x i8]* @str.{}, i64 0, i64 0",
                    temp, len, len, index
                )?;
                Ok(temp)
            }
            Term::Identifier { name, line } => {
                let (ty, storage) = self.binding_of(name, *line)?;
                let temp = self.fresh_temp();
                writeln!(
                    self.output,
                    "  {} = load {}, {}* {}, align {}",
                    temp,
                    ty.llvm_name(),
                    ty.llvm_name(),
                    storage,
                    ty.alignment()
                )?;
                Ok(temp)
            }
            Term::Paren { expr } => self.emit_expression(expr),
            Term::Call { name, args, line } => self.emit_call(name, args, *line),
            Term::Cast { target, expr, line } => {
                let from = self.expr_type(expr)?;
                let value = self.emit_expression(expr)?;
                self.emit_conversion(&value, from, *target, *line)
            }
            // The address of a binding is its alloca register; no load.
            Term::AddressOf { name, line } => {
                let (_, storage) = self.binding_of(name, *line)?;
                Ok(storage)
            }
            Term::Deref { expr, .. } => {
                let pointee = self.term_type(term)?;
                let pointer = self.emit_expression(expr)?;
                let temp = self.fresh_temp();
                writeln!(
                    self.output,
                    "  {} = load {}, {}* {}, align {}",
                    temp,
                    pointee.llvm_name(),
                    pointee.llvm_name(),
                    pointer,
                    pointee.alignment()
                )?;
                Ok(temp)
            }
            Term::ArrayAccess {
                array,
                index,
                line,
            } => {
                let (pointer, element) = self.emit_element_ptr(array, index, *line)?;
                let temp = self.fresh_temp();
                writeln!(
                    self.output,
                    "  {} = load {}, {}* {}, align {}",
                    temp,
                    element.llvm_name(),
                    element.llvm_name(),
                    pointer,
                    element.alignment()
                )?;
                Ok(temp)
            }
        }
    }

    /// `getelementptr` to one element of `array` at `index`. Returns the
    /// element pointer register and the element type.
    pub(super) fn emit_element_ptr(
        &mut self,
        array: &Expr,
        index: &Expr,
        line: usize,
    ) -> Result<(String, DataType), CompileError> {
        let array_ty = self.expr_type(array)?;
        let element = array_ty.pointee().ok_or_else(|| {
            CompileError::semantic(
                format!("subscripted value has non-pointer type '{}'", array_ty),
                line,
            )
        })?;
        if element == DataType::Void {
            return Err(CompileError::semantic("cannot index 'void*'", line));
        }

        let index_ty = self.expr_type(index)?;
        if !index_ty.is_integer() {
            return Err(CompileError::semantic(
                format!("array index has non-integer type '{}'", index_ty),
                line,
            ));
        }

        let array_val = self.emit_expression(array)?;
        let index_val = self.emit_expression(index)?;
        let index64 = self.emit_conversion(&index_val, index_ty, DataType::Int64, line)?;

        let temp = self.fresh_temp();
        writeln!(
            self.output,
            "  {} = getelementptr {}, {}* {}, i64 {}",
            temp,
            element.llvm_name(),
            element.llvm_name(),
            array_val,
            index64
        )?;
        Ok((temp, element))
    }

    /// Call protocol: validate arity, coerce fixed arguments to declared
    /// parameter types, apply default promotions to variadic arguments,
    /// then emit the call. Void callees produce no value.
    pub(super) fn emit_call(
        &mut self,
        name: &str,
        args: &[&Expr],
        line: usize,
    ) -> Result<String, CompileError> {
        let entry = self
            .lookup_function(name)
            .cloned()
            .ok_or_else(|| {
                CompileError::semantic(format!("call to unknown function '{}'", name), line)
            })?;

        if entry.is_variadic {
            if args.len() < entry.params.len() {
                return Err(CompileError::semantic(
                    format!(
                        "'{}' expects at least {} argument(s), got {}",
                        name,
                        entry.params.len(),
                        args.len()
                    ),
                    line,
                ));
            }
        } else if args.len() != entry.params.len() {
            return Err(CompileError::semantic(
                format!(
                    "'{}' expects {} argument(s), got {}",
                    name,
                    entry.params.len(),
                    args.len()
                ),
                line,
            ));
        }

        let mut rendered = Vec::with_capacity(args.len());
        for (i, arg) in args.iter().enumerate() {
            let ty = self.expr_type(arg)?;
            if ty == DataType::Void {
                return Err(CompileError::semantic(
                    "void in an argument slot",
                    arg.line(),
                ));
            }
            let value = self.emit_expression(arg)?;
            if i < entry.params.len() {
                let param_ty = entry.params[i];
                let value = self.coerce(&value, ty, param_ty, arg.line())?;
                rendered.push(format!("{} {}", param_ty.llvm_name(), value));
            } else {
                let (value, promoted) = self.promote_variadic(&value, ty, arg.line())?;
                rendered.push(format!("{} {}", promoted.llvm_name(), value));
            }
        }

        if entry.is_external {
            self.called_externals.insert(entry.name.clone());
        }

        // Variadic callees carry their full signature at the call site.
        let callee_type = if entry.is_variadic {
            let fixed: Vec<&str> = entry.params.iter().map(|p| p.llvm_name()).collect();
            format!(
                "{} ({}, ...)",
                entry.return_type.llvm_name(),
                fixed.join(", ")
            )
        } else {
            entry.return_type.llvm_name().to_string()
        };

        if entry.return_type == DataType::Void {
            writeln!(
                self.output,
                "  call {} @{}({})",
                callee_type,
                name,
                rendered.join(", ")
            )?;
            Ok(String::new())
        } else {
            let temp = self.fresh_temp();
            writeln!(
                self.output,
                "  {} = call {} @{}({})",
                temp,
                callee_type,
                name,
                rendered.join(", ")
            )?;
            Ok(temp)
        }
    }

    fn emit_binary(&mut self, binary: &Binary) -> Result<String, CompileError> {
        let lhs_ty = self.expr_type(binary.lhs)?;
        let rhs_ty = self.expr_type(binary.rhs)?;
        let common = DataType::common_type(lhs_ty, rhs_ty).ok_or_else(|| {
            CompileError::semantic(
                format!(
                    "invalid operands to binary '{}' ('{}' and '{}')",
                    binary.op.symbol(),
                    lhs_ty,
                    rhs_ty
                ),
                binary.line,
            )
        })?;

        let lhs = self.emit_expression(binary.lhs)?;
        let rhs = self.emit_expression(binary.rhs)?;
        let lhs = self.emit_conversion(&lhs, lhs_ty, common, binary.line)?;
        let rhs = self.emit_conversion(&rhs, rhs_ty, common, binary.line)?;

        if binary.op.is_comparison() {
            let op = comparison_instr(binary.op, common.is_float());
            let cmp = self.fresh_temp();
            writeln!(
                self.output,
                "  {} = {} {} {}, {}",
                cmp,
                op,
                common.llvm_name(),
                lhs,
                rhs
            )?;
            // Uniform 32-bit boolean result.
            let temp = self.fresh_temp();
            writeln!(self.output, "  {} = zext i1 {} to i32", temp, cmp)?;
            Ok(temp)
        } else {
            let op = arithmetic_instr(binary.op, common.is_float());
            let temp = self.fresh_temp();
            writeln!(
                self.output,
                "  {} = {} {} {}, {}",
                temp,
                op,
                common.llvm_name(),
                lhs,
                rhs
            )?;
            Ok(temp)
        }
    }

    fn binding_of(&self, name: &str, line: usize) -> Result<(DataType, String), CompileError> {
        self.lookup(name)
            .map(|b| (b.ty, b.storage.clone()))
            .ok_or_else(|| {
                CompileError::semantic(format!("use of undeclared identifier '{}'", name), line)
            })
    }
}

fn arithmetic_instr(op: BinaryOp, float: bool) -> &'static str {
    match (op, float) {
        (BinaryOp::Add, false) => "add",
        (BinaryOp::Sub, false) => "sub",
        (BinaryOp::Mul, false) => "mul",
        (BinaryOp::Div, false) => "sdiv",
        (BinaryOp::Add, true) => "fadd",
        (BinaryOp::Sub, true) => "fsub",
        (BinaryOp::Mul, true) => "fmul",
        (BinaryOp::Div, true) => "fdiv",
        _ => unreachable!("comparison handled separately"),
    }
}

fn comparison_instr(op: BinaryOp, float: bool) -> &'static str {
    match (op, float) {
        (BinaryOp::Less, false) => "icmp slt",
        (BinaryOp::LessEquals, false) => "icmp sle",
        (BinaryOp::Greater, false) => "icmp sgt",
        (BinaryOp::GreaterEquals, false) => "icmp sge",
        (BinaryOp::Equals, false) => "icmp eq",
        (BinaryOp::Less, true) => "fcmp olt",
        (BinaryOp::LessEquals, true) => "fcmp ole",
        (BinaryOp::Greater, true) => "fcmp ogt",
        (BinaryOp::GreaterEquals, true) => "fcmp oge",
        (BinaryOp::Equals, true) => "fcmp oeq",
        _ => unreachable!("arithmetic handled separately"),
    }
}

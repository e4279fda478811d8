//! Type conversion emission.
//!
//! Three layers share the same instruction table:
//!
//! - [`CodeGen::emit_conversion`] - the raw cast table, used by explicit
//!   `(TYPE)` casts. Any numeric/pointer pairing is expressible; only
//!   `void` has no conversions.
//! - [`CodeGen::coerce`] - implicit conversion at assignments, calls and
//!   returns: numeric to numeric, or compatible pointers (`void*`
//!   against anything).
//! - [`CodeGen::promote_variadic`] - the default promotions applied to
//!   variadic-position arguments (`i8`/`i16` -> `i32`, `f32` -> `f64`).

use super::CodeGen;
use crate::error::CompileError;
use crate::types::DataType;
use std::fmt::Write as _;

impl CodeGen {
    /// Emit the conversion of `value` from `from` to `to` and return the
    /// name of the converted value. Identity conversions emit nothing.
    pub(super) fn emit_conversion(
        &mut self,
        value: &str,
        from: DataType,
        to: DataType,
        line: usize,
    ) -> Result<String, CompileError> {
        if from == to {
            return Ok(value.to_string());
        }

        if from.is_integer() && to.is_integer() {
            let op = if from.size() < to.size() { "sext" } else { "trunc" };
            return self.emit_unary_conv(op, value, from, to);
        }

        if from.is_float() && to.is_float() {
            let op = if from.size() < to.size() {
                "fpext"
            } else {
                "fptrunc"
            };
            return self.emit_unary_conv(op, value, from, to);
        }

        if from.is_integer() && to.is_float() {
            return self.emit_unary_conv("sitofp", value, from, to);
        }

        if from.is_float() && to.is_integer() {
            return self.emit_unary_conv("fptosi", value, from, to);
        }

        if from.is_pointer() && to.is_pointer() {
            // Typed pointers with the same IR spelling (void* and int8*
            // are both i8*) need no instruction.
            if from.llvm_name() == to.llvm_name() {
                return Ok(value.to_string());
            }
            return self.emit_unary_conv("bitcast", value, from, to);
        }

        if from.is_integer() && to.is_pointer() {
            // Through i64: widen first, then inttoptr.
            let wide = self.emit_conversion(value, from, DataType::Int64, line)?;
            return self.emit_unary_conv("inttoptr", &wide, DataType::Int64, to);
        }

        if from.is_pointer() && to.is_integer() {
            // ptrtoint to i64, then narrow.
            let wide = self.emit_unary_conv("ptrtoint", value, from, DataType::Int64)?;
            return self.emit_conversion(&wide, DataType::Int64, to, line);
        }

        Err(CompileError::semantic(
            format!("cannot convert '{}' to '{}'", from, to),
            line,
        ))
    }

    fn emit_unary_conv(
        &mut self,
        op: &str,
        value: &str,
        from: DataType,
        to: DataType,
    ) -> Result<String, CompileError> {
        let temp = self.fresh_temp();
        writeln!(
            self.output,
            "  {} = {} {} {} to {}",
            temp,
            op,
            from.llvm_name(),
            value,
            to.llvm_name()
        )?;
        Ok(temp)
    }

    /// Implicit conversion. Numeric types convert freely; pointers only
    /// when identical or one side is `void*`. Everything else is a
    /// semantic error.
    pub(super) fn coerce(
        &mut self,
        value: &str,
        from: DataType,
        to: DataType,
        line: usize,
    ) -> Result<String, CompileError> {
        if from == to {
            return Ok(value.to_string());
        }
        if from.is_numeric() && to.is_numeric() {
            return self.emit_conversion(value, from, to, line);
        }
        if DataType::compatible_pointer(from, to).is_some() {
            return self.emit_conversion(value, from, to, line);
        }
        Err(CompileError::semantic(
            format!("incompatible types: expected '{}', found '{}'", to, from),
            line,
        ))
    }

    /// Default promotion for a variadic-position argument. Returns the
    /// promoted value and its promoted type.
    pub(super) fn promote_variadic(
        &mut self,
        value: &str,
        from: DataType,
        line: usize,
    ) -> Result<(String, DataType), CompileError> {
        match from {
            DataType::Int8 | DataType::Int16 => {
                let v = self.emit_conversion(value, from, DataType::Int32, line)?;
                Ok((v, DataType::Int32))
            }
            DataType::Float32 => {
                let v = self.emit_conversion(value, from, DataType::Float64, line)?;
                Ok((v, DataType::Float64))
            }
            DataType::Void => Err(CompileError::semantic("void in an argument slot", line)),
            _ => Ok((value.to_string(), from)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompileTarget;

    fn fresh() -> CodeGen {
        CodeGen::new(CompileTarget::Native)
    }

    #[test]
    fn test_identity_emits_nothing() {
        let mut cg = fresh();
        let v = cg
            .emit_conversion("%t9", DataType::Int32, DataType::Int32, 1)
            .unwrap();
        assert_eq!(v, "%t9");
        assert!(cg.output.is_empty());
    }

    #[test]
    fn test_integer_widen_and_narrow() {
        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Int8, DataType::Int32, 1)
            .unwrap();
        assert!(cg.output.contains("sext i8 %v to i32"));

        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Int64, DataType::Int16, 1)
            .unwrap();
        assert!(cg.output.contains("trunc i64 %v to i16"));
    }

    #[test]
    fn test_float_conversions() {
        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Float32, DataType::Float64, 1)
            .unwrap();
        assert!(cg.output.contains("fpext float %v to double"));

        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Float64, DataType::Float32, 1)
            .unwrap();
        assert!(cg.output.contains("fptrunc double %v to float"));
    }

    #[test]
    fn test_int_float_crossings() {
        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Int32, DataType::Float64, 1)
            .unwrap();
        assert!(cg.output.contains("sitofp i32 %v to double"));

        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Float32, DataType::Int64, 1)
            .unwrap();
        assert!(cg.output.contains("fptosi float %v to i64"));
    }

    #[test]
    fn test_int_to_pointer_goes_through_i64() {
        let mut cg = fresh();
        cg.emit_conversion("%v", DataType::Int32, DataType::Int32Ptr, 1)
            .unwrap();
        assert!(cg.output.contains("sext i32 %v to i64"));
        assert!(cg.output.contains("inttoptr i64 %t0 to i32*"));
    }

    #[test]
    fn test_pointer_to_int_narrows_after_ptrtoint() {
        let mut cg = fresh();
        cg.emit_conversion("%p", DataType::Float64Ptr, DataType::Int32, 1)
            .unwrap();
        assert!(cg.output.contains("ptrtoint double* %p to i64"));
        assert!(cg.output.contains("trunc i64 %t0 to i32"));
    }

    #[test]
    fn test_pointer_bitcast() {
        let mut cg = fresh();
        cg.emit_conversion("%p", DataType::Int32Ptr, DataType::Int64Ptr, 1)
            .unwrap();
        assert!(cg.output.contains("bitcast i32* %p to i64*"));

        // void* and int8* share the i8* spelling; no instruction needed
        let mut cg = fresh();
        let v = cg
            .emit_conversion("%p", DataType::VoidPtr, DataType::Int8Ptr, 1)
            .unwrap();
        assert_eq!(v, "%p");
        assert!(cg.output.is_empty());
    }

    #[test]
    fn test_void_has_no_conversions() {
        let mut cg = fresh();
        let err = cg
            .emit_conversion("%v", DataType::Void, DataType::Int32, 3)
            .unwrap_err();
        assert!(err.to_string().contains("cannot convert 'void' to 'int32'"));
    }

    #[test]
    fn test_coerce_rejects_incompatible_pointers() {
        let mut cg = fresh();
        let err = cg
            .coerce("%p", DataType::Int32Ptr, DataType::Float32Ptr, 4)
            .unwrap_err();
        assert!(err.to_string().contains("incompatible types"));

        // But void* coerces to any pointer
        let mut cg = fresh();
        cg.coerce("%p", DataType::VoidPtr, DataType::Float32Ptr, 4)
            .unwrap();
        assert!(cg.output.contains("bitcast i8* %p to float*"));
    }

    #[test]
    fn test_default_promotions() {
        let mut cg = fresh();
        let (_, ty) = cg.promote_variadic("%c", DataType::Int8, 1).unwrap();
        assert_eq!(ty, DataType::Int32);
        assert!(cg.output.contains("sext i8 %c to i32"));

        let mut cg = fresh();
        let (_, ty) = cg.promote_variadic("%f", DataType::Float32, 1).unwrap();
        assert_eq!(ty, DataType::Float64);
        assert!(cg.output.contains("fpext float %f to double"));

        let mut cg = fresh();
        let (v, ty) = cg.promote_variadic("%x", DataType::Int64, 1).unwrap();
        assert_eq!((v.as_str(), ty), ("%x", DataType::Int64));
        assert!(cg.output.is_empty());
    }
}

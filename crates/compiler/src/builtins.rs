//! Built-in functions known to every compilation.
//!
//! Two groups share the function table with user code: the C library
//! functions the emitted IR may reference, and the `std*` wrappers
//! provided by the `delta-runtime` staticlib. All are registered before
//! semantic analysis; a `declare` is emitted only for the ones a program
//! actually calls.

use crate::types::DataType;

/// Signature of a function provided by the link step.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinFunction {
    pub name: &'static str,
    pub params: &'static [DataType],
    pub return_type: DataType,
    pub is_variadic: bool,
}

const fn fixed(
    name: &'static str,
    params: &'static [DataType],
    return_type: DataType,
) -> BuiltinFunction {
    BuiltinFunction {
        name,
        params,
        return_type,
        is_variadic: false,
    }
}

/// Every function registered at the start of a compilation.
pub const BUILTINS: &[BuiltinFunction] = &[
    // C library
    fixed("exit", &[DataType::Int32], DataType::Void),
    BuiltinFunction {
        name: "printf",
        params: &[DataType::Int8Ptr],
        return_type: DataType::Int32,
        is_variadic: true,
    },
    fixed("malloc", &[DataType::Int64], DataType::Int8Ptr),
    fixed("free", &[DataType::Int8Ptr], DataType::Void),
    fixed("strlen", &[DataType::Int8Ptr], DataType::Int64),
    fixed("strcpy", &[DataType::Int8Ptr, DataType::Int8Ptr], DataType::Int8Ptr),
    // delta-runtime wrappers
    fixed("stdSleep", &[DataType::Int32], DataType::Void),
    fixed("stdTimeMillis", &[], DataType::Int64),
    fixed("stdTimeNanos", &[], DataType::Int64),
    fixed("stdRandom", &[], DataType::Int32),
    fixed("stdSeedRandom", &[DataType::Int32], DataType::Void),
    fixed("stdPrintFlush", &[], DataType::Void),
    fixed("stdReadLine", &[DataType::Int8Ptr, DataType::Int64], DataType::Int64),
    fixed(
        "stdOpenWindow",
        &[DataType::Int8Ptr, DataType::Int32, DataType::Int32],
        DataType::Int32,
    ),
    fixed("stdIsWindowOpen", &[DataType::Int32], DataType::Int8),
    fixed("stdUpdateWindow", &[DataType::Int32], DataType::Void),
    fixed("stdDestroyWindow", &[DataType::Int32], DataType::Void),
    fixed(
        "stdIsKeyPressed",
        &[DataType::Int32, DataType::Int32],
        DataType::Int8,
    ),
];

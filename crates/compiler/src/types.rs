//! Type system for Delta.
//!
//! A closed lattice of primitive types: `void`, signed integers, floats,
//! and one pointer variant per non-void primitive. Sizes and alignments
//! follow a 64-bit data model (every pointer is 8 bytes, 8-byte aligned).

use std::fmt;

/// The primitive and pointer types of the language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Void,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Int8Ptr,
    Int16Ptr,
    Int32Ptr,
    Int64Ptr,
    Float32Ptr,
    Float64Ptr,
    VoidPtr,
}

impl DataType {
    /// Size in bytes. `void` has size 0.
    pub fn size(self) -> usize {
        match self {
            DataType::Void => 0,
            DataType::Int8 => 1,
            DataType::Int16 => 2,
            DataType::Int32 => 4,
            DataType::Int64 => 8,
            DataType::Float32 => 4,
            DataType::Float64 => 8,
            DataType::Int8Ptr
            | DataType::Int16Ptr
            | DataType::Int32Ptr
            | DataType::Int64Ptr
            | DataType::Float32Ptr
            | DataType::Float64Ptr
            | DataType::VoidPtr => 8,
        }
    }

    /// Alignment in bytes: `alignment(T) = size(T)` for non-pointers,
    /// 8 for every pointer.
    pub fn alignment(self) -> usize {
        if self.is_pointer() { 8 } else { self.size() }
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64
        )
    }

    pub fn is_float(self) -> bool {
        matches!(self, DataType::Float32 | DataType::Float64)
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float()
    }

    pub fn is_pointer(self) -> bool {
        matches!(
            self,
            DataType::Int8Ptr
                | DataType::Int16Ptr
                | DataType::Int32Ptr
                | DataType::Int64Ptr
                | DataType::Float32Ptr
                | DataType::Float64Ptr
                | DataType::VoidPtr
        )
    }

    /// The unique pointer type for this pointee. `None` for pointer types
    /// (no pointer-to-pointer in the lattice).
    pub fn pointer_to(self) -> Option<DataType> {
        match self {
            DataType::Void => Some(DataType::VoidPtr),
            DataType::Int8 => Some(DataType::Int8Ptr),
            DataType::Int16 => Some(DataType::Int16Ptr),
            DataType::Int32 => Some(DataType::Int32Ptr),
            DataType::Int64 => Some(DataType::Int64Ptr),
            DataType::Float32 => Some(DataType::Float32Ptr),
            DataType::Float64 => Some(DataType::Float64Ptr),
            _ => None,
        }
    }

    /// The pointee of a pointer type, `None` for non-pointers.
    pub fn pointee(self) -> Option<DataType> {
        match self {
            DataType::Int8Ptr => Some(DataType::Int8),
            DataType::Int16Ptr => Some(DataType::Int16),
            DataType::Int32Ptr => Some(DataType::Int32),
            DataType::Int64Ptr => Some(DataType::Int64),
            DataType::Float32Ptr => Some(DataType::Float32),
            DataType::Float64Ptr => Some(DataType::Float64),
            DataType::VoidPtr => Some(DataType::Void),
            _ => None,
        }
    }

    /// Parse a source-level type word, including aliases (`int`, `char`,
    /// `short`, `long`, `float`, `double`) and pointer-suffixed forms.
    pub fn from_name(s: &str) -> Option<DataType> {
        match s {
            "void" => Some(DataType::Void),
            "char" | "int8" => Some(DataType::Int8),
            "short" | "int16" => Some(DataType::Int16),
            "int" | "int32" => Some(DataType::Int32),
            "long" | "int64" => Some(DataType::Int64),
            "float" | "float32" => Some(DataType::Float32),
            "double" | "float64" => Some(DataType::Float64),
            "char*" | "int8*" => Some(DataType::Int8Ptr),
            "short*" | "int16*" => Some(DataType::Int16Ptr),
            "int*" | "int32*" => Some(DataType::Int32Ptr),
            "long*" | "int64*" => Some(DataType::Int64Ptr),
            "float*" | "float32*" => Some(DataType::Float32Ptr),
            "double*" | "float64*" => Some(DataType::Float64Ptr),
            "void*" => Some(DataType::VoidPtr),
            _ => None,
        }
    }

    /// Canonical source-level name.
    pub fn name(self) -> &'static str {
        match self {
            DataType::Void => "void",
            DataType::Int8 => "int8",
            DataType::Int16 => "int16",
            DataType::Int32 => "int32",
            DataType::Int64 => "int64",
            DataType::Float32 => "float32",
            DataType::Float64 => "float64",
            DataType::Int8Ptr => "int8*",
            DataType::Int16Ptr => "int16*",
            DataType::Int32Ptr => "int32*",
            DataType::Int64Ptr => "int64*",
            DataType::Float32Ptr => "float32*",
            DataType::Float64Ptr => "float64*",
            DataType::VoidPtr => "void*",
        }
    }

    /// LLVM IR type name. `void*` is rendered as `i8*`, the conventional
    /// opaque byte pointer in typed-pointer IR.
    pub fn llvm_name(self) -> &'static str {
        match self {
            DataType::Void => "void",
            DataType::Int8 => "i8",
            DataType::Int16 => "i16",
            DataType::Int32 => "i32",
            DataType::Int64 => "i64",
            DataType::Float32 => "float",
            DataType::Float64 => "double",
            DataType::Int8Ptr => "i8*",
            DataType::Int16Ptr => "i16*",
            DataType::Int32Ptr => "i32*",
            DataType::Int64Ptr => "i64*",
            DataType::Float32Ptr => "float*",
            DataType::Float64Ptr => "double*",
            DataType::VoidPtr => "i8*",
        }
    }

    /// Common type of two numeric operands: if either is a float, the
    /// wider float wins; otherwise the wider integer wins. `None` when
    /// either side is not numeric.
    pub fn common_type(a: DataType, b: DataType) -> Option<DataType> {
        if !a.is_numeric() || !b.is_numeric() {
            return None;
        }
        match (a.is_float(), b.is_float()) {
            (true, true) => Some(if a.size() >= b.size() { a } else { b }),
            (true, false) => Some(a),
            (false, true) => Some(b),
            (false, false) => Some(if a.size() >= b.size() { a } else { b }),
        }
    }

    /// Pointer compatibility: identical pointers, or `void*` against any
    /// pointer. Asymmetric: the result is always the non-`void*` side.
    pub fn compatible_pointer(a: DataType, b: DataType) -> Option<DataType> {
        if !a.is_pointer() || !b.is_pointer() {
            return None;
        }
        if a == b {
            Some(a)
        } else if a == DataType::VoidPtr {
            Some(b)
        } else if b == DataType::VoidPtr {
            Some(a)
        } else {
            None
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMERIC: [DataType; 6] = [
        DataType::Int8,
        DataType::Int16,
        DataType::Int32,
        DataType::Int64,
        DataType::Float32,
        DataType::Float64,
    ];

    #[test]
    fn test_sizes_and_alignments() {
        assert_eq!(DataType::Int8.size(), 1);
        assert_eq!(DataType::Int16.size(), 2);
        assert_eq!(DataType::Int32.size(), 4);
        assert_eq!(DataType::Int64.size(), 8);
        assert_eq!(DataType::Float32.size(), 4);
        assert_eq!(DataType::Float64.size(), 8);
        assert_eq!(DataType::Void.size(), 0);

        for ty in NUMERIC {
            assert_eq!(ty.alignment(), ty.size());
            let ptr = ty.pointer_to().unwrap();
            assert_eq!(ptr.size(), 8);
            assert_eq!(ptr.alignment(), 8);
        }
    }

    #[test]
    fn test_pointer_round_trip() {
        for ty in NUMERIC {
            let ptr = ty.pointer_to().unwrap();
            assert_eq!(ptr.pointee(), Some(ty));
        }
        assert_eq!(DataType::Void.pointer_to(), Some(DataType::VoidPtr));
        assert_eq!(DataType::VoidPtr.pointee(), Some(DataType::Void));
        // No pointer-to-pointer
        assert_eq!(DataType::Int32Ptr.pointer_to(), None);
    }

    #[test]
    fn test_from_name_aliases() {
        assert_eq!(DataType::from_name("int"), Some(DataType::Int32));
        assert_eq!(DataType::from_name("char"), Some(DataType::Int8));
        assert_eq!(DataType::from_name("long"), Some(DataType::Int64));
        assert_eq!(DataType::from_name("float"), Some(DataType::Float32));
        assert_eq!(DataType::from_name("double"), Some(DataType::Float64));
        assert_eq!(DataType::from_name("int*"), Some(DataType::Int32Ptr));
        assert_eq!(DataType::from_name("void*"), Some(DataType::VoidPtr));
        assert_eq!(DataType::from_name("string"), None);
    }

    #[test]
    fn test_common_type_commutative_and_idempotent() {
        for a in NUMERIC {
            assert_eq!(DataType::common_type(a, a), Some(a));
            for b in NUMERIC {
                assert_eq!(DataType::common_type(a, b), DataType::common_type(b, a));
            }
        }
    }

    #[test]
    fn test_common_type_closure() {
        for a in NUMERIC {
            for b in NUMERIC {
                let c = DataType::common_type(a, b).unwrap();
                assert!(c.is_numeric());
                assert!(c.size() >= a.size().max(b.size()));
            }
        }
    }

    #[test]
    fn test_common_type_float_wins() {
        assert_eq!(
            DataType::common_type(DataType::Int64, DataType::Float32),
            Some(DataType::Float32)
        );
        assert_eq!(
            DataType::common_type(DataType::Float32, DataType::Float64),
            Some(DataType::Float64)
        );
        assert_eq!(
            DataType::common_type(DataType::Int8, DataType::Int32),
            Some(DataType::Int32)
        );
    }

    #[test]
    fn test_common_type_rejects_non_numeric() {
        assert_eq!(DataType::common_type(DataType::Void, DataType::Int32), None);
        assert_eq!(
            DataType::common_type(DataType::Int32Ptr, DataType::Int32),
            None
        );
    }

    #[test]
    fn test_pointer_compatibility() {
        assert_eq!(
            DataType::compatible_pointer(DataType::Int32Ptr, DataType::Int32Ptr),
            Some(DataType::Int32Ptr)
        );
        assert_eq!(
            DataType::compatible_pointer(DataType::VoidPtr, DataType::Float64Ptr),
            Some(DataType::Float64Ptr)
        );
        assert_eq!(
            DataType::compatible_pointer(DataType::Int8Ptr, DataType::VoidPtr),
            Some(DataType::Int8Ptr)
        );
        assert_eq!(
            DataType::compatible_pointer(DataType::Int8Ptr, DataType::Int32Ptr),
            None
        );
        assert_eq!(
            DataType::compatible_pointer(DataType::Int8Ptr, DataType::Int32),
            None
        );
    }
}

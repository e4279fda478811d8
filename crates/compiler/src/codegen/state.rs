//! Emitter state and core types.
//!
//! [`CodeGen`] owns everything a single compilation needs while walking
//! the AST: the output buffer, the per-function counters, the symbol
//! stack, the flat function table, the string pool and the write-once
//! expression-type cache. Nothing survives between compilations.

use crate::builtins::BUILTINS;
use crate::config::CompileTarget;
use crate::error::CompileError;
use crate::types::DataType;
use std::collections::{HashMap, HashSet};

/// A name bound in some lexical scope.
pub(super) struct Binding {
    pub name: String,
    pub ty: DataType,
    pub is_const: bool,
    /// Register of the backing alloca, e.g. `%t0`.
    pub storage: String,
}

/// One entry of the flat, append-only function table. Lookup is linear;
/// fine for the program sizes the language targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct FunctionEntry {
    pub name: String,
    pub params: Vec<DataType>,
    pub return_type: DataType,
    pub is_external: bool,
    pub is_variadic: bool,
}

pub struct CodeGen {
    pub(super) target: CompileTarget,
    /// Function definitions accumulate here; the module header, declares
    /// and globals are assembled around it at the end.
    pub(super) output: String,
    /// `%tN` counter, reset at the start of each function.
    pub(super) temp_counter: usize,
    /// `bbN` counter, reset at the start of each function.
    pub(super) block_counter: usize,
    /// Symbol table: a stack of scopes, innermost last.
    pub(super) scopes: Vec<Vec<Binding>>,
    pub(super) functions: Vec<FunctionEntry>,
    /// Distinct string literals in first-occurrence order.
    pub(super) string_pool: Vec<String>,
    pub(super) string_indices: HashMap<String, usize>,
    /// Externals declared in source, in declaration order. These always
    /// get a `declare`.
    pub(super) declared_externs: Vec<String>,
    /// External names a program actually calls; built-ins only get a
    /// `declare` when they appear here.
    pub(super) called_externals: HashSet<String>,
    /// Inferred type per expression node, keyed by arena address.
    /// Populated lazily, read-only once filled.
    pub(super) expr_types: HashMap<usize, DataType>,
    pub(super) current_return_type: DataType,
    /// Whether the current basic block already ended in a terminator.
    pub(super) block_terminated: bool,
}

impl CodeGen {
    /// Create an emitter with the built-in C functions and stdlib
    /// wrappers already registered in the function table.
    pub fn new(target: CompileTarget) -> Self {
        let functions = BUILTINS
            .iter()
            .map(|b| FunctionEntry {
                name: b.name.to_string(),
                params: b.params.to_vec(),
                return_type: b.return_type,
                is_external: true,
                is_variadic: b.is_variadic,
            })
            .collect();

        CodeGen {
            target,
            output: String::new(),
            temp_counter: 0,
            block_counter: 0,
            scopes: Vec::new(),
            functions,
            string_pool: Vec::new(),
            string_indices: HashMap::new(),
            declared_externs: Vec::new(),
            called_externals: HashSet::new(),
            expr_types: HashMap::new(),
            current_return_type: DataType::Void,
            block_terminated: false,
        }
    }

    pub(super) fn fresh_temp(&mut self) -> String {
        let name = format!("%t{}", self.temp_counter);
        self.temp_counter += 1;
        name
    }

    pub(super) fn fresh_block(&mut self) -> String {
        let name = format!("bb{}", self.block_counter);
        self.block_counter += 1;
        name
    }

    pub(super) fn push_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    pub(super) fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Whether `name` is already bound in the innermost scope. Shadowing
    /// an outer binding is allowed; redeclaring in the same scope is not.
    pub(super) fn bound_in_current_scope(&self, name: &str) -> bool {
        self.scopes
            .last()
            .is_some_and(|scope| scope.iter().any(|b| b.name == name))
    }

    pub(super) fn declare_binding(
        &mut self,
        binding: Binding,
        line: usize,
    ) -> Result<(), CompileError> {
        if self.bound_in_current_scope(&binding.name) {
            return Err(CompileError::semantic(
                format!("redeclaration of '{}'", binding.name),
                line,
            ));
        }
        self.scopes
            .last_mut()
            .ok_or_else(|| CompileError::internal("binding declared outside any scope"))?
            .push(binding);
        Ok(())
    }

    /// Innermost-outward name lookup; first match wins.
    pub(super) fn lookup(&self, name: &str) -> Option<&Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.iter().rev().find(|b| b.name == name))
    }

    pub(super) fn lookup_function(&self, name: &str) -> Option<&FunctionEntry> {
        self.functions.iter().find(|f| f.name == name)
    }

    /// Intern a string literal, returning its stable pool index.
    /// Equal literals share one index; indices follow first occurrence.
    pub(super) fn intern_string(&mut self, s: &str) -> usize {
        if let Some(&index) = self.string_indices.get(s) {
            return index;
        }
        let index = self.string_pool.len();
        self.string_pool.push(s.to_string());
        self.string_indices.insert(s.to_string(), index);
        index
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered_at_startup() {
        let codegen = CodeGen::new(CompileTarget::Native);
        let printf = codegen.lookup_function("printf").unwrap();
        assert!(printf.is_external);
        assert!(printf.is_variadic);
        assert_eq!(printf.return_type, DataType::Int32);
        assert!(codegen.lookup_function("stdSleep").is_some());
        assert!(codegen.lookup_function("missing").is_none());
    }

    #[test]
    fn test_counters_produce_unique_names() {
        let mut codegen = CodeGen::new(CompileTarget::Native);
        assert_eq!(codegen.fresh_temp(), "%t0");
        assert_eq!(codegen.fresh_temp(), "%t1");
        assert_eq!(codegen.fresh_block(), "bb0");
        assert_eq!(codegen.fresh_block(), "bb1");
    }

    #[test]
    fn test_scope_stack_shadowing() {
        let mut codegen = CodeGen::new(CompileTarget::Native);
        codegen.push_scope();
        codegen
            .declare_binding(
                Binding {
                    name: "x".into(),
                    ty: DataType::Int32,
                    is_const: false,
                    storage: "%t0".into(),
                },
                1,
            )
            .unwrap();

        codegen.push_scope();
        // Shadowing in an inner scope is fine
        codegen
            .declare_binding(
                Binding {
                    name: "x".into(),
                    ty: DataType::Int64,
                    is_const: false,
                    storage: "%t1".into(),
                },
                2,
            )
            .unwrap();
        assert_eq!(codegen.lookup("x").unwrap().ty, DataType::Int64);

        codegen.pop_scope();
        assert_eq!(codegen.lookup("x").unwrap().ty, DataType::Int32);

        // Redeclaration in the same scope is rejected
        let err = codegen
            .declare_binding(
                Binding {
                    name: "x".into(),
                    ty: DataType::Int32,
                    is_const: false,
                    storage: "%t2".into(),
                },
                3,
            )
            .unwrap_err();
        assert!(err.to_string().contains("redeclaration of 'x'"));
    }

    #[test]
    fn test_string_pool_first_occurrence_order() {
        let mut codegen = CodeGen::new(CompileTarget::Native);
        assert_eq!(codegen.intern_string("hello"), 0);
        assert_eq!(codegen.intern_string("world"), 1);
        assert_eq!(codegen.intern_string("hello"), 0);
        assert_eq!(codegen.string_pool, vec!["hello", "world"]);
    }
}

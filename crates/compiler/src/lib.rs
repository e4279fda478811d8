//! Delta Compiler Library
//!
//! Compiles Delta (`.dlt`) source to textual LLVM IR, and optionally
//! drives external tools to produce a native executable or a
//! WebAssembly module.
//!
//! The pipeline is strictly linear and allocates nothing shared between
//! compilations:
//!
//! ```text
//! source text -> tokens -> tokens (expanded) -> AST -> IR text
//! ```
//!
//! # Library use
//!
//! ```rust
//! use deltac::{CompilerConfig, compile_to_ir};
//!
//! let ir = compile_to_ir(
//!     "fn main() -> int { return 0; }",
//!     &CompilerConfig::default(),
//! )
//! .unwrap();
//! assert!(ir.contains("define i32 @main()"));
//! ```

pub mod ast;
pub mod builtins;
pub mod codegen;
pub mod config;
pub mod debug;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod preprocessor;
pub mod tokens;
pub mod types;

pub use codegen::CodeGen;
pub use config::{CompileTarget, CompilerConfig, ProjectFile};
pub use error::CompileError;
pub use lexer::Lexer;
pub use parser::Parser;
pub use preprocessor::{Preprocessor, PreprocessorResult};
pub use types::DataType;

use bumpalo::Bump;
use std::fs;
use std::path::Path;
use std::process::Command;
use std::sync::OnceLock;
use tracing::{debug, info, trace};

/// Name reported by the `_DLT_CC_NAME` macro and the module epilogue.
pub const COMPILER_NAME: &str = "deltac";

/// Version reported by the `_DLT_VERSION` macro; tracks the bundled
/// runtime crate.
pub const STDLIB_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Minimum clang major version the driver accepts. The emitted IR uses
/// typed pointers, which every clang since 11 still parses.
const MIN_CLANG_VERSION: u32 = 11;

/// Cache for the clang version probe; it only runs once per process.
static CLANG_VERSION_CHECKED: OnceLock<Result<u32, String>> = OnceLock::new();

/// Run the core pipeline: lex, preprocess, parse, emit. Returns the
/// textual LLVM module or the first error. Nothing touches the
/// filesystem except `#include` resolution.
pub fn compile_to_ir(source: &str, config: &CompilerConfig) -> Result<String, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    trace!(tokens = tokens.len(), "lexed source");

    let expanded = Preprocessor::new(tokens, config.target)
        .with_include_dirs(config.include_dirs.iter().cloned())
        .process()?;
    trace!(
        tokens = expanded.tokens.len(),
        macros = expanded.macros.len(),
        "preprocessed"
    );

    let arena = Bump::new();
    let program = Parser::new(expanded.tokens, &arena).parse()?;
    trace!(
        externs = program.externs.len(),
        functions = program.functions.len(),
        top_level = program.statements.len(),
        "parsed program"
    );

    CodeGen::new(config.target).codegen_program(&program)
}

/// Parse a source file and return the debug AST dump (the `deltac ast`
/// subcommand).
pub fn dump_ast(source: &str, config: &CompilerConfig) -> Result<String, CompileError> {
    let tokens = Lexer::new(source).tokenize()?;
    let expanded = Preprocessor::new(tokens, config.target)
        .with_include_dirs(config.include_dirs.iter().cloned())
        .process()?;
    let arena = Bump::new();
    let program = Parser::new(expanded.tokens, &arena).parse()?;
    Ok(debug::print_program(&program))
}

/// Compile a `.dlt` source file to an executable (or wasm module),
/// writing the intermediate `.ll` next to the output and invoking the
/// external toolchain.
pub fn compile_file(
    source_path: &Path,
    output_path: &Path,
    config: &CompilerConfig,
) -> Result<(), String> {
    let source = fs::read_to_string(source_path)
        .map_err(|e| format!("Failed to read source file: {}", e))?;

    info!(
        input = %source_path.display(),
        target = config.target.name(),
        "compiling"
    );
    let ir = compile_to_ir(&source, config).map_err(|e| e.to_string())?;

    let ir_path = output_path.with_extension("ll");
    fs::write(&ir_path, &ir)
        .map_err(|e| format!("Failed to write IR file '{}': {}", ir_path.display(), e))?;

    let linked = match config.target {
        CompileTarget::Native => link_native(&ir_path, output_path, config),
        CompileTarget::Wasm => link_wasm(&ir_path, output_path, config),
    };

    if !config.keep_ir {
        let _ = fs::remove_file(&ir_path);
    }
    linked
}

fn link_native(ir_path: &Path, output_path: &Path, config: &CompilerConfig) -> Result<(), String> {
    check_clang_version()?;

    let mut cmd = Command::new("clang");
    cmd.arg(ir_path)
        .arg("-o")
        .arg(output_path)
        .arg("-Wno-override-module");
    for input in &config.link_inputs {
        cmd.arg(input);
    }

    debug!(?cmd, "invoking clang");
    let output = cmd
        .output()
        .map_err(|e| format!("Failed to run clang: {}", e))?;
    if !output.status.success() {
        return Err(format!(
            "clang failed with exit code {:?}:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

fn link_wasm(ir_path: &Path, output_path: &Path, config: &CompilerConfig) -> Result<(), String> {
    check_clang_version()?;

    // clang drives wasm-ld; no libc on this target.
    let mut cmd = Command::new("clang");
    cmd.arg("--target=wasm32")
        .arg("-nostdlib")
        .arg("-Wl,--no-entry")
        .arg("-Wl,--export-all")
        .arg(ir_path)
        .arg("-o")
        .arg(output_path);
    for input in &config.link_inputs {
        cmd.arg(input);
    }

    debug!(?cmd, "invoking clang for wasm");
    let output = cmd
        .output()
        .map_err(|e| format!("Failed to run clang: {}", e))?;
    if !output.status.success() {
        return Err(format!(
            "clang (wasm) failed with exit code {:?}:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stderr)
        ));
    }
    Ok(())
}

/// Run a produced binary and return its exit code.
pub fn run_binary(path: &Path) -> Result<i32, String> {
    let status = Command::new(path)
        .status()
        .map_err(|e| format!("Failed to run '{}': {}", path.display(), e))?;
    Ok(status.code().unwrap_or(-1))
}

/// Check that clang is available and recent enough. Cached per process.
fn check_clang_version() -> Result<u32, String> {
    CLANG_VERSION_CHECKED
        .get_or_init(|| {
            let output = Command::new("clang").arg("--version").output().map_err(|e| {
                format!(
                    "Failed to run clang: {}. Please install clang {} or later.",
                    e, MIN_CLANG_VERSION
                )
            })?;

            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(format!(
                    "clang --version failed with exit code {:?}: {}",
                    output.status.code(),
                    stderr
                ));
            }

            let version_str = String::from_utf8_lossy(&output.stdout);
            let version = parse_clang_version(&version_str).ok_or_else(|| {
                format!(
                    "Could not parse clang version from: {}",
                    version_str.lines().next().unwrap_or(&version_str)
                )
            })?;

            if version < MIN_CLANG_VERSION {
                return Err(format!(
                    "clang version {} detected, but deltac requires clang {} or later.",
                    version, MIN_CLANG_VERSION
                ));
            }

            Ok(version)
        })
        .clone()
}

/// Parse the major version from `clang --version` output. Handles
/// "clang version", "Apple clang version" and distro-prefixed variants.
fn parse_clang_version(output: &str) -> Option<u32> {
    for line in output.lines() {
        if line.contains("clang version")
            && let Some(idx) = line.find("version ")
        {
            let after = &line[idx + 8..];
            let major: String = after.chars().take_while(|c| c.is_ascii_digit()).collect();
            if !major.is_empty() {
                return major.parse().ok();
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_clang_version() {
        assert_eq!(
            parse_clang_version("clang version 15.0.0 (some vendor)"),
            Some(15)
        );
        assert_eq!(
            parse_clang_version("Apple clang version 14.0.3 (clang-1403.0.22.14.1)"),
            Some(14)
        );
        assert_eq!(
            parse_clang_version("Homebrew clang version 17.0.6"),
            Some(17)
        );
        assert_eq!(parse_clang_version("not a compiler"), None);
    }

    #[test]
    fn test_compile_to_ir_smoke() {
        let ir = compile_to_ir(
            "fn main() -> int { return 0; }",
            &CompilerConfig::default(),
        )
        .unwrap();
        assert!(ir.contains("define i32 @main()"));
    }

    #[test]
    fn test_compile_to_ir_surfaces_stage_errors() {
        let config = CompilerConfig::default();
        assert!(matches!(
            compile_to_ir("let x = ~;", &config),
            Err(CompileError::Lex { .. })
        ));
        assert!(matches!(
            compile_to_ir("#include <missing>", &config),
            Err(CompileError::Preproc { .. })
        ));
        assert!(matches!(
            compile_to_ir("fn main() -> int { return 0 }", &config),
            Err(CompileError::Parse { .. })
        ));
        assert!(matches!(
            compile_to_ir("fn main() -> int { return ghost; }", &config),
            Err(CompileError::Semantic { .. })
        ));
    }

    #[test]
    fn test_dump_ast() {
        let dump = dump_ast(
            "fn main() -> int { return 0; }",
            &CompilerConfig::default(),
        )
        .unwrap();
        assert!(dump.starts_with("- Node Program"));
        assert!(dump.contains("Define \"int32 main()\""));
    }
}

//! Whole-pipeline tests: include resolution through the filesystem,
//! macro visibility across includes, and diagnostic formatting.

use deltac::{CompileError, CompilerConfig, compile_to_ir, dump_ast};
use std::fs;
use std::path::Path;

fn write_file(dir: &Path, name: &str, contents: &str) {
    fs::write(dir.join(name), contents).unwrap();
}

#[test]
fn include_provides_externs_and_macros() {
    let dir = tempfile::tempdir().unwrap();
    write_file(
        dir.path(),
        "graphics.dlt",
        "#define DEFAULT_WIDTH 640\n#define DEFAULT_HEIGHT 480\nexternal int32 stdOpenWindow(int8*, int32, int32);\n",
    );

    let config = CompilerConfig::new().with_include_dir(dir.path());
    let ir = compile_to_ir(
        "#include <graphics>\n\
         fn main() -> int {\n\
           let w: int = stdOpenWindow(\"demo\", DEFAULT_WIDTH, DEFAULT_HEIGHT);\n\
           return w;\n\
         }",
        &config,
    )
    .unwrap();

    assert!(ir.contains("declare i32 @stdOpenWindow(i8*, i32, i32)"));
    assert!(ir.contains("i32 640"));
    assert!(ir.contains("i32 480"));
}

#[test]
fn include_search_stops_at_first_hit() {
    let first = tempfile::tempdir().unwrap();
    let second = tempfile::tempdir().unwrap();
    write_file(first.path(), "util.dlt", "#define ORIGIN 1\n");
    write_file(second.path(), "util.dlt", "#define ORIGIN 2\n");

    let config = CompilerConfig::new()
        .with_include_dir(first.path())
        .with_include_dir(second.path());
    let ir = compile_to_ir("#include <util>\nexit(ORIGIN);", &config).unwrap();

    assert!(ir.contains("call void @exit(i32 1)"));
    assert!(!ir.contains("call void @exit(i32 2)"));
}

#[test]
fn includes_nest_recursively() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "inner.dlt", "#define DEPTH 2\n");
    write_file(dir.path(), "outer.dlt", "#include <inner>\n");

    let config = CompilerConfig::new().with_include_dir(dir.path());
    let ir = compile_to_ir("#include <outer>\nexit(DEPTH);", &config).unwrap();
    assert!(ir.contains("call void @exit(i32 2)"));
}

#[test]
fn missing_include_is_a_preprocessor_error() {
    let err = compile_to_ir("#include <ghost>\n", &CompilerConfig::default()).unwrap_err();
    assert!(matches!(err, CompileError::Preproc { line: 1, .. }));
    assert!(err.to_string().contains("include file not found: ghost"));
}

#[test]
fn ast_dump_is_deterministic_through_includes() {
    let dir = tempfile::tempdir().unwrap();
    write_file(dir.path(), "decls.dlt", "external void helper(int32);\n");

    let config = CompilerConfig::new().with_include_dir(dir.path());
    let source = "#include <decls>\nfn main() -> int { helper(1); return 0; }";
    let first = dump_ast(source, &config).unwrap();
    let second = dump_ast(source, &config).unwrap();
    assert_eq!(first, second);
    assert!(first.contains("External \"void helper(int32)\""));
}

#[test]
fn diagnostics_carry_kind_and_line() {
    let config = CompilerConfig::default();

    let err = compile_to_ir("fn main() -> int {\n  let x: int = @;\n}", &config).unwrap_err();
    assert_eq!(err.to_string(), "lex error: unexpected character '@' (line 2)");

    let err = compile_to_ir("fn main() -> int {\n  return 1\n}", &config).unwrap_err();
    assert_eq!(err.to_string(), "parse error: expected ';' (line 3)");

    let err = compile_to_ir(
        "fn main() -> int {\n  let const k: int = 1;\n  k = 2;\n  return k;\n}",
        &config,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "semantic error: assignment to constant 'k' (line 3)"
    );
}

#[test]
fn no_partial_ir_on_failure() {
    // A program that fails late in emission still yields only an error.
    let result = compile_to_ir(
        "fn main() -> int { printf(\"ok\"); return ghost; }",
        &CompilerConfig::default(),
    );
    assert!(matches!(result, Err(CompileError::Semantic { .. })));
}

//! Token-level preprocessor.
//!
//! Runs between the lexer and the parser. Three directive families are
//! recognized, only when `#` is the leading token of a logical line:
//!
//! - `#include <name>` - searches each include directory in order for
//!   `name.dlt`, lexes and preprocesses the hit, and splices its tokens
//!   and macros into the including stream.
//! - `#define NAME tok...` - object-like macros only. The replacement is
//!   every following token on the same line. The last definition wins.
//! - `#if EXPR` / `#elif EXPR` / `#else` / `#endif` - bounded conditional
//!   compilation. `EXPR` is an optional `!` followed by `defined(NAME)`
//!   or an integer literal. Skipped branches are still scanned so inner
//!   directives balance.
//!
//! Macro expansion does not re-scan replacement tokens, so expansion is
//! not recursive and always terminates.

use crate::config::CompileTarget;
use crate::error::CompileError;
use crate::lexer::Lexer;
use crate::tokens::{Token, TokenKind};
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::trace;

/// File extensions tried when resolving `#include <name>`.
const INCLUDE_EXTENSIONS: &[&str] = &["dlt"];

/// Expanded token stream plus the final macro environment.
#[derive(Debug)]
pub struct PreprocessorResult {
    pub tokens: Vec<Token>,
    pub macros: HashMap<String, Vec<Token>>,
}

struct CondFrame {
    /// Whether some arm of this conditional has already been taken.
    taken: bool,
    seen_else: bool,
    /// Line of the opening `#if`, for unbalanced-block diagnostics.
    line: usize,
}

pub struct Preprocessor {
    tokens: Vec<Token>,
    position: usize,
    definitions: HashMap<String, Vec<Token>>,
    output: Vec<Token>,
    include_dirs: Vec<PathBuf>,
    target: CompileTarget,
    cond_stack: Vec<CondFrame>,
}

impl Preprocessor {
    /// Create a preprocessor with the predefined platform and version
    /// macros for `target` already installed.
    pub fn new(tokens: Vec<Token>, target: CompileTarget) -> Self {
        let mut pp = Preprocessor {
            tokens,
            position: 0,
            definitions: HashMap::new(),
            output: Vec::new(),
            include_dirs: Vec::new(),
            target,
            cond_stack: Vec::new(),
        };
        pp.install_predefined();
        pp
    }

    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs.extend(dirs);
        self
    }

    /// Define an object-like macro. Also the hook tests use to pin the
    /// platform macro set independently of the host.
    pub fn define(&mut self, name: impl Into<String>, replacement: Vec<Token>) {
        self.definitions.insert(name.into(), replacement);
    }

    /// Remove a macro. Lets tests neutralize host platform tags.
    pub fn undefine(&mut self, name: &str) {
        self.definitions.remove(name);
    }

    fn define_int(&mut self, name: &str, value: &str) {
        self.define(
            name,
            vec![Token::with_text(TokenKind::IntLiteral, 0, value)],
        );
    }

    fn define_string(&mut self, name: &str, value: &str) {
        self.define(
            name,
            vec![Token::with_text(TokenKind::StringLiteral, 0, value)],
        );
    }

    fn install_predefined(&mut self) {
        match self.target {
            CompileTarget::Native => {
                if cfg!(windows) {
                    self.define_int("_WIN32", "1");
                    if cfg!(target_pointer_width = "64") {
                        self.define_int("_WIN64", "1");
                    }
                }
                if cfg!(target_os = "linux") {
                    self.define_int("__linux__", "1");
                    self.define_int("__linux", "1");
                }
                if cfg!(target_os = "macos") {
                    self.define_int("__APPLE__", "1");
                }
            }
            CompileTarget::Wasm => {
                self.define_int("_WASM", "1");
            }
        }
        self.define_int("_DLT_CC", "1");
        self.define_string("_DLT_CC_NAME", crate::COMPILER_NAME);
        self.define_string("_DLT_CC_VERSION", env!("CARGO_PKG_VERSION"));
        self.define_string("_DLT_VERSION", crate::STDLIB_VERSION);
    }

    /// Run the preprocessor to completion.
    pub fn process(mut self) -> Result<PreprocessorResult, CompileError> {
        while self.position < self.tokens.len() {
            if self.current_kind() == Some(TokenKind::Hash) && self.at_line_start() {
                self.process_directive()?;
                continue;
            }
            let token = self.consume();
            if token.kind == TokenKind::Identifier
                && let Some(replacement) = self.definitions.get(token.text())
            {
                // Spliced without re-scanning: no recursive expansion.
                self.output.extend(replacement.iter().cloned());
                continue;
            }
            self.output.push(token);
        }

        if let Some(frame) = self.cond_stack.last() {
            return Err(CompileError::preproc("unterminated #if block", frame.line));
        }

        Ok(PreprocessorResult {
            tokens: self.output,
            macros: self.definitions,
        })
    }

    fn process_directive(&mut self) -> Result<(), CompileError> {
        let hash = self.consume();
        let Some(directive) = self.peek(0).cloned() else {
            return Err(CompileError::preproc(
                "malformed directive at end of input",
                hash.line,
            ));
        };

        match directive.kind {
            TokenKind::Include => {
                self.consume();
                self.process_include(hash.line)
            }
            TokenKind::Define => {
                self.consume();
                self.process_define(hash.line)
            }
            TokenKind::If => {
                self.consume();
                let cond_tokens = self.take_rest_of_line(directive.line);
                let cond = self.evaluate_condition(&cond_tokens, hash.line)?;
                self.cond_stack.push(CondFrame {
                    taken: cond,
                    seen_else: false,
                    line: hash.line,
                });
                if !cond {
                    self.skip_inactive()?;
                }
                Ok(())
            }
            // Reaching #elif or #else in the main sweep means the branch
            // just processed was taken; the remaining arms are skipped.
            TokenKind::Elif => {
                self.consume();
                self.take_rest_of_line(directive.line);
                let Some(frame) = self.cond_stack.last() else {
                    return Err(CompileError::preproc(
                        "#elif without matching #if",
                        hash.line,
                    ));
                };
                if frame.seen_else {
                    return Err(CompileError::preproc("#elif after #else", hash.line));
                }
                self.skip_inactive()
            }
            TokenKind::Else => {
                self.consume();
                let Some(frame) = self.cond_stack.last_mut() else {
                    return Err(CompileError::preproc(
                        "#else without matching #if",
                        hash.line,
                    ));
                };
                if frame.seen_else {
                    return Err(CompileError::preproc("duplicate #else", hash.line));
                }
                frame.seen_else = true;
                self.skip_inactive()
            }
            TokenKind::Endif => {
                self.consume();
                match self.cond_stack.pop() {
                    None => Err(CompileError::preproc(
                        "#endif without matching #if",
                        hash.line,
                    )),
                    Some(_) => Ok(()),
                }
            }
            _ => Err(CompileError::preproc("malformed directive", hash.line)),
        }
    }

    fn process_include(&mut self, line: usize) -> Result<(), CompileError> {
        self.expect(TokenKind::Less, "'<'", line)?;
        let name_tok = self.expect(TokenKind::Identifier, "an include name", line)?;
        self.expect(TokenKind::Greater, "'>'", line)?;
        let name = name_tok.text().to_string();

        let mut found = None;
        'search: for dir in &self.include_dirs {
            for ext in INCLUDE_EXTENSIONS {
                let candidate = dir.join(format!("{}.{}", name, ext));
                if candidate.is_file() {
                    found = Some(candidate);
                    break 'search;
                }
            }
        }
        let path = found.ok_or_else(|| {
            CompileError::preproc(format!("include file not found: {}", name), line)
        })?;

        trace!(path = %path.display(), "including");
        let contents = fs::read_to_string(&path).map_err(|e| {
            CompileError::preproc(
                format!("failed to read include '{}': {}", path.display(), e),
                line,
            )
        })?;

        let sub_tokens = Lexer::new(&contents).tokenize()?;
        let sub = Preprocessor::new(sub_tokens, self.target)
            .with_include_dirs(self.include_dirs.clone());
        let result = sub.process()?;

        self.output.extend(result.tokens);
        for (name, replacement) in result.macros {
            self.definitions.insert(name, replacement);
        }
        Ok(())
    }

    fn process_define(&mut self, line: usize) -> Result<(), CompileError> {
        let name_tok = self.expect(TokenKind::Identifier, "a macro name", line)?;
        let replacement = self.take_rest_of_line(name_tok.line);
        self.definitions
            .insert(name_tok.text().to_string(), replacement);
        Ok(())
    }

    /// Skip tokens of an inactive branch, scanning nested directives so
    /// that `#if`/`#endif` pairs stay balanced. Returns when an arm of the
    /// controlling conditional becomes active or its `#endif` closes it.
    fn skip_inactive(&mut self) -> Result<(), CompileError> {
        let base_depth = self.cond_stack.len();
        loop {
            if self.position >= self.tokens.len() {
                let line = self.cond_stack.last().map(|f| f.line).unwrap_or(0);
                return Err(CompileError::preproc("unterminated #if block", line));
            }

            if self.current_kind() != Some(TokenKind::Hash) || !self.at_line_start() {
                self.consume();
                continue;
            }

            let hash = self.consume();
            let Some(directive) = self.peek(0).cloned() else {
                return Err(CompileError::preproc(
                    "malformed directive at end of input",
                    hash.line,
                ));
            };

            match directive.kind {
                TokenKind::If => {
                    self.consume();
                    self.take_rest_of_line(directive.line);
                    // Nested conditional inside a skipped region: tracked
                    // only for balance, its arms all skip.
                    self.cond_stack.push(CondFrame {
                        taken: true,
                        seen_else: false,
                        line: hash.line,
                    });
                }
                TokenKind::Endif => {
                    self.consume();
                    self.cond_stack.pop();
                    if self.cond_stack.len() < base_depth {
                        return Ok(());
                    }
                }
                TokenKind::Elif => {
                    self.consume();
                    let cond_tokens = self.take_rest_of_line(directive.line);
                    if self.cond_stack.len() == base_depth {
                        let (taken, seen_else) = match self.cond_stack.last() {
                            Some(frame) => (frame.taken, frame.seen_else),
                            None => {
                                return Err(CompileError::internal(
                                    "conditional stack underflow in #elif",
                                ));
                            }
                        };
                        if seen_else {
                            return Err(CompileError::preproc("#elif after #else", hash.line));
                        }
                        if !taken && self.evaluate_condition(&cond_tokens, hash.line)? {
                            if let Some(frame) = self.cond_stack.last_mut() {
                                frame.taken = true;
                            }
                            return Ok(());
                        }
                    }
                }
                TokenKind::Else => {
                    self.consume();
                    if self.cond_stack.len() == base_depth {
                        let Some(frame) = self.cond_stack.last_mut() else {
                            return Err(CompileError::internal(
                                "conditional stack underflow in #else",
                            ));
                        };
                        if frame.seen_else {
                            return Err(CompileError::preproc("duplicate #else", hash.line));
                        }
                        frame.seen_else = true;
                        if !frame.taken {
                            frame.taken = true;
                            return Ok(());
                        }
                    }
                }
                // Inactive includes and defines are scanned but inert.
                TokenKind::Include | TokenKind::Define => {
                    self.consume();
                    self.take_rest_of_line(directive.line);
                }
                _ => {
                    return Err(CompileError::preproc("malformed directive", hash.line));
                }
            }
        }
    }

    /// Evaluate a conditional expression: optional `!`, then either
    /// `defined(NAME)` or an integer literal. `defined` requires genuine
    /// parentheses.
    fn evaluate_condition(
        &self,
        tokens: &[Token],
        line: usize,
    ) -> Result<bool, CompileError> {
        let mut i = 0;
        let mut negate = false;
        if tokens.get(i).map(|t| t.kind) == Some(TokenKind::Exclamation) {
            negate = true;
            i += 1;
        }

        let malformed = || CompileError::preproc("malformed #if condition", line);

        match tokens.get(i) {
            Some(t) if t.kind == TokenKind::Identifier && t.text() == "defined" => {
                i += 1;
                if tokens.get(i).map(|t| t.kind) != Some(TokenKind::OpenParen) {
                    return Err(malformed());
                }
                i += 1;
                let name = match tokens.get(i) {
                    Some(t) if t.kind == TokenKind::Identifier => t.text(),
                    _ => return Err(malformed()),
                };
                i += 1;
                if tokens.get(i).map(|t| t.kind) != Some(TokenKind::CloseParen) {
                    return Err(malformed());
                }
                i += 1;
                if i != tokens.len() {
                    return Err(malformed());
                }
                let defined = self.definitions.contains_key(name);
                Ok(negate != defined)
            }
            Some(t) if t.kind == TokenKind::IntLiteral => {
                if i + 1 != tokens.len() {
                    return Err(malformed());
                }
                let value: i64 = t.text().parse().map_err(|_| malformed())?;
                Ok(negate != (value != 0))
            }
            _ => Err(malformed()),
        }
    }

    /// Consume and return every remaining token on the given line.
    fn take_rest_of_line(&mut self, line: usize) -> Vec<Token> {
        let mut taken = Vec::new();
        while let Some(t) = self.peek(0) {
            if t.line != line {
                break;
            }
            taken.push(self.consume());
        }
        taken
    }

    fn expect(
        &mut self,
        kind: TokenKind,
        what: &str,
        line: usize,
    ) -> Result<Token, CompileError> {
        match self.peek(0) {
            Some(t) if t.kind == kind => Ok(self.consume()),
            _ => Err(CompileError::preproc(
                format!("malformed directive: expected {}", what),
                line,
            )),
        }
    }

    fn at_line_start(&self) -> bool {
        self.position == 0
            || self.tokens[self.position - 1].line != self.tokens[self.position].line
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.peek(0).map(|t| t.kind)
    }

    fn peek(&self, ahead: usize) -> Option<&Token> {
        self.tokens.get(self.position + ahead)
    }

    fn consume(&mut self) -> Token {
        let token = self.tokens[self.position].clone();
        self.position += 1;
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    fn lex(source: &str) -> Vec<Token> {
        Lexer::new(source).tokenize().unwrap()
    }

    fn process(source: &str) -> PreprocessorResult {
        Preprocessor::new(lex(source), CompileTarget::Native)
            .process()
            .unwrap()
    }

    fn texts(tokens: &[Token]) -> Vec<String> {
        tokens
            .iter()
            .map(|t| {
                t.text
                    .clone()
                    .unwrap_or_else(|| format!("{:?}", t.kind))
            })
            .collect()
    }

    #[test]
    fn test_fixpoint_without_directives() {
        let source = "fn main() -> int { return someName + 1; }";
        let tokens = lex(source);
        let result = Preprocessor::new(tokens.clone(), CompileTarget::Native)
            .process()
            .unwrap();
        assert_eq!(result.tokens, tokens);
    }

    #[test]
    fn test_define_and_expand() {
        let result = process("#define SIZE 64\nlet x: int = SIZE;");
        let expanded = texts(&result.tokens);
        assert!(expanded.contains(&"64".to_string()));
        assert!(!expanded.contains(&"SIZE".to_string()));
        assert!(result.macros.contains_key("SIZE"));
    }

    #[test]
    fn test_multi_token_replacement() {
        let result = process("#define TWICE 2 * X\nTWICE;");
        let kinds: Vec<_> = result.tokens.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::IntLiteral,
                TokenKind::Star,
                TokenKind::Identifier,
                TokenKind::Semicolon,
            ]
        );
    }

    #[test]
    fn test_expansion_is_not_rescanned() {
        // A expands to the identifier B; B is itself a macro, but the
        // replacement tokens must not expand again.
        let result = process("#define B 1\n#define A B\nA;");
        assert_eq!(result.tokens[0].kind, TokenKind::Identifier);
        assert_eq!(result.tokens[0].text(), "B");
    }

    #[test]
    fn test_redefinition_last_wins() {
        let result = process("#define N 1\n#define N 2\nN;");
        assert_eq!(result.tokens[0].text(), "2");
    }

    #[test]
    fn test_hash_not_at_line_start_passes_through() {
        let result = process("let x: int = 1; # define");
        assert!(result.tokens.iter().any(|t| t.kind == TokenKind::Hash));
    }

    #[test]
    fn test_if_defined_takes_branch() {
        let mut pp = Preprocessor::new(
            lex("#if defined(FEATURE)\nyes;\n#else\nno;\n#endif"),
            CompileTarget::Native,
        );
        pp.define("FEATURE", vec![Token::with_text(TokenKind::IntLiteral, 0, "1")]);
        let result = pp.process().unwrap();
        let names = texts(&result.tokens);
        assert!(names.contains(&"yes".to_string()));
        assert!(!names.contains(&"no".to_string()));
    }

    #[test]
    fn test_taken_branch_disables_later_arms() {
        let result = process("#if 1\nfirst;\n#elif 1\nsecond;\n#else\nthird;\n#endif");
        let names = texts(&result.tokens);
        assert!(names.contains(&"first".to_string()));
        assert!(!names.contains(&"second".to_string()));
        assert!(!names.contains(&"third".to_string()));
    }

    #[test]
    fn test_elif_chain_picks_first_true_arm() {
        let result = process("#if 0\na;\n#elif 0\nb;\n#elif 1\nc;\n#else\nd;\n#endif");
        let names = texts(&result.tokens);
        assert_eq!(names, vec!["c", "Semicolon"]);
    }

    #[test]
    fn test_else_taken_when_no_arm_matched() {
        let result = process("#if 0\na;\n#else\nb;\n#endif");
        let names = texts(&result.tokens);
        assert_eq!(names, vec!["b", "Semicolon"]);
    }

    #[test]
    fn test_negated_condition() {
        let result = process("#if !defined(MISSING_FEATURE_TAG)\nyes;\n#endif");
        assert!(texts(&result.tokens).contains(&"yes".to_string()));
        let result = process("#if !1\nyes;\n#endif");
        assert!(result.tokens.is_empty());
    }

    #[test]
    fn test_nested_conditionals_in_skipped_branch() {
        let source = "#if 0\n#if 1\ninner;\n#endif\nskipped;\n#else\nkept;\n#endif";
        let names = texts(&process(source).tokens);
        assert_eq!(names, vec!["kept", "Semicolon"]);
    }

    #[test]
    fn test_define_inside_skipped_branch_is_inert() {
        let result = process("#if 0\n#define GHOST 1\n#endif\nGHOST;");
        assert_eq!(result.tokens[0].kind, TokenKind::Identifier);
        assert!(!result.macros.contains_key("GHOST"));
    }

    #[test]
    fn test_unbalanced_if_fails() {
        let err = Preprocessor::new(lex("#if 1\nx;"), CompileTarget::Native)
            .process()
            .unwrap_err();
        assert!(matches!(err, CompileError::Preproc { .. }));
    }

    #[test]
    fn test_endif_without_if_fails() {
        let err = Preprocessor::new(lex("#endif"), CompileTarget::Native)
            .process()
            .unwrap_err();
        assert!(err.to_string().contains("#endif without matching #if"));
    }

    #[test]
    fn test_malformed_condition_fails() {
        let err = Preprocessor::new(lex("#if defined X\nx;\n#endif"), CompileTarget::Native)
            .process()
            .unwrap_err();
        assert!(err.to_string().contains("malformed #if condition"));
    }

    #[test]
    fn test_predefined_version_macros() {
        let result = process("_DLT_CC_NAME;");
        assert_eq!(result.tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(result.tokens[0].text(), crate::COMPILER_NAME);
        assert!(result.macros.contains_key("_DLT_CC"));
        assert!(result.macros.contains_key("_DLT_CC_VERSION"));
        assert!(result.macros.contains_key("_DLT_VERSION"));
    }

    #[test]
    fn test_wasm_target_macro() {
        let result = Preprocessor::new(lex("x;"), CompileTarget::Wasm)
            .process()
            .unwrap();
        assert!(result.macros.contains_key("_WASM"));
        assert!(!result.macros.contains_key("_WIN32"));
    }

    #[test]
    fn test_include_resolves_through_search_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = std::fs::File::create(dir.path().join("util.dlt")).unwrap();
        writeln!(file, "#define FROM_INCLUDE 7").unwrap();
        writeln!(file, "external void helper();").unwrap();
        drop(file);

        let pp = Preprocessor::new(
            lex("#include <util>\nlet x: int = FROM_INCLUDE;"),
            CompileTarget::Native,
        )
        .with_include_dirs(vec![dir.path().to_path_buf()]);
        let result = pp.process().unwrap();

        let names = texts(&result.tokens);
        assert!(names.contains(&"helper".to_string()));
        assert!(names.contains(&"7".to_string()));
        assert!(result.macros.contains_key("FROM_INCLUDE"));
    }

    #[test]
    fn test_missing_include_fails() {
        let err = Preprocessor::new(lex("#include <nowhere>"), CompileTarget::Native)
            .process()
            .unwrap_err();
        assert!(err.to_string().contains("include file not found: nowhere"));
    }
}

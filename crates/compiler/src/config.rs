//! Compiler configuration.
//!
//! [`CompilerConfig`] carries everything the pipeline and driver need for
//! one compilation: the include search path, the target, and link-time
//! extras. A project can also provide defaults in a `delta.toml` file.

use serde::Deserialize;
use std::path::PathBuf;

/// Compilation target. Only selects the predefined platform macro set in
/// the core; the driver additionally picks the external tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompileTarget {
    #[default]
    Native,
    Wasm,
}

impl CompileTarget {
    pub fn name(self) -> &'static str {
        match self {
            CompileTarget::Native => "native",
            CompileTarget::Wasm => "wasm",
        }
    }
}

/// Configuration for one compilation.
#[derive(Debug, Clone, Default)]
pub struct CompilerConfig {
    /// Ordered include directories searched by `#include <name>`.
    pub include_dirs: Vec<PathBuf>,
    pub target: CompileTarget,
    /// Keep the intermediate `.ll` file next to the output.
    pub keep_ir: bool,
    /// Extra arguments forwarded to the link step (libraries or objects).
    pub link_inputs: Vec<String>,
}

impl CompilerConfig {
    pub fn new() -> Self {
        CompilerConfig::default()
    }

    /// Add an include directory (builder pattern).
    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }

    pub fn with_include_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.include_dirs.extend(dirs);
        self
    }

    pub fn with_target(mut self, target: CompileTarget) -> Self {
        self.target = target;
        self
    }

    pub fn with_keep_ir(mut self, keep_ir: bool) -> Self {
        self.keep_ir = keep_ir;
        self
    }

    pub fn with_link_input(mut self, input: impl Into<String>) -> Self {
        self.link_inputs.push(input.into());
        self
    }

    /// Apply project-file defaults. Explicit settings win: project include
    /// dirs are appended after CLI ones, so they are searched last.
    pub fn merge_project(&mut self, project: &ProjectFile) {
        self.include_dirs
            .extend(project.include_dirs.iter().map(PathBuf::from));
        self.link_inputs.extend(project.link.iter().cloned());
    }
}

/// Optional `delta.toml` project file:
///
/// ```toml
/// include-dirs = ["stdlib", "vendor"]
/// link = ["-lm"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    #[serde(default, rename = "include-dirs")]
    pub include_dirs: Vec<String>,
    #[serde(default)]
    pub link: Vec<String>,
}

impl ProjectFile {
    pub fn from_toml(content: &str) -> Result<Self, String> {
        toml::from_str(content).map_err(|e| format!("invalid project file: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builder() {
        let config = CompilerConfig::new()
            .with_include_dir("stdlib")
            .with_target(CompileTarget::Wasm)
            .with_keep_ir(true)
            .with_link_input("-lm");

        assert_eq!(config.include_dirs, vec![PathBuf::from("stdlib")]);
        assert_eq!(config.target, CompileTarget::Wasm);
        assert!(config.keep_ir);
        assert_eq!(config.link_inputs, vec!["-lm"]);
    }

    #[test]
    fn test_project_file_parse_and_merge() {
        let project = ProjectFile::from_toml(
            r#"
            include-dirs = ["stdlib"]
            link = ["-lm"]
            "#,
        )
        .unwrap();

        let mut config = CompilerConfig::new().with_include_dir("local");
        config.merge_project(&project);

        assert_eq!(
            config.include_dirs,
            vec![PathBuf::from("local"), PathBuf::from("stdlib")]
        );
        assert_eq!(config.link_inputs, vec!["-lm"]);
    }

    #[test]
    fn test_project_file_rejects_unknown_keys() {
        assert!(ProjectFile::from_toml("optimize = true").is_err());
    }

    #[test]
    fn test_target_names() {
        assert_eq!(CompileTarget::Native.name(), "native");
        assert_eq!(CompileTarget::Wasm.name(), "wasm");
        assert_eq!(CompileTarget::default(), CompileTarget::Native);
    }
}

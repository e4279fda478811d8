//! Target triple and datalayout selection.
//!
//! The native pair is chosen from the host at compile time; the wasm
//! pair is fixed. Both strings must agree with what the external tools
//! the driver invokes expect.

use crate::config::CompileTarget;

/// Target triple for the given compilation target.
pub fn target_triple(target: CompileTarget) -> &'static str {
    match target {
        CompileTarget::Wasm => "wasm32-unknown-unknown",
        CompileTarget::Native => native_triple(),
    }
}

/// Datalayout string matching [`target_triple`].
pub fn target_datalayout(target: CompileTarget) -> &'static str {
    match target {
        CompileTarget::Wasm => "e-m:e-p:32:32-p10:8:8-p20:8:8-i64:64-n32:64-S128",
        CompileTarget::Native => native_datalayout(),
    }
}

fn native_triple() -> &'static str {
    #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
    {
        "arm64-apple-macosx14.0.0"
    }

    #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
    {
        "x86_64-apple-darwin"
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    {
        "x86_64-unknown-linux-gnu"
    }

    #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
    {
        "aarch64-unknown-linux-gnu"
    }

    #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
    {
        "x86_64-pc-windows-msvc"
    }

    #[cfg(not(any(
        all(target_os = "macos", target_arch = "aarch64"),
        all(target_os = "macos", target_arch = "x86_64"),
        all(target_os = "linux", target_arch = "x86_64"),
        all(target_os = "linux", target_arch = "aarch64"),
        all(target_os = "windows", target_arch = "x86_64")
    )))]
    {
        "unknown"
    }
}

fn native_datalayout() -> &'static str {
    #[cfg(all(target_os = "macos", target_arch = "aarch64"))]
    {
        "e-m:o-i64:64-i128:128-n32:64-S128"
    }

    #[cfg(all(target_os = "macos", target_arch = "x86_64"))]
    {
        "e-m:o-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
    }

    #[cfg(all(target_os = "linux", target_arch = "x86_64"))]
    {
        "e-m:e-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
    }

    #[cfg(all(target_os = "linux", target_arch = "aarch64"))]
    {
        "e-m:e-i8:8:32-i16:16:32-i64:64-i128:128-n32:64-S128"
    }

    #[cfg(all(target_os = "windows", target_arch = "x86_64"))]
    {
        "e-m:w-p270:32:32-p271:32:32-p272:64:64-i64:64-f80:128-n8:16:32:64-S128"
    }

    #[cfg(not(any(
        all(target_os = "macos", target_arch = "aarch64"),
        all(target_os = "macos", target_arch = "x86_64"),
        all(target_os = "linux", target_arch = "x86_64"),
        all(target_os = "linux", target_arch = "aarch64"),
        all(target_os = "windows", target_arch = "x86_64")
    )))]
    {
        "e-m:e-i64:64-n8:16:32:64-S128"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wasm_pair_is_fixed() {
        assert_eq!(target_triple(CompileTarget::Wasm), "wasm32-unknown-unknown");
        assert!(target_datalayout(CompileTarget::Wasm).starts_with("e-m:e-p:32:32"));
    }

    #[test]
    fn test_native_pair_is_nonempty() {
        assert!(!target_triple(CompileTarget::Native).is_empty());
        assert!(target_datalayout(CompileTarget::Native).starts_with("e-"));
    }
}

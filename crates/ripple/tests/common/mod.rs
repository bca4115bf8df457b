//! Common test utilities shared across integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Manifest used by the CLI tests.
pub const MODELS_YAML: &str = "\
types:
  Invoice:
    - name: Subtotal
    - name: Tax
    - name: Total
      depends-on: [Subtotal, Tax]
    - name: Summary
      depends-on: [Total, Subtotal]
  Loop:
    - name: A
      depends-on: [B]
    - name: B
      depends-on: [A]
    - name: C
      depends-on: [A]
";

/// Manifest containing a type with a self-dependency.
pub const BROKEN_YAML: &str = "\
types:
  Fine:
    - name: A
    - name: B
      depends-on: [A]
  Broken:
    - name: Total
      depends-on: [Total]
";

/// Path to the compiled ripple binary
pub fn ripple_binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_ripple"))
}

/// Write `content` to `name` inside `dir` and return the path
pub fn write_file(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

/// Run the ripple binary in the specified directory with colors disabled
pub fn run_ripple_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(ripple_binary())
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute ripple binary")
}

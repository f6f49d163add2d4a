//! Runs the binary with configuration discovery confined to a temp dir.
//!
//! Integration tests are compiled as separate crates (one per top-level file in
//! `tests/`). Include this helper with:
//!
//! ```rust
//! #[path = "common/isolated.rs"]
//! mod isolated;
//! ```

use std::path::Path;

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;

/// Builds a `boxctl` command with an empty environment whose home, XDG
/// config dir, and working directory all point at `root`.
pub fn boxctl(root: &Path) -> Command {
    let mut cmd = cargo_bin_cmd!("boxctl");
    cmd.env_clear()
        .env("HOME", root)
        .env("XDG_CONFIG_HOME", root.join("config"))
        .env("RUST_LOG", "warn")
        .current_dir(root);
    cmd
}

#![allow(dead_code)]

use std::path::Path;

use anyhow::Result;
use assert_cmd::Command;

/// An `anchor` invocation rooted at `cwd`.
pub fn anchor(cwd: &Path) -> Result<Command> {
    let mut cmd = Command::cargo_bin("anchor")?;
    cmd.current_dir(cwd);
    Ok(cmd)
}

// ObjPack - Self-contained OBJ asset packer
// Copyright (C) 2025 ObjPack Contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.


//! CLI command helpers.

use assert_cmd::Command;
use std::path::Path;

/// Get a Command for the objpack binary.
///
/// # Example
/// ```ignore
/// use objpack_test_utils::objpack;
///
/// objpack()
///     .arg("inspect")
///     .arg(model_dir.path())
///     .assert()
///     .success();
/// ```
#[allow(deprecated)] // cargo_bin is deprecated but still works for our use case
pub fn objpack() -> Command {
    Command::cargo_bin("objpack").expect("objpack binary not found")
}

/// Fluent wrapper for common objpack invocations.
pub struct ObjpackCommand {
    cmd: Command,
}

impl ObjpackCommand {
    /// Create a new ObjpackCommand.
    pub fn new() -> Self {
        Self { cmd: objpack() }
    }

    /// Add an argument to the command.
    pub fn arg(mut self, arg: impl AsRef<std::ffi::OsStr>) -> Self {
        self.cmd.arg(arg);
        self
    }

    /// Set an environment variable for the command.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.cmd.env(key, value);
        self
    }

    /// Execute the command and assert success.
    pub fn run_success(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().success()
    }

    /// Execute the command and assert failure.
    pub fn run_failure(mut self) -> assert_cmd::assert::Assert {
        self.cmd.assert().failure()
    }

    /// Pack `input` into a JSON manifest at `output`, quietly.
    pub fn pack(input: &Path, output: &Path) -> assert_cmd::assert::Assert {
        objpack()
            .arg("--quiet")
            .arg("pack")
            .arg(input)
            .arg("--output")
            .arg(output)
            .assert()
    }

    /// Inspect `input` as JSON.
    pub fn inspect_json(input: &Path) -> assert_cmd::assert::Assert {
        objpack()
            .arg("--quiet")
            .arg("inspect")
            .arg(input)
            .arg("--json")
            .assert()
    }
}

impl Default for ObjpackCommand {
    fn default() -> Self {
        Self::new()
    }
}

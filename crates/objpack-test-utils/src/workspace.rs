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


//! Temporary model directories.

use crate::fixtures::TestFixtures;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary model directory with automatic cleanup.
///
/// # Example
/// ```ignore
/// use objpack_test_utils::TestWorkspace;
///
/// let ws = TestWorkspace::new();
/// ws.write_text_file("cube.obj", TestFixtures::CUBE_OBJ);
/// ws.write_png("wood.png", 64, 64);
/// ```
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Create a new empty directory.
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Two triangles-worth of geometry split over `a.obj` and `b.obj`.
    pub fn two_part_model() -> Self {
        let ws = Self::new();
        ws.write_text_file("a.obj", TestFixtures::PART_A_OBJ);
        ws.write_text_file("b.obj", TestFixtures::PART_B_OBJ);
        ws
    }

    /// A textured cube: `cube.obj`, `cube.mtl` and a generated `wood.png`.
    pub fn textured_cube() -> Self {
        let ws = Self::new();
        ws.write_text_file("cube.obj", TestFixtures::CUBE_OBJ);
        ws.write_text_file("cube.mtl", TestFixtures::CUBE_MTL);
        ws.write_png("wood.png", 64, 32);
        ws
    }

    /// Get the path to the directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Get the path to a file in the directory.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Write a file, creating parent directories.
    pub fn write_file(&self, name: &str, content: &[u8]) -> PathBuf {
        let path = self.file_path(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create parent directories");
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// Write a text file.
    pub fn write_text_file(&self, name: &str, content: &str) -> PathBuf {
        self.write_file(name, content.as_bytes())
    }

    /// Write a generated opaque PNG.
    pub fn write_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.write_file(name, &TestFixtures::png(width, height))
    }

    /// Write a generated PNG with a half-transparent alpha channel.
    pub fn write_translucent_png(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.write_file(name, &TestFixtures::translucent_png(width, height))
    }

    /// Write a generated JPEG.
    pub fn write_jpeg(&self, name: &str, width: u32, height: u32) -> PathBuf {
        self.write_file(name, &TestFixtures::jpeg(width, height))
    }

    /// Read a text file.
    pub fn read_text_file(&self, name: &str) -> String {
        fs::read_to_string(self.file_path(name)).expect("Failed to read text file")
    }

    /// Check if a file exists.
    pub fn file_exists(&self, name: &str) -> bool {
        self.file_path(name).exists()
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

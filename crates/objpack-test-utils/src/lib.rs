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


//! # ObjPack Test Utilities
//!
//! Shared test utilities for ObjPack crates providing:
//! - CLI command helpers for running the `objpack` binary
//! - Temporary model directories with automatic cleanup
//! - Sample geometry, material and generated texture fixtures

pub mod cli;
pub mod fixtures;
pub mod workspace;

// Re-export commonly used items at crate root
pub use cli::{objpack, ObjpackCommand};
pub use fixtures::TestFixtures;
pub use workspace::TestWorkspace;

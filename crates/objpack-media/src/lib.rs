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

//! Self-contained OBJ asset packing
//!
//! This crate provides:
//! - Wavefront geometry merging with face index re-offsetting
//! - Material library parsing, texture reference rewriting and serialization
//! - Texture downscaling and re-encoding into base64 data URIs
//! - Manifest assembly with per-asset diagnostics

pub mod diagnostics;
pub mod error;
pub mod geometry;
pub mod manifest;
pub mod material;
pub mod texture;

// Re-export commonly used types
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{MediaError, Result};
pub use geometry::{
    GeometryDocument, GeometryMerger, GeometrySource, GeometryStats, MergeOffsets, MergedGeometry,
};
pub use manifest::{
    default_title, AssemblyReport, AssetManifest, DiscoveredInputs, ManifestAssembler,
    ManifestOptions, ManifestSink, TextureSelection, OUTPUT_SIZE_WARNING_BYTES,
};
pub use material::{extract_texture_path, Material, MaterialLibrary, TextureReferenceMap, TextureSlot};
pub use texture::{
    OutputFormat, SourceFormat, TextureAsset, TextureOutcome, TextureTranscoder, TranscodeOptions,
    TranscodeStats,
};

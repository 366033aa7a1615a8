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

#![allow(clippy::unwrap_used)]
//! End-to-end tests for manifest assembly
//!
//! These tests run the whole pipeline against generated model directories:
//! - Multi-file geometry merge with index offsets
//! - Material texture rewriting and missing texture reporting
//! - Texture selection with and without a material library

use objpack_media::{
    DiagnosticKind, ManifestAssembler, ManifestOptions, MaterialLibrary, TextureSlot,
    TranscodeOptions,
};
use objpack_test_utils::{TestFixtures, TestWorkspace};

#[tokio::test]
async fn test_two_part_merge() {
    let ws = TestWorkspace::two_part_model();

    let manifest = ManifestAssembler::default().assemble(ws.path()).await.unwrap();

    let faces: Vec<&str> = manifest
        .geometry
        .lines()
        .filter(|line| line.starts_with("f "))
        .collect();
    assert_eq!(faces, vec!["f 1 2", "f 3 4 5"]);
    assert!(manifest.geometry.contains("# === File 2: b.obj ==="));

    let stats = &manifest.report.geometry;
    assert_eq!(stats.vertices, 5);
    assert_eq!(stats.faces, 2);
    assert_eq!(stats.files_merged, 2);
}

#[tokio::test]
async fn test_textured_model_rewrites_found_textures_only() {
    let ws = TestWorkspace::textured_cube();

    let manifest = ManifestAssembler::default().assemble(ws.path()).await.unwrap();

    // Found texture is embedded and the material points at its payload
    let payload = manifest.textures.get("wood.png").unwrap();
    assert!(payload.starts_with("data:image/png;base64,"));
    assert_eq!(manifest.textures.len(), 1);

    let library = MaterialLibrary::parse(&manifest.materials).library;
    assert_eq!(
        library.get("wood").unwrap().texture(TextureSlot::Diffuse),
        Some(payload.as_str())
    );

    // Missing texture keeps its reference and is reported
    assert!(manifest.materials.contains("map_Kd missing.jpg"));
    assert!(!manifest.textures.contains_key("missing.jpg"));
    let missing: Vec<_> = manifest
        .report
        .diagnostics_of(DiagnosticKind::MissingTexture)
        .collect();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0].subject, "missing.jpg");

    assert_eq!(manifest.report.material_count, 2);
    assert_eq!(manifest.report.textures.processed, 1);
}

#[tokio::test]
async fn test_without_library_every_texture_is_embedded() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_png("albedo.png", 8, 8);
    ws.write_jpeg("rough.jpg", 8, 8);

    let manifest = ManifestAssembler::default().assemble(ws.path()).await.unwrap();

    assert_eq!(manifest.materials, "");
    assert_eq!(
        manifest.textures.keys().cloned().collect::<Vec<_>>(),
        vec!["albedo.png".to_string(), "rough.jpg".to_string()]
    );
    assert!(manifest.textures["rough.jpg"].starts_with("data:image/jpeg;base64,"));
}

#[tokio::test]
async fn test_unmatched_references_embed_nothing() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_text_file("mesh.mtl", "newmtl stone\nmap_Kd stone.jpg\n");
    ws.write_png("unrelated.png", 8, 8);

    let manifest = ManifestAssembler::default().assemble(ws.path()).await.unwrap();

    assert!(manifest.textures.is_empty());
    assert!(manifest.materials.contains("map_Kd stone.jpg"));
    assert_eq!(
        manifest
            .report
            .diagnostics_of(DiagnosticKind::UnmatchedTextures)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_webp_conversion_and_downscale() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_translucent_png("glass.png", 256, 64);

    let assembler = ManifestAssembler::new(ManifestOptions {
        transcode: TranscodeOptions {
            max_resolution: Some(128),
            convert_to_webp: true,
            ..Default::default()
        },
        ..Default::default()
    });
    let manifest = assembler.assemble(ws.path()).await.unwrap();

    assert!(manifest.textures["glass.png"].starts_with("data:image/webp;base64,"));
    let stats = &manifest.report.textures;
    assert_eq!(stats.downscaled_count, 1);
    assert_eq!(stats.converted_count, 1);
}

#[tokio::test]
async fn test_corrupt_texture_is_skipped_and_reported() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_file("broken.png", b"definitely not a png");
    ws.write_png("fine.png", 4, 4);

    let manifest = ManifestAssembler::default().assemble(ws.path()).await.unwrap();

    assert!(manifest.textures.contains_key("fine.png"));
    assert!(!manifest.textures.contains_key("broken.png"));
    assert_eq!(manifest.report.textures.skipped, 1);
    assert_eq!(
        manifest
            .report
            .diagnostics_of(DiagnosticKind::TranscodeFailure)
            .count(),
        1
    );
}

#[tokio::test]
async fn test_single_file_mode_finds_sibling_textures() {
    let ws = TestWorkspace::textured_cube();

    let manifest = ManifestAssembler::default()
        .assemble(&ws.file_path("cube.obj"))
        .await
        .unwrap();

    assert!(manifest.textures.contains_key("wood.png"));
    assert_eq!(manifest.report.geometry.files_merged, 1);
    assert_eq!(manifest.geometry, TestFixtures::CUBE_OBJ);
}

#[tokio::test]
async fn test_missing_input_is_fatal() {
    let ws = TestWorkspace::new();
    let err = ManifestAssembler::default()
        .assemble(&ws.file_path("ghost.obj"))
        .await
        .unwrap_err();
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_inspect_skips_transcoding() {
    let ws = TestWorkspace::textured_cube();

    let report = ManifestAssembler::default().inspect(ws.path()).await.unwrap();

    assert_eq!(report.material_count, 2);
    assert!(report.referenced_textures.contains("wood.png"));
    assert!(report.referenced_textures.contains("missing.jpg"));
    assert_eq!(report.textures.processed, 0);
    assert_eq!(report.estimated_output_bytes, 0);
}

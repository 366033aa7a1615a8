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
//! CLI tests for `objpack pack`, `objpack inspect` and the utility commands

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use objpack_test_utils::{objpack, ObjpackCommand, TestFixtures, TestWorkspace};
use predicates::prelude::*;
use serde_json::Value;

fn read_json(ws: &TestWorkspace, name: &str) -> Value {
    serde_json::from_str(&ws.read_text_file(name)).unwrap()
}

// ============================================================================
// pack
// ============================================================================

#[test]
fn test_pack_two_part_model() {
    let ws = TestWorkspace::two_part_model();
    let out = ws.file_path("out/model.json");

    ObjpackCommand::pack(ws.path(), &out).success();

    let packed = read_json(&ws, "out/model.json");
    let geometry = packed["geometry"].as_str().unwrap();
    assert!(geometry.contains("f 1 2\n"));
    assert!(geometry.contains("f 3 4 5\n"));
    assert_eq!(packed["materials"], "");
    assert_eq!(packed["report"]["geometry"]["vertices"], 5);
    assert_eq!(packed["report"]["geometry"]["files_merged"], 2);
}

#[test]
fn test_pack_embeds_textures_and_keeps_missing_reference() {
    let ws = TestWorkspace::textured_cube();
    let out = ws.file_path("cube.json");

    ObjpackCommand::pack(ws.path(), &out).success();

    let packed = read_json(&ws, "cube.json");
    let uri = packed["textures"]["wood.png"].as_str().unwrap();
    let payload = uri.strip_prefix("data:image/png;base64,").unwrap();
    let bytes = STANDARD.decode(payload).unwrap();
    assert!(bytes.starts_with(b"\x89PNG"));

    let materials = packed["materials"].as_str().unwrap();
    assert!(materials.contains(&format!("map_Kd {}", uri)));
    assert!(materials.contains("map_Kd missing.jpg"));
    assert!(packed["textures"].get("missing.jpg").is_none());

    let diagnostics = packed["report"]["diagnostics"].as_array().unwrap();
    assert!(diagnostics
        .iter()
        .any(|d| d["kind"] == "missing_texture" && d["subject"] == "missing.jpg"));
}

#[test]
fn test_pack_title_defaults_to_input_name() {
    let ws = TestWorkspace::textured_cube();
    let out = ws.file_path("cube.json");

    objpack()
        .arg("--quiet")
        .arg("pack")
        .arg(ws.file_path("cube.obj"))
        .arg("-o")
        .arg(&out)
        .assert()
        .success();
    assert_eq!(read_json(&ws, "cube.json")["title"], "cube");

    objpack()
        .arg("--quiet")
        .arg("pack")
        .arg(ws.path())
        .arg("-o")
        .arg(&out)
        .arg("--title")
        .arg("Crate")
        .assert()
        .success();
    assert_eq!(read_json(&ws, "cube.json")["title"], "Crate");
}

#[test]
fn test_pack_webp_and_downscale_flags() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_jpeg("photo.jpg", 300, 100);

    objpack()
        .arg("--quiet")
        .arg("pack")
        .arg(ws.path())
        .arg("-o")
        .arg(ws.file_path("mesh.json"))
        .arg("--webp")
        .arg("--max-texture-size")
        .arg("150")
        .assert()
        .success();

    let packed = read_json(&ws, "mesh.json");
    assert!(packed["textures"]["photo.jpg"]
        .as_str()
        .unwrap()
        .starts_with("data:image/webp;base64,"));
    assert_eq!(packed["report"]["textures"]["downscaled_count"], 1);
    assert_eq!(packed["report"]["textures"]["converted_count"], 1);
}

#[test]
fn test_pack_reads_config_file() {
    let ws = TestWorkspace::new();
    ws.write_text_file("mesh.obj", TestFixtures::PART_B_OBJ);
    ws.write_png("big.png", 400, 200);
    let config = ws.write_text_file("objpack.toml", "[textures]\nmax_resolution = 100\n\n[output]\ntitle = \"Configured\"\n");

    objpack()
        .arg("--quiet")
        .arg("--config")
        .arg(&config)
        .arg("pack")
        .arg(ws.path())
        .arg("-o")
        .arg(ws.file_path("mesh.json"))
        .assert()
        .success();

    let packed = read_json(&ws, "mesh.json");
    assert_eq!(packed["title"], "Configured");
    assert_eq!(packed["report"]["textures"]["downscaled_count"], 1);
}

#[test]
fn test_pack_summary_output() {
    let ws = TestWorkspace::textured_cube();

    objpack()
        .arg("pack")
        .arg(ws.path())
        .arg("-o")
        .arg(ws.file_path("cube.json"))
        .env("OBJPACK_LOG_LEVEL", "error")
        .assert()
        .success()
        .stdout(predicate::str::contains("Packed"))
        .stdout(predicate::str::contains("Vertices"))
        .stdout(predicate::str::contains("missing.jpg"));
}

#[test]
fn test_pack_missing_input_fails() {
    let ws = TestWorkspace::new();

    ObjpackCommand::pack(&ws.file_path("ghost.obj"), &ws.file_path("out.json"))
        .failure()
        .stderr(predicate::str::contains("not found"));
    assert!(!ws.file_exists("out.json"));
}

#[test]
fn test_pack_directory_without_geometry_fails() {
    let ws = TestWorkspace::new();
    ws.write_png("lonely.png", 4, 4);

    ObjpackCommand::pack(ws.path(), &ws.file_path("out.json"))
        .failure()
        .stderr(predicate::str::contains(".obj"));
}

#[test]
fn test_pack_rejects_invalid_quality() {
    let ws = TestWorkspace::two_part_model();

    ObjpackCommand::new()
        .arg("--quiet")
        .arg("pack")
        .arg(ws.path())
        .arg("--jpeg-quality")
        .arg("0")
        .run_failure()
        .stderr(predicate::str::contains("jpeg_quality"));
}

#[test]
fn test_bad_env_override_fails() {
    let ws = TestWorkspace::two_part_model();

    ObjpackCommand::new()
        .arg("pack")
        .arg(ws.path())
        .env("OBJPACK_WEBP", "sometimes")
        .run_failure()
        .stderr(predicate::str::contains("OBJPACK_WEBP"));
}

// ============================================================================
// inspect
// ============================================================================

#[test]
fn test_inspect_json() {
    let ws = TestWorkspace::textured_cube();

    let assert = ObjpackCommand::inspect_json(ws.path()).success();
    let report: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(report["material_count"], 2);
    assert_eq!(report["geometry"]["faces"], 3);
    let referenced: Vec<&str> = report["referenced_textures"]
        .as_array()
        .unwrap()
        .iter()
        .map(|v| v.as_str().unwrap())
        .collect();
    assert_eq!(referenced, vec!["missing.jpg", "wood.png"]);
}

#[test]
fn test_inspect_human_output() {
    let ws = TestWorkspace::textured_cube();

    ObjpackCommand::new()
        .arg("--quiet")
        .arg("inspect")
        .arg(ws.path())
        .run_success()
        .stdout(predicate::str::contains("Model Inspection"))
        .stdout(predicate::str::contains("wood.png"));
}

// ============================================================================
// utility commands
// ============================================================================

#[test]
fn test_version() {
    objpack()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("objpack"));
}

#[test]
fn test_completions() {
    objpack()
        .arg("completions")
        .arg("bash")
        .assert()
        .success()
        .stdout(predicate::str::contains("objpack"));
}

#[test]
fn test_invalid_color_option() {
    objpack()
        .arg("--color")
        .arg("rainbow")
        .arg("version")
        .assert()
        .failure();
}

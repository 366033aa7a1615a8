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

use super::pack::manifest_options;
use crate::output;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use objpack_config::Config;
use objpack_media::{AssemblyReport, ManifestAssembler};
use std::path::PathBuf;

/// Report geometry, materials and texture references without transcoding
#[derive(Parser, Debug)]
pub struct InspectCmd {
    /// An .obj file or a directory of .obj/.mtl/texture files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Format as JSON
    #[arg(long)]
    pub json: bool,
}

impl InspectCmd {
    pub async fn execute(&self, config: Config) -> Result<()> {
        let report = ManifestAssembler::new(manifest_options(&config))
            .inspect(&self.input)
            .await
            .with_context(|| format!("Failed to inspect {}", self.input.display()))?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&report)?);
        } else {
            print_report(&report);
        }
        Ok(())
    }
}

fn print_report(report: &AssemblyReport) {
    println!("{} Model Inspection\n", style("🔍").cyan().bold());

    println!("{}", style("Inputs:").bold());
    for path in &report.inputs.geometry {
        output::detail("Geometry", &path.display().to_string());
    }
    for path in &report.inputs.material_libraries {
        output::detail("Material library", &path.display().to_string());
    }
    output::detail("Texture files", &report.inputs.textures.len().to_string());
    println!();

    let geometry = &report.geometry;
    println!("{}", style("Geometry:").bold());
    output::detail("Vertices", &geometry.vertices.to_string());
    output::detail("Faces", &geometry.faces.to_string());
    output::detail("Normals", &geometry.normals.to_string());
    output::detail("Texture coords", &geometry.texcoords.to_string());
    output::detail("Groups", &geometry.groups.to_string());
    output::detail("Objects", &geometry.objects.to_string());
    if let Some(bounds) = &geometry.bounds {
        output::detail(
            "Bounds",
            &format!(
                "({:.3}, {:.3}, {:.3}) .. ({:.3}, {:.3}, {:.3})",
                bounds.min.0, bounds.min.1, bounds.min.2, bounds.max.0, bounds.max.1, bounds.max.2
            ),
        );
    }
    println!();

    println!("{}", style("Materials:").bold());
    match &report.material_library {
        Some(library) => {
            output::detail("Library", &library.display().to_string());
            output::detail("Materials", &report.material_count.to_string());
            for texture in &report.referenced_textures {
                output::detail("Texture", texture);
            }
        }
        None => output::info("No material library found"),
    }

    if !report.diagnostics.is_empty() {
        println!();
        for diagnostic in &report.diagnostics {
            output::warning(&diagnostic.to_string());
        }
    }
}

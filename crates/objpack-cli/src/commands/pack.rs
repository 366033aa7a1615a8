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

use crate::output;
use crate::progress::{format_bytes, spinner};
use crate::sink::JsonManifestSink;
use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use objpack_config::{Config, Validator};
use objpack_media::{
    default_title, AssetManifest, ManifestAssembler, ManifestOptions, ManifestSink,
    TranscodeOptions,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// Pack a model into a self-contained JSON manifest
#[derive(Parser, Debug)]
pub struct PackCmd {
    /// An .obj file or a directory of .obj/.mtl/texture files
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output file [default: <input name>.objpack.json]
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Downscale textures so the longer side is at most this many pixels
    #[arg(long, value_name = "PIXELS")]
    pub max_texture_size: Option<u32>,

    /// Re-encode every texture as WebP
    #[arg(long)]
    pub webp: bool,

    /// JPEG quality (1-100)
    #[arg(long, value_name = "QUALITY")]
    pub jpeg_quality: Option<u8>,

    /// WebP quality (1-100)
    #[arg(long, value_name = "QUALITY")]
    pub webp_quality: Option<u8>,

    /// Title recorded in the manifest [default: input name]
    #[arg(long)]
    pub title: Option<String>,

    /// Transcode textures one at a time
    #[arg(long)]
    pub sequential: bool,
}

impl PackCmd {
    pub async fn execute(&self, mut config: Config, quiet: bool) -> Result<()> {
        self.apply_to(&mut config);
        config.validate().context("Invalid settings")?;

        let title = config
            .output
            .title
            .clone()
            .unwrap_or_else(|| default_title(&self.input));
        let output_path = self
            .output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input));

        let assembler = ManifestAssembler::new(manifest_options(&config));

        let pb = spinner(&format!("Packing {}", self.input.display()), quiet);
        let manifest = assembler.assemble(&self.input).await;
        pb.finish_and_clear();
        let manifest = manifest.with_context(|| format!("Failed to pack {}", self.input.display()))?;

        JsonManifestSink::new(&output_path).emit(&manifest, &title)?;
        info!("Wrote {}", output_path.display());

        if !quiet {
            print_summary(&manifest, &output_path);
        }
        Ok(())
    }

    /// Command-line flags override configured values
    fn apply_to(&self, config: &mut Config) {
        let textures = &mut config.textures;
        if let Some(size) = self.max_texture_size {
            textures.max_resolution = Some(size);
        }
        if self.webp {
            textures.convert_to_webp = true;
        }
        if let Some(quality) = self.jpeg_quality {
            textures.jpeg_quality = quality;
        }
        if let Some(quality) = self.webp_quality {
            textures.webp_quality = quality;
        }
        if self.sequential {
            textures.parallel = false;
        }
        if let Some(title) = &self.title {
            config.output.title = Some(title.clone());
        }
    }
}

pub(crate) fn manifest_options(config: &Config) -> ManifestOptions {
    let textures = &config.textures;
    ManifestOptions {
        transcode: TranscodeOptions {
            max_resolution: textures.max_resolution,
            convert_to_webp: textures.convert_to_webp,
            jpeg_quality: textures.jpeg_quality,
            webp_quality: textures.webp_quality,
            max_decode_dimension: textures.max_decode_dimension,
            parallel: textures.parallel,
        },
        size_warning_bytes: config.output.size_warning_bytes(),
    }
}

fn default_output_path(input: &Path) -> PathBuf {
    PathBuf::from(format!("{}.objpack.json", default_title(input)))
}

fn print_summary(manifest: &AssetManifest, output_path: &Path) {
    let report = &manifest.report;
    let geometry = &report.geometry;

    output::success(&format!("Packed {}", output_path.display()));

    println!("{}", style("Geometry:").bold());
    output::detail("Files merged", &geometry.files_merged.to_string());
    output::detail("Vertices", &geometry.vertices.to_string());
    output::detail("Faces", &geometry.faces.to_string());
    output::detail("Normals", &geometry.normals.to_string());
    output::detail("Texture coords", &geometry.texcoords.to_string());

    if let Some(library) = &report.material_library {
        println!("{}", style("Materials:").bold());
        output::detail("Library", &library.display().to_string());
        output::detail("Materials", &report.material_count.to_string());
        output::detail("Textures referenced", &report.referenced_textures.len().to_string());
    }

    let textures = &report.textures;
    if textures.processed + textures.skipped > 0 {
        println!("{}", style("Textures:").bold());
        output::detail("Embedded", &textures.processed.to_string());
        output::detail("Skipped", &textures.skipped.to_string());
        output::detail("Downscaled", &textures.downscaled_count.to_string());
        output::detail("Converted", &textures.converted_count.to_string());
        output::detail(
            "Size",
            &format!(
                "{} -> {} (base64, {:.1}% reduction)",
                format_bytes(textures.total_original_bytes),
                format_bytes(textures.total_encoded_bytes),
                textures.compression_ratio_percent()
            ),
        );
    }

    output::detail("Estimated output", &format_bytes(report.estimated_output_bytes));

    for diagnostic in &report.diagnostics {
        output::warning(&diagnostic.to_string());
    }
}

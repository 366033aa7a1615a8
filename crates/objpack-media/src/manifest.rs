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

//! Asset manifest assembly
//!
//! Ties the geometry merger, material resolver and texture transcoder
//! together: discovers inputs, merges geometry, resolves the material
//! library, transcodes the textures it needs and rewrites material texture
//! slots with the resulting data URIs.
//!
//! Only a missing or unusable primary input aborts assembly. Everything
//! else is recorded as a [`Diagnostic`] on the [`AssemblyReport`].

use crate::diagnostics::{Diagnostic, DiagnosticKind};
use crate::error::{MediaError, Result};
use crate::geometry::{GeometryDocument, GeometryMerger, GeometryStats, MergedGeometry};
use crate::material::{MaterialLibrary, TextureReferenceMap};
use crate::texture::{
    TextureBatch, TextureOutcome, TextureTranscoder, TranscodeOptions, TranscodeStats,
    SUPPORTED_EXTENSIONS,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

/// Combined output size above which an `OversizedOutput` warning is raised
pub const OUTPUT_SIZE_WARNING_BYTES: u64 = 50 * 1024 * 1024;

fn has_extension(path: &Path, wanted: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| wanted.iter().any(|w| ext.eq_ignore_ascii_case(w)))
        .unwrap_or(false)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Last path component of a texture reference (separators already normalized)
fn reference_basename(reference: &str) -> &str {
    reference.rsplit('/').next().unwrap_or(reference)
}

/// Files found for one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredInputs {
    /// Geometry files in merge order
    pub geometry: Vec<PathBuf>,
    /// Material library candidates, most likely first
    pub material_libraries: Vec<PathBuf>,
    /// Texture files with a supported extension, sorted
    pub textures: Vec<PathBuf>,
}

impl DiscoveredInputs {
    /// Discover inputs from a single `.obj` file or a directory
    #[instrument(skip(input), fields(input = %input.display()))]
    pub fn discover(input: &Path) -> Result<Self> {
        if !input.exists() {
            return Err(MediaError::NotFound(input.to_path_buf()));
        }

        if input.is_file() {
            return Self::discover_file(input);
        }

        let (geometry, mut material_libraries, textures) = Self::scan(input)?;
        if geometry.is_empty() {
            return Err(MediaError::InvalidInput(format!(
                "no .obj files found in {}",
                input.display()
            )));
        }
        material_libraries.sort();

        info!(
            "Discovered {} geometry files, {} material libraries, {} textures",
            geometry.len(),
            material_libraries.len(),
            textures.len()
        );
        Ok(DiscoveredInputs {
            geometry,
            material_libraries,
            textures,
        })
    }

    fn discover_file(input: &Path) -> Result<Self> {
        if !has_extension(input, &["obj"]) {
            return Err(MediaError::InvalidInput(format!(
                "expected an .obj file, got {}",
                input.display()
            )));
        }

        let dir = match input.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let (_, mut material_libraries, textures) = Self::scan(&dir)?;

        // Same-stem library first, then the rest in sorted order
        let stem = input.file_stem().map(|s| s.to_os_string());
        material_libraries.sort_by_key(|path| (path.file_stem().map(|s| s.to_os_string()) != stem, path.clone()));

        Ok(DiscoveredInputs {
            geometry: vec![input.to_path_buf()],
            material_libraries,
            textures,
        })
    }

    fn scan(dir: &Path) -> Result<(Vec<PathBuf>, Vec<PathBuf>, Vec<PathBuf>)> {
        let mut geometry = Vec::new();
        let mut materials = Vec::new();
        let mut textures = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|e| MediaError::IoError(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.into_path();
            if has_extension(&path, &["obj"]) {
                geometry.push(path);
            } else if has_extension(&path, &["mtl"]) {
                materials.push(path);
            } else if has_extension(&path, &SUPPORTED_EXTENSIONS) {
                textures.push(path);
            }
        }

        Ok((geometry, materials, textures))
    }

    /// Pick the material library: one named by `mtllib` if present, else the first candidate
    pub fn select_material_library(&self, mtllib_names: &[String]) -> Option<&Path> {
        self.material_libraries
            .iter()
            .find(|candidate| {
                let name = file_name(candidate);
                mtllib_names
                    .iter()
                    .any(|wanted| reference_basename(&wanted.replace('\\', "/")) == name)
            })
            .or_else(|| self.material_libraries.first())
            .map(PathBuf::as_path)
    }
}

/// Which discovered textures are transcoded
///
/// A run without texture references (no library, or a library that names no
/// textures) embeds every discovered texture. A run with references embeds
/// only the matching files, and nothing at all when none match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextureSelection {
    /// Embed every discovered texture
    AllDiscovered,
    /// Embed only files matching these references
    Referenced(BTreeSet<String>),
}

impl TextureSelection {
    /// Policy for a set of material texture references
    pub fn from_references(references: BTreeSet<String>) -> Self {
        if references.is_empty() {
            TextureSelection::AllDiscovered
        } else {
            TextureSelection::Referenced(references)
        }
    }

    /// Whether a texture file name is wanted
    pub fn matches(&self, name: &str) -> bool {
        match self {
            TextureSelection::AllDiscovered => true,
            TextureSelection::Referenced(references) => references
                .iter()
                .any(|reference| reference == name || reference_basename(reference) == name),
        }
    }

    /// Filter candidates, preserving their order
    pub fn select(&self, candidates: &[PathBuf]) -> Vec<PathBuf> {
        candidates
            .iter()
            .filter(|path| self.matches(&file_name(path)))
            .cloned()
            .collect()
    }
}

/// Assembler settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
    /// Texture transcoding settings
    pub transcode: TranscodeOptions,
    /// Soft threshold for the combined payload size
    pub size_warning_bytes: u64,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        ManifestOptions {
            transcode: TranscodeOptions::default(),
            size_warning_bytes: OUTPUT_SIZE_WARNING_BYTES,
        }
    }
}

/// Everything reported about a run besides the payload itself
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AssemblyReport {
    /// Files the run used
    pub inputs: DiscoveredInputs,
    /// Material library that was parsed, if any
    pub material_library: Option<PathBuf>,
    /// Merged geometry statistics
    pub geometry: GeometryStats,
    /// Materials in the library
    pub material_count: usize,
    /// Texture references found in the library
    pub referenced_textures: BTreeSet<String>,
    /// Texture transcoding statistics
    pub textures: TranscodeStats,
    /// Combined size of geometry, materials and texture payloads
    pub estimated_output_bytes: u64,
    /// Every warning raised during the run
    pub diagnostics: Vec<Diagnostic>,
}

impl AssemblyReport {
    /// Diagnostics of one kind
    pub fn diagnostics_of(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(move |d| d.kind == kind)
    }
}

/// The self-contained asset triple plus its report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetManifest {
    /// Merged geometry text
    pub geometry: String,
    /// Serialized material library, empty when there is none
    pub materials: String,
    /// Texture base filename to data URI
    pub textures: BTreeMap<String, String>,
    /// Statistics and diagnostics
    pub report: AssemblyReport,
}

/// Receiver of a finished manifest (HTML templating, JSON dump, ...)
pub trait ManifestSink {
    /// Write the manifest out under the given title
    fn emit(&self, manifest: &AssetManifest, title: &str) -> Result<()>;
}

/// Title used when none is configured: file stem or directory name
pub fn default_title(input: &Path) -> String {
    let name = if input.is_file() {
        input.file_stem()
    } else {
        input.file_name()
    };
    name.map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

/// Geometry and materials resolved, textures not yet transcoded
struct Prepared {
    inputs: DiscoveredInputs,
    geometry: MergedGeometry,
    library_path: Option<PathBuf>,
    library: Option<MaterialLibrary>,
    referenced: BTreeSet<String>,
    diagnostics: Vec<Diagnostic>,
}

/// Asset manifest assembler
#[derive(Debug, Clone, Default)]
pub struct ManifestAssembler {
    options: ManifestOptions,
}

impl ManifestAssembler {
    /// Create an assembler
    pub fn new(options: ManifestOptions) -> Self {
        ManifestAssembler { options }
    }

    /// Build the manifest for a file or directory
    #[instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn assemble(&self, input: &Path) -> Result<AssetManifest> {
        let mut prepared = self.prepare(input).await?;

        let selection = TextureSelection::from_references(prepared.referenced.clone());
        let selected = selection.select(&prepared.inputs.textures);
        if matches!(selection, TextureSelection::Referenced(_)) && selected.is_empty() {
            prepared.diagnostics.push(Diagnostic::new(
                DiagnosticKind::UnmatchedTextures,
                prepared
                    .library_path
                    .as_deref()
                    .map(file_name)
                    .unwrap_or_default(),
                "no matching textures found for material references",
            ));
        }
        debug!("Selected {} of {} textures", selected.len(), prepared.inputs.textures.len());

        let batch = self.transcode(selected).await?;

        let mut textures = BTreeMap::new();
        for outcome in batch.outcomes {
            match outcome {
                TextureOutcome::Processed(asset) => {
                    textures.insert(asset.name, asset.data_uri);
                }
                TextureOutcome::Skipped { name, error, .. } => {
                    prepared.diagnostics.push(Diagnostic::from_error(name, &error));
                }
            }
        }

        let materials = match prepared.library.as_mut() {
            Some(library) => {
                let mut references = TextureReferenceMap::new();
                for reference in &prepared.referenced {
                    if let Some(uri) = textures.get(reference_basename(reference)) {
                        references.insert(reference.as_str(), uri.as_str());
                    }
                }
                let rewritten = library.update_texture_paths(&references);
                debug!("Rewrote {} texture slots", rewritten);
                library.to_mtl_string()
            }
            None => String::new(),
        };

        let estimated_output_bytes = prepared.geometry.content.len() as u64
            + materials.len() as u64
            + textures.values().map(|uri| uri.len() as u64).sum::<u64>();
        if estimated_output_bytes > self.options.size_warning_bytes {
            prepared.diagnostics.push(Diagnostic::new(
                DiagnosticKind::OversizedOutput,
                "output",
                format!(
                    "combined payload is {} bytes, above the {} byte threshold; consider a smaller max texture resolution",
                    estimated_output_bytes, self.options.size_warning_bytes
                ),
            ));
        }

        info!(
            "Assembled manifest: {} textures embedded, {} diagnostics",
            textures.len(),
            prepared.diagnostics.len()
        );

        Ok(AssetManifest {
            geometry: prepared.geometry.content,
            materials,
            textures,
            report: AssemblyReport {
                inputs: prepared.inputs,
                material_library: prepared.library_path,
                geometry: prepared.geometry.stats,
                material_count: prepared.library.as_ref().map_or(0, MaterialLibrary::len),
                referenced_textures: prepared.referenced,
                textures: batch.stats,
                estimated_output_bytes,
                diagnostics: prepared.diagnostics,
            },
        })
    }

    /// Resolve inputs, geometry and materials without transcoding
    ///
    /// The returned report has empty texture statistics and no payload size.
    #[instrument(skip(self, input), fields(input = %input.display()))]
    pub async fn inspect(&self, input: &Path) -> Result<AssemblyReport> {
        let prepared = self.prepare(input).await?;
        Ok(AssemblyReport {
            inputs: prepared.inputs,
            material_library: prepared.library_path,
            geometry: prepared.geometry.stats,
            material_count: prepared.library.as_ref().map_or(0, MaterialLibrary::len),
            referenced_textures: prepared.referenced,
            textures: TranscodeStats::default(),
            estimated_output_bytes: 0,
            diagnostics: prepared.diagnostics,
        })
    }

    async fn prepare(&self, input: &Path) -> Result<Prepared> {
        let inputs = DiscoveredInputs::discover(input)?;
        let geometry = GeometryMerger::new().merge_files(&inputs.geometry).await?;

        let mut diagnostics: Vec<Diagnostic> = GeometryDocument::parse(&geometry.content)
            .dangling_references()
            .into_iter()
            .map(|dangling| {
                Diagnostic::new(
                    DiagnosticKind::DanglingReference,
                    format!("face {}", dangling.face),
                    format!("{:?} index {} does not resolve", dangling.kind, dangling.index),
                )
            })
            .collect();

        let library_path = inputs
            .select_material_library(&geometry.material_libraries)
            .map(Path::to_path_buf);

        let (library, referenced) = match &library_path {
            Some(path) => {
                let parsed = MaterialLibrary::load(path).await?;
                let subject = file_name(path);
                diagnostics.extend(parsed.warnings.into_iter().map(|warning| {
                    Diagnostic::from_error(
                        format!("{}:{}", subject, warning.line),
                        &MediaError::from(warning),
                    )
                }));
                let referenced = parsed.library.texture_paths();
                (Some(parsed.library), referenced)
            }
            None => (None, BTreeSet::new()),
        };

        let available: BTreeSet<String> = inputs.textures.iter().map(|p| file_name(p)).collect();
        for reference in &referenced {
            if !available.contains(reference_basename(reference)) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MissingTexture,
                    reference.clone(),
                    "referenced by the material library but not found on disk",
                ));
            }
        }

        Ok(Prepared {
            inputs,
            geometry,
            library_path,
            library,
            referenced,
            diagnostics,
        })
    }

    async fn transcode(&self, paths: Vec<PathBuf>) -> Result<TextureBatch> {
        if paths.is_empty() {
            return Ok(TextureBatch::default());
        }
        let transcoder = TextureTranscoder::new(self.options.transcode.clone());
        tokio::task::spawn_blocking(move || transcoder.transcode_batch(&paths))
            .await
            .map_err(|e| MediaError::TaskFailed(e.to_string()))
    }
}

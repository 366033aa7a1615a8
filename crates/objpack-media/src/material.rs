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

//! Wavefront MTL material libraries
//!
//! Parsing is best-effort: a recognized command with an unusable argument is
//! recorded as a warning and skipped, unknown commands are ignored, and the
//! library keeps whatever could be read. Texture references can be rewritten
//! in place (typically to data URIs) before the library is serialized again.

use crate::error::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, instrument};

/// RGB triple, components nominally in 0.0..=1.0
pub type Color = [f32; 3];

/// Named texture-map role of a material
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TextureSlot {
    /// `map_Kd`
    Diffuse,
    /// `map_Ka`
    Ambient,
    /// `map_Ks`
    Specular,
    /// `map_Ns`
    Shininess,
    /// `map_Bump` / `bump`
    Bump,
    /// `disp`
    Displacement,
    /// `map_d`
    Alpha,
}

impl TextureSlot {
    /// All slots in serialization order
    pub const ALL: [TextureSlot; 7] = [
        TextureSlot::Diffuse,
        TextureSlot::Ambient,
        TextureSlot::Specular,
        TextureSlot::Shininess,
        TextureSlot::Bump,
        TextureSlot::Displacement,
        TextureSlot::Alpha,
    ];

    /// Keyword written when serializing
    pub fn keyword(self) -> &'static str {
        match self {
            TextureSlot::Diffuse => "map_Kd",
            TextureSlot::Ambient => "map_Ka",
            TextureSlot::Specular => "map_Ks",
            TextureSlot::Shininess => "map_Ns",
            TextureSlot::Bump => "map_Bump",
            TextureSlot::Displacement => "disp",
            TextureSlot::Alpha => "map_d",
        }
    }
}

/// Material commands understood by the parser
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MtlKeyword {
    NewMaterial,
    Ambient,
    Diffuse,
    Specular,
    Shininess,
    Opacity,
    Transparency,
    OpticalDensity,
    Illumination,
    Map(TextureSlot),
    Unrecognized,
}

impl MtlKeyword {
    fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "newmtl" => MtlKeyword::NewMaterial,
            "ka" => MtlKeyword::Ambient,
            "kd" => MtlKeyword::Diffuse,
            "ks" => MtlKeyword::Specular,
            "ns" => MtlKeyword::Shininess,
            "d" => MtlKeyword::Opacity,
            "tr" => MtlKeyword::Transparency,
            "ni" => MtlKeyword::OpticalDensity,
            "illum" => MtlKeyword::Illumination,
            "map_kd" => MtlKeyword::Map(TextureSlot::Diffuse),
            "map_ka" => MtlKeyword::Map(TextureSlot::Ambient),
            "map_ks" => MtlKeyword::Map(TextureSlot::Specular),
            "map_ns" => MtlKeyword::Map(TextureSlot::Shininess),
            "map_bump" | "bump" => MtlKeyword::Map(TextureSlot::Bump),
            "disp" => MtlKeyword::Map(TextureSlot::Displacement),
            "map_d" => MtlKeyword::Map(TextureSlot::Alpha),
            _ => MtlKeyword::Unrecognized,
        }
    }
}

/// Surface definition from a `newmtl` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    /// Material name
    pub name: String,
    /// `Ka`
    pub ambient: Option<Color>,
    /// `Kd`
    pub diffuse: Option<Color>,
    /// `Ks`
    pub specular: Option<Color>,
    /// `Ns`
    pub shininess: Option<f32>,
    /// `d`, defaults to fully opaque
    pub opacity: f32,
    /// `Tr`, defaults to 0.0
    pub transparency: f32,
    /// `Ni`
    pub optical_density: Option<f32>,
    /// `illum`
    pub illumination: Option<u32>,
    /// Texture references by slot
    pub textures: BTreeMap<TextureSlot, String>,
}

impl Material {
    /// Material with every property unset
    pub fn new(name: impl Into<String>) -> Self {
        Material {
            name: name.into(),
            ambient: None,
            diffuse: None,
            specular: None,
            shininess: None,
            opacity: 1.0,
            transparency: 0.0,
            optical_density: None,
            illumination: None,
            textures: BTreeMap::new(),
        }
    }

    /// Texture reference in a slot
    pub fn texture(&self, slot: TextureSlot) -> Option<&str> {
        self.textures.get(&slot).map(String::as_str)
    }

    fn apply(&mut self, keyword: MtlKeyword, args: &str) -> std::result::Result<(), String> {
        match keyword {
            MtlKeyword::Ambient => self.ambient = Some(parse_color(args)?),
            MtlKeyword::Diffuse => self.diffuse = Some(parse_color(args)?),
            MtlKeyword::Specular => self.specular = Some(parse_color(args)?),
            MtlKeyword::Shininess => self.shininess = Some(parse_scalar(args)?),
            MtlKeyword::Opacity => self.opacity = parse_scalar(args)?,
            MtlKeyword::Transparency => self.transparency = parse_scalar(args)?,
            MtlKeyword::OpticalDensity => self.optical_density = Some(parse_scalar(args)?),
            MtlKeyword::Illumination => {
                self.illumination = Some(
                    args.trim()
                        .parse::<u32>()
                        .map_err(|e| format!("invalid illumination model: {}", e))?,
                )
            }
            MtlKeyword::Map(slot) => {
                let path = extract_texture_path(args);
                if path.is_empty() {
                    return Err("missing texture filename".to_string());
                }
                self.textures.insert(slot, path);
            }
            MtlKeyword::NewMaterial | MtlKeyword::Unrecognized => {}
        }
        Ok(())
    }

    fn write_to(&self, lines: &mut Vec<String>) {
        lines.push(format!("newmtl {}", self.name));

        for (keyword, color) in [("Ka", self.ambient), ("Kd", self.diffuse), ("Ks", self.specular)] {
            if let Some([r, g, b]) = color {
                lines.push(format!("{} {} {} {}", keyword, r, g, b));
            }
        }
        if let Some(shininess) = self.shininess {
            lines.push(format!("Ns {}", shininess));
        }
        if self.opacity != 1.0 {
            lines.push(format!("d {}", self.opacity));
        }
        if self.transparency != 0.0 {
            lines.push(format!("Tr {}", self.transparency));
        }
        if let Some(density) = self.optical_density {
            lines.push(format!("Ni {}", density));
        }
        if let Some(illum) = self.illumination {
            lines.push(format!("illum {}", illum));
        }
        for (slot, path) in &self.textures {
            lines.push(format!("{} {}", slot.keyword(), path));
        }

        lines.push(String::new());
    }
}

fn parse_scalar(args: &str) -> std::result::Result<f32, String> {
    args.trim()
        .parse::<f32>()
        .map_err(|e| format!("invalid number '{}': {}", args.trim(), e))
}

fn parse_color(args: &str) -> std::result::Result<Color, String> {
    let values: Vec<&str> = args.split_whitespace().collect();
    if values.len() < 3 {
        return Err(format!("expected 3 color components, got {}", values.len()));
    }
    let mut color = [0.0f32; 3];
    for (component, value) in color.iter_mut().zip(&values) {
        *component = parse_scalar(value)?;
    }
    Ok(color)
}

/// Filename of a texture-map argument, with option flags dropped
///
/// `-blendu on -blendv on tex.jpg` yields `tex.jpg`. The last token that is
/// not a flag is taken as the filename and backslashes become `/`.
pub fn extract_texture_path(args: &str) -> String {
    args.split_whitespace()
        .rev()
        .find(|token| !token.starts_with('-'))
        .map(|token| token.replace('\\', "/"))
        .unwrap_or_default()
}

/// Original texture reference → replacement (usually a data URI)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TextureReferenceMap(BTreeMap<String, String>);

impl TextureReferenceMap {
    /// Empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `reference` to `replacement`
    pub fn insert(&mut self, reference: impl Into<String>, replacement: impl Into<String>) {
        self.0.insert(reference.into(), replacement.into());
    }

    /// Replacement for an exact reference
    pub fn get(&self, reference: &str) -> Option<&str> {
        self.0.get(reference).map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the map is empty
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Warning for a line whose effect was skipped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineWarning {
    /// 1-based line number
    pub line: usize,
    /// Trimmed line text
    pub content: String,
    /// Why it was skipped
    pub reason: String,
}

impl From<LineWarning> for MediaError {
    fn from(warning: LineWarning) -> Self {
        MediaError::MalformedLine {
            line: warning.line,
            content: warning.content,
            reason: warning.reason,
        }
    }
}

/// Parsed library plus the warnings collected on the way
#[derive(Debug, Clone, Default)]
pub struct ParsedMaterials {
    /// Materials read
    pub library: MaterialLibrary,
    /// Lines whose effect was skipped
    pub warnings: Vec<LineWarning>,
}

/// Materials by name, in first-definition order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaterialLibrary {
    materials: Vec<Material>,
    index: HashMap<String, usize>,
}

impl MaterialLibrary {
    /// Empty library
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse library text
    #[instrument(skip(content), fields(size = content.len()))]
    pub fn parse(content: &str) -> ParsedMaterials {
        let mut library = MaterialLibrary::new();
        let mut warnings = Vec::new();
        let mut current: Option<usize> = None;

        for (number, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (token, args) = trimmed
                .split_once(char::is_whitespace)
                .map(|(token, rest)| (token, rest.trim()))
                .unwrap_or((trimmed, ""));
            let keyword = MtlKeyword::from_token(token);

            if keyword == MtlKeyword::NewMaterial {
                current = Some(library.insert(Material::new(args)));
                continue;
            }

            // Commands before the first newmtl have nothing to apply to
            let Some(slot) = current else { continue };

            if let Err(reason) = library.materials[slot].apply(keyword, args) {
                debug!("Skipping MTL line {}: {}", number + 1, reason);
                warnings.push(LineWarning {
                    line: number + 1,
                    content: trimmed.to_string(),
                    reason,
                });
            }
        }

        debug!(
            "Parsed {} materials with {} warnings",
            library.len(),
            warnings.len()
        );
        ParsedMaterials { library, warnings }
    }

    /// Read and parse a library file
    pub async fn load(path: &Path) -> Result<ParsedMaterials> {
        if !path.exists() {
            return Err(MediaError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes)))
    }

    /// Add a material; a repeated name replaces the earlier definition in place
    pub fn insert(&mut self, material: Material) -> usize {
        match self.index.get(&material.name) {
            Some(&position) => {
                self.materials[position] = material;
                position
            }
            None => {
                let position = self.materials.len();
                self.index.insert(material.name.clone(), position);
                self.materials.push(material);
                position
            }
        }
    }

    /// Material by name
    pub fn get(&self, name: &str) -> Option<&Material> {
        self.index.get(name).map(|&position| &self.materials[position])
    }

    /// Materials in first-definition order
    pub fn iter(&self) -> impl Iterator<Item = &Material> {
        self.materials.iter()
    }

    /// Number of materials
    pub fn len(&self) -> usize {
        self.materials.len()
    }

    /// Whether the library has no materials
    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    /// Every texture filename referenced by any slot of any material
    pub fn texture_paths(&self) -> BTreeSet<String> {
        self.materials
            .iter()
            .flat_map(|material| material.textures.values().cloned())
            .collect()
    }

    /// Replace slot values that exactly match a key of `references`
    ///
    /// Returns the number of slots rewritten. Unmatched slots keep their
    /// original reference.
    pub fn update_texture_paths(&mut self, references: &TextureReferenceMap) -> usize {
        let mut rewritten = 0;
        for material in &mut self.materials {
            for path in material.textures.values_mut() {
                if let Some(replacement) = references.get(path) {
                    *path = replacement.to_string();
                    rewritten += 1;
                }
            }
        }
        debug!("Rewrote {} texture references", rewritten);
        rewritten
    }

    /// Serialize back to MTL text, one block per material
    pub fn to_mtl_string(&self) -> String {
        let mut lines = Vec::new();
        for material in &self.materials {
            material.write_to(&mut lines);
        }
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# exported
newmtl wood
Ka 0.2 0.2 0.2
Kd 0.8 0.6 0.4
Ks 1 1 1
Ns 100
d 0.5
illum 2
map_Kd -blendu on -blendv on textures\\wood.jpg
bump -bm 0.3 wood_n.png

newmtl glass
Tr 0.9
Ni 1.45
map_d glass_alpha.png
";

    #[test]
    fn test_parse_properties() {
        let parsed = MaterialLibrary::parse(SAMPLE);
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.library.len(), 2);

        let wood = parsed.library.get("wood").unwrap();
        assert_eq!(wood.ambient, Some([0.2, 0.2, 0.2]));
        assert_eq!(wood.diffuse, Some([0.8, 0.6, 0.4]));
        assert_eq!(wood.shininess, Some(100.0));
        assert_eq!(wood.opacity, 0.5);
        assert_eq!(wood.illumination, Some(2));
        assert_eq!(wood.texture(TextureSlot::Diffuse), Some("textures/wood.jpg"));
        assert_eq!(wood.texture(TextureSlot::Bump), Some("wood_n.png"));

        let glass = parsed.library.get("glass").unwrap();
        assert_eq!(glass.opacity, 1.0);
        assert_eq!(glass.transparency, 0.9);
        assert_eq!(glass.optical_density, Some(1.45));
    }

    #[test]
    fn test_extract_texture_path_strips_flags() {
        assert_eq!(extract_texture_path("-blendu on -blendv on tex.jpg"), "tex.jpg");
        assert_eq!(extract_texture_path("tex.jpg"), "tex.jpg");
        assert_eq!(extract_texture_path("-clamp on dir\\sub\\tex.png"), "dir/sub/tex.png");
        assert_eq!(extract_texture_path(""), "");
    }

    #[test]
    fn test_case_insensitive_commands() {
        let parsed = MaterialLibrary::parse("NEWMTL a\nKD 1 0 0\nMAP_KD a.png\n");
        let material = parsed.library.get("a").unwrap();
        assert_eq!(material.diffuse, Some([1.0, 0.0, 0.0]));
        assert_eq!(material.texture(TextureSlot::Diffuse), Some("a.png"));
    }

    #[test]
    fn test_malformed_lines_recorded_and_skipped() {
        let parsed = MaterialLibrary::parse("newmtl a\nNs shiny\nKd 1 0\nKs 0.5 0.5 0.5\nillum two\nmap_Kd\n");

        assert_eq!(parsed.warnings.len(), 4);
        assert_eq!(parsed.warnings[0].line, 2);
        assert_eq!(parsed.warnings[0].content, "Ns shiny");

        let material = parsed.library.get("a").unwrap();
        assert_eq!(material.shininess, None);
        assert_eq!(material.diffuse, None);
        assert_eq!(material.specular, Some([0.5, 0.5, 0.5]));
    }

    #[test]
    fn test_commands_before_newmtl_and_unknown_ignored() {
        let parsed = MaterialLibrary::parse("Kd 1 1 1\nnewmtl a\nKe 1 1 1\nPr 0.5\n");
        assert!(parsed.warnings.is_empty());
        assert_eq!(parsed.library.len(), 1);
        assert_eq!(parsed.library.get("a").unwrap().diffuse, None);
    }

    #[test]
    fn test_texture_paths_deduplicated() {
        let parsed = MaterialLibrary::parse(
            "newmtl a\nmap_Kd shared.jpg\nnewmtl b\nmap_Kd shared.jpg\nmap_Ks spec.jpg\n",
        );
        let paths = parsed.library.texture_paths();
        assert_eq!(paths.len(), 2);
        assert!(paths.contains("shared.jpg"));
        assert!(paths.contains("spec.jpg"));
    }

    #[test]
    fn test_update_texture_paths_exact_match_only() {
        let mut library = MaterialLibrary::parse("newmtl a\nmap_Kd wood.jpg\nmap_Ks missing.jpg\n").library;

        let mut references = TextureReferenceMap::new();
        references.insert("wood.jpg", "data:image/jpeg;base64,AAAA");
        references.insert("WOOD.JPG", "data:image/jpeg;base64,BBBB");

        assert_eq!(library.update_texture_paths(&references), 1);
        let serialized = library.to_mtl_string();
        assert!(serialized.contains("map_Kd data:image/jpeg;base64,AAAA"));
        assert!(serialized.contains("map_Ks missing.jpg"));
    }

    #[test]
    fn test_serialization_omits_defaults() {
        let library = MaterialLibrary::parse("newmtl plain\nd 1.0\nTr 0.0\n").library;
        assert_eq!(library.to_mtl_string(), "newmtl plain\n");
    }

    #[test]
    fn test_round_trip_preserves_values() {
        let original = MaterialLibrary::parse(SAMPLE).library;
        let reparsed = MaterialLibrary::parse(&original.to_mtl_string());

        assert!(reparsed.warnings.is_empty());
        assert_eq!(reparsed.library, original);
    }

    #[test]
    fn test_redefinition_keeps_first_position() {
        let library = MaterialLibrary::parse("newmtl a\nKd 1 0 0\nnewmtl b\nnewmtl a\nKd 0 1 0\n").library;
        let names: Vec<&str> = library.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(library.get("a").unwrap().diffuse, Some([0.0, 1.0, 0.0]));
    }
}

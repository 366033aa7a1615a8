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

//! Wavefront OBJ geometry merging
//!
//! Several exporters split one model across many `.obj` files, each with its
//! own 1-based vertex numbering. This module concatenates such files into a
//! single stream and shifts every face index by the number of positions,
//! texture coordinates and normals contributed by the files before it, so no
//! face in the merged output points at the wrong record.
//!
//! # Example
//!
//! ```rust
//! use objpack_media::geometry::{GeometryMerger, GeometrySource};
//!
//! let sources = vec![
//!     GeometrySource::new("a.obj", "v 0 0 0\nv 1 0 0\nf 1 2\n"),
//!     GeometrySource::new("b.obj", "v 0 1 0\nv 1 1 0\nv 0 0 1\nf 1 2 3\n"),
//! ];
//! let merged = GeometryMerger::new().merge(&sources).unwrap();
//!
//! assert_eq!(merged.stats.vertices, 5);
//! assert!(merged.content.contains("f 3 4 5"));
//! ```

use crate::error::{MediaError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::ops::AddAssign;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Record kinds recognized in a geometry line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjKeyword {
    /// `v`
    Vertex,
    /// `vt`
    TexCoord,
    /// `vn`
    Normal,
    /// `f`
    Face,
    /// `g`
    Group,
    /// `o`
    Object,
    /// `usemtl`
    UseMaterial,
    /// `mtllib`
    MaterialLibrary,
    /// `# ...`
    Comment,
    /// Empty or whitespace-only line
    Blank,
    /// Anything else; passed through untouched
    Other,
}

impl ObjKeyword {
    /// Classify a command token (case-insensitive)
    pub fn from_token(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "v" => ObjKeyword::Vertex,
            "vt" => ObjKeyword::TexCoord,
            "vn" => ObjKeyword::Normal,
            "f" => ObjKeyword::Face,
            "g" => ObjKeyword::Group,
            "o" => ObjKeyword::Object,
            "usemtl" => ObjKeyword::UseMaterial,
            "mtllib" => ObjKeyword::MaterialLibrary,
            _ => ObjKeyword::Other,
        }
    }
}

/// Split a line into its keyword and trimmed argument text
pub fn classify_line(line: &str) -> (ObjKeyword, &str) {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return (ObjKeyword::Blank, "");
    }
    if trimmed.starts_with('#') {
        return (ObjKeyword::Comment, trimmed);
    }

    match trimmed.split_once(char::is_whitespace) {
        Some((token, rest)) => (ObjKeyword::from_token(token), rest.trim()),
        None => (ObjKeyword::from_token(trimmed), ""),
    }
}

/// Position / texcoord / normal triple
///
/// Used both as the element counts of one file and as the running offset
/// applied to a file's face indices (the sum of counts of all earlier files).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeOffsets {
    /// Vertex positions (`v`)
    pub positions: u64,
    /// Texture coordinates (`vt`)
    pub texcoords: u64,
    /// Normals (`vn`)
    pub normals: u64,
}

impl MergeOffsets {
    /// Count the indexable records in one file's content
    pub fn count(content: &str) -> Self {
        let mut counts = MergeOffsets::default();
        for line in content.lines() {
            match classify_line(line).0 {
                ObjKeyword::Vertex => counts.positions += 1,
                ObjKeyword::TexCoord => counts.texcoords += 1,
                ObjKeyword::Normal => counts.normals += 1,
                _ => {}
            }
        }
        counts
    }

    /// True when no offset would be applied
    pub fn is_zero(&self) -> bool {
        *self == MergeOffsets::default()
    }
}

impl AddAssign for MergeOffsets {
    fn add_assign(&mut self, rhs: Self) {
        self.positions += rhs.positions;
        self.texcoords += rhs.texcoords;
        self.normals += rhs.normals;
    }
}

/// Shift one face vertex token (`p`, `p/t`, `p//n` or `p/t/n`) by `offsets`
///
/// Empty fields stay empty. Relative (negative) indices count back from the
/// face itself and remain valid after concatenation, so they are left as-is,
/// as is anything that does not parse as an integer.
pub fn offset_face_token(token: &str, offsets: &MergeOffsets) -> String {
    token
        .split('/')
        .enumerate()
        .map(|(slot, field)| {
            let offset = match slot {
                0 => offsets.positions,
                1 => offsets.texcoords,
                2 => offsets.normals,
                _ => return field.to_string(),
            };
            offset_index(field, offset)
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn offset_index(field: &str, offset: u64) -> String {
    if field.is_empty() {
        return String::new();
    }
    match field.parse::<i64>() {
        Ok(index) if index > 0 => match i64::try_from(offset).ok().and_then(|o| index.checked_add(o)) {
            Some(shifted) => shifted.to_string(),
            None => {
                warn!("Face index {} overflows when offset by {}, passed through", field, offset);
                field.to_string()
            }
        },
        Ok(_) => field.to_string(),
        Err(_) => {
            warn!("Non-numeric face index '{}' passed through", field);
            field.to_string()
        }
    }
}

fn offset_face(args: &str, offsets: &MergeOffsets) -> String {
    let tokens: Vec<String> = args
        .split_whitespace()
        .map(|token| offset_face_token(token, offsets))
        .collect();
    format!("f {}", tokens.join(" "))
}

/// Axis-aligned bounds of the vertex positions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum coordinates (x, y, z)
    pub min: (f32, f32, f32),

    /// Maximum coordinates (x, y, z)
    pub max: (f32, f32, f32),
}

impl BoundingBox {
    /// Degenerate box around a single point
    pub fn at(x: f32, y: f32, z: f32) -> Self {
        BoundingBox {
            min: (x, y, z),
            max: (x, y, z),
        }
    }

    /// Expand bounding box to include a point
    pub fn expand(&mut self, x: f32, y: f32, z: f32) {
        self.min.0 = self.min.0.min(x);
        self.min.1 = self.min.1.min(y);
        self.min.2 = self.min.2.min(z);
        self.max.0 = self.max.0.max(x);
        self.max.1 = self.max.1.max(y);
        self.max.2 = self.max.2.max(z);
    }

    /// Smallest box containing both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        let mut merged = *self;
        merged.expand(other.min.0, other.min.1, other.min.2);
        merged.expand(other.max.0, other.max.1, other.max.2);
        merged
    }
}

/// Aggregate counts over one or more geometry files
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GeometryStats {
    /// Number of input files combined
    pub files_merged: usize,
    /// `v` records
    pub vertices: u64,
    /// `vn` records
    pub normals: u64,
    /// `vt` records
    pub texcoords: u64,
    /// `f` records
    pub faces: u64,
    /// `g` records
    pub groups: u64,
    /// `o` records
    pub objects: u64,
    /// Bounds of all parsable vertex positions
    pub bounds: Option<BoundingBox>,
}

impl GeometryStats {
    /// Analyze one file's content
    pub fn from_content(content: &str) -> Self {
        let mut stats = GeometryStats {
            files_merged: 1,
            ..Default::default()
        };

        for line in content.lines() {
            let (keyword, args) = classify_line(line);
            match keyword {
                ObjKeyword::Vertex => {
                    stats.vertices += 1;
                    if let Some((x, y, z)) = parse_position(args) {
                        match stats.bounds.as_mut() {
                            Some(bounds) => bounds.expand(x, y, z),
                            None => stats.bounds = Some(BoundingBox::at(x, y, z)),
                        }
                    }
                }
                ObjKeyword::Normal => stats.normals += 1,
                ObjKeyword::TexCoord => stats.texcoords += 1,
                ObjKeyword::Face => stats.faces += 1,
                ObjKeyword::Group => stats.groups += 1,
                ObjKeyword::Object => stats.objects += 1,
                _ => {}
            }
        }

        stats
    }

    /// Fold another file's statistics into these
    pub fn merge(&mut self, other: &GeometryStats) {
        self.files_merged += other.files_merged;
        self.vertices += other.vertices;
        self.normals += other.normals;
        self.texcoords += other.texcoords;
        self.faces += other.faces;
        self.groups += other.groups;
        self.objects += other.objects;
        self.bounds = match (self.bounds, other.bounds) {
            (Some(a), Some(b)) => Some(a.union(&b)),
            (a, b) => a.or(b),
        };
    }
}

fn parse_position(args: &str) -> Option<(f32, f32, f32)> {
    let mut parts = args.split_whitespace().map(str::parse::<f32>);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(Ok(x)), Some(Ok(y)), Some(Ok(z))) => Some((x, y, z)),
        _ => None,
    }
}

/// One geometry input, already read as text
#[derive(Debug, Clone)]
pub struct GeometrySource {
    /// File name used in separator comments
    pub name: String,
    /// Full text content
    pub content: String,
}

impl GeometrySource {
    /// Wrap in-memory content
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        GeometrySource {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Read a geometry file; invalid UTF-8 is replaced rather than rejected
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(MediaError::NotFound(path.to_path_buf()));
        }
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        Ok(GeometrySource {
            name,
            content: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

/// Result of merging one or more geometry files
#[derive(Debug, Clone)]
pub struct MergedGeometry {
    /// Merged geometry text
    pub content: String,
    /// Aggregate statistics
    pub stats: GeometryStats,
    /// Offset applied to each input, in input order
    pub offsets: Vec<MergeOffsets>,
    /// `mtllib` names, deduplicated, in first-seen order
    pub material_libraries: Vec<String>,
    /// Every `usemtl` name in stream order
    pub material_usage: Vec<String>,
}

impl MergedGeometry {
    /// Distinct material names invoked by `usemtl`
    pub fn materials_invoked(&self) -> BTreeSet<&str> {
        self.material_usage.iter().map(String::as_str).collect()
    }
}

/// Tracks `mtllib` names so each library is recorded once
#[derive(Default)]
struct LibraryRefs {
    seen: HashSet<String>,
    ordered: Vec<String>,
}

impl LibraryRefs {
    /// Record every library on a directive; true if any was new
    fn record(&mut self, args: &str) -> bool {
        let mut added = false;
        for name in args.split_whitespace() {
            if self.seen.insert(name.to_string()) {
                self.ordered.push(name.to_string());
                added = true;
            }
        }
        added
    }
}

/// Geometry merger
#[derive(Debug, Default)]
pub struct GeometryMerger;

impl GeometryMerger {
    /// Create a new merger
    pub fn new() -> Self {
        GeometryMerger
    }

    /// Read and merge files in the given order
    ///
    /// Every file is read before merging starts; a missing file aborts the
    /// whole merge.
    #[instrument(skip(self, paths), fields(files = paths.len()))]
    pub async fn merge_files(&self, paths: &[PathBuf]) -> Result<MergedGeometry> {
        let mut sources = Vec::with_capacity(paths.len());
        for path in paths {
            sources.push(GeometrySource::load(path).await?);
        }
        self.merge(&sources)
    }

    /// Merge in-memory sources in the given order
    #[instrument(skip(self, sources), fields(files = sources.len()))]
    pub fn merge(&self, sources: &[GeometrySource]) -> Result<MergedGeometry> {
        match sources {
            [] => Err(MediaError::InvalidInput(
                "no geometry files provided".to_string(),
            )),
            [single] => Ok(Self::pass_through(single)),
            _ => Ok(Self::merge_offset(sources)),
        }
    }

    fn pass_through(source: &GeometrySource) -> MergedGeometry {
        debug!("Single geometry file {}, passing through", source.name);

        let mut libraries = LibraryRefs::default();
        let mut material_usage = Vec::new();
        for line in source.content.lines() {
            match classify_line(line) {
                (ObjKeyword::MaterialLibrary, args) => {
                    libraries.record(args);
                }
                (ObjKeyword::UseMaterial, args) => material_usage.push(args.to_string()),
                _ => {}
            }
        }

        MergedGeometry {
            content: source.content.clone(),
            stats: GeometryStats::from_content(&source.content),
            offsets: vec![MergeOffsets::default()],
            material_libraries: libraries.ordered,
            material_usage,
        }
    }

    fn merge_offset(sources: &[GeometrySource]) -> MergedGeometry {
        info!("Merging {} geometry files", sources.len());

        let mut lines: Vec<String> = Vec::new();
        let mut running = MergeOffsets::default();
        let mut offsets = Vec::with_capacity(sources.len());
        let mut stats = GeometryStats::default();
        let mut libraries = LibraryRefs::default();
        let mut material_usage = Vec::new();

        for (index, source) in sources.iter().enumerate() {
            // Offsets for this file depend only on earlier files
            let counts = MergeOffsets::count(&source.content);
            offsets.push(running);
            debug!(
                file = %source.name,
                positions = running.positions,
                texcoords = running.texcoords,
                normals = running.normals,
                "Applying offsets"
            );

            let mut separator_pending = index > 0;
            for line in source.content.lines() {
                let (keyword, args) = classify_line(line);

                if separator_pending
                    && matches!(
                        keyword,
                        ObjKeyword::Vertex | ObjKeyword::Object | ObjKeyword::Group
                    )
                {
                    lines.push(format!("# === File {}: {} ===", index + 1, source.name));
                    separator_pending = false;
                }

                match keyword {
                    ObjKeyword::Face => lines.push(offset_face(args, &running)),
                    ObjKeyword::MaterialLibrary => {
                        if libraries.record(args) {
                            lines.push(line.to_string());
                        }
                    }
                    ObjKeyword::UseMaterial => {
                        material_usage.push(args.to_string());
                        lines.push(line.to_string());
                    }
                    _ => lines.push(line.to_string()),
                }
            }

            running += counts;
            stats.merge(&GeometryStats::from_content(&source.content));
        }

        let mut content = lines.join("\n");
        content.push('\n');

        info!(
            "Merged geometry: vertices={}, faces={}, normals={}, texcoords={}",
            stats.vertices, stats.faces, stats.normals, stats.texcoords
        );

        MergedGeometry {
            content,
            stats,
            offsets,
            material_libraries: libraries.ordered,
            material_usage,
        }
    }
}

/// Index kind within a face vertex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    /// Position index
    Position,
    /// Texture coordinate index
    TexCoord,
    /// Normal index
    Normal,
}

/// One `p/t/n` triple of a face; 0 marks an unparsable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertex {
    /// Position index
    pub position: i64,
    /// Texture coordinate index, if present
    pub texcoord: Option<i64>,
    /// Normal index, if present
    pub normal: Option<i64>,
}

impl FaceVertex {
    /// Parse a face vertex token
    pub fn parse(token: &str) -> Self {
        let mut fields = token.split('/');
        let parse_field = |field: Option<&str>| match field {
            None | Some("") => None,
            Some(value) => Some(value.parse::<i64>().unwrap_or(0)),
        };
        FaceVertex {
            position: parse_field(fields.next()).unwrap_or(0),
            texcoord: parse_field(fields.next()),
            normal: parse_field(fields.next()),
        }
    }
}

/// Typed geometry record
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryRecord {
    /// `v` with its raw arguments
    Position(String),
    /// `vt` with its raw arguments
    TexCoord(String),
    /// `vn` with its raw arguments
    Normal(String),
    /// `f`
    Face(Vec<FaceVertex>),
    /// `g`
    Group(String),
    /// `o`
    Object(String),
    /// `usemtl`
    UseMaterial(String),
    /// `mtllib`
    MaterialLibrary(String),
    /// Unrecognized line, kept verbatim
    Other(String),
}

/// A face index that does not resolve to an existing record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DanglingReference {
    /// 1-based face number within the document
    pub face: usize,
    /// Which index of the triple
    pub kind: IndexKind,
    /// The index as written
    pub index: i64,
}

/// Parsed geometry document (comments and blank lines dropped)
#[derive(Debug, Clone, Default)]
pub struct GeometryDocument {
    /// Records in document order
    pub records: Vec<GeometryRecord>,
}

impl GeometryDocument {
    /// Parse geometry text
    pub fn parse(content: &str) -> Self {
        let records = content
            .lines()
            .filter_map(|line| {
                let (keyword, args) = classify_line(line);
                let record = match keyword {
                    ObjKeyword::Vertex => GeometryRecord::Position(args.to_string()),
                    ObjKeyword::TexCoord => GeometryRecord::TexCoord(args.to_string()),
                    ObjKeyword::Normal => GeometryRecord::Normal(args.to_string()),
                    ObjKeyword::Face => GeometryRecord::Face(
                        args.split_whitespace().map(FaceVertex::parse).collect(),
                    ),
                    ObjKeyword::Group => GeometryRecord::Group(args.to_string()),
                    ObjKeyword::Object => GeometryRecord::Object(args.to_string()),
                    ObjKeyword::UseMaterial => GeometryRecord::UseMaterial(args.to_string()),
                    ObjKeyword::MaterialLibrary => {
                        GeometryRecord::MaterialLibrary(args.to_string())
                    }
                    ObjKeyword::Comment | ObjKeyword::Blank => return None,
                    ObjKeyword::Other => GeometryRecord::Other(line.trim().to_string()),
                };
                Some(record)
            })
            .collect();

        GeometryDocument { records }
    }

    /// Totals of positions, texture coordinates and normals
    pub fn counts(&self) -> MergeOffsets {
        let mut counts = MergeOffsets::default();
        for record in &self.records {
            match record {
                GeometryRecord::Position(_) => counts.positions += 1,
                GeometryRecord::TexCoord(_) => counts.texcoords += 1,
                GeometryRecord::Normal(_) => counts.normals += 1,
                _ => {}
            }
        }
        counts
    }

    /// Face records in order
    pub fn faces(&self) -> impl Iterator<Item = &[FaceVertex]> {
        self.records.iter().filter_map(|record| match record {
            GeometryRecord::Face(vertices) => Some(vertices.as_slice()),
            _ => None,
        })
    }

    /// Every face index that does not resolve
    ///
    /// Positive indices must not exceed the document total; negative indices
    /// must stay within the records seen before the face.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let totals = self.counts();
        let mut seen = MergeOffsets::default();
        let mut face_number = 0usize;
        let mut dangling = Vec::new();

        for record in &self.records {
            match record {
                GeometryRecord::Position(_) => seen.positions += 1,
                GeometryRecord::TexCoord(_) => seen.texcoords += 1,
                GeometryRecord::Normal(_) => seen.normals += 1,
                GeometryRecord::Face(vertices) => {
                    face_number += 1;
                    for vertex in vertices {
                        let checks = [
                            (IndexKind::Position, Some(vertex.position), seen.positions, totals.positions),
                            (IndexKind::TexCoord, vertex.texcoord, seen.texcoords, totals.texcoords),
                            (IndexKind::Normal, vertex.normal, seen.normals, totals.normals),
                        ];
                        for (kind, index, seen_so_far, total) in checks {
                            if let Some(index) = index {
                                if !resolves(index, seen_so_far, total) {
                                    dangling.push(DanglingReference {
                                        face: face_number,
                                        kind,
                                        index,
                                    });
                                }
                            }
                        }
                    }
                }
                _ => {}
            }
        }

        dangling
    }
}

fn resolves(index: i64, seen: u64, total: u64) -> bool {
    match index {
        0 => false,
        i if i > 0 => i as u64 <= total,
        i => seen as i64 + i >= 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn merge(sources: &[(&str, &str)]) -> MergedGeometry {
        let sources: Vec<GeometrySource> = sources
            .iter()
            .map(|(name, content)| GeometrySource::new(*name, *content))
            .collect();
        GeometryMerger::new().merge(&sources).unwrap()
    }

    fn face_lines(content: &str) -> Vec<&str> {
        content.lines().filter(|l| l.starts_with("f ")).collect()
    }

    #[test]
    fn test_keyword_classification() {
        assert_eq!(classify_line("v 1 2 3"), (ObjKeyword::Vertex, "1 2 3"));
        assert_eq!(classify_line("  VT 0.5 0.5"), (ObjKeyword::TexCoord, "0.5 0.5"));
        assert_eq!(classify_line("usemtl  wood "), (ObjKeyword::UseMaterial, "wood"));
        assert_eq!(classify_line("# note").0, ObjKeyword::Comment);
        assert_eq!(classify_line("   ").0, ObjKeyword::Blank);
        assert_eq!(classify_line("curv 0 1 2").0, ObjKeyword::Other);
        assert_eq!(classify_line("s off").0, ObjKeyword::Other);
    }

    #[test]
    fn test_face_token_forms() {
        let offsets = MergeOffsets {
            positions: 10,
            texcoords: 20,
            normals: 30,
        };
        assert_eq!(offset_face_token("1", &offsets), "11");
        assert_eq!(offset_face_token("1/2", &offsets), "11/22");
        assert_eq!(offset_face_token("1//3", &offsets), "11//33");
        assert_eq!(offset_face_token("1/2/3", &offsets), "11/22/33");
    }

    #[test]
    fn test_relative_indices_untouched() {
        let offsets = MergeOffsets {
            positions: 4,
            texcoords: 4,
            normals: 4,
        };
        assert_eq!(offset_face_token("-1/-1/-1", &offsets), "-1/-1/-1");
    }

    #[test]
    fn test_overflowing_index_passed_through() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\n"),
            ("b.obj", "v 0 0 0\nf 9223372036854775807\n"),
        ]);
        assert_eq!(face_lines(&merged.content), vec!["f 9223372036854775807"]);

        let dangling = GeometryDocument::parse(&merged.content).dangling_references();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].index, i64::MAX);
    }

    #[test]
    fn test_two_file_scenario() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\nv 1 0 0\nf 1 2\n"),
            ("b.obj", "v 0 1 0\nv 1 1 0\nv 0 0 1\nf 1 2 3\n"),
        ]);

        assert_eq!(merged.stats.vertices, 5);
        assert_eq!(merged.stats.faces, 2);
        assert_eq!(merged.stats.files_merged, 2);
        assert_eq!(face_lines(&merged.content), vec!["f 1 2", "f 3 4 5"]);
        assert_eq!(merged.offsets[1].positions, 2);
    }

    #[test]
    fn test_offsets_accumulate_per_kind() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\nvt 0 0\nvn 0 0 1\nvn 0 1 0\nf 1/1/1\n"),
            ("b.obj", "v 1 1 1\nvt 1 1\nvn 1 0 0\nf 1/1/1\n"),
            ("c.obj", "v 2 2 2\nf 1//1\n"),
        ]);

        assert_eq!(face_lines(&merged.content), vec!["f 1/1/1", "f 2/2/3", "f 3//4"]);
        assert_eq!(
            merged.offsets[2],
            MergeOffsets {
                positions: 2,
                texcoords: 2,
                normals: 3,
            }
        );
    }

    #[test]
    fn test_single_file_passes_through_unchanged() {
        let content = "mtllib a.mtl\nmtllib a.mtl\nv 0 0 0\nf 1  1 1\n";
        let merged = merge(&[("only.obj", content)]);

        assert_eq!(merged.content, content);
        assert_eq!(merged.stats.files_merged, 1);
        assert_eq!(merged.material_libraries, vec!["a.mtl".to_string()]);
    }

    #[test]
    fn test_separator_inserted_once_per_file() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\n"),
            ("b.obj", "# header\nv 1 0 0\nv 2 0 0\ng part\n"),
        ]);

        let separators: Vec<&str> = merged
            .content
            .lines()
            .filter(|l| l.starts_with("# ==="))
            .collect();
        assert_eq!(separators, vec!["# === File 2: b.obj ==="]);

        let lines: Vec<&str> = merged.content.lines().collect();
        assert_eq!(lines[1], "# header");
        assert_eq!(lines[2], "# === File 2: b.obj ===");
    }

    #[test]
    fn test_mtllib_deduplicated_usemtl_kept() {
        let merged = merge(&[
            ("a.obj", "mtllib shared.mtl\nusemtl red\nv 0 0 0\nf 1 1 1\n"),
            ("b.obj", "mtllib shared.mtl\nusemtl red\nv 0 0 0\nf 1 1 1\n"),
        ]);

        assert_eq!(merged.content.matches("mtllib shared.mtl").count(), 1);
        assert_eq!(merged.content.matches("usemtl red").count(), 2);
        assert_eq!(merged.material_libraries, vec!["shared.mtl".to_string()]);
        assert_eq!(merged.material_usage.len(), 2);
        assert_eq!(merged.materials_invoked().len(), 1);
    }

    #[test]
    fn test_unknown_records_pass_through() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\n"),
            ("b.obj", "s 1\ncstype bspline\nv 0 0 0\n"),
        ]);
        assert!(merged.content.contains("s 1"));
        assert!(merged.content.contains("cstype bspline"));
    }

    #[test]
    fn test_empty_input_rejected() {
        let err = GeometryMerger::new().merge(&[]).unwrap_err();
        assert!(matches!(err, MediaError::InvalidInput(_)));
    }

    #[test]
    fn test_stats_bounds() {
        let stats = GeometryStats::from_content("v -1 0 2\nv 3 -4 0\nv bad\ng a\no b\n");
        assert_eq!(stats.vertices, 3);
        assert_eq!(stats.groups, 1);
        assert_eq!(stats.objects, 1);
        let bounds = stats.bounds.unwrap();
        assert_eq!(bounds.min, (-1.0, -4.0, 0.0));
        assert_eq!(bounds.max, (3.0, 0.0, 2.0));
    }

    #[test]
    fn test_document_reparse_has_no_dangling_references() {
        let merged = merge(&[
            ("a.obj", "v 0 0 0\nv 1 0 0\nv 1 1 0\nvn 0 0 1\nf 1//1 2//1 3//1\n"),
            ("b.obj", "v 0 0 1\nv 1 0 1\nv 1 1 1\nvn 0 0 -1\nf -3//-1 -2//-1 -1//-1\nf 1//1 2//1 3//1\n"),
        ]);

        let document = GeometryDocument::parse(&merged.content);
        assert_eq!(document.counts().positions, 6);
        assert_eq!(document.faces().count(), 3);
        assert!(document.dangling_references().is_empty());
    }

    #[test]
    fn test_dangling_references_detected() {
        let document = GeometryDocument::parse("v 0 0 0\nf 1 2 x\nf -2\n");
        let dangling = document.dangling_references();

        assert_eq!(dangling.len(), 3);
        assert_eq!(dangling[0].index, 2);
        assert_eq!(dangling[1].index, 0);
        assert_eq!(dangling[2].face, 2);
    }

    #[tokio::test]
    async fn test_missing_file_aborts_merge() {
        let dir = tempfile::tempdir().unwrap();
        let present = dir.path().join("a.obj");
        std::fs::write(&present, "v 0 0 0\n").unwrap();
        let missing = dir.path().join("b.obj");

        let err = GeometryMerger::new()
            .merge_files(&[present, missing.clone()])
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::NotFound(path) if path == missing));
    }
}

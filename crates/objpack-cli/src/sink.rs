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

//! JSON manifest writer.

use objpack_media::{AssemblyReport, AssetManifest, ManifestSink, MediaError};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// On-disk shape of a packed asset
#[derive(Serialize)]
struct PackedAsset<'a> {
    title: &'a str,
    geometry: &'a str,
    materials: &'a str,
    textures: &'a BTreeMap<String, String>,
    report: &'a AssemblyReport,
}

/// Writes `{title, geometry, materials, textures, report}` as pretty JSON
#[derive(Debug, Clone)]
pub struct JsonManifestSink {
    path: PathBuf,
}

impl JsonManifestSink {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonManifestSink {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ManifestSink for JsonManifestSink {
    fn emit(&self, manifest: &AssetManifest, title: &str) -> objpack_media::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let packed = PackedAsset {
            title,
            geometry: &manifest.geometry,
            materials: &manifest.materials,
            textures: &manifest.textures,
            report: &manifest.report,
        };

        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer_pretty(&mut writer, &packed)
            .map_err(|e| MediaError::IoError(e.into()))?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        debug!("Wrote manifest to {}", self.path.display());
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_writes_all_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.json");

        let mut textures = BTreeMap::new();
        textures.insert("wood.png".to_string(), "data:image/png;base64,AAAA".to_string());
        let manifest = AssetManifest {
            geometry: "v 0 0 0\n".to_string(),
            materials: String::new(),
            textures,
            report: AssemblyReport::default(),
        };

        JsonManifestSink::new(&path).emit(&manifest, "Crate").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["title"], "Crate");
        assert_eq!(value["geometry"], "v 0 0 0\n");
        assert_eq!(value["materials"], "");
        assert_eq!(value["textures"]["wood.png"], "data:image/png;base64,AAAA");
        assert!(value["report"]["diagnostics"].as_array().unwrap().is_empty());
    }
}

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

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Texture transcoding settings
    pub textures: TextureConfig,

    /// Output settings
    pub output: OutputConfig,

    /// Logging settings
    pub observability: ObservabilityConfig,
}

/// Texture transcoding configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureConfig {
    /// Longest allowed texture side in pixels; unset disables downscaling
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_resolution: Option<u32>,

    /// Re-encode every texture as WebP
    #[serde(default)]
    pub convert_to_webp: bool,

    /// JPEG quality (1-100)
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// WebP quality (1-100)
    #[serde(default = "default_webp_quality")]
    pub webp_quality: u8,

    /// Refuse to decode images wider or taller than this
    #[serde(default = "default_max_decode_dimension")]
    pub max_decode_dimension: u32,

    /// Transcode textures in parallel
    #[serde(default = "default_true")]
    pub parallel: bool,
}

impl Default for TextureConfig {
    fn default() -> Self {
        TextureConfig {
            max_resolution: None,
            convert_to_webp: false,
            jpeg_quality: default_jpeg_quality(),
            webp_quality: default_webp_quality(),
            max_decode_dimension: default_max_decode_dimension(),
            parallel: true,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Title for the packed asset; derived from the input name when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Warn when the combined payload exceeds this many MiB
    #[serde(default = "default_size_warning_mb")]
    pub size_warning_mb: u64,
}

impl OutputConfig {
    /// Size warning threshold in bytes
    pub fn size_warning_bytes(&self) -> u64 {
        self.size_warning_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig {
            title: None,
            size_warning_mb: default_size_warning_mb(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log format (pretty, compact, json)
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        ObservabilityConfig {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_jpeg_quality() -> u8 {
    85
}

fn default_webp_quality() -> u8 {
    80
}

fn default_max_decode_dimension() -> u32 {
    16384
}

fn default_size_warning_mb() -> u64 {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

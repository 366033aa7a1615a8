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

//! Texture transcoding into embeddable data URIs
//!
//! Each texture is decoded (with a dimension cap), optionally downscaled so
//! its longer side fits `max_resolution`, re-encoded in its target format and
//! wrapped as `data:<mime>;base64,<payload>`.
//!
//! # Output format
//!
//! | Source | `convert_to_webp = false` | `convert_to_webp = true` |
//! |--------|---------------------------|--------------------------|
//! | JPEG   | JPEG (`jpeg_quality`)     | WebP (`webp_quality`)    |
//! | PNG    | PNG (lossless, best)      | WebP (`webp_quality`)    |
//! | WebP   | WebP (`webp_quality`)     | WebP (`webp_quality`)    |
//! | BMP    | JPEG (`jpeg_quality`)     | WebP (`webp_quality`)    |
//!
//! JPEG and WebP output is flattened onto opaque white first; PNG keeps its
//! alpha channel.

use crate::error::{MediaError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilter, PngEncoder};
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader, Limits, RgbImage};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Extensions accepted as texture sources
pub const SUPPORTED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "webp", "bmp"];

/// Base64 expands binary payloads by this ratio
pub const BASE64_EXPANSION: f64 = 4.0 / 3.0;

/// Source image format, detected from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceFormat {
    /// `.jpg` / `.jpeg`
    Jpeg,
    /// `.png`
    Png,
    /// `.webp`
    WebP,
    /// `.bmp`, always re-encoded
    Bmp,
}

impl SourceFormat {
    /// Detect format from file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::WebP),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Detect format from a path, failing with `UnsupportedFormat`
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(ext).ok_or_else(|| {
            MediaError::UnsupportedFormat(format!("'.{}' ({})", ext, path.display()))
        })
    }
}

/// Encoded output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    /// MIME type used in the data URI
    pub fn mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    /// Lossy targets cannot carry alpha here
    pub fn is_lossy(self) -> bool {
        !matches!(self, OutputFormat::Png)
    }

    fn matches_source(self, source: SourceFormat) -> bool {
        matches!(
            (self, source),
            (OutputFormat::Jpeg, SourceFormat::Jpeg)
                | (OutputFormat::Png, SourceFormat::Png)
                | (OutputFormat::WebP, SourceFormat::WebP)
        )
    }
}

/// Transcoding settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeOptions {
    /// Longest allowed side; larger images are downscaled
    pub max_resolution: Option<u32>,
    /// Force WebP output for every texture
    pub convert_to_webp: bool,
    /// JPEG quality, 1..=100
    pub jpeg_quality: u8,
    /// WebP quality, 1..=100
    pub webp_quality: u8,
    /// Images wider or taller than this are refused at decode time
    pub max_decode_dimension: u32,
    /// Transcode textures on the rayon pool
    pub parallel: bool,
}

impl Default for TranscodeOptions {
    fn default() -> Self {
        TranscodeOptions {
            max_resolution: None,
            convert_to_webp: false,
            jpeg_quality: 85,
            webp_quality: 80,
            max_decode_dimension: 16384,
            parallel: true,
        }
    }
}

impl TranscodeOptions {
    /// Pick the output format for a source
    pub fn output_format(&self, source: SourceFormat) -> OutputFormat {
        if self.convert_to_webp {
            return OutputFormat::WebP;
        }
        match source {
            SourceFormat::Jpeg => OutputFormat::Jpeg,
            SourceFormat::Png => OutputFormat::Png,
            SourceFormat::WebP => OutputFormat::WebP,
            SourceFormat::Bmp => OutputFormat::Jpeg,
        }
    }
}

/// A fully transcoded texture
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureAsset {
    /// Base filename
    pub name: String,
    /// Where it was read from
    pub source_path: PathBuf,
    /// Dimensions before any resize
    pub original_dimensions: (u32, u32),
    /// Final dimensions
    pub dimensions: (u32, u32),
    /// Encoded format
    pub format: OutputFormat,
    /// Source file size in bytes
    pub original_size: u64,
    /// Encoded binary size before base64
    pub encoded_binary_size: u64,
    /// `data:<mime>;base64,<payload>`
    pub data_uri: String,
    /// Whether the image was resized
    pub downscaled: bool,
    /// Whether the output format differs from the source format
    pub converted: bool,
}

impl TextureAsset {
    /// Size of the embeddable payload in bytes
    pub fn encoded_size(&self) -> u64 {
        self.data_uri.len() as u64
    }
}

/// Per-texture result
#[derive(Debug)]
pub enum TextureOutcome {
    /// Transcoded successfully
    Processed(TextureAsset),
    /// Left out of the output
    Skipped {
        /// Base filename
        name: String,
        /// Where it was to be read from
        source_path: PathBuf,
        /// Why it was skipped
        error: MediaError,
    },
}

impl TextureOutcome {
    /// Base filename of the texture
    pub fn name(&self) -> &str {
        match self {
            TextureOutcome::Processed(asset) => &asset.name,
            TextureOutcome::Skipped { name, .. } => name,
        }
    }
}

/// Aggregate transcoding statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscodeStats {
    /// Textures transcoded
    pub processed: usize,
    /// Textures skipped
    pub skipped: usize,
    /// Sum of source file sizes
    pub total_original_bytes: u64,
    /// Sum of data URI lengths
    pub total_encoded_bytes: u64,
    /// Textures that were resized
    pub downscaled_count: usize,
    /// Textures whose format changed
    pub converted_count: usize,
}

impl TranscodeStats {
    /// Statistics contributed by a single outcome
    pub fn from_outcome(outcome: &TextureOutcome) -> Self {
        match outcome {
            TextureOutcome::Processed(asset) => TranscodeStats {
                processed: 1,
                skipped: 0,
                total_original_bytes: asset.original_size,
                total_encoded_bytes: asset.encoded_size(),
                downscaled_count: usize::from(asset.downscaled),
                converted_count: usize::from(asset.converted),
            },
            TextureOutcome::Skipped { .. } => TranscodeStats {
                skipped: 1,
                ..Default::default()
            },
        }
    }

    /// Combine two partial results
    pub fn merge(self, other: TranscodeStats) -> TranscodeStats {
        TranscodeStats {
            processed: self.processed + other.processed,
            skipped: self.skipped + other.skipped,
            total_original_bytes: self.total_original_bytes + other.total_original_bytes,
            total_encoded_bytes: self.total_encoded_bytes + other.total_encoded_bytes,
            downscaled_count: self.downscaled_count + other.downscaled_count,
            converted_count: self.converted_count + other.converted_count,
        }
    }

    /// Size reduction against the source files, base64 overhead factored out
    pub fn compression_ratio_percent(&self) -> f64 {
        if self.total_original_bytes == 0 {
            return 0.0;
        }
        let binary_estimate = self.total_encoded_bytes as f64 / BASE64_EXPANSION;
        (1.0 - binary_estimate / self.total_original_bytes as f64) * 100.0
    }
}

/// Outcomes of a batch, in input order, plus their folded statistics
#[derive(Debug, Default)]
pub struct TextureBatch {
    /// One outcome per input path
    pub outcomes: Vec<TextureOutcome>,
    /// Reduction of the per-outcome statistics
    pub stats: TranscodeStats,
}

/// Wrap encoded bytes as a base64 data URI
pub fn encode_data_uri(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}

/// Expected data URI length for `binary_len` encoded bytes
pub fn estimated_data_uri_len(mime_type: &str, binary_len: u64) -> u64 {
    let prefix = format!("data:{};base64,", mime_type).len() as u64;
    prefix + 4 * binary_len.div_ceil(3)
}

/// Dimensions after fitting the longer side into `max_resolution`
///
/// The shorter side is rounded to the nearest pixel and never drops below 1.
/// Returns the input unchanged when it already fits.
pub fn fit_dimensions(width: u32, height: u32, max_resolution: u32) -> (u32, u32) {
    let longest = width.max(height);
    if longest <= max_resolution || longest == 0 {
        return (width, height);
    }
    let scale = f64::from(max_resolution) / f64::from(longest);
    let shorten = |side: u32| ((f64::from(side) * scale).round() as u32).max(1);
    if width >= height {
        (max_resolution, shorten(height))
    } else {
        (shorten(width), max_resolution)
    }
}

/// Composite any alpha onto opaque white
fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    RgbImage::from_fn(rgba.width(), rgba.height(), |x, y| {
        let [r, g, b, a] = rgba.get_pixel(x, y).0;
        let alpha = u32::from(a);
        let blend = |c: u8| ((u32::from(c) * alpha + 255 * (255 - alpha) + 127) / 255) as u8;
        image::Rgb([blend(r), blend(g), blend(b)])
    })
}

/// Texture transcoder
#[derive(Debug, Clone, Default)]
pub struct TextureTranscoder {
    options: TranscodeOptions,
}

impl TextureTranscoder {
    /// Create a transcoder with the given options
    pub fn new(options: TranscodeOptions) -> Self {
        TextureTranscoder { options }
    }

    /// Active options
    pub fn options(&self) -> &TranscodeOptions {
        &self.options
    }

    /// Transcode one texture file
    #[instrument(skip(self, path), fields(path = %path.display()))]
    pub fn transcode(&self, path: &Path) -> Result<TextureAsset> {
        if !path.exists() {
            return Err(MediaError::NotFound(path.to_path_buf()));
        }
        let source = SourceFormat::from_path(path)?;
        let original_size = std::fs::metadata(path)?.len();

        let img = self.decode(path)?;
        let original_dimensions = (img.width(), img.height());
        debug!(
            "Decoded {}x{} {:?}",
            original_dimensions.0, original_dimensions.1, source
        );

        let (img, downscaled) = match self.options.max_resolution {
            Some(max) => {
                let (width, height) = fit_dimensions(img.width(), img.height(), max);
                if (width, height) != original_dimensions {
                    debug!("Downscaling to {}x{}", width, height);
                    (img.resize_exact(width, height, FilterType::Lanczos3), true)
                } else {
                    (img, false)
                }
            }
            None => (img, false),
        };

        let format = self.options.output_format(source);
        let bytes = self.encode(&img, format)?;
        let data_uri = encode_data_uri(format.mime_type(), &bytes);

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        Ok(TextureAsset {
            name,
            source_path: path.to_path_buf(),
            original_dimensions,
            dimensions: (img.width(), img.height()),
            format,
            original_size,
            encoded_binary_size: bytes.len() as u64,
            data_uri,
            downscaled,
            converted: !format.matches_source(source),
        })
    }

    /// Transcode every path, skipping (never aborting on) individual failures
    #[instrument(skip(self, paths), fields(count = paths.len()))]
    pub fn transcode_batch(&self, paths: &[PathBuf]) -> TextureBatch {
        let run = |path: &PathBuf| self.outcome(path);
        let outcomes: Vec<TextureOutcome> = if self.options.parallel {
            paths.par_iter().map(run).collect()
        } else {
            paths.iter().map(run).collect()
        };

        let stats = outcomes
            .iter()
            .map(TranscodeStats::from_outcome)
            .fold(TranscodeStats::default(), TranscodeStats::merge);

        info!(
            "Transcoded {} textures ({} skipped, {} downscaled, {} converted)",
            stats.processed, stats.skipped, stats.downscaled_count, stats.converted_count
        );
        TextureBatch { outcomes, stats }
    }

    fn outcome(&self, path: &Path) -> TextureOutcome {
        match self.transcode(path) {
            Ok(asset) => TextureOutcome::Processed(asset),
            Err(error) => {
                warn!("Skipping texture {}: {}", path.display(), error);
                TextureOutcome::Skipped {
                    name: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    source_path: path.to_path_buf(),
                    error,
                }
            }
        }
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage> {
        let mut reader = ImageReader::open(path)?.with_guessed_format()?;

        let mut limits = Limits::default();
        limits.max_image_width = Some(self.options.max_decode_dimension);
        limits.max_image_height = Some(self.options.max_decode_dimension);
        reader.limits(limits);

        reader
            .decode()
            .map_err(|e| MediaError::TranscodeFailure(format!("{}: {}", path.display(), e)))
    }

    fn encode(&self, img: &DynamicImage, format: OutputFormat) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();

        match format {
            OutputFormat::Png => {
                // 8-bit layouts are written as-is, deeper ones narrowed to 8 bits
                let narrowed;
                let img = match img {
                    DynamicImage::ImageLuma8(_)
                    | DynamicImage::ImageLumaA8(_)
                    | DynamicImage::ImageRgb8(_)
                    | DynamicImage::ImageRgba8(_) => img,
                    other if other.color().has_alpha() => {
                        narrowed = DynamicImage::ImageRgba8(other.to_rgba8());
                        &narrowed
                    }
                    other => {
                        narrowed = DynamicImage::ImageRgb8(other.to_rgb8());
                        &narrowed
                    }
                };
                let encoder = PngEncoder::new_with_quality(
                    &mut buffer,
                    CompressionType::Best,
                    PngFilter::Adaptive,
                );
                encoder.write_image(
                    img.as_bytes(),
                    img.width(),
                    img.height(),
                    ExtendedColorType::from(img.color()),
                )?;
            }
            OutputFormat::Jpeg => {
                let rgb = flatten_onto_white(img);
                let encoder = JpegEncoder::new_with_quality(&mut buffer, self.options.jpeg_quality);
                encoder.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)?;
            }
            OutputFormat::WebP => {
                let rgb = flatten_onto_white(img);
                let encoded = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height())
                    .encode_simple(false, f32::from(self.options.webp_quality))
                    .map_err(|e| MediaError::TranscodeFailure(format!("WebP encoding failed: {:?}", e)))?;
                buffer.extend_from_slice(&encoded);
            }
        }

        Ok(buffer)
    }
}

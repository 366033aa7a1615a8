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

//! Error types for asset packing operations

use std::path::PathBuf;
use thiserror::Error;

/// Asset packing errors
#[derive(Debug, Error)]
pub enum MediaError {
    /// A required input file does not exist
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    /// Texture extension outside the supported set
    #[error("Unsupported texture format: {0}")]
    UnsupportedFormat(String),

    /// Recognized material command with an unparsable argument
    #[error("Malformed line {line}: '{content}' ({reason})")]
    MalformedLine {
        /// 1-based line number
        line: usize,
        /// The offending line, trimmed
        content: String,
        /// Why the argument was rejected
        reason: String,
    },

    /// Per-texture codec or I/O failure
    #[error("Texture transcode failed: {0}")]
    TranscodeFailure(String),

    /// Image decoding/encoding error
    #[error("Image processing error: {0}")]
    ImageError(String),

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Input that cannot be packed at all
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// A blocking worker did not complete
    #[error("Background task failed: {0}")]
    TaskFailed(String),
}

impl MediaError {
    /// Whether this error aborts the whole run rather than a single item
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MediaError::NotFound(_) | MediaError::InvalidInput(_) | MediaError::TaskFailed(_)
        )
    }
}

impl From<image::ImageError> for MediaError {
    fn from(err: image::ImageError) -> Self {
        MediaError::ImageError(err.to_string())
    }
}

/// Result type for asset packing operations
pub type Result<T> = std::result::Result<T, MediaError>;

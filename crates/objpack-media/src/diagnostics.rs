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

//! Per-item warnings collected while packing
//!
//! Nothing that degrades the output is dropped silently: malformed material
//! lines, skipped textures and unresolved references all end up here so a
//! caller can audit exactly what is missing from the final embed.

use crate::error::MediaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Category of a recorded diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// Material line with a recognized command but unusable argument
    MalformedLine,
    /// Texture skipped because of its extension
    UnsupportedFormat,
    /// Texture skipped because decoding or encoding failed
    TranscodeFailure,
    /// Texture referenced by a material but absent on disk
    MissingTexture,
    /// Material library references textures, none of which were found
    UnmatchedTextures,
    /// Face index that resolves to no record in the merged geometry
    DanglingReference,
    /// Combined payload above the soft size threshold
    OversizedOutput,
}

/// One reported warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Category
    pub kind: DiagnosticKind,
    /// File name, texture name or line the warning is about
    pub subject: String,
    /// Human-readable explanation
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic and emit it as a warning event
    pub fn new(kind: DiagnosticKind, subject: impl Into<String>, message: impl Into<String>) -> Self {
        let diagnostic = Diagnostic {
            kind,
            subject: subject.into(),
            message: message.into(),
        };
        warn!(kind = ?diagnostic.kind, subject = %diagnostic.subject, "{}", diagnostic.message);
        diagnostic
    }

    /// Classify a per-item error
    pub fn from_error(subject: impl Into<String>, err: &MediaError) -> Self {
        let kind = match err {
            MediaError::MalformedLine { .. } => DiagnosticKind::MalformedLine,
            MediaError::UnsupportedFormat(_) => DiagnosticKind::UnsupportedFormat,
            MediaError::NotFound(_) => DiagnosticKind::MissingTexture,
            _ => DiagnosticKind::TranscodeFailure,
        };
        Diagnostic::new(kind, subject, err.to_string())
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.subject, self.message)
    }
}

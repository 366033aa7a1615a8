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

use crate::error::{ConfigError, ConfigResult};
use crate::schema::{Config, ObservabilityConfig, OutputConfig, TextureConfig};

/// Configuration validation
pub trait Validator {
    /// Check the values, returning the first problem found
    fn validate(&self) -> ConfigResult<()>;
}

/// Log levels accepted by `observability.log_level`
pub const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Formats accepted by `observability.log_format`
pub const LOG_FORMATS: [&str; 3] = ["pretty", "compact", "json"];

impl Validator for Config {
    fn validate(&self) -> ConfigResult<()> {
        self.textures.validate()?;
        self.output.validate()?;
        self.observability.validate()?;
        Ok(())
    }
}

fn validate_quality(field: &str, quality: u8) -> ConfigResult<()> {
    if !(1..=100).contains(&quality) {
        return Err(ConfigError::invalid_value(
            field,
            format!("must be between 1 and 100, got {}", quality),
        ));
    }
    Ok(())
}

impl Validator for TextureConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_quality("textures.jpeg_quality", self.jpeg_quality)?;
        validate_quality("textures.webp_quality", self.webp_quality)?;

        if self.max_resolution == Some(0) {
            return Err(ConfigError::invalid_value(
                "textures.max_resolution",
                "must be greater than 0",
            ));
        }

        if self.max_decode_dimension == 0 {
            return Err(ConfigError::invalid_value(
                "textures.max_decode_dimension",
                "must be greater than 0",
            ));
        }

        Ok(())
    }
}

impl Validator for OutputConfig {
    fn validate(&self) -> ConfigResult<()> {
        if matches!(&self.title, Some(title) if title.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "output.title",
                "must not be blank",
            ));
        }
        Ok(())
    }
}

impl Validator for ObservabilityConfig {
    fn validate(&self) -> ConfigResult<()> {
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_level",
                format!("must be one of: {}", LOG_LEVELS.join(", ")),
            ));
        }

        if !LOG_FORMATS.contains(&self.log_format.to_lowercase().as_str()) {
            return Err(ConfigError::invalid_value(
                "observability.log_format",
                format!("must be one of: {}", LOG_FORMATS.join(", ")),
            ));
        }

        Ok(())
    }
}

// In: src/config.rs

//! The single source of truth for all decoder configuration.
//!
//! `DecoderConfig` drives the fixed-width quote decoder and `FeedConfig` drives
//! the tagged message decoder. Both are plain serde structs so they can be
//! created at the application boundary (e.g. from a JSON file) and handed down
//! unchanged. Every field has a default, so `{}` is a valid configuration.

use std::path::Path;
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::TaqError;
use crate::layout::FieldSpec;
use crate::types::ComputedField;

//==================================================================================
// I. Core Configuration Enums
//==================================================================================

/// How the bytes of an input file are wrapped on disk.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ArchiveFormat {
    /// **Default:** Chosen from the file extension (`.zip`, `.gz`, `.zst`, anything else is plain).
    #[default]
    Auto,
    /// A zip archive holding one member per trading day.
    Zip,
    /// A gzip stream, the usual packaging of tagged feed captures.
    Gzip,
    /// A Zstandard stream.
    Zstd,
    /// Uncompressed bytes.
    Plain,
}

impl ArchiveFormat {
    /// Resolves `Auto` against a path's extension. Other variants are returned unchanged.
    pub fn resolve(self, path: &Path) -> ArchiveFormat {
        if self != ArchiveFormat::Auto {
            return self;
        }
        match path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .as_deref()
        {
            Some("zip") => ArchiveFormat::Zip,
            Some("gz") | Some("gzip") => ArchiveFormat::Gzip,
            Some("zst") | Some("zstd") => ArchiveFormat::Zstd,
            _ => ArchiveFormat::Plain,
        }
    }
}

//==================================================================================
// II. Fixed-Width Decoder Configuration
//==================================================================================

/// Configuration for `ChunkedDecoder`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct DecoderConfig {
    /// **The number of records per emitted batch.** Only the final batch of a
    /// file may be shorter.
    #[serde(default = "default_batch_size_rows")]
    pub batch_size_rows: usize,

    /// If true, raw byte batches are converted to typed Arrow batches
    /// (numeric coercion, price scaling, timestamp reconstruction).
    #[serde(default = "default_true")]
    pub convert: bool,

    /// IANA name of the exchange timezone the record times are expressed in.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Computed columns prepended to the typed output schema.
    #[serde(default = "default_computed_fields")]
    pub computed_fields: Vec<ComputedField>,

    /// How the input file is wrapped on disk.
    #[serde(default)]
    pub archive_format: ArchiveFormat,

    /// Replaces the built-in field-width table for non-standard files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub layout_override: Option<Vec<FieldSpec>>,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            batch_size_rows: default_batch_size_rows(),
            convert: true,
            timezone: default_timezone(),
            computed_fields: default_computed_fields(),
            archive_format: ArchiveFormat::default(),
            layout_override: None,
        }
    }
}

impl DecoderConfig {
    /// Returns a default configuration with a different batch size.
    pub fn with_batch_size(batch_size_rows: usize) -> Self {
        Self {
            batch_size_rows,
            ..Default::default()
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, TaqError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, TaqError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the settings that cannot be expressed in the type system.
    pub fn validate(&self) -> Result<(), TaqError> {
        if self.batch_size_rows == 0 {
            return Err(TaqError::InvalidConfig(
                "batch_size_rows must be greater than zero".to_string(),
            ));
        }
        self.tz()?;
        if let Some(table) = &self.layout_override {
            if table.is_empty() {
                return Err(TaqError::InvalidConfig(
                    "layout_override must declare at least one field".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Parses the configured timezone name.
    pub fn tz(&self) -> Result<Tz, TaqError> {
        Tz::from_str(&self.timezone).map_err(|e| {
            TaqError::InvalidConfig(format!("unknown timezone '{}': {}", self.timezone, e))
        })
    }
}

//==================================================================================
// III. Tagged Feed Configuration
//==================================================================================

/// Configuration for `MessageDecoder`.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub struct FeedConfig {
    /// If true, frames with a tag outside the dispatch table are yielded as
    /// `BinaryMessage::Unrecognized` instead of being skipped.
    #[serde(default)]
    pub emit_unrecognized: bool,

    /// How the input file is wrapped on disk.
    #[serde(default)]
    pub archive_format: ArchiveFormat,
}

impl FeedConfig {
    pub fn from_json_str(json: &str) -> Result<Self, TaqError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Helper for `serde` to default a boolean field to true.
fn default_true() -> bool {
    true
}

/// Helper for `serde` to provide a default for `batch_size_rows`.
fn default_batch_size_rows() -> usize {
    1_000_000
}

fn default_timezone() -> String {
    "America/New_York".to_string()
}

fn default_computed_fields() -> Vec<ComputedField> {
    vec![ComputedField::Time]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = DecoderConfig::from_json_str("{}").unwrap();
        assert_eq!(config, DecoderConfig::default());
        assert_eq!(config.batch_size_rows, 1_000_000);
        assert!(config.convert);
        assert_eq!(config.computed_fields, vec![ComputedField::Time]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let err = DecoderConfig::with_batch_size(0).validate().unwrap_err();
        assert!(matches!(err, TaqError::InvalidConfig(_)));

        let config = DecoderConfig {
            timezone: "Mars/Olympus_Mons".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(TaqError::InvalidConfig(_))));
    }

    #[test]
    fn test_archive_format_resolution() {
        let auto = ArchiveFormat::Auto;
        assert_eq!(auto.resolve(Path::new("EQY_US_ALL_BBO_20150102.zip")), ArchiveFormat::Zip);
        assert_eq!(auto.resolve(Path::new("S010215-v50.txt.gz")), ArchiveFormat::Gzip);
        assert_eq!(auto.resolve(Path::new("day.ZST")), ArchiveFormat::Zstd);
        assert_eq!(auto.resolve(Path::new("raw.txt")), ArchiveFormat::Plain);
        assert_eq!(
            ArchiveFormat::Plain.resolve(Path::new("x.zip")),
            ArchiveFormat::Plain
        );
    }

    #[test]
    fn test_feed_config_json() {
        let config = FeedConfig::from_json_str(r#"{"emit_unrecognized": true, "archive_format": "gzip"}"#)
            .unwrap();
        assert!(config.emit_unrecognized);
        assert_eq!(config.archive_format, ArchiveFormat::Gzip);
    }
}

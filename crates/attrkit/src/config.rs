//! # Configuration
//!
//! Engine-wide defaults are managed by [`confique`], layered in priority
//! order:
//!
//! 1. **Environment variables**: `ATTRKIT_NILABLE`, `ATTRKIT_REQUIRED`,
//!    `ATTRKIT_READER`, `ATTRKIT_WRITER`, `ATTRKIT_STRICT_NAMED`.
//! 2. **Config file**: an optional TOML file passed to [`AttrkitConfig::load`].
//! 3. **Compiled defaults**: built-in fallbacks via `#[config(default = ...)]`.
//!
//! ## Available Settings
//!
//! | Key | Default | Description |
//! |-----|---------|-------------|
//! | `nilable` | `true` | Whether attributes accept `nil` unless declared otherwise |
//! | `required` | `false` | Whether attributes must be supplied unless declared otherwise |
//! | `reader` | `public` | Reader visibility unless declared otherwise |
//! | `writer` | `public` | Writer visibility unless declared otherwise |
//! | `strict_named` | `false` | Reject unknown named inputs at construction |
//!
//! The first four only fill in options a declaration leaves out. An option
//! spelled out in a declaration always wins, including across merges.

use crate::error::{ConfigurationError, Error, Result};
use crate::signature::{SignatureDefaults, Visibility};
use confique::Config;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for an attribute [`crate::registry::Registry`].
#[derive(Config, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct AttrkitConfig {
    /// Default for the `nilable` signature option.
    #[config(default = true, env = "ATTRKIT_NILABLE")]
    pub nilable: bool,

    /// Default for the `required` signature option.
    #[config(default = false, env = "ATTRKIT_REQUIRED")]
    pub required: bool,

    /// Default reader visibility: "public", "protected" or "private".
    #[config(default = "public", env = "ATTRKIT_READER")]
    pub reader: String,

    /// Default writer visibility: "public", "protected" or "private".
    #[config(default = "public", env = "ATTRKIT_WRITER")]
    pub writer: String,

    /// When set, constructors fail on named inputs that match no attribute.
    #[config(default = false, env = "ATTRKIT_STRICT_NAMED")]
    pub strict_named: bool,
}

impl Default for AttrkitConfig {
    fn default() -> Self {
        Self {
            nilable: true,
            required: false,
            reader: "public".to_string(),
            writer: "public".to_string(),
            strict_named: false,
        }
    }
}

impl AttrkitConfig {
    /// Load from the environment, then `path` if given, then the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Self::builder().env();
        if let Some(path) = path {
            builder = builder.file(path);
        }
        let config = builder.load()?;
        // surface bad visibility names at load time rather than first use
        config.signature_defaults()?;
        Ok(config)
    }

    /// Signature defaults derived from this configuration.
    pub fn signature_defaults(&self) -> Result<SignatureDefaults> {
        Ok(SignatureDefaults {
            nilable: self.nilable,
            required: self.required,
            reader: parse_visibility("reader", &self.reader)?,
            writer: parse_visibility("writer", &self.writer)?,
        })
    }
}

fn parse_visibility(key: &'static str, value: &str) -> Result<Visibility> {
    value.parse().map_err(|value| {
        Error::configuration("config", ConfigurationError::InvalidVisibility { key: key.to_string(), value })
    })
}

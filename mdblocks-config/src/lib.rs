//! Shared configuration loader for the mdblocks toolchain.
//!
//! `defaults/mdblocks.default.toml` is embedded into every binary so that docs
//! and runtime behavior stay in sync. Applications layer user-specific files on
//! top of those defaults via [`Loader`] before deserializing into
//! [`MdblocksConfig`].

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, File, FileFormat, ValueKind};
use mdblocks_babel::model::{ParseOptions, SerializeOptions};
use serde::Deserialize;
use std::path::Path;

const DEFAULT_TOML: &str = include_str!("../defaults/mdblocks.default.toml");

/// Top-level configuration consumed by mdblocks applications.
#[derive(Debug, Clone, Deserialize)]
pub struct MdblocksConfig {
    pub parse: ParseConfig,
    pub serialize: SerializeConfig,
    pub inspect: InspectConfig,
}

/// Markdown dialect accepted by the parser.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ParseConfig {
    pub gfm: bool,
    pub math: bool,
    pub containers: bool,
}

impl From<ParseConfig> for ParseOptions {
    fn from(config: ParseConfig) -> Self {
        ParseOptions {
            gfm: config.gfm,
            math: config.math,
            containers: config.containers,
        }
    }
}

/// Mirrors the knobs exposed by the Markdown serializer.
#[derive(Debug, Clone, Deserialize)]
pub struct SerializeConfig {
    pub bullet_char: char,
    pub emphasis_char: char,
    pub strong_char: String,
    pub list_indent: usize,
    pub soft_breaks: bool,
    pub escape_text: bool,
    pub link_references: bool,
    pub footnotes: bool,
}

impl From<SerializeConfig> for SerializeOptions {
    fn from(config: SerializeConfig) -> Self {
        SerializeOptions {
            bullet_char: config.bullet_char,
            emphasis_char: config.emphasis_char,
            strong_char: config.strong_char,
            list_indent: config.list_indent,
            soft_breaks: config.soft_breaks,
            escape_text: config.escape_text,
            link_references: config.link_references,
            footnotes: config.footnotes,
        }
    }
}

impl From<&SerializeConfig> for SerializeOptions {
    fn from(config: &SerializeConfig) -> Self {
        SerializeOptions {
            bullet_char: config.bullet_char,
            emphasis_char: config.emphasis_char,
            strong_char: config.strong_char.clone(),
            list_indent: config.list_indent,
            soft_breaks: config.soft_breaks,
            escape_text: config.escape_text,
            link_references: config.link_references,
            footnotes: config.footnotes,
        }
    }
}

/// Controls inspect output.
#[derive(Debug, Clone, Deserialize)]
pub struct InspectConfig {
    pub show_ids: bool,
}

/// Helper for layering user overrides over the built-in defaults.
#[derive(Debug, Clone)]
pub struct Loader {
    builder: ConfigBuilder<DefaultState>,
}

impl Loader {
    /// Start a loader seeded with the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a configuration file. Missing files trigger an error.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer an optional configuration file (ignored if the file is absent).
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Apply a single key/value override, e.g. `serialize.bullet_char`.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self, ConfigError>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Finalize the builder and deserialize the resulting configuration.
    pub fn build(self) -> Result<MdblocksConfig, ConfigError> {
        self.builder.build()?.try_deserialize()
    }
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience helper for callers that only need the defaults.
pub fn load_defaults() -> Result<MdblocksConfig, ConfigError> {
    Loader::new().build()
}

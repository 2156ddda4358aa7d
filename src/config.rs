//! Generator configuration module.
//!
//! Handles loading, validating, and merging `generator.toml`. The file lives
//! in the schema directory next to the class documents and overrides the stock
//! defaults key by key:
//!
//! ```text
//! schema/
//! ├── generator.toml           # Overrides stock defaults (optional)
//! ├── Environment.json
//! ├── MagickImage.json
//! └── settings/
//!     └── MagickSettings.json
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [runtime]
//! crate_path = "magick_interop::runtime"   # Path generated code imports the runtime from
//! exception_reader = "crate::native::MagickExceptionReader"
//! environment_initializer = "crate::native::initialize_environment"
//! memory_relinquish = "MagickMemory_Relinquish"
//!
//! [native]
//! library = "MagickNative"    # #[link] name; empty for no attribute
//! bootstrap_class = "Environment"
//!
//! [types]
//! quantum = "f32"             # u8, u16, f32 or f64
//! enums = []                  # Schema types passed as usize
//!
//! [output]
//! header = "Generated by magick-interop. Do not edit."
//! visibility = "pub"          # pub or pub(crate)
//! module_index = true         # Write mod.rs
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILENAME: &str = "generator.toml";

const QUANTUM_TYPES: &[&str] = &["u8", "u16", "f32", "f64"];
const VISIBILITIES: &[&str] = &["pub", "pub(crate)"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Generator configuration loaded from `generator.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Where generated code finds the runtime surface.
    pub runtime: RuntimeConfig,
    /// Native library binding.
    pub native: NativeConfig,
    /// Type table inputs not carried by the class documents.
    pub types: TypesConfig,
    /// Shape of the written files.
    pub output: OutputConfig,
}

impl GeneratorConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("runtime.crate_path", &self.runtime.crate_path),
            ("runtime.exception_reader", &self.runtime.exception_reader),
            (
                "runtime.environment_initializer",
                &self.runtime.environment_initializer,
            ),
        ] {
            if !is_path(value) {
                return Err(ConfigError::Validation(format!(
                    "{key} must be a Rust path, got '{value}'"
                )));
            }
        }
        if !is_ident(&self.runtime.memory_relinquish) {
            return Err(ConfigError::Validation(format!(
                "runtime.memory_relinquish must be an identifier, got '{}'",
                self.runtime.memory_relinquish
            )));
        }
        if !QUANTUM_TYPES.contains(&self.types.quantum.as_str()) {
            return Err(ConfigError::Validation(format!(
                "types.quantum must be one of {}, got '{}'",
                QUANTUM_TYPES.join(", "),
                self.types.quantum
            )));
        }
        if let Some(bad) = self.types.enums.iter().find(|e| !is_ident(e)) {
            return Err(ConfigError::Validation(format!(
                "types.enums entry '{bad}' is not an identifier"
            )));
        }
        if !VISIBILITIES.contains(&self.output.visibility.as_str()) {
            return Err(ConfigError::Validation(format!(
                "output.visibility must be 'pub' or 'pub(crate)', got '{}'",
                self.output.visibility
            )));
        }
        Ok(())
    }
}

fn is_ident(value: &str) -> bool {
    let mut chars = value.chars();
    chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_path(value: &str) -> bool {
    !value.is_empty() && value.split("::").all(is_ident)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    pub crate_path: String,
    /// Type implementing `ExceptionReader` for the bound library.
    pub exception_reader: String,
    /// Fn run before the first native call of every non-bootstrap class.
    pub environment_initializer: String,
    /// Native export releasing strings returned as `NativeString`.
    pub memory_relinquish: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            crate_path: "magick_interop::runtime".into(),
            exception_reader: "crate::native::MagickExceptionReader".into(),
            environment_initializer: "crate::native::initialize_environment".into(),
            memory_relinquish: "MagickMemory_Relinquish".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NativeConfig {
    /// Link name of the native library. Empty emits no `#[link]` attribute.
    pub library: String,
    /// Class that initializes the environment itself and so never calls the
    /// initializer.
    pub bootstrap_class: String,
}

impl Default for NativeConfig {
    fn default() -> Self {
        Self {
            library: "MagickNative".into(),
            bootstrap_class: "Environment".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TypesConfig {
    /// Rust type of `QuantumType`.
    pub quantum: String,
    /// Enum type names; they cross the boundary as `usize`.
    pub enums: Vec<String>,
}

impl Default for TypesConfig {
    fn default() -> Self {
        Self {
            quantum: "f32".into(),
            enums: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    /// Comment written at the top of every generated file. One `//` line per
    /// text line.
    pub header: String,
    /// Visibility of the wrapper re-exports in `mod.rs`.
    pub visibility: String,
    /// Whether to write a `mod.rs` declaring every generated module.
    pub module_index: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            header: "Generated by magick-interop. Do not edit.".into(),
            visibility: "pub".into(),
            module_index: true,
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GeneratorConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `generator.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the directory has no config file.
pub fn load_raw_config(dir: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = dir.join(CONFIG_FILENAME);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<GeneratorConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GeneratorConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `generator.toml` in the schema directory.
pub fn load_config(dir: &Path) -> Result<GeneratorConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(dir)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `generator.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# magick-interop Generator Configuration
# ======================================
# Place this file next to the schema documents as generator.toml.
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Runtime surface used by generated code
# ---------------------------------------------------------------------------
[runtime]
# Path generated modules import NativeInstance, Outcome, MagickError, ... from.
crate_path = "magick_interop::runtime"

# Type implementing ExceptionReader for the bound native library.
exception_reader = "crate::native::MagickExceptionReader"

# Fn called before the first native call of every class except the
# bootstrap class. Wrap an EnvironmentGuard so it runs once per process.
environment_initializer = "crate::native::initialize_environment"

# Native export releasing strings returned as NativeString.
memory_relinquish = "MagickMemory_Relinquish"

# ---------------------------------------------------------------------------
# Native library
# ---------------------------------------------------------------------------
[native]
# Link name for the extern blocks. Leave empty to link from a build script.
library = "MagickNative"

# Class that initializes the environment itself.
bootstrap_class = "Environment"

# ---------------------------------------------------------------------------
# Types
# ---------------------------------------------------------------------------
[types]
# Rust type of QuantumType: u8, u16, f32 or f64.
quantum = "f32"

# Schema type names that are enums. They cross the boundary as usize and
# must implement From<usize> and Into<usize> on the Rust side.
enums = []

# ---------------------------------------------------------------------------
# Output
# ---------------------------------------------------------------------------
[output]
# Comment written at the top of each generated file.
header = "Generated by magick-interop. Do not edit."

# Visibility of the wrapper re-exports in mod.rs: "pub" or "pub(crate)".
visibility = "pub"

# Write a mod.rs that declares and re-exports every generated module.
module_index = true
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GeneratorConfig::default();
        assert_eq!(config.runtime.crate_path, "magick_interop::runtime");
        assert_eq!(config.native.bootstrap_class, "Environment");
        assert_eq!(config.types.quantum, "f32");
        assert!(config.types.enums.is_empty());
        assert!(config.output.module_index);
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(GeneratorConfig::default().validate().is_ok());
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn load_config_reads_sparse_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(CONFIG_FILENAME),
            r#"
[types]
quantum = "u16"
enums = ["ColorSpace", "Channels"]

[native]
library = ""
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.types.quantum, "u16");
        assert_eq!(config.types.enums, vec!["ColorSpace", "Channels"]);
        assert_eq!(config.native.library, "");
        // Untouched sections keep defaults
        assert_eq!(config.native.bootstrap_class, "Environment");
        assert_eq!(config.output.visibility, "pub");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILENAME), "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(tmp.path()), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let overlay: toml::Value = toml::from_str("[types]\nquantom = \"u8\"").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_section_rejected() {
        let overlay: toml::Value = toml::from_str("[linker]\nflags = []").unwrap();
        assert!(resolve_config(stock_defaults_value(), Some(overlay)).is_err());
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("b = 3").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["b"].as_integer(), Some(3));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value =
            toml::from_str("[runtime]\ncrate_path = \"a\"\nmemory_relinquish = \"R\"").unwrap();
        let overlay: toml::Value = toml::from_str("[runtime]\ncrate_path = \"b\"").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["runtime"]["crate_path"].as_str(), Some("b"));
        assert_eq!(merged["runtime"]["memory_relinquish"].as_str(), Some("R"));
    }

    #[test]
    fn merge_toml_arrays_replace() {
        let base: toml::Value = toml::from_str("enums = [\"A\", \"B\"]").unwrap();
        let overlay: toml::Value = toml::from_str("enums = [\"C\"]").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["enums"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn validate_rejects_unknown_quantum() {
        let mut config = GeneratorConfig::default();
        config.types.quantum = "i32".into();
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn validate_rejects_bad_visibility() {
        let mut config = GeneratorConfig::default();
        config.output.visibility = "private".into();
        assert!(config.validate().is_err());
        config.output.visibility = "pub(crate)".into();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_paths() {
        let mut config = GeneratorConfig::default();
        config.runtime.exception_reader = "crate::".into();
        assert!(config.validate().is_err());

        let mut config = GeneratorConfig::default();
        config.runtime.memory_relinquish = "Magick Memory".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_enum_names() {
        let mut config = GeneratorConfig::default();
        config.types.enums = vec!["ColorSpace".into(), "".into()];
        assert!(config.validate().is_err());
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(stock_defaults_value(), Some(value)).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }
}

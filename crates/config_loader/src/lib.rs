//! # Config Loader
//!
//! Configuration loading and parsing module.
//!
//! Responsibilities:
//! - Parse TOML/JSON configuration files
//! - Validate configuration legality
//! - Generate `PanelBlueprint`
//! - Load camera node scripts and other TOML/JSON documents
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ConfigLoader;
//! use std::path::Path;
//!
//! let blueprint = ConfigLoader::load_from_path(Path::new("panel.toml")).unwrap();
//! println!("Primary: {}", blueprint.cameras.primary.config_ref);
//! ```

mod parser;
mod validator;

pub use contracts::{NodeScript, PanelBlueprint};
pub use parser::ConfigFormat;
pub use validator::validate_name_format;

use contracts::ContractError;
use serde::de::DeserializeOwned;
use std::path::Path;

/// Configuration loader
///
/// Provides static methods to load configuration from files or strings.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load panel configuration from file path
    ///
    /// Automatically detects format from file extension (.toml / .json).
    ///
    /// # Errors
    /// - File read failure
    /// - Unsupported format
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_path(path: &Path) -> Result<PanelBlueprint, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load panel configuration from string
    ///
    /// # Errors
    /// - Parse failure
    /// - Validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<PanelBlueprint, ContractError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Load and validate a camera node script
    pub fn load_node_script(path: &Path) -> Result<NodeScript, ContractError> {
        let script: NodeScript = Self::load_document(path)?;
        validator::validate_node_script(&script)?;
        Ok(script)
    }

    /// Parse any TOML/JSON document without validation
    pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T, ContractError> {
        let format = Self::detect_format(path)?;
        let content = Self::read_file(path)?;
        parser::parse(&content, format)
    }

    /// Parse a TOML/JSON document held in memory
    pub fn parse_document<T: DeserializeOwned>(
        content: &str,
        format: ConfigFormat,
    ) -> Result<T, ContractError> {
        parser::parse(content, format)
    }

    /// Serialize PanelBlueprint to TOML string
    pub fn to_toml(blueprint: &PanelBlueprint) -> Result<String, ContractError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize PanelBlueprint to JSON string
    pub fn to_json(blueprint: &PanelBlueprint) -> Result<String, ContractError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| ContractError::config_parse(format!("JSON serialize error: {e}")))
    }
}

impl ConfigLoader {
    /// Infer configuration format from file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, ContractError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            ContractError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext).ok_or_else(|| {
            ContractError::config_parse(format!("unsupported config format: .{ext}"))
        })
    }

    /// Read configuration file content
    fn read_file(path: &Path) -> Result<String, ContractError> {
        Ok(std::fs::read_to_string(path)?)
    }
}

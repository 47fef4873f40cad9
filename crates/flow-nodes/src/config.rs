//! Connection configuration
//!
//! Values come from the environment (`SHOTGRID_URL`, `SHOTGRID_SCRIPT_NAME`,
//! `SHOTGRID_API_KEY`), a TOML file, or code. Environment values override
//! file values in [`FlowConfig::load`].

use crate::error::ConfigError;
use crate::entity::EntityType;
use flow_fields::ReconcilerOptions;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment key of the site URL
pub const ENV_URL: &str = "SHOTGRID_URL";
/// Environment key of the script name
pub const ENV_SCRIPT_NAME: &str = "SHOTGRID_SCRIPT_NAME";
/// Environment key of the script key
pub const ENV_API_KEY: &str = "SHOTGRID_API_KEY";
/// Script name used when none is configured
pub const DEFAULT_SCRIPT_NAME: &str = "gtn";

const API_SUFFIX: &str = "api/v1/";

/// Site connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlowConfig {
    /// Site URL, always ending in `/`
    pub base_url: String,
    /// Script (client) name
    pub script_name: String,
    /// Script key
    pub api_key: String,
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            script_name: DEFAULT_SCRIPT_NAME.to_string(),
            api_key: String::new(),
        }
    }
}

/// Layout of a config file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Connection settings
    pub shotgrid: FlowConfig,
    /// Reconciler settings
    pub reconciler: ReconcilerOptions,
}

impl FlowConfig {
    /// Create configuration in code
    #[must_use]
    pub fn new(base_url: impl AsRef<str>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base_url(base_url.as_ref()),
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// With script name
    #[inline]
    #[must_use]
    pub fn with_script_name(mut self, script_name: impl Into<String>) -> Self {
        self.script_name = script_name.into();
        self
    }

    /// Read from the process environment
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self::default().overridden_by(lookup)
    }

    /// Parse a TOML document with a `[shotgrid]` table
    ///
    /// # Errors
    /// Returns error if the document does not match the schema
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<ConfigFile, ConfigError> {
        let mut file: ConfigFile = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        file.shotgrid.base_url = normalize_base_url(&file.shotgrid.base_url);
        if file.shotgrid.script_name.is_empty() {
            file.shotgrid.script_name = DEFAULT_SCRIPT_NAME.to_string();
        }
        Ok(file)
    }

    /// Load a config file, then apply environment overrides
    ///
    /// # Errors
    /// Returns error if the file cannot be read or parsed
    pub fn load(path: Option<&Path>) -> Result<ConfigFile, ConfigError> {
        let mut file = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| ConfigError::read(path, e))?;
                Self::from_toml_str(&text, path)?
            }
            None => ConfigFile::default(),
        };
        file.shotgrid = file.shotgrid.overridden_by(|key| std::env::var(key).ok());
        Ok(file)
    }

    fn overridden_by(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let present = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = present(ENV_URL) {
            self.base_url = normalize_base_url(&url);
        }
        if let Some(name) = present(ENV_SCRIPT_NAME) {
            self.script_name = name;
        }
        if let Some(key) = present(ENV_API_KEY) {
            self.api_key = key;
        }
        self
    }

    /// Check that every required key is present
    ///
    /// # Errors
    /// Returns [`ConfigError::Incomplete`] naming all missing keys, or
    /// [`ConfigError::InvalidUrl`] for a non-http URL
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut missing = Vec::new();
        if self.base_url.is_empty() {
            missing.push(ENV_URL);
        }
        if self.api_key.is_empty() {
            missing.push(ENV_API_KEY);
        }
        if !missing.is_empty() {
            return Err(ConfigError::Incomplete { missing });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.base_url.clone()));
        }
        Ok(())
    }

    /// Script key with all but the first 8 and last 4 characters hidden
    #[must_use]
    pub fn masked_api_key(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..8].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    }

    /// REST endpoint below `api/v1/`
    #[must_use]
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}{}", self.web_base(), API_SUFFIX, path.trim_start_matches('/'))
    }

    /// Collection endpoint of an entity type
    #[must_use]
    pub fn entity_url(&self, entity_type: EntityType) -> String {
        self.api_url(&format!("entity/{}", entity_type.api_segment()))
    }

    /// Browser URL of a record's detail page
    #[must_use]
    pub fn detail_url(&self, entity_type: &str, id: i64) -> String {
        format!("{}detail/{}/{}", self.web_base(), entity_type, id)
    }

    /// Site URL without a trailing `api/v1/`
    fn web_base(&self) -> &str {
        self.base_url
            .strip_suffix(API_SUFFIX)
            .unwrap_or(&self.base_url)
    }
}

/// Trim whitespace and ensure a single trailing `/`
fn normalize_base_url(url: &str) -> String {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return String::new();
    }
    format!("{}/", trimmed.trim_end_matches('/'))
}

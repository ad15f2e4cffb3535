use crate::core::attribute::{AttributeDef, AttributeMode};
use crate::utils::error::{NetnsError, Result};
use crate::utils::validation::{validate_entry_name, validate_range, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub hierarchy: HierarchyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Names and permissions of the tree this crate builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HierarchyConfig {
    /// Well-known container the collection is created in.
    pub parent: String,
    pub collection: String,
    /// Top-level node, the namespace boundary.
    pub top: String,
    /// Name of every per-namespace node.
    pub node: String,
    pub attribute: String,
    pub mode: u16,
}

impl Default for HierarchyConfig {
    fn default() -> Self {
        Self {
            parent: "kernel".to_string(),
            collection: "kset_sysfs_netns".to_string(),
            top: "net".to_string(),
            node: "data".to_string(),
            attribute: "property".to_string(),
            mode: AttributeMode::DEFAULT.0,
        }
    }
}

impl HierarchyConfig {
    pub fn attribute_def(&self) -> AttributeDef {
        AttributeDef::new(self.attribute.clone(), AttributeMode(self.mode))
    }
}

impl Validate for HierarchyConfig {
    fn validate(&self) -> Result<()> {
        validate_entry_name("hierarchy.parent", &self.parent)?;
        validate_entry_name("hierarchy.collection", &self.collection)?;
        validate_entry_name("hierarchy.top", &self.top)?;
        validate_entry_name("hierarchy.node", &self.node)?;
        validate_entry_name("hierarchy.attribute", &self.attribute)?;
        validate_range("hierarchy.mode", self.mode, 0, 0o777)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub verbose: bool,
    pub json: bool,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(NetnsError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| NetnsError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NETNS_COLLECTION})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| NetnsError::ConfigError {
            message: format!("bad substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.hierarchy.validate()
    }
}

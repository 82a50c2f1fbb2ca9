//! Metadata published to consumers of the package.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// What a downstream build needs to compile and link against the package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CppInfo {
    pub name: String,
    pub version: String,
    /// Libraries to link, without prefix or extension.
    pub libs: Vec<String>,
    /// Preprocessor definitions consumers must set.
    #[serde(default)]
    pub defines: Vec<String>,
    #[serde(default)]
    pub include_dirs: Vec<String>,
    #[serde(default)]
    pub lib_dirs: Vec<String>,
    #[serde(default)]
    pub bin_dirs: Vec<String>,
}

impl CppInfo {
    /// File name of the serialized metadata inside the package.
    pub const FILE_NAME: &'static str = "cpp_info.json";

    pub fn has_lib(&self, name: &str) -> bool {
        self.libs.iter().any(|l| l == name)
    }

    pub fn has_define(&self, name: &str) -> bool {
        self.defines.iter().any(|d| d == name)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize cpp_info")?;
        crate::util::fs::write_string(path, &json)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = crate::util::fs::read_to_string(path)?;
        serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse {}", path.display()))
    }
}

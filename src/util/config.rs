//! Configuration file support.
//!
//! Two locations are read:
//! - Global: `~/.mpdec-recipe/config.toml` - User-wide defaults
//! - Project: `.mpdec-recipe/config.toml` - Overrides for the current directory
//!
//! Project config takes precedence over global config, and command-line
//! flags take precedence over both.
//!
//! ```toml
//! cache_dir = "/var/cache/mpdec-recipe"
//!
//! [build]
//! jobs = 8
//! cc = "/usr/bin/clang"
//!
//! [net]
//! offline = false
//! timeout_secs = 120
//! mirror = "https://mirror.example.com/mpdecimal-2.4.2.tar.gz"
//!
//! [patch]
//! on_miss = "error"
//!
//! [msvc]
//! vcvarsall = 'C:\Program Files\Microsoft Visual Studio\2022\Community\VC\Auxiliary\Build\vcvarsall.bat'
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::builder::patch::MissPolicy;

/// Name of the per-user and per-project configuration directory.
pub const CONFIG_DIR_NAME: &str = ".mpdec-recipe";

/// Recipe runner configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where downloaded archives are kept
    pub cache_dir: Option<PathBuf>,

    /// Build settings
    pub build: BuildConfig,

    /// Network settings
    pub net: NetConfig,

    /// Patch settings
    pub patch: PatchConfig,

    /// MSVC settings
    pub msvc: MsvcConfig,
}

/// Build-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parallel make jobs (None = available parallelism)
    pub jobs: Option<usize>,

    /// Working directory for extracted sources
    pub build_dir: Option<PathBuf>,

    /// Package output directory
    pub package_dir: Option<PathBuf>,

    /// C compiler passed to configure as `CC`
    pub cc: Option<String>,
}

/// Network-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetConfig {
    /// Offline mode (only use the cached archive)
    pub offline: bool,

    /// HTTP timeout in seconds
    pub timeout_secs: Option<u64>,

    /// Alternate download URL for the pinned archive
    pub mirror: Option<String>,
}

/// Patch-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// What to do when a substitution target is absent
    pub on_miss: Option<MissPolicy>,
}

/// MSVC-related configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MsvcConfig {
    /// Explicit path to vcvarsall.bat (skips vswhere discovery)
    pub vcvarsall: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if file doesn't exist.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }

        if other.build.jobs.is_some() {
            self.build.jobs = other.build.jobs;
        }
        if other.build.build_dir.is_some() {
            self.build.build_dir = other.build.build_dir;
        }
        if other.build.package_dir.is_some() {
            self.build.package_dir = other.build.package_dir;
        }
        if other.build.cc.is_some() {
            self.build.cc = other.build.cc;
        }

        if other.net.offline {
            self.net.offline = true;
        }
        if other.net.timeout_secs.is_some() {
            self.net.timeout_secs = other.net.timeout_secs;
        }
        if other.net.mirror.is_some() {
            self.net.mirror = other.net.mirror;
        }

        if other.patch.on_miss.is_some() {
            self.patch.on_miss = other.patch.on_miss;
        }

        if other.msvc.vcvarsall.is_some() {
            self.msvc.vcvarsall = other.msvc.vcvarsall;
        }
    }

    /// Effective patch miss policy.
    pub fn miss_policy(&self) -> MissPolicy {
        self.patch.on_miss.unwrap_or_default()
    }

    /// Effective archive cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .or_else(default_cache_dir)
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR_NAME).join("cache"))
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.mpdec-recipe/config.toml)
/// 2. Global config (~/.mpdec-recipe/config.toml)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Get the global config directory (~/.mpdec-recipe).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(CONFIG_DIR_NAME))
}

/// Get the global config path (~/.mpdec-recipe/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the project config path (.mpdec-recipe/config.toml).
pub fn project_config_path(project_root: &Path) -> PathBuf {
    project_root.join(CONFIG_DIR_NAME).join("config.toml")
}

/// Platform cache directory for downloaded archives.
fn default_cache_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "mpdec-recipe").map(|d| d.cache_dir().to_path_buf())
}

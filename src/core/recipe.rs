//! Recipe metadata and the pinned upstream archive.

use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

/// Upstream release packaged by this recipe.
pub const MPDECIMAL_VERSION: &str = "2.4.2";

const MPDECIMAL_SHA256: &str = "83c628b90f009470981cf084c5418329c88b19835d8af3691b930afccb7d79c7";

/// Descriptive metadata about the packaged library.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeMetadata {
    pub name: &'static str,
    pub version: &'static str,
    pub description: &'static str,
    pub license: &'static str,
    pub homepage: &'static str,
    pub topics: &'static [&'static str],
}

impl RecipeMetadata {
    pub fn mpdecimal() -> Self {
        RecipeMetadata {
            name: "mpdecimal",
            version: MPDECIMAL_VERSION,
            description: "mpdecimal is a package for correctly-rounded arbitrary precision \
                          decimal floating point arithmetic.",
            license: "BSD-2-Clause",
            homepage: "http://www.bytereef.org/mpdecimal",
            topics: &["mpdecimal", "multiprecision", "library"],
        }
    }
}

/// A source tarball pinned by its SHA-256 digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceArchive {
    pub name: String,
    pub version: String,
    pub url: String,
    pub sha256: String,
}

impl SourceArchive {
    /// The pinned mpdecimal release.
    pub fn mpdecimal() -> Self {
        let name = "mpdecimal";
        SourceArchive {
            name: name.to_string(),
            version: MPDECIMAL_VERSION.to_string(),
            url: format!(
                "http://www.bytereef.org/software/mpdecimal/releases/{}-{}.tar.gz",
                name, MPDECIMAL_VERSION
            ),
            sha256: MPDECIMAL_SHA256.to_string(),
        }
    }

    /// Replace the download location. The digest stays pinned.
    pub fn with_mirror(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Tarball file name, also used as the cache key.
    pub fn file_name(&self) -> String {
        format!("{}-{}.tar.gz", self.name, self.version)
    }

    /// Top-level directory inside the tarball.
    pub fn top_dir(&self) -> String {
        format!("{}-{}", self.name, self.version)
    }

    /// Major version, used in Windows library names (`libmpdec-2.dll`).
    pub fn main_version(&self) -> Result<String> {
        let version = semver::Version::parse(&self.version)
            .with_context(|| format!("invalid archive version `{}`", self.version))?;
        Ok(version.major.to_string())
    }

    /// Parse the download URL.
    pub fn parsed_url(&self) -> Result<Url> {
        Url::parse(&self.url).with_context(|| format!("invalid archive url `{}`", self.url))
    }
}

//! Package output layout.
//!
//! ```text
//! <package>/
//! ├── include/
//! ├── lib/
//! ├── bin/
//! └── licenses/
//! ```

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use walkdir::WalkDir;

use crate::core::settings::{Linkage, Os};
use crate::util::fs::{ensure_dir, glob_files};

/// Directory layout of a finished package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageLayout {
    root: PathBuf,
}

impl PackageLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        PackageLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn include(&self) -> PathBuf {
        self.root.join("include")
    }

    pub fn lib(&self) -> PathBuf {
        self.root.join("lib")
    }

    pub fn bin(&self) -> PathBuf {
        self.root.join("bin")
    }

    pub fn licenses(&self) -> PathBuf {
        self.root.join("licenses")
    }

    /// Documentation installed by `make install`; not shipped.
    pub fn share(&self) -> PathBuf {
        self.root.join("share")
    }
}

/// Destination subdirectory of a copy rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dest {
    Include,
    Lib,
    Bin,
    Licenses,
}

impl Dest {
    fn resolve(&self, layout: &PackageLayout) -> PathBuf {
        match self {
            Dest::Include => layout.include(),
            Dest::Lib => layout.lib(),
            Dest::Bin => layout.bin(),
            Dest::Licenses => layout.licenses(),
        }
    }
}

/// Copy files matching `pattern` from `src` into a package subdirectory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CopyRule {
    pub pattern: String,
    pub src: PathBuf,
    pub dst: Dest,
}

impl CopyRule {
    pub fn new(pattern: impl Into<String>, src: impl Into<PathBuf>, dst: Dest) -> Self {
        CopyRule {
            pattern: pattern.into(),
            src: src.into(),
            dst,
        }
    }

    /// Copy matching files. Matching nothing is not an error.
    pub fn copy_into(&self, layout: &PackageLayout) -> Result<Vec<PathBuf>> {
        let matches = glob_files(&self.src, &[self.pattern.clone()])?;
        if matches.is_empty() {
            tracing::debug!(
                "copy rule `{}` matched nothing in {}",
                self.pattern,
                self.src.display()
            );
            return Ok(Vec::new());
        }

        let dst_dir = self.dst.resolve(layout);
        ensure_dir(&dst_dir)?;

        let mut copied = Vec::with_capacity(matches.len());
        for path in matches {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let dst = dst_dir.join(file_name);
            std::fs::copy(&path, &dst).with_context(|| {
                format!("failed to copy {} to {}", path.display(), dst.display())
            })?;
            copied.push(dst);
        }
        Ok(copied)
    }
}

/// Linkage kind implied by a library file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    Static,
    Shared,
}

/// Classify a file produced by the autotools flow.
///
/// Versioned shared objects (`libmpdec.so.2.4.2`, `libmpdec.2.dylib`) count
/// as shared. Returns `None` for files that are not libraries.
pub fn classify_artifact(file_name: &str, os: &Os) -> Option<ArtifactKind> {
    let shared_ext = os.shared_lib_extension().ok()?;

    if file_name.ends_with(os.static_lib_extension()) {
        return Some(ArtifactKind::Static);
    }
    if file_name.ends_with(shared_ext) || file_name.contains(&format!("{}.", shared_ext)) {
        return Some(ArtifactKind::Shared);
    }
    None
}

/// Delete library files under `lib/` and `bin/` that do not belong to the
/// requested linkage.
///
/// On Windows a shared build also produces `libmpdec.a` through
/// `--out-implib`; that file is the import library and is kept.
pub fn prune_artifacts(
    layout: &PackageLayout,
    lib_name: &str,
    os: &Os,
    linkage: Linkage,
) -> Result<Vec<PathBuf>> {
    // Fail on unknown platforms rather than silently keeping everything.
    os.shared_lib_extension()?;

    let unwanted = match linkage {
        Linkage::Shared if os.is_windows() => None,
        Linkage::Shared => Some(ArtifactKind::Static),
        Linkage::Static => Some(ArtifactKind::Shared),
    };

    let mut removed = Vec::new();
    let Some(unwanted) = unwanted else {
        return Ok(removed);
    };

    for dir in [layout.lib(), layout.bin()] {
        if !dir.exists() {
            continue;
        }
        for entry in WalkDir::new(&dir).min_depth(1) {
            let entry = entry.with_context(|| format!("failed to walk {}", dir.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if !name.contains(lib_name) {
                continue;
            }
            if classify_artifact(&name, os) == Some(unwanted) {
                std::fs::remove_file(entry.path()).with_context(|| {
                    format!("failed to remove {}", entry.path().display())
                })?;
                tracing::debug!("pruned {}", entry.path().display());
                removed.push(entry.path().to_path_buf());
            }
        }
    }

    removed.sort();
    Ok(removed)
}

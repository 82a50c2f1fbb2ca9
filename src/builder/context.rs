//! Recipe context - validated settings, options and working directories.

use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::builder::patch::MissPolicy;
use crate::core::layout::PackageLayout;
use crate::core::recipe::SourceArchive;
use crate::core::settings::{Linkage, Options, Settings};
use crate::sources::tarball::SOURCE_SUBFOLDER;

/// Everything a build plan needs to know about one recipe run.
#[derive(Debug, Clone, Serialize)]
pub struct RecipeContext {
    /// Validated target settings
    pub settings: Settings,

    /// Normalized package options
    pub options: Options,

    /// Pinned upstream archive
    pub archive: SourceArchive,

    /// Working directory holding the extracted sources
    pub build_dir: PathBuf,

    /// Package output layout
    pub layout: PackageLayout,

    /// Parallel make jobs
    pub jobs: usize,

    /// Reaction to patch rules that miss
    pub miss_policy: MissPolicy,

    /// C compiler override for configure
    pub cc: Option<String>,

    /// Explicit vcvarsall.bat location
    pub vcvarsall: Option<PathBuf>,
}

impl RecipeContext {
    /// Create a context, rejecting unsupported configurations.
    ///
    /// Performs no I/O, so a bad configuration fails before anything is
    /// downloaded or created.
    pub fn new(
        settings: Settings,
        options: Options,
        archive: SourceArchive,
        build_dir: impl Into<PathBuf>,
        package_dir: impl Into<PathBuf>,
    ) -> Result<Self> {
        let settings = settings.validate()?;
        let options = options.normalize(&settings);

        Ok(RecipeContext {
            settings,
            options,
            archive,
            build_dir: build_dir.into(),
            layout: PackageLayout::new(package_dir),
            jobs: default_jobs(),
            miss_policy: MissPolicy::default(),
            cc: None,
            vcvarsall: None,
        })
    }

    pub fn with_jobs(mut self, jobs: Option<usize>) -> Self {
        if let Some(jobs) = jobs.filter(|&j| j > 0) {
            self.jobs = jobs;
        }
        self
    }

    pub fn with_miss_policy(mut self, policy: MissPolicy) -> Self {
        self.miss_policy = policy;
        self
    }

    pub fn with_cc(mut self, cc: Option<String>) -> Self {
        self.cc = cc;
        self
    }

    pub fn with_vcvarsall(mut self, path: Option<PathBuf>) -> Self {
        self.vcvarsall = path;
        self
    }

    /// Root of the extracted sources.
    pub fn source_dir(&self) -> PathBuf {
        self.build_dir.join(SOURCE_SUBFOLDER)
    }

    /// `libmpdec/` inside the sources.
    pub fn libmpdec_dir(&self) -> PathBuf {
        self.source_dir().join("libmpdec")
    }

    pub fn package_dir(&self) -> &Path {
        self.layout.root()
    }

    pub fn linkage(&self) -> Linkage {
        self.options.linkage()
    }

    pub fn is_shared(&self) -> bool {
        self.options.shared
    }
}

fn default_jobs() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

//! Command implementations

pub mod completions;
pub mod fetch;
pub mod info;
pub mod package_info;
pub mod patch;
pub mod plan;
pub mod run;

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};

use mpdec_recipe::builder::RecipeContext;
use mpdec_recipe::core::{Compiler, Options, Os, Settings, SourceArchive};
use mpdec_recipe::sources::tarball::force_download_from_env;
use mpdec_recipe::sources::FetchOptions;
use mpdec_recipe::util::config::{global_config_path, load_config, project_config_path};
use mpdec_recipe::util::Config;

use crate::cli::{DownloadArgs, RecipeArgs};

const DEFAULT_BUILD_DIR: &str = "build";
const DEFAULT_PACKAGE_DIR: &str = "package";

/// Load global and project configuration for the current directory.
pub fn current_config() -> Result<(PathBuf, Config)> {
    let cwd = std::env::current_dir().context("failed to determine current directory")?;
    let config = load_config(global_config_path().as_deref(), &project_config_path(&cwd));
    Ok((cwd, config))
}

/// Build a validated recipe context. CLI flags win over config values.
pub fn recipe_context(args: &RecipeArgs, config: &Config, cwd: &Path) -> Result<RecipeContext> {
    let os = args.os.clone().unwrap_or_else(Os::host);
    let compiler = args
        .compiler
        .clone()
        .unwrap_or_else(|| Compiler::default_for(&os));
    let host = Settings::host();

    let settings = Settings {
        os,
        compiler,
        arch: args.arch.clone().unwrap_or(host.arch),
        build_type: args.build_type,
        runtime: args.runtime,
    };
    let options = Options {
        shared: args.shared,
        fpic: Some(!args.no_fpic),
    };

    let mut archive = SourceArchive::mpdecimal();
    if let Some(mirror) = &config.net.mirror {
        archive = archive.with_mirror(mirror.clone());
    }

    let build_dir = args
        .build_dir
        .clone()
        .or_else(|| config.build.build_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));
    let package_dir = args
        .package_dir
        .clone()
        .or_else(|| config.build.package_dir.clone())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PACKAGE_DIR));

    let ctx = RecipeContext::new(
        settings,
        options,
        archive,
        cwd.join(build_dir),
        cwd.join(package_dir),
    )?
    .with_jobs(config.build.jobs)
    .with_miss_policy(config.miss_policy())
    .with_cc(config.build.cc.clone())
    .with_vcvarsall(config.msvc.vcvarsall.clone());

    Ok(ctx)
}

/// Cache and network options. CLI flags win over config values.
pub fn fetch_options(args: &DownloadArgs, config: &Config, cwd: &Path) -> FetchOptions {
    let cache_dir = args.cache_dir.clone().unwrap_or_else(|| config.cache_dir());
    FetchOptions {
        cache_dir: cwd.join(cache_dir),
        force_download: args.force_download || force_download_from_env(),
        offline: args.offline || config.net.offline,
    }
}

/// HTTP timeout from config.
pub fn http_timeout(config: &Config) -> Option<Duration> {
    config.net.timeout_secs.map(Duration::from_secs)
}

//! Visual Studio plan: upstream's `Makefile.vc` driven by `nmake`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Serialize;

use crate::builder::context::RecipeContext;
use crate::builder::patch::PatchRule;
use crate::builder::vcvars::{self, VcEnv};
use crate::builder::{BuildSteps, InstallOutcome};
use crate::core::errors::RecipeError;
use crate::core::layout::{CopyRule, Dest};
use crate::core::settings::Arch;
use crate::util::fs::{copy_file, ensure_dir};
use crate::util::process::{CommandRunner, ProcessBuilder};

/// Matches `/MD`, `/MT`, `/MDd`, `/MTd` (and the `-` spelling) as whole flags.
const RUNTIME_FLAG: &str = r"(?P<lead>[/-])M[DT]d?\b";

/// nmake plan. Holds the MSVC environment once `configure` has captured it.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NmakePlan {
    #[serde(skip)]
    env: Option<VcEnv>,
}

impl NmakePlan {
    /// `MACHINE=` value understood by `Makefile.vc`.
    pub fn machine(arch: &Arch) -> Result<&'static str, RecipeError> {
        match arch {
            Arch::X86 => Ok("ppro"),
            Arch::X86_64 => Ok("x64"),
            Arch::Other(other) => Err(RecipeError::UnsupportedArch {
                arch: other.clone(),
            }),
        }
    }

    /// `vcbuild/dist32` or `vcbuild/dist64` inside the sources.
    pub fn dist_dir(ctx: &RecipeContext) -> Result<PathBuf, RecipeError> {
        let bits = ctx
            .settings
            .arch
            .bits()
            .ok_or_else(|| RecipeError::UnsupportedArch {
                arch: ctx.settings.arch.to_string(),
            })?;
        Ok(ctx.source_dir().join("vcbuild").join(format!("dist{}", bits)))
    }

    pub fn nmake_command(&self, ctx: &RecipeContext) -> Result<ProcessBuilder> {
        let lib_dir = ctx.libmpdec_dir();
        let env = self.env.clone().unwrap_or_default();
        let nmake = vcvars::resolve_tool("nmake", &env, &lib_dir);

        Ok(ProcessBuilder::new(nmake)
            .arg("/nologo")
            .arg(format!("MACHINE={}", Self::machine(&ctx.settings.arch)?))
            .arg(format!("DLL={}", if ctx.is_shared() { "1" } else { "0" }))
            .envs(env)
            .cwd(lib_dir))
    }

    /// Copy the nmake output into the per-architecture dist directory under
    /// the names consumers expect.
    fn stage_dist(&self, ctx: &RecipeContext) -> Result<PathBuf> {
        let lib_dir = ctx.libmpdec_dir();
        let dist = Self::dist_dir(ctx)?;
        ensure_dir(&dist)?;

        let stem = format!("libmpdec-{}", ctx.archive.main_version()?);
        copy_file(&lib_dir.join("mpdecimal.h"), &dist.join("mpdecimal.h"))?;

        let renames: Vec<(String, String)> = if ctx.is_shared() {
            vec![
                (format!("{}.dll", stem), format!("{}.dll", stem)),
                (format!("{}.dll.exp", stem), format!("{}.exp", stem)),
                (format!("{}.dll.lib", stem), format!("{}.lib", stem)),
            ]
        } else {
            vec![(format!("{}.lib", stem), format!("{}.lib", stem))]
        };
        for (from, to) in renames {
            copy_file(&lib_dir.join(&from), &dist.join(&to))?;
        }

        Ok(dist)
    }

    /// Copy rules from the staged build into the package.
    pub fn copy_rules(ctx: &RecipeContext) -> Result<Vec<CopyRule>> {
        let dist = Self::dist_dir(ctx)?;
        Ok(vec![
            CopyRule::new("vc*.h", ctx.libmpdec_dir(), Dest::Include),
            CopyRule::new("*.h", &dist, Dest::Include),
            CopyRule::new("*.lib", &dist, Dest::Lib),
            CopyRule::new("*.dll", &dist, Dest::Bin),
        ])
    }
}

impl BuildSteps for NmakePlan {
    fn patch_rules(&self, ctx: &RecipeContext) -> Result<Vec<PatchRule>> {
        let runtime = ctx
            .settings
            .runtime
            .context("Visual Studio builds need an MSVC runtime")?;
        let makefile = PathBuf::from("libmpdec").join("Makefile.vc");
        let flag = Regex::new(RUNTIME_FLAG).context("invalid runtime flag pattern")?;

        Ok(vec![
            PatchRule::token(&makefile, flag, format!("${{lead}}{}", runtime)),
            PatchRule::replace(&makefile, &ctx.archive.version, ctx.archive.main_version()?),
        ])
    }

    fn configure(&mut self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        let lib_dir = ctx.libmpdec_dir();
        copy_file(&lib_dir.join("Makefile.vc"), &lib_dir.join("Makefile"))?;

        let vcvarsall = vcvars::locate_vcvarsall(ctx.vcvarsall.as_deref(), runner)?;
        self.env = Some(vcvars::capture_env(&vcvarsall, &ctx.settings.arch, runner)?);
        Ok(())
    }

    fn build(&self, ctx: &RecipeContext, runner: &dyn CommandRunner) -> Result<()> {
        if self.env.is_none() {
            tracing::warn!("building without a captured MSVC environment");
        }
        self.nmake_command(ctx)?.run_checked(runner)?;
        Ok(())
    }

    fn install(&self, ctx: &RecipeContext, _runner: &dyn CommandRunner) -> Result<InstallOutcome> {
        let dist = self.stage_dist(ctx)?;
        tracing::debug!("staged nmake output in {}", dist.display());

        let mut copied = Vec::new();
        for rule in Self::copy_rules(ctx)? {
            copied.extend(rule.copy_into(&ctx.layout)?);
        }
        Ok(InstallOutcome {
            copied,
            pruned: Vec::new(),
        })
    }
}

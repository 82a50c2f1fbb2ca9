//! The package step: install build output and ship the license.

use std::path::PathBuf;

use anyhow::{bail, Result};
use serde::Serialize;

use crate::builder::{BuildPlan, BuildSteps, InstallOutcome, RecipeContext};
use crate::core::layout::{CopyRule, Dest};
use crate::util::process::CommandRunner;
use crate::util::shell::{Shell, Status};

/// Upstream license file, relative to the source root.
pub const LICENSE_FILE: &str = "LICENSE.txt";

/// Everything the package step put into or removed from the package.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PackageReport {
    #[serde(flatten)]
    pub install: InstallOutcome,
    pub licenses: Vec<PathBuf>,
}

/// Run the plan's install step, then copy the license into `licenses/`.
pub fn package(
    plan: &BuildPlan,
    ctx: &RecipeContext,
    runner: &dyn CommandRunner,
    shell: &Shell,
) -> Result<PackageReport> {
    shell.status(Status::Installing, ctx.package_dir().display());
    let install = plan.install(ctx, runner)?;

    for path in &install.pruned {
        shell.status(Status::Pruned, path.display());
    }

    let licenses =
        CopyRule::new(LICENSE_FILE, ctx.source_dir(), Dest::Licenses).copy_into(&ctx.layout)?;
    if licenses.is_empty() {
        bail!(
            "{} not found in {}",
            LICENSE_FILE,
            ctx.source_dir().display()
        );
    }

    Ok(PackageReport { install, licenses })
}

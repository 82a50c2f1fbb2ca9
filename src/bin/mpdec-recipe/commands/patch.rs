//! `mpdec-recipe patch` command

use anyhow::{bail, Result};

use crate::cli::PatchArgs;
use crate::commands::{current_config, recipe_context};
use mpdec_recipe::builder::BuildPlan;
use mpdec_recipe::ops::{check_patch, patch};
use mpdec_recipe::util::shell::{Shell, Status};

pub fn execute(args: PatchArgs, shell: &Shell) -> Result<()> {
    let (cwd, config) = current_config()?;
    let ctx = recipe_context(&args.recipe, &config, &cwd)?;

    if !ctx.source_dir().is_dir() {
        bail!(
            "no sources in {}; run `mpdec-recipe fetch` first",
            ctx.source_dir().display()
        );
    }

    let plan = BuildPlan::select(&ctx.settings);

    if args.check {
        let misses = check_patch(&plan, &ctx)?;
        for miss in &misses {
            shell.warn(miss);
        }
        shell.json_event(&serde_json::json!({
            "reason": "patch-check",
            "plan": plan.name(),
            "misses": misses,
        }));
        if !misses.is_empty() {
            bail!("{} patch rule(s) no longer match the sources", misses.len());
        }
        shell.status(Status::Fresh, format!("all {} patch rules match", plan.name()));
        return Ok(());
    }

    let report = patch(&plan, &ctx, shell)?;
    shell.status(
        Status::Finished,
        format!(
            "{} rule(s) applied, {} file(s) changed",
            report.applied,
            report.files_changed.len()
        ),
    );
    shell.json_event(&serde_json::json!({
        "reason": "patched",
        "report": report,
    }));

    Ok(())
}

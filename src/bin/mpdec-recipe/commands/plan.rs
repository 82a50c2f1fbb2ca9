//! `mpdec-recipe plan` command
//!
//! Prints the selected build plan without touching the filesystem.

use anyhow::Result;

use crate::cli::PlanArgs;
use crate::commands::{current_config, recipe_context};
use mpdec_recipe::builder::{BuildPlan, BuildSteps};

pub fn execute(args: PlanArgs) -> Result<()> {
    let (cwd, config) = current_config()?;
    let ctx = recipe_context(&args.recipe, &config, &cwd)?;

    let plan = BuildPlan::select(&ctx.settings);
    let rules = plan.patch_rules(&ctx)?;

    let doc = serde_json::json!({
        "plan": plan,
        "settings": ctx.settings,
        "options": ctx.options,
        "source": ctx.archive,
        "build_dir": ctx.build_dir,
        "package_dir": ctx.package_dir(),
        "patch_rules": rules,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);

    Ok(())
}

//! `mpdec-recipe package-info` command

use anyhow::Result;

use crate::cli::PackageInfoArgs;
use crate::commands::{current_config, recipe_context};
use mpdec_recipe::ops::{package_info, publish};

pub fn execute(args: PackageInfoArgs) -> Result<()> {
    let (cwd, config) = current_config()?;
    let ctx = recipe_context(&args.recipe, &config, &cwd)?;

    let info = if args.write {
        publish(&ctx)?
    } else {
        package_info(&ctx)?
    };
    println!("{}", serde_json::to_string_pretty(&info)?);

    Ok(())
}

//! `mpdec-recipe run` command

use anyhow::Result;

use crate::cli::RunArgs;
use crate::commands::{current_config, fetch_options, http_timeout, recipe_context};
use mpdec_recipe::ops::run_recipe;
use mpdec_recipe::sources::HttpDownloader;
use mpdec_recipe::util::{Shell, SystemRunner};

pub fn execute(args: RunArgs, shell: &Shell) -> Result<()> {
    let (cwd, config) = current_config()?;

    // Jobs: CLI > config > available parallelism
    let ctx = recipe_context(&args.recipe, &config, &cwd)?.with_jobs(args.jobs);
    let opts = fetch_options(&args.download, &config, &cwd);

    let downloader = HttpDownloader::new(http_timeout(&config))?;
    let report = run_recipe(&ctx, &opts, &downloader, &SystemRunner, shell)?;

    shell.json_event(&serde_json::json!({
        "reason": "recipe-finished",
        "report": report,
    }));

    Ok(())
}

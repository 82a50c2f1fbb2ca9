//! `mpdec-recipe fetch` command

use anyhow::Result;

use crate::cli::FetchArgs;
use crate::commands::{current_config, fetch_options, http_timeout, recipe_context};
use mpdec_recipe::ops::fetch;
use mpdec_recipe::sources::HttpDownloader;
use mpdec_recipe::util::shell::{Shell, Status};

pub fn execute(args: FetchArgs, shell: &Shell) -> Result<()> {
    let (cwd, config) = current_config()?;
    let ctx = recipe_context(&args.recipe, &config, &cwd)?;
    let opts = fetch_options(&args.download, &config, &cwd);

    let downloader = HttpDownloader::new(http_timeout(&config))?;
    let fetched = fetch(&ctx, &opts, &downloader, shell)?;

    let origin = if fetched.from_cache { "cached" } else { "downloaded" };
    shell.status(
        Status::Finished,
        format!("{} ({})", fetched.source_dir.display(), origin),
    );
    shell.json_event(&serde_json::json!({
        "reason": "fetched",
        "source_dir": fetched.source_dir,
        "archive": fetched.archive_path,
        "from_cache": fetched.from_cache,
    }));

    Ok(())
}

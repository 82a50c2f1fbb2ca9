//! `mpdec-recipe info` command

use anyhow::Result;

use mpdec_recipe::core::{RecipeMetadata, SourceArchive};
use mpdec_recipe::util::Shell;

pub fn execute(shell: &Shell) -> Result<()> {
    let meta = RecipeMetadata::mpdecimal();
    let archive = SourceArchive::mpdecimal();

    if shell.is_json() {
        shell.json_event(&serde_json::json!({
            "reason": "info",
            "recipe": meta,
            "source": archive,
        }));
        return Ok(());
    }

    println!("{} {}", meta.name, meta.version);
    println!("{}", meta.description);
    println!();
    println!("license:  {}", meta.license);
    println!("homepage: {}", meta.homepage);
    println!("topics:   {}", meta.topics.join(", "));
    println!("source:   {}", archive.url);
    println!("sha256:   {}", archive.sha256);

    Ok(())
}

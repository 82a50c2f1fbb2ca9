//! CLI definitions using clap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell as CompletionShell;

use mpdec_recipe::core::{Arch, BuildType, Compiler, MsvcRuntime, Os};
use mpdec_recipe::util::shell::ColorChoice;

/// Fetch, patch, build and package the mpdecimal C library
#[derive(Parser)]
#[command(name = "mpdec-recipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Only print errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Coloring: auto, always, never
    #[arg(long, global = true, value_name = "WHEN", default_value = "auto")]
    pub color: ColorChoice,

    /// Output format for status messages
    #[arg(long, global = true, value_enum, default_value_t = MessageFormat::Human)]
    pub message_format: MessageFormat,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum MessageFormat {
    Human,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the whole recipe: fetch, patch, build, package, publish
    Run(RunArgs),

    /// Download, verify and extract the pinned sources
    Fetch(FetchArgs),

    /// Apply the build file substitutions to fetched sources
    Patch(PatchArgs),

    /// Show the selected build plan and its patch rules as JSON
    Plan(PlanArgs),

    /// Compute the consumer metadata for an existing package
    PackageInfo(PackageInfoArgs),

    /// Show recipe metadata
    Info,

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Target settings and package options shared by most commands.
#[derive(Args, Debug, Clone)]
pub struct RecipeArgs {
    /// Target operating system (Linux, Windows, Macos) [default: host]
    #[arg(long)]
    pub os: Option<Os>,

    /// Compiler (gcc, clang, apple-clang, "Visual Studio") [default: per OS]
    #[arg(long)]
    pub compiler: Option<Compiler>,

    /// Target architecture (x86, x86_64) [default: host]
    #[arg(long)]
    pub arch: Option<Arch>,

    /// Build type (Debug, Release, RelWithDebInfo, MinSizeRel)
    #[arg(long, default_value = "Release")]
    pub build_type: BuildType,

    /// Build a shared library instead of a static one
    #[arg(long)]
    pub shared: bool,

    /// Do not build position independent code
    #[arg(long)]
    pub no_fpic: bool,

    /// MSVC runtime (MD, MT, MDd, MTd)
    #[arg(long)]
    pub runtime: Option<MsvcRuntime>,

    /// Directory the sources are extracted and built in
    #[arg(long)]
    pub build_dir: Option<PathBuf>,

    /// Package output directory
    #[arg(long)]
    pub package_dir: Option<PathBuf>,
}

/// Cache and network options.
#[derive(Args, Debug, Clone)]
pub struct DownloadArgs {
    /// Where downloaded archives are cached
    #[arg(long)]
    pub cache_dir: Option<PathBuf>,

    /// Ignore the cached archive and download again
    /// (also MPDEC_RECIPE_FORCE_DOWNLOAD=1)
    #[arg(long)]
    pub force_download: bool,

    /// Never touch the network
    #[arg(long)]
    pub offline: bool,
}

#[derive(Args)]
pub struct RunArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    #[command(flatten)]
    pub download: DownloadArgs,

    /// Number of parallel make jobs
    #[arg(short, long)]
    pub jobs: Option<usize>,
}

#[derive(Args)]
pub struct FetchArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    #[command(flatten)]
    pub download: DownloadArgs,
}

#[derive(Args)]
pub struct PatchArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Only report rules that would match nothing; fail if any would
    #[arg(long)]
    pub check: bool,
}

#[derive(Args)]
pub struct PlanArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,
}

#[derive(Args)]
pub struct PackageInfoArgs {
    #[command(flatten)]
    pub recipe: RecipeArgs,

    /// Also write cpp_info.json into the package directory
    #[arg(long)]
    pub write: bool,
}

#[derive(Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: CompletionShell,
}

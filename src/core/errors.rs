//! Recipe error taxonomy.
//!
//! Every variant aborts the whole run. Callers propagate these through
//! `anyhow::Error` and can recover the category with `downcast_ref`.

use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// A categorized recipe failure.
#[derive(Debug, Error, Diagnostic)]
pub enum RecipeError {
    #[error("unsupported architecture `{arch}` (supported: x86, x86_64)")]
    #[diagnostic(
        code(mpdec_recipe::config::unsupported_arch),
        help("mpdecimal is only packaged for x86 and x86_64; pass `--arch x86` or `--arch x86_64`")
    )]
    UnsupportedArch { arch: String },

    #[error("hash mismatch for {url}:\n  expected: {expected}\n  actual:   {actual}")]
    #[diagnostic(
        code(mpdec_recipe::fetch::integrity),
        help("the download is corrupt or the mirror serves a different release; nothing was extracted")
    )]
    Integrity {
        url: String,
        expected: String,
        actual: String,
    },

    #[error("`{command}` failed with exit code {code:?}\n{stderr}")]
    #[diagnostic(
        code(mpdec_recipe::build::tool_failed),
        help("run with `--verbose` to see the full tool output")
    )]
    ToolFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("unknown platform `{os}`: no library naming convention is defined for it")]
    #[diagnostic(
        code(mpdec_recipe::package::unknown_platform),
        help("supported operating systems are Linux, Windows and Macos")
    )]
    UnknownPlatform { os: String },

    #[error("patch target not found in {}: {pattern:?}", file.display())]
    #[diagnostic(
        code(mpdec_recipe::patch::miss),
        help("upstream sources drifted from the pinned release; set `patch.on_miss = \"warn\"` to continue anyway")
    )]
    PatchMiss { file: PathBuf, pattern: String },

    #[error("offline mode is enabled and no cached archive exists at {}", path.display())]
    #[diagnostic(
        code(mpdec_recipe::fetch::offline),
        help("disable `net.offline` or place the pinned tarball at the cache path")
    )]
    Offline { path: PathBuf },
}

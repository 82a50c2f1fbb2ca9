//! High-level operations.
//!
//! Each step of the recipe is callable on its own so the CLI can expose
//! `fetch` and `patch` separately from a full `run`.

pub mod package;
pub mod package_info;
pub mod recipe_run;

pub use package::{package, PackageReport, LICENSE_FILE};
pub use package_info::{collect_libs, package_info, publish};
pub use recipe_run::{check_patch, fetch, patch, run_recipe, RunReport};
